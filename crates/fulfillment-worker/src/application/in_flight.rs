use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Order ids currently being processed in this process. Only guards invocations sharing
/// the same consumer; redelivery to another process can still double-process.
#[derive(Clone, Default)]
pub struct InFlight {
    orders: Arc<DashMap<Uuid, ()>>,
}

/// Held while an order is processed; releases the claim on drop.
pub struct InFlightToken {
    orders: Arc<DashMap<Uuid, ()>>,
    order_id: Uuid,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_claim(&self, order_id: Uuid) -> Option<InFlightToken> {
        match self.orders.entry(order_id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(InFlightToken {
                    orders: self.orders.clone(),
                    order_id,
                })
            }
        }
    }

    pub fn is_claimed(&self, order_id: Uuid) -> bool {
        self.orders.contains_key(&order_id)
    }
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        self.orders.remove(&self.order_id);
    }
}
