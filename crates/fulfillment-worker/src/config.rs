use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::application::batch_consumer::ConsumerOptions;
use crate::application::retry::{RetryPolicy, MAX_ATTEMPTS_LIMIT};

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub max_attempts: u32,
    pub backoff_unit_ms: u64,
    pub gateway_url: Option<String>,
    pub gateway_timeout_ms: u64,
    pub simulated_failure_rate: f64,
    pub simulated_latency_ms: u64,
    pub notify_url: Option<String>,
    pub partial_batch_response: bool,
    pub publish_failure_events: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_attempts: u32 = parse_or(&lookup, "MAX_ATTEMPTS", 3)?;
        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&max_attempts) {
            anyhow::bail!("MAX_ATTEMPTS must be within 1..={MAX_ATTEMPTS_LIMIT}");
        }
        let simulated_failure_rate: f64 = parse_or(&lookup, "SIMULATED_FAILURE_RATE", 0.2)?;
        if !(0.0..=1.0).contains(&simulated_failure_rate) {
            anyhow::bail!("SIMULATED_FAILURE_RATE must be within 0.0..=1.0");
        }

        Ok(Self {
            server_port: lookup("SERVER_PORT").unwrap_or_else(|| "3000".into()),
            database_url: optional("DATABASE_URL"),
            max_attempts,
            backoff_unit_ms: parse_or(&lookup, "BACKOFF_UNIT_MS", 1000)?,
            gateway_url: optional("GATEWAY_URL"),
            gateway_timeout_ms: parse_or(&lookup, "GATEWAY_TIMEOUT_MS", 5000)?,
            simulated_failure_rate,
            simulated_latency_ms: parse_or(&lookup, "SIMULATED_LATENCY_MS", 2000)?,
            notify_url: optional("NOTIFY_URL"),
            partial_batch_response: parse_flag(&lookup, "PARTIAL_BATCH_RESPONSE")?,
            publish_failure_events: parse_flag(&lookup, "PUBLISH_FAILURE_EVENTS")?,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_unit_ms))
    }

    pub fn consumer_options(&self) -> ConsumerOptions {
        ConsumerOptions {
            partial_batch_response: self.partial_batch_response,
            publish_failure_events: self.publish_failure_events,
        }
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }

    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid {key}: {raw:?}")),
        None => Ok(default),
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<bool> {
    match lookup(key).as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
        Some(v) => anyhow::bail!("invalid {key}: {v:?} (expected true/false)"),
    }
}
