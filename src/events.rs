use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

/// Severity extracted from a raw log line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(()),
        }
    }
}

/// A single parsed log line. Transient: exists for one classification pass,
/// after which only the derived signals (and replay copies of matching raw
/// lines) are retained.
#[derive(Clone, Debug)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    /// The verbatim line as received. Replay buffers store this untouched.
    pub raw_message: String,
    /// Key/value fragments pulled out of the message: k=v tokens, embedded
    /// JSON objects, and "Label: value" pairs with normalized keys.
    pub structured_fields: HashMap<String, Value>,
    /// Set when a structured fragment was present but malformed. The event
    /// is still usable; classification just sees fewer fields.
    pub parse_degraded: bool,
}

impl LogEvent {
    /// First numeric field found under any of the given keys.
    pub fn numeric_field(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|k| {
            let v = self.structured_fields.get(*k)?;
            match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.parse::<f64>().ok(),
                _ => None,
            }
        })
    }

    /// First string-like field found under any of the given keys.
    pub fn text_field(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| {
            let v = self.structured_fields.get(*k)?;
            match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        })
    }
}

/// Lifecycle status of a tracked order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Open,
        OrderStatus::Filled,
        OrderStatus::Cancelled,
        OrderStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "OPEN",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    /// Strict: unrecognized tokens are an Err, never a guessed status.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(OrderStatus::Open),
            "FILLED" => Ok(OrderStatus::Filled),
            "CANCELLED" | "CANCELED" => Ok(OrderStatus::Cancelled),
            "REJECTED" => Ok(OrderStatus::Rejected),
            _ => Err(()),
        }
    }
}

/// A classified, metric-bearing occurrence derived from one log line.
#[derive(Clone, Debug, PartialEq)]
pub enum Signal {
    Startup {
        timestamp: DateTime<Utc>,
    },
    Error {
        timestamp: DateTime<Utc>,
    },
    AccountValue {
        timestamp: DateTime<Utc>,
        value: f64,
    },
    OrderStatusChange {
        timestamp: DateTime<Utc>,
        order_id: String,
        status: OrderStatus,
    },
}

impl Signal {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Signal::Startup { timestamp }
            | Signal::Error { timestamp }
            | Signal::AccountValue { timestamp, .. }
            | Signal::OrderStatusChange { timestamp, .. } => *timestamp,
        }
    }
}

/// Signal kinds the time-windowed aggregator buckets over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalKind {
    Error,
    AccountValue,
}
