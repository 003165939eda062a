use crate::constants::{fields, markers};
use crate::events::{LogEvent, LogLevel, Signal};
use tracing::debug;

/// One classification rule: inspects an event, emits at most one signal.
type Rule = fn(&LogEvent) -> Option<Signal>;

/// Priority-ordered rule chain; within the chain, first match wins. Kept as
/// an explicit list so each rule stays individually auditable and testable.
const RULES: [(&str, Rule); 3] = [
    ("startup", match_startup),
    ("account_value", match_account_value),
    ("order_status", match_order_status),
];

/// Maps a parsed event to its signals.
///
/// Most lines are not metric-bearing and yield nothing; that is expected and
/// silent. ERROR severity is a signal of its own, independent of the rule
/// chain, so an ERROR-level metric line can yield two signals.
pub fn classify(event: &LogEvent) -> Vec<Signal> {
    let mut signals = Vec::new();

    if event.level == LogLevel::Error {
        signals.push(Signal::Error {
            timestamp: event.timestamp,
        });
    }

    for (name, rule) in RULES {
        if let Some(signal) = rule(event) {
            debug!(rule = name, "classified signal");
            signals.push(signal);
            break;
        }
    }

    signals
}

fn match_startup(event: &LogEvent) -> Option<Signal> {
    if event.raw_message.contains(markers::BOT_STARTED) {
        Some(Signal::Startup {
            timestamp: event.timestamp,
        })
    } else {
        None
    }
}

fn match_account_value(event: &LogEvent) -> Option<Signal> {
    if !event.raw_message.contains(markers::ACCOUNT_VALUE) {
        return None;
    }
    match event.numeric_field(&fields::ACCOUNT_VALUE_KEYS) {
        Some(value) => Some(Signal::AccountValue {
            timestamp: event.timestamp,
            value,
        }),
        None => {
            // Soft failure: marker present but no usable numeric field.
            debug!(line = %event.raw_message, "account value line without numeric field");
            None
        }
    }
}

fn match_order_status(event: &LogEvent) -> Option<Signal> {
    if !event.raw_message.contains(markers::ORDER_STATUS) {
        return None;
    }
    let order_id = match event.text_field(&fields::ORDER_ID_KEYS) {
        Some(id) => id,
        None => {
            debug!(line = %event.raw_message, "order status line without order id");
            return None;
        }
    };
    let token = event.text_field(&fields::ORDER_STATUS_KEYS)?;
    match token.parse() {
        Ok(status) => Some(Signal::OrderStatusChange {
            timestamp: event.timestamp,
            order_id,
            status,
        }),
        Err(()) => {
            // Never guess a status from an unrecognized token.
            debug!(token = %token, "unrecognized order status token");
            None
        }
    }
}
