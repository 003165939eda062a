use crate::error::ParseError;
use crate::events::{LogEvent, LogLevel};
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::{Number, Value};
use std::collections::HashMap;

/// Converts raw log lines into typed [`LogEvent`]s.
///
/// Recognizes two timestamp shapes (the stable parsing contract with the
/// bot's log output):
///   - RFC 3339: `2024-01-01T00:00:00Z`
///   - Python logging default: `2024-01-01 00:00:00,123` (assumed UTC)
///
/// Structured fields are pulled from three places in the message:
///   - `key=value` tokens (`id=42`)
///   - embedded JSON object fragments (`{"value": 10500.25}`)
///   - colon-form pairs (`Account value: 10500.25`, `Order status: FILLED`),
///     with the key lowercased and spaces turned into underscores.
///
/// Malformed JSON fragments are non-fatal: the event is produced without the
/// fragment's fields and `parse_degraded` is set.
pub struct LineParser {
    ts_rfc3339: Regex,
    ts_python: Regex,
    level: Regex,
    kv_pair: Regex,
    colon_pair: Regex,
}

impl LineParser {
    pub fn new() -> Self {
        Self {
            ts_rfc3339: Regex::new(
                r"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2}))",
            )
            .expect("static regex"),
            ts_python: Regex::new(r"(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3})")
                .expect("static regex"),
            level: Regex::new(r"\b(DEBUG|INFO|WARNING|WARN|ERROR)\b").expect("static regex"),
            kv_pair: Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)=([^\s,;]+)").expect("static regex"),
            // Key is at most two words so log prefixes ("INFO - ") never leak
            // into it; the value must be a single token after ": ".
            colon_pair: Regex::new(r"([A-Za-z]\w*(?: [A-Za-z]\w*)?)\s*:\s+([^\s,;]+)")
                .expect("static regex"),
        }
    }

    /// Parses one raw line. `received_at` is the injected fallback timestamp
    /// used when the line itself carries none; with neither, this is the only
    /// way parse can fail.
    pub fn parse(
        &self,
        raw_line: &str,
        received_at: Option<DateTime<Utc>>,
    ) -> Result<LogEvent, ParseError> {
        let timestamp = self
            .extract_timestamp(raw_line)
            .or(received_at)
            .ok_or(ParseError::NoTimestamp)?;

        let level = self
            .level
            .captures(raw_line)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<LogLevel>().ok())
            .unwrap_or(LogLevel::Info);

        let mut structured_fields = HashMap::new();
        let mut parse_degraded = false;

        for cap in self.colon_pair.captures_iter(raw_line) {
            let key = normalize_key(&cap[1]);
            structured_fields.insert(key, typed_value(&cap[2]));
        }

        for cap in self.kv_pair.captures_iter(raw_line) {
            structured_fields.insert(cap[1].to_string(), typed_value(&cap[2]));
        }

        // Embedded JSON object fragments win over looser token extraction.
        if let Some(start) = raw_line.find('{') {
            let end = raw_line.rfind('}').map(|e| e + 1).unwrap_or(0);
            if end > start {
                match serde_json::from_str::<Value>(&raw_line[start..end]) {
                    Ok(Value::Object(map)) => {
                        for (k, v) in map {
                            structured_fields.insert(k, v);
                        }
                    }
                    _ => parse_degraded = true,
                }
            } else {
                parse_degraded = true;
            }
        }

        Ok(LogEvent {
            timestamp,
            level,
            raw_message: raw_line.to_string(),
            structured_fields,
            parse_degraded,
        })
    }

    fn extract_timestamp(&self, line: &str) -> Option<DateTime<Utc>> {
        if let Some(cap) = self.ts_rfc3339.captures(line) {
            if let Ok(ts) = DateTime::parse_from_rfc3339(&cap[1]) {
                return Some(ts.with_timezone(&Utc));
            }
        }
        if let Some(cap) = self.ts_python.captures(line) {
            if let Ok(naive) = NaiveDateTime::parse_from_str(&cap[1], "%Y-%m-%d %H:%M:%S,%3f") {
                return Some(naive.and_utc());
            }
        }
        None
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(' ', "_")
}

fn typed_value(token: &str) -> Value {
    // Integers stay integers so ids round-trip without a trailing ".0".
    if let Ok(n) = token.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(n) = token.parse::<f64>() {
        if let Some(num) = Number::from_f64(n) {
            return Value::Number(num);
        }
    }
    Value::String(token.to_string())
}
