//! Classified chain events and their USD pricing context.

use serde::{Deserialize, Serialize};

/// Kind of on-chain activity detected for a watched wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Transfer,
    Swap,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Transfer => write!(f, "TRANSFER"),
            EventType::Swap => write!(f, "SWAP"),
        }
    }
}

/// Flow direction relative to the watched wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
}

/// One classified event produced by chain ingestion.
///
/// Only the fields the policy pipeline reads are typed; everything else the
/// classifier attaches rides along in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedEvent {
    pub event_type: EventType,
    pub direction: Direction,
    pub counterparty_address: String,
    #[serde(default)]
    pub dex: Option<String>,
    #[serde(default)]
    pub value_formatted: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ClassifiedEvent {
    pub fn transfer(direction: Direction, counterparty: impl Into<String>) -> Self {
        ClassifiedEvent {
            event_type: EventType::Transfer,
            direction,
            counterparty_address: counterparty.into(),
            dex: None,
            value_formatted: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn swap(direction: Direction, dex: Option<&str>) -> Self {
        ClassifiedEvent {
            event_type: EventType::Swap,
            direction,
            counterparty_address: String::new(),
            dex: dex.map(str::to_string),
            value_formatted: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_value(mut self, value_formatted: impl Into<String>) -> Self {
        self.value_formatted = Some(value_formatted.into());
        self
    }

    pub fn is_transfer(&self) -> bool {
        self.event_type == EventType::Transfer
    }

    pub fn is_swap(&self) -> bool {
        self.event_type == EventType::Swap
    }
}

/// Result of the external USD pricing lookup for one event.
///
/// `usd_unavailable` is authoritative; `usd_amount` may still be `None` when
/// the flag is false (e.g., a token with no price feed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdContext {
    #[serde(default)]
    pub usd_amount: Option<f64>,
    #[serde(default)]
    pub usd_unavailable: bool,
}

impl UsdContext {
    pub fn priced(usd_amount: f64) -> Self {
        UsdContext {
            usd_amount: Some(usd_amount),
            usd_unavailable: false,
        }
    }

    pub fn unavailable() -> Self {
        UsdContext {
            usd_amount: None,
            usd_unavailable: true,
        }
    }

    /// The amount, if present and a real number.
    pub fn finite_amount(&self) -> Option<f64> {
        self.usd_amount.filter(|v| !v.is_nan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_deserialize_keeps_passthrough_fields() {
        let json = r#"{
            "eventType": "SWAP",
            "direction": "IN",
            "counterpartyAddress": "0xabc",
            "dex": "Uniswap V3",
            "valueFormatted": "12.5",
            "tokenSymbol": "PEPE",
            "txHash": "0xdead"
        }"#;
        let event: ClassifiedEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, EventType::Swap);
        assert_eq!(event.direction, Direction::In);
        assert_eq!(event.dex.as_deref(), Some("Uniswap V3"));
        assert_eq!(event.extra.get("tokenSymbol").unwrap(), "PEPE");
        assert_eq!(event.extra.get("txHash").unwrap(), "0xdead");
    }

    #[test]
    fn test_event_missing_optional_fields() {
        let json = r#"{"eventType":"TRANSFER","direction":"OUT","counterpartyAddress":"0x1"}"#;
        let event: ClassifiedEvent = serde_json::from_str(json).unwrap();
        assert!(event.is_transfer());
        assert_eq!(event.dex, None);
        assert_eq!(event.value_formatted, None);
    }

    #[test]
    fn test_usd_context_nan_is_not_finite_amount() {
        let ctx = UsdContext {
            usd_amount: Some(f64::NAN),
            usd_unavailable: false,
        };
        assert_eq!(ctx.finite_amount(), None);
        assert_eq!(UsdContext::priced(10.0).finite_amount(), Some(10.0));
    }
}
