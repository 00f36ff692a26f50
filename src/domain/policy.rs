//! Stored subscriber preferences and the lenient coercions that read them.
//!
//! Stored settings may be stale, legacy-shaped, or hand-edited. Every parser
//! here is total: malformed input collapses to the most permissive value
//! rather than erroring.

use crate::domain::Decimal;
use crate::engine::dex::canonicalize_dex;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Semantic smart-filter type (which kinds of activity the user wants).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SmartFilterType {
    #[default]
    All,
    Buy,
    Sell,
    Transfer,
}

impl SmartFilterType {
    /// Parse a stored value; anything unrecognized is `All`.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("buy") => SmartFilterType::Buy,
            Some("sell") => SmartFilterType::Sell,
            Some("transfer") => SmartFilterType::Transfer,
            Some("all") | None => SmartFilterType::All,
            Some(other) => {
                tracing::debug!("unknown smart_filter_type {:?}, using ALL", other);
                SmartFilterType::All
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SmartFilterType::All => "all",
            SmartFilterType::Buy => "buy",
            SmartFilterType::Sell => "sell",
            SmartFilterType::Transfer => "transfer",
        }
    }
}

/// CEX inflow/outflow alerting mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CexFlowMode {
    #[default]
    Off,
    In,
    Out,
    All,
}

impl CexFlowMode {
    /// Parse a stored value; anything unrecognized is `Off`.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("in") | Some("inflow") => CexFlowMode::In,
            Some("out") | Some("outflow") => CexFlowMode::Out,
            Some("all") | Some("any") => CexFlowMode::All,
            Some("off") | None => CexFlowMode::Off,
            Some(other) => {
                tracing::debug!("unknown cex_flow_mode {:?}, using OFF", other);
                CexFlowMode::Off
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CexFlowMode::Off => "off",
            CexFlowMode::In => "in",
            CexFlowMode::Out => "out",
            CexFlowMode::All => "all",
        }
    }
}

/// Per subscriber x chain alert policy.
///
/// Thresholds are always finite and `>= 0`; DEX lists always hold canonical,
/// de-duplicated identifiers. Both are enforced by the constructors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPolicy {
    threshold_usd: f64,
    min_amount_usd: f64,
    pub cex_flow_mode: CexFlowMode,
    pub smart_filter_type: SmartFilterType,
    include_dexes: Vec<String>,
    exclude_dexes: Vec<String>,
    pub quiet_from: Option<String>,
    pub quiet_to: Option<String>,
    pub timezone: String,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        AlertPolicy {
            threshold_usd: 0.0,
            min_amount_usd: 0.0,
            cex_flow_mode: CexFlowMode::Off,
            smart_filter_type: SmartFilterType::All,
            include_dexes: Vec::new(),
            exclude_dexes: Vec::new(),
            quiet_from: None,
            quiet_to: None,
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

impl AlertPolicy {
    pub fn with_thresholds(mut self, threshold_usd: f64, min_amount_usd: f64) -> Self {
        self.threshold_usd = coerce_usd_threshold(threshold_usd);
        self.min_amount_usd = coerce_usd_threshold(min_amount_usd);
        self
    }

    pub fn with_cex_flow_mode(mut self, mode: CexFlowMode) -> Self {
        self.cex_flow_mode = mode;
        self
    }

    pub fn with_smart_filter(mut self, filter: SmartFilterType) -> Self {
        self.smart_filter_type = filter;
        self
    }

    /// Set the DEX lists, canonicalizing every entry.
    pub fn with_dex_lists<I, E, S, T>(mut self, include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        self.include_dexes = normalize_dex_list(include);
        self.exclude_dexes = normalize_dex_list(exclude);
        self
    }

    pub fn with_quiet_hours(mut self, from: &str, to: &str, timezone: &str) -> Self {
        self.quiet_from = Some(from.to_string());
        self.quiet_to = Some(to.to_string());
        self.timezone = timezone.to_string();
        self
    }

    pub fn threshold_usd(&self) -> f64 {
        self.threshold_usd
    }

    pub fn min_amount_usd(&self) -> f64 {
        self.min_amount_usd
    }

    pub fn include_dexes(&self) -> &[String] {
        &self.include_dexes
    }

    pub fn exclude_dexes(&self) -> &[String] {
        &self.exclude_dexes
    }

    /// True when either the current or the legacy USD threshold is set.
    pub fn has_usd_threshold(&self) -> bool {
        self.threshold_usd > 0.0 || self.min_amount_usd > 0.0
    }
}

/// Alert policy exactly as stored, before coercion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAlertPolicy {
    pub threshold_usd: Option<String>,
    pub min_amount_usd: Option<String>,
    pub cex_flow_mode: Option<String>,
    pub smart_filter_type: Option<String>,
    pub include_dexes: Option<String>,
    pub exclude_dexes: Option<String>,
    pub quiet_from: Option<String>,
    pub quiet_to: Option<String>,
    pub timezone: Option<String>,
}

impl RawAlertPolicy {
    /// Coerce into a policy. Never fails.
    pub fn into_policy(self, default_timezone: &str) -> AlertPolicy {
        let timezone = self
            .timezone
            .map(|tz| tz.trim().to_string())
            .filter(|tz| !tz.is_empty())
            .unwrap_or_else(|| default_timezone.to_string());

        AlertPolicy {
            threshold_usd: parse_usd_threshold(self.threshold_usd.as_deref()),
            min_amount_usd: parse_usd_threshold(self.min_amount_usd.as_deref()),
            cex_flow_mode: CexFlowMode::parse_lenient(self.cex_flow_mode.as_deref()),
            smart_filter_type: SmartFilterType::parse_lenient(self.smart_filter_type.as_deref()),
            include_dexes: parse_dex_list(self.include_dexes.as_deref()),
            exclude_dexes: parse_dex_list(self.exclude_dexes.as_deref()),
            quiet_from: non_blank(self.quiet_from),
            quiet_to: non_blank(self.quiet_to),
            timezone,
        }
    }
}

/// Subscriber-wide preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalPreferences {
    /// Legacy native-unit minimum; non-positive disables it.
    pub min_amount: Decimal,
    pub allow_transfer: bool,
    pub allow_swap: bool,
    pub muted_until: Option<DateTime<Utc>>,
}

impl Default for GlobalPreferences {
    fn default() -> Self {
        GlobalPreferences {
            min_amount: Decimal::zero(),
            allow_transfer: true,
            allow_swap: true,
            muted_until: None,
        }
    }
}

impl GlobalPreferences {
    pub fn is_muted_at(&self, now: DateTime<Utc>) -> bool {
        self.muted_until.is_some_and(|until| until > now)
    }
}

/// Per-wallet event-type toggles. When present, replaces both global flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletOverride {
    pub allow_transfer: bool,
    pub allow_swap: bool,
}

/// Time-bounded total silence for one wallet on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveMute {
    pub mute_until: DateTime<Utc>,
}

impl ActiveMute {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.mute_until > now
    }
}

/// Clamp a USD threshold: non-finite or negative values become 0.
pub fn coerce_usd_threshold(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Parse a stored USD threshold; unparseable text becomes 0.
pub fn parse_usd_threshold(raw: Option<&str>) -> f64 {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => match s.parse::<f64>() {
            Ok(v) => coerce_usd_threshold(v),
            Err(_) => {
                tracing::debug!("unparseable usd threshold {:?}, using 0", s);
                0.0
            }
        },
        None => 0.0,
    }
}

/// Parse a stored DEX list (JSON array or comma-separated) into canonical ids.
pub fn parse_dex_list(raw: Option<&str>) -> Vec<String> {
    let raw = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s,
        None => return Vec::new(),
    };

    if raw.starts_with('[') {
        if let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(raw) {
            return normalize_dex_list(values.iter().filter_map(|v| v.as_str()));
        }
        tracing::debug!("dex list is not valid JSON, splitting on commas: {:?}", raw);
    }

    let trimmed = raw.trim_start_matches('[').trim_end_matches(']');
    normalize_dex_list(trimmed.split(',').map(|s| s.trim().trim_matches('"')))
}

/// Canonicalize, drop empties, and de-duplicate preserving first occurrence.
pub fn normalize_dex_list<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter_map(|e| canonicalize_dex(e.as_ref()))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_smart_filter_parse_lenient() {
        assert_eq!(SmartFilterType::parse_lenient(Some("BUY")), SmartFilterType::Buy);
        assert_eq!(SmartFilterType::parse_lenient(Some(" sell ")), SmartFilterType::Sell);
        assert_eq!(
            SmartFilterType::parse_lenient(Some("transfer")),
            SmartFilterType::Transfer
        );
        assert_eq!(SmartFilterType::parse_lenient(Some("whales")), SmartFilterType::All);
        assert_eq!(SmartFilterType::parse_lenient(None), SmartFilterType::All);
    }

    #[test]
    fn test_cex_mode_parse_lenient() {
        assert_eq!(CexFlowMode::parse_lenient(Some("in")), CexFlowMode::In);
        assert_eq!(CexFlowMode::parse_lenient(Some("OUTFLOW")), CexFlowMode::Out);
        assert_eq!(CexFlowMode::parse_lenient(Some("any")), CexFlowMode::All);
        assert_eq!(CexFlowMode::parse_lenient(Some("sideways")), CexFlowMode::Off);
        assert_eq!(CexFlowMode::parse_lenient(None), CexFlowMode::Off);
    }

    #[test]
    fn test_usd_threshold_coercion() {
        assert_eq!(parse_usd_threshold(Some("1500.5")), 1500.5);
        assert_eq!(parse_usd_threshold(Some("-20")), 0.0);
        assert_eq!(parse_usd_threshold(Some("lots")), 0.0);
        assert_eq!(parse_usd_threshold(Some("NaN")), 0.0);
        assert_eq!(parse_usd_threshold(Some("inf")), 0.0);
        assert_eq!(parse_usd_threshold(None), 0.0);
        assert_eq!(coerce_usd_threshold(-1.0), 0.0);
    }

    #[test]
    fn test_dex_list_json_and_csv() {
        assert_eq!(
            parse_dex_list(Some(r#"["Uniswap V3", "uniswap", "PancakeSwap", null]"#)),
            vec!["uniswap", "pancakeswap"]
        );
        assert_eq!(
            parse_dex_list(Some("Curve Finance, 1inch ,,Raydium")),
            vec!["curve", "1inch", "raydium"]
        );
        assert!(parse_dex_list(Some("   ")).is_empty());
        assert!(parse_dex_list(None).is_empty());
    }

    #[test]
    fn test_dex_list_broken_json_falls_back_to_split() {
        assert_eq!(
            parse_dex_list(Some(r#"["curve", "balancer""#)),
            vec!["curve", "balancer"]
        );
    }

    #[test]
    fn test_raw_policy_coercion() {
        let raw = RawAlertPolicy {
            threshold_usd: Some("-5".to_string()),
            min_amount_usd: Some("250".to_string()),
            cex_flow_mode: Some("bogus".to_string()),
            smart_filter_type: Some("Sell".to_string()),
            include_dexes: Some(r#"["SushiSwap"]"#.to_string()),
            exclude_dexes: None,
            quiet_from: Some("  ".to_string()),
            quiet_to: Some("07:00".to_string()),
            timezone: None,
        };
        let policy = raw.into_policy("Europe/Berlin");
        assert_eq!(policy.threshold_usd(), 0.0);
        assert_eq!(policy.min_amount_usd(), 250.0);
        assert!(policy.has_usd_threshold());
        assert_eq!(policy.cex_flow_mode, CexFlowMode::Off);
        assert_eq!(policy.smart_filter_type, SmartFilterType::Sell);
        assert_eq!(policy.include_dexes(), ["sushiswap"]);
        assert_eq!(policy.quiet_from, None);
        assert_eq!(policy.quiet_to.as_deref(), Some("07:00"));
        assert_eq!(policy.timezone, "Europe/Berlin");
    }

    #[test]
    fn test_mutes_compare_against_now() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 4, 30, 12, 0, 0).unwrap();

        assert!(ActiveMute { mute_until: later }.is_active_at(now));
        assert!(!ActiveMute { mute_until: earlier }.is_active_at(now));
        assert!(!ActiveMute { mute_until: now }.is_active_at(now));

        let prefs = GlobalPreferences {
            muted_until: Some(later),
            ..GlobalPreferences::default()
        };
        assert!(prefs.is_muted_at(now));
        assert!(!GlobalPreferences::default().is_muted_at(now));
    }
}
