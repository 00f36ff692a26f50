//! DEX name canonicalization.

/// Known DEX identifiers, checked in order; first substring match wins.
const KNOWN_DEXES: [&str; 8] = [
    "uniswap",
    "sushiswap",
    "pancakeswap",
    "1inch",
    "curve",
    "balancer",
    "dodo",
    "unknown",
];

/// Map a free-text exchange name to a canonical identifier.
///
/// "Uniswap V3" -> "uniswap", "Pancake_Swap" -> "pancakeswap",
/// "Raydium CLMM" -> "raydiumclmm", "  " -> None.
pub fn canonicalize_dex(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    let compact: String = lowered
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect();

    if let Some(known) = KNOWN_DEXES.iter().find(|known| compact.contains(*known)) {
        return Some((*known).to_string());
    }

    let slug: String = compact.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}
