//! Domain primitives: UserId, WalletId, ChainKey, Recipient.

use serde::{Deserialize, Serialize};

/// Subscriber identifier (chat user id or similar opaque key).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Create a UserId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    /// Get the id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a tracked wallet row belonging to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WalletId(pub String);

impl WalletId {
    /// Create a WalletId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        WalletId(id.into())
    }

    /// Get the id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WalletId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chain key (e.g., "ethereum", "bsc", "tron", "solana").
///
/// Always stored lower-cased and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ChainKey(String);

impl ChainKey {
    /// Create a ChainKey, normalizing case and surrounding whitespace.
    pub fn new(key: impl AsRef<str>) -> Self {
        ChainKey(key.as_ref().trim().to_lowercase())
    }

    /// Get the key as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ChainKey {
    fn from(value: String) -> Self {
        ChainKey::new(value)
    }
}

impl From<ChainKey> for String {
    fn from(value: ChainKey) -> Self {
        value.0
    }
}

impl std::fmt::Display for ChainKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One subscriber watching one wallet: the unit the evaluator decides for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub user_id: UserId,
    pub wallet_id: WalletId,
}

impl Recipient {
    pub fn new(user_id: UserId, wallet_id: WalletId) -> Self {
        Recipient { user_id, wallet_id }
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user_id, self.wallet_id)
    }
}
