//! Centralized-exchange address book.
//!
//! Resolves a counterparty address on a chain to a known exchange tag
//! ("binance", "coinbase", ...). The pipeline only needs the lookup
//! capability; `StaticAddressBook` is the in-memory implementation seeded
//! from the built-in table and optional CSV files.

mod builtin;

use crate::domain::ChainKey;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

pub use builtin::BUILTIN_TAGS;

/// Lookup capability used by the CEX flow filter. Must be pure.
pub trait CexAddressBook: Send + Sync {
    fn resolve_tag(&self, chain: &ChainKey, address: &str) -> Option<String>;
}

#[derive(Debug, Error)]
pub enum AddressBookError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("csv parse error: {0}")]
    Csv(String),
}

/// In-memory `(chain, address) -> tag` map.
#[derive(Debug, Clone, Default)]
pub struct StaticAddressBook {
    map: HashMap<(ChainKey, String), String>,
}

impl StaticAddressBook {
    /// Create an empty address book.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Address book seeded with well-known exchange wallets.
    pub fn builtin() -> Self {
        let mut book = Self::empty();
        for (chain, address, tag) in BUILTIN_TAGS {
            book.insert(&ChainKey::new(chain), address, tag);
        }
        book
    }

    /// Number of known addresses.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Insert or replace a tag. Tags are lower-cased.
    pub fn insert(&mut self, chain: &ChainKey, address: &str, tag: &str) {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            return;
        }
        self.map
            .insert((chain.clone(), normalize_address(address)), tag);
    }

    /// Add rows from a `chain,address,tag` CSV file. Returns rows added.
    pub fn load_csv(&mut self, path: impl AsRef<Path>) -> Result<usize, AddressBookError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| AddressBookError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let count = self.extend_from_reader(file)?;
        tracing::info!("Loaded {} exchange tags from {}", count, path.display());
        Ok(count)
    }

    /// Add rows from any CSV reader with a `chain,address,tag` header.
    pub fn extend_from_reader<R: Read>(&mut self, reader: R) -> Result<usize, AddressBookError> {
        #[derive(Debug, serde::Deserialize)]
        struct Row {
            chain: String,
            address: String,
            tag: Option<String>,
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut count = 0;
        for record in reader.deserialize::<Row>() {
            let row = record.map_err(|e| AddressBookError::Csv(e.to_string()))?;
            let tag = match row.tag.as_deref().map(str::trim) {
                Some(tag) if !tag.is_empty() => tag.to_string(),
                _ => continue,
            };
            if row.address.trim().is_empty() {
                continue;
            }
            self.insert(&ChainKey::new(&row.chain), &row.address, &tag);
            count += 1;
        }
        Ok(count)
    }
}

impl CexAddressBook for StaticAddressBook {
    fn resolve_tag(&self, chain: &ChainKey, address: &str) -> Option<String> {
        self.map
            .get(&(chain.clone(), normalize_address(address)))
            .cloned()
    }
}

/// EVM hex addresses compare case-insensitively; everything else verbatim.
fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        trimmed.to_ascii_lowercase()
    } else {
        trimmed.to_string()
    }
}
