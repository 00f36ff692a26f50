//! Built-in table of well-known exchange hot/deposit wallets.

/// `(chain, address, tag)` rows loaded by `StaticAddressBook::builtin`.
pub const BUILTIN_TAGS: &[(&str, &str, &str)] = &[
    ("ethereum", "0x28C6c06298d514Db089934071355E5743bf21d60", "binance"),
    ("ethereum", "0x21a31Ee1afC51d94C2eFcCAa2092aD1028285549", "binance"),
    ("ethereum", "0xDFd5293D8e347dFe59E90eFd55b2956a1343963d", "binance"),
    ("ethereum", "0xF977814e90dA44bFA03b6295A0616a897441aceC", "binance"),
    ("ethereum", "0x71660c4005BA85c37ccec55d0C4493E66Fe775d3", "coinbase"),
    ("ethereum", "0x503828976D22510aad0201ac7EC88293211D23Da", "coinbase"),
    ("ethereum", "0xA9D1e08C7793af67e9d92fe308d5697FB81d3E43", "coinbase"),
    ("ethereum", "0x2910543Af39abA0Cd09dBb2D50200b3E800A63D2", "kraken"),
    ("ethereum", "0x6cC5F688a315f3dC28A7781717a9A798a59fDA7b", "okx"),
    ("bsc", "0x8894E0a0c962CB723c1976a4421c95949bE2D4E3", "binance"),
    ("bsc", "0xF977814e90dA44bFA03b6295A0616a897441aceC", "binance"),
    ("tron", "TV6MuMXfmLbBqPZvBHdwFsDnQeVfnmiuSi", "binance"),
    ("solana", "5tzFkiKscXHK5ZXCGbXZxdw7gTjjD1mBwuoFbhUvuAi9", "binance"),
    ("solana", "H8sMJSCQxfKiFTCfDR3DUMLPwcRbM61LGFJ8N4dK3WjS", "coinbase"),
];
