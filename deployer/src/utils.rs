//! Utility functions

use sha2::{Digest, Sha256};

/// `<version> (<git hash>, built <time>)`, as shown by `--version`
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIME"),
    ")"
);

/// Calculate SHA256 hash of data as lowercase hex
pub fn sha256_hash(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}
