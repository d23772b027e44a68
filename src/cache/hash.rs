// src/cache/hash.rs

use std::fmt;

use blake3::Hasher;

/// Fingerprint of a script body, used only as a cache key.
///
/// BLAKE3 over the full UTF-8 text, rendered as lowercase hex. The same
/// text always yields the same key, within and across processes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScriptHash(String);

impl ScriptHash {
    pub fn of(script: &str) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(script.as_bytes());
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
