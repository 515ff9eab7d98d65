//! Storage key generation.
//!
//! Key format: `<prefix>/<token><ext>`, where the token is 32 random bytes
//! encoded as URL-safe unpadded base64 and the extension comes from the
//! declared media type's subtype.

use std::sync::{Arc, Mutex};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng, TryRngCore};
use thiserror::Error;

/// Number of random bytes in a key token.
pub const TOKEN_BYTES: usize = 32;

/// Extension used when the media type is not `type/subtype`.
const FALLBACK_EXT: &str = ".bin";

/// Failure of an entropy source.
#[derive(Debug, Clone, Error)]
#[error("entropy source failed: {0}")]
pub struct EntropyError(pub String);

/// Source of random bytes for key tokens.
pub trait EntropySource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError>;
}

/// Operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| EntropyError(e.to_string()))
    }
}

/// Deterministic source for tests.
#[derive(Debug)]
pub struct SeededEntropy {
    rng: Mutex<StdRng>,
}

impl SeededEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl EntropySource for SeededEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| EntropyError("seeded rng lock poisoned".to_string()))?;
        rng.fill_bytes(dest);
        Ok(())
    }
}

/// Generates storage keys from media types.
#[derive(Clone)]
pub struct KeyGenerator {
    source: Arc<dyn EntropySource>,
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new(Arc::new(OsEntropy))
    }
}

impl KeyGenerator {
    pub fn new(source: Arc<dyn EntropySource>) -> Self {
        Self { source }
    }

    /// Random key for a file of `media_type`, e.g. `Vx3...Q.mp4`.
    ///
    /// # Panics
    ///
    /// Panics if the entropy source fails. A broken entropy source is not a
    /// condition any caller can recover from.
    pub fn generate_key(&self, media_type: &str) -> String {
        let mut raw = [0u8; TOKEN_BYTES];
        if let Err(e) = self.source.fill(&mut raw) {
            panic!("failed to generate random bytes: {e}");
        }
        let token = URL_SAFE_NO_PAD.encode(raw);
        format!("{}{}", token, media_type_to_ext(media_type))
    }
}

/// File extension for a media type: `.` + subtype, or `.bin`.
pub fn media_type_to_ext(media_type: &str) -> String {
    let parts: Vec<&str> = media_type.split('/').collect();
    if parts.len() != 2 {
        return FALLBACK_EXT.to_string();
    }
    format!(".{}", parts[1])
}

/// Full object key under a classification prefix.
pub fn object_key(prefix: &str, key: &str) -> String {
    format!("{}/{}", prefix, key)
}
