//! Versioned save envelope
//!
//! Layout: `{ "version": N, "state": { ... } }`. Version 0 is the layout
//! written before the envelope carried a real version; it decodes unchanged.

use serde::{Deserialize, Serialize};

use super::{PersistedState, PersistenceError};

/// Storage key the blob is saved under
pub const STORAGE_KEY: &str = "vector-voyage-storage";

/// Newest envelope version this build writes
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(default)]
    version: u32,
    state: PersistedState,
}

/// Serialize a state into an envelope
pub fn encode(state: &PersistedState) -> Result<String, PersistenceError> {
    let envelope = Envelope {
        version: SAVE_VERSION,
        state: state.clone(),
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Parse an envelope, rejecting versions from a newer build
pub fn decode(json: &str) -> Result<PersistedState, PersistenceError> {
    let envelope: Envelope = serde_json::from_str(json)?;
    if envelope.version > SAVE_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: envelope.version,
            supported: SAVE_VERSION,
        });
    }
    Ok(envelope.state)
}
