//! Ephemeral URL Registry
//!
//! Abstracts the platform primitive that turns in-memory bytes into a
//! short-lived URL (`blob:` URLs in a browser) and later revokes it.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Handle errors
#[derive(Debug, Error)]
pub enum HandleError {
    #[error("Unknown handle: {0}")]
    UnknownHandle(String),
    #[error("Allocation failed: {0}")]
    AllocationFailed(String),
    #[error("Registry backend error: {0}")]
    Backend(String),
}

pub type HandleResult<T> = Result<T, HandleError>;

/// Bytes plus the media type they should be served with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Bytes,
    pub media_type: String,
}

impl Blob {
    pub fn new(bytes: impl Into<Bytes>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Registry trait - creates and revokes ephemeral URLs over blobs
#[cfg_attr(test, mockall::automock)]
pub trait ObjectUrlRegistry: Send + Sync {
    /// Allocate a URL that serves the blob until revoked
    fn create_object_url(&self, blob: Blob) -> HandleResult<String>;

    /// Release a URL previously returned by `create_object_url`
    fn revoke_object_url(&self, url: &str) -> HandleResult<()>;

    /// Get registry name for logging
    fn name(&self) -> &str;
}

#[derive(Default)]
struct RegistryState {
    live: HashMap<String, Blob>,
    revocations: HashMap<String, usize>,
    allocated: usize,
}

/// In-memory registry, used outside a browser and in tests
pub struct MemoryUrlRegistry {
    origin: String,
    state: Mutex<RegistryState>,
}

impl Default for MemoryUrlRegistry {
    fn default() -> Self {
        Self::new("portfolio.local")
    }
}

impl MemoryUrlRegistry {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Number of URLs currently allocated and not yet revoked
    pub fn live_count(&self) -> usize {
        self.state.lock().live.len()
    }

    /// Total number of URLs ever allocated
    pub fn allocated_count(&self) -> usize {
        self.state.lock().allocated
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.state.lock().live.contains_key(url)
    }

    /// Blob behind a live URL
    pub fn get(&self, url: &str) -> Option<Blob> {
        self.state.lock().live.get(url).cloned()
    }

    /// How many times a URL has been successfully revoked (0 or 1)
    pub fn revocation_count(&self, url: &str) -> usize {
        self.state
            .lock()
            .revocations
            .get(url)
            .copied()
            .unwrap_or(0)
    }
}

impl ObjectUrlRegistry for MemoryUrlRegistry {
    fn create_object_url(&self, blob: Blob) -> HandleResult<String> {
        let url = format!("blob:{}/{}", self.origin, Uuid::new_v4());
        let size = blob.len();

        let mut state = self.state.lock();
        state.live.insert(url.clone(), blob);
        state.allocated += 1;

        debug!(url = %url, size = size, "Object URL created");
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) -> HandleResult<()> {
        let mut state = self.state.lock();
        if state.live.remove(url).is_none() {
            return Err(HandleError::UnknownHandle(url.to_string()));
        }
        *state.revocations.entry(url.to_string()).or_default() += 1;

        debug!(url = %url, "Object URL revoked");
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
