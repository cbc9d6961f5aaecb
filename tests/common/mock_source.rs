//! In-memory installation source for resolution tests

use async_trait::async_trait;
use gha::error::{Error, Result};
use gha::platform::InstallationSource;
use gha::types::Installation;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves a fixed installation list and counts how often it was asked
pub struct MockInstallationSource {
    installations: Vec<Installation>,
    list_calls: AtomicUsize,
    // Error injection
    error_on_list: Mutex<Option<(u16, String)>>,
}

impl MockInstallationSource {
    /// Create a mock listing `(id, login)` pairs in order
    pub fn new(installations: &[(u64, &str)]) -> Self {
        Self {
            installations: installations
                .iter()
                .map(|(id, login)| Installation {
                    id: *id,
                    account_login: (*login).to_string(),
                })
                .collect(),
            list_calls: AtomicUsize::new(0),
            error_on_list: Mutex::new(None),
        }
    }

    /// Make `list_installations` fail as if the API answered `status`
    pub fn fail_list(&self, status: u16, body: &str) {
        *self.error_on_list.lock().unwrap() = Some((status, body.to_string()));
    }

    /// Number of `list_installations` calls so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InstallationSource for MockInstallationSource {
    async fn list_installations(&self) -> Result<Vec<Installation>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((status, body)) = self.error_on_list.lock().unwrap().clone() {
            return Err(Error::Authority { status, body });
        }
        Ok(self.installations.clone())
    }
}
