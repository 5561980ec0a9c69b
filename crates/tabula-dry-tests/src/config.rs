// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tabula_app_core::config::{ConfigError, ConfigStore};

/// In-memory [`ConfigStore`] with call counters and failure switches.
///
/// Clones share state, so a test can hand one clone to a `ConfigService` and
/// inspect the other.
///
/// # Example
///
/// ```
/// use tabula_app_core::config::ConfigService;
/// use tabula_app_core::settings::{GatewaySettings, SETTINGS_KEY};
/// use tabula_dry_tests::InMemoryConfigStore;
///
/// let store = InMemoryConfigStore::new();
/// let service = ConfigService::new(store.clone());
/// let settings: GatewaySettings = service.load_or_init(SETTINGS_KEY).unwrap();
/// assert_eq!(settings, GatewaySettings::default());
/// assert!(store.contains_key(SETTINGS_KEY));
/// assert_eq!(store.save_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    data: BTreeMap<String, Vec<u8>>,
    loads: usize,
    saves: usize,
    fail_load: bool,
    fail_save: bool,
}

impl InMemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding `key` with the given JSON text.
    pub fn with_json(key: &str, json: &str) -> Self {
        let store = Self::new();
        store.lock().data.insert(key.to_string(), json.as_bytes().to_vec());
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every `load_raw` fail.
    pub fn set_fail_on_load(&self, fail: bool) {
        self.lock().fail_load = fail;
    }

    /// Make every `save_raw` fail.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.lock().fail_save = fail;
    }

    /// `load_raw` attempts, failed ones included.
    pub fn load_count(&self) -> usize {
        self.lock().loads
    }

    /// `save_raw` attempts, failed ones included.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    /// Whether `key` is stored.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().data.contains_key(key)
    }

    /// Stored bytes of `key` as text.
    pub fn text(&self, key: &str) -> Option<String> {
        self.lock()
            .data
            .get(key)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut state = self.lock();
        state.loads += 1;
        if state.fail_load {
            return Err(ConfigError::Other("simulated load failure".into()));
        }
        state.data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut state = self.lock();
        state.saves += 1;
        if state.fail_save {
            return Err(ConfigError::Other("simulated save failure".into()));
        }
        state.data.insert(key.to_string(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use tabula_app_core::config::ConfigService;
    use tabula_app_core::settings::{GatewaySettings, SETTINGS_KEY};

    #[test]
    fn stored_settings_are_not_overwritten() {
        let store = InMemoryConfigStore::with_json(SETTINGS_KEY, r#"{"max_retries": 5}"#);
        let service = ConfigService::new(store.clone());
        let settings: GatewaySettings = service.load_or_init(SETTINGS_KEY).unwrap();
        assert_eq!(settings.max_retries, 5);
        assert_eq!(store.save_count(), 0);
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn load_failures_propagate() {
        let store = InMemoryConfigStore::new();
        store.set_fail_on_load(true);
        let service = ConfigService::new(store.clone());
        let result = service.load_or_init::<GatewaySettings>(SETTINGS_KEY);
        assert!(matches!(result, Err(ConfigError::Other(_))));
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn failed_saves_count_but_store_nothing() {
        let store = InMemoryConfigStore::new();
        store.set_fail_on_save(true);
        assert!(store.save_raw("gateway", b"{}").is_err());
        assert_eq!(store.save_count(), 1);
        assert!(!store.contains_key("gateway"));
        store.set_fail_on_save(false);
        store.save_raw("gateway", b"{}").unwrap();
        assert_eq!(store.text("gateway").as_deref(), Some("{}"));
    }

    #[test]
    fn clones_share_state() {
        let a = InMemoryConfigStore::new();
        let b = a.clone();
        a.save_raw("k", b"v").unwrap();
        assert_eq!(b.load_raw("k").unwrap(), b"v");
        assert_eq!(b.save_count(), 1);
    }
}
