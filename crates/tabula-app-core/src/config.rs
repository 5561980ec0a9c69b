// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config service and storage port for Tabula tools.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Storage port for raw config blobs (keyed by logical name).
pub trait ConfigStore {
    /// Load a raw config blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw config blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A value was present but unusable (e.g. a bad override).
    #[error("invalid {key}: {message}")]
    Invalid {
        /// Setting or variable name.
        key: String,
        /// What was wrong with it.
        message: String,
    },
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Serializes config values as JSON and delegates storage to a `ConfigStore`.
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Load and deserialize a config value for `key`. Returns `Ok(None)` if missing.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) => {
                if bytes.is_empty() {
                    return Ok(None);
                }
                let value = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serialize and persist a config value for `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }

    /// Load `key`, or persist `T::default()` under it and return that.
    ///
    /// Defaults are written only when the key is missing, so a user can edit
    /// the generated file afterwards.
    pub fn load_or_init<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Serialize + Default,
    {
        if let Some(value) = self.load(key)? {
            return Ok(value);
        }
        let value = T::default();
        self.save(key, &value)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use serde::Deserialize;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct CellStore {
        data: RefCell<HashMap<String, Vec<u8>>>,
        saves: RefCell<usize>,
    }

    impl ConfigStore for CellStore {
        fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
            self.data.borrow().get(key).cloned().ok_or(ConfigError::NotFound)
        }

        fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
            *self.saves.borrow_mut() += 1;
            self.data.borrow_mut().insert(key.to_string(), data.to_vec());
            Ok(())
        }
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Knobs {
        limit: u32,
    }

    #[test]
    fn missing_and_empty_keys_load_as_none() {
        let service = ConfigService::new(CellStore::default());
        assert!(service.load::<Knobs>("knobs").unwrap().is_none());
        service.store.data.borrow_mut().insert("knobs".into(), Vec::new());
        assert!(service.load::<Knobs>("knobs").unwrap().is_none());
    }

    #[test]
    fn load_or_init_writes_defaults_once() {
        let service = ConfigService::new(CellStore::default());
        let first: Knobs = service.load_or_init("knobs").unwrap();
        assert_eq!(first, Knobs::default());
        service.save("knobs", &Knobs { limit: 7 }).unwrap();
        let second: Knobs = service.load_or_init("knobs").unwrap();
        assert_eq!(second.limit, 7);
        assert_eq!(*service.into_inner().saves.borrow(), 2);
    }

    #[test]
    fn malformed_json_is_a_serde_error() {
        let service = ConfigService::new(CellStore::default());
        service.store.data.borrow_mut().insert("knobs".into(), b"{nope".to_vec());
        assert!(matches!(service.load::<Knobs>("knobs"), Err(ConfigError::Serde(_))));
    }
}
