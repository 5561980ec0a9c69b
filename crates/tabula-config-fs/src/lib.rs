// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `ConfigStore` for Tabula tools (uses platform config dir).

use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tabula_app_core::config::{ConfigError, ConfigStore};

/// Environment variable that replaces the platform config directory.
pub const CONFIG_DIR_ENV: &str = "TABULA_CONFIG_DIR";

/// Store configs as JSON files under the platform config directory.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Create a store rooted at `$TABULA_CONFIG_DIR`, or the user config
    /// directory (e.g., `~/.config/Tabula`) when unset.
    pub fn new() -> Result<Self, ConfigError> {
        let base = match std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => ProjectDirs::from("dev", "tabula", "Tabula")
                .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))?
                .config_dir()
                .to_path_buf(),
        };
        Self::with_base(base)
    }

    /// Create a store rooted at `base`, creating the directory if needed.
    pub fn with_base(base: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let base = base.into();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// Directory holding the config files.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ConfigError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(ConfigError::Invalid {
                key: key.into(),
                message: "config keys must be plain file stems".into(),
            });
        }
        Ok(self.base.join(format!("{key}.json")))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let path = self.path_for(key)?;
        match fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
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
    fn missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::with_base(dir.path()).unwrap();
        assert!(matches!(store.load_raw("gateway"), Err(ConfigError::NotFound)));
    }

    #[test]
    fn saves_land_as_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::with_base(dir.path().join("nested")).unwrap();
        store.save_raw("gateway", b"{}").unwrap();
        assert!(dir.path().join("nested/gateway.json").is_file());
        assert_eq!(store.load_raw("gateway").unwrap(), b"{}");
    }

    #[test]
    fn settings_defaults_are_written_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let service = ConfigService::new(FsConfigStore::with_base(dir.path()).unwrap());
        let settings: GatewaySettings = service.load_or_init(SETTINGS_KEY).unwrap();
        assert_eq!(settings, GatewaySettings::default());
        let written = std::fs::read_to_string(dir.path().join("gateway.json")).unwrap();
        assert!(written.contains("backend_url"));
    }

    #[test]
    fn path_like_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::with_base(dir.path()).unwrap();
        assert!(matches!(
            store.save_raw("../escape", b"x"),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
