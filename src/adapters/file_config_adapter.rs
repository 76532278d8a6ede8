//! INI file configuration adapter.
//!
//! Values are parsed strictly: a number that does not parse is reported as
//! `ConfigInvalid` naming the section and key, never replaced by a default.

use crate::domain::error::TradesimError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn typed<T>(
        &self,
        section: &str,
        key: &str,
        kind: &str,
        parsed: Result<Option<T>, String>,
    ) -> Result<Option<T>, TradesimError> {
        parsed.map_err(|_| TradesimError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!(
                "'{}' is not {}",
                self.config.get(section, key).unwrap_or_default(),
                kind
            ),
        })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, TradesimError> {
        self.typed(section, key, "an integer", self.config.getint(section, key))
    }

    fn get_uint(&self, section: &str, key: &str) -> Result<Option<u64>, TradesimError> {
        self.typed(
            section,
            key,
            "a non-negative integer",
            self.config.getuint(section, key),
        )
    }

    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, TradesimError> {
        self.typed(section, key, "a number", self.config.getfloat(section, key))
    }
}
