//! Configuration access port trait.
//!
//! Typed getters return `Ok(None)` for an absent key and `ConfigInvalid` for a
//! key that is present but does not parse.

use crate::domain::error::TradesimError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, TradesimError>;
    fn get_uint(&self, section: &str, key: &str) -> Result<Option<u64>, TradesimError>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, TradesimError>;

    fn int_or(&self, section: &str, key: &str, default: i64) -> Result<i64, TradesimError> {
        Ok(self.get_int(section, key)?.unwrap_or(default))
    }

    fn double_or(&self, section: &str, key: &str, default: f64) -> Result<f64, TradesimError> {
        Ok(self.get_double(section, key)?.unwrap_or(default))
    }
}
