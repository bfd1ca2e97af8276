//! Configuration validation.

use super::Config;
use crate::drivers::DialectImpl;
use crate::error::{DumpError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.source.host.is_empty() {
        return Err(DumpError::Config("source.host is required".into()));
    }
    if config.source.database.is_empty() {
        return Err(DumpError::Config("source.database is required".into()));
    }
    if config.source.user.is_empty() {
        return Err(DumpError::Config("source.user is required".into()));
    }
    if config.source.r#type != "mysql" {
        return Err(DumpError::Config(format!(
            "source.type must be 'mysql', got '{}'",
            config.source.r#type
        )));
    }
    if !matches!(
        config.source.ssl_mode.to_lowercase().as_str(),
        "disable" | "preferred" | "required"
    ) {
        return Err(DumpError::Config(format!(
            "source.ssl_mode must be one of disable, preferred, required; got '{}'",
            config.source.ssl_mode
        )));
    }

    if config.dump.batch_size == 0 {
        return Err(DumpError::Config("dump.batch_size must be at least 1".into()));
    }
    DialectImpl::from_db_type(&config.dump.dialect)?;

    Ok(())
}
