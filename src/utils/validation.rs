use crate::utils::error::{ImportError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ImportError::Configuration {
            message: format!("{} cannot be empty or whitespace-only", field_name),
        });
    }
    Ok(())
}

pub fn validate_non_empty_map<K, V>(
    field_name: &str,
    map: &std::collections::HashMap<K, V>,
) -> Result<()> {
    if map.is_empty() {
        return Err(ImportError::Configuration {
            message: format!("{} must contain at least one entry", field_name),
        });
    }
    Ok(())
}
