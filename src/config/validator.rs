//! Settings validation.

use crate::error::ConfigError;
use regex::Regex;

/// Accepts unquoted PostgreSQL identifiers (letters, digits, underscore; at most 63 bytes).
pub fn validate_identifier(key: &'static str, value: &str) -> Result<(), ConfigError> {
    let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").map_err(|e| ConfigError::InvalidValue {
        key,
        reason: e.to_string(),
    })?;
    if !re.is_match(value) {
        return Err(ConfigError::InvalidValue {
            key,
            reason: format!("{:?} is not a valid identifier", value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(validate_identifier("K", "crop_planner").is_ok());
        assert!(validate_identifier("K", "_x1").is_ok());
        assert!(validate_identifier("K", "1abc").is_err());
        assert!(validate_identifier("K", "a-b").is_err());
        assert!(validate_identifier("K", &"a".repeat(64)).is_err());
    }
}
