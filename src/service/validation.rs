//! Payload validation against the registry's per-field rules.

use crate::error::AppError;
use crate::model::Payload;
use crate::registry::ValidationRule;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create payload. All required fields must be present and non-null.
    pub fn validate(body: &Payload, rules: &HashMap<String, ValidationRule>) -> Result<(), AppError> {
        for (field, rule) in rules {
            let val = body.get(field);
            if rule.required == Some(true) && (val.is_none() || val == Some(&Value::Null)) {
                return Err(AppError::Validation(format!("{} is required", field)));
            }
            if let Some(v) = val {
                validate_field(field, v, rule)?;
            }
        }
        Ok(())
    }

    /// Validate only the fields present in body (for updates). Required fields may be omitted but not nulled.
    pub fn validate_partial(body: &Payload, rules: &HashMap<String, ValidationRule>) -> Result<(), AppError> {
        for (field, v) in body {
            if let Some(rule) = rules.get(field) {
                if rule.required == Some(true) && v.is_null() {
                    return Err(AppError::Validation(format!("{} cannot be null", field)));
                }
                validate_field(field, v, rule)?;
            }
        }
        Ok(())
    }
}

fn validate_field(field: &str, v: &Value, rule: &ValidationRule) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    let text_rule = rule.min_length.is_some() || rule.max_length.is_some() || rule.pattern.is_some() || rule.format.is_some();
    if text_rule && !v.is_string() {
        return Err(AppError::Validation(format!("{} must be a string", field)));
    }
    if let Some(format) = &rule.format {
        validate_format(field, v, format)?;
    }
    if let Some(s) = v.as_str() {
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max as usize {
                return Err(AppError::Validation(format!("{} must be at most {} characters", field, max)));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min as usize {
                return Err(AppError::Validation(format!("{} must be at least {} characters", field, min)));
            }
        }
        if let Some(ref pattern) = rule.pattern {
            let re = Regex::new(pattern).map_err(|_| AppError::Validation(format!("invalid pattern for {}", field)))?;
            if !re.is_match(s) {
                return Err(AppError::Validation(format!("{} does not match required pattern", field)));
            }
        }
    }
    if let Some(ref allowed) = rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            return Err(AppError::Validation(format!(
                "{} must be one of: {}",
                field,
                allowed.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
            )));
        }
    }
    if rule.minimum.is_some() || rule.maximum.is_some() {
        let n = v
            .as_f64()
            .ok_or_else(|| AppError::Validation(format!("{} must be a number", field)))?;
        if let Some(min) = rule.minimum {
            if n < min {
                return Err(AppError::Validation(format!("{} must be at least {}", field, min)));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                return Err(AppError::Validation(format!("{} must be at most {}", field, max)));
            }
        }
    }
    Ok(())
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::String(t)) => s == t,
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn validate_format(field: &str, v: &Value, format: &str) -> Result<(), AppError> {
    match format.to_lowercase().as_str() {
        "uuid" => {
            if let Some(s) = v.as_str() {
                if uuid::Uuid::parse_str(s).is_err() {
                    return Err(AppError::Validation(format!("{} must be a valid UUID", field)));
                }
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EntityKind;
    use serde_json::json;

    fn body(v: Value) -> Payload {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn crop_requires_common_name() {
        let rules = EntityKind::Crop.descriptor().validation;
        assert!(RequestValidator::validate(&body(json!({"commonName": "Tomato"})), &rules).is_ok());
        let err = RequestValidator::validate(&body(json!({"family": "x"})), &rules).unwrap_err();
        assert_eq!(err.to_string(), "commonName is required");
        assert!(RequestValidator::validate(&body(json!({"commonName": ""})), &rules).is_err());
        assert!(RequestValidator::validate(&body(json!({"commonName": 7})), &rules).is_err());
    }

    #[test]
    fn relationship_kind_and_crop_ids() {
        let rules = EntityKind::CropRelationship.descriptor().validation;
        let a = uuid::Uuid::new_v4().to_string();
        let b = uuid::Uuid::new_v4().to_string();
        assert!(RequestValidator::validate(&body(json!({"cropA": a, "cropB": b, "kind": "companion"})), &rules).is_ok());
        assert!(RequestValidator::validate(&body(json!({"cropA": a, "cropB": b, "kind": "friend"})), &rules).is_err());
        assert!(RequestValidator::validate(&body(json!({"cropA": "x", "cropB": b, "kind": "neutral"})), &rules).is_err());
    }

    #[test]
    fn username_must_match_its_pattern() {
        let rules = EntityKind::User.descriptor().validation;
        let ok = body(json!({"username": "ada.lovelace_1", "password": "correct horse"}));
        assert!(RequestValidator::validate(&ok, &rules).is_ok());
        let err = RequestValidator::validate(&body(json!({"username": "ada lovelace", "password": "correct horse"})), &rules)
            .unwrap_err();
        assert_eq!(err.to_string(), "username does not match required pattern");
        assert!(RequestValidator::validate_partial(&body(json!({"username": "ada/../root"})), &rules).is_err());
    }

    #[test]
    fn partial_updates_skip_missing_required_fields() {
        let rules = EntityKind::Location.descriptor().validation;
        assert!(RequestValidator::validate_partial(&body(json!({"latitude": 45.5})), &rules).is_ok());
        assert!(RequestValidator::validate_partial(&body(json!({"latitude": 95})), &rules).is_err());
        assert!(RequestValidator::validate_partial(&body(json!({"longitude": "east"})), &rules).is_err());
        assert!(RequestValidator::validate_partial(&body(json!({"name": null})), &rules).is_err());
        assert!(RequestValidator::validate_partial(&body(json!({"soil": "loam"})), &rules).is_ok());
    }
}
