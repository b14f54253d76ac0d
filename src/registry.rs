//! Entity registry: the fixed set of document kinds and, per kind, its mutability policy,
//! path segment, storage table, validation rules and sensitive fields.
//!
//! Routing and synchronization both iterate this table; nothing else special-cases a kind.

use serde_json::json;
use std::collections::HashMap;

/// Which CRUD verbs a kind exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutabilityPolicy {
    /// create, read, update, delete
    Full,
    /// create and read only
    ReadOnlyAfterCreate,
}

impl MutabilityPolicy {
    pub fn allows_mutation(self) -> bool {
        matches!(self, MutabilityPolicy::Full)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Crop,
    CropRelationship,
    CropTag,
    User,
    Location,
}

/// Per-field rule checked by `RequestValidator`.
#[derive(Clone, Debug, Default)]
pub struct ValidationRule {
    pub required: Option<bool>,
    pub format: Option<String>,
    pub max_length: Option<u32>,
    pub min_length: Option<u32>,
    pub pattern: Option<String>,
    pub allowed: Option<Vec<serde_json::Value>>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    /// URL segment under `/api` and key in sync payloads.
    pub path_segment: &'static str,
    pub table_name: &'static str,
    pub policy: MutabilityPolicy,
    /// Payload field matched by name lookups, if the kind has one.
    pub name_field: Option<&'static str>,
    /// Payload fields never returned by any endpoint.
    pub sensitive_fields: &'static [&'static str],
    pub validation: HashMap<String, ValidationRule>,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Crop,
        EntityKind::CropRelationship,
        EntityKind::CropTag,
        EntityKind::User,
        EntityKind::Location,
    ];

    pub fn path_segment(self) -> &'static str {
        match self {
            EntityKind::Crop => "crops",
            EntityKind::CropRelationship => "crop-relationships",
            EntityKind::CropTag => "crop-tags",
            EntityKind::User => "users",
            EntityKind::Location => "locations",
        }
    }

    pub fn from_path_segment(segment: &str) -> Option<EntityKind> {
        EntityKind::ALL.into_iter().find(|k| k.path_segment() == segment)
    }

    pub fn policy(self) -> MutabilityPolicy {
        match self {
            EntityKind::User => MutabilityPolicy::ReadOnlyAfterCreate,
            _ => MutabilityPolicy::Full,
        }
    }

    pub fn descriptor(self) -> EntityDescriptor {
        let (table_name, name_field, sensitive_fields, validation): (_, _, &'static [&'static str], _) =
            match self {
                EntityKind::Crop => (
                    "crops",
                    Some("commonName"),
                    &[],
                    rules([("commonName", text_rule(true, 1, 200))]),
                ),
                EntityKind::CropRelationship => (
                    "crop_relationships",
                    None,
                    &[],
                    rules([
                        ("cropA", uuid_rule()),
                        ("cropB", uuid_rule()),
                        (
                            "kind",
                            ValidationRule {
                                required: Some(true),
                                allowed: Some(vec![json!("companion"), json!("competitor"), json!("neutral")]),
                                ..Default::default()
                            },
                        ),
                    ]),
                ),
                EntityKind::CropTag => ("crop_tags", Some("name"), &[], rules([("name", text_rule(true, 1, 100))])),
                EntityKind::User => (
                    "users",
                    Some("username"),
                    &["passwordHash", "passwordSalt"],
                    rules([
                        (
                            "username",
                            ValidationRule {
                                pattern: Some(r"^[A-Za-z0-9_.-]+$".into()),
                                ..text_rule(true, 3, 64)
                            },
                        ),
                        (
                            "password",
                            ValidationRule {
                                required: Some(true),
                                min_length: Some(8),
                                ..Default::default()
                            },
                        ),
                    ]),
                ),
                EntityKind::Location => (
                    "locations",
                    Some("name"),
                    &[],
                    rules([
                        ("name", text_rule(true, 1, 200)),
                        ("latitude", range_rule(-90.0, 90.0)),
                        ("longitude", range_rule(-180.0, 180.0)),
                    ]),
                ),
            };
        EntityDescriptor {
            kind: self,
            path_segment: self.path_segment(),
            table_name,
            policy: self.policy(),
            name_field,
            sensitive_fields,
            validation,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path_segment())
    }
}

fn rules<const N: usize>(entries: [(&str, ValidationRule); N]) -> HashMap<String, ValidationRule> {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn text_rule(required: bool, min: u32, max: u32) -> ValidationRule {
    ValidationRule {
        required: Some(required),
        min_length: Some(min),
        max_length: Some(max),
        ..Default::default()
    }
}

fn uuid_rule() -> ValidationRule {
    ValidationRule {
        required: Some(true),
        format: Some("uuid".into()),
        ..Default::default()
    }
}

fn range_rule(minimum: f64, maximum: f64) -> ValidationRule {
    ValidationRule {
        minimum: Some(minimum),
        maximum: Some(maximum),
        ..Default::default()
    }
}

/// The registry consulted by the router factory and the sync endpoint.
#[derive(Clone, Debug)]
pub struct Registry {
    entries: Vec<EntityDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            entries: EntityKind::ALL.into_iter().map(EntityKind::descriptor).collect(),
        }
    }

    pub fn entries(&self) -> &[EntityDescriptor] {
        &self.entries
    }

    pub fn get(&self, kind: EntityKind) -> &EntityDescriptor {
        // entries follow EntityKind::ALL, which is in declaration order
        &self.entries[kind as usize]
    }

    pub fn by_path(&self, segment: &str) -> Option<&EntityDescriptor> {
        self.entries.iter().find(|e| e.path_segment == segment)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_users_are_read_only_after_create() {
        for kind in EntityKind::ALL {
            let expected = if kind == EntityKind::User {
                MutabilityPolicy::ReadOnlyAfterCreate
            } else {
                MutabilityPolicy::Full
            };
            assert_eq!(kind.policy(), expected, "{kind}");
        }
        assert!(!EntityKind::User.policy().allows_mutation());
    }

    #[test]
    fn path_segments_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_path_segment(kind.path_segment()), Some(kind));
        }
        assert_eq!(EntityKind::from_path_segment("plants"), None);
    }

    #[test]
    fn registry_lookup_by_kind_and_path() {
        let registry = Registry::new();
        assert_eq!(registry.entries().len(), 5);
        assert_eq!(registry.get(EntityKind::CropTag).table_name, "crop_tags");
        assert_eq!(registry.by_path("crop-relationships").map(|e| e.kind), Some(EntityKind::CropRelationship));
        assert!(registry.by_path("login").is_none());
    }

    #[test]
    fn user_credentials_are_sensitive() {
        let users = EntityKind::User.descriptor();
        assert!(users.sensitive_fields.contains(&"passwordHash"));
        assert!(users.sensitive_fields.contains(&"passwordSalt"));
        assert_eq!(EntityKind::Crop.descriptor().name_field, Some("commonName"));
    }
}
