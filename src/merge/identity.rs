//! Identity rules for object-array merges.
//!
//! When two manifests both carry an array of objects, the merge engine must
//! decide which elements represent "the same" logical entity. That decision
//! is context-sensitive: inside a `resources` array identity is name plus
//! type, inside a `responses` array it is the status code, and so on.
//!
//! The table is data, not logic: `IdentityRules::default()` carries exactly
//! the known contexts, and callers can extend it with `with_rule` instead of
//! patching the engine. An unknown context has no rule, and its elements are
//! only ever compared by full deep equality: two objects that share an
//! identity-like field but differ elsewhere are treated as distinct and both
//! kept. That duplication is intentional; it is the conservative behavior
//! for array shapes the table knows nothing about.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::expression::names_equivalent;
use crate::manifest;

/// How to decide whether two objects in an array are the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityKey {
    /// `name` under whitespace normalization, plus exact `type`. Used for
    /// `resources` arrays, where regenerated composed name expressions may
    /// differ only in incidental spacing.
    NormalizedNameAndType,
    /// A single field compared by deep equality (e.g. `statusCode`).
    Field(String),
}

/// Context-keyed identity rule table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRules {
    rules: Vec<(String, IdentityKey)>,
}

impl Default for IdentityRules {
    fn default() -> Self {
        Self {
            rules: vec![
                ("resources".to_string(), IdentityKey::NormalizedNameAndType),
                (
                    "responses".to_string(),
                    IdentityKey::Field("statusCode".to_string()),
                ),
                (
                    "representations".to_string(),
                    IdentityKey::Field("contentType".to_string()),
                ),
                (
                    "templateParameters".to_string(),
                    IdentityKey::Field("name".to_string()),
                ),
            ],
        }
    }
}

impl IdentityRules {
    /// A table with no rules at all; every array context falls back to deep
    /// equality.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Extend the table with an additional context rule.
    pub fn with_rule(mut self, context: impl Into<String>, key: IdentityKey) -> Self {
        self.rules.push((context.into(), key));
        self
    }

    /// The rule registered for `context`, if any.
    pub fn rule_for(&self, context: &str) -> Option<&IdentityKey> {
        self.rules
            .iter()
            .find(|(ctx, _)| ctx == context)
            .map(|(_, key)| key)
    }

    /// Whether `a` and `b` are the same logical entity in the array context
    /// `context`.
    ///
    /// A rule only applies when its required fields are present on both
    /// sides; otherwise (and for unknown contexts) this returns `false` and
    /// the caller falls back to deep-equality handling.
    pub fn is_same(&self, context: Option<&str>, a: &Value, b: &Value) -> bool {
        let Some(rule) = context.and_then(|ctx| self.rule_for(ctx)) else {
            return false;
        };

        match rule {
            IdentityKey::NormalizedNameAndType => {
                let (Some(name_a), Some(name_b)) = (
                    a.get(manifest::NAME).and_then(Value::as_str),
                    b.get(manifest::NAME).and_then(Value::as_str),
                ) else {
                    return false;
                };
                let (Some(type_a), Some(type_b)) = (
                    a.get(manifest::TYPE).and_then(Value::as_str),
                    b.get(manifest::TYPE).and_then(Value::as_str),
                ) else {
                    return false;
                };
                type_a == type_b && names_equivalent(name_a, name_b)
            }
            IdentityKey::Field(field) => match (a.get(field), b.get(field)) {
                (Some(va), Some(vb)) => va == vb,
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resources_identity_requires_type_match() {
        let rules = IdentityRules::default();
        let a = json!({"name": "1", "type": "1", "a": 1});
        let same = json!({"name": "1", "type": "1", "b": 2});
        let other_type = json!({"name": "1", "type": "2"});

        assert!(rules.is_same(Some("resources"), &a, &same));
        assert!(!rules.is_same(Some("resources"), &a, &other_type));
    }

    #[test]
    fn test_resources_identity_is_whitespace_insensitive() {
        let rules = IdentityRules::default();
        let a = json!({"name": "[concat(parameters('s'),'/','api')]", "type": "t"});
        let b = json!({"name": "[ concat( parameters( 's' ) , '/' , 'api' ) ]", "type": "t"});
        assert!(rules.is_same(Some("resources"), &a, &b));
    }

    #[test]
    fn test_rule_needs_fields_on_both_sides() {
        let rules = IdentityRules::default();
        let named = json!({"name": "1", "type": "t"});
        let unnamed = json!({"type": "t"});
        assert!(!rules.is_same(Some("resources"), &named, &unnamed));
    }

    #[test]
    fn test_field_rules() {
        let rules = IdentityRules::default();
        assert!(rules.is_same(
            Some("responses"),
            &json!({"statusCode": 200, "body": "a"}),
            &json!({"statusCode": 200, "body": "b"}),
        ));
        assert!(!rules.is_same(
            Some("responses"),
            &json!({"statusCode": 200}),
            &json!({"statusCode": 404}),
        ));
        assert!(rules.is_same(
            Some("templateParameters"),
            &json!({"name": "p", "required": true}),
            &json!({"name": "p"}),
        ));
    }

    #[test]
    fn test_unknown_context_never_matches() {
        let rules = IdentityRules::default();
        let a = json!({"name": "p", "a": 1});
        let b = json!({"name": "p", "a": 2});
        assert!(!rules.is_same(Some("unknown"), &a, &b));
        assert!(!rules.is_same(None, &a, &b));
    }

    #[test]
    fn test_with_rule_extends_table() {
        let rules = IdentityRules::empty().with_rule("headers", IdentityKey::Field("key".into()));
        assert!(rules.is_same(
            Some("headers"),
            &json!({"key": "Accept", "value": "a"}),
            &json!({"key": "Accept", "value": "b"}),
        ));
        assert!(rules.rule_for("resources").is_none());
    }
}
