//! Static action catalog and argument validation.
//!
//! Every operation the orchestrator can perform is declared once in a
//! compile-time table (see `actions`). Each entry carries its parameter
//! schema, a description used in provider prompts, and a safety tier that
//! decides whether execution requires interactive confirmation.

mod actions;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub use actions::ACTIONS;

/// Safety classification for an action.
///
/// Safe and Moderate actions execute immediately; Dangerous actions are
/// gated behind confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyTier {
    Safe,
    Moderate,
    Dangerous,
}

impl SafetyTier {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SafetyTier::Safe => "safe",
            SafetyTier::Moderate => "moderate",
            SafetyTier::Dangerous => "dangerous",
        }
    }

    pub const fn requires_confirmation(&self) -> bool {
        matches!(self, SafetyTier::Dangerous)
    }
}

impl fmt::Display for SafetyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declared type of a single action parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Whole number, optionally bounded on either side.
    Integer { min: Option<i64>, max: Option<i64> },
    /// Free-form text.
    Text,
    /// Boolean flag.
    Flag,
    /// One of a fixed set of allowed values (matched case-insensitively).
    Choice(&'static [&'static str]),
    /// List of free-form strings.
    TextList,
    /// Name or numeric id referencing an existing entity (channel, role,
    /// member). Numbers are normalized to their string form.
    Reference,
}

impl ParamType {
    fn expected(&self) -> &'static str {
        match self {
            ParamType::Integer { .. } => "integer",
            ParamType::Text => "string",
            ParamType::Flag => "boolean",
            ParamType::Choice(_) => "enum",
            ParamType::TextList => "string list",
            ParamType::Reference => "name or id",
        }
    }
}

/// One parameter in an action's schema.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
    pub description: &'static str,
}

/// Immutable description of a single orchestratable action.
#[derive(Debug, Clone, Copy)]
pub struct ActionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub tier: SafetyTier,
    pub params: &'static [ParamSpec],
}

impl ActionSpec {
    fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// Schema surface advertised to model providers for one action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Arguments that passed catalog validation, normalized per parameter type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedArguments(pub Map<String, Value>);

impl ValidatedArguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn str_arg(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validation failures. These are terminal: an invocation that fails
/// validation is never retried or executed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("unknown parameter '{param}' for action '{action}'")]
    UnknownParam { action: String, param: String },
    #[error("missing required parameter '{param}' for action '{action}'")]
    MissingParam { action: String, param: String },
    #[error("parameter '{param}': expected {expected}")]
    TypeMismatch {
        param: String,
        expected: &'static str,
    },
    #[error("parameter '{param}': {detail}")]
    ConstraintViolation { param: String, detail: String },
}

/// Read-only view over the static action table.
pub struct ActionCatalog;

impl ActionCatalog {
    /// Look up an action by name.
    pub fn lookup(name: &str) -> Option<&'static ActionSpec> {
        ACTIONS.iter().find(|a| a.name == name)
    }

    /// Ordered descriptors for every action, with JSON schemas suitable for
    /// provider function-calling surfaces.
    pub fn describe_all() -> Vec<ActionDescriptor> {
        ACTIONS.iter().map(descriptor_for).collect()
    }

    /// Validate and normalize a raw argument map against an action's schema.
    ///
    /// Strict on both sides: unknown parameters are rejected and required
    /// parameters must be present. Values are coerced per the declared
    /// `ParamType` and returned in normalized form.
    pub fn validate(
        name: &str,
        raw: &Map<String, Value>,
    ) -> Result<ValidatedArguments, ValidationError> {
        let spec = Self::lookup(name).ok_or_else(|| ValidationError::UnknownAction(name.into()))?;

        for key in raw.keys() {
            if spec.param(key).is_none() {
                return Err(ValidationError::UnknownParam {
                    action: spec.name.into(),
                    param: key.clone(),
                });
            }
        }

        let mut out = Map::new();
        for param in spec.params {
            match raw.get(param.name) {
                Some(value) => {
                    let normalized = coerce(param, value)?;
                    out.insert(param.name.to_string(), normalized);
                }
                None if param.required => {
                    return Err(ValidationError::MissingParam {
                        action: spec.name.into(),
                        param: param.name.into(),
                    });
                }
                None => {}
            }
        }

        Ok(ValidatedArguments(out))
    }
}

fn descriptor_for(spec: &ActionSpec) -> ActionDescriptor {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in spec.params {
        properties.insert(param.name.to_string(), param_schema(param));
        if param.required {
            required.push(Value::String(param.name.to_string()));
        }
    }
    ActionDescriptor {
        name: spec.name.to_string(),
        description: spec.description.to_string(),
        input_schema: json!({
            "type": "object",
            "properties": Value::Object(properties),
            "required": Value::Array(required),
        }),
    }
}

fn param_schema(param: &ParamSpec) -> Value {
    match param.ty {
        ParamType::Integer { min, max } => {
            let mut schema = json!({
                "type": "integer",
                "description": param.description,
            });
            if let Some(min) = min {
                schema["minimum"] = json!(min);
            }
            if let Some(max) = max {
                schema["maximum"] = json!(max);
            }
            schema
        }
        ParamType::Text | ParamType::Reference => json!({
            "type": "string",
            "description": param.description,
        }),
        ParamType::Flag => json!({
            "type": "boolean",
            "description": param.description,
        }),
        ParamType::Choice(values) => json!({
            "type": "string",
            "description": param.description,
            "enum": values,
        }),
        ParamType::TextList => json!({
            "type": "array",
            "description": param.description,
            "items": { "type": "string" },
        }),
    }
}

fn coerce(param: &ParamSpec, value: &Value) -> Result<Value, ValidationError> {
    let mismatch = || ValidationError::TypeMismatch {
        param: param.name.into(),
        expected: param.ty.expected(),
    };

    match param.ty {
        ParamType::Integer { min, max } => {
            let n = match value {
                Value::Number(n) => n.as_i64().ok_or_else(mismatch)?,
                Value::String(s) => s.trim().parse::<i64>().map_err(|_| mismatch())?,
                _ => return Err(mismatch()),
            };
            if min.map_or(false, |m| n < m) || max.map_or(false, |m| n > m) {
                return Err(ValidationError::ConstraintViolation {
                    param: param.name.into(),
                    detail: format!(
                        "{n} outside allowed range {}..={}",
                        min.map_or("-inf".into(), |m| m.to_string()),
                        max.map_or("+inf".into(), |m| m.to_string()),
                    ),
                });
            }
            Ok(json!(n))
        }
        ParamType::Text => match value {
            Value::String(s) if !s.trim().is_empty() => Ok(Value::String(s.clone())),
            Value::String(_) => Err(ValidationError::ConstraintViolation {
                param: param.name.into(),
                detail: "must not be empty".into(),
            }),
            _ => Err(mismatch()),
        },
        ParamType::Flag => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            _ => Err(mismatch()),
        },
        ParamType::Choice(allowed) => {
            let Value::String(s) = value else {
                return Err(mismatch());
            };
            let canonical = allowed
                .iter()
                .find(|a| a.eq_ignore_ascii_case(s.trim()))
                .ok_or_else(|| ValidationError::ConstraintViolation {
                    param: param.name.into(),
                    detail: format!("'{s}' is not one of {allowed:?}"),
                })?;
            Ok(Value::String(canonical.to_string()))
        }
        ParamType::TextList => {
            let Value::Array(items) = value else {
                return Err(mismatch());
            };
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => out.push(Value::String(s.clone())),
                    _ => return Err(mismatch()),
                }
            }
            Ok(Value::Array(out))
        }
        ParamType::Reference => match value {
            Value::String(s) if !s.trim().is_empty() => Ok(Value::String(s.clone())),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            _ => Err(mismatch()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn table_has_unique_names() {
        for (i, a) in ACTIONS.iter().enumerate() {
            for b in &ACTIONS[i + 1..] {
                assert_ne!(a.name, b.name, "duplicate action name");
            }
        }
    }

    #[test]
    fn lookup_known_and_unknown() {
        assert!(ActionCatalog::lookup("list_channels").is_some());
        assert!(ActionCatalog::lookup("explode_server").is_none());
    }

    #[test]
    fn validate_accepts_well_formed_arguments_unchanged() {
        let raw = args(&[
            ("channel_name", json!("general")),
            ("channel_type", json!("text")),
        ]);
        let validated = ActionCatalog::validate("create_channel", &raw).unwrap();
        assert_eq!(validated.str_arg("channel_name"), Some("general"));
        assert_eq!(validated.str_arg("channel_type"), Some("text"));
    }

    #[test]
    fn validate_rejects_missing_required() {
        let err = ActionCatalog::validate("create_channel", &Map::new()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingParam {
                action: "create_channel".into(),
                param: "channel_name".into(),
            }
        );
    }

    #[test]
    fn validate_rejects_unknown_parameter() {
        let raw = args(&[("channel_name", json!("x")), ("bogus", json!(1))]);
        let err = ActionCatalog::validate("create_channel", &raw).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownParam { .. }));
    }

    #[test]
    fn validate_rejects_unknown_action() {
        let err = ActionCatalog::validate("nope", &Map::new()).unwrap_err();
        assert_eq!(err, ValidationError::UnknownAction("nope".into()));
    }

    #[test]
    fn integer_coercion_accepts_numeric_strings() {
        let raw = args(&[
            ("member", json!("spambot")),
            ("delete_message_days", json!("3")),
        ]);
        let validated = ActionCatalog::validate("ban_member", &raw).unwrap();
        assert_eq!(validated.get("delete_message_days"), Some(&json!(3)));
    }

    #[test]
    fn integer_range_constraint_enforced() {
        let raw = args(&[
            ("member", json!("spambot")),
            ("delete_message_days", json!(30)),
        ]);
        let err = ActionCatalog::validate("ban_member", &raw).unwrap_err();
        assert!(matches!(err, ValidationError::ConstraintViolation { .. }));
    }

    #[test]
    fn choice_is_case_insensitive_and_normalized() {
        let raw = args(&[
            ("channel_name", json!("lounge")),
            ("channel_type", json!("VOICE")),
        ]);
        let validated = ActionCatalog::validate("create_channel", &raw).unwrap();
        assert_eq!(validated.str_arg("channel_type"), Some("voice"));
    }

    #[test]
    fn choice_rejects_unlisted_value() {
        let raw = args(&[
            ("channel_name", json!("lounge")),
            ("channel_type", json!("forum")),
        ]);
        let err = ActionCatalog::validate("create_channel", &raw).unwrap_err();
        assert!(matches!(err, ValidationError::ConstraintViolation { .. }));
    }

    #[test]
    fn reference_normalizes_numeric_ids() {
        let raw = args(&[("channel", json!(1234567890u64))]);
        let validated = ActionCatalog::validate("delete_channel", &raw).unwrap();
        assert_eq!(validated.str_arg("channel"), Some("1234567890"));
    }

    #[test]
    fn text_list_rejects_mixed_items() {
        let raw = args(&[("banned_words", json!(["spam", 42]))]);
        let err = ActionCatalog::validate("setup_word_filter", &raw).unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { .. }));
    }

    #[test]
    fn descriptors_cover_every_action_in_order() {
        let descriptors = ActionCatalog::describe_all();
        assert_eq!(descriptors.len(), ACTIONS.len());
        for (descriptor, spec) in descriptors.iter().zip(ACTIONS) {
            assert_eq!(descriptor.name, spec.name);
            let schema = &descriptor.input_schema;
            assert_eq!(schema["type"], "object");
            assert!(schema["properties"].is_object());
        }
    }

    #[test]
    fn ban_member_schema_carries_bounds() {
        let descriptors = ActionCatalog::describe_all();
        let ban = descriptors.iter().find(|d| d.name == "ban_member").unwrap();
        let days = &ban.input_schema["properties"]["delete_message_days"];
        assert_eq!(days["minimum"], 0);
        assert_eq!(days["maximum"], 7);
    }
}
