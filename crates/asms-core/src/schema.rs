use crate::error::UnitError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A JSON-Schema-shaped descriptor for a unit's input or output.
///
/// This is deliberately smaller than a full JSON Schema: it carries only
/// the pieces the Gateway's validator and the MCP Adapter's tool
/// generation actually consume. Units register this dynamically at
/// startup, so it cannot be derived at compile time from a static
/// `Input`/`Output` type the way `schemars::schema::RootSchema` would.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SchemaNode {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<SchemaType>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, SchemaNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
}

impl SchemaNode {
    pub fn object() -> Self {
        Self {
            kind: Some(SchemaType::Object),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, schema: SchemaNode) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn required(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.required = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn string() -> Self {
        Self {
            kind: Some(SchemaType::String),
            ..Default::default()
        }
    }

    pub fn integer() -> Self {
        Self {
            kind: Some(SchemaType::Integer),
            ..Default::default()
        }
    }

    pub fn number() -> Self {
        Self {
            kind: Some(SchemaType::Number),
            ..Default::default()
        }
    }

    pub fn boolean() -> Self {
        Self {
            kind: Some(SchemaType::Boolean),
            ..Default::default()
        }
    }

    pub fn array(items: SchemaNode) -> Self {
        Self {
            kind: Some(SchemaType::Array),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// Validate `input` against this schema: required keys present,
    /// enum membership honored, defaults
    /// materialized, type kinds checked. Returns the materialized input
    /// (with defaults filled in) or the list of violated keys.
    pub fn validate_and_materialize(&self, input: &Value) -> Result<Value, Vec<String>> {
        let mut violations = Vec::new();
        let materialized = self.validate_node("$", input, &mut violations);
        if violations.is_empty() {
            Ok(materialized)
        } else {
            Err(violations)
        }
    }

    fn validate_node(&self, path: &str, value: &Value, violations: &mut Vec<String>) -> Value {
        match self.kind {
            Some(SchemaType::Object) => {
                let mut obj = value.as_object().cloned().unwrap_or_default();
                if !value.is_object() && !value.is_null() {
                    violations.push(path.to_string());
                }
                for key in &self.required {
                    if !obj.contains_key(key) {
                        violations.push(key.clone());
                    }
                }
                for (key, sub_schema) in &self.properties {
                    let child_path = format!("{}.{}", path, key);
                    if let Some(existing) = obj.get(key).cloned() {
                        let validated = sub_schema.validate_node(&child_path, &existing, violations);
                        obj.insert(key.clone(), validated);
                    } else if let Some(default) = &sub_schema.default {
                        obj.insert(key.clone(), default.clone());
                    }
                }
                Value::Object(obj)
            }
            Some(SchemaType::Array) => {
                if !value.is_array() {
                    violations.push(path.to_string());
                    return value.clone();
                }
                let items_schema = self.items.as_deref();
                let arr = value.as_array().cloned().unwrap_or_default();
                let validated: Vec<Value> = arr
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match items_schema {
                        Some(schema) => {
                            schema.validate_node(&format!("{}[{}]", path, i), item, violations)
                        }
                        None => item.clone(),
                    })
                    .collect();
                Value::Array(validated)
            }
            Some(SchemaType::String) => {
                if !value.is_string() {
                    violations.push(path.to_string());
                }
                self.check_enum(path, value, violations);
                value.clone()
            }
            Some(SchemaType::Number) => {
                if !value.is_number() {
                    violations.push(path.to_string());
                }
                value.clone()
            }
            Some(SchemaType::Integer) => {
                if !value.is_i64() && !value.is_u64() {
                    violations.push(path.to_string());
                }
                value.clone()
            }
            Some(SchemaType::Boolean) => {
                if !value.is_boolean() {
                    violations.push(path.to_string());
                }
                value.clone()
            }
            None => value.clone(),
        }
    }

    fn check_enum(&self, path: &str, value: &Value, violations: &mut Vec<String>) {
        if self.enum_values.is_empty() {
            return;
        }
        if !self.enum_values.contains(value) {
            violations.push(path.to_string());
        }
    }
}

/// Convenience wrapper turning a `validate_and_materialize` failure into
/// an `invalid_input` `UnitError`.
pub fn validate_or_error(schema: &SchemaNode, input: &Value) -> Result<Value, UnitError> {
    schema
        .validate_and_materialize(input)
        .map_err(UnitError::invalid_input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_required_key_is_reported() {
        let schema = SchemaNode::object()
            .with_property("name", SchemaNode::string())
            .required(["name"]);

        let err = schema.validate_and_materialize(&json!({})).unwrap_err();
        assert_eq!(err, vec!["name".to_string()]);
    }

    #[test]
    fn defaults_are_materialized() {
        let mut port_schema = SchemaNode::integer();
        port_schema.default = Some(json!(8080));
        let schema = SchemaNode::object().with_property("port", port_schema);

        let materialized = schema.validate_and_materialize(&json!({})).unwrap();
        assert_eq!(materialized["port"], json!(8080));
    }

    #[test]
    fn enum_membership_is_checked() {
        let mut status = SchemaNode::string();
        status.enum_values = vec![json!("on"), json!("off")];
        let schema = SchemaNode::object().with_property("status", status);

        assert!(schema
            .validate_and_materialize(&json!({"status": "on"}))
            .is_ok());
        assert!(schema
            .validate_and_materialize(&json!({"status": "unknown"}))
            .is_err());
    }

    #[test]
    fn type_kind_mismatch_is_reported() {
        let schema = SchemaNode::object().with_property("count", SchemaNode::integer());
        let err = schema
            .validate_and_materialize(&json!({"count": "not a number"}))
            .unwrap_err();
        assert_eq!(err, vec!["$.count".to_string()]);
    }
}
