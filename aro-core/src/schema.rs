//! Schema - Define type schemas for resource input documents
//!
//! Providers declare a schema for each resource type. The schema validates
//! the user's input document and fills in declared defaults before the
//! document is deserialized into typed settings.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Map with free-form keys
    Map(Box<AttributeType>),
    /// Nested object with a fixed set of attributes
    Object(Vec<AttributeSchema>),
    /// Any value, passed through unchecked
    Any,
}

impl AttributeType {
    /// Enum built from string slices
    pub fn choices(values: &[&str]) -> Self {
        AttributeType::Enum(values.iter().map(|v| v.to_string()).collect())
    }

    pub fn list(inner: AttributeType) -> Self {
        AttributeType::List(Box::new(inner))
    }

    pub fn map(inner: AttributeType) -> Self {
        AttributeType::Map(Box::new(inner))
    }

    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::Any, _) => Ok(()),
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Object(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Object(fields), Value::Object(map)) => {
                let mut errors = Vec::new();
                validate_fields(fields.iter(), map, &mut errors);
                match errors.into_iter().next() {
                    Some(e) => Err(e),
                    None => Ok(()),
                }
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: json_type_name(value).to_string(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Object(_) => "Object".to_string(),
            AttributeType::Any => "Any".to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(n) if n.is_f64() => "Float",
        Value::Number(_) => "Int",
        Value::String(_) => "String",
        Value::Array(_) => "List",
        Value::Object(_) => "Map",
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },

    #[error("Attribute '{name}': {inner}")]
    FieldError { name: String, inner: Box<TypeError> },
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            default: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Validate an input document
    ///
    /// Null values count as absent, matching how YAML renders `key:` with no value.
    pub fn validate(&self, document: &Value) -> Result<(), Vec<TypeError>> {
        let Value::Object(map) = document else {
            return Err(vec![TypeError::TypeMismatch {
                expected: "Map".to_string(),
                got: json_type_name(document).to_string(),
            }]);
        };

        let mut errors = Vec::new();
        validate_fields(self.attributes.values(), map, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Insert declared defaults for absent attributes, recursing into objects and lists
    pub fn apply_defaults(&self, document: &mut Value) {
        if let Value::Object(map) = document {
            apply_field_defaults(self.attributes.values(), map);
        }
    }

    /// Attribute reference, one line per attribute, nested objects indented
    pub fn describe(&self) -> String {
        let mut out = self.resource_type.clone();
        if let Some(desc) = &self.description {
            out.push_str(&format!(": {}", desc));
        }
        out.push('\n');
        describe_fields(self.attributes.values(), 1, &mut out);
        out
    }
}

fn describe_fields<'a>(
    fields: impl Iterator<Item = &'a AttributeSchema>,
    depth: usize,
    out: &mut String,
) {
    let mut fields: Vec<_> = fields.collect();
    fields.sort_by(|a, b| a.name.cmp(&b.name));

    for schema in fields {
        out.push_str(&format!(
            "{}{}: {}",
            "  ".repeat(depth),
            schema.name,
            schema.attr_type
        ));
        if schema.required {
            out.push_str(" (required)");
        }
        if let Some(default) = &schema.default {
            out.push_str(&format!(" [default: {}]", default));
        }
        if let Some(desc) = &schema.description {
            out.push_str(&format!(" - {}", desc));
        }
        out.push('\n');

        let nested = match &schema.attr_type {
            AttributeType::Object(nested) => Some(nested),
            AttributeType::List(inner) | AttributeType::Map(inner) => match inner.as_ref() {
                AttributeType::Object(nested) => Some(nested),
                _ => None,
            },
            _ => None,
        };
        if let Some(nested) = nested {
            describe_fields(nested.iter(), depth + 1, out);
        }
    }
}

fn validate_fields<'a>(
    fields: impl Iterator<Item = &'a AttributeSchema> + Clone,
    map: &serde_json::Map<String, Value>,
    errors: &mut Vec<TypeError>,
) {
    for schema in fields.clone() {
        let present = map.get(&schema.name).is_some_and(|v| !v.is_null());
        if schema.required && !present && schema.default.is_none() {
            errors.push(TypeError::MissingRequired {
                name: schema.name.clone(),
            });
        }
    }

    for (name, value) in map {
        if value.is_null() {
            continue;
        }
        match fields.clone().find(|s| &s.name == name) {
            Some(schema) => {
                if let Err(e) = schema.attr_type.validate(value) {
                    errors.push(TypeError::FieldError {
                        name: name.clone(),
                        inner: Box::new(e),
                    });
                }
            }
            None => errors.push(TypeError::UnknownAttribute { name: name.clone() }),
        }
    }
}

fn apply_field_defaults<'a>(
    fields: impl Iterator<Item = &'a AttributeSchema>,
    map: &mut serde_json::Map<String, Value>,
) {
    for schema in fields {
        let absent = map.get(&schema.name).is_none_or(Value::is_null);
        if absent {
            match &schema.default {
                Some(default) => {
                    map.insert(schema.name.clone(), default.clone());
                }
                None => continue,
            }
        }

        let Some(value) = map.get_mut(&schema.name) else {
            continue;
        };
        match (&schema.attr_type, value) {
            (AttributeType::Object(nested), Value::Object(inner)) => {
                apply_field_defaults(nested.iter(), inner);
            }
            (AttributeType::List(item_type), Value::Array(items)) => {
                if let AttributeType::Object(nested) = item_type.as_ref() {
                    for item in items.iter_mut() {
                        if let Value::Object(inner) = item {
                            apply_field_defaults(nested.iter(), inner);
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| match value.as_i64() {
                Some(n) if n > 0 => Ok(()),
                Some(_) => Err("Value must be positive".to_string()),
                None => Err("Expected integer".to_string()),
            },
        }
    }

    /// CIDR block type (e.g., "10.128.0.0/14")
    pub fn cidr() -> AttributeType {
        AttributeType::Custom {
            name: "Cidr".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value.as_str() {
                Some(s) => validate_cidr(s),
                None => Err("Expected string".to_string()),
            },
        }
    }
}

/// Validate CIDR block format (e.g., "10.0.0.0/16")
pub fn validate_cidr(cidr: &str) -> Result<(), String> {
    let parts: Vec<&str> = cidr.split('/').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid CIDR format '{}': expected IP/prefix",
            cidr
        ));
    }

    let ip = parts[0];
    let prefix = parts[1];

    let octets: Vec<&str> = ip.split('.').collect();
    if octets.len() != 4 {
        return Err(format!("Invalid IP address '{}': expected 4 octets", ip));
    }

    for octet in &octets {
        if octet.parse::<u8>().is_err() {
            return Err(format!(
                "Invalid octet '{}' in IP address: must be 0-255",
                octet
            ));
        }
    }

    match prefix.parse::<u8>() {
        Ok(p) if p <= 32 => Ok(()),
        Ok(p) => Err(format!("Invalid prefix length '{}': must be 0-32", p)),
        Err(_) => Err(format!(
            "Invalid prefix length '{}': must be a number",
            prefix
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile_schema() -> ResourceSchema {
        ResourceSchema::new("cluster")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(
                AttributeSchema::new("state", AttributeType::choices(&["present", "absent"]))
                    .with_default(json!("present")),
            )
            .attribute(
                AttributeSchema::new(
                    "network",
                    AttributeType::Object(vec![
                        AttributeSchema::new("pod_cidr", types::cidr()),
                        AttributeSchema::new("nsg", AttributeType::choices(&["Disabled", "Enabled"]))
                            .with_default(json!("Disabled")),
                    ]),
                )
                .with_default(json!({"pod_cidr": "10.128.0.0/14"})),
            )
            .attribute(AttributeSchema::new(
                "workers",
                AttributeType::list(AttributeType::Object(vec![
                    AttributeSchema::new("subnet_id", AttributeType::String).required(),
                    AttributeSchema::new("count", types::positive_int())
                        .with_default(json!(3)),
                ])),
            ))
    }

    #[test]
    fn describe_lists_attributes_with_descriptions() {
        let schema = profile_schema()
            .with_description("Test cluster")
            .attribute(
                AttributeSchema::new("disk_size", types::positive_int())
                    .with_description("Disk size in GB"),
            );

        let text = schema.describe();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "cluster: Test cluster");
        assert_eq!(lines[1], "  disk_size: PositiveInt - Disk size in GB");
        assert_eq!(lines[2], "  name: String (required)");
        assert!(lines.contains(&"    nsg: Enum(Disabled | Enabled) [default: \"Disabled\"]"));
        assert!(lines.contains(&"    subnet_id: String (required)"));
    }

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&json!("hello")).is_ok());
        assert!(t.validate(&json!(42)).is_err());
    }

    #[test]
    fn validate_enum_type() {
        let t = AttributeType::choices(&["Public", "Private"]);
        assert!(t.validate(&json!("Public")).is_ok());
        assert!(t.validate(&json!("public")).is_err());
    }

    #[test]
    fn any_accepts_everything() {
        let t = AttributeType::map(AttributeType::Any);
        assert!(t.validate(&json!({"a": {"principalId": "p"}, "b": 1})).is_ok());
        assert!(t.validate(&json!("not a map")).is_err());
    }

    #[test]
    fn validate_positive_int() {
        let t = types::positive_int();
        assert!(t.validate(&json!(1)).is_ok());
        assert!(t.validate(&json!(0)).is_err());
        assert!(t.validate(&json!(-1)).is_err());
        assert!(t.validate(&json!("3")).is_err());
    }

    #[test]
    fn validate_cidr_type() {
        let t = types::cidr();
        assert!(t.validate(&json!("10.128.0.0/14")).is_ok());
        assert!(t.validate(&json!("172.30.0.0/16")).is_ok());
        assert!(t.validate(&json!("10.0.0.0")).is_err());
        assert!(t.validate(&json!("10.0.0.0/33")).is_err());
        assert!(t.validate(&json!("10.0.0.256/16")).is_err());
        assert!(t.validate(&json!(42)).is_err());
    }

    #[test]
    fn validate_document() {
        let doc = json!({
            "name": "c1",
            "network": {"pod_cidr": "10.128.0.0/14"},
            "workers": [{"subnet_id": "/s/worker", "count": 3}],
        });
        assert!(profile_schema().validate(&doc).is_ok());
    }

    #[test]
    fn missing_required_attribute() {
        let errors = profile_schema().validate(&json!({})).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, TypeError::MissingRequired { name } if name == "name"))
        );
    }

    #[test]
    fn null_counts_as_missing() {
        let errors = profile_schema()
            .validate(&json!({"name": null}))
            .unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn nested_errors_carry_the_path() {
        let doc = json!({"name": "c1", "workers": [{"count": 3}]});
        let errors = profile_schema().validate(&doc).unwrap_err();
        assert_eq!(
            errors[0].to_string(),
            "Attribute 'workers': List item at index 0: Required attribute 'subnet_id' is missing"
        );
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let doc = json!({"name": "c1", "colour": "blue"});
        let errors = profile_schema().validate(&doc).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, TypeError::UnknownAttribute { name } if name == "colour"))
        );
    }

    #[test]
    fn apply_defaults_fills_nested_values() {
        let mut doc = json!({"name": "c1", "workers": [{"subnet_id": "/s/worker"}]});
        profile_schema().apply_defaults(&mut doc);

        assert_eq!(doc["state"], json!("present"));
        assert_eq!(doc["network"]["pod_cidr"], json!("10.128.0.0/14"));
        assert_eq!(doc["network"]["nsg"], json!("Disabled"));
        assert_eq!(doc["workers"][0]["count"], json!(3));
    }

    #[test]
    fn apply_defaults_keeps_supplied_values() {
        let mut doc = json!({"name": "c1", "state": "absent", "network": {"nsg": "Enabled"}});
        profile_schema().apply_defaults(&mut doc);

        assert_eq!(doc["state"], json!("absent"));
        assert_eq!(doc["network"]["nsg"], json!("Enabled"));
        assert!(doc["network"].get("pod_cidr").is_none());
    }
}
