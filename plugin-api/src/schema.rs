//! Schema types for provider, resource and data source blocks.
//!
//! A [`Schema`] declares the attributes a block accepts. The host uses it to
//! validate configuration before it reaches the provider and to decide when a
//! change forces replacement of a resource.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::diagnostics::{AttributePath, Diagnostics};
use crate::value::{ObjectValue, Value};

/// Placeholder shown instead of sensitive values.
pub const SENSITIVE_PLACEHOLDER: &str = "(sensitive value)";

/// Attribute type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Bool,
    Int64,
    /// List of nested objects with the given attributes.
    ListOfObjects(BTreeMap<String, Attribute>),
}

impl AttributeType {
    fn name(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Bool => "bool",
            AttributeType::Int64 => "number",
            AttributeType::ListOfObjects(_) => "list of objects",
        }
    }
}

/// A single schema attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// A change to this attribute destroys and recreates the resource.
    pub requires_replace: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub markdown_description: String,
}

impl Attribute {
    fn new(attr_type: AttributeType) -> Self {
        Self {
            attr_type,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            requires_replace: false,
            markdown_description: String::new(),
        }
    }

    pub fn required(attr_type: AttributeType) -> Self {
        Self {
            required: true,
            ..Self::new(attr_type)
        }
    }

    pub fn optional(attr_type: AttributeType) -> Self {
        Self {
            optional: true,
            ..Self::new(attr_type)
        }
    }

    pub fn computed(attr_type: AttributeType) -> Self {
        Self {
            computed: true,
            ..Self::new(attr_type)
        }
    }

    pub fn required_string() -> Self {
        Self::required(AttributeType::String)
    }

    pub fn optional_string() -> Self {
        Self::optional(AttributeType::String)
    }

    pub fn computed_string() -> Self {
        Self::computed(AttributeType::String)
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.markdown_description = description.into();
        self
    }

    /// Whether configuration may set this attribute.
    #[inline]
    pub fn is_configurable(&self) -> bool {
        self.required || self.optional
    }
}

/// Schema of a provider, resource or data source block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    pub version: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub markdown_description: String,
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.markdown_description = description.into();
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Validate a configuration object against this schema.
    ///
    /// Unknown values pass; they are checked again once known.
    pub fn validate_config(&self, config: &ObjectValue) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validate_object(&self.attributes, config, None, &mut diags);
        diags
    }

    /// Names of `requires_replace` attributes whose value differs between the
    /// prior state and the planned state.
    pub fn replace_attributes(&self, prior: &ObjectValue, planned: &ObjectValue) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|(_, attr)| attr.requires_replace)
            .filter(|(name, _)| prior.get(name) != planned.get(name))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Copy of `object` keeping only attributes configuration may set.
    ///
    /// Plans and state carry computed attributes; this strips them so the
    /// remainder can go through [`Schema::validate_config`].
    pub fn config_view(&self, object: &ObjectValue) -> ObjectValue {
        object
            .iter()
            .filter(|(name, _)| self.attribute(name).is_none_or(Attribute::is_configurable))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Copy of `object` with known sensitive values replaced by a placeholder.
    pub fn redact(&self, object: &ObjectValue) -> ObjectValue {
        object
            .iter()
            .map(|(name, value)| {
                let sensitive = self.attribute(name).is_some_and(|a| a.sensitive);
                let value = if sensitive && value.is_known() {
                    Value::from(SENSITIVE_PLACEHOLDER)
                } else {
                    value.clone()
                };
                (name.clone(), value)
            })
            .collect()
    }
}

fn child_path(parent: Option<&AttributePath>, name: &str) -> AttributePath {
    match parent {
        Some(p) => p.clone().attribute(name),
        None => AttributePath::root(name),
    }
}

fn validate_object(
    attributes: &BTreeMap<String, Attribute>,
    config: &ObjectValue,
    parent: Option<&AttributePath>,
    diags: &mut Diagnostics,
) {
    for (name, _) in config.iter() {
        if !attributes.contains_key(name) {
            diags.add_attribute_error(
                child_path(parent, name),
                "Unsupported argument",
                format!("An argument named \"{name}\" is not expected here."),
            );
        }
    }

    for (name, attr) in attributes {
        let value = config.get(name);
        let path = child_path(parent, name);

        if attr.required && value.is_null() {
            diags.add_attribute_error(
                path,
                "Missing required argument",
                format!("The argument \"{name}\" is required, but no definition was found."),
            );
            continue;
        }

        if !attr.is_configurable() && !value.is_null() {
            diags.add_attribute_error(
                path,
                "Invalid configuration",
                format!("\"{name}\" is computed by the provider and cannot be set."),
            );
            continue;
        }

        if value.is_known() {
            validate_type(&attr.attr_type, value, path, diags);
        }
    }
}

fn validate_type(
    attr_type: &AttributeType,
    value: &Value,
    path: AttributePath,
    diags: &mut Diagnostics,
) {
    let matches = match (attr_type, value) {
        (AttributeType::String, Value::String(_)) => true,
        (AttributeType::Bool, Value::Bool(_)) => true,
        (AttributeType::Int64, Value::Number(n)) => n.is_i64(),
        (AttributeType::ListOfObjects(nested), Value::List(items)) => {
            for (idx, item) in items.iter().enumerate() {
                let item_path = path.clone().index(idx);
                match item {
                    Value::Object(obj) => validate_object(nested, obj, Some(&item_path), diags),
                    Value::Null | Value::Unknown => {}
                    other => diags.add_attribute_error(
                        item_path,
                        "Incorrect attribute value type",
                        format!("Expected object, got {}.", other.type_name()),
                    ),
                }
            }
            true
        }
        _ => false,
    };

    if !matches {
        diags.add_attribute_error(
            path,
            "Incorrect attribute value type",
            format!(
                "Expected {}, got {}.",
                attr_type.name(),
                value.type_name()
            ),
        );
    }
}
