//! Operator-defined field descriptors attached to a project.
//!
//! A project's `custom_fields` column holds an ordered array of
//! [`CustomField`]s. `options` is present exactly when the type is
//! [`FieldType::Select`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Input type of a custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text.
    #[default]
    Text,
    /// Numeric value.
    Number,
    /// Boolean flag.
    Checkbox,
    /// One of an enumerated set of choices.
    Select,
}

impl FieldType {
    /// All types, in the order offered to operators.
    pub const ALL: [Self; 4] = [Self::Text, Self::Number, Self::Checkbox, Self::Select];

    /// Wire name (`"text"`, `"number"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Checkbox => "checkbox",
            Self::Select => "select",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Number => "Number",
            Self::Checkbox => "Checkbox",
            Self::Select => "Select",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown field type: {s}"))
    }
}

/// One custom-field descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    /// Machine name (e.g. `tank_height`).
    pub name: String,
    /// Display label (e.g. `Tank Height`).
    pub label: String,
    /// Input type.
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Whether a value is mandatory.
    #[serde(default)]
    pub required: bool,
    /// Choices, only for [`FieldType::Select`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl CustomField {
    /// Builds a descriptor, keeping `options` only for select fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        field_type: FieldType,
        required: bool,
        options: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type,
            required,
            options: (field_type == FieldType::Select).then_some(options),
        }
    }

    /// Checks that name and label are present.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending field position (1-based).
    pub fn validate(&self, position: usize) -> Result<(), String> {
        if self.label.trim().is_empty() {
            return Err(format!("custom field {position} needs a label"));
        }
        if self.name.trim().is_empty() {
            return Err(format!("custom field {position} needs a name"));
        }
        Ok(())
    }
}

/// Splits a comma-separated choices input, trimming and dropping empties.
#[must_use]
pub fn split_options(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|opt| !opt.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn number_field_serializes_without_options() {
        let field = CustomField::new("tank_height", "Tank Height", FieldType::Number, true, vec![]);
        let Ok(value) = serde_json::to_value(&field) else {
            panic!("serialization failed");
        };
        assert_eq!(
            value,
            json!({"name": "tank_height", "label": "Tank Height", "type": "number", "required": true})
        );
    }

    #[test]
    fn non_select_drops_stale_options() {
        let field = CustomField::new(
            "color",
            "Color",
            FieldType::Text,
            false,
            vec!["red".to_string()],
        );
        assert_eq!(field.options, None);
    }

    #[test]
    fn select_always_carries_options() {
        let field = CustomField::new("shape", "Shape", FieldType::Select, false, vec![]);
        let Ok(value) = serde_json::to_value(&field) else {
            panic!("serialization failed");
        };
        assert_eq!(value["options"], json!([]));
    }

    #[test]
    fn split_options_trims_and_drops_empties() {
        assert_eq!(
            split_options(" rectangular, cylindrical ,, spherical,"),
            vec!["rectangular", "cylindrical", "spherical"]
        );
    }

    #[test]
    fn legacy_rows_without_type_default_to_text() {
        let parsed: Result<CustomField, _> =
            serde_json::from_value(json!({"name": "note", "label": "Note"}));
        let Ok(field) = parsed else {
            panic!("deserialization failed");
        };
        assert_eq!(field.field_type, FieldType::Text);
        assert!(!field.required);
    }

    #[test]
    fn validate_rejects_blank_label() {
        let field = CustomField::new("x", " ", FieldType::Text, false, vec![]);
        assert_eq!(field.validate(2), Err("custom field 2 needs a label".to_string()));
    }

    #[test]
    fn field_type_parses_wire_names() {
        assert_eq!("select".parse::<FieldType>(), Ok(FieldType::Select));
        assert!("radio".parse::<FieldType>().is_err());
    }
}
