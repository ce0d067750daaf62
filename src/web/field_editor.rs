//! Custom-field editor state carried through form posts.
//!
//! An editor owns an ordered list of fragments and its own key sequence.
//! Keys look like `field-3` (create form) or `edit-field-3` (edit form) and
//! never collide within one editor: an editor rebuilt from a post continues
//! after the largest key it saw, and a key still in use is never handed out.
//!
//! Inputs are named `cf[<key>][label|name|type|required|options]`.

use crate::domain::custom_field::split_options;
use crate::domain::{CustomField, FieldType};
use crate::web::views::options_input;

/// Key prefix of the create form.
pub const CREATE_PREFIX: &str = "field";

/// Key prefix of the edit form.
pub const EDIT_PREFIX: &str = "edit-field";

/// One editable field block, holding raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFragment {
    /// Unique key within the editor.
    pub key: String,
    /// Label input.
    pub label: String,
    /// Name input.
    pub name: String,
    /// Selected type.
    pub field_type: FieldType,
    /// Required checkbox.
    pub required: bool,
    /// Choices input, kept verbatim even when the type hides it.
    pub options: String,
}

impl FieldFragment {
    fn blank(key: String) -> Self {
        Self {
            key,
            label: String::new(),
            name: String::new(),
            field_type: FieldType::Text,
            required: false,
            options: String::new(),
        }
    }

    /// Descriptor for this fragment; choices survive only for selects.
    #[must_use]
    pub fn to_field(&self) -> CustomField {
        CustomField::new(
            self.name.trim(),
            self.label.trim(),
            self.field_type,
            self.required,
            split_options(&self.options),
        )
    }
}

/// Ordered fragments plus the editor's key sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEditor {
    prefix: &'static str,
    next_seq: u64,
    fragments: Vec<FieldFragment>,
}

impl FieldEditor {
    /// Empty editor.
    #[must_use]
    pub const fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            next_seq: 0,
            fragments: Vec::new(),
        }
    }

    /// Editor reconstructed from persisted descriptors, one fragment each.
    #[must_use]
    pub fn from_fields(prefix: &'static str, fields: &[CustomField]) -> Self {
        let mut editor = Self::new(prefix);
        for field in fields {
            let key = editor.next_key();
            editor.fragments.push(FieldFragment {
                key,
                label: field.label.clone(),
                name: field.name.clone(),
                field_type: field.field_type,
                required: field.required,
                options: options_input(field),
            });
        }
        editor
    }

    /// Editor reconstructed from submitted form pairs, in submission order.
    ///
    /// Unknown attributes and unparsable types are ignored (type falls back
    /// to text).
    #[must_use]
    pub fn from_form(prefix: &'static str, pairs: &[(String, String)]) -> Self {
        let mut editor = Self::new(prefix);
        for (input, value) in pairs {
            let Some((key, attr)) = parse_input_name(input) else {
                continue;
            };
            let index = match editor.fragments.iter().position(|f| f.key == key) {
                Some(index) => index,
                None => {
                    editor.fragments.push(FieldFragment::blank(key.to_string()));
                    editor.fragments.len() - 1
                }
            };
            let Some(fragment) = editor.fragments.get_mut(index) else {
                continue;
            };
            match attr {
                "label" => fragment.label.clone_from(value),
                "name" => fragment.name.clone_from(value),
                "type" => fragment.field_type = value.parse().unwrap_or_default(),
                "required" => fragment.required = !value.is_empty(),
                "options" => fragment.options.clone_from(value),
                _ => {}
            }
        }
        editor.next_seq = editor
            .fragments
            .iter()
            .filter_map(|f| key_sequence(&f.key).and_then(|n| n.checked_add(1)))
            .max()
            .unwrap_or(0);
        editor
    }

    /// Next key not held by a live fragment. The sequence wraps at the end
    /// of its range.
    fn next_key(&mut self) -> String {
        loop {
            let key = format!("{}-{}", self.prefix, self.next_seq);
            self.next_seq = self.next_seq.wrapping_add(1);
            if !self.fragments.iter().any(|f| f.key == key) {
                return key;
            }
        }
    }

    /// Appends a blank fragment and returns its key.
    pub fn add(&mut self) -> String {
        let key = self.next_key();
        self.fragments.push(FieldFragment::blank(key.clone()));
        key
    }

    /// Removes the fragment with `key`; returns whether one was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.fragments.len();
        self.fragments.retain(|f| f.key != key);
        self.fragments.len() != before
    }

    /// Current fragments, in order.
    #[must_use]
    pub fn fragments(&self) -> &[FieldFragment] {
        &self.fragments
    }

    /// Every present fragment as a descriptor, in order, complete or not.
    #[must_use]
    pub fn collect(&self) -> Vec<CustomField> {
        self.fragments.iter().map(FieldFragment::to_field).collect()
    }

    /// Descriptors, provided each has a name and a label.
    ///
    /// # Errors
    ///
    /// Returns the first validation message.
    pub fn validated(&self) -> Result<Vec<CustomField>, String> {
        let fields = self.collect();
        for (index, field) in fields.iter().enumerate() {
            field.validate(index.saturating_add(1))?;
        }
        Ok(fields)
    }
}

/// Splits `cf[<key>][<attr>]` into key and attribute.
fn parse_input_name(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_prefix("cf[")?;
    let (key, rest) = rest.split_once("][")?;
    let attr = rest.strip_suffix(']')?;
    (!key.is_empty()).then_some((key, attr))
}

/// Trailing sequence number of a key.
fn key_sequence(key: &str) -> Option<u64> {
    key.rsplit_once('-').and_then(|(_, n)| n.parse().ok())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn added_keys_are_unique_and_ordered() {
        let mut editor = FieldEditor::new(CREATE_PREFIX);
        let a = editor.add();
        let b = editor.add();
        assert_eq!((a.as_str(), b.as_str()), ("field-0", "field-1"));
        assert!(editor.remove(&a));
        let c = editor.add();
        assert_eq!(c, "field-2");
        let keys: Vec<&str> = editor.fragments().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["field-1", "field-2"]);
    }

    #[test]
    fn form_round_trip_continues_sequence() {
        let submitted = pairs(&[
            ("project_name", "Tanks"),
            ("cf[edit-field-7][label]", "Tank Height"),
            ("cf[edit-field-7][name]", "tank_height"),
            ("cf[edit-field-7][type]", "number"),
            ("cf[edit-field-7][required]", "on"),
            ("cf[edit-field-2][label]", "Shape"),
            ("cf[edit-field-2][name]", "shape"),
            ("cf[edit-field-2][type]", "select"),
            ("cf[edit-field-2][options]", "a, b,,"),
        ]);
        let mut editor = FieldEditor::from_form(EDIT_PREFIX, &submitted);
        assert_eq!(editor.fragments().len(), 2);
        let fields = editor.collect();
        assert_eq!(editor.add(), "edit-field-8");

        let Ok(value) = serde_json::to_value(&fields) else {
            panic!("serialization failed");
        };
        assert_eq!(
            value,
            json!([
                {"name": "tank_height", "label": "Tank Height", "type": "number", "required": true},
                {"name": "shape", "label": "Shape", "type": "select", "required": false, "options": ["a", "b"]}
            ])
        );
    }

    #[test]
    fn posted_key_at_end_of_range_is_not_reused() {
        let last = format!("cf[field-{}][label]", u64::MAX);
        let submitted = pairs(&[(last.as_str(), "Depth")]);
        let mut editor = FieldEditor::from_form(CREATE_PREFIX, &submitted);
        let added = editor.add();
        assert_eq!(added, "field-0");
        let keys: Vec<&str> = editor.fragments().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys.len(), 2);
        assert_ne!(keys.first(), keys.get(1));

        assert!(editor.remove(&added));
        assert_eq!(editor.fragments().len(), 1);
    }

    #[test]
    fn sequence_wraps_past_keys_in_use() {
        let before_last = format!("cf[field-{}][label]", u64::MAX - 1);
        let last = format!("cf[field-{}][label]", u64::MAX);
        let submitted = pairs(&[(before_last.as_str(), "A"), (last.as_str(), "B")]);
        let mut editor = FieldEditor::from_form(CREATE_PREFIX, &submitted);
        assert_eq!(editor.add(), "field-0");
        assert_eq!(editor.add(), "field-1");
        assert_eq!(editor.fragments().len(), 4);
    }

    #[test]
    fn stale_options_on_non_select_are_dropped() {
        let submitted = pairs(&[
            ("cf[field-0][label]", "Color"),
            ("cf[field-0][name]", "color"),
            ("cf[field-0][type]", "text"),
            ("cf[field-0][options]", "red, green"),
        ]);
        let editor = FieldEditor::from_form(CREATE_PREFIX, &submitted);
        assert_eq!(editor.collect().first().and_then(|f| f.options.clone()), None);
        assert_eq!(
            editor.fragments().first().map(|f| f.options.as_str()),
            Some("red, green")
        );
    }

    #[test]
    fn incomplete_fragments_are_collected_but_fail_validation() {
        let mut editor = FieldEditor::new(CREATE_PREFIX);
        editor.add();
        assert_eq!(editor.collect().len(), 1);
        assert_eq!(
            editor.validated(),
            Err("custom field 1 needs a label".to_string())
        );
    }

    #[test]
    fn persisted_fields_become_fragments() {
        let fields = vec![CustomField::new(
            "shape",
            "Shape",
            FieldType::Select,
            true,
            vec!["round".to_string(), "square".to_string()],
        )];
        let editor = FieldEditor::from_fields(EDIT_PREFIX, &fields);
        let Some(fragment) = editor.fragments().first() else {
            panic!("no fragment built");
        };
        assert_eq!(fragment.key, "edit-field-0");
        assert_eq!(fragment.options, "round, square");
        assert_eq!(editor.collect(), fields);
    }

    #[test]
    fn input_names_parse() {
        assert_eq!(parse_input_name("cf[field-1][label]"), Some(("field-1", "label")));
        assert_eq!(parse_input_name("cf[][label]"), None);
        assert_eq!(parse_input_name("project_name"), None);
    }
}
