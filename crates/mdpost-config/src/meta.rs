//! UI-agnostic schema of a plugin's user-editable settings.
//!
//! The pipeline only produces and exports this schema; a settings surface
//! renders controls from it and writes changes back through the config store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kind of control a settings surface should render for a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Switch,
    Select,
    Input,
}

/// One choice of a `select` field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

/// Description of a single editable config key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaField {
    pub title: String,
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

/// Schema of editable keys for one plugin, keyed by config key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaConfig(BTreeMap<String, MetaField>);

impl MetaConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an on/off toggle.
    #[must_use]
    pub fn switch(self, key: &str, title: &str) -> Self {
        self.field(key, title, FieldKind::Switch, Vec::new())
    }

    /// Add a free-text input.
    #[must_use]
    pub fn input(self, key: &str, title: &str) -> Self {
        self.field(key, title, FieldKind::Input, Vec::new())
    }

    /// Add a choice between `(value, text)` options.
    #[must_use]
    pub fn select(self, key: &str, title: &str, options: &[(&str, &str)]) -> Self {
        let options = options
            .iter()
            .map(|(value, text)| SelectOption {
                value: (*value).to_owned(),
                text: (*text).to_owned(),
            })
            .collect();
        self.field(key, title, FieldKind::Select, options)
    }

    fn field(mut self, key: &str, title: &str, kind: FieldKind, options: Vec<SelectOption>) -> Self {
        self.0.insert(
            key.to_owned(),
            MetaField {
                title: title.to_owned(),
                kind,
                options,
            },
        );
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetaField> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaField)> {
        self.0.iter().map(|(key, field)| (key.as_str(), field))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder_fields() {
        let meta = MetaConfig::new()
            .switch("lineNumbers", "Line numbers")
            .input("title", "Section title")
            .select("source", "Caption source", &[("alt", "Alt text"), ("title", "Title")]);

        assert_eq!(meta.len(), 3);
        assert_eq!(meta.get("lineNumbers").unwrap().kind, FieldKind::Switch);
        assert_eq!(meta.get("title").unwrap().kind, FieldKind::Input);
        let select = meta.get("source").unwrap();
        assert_eq!(select.kind, FieldKind::Select);
        assert_eq!(select.options[1].value, "title");
    }

    #[test]
    fn test_serialized_shape() {
        let meta = MetaConfig::new()
            .switch("macStyle", "Window buttons")
            .select("mode", "Mode", &[("a", "A")]);

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "macStyle": {"title": "Window buttons", "kind": "switch"},
                "mode": {
                    "title": "Mode",
                    "kind": "select",
                    "options": [{"value": "a", "text": "A"}]
                }
            })
        );
    }
}
