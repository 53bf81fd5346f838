use crate::cache::CategoryKey;
use crate::error::{Error, Result};
use getset::Getters;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A fully loaded category, shared between every caller that asked for it.
pub type Dataset = Arc<Vec<TasbihItem>>;

/// One recitation record.
///
/// Fields other than `id`, `label` and `translation` are kept in `extra`
/// untouched and written back out on serialization. An explicit `null`
/// label or translation is written back as `null`, a missing one stays missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[get = "pub"]
pub struct TasbihItem {
    id: String,
    #[getset(skip)]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    label: Option<Option<String>>,
    #[getset(skip)]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    translation: Option<Option<String>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Marks a key as present, even when its value is `null`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl TasbihItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            translation: None,
            extra: Map::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(Some(label.into()));
        self
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(Some(translation.into()));
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_ref().and_then(|label| label.as_deref())
    }

    pub fn translation(&self) -> Option<&str> {
        self.translation.as_ref().and_then(|text| text.as_deref())
    }

    /// Looks up a passthrough field that has no typed accessor.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// `needle` must already be lowercase.
    pub(crate) fn label_contains(&self, needle: &str) -> bool {
        contains_lowercase(self.label(), needle)
    }

    /// `needle` must already be lowercase.
    pub(crate) fn translation_contains(&self, needle: &str) -> bool {
        contains_lowercase(self.translation(), needle)
    }
}

fn contains_lowercase(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|text| text.to_lowercase().contains(needle))
}

/// Decodes a category file body, which must be a JSON array of items.
pub(crate) fn parse_dataset(category: &CategoryKey, body: &str) -> Result<Dataset> {
    serde_json::from_str::<Vec<TasbihItem>>(body)
        .map(Arc::new)
        .map_err(|err| Error::ParseFailed {
            category: category.to_string(),
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key() -> CategoryKey {
        CategoryKey::parse("post-prayer").unwrap()
    }

    #[test]
    fn test_extra_fields_survive_round_trip() {
        let body = r#"[{"id":"1","label":"Subhanallah","count":33,"reference":{"book":"Muslim"}}]"#;
        let items = parse_dataset(&key(), body).unwrap();
        let item = &items[0];

        assert_eq!(item.id(), "1");
        assert_eq!(item.label(), Some("Subhanallah"));
        assert_eq!(item.translation(), None);
        assert_eq!(item.field("count"), Some(&json!(33)));

        let value = serde_json::to_value(item).unwrap();
        assert_eq!(
            value,
            json!({"id":"1","label":"Subhanallah","count":33,"reference":{"book":"Muslim"}})
        );
    }

    #[test]
    fn test_null_label_kept_on_round_trip() {
        let items = parse_dataset(&key(), r#"[{"id":"7","label":null}]"#).unwrap();
        assert_eq!(items[0].label(), None);
        assert!(!items[0].label_contains("a"));

        let value = serde_json::to_value(&items[0]).unwrap();
        assert_eq!(value, json!({"id":"7","label":null}));
    }

    #[test]
    fn test_non_array_body_is_parse_failure() {
        let err = parse_dataset(&key(), r#"{"id":"1"}"#).unwrap_err();
        assert!(
            matches!(err, Error::ParseFailed { ref category, .. } if category == "post-prayer")
        );

        let err = parse_dataset(&key(), "<html>oops</html>").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ParseFailed);
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let item = TasbihItem::new("2")
            .with_label("Alhamdulillah")
            .with_translation("All praise is due to God");
        assert!(item.label_contains("alham"));
        assert!(item.translation_contains("praise"));
        assert!(!item.translation_contains("glory"));
    }
}
