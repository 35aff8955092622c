//! Structured settings recognized from raw flag text.

use std::fmt;

use serde::Serialize;

/// Value of a recognized setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// On/off option (`-Wall` → `true`)
    Switch(bool),
    /// Single selection (`-O2` → `"more"`)
    Text(String),
    /// Ordered collection (libraries, symbols, extra options)
    List(Vec<String>),
}

impl SettingValue {
    pub fn text(value: impl Into<String>) -> Self {
        SettingValue::Text(value.into())
    }

    pub fn list(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        SettingValue::List(values.into_iter().map(Into::into).collect())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Switch(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            SettingValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Switch(b) => write!(f, "{}", b),
            SettingValue::Text(s) => f.write_str(s),
            SettingValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// A recognized `(group, key, value)` triple.
///
/// `source` holds the raw tokens the matcher consumed to produce the
/// setting, in line order. Together with the opaque flags of the same
/// category it accounts for every token of the classified lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Setting {
    pub group: String,
    pub key: String,
    pub value: SettingValue,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub source: Vec<String>,
}

impl Setting {
    pub fn new(group: impl Into<String>, key: impl Into<String>, value: SettingValue) -> Self {
        Setting {
            group: group.into(),
            key: key.into(),
            value,
            source: Vec::new(),
        }
    }

    /// Attach the raw tokens this setting was recognized from.
    pub fn with_source(mut self, tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.source.extend(tokens.into_iter().map(Into::into));
        self
    }

    /// Whether this setting is `group.key`.
    pub fn is(&self, group: &str, key: &str) -> bool {
        self.group == group && self.key == key
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} = {}", self.group, self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_display() {
        let s = Setting::new("optimization", "level", SettingValue::text("2"));
        assert_eq!(s.to_string(), "optimization.level = 2");

        let libs = Setting::new("libraries", "system", SettingValue::list(["-lm", "-lc"]));
        assert_eq!(libs.to_string(), "libraries.system = [-lm, -lc]");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(SettingValue::Switch(true).as_bool(), Some(true));
        assert_eq!(SettingValue::text("c99").as_text(), Some("c99"));
        assert_eq!(SettingValue::text("c99").as_bool(), None);
        assert_eq!(
            SettingValue::list(["a"]).as_list(),
            Some(&["a".to_string()][..])
        );
    }

    #[test]
    fn test_source_serialization_skipped_when_empty() {
        let s = Setting::new("warnings", "all", SettingValue::Switch(true));
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("source").is_none());
        assert_eq!(json["value"], serde_json::json!(true));
    }
}
