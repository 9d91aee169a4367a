//! Internationalization (i18n) support
//!
//! The `pt-BR` and `en` catalogues are compiled in. Files in the site's
//! `languages/` directory are merged over them key by key.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const BUILTIN: &[(&str, &str)] = &[
    ("pt-BR", include_str!("pt-BR.yml")),
    ("en", include_str!("en.yml")),
];

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, HashMap<String, serde_yaml::Value>>,
}

impl I18n {
    /// Create a handler with the built-in catalogues
    pub fn new(language: &str) -> Self {
        let mut translations = HashMap::new();
        for (lang, source) in BUILTIN {
            match serde_yaml::from_str::<HashMap<String, serde_yaml::Value>>(source) {
                Ok(data) => {
                    translations.insert(lang.to_string(), data);
                }
                Err(e) => tracing::error!("Built-in language {} is invalid: {}", lang, e),
            }
        }

        Self {
            language: language.to_string(),
            translations,
        }
    }

    /// Load language files from a directory, merging over what is loaded
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str());
            if !matches!(ext, Some("yml") | Some("yaml") | Some("json")) {
                continue;
            }

            let lang = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("en")
                .to_string();

            let content = fs::read_to_string(&path)?;

            // Skip invalid files
            let data: Option<HashMap<String, serde_yaml::Value>> = if ext == Some("json") {
                match serde_json::from_str::<serde_json::Value>(&content) {
                    Ok(json) => Some(convert_json_to_yaml(json)),
                    Err(e) => {
                        tracing::warn!("Failed to parse language file {:?}: {}", path, e);
                        None
                    }
                }
            } else {
                match serde_yaml::from_str(&content) {
                    Ok(data) => Some(data),
                    Err(e) => {
                        tracing::warn!("Failed to parse language file {:?}: {}", path, e);
                        None
                    }
                }
            };

            if let Some(data) = data {
                let existing = self.translations.entry(lang).or_default();
                for (key, value) in data {
                    merge_value(existing, key, value);
                }
                tracing::debug!("Loaded language file: {:?}", path);
            }
        }

        Ok(())
    }

    /// Get a translation by key; nested keys use dots ("post.loading")
    pub fn get(&self, key: &str) -> String {
        match self.lookup(key) {
            Some(value) => yaml_value_to_string(value),
            // Return key as fallback
            None => key.to_string(),
        }
    }

    /// Get a list translation such as `months.short`
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.lookup(key) {
            Some(serde_yaml::Value::Sequence(items)) => {
                items.iter().map(yaml_value_to_string).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Abbreviated month name; `month` is 1-based
    pub fn month_short(&self, month: u32) -> String {
        self.month_name("months.short", month)
    }

    /// Full month name; `month` is 1-based
    pub fn month_long(&self, month: u32) -> String {
        self.month_name("months.long", month)
    }

    fn month_name(&self, key: &str, month: u32) -> String {
        let names = self.get_list(key);
        names
            .get(month.saturating_sub(1) as usize)
            .cloned()
            .unwrap_or_else(|| format!("{:02}", month))
    }

    /// Current language first, then its base language ("pt" for "pt-BR"), then English
    fn lookup(&self, key: &str) -> Option<&serde_yaml::Value> {
        let base = self.language.split(['-', '_']).next().unwrap_or("");
        let mut candidates = vec![self.language.as_str()];
        if let Some(lang) = self
            .translations
            .keys()
            .find(|l| l.as_str() != self.language && l.split(['-', '_']).next() == Some(base))
        {
            candidates.push(lang.as_str());
        }
        candidates.push("en");

        candidates.into_iter().find_map(|lang| {
            self.translations
                .get(lang)
                .and_then(|data| get_nested_value(data, key))
        })
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("pt-BR")
    }
}

/// Merge an override into a catalogue, descending into nested mappings
fn merge_value(target: &mut HashMap<String, serde_yaml::Value>, key: String, value: serde_yaml::Value) {
    match (target.get_mut(&key), value) {
        (Some(serde_yaml::Value::Mapping(existing)), serde_yaml::Value::Mapping(incoming)) => {
            for (k, v) in incoming {
                existing.insert(k, v);
            }
        }
        (_, value) => {
            target.insert(key, value);
        }
    }
}

/// Get a nested value from a YAML map using dot notation
fn get_nested_value<'a>(
    data: &'a HashMap<String, serde_yaml::Value>,
    key: &str,
) -> Option<&'a serde_yaml::Value> {
    let parts: Vec<&str> = key.split('.').collect();
    let mut current: Option<&serde_yaml::Value> = data.get(parts[0]);

    for part in &parts[1..] {
        match current {
            Some(serde_yaml::Value::Mapping(map)) => {
                current = map.get(serde_yaml::Value::String(part.to_string()));
            }
            _ => return None,
        }
    }

    current
}

/// Convert a YAML value to a string
fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        _ => format!("{:?}", value),
    }
}

/// Convert JSON value to YAML HashMap
fn convert_json_to_yaml(json: serde_json::Value) -> HashMap<String, serde_yaml::Value> {
    let mut result = HashMap::new();

    if let serde_json::Value::Object(obj) = json {
        for (key, value) in obj {
            result.insert(key, json_value_to_yaml(value));
        }
    }

    result
}

fn json_value_to_yaml(json: serde_json::Value) -> serde_yaml::Value {
    match json {
        serde_json::Value::Null => serde_yaml::Value::Null,
        serde_json::Value::Bool(b) => serde_yaml::Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_yaml::Value::Number(i.into())
            } else if let Some(f) = n.as_f64() {
                serde_yaml::Value::Number(serde_yaml::Number::from(f))
            } else {
                serde_yaml::Value::Null
            }
        }
        serde_json::Value::String(s) => serde_yaml::Value::String(s),
        serde_json::Value::Array(arr) => {
            serde_yaml::Value::Sequence(arr.into_iter().map(json_value_to_yaml).collect())
        }
        serde_json::Value::Object(obj) => {
            let mut map = serde_yaml::Mapping::new();
            for (k, v) in obj {
                map.insert(serde_yaml::Value::String(k), json_value_to_yaml(v));
            }
            serde_yaml::Value::Mapping(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_portuguese() {
        let i18n = I18n::new("pt-BR");
        assert_eq!(i18n.get("listing.load_more"), "Carregar mais posts");
        assert_eq!(i18n.get("listing.exit_preview"), "Sair do modo Preview");
        assert_eq!(i18n.get("post.loading"), "Carregando...");
        assert_eq!(i18n.month_short(3), "Mar");
        assert_eq!(i18n.month_short(2), "Fev");
        assert_eq!(i18n.month_long(12), "dezembro");
    }

    #[test]
    fn test_fallbacks() {
        let i18n = I18n::new("pt");
        assert_eq!(i18n.month_short(4), "Abr");

        let i18n = I18n::new("de");
        assert_eq!(i18n.get("post.loading"), "Loading...");
        assert_eq!(i18n.get("unknown.key"), "unknown.key");
        assert_eq!(i18n.month_short(13), "13");
    }

    #[test]
    fn test_load_language_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("pt-BR.yml"),
            "listing:\n  load_more: Mais posts\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("es.json"),
            r#"{"post": {"loading": "Cargando..."}, "months": {"short": ["Ene"]}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.yml"), "a: [unclosed").unwrap();

        let mut i18n = I18n::new("pt-BR");
        i18n.load_languages(dir.path()).unwrap();
        assert_eq!(i18n.get("listing.load_more"), "Mais posts");
        // Sibling keys of an overridden mapping survive
        assert_eq!(i18n.get("listing.exit_preview"), "Sair do modo Preview");

        let mut i18n = I18n::new("es");
        i18n.load_languages(dir.path()).unwrap();
        assert_eq!(i18n.get("post.loading"), "Cargando...");
        assert_eq!(i18n.month_short(1), "Ene");
    }
}
