//! Translation loader and i18n management
//!
//! This module provides translation loading, language detection, message
//! formatting and pluralization for the bot's user-facing text.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use serde_json::{Value, Map};
use tokio::fs;
use tracing::{info, warn, debug};
use crate::utils::errors::{RunRaceError, Result};
use crate::config::I18nConfig;

/// Main internationalization manager
#[derive(Debug, Clone)]
pub struct I18n {
    /// Loaded translations by language code
    translations: HashMap<String, Map<String, Value>>,
    default_language: String,
    supported_languages: Vec<String>,
    translations_dir: PathBuf,
}

/// Translation parameters for message formatting
pub type TranslationParams = HashMap<String, String>;

impl I18n {
    /// Create a new I18n instance
    pub fn new(config: &I18nConfig) -> Self {
        Self {
            translations: HashMap::new(),
            default_language: config.default_language.clone(),
            supported_languages: config.supported_languages.clone(),
            translations_dir: PathBuf::from(&config.translations_dir),
        }
    }

    /// Load all translation files from the translations directory.
    ///
    /// A missing or malformed file for the default language is fatal; other
    /// languages fall back to the default.
    pub async fn load_translations(&mut self) -> Result<()> {
        let supported_languages = self.supported_languages.clone();
        for lang_code in &supported_languages {
            let file_path = self.translations_dir.join(format!("{}.json", lang_code));

            match self.load_language_file(&file_path, lang_code).await {
                Ok(key_count) => info!(language = %lang_code, keys = key_count, "Loaded translations"),
                Err(e) if lang_code == &self.default_language => {
                    return Err(RunRaceError::Config(format!(
                        "Failed to load default language translations from {}: {}",
                        file_path.display(),
                        e
                    )));
                }
                Err(e) => warn!(language = %lang_code, error = %e, "Translations unavailable, using default language"),
            }
        }

        Ok(())
    }

    /// Load a single language file, returning the number of keys
    async fn load_language_file(&mut self, file_path: &Path, lang_code: &str) -> Result<usize> {
        let content = fs::read_to_string(file_path).await?;
        let translations: Value = serde_json::from_str(&content)?;

        let Value::Object(map) = translations else {
            return Err(RunRaceError::Config(
                format!("Invalid translation file format for {}", lang_code)
            ));
        };

        let key_count = count_keys(&map);
        debug!(language = %lang_code, keys = key_count, "Parsed translation file");
        self.translations.insert(lang_code.to_string(), map);
        Ok(key_count)
    }

    /// Get a translated message, falling back to the default language and
    /// finally to the key itself
    pub fn t(&self, key: &str, lang: &str, params: Option<&TranslationParams>) -> String {
        let effective_lang = self.get_effective_language(lang);

        let value = self
            .get_translation_value(key, effective_lang)
            .or_else(|| self.get_translation_value(key, &self.default_language));

        match value {
            Some(value) => format_message(&extract_text_from_value(value), params),
            None => {
                warn!(key = key, language = lang, "Translation key not found");
                key.to_string()
            }
        }
    }

    /// Get a translated message with pluralization support
    pub fn tp(&self, key: &str, lang: &str, count: i64, params: Option<&TranslationParams>) -> String {
        let effective_lang = self.get_effective_language(lang);
        let plural_key = format!("{}.{}", key, plural_form(count, effective_lang));

        let mut final_params = params.cloned().unwrap_or_default();
        final_params.insert("count".to_string(), count.to_string());

        self.t(&plural_key, effective_lang, Some(&final_params))
    }

    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.supported_languages.iter().any(|supported| supported == lang)
    }

    /// The requested language if loaded, otherwise the default
    fn get_effective_language<'a>(&'a self, lang: &'a str) -> &'a str {
        if self.is_language_supported(lang) && self.translations.contains_key(lang) {
            lang
        } else {
            &self.default_language
        }
    }

    /// Look up a dotted key like "commands.start.welcome"
    fn get_translation_value(&self, key: &str, lang: &str) -> Option<&Value> {
        let translations = self.translations.get(lang)?;

        let mut parts = key.split('.');
        let mut current = translations.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }

        Some(current)
    }

    pub fn supported_languages(&self) -> &[String] {
        &self.supported_languages
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Detect user language from Telegram language code
    pub fn detect_user_language(&self, telegram_lang: Option<&str>) -> String {
        telegram_lang
            .and_then(|lang| lang.split('-').next())
            .filter(|code| self.is_language_supported(code))
            .map(str::to_string)
            .unwrap_or_else(|| self.default_language.clone())
    }
}

/// Extract text from a value, picking "other" from plural objects
fn extract_text_from_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("other")
            .or_else(|| obj.values().next())
            .map(extract_text_from_value)
            .unwrap_or_default(),
        _ => value.to_string(),
    }
}

/// Replace `{name}` placeholders with parameter values
fn format_message(template: &str, params: Option<&TranslationParams>) -> String {
    let Some(params) = params else {
        return template.to_string();
    };

    params.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{}}}", key), value)
    })
}

/// Plural category for a count
fn plural_form(count: i64, lang: &str) -> &'static str {
    match lang {
        // Indonesian nouns do not inflect for number
        "id" => "other",
        _ => if count == 1 { "one" } else { "other" },
    }
}

fn count_keys(obj: &Map<String, Value>) -> usize {
    obj.values()
        .map(|value| match value {
            Value::Object(nested) => count_keys(nested),
            _ => 1,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::I18nConfig;
    use std::io::Write;

    fn write_translations(dir: &Path, lang: &str, body: &str) {
        let mut file = std::fs::File::create(dir.join(format!("{}.json", lang))).unwrap();
        file.write_all(body.as_bytes()).unwrap();
    }

    fn config(dir: &Path) -> I18nConfig {
        I18nConfig {
            default_language: "id".to_string(),
            supported_languages: vec!["id".to_string(), "en".to_string()],
            translations_dir: dir.to_string_lossy().into_owned(),
        }
    }

    async fn loaded() -> (tempfile::TempDir, I18n) {
        let dir = tempfile::tempdir().unwrap();
        write_translations(dir.path(), "id", r#"{
            "events": {"title": "Daftar Event", "only_id": "Hanya Indonesia"},
            "registrations": {"count": {"other": "{count} peserta"}},
            "greeting": "Halo {name}"
        }"#);
        write_translations(dir.path(), "en", r#"{
            "events": {"title": "Events"},
            "registrations": {"count": {"one": "{count} runner", "other": "{count} runners"}}
        }"#);

        let mut i18n = I18n::new(&config(dir.path()));
        i18n.load_translations().await.unwrap();
        (dir, i18n)
    }

    #[tokio::test]
    async fn test_lookup_and_fallback() {
        let (_dir, i18n) = loaded().await;

        assert_eq!(i18n.t("events.title", "en", None), "Events");
        assert_eq!(i18n.t("events.title", "id", None), "Daftar Event");
        // Missing in English, found in the default language
        assert_eq!(i18n.t("events.only_id", "en", None), "Hanya Indonesia");
        // Unsupported language
        assert_eq!(i18n.t("events.title", "ru", None), "Daftar Event");
        // Missing everywhere
        assert_eq!(i18n.t("events.nope", "en", None), "events.nope");
    }

    #[tokio::test]
    async fn test_parameters_and_plurals() {
        let (_dir, i18n) = loaded().await;

        let params = TranslationParams::from([("name".to_string(), "Sari".to_string())]);
        assert_eq!(i18n.t("greeting", "id", Some(&params)), "Halo Sari");

        assert_eq!(i18n.tp("registrations.count", "en", 1, None), "1 runner");
        assert_eq!(i18n.tp("registrations.count", "en", 3, None), "3 runners");
        assert_eq!(i18n.tp("registrations.count", "id", 1, None), "1 peserta");
    }

    #[tokio::test]
    async fn test_missing_default_language_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_translations(dir.path(), "en", r#"{"events": {"title": "Events"}}"#);

        let mut i18n = I18n::new(&config(dir.path()));
        assert!(matches!(i18n.load_translations().await, Err(RunRaceError::Config(_))));
    }

    #[tokio::test]
    async fn test_missing_secondary_language_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        write_translations(dir.path(), "id", r#"{"events": {"title": "Daftar Event"}}"#);

        let mut i18n = I18n::new(&config(dir.path()));
        i18n.load_translations().await.unwrap();
        assert_eq!(i18n.t("events.title", "en", None), "Daftar Event");
    }

    #[test]
    fn test_language_detection() {
        let i18n = I18n::new(&config(Path::new("translations")));

        assert_eq!(i18n.detect_user_language(Some("en-US")), "en");
        assert_eq!(i18n.detect_user_language(Some("id")), "id");
        assert_eq!(i18n.detect_user_language(Some("fr")), "id");
        assert_eq!(i18n.detect_user_language(None), "id");
    }

    #[test]
    fn test_plural_forms() {
        assert_eq!(plural_form(1, "en"), "one");
        assert_eq!(plural_form(0, "en"), "other");
        assert_eq!(plural_form(1, "id"), "other");
    }

    #[test]
    fn test_message_formatting() {
        let params = TranslationParams::from([
            ("name".to_string(), "Budi".to_string()),
            ("days".to_string(), "5".to_string()),
        ]);
        assert_eq!(
            format_message("{name}, registration closed H-{days}", Some(&params)),
            "Budi, registration closed H-5"
        );
    }
}
