use std::path::PathBuf;

use async_trait::async_trait;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::watch;

use crate::shared::error::{AppError, AppResult};
use crate::shared::types::Modifiers;

/// One entry of the ordered source→target mapping table. First match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageMapping {
    pub source_lang: String,
    pub target_lang: String,
}

/// Modifier key that gates translation in press mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierKey {
    Ctrl,
    Alt,
    Cmd,
    Opt,
}

impl ModifierKey {
    /// Whether this configured key is held according to the event's modifier state.
    /// Opt is the macOS name for alt; both map to the same flag.
    pub fn matches(&self, mods: &Modifiers) -> bool {
        match self {
            ModifierKey::Ctrl => mods.ctrl,
            ModifierKey::Alt | ModifierKey::Opt => mods.alt,
            ModifierKey::Cmd => mods.meta,
        }
    }
}

/// User configuration. Loaded once at startup, replaced wholesale on change
/// notification; the core never mutates it field-by-field.
///
/// Serialized camelCase, matching the JSON shape the settings UI writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Debounce delay in milliseconds for hover and selection triggers.
    pub translation_delay: u64,
    pub language_mappings: Vec<LanguageMapping>,
    pub default_target_lang: String,
    pub press_to_translate: bool,
    pub key_to_press: ModifierKey,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            translation_delay: 500,
            language_mappings: Vec::new(),
            default_target_lang: "en".to_string(),
            press_to_translate: true,
            key_to_press: ModifierKey::Alt,
        }
    }
}

impl Settings {
    /// Resolve the target language for a detected source language: first mapping
    /// whose source matches, otherwise the configured default.
    pub fn target_for(&self, source_lang: &str) -> &str {
        self.language_mappings
            .iter()
            .find(|m| m.source_lang == source_lang)
            .map(|m| m.target_lang.as_str())
            .unwrap_or(&self.default_target_lang)
    }

    pub fn required_key_pressed(&self, mods: &Modifiers) -> bool {
        if !self.press_to_translate {
            return true;
        }
        self.key_to_press.matches(mods)
    }
}

/// Persisted key-value settings storage with change notification. The core only
/// reads; writes come from the settings UI.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> AppResult<Settings>;

    async fn save(&self, settings: &Settings) -> AppResult<()>;

    /// Change feed. The receiver yields the full replacement settings value.
    fn subscribe(&self) -> watch::Receiver<Settings>;
}

/// JSON-file backed store under the platform config directory.
pub struct JsonFileStore {
    path: PathBuf,
    tx: watch::Sender<Settings>,
}

impl JsonFileStore {
    pub fn new() -> AppResult<Self> {
        let dirs = ProjectDirs::from("com", "antigravity", "hover-translate")
            .ok_or_else(|| AppError::System("Failed to determine config directory".to_string()))?;
        Ok(Self::with_path(dirs.config_dir().join("settings.json")))
    }

    pub fn with_path(path: PathBuf) -> Self {
        let (tx, _) = watch::channel(Settings::default());
        Self { path, tx }
    }
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    async fn load(&self) -> AppResult<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| AppError::Io(format!("Failed to read settings file: {}", e)))?;
        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| AppError::Validation(format!("Failed to parse settings: {}", e)))?;
        Ok(settings)
    }

    async fn save(&self, settings: &Settings) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Io(format!("Failed to create config directory: {}", e)))?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, content)
            .await
            .map_err(|e| AppError::Io(format!("Failed to write settings file: {}", e)))?;
        self.tx.send_replace(settings.clone());
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }
}

/// In-memory store, used in tests and as a fallback when no config directory
/// is available.
pub struct MemoryStore {
    tx: watch::Sender<Settings>,
}

impl MemoryStore {
    pub fn new(initial: Settings) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn load(&self) -> AppResult<Settings> {
        Ok(self.tx.borrow().clone())
    }

    async fn save(&self, settings: &Settings) -> AppResult<()> {
        self.tx.send_replace(settings.clone());
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mappings(pairs: &[(&str, &str)]) -> Vec<LanguageMapping> {
        pairs
            .iter()
            .map(|(s, t)| LanguageMapping {
                source_lang: s.to_string(),
                target_lang: t.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_target_for_first_match_wins() {
        let settings = Settings {
            language_mappings: mappings(&[("de", "en"), ("de", "fr"), ("ja", "en")]),
            default_target_lang: "fr".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.target_for("de"), "en");
        assert_eq!(settings.target_for("ja"), "en");
    }

    #[test]
    fn test_target_for_falls_back_to_default() {
        let settings = Settings {
            language_mappings: mappings(&[("de", "en")]),
            default_target_lang: "fr".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.target_for("es"), "fr");
        assert_eq!(settings.target_for("de"), "en");
    }

    #[test]
    fn test_modifier_key_matching() {
        let alt = Modifiers {
            alt: true,
            ..Modifiers::NONE
        };
        let meta = Modifiers {
            meta: true,
            ..Modifiers::NONE
        };
        assert!(ModifierKey::Alt.matches(&alt));
        assert!(ModifierKey::Opt.matches(&alt));
        assert!(ModifierKey::Cmd.matches(&meta));
        assert!(!ModifierKey::Ctrl.matches(&alt));
    }

    #[test]
    fn test_required_key_ignored_in_hover_mode() {
        let settings = Settings {
            press_to_translate: false,
            ..Settings::default()
        };
        assert!(settings.required_key_pressed(&Modifiers::NONE));
    }

    #[test]
    fn test_settings_json_shape() {
        let json = r#"{
            "translationDelay": 250,
            "languageMappings": [{"sourceLang": "fr", "targetLang": "en"}],
            "defaultTargetLang": "de",
            "pressToTranslate": false,
            "keyToPress": "cmd"
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.translation_delay, 250);
        assert_eq!(settings.language_mappings.len(), 1);
        assert_eq!(settings.key_to_press, ModifierKey::Cmd);
        assert!(!settings.press_to_translate);
    }

    #[test]
    fn test_settings_defaults_for_missing_fields() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_file_store_roundtrip_and_notification() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::with_path(dir.path().join("settings.json"));

        // Missing file loads defaults.
        assert_eq!(store.load().await.unwrap(), Settings::default());

        let mut rx = store.subscribe();
        let updated = Settings {
            translation_delay: 100,
            ..Settings::default()
        };
        store.save(&updated).await.unwrap();

        assert_eq!(store.load().await.unwrap(), updated);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().translation_delay, 100);
    }
}
