//! Flat `key = value` persistence for the hub config and settings files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::animation::Animation;
use crate::warning::Warning;

/// A value loaded with the warnings collected while degrading to defaults.
#[derive(Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

/// Backing storage for a flat key-value file.
pub trait KvStore {
    /// Raw contents, or `None` when nothing has been stored yet.
    fn read(&self) -> io::Result<Option<String>>;
    fn write(&self, contents: &str) -> io::Result<()>;
    /// Human readable location used in warnings.
    fn location(&self) -> String;
}

pub struct FlatFile {
    path: PathBuf,
}

impl FlatFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KvStore for FlatFile {
    fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, contents)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Ordered key-value pairs. Keys keep their first-insertion position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KvMap {
    entries: Vec<(String, String)>,
}

impl KvMap {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut map = Self::default();
        for (key, value) in pairs {
            map.set(key, value);
        }
        map
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses file contents on top of `self`. Returns the 1-based numbers of
    /// lines that could not be read as `key = value`.
    pub fn merge_text(&mut self, text: &str) -> Vec<usize> {
        let mut malformed = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    self.set(key.trim(), value.trim());
                }
                _ => malformed.push(idx + 1),
            }
        }
        malformed
    }

    pub fn render(&self) -> String {
        self.iter()
            .map(|(key, value)| format!("{key} = {value}\n"))
            .collect()
    }
}

/// Loads `defaults` overlaid with whatever the store holds. A store with no
/// contents gets the defaults written to it.
pub fn load_with_defaults(store: &dyn KvStore, defaults: KvMap) -> Loaded<KvMap> {
    let mut map = defaults;
    let mut warnings = Vec::new();
    match store.read() {
        Ok(Some(text)) => {
            for line in map.merge_text(&text) {
                warnings.push(Warning::MalformedLine {
                    location: store.location(),
                    line,
                });
            }
        }
        Ok(None) => {
            if let Err(source) = store.write(&map.render()) {
                warnings.push(Warning::DefaultsNotWritten {
                    location: store.location(),
                    source,
                });
            }
        }
        Err(source) => warnings.push(Warning::Unreadable {
            location: store.location(),
            source,
        }),
    }
    Loaded {
        value: map,
        warnings,
    }
}

fn save_map(store: &dyn KvStore, map: &KvMap) -> Result<()> {
    store
        .write(&map.render())
        .with_context(|| format!("Failed to save {}", store.location()))
}

const DEFAULT_INTERPRETER: &str = if cfg!(windows) { "python" } else { "python3" };

/// Hub appearance and runner options from `config.txt`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    values: KvMap,
}

impl Config {
    pub fn defaults() -> KvMap {
        KvMap::from_pairs(&[
            ("title", "HURON"),
            ("subtitle", "AI-LINUX v1.0"),
            ("creator", "unknown"),
            ("theme", "cyber_neon"),
            ("sound", "on"),
            ("interpreter", DEFAULT_INTERPRETER),
            ("pause", "on"),
        ])
    }

    pub fn load(store: &dyn KvStore) -> Loaded<Config> {
        let loaded = load_with_defaults(store, Self::defaults());
        Loaded {
            value: Config {
                values: loaded.value,
            },
            warnings: loaded.warnings,
        }
    }

    pub fn save(&self, store: &dyn KvStore) -> Result<()> {
        save_map(store, &self.values)
    }

    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).unwrap_or_default()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.set(key, value);
    }

    pub fn title(&self) -> &str {
        self.get("title")
    }

    pub fn subtitle(&self) -> &str {
        self.get("subtitle")
    }

    pub fn creator(&self) -> &str {
        self.get("creator")
    }

    pub fn theme(&self) -> &str {
        self.get("theme")
    }

    pub fn interpreter(&self) -> &str {
        self.get("interpreter")
    }

    pub fn sound_enabled(&self) -> bool {
        is_on(self.get("sound"))
    }

    pub fn pause_after_run(&self) -> bool {
        is_on(self.get("pause"))
    }

    pub fn toggle_sound(&mut self) {
        let next = if self.sound_enabled() { "off" } else { "on" };
        self.set("sound", next);
    }
}

fn is_on(value: &str) -> bool {
    value.eq_ignore_ascii_case("on")
}

/// Animation preference from `settings.txt`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    values: KvMap,
    animation: Animation,
}

impl Settings {
    pub fn defaults() -> KvMap {
        KvMap::from_pairs(&[("animation", Animation::default().name())])
    }

    pub fn load(store: &dyn KvStore) -> Loaded<Settings> {
        let Loaded {
            value: values,
            mut warnings,
        } = load_with_defaults(store, Self::defaults());
        let raw = values.get("animation").unwrap_or_default();
        let animation = match raw.parse::<Animation>() {
            Ok(animation) => animation,
            Err(_) => {
                warnings.push(Warning::UnknownAnimation(raw.to_string()));
                Animation::default()
            }
        };
        Loaded {
            value: Settings { values, animation },
            warnings,
        }
    }

    pub fn save(&self, store: &dyn KvStore) -> Result<()> {
        save_map(store, &self.values)
    }

    pub fn animation(&self) -> Animation {
        self.animation
    }

    pub fn set_animation(&mut self, animation: Animation) {
        self.animation = animation;
        self.values.set("animation", animation.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn merge_skips_comments_and_reports_malformed_lines() {
        let mut map = KvMap::default();
        let malformed = map.merge_text("title = Hub\n\n# note\ngarbage\n = empty key\nsound=off\n");
        assert_eq!(malformed, vec![4, 5]);
        assert_eq!(map.get("title"), Some("Hub"));
        assert_eq!(map.get("sound"), Some("off"));
    }

    #[test]
    fn value_may_contain_equals_sign() {
        let mut map = KvMap::default();
        map.merge_text("subtitle = a = b\n");
        assert_eq!(map.get("subtitle"), Some("a = b"));
    }

    #[test]
    fn missing_file_is_seeded_with_defaults() {
        let temp = TempDir::new().unwrap();
        let store = FlatFile::new(temp.path().join("config.txt"));
        let loaded = Config::load(&store);
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.value.title(), "HURON");
        let written = fs::read_to_string(store.path()).unwrap();
        assert!(written.contains("theme = cyber_neon\n"));
        assert!(written.contains("sound = on\n"));
        assert!(written.contains("creator = unknown\n"));
    }

    #[test]
    fn partial_file_keeps_defaults_and_unknown_keys() {
        let temp = TempDir::new().unwrap();
        let store = FlatFile::new(temp.path().join("config.txt"));
        fs::write(store.path(), "title = Lab\ncolor_depth = 256\nnonsense\n").unwrap();

        let loaded = Config::load(&store);
        assert_eq!(loaded.warnings.len(), 1);
        assert!(matches!(
            loaded.warnings[0],
            Warning::MalformedLine { line: 3, .. }
        ));
        let config = loaded.value;
        assert_eq!(config.title(), "Lab");
        assert_eq!(config.subtitle(), "AI-LINUX v1.0");

        config.save(&store).unwrap();
        let written = fs::read_to_string(store.path()).unwrap();
        assert!(written.contains("color_depth = 256\n"));
        assert!(!written.contains("nonsense"));
    }

    #[test]
    fn theme_survives_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let store = FlatFile::new(temp.path().join("config.txt"));
        let mut config = Config::load(&store).value;
        config.set("theme", "dark");
        config.save(&store).unwrap();

        assert_eq!(Config::load(&store).value.theme(), "dark");
    }

    #[test]
    fn sound_toggles_between_on_and_off() {
        let temp = TempDir::new().unwrap();
        let store = FlatFile::new(temp.path().join("config.txt"));
        let mut config = Config::load(&store).value;
        assert!(config.sound_enabled());
        config.toggle_sound();
        assert_eq!(config.get("sound"), "off");
        config.toggle_sound();
        assert!(config.sound_enabled());
    }

    #[test]
    fn unknown_animation_falls_back_to_spinner() {
        let temp = TempDir::new().unwrap();
        let store = FlatFile::new(temp.path().join("settings.txt"));
        fs::write(store.path(), "animation = confetti\n").unwrap();
        let loaded = Settings::load(&store);
        assert_eq!(loaded.value.animation(), Animation::Spinner);
        assert!(matches!(
            loaded.warnings.as_slice(),
            [Warning::UnknownAnimation(name)] if name == "confetti"
        ));
    }

    #[test]
    fn animation_choice_is_persisted() {
        let temp = TempDir::new().unwrap();
        let store = FlatFile::new(temp.path().join("settings.txt"));
        let mut settings = Settings::load(&store).value;
        settings.set_animation(Animation::Dots);
        settings.save(&store).unwrap();
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "animation = dots\n"
        );
        assert_eq!(Settings::load(&store).value.animation(), Animation::Dots);
    }

    #[test]
    fn unreadable_store_degrades_to_defaults() {
        let temp = TempDir::new().unwrap();
        // A directory where the file should be cannot be read as text.
        let store = FlatFile::new(temp.path());
        let loaded = Config::load(&store);
        assert_eq!(loaded.value.theme(), "cyber_neon");
        assert!(matches!(loaded.warnings[0], Warning::Unreadable { .. }));
    }
}
