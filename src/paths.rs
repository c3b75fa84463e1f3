use std::fs;
use std::path::{Path, PathBuf};

use crate::warning::Warning;

pub const ROOT_ENV: &str = "SCRIPT_HUB_ROOT";

const CONTENT_DIR: &str = "Python";
const THEME_DIR: &str = "themes";
const SOUND_DIR: &str = "sounds";
const CONFIG_FILE: &str = "config.txt";
const SETTINGS_FILE: &str = "settings.txt";
const README_FILE: &str = "README.md";

/// Fixed layout of a hub below its root folder.
#[derive(Clone, Debug)]
pub struct HubPaths {
    pub root: PathBuf,
    pub content_dir: PathBuf,
    pub theme_dir: PathBuf,
    pub sound_dir: PathBuf,
    pub config_file: PathBuf,
    pub settings_file: PathBuf,
    pub readme_file: PathBuf,
}

impl HubPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            content_dir: root.join(CONTENT_DIR),
            theme_dir: root.join(THEME_DIR),
            sound_dir: root.join(SOUND_DIR),
            config_file: root.join(CONFIG_FILE),
            settings_file: root.join(SETTINGS_FILE),
            readme_file: root.join(README_FILE),
            root,
        }
    }

    /// `$SCRIPT_HUB_ROOT` when set, otherwise the working directory.
    pub fn from_env() -> Self {
        let root = std::env::var_os(ROOT_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(root)
    }

    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.content_dir.join(category)
    }

    /// Creates the content, theme and sound folders. Failures are returned as
    /// warnings; the hub keeps running without them.
    pub fn ensure_dirs(&self) -> Vec<Warning> {
        [&self.content_dir, &self.theme_dir, &self.sound_dir]
            .into_iter()
            .filter_map(|dir| create_dir(dir).err())
            .collect()
    }
}

pub fn create_dir(dir: &Path) -> Result<(), Warning> {
    fs::create_dir_all(dir).map_err(|source| Warning::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Log file under the platform data dir, or a hidden file in the hub root.
pub fn log_file(paths: &HubPaths) -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("script-hub"))
        .filter(|dir| fs::create_dir_all(dir).is_ok())
        .map(|dir| dir.join("script-hub.log"))
        .unwrap_or_else(|| paths.root.join(".script-hub.log"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn layout_hangs_off_root() {
        let paths = HubPaths::new("/hub");
        assert_eq!(paths.content_dir, PathBuf::from("/hub/Python"));
        assert_eq!(paths.config_file, PathBuf::from("/hub/config.txt"));
        assert_eq!(paths.category_dir("games"), PathBuf::from("/hub/Python/games"));
    }

    #[test]
    fn ensure_dirs_creates_missing_folders() {
        let temp = TempDir::new().unwrap();
        let paths = HubPaths::new(temp.path());
        assert!(paths.ensure_dirs().is_empty());
        assert!(paths.content_dir.is_dir());
        assert!(paths.theme_dir.is_dir());
        assert!(paths.sound_dir.is_dir());
    }

    #[test]
    fn ensure_dirs_reports_blocked_folder() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("sounds"), "not a folder").unwrap();
        let paths = HubPaths::new(temp.path());
        let warnings = paths.ensure_dirs();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], Warning::CreateDir { .. }));
    }
}
