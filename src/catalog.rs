//! Discovery of categories and their files under the content folder.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Names never shown as categories.
pub const IGNORED_NAMES: &[&str] = &[
    "themes",
    "sounds",
    "menu.py",
    "config.txt",
    "README.md",
    "settings.txt",
    "update_readme.py",
];

pub const SCRIPT_EXTENSION: &str = "py";
pub const DOCUMENT_EXTENSION: &str = "md";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Script,
    Document,
}

impl EntryKind {
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext {
            SCRIPT_EXTENSION => Some(EntryKind::Script),
            DOCUMENT_EXTENSION => Some(EntryKind::Document),
            _ => None,
        }
    }
}

/// A runnable script or viewable document inside a category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub category: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Reads `dir`, keeping UTF-8 names accepted by `keep`. A missing folder is
/// an empty listing; other errors are logged and also treated as empty.
fn sorted_names(dir: &Path, keep: impl Fn(&str, &Path) -> bool) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::warn!("Failed to list {}: {err}", dir.display());
            }
            return Vec::new();
        }
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            keep(&name, &entry.path()).then_some(name)
        })
        .collect();
    names.sort();
    names
}

/// Immediate subfolders of the content root, sorted, minus ignored and hidden
/// names.
pub fn scan_categories(content_dir: &Path) -> Vec<String> {
    sorted_names(content_dir, |name, path| {
        path.is_dir() && !is_hidden(name) && !IGNORED_NAMES.contains(&name)
    })
}

/// Scripts and documents inside one category, sorted by file name.
pub fn list_entries(content_dir: &Path, category: &str) -> Vec<Entry> {
    let dir = content_dir.join(category);
    sorted_names(&dir, |name, path| {
        !is_hidden(name) && path.is_file() && EntryKind::from_file_name(name).is_some()
    })
    .into_iter()
    .filter_map(|name| {
        let kind = EntryKind::from_file_name(&name)?;
        Some(Entry {
            path: dir.join(&name),
            category: category.to_string(),
            name,
            kind,
        })
    })
    .collect()
}

/// Markdown index of every category and its files.
pub fn render_readme(content_dir: &Path, title: &str) -> String {
    let mut out = format!("# {title} (Auto-generated README)\n\n");
    out.push_str("## Categories and files\n\n");
    let categories = scan_categories(content_dir);
    if categories.is_empty() {
        let folder = content_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        out.push_str(&format!(
            "No categories found. Add folders under `{folder}/` (games, scripts, tools, etc.)\n"
        ));
    }
    for category in categories {
        out.push_str(&format!("### {category}\n\n"));
        let entries = list_entries(content_dir, &category);
        if entries.is_empty() {
            out.push_str("- (empty)\n");
        }
        for entry in entries {
            out.push_str(&format!("- {}\n", entry.name));
        }
        out.push('\n');
    }
    out
}

pub fn write_readme(content_dir: &Path, readme: &Path, title: &str) -> Result<()> {
    fs::write(readme, render_readme(content_dir, title))
        .with_context(|| format!("Failed to update {}", readme.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    #[test]
    fn categories_are_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for dir in ["tools", "games", "Scripts", ".git", "themes", "sounds"] {
            fs::create_dir(root.join(dir)).unwrap();
        }
        touch(&root.join("loose.py"));

        assert_eq!(scan_categories(root), vec!["Scripts", "games", "tools"]);
    }

    #[test]
    fn missing_content_root_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(scan_categories(&temp.path().join("nope")).is_empty());
        assert!(list_entries(&temp.path().join("nope"), "games").is_empty());
    }

    #[test]
    fn entries_keep_recognized_extensions_only() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for file in ["rps.py", "notes.md", "a.txt", ".secret.py", "data.json", "b.py"] {
            touch(&root.join("games").join(file));
        }
        fs::create_dir(root.join("games").join("folder.py")).unwrap();

        let entries = list_entries(root, "games");
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b.py", "notes.md", "rps.py"]);
        assert_eq!(entries[1].kind, EntryKind::Document);
        assert_eq!(entries[2].kind, EntryKind::Script);
        assert_eq!(entries[2].category, "games");
        assert_eq!(entries[2].path, root.join("games").join("rps.py"));
    }

    #[test]
    fn kind_comes_from_last_extension() {
        assert_eq!(EntryKind::from_file_name("x.md.py"), Some(EntryKind::Script));
        assert_eq!(EntryKind::from_file_name("README"), None);
        assert_eq!(EntryKind::from_file_name("x.PY"), None);
    }

    #[test]
    fn readme_lists_categories_and_files() {
        let temp = TempDir::new().unwrap();
        let content = temp.path().join("Python");
        touch(&content.join("games").join("rps.py"));
        fs::create_dir_all(content.join("empty")).unwrap();
        let readme = temp.path().join("README.md");

        write_readme(&content, &readme, "Hub").unwrap();
        let text = fs::read_to_string(&readme).unwrap();
        assert_eq!(
            text,
            "# Hub (Auto-generated README)\n\n\
             ## Categories and files\n\n\
             ### empty\n\n- (empty)\n\n\
             ### games\n\n- rps.py\n\n"
        );
    }

    #[test]
    fn readme_without_categories_has_hint() {
        let temp = TempDir::new().unwrap();
        let text = render_readme(&temp.path().join("Python"), "Hub");
        assert!(text.contains("No categories found. Add folders under `Python/`"));
    }
}
