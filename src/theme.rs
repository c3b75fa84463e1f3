//! Color themes: named JSON records mapping color roles to color codes.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ratatui::style::{Color, Modifier, Style};
use serde::Serialize;

use crate::store::Loaded;
use crate::warning::Warning;

const THEME_EXTENSION: &str = "json";

/// Color roles a theme can assign.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Title,
    Subtitle,
    Accent,
    MenuText,
    MenuNumber,
    Error,
}

impl Role {
    pub fn key(self) -> &'static str {
        match self {
            Role::Title => "title_color",
            Role::Subtitle => "subtitle_color",
            Role::Accent => "accent_color",
            Role::MenuText => "menu_text_color",
            Role::MenuNumber => "menu_number_color",
            Role::Error => "error_color",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Theme {
    pub name: String,
    colors: BTreeMap<String, String>,
}

impl Theme {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            colors: BTreeMap::new(),
        }
    }

    /// Parses a theme record. Non-string values are ignored.
    pub fn parse(name: &str, data: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(data)?;
        let colors = raw
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::String(code) => Some((key, code)),
                _ => None,
            })
            .collect();
        Ok(Self {
            name: name.to_string(),
            colors,
        })
    }

    /// Loads `requested`, falling back to the first available theme.
    pub fn load(source: &dyn ThemeSource, requested: &str) -> Loaded<Theme> {
        let mut warnings = Vec::new();
        let names = source.names();
        let name = if names.iter().any(|name| name == requested) {
            requested.to_string()
        } else if let Some(first) = names.first() {
            warnings.push(Warning::ThemeFallback {
                requested: requested.to_string(),
                used: first.clone(),
            });
            first.clone()
        } else {
            warnings.push(Warning::NoThemes(source.location()));
            return Loaded {
                value: Theme::empty(requested),
                warnings,
            };
        };

        let value = match source.read(&name) {
            Ok(data) => match Theme::parse(&name, &data) {
                Ok(theme) => theme,
                Err(source) => {
                    warnings.push(Warning::ThemeParse {
                        name: name.clone(),
                        source,
                    });
                    Theme::empty(name)
                }
            },
            Err(err) => {
                warnings.push(Warning::Unreadable {
                    location: format!("theme '{name}'"),
                    source: err,
                });
                Theme::empty(name)
            }
        };
        Loaded { value, warnings }
    }

    /// Raw color code for a role, empty when the theme does not set it.
    pub fn color(&self, role: Role) -> &str {
        self.colors
            .get(role.key())
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn style(&self, role: Role) -> Style {
        let style = match parse_color_code(self.color(role)) {
            Some(color) => Style::default().fg(color),
            None => Style::default(),
        };
        if role == Role::Title {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }
}

/// Where theme records come from.
pub trait ThemeSource {
    /// Available theme names, sorted.
    fn names(&self) -> Vec<String>;
    fn read(&self, name: &str) -> io::Result<String>;
    fn location(&self) -> String;
}

/// A folder holding one `<name>.json` file per theme.
pub struct ThemeDir {
    dir: PathBuf,
}

impl ThemeDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{THEME_EXTENSION}"))
    }

    /// Writes the built-in presets when the folder has no themes yet.
    /// Returns how many presets were written.
    pub fn seed_presets(&self) -> Result<usize> {
        if !self.names().is_empty() {
            return Ok(0);
        }
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        for (name, preset) in THEME_PRESETS {
            let path = self.path_for(name);
            fs::write(&path, serde_json::to_string_pretty(preset)?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        Ok(THEME_PRESETS.len())
    }
}

impl ThemeSource for ThemeDir {
    fn names(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some(THEME_EXTENSION))
            .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();
        names
    }

    fn read(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.path_for(name))
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}

#[derive(Serialize)]
struct ThemePreset {
    title_color: &'static str,
    subtitle_color: &'static str,
    accent_color: &'static str,
    menu_text_color: &'static str,
    menu_number_color: &'static str,
    error_color: &'static str,
}

const THEME_PRESETS: &[(&str, ThemePreset)] = &[
    (
        "classic",
        ThemePreset {
            title_color: "\u{1b}[96m",
            subtitle_color: "\u{1b}[95m",
            accent_color: "\u{1b}[93m",
            menu_text_color: "\u{1b}[97m",
            menu_number_color: "\u{1b}[92m",
            error_color: "\u{1b}[91m",
        },
    ),
    (
        "cyber_neon",
        ThemePreset {
            title_color: "#39FF14",
            subtitle_color: "#FF00FF",
            accent_color: "#00FFFF",
            menu_text_color: "#E0E0E0",
            menu_number_color: "#FFD300",
            error_color: "#FF3131",
        },
    ),
    (
        "matrix",
        ThemePreset {
            title_color: "#00FF41",
            subtitle_color: "#008F11",
            accent_color: "#003B00",
            menu_text_color: "#00FF41",
            menu_number_color: "#39FF14",
            error_color: "#FF3131",
        },
    ),
    (
        "nord",
        ThemePreset {
            title_color: "#88C0D0",
            subtitle_color: "#81A1C1",
            accent_color: "#D08770",
            menu_text_color: "#ECEFF4",
            menu_number_color: "#A3BE8C",
            error_color: "#BF616A",
        },
    ),
];

/// Converts a theme color code to a terminal color.
///
/// Accepts `#RRGGBB`, ANSI SGR foreground sequences (`ESC[96m`,
/// `ESC[38;5;208m`, `ESC[38;2;r;g;bm`, optionally with a bold `1;` prefix) and
/// color names such as `cyan` or `light_red`.
pub fn parse_color_code(code: &str) -> Option<Color> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }
    if code.starts_with('#') {
        return color_from_hex(code);
    }
    if let Some(params) = code
        .strip_prefix("\u{1b}[")
        .and_then(|rest| rest.strip_suffix('m'))
    {
        return color_from_sgr(params);
    }
    color_from_name(code)
}

fn color_from_hex(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

fn color_from_sgr(params: &str) -> Option<Color> {
    let codes: Vec<u8> = params
        .split(';')
        .map(|part| part.parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    let mut idx = 0;
    let mut color = None;
    while idx < codes.len() {
        match codes[idx] {
            38 => match codes.get(idx + 1) {
                Some(5) => {
                    color = Some(Color::Indexed(*codes.get(idx + 2)?));
                    idx += 3;
                }
                Some(2) => {
                    let rgb = codes.get(idx + 2..idx + 5)?;
                    color = Some(Color::Rgb(rgb[0], rgb[1], rgb[2]));
                    idx += 5;
                }
                _ => return None,
            },
            code @ (30..=37 | 90..=97) => {
                color = Some(ansi_color(code));
                idx += 1;
            }
            _ => idx += 1,
        }
    }
    color
}

fn ansi_color(code: u8) -> Color {
    match code {
        30 => Color::Black,
        31 => Color::Red,
        32 => Color::Green,
        33 => Color::Yellow,
        34 => Color::Blue,
        35 => Color::Magenta,
        36 => Color::Cyan,
        37 => Color::Gray,
        90 => Color::DarkGray,
        91 => Color::LightRed,
        92 => Color::LightGreen,
        93 => Color::LightYellow,
        94 => Color::LightBlue,
        95 => Color::LightMagenta,
        96 => Color::LightCyan,
        _ => Color::White,
    }
}

fn color_from_name(name: &str) -> Option<Color> {
    let normalized = name.to_ascii_lowercase().replace(['-', ' '], "_");
    let color = match normalized.as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::Gray,
        "dark_gray" | "dark_grey" => Color::DarkGray,
        "light_red" => Color::LightRed,
        "light_green" => Color::LightGreen,
        "light_yellow" => Color::LightYellow,
        "light_blue" => Color::LightBlue,
        "light_magenta" => Color::LightMagenta,
        "light_cyan" => Color::LightCyan,
        "white" => Color::White,
        _ => return None,
    };
    Some(color)
}
