//! Menu state machine.
//!
//! The navigator owns the loaded config, settings and theme, turns submitted
//! input lines into state changes, and hands back [`Effect`]s for anything
//! that needs the terminal (sounds, animations, running a script, exiting).
//! The front end draws whatever [`Navigator::view`] returns.

use std::fs;
use std::io;

use crate::animation::Animation;
use crate::catalog::{self, Entry, EntryKind};
use crate::paths::{self, HubPaths};
use crate::runner::{CapturedRun, RunMode, ScriptRunner};
use crate::sound::Cue;
use crate::store::{Config, KvStore, Settings};
use crate::theme::{Role, Theme, ThemeSource};
use crate::warning::Warning;

const BACK_KEY: &str = "00";
// Fixed keys win over category numbers, so categories 98 and 99 are shadowed.
const README_KEY: &str = "98";
const SETTINGS_KEY: &str = "99";
const EXIT_WORDS: &[&str] = &["q", "quit", "exit"];
const NUMBER_PROMPT: &str = "Enter number: ";
const RETURN_PROMPT: &str = "Press ENTER to return...";
const RETURN_TO_MENU_PROMPT: &str = "Press ENTER to return to menu...";

/// Providers the navigator loads from and saves to.
pub struct Stores {
    pub config: Box<dyn KvStore>,
    pub settings: Box<dyn KvStore>,
    pub themes: Box<dyn ThemeSource>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Sound(Cue),
    Animate {
        animation: Animation,
        label: &'static str,
    },
    Run {
        entry: Entry,
        mode: RunMode,
    },
    Exit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextLine {
    pub text: String,
    pub role: Role,
}

impl TextLine {
    pub fn new(text: impl Into<String>, role: Role) -> Self {
        Self {
            text: text.into(),
            role,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuOption {
    pub key: String,
    pub label: String,
    pub role: Role,
}

impl MenuOption {
    fn numbered(number: usize, label: impl Into<String>) -> Self {
        Self::new(format!("{number:02}"), label, Role::MenuText)
    }

    fn new(key: impl Into<String>, label: impl Into<String>, role: Role) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            role,
        }
    }
}

/// Everything the front end needs to draw the current screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct View {
    pub title: String,
    pub subtitle: String,
    pub creator: String,
    pub heading: TextLine,
    pub body: Vec<TextLine>,
    pub options: Vec<MenuOption>,
    pub prompt: String,
    /// Long body text the user may scroll through.
    pub scrollable: bool,
    pub status: Option<TextLine>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextField {
    Title,
    Subtitle,
}

impl TextField {
    fn key(self) -> &'static str {
        match self {
            TextField::Title => "title",
            TextField::Subtitle => "subtitle",
        }
    }

    fn label(self) -> &'static str {
        match self {
            TextField::Title => "Title",
            TextField::Subtitle => "Subtitle",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Pager {
    heading: TextLine,
    body: Vec<TextLine>,
    prompt: &'static str,
    back: Box<Screen>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Screen {
    Categories,
    Files { category: String },
    RunMode { entry: Entry },
    Settings,
    EditText { field: TextField },
    ThemeChooser,
    AnimationChooser,
    Pager(Pager),
    FailureSummary { entry: Entry, run: CapturedRun },
    Exit,
}

const SETTINGS_OPTIONS: &[&str] = &[
    "Change Title",
    "Change Subtitle",
    "Change Theme",
    "Choose Animation",
    "Toggle Sound",
    "Update README (auto-generate)",
    "About",
];

pub struct Navigator {
    paths: HubPaths,
    stores: Stores,
    config: Config,
    settings: Settings,
    theme: Theme,
    screen: Screen,
    status: Option<TextLine>,
    warnings: Vec<Warning>,
}

impl Navigator {
    pub fn new(paths: HubPaths, stores: Stores) -> Self {
        let config = Config::load(stores.config.as_ref());
        let settings = Settings::load(stores.settings.as_ref());
        let theme = Theme::load(stores.themes.as_ref(), config.value.theme());
        let mut nav = Self {
            paths,
            stores,
            config: config.value,
            settings: settings.value,
            theme: theme.value,
            screen: Screen::Categories,
            status: None,
            warnings: Vec::new(),
        };
        nav.absorb(config.warnings);
        nav.absorb(settings.warnings);
        nav.absorb(theme.warnings);
        nav
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn paths(&self) -> &HubPaths {
        &self.paths
    }

    /// Every warning collected since startup.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_finished(&self) -> bool {
        self.screen == Screen::Exit
    }

    pub fn runner(&self) -> ScriptRunner {
        ScriptRunner::new(self.config.interpreter())
    }

    /// Records warnings: logged, kept, and the latest shown as status.
    pub fn absorb(&mut self, warnings: impl IntoIterator<Item = Warning>) {
        for warning in warnings {
            let warning = warning.logged();
            self.status = Some(TextLine::new(warning.to_string(), Role::Error));
            self.warnings.push(warning);
        }
    }

    fn report_error(&mut self, err: &anyhow::Error) {
        tracing::error!("{err:#}");
        self.status = Some(TextLine::new(format!("{err:#}"), Role::Error));
    }

    fn cue(&self, effects: &mut Vec<Effect>, cue: Cue) {
        if self.config.sound_enabled() {
            effects.push(Effect::Sound(cue));
        }
    }

    /// Leaves the hub: exit cue, one closing animation, then exit.
    pub fn exit(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.exit_into(&mut effects);
        effects
    }

    fn exit_into(&mut self, effects: &mut Vec<Effect>) {
        tracing::info!("Exit requested");
        self.cue(effects, Cue::Exit);
        effects.push(Effect::Animate {
            animation: self.settings.animation(),
            label: "Exiting",
        });
        effects.push(Effect::Exit);
        self.screen = Screen::Exit;
    }

    /// Handles one submitted input line.
    pub fn submit(&mut self, input: &str) -> Vec<Effect> {
        let input = input.trim();
        let mut effects = Vec::new();
        if self.screen == Screen::Exit {
            return effects;
        }
        self.status = None;
        self.cue(&mut effects, Cue::Click);

        if self.accepts_exit_word() && EXIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w)) {
            self.exit_into(&mut effects);
            return effects;
        }

        let screen = std::mem::replace(&mut self.screen, Screen::Categories);
        self.screen = match screen {
            Screen::Categories => self.on_categories(input, &mut effects),
            Screen::Files { category } => self.on_files(category, input),
            Screen::RunMode { entry } => {
                let mode = if matches!(input.to_ascii_lowercase().as_str(), "y" | "yes") {
                    RunMode::Interactive
                } else {
                    RunMode::Captured
                };
                self.cue(&mut effects, Cue::Open);
                effects.push(Effect::Animate {
                    animation: self.settings.animation(),
                    label: "Opening",
                });
                let category = entry.category.clone();
                effects.push(Effect::Run { entry, mode });
                Screen::Files { category }
            }
            Screen::Settings => self.on_settings(input),
            Screen::EditText { field } => {
                if !input.is_empty() {
                    self.config.set(field.key(), input);
                    self.save_config();
                }
                Screen::Settings
            }
            Screen::ThemeChooser => self.on_theme_chooser(input),
            Screen::AnimationChooser => self.on_animation_chooser(input),
            Screen::Pager(pager) => *pager.back,
            Screen::FailureSummary { entry, run } => {
                let back = Box::new(Screen::Files {
                    category: entry.category.clone(),
                });
                if input.eq_ignore_ascii_case("skip") {
                    Screen::Pager(Pager {
                        heading: running_heading(&entry),
                        body: failure_lines(&run),
                        prompt: RETURN_TO_MENU_PROMPT,
                        back,
                    })
                } else {
                    Screen::Pager(Pager {
                        heading: running_heading(&entry),
                        body: full_output_lines(&run),
                        prompt: RETURN_TO_MENU_PROMPT,
                        back,
                    })
                }
            }
            Screen::Exit => Screen::Exit,
        };
        effects
    }

    fn accepts_exit_word(&self) -> bool {
        matches!(
            self.screen,
            Screen::Categories
                | Screen::Files { .. }
                | Screen::Settings
                | Screen::ThemeChooser
                | Screen::AnimationChooser
        )
    }

    fn on_categories(&mut self, input: &str, effects: &mut Vec<Effect>) -> Screen {
        let categories = catalog::scan_categories(&self.paths.content_dir);
        if categories.is_empty() {
            if input == BACK_KEY {
                self.exit_into(effects);
                return Screen::Exit;
            }
            if let Err(warning) = paths::create_dir(&self.paths.content_dir) {
                self.absorb([warning]);
            }
            return Screen::Categories;
        }
        match input {
            BACK_KEY => {
                self.exit_into(effects);
                Screen::Exit
            }
            SETTINGS_KEY => Screen::Settings,
            README_KEY => {
                let body = match fs::read_to_string(&self.paths.readme_file) {
                    Ok(text) => text_lines(&text, Role::MenuText),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {
                        vec![TextLine::new("README.md not found.", Role::Error)]
                    }
                    Err(err) => vec![TextLine::new(
                        format!("Failed to read README.md: {err}"),
                        Role::Error,
                    )],
                };
                Screen::Pager(Pager {
                    heading: TextLine::new("---- README.md ----", Role::MenuText),
                    body,
                    prompt: RETURN_PROMPT,
                    back: Box::new(Screen::Categories),
                })
            }
            _ => match pick(input, categories.len()) {
                Some(idx) => Screen::Files {
                    category: categories[idx].clone(),
                },
                None => Screen::Categories,
            },
        }
    }

    fn on_files(&mut self, category: String, input: &str) -> Screen {
        if input == BACK_KEY {
            return Screen::Categories;
        }
        let mut entries = catalog::list_entries(&self.paths.content_dir, &category);
        let Some(idx) = pick(input, entries.len()) else {
            return Screen::Files { category };
        };
        let entry = entries.swap_remove(idx);
        match entry.kind {
            EntryKind::Script => Screen::RunMode { entry },
            EntryKind::Document => {
                let body = match fs::read_to_string(&entry.path) {
                    Ok(text) => text_lines(&text, Role::MenuText),
                    Err(err) => vec![TextLine::new(
                        format!("Failed to read file: {err}"),
                        Role::Error,
                    )],
                };
                Screen::Pager(Pager {
                    heading: TextLine::new(
                        format!("---- Viewing {} ----", entry.name),
                        Role::MenuText,
                    ),
                    body,
                    prompt: RETURN_PROMPT,
                    back: Box::new(Screen::Files { category }),
                })
            }
        }
    }

    fn on_settings(&mut self, input: &str) -> Screen {
        match input {
            BACK_KEY => Screen::Categories,
            "01" => Screen::EditText {
                field: TextField::Title,
            },
            "02" => Screen::EditText {
                field: TextField::Subtitle,
            },
            "03" => Screen::ThemeChooser,
            "04" => Screen::AnimationChooser,
            "05" => {
                self.config.toggle_sound();
                self.save_config();
                Screen::Settings
            }
            "06" => match catalog::write_readme(
                &self.paths.content_dir,
                &self.paths.readme_file,
                self.config.title(),
            ) {
                Ok(()) => {
                    tracing::info!("Regenerated {}", self.paths.readme_file.display());
                    Screen::Pager(Pager {
                        heading: TextLine::new("README updated.", Role::Accent),
                        body: Vec::new(),
                        prompt: RETURN_PROMPT,
                        back: Box::new(Screen::Settings),
                    })
                }
                Err(err) => {
                    self.report_error(&err);
                    Screen::Settings
                }
            },
            "07" => Screen::Pager(Pager {
                heading: TextLine::new(
                    format!("Script Hub v{}", env!("CARGO_PKG_VERSION")),
                    Role::Accent,
                ),
                body: vec![
                    TextLine::new(
                        "A terminal launcher for organizing and running games, scripts, and notes.",
                        Role::MenuText,
                    ),
                    TextLine::new(String::new(), Role::MenuText),
                    TextLine::new(
                        format!("Content: {}", self.paths.content_dir.display()),
                        Role::MenuText,
                    ),
                    TextLine::new(
                        format!("Themes:  {}", self.paths.theme_dir.display()),
                        Role::MenuText,
                    ),
                ],
                prompt: RETURN_PROMPT,
                back: Box::new(Screen::Settings),
            }),
            _ => Screen::Settings,
        }
    }

    fn on_theme_chooser(&mut self, input: &str) -> Screen {
        if input == BACK_KEY {
            return Screen::Settings;
        }
        let names = self.stores.themes.names();
        let Some(idx) = pick(input, names.len()) else {
            return Screen::ThemeChooser;
        };
        let name = &names[idx];
        self.config.set("theme", name);
        self.save_config();
        let loaded = Theme::load(self.stores.themes.as_ref(), name);
        self.theme = loaded.value;
        self.absorb(loaded.warnings);
        Screen::Settings
    }

    fn on_animation_chooser(&mut self, input: &str) -> Screen {
        if input == BACK_KEY {
            return Screen::Settings;
        }
        let Some(idx) = pick(input, Animation::ALL.len()) else {
            return Screen::AnimationChooser;
        };
        self.settings.set_animation(Animation::ALL[idx]);
        if let Err(err) = self.settings.save(self.stores.settings.as_ref()) {
            self.report_error(&err);
        }
        Screen::Settings
    }

    fn save_config(&mut self) {
        if let Err(err) = self.config.save(self.stores.config.as_ref()) {
            self.report_error(&err);
        }
    }

    /// Shows the outcome of a captured run.
    pub fn record_capture(&mut self, entry: &Entry, run: CapturedRun) {
        let back = Box::new(Screen::Files {
            category: entry.category.clone(),
        });
        self.screen = if run.success() {
            Screen::Pager(Pager {
                heading: running_heading(entry),
                body: text_lines(&run.stdout, Role::MenuText),
                prompt: "Program finished. Press ENTER to return.",
                back,
            })
        } else {
            Screen::FailureSummary {
                entry: entry.clone(),
                run,
            }
        };
    }

    /// Shows a script that could not be started at all.
    pub fn record_launch_failure(&mut self, entry: &Entry, err: &anyhow::Error) {
        tracing::error!("{err:#}");
        self.screen = Screen::Pager(Pager {
            heading: running_heading(entry),
            body: vec![TextLine::new(
                format!("[ERROR] Running script error: {err:#}"),
                Role::Error,
            )],
            prompt: RETURN_PROMPT,
            back: Box::new(Screen::Files {
                category: entry.category.clone(),
            }),
        });
    }

    pub fn view(&self) -> View {
        let mut body = Vec::new();
        let mut options = Vec::new();
        let mut prompt = NUMBER_PROMPT.to_string();
        let mut scrollable = false;

        let heading = match &self.screen {
            Screen::Categories => {
                let categories = catalog::scan_categories(&self.paths.content_dir);
                if categories.is_empty() {
                    let folder = self
                        .paths
                        .content_dir
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    body.push(TextLine::new(
                        format!("Create folders under {folder}/ like games, scripts, tools etc."),
                        Role::MenuText,
                    ));
                    prompt = format!("Press ENTER to create the {folder} folder...");
                    TextLine::new(
                        format!("No content found in '{folder}/' folder."),
                        Role::Error,
                    )
                } else {
                    options.extend(
                        categories
                            .into_iter()
                            .enumerate()
                            .map(|(idx, name)| MenuOption::numbered(idx + 1, name)),
                    );
                    options.push(MenuOption::new(README_KEY, "View README", Role::MenuText));
                    options.push(MenuOption::new(SETTINGS_KEY, "Settings", Role::MenuText));
                    options.push(MenuOption::new(BACK_KEY, "Exit", Role::Error));
                    TextLine::new("Categories:", Role::MenuText)
                }
            }
            Screen::Files { category } => {
                let entries = catalog::list_entries(&self.paths.content_dir, category);
                if entries.is_empty() {
                    body.push(TextLine::new("(no scripts or documents)", Role::MenuText));
                }
                options.extend(
                    entries
                        .into_iter()
                        .enumerate()
                        .map(|(idx, entry)| MenuOption::numbered(idx + 1, entry.name)),
                );
                options.push(MenuOption::new(BACK_KEY, "Back", Role::Error));
                TextLine::new(format!("[ {category} ]"), Role::MenuText)
            }
            Screen::RunMode { entry } => {
                prompt = "Run interactively? (y/n) [n]: ".to_string();
                TextLine::new(format!("[ {} ] {}", entry.category, entry.name), Role::MenuText)
            }
            Screen::Settings => {
                options.extend(
                    SETTINGS_OPTIONS
                        .iter()
                        .enumerate()
                        .map(|(idx, label)| MenuOption::numbered(idx + 1, *label)),
                );
                options.push(MenuOption::new(BACK_KEY, "Back", Role::Error));
                body.push(TextLine::new(
                    format!(
                        "Theme: {}   Animation: {}   Sound: {}",
                        self.config.theme(),
                        self.settings.animation(),
                        if self.config.sound_enabled() { "on" } else { "off" }
                    ),
                    Role::Subtitle,
                ));
                TextLine::new("Settings:", Role::MenuText)
            }
            Screen::EditText { field } => {
                body.push(TextLine::new(
                    format!("Current: {}", self.config.get(field.key())),
                    Role::MenuText,
                ));
                prompt = format!("New {}: ", field.label());
                TextLine::new(format!("Change {}", field.label()), Role::MenuText)
            }
            Screen::ThemeChooser => {
                let current = self.config.theme();
                options.extend(self.stores.themes.names().into_iter().enumerate().map(
                    |(idx, name)| {
                        let label = if name == current {
                            format!("{name} *")
                        } else {
                            name
                        };
                        MenuOption::numbered(idx + 1, label)
                    },
                ));
                options.push(MenuOption::new(BACK_KEY, "Back", Role::MenuText));
                prompt = "Choose theme number: ".to_string();
                TextLine::new("Available Themes:", Role::MenuText)
            }
            Screen::AnimationChooser => {
                let current = self.settings.animation();
                options.extend(Animation::ALL.iter().enumerate().map(|(idx, animation)| {
                    let label = if *animation == current {
                        format!("{animation} *")
                    } else {
                        animation.to_string()
                    };
                    MenuOption::numbered(idx + 1, label)
                }));
                options.push(MenuOption::new(BACK_KEY, "Back", Role::MenuText));
                prompt = "Choose animation: ".to_string();
                TextLine::new("Animation options:", Role::MenuText)
            }
            Screen::Pager(pager) => {
                body = pager.body.clone();
                prompt = pager.prompt.to_string();
                scrollable = true;
                pager.heading.clone()
            }
            Screen::FailureSummary { entry, run } => {
                body = failure_lines(run);
                prompt =
                    "Press ENTER to view full output & traceback, or type 'skip' to skip: "
                        .to_string();
                scrollable = true;
                running_heading(entry)
            }
            Screen::Exit => {
                prompt = String::new();
                TextLine::new("Goodbye!", Role::MenuText)
            }
        };

        View {
            title: self.config.title().to_string(),
            subtitle: self.config.subtitle().to_string(),
            creator: self.config.creator().to_string(),
            heading,
            body,
            options,
            prompt,
            scrollable,
            status: self.status.clone(),
        }
    }
}

/// Maps a 1-based menu number to an index.
fn pick(input: &str, len: usize) -> Option<usize> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number: usize = input.parse().ok()?;
    (1..=len).contains(&number).then(|| number - 1)
}

fn running_heading(entry: &Entry) -> TextLine {
    TextLine::new(format!("--- Running {} ---", entry.name), Role::Accent)
}

fn failure_lines(run: &CapturedRun) -> Vec<TextLine> {
    let mut lines = text_lines(&run.stdout, Role::MenuText);
    lines.push(TextLine::new(
        "[ERROR] Script finished with errors.",
        Role::Error,
    ));
    lines.extend(
        run.error_summary()
            .into_iter()
            .map(|line| TextLine::new(plain_text(line), Role::Error)),
    );
    lines
}

fn full_output_lines(run: &CapturedRun) -> Vec<TextLine> {
    let mut lines = vec![TextLine::new("--- FULL STDOUT ---", Role::Accent)];
    lines.extend(text_lines(&run.stdout, Role::MenuText));
    lines.push(TextLine::new(String::new(), Role::MenuText));
    lines.push(TextLine::new("--- FULL STDERR ---", Role::Accent));
    lines.extend(text_lines(&run.stderr, Role::Error));
    lines
}

fn text_lines(text: &str, role: Role) -> Vec<TextLine> {
    text.lines()
        .map(|line| TextLine::new(plain_text(line), role))
        .collect()
}

/// Drops terminal escape sequences and carriage-return overdraws so captured
/// output renders as plain text.
fn plain_text(line: &str) -> String {
    let visible = line.rsplit('\r').find(|part| !part.is_empty()).unwrap_or("");
    let mut out = String::with_capacity(visible.len());
    let mut chars = visible.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\u{1b}' => match chars.next() {
                Some('[') => {
                    for c in chars.by_ref() {
                        if ('\u{40}'..='\u{7e}').contains(&c) {
                            break;
                        }
                    }
                }
                // OSC runs to BEL or ESC \
                Some(']') => {
                    while let Some(c) = chars.next() {
                        if c == '\u{7}' {
                            break;
                        }
                        if c == '\u{1b}' {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            },
            '\u{7}' => {}
            '\t' => out.push_str("    "),
            _ => out.push(ch),
        }
    }
    out
}
