//! Terminal front end: draws navigator views and executes their effects.

use std::io::{self, Write};
use std::sync::OnceLock;
use std::thread;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, ExecutableCommand};
use figlet_rs::FIGfont;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Margin, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::animation::Animation;
use crate::catalog::Entry;
use crate::nav::{Effect, Navigator, View};
use crate::runner::RunMode;
use crate::sound;
use crate::theme::{Role, Theme};

const MIN_RULE_WIDTH: usize = 48;
const PAGE_STEP: u16 = 10;
/// Rows the menu needs below the header before the block-art title is used.
const ROWS_BELOW_BANNER: usize = 16;

#[derive(Default)]
struct InputState {
    buffer: String,
    scroll: u16,
    /// Last scrollable row offset, measured on the previous draw.
    max_scroll: u16,
}

#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Submit(String),
    Quit,
    Edited,
}

impl InputState {
    fn handle(&mut self, key: KeyEvent) -> KeyOutcome {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                KeyOutcome::Quit
            }
            KeyCode::Enter => {
                self.scroll = 0;
                KeyOutcome::Submit(std::mem::take(&mut self.buffer))
            }
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.buffer.push(ch);
                KeyOutcome::Edited
            }
            KeyCode::Backspace => {
                self.buffer.pop();
                KeyOutcome::Edited
            }
            KeyCode::Esc => {
                self.buffer.clear();
                KeyOutcome::Edited
            }
            KeyCode::Up => self.scroll_to(self.scroll.saturating_sub(1)),
            KeyCode::Down => self.scroll_to(self.scroll.saturating_add(1)),
            KeyCode::PageUp => self.scroll_to(self.scroll.saturating_sub(PAGE_STEP)),
            KeyCode::PageDown => self.scroll_to(self.scroll.saturating_add(PAGE_STEP)),
            _ => KeyOutcome::Edited,
        }
    }

    fn scroll_to(&mut self, row: u16) -> KeyOutcome {
        self.scroll = row.min(self.max_scroll);
        KeyOutcome::Edited
    }
}

/// Runs the hub until the navigator reaches its exit state.
pub fn run(nav: &mut Navigator) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, nav);

    restore_terminal(&mut terminal)?;
    result
}

fn event_loop<B>(terminal: &mut Terminal<B>, nav: &mut Navigator) -> Result<()>
where
    B: Backend + Write,
{
    let mut input = InputState::default();
    while !nav.is_finished() {
        let view = nav.view();
        terminal.draw(|frame| render(frame, &view, nav.theme(), &mut input))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if let Some(effects) = handle_key(key, nav, &mut input) {
            apply_effects(terminal, nav, effects)?;
        }
    }
    Ok(())
}

/// Edits the input line; returns effects once a line is submitted.
fn handle_key(key: KeyEvent, nav: &mut Navigator, input: &mut InputState) -> Option<Vec<Effect>> {
    match input.handle(key) {
        KeyOutcome::Submit(line) => Some(nav.submit(&line)),
        KeyOutcome::Quit => Some(nav.exit()),
        KeyOutcome::Edited => None,
    }
}

fn apply_effects<B>(
    terminal: &mut Terminal<B>,
    nav: &mut Navigator,
    effects: Vec<Effect>,
) -> Result<()>
where
    B: Backend + Write,
{
    for effect in effects {
        match effect {
            Effect::Sound(cue) => sound::play(&nav.paths().sound_dir, cue),
            Effect::Animate { animation, label } => {
                play_animation(terminal, nav.theme(), animation, label)?;
            }
            Effect::Run {
                entry,
                mode: RunMode::Interactive,
            } => run_interactive(terminal, nav, &entry)?,
            Effect::Run {
                entry,
                mode: RunMode::Captured,
            } => {
                let heading = format!("--- Running {} ---", entry.name);
                terminal.draw(|frame| render_banner(frame, nav.theme(), &[heading]))?;
                match nav.runner().run_captured(&entry.path) {
                    Ok(run) => nav.record_capture(&entry, run),
                    Err(err) => nav.record_launch_failure(&entry, &err),
                }
            }
            Effect::Exit => {}
        }
    }
    Ok(())
}

fn play_animation<B>(
    terminal: &mut Terminal<B>,
    theme: &Theme,
    animation: Animation,
    label: &str,
) -> Result<()>
where
    B: Backend + Write,
{
    for frame in animation.frames(label) {
        terminal.draw(|f| render_banner(f, theme, &frame.lines))?;
        thread::sleep(frame.delay);
    }
    Ok(())
}

fn run_interactive<B>(terminal: &mut Terminal<B>, nav: &Navigator, entry: &Entry) -> Result<()>
where
    B: Backend + Write,
{
    let runner = nav.runner();
    let pause = nav.config().pause_after_run();
    with_terminal_suspension(terminal, || {
        println!("--- Running {} ---\n", entry.name);
        match runner.run_interactive(&entry.path) {
            Ok(code) => {
                if pause {
                    let code = code.map_or_else(|| "none".to_string(), |c| c.to_string());
                    println!("\nProgram exited with code {code}. Press ENTER to return...");
                    wait_for_enter();
                }
            }
            Err(err) => {
                tracing::error!("{err:#}");
                println!("[ERROR] Failed to launch interactively.");
                println!("{err:#}");
                println!("Press ENTER to return...");
                wait_for_enter();
            }
        }
        Ok(())
    })
}

fn wait_for_enter() {
    let _ = io::stdout().flush();
    let _ = io::stdin().read_line(&mut String::new());
}

fn with_terminal_suspension<B, F, T>(terminal: &mut Terminal<B>, f: F) -> Result<T>
where
    B: Backend + Write,
    F: FnOnce() -> Result<T>,
{
    terminal.show_cursor()?;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    let result = f();
    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal.clear()?;
    result
}

fn restore_terminal<B>(terminal: &mut Terminal<B>) -> Result<()>
where
    B: Backend + Write,
{
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// The configured title drawn in the standard figlet font, trimmed of blank
/// rows. `None` when the font or the text cannot be rendered.
fn title_art(title: &str) -> Option<Vec<String>> {
    static FONT: OnceLock<Option<FIGfont>> = OnceLock::new();
    let font = FONT
        .get_or_init(|| match FIGfont::standard() {
            Ok(font) => Some(font),
            Err(err) => {
                tracing::warn!("Banner font unavailable: {err}");
                None
            }
        })
        .as_ref()?;
    let figure = font.convert(title)?.to_string();
    let mut lines: Vec<String> = figure
        .lines()
        .map(|line| line.trim_end().to_string())
        .collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    let blank_top = lines.iter().take_while(|line| line.is_empty()).count();
    lines.drain(..blank_top);
    (!lines.is_empty()).then_some(lines)
}

/// Banner, subtitle, creator line and rule. Falls back to the plain title when
/// the art does not fit the area.
fn header_lines(view: &View, theme: &Theme, width: u16, height: u16) -> Vec<Line<'static>> {
    let art = title_art(&view.title).filter(|art| {
        art.iter().map(|line| line.width()).max().unwrap_or(0) <= width as usize
            && height as usize >= art.len() + ROWS_BELOW_BANNER
    });
    let title = art.unwrap_or_else(|| vec![view.title.clone()]);
    let creator =
        (!view.creator.is_empty()).then(|| format!("[-] Tool Created by {}", view.creator));

    let rule_width = title
        .iter()
        .map(|line| line.width())
        .chain([view.subtitle.width(), MIN_RULE_WIDTH])
        .chain(creator.iter().map(|line| line.width()))
        .max()
        .unwrap_or(MIN_RULE_WIDTH)
        .min(width as usize);

    let mut lines: Vec<Line<'static>> = title
        .into_iter()
        .map(|line| Line::from(Span::styled(line, theme.style(Role::Title))))
        .collect();
    lines.push(Line::from(Span::styled(
        view.subtitle.clone(),
        theme.style(Role::Subtitle),
    )));
    if let Some(creator) = creator {
        lines.push(Line::from(Span::styled(creator, theme.style(Role::MenuNumber))));
    }
    lines.push(Line::from(Span::styled(
        "=".repeat(rule_width),
        theme.style(Role::Accent),
    )));
    lines
}

/// Breaks lines into rows of at most `width` cells, keeping span styles. The
/// body is drawn from these rows so scrolling counts what is on screen.
fn wrap_rows(lines: Vec<Line<'static>>, width: u16) -> Vec<Line<'static>> {
    let width = usize::from(width.max(1));
    let mut rows = Vec::new();
    for line in lines {
        let mut row: Vec<Span<'static>> = Vec::new();
        let mut used = 0;
        for span in line.spans {
            let mut piece = String::new();
            for ch in span.content.chars() {
                let cells = ch.width().unwrap_or(0);
                if used > 0 && used + cells > width {
                    if !piece.is_empty() {
                        row.push(Span::styled(std::mem::take(&mut piece), span.style));
                    }
                    rows.push(Line::from(std::mem::take(&mut row)));
                    used = 0;
                }
                piece.push(ch);
                used += cells;
            }
            if !piece.is_empty() {
                row.push(Span::styled(piece, span.style));
            }
        }
        rows.push(Line::from(row));
    }
    rows
}

fn render(frame: &mut Frame, view: &View, theme: &Theme, input: &mut InputState) {
    let area = frame.size().inner(&Margin {
        horizontal: 1,
        vertical: 0,
    });
    let header = header_lines(view, theme, area.width, area.height);
    let header_height = header.len() as u16;
    if area.width == 0 || area.height < header_height + 3 {
        return;
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(header_height),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    frame.render_widget(Paragraph::new(header), chunks[0]);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            view.heading.text.clone(),
            theme.style(view.heading.role),
        ))),
        chunks[2],
    );

    let mut content: Vec<Line<'static>> = view
        .body
        .iter()
        .map(|line| Line::from(Span::styled(line.text.clone(), theme.style(line.role))))
        .collect();
    if !view.options.is_empty() {
        if !content.is_empty() {
            content.push(Line::from(""));
        }
        content.extend(view.options.iter().map(|option| {
            Line::from(vec![
                Span::styled(option.key.clone(), theme.style(Role::MenuNumber)),
                Span::raw(" "),
                Span::styled(option.label.clone(), theme.style(option.role)),
            ])
        }));
    }
    let rows = wrap_rows(content, chunks[3].width);
    input.max_scroll = if view.scrollable {
        let hidden = rows.len().saturating_sub(usize::from(chunks[3].height));
        hidden.min(u16::MAX as usize) as u16
    } else {
        0
    };
    input.scroll = input.scroll.min(input.max_scroll);
    frame.render_widget(Paragraph::new(rows).scroll((input.scroll, 0)), chunks[3]);

    let status = match &view.status {
        Some(line) => Line::from(Span::styled(line.text.clone(), theme.style(line.role))),
        None if view.scrollable => Line::from(Span::styled(
            "Up/Down or PgUp/PgDn to scroll",
            theme.style(Role::Subtitle),
        )),
        None => Line::from(""),
    };
    frame.render_widget(Paragraph::new(status), chunks[4]);

    render_prompt(frame, chunks[5], view, theme, input);
}

fn render_prompt(frame: &mut Frame, area: Rect, view: &View, theme: &Theme, input: &InputState) {
    let prompt = Line::from(vec![
        Span::styled(view.prompt.clone(), theme.style(Role::MenuText)),
        Span::raw(input.buffer.clone()),
    ]);
    frame.render_widget(Paragraph::new(prompt), area);
    let offset = view.prompt.width() + input.buffer.width();
    let x = area
        .x
        .saturating_add(offset.min(u16::MAX as usize) as u16)
        .min(area.right().saturating_sub(1));
    frame.set_cursor(x, area.y);
}

/// Full-screen text used for animation frames and the captured-run notice.
fn render_banner(frame: &mut Frame, theme: &Theme, lines: &[String]) {
    let area = frame.size().inner(&Margin {
        horizontal: 1,
        vertical: 1,
    });
    let text: Vec<Line> = lines
        .iter()
        .map(|line| Line::from(Span::styled(line.clone(), theme.style(Role::Accent))))
        .collect();
    frame.render_widget(Paragraph::new(text), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::TextLine;
    use ratatui::backend::TestBackend;

    fn pager(body: Vec<TextLine>) -> View {
        View {
            title: "HURON".into(),
            subtitle: "AI-LINUX v1.0".into(),
            creator: String::new(),
            heading: TextLine::new("---- Viewing notes.md ----", Role::MenuText),
            body,
            options: Vec::new(),
            prompt: "Press ENTER to return to menu...".into(),
            scrollable: true,
            status: None,
        }
    }

    fn press(input: &mut InputState, code: KeyCode) -> KeyOutcome {
        input.handle(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn screen_rows(terminal: &Terminal<TestBackend>) -> Vec<String> {
        let buffer = terminal.backend().buffer();
        let width = usize::from(buffer.area.width);
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    fn text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn wrapped_pager_scrolls_to_the_last_row() {
        let view = pager(vec![
            TextLine::new("x".repeat(1500), Role::MenuText),
            TextLine::new("THE_END", Role::MenuText),
        ]);
        let theme = Theme::empty("plain");
        let mut input = InputState::default();
        let mut terminal = Terminal::new(TestBackend::new(40, 14)).unwrap();

        terminal
            .draw(|frame| render(frame, &view, &theme, &mut input))
            .unwrap();
        assert!(input.max_scroll > 1);
        assert!(!screen_rows(&terminal).iter().any(|row| row.contains("THE_END")));

        for _ in 0..10 {
            press(&mut input, KeyCode::PageDown);
        }
        assert_eq!(input.scroll, input.max_scroll);
        terminal
            .draw(|frame| render(frame, &view, &theme, &mut input))
            .unwrap();
        assert!(screen_rows(&terminal).iter().any(|row| row.contains("THE_END")));
    }

    #[test]
    fn menus_do_not_scroll() {
        let view = View {
            scrollable: false,
            ..pager(vec![TextLine::new("y".repeat(500), Role::MenuText)])
        };
        let mut input = InputState::default();
        let mut terminal = Terminal::new(TestBackend::new(40, 14)).unwrap();
        terminal
            .draw(|frame| render(frame, &view, &Theme::empty("plain"), &mut input))
            .unwrap();
        press(&mut input, KeyCode::Down);
        assert_eq!(input.scroll, 0);
    }

    #[test]
    fn wrap_keeps_styles_and_breaks_on_cell_width() {
        let theme = Theme::empty("plain");
        let line = Line::from(vec![
            Span::styled("01", theme.style(Role::MenuNumber)),
            Span::raw(" "),
            Span::raw("abcdef"),
        ]);
        let rows = wrap_rows(vec![line, Line::from("")], 4);
        let texts: Vec<String> = rows.iter().map(text).collect();
        assert_eq!(texts, vec!["01 a", "bcde", "f", ""]);
        assert_eq!(rows[0].spans.len(), 3);

        let wide = wrap_rows(vec![Line::from("日本語")], 4);
        assert_eq!(wide.iter().map(text).collect::<Vec<_>>(), vec!["日本", "語"]);
    }

    #[test]
    fn wide_terminal_gets_block_title_and_creator_line() {
        let view = View {
            creator: "someone".into(),
            ..pager(Vec::new())
        };
        let lines = header_lines(&view, &Theme::empty("plain"), 120, 40);
        let texts: Vec<String> = lines.iter().map(text).collect();

        assert!(texts.len() > 4, "{texts:?}");
        assert_ne!(texts[0], "HURON");
        let n = texts.len();
        assert_eq!(texts[n - 3], "AI-LINUX v1.0");
        assert_eq!(texts[n - 2], "[-] Tool Created by someone");
        assert!(texts[n - 1].chars().all(|c| c == '='));
        assert!(texts[n - 1].len() >= MIN_RULE_WIDTH);
    }

    #[test]
    fn narrow_terminal_falls_back_to_plain_title() {
        let view = pager(Vec::new());
        let texts: Vec<String> = header_lines(&view, &Theme::empty("plain"), 20, 40)
            .iter()
            .map(text)
            .collect();
        assert_eq!(texts, vec!["HURON", "AI-LINUX v1.0", "=".repeat(20).as_str()]);

        let short: Vec<String> = header_lines(&view, &Theme::empty("plain"), 120, 12)
            .iter()
            .map(text)
            .collect();
        assert_eq!(short[0], "HURON");
    }

    #[test]
    fn control_and_alt_letters_stay_out_of_the_input_line() {
        let mut input = InputState::default();
        input.handle(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL));
        input.handle(KeyEvent::new(KeyCode::Char('f'), KeyModifiers::ALT));
        input.handle(KeyEvent::new(KeyCode::Char('Q'), KeyModifiers::SHIFT));
        press(&mut input, KeyCode::Char('1'));
        assert_eq!(input.buffer, "Q1");

        assert_eq!(
            input.handle(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyOutcome::Quit
        );
        assert_eq!(
            press(&mut input, KeyCode::Enter),
            KeyOutcome::Submit("Q1".into())
        );
        assert!(input.buffer.is_empty());
    }
}
