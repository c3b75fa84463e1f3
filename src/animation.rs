use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Transition animation played when opening a script and when exiting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Animation {
    #[default]
    Spinner,
    Progress,
    Diagonal,
    Dots,
}

/// One rendered frame, shown for `delay` before the next one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub lines: Vec<String>,
    pub delay: Duration,
}

impl Frame {
    fn single(line: String, delay: Duration) -> Self {
        Self {
            lines: vec![line],
            delay,
        }
    }
}

const SPINNER_GLYPHS: [char; 4] = ['|', '/', '-', '\\'];
const SPINNER_CYCLES: usize = 8;
const PROGRESS_CELLS: usize = 24;
const DIAGONAL_ROWS: usize = 8;
const DIAGONAL_CYCLES: usize = 3;
const DOTS_REPEATS: usize = 3;

impl Animation {
    pub const ALL: [Animation; 4] = [
        Animation::Spinner,
        Animation::Progress,
        Animation::Diagonal,
        Animation::Dots,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Animation::Spinner => "spinner",
            Animation::Progress => "progress",
            Animation::Diagonal => "diagonal",
            Animation::Dots => "dots",
        }
    }

    pub fn frames(self, label: &str) -> Vec<Frame> {
        match self {
            Animation::Spinner => {
                let delay = Duration::from_millis(100);
                (0..SPINNER_CYCLES)
                    .flat_map(|_| SPINNER_GLYPHS)
                    .map(|glyph| Frame::single(format!("{label} {glyph}"), delay))
                    .collect()
            }
            Animation::Progress => {
                let delay = Duration::from_millis(30);
                (0..=PROGRESS_CELLS)
                    .map(|filled| {
                        let pct = filled * 100 / PROGRESS_CELLS;
                        Frame::single(
                            format!(
                                "{label}: [{}{}] {pct}%",
                                "#".repeat(filled),
                                "-".repeat(PROGRESS_CELLS - filled)
                            ),
                            delay,
                        )
                    })
                    .collect()
            }
            Animation::Diagonal => {
                let delay = Duration::from_millis(80);
                (0..DIAGONAL_CYCLES)
                    .flat_map(|_| 0..DIAGONAL_ROWS)
                    .map(|row| {
                        let mut lines = vec![String::new(); row];
                        lines.push(format!("{}•", " ".repeat(row * 2)));
                        Frame { lines, delay }
                    })
                    .collect()
            }
            Animation::Dots => {
                let delay = Duration::from_millis(400);
                (0..DOTS_REPEATS)
                    .flat_map(|_| 1..=3)
                    .map(|count| Frame::single(format!("{label}{}", ".".repeat(count)), delay))
                    .collect()
            }
        }
    }
}

impl fmt::Display for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Animation {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Animation::ALL
            .into_iter()
            .find(|animation| animation.name().eq_ignore_ascii_case(value))
            .ok_or_else(|| format!("unknown animation: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for animation in Animation::ALL {
            assert_eq!(animation.name().parse::<Animation>(), Ok(animation));
        }
        assert_eq!(" Dots ".parse::<Animation>(), Ok(Animation::Dots));
        assert!("sparkle".parse::<Animation>().is_err());
    }

    #[test]
    fn spinner_cycles_through_glyphs() {
        let frames = Animation::Spinner.frames("Loading");
        assert_eq!(frames.len(), 32);
        assert_eq!(frames[0].lines, vec!["Loading |"]);
        assert_eq!(frames[3].lines, vec!["Loading \\"]);
    }

    #[test]
    fn progress_ends_full() {
        let frames = Animation::Progress.frames("Opening");
        assert_eq!(frames.len(), 25);
        assert_eq!(
            frames[0].lines[0],
            format!("Opening: [{}] 0%", "-".repeat(24))
        );
        assert_eq!(
            frames[24].lines[0],
            format!("Opening: [{}] 100%", "#".repeat(24))
        );
    }

    #[test]
    fn diagonal_walks_down_and_right() {
        let frames = Animation::Diagonal.frames("ignored");
        assert_eq!(frames.len(), 24);
        let third = &frames[2].lines;
        assert_eq!(third.len(), 3);
        assert_eq!(third[2], "    •");
    }

    #[test]
    fn dots_grow_to_three() {
        let frames = Animation::Dots.frames("Exiting");
        assert_eq!(frames.len(), 9);
        assert_eq!(frames[2].lines[0], "Exiting...");
        assert_eq!(frames[3].lines[0], "Exiting.");
    }
}
