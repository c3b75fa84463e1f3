use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Click,
    Open,
    Exit,
}

impl Cue {
    pub fn file_name(self) -> &'static str {
        match self {
            Cue::Click => "click.wav",
            Cue::Open => "open.wav",
            Cue::Exit => "exit.wav",
        }
    }
}

type Player = (&'static str, &'static [&'static str]);

/// Players tried in order, with the arguments placed before the file path.
const PLAYERS: &[Player] = &[
    ("termux-media-player", &["play"]),
    ("paplay", &[]),
    ("aplay", &["-q"]),
    ("afplay", &[]),
];

/// Starts playback of a cue without waiting for it. Missing files and missing
/// players are not errors.
pub fn play(sound_dir: &Path, cue: Cue) {
    let _ = play_with(PLAYERS, sound_dir, cue);
}

/// Spawns the first available player. The child is reaped on a helper thread
/// whose handle yields its exit status.
fn play_with(
    players: &[Player],
    sound_dir: &Path,
    cue: Cue,
) -> Option<JoinHandle<Option<ExitStatus>>> {
    let path = sound_dir.join(cue.file_name());
    if !path.is_file() {
        return None;
    }
    for (player, args) in players {
        let spawned = Command::new(player)
            .args(*args)
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(mut child) => {
                let player = *player;
                return Some(thread::spawn(move || match child.wait() {
                    Ok(status) => Some(status),
                    Err(err) => {
                        tracing::debug!("{player} could not be reaped: {err}");
                        None
                    }
                }));
            }
            Err(err) => tracing::debug!("{player} unavailable: {err}"),
        }
    }
    None
}
