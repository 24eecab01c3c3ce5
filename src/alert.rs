//! What happens when the countdown crosses zero: a sound, and optionally a
//! desktop notification. Everything here is best effort.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use notify_rust::Notification;
use thiserror::Error;

use crate::config::Settings;
use crate::controller::AlertSink;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("sound file {0} does not exist")]
    Missing(PathBuf),
    #[error("cannot ring the terminal bell: {0}")]
    Bell(#[from] io::Error),
}

#[cfg(target_os = "macos")]
const PLAYERS: &[&str] = &["afplay"];
#[cfg(not(target_os = "macos"))]
const PLAYERS: &[&str] = &["paplay", "aplay", "ffplay"];

pub struct SoundAlert {
    sound: Option<PathBuf>,
    notify: bool,
    muted: bool,
}

impl SoundAlert {
    pub fn new(settings: &Settings, muted: bool) -> Self {
        Self {
            sound: settings.timeout_sound.clone(),
            notify: settings.notify,
            muted,
        }
    }

    pub fn update(&mut self, settings: &Settings) {
        self.sound = settings.timeout_sound.clone();
        self.notify = settings.notify;
    }

    pub fn sound(&self) -> Option<&Path> {
        self.sound.as_deref()
    }

    fn ring(&self) -> Result<(), AlertError> {
        match &self.sound {
            Some(path) => play(path),
            None => {
                let mut out = io::stdout();
                out.write_all(b"\x07")?;
                out.flush()?;
                Ok(())
            }
        }
    }
}

impl AlertSink for SoundAlert {
    fn timeout(&mut self) {
        if !self.muted {
            if let Err(e) = self.ring() {
                tracing::debug!("timeout sound skipped: {e}");
            }
        }

        if self.notify {
            std::thread::spawn(|| {
                let shown = Notification::new()
                    .summary("Time's up")
                    .body("The countdown reached zero.")
                    .appname("tick-pin")
                    .icon("alarm-clock")
                    .show();
                if let Err(e) = shown {
                    tracing::debug!("desktop notification failed: {e}");
                }
            });
        }
    }
}

/// Plays `path` on a background thread with the first player that runs.
pub fn play(path: &Path) -> Result<(), AlertError> {
    if !path.is_file() {
        return Err(AlertError::Missing(path.to_path_buf()));
    }

    let path = path.to_path_buf();
    std::thread::spawn(move || {
        for player in PLAYERS {
            let mut cmd = Command::new(player);
            if *player == "ffplay" {
                cmd.args(["-nodisp", "-autoexit", "-loglevel", "quiet"]);
            }
            let status = cmd
                .arg(&path)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
            match status {
                Ok(s) if s.success() => return,
                Ok(s) => tracing::debug!("{player} exited with {s}"),
                Err(e) => tracing::debug!("{player} unavailable: {e}"),
            }
        }
        tracing::debug!("no player could play {}", path.display());
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sound_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.wav");
        assert!(matches!(play(&missing), Err(AlertError::Missing(p)) if p == missing));
        assert!(matches!(play(dir.path()), Err(AlertError::Missing(_))));
    }

    #[test]
    fn test_settings_update_sound_path() {
        let mut alert = SoundAlert::new(&Settings::default(), true);
        assert_eq!(alert.sound(), None);

        let settings = Settings {
            timeout_sound: Some(PathBuf::from("/tmp/ding.wav")),
            notify: false,
            ..Default::default()
        };
        alert.update(&settings);
        assert_eq!(alert.sound(), Some(Path::new("/tmp/ding.wav")));

        // muted and silent: nothing to do, nothing to fail
        alert.timeout();
    }
}
