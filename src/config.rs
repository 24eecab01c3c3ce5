//! Settings file, presets and palettes.
//!
//! The settings file is optional JSON. Anything missing or malformed falls
//! back to a documented default; nothing here is allowed to stop the widget.

use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
    time::SystemTime,
};

use chrono::TimeDelta;
use ratatui::style::Color;
use serde::Deserialize;
use thiserror::Error;

use crate::codec;
use crate::geometry::ResizeTolerance;

pub const DEFAULT_CONFIG_FILE: &str = "appsettings.json";

pub const FALLBACK_FOREGROUND: Color = Color::White;
pub const FALLBACK_BACKGROUND: Color = Color::Black;
pub const FALLBACK_TIMEOUT_FOREGROUND: Color = Color::White;
pub const FALLBACK_TIMEOUT_BACKGROUND: Color = Color::Red;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read settings: {0}")]
    Io(#[from] io::Error),
    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("`{0}` is not a color")]
    Unknown(String),
}

// ============================================================================
// Palettes & Presets
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPair {
    pub fg: Color,
    pub bg: Color,
}

/// Colors for the running countdown and for the overtime blink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub normal: ColorPair,
    pub alert: ColorPair,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            normal: ColorPair { fg: FALLBACK_FOREGROUND, bg: FALLBACK_BACKGROUND },
            alert: ColorPair { fg: FALLBACK_TIMEOUT_FOREGROUND, bg: FALLBACK_TIMEOUT_BACKGROUND },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub text: String,
    pub duration: TimeDelta,
    /// `None` for bare duration entries, which use the custom palette.
    pub palette: Option<Palette>,
}

// ============================================================================
// File Format
// ============================================================================

#[derive(Deserialize, Default, Debug)]
#[serde(rename_all = "PascalCase", default)]
struct RawSettings {
    font_family: Option<String>,
    timeout_sound: Option<String>,
    custom_foreground_color: Option<String>,
    custom_background_color: Option<String>,
    custom_timeout_foreground_color: Option<String>,
    custom_timeout_background_color: Option<String>,
    presets: Vec<RawPreset>,
    margin: Option<i32>,
    resize_border: Option<i32>,
    min_window_size: Option<i32>,
    notify: Option<bool>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RawPreset {
    Duration(String),
    Record(PresetRecord),
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct PresetRecord {
    text: Option<String>,
    duration: String,
    foreground_color: Option<String>,
    background_color: Option<String>,
    timeout_foreground_color: Option<String>,
    timeout_background_color: Option<String>,
}

// ============================================================================
// Resolved Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub font: Option<String>,
    pub timeout_sound: Option<PathBuf>,
    pub custom_palette: Palette,
    pub presets: Vec<Preset>,
    pub tolerance: ResizeTolerance,
    pub notify: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font: None,
            timeout_sound: None,
            custom_palette: Palette::default(),
            presets: Vec::new(),
            tolerance: ResizeTolerance::default(),
            notify: true,
        }
    }
}

impl Settings {
    /// A missing file is not an error: it just means defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let raw: RawSettings = serde_json::from_str(text)?;
        Ok(Self::resolve(raw, |name| std::env::var(name).ok()))
    }

    fn resolve(raw: RawSettings, env: impl Fn(&str) -> Option<String>) -> Self {
        let fallback = Palette::default();
        let custom_palette = Palette {
            normal: ColorPair {
                fg: color_or(raw.custom_foreground_color.as_deref(), fallback.normal.fg),
                bg: color_or(raw.custom_background_color.as_deref(), fallback.normal.bg),
            },
            alert: ColorPair {
                fg: color_or(raw.custom_timeout_foreground_color.as_deref(), fallback.alert.fg),
                bg: color_or(raw.custom_timeout_background_color.as_deref(), fallback.alert.bg),
            },
        };

        let presets = raw
            .presets
            .into_iter()
            .filter_map(|p| resolve_preset(p, &custom_palette))
            .collect();

        let defaults = ResizeTolerance::default();
        let tolerance = ResizeTolerance {
            margin: raw.margin.unwrap_or(defaults.margin).max(0),
            border: raw.resize_border.unwrap_or(defaults.border).max(0),
            min_size: raw.min_window_size.unwrap_or(defaults.min_size).max(1),
        };

        let timeout_sound = raw
            .timeout_sound
            .map(|s| expand_env(&s, &env))
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Self {
            font: raw.font_family.filter(|f| !f.trim().is_empty()),
            timeout_sound,
            custom_palette,
            presets,
            tolerance,
            notify: raw.notify.unwrap_or(true),
        }
    }
}

fn resolve_preset(raw: RawPreset, custom: &Palette) -> Option<Preset> {
    let record = match raw {
        RawPreset::Duration(duration) => {
            let parsed = parse_preset_duration(&duration)?;
            return Some(Preset { text: duration, duration: parsed, palette: None });
        }
        RawPreset::Record(record) => record,
    };

    let duration = parse_preset_duration(&record.duration)?;
    let palette = Palette {
        normal: ColorPair {
            fg: color_or(record.foreground_color.as_deref(), custom.normal.fg),
            bg: color_or(record.background_color.as_deref(), custom.normal.bg),
        },
        alert: ColorPair {
            fg: color_or(record.timeout_foreground_color.as_deref(), custom.alert.fg),
            bg: color_or(record.timeout_background_color.as_deref(), custom.alert.bg),
        },
    };

    Some(Preset {
        text: record.text.unwrap_or(record.duration),
        duration,
        palette: Some(palette),
    })
}

fn parse_preset_duration(text: &str) -> Option<TimeDelta> {
    codec::parse(text)
        .map_err(|e| tracing::warn!("skipping preset: {e}"))
        .ok()
}

// ============================================================================
// Colors
// ============================================================================

/// `#RRGGBB`, `#AARRGGBB` (alpha dropped), `#RGB`, or a terminal color name.
pub fn parse_color(text: &str) -> Result<Color, ColorError> {
    let text = text.trim();
    let unknown = || ColorError::Unknown(text.to_string());

    if let Some(hex) = text.strip_prefix('#') {
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(unknown());
        }
        let rgb = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            8 => hex[2..].to_string(),
            _ => return Err(unknown()),
        };
        let v = u32::from_str_radix(&rgb, 16).map_err(|_| unknown())?;
        return Ok(Color::Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8));
    }

    Color::from_str(text).map_err(|_| unknown())
}

fn color_or(text: Option<&str>, fallback: Color) -> Color {
    match text.map(parse_color) {
        Some(Ok(color)) => color,
        Some(Err(e)) => {
            tracing::warn!("{e}, using {fallback:?}");
            fallback
        }
        None => fallback,
    }
}

// ============================================================================
// Environment Placeholders
// ============================================================================

/// Expands `%VAR%`, `${VAR}` and `$VAR`. Unknown variables become empty;
/// a lone `%` or `$` is kept as is.
pub fn expand_env(text: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(idx) = rest.find(['%', '$']) {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];

        let (name, consumed) = if let Some(inner) = tail.strip_prefix('%') {
            match inner.find('%') {
                Some(end) if end > 0 && is_var_name(&inner[..end]) => (&inner[..end], end + 2),
                _ => ("", 0),
            }
        } else if let Some(inner) = tail.strip_prefix("${") {
            match inner.find('}') {
                Some(end) if end > 0 && is_var_name(&inner[..end]) => (&inner[..end], end + 3),
                _ => ("", 0),
            }
        } else {
            let inner = &tail[1..];
            let end = inner
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(inner.len());
            (&inner[..end], if end > 0 { end + 1 } else { 0 })
        };

        if consumed == 0 {
            out.push_str(&tail[..1]);
            rest = &tail[1..];
        } else {
            out.push_str(&lookup(name).unwrap_or_default());
            rest = &tail[consumed..];
        }
    }

    out.push_str(rest);
    out
}

fn is_var_name(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'(' || b == b')')
}

// ============================================================================
// Hot Reload
// ============================================================================

/// Watches the settings file by modification time. Polled from the UI loop,
/// so reloads are serialized with every other state change.
pub struct ConfigWatcher {
    path: PathBuf,
    modified: Option<SystemTime>,
    settings: Settings,
}

impl ConfigWatcher {
    pub fn open(path: PathBuf) -> Self {
        let modified = modified_time(&path);
        let settings = Settings::load(&path).unwrap_or_else(|e| {
            tracing::warn!("{}: {e}, using defaults", path.display());
            Settings::default()
        });
        tracing::info!("settings loaded from {} ({} presets)", path.display(), settings.presets.len());
        Self { path, modified, settings }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the new settings when the file changed since the last check.
    pub fn poll(&mut self) -> Option<&Settings> {
        let modified = modified_time(&self.path);
        if modified == self.modified {
            return None;
        }
        self.modified = modified;

        match Settings::load(&self.path) {
            Ok(settings) => {
                tracing::info!("settings reloaded ({} presets)", settings.presets.len());
                self.settings = settings;
                Some(&self.settings)
            }
            Err(e) => {
                tracing::warn!("{}: {e}, keeping previous settings", self.path.display());
                None
            }
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// `appsettings.json` next to the executable, or in the working directory
/// when the executable path is unknown.
pub fn default_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_CONFIG_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn env(name: &str) -> Option<String> {
        match name {
            "HOME" => Some("/home/tp".into()),
            "SystemRoot" => Some("C:\\Windows".into()),
            _ => None,
        }
    }

    #[test]
    fn test_parse_color_forms() {
        assert_eq!(parse_color("#FF8000"), Ok(Color::Rgb(255, 128, 0)));
        assert_eq!(parse_color("#80FF8000"), Ok(Color::Rgb(255, 128, 0)));
        assert_eq!(parse_color("#f80"), Ok(Color::Rgb(255, 136, 0)));
        assert_eq!(parse_color(" red "), Ok(Color::Red));
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#ééé").is_err());
        assert!(parse_color("not-a-color").is_err());
    }

    #[test]
    fn test_expand_env_placeholders() {
        assert_eq!(
            expand_env("%SystemRoot%\\Media\\Alarm01.wav", env),
            "C:\\Windows\\Media\\Alarm01.wav"
        );
        assert_eq!(expand_env("$HOME/alarm.oga", env), "/home/tp/alarm.oga");
        assert_eq!(expand_env("${HOME}/a.wav", env), "/home/tp/a.wav");
        assert_eq!(expand_env("$MISSING/a.wav", env), "/a.wav");
        assert_eq!(expand_env("100% $ sure", env), "100% $ sure");
        assert_eq!(expand_env("plain.wav", env), "plain.wav");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_rich_and_simple_presets() {
        let json = r##"{
            "FontFamily": "block",
            "CustomForegroundColor": "#FFFFFF",
            "CustomBackgroundColor": "#202020",
            "CustomTimeoutForegroundColor": "yellow",
            "CustomTimeoutBackgroundColor": "bogus",
            "Presets": [
                { "Text": "Focus", "Duration": "25m", "ForegroundColor": "#000000",
                  "BackgroundColor": "#FF0000", "TimeoutForegroundColor": "#FFFFFF",
                  "TimeoutBackgroundColor": "#0000FF" },
                "5:00",
                { "Duration": "1h", "BackgroundColor": "#00FF00" },
                "garbage"
            ]
        }"##;
        let s = Settings::from_json(json).unwrap();

        assert_eq!(s.font.as_deref(), Some("block"));
        assert_eq!(s.custom_palette.normal.bg, Color::Rgb(0x20, 0x20, 0x20));
        assert_eq!(s.custom_palette.alert.fg, Color::Yellow);
        assert_eq!(s.custom_palette.alert.bg, FALLBACK_TIMEOUT_BACKGROUND);

        assert_eq!(s.presets.len(), 3);
        assert_eq!(s.presets[0].text, "Focus");
        assert_eq!(s.presets[0].duration, TimeDelta::minutes(25));
        assert_eq!(s.presets[0].palette.unwrap().alert.bg, Color::Rgb(0, 0, 255));

        assert_eq!(s.presets[1].text, "5:00");
        assert_eq!(s.presets[1].palette, None);

        let partial = s.presets[2].palette.unwrap();
        assert_eq!(s.presets[2].text, "1h");
        assert_eq!(partial.normal.bg, Color::Rgb(0, 255, 0));
        assert_eq!(partial.normal.fg, s.custom_palette.normal.fg);
        assert_eq!(partial.alert, s.custom_palette.alert);
    }

    #[test]
    fn test_tolerance_and_sound() {
        let raw = RawSettings {
            margin: Some(-4),
            resize_border: Some(2),
            min_window_size: Some(0),
            timeout_sound: Some("$HOME/ding.wav".into()),
            ..Default::default()
        };
        let s = Settings::resolve(raw, env);
        assert_eq!(s.tolerance, ResizeTolerance { margin: 0, border: 2, min_size: 1 });
        assert_eq!(s.timeout_sound, Some(PathBuf::from("/home/tp/ding.wav")));
        assert!(s.notify);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(Settings::from_json("{ nope"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_watcher_reloads_on_change_and_keeps_previous_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, r#"{ "Presets": ["10:00"] }"#).unwrap();

        let mut watcher = ConfigWatcher::open(path.clone());
        assert_eq!(watcher.path(), path.as_path());
        assert_eq!(watcher.settings().presets.len(), 1);
        assert!(watcher.poll().is_none());

        let touch = |secs: u64| {
            let file = fs::File::options().write(true).open(&path).unwrap();
            file.set_modified(SystemTime::now() + Duration::from_secs(secs)).unwrap();
        };

        fs::write(&path, r#"{ "Presets": ["10:00", "20:00"] }"#).unwrap();
        touch(10);
        assert_eq!(watcher.poll().map(|s| s.presets.len()), Some(2));

        fs::write(&path, "{ broken").unwrap();
        touch(20);
        assert!(watcher.poll().is_none());
        assert_eq!(watcher.settings().presets.len(), 2);
    }
}
