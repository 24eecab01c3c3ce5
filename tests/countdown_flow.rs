//! End-to-end behaviour of the widget logic: settings file in, presets
//! through the menu, a countdown running past zero, and a drag session.

use std::fs;

use chrono::{DateTime, Local, TimeDelta};
use ratatui::style::Color;
use tempfile::TempDir;

use tick_pin::codec;
use tick_pin::config::ConfigWatcher;
use tick_pin::controller::{AlertSink, FrameController, TopmostPinner, WindowSurface};
use tick_pin::geometry::{CursorShape, Point, WindowGeometry};
use tick_pin::menu::{MenuAction, MenuEntry};

#[derive(Default)]
struct Window {
    rect: WindowGeometry,
    captured: bool,
    cursors: Vec<CursorShape>,
}

impl WindowSurface for Window {
    fn geometry(&self) -> WindowGeometry {
        self.rect
    }
    fn set_geometry(&mut self, geometry: WindowGeometry) {
        self.rect = geometry;
    }
    fn capture_pointer(&mut self) {
        self.captured = true;
    }
    fn release_pointer(&mut self) {
        self.captured = false;
    }
    fn set_cursor(&mut self, shape: CursorShape) {
        self.cursors.push(shape);
    }
}

#[derive(Default)]
struct Tally(u32);

impl TopmostPinner for Tally {
    fn reassert(&mut self) {
        self.0 += 1;
    }
}

impl AlertSink for Tally {
    fn timeout(&mut self) {
        self.0 += 1;
    }
}

const SETTINGS: &str = r##"{
    "CustomForegroundColor": "#EEEEEE",
    "CustomBackgroundColor": "#111111",
    "CustomTimeoutForegroundColor": "#000000",
    "CustomTimeoutBackgroundColor": "#FFFF00",
    "MinWindowSize": 6,
    "ResizeBorder": 2,
    "Presets": [
        { "Text": "Sprint", "Duration": "0:02", "ForegroundColor": "#FFFFFF",
          "BackgroundColor": "#AA0000", "TimeoutForegroundColor": "#AA0000",
          "TimeoutBackgroundColor": "#FFFFFF" },
        "1h30m"
    ]
}"##;

fn setup(now: DateTime<Local>) -> (FrameController<Window, Tally, Tally>, ConfigWatcher, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("appsettings.json");
    fs::write(&path, SETTINGS).unwrap();

    let watcher = ConfigWatcher::open(path);
    let window = Window { rect: WindowGeometry::new(20, 10, 30, 10), ..Default::default() };
    let controller = FrameController::new(window, Tally::default(), Tally::default(), watcher.settings(), now);
    (controller, watcher, dir)
}

fn ms(n: i64) -> TimeDelta {
    TimeDelta::milliseconds(n)
}

#[test]
fn test_preset_countdown_runs_past_zero_and_alerts_once() {
    let t0 = Local::now();
    let (mut c, watcher, _dir) = setup(t0);

    let entries = c.menu(&watcher.settings().presets);
    let sprint = entries
        .iter()
        .find_map(|e| match e {
            MenuEntry::Item { label, action, .. } if label == "Sprint" => Some(action.clone()),
            _ => None,
        })
        .unwrap();
    c.activate(sprint, t0);
    assert_eq!(c.display().text, "00:02");
    assert_eq!(c.display().colors.bg, Color::Rgb(0xAA, 0, 0));

    let mut blink_states = Vec::new();
    for i in 1..=40 {
        let d = c.poll(t0 + ms(100 * i));
        if i > 20 {
            blink_states.push(d.blinking);
        }
    }
    assert_eq!(c.alert().0, 1);
    assert_eq!(c.display().text, "-00:02");
    assert!(blink_states.contains(&true) && blink_states.contains(&false));
    assert!(c.pinner().0 >= 3);

    c.activate(MenuAction::Stop, t0 + ms(4_100));
    assert_eq!(c.display().text, "00:00");
    assert_eq!(c.display().colors.bg, Color::Rgb(0x11, 0x11, 0x11));
}

#[test]
fn test_simple_preset_uses_custom_palette() {
    let t0 = Local::now();
    let (mut c, watcher, _dir) = setup(t0);

    let long = watcher.settings().presets[1].clone();
    assert_eq!(long.text, "1h30m");
    c.activate(MenuAction::Start(long), t0);
    assert_eq!(c.display().text, "1:30:00");
    assert_eq!(c.display().colors.fg, Color::Rgb(0xEE, 0xEE, 0xEE));

    // custom entry replaces it; garbage falls back to zero
    c.begin_custom_entry();
    for ch in "-5".chars() {
        c.type_char(ch);
    }
    c.commit_custom_entry(t0);
    assert_eq!(c.display().text, "-00:05");
    assert_eq!(codec::parse(&c.display().text), Ok(TimeDelta::seconds(-5)));
    c.poll(t0 + ms(100));
    assert_eq!(c.alert().0, 0, "a deadline already in the past is not a crossing");
}

#[test]
fn test_resize_uses_configured_tolerance_and_minimum() {
    let t0 = Local::now();
    let (mut c, _watcher, _dir) = setup(t0);

    // two cells in from the bottom-right corner is still on both edges
    assert!(c.pointer_down(Point::new(47, 17)));
    c.pointer_move(Point::new(52, 19));
    assert_eq!(c.surface().rect, WindowGeometry::new(20, 10, 35, 12));
    assert_eq!(c.surface().cursors.last(), Some(&CursorShape::NwSe));

    c.pointer_move(Point::new(0, 0));
    assert_eq!(c.surface().rect, WindowGeometry::new(20, 10, 6, 6));
    c.pointer_up();
    assert!(!c.surface().captured);

    // top-left corner: opposite edges stay put
    let rect = c.surface().rect;
    assert!(c.pointer_down(Point::new(rect.x, rect.y)));
    c.pointer_move(Point::new(rect.x - 4, rect.y - 3));
    assert_eq!(c.surface().rect, WindowGeometry::new(16, 7, 10, 9));
    c.pointer_up();
}
