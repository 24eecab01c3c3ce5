//! The countdown state machine and everything the widget does in response to
//! polls, pointer input and menu choices.
//!
//! The controller is single-threaded by construction: the event loop owns it
//! and calls into it serially. Platform effects go through three small
//! traits so the same logic runs against a terminal, a native window, or a
//! test double.

use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta};

use crate::codec;
use crate::config::{ColorPair, Palette, Preset, Settings};
use crate::geometry::{CursorShape, DragSession, EdgeFlags, Point, ResizeTolerance, WindowGeometry};
use crate::menu::{MenuAction, MenuEntry};

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const BLINK_PERIOD_MS: u64 = 500;
pub const TOPMOST_INTERVAL_MS: i64 = 1_000;

// ============================================================================
// Platform Seams
// ============================================================================

pub trait WindowSurface {
    fn geometry(&self) -> WindowGeometry;
    fn set_geometry(&mut self, geometry: WindowGeometry);
    fn capture_pointer(&mut self);
    fn release_pointer(&mut self);
    fn set_cursor(&mut self, shape: CursorShape);
}

pub trait TopmostPinner {
    fn reassert(&mut self);
}

pub trait AlertSink {
    /// Called once per deadline crossing.
    fn timeout(&mut self);
}

// ============================================================================
// Display State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    Alert,
    Normal,
}

/// Which half of the overtime blink `remaining` falls in.
pub fn blink_phase(remaining: TimeDelta) -> BlinkPhase {
    let ms = remaining.num_milliseconds().unsigned_abs();
    if (ms / BLINK_PERIOD_MS) % 2 == 0 {
        BlinkPhase::Alert
    } else {
        BlinkPhase::Normal
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    pub text: String,
    pub colors: ColorPair,
    pub blinking: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Text box shown in place of the label while a custom duration is typed.
/// It opens with everything selected, so the first edit replaces the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryField {
    text: String,
    selected_all: bool,
}

impl EntryField {
    fn new(text: String) -> Self {
        Self { text, selected_all: true }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_selected_all(&self) -> bool {
        self.selected_all
    }

    fn insert(&mut self, c: char) {
        if self.selected_all {
            self.text.clear();
            self.selected_all = false;
        }
        self.text.push(c);
    }

    fn backspace(&mut self) {
        if self.selected_all {
            self.text.clear();
            self.selected_all = false;
        } else {
            self.text.pop();
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

pub struct FrameController<W, P, A> {
    surface: W,
    pinner: P,
    alert: A,
    deadline: Option<DateTime<Local>>,
    alerted_for: Option<DateTime<Local>>,
    preset_palette: Option<Palette>,
    custom_palette: Palette,
    tolerance: ResizeTolerance,
    drag: Option<DragSession>,
    last_poll: DateTime<Local>,
    last_pin: DateTime<Local>,
    entry: Option<EntryField>,
    display: Display,
}

impl<W: WindowSurface, P: TopmostPinner, A: AlertSink> FrameController<W, P, A> {
    pub fn new(surface: W, pinner: P, alert: A, settings: &Settings, now: DateTime<Local>) -> Self {
        let mut controller = Self {
            surface,
            pinner,
            alert,
            deadline: None,
            alerted_for: None,
            preset_palette: None,
            custom_palette: settings.custom_palette,
            tolerance: settings.tolerance,
            drag: None,
            last_poll: now,
            last_pin: now,
            entry: None,
            display: Display {
                text: String::new(),
                colors: settings.custom_palette.normal,
                blinking: false,
            },
        };
        controller.refresh(now);
        controller
    }

    pub fn surface(&self) -> &W {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut W {
        &mut self.surface
    }

    pub fn pinner(&self) -> &P {
        &self.pinner
    }

    pub fn pinner_mut(&mut self) -> &mut P {
        &mut self.pinner
    }

    pub fn alert(&self) -> &A {
        &self.alert
    }

    pub fn alert_mut(&mut self) -> &mut A {
        &mut self.alert
    }

    pub fn deadline(&self) -> Option<DateTime<Local>> {
        self.deadline
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    pub fn entry(&self) -> Option<&EntryField> {
        self.entry.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Picks up palette and tolerance changes from reloaded settings.
    pub fn apply_settings(&mut self, settings: &Settings, now: DateTime<Local>) {
        self.custom_palette = settings.custom_palette;
        self.tolerance = settings.tolerance;
        self.refresh(now);
    }

    pub fn remaining(&self, now: DateTime<Local>) -> TimeDelta {
        self.deadline.map_or(TimeDelta::zero(), |deadline| deadline - now)
    }

    fn palette(&self) -> Palette {
        self.preset_palette.unwrap_or(self.custom_palette)
    }

    fn refresh(&mut self, now: DateTime<Local>) {
        let remaining = self.remaining(now);
        let blinking = self.deadline.is_some()
            && remaining < TimeDelta::zero()
            && blink_phase(remaining) == BlinkPhase::Alert;

        let palette = self.palette();
        self.display = Display {
            text: codec::format(remaining),
            colors: if blinking { palette.alert } else { palette.normal },
            blinking,
        };
    }

    /// One tick of the fixed-rate poll.
    pub fn poll(&mut self, now: DateTime<Local>) -> &Display {
        self.refresh(now);

        // edge, not level; a deadline landing on a poll boundary fires once
        if let Some(deadline) = self.deadline {
            if self.last_poll <= deadline && now >= deadline && self.alerted_for != Some(deadline) {
                tracing::info!("countdown reached zero");
                self.alerted_for = Some(deadline);
                self.alert.timeout();
            }
        }
        self.last_poll = now;

        if (now - self.last_pin).num_milliseconds() > TOPMOST_INTERVAL_MS {
            self.pinner.reassert();
            self.last_pin = now;
        }

        &self.display
    }

    // ------------------------------------------------------------------------
    // Timer transitions
    // ------------------------------------------------------------------------

    pub fn start(&mut self, duration: TimeDelta, palette: Option<Palette>, now: DateTime<Local>) {
        tracing::info!("starting countdown of {}", codec::format(duration));
        self.deadline = now.checked_add_signed(duration).or(Some(now));
        self.alerted_for = None;
        self.preset_palette = palette;
        self.entry = None;
        self.refresh(now);
    }

    pub fn start_preset(&mut self, preset: &Preset, now: DateTime<Local>) {
        self.start(preset.duration, preset.palette, now);
    }

    pub fn stop(&mut self, now: DateTime<Local>) {
        tracing::info!("countdown stopped");
        self.deadline = None;
        self.alerted_for = None;
        self.preset_palette = None;
        self.refresh(now);
    }

    pub fn begin_custom_entry(&mut self) {
        self.entry = Some(EntryField::new(self.display.text.clone()));
    }

    pub fn type_char(&mut self, c: char) {
        if let Some(entry) = self.entry.as_mut() {
            entry.insert(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(entry) = self.entry.as_mut() {
            entry.backspace();
        }
    }

    pub fn commit_custom_entry(&mut self, now: DateTime<Local>) {
        let Some(entry) = self.entry.take() else {
            return;
        };
        let duration = codec::parse_or_zero(&entry.text);
        self.start(duration, None, now);
    }

    pub fn cancel_custom_entry(&mut self) {
        self.entry = None;
    }

    // ------------------------------------------------------------------------
    // Menu
    // ------------------------------------------------------------------------

    pub fn menu(&self, presets: &[Preset]) -> Vec<MenuEntry> {
        let mut entries = Vec::with_capacity(presets.len() + 5);

        if self.deadline.is_some() {
            entries.push(MenuEntry::item("Stop", MenuAction::Stop));
            entries.push(MenuEntry::Separator);
        }

        entries.extend(presets.iter().map(|p| MenuEntry::Item {
            label: p.text.clone(),
            swatch: p.palette.map(|pal| pal.normal.bg),
            action: MenuAction::Start(p.clone()),
        }));

        entries.push(MenuEntry::item("Custom", MenuAction::Custom));
        entries.push(MenuEntry::Separator);
        entries.push(MenuEntry::item("Exit", MenuAction::Exit));
        entries
    }

    pub fn activate(&mut self, action: MenuAction, now: DateTime<Local>) -> Flow {
        match action {
            MenuAction::Stop => self.stop(now),
            MenuAction::Start(preset) => self.start_preset(&preset, now),
            MenuAction::Custom => self.begin_custom_entry(),
            MenuAction::Exit => return Flow::Exit,
        }
        Flow::Continue
    }

    // ------------------------------------------------------------------------
    // Pointer
    // ------------------------------------------------------------------------

    /// Starts a drag session when the button goes down on the widget.
    pub fn pointer_down(&mut self, p: Point) -> bool {
        let rect = self.surface.geometry();
        if !rect.contains(p) {
            return false;
        }
        self.drag = Some(DragSession::new(p, rect));
        self.surface.capture_pointer();
        true
    }

    pub fn pointer_move(&mut self, p: Point) {
        let edges = match self.drag {
            Some(session) => session.edges(self.tolerance),
            None => {
                let rect = self.surface.geometry();
                if rect.contains(p) {
                    EdgeFlags::hit_test(rect, p, self.tolerance)
                } else {
                    EdgeFlags::default()
                }
            }
        };
        self.surface.set_cursor(edges.cursor());

        if let Some(session) = self.drag {
            self.surface.set_geometry(session.apply(p, self.tolerance));
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
        self.surface.release_pointer();
    }
}
