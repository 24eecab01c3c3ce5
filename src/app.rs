//! Terminal front end: the widget's window state, input routing and the
//! event loop.

use std::{
    io,
    time::{Duration, Instant},
};

use chrono::{DateTime, Local};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};

use crate::alert::SoundAlert;
use crate::config::ConfigWatcher;
use crate::controller::{FrameController, Flow, TopmostPinner, WindowSurface, POLL_INTERVAL};
use crate::font::Font;
use crate::geometry::{CursorShape, Point, WindowGeometry};
use crate::menu::ContextMenu;
use crate::ui;

const CONFIG_CHECK_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_WIDTH: i32 = 21;
pub const DEFAULT_HEIGHT: i32 = 7;

// ============================================================================
// Terminal Window
// ============================================================================

/// The widget's rectangle on the terminal screen, in cells.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    rect: WindowGeometry,
    captured: bool,
    cursor: CursorShape,
}

impl TerminalSurface {
    pub fn new(rect: WindowGeometry) -> Self {
        Self { rect, ..Default::default() }
    }

    /// Centered on a screen of the given size.
    pub fn centered(screen: Rect) -> Self {
        let width = DEFAULT_WIDTH.min(screen.width as i32).max(1);
        let height = DEFAULT_HEIGHT.min(screen.height as i32).max(1);
        Self::new(WindowGeometry::new(
            screen.x as i32 + (screen.width as i32 - width) / 2,
            screen.y as i32 + (screen.height as i32 - height) / 2,
            width,
            height,
        ))
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    pub fn cursor(&self) -> CursorShape {
        self.cursor
    }
}

impl WindowSurface for TerminalSurface {
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
        self.cursor = shape;
    }
}

/// Nothing can sit above the alternate screen except stray output from
/// other processes; re-pinning repaints the whole screen over it.
#[derive(Debug, Default)]
pub struct TerminalPinner {
    pending: bool,
}

impl TerminalPinner {
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

impl TopmostPinner for TerminalPinner {
    fn reassert(&mut self) {
        self.pending = true;
    }
}

// ============================================================================
// Application State
// ============================================================================

pub type Controller = FrameController<TerminalSurface, TerminalPinner, SoundAlert>;

pub struct App {
    pub controller: Controller,
    pub watcher: ConfigWatcher,
    pub font: Font,
    pub menu: Option<ContextMenu>,
    pub screen: Rect,
}

impl App {
    pub fn new(watcher: ConfigWatcher, muted: bool, screen: Rect, now: DateTime<Local>) -> Self {
        let settings = watcher.settings();
        let alert = SoundAlert::new(settings, muted);
        let font = pick_font(Font::default(), settings.font.as_deref());
        let controller = FrameController::new(
            TerminalSurface::centered(screen),
            TerminalPinner::default(),
            alert,
            settings,
            now,
        );
        Self { controller, watcher, font, menu: None, screen }
    }

    /// Applies the settings file if it changed on disk.
    pub fn reload_config(&mut self, now: DateTime<Local>) {
        if let Some(settings) = self.watcher.poll() {
            self.controller.apply_settings(settings, now);
            self.controller.alert_mut().update(settings);
            self.font = pick_font(self.font, settings.font.as_deref());
            tracing::debug!("applied settings from {}", self.watcher.path().display());
        }
    }

    /// Keeps at least one cell of the widget on screen so the mouse can
    /// still reach it.
    fn keep_on_screen(&mut self) {
        let mut rect = self.controller.surface().geometry();
        let left = self.screen.x as i32;
        let top = self.screen.y as i32;
        let right = left + self.screen.width as i32 - 1;
        let bottom = top + self.screen.height as i32 - 1;
        rect.x = rect.x.min(right).max(left - rect.width + 1);
        rect.y = rect.y.min(bottom).max(top - rect.height + 1);
        self.controller.surface_mut().set_geometry(rect);
    }

    /// Rebuilds the menu from freshly loaded presets and opens it at `at`,
    /// shifted so it stays on screen.
    pub fn open_menu(&mut self, at: Point, now: DateTime<Local>) {
        self.reload_config(now);
        let entries = self.controller.menu(&self.watcher.settings().presets);
        let mut menu = ContextMenu::new(at, entries);

        let width = menu.content_width() as i32 + 2;
        let height = menu.entries.len() as i32 + 2;
        let max_x = self.screen.x as i32 + self.screen.width as i32 - width;
        let max_y = self.screen.y as i32 + self.screen.height as i32 - height;
        menu.origin = Point::new(
            at.x.min(max_x).max(self.screen.x as i32),
            at.y.min(max_y).max(self.screen.y as i32),
        );
        self.menu = Some(menu);
    }

    pub fn handle_event(&mut self, ev: Event, now: DateTime<Local>) -> Flow {
        match ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key, now),
            Event::Mouse(mouse) => self.handle_mouse(mouse, now),
            Event::Resize(width, height) => {
                self.screen = Rect::new(0, 0, width, height);
                self.keep_on_screen();
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: DateTime<Local>) -> Flow {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Flow::Exit;
        }

        if let Some(menu) = self.menu.as_mut() {
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => menu.select_prev(),
                KeyCode::Down | KeyCode::Char('j') => menu.select_next(),
                KeyCode::Esc => self.menu = None,
                KeyCode::Enter => {
                    let action = menu.selected_action().cloned();
                    self.menu = None;
                    if let Some(action) = action {
                        return self.controller.activate(action, now);
                    }
                }
                _ => {}
            }
            return Flow::Continue;
        }

        if self.controller.entry().is_some() {
            match key.code {
                KeyCode::Enter => self.controller.commit_custom_entry(now),
                KeyCode::Esc => self.controller.cancel_custom_entry(),
                KeyCode::Backspace => self.controller.backspace(),
                KeyCode::Char(c) => self.controller.type_char(c),
                _ => {}
            }
            return Flow::Continue;
        }

        if matches!(key.code, KeyCode::Char('m') | KeyCode::Menu) {
            let rect = self.controller.surface().geometry();
            self.open_menu(Point::new(rect.x, rect.y + rect.height), now);
        }
        Flow::Continue
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: DateTime<Local>) -> Flow {
        let p = Point::new(mouse.column as i32, mouse.row as i32);

        // releasing the button ends any drag, menu or not
        if mouse.kind == MouseEventKind::Up(MouseButton::Left) {
            self.controller.pointer_up();
            return Flow::Continue;
        }

        if let Some(menu) = self.menu.as_mut() {
            match mouse.kind {
                MouseEventKind::Moved | MouseEventKind::Drag(_) => menu.hover(p),
                MouseEventKind::Down(MouseButton::Left) => {
                    let action = menu
                        .entry_at(p)
                        .and_then(|idx| menu.entries[idx].action().cloned());
                    let on_separator = menu.entry_at(p).is_some() && action.is_none();
                    if !on_separator {
                        self.menu = None;
                    }
                    if let Some(action) = action {
                        return self.controller.activate(action, now);
                    }
                }
                MouseEventKind::Down(MouseButton::Right) => {
                    self.menu = None;
                    if self.controller.surface().geometry().contains(p) {
                        self.open_menu(p, now);
                    }
                }
                _ => {}
            }
            return Flow::Continue;
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.controller.pointer_down(p);
            }
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                self.controller.pointer_move(p);
            }
            MouseEventKind::Down(MouseButton::Right) => {
                if self.controller.surface().geometry().contains(p) {
                    self.open_menu(p, now);
                }
            }
            _ => {}
        }
        Flow::Continue
    }
}

/// A missing font name keeps the current font; an unknown one is logged and
/// also keeps it.
fn pick_font(current: Font, name: Option<&str>) -> Font {
    match name.map(str::parse::<Font>) {
        Some(Ok(font)) => font,
        Some(Err(e)) => {
            tracing::warn!("{e}, keeping {current:?}");
            current
        }
        None => current,
    }
}

// ============================================================================
// Event Loop
// ============================================================================

pub fn run<W: io::Write>(terminal: &mut Terminal<CrosstermBackend<W>>, app: &mut App) -> anyhow::Result<()> {
    let mut last_tick = Instant::now();
    let mut last_config_check = Instant::now();

    loop {
        if app.controller.pinner_mut().take() {
            terminal.clear()?;
        }
        terminal.draw(|f| {
            app.screen = f.size();
            ui::render(f, app);
        })?;

        let timeout = POLL_INTERVAL.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if app.handle_event(event::read()?, Local::now()) == Flow::Exit {
                return Ok(());
            }
        }

        if last_tick.elapsed() >= POLL_INTERVAL {
            app.controller.poll(Local::now());
            last_tick = Instant::now();
        }

        if last_config_check.elapsed() >= CONFIG_CHECK_INTERVAL {
            app.reload_config(Local::now());
            last_config_check = Instant::now();
        }
    }
}
