//! Drawing the widget and its context menu.

use ratatui::{prelude::*, widgets::*};

use crate::app::App;
use crate::controller::WindowSurface;
use crate::geometry::WindowGeometry;
use crate::menu::{ContextMenu, MenuEntry};

const HINT: &str = "right-click the widget for the menu  •  drag to move, edges to resize  •  Ctrl+C quits";

pub fn render(f: &mut Frame, app: &App) {
    let screen = f.size();

    if screen.height > 1 {
        let hint_area = Rect::new(screen.x, screen.bottom() - 1, screen.width, 1);
        f.render_widget(
            Paragraph::new(HINT)
                .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
                .alignment(Alignment::Center),
            hint_area,
        );
    }

    render_widget(f, app, screen);

    if let Some(menu) = &app.menu {
        render_menu(f, menu, screen);
    }
}

/// The part of `geom` that is on `screen`, if any.
pub fn visible_rect(geom: WindowGeometry, screen: Rect) -> Option<Rect> {
    let x0 = geom.x.max(screen.x as i32);
    let y0 = geom.y.max(screen.y as i32);
    let x1 = (geom.x + geom.width).min(screen.right() as i32);
    let y1 = (geom.y + geom.height).min(screen.bottom() as i32);
    (x1 > x0 && y1 > y0).then(|| Rect::new(x0 as u16, y0 as u16, (x1 - x0) as u16, (y1 - y0) as u16))
}

fn render_widget(f: &mut Frame, app: &App, screen: Rect) {
    let surface = app.controller.surface();
    let Some(area) = visible_rect(surface.geometry(), screen) else {
        return;
    };

    let display = app.controller.display();
    let base = Style::default().fg(display.colors.fg).bg(display.colors.bg);
    f.render_widget(Clear, area);
    f.render_widget(Block::default().style(base), area);

    if let Some(entry) = app.controller.entry() {
        let style = if entry.is_selected_all() {
            base.add_modifier(Modifier::REVERSED)
        } else {
            base.add_modifier(Modifier::UNDERLINED)
        };
        let row = area.y + area.height / 2;
        let line_area = Rect::new(area.x, row, area.width, 1);
        f.render_widget(Paragraph::new(Span::styled(entry.text(), style)), line_area);

        let caret = (entry.text().chars().count() as u16).min(area.width.saturating_sub(1));
        f.set_cursor(area.x + caret, row);
    } else {
        let lines: Vec<Line> = match app.font.layout(&display.text, area.width as usize, area.height as usize) {
            Some(big) => big.into_iter().map(Line::from).collect(),
            None => vec![Line::from(display.text.as_str())],
        };
        let pad = (area.height as usize).saturating_sub(lines.len()) / 2;
        let padded: Vec<Line> = std::iter::repeat(Line::from("")).take(pad).chain(lines).collect();
        f.render_widget(
            Paragraph::new(padded)
                .style(base.add_modifier(Modifier::BOLD))
                .alignment(Alignment::Center),
            area,
        );
    }

    if let Some(glyph) = surface.cursor().glyph() {
        let corner = Rect::new(area.right() - 1, area.y, 1, 1);
        f.render_widget(Paragraph::new(glyph).style(base.add_modifier(Modifier::BOLD)), corner);
    }
}

fn render_menu(f: &mut Frame, menu: &ContextMenu, screen: Rect) {
    let inner_width = menu.content_width();
    let geom = WindowGeometry::new(
        menu.origin.x,
        menu.origin.y,
        inner_width as i32 + 2,
        menu.entries.len() as i32 + 2,
    );
    let Some(area) = visible_rect(geom, screen) else {
        return;
    };

    let lines: Vec<Line> = menu
        .entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| match entry {
            MenuEntry::Separator => Line::from(Span::styled(
                "─".repeat(inner_width),
                Style::default().fg(Color::DarkGray),
            )),
            MenuEntry::Item { label, swatch, .. } => {
                let selected = idx == menu.selected;
                let style = if selected {
                    Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
                } else {
                    Style::default()
                };
                let swatch = match swatch {
                    Some(color) => Span::styled("■ ", Style::default().fg(*color)),
                    None => Span::raw("  "),
                };
                let text = format!("{label:<width$} ", width = inner_width - 3);
                Line::from(vec![swatch, Span::styled(text, style)])
            }
        })
        .collect();

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Gray)),
        ),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigWatcher;
    use chrono::Local;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_visible_rect_clips_to_screen() {
        let screen = Rect::new(0, 0, 80, 24);
        assert_eq!(
            visible_rect(WindowGeometry::new(10, 5, 20, 4), screen),
            Some(Rect::new(10, 5, 20, 4))
        );
        assert_eq!(
            visible_rect(WindowGeometry::new(-5, 22, 20, 4), screen),
            Some(Rect::new(0, 22, 15, 2))
        );
        assert_eq!(visible_rect(WindowGeometry::new(-30, 5, 20, 4), screen), None);
        assert_eq!(visible_rect(WindowGeometry::new(80, 5, 20, 4), screen), None);
    }

    #[test]
    fn test_renders_time_and_menu() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = ConfigWatcher::open(dir.path().join("appsettings.json"));
        let now = Local::now();
        let mut app = App::new(watcher, true, Rect::new(0, 0, 60, 20), now);

        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        let text: String = terminal.backend().buffer().content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("00:00"));

        app.open_menu(crate::geometry::Point::new(25, 8), now);
        terminal.draw(|f| render(f, &app)).unwrap();
        let text: String = terminal.backend().buffer().content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Custom"));
        assert!(text.contains("Exit"));
    }
}
