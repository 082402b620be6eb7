//! Rendering routines for the garden map.

use crate::app::{App, FormField, PlantForm};
use garden_rs_core::MarkerView;
use garden_rs_protocol::IconId;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Map, MapResolution};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};

const PRIMARY: Color = Color::Rgb(112, 178, 96);
const TEXT: Color = Color::Rgb(238, 238, 238);
const TEXT_MUTED: Color = Color::Rgb(128, 128, 128);
const BORDER: Color = Color::Rgb(60, 60, 60);
const BORDER_ACTIVE: Color = Color::Rgb(150, 210, 120);
const LAND: Color = Color::Rgb(70, 90, 80);
/// Background markers fade into.
const BACKGROUND: (u8, u8, u8) = (16, 18, 20);

const SIDEBAR_WIDTH: u16 = 34;
const FORM_WIDTH: u16 = 60;
const FORM_HEIGHT: u16 = 16;
const POPUP_WIDTH: u16 = 50;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Glyph drawn for each icon.
fn icon_glyph(icon: IconId) -> &'static str {
    match icon {
        IconId::One => "✿",
        IconId::Two => "❀",
        IconId::Three => "✾",
        IconId::Four => "❁",
        IconId::Five => "✽",
        IconId::Six => "❃",
    }
}

fn icon_rgb(icon: IconId) -> (u8, u8, u8) {
    match icon {
        IconId::One => (255, 121, 160),
        IconId::Two => (255, 210, 90),
        IconId::Three => (170, 140, 255),
        IconId::Four => (255, 150, 80),
        IconId::Five => (120, 200, 255),
        IconId::Six => (240, 240, 240),
    }
}

/// Icon color blended toward the background by opacity.
fn faded_color(icon: IconId, opacity: f64) -> Color {
    let (r, g, b) = icon_rgb(icon);
    let (br, bg, bb) = BACKGROUND;
    let mix = |fore: u8, back: u8| -> u8 {
        let value = f64::from(back) + (f64::from(fore) - f64::from(back)) * opacity;
        value.round().clamp(0.0, 255.0) as u8
    };
    Color::Rgb(mix(r, br), mix(g, bg), mix(b, bb))
}

/// Draw the entire frame.
pub fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(0),    // map + sidebar
            Constraint::Length(1), // status bar
        ])
        .split(frame.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(SIDEBAR_WIDTH)])
        .split(root[1]);

    draw_header(frame, app, root[0]);
    draw_map(frame, app, body[0]);
    draw_sidebar(frame, app, body[1]);
    draw_status_bar(frame, app, root[2]);

    if let Some(form) = app.form.as_ref() {
        draw_form(frame, app, form, body[0]);
    } else if app.popup_open
        && let Some(marker) = app.selected_marker()
    {
        draw_popup(frame, marker, body[0]);
    }
}

fn draw_header(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let label = Style::default().fg(TEXT_MUTED);
    let value = Style::default().fg(TEXT);
    let visible = app.visible_markers().count();
    let line = Line::from(vec![
        Span::styled(
            " memory garden",
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" v{VERSION}"), label),
        Span::styled("  memories ", label),
        Span::styled(format!("{visible}/{}", app.markers.len()), value),
        Span::styled("  zoom ", label),
        Span::styled(app.viewport.zoom.to_string(), value),
        Span::styled("  center ", label),
        Span::styled(app.viewport.center.to_string(), value),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_map(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(" Map ", Style::default().fg(TEXT_MUTED)));
    app.map_area = block.inner(area);

    let selected = app.selected.clone();
    let markers: Vec<&MarkerView> = app.visible_markers().collect();
    let crosshair = app.viewport.center;
    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds(app.viewport.x_bounds())
        .y_bounds(app.viewport.y_bounds())
        .paint(|ctx| {
            ctx.draw(&Map {
                color: LAND,
                resolution: MapResolution::High,
            });
            ctx.layer();
            ctx.print(
                crosshair.lng,
                crosshair.lat,
                Span::styled("+", Style::default().fg(TEXT_MUTED)),
            );
            for marker in &markers {
                let mut style = Style::default().fg(faded_color(marker.icon, marker.render_opacity()));
                if selected.as_ref() == Some(&marker.id) {
                    style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
                }
                ctx.print(
                    marker.position.lng,
                    marker.position.lat,
                    Span::styled(icon_glyph(marker.icon), style),
                );
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_sidebar(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(" Memories ", Style::default().fg(TEXT_MUTED)));

    let mut lines = Vec::new();
    for marker in &app.markers {
        let is_selected = app.selected.as_ref() == Some(&marker.id);
        let title = if marker.popup.title.is_empty() {
            "(untitled)"
        } else {
            marker.popup.title.as_str()
        };
        let text = if marker.is_visible() { TEXT } else { TEXT_MUTED };
        let title_style = if is_selected {
            Style::default().fg(text).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(text)
        };
        let freshness = if marker.is_visible() {
            format!(" {:>3.0}%", marker.render_opacity() * 100.0)
        } else {
            " gone".to_string()
        };
        lines.push(Line::from(vec![
            Span::styled(if is_selected { "> " } else { "  " }, Style::default().fg(PRIMARY)),
            Span::styled(
                format!("{} ", icon_glyph(marker.icon)),
                Style::default().fg(faded_color(marker.icon, marker.render_opacity())),
            ),
            Span::styled(title.to_string(), title_style),
            Span::styled(freshness, Style::default().fg(TEXT_MUTED)),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            " Nothing growing yet. Press Enter to plant.",
            Style::default().fg(TEXT_MUTED),
        )));
    }
    let list = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(list, area);
}

fn draw_status_bar(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let hints = if app.form.is_some() {
        "Tab next field  ←/→ icon  Enter save  Esc cancel"
    } else {
        "arrows/hjkl pan  +/- zoom  Enter plant  Tab select  w water  r reload  q quit"
    };
    let line = Line::from(vec![
        Span::styled(format!(" {} ", app.status), Style::default().fg(PRIMARY)),
        Span::styled(format!(" {hints}"), Style::default().fg(TEXT_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Rect of at most `width` x `height` centered in `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_form(frame: &mut Frame<'_>, app: &App, form: &PlantForm, area: Rect) {
    let rect = centered(area, FORM_WIDTH, FORM_HEIGHT);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_ACTIVE))
        .title(Span::styled(
            " Plant a memory ",
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(Color::Rgb(20, 20, 20)));

    let field = |name: FormField, label: &'static str, value: String| -> Line<'static> {
        let focused = form.field == name;
        let label_style = if focused {
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT_MUTED)
        };
        let cursor = if focused && name != FormField::Icon { "▏" } else { "" };
        Line::from(vec![
            Span::styled(format!(" {label:<7}"), label_style),
            Span::styled(format!("{value}{cursor}"), Style::default().fg(TEXT)),
        ])
    };

    let icon = form.draft.icon;
    let icon_line = Line::from(vec![
        Span::styled(
            format!(" {:<7}", "Icon"),
            if form.field == FormField::Icon {
                Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(TEXT_MUTED)
            },
        ),
        Span::styled(
            IconId::ALL
                .iter()
                .map(|candidate| {
                    if *candidate == icon {
                        format!("[{}]", icon_glyph(*candidate))
                    } else {
                        format!(" {} ", icon_glyph(*candidate))
                    }
                })
                .collect::<String>(),
            Style::default().fg(faded_color(icon, 1.0)),
        ),
        Span::styled(
            format!("  {}", app.form_icon_asset().unwrap_or_default()),
            Style::default().fg(TEXT_MUTED),
        ),
    ]);

    let mut lines = vec![
        field(FormField::Title, "Title", form.draft.title.clone()),
        field(FormField::Body, "Memory", form.draft.body.clone()),
        icon_line,
        field(FormField::Lat, "Lat", form.draft.lat.clone()),
        field(FormField::Lng, "Lng", form.draft.lng.clone()),
        Line::from(""),
    ];
    if let Some(status) = form.status.as_deref() {
        lines.push(Line::from(Span::styled(
            format!(" {status}"),
            Style::default().fg(BORDER_ACTIVE),
        )));
    }

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false }),
        rect,
    );
}

fn draw_popup(frame: &mut Frame<'_>, marker: &MarkerView, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(faded_color(marker.icon, 1.0)))
        .style(Style::default().bg(Color::Rgb(20, 20, 20)));

    let lines = vec![
        Line::from(Span::styled(
            format!(" {} {}", icon_glyph(marker.icon), marker.popup.title),
            Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(" {}", marker.popup.created),
            Style::default().fg(TEXT_MUTED),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" {}", marker.popup.body),
            Style::default().fg(TEXT),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                " freshness {:.0}%  ·  {}  ·  w to water",
                marker.render_opacity() * 100.0,
                marker.asset
            ),
            Style::default().fg(TEXT_MUTED),
        )),
    ];

    let inner_width = usize::from(POPUP_WIDTH.min(area.width).saturating_sub(2)).max(1);
    let body_rows = marker.popup.body.chars().count().div_ceil(inner_width).max(1);
    // five fixed rows, the wrapped body and two borders
    let height = u16::try_from(body_rows + 7).unwrap_or(u16::MAX);
    let rect = centered(area, POPUP_WIDTH, height);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false }),
        rect,
    );
}
