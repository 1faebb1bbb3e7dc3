use crate::app::{App, Field, Focus, LoadState, PanelView};
use crate::calc::{Comparison, Outcome};
use crate::choropleth::Tier;
use crate::data::{Statistics, Summary};
use crate::format::{format_currency, CURRENCY_SYMBOL};
use crate::map::{MapFrame, PopupContent, BACKGROUND, BASEMAP};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

const PANEL_WIDTH: u16 = 46;
const POSITIVE: Color = Color::Rgb(0x10, 0xb9, 0x81);
const NEGATIVE: Color = Color::Rgb(0xef, 0x44, 0x44);

/// Render the UI
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Split into body and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(PANEL_WIDTH)])
        .split(chunks[0]);

    render_map(frame, app, body[0]);
    render_side_panel(frame, app, body[1]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &mut App, area: Rect) {
    let focused = app.focus == Focus::Map;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
        .title(Span::styled(
            " Land Value Tax Map ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    app.map_area = inner;
    app.map.resize(inner.width, inner.height);

    if let LoadState::Failed(message) = &app.load {
        let paragraph = Paragraph::new(message.as_str())
            .style(Style::default().fg(NEGATIVE))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, centered(inner, inner.width.saturating_sub(4), 4));
        return;
    }

    let map_frame = app.map.frame(inner.width as usize, inner.height as usize);
    frame.render_widget(MapWidget { frame: map_frame }, inner);

    if let Some((popup, anchor)) = app.map.popup() {
        render_popup(frame, popup, anchor, inner);
    }

    if app.loading_overlay_visible() {
        let overlay = centered(inner, 30, 3);
        frame.render_widget(Clear, overlay);
        frame.render_widget(
            Paragraph::new("Loading property data...")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL))
                .style(Style::default().fg(Color::White).bg(BACKGROUND)),
            overlay,
        );
    }
}

/// Choropleth fills, basemap lines and parcel outlines, back to front
struct MapWidget {
    frame: MapFrame,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let f = &self.frame;
        for row in 0..f.rows.min(area.height as usize) {
            for col in 0..f.cols.min(area.width as usize) {
                let cell = &mut buf[(area.x + col as u16, area.y + row as u16)];
                cell.set_char(' ').set_bg(f.fill(col, row));

                if let Some(ch) = f.outlines.glyph(col, row) {
                    cell.set_char(ch).set_fg(f.outline_color(col, row));
                } else if let Some(ch) = f.basemap.glyph(col, row) {
                    cell.set_char(ch).set_fg(BASEMAP);
                }
            }
        }
    }
}

fn render_popup(frame: &mut Frame, popup: &PopupContent, anchor: (u16, u16), map: Rect) {
    let label_width = popup.rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let value_width = popup.rows.iter().map(|(_, v)| v.chars().count()).max().unwrap_or(0);
    let width = ((label_width + value_width + 5).max(popup.title.chars().count() + 4) as u16)
        .min(map.width);
    let height = (popup.rows.len() as u16 + 2).min(map.height);

    // Prefer above-right of the click; flip when it would leave the map
    let (ax, ay) = (map.x + anchor.0, map.y + anchor.1);
    let x = if ax + 1 + width <= map.x + map.width {
        ax + 1
    } else {
        ax.saturating_sub(width).max(map.x)
    };
    let y = if ay >= map.y + height { ay - height } else { (ay + 1).min(map.y + map.height - height) };
    let rect = Rect::new(x, y, width, height);

    let lines: Vec<Line> = popup
        .rows
        .iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!("{label:<label_width$} "), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(value.clone()),
            ])
        })
        .collect();

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    format!(" {} ", popup.title),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
        ),
        rect,
    );
}

fn render_side_panel(frame: &mut Frame, app: &App, area: Rect) {
    let info_height = if app.info_open { 14 } else { 3 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),
            Constraint::Length(Tier::COUNT as u16 + 2),
            Constraint::Length(info_height),
        ])
        .split(area);

    let focused = matches!(app.focus, Focus::Field(_));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
        .title(Span::styled(
            " Property ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let mut lines = Vec::new();
    if let Some(notice) = &app.notice {
        lines.push(Line::from(Span::styled(notice.clone(), Style::default().fg(NEGATIVE))));
        lines.push(Line::default());
    }

    match &app.panel {
        PanelView::Placeholder => {
            lines.push(Line::from(Span::styled(
                "Click on a property on the map to view details.",
                Style::default().fg(Color::DarkGray),
            )));
        }
        PanelView::Form => {
            details_lines(app, &mut lines);
            form_lines(app, &mut lines);
        }
        PanelView::Results(comparison) => {
            details_lines(app, &mut lines);
            results_lines(app, comparison, &mut lines);
        }
    }

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        chunks[0],
    );
    render_legend(frame, chunks[1]);
    render_info(frame, app, chunks[2]);
}

fn details_lines(app: &App, lines: &mut Vec<Line<'static>>) {
    for (label, value) in &app.details {
        lines.push(Line::from(vec![
            Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
            Span::styled(value.clone(), Style::default().add_modifier(Modifier::BOLD)),
        ]));
    }
    lines.push(Line::default());
}

fn field_style(app: &App, field: Field) -> Style {
    if app.focus == Focus::Field(field) {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn form_lines(app: &App, lines: &mut Vec<Line<'static>>) {
    let form = &app.form;
    lines.push(Line::from(Span::styled(
        "Compare with what you pay now",
        Style::default().add_modifier(Modifier::BOLD),
    )));

    let rows = [
        (Field::CouncilTaxToggle, Field::CouncilTaxInput, "Council Tax (per year)", form.include_council_tax, form.council_tax_enabled, &form.council_tax_input),
        (Field::LbttToggle, Field::LbttInput, "LBTT", form.include_lbtt, form.lbtt_enabled, &form.lbtt_input),
    ];
    for (toggle, input, label, checked, enabled, text) in rows {
        let mark = if checked { "[x]" } else { "[ ]" };
        lines.push(Line::from(Span::styled(format!("{mark} {label}"), field_style(app, toggle))));

        let shown = if text.is_empty() && app.focus != Focus::Field(input) {
            "0.00".to_string()
        } else {
            text.clone()
        };
        let mut style = field_style(app, input);
        if !enabled {
            style = style.fg(Color::DarkGray).add_modifier(Modifier::DIM);
        }
        lines.push(Line::from(vec![
            Span::raw(format!("    {CURRENCY_SYMBOL} ")),
            Span::styled(format!("{shown:<12}"), style.add_modifier(Modifier::UNDERLINED)),
        ]));
    }

    lines.push(Line::default());
    lines.push(Line::from(vec![
        Span::styled(" Calculate ", field_style(app, Field::Calculate).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(" Reset ", field_style(app, Field::Reset)),
    ]));
}

fn outcome_style(outcome: Outcome) -> Style {
    match outcome.class() {
        Some("positive") => Style::default().fg(POSITIVE).add_modifier(Modifier::BOLD),
        Some("negative") => Style::default().fg(NEGATIVE).add_modifier(Modifier::BOLD),
        _ => Style::default().add_modifier(Modifier::BOLD),
    }
}

fn results_lines(app: &App, c: &Comparison, lines: &mut Vec<Line<'static>>) {
    lines.push(Line::from(vec![
        Span::styled("Total Current Tax: ", Style::default().fg(Color::Gray)),
        Span::raw(format_currency(Some(c.total_current))),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Total LVT: ", Style::default().fg(Color::Gray)),
        Span::raw(format_currency(Some(c.total_lvt))),
    ]));
    let outcome = c.outcome();
    lines.push(Line::from(vec![
        Span::styled(format!("{} ", outcome.label()), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(c.magnitude(), outcome_style(outcome)),
    ]));
    lines.push(Line::default());

    lines.push(Line::from(Span::styled(
        format!("{:<14}{:>14}{:>14}", "Tax", "You pay", "LVT"),
        Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    )));
    for row in &c.breakdown {
        lines.push(Line::from(format!(
            "{:<14}{:>14}{:>14}",
            row.tax.label(),
            format_currency(Some(row.actual)),
            format_currency(Some(row.lvt)),
        )));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        " Calculate Again ",
        field_style(app, Field::Reset).add_modifier(Modifier::BOLD),
    )));
}

fn render_legend(frame: &mut Frame, area: Rect) {
    let lines: Vec<Line> = Tier::all()
        .map(|tier| {
            let range = match tier.range() {
                (None, Some(hi)) => format!("< {CURRENCY_SYMBOL}{hi}"),
                (Some(lo), Some(hi)) => format!("{CURRENCY_SYMBOL}{lo} - {CURRENCY_SYMBOL}{hi}"),
                (Some(lo), None) => format!("{CURRENCY_SYMBOL}{lo}+"),
                (None, None) => String::new(),
            };
            Line::from(vec![
                Span::styled("  ", Style::default().bg(tier.color())),
                Span::raw(format!(" {range}")),
            ])
        })
        .collect();

    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Land Value per m² "),
        ),
        area,
    );
}

fn summary_line(label: &str, summary: Option<Summary>) -> Line<'static> {
    let text = match summary {
        Some(s) => format!(
            "avg {}  ({} - {})",
            format_currency(Some(s.mean)),
            format_currency(Some(s.min)),
            format_currency(Some(s.max))
        ),
        None => "no data".to_string(),
    };
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
        Span::raw(text),
    ])
}

fn statistics_lines(stats: &Statistics) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::styled("Properties: ", Style::default().fg(Color::Gray)),
            Span::raw(stats.total_properties.to_string()),
        ]),
        summary_line("Land", stats.land_value),
        summary_line("Buildings", stats.building_value),
        summary_line("LVT (CT)", stats.council_tax),
        summary_line("LVT (LBTT)", stats.lbtt),
    ]
}

fn render_info(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(if app.info_open { " Information [i] " } else { " Information [i] + " });

    if !app.info_open {
        frame.render_widget(
            Paragraph::new(Span::styled("Press i to expand", Style::default().fg(Color::DarkGray)))
                .block(block),
            area,
        );
        return;
    }

    let mut lines = vec![
        Line::from("A land value tax charges on the value of the land alone,"),
        Line::from("not the buildings on it. Compare it with what you pay now."),
        Line::from(Span::styled(
            "Figures are estimates for illustration only.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::default(),
    ];
    match &app.statistics {
        Some(stats) => lines.extend(statistics_lines(stats)),
        None => lines.push(Line::from(Span::styled(
            "Statistics appear once data is loaded.",
            Style::default().fg(Color::DarkGray),
        ))),
    }
    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.focus == Focus::Search {
        Line::from(vec![
            Span::styled(" Search label: ", Style::default().fg(Color::Yellow)),
            Span::raw(app.search.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            Span::styled("  Enter:find Esc:cancel", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        let vp = &app.map.viewport;
        let mut spans = vec![
            Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{:.0}", vp.zoom), Style::default().fg(Color::Yellow)),
            Span::styled(" | ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{:.4}°, {:.4}°", vp.center_lat, vp.center_lon),
                Style::default().fg(Color::Cyan),
            ),
        ];
        if let Some(notice) = &app.notice {
            spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
            spans.push(Span::styled(notice.clone(), Style::default().fg(NEGATIVE)));
        }
        spans.push(Span::styled(
            " | hjkl:pan +/-:zoom f:fit /:search i:info Tab:form q:quit",
            Style::default().fg(Color::DarkGray),
        ));
        Line::from(spans)
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// A `width` x `height` rect centred in `area`, clipped to it
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
