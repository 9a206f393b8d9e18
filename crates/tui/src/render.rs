use courtside_core::executor::QueryBackend;
use courtside_core::filters::Bound;
use courtside_core::session::{NoticeLevel, RangeControl, ViewState};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState,
};
use ratatui::Frame;

use crate::app::{FilterSlot, Pane, TuiApp};
use crate::log_buffer::LogBuffer;

const SIDEBAR_WIDTH: u16 = 42;
const LOG_PANEL_HEIGHT: u16 = 10;
pub(crate) const NO_DATA_MESSAGE: &str = "No data available or error occurred.";

pub(crate) fn render<B: QueryBackend>(
    frame: &mut Frame<'_>,
    app: &TuiApp<'_, B>,
    logs: &LogBuffer,
) {
    let mut constraints = vec![
        Constraint::Length(3),
        Constraint::Min(8),
        Constraint::Length(3),
    ];
    if app.show_logs {
        constraints.push(Constraint::Length(LOG_PANEL_HEIGHT));
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(chunks[1]);
    render_queries(frame, app, body[0]);

    let filter_height = u16::try_from(app.view.controls.len() + 3).unwrap_or(u16::MAX);
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(filter_height), Constraint::Min(3)])
        .split(body[1]);
    render_filters(frame, app, main[0]);
    render_results(frame, app, main[1]);

    render_footer(frame, app, chunks[2]);

    if app.show_logs {
        render_logs(frame, logs, chunks[3]);
    }
    if app.show_help {
        render_help_popup(frame);
    }
}

fn render_header<B: QueryBackend>(frame: &mut Frame<'_>, app: &TuiApp<'_, B>, area: Rect) {
    let latency = app.view.latency.map_or_else(
        || "-".to_string(),
        |latency| format!("{} ms", latency.as_millis()),
    );
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" Pane: {} ", app.pane.label()),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::raw(format!("Server: {}", app.target())),
        Span::raw(" | "),
        Span::raw(format!("Connect: {latency}")),
    ]))
    .block(Block::default().borders(Borders::ALL).title(app.view.title));
    frame.render_widget(header, area);
}

fn render_queries<B: QueryBackend>(frame: &mut Frame<'_>, app: &TuiApp<'_, B>, area: Rect) {
    let items = app
        .view
        .query_names
        .iter()
        .map(|name| ListItem::new(name.as_str()))
        .collect::<Vec<_>>();
    let list = List::new(items)
        .block(pane_block("Select a query", app.pane == Pane::Queries))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(
        (!app.view.query_names.is_empty()).then_some(app.query_cursor),
    );
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_filters<B: QueryBackend>(frame: &mut Frame<'_>, app: &TuiApp<'_, B>, area: Rect) {
    let focused = app.focused_slot();
    let focus_style = Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut lines = app
        .view
        .controls
        .iter()
        .enumerate()
        .map(|(index, control)| {
            let bound_style = |bound| {
                if focused == Some(FilterSlot::Range { control: index, bound }) {
                    focus_style
                } else {
                    Style::default()
                }
            };
            Line::from(vec![
                Span::raw(format!("{:<24}", control.column)),
                Span::styled(
                    format!("[{}]", format_bound(control.range.lo, control)),
                    bound_style(Bound::Lower),
                ),
                Span::raw(" .. "),
                Span::styled(
                    format!("[{}]", format_bound(control.range.hi, control)),
                    bound_style(Bound::Upper),
                ),
                Span::styled(
                    format!(
                        "   of {} .. {}",
                        format_bound(control.range.min, control),
                        format_bound(control.range.max, control)
                    ),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect::<Vec<_>>();

    let search_label = if focused == Some(FilterSlot::Search) {
        Span::styled("Search:", focus_style)
    } else {
        Span::raw("Search:")
    };
    let cursor = if app.search_editing { "_" } else { "" };
    lines.push(Line::from(vec![
        search_label,
        Span::raw(format!(" {}{cursor}", app.view.search)),
    ]));

    let filters = Paragraph::new(lines).block(pane_block("Filters", app.pane == Pane::Filters));
    frame.render_widget(filters, area);
}

fn render_results<B: QueryBackend>(frame: &mut Frame<'_>, app: &TuiApp<'_, B>, area: Rect) {
    let title = app
        .view
        .heading()
        .unwrap_or_else(|| "Results".to_string());
    let block = pane_block(&title, app.pane == Pane::Results);

    let table = match (app.view.state(), app.view.table.as_ref()) {
        (ViewState::Data, Some(table)) => table,
        (ViewState::Halted, _) => {
            let message = Paragraph::new(vec![
                Line::from("Not connected to MySQL."),
                Line::from("Press r to retry."),
            ])
            .style(Style::default().fg(Color::Red))
            .block(block);
            frame.render_widget(message, area);
            return;
        }
        _ => {
            let message = Paragraph::new(NO_DATA_MESSAGE)
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(message, area);
            return;
        }
    };

    let header = Row::new(
        table
            .columns()
            .iter()
            .map(|column| Cell::from(column.name.as_str())),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = table
        .rows()
        .iter()
        .map(|row| Row::new(row.iter().map(|value| Cell::from(value.to_string()))));
    let widths = vec![Constraint::Fill(1); table.columns().len()];

    let widget = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(2)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = TableState::default()
        .with_selected((app.pane == Pane::Results).then_some(app.results_offset));
    frame.render_stateful_widget(widget, area, &mut state);
}

fn render_footer<B: QueryBackend>(frame: &mut Frame<'_>, app: &TuiApp<'_, B>, area: Rect) {
    let status_style = match app.view.notices.first().map(|notice| notice.level) {
        Some(NoticeLevel::Error) => Style::default().fg(Color::Red),
        Some(NoticeLevel::Warning) => Style::default().fg(Color::Yellow),
        None => Style::default(),
    };
    let hints = if app.search_editing {
        "type to filter | Backspace: delete | Ctrl+U: clear | Esc: done"
    } else {
        "q: quit | Tab: pane | arrows: move/adjust | /: search | x: reset | r: rerun | ?: help"
    };
    let footer = Paragraph::new(Line::from(vec![
        Span::styled(app.status_line(), status_style),
        Span::raw("  "),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(footer, area);
}

fn render_logs(frame: &mut Frame<'_>, logs: &LogBuffer, area: Rect) {
    let visible = usize::from(area.height.saturating_sub(2));
    let lines = logs
        .recent(visible)
        .into_iter()
        .map(Line::from)
        .collect::<Vec<_>>();
    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Log"));
    frame.render_widget(panel, area);
}

fn render_help_popup(frame: &mut Frame<'_>) {
    let area = centered_rect(70, 60, frame.area());
    frame.render_widget(Clear, area);
    let help = Paragraph::new(vec![
        Line::from("Global keymap"),
        Line::from("q: quit"),
        Line::from("?: toggle help"),
        Line::from("Tab: cycle panes (queries, filters, results)"),
        Line::from("Arrows or hjkl: move within the focused pane"),
        Line::from("Left/Right on a bound: narrow or widen the range"),
        Line::from("/: edit the search text, Esc or Enter to finish"),
        Line::from("Ctrl+U: clear search"),
        Line::from("x: reset every filter"),
        Line::from("r: rerun the selected query"),
        Line::from("Ctrl+L: toggle log panel"),
    ])
    .alignment(Alignment::Left)
    .block(Block::default().borders(Borders::ALL).title("Help"));
    frame.render_widget(help, area);
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title)
}

fn format_bound(value: f64, control: &RangeControl) -> String {
    if control.integral {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn centered_rect(width_percent: u16, height_percent: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100_u16 - height_percent) / 2),
            Constraint::Percentage(height_percent),
            Constraint::Percentage((100_u16 - height_percent) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100_u16 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100_u16 - width_percent) / 2),
        ])
        .split(vertical[1])[1]
}
