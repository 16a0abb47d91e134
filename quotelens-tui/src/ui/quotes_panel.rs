//! Panel 1, Quotes: selectors, close-price chart, table tail and columns.

use chrono::{Datelike, NaiveDate};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap};
use ratatui::Frame;

use quotelens_core::chart::LineSpec;
use quotelens_core::data::{Interval, Period};
use quotelens_core::view::{QuotesView, PREVIEW_ROWS};

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(8),
            Constraint::Length(PREVIEW_ROWS as u16 + 2),
            Constraint::Length(2),
        ])
        .split(area);

    render_selectors(f, chunks[0], app);

    match &app.quotes.view {
        Some(view) => {
            render_chart(f, chunks[1], &view.line);
            super::preview::render(
                f,
                chunks[2],
                &format!("Last {} of {} rows", view.preview.rows.len(), view.rows),
                &view.preview,
            );
            render_columns(f, chunks[3], view);
        }
        None => render_empty(f, chunks[1], app),
    }
}

fn render_selectors(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans = vec![Span::styled("Period ", theme::muted())];
    for period in Period::ALL {
        spans.push(Span::styled(
            format!(" {period} "),
            theme::chip(period == app.quotes.period),
        ));
    }
    spans.push(Span::styled("   Interval ", theme::muted()));
    for interval in Interval::ALL {
        spans.push(Span::styled(
            format!(" {interval} "),
            theme::chip(interval == app.quotes.interval),
        ));
    }
    spans.push(Span::styled("  [p/i]change [r]eload [s]ave", theme::muted()));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_empty(f: &mut Frame, area: Rect, app: &AppState) {
    let message = if app.quotes.reload_requested {
        format!("Loading {} data...", app.config.ticker)
    } else {
        "No data for this selection. Press r to retry or e to see errors.".to_string()
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(message, theme::muted())),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

/// Days since the common era, as a chart x coordinate.
fn day_x(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

fn render_chart(f: &mut Frame, area: Rect, line: &LineSpec) {
    let block = Block::default()
        .borders(Borders::NONE)
        .title(Span::styled(line.title.clone(), theme::header()));

    let (Some((first, last)), Some((y_min, y_max))) = (line.x_bounds(), line.y_bounds()) else {
        let para = Paragraph::new(Span::styled("No close prices to plot.", theme::muted()))
            .block(block);
        f.render_widget(para, area);
        return;
    };

    let data: Vec<(f64, f64)> = line.points.iter().map(|(d, v)| (day_x(*d), *v)).collect();
    let x_min = day_x(first);
    let x_max = day_x(last).max(x_min + 1.0);

    let dataset = Dataset::default()
        .name(line.series_label.clone())
        .marker(symbols::Marker::Braille)
        .style(ratatui::style::Style::default().fg(theme::series(line.color)))
        .graph_type(GraphType::Line)
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .title(Span::styled(line.x_label.clone(), theme::muted()))
                .style(theme::muted())
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::styled(first.to_string(), theme::muted()),
                    Span::styled(last.to_string(), theme::muted()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled(line.y_label.clone(), theme::muted()))
                .style(theme::muted())
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::styled(format!("{y_min:.2}"), theme::muted()),
                    Span::styled(format!("{y_max:.2}"), theme::muted()),
                ]),
        );

    f.render_widget(chart, area);
}

fn render_columns(f: &mut Frame, area: Rect, view: &QuotesView) {
    let mut spans = vec![Span::styled("Columns: ", theme::muted())];
    spans.push(Span::styled(view.columns.join(", "), theme::accent()));
    if view.line.skipped_rows > 0 {
        spans.push(Span::styled(
            format!("  ({} empty rows not plotted)", view.line.skipped_rows),
            theme::warning(),
        ));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).wrap(Wrap { trim: true }),
        area,
    );
}
