//! Panel 2, Tips: upload state, head preview and the scatter chart.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap};
use ratatui::Frame;

use quotelens_core::chart::ScatterSpec;
use quotelens_core::upload::{UploadFlow, UploadState};
use quotelens_core::view::PREVIEW_ROWS;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(PREVIEW_ROWS as u16 + 2),
            Constraint::Min(6),
        ])
        .split(area);

    render_header(f, chunks[0], app);

    if let Some(preview) = &app.tips.preview {
        super::preview::render(f, chunks[1], "First rows", preview);
    }

    match app.tips.flow.state() {
        UploadState::Rendered { scatter, .. } => render_scatter(f, chunks[2], scatter),
        UploadState::Rejected { missing, .. } => {
            let para = Paragraph::new(Span::styled(
                format!("Missing: {}", missing.join(", ")),
                theme::muted(),
            ));
            f.render_widget(para, chunks[2]);
        }
        _ => {}
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let flow = &app.tips.flow;
    let mut lines = Vec::new();

    let file = flow
        .table()
        .and_then(|t| t.file_name())
        .map(str::to_string)
        .or_else(|| app.tips.last_path.as_ref().map(|p| p.display().to_string()))
        .unwrap_or_else(|| "-".to_string());
    lines.push(Line::from(vec![
        Span::styled("File: ", theme::muted()),
        Span::styled(file, theme::accent()),
        Span::styled("  State: ", theme::muted()),
        Span::styled(flow.phase().name(), theme::neutral()),
        Span::styled("  [u]pload [s]ave [c]lear", theme::muted()),
    ]));

    match flow.state() {
        UploadState::NoFile => {
            lines.push(Line::from(Span::styled(UploadFlow::PROMPT, theme::text())));
        }
        UploadState::Rejected { message, .. } => {
            lines.push(Line::from(Span::styled(message.as_str(), theme::warning())));
        }
        UploadState::Rendered { table, scatter } => {
            let mut spans = vec![Span::styled(
                format!("{} rows, {} plotted", table.height(), scatter.point_count()),
                theme::muted(),
            )];
            if let Some(path) = &app.tips.last_export {
                spans.push(Span::styled(
                    format!("  saved {}", path.display()),
                    theme::accent(),
                ));
            }
            lines.push(Line::from(spans));
        }
        UploadState::FileReceived(_) | UploadState::Validated { .. } => {}
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

fn render_scatter(f: &mut Frame, area: Rect, spec: &ScatterSpec) {
    let block = Block::default()
        .borders(Borders::NONE)
        .title(Span::styled(spec.title.clone(), theme::header()));

    let (Some((x_min, x_max)), Some((y_min, y_max))) = (spec.x_bounds(), spec.y_bounds()) else {
        let para = Paragraph::new(Span::styled("No numeric rows to plot.", theme::muted()))
            .block(block);
        f.render_widget(para, area);
        return;
    };

    let datasets: Vec<Dataset> = spec
        .groups
        .iter()
        .map(|group| {
            Dataset::default()
                .name(group.category.clone())
                .marker(symbols::Marker::Dot)
                .style(Style::default().fg(theme::series(group.color)))
                .graph_type(GraphType::Scatter)
                .data(&group.points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title(Span::styled(spec.x_label.clone(), theme::muted()))
                .style(theme::muted())
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::styled(format!("{x_min:.1}"), theme::muted()),
                    Span::styled(format!("{x_max:.1}"), theme::muted()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled(spec.y_label.clone(), theme::muted()))
                .style(theme::muted())
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::styled(format!("{y_min:.1}"), theme::muted()),
                    Span::styled(format!("{y_max:.1}"), theme::muted()),
                ]),
        );

    f.render_widget(chart, area);
}
