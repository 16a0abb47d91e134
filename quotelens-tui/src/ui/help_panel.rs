//! Panel 3, Help: keyboard shortcuts.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use quotelens_core::upload::UploadFlow;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Keyboard Shortcuts");
    key(&mut lines, "1-3", "Switch to panel by number");
    key(&mut lines, "Tab / Shift+Tab", "Cycle panels forward / back");
    key(&mut lines, "e", "Open error history");
    key(&mut lines, "q", "Quit");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 1: Quotes");
    key(&mut lines, "p / P", "Next / previous period");
    key(&mut lines, "i / I", "Next / previous interval");
    key(&mut lines, "r", "Reload the current selection");
    key(&mut lines, "s", "Save the close chart as PNG");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 2: Tips");
    key(&mut lines, "u / Enter", "Load a CSV file");
    key(&mut lines, "s", "Save the scatter chart as PNG");
    key(&mut lines, "c", "Clear the current upload");
    lines.push(Line::from(""));

    section(&mut lines, "Uploads");
    let required = app
        .tips
        .required
        .names()
        .iter()
        .map(|n| format!("'{n}'"))
        .collect::<Vec<_>>()
        .join(", ");
    key(&mut lines, "Required", &required);
    key(&mut lines, "", UploadFlow::PROMPT);
    lines.push(Line::from(""));

    section(&mut lines, "Data");
    key(&mut lines, "Ticker", app.loader.ticker());
    key(&mut lines, "Source", app.loader.source_name());
    lines.push(Line::from(""));

    section(&mut lines, "Exports");
    key(
        &mut lines,
        "Directory",
        &app.export_dir.display().to_string(),
    );

    f.render_widget(Paragraph::new(lines), area);
}

fn section(lines: &mut Vec<Line<'_>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key(lines: &mut Vec<Line<'_>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>20}  ", keys), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
