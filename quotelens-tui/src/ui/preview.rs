//! Compact table widget for head/tail previews.

use ratatui::layout::{Constraint, Rect};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use quotelens_core::view::TablePreview;

use crate::theme;

/// Widest a single preview column may get.
const MAX_COLUMN_WIDTH: usize = 24;

pub fn render(f: &mut Frame, area: Rect, title: &str, preview: &TablePreview) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(theme::muted())
        .title(format!(" {title} "))
        .title_style(theme::header());

    if preview.columns.is_empty() {
        let para = Paragraph::new("(no columns)").style(theme::muted()).block(block);
        f.render_widget(para, area);
        return;
    }

    let header = Row::new(
        preview
            .columns
            .iter()
            .map(|c| Cell::from(c.as_str()).style(theme::header())),
    );
    let rows = preview.rows.iter().map(|row| {
        Row::new(row.iter().map(|v| Cell::from(v.as_str()).style(theme::text())))
    });

    let table = Table::new(rows, column_widths(preview))
        .header(header)
        .column_spacing(2)
        .block(block);
    f.render_widget(table, area);
}

/// Each column as wide as its longest cell, capped.
fn column_widths(preview: &TablePreview) -> Vec<Constraint> {
    preview
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let widest = preview
                .rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|v| v.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(1);
            Constraint::Length(widest.min(MAX_COLUMN_WIDTH) as u16)
        })
        .collect()
}
