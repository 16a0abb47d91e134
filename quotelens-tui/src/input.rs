//! Keyboard input dispatch: overlays first, then global keys, then the
//! active panel.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{AppState, Overlay, Panel};

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    match app.overlay {
        Overlay::Welcome => {
            app.overlay = Overlay::None;
            return;
        }
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::PathInput => {
            handle_path_overlay(app, key);
            return;
        }
        Overlay::None => {}
    }

    // 2. Global keys.
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('1') => {
            app.active_panel = Panel::Quotes;
            return;
        }
        KeyCode::Char('2') => {
            app.active_panel = Panel::Tips;
            return;
        }
        KeyCode::Char('3') => {
            app.active_panel = Panel::Help;
            return;
        }
        KeyCode::Char('e') => {
            app.error_scroll = 0;
            app.overlay = Overlay::ErrorHistory;
            return;
        }
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.active_panel = app.active_panel.prev();
            } else {
                app.active_panel = app.active_panel.next();
            }
            return;
        }
        KeyCode::BackTab => {
            app.active_panel = app.active_panel.prev();
            return;
        }
        _ => {}
    }

    // 3. Panel-specific keys.
    match app.active_panel {
        Panel::Quotes => handle_quotes_key(app, key),
        Panel::Tips => handle_tips_key(app, key),
        Panel::Help => {}
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_path_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.overlay = Overlay::None;
            app.path_input.clear();
        }
        KeyCode::Enter => {
            let raw = app.path_input.trim().to_string();
            app.path_input.clear();
            app.overlay = Overlay::None;
            if raw.is_empty() {
                app.set_warning("No path entered");
                return;
            }
            app.active_panel = Panel::Tips;
            app.upload(&PathBuf::from(raw));
        }
        KeyCode::Backspace => {
            app.path_input.pop();
        }
        KeyCode::Char(c) => {
            app.path_input.push(c);
        }
        _ => {}
    }
}

fn handle_quotes_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('p') | KeyCode::Right => app.cycle_period(true),
        KeyCode::Char('P') | KeyCode::Left => app.cycle_period(false),
        KeyCode::Char('i') | KeyCode::Down => app.cycle_interval(true),
        KeyCode::Char('I') | KeyCode::Up => app.cycle_interval(false),
        KeyCode::Char('r') => app.request_reload(),
        KeyCode::Char('s') => app.export_quotes_chart(),
        KeyCode::Char('u') => app.open_path_input(),
        _ => {}
    }
}

fn handle_tips_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('u') | KeyCode::Enter => app.open_path_input(),
        KeyCode::Char('s') => app.export_tips_chart(),
        KeyCode::Char('c') => {
            app.tips.flow.reset();
            app.tips.preview = None;
            app.set_status("Upload cleared");
        }
        _ => {}
    }
}
