use std::time::Instant;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use flowdeck_core::{DnaField, View};

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.on_tick(Instant::now()).await,
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_reset_confirm {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_reset(),
            KeyCode::Char('n') | KeyCode::Esc => app.show_reset_confirm = false,
            _ => {}
        }
        return;
    }

    if app.show_visual {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('v') | KeyCode::Char('q')) {
            app.show_visual = false;
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Draft => handle_draft_editing(app, key),
        InputMode::Chat => handle_chat_editing(app, key),
        InputMode::Brief(field) => handle_brief_editing(app, key, field),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match app.workspace.view() {
        View::Idle => handle_idle(app, key),
        View::DnaExtraction => handle_interview(app, key),
        View::Dashboard => handle_dashboard(app, key),
        View::Working => handle_working(app, key),
        View::Summary => handle_summary(app, key),
    }
}

fn handle_idle(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Enter | KeyCode::Char('s') => app.start_interview(),
        _ => {}
    }
}

/// The interview screen is always typing into the answer box
fn handle_interview(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_answer(),
        KeyCode::Backspace => {
            app.answer_input.pop();
        }
        KeyCode::Char(c) => app.answer_input.push(c),
        _ => {}
    }
}

fn handle_dashboard(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down => app.task_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.task_nav_up(),
        KeyCode::Enter | KeyCode::Char('l') => app.open_selected_task(Instant::now()),
        KeyCode::Char('p') => {
            if !app.workspace.plan_replaceable() {
                app.set_status("Work has started on this plan; reset to plan again");
            } else {
                app.request_plan();
            }
        }
        KeyCode::Char('e') => app.start_brief_edit(DnaField::Audience),
        KeyCode::Char('s') => app.show_summary(),
        KeyCode::Char('R') => app.show_reset_confirm = true,
        _ => {}
    }
}

fn handle_working(app: &mut App, key: KeyEvent) {
    let read_only = app.workspace.is_read_only();
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h') => app.exit_task(),
        KeyCode::Char('i') | KeyCode::Enter if !read_only => app.input_mode = InputMode::Draft,
        KeyCode::Char('c') => app.input_mode = InputMode::Chat,
        KeyCode::Char('v') => app.request_visual(),
        KeyCode::Char('D') if !read_only => app.complete_task(),
        KeyCode::Char('j') | KeyCode::Down => {
            app.editor_scroll = app.editor_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.editor_scroll = app.editor_scroll.saturating_sub(1);
        }
        KeyCode::PageDown => {
            app.chat_scroll = app.chat_scroll.saturating_add(5);
        }
        KeyCode::PageUp => {
            app.chat_scroll = app.chat_scroll.saturating_sub(5);
        }
        KeyCode::Char('R') => app.show_reset_confirm = true,
        _ => {}
    }
}

fn handle_summary(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc | KeyCode::Char('b') => app.back_to_dashboard(),
        KeyCode::Char('j') | KeyCode::Down => {
            app.summary_scroll = app.summary_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.summary_scroll = app.summary_scroll.saturating_sub(1);
        }
        KeyCode::Char('R') => app.show_reset_confirm = true,
        _ => {}
    }
}

fn handle_draft_editing(app: &mut App, key: KeyEvent) {
    let now = Instant::now();
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.edit_draft(now, |buf| buf.push('\n')),
        KeyCode::Tab => app.edit_draft(now, |buf| buf.push_str("    ")),
        KeyCode::Backspace => app.edit_draft(now, |buf| {
            buf.pop();
        }),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.edit_draft(now, String::clear);
        }
        KeyCode::Char(c) => app.edit_draft(now, |buf| buf.push(c)),
        _ => {}
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.send_chat(),
        KeyCode::Backspace => {
            if app.chat_cursor > 0 {
                app.chat_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.chat_input.chars().count();
            if app.chat_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.chat_cursor = app.chat_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.chat_input.chars().count();
            app.chat_cursor = (app.chat_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.chat_cursor = 0;
        }
        KeyCode::End => {
            app.chat_cursor = app.chat_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
            app.chat_input.insert(byte_pos, c);
            app.chat_cursor += 1;
        }
        _ => {}
    }
}

fn handle_brief_editing(app: &mut App, key: KeyEvent, field: DnaField) {
    match key.code {
        KeyCode::Esc => {
            app.brief_input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            if app.commit_brief(field) {
                app.input_mode = InputMode::Normal;
            }
        }
        // Save and move on to the next field
        KeyCode::Tab => {
            if app.commit_brief(field) {
                app.start_brief_edit(field.next());
            }
        }
        KeyCode::Backspace => {
            app.brief_input.pop();
        }
        KeyCode::Char(c) => app.brief_input.push(c),
        _ => {}
    }
}
