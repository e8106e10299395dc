use flowdeck_core::interview::MAX_EXCHANGES;
use flowdeck_core::{flow, ChatRole, DnaField, MicroTask, TaskStatus, VerificationStatus, View};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode};
use crate::jobs::JobKind;

/// Wrap text to fit within a given width, returning multiple lines
/// Uses word boundaries for wrapping (doesn't break mid-word)
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_len == 0 {
            current_line = word.to_string();
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current_line.push(' ');
            current_line.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(current_line);
            current_line = word.to_string();
            current_len = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Rows a block of text takes once wrapped, blank lines included
fn wrapped_height(text: &str, width: usize) -> usize {
    text.split('\n').map(|line| wrap_text_to_width(line, width).len()).sum()
}

/// Render `**bold**` spans inline; headings and everything else stay literal
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                if !current_text.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current_text)));
                }
                spans.push(Span::styled(bold_text, Style::default().add_modifier(Modifier::BOLD)));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if text.starts_with('#') {
        let heading = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        return Line::from(spans).style(heading);
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn status_icon(status: TaskStatus) -> (&'static str, Color) {
    match status {
        TaskStatus::Pending => ("○", Color::DarkGray),
        TaskStatus::Drafting => ("◌", Color::Yellow),
        TaskStatus::Ready => ("◐", Color::Blue),
        TaskStatus::InProgress => ("●", Color::Cyan),
        TaskStatus::Completed => ("✓", Color::Green),
    }
}

fn verification_style(status: VerificationStatus) -> Style {
    match status {
        VerificationStatus::Pending => Style::default().fg(Color::DarkGray),
        VerificationStatus::Reviewing => Style::default().fg(Color::Yellow),
        VerificationStatus::NeedsRevision => Style::default().fg(Color::Red).bold(),
        VerificationStatus::Approved => Style::default().fg(Color::Green),
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    )
}

fn thinking(app: &App, label: &str) -> Span<'static> {
    let dots = ".".repeat((app.animation_frame as usize) + 1);
    Span::styled(
        format!("{}{}", label, dots),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.workspace.view() {
        View::Idle => render_idle(frame, body_area),
        View::DnaExtraction => render_interview(app, frame, body_area),
        View::Dashboard => render_dashboard(app, frame, body_area),
        View::Working => render_working(app, frame, body_area),
        View::Summary => render_summary(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    if app.show_reset_confirm {
        render_reset_confirm(frame, area);
    } else if app.show_visual {
        render_visual(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let (done, total) = app.workspace.progress();
    let progress = if total > 0 {
        format!(" {}/{} done ", done, total)
    } else {
        String::new()
    };

    let mut spans = vec![
        Span::styled(" flowdeck ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(progress, Style::default().fg(Color::White)),
        Span::styled(format!(" {} ", app.assistant.describe()), Style::default().fg(Color::Gray)),
    ];

    if app.workspace.view() == View::Working {
        let filled = (app.flow.score() / flow::MAX_SCORE * 10.0).round() as usize;
        let bar = format!(" {}{} ", "▮".repeat(filled), "▯".repeat(10 - filled.min(10)));
        let color = if app.flow.in_flow() { Color::Magenta } else { Color::Gray };
        spans.push(Span::styled(bar, Style::default().fg(color)));
        if app.flow.in_flow() {
            let badge = Style::default().fg(Color::Black).bg(Color::Magenta).bold();
            spans.push(Span::styled(" IN FLOW ", badge));
        }
    }

    if app.workspace.is_dirty() {
        spans.push(Span::styled(" •", Style::default().fg(Color::Yellow)));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    if let Some((message, _)) = &app.status {
        let status = Paragraph::new(Line::from(Span::styled(
            format!(" {} ", message),
            Style::default().fg(Color::Yellow),
        )));
        frame.render_widget(status, area);
        return;
    }

    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Draft => (" WRITE ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        InputMode::Chat => (" CHAT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        InputMode::Brief(_) => (" BRIEF ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let keys: &[(&str, &str)] = match (app.workspace.view(), app.input_mode) {
        (_, InputMode::Draft) => &[("Esc", "done"), ("Enter", "newline"), ("^U", "clear")],
        (_, InputMode::Chat) => &[("Esc", "back"), ("Enter", "send")],
        (_, InputMode::Brief(_)) => &[("Esc", "cancel"), ("Enter", "save"), ("Tab", "save+next")],
        (View::Idle, _) => &[("Enter", "start"), ("q", "quit")],
        (View::DnaExtraction, _) => &[("Enter", "answer"), ("^C", "quit")],
        (View::Dashboard, _) => &[
            ("j/k", "nav"),
            ("Enter", "open"),
            ("p", "plan"),
            ("e", "edit brief"),
            ("s", "summary"),
            ("R", "reset"),
            ("q", "quit"),
        ],
        (View::Working, _) if app.workspace.is_read_only() => {
            &[("Esc", "back"), ("c", "chat"), ("v", "diagram"), ("R", "reset")]
        }
        (View::Working, _) => &[
            ("i", "write"),
            ("c", "chat"),
            ("v", "diagram"),
            ("D", "done"),
            ("Esc", "back"),
            ("R", "reset"),
        ],
        (View::Summary, _) => {
            &[("j/k", "scroll"), ("b", "dashboard"), ("R", "reset"), ("q", "quit")]
        }
    };

    let mut spans = vec![Span::styled(mode_text, mode_style)];
    for (key, label) in keys {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_idle(frame: &mut Frame, area: Rect) {
    let text = Text::from(vec![
        Line::from(Span::styled("flowdeck", Style::default().fg(Color::Cyan).bold())),
        Line::default(),
        Line::from("Three questions, one brief, a short plan."),
        Line::from("Then work through it one task at a time with an AI collaborator."),
        Line::default(),
        Line::from(Span::styled("Press Enter to begin", Style::default().fg(Color::Yellow))),
    ]);
    let popup = centered(area, 70, 8);
    frame.render_widget(Paragraph::new(text).centered(), popup);
}

fn render_interview(app: &App, frame: &mut Frame, area: Rect) {
    let [transcript_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(interview) = app.workspace.interview() {
        for exchange in interview.transcript() {
            lines.push(Line::from(Span::styled(
                exchange.question.clone(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                format!("  {}", exchange.answer),
                Style::default().fg(Color::Cyan),
            )));
            lines.push(Line::default());
        }

        match interview.current_question() {
            Some(question) => lines.push(Line::from(Span::styled(
                question.to_string(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ))),
            None if interview.awaiting_question() => {
                lines.push(Line::from(thinking(app, "Thinking of the next question")))
            }
            None => lines.push(Line::from(thinking(app, "Writing your brief"))),
        }
    }

    let title = app
        .workspace
        .interview()
        .map(|i| {
            let step = (i.exchanges() + 1).min(MAX_EXCHANGES);
            format!(" Interview {}/{} ", step, MAX_EXCHANGES)
        })
        .unwrap_or_default();
    let transcript = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(transcript, transcript_area);

    let input = Paragraph::new(format!("{}▏", app.answer_input))
        .block(Block::default().borders(Borders::ALL).title(" Your answer "));
    frame.render_widget(input, input_area);
}

fn render_dashboard(app: &mut App, frame: &mut Frame, area: Rect) {
    let [brief_area, tasks_area] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(area);

    render_brief(app, frame, brief_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Plan ");

    if app.workspace.tasks().is_empty() {
        let line = if app.plan_pending() {
            Line::from(thinking(app, "Planning"))
        } else if let Some(error) = &app.plan_error {
            Line::from(vec![
                Span::styled(
                    format!("Planning failed: {}", error),
                    Style::default().fg(Color::Red),
                ),
                Span::styled("  Press p to retry.", Style::default().fg(Color::Yellow)),
            ])
        } else {
            Line::from(Span::styled(
                "No plan yet. Press p to generate one.",
                Style::default().fg(Color::DarkGray),
            ))
        };
        let placeholder = Paragraph::new(line).block(block).wrap(Wrap { trim: true });
        frame.render_widget(placeholder, tasks_area);
        return;
    }

    let items: Vec<ListItem> = app
        .workspace
        .tasks()
        .iter()
        .map(|task| task_item(app, task))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, tasks_area, &mut app.task_state);
}

fn task_item<'a>(app: &App, task: &'a MicroTask) -> ListItem<'a> {
    let (icon, color) = status_icon(task.status);
    let drafting = task.status == TaskStatus::Drafting
        && app.jobs.is_running(&JobKind::Draft(task.id.clone()));

    let mut spans = vec![
        Span::styled(format!("{} ", icon), Style::default().fg(color)),
        Span::raw(task.title.as_str()),
        Span::styled(
            format!("  {}m · {}", task.estimated_minutes, task.agent_type.as_str()),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if drafting {
        spans.push(Span::styled("  drafting", Style::default().fg(Color::Yellow).italic()));
    }
    if task.verification_status == VerificationStatus::NeedsRevision {
        spans.push(Span::styled("  needs revision", verification_style(task.verification_status)));
    }
    ListItem::new(Line::from(spans))
}

fn render_brief(app: &App, frame: &mut Frame, area: Rect) {
    let editing = match app.input_mode {
        InputMode::Brief(field) => Some(field),
        _ => None,
    };

    let mut lines: Vec<Line> = Vec::new();
    if let Some(dna) = app.workspace.dna() {
        for field in DnaField::all() {
            let label_style = if editing == Some(field) {
                Style::default().fg(Color::Black).bg(Color::Yellow).bold()
            } else {
                Style::default().fg(Color::Yellow).bold()
            };
            lines.push(Line::from(Span::styled(field.label(), label_style)));
            if editing == Some(field) {
                lines.push(Line::from(format!("{}▏", app.brief_input)));
            } else {
                lines.push(Line::from(dna.get(field).to_string()));
            }
            lines.push(Line::default());
        }
    }

    let brief = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(" Project brief "))
        .wrap(Wrap { trim: false });
    frame.render_widget(brief, area);
}

fn render_working(app: &mut App, frame: &mut Frame, area: Rect) {
    let [editor_area, side_area] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area);
    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(side_area);

    render_editor(app, frame, editor_area);
    render_chat(app, frame, chat_area);

    let focused = app.input_mode == InputMode::Chat;
    let mut input_line = app.chat_input.clone();
    if focused {
        let byte_pos = input_line
            .char_indices()
            .nth(app.chat_cursor)
            .map_or(input_line.len(), |(i, _)| i);
        input_line.insert(byte_pos, '▏');
    }
    let border = if focused { Color::Yellow } else { Color::DarkGray };
    let input = Paragraph::new(input_line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Message "),
    );
    frame.render_widget(input, input_area);
}

fn render_editor(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(task) = app.workspace.current_task() else {
        return;
    };

    let writing = app.input_mode == InputMode::Draft;
    let border = if writing {
        Color::Yellow
    } else if task.is_completed() {
        Color::Green
    } else {
        Color::Cyan
    };

    let title = Line::from(vec![
        Span::raw(format!(" {} ", task.title)),
        Span::styled(
            format!("[{}] ", task.verification_status.as_str()),
            verification_style(task.verification_status),
        ),
        if task.is_completed() {
            Span::styled("read-only ", Style::default().fg(Color::Green))
        } else {
            Span::raw("")
        },
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title);

    let buffer = app.workspace.buffer();
    let text = if buffer.is_empty() && app.draft_pending() {
        Text::from(thinking(app, "Drafting"))
    } else if buffer.is_empty() {
        Text::from(Span::styled(
            "Empty. Press i to start writing.",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = buffer.split('\n').map(parse_markdown_line).collect();
        if writing {
            lines.push(Line::from(Span::styled("▏", Style::default().fg(Color::Yellow))));
        }
        Text::from(lines)
    };

    // Keep the end of the text in view while typing
    let inner_height = area.height.saturating_sub(2) as usize;
    let inner_width = area.width.saturating_sub(2) as usize;
    let total = wrapped_height(buffer, inner_width) + usize::from(writing);
    let max_scroll = total.saturating_sub(inner_height) as u16;
    if writing {
        app.editor_scroll = max_scroll;
    } else {
        app.editor_scroll = app.editor_scroll.min(max_scroll);
    }

    let editor = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.editor_scroll, 0));
    frame.render_widget(editor, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(task) = app.workspace.current_task() else {
        return;
    };
    let width = area.width.saturating_sub(2) as usize;

    let mut lines: Vec<Line> = Vec::new();
    for msg in &task.chat_history {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for row in msg.text.split('\n').flat_map(|l| wrap_text_to_width(l, width)) {
                    lines.push(Line::from(row));
                }
            }
            ChatRole::Ai => {
                let color = if msg.sender_name == flowdeck_core::Persona::CRITIC.name {
                    Color::Red
                } else {
                    Color::Yellow
                };
                lines.push(Line::from(Span::styled(
                    format!("{}:", msg.sender_name),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )));
                for row in msg.text.split('\n').flat_map(|l| wrap_text_to_width(l, width)) {
                    lines.push(parse_markdown_line(&row));
                }
            }
        }
        lines.push(Line::default());
    }
    if app.chat_pending() {
        lines.push(Line::from(thinking(app, "Thinking")));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "Ask about this task. Press c to type.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let inner_height = area.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(inner_height) as u16;
    app.chat_scroll = app.chat_scroll.min(max_scroll);

    let persona = flowdeck_core::Persona::for_agent(task.agent_type);
    let chat = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" {} · {} ", persona.name, task.agent_type.as_str())),
        )
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);
}

fn render_summary(app: &mut App, frame: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    let minutes: u32 = app.workspace.tasks().iter().map(|t| t.estimated_minutes).sum();
    lines.push(Line::from(Span::styled(
        format!(
            "All {} tasks complete · about {} minutes of work",
            app.workspace.tasks().len(),
            minutes
        ),
        Style::default().fg(Color::Green).bold(),
    )));
    lines.push(Line::default());

    for task in app.workspace.tasks() {
        lines.push(Line::from(vec![
            Span::styled("✓ ", Style::default().fg(Color::Green)),
            Span::styled(task.title.clone(), Style::default().fg(Color::Yellow).bold()),
        ]));
        for line in task.content.as_deref().unwrap_or("").split('\n') {
            lines.push(parse_markdown_line(line));
        }
        lines.push(Line::default());
    }

    let summary = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(" Summary "))
        .wrap(Wrap { trim: false })
        .scroll((app.summary_scroll, 0));
    frame.render_widget(summary, area);
}

fn render_reset_confirm(frame: &mut Frame, area: Rect) {
    let popup_area = centered(area, 50, 5);
    frame.render_widget(Clear, popup_area);

    let text = Text::from(vec![
        Line::from("Delete the brief, the plan and every draft?"),
        Line::from(Span::styled("y to confirm, n to cancel", Style::default().fg(Color::DarkGray))),
    ]);
    let popup = Paragraph::new(text).centered().block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Reset "),
    );
    frame.render_widget(popup, popup_area);
}

fn render_visual(app: &App, frame: &mut Frame, area: Rect) {
    let Some(source) = app.workspace.current_task().and_then(|t| t.visual_code.as_deref()) else {
        return;
    };
    let height = source.lines().count() as u16 + 2;
    let popup_area = centered(area, 70, height.max(5));
    frame.render_widget(Clear, popup_area);

    let popup = Paragraph::new(source.to_string()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Mermaid (Esc to close) "),
    );
    frame.render_widget(popup, popup_area);
}
