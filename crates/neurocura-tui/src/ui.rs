use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, Focus, InputMode, Popup};

pub const DISCLAIMER: &str =
    "Educational information only. Not a substitute for professional medical advice.";

const HELP_TEXT: &str = "\
Neurocura explains neurological conditions, cognitive health and brain
wellness in plain language, and helps you prepare questions for your doctor.
It does not diagnose or prescribe. In an emergency, seek medical care now.

Enter      send message / confirm
Tab        switch focus between chats and messages
Up/Down    select chat or message (PgUp/PgDn jump)
Ctrl+N     new chat            F2      rename chat
Ctrl+E     edit your message   Ctrl+R  view edit history
Ctrl+D     delete chat/message Ctrl+L  clear chat
Ctrl+O     import transcript   Ctrl+S  export transcript
Ctrl+U     clear input         Esc     cancel / close popup
Ctrl+Q     quit";

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(8),    // Body
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status bar
        ])
        .split(f.size());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(28), Constraint::Percentage(72)])
        .split(chunks[1]);

    draw_header(f, app, chunks[0]);
    draw_sessions(f, app, body[0]);
    draw_messages(f, app, body[1]);
    draw_input(f, app, chunks[2]);
    draw_status_bar(f, app, chunks[3]);

    if let Some(popup) = &app.popup {
        draw_popup(f, popup);
    }
}

fn border_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Blue)
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let mut title = vec![
        Span::styled(
            " Neurocura",
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Cyan),
        ),
        Span::styled("  |  ", Style::default().fg(Color::Gray)),
        Span::styled(app.model.as_str(), Style::default().fg(Color::Gray)),
    ];
    if app.is_waiting() {
        title.push(Span::styled(
            "  ◐ Waiting for response...",
            Style::default().fg(Color::Yellow),
        ));
    }

    let text = Text::from(vec![
        Line::from(title),
        Line::from(Span::styled(
            format!(" ⚠ {}", DISCLAIMER),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        )),
    ]);

    let header = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );
    f.render_widget(header, area);
}

fn draw_sessions(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .sessions()
        .iter()
        .map(|session| {
            let created = session
                .created_at()
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string();
            ListItem::new(Text::from(vec![
                Line::from(Span::styled(
                    session.title().to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("{} · {} msgs", created, session.len()),
                    Style::default().fg(Color::DarkGray),
                )),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Chats")
                .border_style(border_style(app.focus == Focus::Sessions)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.current_index());
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_messages(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(
            app.current_session()
                .map(|s| s.title().to_string())
                .unwrap_or_else(|| "No chat selected (Ctrl+N for a new one)".to_string()),
        )
        .border_style(border_style(app.focus == Focus::Messages));

    let Some(session) = app.current_session() else {
        f.render_widget(block, area);
        return;
    };

    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = session
        .messages()
        .iter()
        .map(|message| {
            let (label, color) = if message.is_user() {
                ("You", Color::Cyan)
            } else {
                ("AI", Color::Green)
            };

            let mut header = vec![Span::styled(
                format!("{}:", label),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )];
            if message.is_edited() {
                header.push(Span::styled(
                    " (edited)",
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                ));
            }

            let mut lines = vec![Line::from(header)];
            lines.extend(
                wrap_text(message.text(), width)
                    .into_iter()
                    .map(|line| Line::from(Span::styled(line, Style::default().fg(color)))),
            );
            lines.push(Line::from(""));
            ListItem::new(Text::from(lines))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("▌ ");

    let mut state = ListState::default();
    state.select(
        app.selected_message
            .or_else(|| session.len().checked_sub(1)),
    );
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let line = if app.input.is_empty() && app.mode == InputMode::Message {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Green)),
            Span::styled(
                "Ask about brain health and press Enter... (F1 for help)",
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Green)),
            Span::raw(app.input.as_str()),
            Span::styled("▌", Style::default().fg(Color::Green)),
        ])
    };

    let accent = if app.mode == InputMode::Message {
        Color::Blue
    } else {
        Color::Yellow
    };

    let input = Paragraph::new(line)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(app.mode.title())
                .border_style(Style::default().fg(accent)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(input, area);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let status = format!(" {}  |  F1 Help  Ctrl+Q Quit", app.status);
    let status_bar = Paragraph::new(status)
        .alignment(Alignment::Left)
        .style(
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::REVERSED),
        );
    f.render_widget(status_bar, area);
}

fn draw_popup(f: &mut Frame, popup: &Popup) {
    let (title, body, color) = match popup {
        Popup::Help => ("About Neurocura".to_string(), HELP_TEXT.to_string(), Color::Cyan),
        Popup::Error { title, message } => (title.clone(), message.clone(), Color::Red),
        Popup::History { versions } => {
            let last = versions.len().saturating_sub(1);
            let body = versions
                .iter()
                .enumerate()
                .map(|(i, text)| {
                    if i == last {
                        format!("Current: {}", text)
                    } else {
                        format!("Version {}: {}", i + 1, text)
                    }
                })
                .collect::<Vec<_>>()
                .join("\n\n");
            ("Edit History".to_string(), body, Color::Magenta)
        }
    };

    let area = centered_rect(70, 60, f.size());
    let paragraph = Paragraph::new(body)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} (Esc to close)", title))
                .border_style(Style::default().fg(color)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Word-wrap `text` to `width` display columns
///
/// Embedded newlines start new lines; words wider than a line are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for raw in text.split('\n') {
        let mut line = String::new();
        let mut line_width = 0;

        for word in raw.split(' ') {
            let word_width = UnicodeWidthStr::width(word);
            let sep = usize::from(!line.is_empty());
            if line_width + sep + word_width <= width {
                if sep == 1 {
                    line.push(' ');
                }
                line.push_str(word);
                line_width += sep + word_width;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }
            for ch in word.chars() {
                let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
                if line_width + ch_width > width && !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                    line_width = 0;
                }
                line.push(ch);
                line_width += ch_width;
            }
        }
        lines.push(line);
    }

    lines
}
