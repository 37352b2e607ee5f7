use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use healthbot_core::{
    format, Block as ContentBlock, ConnectionState, Message, Sender, Span as ContentSpan,
};

use crate::app::{App, InputMode};

pub fn render(frame: &mut Frame, app: &mut App) {
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    // Header: title plus connectivity indicator
    let connection = app.session.connection_state();
    let (dot, dot_color) = match connection {
        ConnectionState::Connected => ("●", Color::Green),
        ConnectionState::Degraded => ("◐", Color::Yellow),
        ConnectionState::Offline => ("○", Color::Red),
        ConnectionState::Unknown => ("…", Color::DarkGray),
    };
    let header = Line::from(vec![
        Span::styled(
            " HealthBot AI ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(dot, Style::default().fg(dot_color)),
        Span::raw(" "),
        Span::styled(connection.label(), Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(header), header_area);

    // Chat pane
    // Store inner dimensions for scroll calculations (minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    let chat_text = if app.session.messages().is_empty() && !app.loading() {
        Text::from(Span::styled(
            "Ask a health question...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in app.session.messages() {
            lines.extend(message_lines(msg));
        }

        if app.loading() {
            lines.push(Line::from(Span::styled(
                "HealthBot:",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    // Input box, highlighted while editing
    let input_border_color = if app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let input_title = if app.input_mode == InputMode::Editing {
        " Message (Enter to send) "
    } else {
        " Message (i to type) "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(input_title);

    // Horizontal scroll keeps the cursor visible in a one-line input
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 {
        0
    } else if app.cursor >= inner_width {
        app.cursor - inner_width + 1
    } else {
        0
    };
    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    frame.render_widget(Paragraph::new(visible_text).block(input_block), input_area);

    if app.input_mode == InputMode::Editing {
        frame.set_cursor_position((
            input_area.x + 1 + (app.cursor - scroll_offset) as u16,
            input_area.y + 1,
        ));
    }

    // Footer: transient notice or key help
    let footer = match &app.status_note {
        Some(note) => Line::from(Span::styled(
            format!(" {}", note),
            Style::default().fg(Color::Green),
        )),
        None => Line::from(Span::styled(
            " Enter send · Ctrl+L clear · Ctrl+E export · Ctrl+R reconnect · Ctrl+C quit",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(footer), footer_area);
}

/// Render one message as styled lines: a role header, then the formatted
/// blocks of its text.
fn message_lines(msg: &Message) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    match msg.sender {
        Sender::User => {
            lines.push(Line::from(Span::styled(
                "You:",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(msg.text.clone()));
        }
        Sender::Assistant => {
            let is_error = msg.intent.as_deref() == Some("error");
            let header_color = if is_error { Color::Red } else { Color::Yellow };
            lines.push(Line::from(Span::styled(
                "HealthBot:",
                Style::default()
                    .fg(header_color)
                    .add_modifier(Modifier::BOLD),
            )));

            for block in format(&msg.text) {
                match block {
                    ContentBlock::Paragraph(spans) => {
                        lines.push(Line::from(content_spans(spans)));
                    }
                    ContentBlock::List(items) => {
                        for item in items {
                            let mut ui_spans = vec![Span::raw("• ")];
                            ui_spans.extend(content_spans(item));
                            lines.push(Line::from(ui_spans));
                        }
                    }
                }
            }
        }
    }

    lines.push(Line::default());
    lines
}

fn content_spans(spans: Vec<ContentSpan>) -> Vec<Span<'static>> {
    spans
        .into_iter()
        .map(|span| match span {
            ContentSpan::Text(text) => Span::raw(text),
            ContentSpan::Link(url) => Span::styled(
                url,
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::UNDERLINED),
            ),
            ContentSpan::Emphasis(digits) => {
                Span::styled(digits, Style::default().add_modifier(Modifier::BOLD))
            }
        })
        .collect()
}
