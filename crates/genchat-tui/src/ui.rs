use genchat_core::Persona;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, InputMode};
use crate::markdown;
use crate::theme::Palette;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let palette = app.theme.palette();

    frame.render_widget(
        Block::default().style(Style::default().bg(palette.background)),
        area,
    );

    // Main layout: header, transcript, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area, &palette);
    render_chat(app, frame, chat_area, &palette);
    render_input(app, frame, input_area, &palette);
    render_footer(app, frame, footer_area, &palette);

    if app.show_persona_picker {
        render_persona_picker(app, frame, area, &palette);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let muted = Style::default().fg(palette.muted);

    let title = Line::from(vec![
        Span::styled(" Generative AI Chat ", Style::default().fg(palette.accent).bold()),
        Span::styled(
            format!("[{}] ", app.session.persona().display_name()),
            Style::default().fg(palette.ai),
        ),
        Span::styled(format!("{} ", app.endpoint), muted),
        Span::styled(format!("theme:{} ", app.theme), muted),
        Span::styled(format!("v{}", env!("CARGO_PKG_VERSION")), muted),
    ]);

    frame.render_widget(Paragraph::new(title), area);
}

fn label(text: &'static str, color: ratatui::style::Color) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

/// Spinner plus "Analyzing...", shown while a reply is outstanding.
pub fn loading_indicator(spinner: &str, palette: &Palette) -> Vec<Line<'static>> {
    vec![
        label("AI:", palette.ai),
        Line::from(vec![
            Span::styled(format!("{} ", spinner), Style::default().fg(palette.accent)),
            Span::styled(
                "Analyzing...",
                Style::default()
                    .fg(palette.muted)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]),
    ]
}

fn transcript_lines(app: &App, palette: &Palette) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for exchange in app.session.transcript() {
        lines.push(label("You:", palette.user));
        for text in exchange.question.lines() {
            lines.push(Line::from(Span::styled(
                text.to_string(),
                Style::default().fg(palette.text),
            )));
        }
        lines.push(Line::default());

        lines.push(label("AI:", palette.ai));
        lines.extend(markdown::render(&exchange.response, palette));
        lines.push(Line::default());
    }

    if app.session.is_pending() {
        lines.extend(loading_indicator(app.spinner(), palette));
    }

    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    app.chat_area = Some(area);

    let focused = app.input_mode == InputMode::Normal && !app.show_persona_picker;
    let border = if focused { palette.accent } else { palette.muted };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(" Conversation ");

    let inner_height = area.height.saturating_sub(2);
    let inner_width = area.width.saturating_sub(2);

    let text = if app.session.transcript().is_empty() && !app.session.is_pending() {
        Text::from(Span::styled(
            "Ask anything. Your conversation will appear here.",
            Style::default().fg(palette.muted),
        ))
    } else {
        Text::from(transcript_lines(app, palette))
    };

    // Measured with the same wrapper that renders it, so wide glyphs and
    // indentation count the way they are drawn.
    let chat = Paragraph::new(text).wrap(Wrap { trim: false });
    let total = chat.line_count(inner_width);
    app.sync_chat_view(total.min(u16::MAX as usize) as u16, inner_height, inner_width);

    let chat = chat.block(block).scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let pending = app.session.is_pending();
    let editing = app.input_mode == InputMode::Editing && !app.show_persona_picker;

    let (title, border) = if pending {
        (" Waiting for reply... ", palette.muted)
    } else if editing {
        (" Message (Enter to send) ", palette.accent)
    } else {
        (" Message (i to type) ", palette.muted)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let (scroll_offset, cursor_x) = input_window(app.draft(), app.cursor, inner_width);

    let input = if app.draft().is_empty() && !editing {
        Paragraph::new("Type your message...").style(Style::default().fg(palette.muted))
    } else {
        let mut used = 0;
        let visible_text: String = app
            .draft()
            .chars()
            .skip(scroll_offset)
            .take_while(|c| {
                used += c.width().unwrap_or(0);
                used <= inner_width
            })
            .collect();
        let color = if pending { palette.muted } else { palette.user };
        Paragraph::new(visible_text).style(Style::default().fg(color))
    };

    frame.render_widget(input.block(block), area);

    if editing {
        frame.set_cursor_position((area.x + cursor_x as u16 + 1, area.y + 1));
    }
}

/// First visible character of the draft and the cursor's column relative to
/// it, both sized in terminal columns so wide glyphs keep the cursor in place.
pub(crate) fn input_window(draft: &str, cursor: usize, width: usize) -> (usize, usize) {
    let widths: Vec<usize> = draft.chars().map(|c| c.width().unwrap_or(0)).collect();
    let cursor = cursor.min(widths.len());

    // The cursor cell itself needs one column
    let mut start = cursor;
    let mut used = 1;
    while start > 0 && used + widths[start - 1] <= width {
        start -= 1;
        used += widths[start];
    }

    (start, widths[start..cursor].iter().sum())
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(palette.accent).fg(palette.background),
        InputMode::Editing => Style::default().bg(palette.ai).fg(palette.background),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDIT ",
    };

    let key_style = Style::default().fg(palette.accent).add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(palette.muted);
    let hint = |key: &'static str, text: &'static str| {
        [Span::styled(key, key_style), Span::styled(text, label_style)]
    };

    let hints: Vec<Span> = if app.show_persona_picker {
        [hint(" j/k ", "move "), hint(" Enter ", "select "), hint(" Esc ", "cancel ")].concat()
    } else {
        match app.input_mode {
            InputMode::Editing => [
                hint(" Enter ", "send "),
                hint(" Tab ", "persona "),
                hint(" PgUp/PgDn ", "scroll "),
                hint(" Esc ", "stop typing "),
            ]
            .concat(),
            InputMode::Normal => [
                hint(" i ", "type "),
                hint(" j/k ", "scroll "),
                hint(" p ", "persona "),
                hint(" t ", "theme "),
                hint(" q ", "quit "),
            ]
            .concat(),
        }
    };

    let footer = Line::from(
        std::iter::once(Span::styled(mode_text, mode_style))
            .chain(hints)
            .collect::<Vec<_>>(),
    );

    frame.render_widget(Paragraph::new(footer), area);
}

fn render_persona_picker(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    // Calculate popup size and position (centered)
    let popup_width = 36.min(area.width.saturating_sub(4));
    let popup_height = (Persona::ALL.len() as u16 + 2).min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .style(Style::default().bg(palette.background))
        .title(" Select Persona ");

    let current = app.session.persona();
    let items: Vec<ListItem> = Persona::ALL
        .iter()
        .map(|persona| {
            let is_current = *persona == current;
            let prefix = if is_current { "* " } else { "  " };
            let style = if is_current {
                Style::default().fg(palette.ai).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(palette.text)
            };
            ListItem::new(format!("{}{}", prefix, persona.display_name())).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(palette.accent)
                .fg(palette.background)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.persona_picker_state);
}
