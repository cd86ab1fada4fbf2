//! Markdown to styled terminal lines.
//!
//! Covers what chat replies typically use: headings, lists, quotes, rules,
//! fenced code and the inline `**bold**`, `*italic*` and `` `code` `` markers.
//! Markers without a closing partner are kept as literal text.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::theme::Palette;

pub fn render(text: &str, palette: &Palette) -> Vec<Line<'static>> {
    let base = Style::default().fg(palette.text);
    let marker = Style::default().fg(palette.accent);
    let code = Style::default().fg(palette.code);

    let mut lines = Vec::new();
    let mut in_code_block = false;

    for raw in text.lines() {
        let trimmed = raw.trim_start();
        let indent = raw.len() - trimmed.len();

        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }

        if in_code_block {
            lines.push(Line::from(Span::styled(format!("  {}", raw), code)));
            continue;
        }

        if let Some((level, heading)) = split_heading(trimmed) {
            let mut style = marker.add_modifier(Modifier::BOLD);
            if level == 1 {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            lines.push(Line::from(parse_inline(heading, style, palette)));
        } else if is_rule(trimmed) {
            lines.push(Line::from(Span::styled(
                "─".repeat(24),
                Style::default().fg(palette.muted),
            )));
        } else if let Some(quoted) = strip_quote(trimmed) {
            let mut spans = vec![Span::styled("│ ", Style::default().fg(palette.muted))];
            spans.extend(parse_inline(quoted, base.add_modifier(Modifier::ITALIC), palette));
            lines.push(Line::from(spans));
        } else if let Some(item) = strip_bullet(trimmed) {
            let mut spans = vec![Span::raw(" ".repeat(indent)), Span::styled("• ", marker)];
            spans.extend(parse_inline(item, base, palette));
            lines.push(Line::from(spans));
        } else if let Some((number, item)) = split_ordered(trimmed) {
            let mut spans = vec![
                Span::raw(" ".repeat(indent)),
                Span::styled(format!("{}. ", number), marker),
            ];
            spans.extend(parse_inline(item, base, palette));
            lines.push(Line::from(spans));
        } else if raw.trim().is_empty() {
            lines.push(Line::default());
        } else {
            lines.push(Line::from(parse_inline(raw, base, palette)));
        }
    }

    lines
}

fn split_heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    line[level..].strip_prefix(' ').map(|rest| (level, rest.trim()))
}

fn is_rule(line: &str) -> bool {
    let compact: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3
        && matches!(compact[0], '-' | '*' | '_')
        && compact.iter().all(|c| *c == compact[0])
}

fn strip_quote(line: &str) -> Option<&str> {
    if line == ">" {
        return Some("");
    }
    line.strip_prefix("> ")
}

fn strip_bullet(line: &str) -> Option<&str> {
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("+ "))
}

fn split_ordered(line: &str) -> Option<(&str, &str)> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    line[digits..]
        .strip_prefix(". ")
        .map(|rest| (&line[..digits], rest))
}

/// Splits one line of text into styled spans.
fn parse_inline(text: &str, base: Style, palette: &Palette) -> Vec<Span<'static>> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut plain = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '`' {
            if let Some(end) = find_char(&chars, i + 1, '`') {
                flush(&mut spans, &mut plain, base);
                let inner: String = chars[i + 1..end].iter().collect();
                spans.push(Span::styled(inner, base.fg(palette.code)));
                i = end + 1;
                continue;
            }
        } else if c == '*' && chars.get(i + 1) == Some(&'*') {
            if let Some(end) = find_double_star(&chars, i + 2) {
                if end > i + 2 {
                    flush(&mut spans, &mut plain, base);
                    let inner: String = chars[i + 2..end].iter().collect();
                    spans.extend(parse_inline(&inner, base.add_modifier(Modifier::BOLD), palette));
                    i = end + 2;
                    continue;
                }
            }
        } else if (c == '*' || c == '_') && opens_emphasis(&chars, i) {
            if let Some(end) = find_emphasis_close(&chars, i + 1, c) {
                flush(&mut spans, &mut plain, base);
                let inner: String = chars[i + 1..end].iter().collect();
                spans.extend(parse_inline(&inner, base.add_modifier(Modifier::ITALIC), palette));
                i = end + 1;
                continue;
            }
        }

        plain.push(c);
        i += 1;
    }

    flush(&mut spans, &mut plain, base);
    spans
}

fn flush(spans: &mut Vec<Span<'static>>, plain: &mut String, style: Style) {
    if !plain.is_empty() {
        spans.push(Span::styled(std::mem::take(plain), style));
    }
}

fn find_char(chars: &[char], from: usize, target: char) -> Option<usize> {
    (from..chars.len()).find(|&j| chars[j] == target)
}

fn find_double_star(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len().saturating_sub(1)).find(|&j| chars[j] == '*' && chars[j + 1] == '*')
}

fn opens_emphasis(chars: &[char], at: usize) -> bool {
    let next_is_text = chars.get(at + 1).is_some_and(|n| !n.is_whitespace());
    // `snake_case` and `2*3*4` are not emphasis
    let prev_is_word = at > 0 && chars[at - 1].is_alphanumeric();
    next_is_text && !prev_is_word
}

fn find_emphasis_close(chars: &[char], from: usize, marker: char) -> Option<usize> {
    (from + 1..chars.len()).find(|&j| {
        chars[j] == marker
            && !chars[j - 1].is_whitespace()
            && !chars.get(j + 1).is_some_and(|n| n.is_alphanumeric() || *n == marker)
    })
}
