use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::{FocusPane, InputMode};
use crate::config::Palette;
use crate::highlight::{build_highlight_regex, split_matches};

pub mod views;

use self::views::{CardModel, ChipKind, Views};

/// Everything the frame needs that is not part of the observed state.
pub struct Chrome<'a> {
    pub focus: FocusPane,
    pub mode: InputMode,
    pub search_input: &'a str,
    pub preset_input: &'a str,
    pub chip_cursor: usize,
    pub active_preset: Option<&'a str>,
    pub status: Option<&'a str>,
    pub palette: &'a Palette,
}

pub fn draw_app(frame: &mut Frame, views: &Views, chrome: &Chrome, list_state: &mut ListState) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(frame.size());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(vertical[1]);

    draw_search_bar(frame, vertical[0], views, chrome);
    draw_filter_panel(frame, columns[0], views, chrome);
    draw_grid(frame, columns[1], views, chrome, list_state);
    draw_footer(frame, vertical[2], views, chrome);

    if views.modal.is_open() {
        draw_modal(frame, views, chrome.palette);
    }
}

fn draw_search_bar(frame: &mut Frame, area: Rect, views: &Views, chrome: &Chrome) {
    let palette = chrome.palette;
    let model = views.search.model();
    let editing = chrome.mode == InputMode::Search;

    let query = if editing {
        chrome.search_input
    } else {
        model.query.as_str()
    };
    let mut input = vec![Span::styled(
        "Search: ",
        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
    )];
    if query.is_empty() && !editing {
        input.push(Span::styled(
            "press / to search titles, notes, tactics, tags",
            Style::default().fg(palette.muted),
        ));
    } else {
        input.push(Span::raw(query.to_string()));
    }
    if editing {
        input.push(Span::styled("▏", Style::default().fg(palette.accent)));
    }
    input.push(Span::styled(
        format!("   {} • sort {}", model.feedback, model.sort),
        Style::default().fg(palette.muted),
    ));

    let mut chips = Vec::new();
    if model.active_filters.is_empty() {
        chips.push(Span::styled("No active filters", Style::default().fg(palette.muted)));
    }
    for filter in &model.active_filters {
        chips.push(Span::styled(
            format!("[{filter}]"),
            Style::default().fg(palette.chip_selected),
        ));
        chips.push(Span::raw(" "));
    }
    if let Some(label) = chrome.active_preset {
        chips.push(Span::styled(
            format!("  preset: {label}"),
            Style::default().fg(palette.accent).add_modifier(Modifier::ITALIC),
        ));
    }

    let border = if editing {
        Style::default().fg(palette.focus_border)
    } else {
        Style::default()
    };
    let paragraph = Paragraph::new(vec![Line::from(input), Line::from(chips)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title("HEARTH"),
        );
    frame.render_widget(paragraph, area);
}

fn draw_filter_panel(frame: &mut Frame, area: Rect, views: &Views, chrome: &Chrome) {
    let palette = chrome.palette;
    let model = views.filters.model();
    let focused = chrome.focus == FocusPane::Filters;
    let width = area.width.saturating_sub(8) as usize;

    let mut lines = Vec::new();
    let category = model
        .category
        .map(|category| category.to_string())
        .unwrap_or_else(|| "All".to_string());
    lines.push(Line::from(vec![
        Span::styled("Category: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(category, Style::default().fg(palette.category(model.category))),
        Span::styled("  (c)", Style::default().fg(palette.muted)),
    ]));

    let mut cursor_line = 0usize;
    let mut index = 0usize;
    for group in &model.groups {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            group.label.clone(),
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        )));
        for chip in &group.chips {
            let marker = if chip.selected { "[x] " } else { "[ ] " };
            let label = match chip.kind {
                ChipKind::Tactic => chip.value.clone(),
                ChipKind::Tag => format!("#{}", chip.value),
            };
            let mut style = if chip.selected {
                Style::default().fg(palette.chip_selected)
            } else {
                Style::default()
            };
            if focused && index == chrome.chip_cursor {
                style = style
                    .bg(palette.selection_bg)
                    .fg(palette.selection_fg)
                    .add_modifier(Modifier::BOLD);
                cursor_line = lines.len();
            }
            lines.push(Line::from(Span::styled(
                format!("{marker}{}", truncate_to_width(&label, width)),
                style,
            )));
            index += 1;
        }
    }

    let visible = area.height.saturating_sub(2) as usize;
    let scroll = cursor_line.saturating_sub(visible.saturating_sub(1));
    let border = if focused {
        Style::default().fg(palette.focus_border)
    } else {
        Style::default()
    };
    let paragraph = Paragraph::new(lines)
        .scroll((scroll.min(u16::MAX as usize) as u16, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title("Filters (Space toggle • T/G clear)"),
        );
    frame.render_widget(paragraph, area);
}

fn draw_grid(
    frame: &mut Frame,
    area: Rect,
    views: &Views,
    chrome: &Chrome,
    list_state: &mut ListState,
) {
    let palette = chrome.palette;
    let model = views.grid.model();
    let pagination = views.pagination.model();
    let focused = chrome.focus == FocusPane::Grid;
    let border = if focused {
        Style::default().fg(palette.focus_border)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(format!("Hunts • {}", pagination.range_label()));

    if let Some(message) = &model.empty_message {
        let paragraph = Paragraph::new(Span::styled(
            message.clone(),
            Style::default().fg(palette.muted),
        ))
        .wrap(Wrap { trim: true })
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let regex = build_highlight_regex(&model.highlight_terms);
    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = model
        .cards
        .iter()
        .map(|card| card_item(card, regex.as_ref(), palette, width))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(palette.selection_bg)
                .fg(palette.selection_fg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("› ");
    frame.render_stateful_widget(list, area, list_state);
}

fn card_item<'a>(
    card: &CardModel,
    regex: Option<&Regex>,
    palette: &Palette,
    width: usize,
) -> ListItem<'a> {
    let highlight = Style::default()
        .fg(palette.highlight)
        .add_modifier(Modifier::BOLD);
    let category_style = Style::default().fg(palette.category(card.category));

    let mut heading = vec![
        Span::styled(format!("{:<9}", card.category_label), category_style),
        Span::styled(format!("{} ", card.id), Style::default().fg(palette.muted)),
    ];
    let used = 10 + card.id.width() + 1;
    let title = truncate_to_width(&card.title, width.saturating_sub(used));
    heading.extend(highlight_line(
        &title,
        regex,
        highlight,
        Style::default().add_modifier(Modifier::BOLD),
    ));

    let mut details = vec![Span::raw("  ")];
    details.extend(highlight_line(
        &truncate_to_width(&card.tactics.join(", "), width.saturating_sub(2)),
        regex,
        highlight,
        Style::default(),
    ));

    let tags: Vec<String> = card.tags.iter().map(|tag| format!("#{tag}")).collect();
    let mut meta = tags.join(" ");
    if !card.submitter.is_empty() {
        if !meta.is_empty() {
            meta.push_str("  ");
        }
        meta.push_str("by ");
        meta.push_str(&card.submitter);
    }
    let meta = Line::from(vec![
        Span::raw("  "),
        Span::styled(
            truncate_to_width(&meta, width.saturating_sub(2)),
            Style::default().fg(palette.muted),
        ),
    ]);

    ListItem::new(vec![Line::from(heading), Line::from(details), meta])
}

fn draw_footer(frame: &mut Frame, area: Rect, views: &Views, chrome: &Chrome) {
    let palette = chrome.palette;
    let pagination = views.pagination.model();
    let previous = if pagination.has_previous { "← prev" } else { "      " };
    let next = if pagination.has_next { "next →" } else { "      " };

    let mut top = vec![
        Span::styled(previous, Style::default().fg(palette.accent)),
        Span::raw("  "),
        Span::styled(pagination.label(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(next, Style::default().fg(palette.accent)),
        Span::styled(
            format!("   {} per page", pagination.page_size),
            Style::default().fg(palette.muted),
        ),
    ];
    if let Some(status) = chrome.status {
        top.push(Span::raw("   "));
        top.push(Span::styled(status.to_string(), Style::default().fg(palette.highlight)));
    }

    let hints = match chrome.mode {
        InputMode::Search => "Typing filters after a pause • Enter apply • Esc done".to_string(),
        InputMode::PresetLabel => format!("Preset name: {}▏", chrome.preset_input),
        InputMode::Browse => {
            "/ search • c category • Tab focus • s/S sort • Enter details • p/P/D presets • x clear • q quit"
                .to_string()
        }
    };
    let bottom = Line::from(Span::styled(hints, Style::default().fg(palette.muted)));

    let paragraph = Paragraph::new(Text::from(vec![Line::from(top), bottom]))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(paragraph, area);
}

fn draw_modal(frame: &mut Frame, views: &Views, palette: &Palette) {
    let model = views.modal.model();
    let area = centered_rect(80, 80, frame.size());
    frame.render_widget(Clear, area);
    let Some(detail) = &model.detail else {
        let empty = Paragraph::new(Span::styled("No hunts", Style::default().fg(palette.muted)))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.focus_border))
                    .title("0 / 0 • Esc close"),
            );
        frame.render_widget(empty, area);
        return;
    };

    let label = Style::default().fg(palette.accent).add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(Span::styled(
            detail.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(
                detail.category_label.clone(),
                Style::default().fg(palette.category(detail.category)),
            ),
            Span::styled(
                detail
                    .hunt_style
                    .map(|style| format!(" • {style}"))
                    .unwrap_or_default(),
                Style::default().fg(palette.muted),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Tactics: ", label),
            Span::raw(detail.tactics.join(", ")),
        ]),
        Line::from(vec![
            Span::styled("Tags: ", label),
            Span::raw(
                detail
                    .tags
                    .iter()
                    .map(|tag| format!("#{tag}"))
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
        ]),
    ];

    let mut submitter = vec![
        Span::styled("Submitted by: ", label),
        Span::raw(if detail.submitter.is_empty() {
            "unknown".to_string()
        } else {
            detail.submitter.clone()
        }),
    ];
    if let Some(link) = &detail.submitter_link {
        submitter.push(Span::styled(format!(" <{link}>"), Style::default().fg(palette.muted)));
    }
    lines.push(Line::from(submitter));

    if !detail.notes.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Hypothesis", label)));
        lines.extend(detail.notes.lines().map(|line| Line::from(line.to_string())));
    }
    if !detail.why.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Why", label)));
        lines.extend(detail.why.iter().map(|line| Line::from(format!("• {line}"))));
    }
    if !detail.references.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("References", label)));
        lines.extend(
            detail
                .references
                .iter()
                .map(|line| Line::from(Span::styled(line.clone(), Style::default().fg(palette.muted)))),
        );
    }
    if !detail.file_path.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Source: ", label),
            Span::raw(detail.file_path.clone()),
        ]));
    }

    let title = format!("{} • {} • ←/→ browse • Esc close", detail.id, model.counter());
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.focus_border))
                .title(title),
        );
    frame.render_widget(paragraph, area);
}

fn highlight_line(
    text: &str,
    regex: Option<&Regex>,
    highlight_style: Style,
    base_style: Style,
) -> Vec<Span<'static>> {
    split_matches(text, regex)
        .into_iter()
        .filter(|(piece, _)| !piece.is_empty())
        .map(|(piece, matched)| {
            let style = if matched { highlight_style } else { base_style };
            Span::styled(piece.to_string(), style)
        })
        .collect()
}

/// Cut `text` to at most `max` display columns, ending in `…` when shortened.
fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let width = grapheme.width();
        if used + width + 1 > max {
            break;
        }
        out.push_str(grapheme);
        used += width;
    }
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppState;
    use crate::catalog;
    use crate::config::ThemeName;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn truncates_by_display_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("Lateral Movement", 8), "Lateral…");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
        assert_eq!(truncate_to_width("anything", 0), "");
    }

    #[test]
    fn highlight_line_styles_matches_only() {
        let regex = build_highlight_regex(&["dns"]);
        let base = Style::default();
        let hit = Style::default().add_modifier(Modifier::BOLD);
        let spans = highlight_line("Beaconing DNS traffic", regex.as_ref(), hit, base);
        let styled: Vec<_> = spans
            .iter()
            .map(|span| (span.content.as_ref(), span.style == hit))
            .collect();
        assert_eq!(
            styled,
            vec![("Beaconing ", false), ("DNS", true), (" traffic", false)]
        );
    }

    #[test]
    fn draws_grid_and_modal_into_test_backend() -> anyhow::Result<()> {
        let hunts = catalog::parse_dataset(catalog::seed_dataset())?;
        let mut state = AppState::new(hunts);
        let views = Views::attach(&mut state);
        views.modal.open(&state, 0);
        let palette = ThemeName::Dark.palette();
        let chrome = Chrome {
            focus: FocusPane::Grid,
            mode: InputMode::Browse,
            search_input: "",
            preset_input: "",
            chip_cursor: 0,
            active_preset: None,
            status: Some("ready"),
            palette: &palette,
        };
        let mut terminal = Terminal::new(TestBackend::new(120, 40))?;
        let mut list_state = ListState::default();
        terminal.draw(|frame| draw_app(frame, &views, &chrome, &mut list_state))?;

        let buffer = terminal.backend().buffer();
        let rendered: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(rendered.contains("HEARTH"));
        assert!(rendered.contains("Page 1 of 2"));
        assert!(rendered.contains("1 / 10"));
        Ok(())
    }
}
