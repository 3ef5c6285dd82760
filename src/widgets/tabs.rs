use crate::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Tabs};

/// A tab strip with `[key] Title` labels and a bottom rule. `keys` supplies
/// the hint shown before each title; missing hints are left out.
pub fn draw_tabs(
    f: &mut Frame,
    area: Rect,
    titles: &[&str],
    keys: &[&str],
    active: usize,
    theme: &Theme,
) {
    let lines: Vec<Line> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            let is_selected = i == active;
            let text_style = if is_selected {
                Style::default()
                    .fg(theme.selected)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.muted)
            };
            let key_style = if is_selected {
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.muted)
            };
            let mut spans = Vec::new();
            if let Some(k) = keys.get(i) {
                spans.push(Span::styled("[", Style::default().fg(theme.frame)));
                spans.push(Span::styled(k.to_string(), key_style));
                spans.push(Span::styled("] ", Style::default().fg(theme.frame)));
            }
            spans.push(Span::styled(title.to_string(), text_style));
            Line::from(spans)
        })
        .collect();

    let tabs = Tabs::new(lines)
        .select(active)
        .style(Style::default().fg(theme.fg))
        .highlight_style(
            Style::default()
                .fg(theme.selected)
                .add_modifier(Modifier::BOLD),
        )
        .divider(Span::styled(" │ ", Style::default().fg(theme.frame)));

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(theme.frame));

    f.render_widget(tabs.block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn renders_titles_with_key_hints() {
        let mut terminal = Terminal::new(TestBackend::new(60, 2)).unwrap();
        let theme = Theme::default();
        terminal
            .draw(|f| {
                draw_tabs(
                    f,
                    f.area(),
                    &["General", "Validation", "Appearance"],
                    &["F1", "F2"],
                    1,
                    &theme,
                )
            })
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("[F1] General"));
        assert!(text.contains("[F2] Validation"));
        assert!(text.contains("Appearance"));
    }
}
