use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::*;

use crate::settings::SettingsBucket;
use crate::theme::Theme;
use crate::ui::{AppState, ToastLevel};

const SPINNER: [&str; 6] = ["⠋", "⠙", "⠸", "⠴", "⠦", "⠇"];

/// Title, backend, in-flight work, bucket saves and the current toast.
pub fn draw_status(f: &mut Frame, area: Rect, state: &AppState) {
    let theme = &state.theme;
    let mut spans: Vec<Span> = vec![
        Span::styled(format!(" {} ", state.config.title), theme.text_active_bold()),
        Span::styled(format!("[{}]", state.backend.name()), theme.text_muted()),
    ];
    if state.in_flight > 0 {
        let spinner = SPINNER[state.tick as usize % SPINNER.len()];
        spans.push(Span::raw(format!("  {spinner} working ({})", state.in_flight)));
    }
    if let Some(session) = state.editor.session() {
        let saving: Vec<&str> = SettingsBucket::ALL
            .iter()
            .filter(|b| session.is_saving(**b))
            .map(|b| b.as_str())
            .collect();
        if !saving.is_empty() {
            spans.push(Span::styled(
                format!("  saving {}", saving.join(", ")),
                theme.text_editing_bold(),
            ));
        }
    }
    if let Some(t) = &state.toast {
        let color = theme.toast_color(t.level);
        let tag = match t.level {
            ToastLevel::Success => "[OK]",
            ToastLevel::Error => "[ERROR]",
            ToastLevel::Info => "[INFO]",
        };
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("{tag} "),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(t.text.clone(), Style::default().fg(color)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub fn draw_help(f: &mut Frame, area: Rect, help_text: &str, theme: &Theme) {
    let p = Paragraph::new(help_text.to_string()).style(theme.text_muted());
    f.render_widget(p, area);
}
