//! Terminal rendering of a `FieldPreview`: a mock of the control drawn with
//! the computed colours, followed by the layer stack and the raw style map.

use crate::preview::{ElementKind, FieldPreview, PreviewLayer, PreviewState};
use crate::theme::{parse_hex, Theme};
use crate::widgets::chrome::panel_block_themed;
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

pub fn layer_names(layers: &[PreviewLayer]) -> String {
    layers
        .iter()
        .map(|l| match l {
            PreviewLayer::Variant(v) => format!("variant:{}", v.as_str()),
            PreviewLayer::Theme(t) => format!("theme:{}", t.as_str()),
            PreviewLayer::State(s) => format!("state:{}", s.as_str()),
            PreviewLayer::CustomCss => "css".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Text/background style of the mock control.
pub fn mock_style(preview: &FieldPreview) -> Style {
    let mut st = Style::default();
    if let Some(c) = preview.style.get("color").and_then(|v| parse_hex(v)) {
        st = st.fg(c);
    }
    if let Some(c) = preview
        .style
        .get("background-color")
        .and_then(|v| parse_hex(v))
    {
        st = st.bg(c);
    }
    if preview.is_disabled() {
        st = st.add_modifier(Modifier::DIM);
    }
    st
}

fn mock_borders(preview: &FieldPreview) -> Borders {
    let none = |k: &str| preview.style.get(k).map(|v| v.trim() == "none").unwrap_or(false);
    if !none("border") {
        Borders::ALL
    } else if preview.style.contains_key("border-bottom") && !none("border-bottom") {
        Borders::BOTTOM
    } else {
        Borders::NONE
    }
}

fn mock_text(element: ElementKind, placeholder: &str) -> String {
    match element {
        ElementKind::Checkbox => "[ ]".into(),
        ElementKind::Switch => "○━━".into(),
        ElementKind::Select { multiple: false } => format!("▾ {placeholder}"),
        ElementKind::Select { multiple: true } => format!("▾ {placeholder} (multiple)"),
        ElementKind::Choices => "( ) Option A  ( ) Option B".into(),
        ElementKind::Upload => "⇪ Drop files here".into(),
        ElementKind::Picker => "⌕ Choose…".into(),
        ElementKind::Code => "{ }".into(),
        ElementKind::Input(_) | ElementKind::Textarea => placeholder.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn draw_preview(
    f: &mut Frame,
    area: Rect,
    preview: &FieldPreview,
    label: &str,
    placeholder: &str,
    state: PreviewState,
    dark: bool,
    theme: &Theme,
) {
    let outer = panel_block_themed("Preview", false, theme);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    let header = Line::from(vec![
        Span::styled(format!("state: {}", state.as_str()), theme.text_active_bold()),
        Span::styled(
            format!("  mode: {}", if dark { "dark" } else { "light" }),
            theme.text_muted(),
        ),
        Span::styled("  p state  m mode", theme.text_muted()),
    ]);
    f.render_widget(Paragraph::new(header), rows[0]);

    let mut label_style = Style::default();
    if let Some(c) = preview.label_style.get("color").and_then(|v| parse_hex(v)) {
        label_style = label_style.fg(c);
    }
    let mut border_style = Style::default();
    if let Some(c) = preview.style.get("border-color").and_then(|v| parse_hex(v)) {
        border_style = border_style.fg(c);
    }
    let rounded = preview
        .style
        .get("border-radius")
        .map(|r| r.trim() != "0")
        .unwrap_or(false);
    let mock_block = Block::default()
        .borders(mock_borders(preview))
        .border_type(if rounded {
            BorderType::Rounded
        } else {
            BorderType::Plain
        })
        .border_style(border_style)
        .title(Span::styled(label.to_string(), label_style));
    let mock = Paragraph::new(mock_text(preview.element, placeholder))
        .style(mock_style(preview))
        .block(mock_block);
    f.render_widget(mock, rows[1]);

    let mut lines: Vec<Line> = vec![Line::from(Span::styled(
        format!("layers: {}", layer_names(&preview.layers)),
        theme.text_muted(),
    ))];
    if let Some(err) = &preview.css_error {
        lines.push(Line::from(Span::styled(
            format!("custom CSS ignored: {err}"),
            theme.text_error(),
        )));
    }
    let flags: Vec<&str> = preview
        .attributes
        .keys()
        .filter(|k| !k.starts_with("data-") && k.as_str() != "placeholder")
        .map(String::as_str)
        .collect();
    if !flags.is_empty() {
        lines.push(Line::from(format!("attrs: {}", flags.join(" "))));
    }
    lines.push(Line::from(Span::styled("style:", theme.text_muted())));
    for (k, v) in &preview.style {
        lines.push(Line::from(format!("  {k}: {v}")));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        preview.markup.clone(),
        theme.text_muted(),
    )));
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), rows[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldType;
    use crate::preview::{render_preview, PreviewInput};
    use crate::settings::AppearanceSettings;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn input(css: &str) -> PreviewInput {
        PreviewInput {
            label: "Title".into(),
            placeholder: "Enter a title".into(),
            help_text: String::new(),
            required: true,
            max_length: None,
            appearance: AppearanceSettings {
                custom_css: css.into(),
                ..Default::default()
            },
            advanced: None,
        }
    }

    #[test]
    fn disabled_preview_is_dimmed() {
        let p = render_preview(FieldType::Text, &input(""), PreviewState::Disabled, false);
        assert!(mock_style(&p).add_modifier.contains(Modifier::DIM));
        let p = render_preview(FieldType::Text, &input(""), PreviewState::Default, false);
        assert!(!mock_style(&p).add_modifier.contains(Modifier::DIM));
    }

    #[test]
    fn layer_names_follow_application_order() {
        let p = render_preview(FieldType::Text, &input("color: #fff;"), PreviewState::Hover, true);
        assert_eq!(
            layer_names(&p.layers),
            "variant:standard → theme:classic → state:hover → css"
        );
    }

    #[test]
    fn renders_mock_and_css_error() {
        let p = render_preview(FieldType::Text, &input("color red"), PreviewState::Focus, false);
        let mut terminal = Terminal::new(TestBackend::new(70, 24)).unwrap();
        let theme = Theme::default();
        terminal
            .draw(|f| {
                draw_preview(
                    f,
                    f.area(),
                    &p,
                    "Title",
                    "Enter a title",
                    PreviewState::Focus,
                    false,
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
        assert!(text.contains("Preview"));
        assert!(text.contains("state: focus"));
        assert!(text.contains("Enter a title"));
        assert!(text.contains("custom CSS ignored"));
        assert!(text.contains("attrs: required"));
    }
}
