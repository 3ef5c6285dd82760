//! Appearance tab with four sub-tabs: variant, colours, theme preset and
//! custom CSS (with the snippet library).

use crate::css::{append_snippet, parse_custom_css, CssSnippet, SnippetLibrary};
use crate::session::{SessionEvent, SettingsSession};
use crate::settings::{AppearanceSettings, ColorRole, ThemePreset, UiVariant};
use crate::store::KvStore;
use crate::theme::Theme;
use crate::widgets::form::{to_json_object, FormField, FormState};
use crate::widgets::form_widget::FormWidget;
use crate::widgets::tabs::draw_tabs;
use anyhow::{bail, Result};
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState};
use serde_json::{json, Map, Value as JsonValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppearanceTab {
    Variant,
    Colors,
    Theme,
    CustomCss,
}

impl AppearanceTab {
    pub const ALL: [AppearanceTab; 4] = [
        AppearanceTab::Variant,
        AppearanceTab::Colors,
        AppearanceTab::Theme,
        AppearanceTab::CustomCss,
    ];

    pub fn title(self) -> &'static str {
        match self {
            AppearanceTab::Variant => "Variant",
            AppearanceTab::Colors => "Colors",
            AppearanceTab::Theme => "Theme",
            AppearanceTab::CustomCss => "Custom CSS",
        }
    }

    /// `'1'..='4'` picks a sub-tab.
    pub fn from_digit(c: char) -> Option<Self> {
        let idx = c.to_digit(10)? as usize;
        Self::ALL.get(idx.checked_sub(1)?).copied()
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }
}

fn build(sub: AppearanceTab, a: &AppearanceSettings) -> FormState {
    match sub {
        AppearanceTab::Variant => FormState::new(
            "Variant",
            vec![
                FormField::select(
                    "uiVariant",
                    "UI variant",
                    UiVariant::ALL
                        .iter()
                        .map(|v| (v.as_str().to_string(), v.label().to_string()))
                        .collect(),
                    a.ui_variant.as_str(),
                ),
                FormField::checkbox("floatLabel", "Floating label", a.float_label),
                FormField::checkbox("filled", "Filled background", a.filled),
                FormField::text("width", "Width", &a.width).with_hint("CSS width, e.g. 50%"),
                FormField::checkbox("showCharCount", "Show character count", a.show_char_count),
                FormField::checkbox("hidden_in_forms", "Hide in entry forms", a.hidden_in_forms),
            ],
        ),
        AppearanceTab::Colors => FormState::new(
            "Colors",
            ColorRole::ALL
                .iter()
                .map(|r| {
                    let label = match r {
                        ColorRole::Border => "Border",
                        ColorRole::Text => "Text",
                        ColorRole::Background => "Background",
                        ColorRole::Focus => "Focus",
                        ColorRole::Label => "Label",
                    };
                    FormField::color(&format!("colors.{}", r.key()), label, a.colors.get(*r))
                })
                .collect(),
        ),
        AppearanceTab::Theme => FormState::new(
            "Theme",
            vec![FormField::select(
                "theme",
                "Preset",
                ThemePreset::ALL
                    .iter()
                    .map(|t| (t.as_str().to_string(), t.label().to_string()))
                    .collect(),
                a.theme.as_str(),
            )],
        ),
        AppearanceTab::CustomCss => {
            let mut field = FormField::textarea("customCSS", "Custom CSS", &a.custom_css);
            if let Err(e) = parse_custom_css(&a.custom_css) {
                field = field.with_hint(&format!("ignored in preview: {e}"));
            }
            FormState::new("Custom CSS", vec![field])
        }
    }
}

pub struct AppearancePanel {
    pub sub: AppearanceTab,
    pub form: FormWidget,
    pub snippet_cursor: usize,
}

impl AppearancePanel {
    pub fn new(settings: &AppearanceSettings) -> Self {
        Self {
            sub: AppearanceTab::Variant,
            form: FormWidget::new(build(AppearanceTab::Variant, settings)),
            snippet_cursor: 0,
        }
    }

    pub fn set_sub(&mut self, sub: AppearanceTab, settings: &AppearanceSettings) {
        self.sub = sub;
        self.rebuild(settings);
    }

    pub fn rebuild(&mut self, settings: &AppearanceSettings) {
        self.form = FormWidget::new(build(self.sub, settings));
    }

    /// Push the current sub-form into the session.
    pub fn apply(&mut self, session: &mut SettingsSession) -> SessionEvent {
        let mut partial = to_json_object(&self.form.form);
        if self.sub == AppearanceTab::Colors {
            // keep colour keys this form does not know about
            let current = session.bucket_json(crate::settings::SettingsBucket::Appearance);
            let mut colors: Map<String, JsonValue> = current
                .get("colors")
                .and_then(|c| c.as_object())
                .cloned()
                .unwrap_or_default();
            if let Some(edited) = partial.get("colors").and_then(|c| c.as_object()) {
                for (k, v) in edited {
                    colors.insert(k.clone(), v.clone());
                }
            }
            partial = json!({ "colors": colors });
        }
        let ev = session.update_appearance(&partial);
        if self.sub == AppearanceTab::CustomCss {
            self.refresh_css_hint(&session.settings().appearance.custom_css);
        }
        ev
    }

    fn refresh_css_hint(&mut self, css: &str) {
        if let Some(f) = self.form.form.field_mut("customCSS") {
            f.hint = parse_custom_css(css)
                .err()
                .map(|e| format!("ignored in preview: {e}"));
        }
    }

    /// Append a snippet to the field's custom CSS.
    pub fn apply_snippet(
        &mut self,
        session: &mut SettingsSession,
        snippet: &CssSnippet,
    ) -> SessionEvent {
        let css = append_snippet(&session.settings().appearance.custom_css, &snippet.value);
        let ev = session.update_appearance(&json!({ "customCSS": css }));
        if self.sub == AppearanceTab::CustomCss {
            self.form.set_text("customCSS", &css);
            self.refresh_css_hint(&css);
        }
        ev
    }

    /// Save the current custom CSS as a new user snippet named "Custom N".
    pub fn save_snippet(
        &self,
        session: &SettingsSession,
        library: &mut SnippetLibrary,
        store: &mut dyn KvStore,
    ) -> Result<CssSnippet> {
        let css = session.settings().appearance.custom_css.trim().to_string();
        if css.is_empty() {
            bail!("Nothing to save: custom CSS is empty");
        }
        let name = format!("Custom {}", library.user_snippets().len() + 1);
        library.save(store, &name, &css)
    }

    /// Delete the snippet under the cursor. Built-ins cannot be deleted.
    pub fn delete_snippet(
        &mut self,
        library: &mut SnippetLibrary,
        store: &mut dyn KvStore,
    ) -> Result<CssSnippet> {
        let all = library.all();
        let Some(target) = all.get(self.snippet_cursor).cloned() else {
            bail!("No snippet selected");
        };
        if !library.user_snippets().iter().any(|s| s.id == target.id) {
            bail!("Built-in snippets cannot be deleted");
        }
        library.delete(store, &target.id)?;
        let remaining = library.all().len();
        self.snippet_cursor = self.snippet_cursor.min(remaining.saturating_sub(1));
        Ok(target)
    }

    pub fn move_snippet(&mut self, delta: i32, len: usize) {
        if len == 0 {
            self.snippet_cursor = 0;
            return;
        }
        let cur = self.snippet_cursor as i64 + i64::from(delta);
        self.snippet_cursor = cur.clamp(0, len as i64 - 1) as usize;
    }

    pub fn selected_snippet(&self, library: &SnippetLibrary) -> Option<CssSnippet> {
        library.all().get(self.snippet_cursor).cloned()
    }

    pub fn render(
        &mut self,
        f: &mut Frame,
        area: Rect,
        focused: bool,
        tick: u64,
        library: &SnippetLibrary,
        theme: &Theme,
    ) {
        let snippets_h = if self.sub == AppearanceTab::CustomCss { 9 } else { 0 };
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(4),
                Constraint::Length(snippets_h),
            ])
            .split(area);
        let titles: Vec<&str> = AppearanceTab::ALL.iter().map(|t| t.title()).collect();
        draw_tabs(f, rows[0], &titles, &["1", "2", "3", "4"], self.sub.index(), theme);
        self.form.render(f, rows[1], focused, tick);
        if self.sub != AppearanceTab::CustomCss {
            return;
        }

        let user_ids: Vec<&str> = library.user_snippets().iter().map(|s| s.id.as_str()).collect();
        let items: Vec<ListItem> = library
            .all()
            .into_iter()
            .map(|s| {
                let tag = if user_ids.contains(&s.id.as_str()) { "user" } else { "built-in" };
                ListItem::new(Line::from(vec![
                    Span::raw(s.name.clone()),
                    Span::styled(format!("  [{tag}] {}", s.value), theme.text_muted()),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(crate::widgets::chrome::panel_block_themed(
                "Snippets  [ ] move  a apply  s save  x delete  y copy",
                false,
                theme,
            ))
            .highlight_style(theme.list_cursor_style())
            .highlight_symbol("› ");
        let mut state = ListState::default();
        state.select(Some(self.snippet_cursor));
        f.render_stateful_widget(list, rows[2], &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::builtin_snippets;
    use crate::model::{Field, FieldType};
    use crate::settings::SettingsBucket;
    use crate::store::MemoryStore;
    use crate::widgets::form::{handle_key, FormOutcome};
    use crossterm::event::KeyCode;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn session() -> SettingsSession {
        let mut f = Field {
            id: "f1".into(),
            name: "Title".into(),
            field_type: FieldType::Text,
            ..Default::default()
        };
        f.settings
            .appearance
            .insert("colors".into(), json!({"border": "#111", "accent2": "#abc"}));
        SettingsSession::open("col", &f)
    }

    #[test]
    fn digits_pick_sub_tabs() {
        assert_eq!(AppearanceTab::from_digit('1'), Some(AppearanceTab::Variant));
        assert_eq!(AppearanceTab::from_digit('4'), Some(AppearanceTab::CustomCss));
        assert_eq!(AppearanceTab::from_digit('0'), None);
        assert_eq!(AppearanceTab::from_digit('5'), None);
    }

    #[test]
    fn colors_form_keeps_unknown_colour_keys() {
        let mut s = session();
        let mut p = AppearancePanel::new(&s.settings().appearance);
        p.set_sub(AppearanceTab::Colors, &s.settings().appearance);
        assert_eq!(p.form.form.text("colors.border"), "#111");
        p.form.form.field_mut("colors.text").unwrap().set_text("#222222");
        p.apply(&mut s);
        let colors = &s.bucket_json(SettingsBucket::Appearance)["colors"];
        assert_eq!(colors["border"], json!("#111"));
        assert_eq!(colors["text"], json!("#222222"));
        assert_eq!(colors["accent2"], json!("#abc"));
    }

    #[test]
    fn variant_select_updates_the_session() {
        let mut s = session();
        let mut p = AppearancePanel::new(&s.settings().appearance);
        assert_eq!(
            handle_key(&mut p.form.form, KeyCode::Right),
            FormOutcome::Changed("uiVariant".into())
        );
        p.apply(&mut s);
        assert_eq!(s.settings().appearance.ui_variant, UiVariant::ALL[1]);
    }

    #[test]
    fn snippets_append_and_save() {
        let mut s = session();
        let mut store = MemoryStore::default();
        let mut lib = SnippetLibrary::load(&mut store);
        let mut p = AppearancePanel::new(&s.settings().appearance);

        assert!(p.save_snippet(&s, &mut lib, &mut store).is_err());

        p.set_sub(AppearanceTab::CustomCss, &s.settings().appearance);
        let rounded = builtin_snippets()[0].clone();
        p.apply_snippet(&mut s, &rounded);
        p.apply_snippet(&mut s, &rounded);
        assert_eq!(
            s.settings().appearance.custom_css,
            "border-radius: 12px;\nborder-radius: 12px;"
        );
        assert_eq!(p.form.form.text("customCSS"), s.settings().appearance.custom_css);

        let saved = p.save_snippet(&s, &mut lib, &mut store).unwrap();
        assert_eq!(saved.name, "Custom 1");
        assert_eq!(lib.user_snippets().len(), 1);
    }

    #[test]
    fn only_user_snippets_can_be_deleted() {
        let mut store = MemoryStore::default();
        let mut lib = SnippetLibrary::load(&mut store);
        lib.save(&mut store, "Mine", "color: #c00;").unwrap();
        let s = session();
        let mut p = AppearancePanel::new(&s.settings().appearance);

        p.snippet_cursor = 0;
        assert!(p.delete_snippet(&mut lib, &mut store).is_err());

        let len = lib.all().len();
        p.move_snippet(100, len);
        assert_eq!(p.snippet_cursor, len - 1);
        let gone = p.delete_snippet(&mut lib, &mut store).unwrap();
        assert_eq!(gone.name, "Mine");
        assert!(lib.user_snippets().is_empty());
        assert_eq!(p.snippet_cursor, len - 2);
    }

    #[test]
    fn bad_css_is_hinted_on_the_field() {
        let mut s = session();
        let mut p = AppearancePanel::new(&s.settings().appearance);
        p.set_sub(AppearanceTab::CustomCss, &s.settings().appearance);
        p.form.set_text("customCSS", "color red");
        p.apply(&mut s);
        let hint = p.form.form.field("customCSS").unwrap().hint.clone().unwrap();
        assert!(hint.starts_with("ignored in preview"));
    }

    #[test]
    fn renders_sub_tabs_and_snippets() {
        let s = session();
        let mut store = MemoryStore::default();
        let lib = SnippetLibrary::load(&mut store);
        let mut p = AppearancePanel::new(&s.settings().appearance);
        p.set_sub(AppearanceTab::CustomCss, &s.settings().appearance);
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let theme = Theme::default();
        terminal
            .draw(|f| p.render(f, f.area(), true, 0, &lib, &theme))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("[4] Custom CSS"));
        assert!(text.contains("Rounded corners"));
    }
}
