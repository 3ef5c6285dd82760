//! The four configuration tabs of the field editor. Each tab is a form built
//! from the editor's current state; edits are pushed back on every change so
//! the preview stays live.

pub mod advanced;
pub mod appearance;
pub mod general;
pub mod validation;

use crate::css::SnippetLibrary;
use crate::field_config::{ConfigTab, FieldEditor, FieldFormError};
use crate::session::SessionEvent;
use crate::settings::AppearanceSettings;
use crate::theme::Theme;
use crate::widgets::form::FormState;
use crate::widgets::form_widget::FormWidget;
use appearance::AppearancePanel;
use ratatui::prelude::*;

pub use appearance::AppearanceTab;

pub struct ConfigPanels {
    pub general: FormWidget,
    pub validation: FormWidget,
    pub appearance: AppearancePanel,
    pub advanced: FormWidget,
    collections: Vec<(String, String)>,
}

impl ConfigPanels {
    pub fn empty() -> Self {
        Self {
            general: FormWidget::new(FormState::new("General", Vec::new())),
            validation: FormWidget::new(FormState::new("Validation", Vec::new())),
            appearance: AppearancePanel::new(&AppearanceSettings::default()),
            advanced: FormWidget::new(FormState::new("Advanced", Vec::new())),
            collections: Vec::new(),
        }
    }

    /// `collections` are `(id, name)` pairs offered as relation targets.
    pub fn set_collections(&mut self, collections: Vec<(String, String)>) {
        self.collections = collections;
    }

    /// Rebuild every tab from the editor, e.g. after opening a field or
    /// changing its type.
    pub fn rebuild(&mut self, editor: &FieldEditor) {
        self.general = FormWidget::new(general::build(&editor.general));
        let Some(session) = editor.session() else {
            return;
        };
        let settings = session.settings();
        self.validation = FormWidget::new(validation::build(&settings.validation));
        self.advanced = FormWidget::new(advanced::build(&settings.advanced, &self.collections));
        let sub = self.appearance.sub;
        self.appearance = AppearancePanel::new(&settings.appearance);
        self.appearance.set_sub(sub, &settings.appearance);
    }

    pub fn form_mut(&mut self, tab: ConfigTab) -> &mut FormWidget {
        match tab {
            ConfigTab::General => &mut self.general,
            ConfigTab::Validation => &mut self.validation,
            ConfigTab::Appearance => &mut self.appearance.form,
            ConfigTab::Advanced => &mut self.advanced,
        }
    }

    pub fn form(&self, tab: ConfigTab) -> &FormWidget {
        match tab {
            ConfigTab::General => &self.general,
            ConfigTab::Validation => &self.validation,
            ConfigTab::Appearance => &self.appearance.form,
            ConfigTab::Advanced => &self.advanced,
        }
    }

    pub fn is_editing(&self, tab: ConfigTab) -> bool {
        self.form(tab).is_editing()
    }

    /// Push the tab's form into the editor.
    pub fn apply(&mut self, tab: ConfigTab, editor: &mut FieldEditor) -> Option<SessionEvent> {
        match tab {
            ConfigTab::General => general::apply(&mut self.general.form, editor),
            ConfigTab::Validation => editor
                .session_mut()
                .map(|s| validation::apply(&mut self.validation.form, s)),
            ConfigTab::Appearance => editor.session_mut().map(|s| self.appearance.apply(s)),
            ConfigTab::Advanced => editor
                .session_mut()
                .map(|s| advanced::apply(&self.advanced.form, s)),
        }
    }

    /// Put submit errors next to their inputs.
    pub fn show_errors(&mut self, errors: &[FieldFormError]) {
        for tab in ConfigTab::ALL {
            self.form_mut(tab).form.clear_errors();
        }
        for err in errors {
            let shown = self
                .form_mut(err.tab())
                .form
                .set_error(err.key(), &err.to_string());
            if !shown {
                tracing::debug!(key = err.key(), "no input for error");
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        tab: ConfigTab,
        f: &mut Frame,
        area: Rect,
        focused: bool,
        tick: u64,
        library: &SnippetLibrary,
        theme: &Theme,
    ) {
        match tab {
            ConfigTab::Appearance => self.appearance.render(f, area, focused, tick, library, theme),
            other => self.form_mut(other).render(f, area, focused, tick),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldType;

    #[test]
    fn submit_errors_land_on_their_tabs() {
        let mut ed = FieldEditor::new("col");
        ed.select_type(FieldType::Otp).unwrap();
        let mut panels = ConfigPanels::empty();
        panels.rebuild(&ed);
        panels.validation.form.field_mut("length").unwrap().set_text("20");
        panels.apply(ConfigTab::Validation, &mut ed);
        let errors = ed.submit().unwrap_err();
        panels.show_errors(&errors);
        assert!(panels.general.form.field("name").unwrap().error.is_some());
        let otp = panels.validation.form.field("length").unwrap().error.clone();
        assert_eq!(otp.as_deref(), Some("Code length must be between 4 and 12 (got 20)"));
    }

    #[test]
    fn rebuild_keeps_the_appearance_sub_tab() {
        let mut ed = FieldEditor::new("col");
        ed.select_type(FieldType::Text).unwrap();
        let mut panels = ConfigPanels::empty();
        panels.rebuild(&ed);
        let settings = ed.session().unwrap().settings().appearance.clone();
        panels.appearance.set_sub(AppearanceTab::Theme, &settings);
        panels.rebuild(&ed);
        assert_eq!(panels.appearance.sub, AppearanceTab::Theme);
        assert!(panels.appearance.form.form.field("theme").is_some());
    }

    #[test]
    fn advanced_changes_reach_the_session() {
        let mut ed = FieldEditor::new("col");
        ed.select_type(FieldType::Date).unwrap();
        let mut panels = ConfigPanels::empty();
        panels.rebuild(&ed);
        panels.advanced.form.field_mut("dateFormat").unwrap().set_text("dd/MM/yyyy");
        let ev = panels.apply(ConfigTab::Advanced, &mut ed);
        assert!(matches!(ev, Some(SessionEvent::LocalSave { .. })));
        match &ed.session().unwrap().settings().advanced {
            crate::settings::AdvancedSettings::Date(d) => assert_eq!(d.date_format, "dd/MM/yyyy"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
