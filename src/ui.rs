use crate::app::modals::Modal;
use crate::app::{help_text, toast, update, AppMsg, Effect};
use crate::components::{ComponentLibrary, PendingDelete};
use crate::config::{load_config, AppConfig};
use crate::css::SnippetLibrary;
use crate::expenses::ExpenseBook;
use crate::field_config::{ConfigTab, EditorMode, FieldEditor};
use crate::model::{Collection, ContentEntry, Field, FieldType};
use crate::panels::ConfigPanels;
use crate::preview::{render_preview, PreviewInput, PreviewState};
use crate::services::backend::{build_backend, SharedBackend};
use crate::services::jobs::{spawn_job, JobMsg, JobRequest};
use crate::services::memory::InMemoryBackend;
use crate::settings::ValidationSettings;
use crate::store::{FileStore, KvStore, MemoryStore};
use crate::theme::Theme;
use crate::widgets::chrome::{centered_rect, panel_block_themed};
use crate::widgets::preview_view::draw_preview;
use crate::widgets::status_bar::{draw_help, draw_status};
use crate::widgets::tabs::draw_tabs;
use anyhow::Result;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

pub struct Toast {
    pub text: String,
    pub level: ToastLevel,
    pub expires_at_tick: u64,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Section {
    #[default]
    Fields,
    Components,
    Expenses,
    Debug,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Fields,
        Section::Components,
        Section::Expenses,
        Section::Debug,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Fields => "Fields",
            Section::Components => "Components",
            Section::Expenses => "Expenses",
            Section::Debug => "Debug",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Where the Fields section is: browsing down to one field's editor.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum View {
    #[default]
    Collections,
    Fields,
    TypePicker,
    Editor,
    Content,
}

pub(crate) enum Confirm {
    DeleteField { name: String },
    DeleteComponent(PendingDelete),
    RemoveExpense { id: String, description: String },
}

impl Confirm {
    pub fn prompt(&self) -> String {
        match self {
            Confirm::DeleteField { name } => format!("Delete field '{name}' from the collection?"),
            Confirm::DeleteComponent(p) => format!("Delete component '{}'?", p.name),
            Confirm::RemoveExpense { description, .. } => {
                format!("Remove expense '{description}'?")
            }
        }
    }
}

pub(crate) struct AppState {
    pub(crate) config: AppConfig,
    pub(crate) theme: Theme,
    pub(crate) backend: SharedBackend,
    pub(crate) store: Box<dyn KvStore>,
    pub(crate) tx: Option<Sender<JobMsg>>,
    pub(crate) rx: Option<Receiver<JobMsg>>,
    pub(crate) section: Section,
    pub(crate) view: View,
    pub(crate) collections: Vec<Collection>,
    pub(crate) collection_cursor: usize,
    pub(crate) current_collection: Option<String>,
    pub(crate) fields: Vec<Field>,
    pub(crate) field_cursor: usize,
    pub(crate) content: Vec<ContentEntry>,
    pub(crate) content_cursor: usize,
    pub(crate) type_cursor: usize,
    pub(crate) editor: FieldEditor,
    pub(crate) panels: ConfigPanels,
    pub(crate) preview_state: PreviewState,
    pub(crate) preview_dark: bool,
    pub(crate) snippets: SnippetLibrary,
    pub(crate) components: ComponentLibrary,
    pub(crate) component_cursor: usize,
    pub(crate) component_query: String,
    pub(crate) query_editing: bool,
    pub(crate) component_category: Option<String>,
    pub(crate) expenses: ExpenseBook,
    pub(crate) expense_cursor: usize,
    pub(crate) modal: Option<Modal>,
    pub(crate) confirm: Option<Confirm>,
    pub(crate) in_flight: usize,
    pub(crate) toast: Option<Toast>,
    pub(crate) tick: u64,
    // Debug log (rendered in the Debug section)
    pub(crate) debug_log: VecDeque<String>,
    pub(crate) should_quit: bool,
}

impl Default for AppState {
    fn default() -> Self {
        let mut store: Box<dyn KvStore> = Box::new(MemoryStore::default());
        let snippets = SnippetLibrary::load(store.as_mut());
        Self {
            config: AppConfig::default(),
            theme: Theme::default(),
            backend: Arc::new(InMemoryBackend::seeded()),
            store,
            tx: None,
            rx: None,
            section: Section::default(),
            view: View::default(),
            collections: Vec::new(),
            collection_cursor: 0,
            current_collection: None,
            fields: Vec::new(),
            field_cursor: 0,
            content: Vec::new(),
            content_cursor: 0,
            type_cursor: 0,
            editor: FieldEditor::new(""),
            panels: ConfigPanels::empty(),
            preview_state: PreviewState::default(),
            preview_dark: false,
            snippets,
            components: ComponentLibrary::default(),
            component_cursor: 0,
            component_query: String::new(),
            query_editing: false,
            component_category: None,
            expenses: ExpenseBook::default(),
            expense_cursor: 0,
            modal: None,
            confirm: None,
            in_flight: 0,
            toast: None,
            tick: 0,
            debug_log: VecDeque::new(),
            should_quit: false,
        }
    }
}

impl AppState {
    pub fn dbg(&mut self, msg: impl Into<String>) {
        const MAX_LOG_LINES: usize = 200;
        if self.debug_log.len() >= MAX_LOG_LINES {
            self.debug_log.pop_front();
        }
        self.debug_log.push_back(msg.into());
    }
}

/// Ids of the components the list currently shows, in display order.
pub(crate) fn visible_components(state: &AppState) -> Vec<String> {
    state
        .components
        .filter(&state.component_query, state.component_category.as_deref())
        .iter()
        .map(|c| c.id.clone())
        .collect()
}

pub(crate) fn run_effects(state: &mut AppState, effects: Vec<Effect>) {
    for eff in effects {
        match eff {
            Effect::RunJob(req) => {
                state.dbg(format!("job: {}", req.label()));
                tracing::debug!(job = req.label(), "dispatching backend job");
                if let Some(tx) = &state.tx {
                    state.in_flight += 1;
                    spawn_job(state.backend.clone(), req, tx.clone());
                }
            }
            Effect::ShowToast {
                text,
                level,
                seconds,
            } => {
                let ticks = seconds.saturating_mul(5); // ~200ms tick
                state.toast = Some(Toast {
                    text,
                    level,
                    expires_at_tick: state.tick.saturating_add(ticks),
                });
            }
            Effect::CopyToClipboard(text) => {
                let copied = arboard::Clipboard::new().and_then(|mut c| c.set_text(text));
                let eff = match copied {
                    Ok(()) => toast("Copied to clipboard", ToastLevel::Success),
                    Err(e) => {
                        tracing::warn!(error = %e, "clipboard unavailable");
                        toast(format!("Clipboard unavailable: {e}"), ToastLevel::Error)
                    }
                };
                run_effects(state, vec![eff]);
            }
            Effect::Quit => state.should_quit = true,
        }
    }
}

fn drain_jobs(state: &mut AppState) {
    let msgs: Vec<JobMsg> = match &state.rx {
        Some(rx) => rx.try_iter().collect(),
        None => Vec::new(),
    };
    for msg in msgs {
        let effects = update(state, AppMsg::Job(msg));
        run_effects(state, effects);
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"))
        .unwrap_or(false)
}

pub fn run() -> Result<()> {
    let config = load_config()?;
    if let Err(e) = crate::logging::init(&config.data_dir) {
        eprintln!("file logging disabled: {e:#}");
    }
    let backend = build_backend(&config.backend)?;
    let mut store: Box<dyn KvStore> = Box::new(FileStore::open(&config.data_dir)?);
    let components = ComponentLibrary::load(store.as_mut());
    let expenses = ExpenseBook::load(store.as_mut());
    let snippets = SnippetLibrary::load(store.as_mut());
    tracing::info!(
        backend = backend.name(),
        components = components.list().len(),
        snippets = snippets.user_snippets().len(),
        "state loaded"
    );
    let (tx, rx) = mpsc::channel::<JobMsg>();
    let mut state = AppState {
        theme: Theme::from_mode(config.theme),
        config,
        backend,
        store,
        components,
        expenses,
        snippets,
        tx: Some(tx),
        rx: Some(rx),
        ..Default::default()
    };
    run_effects(&mut state, vec![Effect::RunJob(JobRequest::FetchCollections)]);

    // Headless smoke mode
    if env_flag("CMS_TUI_HEADLESS") {
        let ticks: u64 = std::env::var("CMS_TUI_TICKS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(100, 30))?;
        let tick_rate = Duration::from_millis(200);
        for _ in 0..ticks {
            terminal.draw(|f| ui(f, &mut state))?;
            drain_jobs(&mut state);
            state.tick = state.tick.wrapping_add(1);
            std::thread::sleep(tick_rate);
        }
        if env_flag("CMS_TUI_SMOKE_SUMMARY") {
            let summary = serde_json::json!({
                "ok": !matches!(state.toast, Some(Toast { level: ToastLevel::Error, .. })),
                "backend": state.backend.name(),
                "section": state.section.title(),
                "view": format!("{:?}", state.view),
                "collections": state.collections.len(),
                "fields": state.fields.len(),
                "in_flight": state.in_flight,
            });
            println!("{summary}");
        }
        return Ok(());
    }

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    let res = event_loop(&mut terminal, &mut state);
    // Restore
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    tracing::info!("field studio exiting");
    res
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, state: &mut AppState) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();
    while !state.should_quit {
        terminal.draw(|f| ui(f, state))?;
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                let effects = update(state, AppMsg::Key(key));
                run_effects(state, effects);
            }
        }
        drain_jobs(state);
        if last_tick.elapsed() >= tick_rate {
            state.tick = state.tick.wrapping_add(1);
            last_tick = Instant::now();
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, state: &mut AppState) {
    // Clear expired toast
    if let Some(t) = &state.toast {
        if state.tick >= t.expires_at_tick {
            state.toast = None;
        }
    }
    let screen = f.area();
    f.render_widget(
        Block::default().style(Style::default().bg(state.theme.bg).fg(state.theme.fg)),
        screen,
    );
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(screen);

    let titles: Vec<&str> = Section::ALL.iter().map(|s| s.title()).collect();
    draw_tabs(f, chunks[0], &titles, &[], state.section.index(), &state.theme);

    let main = chunks[1];
    match state.section {
        Section::Fields => match state.view {
            View::Collections => draw_collections(f, main, state),
            View::Fields => draw_fields(f, main, state),
            View::TypePicker => draw_type_picker(f, main, state),
            View::Editor => draw_editor(f, main, state),
            View::Content => draw_content(f, main, state),
        },
        Section::Components => draw_components(f, main, state),
        Section::Expenses => draw_expenses(f, main, state),
        Section::Debug => draw_debug(f, main, state),
    }

    draw_status(f, chunks[2], state);
    draw_help(f, chunks[3], &help_text(state), &state.theme);

    if let Some(modal) = state.modal.as_mut() {
        let area = centered_rect(60, 60, screen);
        f.render_widget(Clear, area);
        modal.widget.render(f, area, true, state.tick);
    }
    if let Some(confirm) = &state.confirm {
        draw_confirm(f, screen, confirm, &state.theme);
    }
}

fn draw_list(
    f: &mut Frame,
    area: Rect,
    title: &str,
    items: Vec<ListItem>,
    selected: usize,
    theme: &Theme,
) {
    let empty = items.is_empty();
    let list = List::new(items)
        .block(panel_block_themed(title, true, theme))
        .highlight_style(theme.list_cursor_style())
        .highlight_symbol("▸ ");
    let mut ls = ListState::default();
    if !empty {
        ls.select(Some(selected));
    }
    f.render_stateful_widget(list, area, &mut ls);
}

fn loading_line(state: &AppState, what: &str) -> ListItem<'static> {
    let text = if state.in_flight > 0 {
        format!("loading {what}…")
    } else {
        format!("no {what}")
    };
    ListItem::new(Span::styled(text, state.theme.text_muted()))
}

fn draw_collections(f: &mut Frame, area: Rect, state: &AppState) {
    let mut items: Vec<ListItem> = state
        .collections
        .iter()
        .map(|c| {
            ListItem::new(Line::from(vec![
                Span::raw(c.name.clone()),
                Span::styled(format!("  {}", c.api_id), state.theme.text_muted()),
            ]))
        })
        .collect();
    if items.is_empty() {
        items.push(loading_line(state, "collections"));
    }
    draw_list(f, area, "Collections", items, state.collection_cursor, &state.theme);
}

fn collection_name(state: &AppState) -> String {
    let id = state.current_collection.as_deref().unwrap_or_default();
    state
        .collections
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn draw_fields(f: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    let mut items: Vec<ListItem> = state
        .fields
        .iter()
        .map(|fld| {
            let mut spans = vec![
                Span::raw(fld.name.clone()),
                Span::styled(format!("  {}", fld.field_type.label()), state.theme.text_muted()),
            ];
            if fld.required {
                spans.push(Span::styled(" *", state.theme.text_error()));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    if items.is_empty() {
        items.push(loading_line(state, "fields"));
    }
    let title = format!("Fields · {}", collection_name(state));
    draw_list(f, cols[0], &title, items, state.field_cursor, &state.theme);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(fld) = state.fields.get(state.field_cursor) {
        let row = |k: &str, v: String| {
            Line::from(vec![
                Span::styled(format!("{k:<12}"), state.theme.text_muted()),
                Span::raw(v),
            ])
        };
        lines.push(row("API id", fld.api_id.clone()));
        lines.push(row("Type", fld.type_tag().to_string()));
        lines.push(row("Required", if fld.required { "yes" } else { "no" }.into()));
        if !fld.description.is_empty() {
            lines.push(row("Description", fld.description.clone()));
        }
        if !fld.help_text.is_empty() {
            lines.push(row("Help", fld.help_text.clone()));
        }
    }
    let p = Paragraph::new(lines)
        .block(panel_block_themed("Details", false, &state.theme))
        .wrap(Wrap { trim: true });
    f.render_widget(p, cols[1]);
}

fn draw_type_picker(f: &mut Frame, area: Rect, state: &AppState) {
    let mut lines: Vec<Line> = Vec::new();
    let mut cursor_line = 0usize;
    let mut group = None;
    for (i, ft) in FieldType::ALL.iter().enumerate() {
        if group != Some(ft.group()) {
            group = Some(ft.group());
            lines.push(Line::from(Span::styled(
                ft.group().label().to_string(),
                state.theme.text_active_bold(),
            )));
        }
        let selected = i == state.type_cursor;
        if selected {
            cursor_line = lines.len();
        }
        let style = if selected {
            state.theme.list_cursor_style()
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(ft.label().to_string(), style),
            Span::styled(format!("  {}", ft.tag()), state.theme.text_muted()),
        ]));
    }
    let inner_h = area.height.saturating_sub(2) as usize;
    let scroll = cursor_line.saturating_sub(inner_h.saturating_sub(1));
    let p = Paragraph::new(lines)
        .block(panel_block_themed("Choose a field type", true, &state.theme))
        .scroll((scroll as u16, 0));
    f.render_widget(p, area);
}

fn editor_title(state: &AppState) -> String {
    match state.editor.mode() {
        EditorMode::ConfiguringNew { field_type } => format!("New {} field", field_type.label()),
        EditorMode::EditingExisting { .. } => format!("Editing '{}'", state.editor.general.name),
        EditorMode::Browsing => "No field selected".into(),
    }
}

fn draw_editor(f: &mut Frame, area: Rect, state: &mut AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(2), Constraint::Min(0)])
        .split(area);
    f.render_widget(
        Paragraph::new(Span::styled(editor_title(state), state.theme.text_active_bold())),
        rows[0],
    );
    let titles: Vec<&str> = ConfigTab::ALL.iter().map(|t| t.title()).collect();
    draw_tabs(f, rows[1], &titles, &[], state.editor.tab.index(), &state.theme);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(rows[2]);
    let focused = state.confirm.is_none() && state.modal.is_none();
    state.panels.render(
        state.editor.tab,
        f,
        cols[0],
        focused,
        state.tick,
        &state.snippets,
        &state.theme,
    );

    let (Some(field_type), Some(session)) = (state.editor.field_type(), state.editor.session())
    else {
        return;
    };
    let settings = session.settings();
    let general = &state.editor.general;
    let max_length = match &settings.validation {
        ValidationSettings::Text(t) => t.max_length,
        _ => None,
    };
    let input = PreviewInput {
        label: general.name.clone(),
        placeholder: general.placeholder.clone(),
        help_text: general.help_text.clone(),
        required: general.required,
        max_length,
        appearance: settings.appearance.clone(),
        advanced: Some(settings.advanced.clone()),
    };
    let preview = render_preview(field_type, &input, state.preview_state, state.preview_dark);
    draw_preview(
        f,
        cols[1],
        &preview,
        &input.label,
        &input.placeholder,
        state.preview_state,
        state.preview_dark,
        &state.theme,
    );
}

fn draw_content(f: &mut Frame, area: Rect, state: &AppState) {
    let mut items: Vec<ListItem> = state
        .content
        .iter()
        .map(|e| {
            let when = e.updated_at.clone().or_else(|| e.created_at.clone());
            let mut spans = vec![Span::raw(e.title())];
            if let Some(w) = when {
                spans.push(Span::styled(format!("  {w}"), state.theme.text_muted()));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    if items.is_empty() {
        items.push(loading_line(state, "entries"));
    }
    let title = format!("Content · {}", collection_name(state));
    draw_list(f, area, &title, items, state.content_cursor, &state.theme);
}

fn draw_components(f: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    let query_style = if state.query_editing {
        state.theme.text_editing_bold()
    } else {
        state.theme.text_muted()
    };
    let filter = Line::from(vec![
        Span::styled("search: ", state.theme.text_muted()),
        Span::styled(
            if state.query_editing {
                format!("{}_", state.component_query)
            } else {
                state.component_query.clone()
            },
            query_style,
        ),
        Span::styled(
            format!(
                "   category: {}",
                state.component_category.as_deref().unwrap_or("all")
            ),
            state.theme.text_muted(),
        ),
    ]);
    f.render_widget(Paragraph::new(filter), rows[0]);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    let visible = state
        .components
        .filter(&state.component_query, state.component_category.as_deref());
    let mut items: Vec<ListItem> = visible
        .iter()
        .map(|c| {
            let mut spans = vec![Span::raw(c.name.clone())];
            if !c.category.is_empty() {
                spans.push(Span::styled(format!("  [{}]", c.category), state.theme.text_muted()));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    if items.is_empty() {
        items.push(ListItem::new(Span::styled(
            "no components (n to create one)",
            state.theme.text_muted(),
        )));
    }
    draw_list(f, cols[0], "Components", items, state.component_cursor, &state.theme);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(c) = visible.get(state.component_cursor) {
        if !c.description.is_empty() {
            lines.push(Line::raw(c.description.clone()));
            lines.push(Line::raw(""));
        }
        for fld in &c.fields {
            lines.push(Line::from(vec![
                Span::raw(format!("{:<20}", fld.name)),
                Span::styled(fld.field_type.label().to_string(), state.theme.text_muted()),
                Span::styled(if fld.required { " *" } else { "" }, state.theme.text_error()),
            ]));
        }
        if let Some(at) = c.last_updated {
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(
                format!("updated {}", at.format("%Y-%m-%d %H:%M")),
                state.theme.text_muted(),
            )));
        }
    }
    let p = Paragraph::new(lines)
        .block(panel_block_themed("Fields", false, &state.theme))
        .wrap(Wrap { trim: true });
    f.render_widget(p, cols[1]);
}

fn draw_expenses(f: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    let book = &state.expenses;
    let mut items: Vec<ListItem> = book
        .expenses
        .iter()
        .map(|e| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", e.date.format("%Y-%m-%d")), state.theme.text_muted()),
                Span::raw(format!("{:<24}", e.description)),
                Span::raw(format!("{:>10.2}", e.amount)),
                Span::styled(
                    format!("  paid by {}", book.name_of(&e.paid_by)),
                    state.theme.text_muted(),
                ),
            ]))
        })
        .collect();
    if items.is_empty() {
        items.push(ListItem::new(Span::styled(
            "no expenses (p adds a person, n an expense)",
            state.theme.text_muted(),
        )));
    }
    draw_list(f, cols[0], "Expenses", items, state.expense_cursor, &state.theme);

    let mut lines: Vec<Line> = vec![Line::from(Span::styled(
        "Balances",
        state.theme.text_active_bold(),
    ))];
    for (id, balance) in book.balances() {
        let style = if balance < 0.0 {
            state.theme.text_error()
        } else {
            Style::default().fg(state.theme.success)
        };
        lines.push(Line::from(vec![
            Span::raw(format!("{:<16}", book.name_of(&id))),
            Span::styled(format!("{balance:>10.2}"), style),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled("Settle up", state.theme.text_active_bold())));
    let settlements = book.settlements();
    if settlements.is_empty() {
        lines.push(Line::from(Span::styled("all square", state.theme.text_muted())));
    }
    for s in settlements {
        lines.push(Line::raw(format!(
            "{} pays {} {:.2}",
            book.name_of(&s.from),
            book.name_of(&s.to),
            s.amount
        )));
    }
    let p = Paragraph::new(lines).block(panel_block_themed("Summary", false, &state.theme));
    f.render_widget(p, cols[1]);
}

fn draw_debug(f: &mut Frame, area: Rect, state: &AppState) {
    let b = panel_block_themed("Debug", false, &state.theme);
    // Take the last lines that fit
    let h = area.height.saturating_sub(2) as usize;
    let start = state.debug_log.len().saturating_sub(h);
    let lines: Vec<Line> = state
        .debug_log
        .iter()
        .skip(start)
        .map(|s| Line::raw(s.clone()))
        .collect();
    let p = Paragraph::new(lines)
        .style(state.theme.text_muted())
        .block(b)
        .wrap(Wrap { trim: true });
    f.render_widget(p, area);
}

fn draw_confirm(f: &mut Frame, screen: Rect, confirm: &Confirm, theme: &Theme) {
    let area = centered_rect(50, 20, screen);
    f.render_widget(Clear, area);
    let p = Paragraph::new(vec![
        Line::raw(confirm.prompt()),
        Line::raw(""),
        Line::from(Span::styled("y confirm   n cancel", theme.text_muted())),
    ])
    .block(panel_block_themed("Confirm", true, theme))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(p, area);
}
