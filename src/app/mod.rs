use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    self as term, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;
use strum::IntoEnumIterator;

use crate::catalog::{Category, Hunt};
use crate::config::{AppConfig, Palette};
use crate::engine::SortKey;
use crate::presets::{FilterPreset, PresetStore};
use crate::ui::views::{ChipKind, Views};
use crate::ui::{self, Chrome};

pub mod debounce;
pub mod observer;
pub mod state;

use self::debounce::ScheduledTask;
pub use self::observer::{Observer, ObserverHandle, ObserverRegistry};
pub use self::state::{ActiveFilter, AppState, Changes, PageSizeTiers, SummaryStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Grid,
    Filters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Browse,
    Search,
    PresetLabel,
}

enum Action {
    Quit,
    StartSearch,
    CycleCategory,
    ToggleFocus,
    Left,
    Right,
    SelectNext,
    SelectPrevious,
    ToggleChip,
    ClearTactics,
    ClearTags,
    ClearAll,
    CycleSortKey,
    FlipSortDirection,
    OpenModal,
    CyclePreset,
    SavePreset,
    DeletePreset,
}

pub struct App {
    pub config: Arc<AppConfig>,
    presets: PresetStore,
    state: AppState,
    views: Views,
    list_state: ListState,
    focus: FocusPane,
    mode: InputMode,
    selected: usize,
    chip_cursor: usize,
    search_input: String,
    search_task: ScheduledTask<String>,
    preset_input: String,
    active_preset: Option<FilterPreset>,
    status: Option<String>,
    palette: Palette,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, hunts: Vec<Hunt>, presets: PresetStore) -> Self {
        let mut state = AppState::new(hunts)
            .with_page_size_tiers(config.viewport.tiers())
            .with_sort(config.default_sort);
        let views = Views::attach(&mut state);
        let status = if state.total_count() == 0 {
            Some("Dataset is empty".to_string())
        } else {
            Some(format!(
                "Loaded {} hunts • / search • Tab filters • q quit",
                state::format_count(state.total_count())
            ))
        };
        Self {
            search_task: ScheduledTask::new(config.search.debounce()),
            palette: config.palette(),
            config,
            presets,
            state,
            views,
            list_state: ListState::default(),
            focus: FocusPane::Grid,
            mode: InputMode::Browse,
            selected: 0,
            chip_cursor: 0,
            search_input: String::new(),
            preset_input: String::new(),
            active_preset: None,
            status,
            should_quit: false,
            tick_rate: Duration::from_millis(250),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn views(&self) -> &Views {
        &self.views
    }

    pub fn focus(&self) -> FocusPane {
        self.focus
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        if let Ok((columns, _)) = term::size() {
            self.on_resize(columns);
        }
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        self.views.detach(&mut self.state);
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            self.clamp_selection();
            terminal
                .draw(|frame| {
                    let chrome = Chrome {
                        focus: self.focus,
                        mode: self.mode,
                        search_input: &self.search_input,
                        preset_input: &self.preset_input,
                        chip_cursor: self.chip_cursor,
                        active_preset: self.active_preset.as_ref().map(|preset| preset.label.as_str()),
                        status: self.status.as_deref(),
                        palette: &self.palette,
                    };
                    ui::draw_app(frame, &self.views, &chrome, &mut self.list_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let now = Instant::now();
            let mut timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));
            if let Some(due) = self.search_task.time_until_due(now) {
                timeout = timeout.min(due);
            }

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(columns, _) => self.on_resize(columns),
                    _ => {}
                }
            }

            self.on_tick(Instant::now());
            if last_tick.elapsed() >= self.tick_rate {
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    pub fn on_resize(&mut self, columns: u16) {
        let width = self.config.viewport.width_for_columns(columns);
        self.state.set_viewport_width(width);
    }

    /// Apply a debounced search once its delay has elapsed.
    pub fn on_tick(&mut self, now: Instant) {
        if let Some(query) = self.search_task.poll(now) {
            self.apply_search(&query);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        if self.views.modal.is_open() {
            self.handle_modal_key(key);
            return;
        }
        match self.mode {
            InputMode::Search => {
                self.handle_search_key(key);
                return;
            }
            InputMode::PresetLabel => {
                self.handle_preset_label_key(key);
                return;
            }
            InputMode::Browse => {}
        }

        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);
        let action = match key.code {
            KeyCode::Char('q') if plain => Some(Action::Quit),
            KeyCode::Char('/') if plain => Some(Action::StartSearch),
            KeyCode::Char('c') if plain => Some(Action::CycleCategory),
            KeyCode::Tab => Some(Action::ToggleFocus),
            KeyCode::Left | KeyCode::Char('h') => Some(Action::Left),
            KeyCode::Right | KeyCode::Char('l') => Some(Action::Right),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::SelectNext),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::SelectPrevious),
            KeyCode::Char(' ') => Some(Action::ToggleChip),
            KeyCode::Char('T') => Some(Action::ClearTactics),
            KeyCode::Char('G') => Some(Action::ClearTags),
            KeyCode::Char('x') if plain => Some(Action::ClearAll),
            KeyCode::Char('s') if plain => Some(Action::CycleSortKey),
            KeyCode::Char('S') => Some(Action::FlipSortDirection),
            KeyCode::Enter => Some(Action::OpenModal),
            KeyCode::Char('p') if plain => Some(Action::CyclePreset),
            KeyCode::Char('P') => Some(Action::SavePreset),
            KeyCode::Char('D') => Some(Action::DeletePreset),
            _ => None,
        };

        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::StartSearch => {
                self.mode = InputMode::Search;
                self.search_input = self.state.search_query().to_string();
                self.set_status("Type to search • Enter apply • Esc done");
            }
            Action::CycleCategory => self.cycle_category(),
            Action::ToggleFocus => {
                self.focus = match self.focus {
                    FocusPane::Grid => FocusPane::Filters,
                    FocusPane::Filters => FocusPane::Grid,
                };
            }
            Action::Left => match self.focus {
                FocusPane::Grid => {
                    self.state.previous_page();
                    self.selected = 0;
                }
                FocusPane::Filters => self.move_chip_cursor(-1),
            },
            Action::Right => match self.focus {
                FocusPane::Grid => {
                    self.state.next_page();
                    self.selected = 0;
                }
                FocusPane::Filters => self.move_chip_cursor(1),
            },
            Action::SelectNext => match self.focus {
                FocusPane::Grid => self.move_selection(1),
                FocusPane::Filters => self.move_chip_cursor(1),
            },
            Action::SelectPrevious => match self.focus {
                FocusPane::Grid => self.move_selection(-1),
                FocusPane::Filters => self.move_chip_cursor(-1),
            },
            Action::ToggleChip => self.toggle_chip(),
            Action::ClearTactics => {
                self.state.clear_tactics();
                self.set_status("Cleared tactic filters");
            }
            Action::ClearTags => {
                self.state.clear_tags();
                self.set_status("Cleared tag filters");
            }
            Action::ClearAll => {
                self.search_task.cancel();
                self.search_input.clear();
                self.active_preset = None;
                self.state.clear_all_filters();
                self.set_status("Cleared all filters");
            }
            Action::CycleSortKey => {
                let sort = self.state.sort();
                let keys: Vec<SortKey> = SortKey::iter().collect();
                let next = keys
                    .iter()
                    .position(|key| *key == sort.key)
                    .map(|idx| keys[(idx + 1) % keys.len()])
                    .unwrap_or_default();
                self.state.set_sorting(next, sort.direction);
                self.set_status(format!("Sorted by {}", self.state.sort()));
            }
            Action::FlipSortDirection => {
                let sort = self.state.sort();
                self.state.set_sorting(sort.key, sort.direction.flipped());
                self.set_status(format!("Sorted by {}", self.state.sort()));
            }
            Action::OpenModal => {
                if self.focus == FocusPane::Filters {
                    self.toggle_chip();
                    return;
                }
                let position = self
                    .views
                    .grid
                    .model()
                    .cards
                    .get(self.selected)
                    .map(|card| card.position);
                if let Some(position) = position {
                    self.views.modal.open(&self.state, position);
                }
            }
            Action::CyclePreset => self.cycle_preset(),
            Action::SavePreset => {
                self.mode = InputMode::PresetLabel;
                self.preset_input.clear();
                self.set_status("Name this preset • Enter save • Esc cancel");
            }
            Action::DeletePreset => self.delete_active_preset(),
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => self.views.modal.close(),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('k') | KeyCode::Up => {
                self.views.modal.step(&self.state, -1)
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('j') | KeyCode::Down => {
                self.views.modal.step(&self.state, 1)
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.mode = InputMode::Browse;
                if let Some(query) = self.search_task.flush() {
                    self.apply_search(&query);
                }
                self.status = Some(self.state.search_feedback());
            }
            KeyCode::Backspace => {
                self.search_input.pop();
                self.search_task
                    .schedule(self.search_input.clone(), Instant::now());
            }
            KeyCode::Char(ch)
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                self.search_input.push(ch);
                self.search_task
                    .schedule(self.search_input.clone(), Instant::now());
            }
            _ => {}
        }
    }

    fn handle_preset_label_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = InputMode::Browse;
                self.preset_input.clear();
                self.set_status("Preset not saved");
            }
            KeyCode::Enter => {
                self.mode = InputMode::Browse;
                let label = std::mem::take(&mut self.preset_input);
                match self.presets.save(&label, &self.state.snapshot_filters()) {
                    Ok(preset) => {
                        self.set_status(format!("Saved preset '{}' ({})", preset.label, preset.id));
                        self.active_preset = Some(preset);
                    }
                    Err(err) => {
                        tracing::error!(?err, "failed to save preset");
                        self.set_status(format!("Could not save preset: {err}"));
                    }
                }
            }
            KeyCode::Backspace => {
                self.preset_input.pop();
            }
            KeyCode::Char(ch)
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                if self.preset_input.chars().count() < 60 {
                    self.preset_input.push(ch);
                }
            }
            _ => {}
        }
    }

    fn apply_search(&mut self, query: &str) {
        self.state.set_search_query(query);
        self.selected = 0;
    }

    fn cycle_category(&mut self) {
        let categories: Vec<Category> = Category::iter().collect();
        let next = match self.state.category() {
            None => categories.first().copied(),
            Some(current) => categories
                .iter()
                .position(|category| *category == current)
                .and_then(|idx| categories.get(idx + 1).copied()),
        };
        self.state.set_category(next);
        self.selected = 0;
        match next {
            Some(category) => self.set_status(format!("Category: {category}")),
            None => self.set_status("All categories"),
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.views.grid.model().cards.len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        self.selected = self
            .selected
            .saturating_add_signed(delta)
            .min(len - 1);
    }

    fn clamp_selection(&mut self) {
        let len = self.views.grid.model().cards.len();
        if len == 0 {
            self.selected = 0;
            self.list_state.select(None);
        } else {
            self.selected = self.selected.min(len - 1);
            self.list_state.select(Some(self.selected));
        }
        let chips = self.views.filters.model().chip_count();
        self.chip_cursor = self.chip_cursor.min(chips.saturating_sub(1));
    }

    fn move_chip_cursor(&mut self, delta: isize) {
        let count = self.views.filters.model().chip_count();
        if count == 0 {
            return;
        }
        self.chip_cursor = self.chip_cursor.saturating_add_signed(delta).min(count - 1);
    }

    fn toggle_chip(&mut self) {
        if self.focus != FocusPane::Filters {
            return;
        }
        let chip = self.views.filters.model().chip(self.chip_cursor).cloned();
        let Some(chip) = chip else {
            return;
        };
        match chip.kind {
            ChipKind::Tactic => self.state.toggle_tactic(&chip.value),
            ChipKind::Tag => self.state.toggle_tag(&chip.value),
        }
        self.selected = 0;
        self.status = Some(self.state.search_feedback());
    }

    fn cycle_preset(&mut self) {
        let presets = match self.presets.all() {
            Ok(presets) => presets,
            Err(err) => {
                tracing::error!(?err, "failed to load presets");
                self.set_status("Could not load presets");
                return;
            }
        };
        let next = match &self.active_preset {
            None => presets.first(),
            Some(active) => presets
                .iter()
                .position(|preset| preset.id == active.id)
                .and_then(|idx| presets.get(idx + 1)),
        };
        match next.cloned() {
            Some(preset) => {
                self.state.apply_preset(&preset.filters);
                self.selected = 0;
                self.set_status(format!("Preset: {}", preset.label));
                self.active_preset = Some(preset);
            }
            None => {
                self.active_preset = None;
                self.state.apply_preset(&Default::default());
                self.set_status("Preset cleared");
            }
        }
    }

    fn delete_active_preset(&mut self) {
        let Some(preset) = self.active_preset.clone() else {
            self.set_status("No preset selected (p cycles presets)");
            return;
        };
        match self.presets.delete(&preset.id) {
            Ok(()) => {
                self.active_preset = None;
                self.set_status(format!("Deleted preset '{}'", preset.label));
            }
            Err(err) => {
                tracing::error!(?err, id = %preset.id, "failed to delete preset");
                self.set_status(format!("Could not delete preset: {err}"));
            }
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::storage::tests::init_storage;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(app: &mut App, codes: &[KeyCode]) {
        for code in codes {
            app.handle_key(key(*code));
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
    }

    fn sample_app() -> anyhow::Result<(TempDir, App)> {
        let (temp, storage) = init_storage()?;
        let path = temp.path().join("hunts-data.json");
        catalog::ensure_dataset(&path)?;
        let hunts = catalog::load_from_path(&path)?;
        let app = App::new(
            Arc::new(AppConfig::default()),
            hunts,
            PresetStore::new(storage),
        );
        Ok((temp, app))
    }

    #[test]
    fn search_input_is_debounced() -> anyhow::Result<()> {
        let (_temp, mut app) = sample_app()?;
        let total = app.state().total_count();
        press(&mut app, &[KeyCode::Char('/')]);
        assert_eq!(app.mode(), InputMode::Search);
        type_text(&mut app, "beacon");
        assert_eq!(app.state().filtered_count(), total);

        app.on_tick(Instant::now());
        assert_eq!(app.state().search_query(), "");
        app.on_tick(Instant::now() + Duration::from_secs(1));
        assert_eq!(app.state().search_query(), "beacon");
        assert!(app.state().filtered_count() < total);
        Ok(())
    }

    #[test]
    fn enter_applies_pending_search_immediately() -> anyhow::Result<()> {
        let (_temp, mut app) = sample_app()?;
        press(&mut app, &[KeyCode::Char('/')]);
        type_text(&mut app, "zzzz");
        press(&mut app, &[KeyCode::Backspace, KeyCode::Enter]);
        assert_eq!(app.mode(), InputMode::Browse);
        assert_eq!(app.state().search_query(), "zzz");
        assert_eq!(app.state().filtered_count(), 0);
        assert!(app.status().is_some_and(|status| status.starts_with("No hunts matched")));
        Ok(())
    }

    #[test]
    fn category_cycles_back_to_all() -> anyhow::Result<()> {
        let (_temp, mut app) = sample_app()?;
        press(&mut app, &[KeyCode::Char('c')]);
        assert_eq!(app.state().category(), Some(Category::Flames));
        press(&mut app, &[KeyCode::Char('c'), KeyCode::Char('c'), KeyCode::Char('c')]);
        assert_eq!(app.state().category(), None);
        Ok(())
    }

    #[test]
    fn sort_keys_cycle_and_flip() -> anyhow::Result<()> {
        let (_temp, mut app) = sample_app()?;
        press(&mut app, &[KeyCode::Char('s')]);
        assert_eq!(app.state().sort().to_string(), "title-asc");
        press(&mut app, &[KeyCode::Char('S')]);
        assert_eq!(app.state().sort().to_string(), "title-desc");
        press(&mut app, &[KeyCode::Char('s'), KeyCode::Char('s')]);
        assert_eq!(app.state().sort().to_string(), "id-desc");
        Ok(())
    }

    #[test]
    fn chips_toggle_from_filter_panel() -> anyhow::Result<()> {
        let (_temp, mut app) = sample_app()?;
        press(&mut app, &[KeyCode::Tab]);
        assert_eq!(app.focus(), FocusPane::Filters);
        let first = app
            .views()
            .filters
            .model()
            .chip(0)
            .cloned()
            .expect("at least one chip");
        press(&mut app, &[KeyCode::Char(' ')]);
        assert_eq!(app.state().active_filters().len(), 1);
        assert!(app.views().filters.model().chip(0).is_some_and(|chip| chip.selected));
        assert_eq!(app.state().selected_tactics().contains(&first.value), first.kind == ChipKind::Tactic);

        press(&mut app, &[KeyCode::Char('x')]);
        assert!(!app.state().has_active_filters());
        Ok(())
    }

    #[test]
    fn modal_opens_on_selected_card_and_walks_the_list() -> anyhow::Result<()> {
        let (_temp, mut app) = sample_app()?;
        press(&mut app, &[KeyCode::Char('j'), KeyCode::Enter]);
        assert!(app.views().modal.is_open());
        let second = app.state().filtered_hunt(1).map(|hunt| hunt.id.clone());
        let opened = app.views().modal.model().detail.as_ref().map(|detail| detail.id.clone());
        assert_eq!(opened, second);

        press(&mut app, &[KeyCode::Right]);
        assert_eq!(app.views().modal.model().index, 2);
        press(&mut app, &[KeyCode::Char('q')]);
        assert!(!app.views().modal.is_open());
        assert!(!app.should_quit());
        Ok(())
    }

    #[test]
    fn presets_cycle_save_and_delete() -> anyhow::Result<()> {
        let (_temp, mut app) = sample_app()?;
        press(&mut app, &[KeyCode::Char('p')]);
        assert_eq!(app.status(), Some("Preset: Baseline sweeps"));
        assert!(app.state().selected_tags().contains("baseline"));

        press(&mut app, &[KeyCode::Char('D')]);
        assert!(app.status().is_some_and(|status| status.contains("built in")));

        press(&mut app, &[KeyCode::Char('P')]);
        assert_eq!(app.mode(), InputMode::PresetLabel);
        type_text(&mut app, "My sweep");
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.status(), Some("Saved preset 'My sweep' (my-sweep)"));

        press(&mut app, &[KeyCode::Char('D')]);
        assert_eq!(app.status(), Some("Deleted preset 'My sweep'"));
        Ok(())
    }

    #[test]
    fn resize_changes_page_size_tier() -> anyhow::Result<()> {
        let (_temp, mut app) = sample_app()?;
        app.on_resize(60);
        assert_eq!(app.state().page_size(), 6);
        app.on_resize(100);
        assert_eq!(app.state().page_size(), 8);
        app.on_resize(200);
        assert_eq!(app.state().page_size(), 9);
        Ok(())
    }

    #[test]
    fn quit_key_sets_flag() -> anyhow::Result<()> {
        let (_temp, mut app) = sample_app()?;
        press(&mut app, &[KeyCode::Char('q')]);
        assert!(app.should_quit());
        Ok(())
    }

    #[test]
    fn ctrl_c_quits_while_typing_a_search() -> anyhow::Result<()> {
        let (_temp, mut app) = sample_app()?;
        press(&mut app, &[KeyCode::Char('/')]);
        type_text(&mut app, "dns");
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit());
        assert_eq!(app.state().search_query(), "");
        Ok(())
    }
}
