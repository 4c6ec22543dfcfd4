//! View components. Each one subscribes to [`AppState`], rebuilds a small
//! render model when notified and never talks to the other views.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::app::observer::{Observer, ObserverHandle};
use crate::app::state::{ActiveFilter, AppState, Changes};
use crate::catalog::{Category, Hunt};
use crate::engine::SortSpec;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchBarModel {
    pub query: String,
    pub feedback: String,
    pub active_filters: Vec<ActiveFilter>,
    pub sort: SortSpec,
}

#[derive(Debug, Default)]
pub struct SearchBarView {
    model: RefCell<SearchBarModel>,
}

impl SearchBarView {
    pub fn model(&self) -> Ref<'_, SearchBarModel> {
        self.model.borrow()
    }
}

impl Observer for SearchBarView {
    fn on_state_change(&self, state: &AppState) {
        *self.model.borrow_mut() = SearchBarModel {
            query: state.search_query().to_string(),
            feedback: state.search_feedback(),
            active_filters: state.active_filters(),
            sort: state.sort(),
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipKind {
    Tactic,
    Tag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip {
    pub kind: ChipKind,
    pub value: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipGroup {
    pub label: String,
    pub chips: Vec<Chip>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPanelModel {
    pub category: Option<Category>,
    pub groups: Vec<ChipGroup>,
}

impl FilterPanelModel {
    /// Chips in display order, which is also the cursor order.
    pub fn chips(&self) -> impl Iterator<Item = &Chip> {
        self.groups.iter().flat_map(|group| group.chips.iter())
    }

    pub fn chip(&self, cursor: usize) -> Option<&Chip> {
        self.chips().nth(cursor)
    }

    pub fn chip_count(&self) -> usize {
        self.groups.iter().map(|group| group.chips.len()).sum()
    }
}

#[derive(Debug, Default)]
pub struct FilterPanelView {
    model: RefCell<FilterPanelModel>,
}

impl FilterPanelView {
    pub fn model(&self) -> Ref<'_, FilterPanelModel> {
        self.model.borrow()
    }
}

impl Observer for FilterPanelView {
    fn on_state_change(&self, state: &AppState) {
        // Chip universes never shrink; only selection changes with filters.
        if !state
            .last_changes()
            .intersects(Changes::FILTERS | Changes::RENDER)
        {
            return;
        }
        let tactics = state.selected_tactics();
        let mut groups: Vec<ChipGroup> = state
            .tactic_groups()
            .into_iter()
            .map(|(label, members)| ChipGroup {
                label: label.to_string(),
                chips: members
                    .into_iter()
                    .map(|value| Chip {
                        kind: ChipKind::Tactic,
                        selected: tactics.contains(&value),
                        value,
                    })
                    .collect(),
            })
            .collect();
        let tags = state.selected_tags();
        let tag_chips: Vec<Chip> = state
            .unique_tags()
            .iter()
            .map(|tag| Chip {
                kind: ChipKind::Tag,
                value: tag.clone(),
                selected: tags.contains(tag),
            })
            .collect();
        if !tag_chips.is_empty() {
            groups.push(ChipGroup {
                label: "Tags".to_string(),
                chips: tag_chips,
            });
        }
        *self.model.borrow_mut() = FilterPanelModel {
            category: state.category(),
            groups,
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardModel {
    /// Position in the full filtered list, used to open the modal.
    pub position: usize,
    pub id: String,
    pub title: String,
    pub category: Option<Category>,
    pub category_label: String,
    pub tactics: Vec<String>,
    pub tags: Vec<String>,
    pub submitter: String,
}

impl CardModel {
    fn from_hunt(position: usize, hunt: &Hunt) -> Self {
        Self {
            position,
            id: hunt.id.clone(),
            title: hunt.display_title().to_string(),
            category: hunt.category,
            category_label: hunt.category_label().to_string(),
            tactics: hunt.tactics().map(str::to_string).collect(),
            tags: hunt.tags.clone(),
            submitter: hunt.submitter.name.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridModel {
    pub cards: Vec<CardModel>,
    pub highlight_terms: Vec<String>,
    pub empty_message: Option<String>,
}

#[derive(Debug, Default)]
pub struct GridView {
    model: RefCell<GridModel>,
}

impl GridView {
    pub fn model(&self) -> Ref<'_, GridModel> {
        self.model.borrow()
    }
}

impl Observer for GridView {
    fn on_state_change(&self, state: &AppState) {
        let window = state.page_window();
        let cards: Vec<CardModel> = state
            .paginated_hunts()
            .into_iter()
            .enumerate()
            .map(|(offset, hunt)| CardModel::from_hunt(window.start + offset, hunt))
            .collect();
        let empty_message = if !cards.is_empty() {
            None
        } else if state.total_count() == 0 {
            Some("No hunts loaded.".to_string())
        } else {
            Some("No hunts match the current filters. Press x to clear them.".to_string())
        };
        let mut highlight_terms = Vec::new();
        if !state.search_query().is_empty() {
            highlight_terms.push(state.search_query().to_string());
        }
        highlight_terms.extend(state.selected_tactics().iter().cloned());
        *self.model.borrow_mut() = GridModel {
            cards,
            highlight_terms,
            empty_message,
        };
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationModel {
    pub current_page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub filtered: usize,
    pub total: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PaginationModel {
    pub fn label(&self) -> String {
        format!("Page {} of {}", self.current_page, self.total_pages)
    }

    /// `Showing 10-18 of 42`, or `Showing 0 of 0` when empty.
    pub fn range_label(&self) -> String {
        if self.filtered == 0 {
            return "Showing 0 of 0".to_string();
        }
        let start = (self.current_page - 1) * self.page_size + 1;
        let end = (start + self.page_size - 1).min(self.filtered);
        format!("Showing {start}-{end} of {}", self.filtered)
    }
}

#[derive(Debug, Default)]
pub struct PaginationView {
    model: RefCell<PaginationModel>,
}

impl PaginationView {
    pub fn model(&self) -> Ref<'_, PaginationModel> {
        self.model.borrow()
    }
}

impl Observer for PaginationView {
    fn on_state_change(&self, state: &AppState) {
        let window = state.page_window();
        *self.model.borrow_mut() = PaginationModel {
            current_page: window.current_page,
            total_pages: window.total_pages,
            page_size: state.page_size(),
            filtered: state.filtered_count(),
            total: state.total_count(),
            has_previous: window.has_previous(),
            has_next: window.has_next(),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuntDetail {
    pub id: String,
    pub title: String,
    pub category: Option<Category>,
    pub category_label: String,
    pub hunt_style: Option<&'static str>,
    pub tactics: Vec<String>,
    pub tags: Vec<String>,
    pub submitter: String,
    pub submitter_link: Option<String>,
    pub notes: String,
    pub why: Vec<String>,
    pub references: Vec<String>,
    pub file_path: String,
}

impl HuntDetail {
    pub fn from_hunt(hunt: &Hunt) -> Self {
        Self {
            id: hunt.id.clone(),
            title: hunt.display_title().to_string(),
            category: hunt.category,
            category_label: hunt.category_label().to_string(),
            hunt_style: hunt.category.map(Category::hunt_style),
            tactics: hunt.tactics().map(str::to_string).collect(),
            tags: hunt.tags.clone(),
            submitter: hunt.submitter.name.trim().to_string(),
            submitter_link: hunt.submitter.link().map(str::to_string),
            notes: hunt.notes.trim().to_string(),
            why: hunt
                .why
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            references: hunt.reference_lines().map(str::to_string).collect(),
            file_path: hunt.file_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalModel {
    pub open: bool,
    pub index: usize,
    pub total: usize,
    pub detail: Option<HuntDetail>,
}

impl ModalModel {
    pub fn counter(&self) -> String {
        if self.total == 0 {
            "0 / 0".to_string()
        } else {
            format!("{} / {}", self.index + 1, self.total)
        }
    }
}

/// Detail view over the whole filtered list, addressed by position.
#[derive(Debug, Default)]
pub struct ModalView {
    model: RefCell<ModalModel>,
}

impl ModalView {
    pub fn model(&self) -> Ref<'_, ModalModel> {
        self.model.borrow()
    }

    pub fn is_open(&self) -> bool {
        self.model.borrow().open
    }

    pub fn open(&self, state: &AppState, position: usize) {
        let mut model = self.model.borrow_mut();
        model.open = true;
        model.index = position;
        Self::refresh(&mut model, state);
    }

    pub fn close(&self) {
        let mut model = self.model.borrow_mut();
        model.open = false;
        model.detail = None;
    }

    /// Move within the filtered list, stopping at either end.
    pub fn step(&self, state: &AppState, delta: isize) {
        let mut model = self.model.borrow_mut();
        if !model.open {
            return;
        }
        model.index = model.index.saturating_add_signed(delta);
        Self::refresh(&mut model, state);
    }

    fn refresh(model: &mut ModalModel, state: &AppState) {
        model.total = state.filtered_count();
        model.index = model.index.min(model.total.saturating_sub(1));
        model.detail = state.filtered_hunt(model.index).map(HuntDetail::from_hunt);
    }
}

impl Observer for ModalView {
    fn on_state_change(&self, state: &AppState) {
        let mut model = self.model.borrow_mut();
        if model.open {
            Self::refresh(&mut model, state);
        }
    }
}

/// The five view components, wired to one [`AppState`].
pub struct Views {
    pub search: Rc<SearchBarView>,
    pub filters: Rc<FilterPanelView>,
    pub grid: Rc<GridView>,
    pub pagination: Rc<PaginationView>,
    pub modal: Rc<ModalView>,
}

impl Views {
    pub fn attach(state: &mut AppState) -> Self {
        let views = Self {
            search: Rc::default(),
            filters: Rc::default(),
            grid: Rc::default(),
            pagination: Rc::default(),
            modal: Rc::default(),
        };
        for handle in views.handles() {
            state.subscribe(handle);
        }
        state.render();
        views
    }

    pub fn detach(&self, state: &mut AppState) {
        for handle in self.handles() {
            state.unsubscribe(&handle);
        }
    }

    fn handles(&self) -> [ObserverHandle; 5] {
        [
            self.search.clone() as ObserverHandle,
            self.filters.clone() as ObserverHandle,
            self.grid.clone() as ObserverHandle,
            self.pagination.clone() as ObserverHandle,
            self.modal.clone() as ObserverHandle,
        ]
    }
}
