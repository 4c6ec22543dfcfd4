use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bitflags::bitflags;
use indexmap::{IndexMap, IndexSet};
use once_cell::unsync::OnceCell;

use crate::catalog::{Category, Hunt};
use crate::engine::{
    self, group_tactics, paginate, DerivedView, FilterSnapshot, FilterSpec, PageWindow, SortDirection,
    SortKey, SortSpec,
};

use super::observer::{ObserverHandle, ObserverRegistry};

pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1024;

bitflags! {
    /// What the most recent notification changed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Changes: u8 {
        const FILTERS = 1;
        const SORT = 1 << 1;
        const PAGE = 1 << 2;
        const PAGE_SIZE = 1 << 3;
        const RENDER = 1 << 4;
    }
}

/// Maps a viewport width in pixels to a page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizeTiers {
    pub small_below: u32,
    pub medium_below: u32,
    pub small: usize,
    pub medium: usize,
    pub large: usize,
}

impl Default for PageSizeTiers {
    fn default() -> Self {
        Self {
            small_below: 640,
            medium_below: 1024,
            small: 6,
            medium: 8,
            large: 9,
        }
    }
}

impl PageSizeTiers {
    /// Same page size at every width.
    pub fn fixed(page_size: usize) -> Self {
        Self {
            small: page_size,
            medium: page_size,
            large: page_size,
            ..Self::default()
        }
    }

    pub fn page_size_for(&self, width: u32) -> usize {
        let size = if width < self.small_below {
            self.small
        } else if width < self.medium_below {
            self.medium
        } else {
            self.large
        };
        size.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveFilter {
    Search(String),
    Category(Category),
    Tactic(String),
    Tag(String),
}

impl fmt::Display for ActiveFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveFilter::Search(query) => write!(f, "Search \"{query}\""),
            ActiveFilter::Category(category) => write!(f, "Category: {category}"),
            ActiveFilter::Tactic(tactic) => write!(f, "Tactic: {tactic}"),
            ActiveFilter::Tag(tag) => write!(f, "Tag: #{tag}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryStats {
    pub total_hunts: usize,
    pub unique_tactics: usize,
    pub unique_contributors: usize,
}

#[derive(Debug, Default)]
struct Universe {
    tactics: BTreeSet<String>,
    tags: BTreeSet<String>,
    contributors: BTreeSet<String>,
}

/// Single owner of the hunt catalog and the active filter specification.
///
/// Every mutator updates the specification, refreshes the derived view and
/// notifies all observers before returning. Observers only ever see `&self`.
pub struct AppState {
    hunts: Arc<[Hunt]>,
    spec: FilterSpec,
    ordered: Vec<usize>,
    tiers: PageSizeTiers,
    viewport_width: u32,
    observers: ObserverRegistry,
    last_changes: Changes,
    last_derive: Duration,
    universe: OnceCell<Universe>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("hunts", &self.hunts.len())
            .field("spec", &self.spec)
            .field("filtered", &self.ordered.len())
            .field("viewport_width", &self.viewport_width)
            .field("observers", &self.observers)
            .finish()
    }
}

impl AppState {
    /// An empty catalog is valid and produces empty views.
    pub fn new(hunts: impl Into<Arc<[Hunt]>>) -> Self {
        let tiers = PageSizeTiers::default();
        let mut state = Self {
            hunts: hunts.into(),
            spec: FilterSpec {
                page_size: tiers.page_size_for(DEFAULT_VIEWPORT_WIDTH),
                ..FilterSpec::default()
            },
            ordered: Vec::new(),
            tiers,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            observers: ObserverRegistry::new(),
            last_changes: Changes::empty(),
            last_derive: Duration::ZERO,
            universe: OnceCell::new(),
        };
        state.recompute();
        state
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.spec.sort = sort;
        self.recompute();
        self
    }

    pub fn with_page_size_tiers(mut self, tiers: PageSizeTiers) -> Self {
        self.tiers = tiers;
        self.spec.page_size = tiers.page_size_for(self.viewport_width);
        self.clamp_page();
        self
    }

    pub fn with_viewport_width(mut self, width: u32) -> Self {
        self.viewport_width = width;
        self.spec.page_size = self.tiers.page_size_for(width);
        self.clamp_page();
        self
    }

    // Observers

    pub fn subscribe(&mut self, observer: ObserverHandle) -> bool {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, observer: &ObserverHandle) -> bool {
        self.observers.unsubscribe(observer)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn last_changes(&self) -> Changes {
        self.last_changes
    }

    // Mutators

    pub fn set_search_query(&mut self, raw: &str) {
        self.spec.search_query = engine::normalize_query(raw);
        tracing::debug!(query = %self.spec.search_query, "search query updated");
        self.commit_filters();
    }

    pub fn set_category(&mut self, category: Option<Category>) {
        self.spec.category = category;
        tracing::debug!(?category, "category filter updated");
        self.commit_filters();
    }

    pub fn toggle_tactic(&mut self, tactic: &str) {
        toggle_entry(&mut self.spec.tactics, tactic);
        tracing::debug!(tactic, selected = self.spec.tactics.len(), "tactic filter toggled");
        self.commit_filters();
    }

    pub fn clear_tactics(&mut self) {
        self.spec.tactics.clear();
        self.commit_filters();
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        toggle_entry(&mut self.spec.tags, tag);
        tracing::debug!(tag, selected = self.spec.tags.len(), "tag filter toggled");
        self.commit_filters();
    }

    pub fn clear_tags(&mut self) {
        self.spec.tags.clear();
        self.commit_filters();
    }

    /// Changing the sort keeps the current page.
    pub fn set_sorting(&mut self, key: SortKey, direction: SortDirection) {
        self.spec.sort = SortSpec::new(key, direction);
        tracing::debug!(sort = %self.spec.sort, "sort order updated");
        self.recompute();
        self.notify(Changes::SORT);
    }

    /// Out-of-range pages are clamped into `[1, total_pages]`.
    pub fn set_page(&mut self, page: i64) {
        self.spec.current_page = engine::clamp_page(page, self.total_pages());
        self.notify(Changes::PAGE);
    }

    pub fn next_page(&mut self) {
        self.set_page(self.spec.current_page as i64 + 1);
    }

    pub fn previous_page(&mut self) {
        self.set_page(self.spec.current_page as i64 - 1);
    }

    /// Re-tier the page size. Staying in the same tier only re-renders.
    pub fn set_viewport_width(&mut self, width: u32) {
        self.viewport_width = width;
        let page_size = self.tiers.page_size_for(width);
        if page_size == self.spec.page_size {
            self.notify(Changes::RENDER);
            return;
        }
        tracing::debug!(width, page_size, "page size tier changed");
        self.spec.page_size = page_size;
        self.clamp_page();
        self.notify(Changes::PAGE_SIZE);
    }

    /// Notify observers without changing anything.
    pub fn render(&mut self) {
        self.notify(Changes::RENDER);
    }

    /// Replace category, tactics, tags and (when present) sort from a
    /// preset. The search query is kept.
    pub fn apply_preset(&mut self, filters: &FilterSnapshot) {
        self.spec.category = filters.category;
        self.spec.tactics = filters.tactics.iter().cloned().collect();
        self.spec.tags = filters.tags.iter().cloned().collect();
        let mut changes = Changes::FILTERS | Changes::PAGE;
        if let Some(sort) = filters.sort_by {
            self.spec.sort = sort;
            changes |= Changes::SORT;
        }
        self.spec.current_page = 1;
        self.recompute();
        self.notify(changes);
    }

    pub fn clear_filter(&mut self, filter: &ActiveFilter) {
        match filter {
            ActiveFilter::Search(_) => self.spec.search_query.clear(),
            ActiveFilter::Category(_) => self.spec.category = None,
            ActiveFilter::Tactic(tactic) => {
                self.spec.tactics.shift_remove(tactic);
            }
            ActiveFilter::Tag(tag) => {
                self.spec.tags.shift_remove(tag);
            }
        }
        self.commit_filters();
    }

    pub fn clear_all_filters(&mut self) {
        self.spec.search_query.clear();
        self.spec.category = None;
        self.spec.tactics.clear();
        self.spec.tags.clear();
        self.commit_filters();
    }

    // Accessors

    pub fn hunts(&self) -> &[Hunt] {
        &self.hunts
    }

    pub fn search_query(&self) -> &str {
        &self.spec.search_query
    }

    pub fn category(&self) -> Option<Category> {
        self.spec.category
    }

    pub fn selected_tactics(&self) -> &IndexSet<String> {
        &self.spec.tactics
    }

    pub fn selected_tags(&self) -> &IndexSet<String> {
        &self.spec.tags
    }

    pub fn sort(&self) -> SortSpec {
        self.spec.sort
    }

    pub fn current_page(&self) -> usize {
        self.spec.current_page
    }

    pub fn page_size(&self) -> usize {
        self.spec.page_size
    }

    pub fn viewport_width(&self) -> u32 {
        self.viewport_width
    }

    pub fn page_window(&self) -> PageWindow {
        paginate(
            self.ordered.len(),
            self.spec.current_page as i64,
            self.spec.page_size,
        )
    }

    pub fn paginated_hunts(&self) -> Vec<&Hunt> {
        let window = self.page_window();
        self.ordered[window.start..window.end]
            .iter()
            .map(|&idx| &self.hunts[idx])
            .collect()
    }

    pub fn filtered_hunt(&self, position: usize) -> Option<&Hunt> {
        self.ordered.get(position).map(|&idx| &self.hunts[idx])
    }

    pub fn filtered_count(&self) -> usize {
        self.ordered.len()
    }

    pub fn total_count(&self) -> usize {
        self.hunts.len()
    }

    pub fn total_pages(&self) -> usize {
        engine::total_pages(self.ordered.len(), self.spec.page_size)
    }

    pub fn derived_view(&self) -> DerivedView<'_> {
        let window = self.page_window();
        DerivedView {
            page: self.paginated_hunts(),
            total_filtered: self.ordered.len(),
            total_pages: window.total_pages,
            current_page: window.current_page,
        }
    }

    pub fn unique_tactics(&self) -> &BTreeSet<String> {
        &self.universe().tactics
    }

    pub fn unique_tags(&self) -> &BTreeSet<String> {
        &self.universe().tags
    }

    pub fn unique_contributors(&self) -> &BTreeSet<String> {
        &self.universe().contributors
    }

    pub fn tactic_groups(&self) -> IndexMap<&'static str, Vec<String>> {
        group_tactics(self.unique_tactics())
    }

    pub fn summary(&self) -> SummaryStats {
        SummaryStats {
            total_hunts: self.hunts.len(),
            unique_tactics: self.unique_tactics().len(),
            unique_contributors: self.unique_contributors().len(),
        }
    }

    pub fn has_active_filters(&self) -> bool {
        self.spec.has_filters()
    }

    /// Search first, then category, then tactics and tags each sorted
    /// case-insensitively.
    pub fn active_filters(&self) -> Vec<ActiveFilter> {
        let mut filters = Vec::new();
        if !self.spec.search_query.is_empty() {
            filters.push(ActiveFilter::Search(self.spec.search_query.clone()));
        }
        if let Some(category) = self.spec.category {
            filters.push(ActiveFilter::Category(category));
        }
        let mut tactics: Vec<&String> = self.spec.tactics.iter().collect();
        tactics.sort_by_key(|tactic| tactic.to_lowercase());
        filters.extend(tactics.into_iter().cloned().map(ActiveFilter::Tactic));
        let mut tags: Vec<&String> = self.spec.tags.iter().collect();
        tags.sort_by_key(|tag| tag.to_lowercase());
        filters.extend(tags.into_iter().cloned().map(ActiveFilter::Tag));
        filters
    }

    pub fn search_feedback(&self) -> String {
        format_feedback(self.ordered.len(), self.has_active_filters(), self.last_derive)
    }

    pub fn snapshot_filters(&self) -> FilterSnapshot {
        self.spec.snapshot()
    }

    fn universe(&self) -> &Universe {
        self.universe.get_or_init(|| Universe {
            tactics: engine::unique_tactics(&self.hunts),
            tags: engine::unique_tags(&self.hunts),
            contributors: engine::unique_contributors(&self.hunts),
        })
    }

    fn commit_filters(&mut self) {
        self.spec.current_page = 1;
        self.recompute();
        self.notify(Changes::FILTERS | Changes::PAGE);
    }

    fn recompute(&mut self) {
        let started = Instant::now();
        self.ordered = engine::filter_and_sort(&self.hunts, &self.spec);
        self.last_derive = started.elapsed();
        self.clamp_page();
    }

    fn clamp_page(&mut self) {
        self.spec.current_page =
            engine::clamp_page(self.spec.current_page as i64, self.total_pages());
    }

    fn notify(&mut self, changes: Changes) {
        self.last_changes = changes;
        self.observers.notify(self);
    }
}

fn toggle_entry(set: &mut IndexSet<String>, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    if !set.shift_remove(value) {
        set.insert(value.to_string());
    }
}

pub fn format_feedback(matched: usize, has_filters: bool, elapsed: Duration) -> String {
    let duration = if elapsed < Duration::from_millis(1) {
        "<1ms".to_string()
    } else {
        format!("{}ms", (elapsed.as_secs_f64() * 1000.0).round() as u64)
    };
    if matched == 0 {
        format!("No hunts matched • {duration}")
    } else if !has_filters {
        format!("All hunts • {duration}")
    } else {
        let noun = if matched == 1 { "hunt" } else { "hunts" };
        format!("Matched {} {noun} • {duration}", format_count(matched))
    }
}

/// `1234567` → `1,234,567`.
pub fn format_count(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::catalog::Submitter;

    fn scenario_hunts() -> Vec<Hunt> {
        (1..=10)
            .map(|n| Hunt {
                id: format!("H{n}"),
                category: Some(if n % 2 == 1 {
                    Category::Flames
                } else {
                    Category::Embers
                }),
                title: format!("Hunt number {n}"),
                tactic: match n {
                    3 | 7 | 4 => "Lateral Movement, Execution".into(),
                    5 => "Persistence".into(),
                    _ => String::new(),
                },
                tags: if n % 3 == 0 {
                    vec!["baseline".into()]
                } else {
                    Vec::new()
                },
                submitter: Submitter {
                    name: if n % 2 == 0 { "Lauren".into() } else { "Sydney".into() },
                    link: None,
                },
                ..Hunt::default()
            })
            .collect()
    }

    fn ids(hunts: &[&Hunt]) -> Vec<String> {
        hunts.iter().map(|hunt| hunt.id.clone()).collect()
    }

    fn counting_observer(counter: &Rc<Cell<usize>>) -> ObserverHandle {
        let counter = counter.clone();
        Rc::new(move |_: &AppState| counter.set(counter.get() + 1))
    }

    #[test]
    fn end_to_end_category_search_and_paging() {
        let mut state =
            AppState::new(scenario_hunts()).with_page_size_tiers(PageSizeTiers::fixed(1));
        assert_eq!(state.total_count(), 10);

        state.set_category(Some(Category::Flames));
        assert_eq!(state.filtered_count(), 5);

        state.set_search_query("lateral");
        assert_eq!(state.filtered_count(), 2);

        state.set_page(2);
        assert_eq!(ids(&state.paginated_hunts()), vec!["H7"]);
        assert_eq!(state.total_pages(), 2);
        assert_eq!(state.current_page(), 2);
    }

    #[test]
    fn filter_mutation_resets_page_but_sorting_keeps_it() {
        let mut state =
            AppState::new(scenario_hunts()).with_page_size_tiers(PageSizeTiers::fixed(2));
        state.set_page(3);
        assert_eq!(state.current_page(), 3);
        state.set_sorting(SortKey::Title, SortDirection::Asc);
        assert_eq!(state.current_page(), 3);
        state.set_category(Some(Category::Embers));
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn page_requests_are_clamped() {
        let mut state =
            AppState::new(scenario_hunts()).with_page_size_tiers(PageSizeTiers::fixed(3));
        state.set_page(-5);
        assert_eq!(state.current_page(), 1);
        state.set_page(9999);
        assert_eq!(state.current_page(), 4);
        assert_eq!(ids(&state.paginated_hunts()), vec!["H10"]);
        state.next_page();
        assert_eq!(state.current_page(), 4);
    }

    #[test]
    fn empty_filter_result_has_one_empty_page() {
        let mut state = AppState::new(scenario_hunts());
        state.set_search_query("nothing matches this");
        assert_eq!(state.total_pages(), 1);
        assert!(state.paginated_hunts().is_empty());
        assert!(state.search_feedback().starts_with("No hunts matched"));
    }

    #[test]
    fn empty_dataset_is_valid() {
        let mut state = AppState::new(Vec::new());
        assert_eq!(state.total_count(), 0);
        assert_eq!(state.total_pages(), 1);
        state.set_page(7);
        assert_eq!(state.current_page(), 1);
        assert!(state.unique_tactics().is_empty());
        let view = state.derived_view();
        assert!(view.page.is_empty());
        assert_eq!(view.total_filtered, 0);
    }

    #[test]
    fn every_mutator_notifies_each_observer_once() {
        let mut state = AppState::new(scenario_hunts());
        let counters: Vec<_> = (0..3).map(|_| Rc::new(Cell::new(0))).collect();
        for counter in &counters {
            state.subscribe(counting_observer(counter));
        }

        state.set_search_query("hunt");
        assert!(counters.iter().all(|counter| counter.get() == 1));

        state.toggle_tactic("Execution");
        state.toggle_tag("baseline");
        state.set_sorting(SortKey::Id, SortDirection::Desc);
        state.set_page(1);
        state.clear_all_filters();
        assert!(counters.iter().all(|counter| counter.get() == 6));
    }

    #[test]
    fn observers_see_the_updated_state() {
        let mut state = AppState::new(scenario_hunts());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        state.subscribe(Rc::new(move |state: &AppState| {
            sink.borrow_mut()
                .push((state.filtered_count(), state.last_changes()));
        }));
        state.set_category(Some(Category::Flames));
        state.set_sorting(SortKey::Title, SortDirection::Asc);
        assert_eq!(
            *seen.borrow(),
            vec![
                (5, Changes::FILTERS | Changes::PAGE),
                (5, Changes::SORT)
            ]
        );
    }

    #[test]
    fn duplicate_subscribe_notifies_once_and_unsubscribe_stops_delivery() {
        let mut state = AppState::new(scenario_hunts());
        let counter = Rc::new(Cell::new(0));
        let handle = counting_observer(&counter);
        assert!(state.subscribe(handle.clone()));
        assert!(!state.subscribe(handle.clone()));
        state.set_search_query("h");
        assert_eq!(counter.get(), 1);

        assert!(state.unsubscribe(&handle));
        state.set_search_query("hu");
        assert_eq!(counter.get(), 1);
        assert_eq!(state.observer_count(), 0);
    }

    #[test]
    fn universes_ignore_active_filters() {
        let mut state = AppState::new(scenario_hunts());
        let tactics = state.unique_tactics().clone();
        let contributors = state.unique_contributors().clone();
        state.set_category(Some(Category::Embers));
        state.toggle_tactic("Persistence");
        assert_eq!(state.filtered_count(), 0);
        assert_eq!(*state.unique_tactics(), tactics);
        assert_eq!(*state.unique_contributors(), contributors);
        assert_eq!(
            state.summary(),
            SummaryStats {
                total_hunts: 10,
                unique_tactics: 3,
                unique_contributors: 2
            }
        );
    }

    #[test]
    fn toggling_twice_removes_the_filter() {
        let mut state = AppState::new(scenario_hunts());
        state.toggle_tag("baseline");
        assert_eq!(state.filtered_count(), 3);
        state.toggle_tag("baseline");
        assert_eq!(state.filtered_count(), 10);
        assert!(!state.has_active_filters());
    }

    #[test]
    fn resize_only_recomputes_when_tier_changes() {
        let mut state = AppState::new(scenario_hunts()).with_viewport_width(1280);
        assert_eq!(state.page_size(), 9);
        state.set_page(2);

        state.set_viewport_width(1100);
        assert_eq!(state.last_changes(), Changes::RENDER);
        assert_eq!(state.page_size(), 9);

        state.set_viewport_width(800);
        assert_eq!(state.last_changes(), Changes::PAGE_SIZE);
        assert_eq!(state.page_size(), 8);
        assert_eq!(state.current_page(), 2);

        state.set_viewport_width(320);
        assert_eq!(state.page_size(), 6);
    }

    #[test]
    fn shrinking_tier_clamps_page() {
        let mut state = AppState::new(scenario_hunts())
            .with_page_size_tiers(PageSizeTiers {
                small: 5,
                medium: 10,
                large: 10,
                ..PageSizeTiers::default()
            })
            .with_viewport_width(320);
        state.set_page(2);
        state.set_viewport_width(2000);
        assert_eq!(state.total_pages(), 1);
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn active_filters_are_ordered_and_individually_clearable() {
        let mut state = AppState::new(scenario_hunts());
        state.toggle_tag("baseline");
        state.toggle_tactic("persistence");
        state.toggle_tactic("Execution");
        state.set_category(Some(Category::Flames));
        state.set_search_query("Hunt");

        let labels: Vec<String> = state
            .active_filters()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            labels,
            vec![
                "Search \"hunt\"",
                "Category: Flames",
                "Tactic: Execution",
                "Tactic: persistence",
                "Tag: #baseline"
            ]
        );

        state.clear_filter(&ActiveFilter::Tactic("persistence".into()));
        assert_eq!(state.selected_tactics().len(), 1);
        assert_eq!(state.active_filters().len(), 4);
    }

    #[test]
    fn tag_chip_from_padded_record_selects_that_record() {
        let hunts = crate::catalog::parse_dataset(
            r#"[{"id": "H1", "tags": [" windows"]}, {"id": "H2", "tags": ["linux"]}]"#,
        )
        .expect("dataset parses");
        let mut state = AppState::new(hunts);
        assert!(state.unique_tags().contains("windows"));
        state.toggle_tag("windows");
        assert_eq!(state.filtered_count(), 1);
        assert_eq!(state.filtered_hunt(0).map(|hunt| hunt.id.as_str()), Some("H1"));
    }

    #[test]
    fn presets_replace_filters_but_keep_search() {
        let mut state = AppState::new(scenario_hunts());
        state.set_search_query("hunt");
        state.toggle_tactic("Persistence");
        state.set_page(2);
        let snapshot = FilterSnapshot {
            category: Some(Category::Flames),
            tags: vec!["baseline".into()],
            sort_by: Some(SortSpec::new(SortKey::Id, SortDirection::Desc)),
            ..FilterSnapshot::default()
        };
        state.apply_preset(&snapshot);
        assert_eq!(state.search_query(), "hunt");
        assert!(state.selected_tactics().is_empty());
        assert_eq!(ids(&state.paginated_hunts()), vec!["H9", "H3"]);
        assert_eq!(state.current_page(), 1);
        assert!(state.last_changes().contains(Changes::SORT));
        assert_eq!(state.snapshot_filters(), snapshot);
    }

    #[test]
    fn feedback_formats_counts_and_durations() {
        assert_eq!(format_feedback(0, true, Duration::ZERO), "No hunts matched • <1ms");
        assert_eq!(
            format_feedback(12, false, Duration::from_micros(2_600)),
            "All hunts • 3ms"
        );
        assert_eq!(
            format_feedback(1234, true, Duration::from_micros(400)),
            "Matched 1,234 hunts • <1ms"
        );
        assert_eq!(format_feedback(1, true, Duration::ZERO), "Matched 1 hunt • <1ms");
        assert_eq!(format_count(1_234_567), "1,234,567");
        assert_eq!(format_count(999), "999");
    }
}
