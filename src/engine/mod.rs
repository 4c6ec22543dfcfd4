//! Pure filtering, sorting and pagination over the hunt catalog.
//!
//! Nothing in here holds state or touches the terminal: every function takes
//! the canonical records plus a [`FilterSpec`] and returns indices into (or
//! borrows of) those records. Derived views therefore never contain modified
//! copies of a hunt.

use std::collections::BTreeSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::catalog::{Category, Hunt};

mod groups;
mod sort;

pub use groups::{group_tactics, resolve_tactic_group, FALLBACK_GROUP};
pub use sort::{compare_ids, sort_indices, ParseSortError, SortDirection, SortKey, SortSpec};

/// Complete set of filter, sort and page parameters.
///
/// Multiple tactics or tags combine with AND: a record has to satisfy every
/// selected entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub search_query: String,
    pub category: Option<Category>,
    pub tactics: IndexSet<String>,
    pub tags: IndexSet<String>,
    pub sort: SortSpec,
    /// 1-based; clamped by [`paginate`] before use.
    pub current_page: usize,
    pub page_size: usize,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            search_query: String::new(),
            category: None,
            tactics: IndexSet::new(),
            tags: IndexSet::new(),
            sort: SortSpec::default(),
            current_page: 1,
            page_size: 9,
        }
    }
}

impl FilterSpec {
    pub fn has_filters(&self) -> bool {
        !self.search_query.is_empty()
            || self.category.is_some()
            || !self.tactics.is_empty()
            || !self.tags.is_empty()
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        FilterSnapshot {
            category: self.category,
            tactics: self.tactics.iter().cloned().collect(),
            tags: self.tags.iter().cloned().collect(),
            sort_by: Some(self.sort),
        }
    }
}

/// Serializable subset of a [`FilterSpec`] captured by presets.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tactics: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(rename = "sortBy", skip_serializing_if = "Option::is_none")]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub sort_by: Option<SortSpec>,
}

pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub current_page: usize,
    pub total_pages: usize,
    pub start: usize,
    pub end: usize,
}

impl PageWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

#[derive(Debug, Clone)]
pub struct DerivedView<'a> {
    pub page: Vec<&'a Hunt>,
    pub total_filtered: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

pub fn derive_view<'a>(records: &'a [Hunt], spec: &FilterSpec) -> DerivedView<'a> {
    let ordered = filter_and_sort(records, spec);
    let window = paginate(ordered.len(), spec.current_page as i64, spec.page_size);
    DerivedView {
        page: ordered[window.start..window.end]
            .iter()
            .map(|&idx| &records[idx])
            .collect(),
        total_filtered: ordered.len(),
        total_pages: window.total_pages,
        current_page: window.current_page,
    }
}

/// Indices of the records that pass every active predicate, in sort order.
pub fn filter_and_sort(records: &[Hunt], spec: &FilterSpec) -> Vec<usize> {
    let needle = normalize_query(&spec.search_query);
    let mut indices: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, hunt)| {
            matches_search(hunt, &needle)
                && matches_category(hunt, spec.category)
                && matches_tactics(hunt, &spec.tactics)
                && matches_tags(hunt, &spec.tags)
        })
        .map(|(idx, _)| idx)
        .collect();
    sort_indices(records, &mut indices, spec.sort);
    tracing::trace!(
        matched = indices.len(),
        total = records.len(),
        sort = %spec.sort,
        "filtered hunt catalog"
    );
    indices
}

/// `needle` must already be normalized with [`normalize_query`].
pub fn matches_search(hunt: &Hunt, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let tags = hunt.tags.join(" ");
    let haystack = [
        hunt.id.as_str(),
        hunt.title.as_str(),
        hunt.tactic.as_str(),
        hunt.notes.as_str(),
        tags.as_str(),
        hunt.submitter.name.as_str(),
    ]
    .join(" ")
    .to_lowercase();
    haystack.contains(needle)
}

pub fn matches_category(hunt: &Hunt, category: Option<Category>) -> bool {
    match category {
        Some(wanted) => hunt.category == Some(wanted),
        None => true,
    }
}

pub fn matches_tactics(hunt: &Hunt, selected: &IndexSet<String>) -> bool {
    if selected.is_empty() {
        return true;
    }
    let tactics: Vec<String> = hunt.tactics().map(str::to_lowercase).collect();
    if tactics.is_empty() {
        return false;
    }
    selected.iter().all(|wanted| {
        let wanted = wanted.trim().to_lowercase();
        tactics.iter().any(|tactic| tactic.contains(&wanted))
    })
}

pub fn matches_tags(hunt: &Hunt, selected: &IndexSet<String>) -> bool {
    if selected.is_empty() {
        return true;
    }
    if hunt.tags.is_empty() {
        return false;
    }
    selected.iter().all(|wanted| {
        let wanted = wanted.trim();
        hunt.tags.iter().any(|tag| tag.trim() == wanted)
    })
}

pub fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

pub fn clamp_page(requested: i64, total_pages: usize) -> usize {
    requested.clamp(1, total_pages.max(1) as i64) as usize
}

/// Slice bounds for `requested` after clamping it into `[1, total_pages]`.
/// An empty result still reports one (empty) page.
pub fn paginate(total: usize, requested: i64, page_size: usize) -> PageWindow {
    let page_size = page_size.max(1);
    let total_pages = total_pages(total, page_size);
    let current_page = clamp_page(requested, total_pages);
    let start = ((current_page - 1) * page_size).min(total);
    let end = (start + page_size).min(total);
    PageWindow {
        current_page,
        total_pages,
        start,
        end,
    }
}

/// Free-text lookup used outside the grid: case-insensitive match on title,
/// tactic, tags, submitter and notes with title hits listed first.
pub fn search_ranked<'a>(records: &'a [Hunt], query: &str) -> Vec<&'a Hunt> {
    let needle = normalize_query(query);
    let (mut title_hits, other_hits): (Vec<&Hunt>, Vec<&Hunt>) = records
        .iter()
        .filter(|hunt| {
            needle.is_empty()
                || hunt.title.to_lowercase().contains(&needle)
                || hunt.tactic.to_lowercase().contains(&needle)
                || hunt
                    .tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(&needle))
                || hunt.submitter.name.to_lowercase().contains(&needle)
                || hunt.notes.to_lowercase().contains(&needle)
        })
        .partition(|hunt| !needle.is_empty() && hunt.title.to_lowercase().contains(&needle));
    title_hits.extend(other_hits);
    title_hits
}

pub fn unique_tactics(records: &[Hunt]) -> BTreeSet<String> {
    records
        .iter()
        .flat_map(|hunt| hunt.tactics())
        .map(str::to_string)
        .collect()
}

pub fn unique_tags(records: &[Hunt]) -> BTreeSet<String> {
    records
        .iter()
        .flat_map(|hunt| hunt.tags.iter())
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn unique_contributors(records: &[Hunt]) -> BTreeSet<String> {
    records
        .iter()
        .map(|hunt| hunt.submitter.name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
