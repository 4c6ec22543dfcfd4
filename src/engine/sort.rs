use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::catalog::Hunt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortKey {
    #[default]
    Id,
    Title,
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Sort key plus direction, written as `key-direction` (e.g. `id-desc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub const fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn compare(&self, a: &Hunt, b: &Hunt) -> Ordering {
        let ordering = match self.key {
            SortKey::Id => compare_ids(&a.id, &b.id),
            SortKey::Title => compare_case_insensitive(&a.title, &b.title),
            SortKey::Category => compare_case_insensitive(category_key(a), category_key(b)),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.key, self.direction)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort order '{0}' (expected id|title|category with optional -asc|-desc)")]
pub struct ParseSortError(String);

impl FromStr for SortSpec {
    type Err = ParseSortError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let (key, direction) = match trimmed.split_once('-') {
            Some((key, direction)) => (key, Some(direction)),
            None => (trimmed, None),
        };
        let key = key
            .parse::<SortKey>()
            .map_err(|_| ParseSortError(raw.to_string()))?;
        let direction = match direction {
            Some(direction) => direction
                .parse::<SortDirection>()
                .map_err(|_| ParseSortError(raw.to_string()))?,
            None => SortDirection::Asc,
        };
        Ok(Self { key, direction })
    }
}

/// Stable sort of dataset indices; equal records keep their dataset order.
pub fn sort_indices(records: &[Hunt], indices: &mut [usize], sort: SortSpec) {
    indices.sort_by(|&a, &b| sort.compare(&records[a], &records[b]));
}

/// Compare hunt ids by alphabetic prefix first, then by the numeric suffix
/// as an integer, so `H2` sorts before `H10`.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    let (prefix_a, number_a, rest_a) = split_id(a);
    let (prefix_b, number_b, rest_b) = split_id(b);
    prefix_a
        .cmp(prefix_b)
        .then_with(|| number_a.cmp(&number_b))
        .then_with(|| rest_a.cmp(rest_b))
}

fn split_id(id: &str) -> (&str, Option<u64>, &str) {
    let id = id.trim();
    let boundary = id
        .char_indices()
        .find(|(_, ch)| !ch.is_alphabetic())
        .map(|(idx, _)| idx)
        .unwrap_or(id.len());
    let (prefix, rest) = id.split_at(boundary);
    let number = if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
        rest.parse::<u64>().ok()
    } else {
        None
    };
    (prefix, number, rest)
}

fn compare_case_insensitive(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn category_key(hunt: &Hunt) -> &str {
    hunt.category
        .as_ref()
        .map(|category| category.as_ref())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;

    fn hunt(id: &str, title: &str) -> Hunt {
        Hunt {
            id: id.into(),
            title: title.into(),
            ..Hunt::default()
        }
    }

    fn sorted_ids(records: &[Hunt], sort: SortSpec) -> Vec<&str> {
        let mut indices: Vec<usize> = (0..records.len()).collect();
        sort_indices(records, &mut indices, sort);
        indices.iter().map(|&idx| records[idx].id.as_str()).collect()
    }

    #[test]
    fn id_sort_is_numeric_aware() {
        let records = vec![hunt("H2", ""), hunt("H10", ""), hunt("H1", "")];
        let ids = sorted_ids(&records, SortSpec::new(SortKey::Id, SortDirection::Asc));
        assert_eq!(ids, vec!["H1", "H2", "H10"]);
    }

    #[test]
    fn id_sort_groups_by_prefix_before_number() {
        let records = vec![hunt("M001", ""), hunt("H010", ""), hunt("B002", ""), hunt("H002", "")];
        let ids = sorted_ids(&records, SortSpec::new(SortKey::Id, SortDirection::Desc));
        assert_eq!(ids, vec!["M001", "H010", "H002", "B002"]);
    }

    #[test]
    fn ids_without_numbers_sort_before_numbered_ones() {
        assert_eq!(compare_ids("H", "H1"), Ordering::Less);
        assert_eq!(compare_ids("Hx", "H1"), Ordering::Greater);
        assert_eq!(compare_ids("H01", "H1"), Ordering::Less);
    }

    #[test]
    fn title_sort_ignores_case_and_is_stable() {
        let records = vec![
            hunt("H1", "beta"),
            hunt("H2", "Alpha"),
            hunt("H3", "BETA"),
            hunt("H4", "alpha"),
        ];
        let asc = sorted_ids(&records, SortSpec::new(SortKey::Title, SortDirection::Asc));
        assert_eq!(asc, vec!["H2", "H4", "H1", "H3"]);
        let desc = sorted_ids(&records, SortSpec::new(SortKey::Title, SortDirection::Desc));
        assert_eq!(desc, vec!["H1", "H3", "H2", "H4"]);
    }

    #[test]
    fn category_sort_puts_missing_categories_first() {
        let mut records = vec![hunt("H1", ""), hunt("H2", ""), hunt("H3", "")];
        records[0].category = Some(Category::Flames);
        records[2].category = Some(Category::Alchemy);
        let ids = sorted_ids(&records, SortSpec::new(SortKey::Category, SortDirection::Asc));
        assert_eq!(ids, vec!["H2", "H3", "H1"]);
    }

    #[test]
    fn parses_sort_spec_strings() {
        assert_eq!(
            "title-desc".parse::<SortSpec>(),
            Ok(SortSpec::new(SortKey::Title, SortDirection::Desc))
        );
        assert_eq!(
            "Category".parse::<SortSpec>(),
            Ok(SortSpec::new(SortKey::Category, SortDirection::Asc))
        );
        assert!("date-asc".parse::<SortSpec>().is_err());
        assert!("id-sideways".parse::<SortSpec>().is_err());
        assert_eq!(SortSpec::new(SortKey::Id, SortDirection::Desc).to_string(), "id-desc");
    }
}
