use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::schema::Comment;

/// Sort direction for a single sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => f.write_str("asc"),
            Direction::Desc => f.write_str("desc"),
        }
    }
}

/// Comment properties a listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortProperty {
    Id,
    Text,
    CreationDate,
}

impl FromStr for SortProperty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortProperty::Id),
            "text" => Ok(SortProperty::Text),
            "creationDate" => Ok(SortProperty::CreationDate),
            other => Err(format!("unknown sort property '{}'", other)),
        }
    }
}

impl fmt::Display for SortProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortProperty::Id => f.write_str("id"),
            SortProperty::Text => f.write_str("text"),
            SortProperty::CreationDate => f.write_str("creationDate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub property: SortProperty,
    pub direction: Direction,
}

impl SortOrder {
    pub fn asc(property: SortProperty) -> Self {
        Self { property, direction: Direction::Asc }
    }

    pub fn desc(property: SortProperty) -> Self {
        Self { property, direction: Direction::Desc }
    }

    fn compare(&self, a: &Comment, b: &Comment) -> Ordering {
        let ordering = match self.property {
            SortProperty::Id => a.id.cmp(&b.id),
            SortProperty::Text => a.text.cmp(&b.text),
            SortProperty::CreationDate => a.creation_date.cmp(&b.creation_date),
        };
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// Page request: zero-based page index, page size and sort keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pageable {
    pub page: usize,
    pub size: usize,
    pub sort: Vec<SortOrder>,
}

impl Pageable {
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size: size.max(1), sort: Vec::new() }
    }

    pub fn with_sort(mut self, order: SortOrder) -> Self {
        self.sort.push(order);
        self
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }

    /// Order `records` by the requested keys (ties by ascending id) and cut out this page
    pub fn apply(&self, mut records: Vec<Comment>) -> Page<Comment> {
        records.sort_by(|a, b| {
            self.sort
                .iter()
                .map(|order| order.compare(a, b))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or_else(|| a.id.cmp(&b.id))
        });

        let total = records.len() as u64;
        let content = records
            .into_iter()
            .skip(self.offset())
            .take(self.size)
            .collect();

        Page { content, total, page: self.page, size: self.size }
    }
}

impl Default for Pageable {
    fn default() -> Self {
        Self::new(0, 20)
    }
}

/// One page of results plus the total number of matches
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total: u64,
    pub page: usize,
    pub size: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        if self.size == 0 {
            return 0;
        }
        (self.total as usize).div_ceil(self.size)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages().saturating_sub(1)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }
}
