//! Catalog filtering.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use lyceum_types::Course;

/// Price split of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceFilter {
    #[default]
    All,
    Free,
    Paid,
}

impl PriceFilter {
    pub fn matches(self, course: &Course) -> bool {
        match self {
            PriceFilter::All => true,
            PriceFilter::Free => course.is_free,
            PriceFilter::Paid => !course.is_free,
        }
    }
}

impl FromStr for PriceFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(PriceFilter::All),
            "free" => Ok(PriceFilter::Free),
            "paid" => Ok(PriceFilter::Paid),
            other => Err(format!("unknown price filter '{}' (all, free, paid)", other)),
        }
    }
}

impl fmt::Display for PriceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PriceFilter::All => "all",
            PriceFilter::Free => "free",
            PriceFilter::Paid => "paid",
        })
    }
}

/// Browse filter over the course catalog.
///
/// Search is a case-insensitive substring match on title or description.
/// Category and difficulty match exactly; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub search: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub price: PriceFilter,
}

impl CatalogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = query.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = Some(difficulty.into());
        self
    }

    pub fn price(mut self, price: PriceFilter) -> Self {
        self.price = price;
        self
    }

    pub fn matches(&self, course: &Course) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = course.title.to_lowercase().contains(&needle)
            || course.description.to_lowercase().contains(&needle);
        let matches_category = self.category.as_ref().is_none_or(|c| &course.category == c);
        let matches_difficulty = self
            .difficulty
            .as_ref()
            .is_none_or(|d| &course.difficulty == d);

        matches_search && matches_category && matches_difficulty && self.price.matches(course)
    }

    /// Courses passing the filter, in catalog order.
    pub fn apply<'a>(&self, courses: &'a [Course]) -> Vec<&'a Course> {
        courses.iter().filter(|c| self.matches(c)).collect()
    }
}

/// Distinct categories in first-seen order.
pub fn categories(courses: &[Course]) -> Vec<String> {
    distinct(courses.iter().map(|c| c.category.as_str()))
}

/// Distinct difficulty levels in first-seen order.
pub fn difficulties(courses: &[Course]) -> Vec<String> {
    distinct(courses.iter().map(|c| c.difficulty.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// Split into (free, paid), keeping order.
pub fn split_by_price<'a>(courses: &[&'a Course]) -> (Vec<&'a Course>, Vec<&'a Course>) {
    courses.iter().copied().partition(|c| c.is_free)
}
