//! Search and Filters
//!
//! Case-insensitive text search plus exact category / mood matching.
//! Empty search or filter values match everything.

use serde::Serialize;

use crate::model::Entry;

/// Search text and an optional exact-match facet (category or mood)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    search: String,
    facet: String,
}

impl EntryFilter {
    pub fn new(search: &str, facet: &str) -> Self {
        Self {
            search: search.trim().to_lowercase(),
            facet: facet.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.facet.is_empty()
    }

    fn matches_search(&self, entry: &Entry) -> bool {
        self.search.is_empty()
            || entry.title.to_lowercase().contains(&self.search)
            || entry.description.to_lowercase().contains(&self.search)
    }

    fn matches_facet(&self, value: Option<&str>) -> bool {
        self.facet.is_empty() || value.map(str::to_lowercase).as_deref() == Some(self.facet.as_str())
    }

    /// Achievement match: search over title/description, facet is the category
    pub fn matches_achievement(&self, entry: &Entry) -> bool {
        self.matches_search(entry) && self.matches_facet(Some(&entry.category))
    }

    /// Reflection match: search over title/content, facet is the mood
    pub fn matches_reflection(&self, entry: &Entry) -> bool {
        self.matches_search(entry) && self.matches_facet(entry.mood.as_deref())
    }
}

pub fn filter_achievements<'a>(entries: &'a [Entry], search: &str, category: &str) -> Vec<&'a Entry> {
    let filter = EntryFilter::new(search, category);
    entries.iter().filter(|e| filter.matches_achievement(e)).collect()
}

pub fn filter_reflections<'a>(entries: &'a [Entry], search: &str, mood: &str) -> Vec<&'a Entry> {
    let filter = EntryFilter::new(search, mood);
    entries.iter().filter(|e| filter.matches_reflection(e)).collect()
}

/// Achievement counts for the category summary cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub academic: usize,
    pub clinical: usize,
    pub extracurricular: usize,
    pub research: usize,
}

impl CategoryCounts {
    /// Count achievements; unknown categories are not counted
    pub fn from_entries(entries: &[Entry]) -> Self {
        let mut counts = Self::default();
        for entry in entries {
            match entry.category.trim().to_lowercase().as_str() {
                "academic" => counts.academic += 1,
                "clinical" => counts.clinical += 1,
                "extracurricular" | "extracurriculars" => counts.extracurricular += 1,
                "research" => counts.research += 1,
                _ => {}
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.academic + self.clinical + self.extracurricular + self.research
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn achievements() -> Vec<Entry> {
        vec![
            Entry::new("Dean's List", "2024-01-05")
                .with_id("a1")
                .with_category("Academic")
                .with_description("Top grades in anatomy"),
            Entry::new("Ward rotation", "2024-02-10")
                .with_id("a2")
                .with_category("clinical"),
            Entry::new("Chess club", "2024-03-01")
                .with_id("a3")
                .with_category("extracurriculars"),
            Entry::new("Lab poster", "2024-04-20")
                .with_id("a4")
                .with_category("research")
                .with_description("Poster on anatomy education"),
        ]
    }

    fn ids(entries: Vec<&Entry>) -> Vec<&str> {
        entries.into_iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let entries = achievements();
        assert_eq!(filter_achievements(&entries, "", "").len(), 4);
        assert!(EntryFilter::new("  ", "").is_empty());
    }

    #[test]
    fn test_search_title_and_description() {
        let entries = achievements();
        assert_eq!(ids(filter_achievements(&entries, "ANATOMY", "")), vec!["a1", "a4"]);
        assert_eq!(ids(filter_achievements(&entries, "chess", "")), vec!["a3"]);
    }

    #[test]
    fn test_category_is_exact_and_case_insensitive() {
        let entries = achievements();
        assert_eq!(ids(filter_achievements(&entries, "", "academic")), vec!["a1"]);
        assert!(filter_achievements(&entries, "", "acad").is_empty());
        assert_eq!(ids(filter_achievements(&entries, "anatomy", "research")), vec!["a4"]);
    }

    #[test]
    fn test_reflection_mood_filter() {
        let reflections = vec![
            Entry::new("Hard week", "2024-01-01")
                .with_id("r1")
                .with_mood("Challenged")
                .with_description("Night shifts"),
            Entry::new("Win", "2024-01-08").with_id("r2").with_mood("proud"),
            Entry::new("Untagged", "2024-01-09").with_id("r3"),
        ];

        assert_eq!(ids(filter_reflections(&reflections, "", "challenged")), vec!["r1"]);
        assert_eq!(ids(filter_reflections(&reflections, "night", "")), vec!["r1"]);
        assert_eq!(filter_reflections(&reflections, "", "").len(), 3);
        assert!(filter_reflections(&reflections, "win", "challenged").is_empty());
    }

    #[test]
    fn test_category_counts() {
        let counts = CategoryCounts::from_entries(&achievements());
        assert_eq!(
            counts,
            CategoryCounts {
                academic: 1,
                clinical: 1,
                extracurricular: 1,
                research: 1,
            }
        );
        assert_eq!(counts.total(), 4);
    }
}
