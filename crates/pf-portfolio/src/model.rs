//! Portfolio Model
//!
//! Achievements and reflections share one entry shape; reflections use
//! `mood` and `linked_achievement`, achievements use `category` and `status`.

use pf_attachments::{AttachmentRef, AttachmentRole};
use pf_core::{generate_entry_id, Collection, CoreError, CoreResult, EntryId};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Status assigned to entries that do not declare one
pub const DEFAULT_STATUS: &str = "completed";

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

/// An achievement or reflection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    /// ISO date (`YYYY-MM-DD`) as entered
    #[serde(default)]
    pub date: String,
    /// Achievement description or reflection content
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_achievement: Option<EntryId>,
    #[serde(default)]
    pub images: Vec<AttachmentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<AttachmentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppt: Option<AttachmentRef>,
}

impl Entry {
    /// Create an entry with a fresh id
    pub fn new(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id: generate_entry_id(),
            title: title.into(),
            category: String::new(),
            date: date.into(),
            description: String::new(),
            status: default_status(),
            mood: None,
            linked_achievement: None,
            images: Vec::new(),
            pdf: None,
            ppt: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<EntryId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn linked_to(mut self, achievement_id: impl Into<EntryId>) -> Self {
        self.linked_achievement = Some(achievement_id.into());
        self
    }

    pub fn with_attachment(mut self, role: AttachmentRole, attachment: AttachmentRef) -> Self {
        match role {
            AttachmentRole::Pdf => self.pdf = Some(attachment),
            AttachmentRole::Ppt => self.ppt = Some(attachment),
        }
        self
    }

    pub fn attachment(&self, role: AttachmentRole) -> Option<&AttachmentRef> {
        match role {
            AttachmentRole::Pdf => self.pdf.as_ref(),
            AttachmentRole::Ppt => self.ppt.as_ref(),
        }
    }

    pub fn has_attachments(&self) -> bool {
        self.pdf.is_some() || self.ppt.is_some()
    }
}

/// Profile fields shown in the personal section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub first_name: String,
    pub title: String,
    pub bio: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
}

impl PersonalInfo {
    /// Avatar fallback text: first letter of the first name
    pub fn initials(&self) -> String {
        self.first_name
            .trim()
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }
}

/// Whether an upsert created or replaced an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

/// Everything the page holds in memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortfolioData {
    pub achievements: Vec<Entry>,
    pub reflections: Vec<Entry>,
    pub personal_info: PersonalInfo,
    pub profile_photo: Option<String>,
}

impl PortfolioData {
    pub fn entries(&self, collection: Collection) -> &[Entry] {
        match collection {
            Collection::Achievements => &self.achievements,
            Collection::Reflections => &self.reflections,
        }
    }

    fn entries_mut(&mut self, collection: Collection) -> &mut Vec<Entry> {
        match collection {
            Collection::Achievements => &mut self.achievements,
            Collection::Reflections => &mut self.reflections,
        }
    }

    pub fn find(&self, collection: Collection, id: &str) -> Option<&Entry> {
        self.entries(collection).iter().find(|e| e.id == id)
    }

    pub fn find_achievement(&self, id: &str) -> Option<&Entry> {
        self.find(Collection::Achievements, id)
    }

    pub fn find_reflection(&self, id: &str) -> Option<&Entry> {
        self.find(Collection::Reflections, id)
    }

    /// Replace the entry with the same id, or append it
    pub fn upsert(&mut self, collection: Collection, entry: Entry) -> Upsert {
        let entries = self.entries_mut(collection);
        let outcome = match entries.iter().position(|e| e.id == entry.id) {
            Some(pos) => {
                entries[pos] = entry;
                Upsert::Updated
            }
            None => {
                entries.push(entry);
                Upsert::Created
            }
        };
        info!(collection = %collection, outcome = ?outcome, "Entry saved");
        outcome
    }

    pub fn upsert_achievement(&mut self, entry: Entry) -> Upsert {
        self.upsert(Collection::Achievements, entry)
    }

    /// Save a reflection; a link to an unknown achievement is dropped
    pub fn upsert_reflection(&mut self, mut entry: Entry) -> Upsert {
        if let Some(linked) = entry.linked_achievement.as_deref() {
            if self.find_achievement(linked).is_none() {
                entry.linked_achievement = None;
            }
        }
        self.upsert(Collection::Reflections, entry)
    }

    pub fn delete(&mut self, collection: Collection, id: &str) -> CoreResult<Entry> {
        let entries = self.entries_mut(collection);
        let pos = entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CoreError::not_found(collection.singular(), id))?;
        let removed = entries.remove(pos);
        info!(collection = %collection, id = %id, "Entry deleted");
        Ok(removed)
    }

    /// Delete an achievement and unlink reflections that pointed to it
    pub fn delete_achievement(&mut self, id: &str) -> CoreResult<Entry> {
        let removed = self.delete(Collection::Achievements, id)?;
        for reflection in &mut self.reflections {
            if reflection.linked_achievement.as_deref() == Some(id) {
                reflection.linked_achievement = None;
            }
        }
        Ok(removed)
    }

    pub fn delete_reflection(&mut self, id: &str) -> CoreResult<Entry> {
        self.delete(Collection::Reflections, id)
    }

    /// `(id, title)` pairs offered when linking a reflection to an achievement
    pub fn linkable_achievements(&self) -> Vec<(&str, &str)> {
        self.achievements
            .iter()
            .map(|a| (a.id.as_str(), a.title.as_str()))
            .collect()
    }
}
