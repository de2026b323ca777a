//! Loaded Data Normalization
//!
//! Upgrades portfolio JSON saved by older versions of the page to the
//! current shape. Anything unusable is dropped rather than rejected.

use chrono::Utc;
use pf_attachments::AttachmentRef;
use pf_core::{generate_entry_id, CoreResult};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::model::{Entry, PersonalInfo, PortfolioData, DEFAULT_STATUS};

const LEGACY_IMAGE_NAME: &str = "image";
const LEGACY_IMAGE_TYPE: &str = "image/jpeg";

/// Parse a portfolio JSON document and normalize it
pub fn parse_portfolio(json: &str) -> CoreResult<PortfolioData> {
    let raw: Value = serde_json::from_str(json)?;
    Ok(normalize_loaded_data(&raw))
}

/// Normalize a loaded portfolio document
pub fn normalize_loaded_data(raw: &Value) -> PortfolioData {
    let Some(obj) = raw.as_object() else {
        return PortfolioData::default();
    };

    let achievements = normalize_entries(obj.get("achievements"));
    let reflections = normalize_entries(obj.get("reflections"));

    let personal_info = match obj.get("personalInfo") {
        Some(info) if info.is_object() => serde_json::from_value::<PersonalInfo>(info.clone())
            .unwrap_or_else(|e| {
                warn!(error = %e, "Personal info could not be read, using defaults");
                PersonalInfo::default()
            }),
        _ => PersonalInfo::default(),
    };

    let profile_photo = obj
        .get("profilePhoto")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    debug!(
        achievements = achievements.len(),
        reflections = reflections.len(),
        "Portfolio data normalized"
    );

    PortfolioData {
        achievements,
        reflections,
        personal_info,
        profile_photo,
    }
}

fn normalize_entries(raw: Option<&Value>) -> Vec<Entry> {
    match raw.and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(Value::as_object)
            .map(normalize_entry)
            .collect(),
        None => Vec::new(),
    }
}

/// Normalize one entry object
pub fn normalize_entry(obj: &Map<String, Value>) -> Entry {
    let id = text_field(obj, "id").unwrap_or_else(generate_entry_id);

    let description = text_field(obj, "description")
        .or_else(|| text_field(obj, "content"))
        .unwrap_or_default();

    Entry {
        title: text_field(obj, "title").unwrap_or_default(),
        category: text_field(obj, "category").unwrap_or_default(),
        date: text_field(obj, "date").unwrap_or_else(today),
        description,
        status: text_field(obj, "status").unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        mood: text_field(obj, "mood"),
        linked_achievement: text_field(obj, "linkedAchievement"),
        images: normalize_images(&id, obj),
        pdf: attachment_field(&id, obj, "pdf"),
        ppt: attachment_field(&id, obj, "ppt"),
        id,
    }
}

/// Legacy single `image` becomes a one-element `images` list
fn normalize_images(id: &str, obj: &Map<String, Value>) -> Vec<AttachmentRef> {
    if let Some(images) = obj.get("images").filter(|v| is_truthy(v)) {
        return match images {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| parse_attachment(id, "images", item))
                .collect(),
            single => parse_attachment(id, "images", single).into_iter().collect(),
        };
    }

    match obj.get("image").filter(|v| is_truthy(v)) {
        Some(image) => migrate_legacy_image(id, image).into_iter().collect(),
        None => Vec::new(),
    }
}

fn migrate_legacy_image(id: &str, image: &Value) -> Option<AttachmentRef> {
    let name = image
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(LEGACY_IMAGE_NAME);
    let media_type = image
        .get("type")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(LEGACY_IMAGE_TYPE);
    let data = image.get("data").filter(|v| is_truthy(v)).unwrap_or(image);

    // Without `data` the record itself would become the image source, which
    // never renders; nothing is lost by dropping it
    if data.is_object() {
        warn!(id = %id, "Legacy image without data dropped");
        return None;
    }

    let inner = parse_attachment(id, "image", data)?;
    debug!(id = %id, "Legacy image migrated");
    Some(AttachmentRef::wrapped(Some(name), Some(media_type), inner))
}

fn attachment_field(id: &str, obj: &Map<String, Value>, field: &str) -> Option<AttachmentRef> {
    obj.get(field)
        .filter(|v| is_truthy(v))
        .and_then(|v| parse_attachment(id, field, v))
}

fn parse_attachment(id: &str, field: &str, value: &Value) -> Option<AttachmentRef> {
    match serde_json::from_value::<AttachmentRef>(value.clone()) {
        Ok(attachment) => Some(attachment),
        Err(e) => {
            warn!(id = %id, field = field, error = %e, "Unreadable attachment dropped");
            None
        }
    }
}

/// Strings as-is, numbers stringified; empty strings count as missing
fn text_field(obj: &Map<String, Value>, field: &str) -> Option<String> {
    match obj.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}
