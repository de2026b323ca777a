//! Collection Render Pass
//!
//! Each collection owns its own resolver. A render pass clears that resolver
//! before resolving again, since the views holding the old URLs are about to
//! be replaced.

use std::sync::Arc;

use pf_attachments::{AttachmentLink, AttachmentResolver, AttachmentRole, LinkBuilder, ObjectUrlRegistry};
use pf_core::config::AttachmentSettings;
use pf_core::{Collection, EntryId};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::model::Entry;

/// Attachment links for one rendered entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryAttachments {
    pub entry_id: EntryId,
    pub links: Vec<AttachmentLink>,
}

/// Attachment slots rendered per entry, in display order
const ROLES: [AttachmentRole; 2] = [AttachmentRole::Pdf, AttachmentRole::Ppt];

/// View state for the achievements and reflections sections
pub struct PortfolioView<R: ObjectUrlRegistry> {
    achievements: AttachmentResolver<R>,
    reflections: AttachmentResolver<R>,
    links: LinkBuilder,
}

impl<R: ObjectUrlRegistry> PortfolioView<R> {
    pub fn new(registry: Arc<R>, settings: &AttachmentSettings) -> Self {
        Self {
            achievements: AttachmentResolver::from_settings(registry.clone(), settings),
            reflections: AttachmentResolver::from_settings(registry, settings),
            links: LinkBuilder::from_settings(settings),
        }
    }

    pub fn resolver(&self, collection: Collection) -> &AttachmentResolver<R> {
        match collection {
            Collection::Achievements => &self.achievements,
            Collection::Reflections => &self.reflections,
        }
    }

    /// Re-render a collection from scratch
    #[instrument(skip(self, entries), fields(count = entries.len()))]
    pub fn render(&mut self, collection: Collection, entries: &[Entry]) -> Vec<EntryAttachments> {
        let resolver = match collection {
            Collection::Achievements => &mut self.achievements,
            Collection::Reflections => &mut self.reflections,
        };

        let released = resolver.clear_all();

        let rendered: Vec<EntryAttachments> = entries
            .iter()
            .map(|entry| EntryAttachments {
                entry_id: entry.id.clone(),
                links: ROLES
                    .iter()
                    .filter_map(|&role| {
                        self.links.build(
                            resolver,
                            collection,
                            &entry.id,
                            role,
                            entry.attachment(role),
                        )
                    })
                    .collect(),
            })
            .collect();

        debug!(
            released = released,
            live = resolver.len(),
            "Collection attachments rendered"
        );
        rendered
    }

    pub fn render_achievements(&mut self, entries: &[Entry]) -> Vec<EntryAttachments> {
        self.render(Collection::Achievements, entries)
    }

    pub fn render_reflections(&mut self, entries: &[Entry]) -> Vec<EntryAttachments> {
        self.render(Collection::Reflections, entries)
    }
}
