//! Attachment Links
//!
//! Builds the open/download link pair shown for an entry's attachment.

use pf_core::config::{AttachmentSettings, DEFAULT_OFFICE_VIEWER_URL};
use pf_core::Collection;
use serde::Serialize;
use url::Url;

use crate::handles::ObjectUrlRegistry;
use crate::model::{AttachmentRef, AttachmentRole};
use crate::resolver::AttachmentResolver;

/// Link pair for one attachment slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentLink {
    pub role: AttachmentRole,
    pub filename: String,
    /// Target for the "open" action
    pub open_url: String,
    /// Target for the download action (always the resolved URL)
    pub download_url: String,
    /// Presentation that needs a publicly hosted copy before it can be previewed
    pub requires_upload: bool,
}

/// Builds links from resolved attachments
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    viewer: Url,
}

impl Default for LinkBuilder {
    fn default() -> Self {
        Self {
            viewer: Url::parse(DEFAULT_OFFICE_VIEWER_URL).unwrap(),
        }
    }
}

impl LinkBuilder {
    pub fn new(viewer: Url) -> Self {
        Self { viewer }
    }

    /// Builder from settings; an unparsable viewer URL falls back to the default
    pub fn from_settings(settings: &AttachmentSettings) -> Self {
        match Url::parse(&settings.office_viewer_url) {
            Ok(viewer) => Self::new(viewer),
            Err(e) => {
                tracing::warn!(error = %e, "Invalid office viewer URL, using default");
                Self::default()
            }
        }
    }

    /// Office Online viewer URL for a publicly reachable document
    pub fn office_viewer_url(&self, document_url: &str) -> String {
        let mut viewer = self.viewer.clone();
        viewer.query_pairs_mut().append_pair("src", document_url);
        viewer.to_string()
    }

    /// Resolve one slot and build its link; `None` when there is nothing to link
    pub fn build<R: ObjectUrlRegistry>(
        &self,
        resolver: &mut AttachmentResolver<R>,
        collection: Collection,
        entry_id: &str,
        role: AttachmentRole,
        attachment: Option<&AttachmentRef>,
    ) -> Option<AttachmentLink> {
        let resolved = resolver.resolve(&role.cache_key(entry_id), attachment)?;

        let filename = resolved.filename.unwrap_or_else(|| {
            format!("{}-{}.{}", collection.singular(), entry_id, role.as_str())
        });

        let previews = role.previews_in_office(&resolved.url);
        let open_url = if previews {
            self.office_viewer_url(&resolved.url)
        } else {
            resolved.url.clone()
        };

        Some(AttachmentLink {
            role,
            filename,
            open_url,
            download_url: resolved.url,
            requires_upload: role == AttachmentRole::Ppt && !previews,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::MemoryUrlRegistry;
    use std::sync::Arc;

    fn create_resolver() -> AttachmentResolver<MemoryUrlRegistry> {
        AttachmentResolver::new(Arc::new(MemoryUrlRegistry::default()))
    }

    #[test]
    fn test_pdf_link_uses_resolved_url() {
        let mut resolver = create_resolver();
        let attachment = AttachmentRef::wrapped(
            Some("thesis.pdf"),
            Some("application/pdf"),
            AttachmentRef::from_text("data:application/pdf;base64,JVBERi0="),
        );

        let link = LinkBuilder::default()
            .build(
                &mut resolver,
                Collection::Achievements,
                "42",
                AttachmentRole::Pdf,
                Some(&attachment),
            )
            .unwrap();

        assert_eq!(link.filename, "thesis.pdf");
        assert_eq!(link.open_url, link.download_url);
        assert!(link.download_url.starts_with("blob:"));
        assert!(!link.requires_upload);
        assert_eq!(resolver.url_for("42-pdf"), Some(link.download_url.as_str()));
    }

    #[test]
    fn test_ppt_over_http_opens_in_office_viewer() {
        let mut resolver = create_resolver();
        let attachment = AttachmentRef::url("https://cdn.example.com/deck one.pptx");

        let link = LinkBuilder::default()
            .build(
                &mut resolver,
                Collection::Reflections,
                "7",
                AttachmentRole::Ppt,
                Some(&attachment),
            )
            .unwrap();

        assert_eq!(link.filename, "reflection-7.ppt");
        assert_eq!(link.download_url, "https://cdn.example.com/deck one.pptx");
        assert_eq!(
            link.open_url,
            "https://view.officeapps.live.com/op/view.aspx?src=https%3A%2F%2Fcdn.example.com%2Fdeck+one.pptx"
        );
        assert!(!link.requires_upload);
    }

    #[test]
    fn test_local_ppt_requires_upload() {
        let mut resolver = create_resolver();
        let attachment = AttachmentRef::base64("AAAA", Some("application/vnd.ms-powerpoint"));

        let link = LinkBuilder::default()
            .build(
                &mut resolver,
                Collection::Achievements,
                "9",
                AttachmentRole::Ppt,
                Some(&attachment),
            )
            .unwrap();

        assert_eq!(link.filename, "achievement-9.ppt");
        assert_eq!(link.open_url, link.download_url);
        assert!(link.requires_upload);
    }

    #[test]
    fn test_missing_attachment_has_no_link() {
        let mut resolver = create_resolver();

        let link = LinkBuilder::default().build(
            &mut resolver,
            Collection::Achievements,
            "9",
            AttachmentRole::Pdf,
            None,
        );

        assert!(link.is_none());
    }

    #[test]
    fn test_custom_viewer_from_settings() {
        let settings = AttachmentSettings {
            office_viewer_url: "https://viewer.example.com/view".to_string(),
            ..AttachmentSettings::default()
        };

        let builder = LinkBuilder::from_settings(&settings);

        assert_eq!(
            builder.office_viewer_url("https://a.example/b.ppt"),
            "https://viewer.example.com/view?src=https%3A%2F%2Fa.example%2Fb.ppt"
        );
    }
}
