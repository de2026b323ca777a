//! Attachment Resolver
//!
//! Turns an [`AttachmentRef`] into a URL a user agent can open or download,
//! and owns every ephemeral URL it allocates on the way.
//!
//! Each cache key holds at most one live URL. Resolving a key again releases
//! the previous URL before allocating the next one, and [`AttachmentResolver::clear_all`]
//! releases everything before a collection is rendered from scratch.

use std::collections::HashMap;
use std::sync::Arc;

use pf_core::config::AttachmentSettings;
use tracing::{debug, warn};

use crate::decode::{decode_base64, decode_data_uri, DecodeError, DEFAULT_MEDIA_TYPE};
use crate::handles::{Blob, ObjectUrlRegistry};
use crate::model::AttachmentRef;

/// A URL ready to be used as a link target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttachment {
    pub url: String,
    /// Filename declared by the enclosing record, if any
    pub filename: Option<String>,
    /// Media type of the allocated blob, or the declared type for passthrough URLs
    pub media_type: Option<String>,
    /// Whether the resolver allocated (and will revoke) this URL
    pub owned: bool,
}

/// Outcome of classifying one attachment value
#[derive(Debug)]
enum Classified {
    Passthrough(String),
    Allocate(Blob),
    Malformed(DecodeError),
}

/// Metadata inherited from enclosing `Wrapped` records
#[derive(Debug, Clone, Copy, Default)]
struct Hints<'a> {
    name: Option<&'a str>,
    media_type: Option<&'a str>,
}

/// Resolver with a per-key cache of allocated URLs
pub struct AttachmentResolver<R: ObjectUrlRegistry> {
    registry: Arc<R>,
    urls: HashMap<String, String>,
    default_media_type: String,
}

impl<R: ObjectUrlRegistry> AttachmentResolver<R> {
    pub fn new(registry: Arc<R>) -> Self {
        Self {
            registry,
            urls: HashMap::new(),
            default_media_type: DEFAULT_MEDIA_TYPE.to_string(),
        }
    }

    pub fn from_settings(registry: Arc<R>, settings: &AttachmentSettings) -> Self {
        Self::new(registry).with_default_media_type(settings.default_media_type.clone())
    }

    /// Media type for payloads that declare none
    pub fn with_default_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.default_media_type = media_type.into();
        self
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    /// Resolve an attachment for a cache slot
    ///
    /// Returns `None` for a missing attachment, an empty key, an undecodable
    /// payload or a failed allocation. None of these touch the cache, except
    /// that a failed allocation has already released the previous URL.
    pub fn resolve(
        &mut self,
        key: &str,
        attachment: Option<&AttachmentRef>,
    ) -> Option<ResolvedAttachment> {
        let attachment = attachment?;

        if key.is_empty() {
            warn!("Attachment resolution requested with an empty key");
            return None;
        }

        let filename = outer_name(attachment).map(str::to_string);

        match self.classify(attachment, Hints::default()) {
            Classified::Passthrough(url) => {
                if url.is_empty() {
                    return None;
                }
                Some(ResolvedAttachment {
                    url,
                    filename,
                    media_type: attachment.media_type().map(str::to_string),
                    owned: false,
                })
            }
            Classified::Malformed(err) => {
                warn!(key = %key, error = %err, "Attachment payload could not be decoded");
                None
            }
            Classified::Allocate(blob) => {
                self.release(key);

                let media_type = blob.media_type.clone();
                let size = blob.len();
                match self.registry.create_object_url(blob) {
                    Ok(url) => {
                        debug!(
                            key = %key,
                            registry = self.registry.name(),
                            size = size,
                            "Attachment URL allocated"
                        );
                        self.urls.insert(key.to_string(), url.clone());
                        Some(ResolvedAttachment {
                            url,
                            filename,
                            media_type: Some(media_type),
                            owned: true,
                        })
                    }
                    Err(e) => {
                        warn!(key = %key, error = %e, "Attachment URL allocation failed");
                        None
                    }
                }
            }
        }
    }

    /// Resolve and keep only the URL
    pub fn resolve_url(&mut self, key: &str, attachment: Option<&AttachmentRef>) -> Option<String> {
        self.resolve(key, attachment).map(|r| r.url)
    }

    /// Release the URL held for a key; returns whether one was held
    ///
    /// Revoke failures are logged and the handle is dropped from tracking anyway.
    pub fn release(&mut self, key: &str) -> bool {
        match self.urls.remove(key) {
            Some(url) => {
                self.revoke(key, &url);
                true
            }
            None => false,
        }
    }

    /// Release every URL; returns how many were held
    pub fn clear_all(&mut self) -> usize {
        let drained: Vec<(String, String)> = self.urls.drain().collect();
        let count = drained.len();

        for (key, url) in drained {
            self.revoke(&key, &url);
        }

        if count > 0 {
            debug!(count = count, "Attachment URLs cleared");
        }
        count
    }

    pub fn url_for(&self, key: &str) -> Option<&str> {
        self.urls.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.urls.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    fn revoke(&self, key: &str, url: &str) {
        if let Err(e) = self.registry.revoke_object_url(url) {
            debug!(key = %key, error = %e, "Revoke failed, dropping handle");
        }
    }

    fn classify(&self, attachment: &AttachmentRef, hints: Hints<'_>) -> Classified {
        match attachment {
            AttachmentRef::Wrapped(wrapped) => {
                let hints = Hints {
                    name: hints.name.or(wrapped.name.as_deref()),
                    media_type: hints.media_type.or(wrapped.media_type.as_deref()),
                };
                self.classify(&wrapped.data, hints)
            }
            AttachmentRef::PlainUrl(url) => Classified::Passthrough(url.clone()),
            AttachmentRef::DataUri(uri) => match decode_data_uri(uri) {
                Ok(decoded) => {
                    let media_type = decoded
                        .media_type
                        .unwrap_or_else(|| self.fallback_media_type(hints));
                    Classified::Allocate(Blob::new(decoded.bytes, media_type))
                }
                Err(e) => Classified::Malformed(e),
            },
            AttachmentRef::Base64Text {
                payload,
                media_type,
            } => match decode_base64(payload) {
                Ok(bytes) => {
                    let media_type = media_type
                        .clone()
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| self.fallback_media_type(hints));
                    Classified::Allocate(Blob::new(bytes, media_type))
                }
                Err(e) => Classified::Malformed(e),
            },
            AttachmentRef::EncodedBlob { bytes, media_type } => {
                let media_type = if media_type.is_empty() {
                    self.fallback_media_type(hints)
                } else {
                    media_type.clone()
                };
                Classified::Allocate(Blob::new(bytes.clone(), media_type))
            }
            AttachmentRef::Opaque(text) => Classified::Passthrough(text.clone()),
        }
    }

    /// Wrapper type, then a guess from the wrapper's filename, then the default
    fn fallback_media_type(&self, hints: Hints<'_>) -> String {
        if let Some(media_type) = hints.media_type {
            return media_type.to_string();
        }
        hints
            .name
            .and_then(|name| mime_guess::from_path(name).first())
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| self.default_media_type.clone())
    }
}

impl<R: ObjectUrlRegistry> Drop for AttachmentResolver<R> {
    fn drop(&mut self) {
        self.clear_all();
    }
}

fn outer_name(attachment: &AttachmentRef) -> Option<&str> {
    match attachment {
        AttachmentRef::Wrapped(w) => w.name.as_deref().or_else(|| outer_name(&w.data)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::{HandleError, MemoryUrlRegistry, MockObjectUrlRegistry};

    fn create_resolver() -> (Arc<MemoryUrlRegistry>, AttachmentResolver<MemoryUrlRegistry>) {
        let registry = Arc::new(MemoryUrlRegistry::new("test"));
        let resolver = AttachmentResolver::new(registry.clone());
        (registry, resolver)
    }

    fn mock_registry() -> MockObjectUrlRegistry {
        let mut registry = MockObjectUrlRegistry::new();
        registry.expect_name().return_const("mock".to_string());
        registry
    }

    fn pdf_data_uri() -> AttachmentRef {
        AttachmentRef::from_text("data:application/pdf;base64,AAAA")
    }

    #[test]
    fn test_missing_attachment_is_none_without_mutation() {
        let (registry, mut resolver) = create_resolver();

        assert_eq!(resolver.resolve("1-pdf", None), None);
        assert!(resolver.is_empty());
        assert_eq!(registry.allocated_count(), 0);
    }

    #[test]
    fn test_plain_url_is_returned_verbatim_and_not_cached() {
        let (registry, mut resolver) = create_resolver();
        let attachment = AttachmentRef::url("https://example.com/a.pdf");

        let resolved = resolver.resolve("1-pdf", Some(&attachment)).unwrap();

        assert_eq!(resolved.url, "https://example.com/a.pdf");
        assert!(!resolved.owned);
        assert!(!resolver.contains_key("1-pdf"));
        assert_eq!(registry.allocated_count(), 0);

        assert_eq!(resolver.clear_all(), 0);
        assert_eq!(registry.revocation_count("https://example.com/a.pdf"), 0);
    }

    #[test]
    fn test_blob_url_text_is_passthrough() {
        let (_registry, mut resolver) = create_resolver();
        let attachment = AttachmentRef::from_text("blob:elsewhere/123");

        let url = resolver.resolve_url("1-pdf", Some(&attachment));

        assert_eq!(url.as_deref(), Some("blob:elsewhere/123"));
        assert!(resolver.is_empty());
    }

    #[test]
    fn test_data_uri_allocates_distinct_handle() {
        let (registry, mut resolver) = create_resolver();

        let resolved = resolver.resolve("1-pdf", Some(&pdf_data_uri())).unwrap();

        assert_ne!(resolved.url, "data:application/pdf;base64,AAAA");
        assert!(resolved.owned);
        assert_eq!(resolved.media_type.as_deref(), Some("application/pdf"));
        assert_eq!(resolver.url_for("1-pdf"), Some(resolved.url.as_str()));
        assert_eq!(registry.get(&resolved.url).unwrap().bytes.as_ref(), &[0, 0, 0]);
    }

    #[test]
    fn test_bare_base64_with_declared_type() {
        let (registry, mut resolver) = create_resolver();
        let attachment = AttachmentRef::base64("AAAA==", Some("application/pdf"));

        let resolved = resolver.resolve("1-pdf", Some(&attachment)).unwrap();

        assert!(resolved.owned);
        let blob = registry.get(&resolved.url).unwrap();
        assert_eq!(blob.media_type, "application/pdf");
        assert_eq!(blob.bytes.as_ref(), &[0, 0, 0]);
    }

    #[test]
    fn test_invalid_base64_is_none() {
        let (registry, mut resolver) = create_resolver();
        let attachment = AttachmentRef::base64("not base64!!", Some("application/pdf"));

        assert_eq!(resolver.resolve("1-pdf", Some(&attachment)), None);
        assert!(resolver.is_empty());
        assert_eq!(registry.allocated_count(), 0);
    }

    #[test]
    fn test_malformed_data_uri_is_none() {
        let (_registry, mut resolver) = create_resolver();
        let attachment = AttachmentRef::from_text("data:application/pdf;base64,%%%");

        assert_eq!(resolver.resolve("1-pdf", Some(&attachment)), None);
        assert!(resolver.is_empty());
    }

    #[test]
    fn test_empty_data_uri_allocates_empty_blob() {
        let (registry, mut resolver) = create_resolver();
        let attachment = AttachmentRef::from_text("data:application/pdf;base64,");

        let resolved = resolver.resolve("1-pdf", Some(&attachment)).unwrap();

        assert!(resolved.owned);
        let blob = registry.get(&resolved.url).unwrap();
        assert!(blob.is_empty());
        assert_eq!(blob.media_type, "application/pdf");
    }

    #[test]
    fn test_data_uri_extra_segments_are_ignored() {
        let (registry, mut resolver) = create_resolver();
        let attachment = AttachmentRef::from_text("data:application/pdf;base64,AAAA,BBBB");

        let url = resolver.resolve_url("1-pdf", Some(&attachment)).unwrap();

        assert_eq!(registry.get(&url).unwrap().bytes.as_ref(), &[0, 0, 0]);
    }

    #[test]
    fn test_overlong_padding_is_none() {
        let (registry, mut resolver) = create_resolver();
        let attachment = AttachmentRef::base64("QUI==", Some("text/plain"));

        assert_eq!(resolver.resolve("1-pdf", Some(&attachment)), None);
        assert_eq!(registry.allocated_count(), 0);
    }

    #[test]
    fn test_unknown_text_is_passthrough() {
        let (registry, mut resolver) = create_resolver();
        let attachment = AttachmentRef::from_text("not base64!!");

        let resolved = resolver.resolve("1-pdf", Some(&attachment)).unwrap();

        assert_eq!(resolved.url, "not base64!!");
        assert!(!resolved.owned);
        assert_eq!(registry.allocated_count(), 0);
    }

    #[test]
    fn test_empty_text_is_none() {
        let (_registry, mut resolver) = create_resolver();
        let attachment = AttachmentRef::wrapped(Some("a.pdf"), None, AttachmentRef::from_text(""));

        assert_eq!(resolver.resolve("1-pdf", Some(&attachment)), None);
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let (registry, mut resolver) = create_resolver();

        assert_eq!(resolver.resolve("", Some(&pdf_data_uri())), None);
        assert_eq!(registry.allocated_count(), 0);
    }

    #[test]
    fn test_wrapped_metadata_and_type_fallback() {
        let (registry, mut resolver) = create_resolver();
        let attachment = AttachmentRef::wrapped(
            Some("slides.pptx"),
            Some("application/vnd.ms-powerpoint"),
            AttachmentRef::from_text("AAAA"),
        );

        let resolved = resolver.resolve("7-ppt", Some(&attachment)).unwrap();

        assert_eq!(resolved.filename.as_deref(), Some("slides.pptx"));
        assert_eq!(
            registry.get(&resolved.url).unwrap().media_type,
            "application/vnd.ms-powerpoint"
        );
    }

    #[test]
    fn test_type_guessed_from_wrapper_name() {
        let (registry, mut resolver) = create_resolver();
        let attachment =
            AttachmentRef::wrapped(Some("report.pdf"), None, AttachmentRef::blob(vec![1u8, 2], ""));

        let resolved = resolver.resolve("7-pdf", Some(&attachment)).unwrap();

        assert_eq!(registry.get(&resolved.url).unwrap().media_type, "application/pdf");
    }

    #[test]
    fn test_default_media_type_when_nothing_declared() {
        let (registry, mut resolver) = create_resolver();
        let attachment = AttachmentRef::blob(vec![9u8], "");

        let resolved = resolver.resolve("7-pdf", Some(&attachment)).unwrap();

        assert_eq!(
            registry.get(&resolved.url).unwrap().media_type,
            DEFAULT_MEDIA_TYPE
        );
    }

    #[test]
    fn test_data_uri_header_wins_over_wrapper_type() {
        let (registry, mut resolver) = create_resolver();
        let attachment = AttachmentRef::wrapped(None, Some("image/png"), pdf_data_uri());

        let resolved = resolver.resolve("1-pdf", Some(&attachment)).unwrap();

        assert_eq!(registry.get(&resolved.url).unwrap().media_type, "application/pdf");
    }

    #[test]
    fn test_reresolve_releases_previous_handle() {
        let (registry, mut resolver) = create_resolver();

        let first = resolver.resolve_url("1-pdf", Some(&pdf_data_uri())).unwrap();
        let second = resolver
            .resolve_url("1-pdf", Some(&AttachmentRef::base64("QUJD", Some("text/plain"))))
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(registry.revocation_count(&first), 1);
        assert!(registry.is_live(&second));
        assert_eq!(registry.live_count(), 1);
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_malformed_reresolve_keeps_previous_handle() {
        let (registry, mut resolver) = create_resolver();

        let first = resolver.resolve_url("1-pdf", Some(&pdf_data_uri())).unwrap();
        let bad = AttachmentRef::base64("@@@@", None);
        assert_eq!(resolver.resolve_url("1-pdf", Some(&bad)), None);

        assert!(registry.is_live(&first));
        assert_eq!(resolver.url_for("1-pdf"), Some(first.as_str()));
    }

    #[test]
    fn test_clear_all_revokes_each_handle_once() {
        let (registry, mut resolver) = create_resolver();

        let urls: Vec<String> = (0..3)
            .map(|i| {
                resolver
                    .resolve_url(&format!("{}-pdf", i), Some(&pdf_data_uri()))
                    .unwrap()
            })
            .collect();

        assert_eq!(resolver.clear_all(), 3);
        assert!(resolver.is_empty());
        for url in &urls {
            assert_eq!(registry.revocation_count(url), 1);
        }
        assert_eq!(registry.live_count(), 0);

        // First use again: nothing to release
        let again = resolver.resolve_url("0-pdf", Some(&pdf_data_uri())).unwrap();
        assert_eq!(registry.revocation_count(&again), 0);
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_release_single_key() {
        let (registry, mut resolver) = create_resolver();
        let url = resolver.resolve_url("1-pdf", Some(&pdf_data_uri())).unwrap();

        assert!(resolver.release("1-pdf"));
        assert!(!resolver.release("1-pdf"));
        assert_eq!(registry.revocation_count(&url), 1);
    }

    #[test]
    fn test_drop_releases_handles() {
        let registry = Arc::new(MemoryUrlRegistry::default());
        {
            let mut resolver = AttachmentResolver::new(registry.clone());
            resolver.resolve_url("1-pdf", Some(&pdf_data_uri())).unwrap();
            resolver.resolve_url("1-ppt", Some(&pdf_data_uri())).unwrap();
            assert_eq!(registry.live_count(), 2);
        }
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_same_ref_twice_releases_once_and_allocates_once() {
        let mut registry = mock_registry();
        let mut counter = 0;
        registry
            .expect_create_object_url()
            .times(2)
            .returning(move |_| {
                counter += 1;
                Ok(format!("blob:mock/{}", counter))
            });
        registry
            .expect_revoke_object_url()
            .withf(|url| url == "blob:mock/1")
            .times(1)
            .returning(|_| Ok(()));
        registry
            .expect_revoke_object_url()
            .withf(|url| url == "blob:mock/2")
            .times(1)
            .returning(|_| Ok(()));

        let mut resolver = AttachmentResolver::new(Arc::new(registry));
        let attachment = pdf_data_uri();

        assert_eq!(
            resolver.resolve_url("1-pdf", Some(&attachment)).as_deref(),
            Some("blob:mock/1")
        );
        assert_eq!(
            resolver.resolve_url("1-pdf", Some(&attachment)).as_deref(),
            Some("blob:mock/2")
        );
        assert_eq!(resolver.len(), 1);
        // "blob:mock/2" is revoked when the resolver drops
    }

    #[test]
    fn test_revoke_failure_is_swallowed() {
        let mut registry = mock_registry();
        registry
            .expect_create_object_url()
            .times(1)
            .returning(|_| Ok("blob:mock/1".to_string()));
        registry
            .expect_revoke_object_url()
            .times(1)
            .returning(|url| Err(HandleError::Backend(format!("cannot revoke {}", url))));

        let mut resolver = AttachmentResolver::new(Arc::new(registry));
        resolver.resolve_url("1-pdf", Some(&pdf_data_uri())).unwrap();

        assert_eq!(resolver.clear_all(), 1);
        assert!(resolver.is_empty());
    }

    #[test]
    fn test_allocation_failure_is_none() {
        let mut registry = mock_registry();
        registry
            .expect_create_object_url()
            .times(1)
            .returning(|_| Err(HandleError::AllocationFailed("out of memory".to_string())));

        let mut resolver = AttachmentResolver::new(Arc::new(registry));

        assert_eq!(resolver.resolve_url("1-pdf", Some(&pdf_data_uri())), None);
        assert!(resolver.is_empty());
    }
}
