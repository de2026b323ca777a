//! # pf-attachments
//!
//! Attachment resolution for Portfolio RS.
//!
//! ## Features
//!
//! - Tagged attachment values (`AttachmentRef`) with their saved JSON shape
//! - Data URI and bare base64 decoding
//! - Ephemeral URL registry abstraction (in-memory backend included)
//! - Per-slot URL cache with release-on-replace and bulk clearing
//! - Open/download link planning, including Office Online previews
//!
//! ## Example
//!
//! ```rust,ignore
//! use pf_attachments::{AttachmentRef, AttachmentResolver, MemoryUrlRegistry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(MemoryUrlRegistry::default());
//! let mut resolver = AttachmentResolver::new(registry);
//!
//! let pdf = AttachmentRef::from_text("data:application/pdf;base64,JVBERi0=");
//! let url = resolver.resolve_url("42-pdf", Some(&pdf));
//!
//! // Before re-rendering the collection
//! resolver.clear_all();
//! ```

pub mod decode;
pub mod handles;
pub mod links;
pub mod model;
pub mod resolver;

pub use decode::{
    decode_base64, decode_data_uri, encode_data_uri, is_bare_base64, DecodeError, DecodeResult,
    DecodedPayload, DEFAULT_MEDIA_TYPE,
};
pub use handles::{Blob, HandleError, HandleResult, MemoryUrlRegistry, ObjectUrlRegistry};
pub use links::{AttachmentLink, LinkBuilder};
pub use model::{is_navigable_url, AttachmentRef, AttachmentRole, WrappedAttachment};
pub use resolver::{AttachmentResolver, ResolvedAttachment};
