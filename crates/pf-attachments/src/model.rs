//! Attachment Model
//!
//! The shapes an attachment value can take once it has been captured from a
//! file input or loaded from a saved portfolio.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::decode::{encode_data_uri, is_bare_base64};

/// One referenced resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAttachment", into = "RawAttachment")]
pub enum AttachmentRef {
    /// Absolute http(s) URL or an already-ephemeral `blob:` URL
    PlainUrl(String),
    /// `data:` URI, decoded on resolution
    DataUri(String),
    /// Unprefixed base64 payload
    Base64Text {
        payload: String,
        media_type: Option<String>,
    },
    /// Raw bytes; an empty media type means undeclared
    EncodedBlob { bytes: Bytes, media_type: String },
    /// `{ name, type, data }` record produced by the file capture flow
    Wrapped(WrappedAttachment),
    /// Text of no recognized form
    Opaque(String),
}

/// Metadata record around an attachment payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedAttachment {
    pub name: Option<String>,
    pub media_type: Option<String>,
    pub data: Box<AttachmentRef>,
}

impl AttachmentRef {
    /// Classify trimmed text: navigable URL, data URI, bare base64, or opaque
    pub fn from_text(text: &str) -> Self {
        let s = text.trim();

        if is_navigable_url(s) {
            Self::PlainUrl(s.to_string())
        } else if s.starts_with("data:") {
            Self::DataUri(s.to_string())
        } else if is_bare_base64(s) {
            Self::Base64Text {
                payload: s.to_string(),
                media_type: None,
            }
        } else {
            Self::Opaque(s.to_string())
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::PlainUrl(url.into())
    }

    pub fn base64(payload: impl Into<String>, media_type: Option<&str>) -> Self {
        Self::Base64Text {
            payload: payload.into(),
            media_type: non_empty(media_type.map(str::to_string)),
        }
    }

    pub fn blob(bytes: impl Into<Bytes>, media_type: impl Into<String>) -> Self {
        Self::EncodedBlob {
            bytes: bytes.into(),
            media_type: media_type.into(),
        }
    }

    /// Wrap a payload with a filename and declared type
    pub fn wrapped(name: Option<&str>, media_type: Option<&str>, data: AttachmentRef) -> Self {
        Self::Wrapped(WrappedAttachment {
            name: non_empty(name.map(str::to_string)),
            media_type: non_empty(media_type.map(str::to_string)),
            data: Box::new(data),
        })
    }

    /// Filename carried by the outermost wrapper
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Wrapped(w) => w.name.as_deref(),
            _ => None,
        }
    }

    /// Media type carried by the outermost wrapper or the payload itself
    pub fn media_type(&self) -> Option<&str> {
        match self {
            Self::Wrapped(w) => w.media_type.as_deref().or_else(|| w.data.media_type()),
            Self::Base64Text { media_type, .. } => media_type.as_deref(),
            Self::EncodedBlob { media_type, .. } if !media_type.is_empty() => Some(media_type.as_str()),
            _ => None,
        }
    }
}

/// `http://`, `https://` and `blob:` URLs are usable as-is
pub fn is_navigable_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("blob:")
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Serialized shape: a string, a byte array, or a `{name, type, data}` record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawAttachment {
    Text(String),
    Bytes(Vec<u8>),
    Record {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
        media_type: Option<String>,
        data: Box<RawAttachment>,
    },
}

impl From<RawAttachment> for AttachmentRef {
    fn from(raw: RawAttachment) -> Self {
        match raw {
            RawAttachment::Text(text) => AttachmentRef::from_text(&text),
            RawAttachment::Bytes(bytes) => AttachmentRef::EncodedBlob {
                bytes: Bytes::from(bytes),
                media_type: String::new(),
            },
            RawAttachment::Record {
                name,
                media_type,
                data,
            } => {
                let name = non_empty(name);
                let media_type = non_empty(media_type);
                match (name, media_type, AttachmentRef::from(*data)) {
                    // `{ type, data }` around bare base64 is a typed payload
                    (
                        None,
                        Some(declared),
                        AttachmentRef::Base64Text {
                            payload,
                            media_type: None,
                        },
                    ) => AttachmentRef::Base64Text {
                        payload,
                        media_type: Some(declared),
                    },
                    (name, media_type, data) => AttachmentRef::Wrapped(WrappedAttachment {
                        name,
                        media_type,
                        data: Box::new(data),
                    }),
                }
            }
        }
    }
}

impl From<AttachmentRef> for RawAttachment {
    fn from(attachment: AttachmentRef) -> Self {
        match attachment {
            AttachmentRef::PlainUrl(s) | AttachmentRef::DataUri(s) | AttachmentRef::Opaque(s) => {
                RawAttachment::Text(s)
            }
            AttachmentRef::Base64Text {
                payload,
                media_type: None,
            } => RawAttachment::Text(payload),
            AttachmentRef::Base64Text {
                payload,
                media_type: Some(media_type),
            } => RawAttachment::Record {
                name: None,
                media_type: Some(media_type),
                data: Box::new(RawAttachment::Text(payload)),
            },
            AttachmentRef::EncodedBlob { bytes, media_type } => {
                RawAttachment::Text(encode_data_uri(&bytes, &media_type))
            }
            AttachmentRef::Wrapped(w) => RawAttachment::Record {
                name: w.name,
                media_type: w.media_type,
                data: Box::new((*w.data).into()),
            },
        }
    }
}

/// Role an attachment plays on an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentRole {
    Pdf,
    Ppt,
}

impl AttachmentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Ppt => "ppt",
        }
    }

    /// Cache key for this role on an entry: `"<entryId>-<role>"`
    pub fn cache_key(&self, entry_id: &str) -> String {
        format!("{}-{}", entry_id, self.as_str())
    }

    /// Whether a resolved URL can be handed to the Office Online viewer
    pub fn previews_in_office(&self, url: &str) -> bool {
        matches!(self, Self::Ppt) && is_http_url(url)
    }
}

impl std::fmt::Display for AttachmentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
