//! Configuration types and loading

use serde::{Deserialize, Serialize};
use url::Url;

/// Generic binary media type, used whenever nothing better is declared
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Office Online viewer used to preview publicly hosted presentations
pub const DEFAULT_OFFICE_VIEWER_URL: &str = "https://view.officeapps.live.com/op/view.aspx";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Attachment resolution settings
    pub attachments: AttachmentSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AttachmentSettings {
    /// Media type used when neither the payload nor its wrapper declares one
    pub default_media_type: String,
    /// Viewer endpoint for presentation previews
    pub office_viewer_url: String,
    /// Origin embedded in generated `blob:` URLs
    pub blob_origin: String,
}

impl Default for AttachmentSettings {
    fn default() -> Self {
        Self {
            default_media_type: DEFAULT_MEDIA_TYPE.to_string(),
            office_viewer_url: DEFAULT_OFFICE_VIEWER_URL.to_string(),
            blob_origin: "portfolio.local".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive
    pub filter: String,
    /// Emit JSON lines instead of the human-readable format
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,pf_attachments=debug,pf_portfolio=debug".to_string(),
            json: false,
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Attachments
        if let Some(media_type) = lookup("PORTFOLIO_DEFAULT_MEDIA_TYPE") {
            config.attachments.default_media_type = media_type.trim().to_string();
        }
        if let Some(viewer) = lookup("PORTFOLIO_OFFICE_VIEWER_URL") {
            config.attachments.office_viewer_url = viewer.trim().to_string();
        }
        if let Some(origin) = lookup("PORTFOLIO_BLOB_ORIGIN") {
            config.attachments.blob_origin = origin.trim().to_string();
        }

        // Logging
        if let Some(filter) = lookup("RUST_LOG") {
            config.logging.filter = filter;
        }
        let parse_bool = |v: String| v == "true" || v == "1" || v == "yes";
        if let Some(v) = lookup("PORTFOLIO_LOG_JSON") {
            config.logging.json = parse_bool(v);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that would otherwise fail much later at resolution time
    pub fn validate(&self) -> Result<(), ConfigError> {
        let media_type = &self.attachments.default_media_type;
        if media_type.is_empty() || !media_type.contains('/') {
            return Err(ConfigError::InvalidValue {
                key: "PORTFOLIO_DEFAULT_MEDIA_TYPE".to_string(),
                message: format!("'{}' is not a media type", media_type),
            });
        }

        Url::parse(&self.attachments.office_viewer_url).map_err(|e| {
            ConfigError::InvalidValue {
                key: "PORTFOLIO_OFFICE_VIEWER_URL".to_string(),
                message: e.to_string(),
            }
        })?;

        if self.attachments.blob_origin.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "PORTFOLIO_BLOB_ORIGIN".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
