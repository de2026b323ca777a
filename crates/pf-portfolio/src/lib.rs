//! # pf-portfolio
//!
//! Portfolio state for Portfolio RS: achievements, reflections and personal
//! info, legacy-shape normalization, search and filtering, and the render
//! pass that turns entry attachments into links.

pub mod filter;
pub mod format;
pub mod model;
pub mod normalize;
pub mod render;

pub use filter::{filter_achievements, filter_reflections, CategoryCounts, EntryFilter};
pub use format::format_date;
pub use model::{Entry, PersonalInfo, PortfolioData, Upsert, DEFAULT_STATUS};
pub use normalize::{normalize_entry, normalize_loaded_data, parse_portfolio};
pub use render::{EntryAttachments, PortfolioView};
