//! Command definitions and execution

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, instrument};

use pf_attachments::MemoryUrlRegistry;
use pf_core::config::AppConfig;
use pf_core::Collection;
use pf_portfolio::{
    filter_achievements, filter_reflections, format_date, parse_portfolio, CategoryCounts, Entry,
    PortfolioData, PortfolioView,
};

/// Inspect portfolio JSON exports.
#[derive(Parser, Debug)]
#[command(name = "portfolio", version, about = "Inspect portfolio JSON exports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the export upgraded to the current data shape.
    Normalize {
        /// Portfolio JSON file.
        file: PathBuf,
    },
    /// List entries matching a search.
    List {
        /// Portfolio JSON file.
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = CollectionArg::Achievements)]
        collection: CollectionArg,
        /// Text searched in titles and descriptions.
        #[arg(long, default_value = "")]
        search: String,
        /// Category (achievements) or mood (reflections).
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// Print category counts and entry totals.
    Stats {
        /// Portfolio JSON file.
        file: PathBuf,
    },
    /// Resolve attachment links the way the page renders them.
    Links {
        /// Portfolio JSON file.
        file: PathBuf,
        /// Only render one collection.
        #[arg(long, value_enum)]
        collection: Option<CollectionArg>,
    },
}

impl Command {
    pub fn file(&self) -> &Path {
        match self {
            Self::Normalize { file }
            | Self::List { file, .. }
            | Self::Stats { file }
            | Self::Links { file, .. } => file,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CollectionArg {
    Achievements,
    Reflections,
}

impl From<CollectionArg> for Collection {
    fn from(arg: CollectionArg) -> Self {
        match arg {
            CollectionArg::Achievements => Collection::Achievements,
            CollectionArg::Reflections => Collection::Reflections,
        }
    }
}

/// One line of `list` output
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntrySummary<'a> {
    id: &'a str,
    title: &'a str,
    date: String,
    #[serde(skip_serializing_if = "str::is_empty")]
    category: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mood: Option<&'a str>,
    attachments: usize,
}

impl<'a> From<&'a Entry> for EntrySummary<'a> {
    fn from(entry: &'a Entry) -> Self {
        Self {
            id: &entry.id,
            title: &entry.title,
            date: format_date(&entry.date),
            category: &entry.category,
            mood: entry.mood.as_deref(),
            attachments: usize::from(entry.pdf.is_some()) + usize::from(entry.ppt.is_some()),
        }
    }
}

/// Load the file named by the command and run it
pub fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<String> {
    let data = load_portfolio(cli.command.file())?;
    execute(&cli.command, &data, config)
}

/// Read and normalize a portfolio export
#[instrument]
pub fn load_portfolio(path: &Path) -> anyhow::Result<PortfolioData> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let data = parse_portfolio(&contents)
        .with_context(|| format!("{} is not a portfolio export", path.display()))?;
    debug!(
        achievements = data.achievements.len(),
        reflections = data.reflections.len(),
        "Portfolio loaded"
    );
    Ok(data)
}

/// Run a command against already-loaded data and render its JSON output
pub fn execute(command: &Command, data: &PortfolioData, config: &AppConfig) -> anyhow::Result<String> {
    let value = match command {
        Command::Normalize { .. } => serde_json::to_value(data)?,
        Command::List {
            collection,
            search,
            filter,
            ..
        } => {
            let entries = match Collection::from(*collection) {
                Collection::Achievements => filter_achievements(&data.achievements, search, filter),
                Collection::Reflections => filter_reflections(&data.reflections, search, filter),
            };
            let summaries: Vec<EntrySummary<'_>> =
                entries.into_iter().map(EntrySummary::from).collect();
            serde_json::to_value(summaries)?
        }
        Command::Stats { .. } => {
            let with_attachments = data
                .achievements
                .iter()
                .chain(&data.reflections)
                .filter(|e| e.has_attachments())
                .count();
            json!({
                "achievements": data.achievements.len(),
                "reflections": data.reflections.len(),
                "withAttachments": with_attachments,
                "categories": CategoryCounts::from_entries(&data.achievements),
            })
        }
        Command::Links { collection, .. } => {
            let registry = Arc::new(MemoryUrlRegistry::new(config.attachments.blob_origin.clone()));
            let mut view = PortfolioView::new(registry, &config.attachments);

            let collections = match collection {
                Some(c) => vec![Collection::from(*c)],
                None => vec![Collection::Achievements, Collection::Reflections],
            };

            let mut out = serde_json::Map::new();
            for c in collections {
                let rendered = view.render(c, data.entries(c));
                out.insert(c.as_str().to_string(), serde_json::to_value(rendered)?);
            }
            serde_json::Value::Object(out)
        }
    };

    Ok(serde_json::to_string_pretty(&value)?)
}
