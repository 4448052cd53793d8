//! Rendering of query results for the terminal or for scripts

mod formatters;

pub use formatters::{JsonFormatter, TextFormatter};

use anyhow::Result;
use note_size_core::{CardId, CollectionSize, NoteFile, NoteId, SizeBytes, SizeLevel, SizeType};
use serde::Serialize;

/// Output format enumeration
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Size of one note, optionally reached through one of its cards
#[derive(Debug, Clone, Serialize)]
pub struct NoteReport {
    pub note_id: NoteId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_id: Option<CardId>,
    pub size_type: SizeType,
    pub size: SizeBytes,
    pub size_str: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<SizeLevel>,
}

/// Every media file one note references
#[derive(Debug, Clone, Serialize)]
pub struct FilesReport {
    pub note_id: NoteId,
    pub files: Vec<NoteFile>,
    pub total: SizeBytes,
    pub total_str: String,
}

/// Collection-wide size breakdown
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    #[serde(flatten)]
    pub size: CollectionSize,
    pub total_str: String,
}

/// Trait for output formatters
pub trait OutputFormatter {
    fn format_note(&self, report: &NoteReport) -> Result<String>;

    fn format_files(&self, report: &FilesReport) -> Result<String>;

    fn format_summary(&self, report: &SummaryReport) -> Result<String>;
}

/// Create a formatter based on output format
pub fn create_formatter(
    format: OutputFormat,
    use_color: bool,
    precision: u8,
) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(use_color, precision)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}
