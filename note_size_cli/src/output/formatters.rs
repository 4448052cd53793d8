use super::{FilesReport, NoteReport, OutputFormatter, SummaryReport};
use anyhow::Result;
use colored::*;
use note_size_core::{FilesSize, SizeLevel, bytes_to_str};
use serde::Serialize;

/// Text formatter for human-readable output
pub struct TextFormatter {
    use_color: bool,
    precision: u8,
}

impl TextFormatter {
    pub fn new(use_color: bool, precision: u8) -> Self {
        Self {
            use_color,
            precision,
        }
    }

    fn colorize(&self, text: &str, color: fn(&str) -> ColoredString) -> String {
        if self.use_color {
            color(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Paint a size string in its level's color
    fn paint_level(&self, text: &str, level: Option<&SizeLevel>) -> String {
        match (self.use_color, level.and_then(|l| parse_hex_color(&l.color))) {
            (true, Some((r, g, b))) => text.truecolor(r, g, b).to_string(),
            _ => text.to_string(),
        }
    }

    fn files_line(&self, label: &str, files: FilesSize) -> String {
        format!(
            "  {label:<13}{} in {} file(s)\n",
            bytes_to_str(files.size, self.precision),
            files.count
        )
    }
}

impl OutputFormatter for TextFormatter {
    fn format_note(&self, report: &NoteReport) -> Result<String> {
        let mut output = String::new();

        match report.card_id {
            Some(card_id) => output.push_str(&format!(
                "Note {} (card {card_id})\n",
                report.note_id
            )),
            None => output.push_str(&format!("Note {}\n", report.note_id)),
        }

        let size = self.paint_level(&report.size_str, report.level.as_ref());
        output.push_str(&format!(
            "{}: {size} ({} bytes)",
            self.colorize(&report.size_type.to_string(), |s| s.yellow()),
            report.size
        ));
        if let Some(level) = &report.level {
            output.push_str(&format!(" [{}]", level.name));
        }

        Ok(output)
    }

    fn format_files(&self, report: &FilesReport) -> Result<String> {
        let mut output = format!("Files of note {}\n", report.note_id);

        if report.files.is_empty() {
            output.push_str("  (no media files)\n");
        }
        for file in &report.files {
            let size = bytes_to_str(file.size, self.precision);
            let mut line = format!(
                "  {:>10}  {:<6} {}",
                size,
                file.file_type.to_string(),
                self.colorize(&file.name, |s| s.cyan())
            );
            if file.missing {
                line.push_str(&format!(" {}", self.colorize("(missing)", |s| s.red())));
            }
            output.push_str(&line);
            output.push('\n');
        }

        output.push_str(&format!(
            "Total: {} in {} file(s)",
            report.total_str,
            report.files.len()
        ));
        Ok(output)
    }

    fn format_summary(&self, report: &SummaryReport) -> Result<String> {
        let size = &report.size;
        let mut output = format!("{}\n", self.colorize("Collection size", |s| s.bold()));

        output.push_str(&format!(
            "  {:<13}{}\n",
            "Texts",
            bytes_to_str(size.texts, self.precision)
        ));
        output.push_str(&self.files_line("Used files", size.used_files));
        output.push_str(&self.files_line("Unused files", size.unused_files));
        if size.missing_files > 0 {
            output.push_str(&format!(
                "  {:<13}{}\n",
                "Missing files",
                self.colorize(&size.missing_files.to_string(), |s| s.red())
            ));
        }
        output.push_str(&format!("  {:<13}{}", "Total", report.total_str));

        Ok(output)
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_note(&self, report: &NoteReport) -> Result<String> {
        self.to_json(report)
    }

    fn format_files(&self, report: &FilesReport) -> Result<String> {
        self.to_json(report)
    }

    fn format_summary(&self, report: &SummaryReport) -> Result<String> {
        self.to_json(report)
    }
}

/// `#rrggbb` to an RGB triple
fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use note_size_core::{
        CollectionSize, FileType, NoteFile, NoteId, SizeBytes, SizeType,
    };

    fn note_report() -> NoteReport {
        NoteReport {
            note_id: NoteId(7),
            card_id: None,
            size_type: SizeType::Total,
            size: SizeBytes(2048),
            size_str: "2.0 KB".to_string(),
            level: Some(SizeLevel::new("Small", "#4caf50", Some("100 KB"))),
        }
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#4caf50"), Some((0x4c, 0xaf, 0x50)));
        assert_eq!(parse_hex_color("4caf50"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(parse_hex_color("#fff"), None);
    }

    #[test]
    fn test_text_note_without_color() {
        let text = TextFormatter::new(false, 1)
            .format_note(&note_report())
            .unwrap();
        assert_eq!(text, "Note 7\ntotal: 2.0 KB (2048 bytes) [Small]");
    }

    #[test]
    fn test_text_files_marks_missing() {
        let report = FilesReport {
            note_id: NoteId(1),
            files: vec![
                NoteFile {
                    name: "a.jpg".to_string(),
                    size: SizeBytes(10),
                    file_type: FileType::Image,
                    missing: false,
                },
                NoteFile {
                    name: "gone.mp3".to_string(),
                    size: SizeBytes(0),
                    file_type: FileType::Audio,
                    missing: true,
                },
            ],
            total: SizeBytes(10),
            total_str: "10 B".to_string(),
        };

        let text = TextFormatter::new(false, 1).format_files(&report).unwrap();
        assert!(text.contains("a.jpg"));
        assert!(text.contains("gone.mp3 (missing)"));
        assert!(text.ends_with("Total: 10 B in 2 file(s)"));
    }

    #[test]
    fn test_json_summary_is_flat() {
        let report = SummaryReport {
            size: CollectionSize {
                texts: SizeBytes(5),
                used_files: FilesSize {
                    size: SizeBytes(10),
                    count: 1,
                },
                unused_files: FilesSize::default(),
                missing_files: 0,
                total: SizeBytes(15),
            },
            total_str: "15 B".to_string(),
        };

        let json = JsonFormatter::new(false).format_summary(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total"], 15);
        assert_eq!(value["used_files"]["count"], 1);
        assert_eq!(value["total_str"], "15 B");
    }
}
