//! Progress rendering for the CLI
//!
//! Turns warm-up updates into one indicatif bar per stage.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use note_size_core::progress::{ProgressUpdate, WarmUpStage};
use tokio::sync::mpsc;

/// Drain `rx` until every sender is gone
///
/// With `visible` off the updates are still consumed so the reporting side
/// never sees a full channel, but nothing is drawn.
pub async fn render_progress(mut rx: mpsc::Receiver<ProgressUpdate>, visible: bool) {
    let mut renderer = ProgressRenderer::new(visible);

    while let Some(update) = rx.recv().await {
        renderer.handle_update(update);
    }

    renderer.finish();
}

/// Progress renderer that manages visual progress display
pub struct ProgressRenderer {
    visible: bool,
    notes_bar: Option<ProgressBar>,
    cards_bar: Option<ProgressBar>,
}

impl ProgressRenderer {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            notes_bar: None,
            cards_bar: None,
        }
    }

    pub fn handle_update(&mut self, update: ProgressUpdate) {
        if !self.visible {
            return;
        }

        match update {
            ProgressUpdate::WarmUp {
                stage,
                current,
                total,
            } => self.update_stage(stage, current, total),
            ProgressUpdate::Status { message } => self.show_status(&message),
        }
    }

    fn update_stage(&mut self, stage: WarmUpStage, current: usize, total: usize) {
        let slot = match stage {
            WarmUpStage::Notes => &mut self.notes_bar,
            WarmUpStage::Cards => {
                // Notes are done once cards start
                if let Some(bar) = &self.notes_bar {
                    bar.finish();
                }
                &mut self.cards_bar
            }
        };

        let bar = slot.get_or_insert_with(|| stage_bar(stage, total));
        bar.set_length(total as u64);
        bar.set_position(current as u64);
    }

    fn show_status(&self, message: &str) {
        let line = format!("{} {}", "→".green(), message);
        match self.cards_bar.as_ref().or(self.notes_bar.as_ref()) {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    /// Finish all progress bars
    pub fn finish(self) {
        for bar in [self.notes_bar, self.cards_bar].into_iter().flatten() {
            if bar.position() >= bar.length().unwrap_or(0) {
                bar.finish();
            } else {
                bar.abandon();
            }
        }
    }
}

fn stage_bar(stage: WarmUpStage, total: usize) -> ProgressBar {
    let label = match stage {
        WarmUpStage::Notes => "Notes",
        WarmUpStage::Cards => "Cards",
    };

    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{msg:>6} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} | {percent}%")
        .map(|style| style.progress_chars("##-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.set_message(label.bold().to_string());
    bar
}
