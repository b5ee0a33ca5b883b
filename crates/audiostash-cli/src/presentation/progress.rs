//! Per-track download progress bars.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use indicatif::{HumanBytes, MultiProgress, ProgressBar, ProgressStyle};

use audiostash_core::{DownloadProgress, DownloadState, TrackId};

/// One progress bar per track, driven by manager progress events.
pub struct DownloadBars {
    multi: MultiProgress,
    bars: Mutex<HashMap<TrackId, ProgressBar>>,
}

impl DownloadBars {
    /// Create an empty set of bars drawing to stderr.
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    /// Create a set of bars that never draws.
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden()),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:30!} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }

    /// Add a bar for `track_id` labelled with `label`.
    pub fn add(&self, track_id: &TrackId, label: &str) {
        let bar = self.multi.add(ProgressBar::new(0));
        bar.set_style(Self::style());
        bar.set_prefix(label.to_string());
        bar.set_message("waiting");
        self.bars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(track_id.clone(), bar);
    }

    /// Apply a progress event. Events for unknown tracks are ignored.
    pub fn update(&self, progress: &DownloadProgress) {
        let bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(bar) = bars.get(&progress.track_id) else {
            return;
        };

        match progress.state {
            DownloadState::Idle => bar.abandon_with_message("cancelled"),
            DownloadState::Queued => {
                bar.set_position(0);
                bar.set_message("queued");
            }
            DownloadState::Downloading => {
                let length = if progress.bytes_total > 0 {
                    progress.bytes_total
                } else {
                    progress.bytes_loaded
                };
                bar.set_length(length);
                bar.set_position(progress.bytes_loaded);
                bar.set_message(format!("{}%", progress.progress_percent));
            }
            DownloadState::Complete => {
                let message = if progress.bytes_total == 0 {
                    "already cached".to_string()
                } else {
                    format!("done ({})", HumanBytes(progress.bytes_total))
                };
                bar.set_length(progress.bytes_total);
                bar.set_position(progress.bytes_total);
                bar.finish_with_message(message);
            }
            DownloadState::Error => {
                let message = progress
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "failed".to_string());
                bar.abandon_with_message(message);
            }
        }
    }

    /// Print a line above the bars without corrupting them.
    pub fn println(&self, line: impl AsRef<str>) {
        let _ = self.multi.println(line);
    }

    /// Current message of a track's bar.
    pub fn message(&self, track_id: &TrackId) -> Option<String> {
        self.bars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(track_id)
            .map(|bar| bar.message().to_string())
    }
}

impl Default for DownloadBars {
    fn default() -> Self {
        Self::new()
    }
}
