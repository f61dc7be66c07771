use crate::core::{format_time, PlaybackRate};
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Label of the combined play/pause button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportLabel {
    Play,
    Pause,
}

impl fmt::Display for TransportLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportLabel::Play => f.write_str("Play"),
            TransportLabel::Pause => f.write_str("Pause"),
        }
    }
}

/// A problem surfaced to the user, e.g. an engine failing to load its source
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Everything the UI layer renders for the player
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub transport_label: TransportLabel,
    /// Position bar, 0..=100
    pub progress_percent: u8,
    /// Rate bar, 0..=100
    pub rate_percent: u8,
    pub elapsed_text: String,
    pub duration_text: String,
    pub rate_text: String,
    pub now_playing: String,
    pub last_diagnostic: Option<Diagnostic>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            transport_label: TransportLabel::Play,
            progress_percent: 0,
            rate_percent: PlaybackRate::NORMAL.bar_percent(),
            elapsed_text: format_time(Duration::ZERO),
            duration_text: format_time(Duration::ZERO),
            rate_text: PlaybackRate::NORMAL.label(),
            now_playing: String::new(),
            last_diagnostic: None,
        }
    }
}

impl DisplayState {
    /// Fresh-session state for `source`; the duration label and any diagnostic survive
    pub fn reset_for(&mut self, source: &str) {
        *self = Self {
            now_playing: format!("Now Playing: {}", source),
            duration_text: std::mem::take(&mut self.duration_text),
            last_diagnostic: self.last_diagnostic.take(),
            ..Self::default()
        };
    }

    pub fn set_position(&mut self, position: Duration, percent: Option<u8>) {
        self.elapsed_text = format_time(position);
        if let Some(percent) = percent {
            self.progress_percent = percent.min(100);
        }
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_text = format_time(duration);
    }

    pub fn set_rate(&mut self, rate: PlaybackRate) {
        self.rate_percent = rate.bar_percent();
        self.rate_text = rate.label();
    }

    pub fn report(&mut self, message: impl Into<String>) {
        self.last_diagnostic = Some(Diagnostic::new(message));
    }
}
