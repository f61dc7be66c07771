//! Dual-timeline playback: a media player and a haptic effect player kept in
//! step by a single controller.
//!
//! The [`playback::PlaybackController`] forwards transport intents to both
//! engines in a fixed order and hands the effect engine a
//! [`engine::ClockSource`] it can pull the media position from. Decoding and
//! the actual clock alignment stay inside the engines.

pub mod config;
pub mod context;
pub mod core;
pub mod engine;
pub mod error;
pub mod playback;
pub mod ui;

pub use config::PlayerConfig;
pub use error::ControllerError;
pub use playback::{ControllerEvent, Engines, PlaybackController, TransportState};
