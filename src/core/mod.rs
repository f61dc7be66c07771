pub mod rate;
pub mod time;

pub use rate::PlaybackRate;
pub use time::{format_time, position_at, progress_percent};
