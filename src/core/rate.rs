use std::fmt;

/// Nominal playback rate shared by both timelines
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PlaybackRate(f32);

impl PlaybackRate {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 3.0;
    pub const NORMAL: PlaybackRate = PlaybackRate(1.0);

    /// Create a rate, clamped to [`MIN`](Self::MIN)..=[`MAX`](Self::MAX)
    pub fn new(rate: f32) -> Self {
        if rate.is_nan() {
            return Self::NORMAL;
        }
        Self(rate.clamp(Self::MIN, Self::MAX))
    }

    /// Map a rate-bar position (0..=100) to a rate: `0.5 + 2.5 * percent / 100`
    pub fn from_bar_percent(percent: u8) -> Self {
        let percent = percent.min(100) as f32;
        Self::new(0.5 + 2.5 * percent / 100.0)
    }

    /// Rate-bar position for this rate
    pub fn bar_percent(&self) -> u8 {
        ((self.0 - Self::MIN) / (Self::MAX - Self::MIN) * 100.0).round() as u8
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    /// Text for the rate label, e.g. `1.0X` or `1.25X`
    pub fn label(&self) -> String {
        format!("{}X", self)
    }
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shortest representation, but always with a fractional digit
        let text = self.0.to_string();
        if text.contains('.') {
            f.write_str(&text)
        } else {
            write!(f, "{}.0", text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_percent_twenty_is_normal_speed() {
        let rate = PlaybackRate::from_bar_percent(20);
        assert_eq!(rate, PlaybackRate::NORMAL);
        assert_eq!(rate.label(), "1.0X");
    }

    #[test]
    fn test_bar_extremes() {
        assert_eq!(PlaybackRate::from_bar_percent(0).value(), 0.5);
        assert_eq!(PlaybackRate::from_bar_percent(100).value(), 3.0);
        // Out-of-range bar positions saturate
        assert_eq!(PlaybackRate::from_bar_percent(250).value(), 3.0);
    }

    #[test]
    fn test_new_clamps() {
        assert_eq!(PlaybackRate::new(0.1).value(), 0.5);
        assert_eq!(PlaybackRate::new(8.0).value(), 3.0);
        assert_eq!(PlaybackRate::new(f32::NAN), PlaybackRate::NORMAL);
    }

    #[test]
    fn test_label_keeps_fraction() {
        assert_eq!(PlaybackRate::new(1.25).label(), "1.25X");
        assert_eq!(PlaybackRate::new(2.0).label(), "2.0X");
        assert_eq!(PlaybackRate::new(3.0).label(), "3.0X");
    }

    #[test]
    fn test_bar_percent_inverse() {
        assert_eq!(PlaybackRate::NORMAL.bar_percent(), 20);
        assert_eq!(PlaybackRate::new(0.5).bar_percent(), 0);
        assert_eq!(PlaybackRate::new(3.0).bar_percent(), 100);
    }
}
