//! Parsing of FFmpeg progress output (`-progress pipe:1` key/value lines
//! plus the `Duration:` banner on stderr).

use regex::Regex;
use std::sync::LazyLock;

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Duration: (\d+):(\d+):([\d.]+)").expect("invalid duration regex"));
static OUT_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"out_time_ms=(\d+)").expect("invalid out_time regex"));

/// Accumulates progress state across output lines of one invocation.
/// Duration may arrive late (stderr banner) or be seeded by the caller.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    duration_secs: Option<f64>,
}

impl ProgressTracker {
    pub fn new(duration_secs: Option<f64>) -> Self {
        Self {
            duration_secs: duration_secs.filter(|&d| d > 0.0),
        }
    }

    /// Feed one output line. Returns normalized progress in [0, 1] when the
    /// line advances it, None otherwise.
    pub fn observe(&mut self, line: &str) -> Option<f64> {
        if let Some(caps) = DURATION_RE.captures(line) {
            let hours: f64 = caps[1].parse().unwrap_or(0.0);
            let minutes: f64 = caps[2].parse().unwrap_or(0.0);
            let seconds: f64 = caps[3].parse().unwrap_or(0.0);
            let total = hours * 3600.0 + minutes * 60.0 + seconds;
            if total > 0.0 {
                self.duration_secs = Some(total);
            }
            return None;
        }

        let caps = OUT_TIME_RE.captures(line)?;
        let duration = self.duration_secs?;
        let out_time_ms: i64 = caps[1].parse().unwrap_or(0);
        let out_secs = out_time_ms as f64 / 1_000_000.0;
        Some((out_secs / duration).min(1.0))
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.duration_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_banner_sets_total() {
        let mut tracker = ProgressTracker::new(None);
        assert_eq!(tracker.observe("Duration: 0:1:30.5"), None);
        assert_eq!(tracker.duration_secs(), Some(90.5));
    }

    #[test]
    fn duration_with_hours() {
        let mut tracker = ProgressTracker::new(None);
        tracker.observe("Duration: 1:2:3.0");
        assert_eq!(tracker.duration_secs(), Some(3723.0));
    }

    #[test]
    fn out_time_reports_fraction_of_seeded_duration() {
        let mut tracker = ProgressTracker::new(Some(10.0));
        assert_eq!(tracker.observe("out_time_ms=5000000"), Some(0.5));
    }

    #[test]
    fn out_time_clamps_to_one() {
        let mut tracker = ProgressTracker::new(Some(10.0));
        assert_eq!(tracker.observe("out_time_ms=15000000"), Some(1.0));
    }

    #[test]
    fn out_time_without_duration_is_silent() {
        let mut tracker = ProgressTracker::new(None);
        assert_eq!(tracker.observe("out_time_ms=5000000"), None);
    }

    #[test]
    fn zero_seeded_duration_is_ignored() {
        let mut tracker = ProgressTracker::new(Some(0.0));
        assert_eq!(tracker.duration_secs(), None);
    }

    #[test]
    fn unrelated_lines_are_ignored() {
        let mut tracker = ProgressTracker::new(Some(5.0));
        assert_eq!(tracker.observe("frame=12 fps=0.0"), None);
        assert_eq!(tracker.duration_secs(), Some(5.0));
    }
}
