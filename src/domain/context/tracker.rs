//! Detection window bookkeeping across turns.

/// Tracks where the current detection window starts in the user transcript.
///
/// After an accepted shift the baseline moves to the end of the transcript so
/// the messages that caused the shift do not keep voting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShiftTracker {
    baseline: usize,
}

impl ShiftTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The part of `transcript` inside the current window.
    pub fn window<'a>(&self, transcript: &'a [String]) -> &'a [String] {
        let start = self.baseline.min(transcript.len());
        &transcript[start..]
    }

    pub fn accept_shift(&mut self, transcript_len: usize) {
        self.baseline = transcript_len;
    }

    pub fn reset(&mut self) {
        self.baseline = 0;
    }

    pub fn baseline(&self) -> usize {
        self.baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("m{}", i)).collect()
    }

    #[test]
    fn fresh_tracker_sees_whole_transcript() {
        let tracker = ShiftTracker::new();
        assert_eq!(tracker.window(&transcript(3)).len(), 3);
    }

    #[test]
    fn accepted_shift_starts_a_clean_window() {
        let mut tracker = ShiftTracker::new();
        tracker.accept_shift(2);
        let messages = transcript(3);
        assert_eq!(tracker.window(&messages), &messages[2..]);
    }

    #[test]
    fn baseline_past_end_yields_empty_window() {
        let mut tracker = ShiftTracker::new();
        tracker.accept_shift(10);
        assert!(tracker.window(&transcript(3)).is_empty());
        tracker.reset();
        assert_eq!(tracker.baseline(), 0);
    }
}
