//! Long-running per-channel activity: running totals and recent history.
//!
//! The histogram resets every output line; this tracker keeps counting for
//! the whole run so a summary can rank channels at the end.

use std::collections::VecDeque;

/// Totals and recent sweep outcomes for every channel.
#[derive(Debug, Clone)]
pub struct ChannelActivity {
    depth: usize,
    totals: Vec<u64>,
    history: Vec<VecDeque<bool>>,
}

impl ChannelActivity {
    /// Track `num_channels` channels, remembering the last `depth` sweeps.
    #[must_use]
    pub fn new(num_channels: usize, depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            depth,
            totals: vec![0; num_channels],
            history: (0..num_channels)
                .map(|_| VecDeque::from(vec![false; depth]))
                .collect(),
        }
    }

    /// Number of channels tracked.
    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.totals.len()
    }

    /// Record the outcome of one sweep on `channel`.
    pub fn observe(&mut self, channel: usize, detected: bool) {
        let (Some(total), Some(history)) =
            (self.totals.get_mut(channel), self.history.get_mut(channel))
        else {
            return;
        };
        if detected {
            *total += 1;
        }
        history.pop_front();
        history.push_back(detected);
        debug_assert_eq!(history.len(), self.depth);
    }

    /// Detections on `channel` since the run started.
    #[must_use]
    pub fn total(&self, channel: usize) -> u64 {
        self.totals.get(channel).copied().unwrap_or(0)
    }

    /// Detections on `channel` within the remembered sweeps.
    #[must_use]
    pub fn recent(&self, channel: usize) -> usize {
        self.history
            .get(channel)
            .map_or(0, |h| h.iter().filter(|&&d| d).count())
    }

    /// The `n` quietest channels.
    ///
    /// Ranked by lowest total, then lowest recent count, then lowest channel
    /// number.
    #[must_use]
    pub fn quietest(&self, n: usize) -> Vec<usize> {
        let mut channels: Vec<usize> = (0..self.num_channels()).collect();
        channels.sort_by_key(|&ch| (self.total(ch), self.recent(ch), ch));
        channels.truncate(n);
        channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_quiet() {
        let activity = ChannelActivity::new(126, 5);
        assert_eq!(activity.num_channels(), 126);
        assert!((0..126).all(|ch| activity.total(ch) == 0 && activity.recent(ch) == 0));
    }

    #[test]
    fn test_observe_counts_totals() {
        let mut activity = ChannelActivity::new(4, 5);
        activity.observe(1, true);
        activity.observe(1, false);
        activity.observe(1, true);
        assert_eq!(activity.total(1), 2);
        assert_eq!(activity.recent(1), 2);
    }

    #[test]
    fn test_history_drops_oldest() {
        let mut activity = ChannelActivity::new(2, 3);
        activity.observe(0, true);
        activity.observe(0, true);
        activity.observe(0, false);
        assert_eq!(activity.recent(0), 2);
        activity.observe(0, false);
        assert_eq!(activity.recent(0), 1);
        activity.observe(0, false);
        assert_eq!(activity.recent(0), 0);
        assert_eq!(activity.total(0), 2);
    }

    #[test]
    fn test_observe_out_of_range_is_ignored() {
        let mut activity = ChannelActivity::new(2, 3);
        activity.observe(5, true);
        assert_eq!(activity.total(5), 0);
        assert_eq!(activity.recent(5), 0);
    }

    #[test]
    fn test_zero_depth_is_raised_to_one() {
        let mut activity = ChannelActivity::new(1, 0);
        activity.observe(0, true);
        assert_eq!(activity.recent(0), 1);
        activity.observe(0, false);
        assert_eq!(activity.recent(0), 0);
    }

    #[test]
    fn test_quietest_orders_by_total() {
        let mut activity = ChannelActivity::new(4, 5);
        for _ in 0..3 {
            activity.observe(0, true);
        }
        activity.observe(1, true);
        for _ in 0..2 {
            activity.observe(3, true);
        }
        assert_eq!(activity.quietest(4), vec![2, 1, 3, 0]);
    }

    #[test]
    fn test_quietest_breaks_ties_by_recent_then_channel() {
        let mut activity = ChannelActivity::new(3, 2);
        // channel 0: one old hit that has aged out of history
        activity.observe(0, true);
        activity.observe(0, false);
        activity.observe(0, false);
        // channel 1: one recent hit
        activity.observe(1, true);
        // channel 2: same as channel 0
        activity.observe(2, true);
        activity.observe(2, false);
        activity.observe(2, false);
        assert_eq!(activity.quietest(3), vec![0, 2, 1]);
    }

    #[test]
    fn test_quietest_truncates() {
        let activity = ChannelActivity::new(10, 5);
        assert_eq!(activity.quietest(3), vec![0, 1, 2]);
        assert_eq!(activity.quietest(50).len(), 10);
    }
}
