//! Per-channel signal counters and their single-character rendering.
//!
//! Output is one column per channel. The vertical header spells each channel
//! number top to bottom:
//!
//! ```text
//! 000
//! 111
//! 789
//! ~~~
//! 1-2
//! ```
//!
//! reads as one detection on channel 17, none on 18, and two on 19.

/// Largest count a column can show; higher counts are clamped.
pub const MAX_GLYPH_COUNT: u32 = 0xF;

/// Signal counts for one output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: Vec<u32>,
}

impl Histogram {
    /// Create an empty histogram covering `num_channels` channels.
    #[must_use]
    pub fn new(num_channels: usize) -> Self {
        Self {
            counts: vec![0; num_channels],
        }
    }

    /// Number of channels covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether the histogram covers no channels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Count a detection on `channel`. Channels outside the range are ignored.
    pub fn record(&mut self, channel: usize) {
        if let Some(count) = self.counts.get_mut(channel) {
            *count = count.saturating_add(1);
        }
    }

    /// Clear every counter.
    pub fn reset(&mut self) {
        self.counts.fill(0);
    }

    /// The raw count for `channel`.
    #[must_use]
    pub fn count(&self, channel: usize) -> u32 {
        self.counts.get(channel).copied().unwrap_or(0)
    }

    /// All counts in channel order.
    #[must_use]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// The column character for `channel`.
    #[must_use]
    pub fn glyph(&self, channel: usize) -> char {
        glyph_for(self.count(channel))
    }

    /// Every column character, in channel order.
    #[must_use]
    pub fn render(&self) -> String {
        self.counts.iter().map(|&c| glyph_for(c)).collect()
    }
}

/// `'-'` for zero, otherwise the count clamped to `f` as a lowercase hex digit.
#[must_use]
pub fn glyph_for(count: u32) -> char {
    if count == 0 {
        '-'
    } else {
        char::from_digit(count.min(MAX_GLYPH_COUNT), 16).unwrap_or('f')
    }
}

/// The vertical channel-number header followed by a `~` divider.
///
/// Four lines, each exactly `num_channels` characters wide: hundreds, tens,
/// and units digits of every channel number, then the divider.
#[must_use]
pub fn header_lines(num_channels: usize) -> [String; 4] {
    const DIGITS: &[u8; 10] = b"0123456789";
    let digit = |place: usize| -> String {
        (0..num_channels)
            .map(|ch| char::from(DIGITS[(ch / place) % 10]))
            .collect()
    };
    [digit(100), digit(10), digit(1), "~".repeat(num_channels)]
}
