//! End-of-run summary.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::activity::ChannelActivity;
use crate::error::Result;
use crate::radio::{frequency_mhz, DataRate};

/// Number of channels recommended in a report.
pub const RECOMMENDED_COUNT: usize = 3;

/// Activity on one channel over the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSummary {
    /// Channel number.
    pub channel: u8,
    /// Centre frequency in MHz.
    pub frequency_mhz: u16,
    /// Detections over the whole run.
    pub total: u64,
    /// Detections within the recent history window.
    pub recent: usize,
}

/// What a scan observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    /// Air data rate used for the scan.
    pub data_rate: DataRate,
    /// When scanning started.
    pub started_at: DateTime<Utc>,
    /// When scanning stopped.
    pub finished_at: DateTime<Utc>,
    /// Output lines completed.
    pub lines: u64,
    /// Full sweeps of the spectrum completed.
    pub sweeps: u64,
    /// Whether the run was interrupted by a stop request.
    pub interrupted: bool,
    /// Per-channel activity, in channel order.
    pub channels: Vec<ChannelSummary>,
    /// The quietest channels, best first.
    pub recommended: Vec<u8>,
}

impl ScanReport {
    /// Build a report from the activity collected during a run.
    #[must_use]
    pub fn from_activity(
        activity: &ChannelActivity,
        data_rate: DataRate,
        started_at: DateTime<Utc>,
        lines: u64,
        sweeps: u64,
        interrupted: bool,
    ) -> Self {
        let channels = (0..activity.num_channels())
            .filter_map(|ch| {
                let channel = u8::try_from(ch).ok()?;
                Some(ChannelSummary {
                    channel,
                    frequency_mhz: frequency_mhz(channel),
                    total: activity.total(ch),
                    recent: activity.recent(ch),
                })
            })
            .collect();
        let recommended = activity
            .quietest(RECOMMENDED_COUNT)
            .into_iter()
            .filter_map(|ch| u8::try_from(ch).ok())
            .collect();

        Self {
            data_rate,
            started_at,
            finished_at: Utc::now(),
            lines,
            sweeps,
            interrupted,
            channels,
            recommended,
        }
    }

    /// Channels with at least one detection, busiest first.
    #[must_use]
    pub fn busiest(&self) -> Vec<&ChannelSummary> {
        let mut busy: Vec<&ChannelSummary> =
            self.channels.iter().filter(|c| c.total > 0).collect();
        busy.sort_by(|a, b| b.total.cmp(&a.total).then(a.channel.cmp(&b.channel)));
        busy
    }

    /// Serialize as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elapsed = self.finished_at - self.started_at;
        writeln!(f, "Scan Summary")?;
        writeln!(f, "============")?;
        writeln!(f, "Data rate:    {}", self.data_rate)?;
        let seconds = elapsed.to_std().unwrap_or_default().as_secs_f64();
        writeln!(f, "Duration:     {seconds:.1} s")?;
        writeln!(f, "Sweeps:       {} ({} lines)", self.sweeps, self.lines)?;
        if self.interrupted {
            writeln!(f, "Stopped:      interrupted")?;
        }
        writeln!(f)?;

        let busy = self.busiest();
        if busy.is_empty() {
            writeln!(f, "No signals detected.")?;
        } else {
            writeln!(f, "Busiest channels:")?;
            for summary in busy.iter().take(10) {
                writeln!(
                    f,
                    "  {:>3}  {} MHz  {:>6} hits  (recent {})",
                    summary.channel, summary.frequency_mhz, summary.total, summary.recent
                )?;
            }
        }
        writeln!(f)?;

        write!(f, "Recommended:  ")?;
        let picks: Vec<String> = self
            .recommended
            .iter()
            .map(|&ch| format!("{ch} ({} MHz)", frequency_mhz(ch)))
            .collect();
        write!(f, "{}", picks.join(", "))
    }
}
