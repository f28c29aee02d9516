//! Per-episode results and summary statistics over them.

use serde::{Deserialize, Serialize};

/// Outcome of one finished episode.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EpisodeScore {
    /// Sum of the rewards the agent received.
    pub reward: f64,
    /// Game score from the line-clear table.
    pub score: usize,
    pub cleared_lines: usize,
    pub locked_pieces: usize,
    pub steps: usize,
}

/// Descriptive statistics of a series of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescriptiveStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Computes statistics from unsorted values, or `None` for an empty series.
    ///
    /// ```
    /// # use qtris_agent::DescriptiveStats;
    /// let stats = DescriptiveStats::new([5.0, 2.0, 4.0, 1.0, 3.0]).unwrap();
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.median, 3.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Like [`Self::new`], for values already sorted in ascending order.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        debug_assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let n = sorted_values.len() as f64;
        let mean = sorted_values.iter().sum::<f64>() / n;
        let median = sorted_values[sorted_values.len() / 2];
        let variance = sorted_values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            min,
            max,
            mean,
            median,
            std_dev: variance.sqrt(),
        })
    }
}

/// Summary of the most recent episodes, for progress reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryStats {
    pub episodes: usize,
    pub reward: DescriptiveStats,
    pub score: DescriptiveStats,
    pub cleared_lines: DescriptiveStats,
}

impl HistoryStats {
    /// Summarizes the last `window` episodes (all of them if `window` is 0).
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn recent(history: &[EpisodeScore], window: usize) -> Option<Self> {
        let start = if window == 0 {
            0
        } else {
            history.len().saturating_sub(window)
        };
        let recent = &history[start..];
        Some(Self {
            episodes: recent.len(),
            reward: DescriptiveStats::new(recent.iter().map(|e| e.reward))?,
            score: DescriptiveStats::new(recent.iter().map(|e| e.score as f64))?,
            cleared_lines: DescriptiveStats::new(recent.iter().map(|e| e.cleared_lines as f64))?,
        })
    }
}
