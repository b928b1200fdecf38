use serde::Serialize;

use bonusvest_strategy::SimulationResult;

use crate::engine::WindowComparison;

/// Distribution of one strategy's results across windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnStats {
    pub count: usize,
    pub min_return_pct: f64,
    pub max_return_pct: f64,
    pub mean_return_pct: f64,
    pub mean_final_value: f64,
}

impl ReturnStats {
    /// `None` when there are no results to summarise.
    pub fn from_results<'a, I>(results: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a SimulationResult>,
    {
        let mut count = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut sum_final = 0.0;

        for r in results {
            let pct = r.annualized_return_pct();
            count += 1;
            min = min.min(pct);
            max = max.max(pct);
            sum += pct;
            sum_final += r.final_value;
        }

        if count == 0 {
            return None;
        }
        // Summation error can push the mean of identical returns past max.
        Some(Self {
            count,
            min_return_pct: min,
            max_return_pct: max,
            mean_return_pct: (sum / count as f64).clamp(min, max),
            mean_final_value: sum_final / count as f64,
        })
    }
}

/// Strict wins and ties over per-window annualized returns.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WinTally {
    pub plain_wins: usize,
    pub bonus_wins: usize,
    pub ties: usize,
    pub total: usize,
}

impl WinTally {
    pub fn plain_win_rate(&self) -> f64 {
        rate(self.plain_wins, self.total)
    }

    pub fn bonus_win_rate(&self) -> f64 {
        rate(self.bonus_wins, self.total)
    }
}

fn rate(wins: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    wins as f64 / total as f64
}

/// Everything the report needs about a rolling-window run.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonSummary {
    pub window_count: usize,
    pub plain: Option<ReturnStats>,
    pub bonus: Option<ReturnStats>,
    pub tally: WinTally,
    pub plain_win_rate: f64,
    pub bonus_win_rate: f64,
    /// Mean of bonus minus plain annualized return, percentage points.
    pub mean_difference_pct: Option<f64>,
}

pub struct SummaryCalculator;

impl SummaryCalculator {
    /// Aggregate per-window comparisons into min/max/mean and win tallies.
    pub fn summarize(comparisons: &[WindowComparison]) -> ComparisonSummary {
        let plain = ReturnStats::from_results(comparisons.iter().map(|c| &c.plain));
        let bonus = ReturnStats::from_results(comparisons.iter().map(|c| &c.bonus));
        let tally = Self::tally(comparisons);

        let mean_difference_pct = if comparisons.is_empty() {
            None
        } else {
            let sum: f64 = comparisons.iter().map(WindowComparison::difference_pct).sum();
            Some(sum / comparisons.len() as f64)
        };

        ComparisonSummary {
            window_count: comparisons.len(),
            plain,
            bonus,
            tally,
            plain_win_rate: tally.plain_win_rate(),
            bonus_win_rate: tally.bonus_win_rate(),
            mean_difference_pct,
        }
    }

    /// Count wins at reported precision (0.01 percentage points).
    pub fn tally(comparisons: &[WindowComparison]) -> WinTally {
        let mut tally = WinTally {
            total: comparisons.len(),
            ..WinTally::default()
        };
        for c in comparisons {
            let plain = round_pct(c.plain.annualized_return);
            let bonus = round_pct(c.bonus.annualized_return);
            if plain > bonus {
                tally.plain_wins += 1;
            } else if bonus > plain {
                tally.bonus_wins += 1;
            } else {
                tally.ties += 1;
            }
        }
        tally
    }
}

/// Fractional return as a percentage rounded to two decimals.
pub fn round_pct(fraction: f64) -> f64 {
    (fraction * 10_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonusvest_core::Window;
    use bonusvest_strategy::StrategyKind;

    fn result(kind: StrategyKind, annualized_return: f64, final_value: f64) -> SimulationResult {
        SimulationResult {
            strategy: kind,
            window_start: 0,
            window_end: 0,
            final_value,
            total_invested: 36_000.0,
            annualized_return,
        }
    }

    fn comparison(plain: f64, bonus: f64) -> WindowComparison {
        WindowComparison {
            window: Window {
                start_idx: 0,
                end_idx: 72,
                start_ts: 0,
                end_ts: 0,
            },
            plain: result(StrategyKind::Plain, plain, 40_000.0),
            bonus: result(StrategyKind::VestingBonus, bonus, 50_000.0),
        }
    }

    #[test]
    fn test_return_stats() {
        let comparisons = vec![comparison(0.05, 0.02), comparison(-0.01, 0.04), comparison(0.08, 0.06)];
        let stats = ReturnStats::from_results(comparisons.iter().map(|c| &c.plain)).unwrap();
        assert_eq!(stats.count, 3);
        assert!((stats.min_return_pct + 1.0).abs() < 1e-10);
        assert!((stats.max_return_pct - 8.0).abs() < 1e-10);
        assert!((stats.mean_return_pct - 4.0).abs() < 1e-10);
        assert!((stats.mean_final_value - 40_000.0).abs() < 1e-10);
    }

    #[test]
    fn test_mean_of_identical_returns_stays_within_extremes() {
        let comparisons: Vec<_> = (0..20).map(|_| comparison(0.0508719183932913, 0.031)).collect();
        let stats = ReturnStats::from_results(comparisons.iter().map(|c| &c.plain)).unwrap();
        assert!(stats.min_return_pct <= stats.mean_return_pct);
        assert!(stats.mean_return_pct <= stats.max_return_pct);
        assert_eq!(stats.min_return_pct, stats.max_return_pct);
    }

    #[test]
    fn test_empty_summary_has_no_stats() {
        let summary = SummaryCalculator::summarize(&[]);
        assert_eq!(summary.window_count, 0);
        assert!(summary.plain.is_none());
        assert!(summary.bonus.is_none());
        assert!(summary.mean_difference_pct.is_none());
        assert_eq!(summary.plain_win_rate, 0.0);
        assert_eq!(summary.bonus_win_rate, 0.0);
    }

    #[test]
    fn test_tally_counts_wins_and_ties() {
        let comparisons = vec![
            comparison(0.05, 0.02),
            comparison(0.01, 0.04),
            comparison(0.03, 0.03),
            comparison(0.06, 0.07),
        ];
        let tally = SummaryCalculator::tally(&comparisons);
        assert_eq!(tally.plain_wins, 1);
        assert_eq!(tally.bonus_wins, 2);
        assert_eq!(tally.ties, 1);
        assert!((tally.bonus_win_rate() - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_sub_basis_point_difference_is_a_tie() {
        let tally = SummaryCalculator::tally(&[comparison(0.05001, 0.05002)]);
        assert_eq!(tally.ties, 1);
    }

    #[test]
    fn test_round_pct() {
        assert_eq!(round_pct(0.123456), 12.35);
        assert_eq!(round_pct(-0.0101), -1.01);
    }

    #[test]
    fn test_mean_difference() {
        let summary = SummaryCalculator::summarize(&[comparison(0.05, 0.02), comparison(0.01, 0.04)]);
        assert!(summary.mean_difference_pct.unwrap().abs() < 1e-10);
    }
}
