use rayon::prelude::*;

use bonusvest_core::{PriceSeries, Window};
use bonusvest_strategy::Result;

use crate::engine::{ComparisonEngine, WindowComparison};

/// Evaluate many windows, in parallel or one after another.
///
/// Windows share no mutable state, so each is simulated on its own rayon
/// task. Results always come back in the order of `windows`.
pub struct ParallelRunner {
    engine: ComparisonEngine,
}

impl ParallelRunner {
    pub fn new(engine: ComparisonEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ComparisonEngine {
        &self.engine
    }

    /// Run every window across the rayon pool.
    pub fn run_all(&self, series: &PriceSeries, windows: &[Window]) -> Result<Vec<WindowComparison>> {
        let results = windows
            .par_iter()
            .map(|window| self.engine.run_window(series, window))
            .collect::<Result<Vec<_>>>()?;
        tracing::info!(windows = results.len(), "parallel run complete");
        Ok(results)
    }

    /// Run every window on the calling thread.
    pub fn run_sequential(
        &self,
        series: &PriceSeries,
        windows: &[Window],
    ) -> Result<Vec<WindowComparison>> {
        let results = windows
            .iter()
            .map(|window| self.engine.run_window(series, window))
            .collect::<Result<Vec<_>>>()?;
        tracing::info!(windows = results.len(), "sequential run complete");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonusvest_core::config::SyntheticConfig;
    use bonusvest_core::synthetic::synthetic_series;
    use bonusvest_core::{compute_windows, WindowAlignment};

    #[test]
    fn test_parallel_matches_sequential_order() {
        let series = synthetic_series(&SyntheticConfig {
            months: 150,
            stock_annual_return_pct: -3.0,
            ..SyntheticConfig::default()
        })
        .unwrap();
        let windows = compute_windows(&series, 72, WindowAlignment::Monthly);
        let runner = ParallelRunner::new(ComparisonEngine::default());

        let parallel = runner.run_all(&series, &windows).unwrap();
        let sequential = runner.run_sequential(&series, &windows).unwrap();

        assert_eq!(parallel.len(), 79);
        for (p, s) in parallel.iter().zip(&sequential) {
            assert_eq!(p.window, s.window);
            assert_eq!(p.plain, s.plain);
            assert_eq!(p.bonus, s.bonus);
        }
        assert!(parallel.windows(2).all(|w| w[0].window.start_idx < w[1].window.start_idx));
    }

    #[test]
    fn test_no_windows_no_results() {
        let runner = ParallelRunner::new(ComparisonEngine::default());
        let results = runner.run_all(&PriceSeries::new(), &[]).unwrap();
        assert!(results.is_empty());
    }
}
