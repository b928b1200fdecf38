pub mod engine;
pub mod parallel;
pub mod stats;

pub use engine::{ComparisonEngine, DetailedComparison, WindowComparison};
pub use parallel::ParallelRunner;
pub use stats::{ComparisonSummary, ReturnStats, SummaryCalculator, WinTally};
