use serde::{Deserialize, Serialize};

use bonusvest_core::{PriceSeries, StrategyParams, Window};

use crate::error::Result;
use crate::run::StrategyRun;
use crate::{plain, vesting};

/// Closed set of strategies the simulator can evaluate.
///
/// Each variant dispatches to its own pure accounting function; the two
/// share nothing beyond the price series and parameters they read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Monthly contributions straight into the index fund.
    Plain,
    /// Employer shares with bonus, vesting into the index fund.
    VestingBonus,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 2] = [StrategyKind::Plain, StrategyKind::VestingBonus];

    /// Stable identifier used in reports.
    pub fn id(&self) -> &'static str {
        match self {
            StrategyKind::Plain => "plain",
            StrategyKind::VestingBonus => "vesting_bonus",
        }
    }

    /// Run this strategy over `window` of `series`.
    pub fn simulate(
        &self,
        series: &PriceSeries,
        window: &Window,
        params: &StrategyParams,
    ) -> Result<StrategyRun> {
        match self {
            StrategyKind::Plain => plain::simulate(series, window, params),
            StrategyKind::VestingBonus => vesting::simulate(series, window, params),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
