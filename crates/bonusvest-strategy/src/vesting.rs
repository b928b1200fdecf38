use chrono::Datelike;

use bonusvest_core::{PriceSeries, StrategyParams, UnvestedValuation, Window};

use crate::error::Result;
use crate::kind::StrategyKind;
use crate::lots::LotBook;
use crate::run::{check_window, MaturityEvent, MonthlyValue, SimulationResult, StrategyRun};

/// Employer share purchase with bonus shares and a calendar vesting date.
///
/// Each month `i` in `1..W`, in order:
///   1. matured proceeds earn the index return `a[i] / a[i-1]`
///   2. while `i <= investment_months`, buy `investment / b[i]` shares plus
///      `bonus_fraction` of that again into the lot of the current year
///   3. on the vesting month/day, the lot bought `vesting_delay_years`
///      earlier is sold whole at `b[i]` and rolled into the index fund
///
/// Step 1 runs before step 3 so fresh proceeds start compounding next month.
/// Lots still open at the window end are valued per
/// [`UnvestedValuation`].
pub fn simulate(
    series: &PriceSeries,
    window: &Window,
    params: &StrategyParams,
) -> Result<StrategyRun> {
    check_window(series, window, params)?;

    let range = window.start_idx..window.end_idx;
    let index = &series.price_a[range.clone()];
    let stock = &series.price_b[range.clone()];
    let timestamps = &series.timestamps[range.clone()];
    let dates = &series.dates[range];
    let horizon = params.horizon_len();
    let delay = params.vesting_delay_years as i32;

    let mut lots = LotBook::new();
    let mut matured_value = 0.0;
    let mut maturities = Vec::new();
    let mut trajectory = Vec::with_capacity(index.len() - 1);

    for i in 1..index.len() {
        let date = dates[i];

        matured_value *= index[i] / index[i - 1];

        if i <= horizon {
            let regular_shares = params.monthly_investment / stock[i];
            let bonus_shares = regular_shares * params.bonus_fraction;
            lots.add(date.year(), regular_shares + bonus_shares);
        }

        if date.month() == params.vesting_month && date.day() == params.vesting_day {
            let source_year = date.year() - delay;
            if let Some(shares) = lots.mature(source_year) {
                let proceeds = shares * stock[i];
                matured_value += proceeds;
                tracing::trace!(source_year, shares, proceeds, "lot matured");
                maturities.push(MaturityEvent {
                    timestamp: timestamps[i],
                    source_year,
                    shares,
                    price: stock[i],
                    proceeds,
                });
            }
        }

        trajectory.push(MonthlyValue::new(
            timestamps[i],
            matured_value,
            lots.value_at(stock[i]),
        ));
    }

    let last_price = stock[stock.len() - 1];
    let final_value = match params.unvested_valuation {
        UnvestedValuation::MarkToMarket => matured_value + lots.value_at(last_price),
        UnvestedValuation::Discard => matured_value,
    };

    Ok(StrategyRun {
        result: SimulationResult::new(StrategyKind::VestingBonus, window, final_value, params),
        trajectory,
        maturities,
        unvested_lots: lots.lots(),
    })
}
