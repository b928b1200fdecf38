//! Month-by-month accounting for the plain index strategy and the
//! vesting-bonus employer share strategy.

pub mod error;
pub mod kind;
pub mod lots;
pub mod plain;
pub mod run;
pub mod vesting;

pub use error::{Result, SimError};
pub use kind::StrategyKind;
pub use lots::{LotBook, PurchaseLot};
pub use run::{annualized_return, MaturityEvent, MonthlyValue, SimulationResult, StrategyRun};
