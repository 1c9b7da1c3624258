//! Winch Point Revenue
//!
//! Revenue reporting for the Winch Point Offroad House storefront.
//!
//! ## Features
//! - Headline revenue per time window (all, today, 7 days, month, year)
//! - Monthly and daily breakdowns of completed orders
//! - Order status counts and percentages
//! - Monthly revenue report with performance notes
//! - HTTP service fetching order snapshots from the storefront backend
//!
//! The aggregation itself lives in [`RevenueAggregator`] and is pure: it never
//! reads the clock, the environment or the network.

use thiserror::Error;

pub mod api;
pub mod config;
pub mod domain;
pub mod source;

pub use config::Config;
pub use domain::aggregates::{
    parse_orders, DailyBucket, MonthlyBucket, MonthlyReport, MonthlyReportRow, Order, OrderStatus,
    PerformanceNote, RawOrder, ReportTotals, RevenueAggregator, RevenueStats, RevenueWindow, StatusCounts,
    StatusPercentages,
};
pub use domain::value_objects::{Percentage, ProofOfPayment};
pub use source::{BackendOrderSource, OrderSource, StaticOrderSource};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum RevenueError {
    #[error("Order backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Malformed order payload: {0}")]
    MalformedPayload(String),

    #[error("Unknown revenue window: {0}")]
    InvalidWindow(String),

    #[error("Unknown time zone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, RevenueError>;
