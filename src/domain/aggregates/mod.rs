//! Aggregates module
pub mod order;
pub mod revenue;
pub mod report;

pub use order::{parse_orders, Order, OrderStatus, RawOrder};
pub use revenue::{DailyBucket, MonthlyBucket, RevenueAggregator, RevenueWindow, StatusCounts, StatusPercentages};
pub use report::{MonthlyReport, MonthlyReportRow, PerformanceNote, ReportTotals, RevenueStats};
