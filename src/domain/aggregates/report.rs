//! Dashboard snapshots built on top of the revenue aggregator

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::domain::aggregates::order::Order;
use crate::domain::aggregates::revenue::{RevenueAggregator, RevenueWindow};
use crate::domain::value_objects::add_revenue;

/// Headline revenue for every window plus order counts, as shown on the admin dashboard.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueStats {
    pub all: Decimal,
    pub today: Decimal,
    pub week: Decimal,
    pub month: Decimal,
    pub year: Decimal,
    pub order_count: u64,
    pub pending_count: u64,
    pub completed_count: u64,
    pub cancelled_count: u64,
    /// Orders of any status placed since local midnight.
    pub today_order_count: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceNote {
    #[serde(rename = "Excellent month!")]
    Excellent,
    #[serde(rename = "Good performance")]
    Good,
    #[serde(rename = "Average performance")]
    Average,
    #[serde(rename = "Below target")]
    BelowTarget,
}

impl PerformanceNote {
    pub fn for_revenue(revenue: Decimal) -> Self {
        if revenue > Decimal::new(50_000, 0) { Self::Excellent }
        else if revenue > Decimal::new(30_000, 0) { Self::Good }
        else if revenue > Decimal::new(10_000, 0) { Self::Average }
        else { Self::BelowTarget }
    }
}

impl fmt::Display for PerformanceNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excellent => write!(f, "Excellent month!"),
            Self::Good => write!(f, "Good performance"),
            Self::Average => write!(f, "Average performance"),
            Self::BelowTarget => write!(f, "Below target"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReportRow {
    pub month_key: String,
    pub month: String,
    pub orders: u64,
    pub revenue: Decimal,
    pub avg_order_value: Decimal,
    pub note: PerformanceNote,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    pub orders: u64,
    pub revenue: Decimal,
    pub avg_order_value: Decimal,
}

/// Month-by-month revenue table with a totals row, ready for a spreadsheet writer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub rows: Vec<MonthlyReportRow>,
    pub totals: ReportTotals,
}

impl MonthlyReport {
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }
}

fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl RevenueAggregator {
    pub fn compute_stats(&self, orders: &[Order], now: DateTime<Utc>) -> RevenueStats {
        let counts = self.compute_status_counts(orders);
        let start_of_day = self.start_of_day(now);
        let total = |window| round_money(self.compute_total(orders, window, now));
        RevenueStats {
            all: total(RevenueWindow::All),
            today: total(RevenueWindow::Today),
            week: total(RevenueWindow::SevenDays),
            month: total(RevenueWindow::Month),
            year: total(RevenueWindow::Year),
            order_count: counts.total,
            pending_count: counts.pending,
            completed_count: counts.completed,
            cancelled_count: counts.cancelled,
            today_order_count: orders.iter().filter(|o| o.created_at().zip(start_of_day).is_some_and(|(at, start)| at >= start)).count() as u64,
        }
    }

    pub fn compute_monthly_report(&self, orders: &[Order]) -> MonthlyReport {
        let rows: Vec<MonthlyReportRow> = self
            .compute_monthly_breakdown(orders)
            .into_iter()
            .map(|bucket| MonthlyReportRow {
                avg_order_value: bucket.avg_order_value(),
                note: PerformanceNote::for_revenue(bucket.revenue_total),
                month_key: bucket.month_key,
                month: bucket.label,
                orders: bucket.order_count,
                revenue: bucket.revenue_total,
            })
            .collect();
        let orders_total: u64 = rows.iter().map(|r| r.orders).sum();
        let revenue_total = rows.iter().map(|r| r.revenue).fold(Decimal::ZERO, add_revenue);
        let avg_order_value = if orders_total == 0 { Decimal::ZERO } else { revenue_total / Decimal::from(orders_total) };
        MonthlyReport { rows, totals: ReportTotals { orders: orders_total, revenue: revenue_total, avg_order_value } }
    }
}
