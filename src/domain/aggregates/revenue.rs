//! Revenue aggregation over an order snapshot
//!
//! Two predicates decide which orders count, and they differ on purpose:
//! headline totals ([`RevenueAggregator::compute_total`]) need a paid,
//! non-cancelled, dated order inside the selected window, while the monthly
//! and daily breakdowns count every dated `Completed` order whether or not a
//! proof of payment was uploaded.
//!
//! All calendar reasoning happens in the aggregator's report time zone.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use crate::domain::aggregates::order::{Order, OrderStatus};
use crate::domain::value_objects::{add_revenue, is_supported_instant, Percentage};
use crate::RevenueError;

/// Named time range applied before summing revenue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevenueWindow {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "7days", alias = "week")]
    SevenDays,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "year")]
    Year,
}

impl RevenueWindow {
    pub const ALL: [RevenueWindow; 5] = [Self::All, Self::Today, Self::SevenDays, Self::Month, Self::Year];

    pub fn as_str(&self) -> &'static str {
        match self { Self::All => "all", Self::Today => "today", Self::SevenDays => "7days", Self::Month => "month", Self::Year => "year" }
    }
}

impl fmt::Display for RevenueWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for RevenueWindow {
    type Err = RevenueError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "today" => Ok(Self::Today),
            "7days" | "week" => Ok(Self::SevenDays),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(RevenueError::InvalidWindow(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBucket {
    /// `YYYY-MM`
    pub month_key: String,
    /// e.g. `March 2024`
    pub label: String,
    pub order_count: u64,
    pub revenue_total: Decimal,
}

impl MonthlyBucket {
    pub fn avg_order_value(&self) -> Decimal {
        if self.order_count == 0 { Decimal::ZERO } else { self.revenue_total / Decimal::from(self.order_count) }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
    /// `YYYY-MM-DD`
    pub day_key: String,
    /// e.g. `Tue, Mar 5, 2024`
    pub label: String,
    pub weekday: String,
    pub month: String,
    pub order_count: u64,
    pub revenue_total: Decimal,
    pub avg_order_value: Decimal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub completed: u64,
    pub cancelled: u64,
    /// Every order in the snapshot, unrecognised statuses included.
    pub total: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPercentages {
    pub pending: Percentage,
    pub completed: Percentage,
    pub cancelled: Percentage,
}

impl StatusCounts {
    pub fn percentages(&self) -> StatusPercentages {
        let total = self.total as i64;
        StatusPercentages {
            pending: Percentage::of(self.pending as i64, total),
            completed: Percentage::of(self.completed as i64, total),
            cancelled: Percentage::of(self.cancelled as i64, total),
        }
    }
}

/// Pure revenue computations bound to a report time zone.
#[derive(Clone, Copy, Debug)]
pub struct RevenueAggregator {
    tz: Tz,
}

impl RevenueAggregator {
    pub fn new(tz: Tz) -> Self { Self { tz } }
    pub fn timezone(&self) -> Tz { self.tz }

    /// Midnight of `now`'s local day, as an instant. `None` when `now` is outside the supported years.
    pub fn start_of_day(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !is_supported_instant(now) { return None; }
        let local = now.with_timezone(&self.tz);
        let midnight = local.date_naive().and_time(NaiveTime::MIN);
        match self.tz.from_local_datetime(&midnight).earliest() {
            Some(start) => Some(start.with_timezone(&Utc)),
            // midnight skipped by a DST jump
            None => now.checked_sub_signed(local.time().signed_duration_since(NaiveTime::MIN)),
        }
    }

    /// Dated windows never match when either instant is outside the supported years.
    pub fn in_window(&self, at: DateTime<Utc>, window: RevenueWindow, now: DateTime<Utc>) -> bool {
        if window == RevenueWindow::All { return true; }
        if !is_supported_instant(at) || !is_supported_instant(now) { return false; }
        match window {
            RevenueWindow::All => true,
            RevenueWindow::Today => self.start_of_day(now).is_some_and(|start| at >= start),
            RevenueWindow::SevenDays => now.checked_sub_signed(Duration::days(7)).is_some_and(|from| at >= from) && at <= now,
            RevenueWindow::Month => {
                let (at, now) = (at.with_timezone(&self.tz), now.with_timezone(&self.tz));
                at.year() == now.year() && at.month() == now.month()
            }
            RevenueWindow::Year => at.with_timezone(&self.tz).year() == now.with_timezone(&self.tz).year(),
        }
    }

    /// Paid, non-cancelled revenue inside `window`.
    pub fn compute_total(&self, orders: &[Order], window: RevenueWindow, now: DateTime<Utc>) -> Decimal {
        orders
            .iter()
            .filter(|o| o.revenue_timestamp().is_some_and(|at| self.in_window(at, window, now)))
            .map(Order::total_price)
            .fold(Decimal::ZERO, add_revenue)
    }

    /// Completed orders grouped by local calendar month, ascending.
    pub fn compute_monthly_breakdown(&self, orders: &[Order]) -> Vec<MonthlyBucket> {
        let mut months: BTreeMap<(i32, u32), MonthlyBucket> = BTreeMap::new();
        for (order, day) in self.completed_days(orders) {
            let bucket = months.entry((day.year(), day.month())).or_insert_with(|| MonthlyBucket {
                month_key: format!("{:04}-{:02}", day.year(), day.month()),
                label: day.with_day(1).unwrap_or(day).format("%B %Y").to_string(),
                order_count: 0,
                revenue_total: Decimal::ZERO,
            });
            bucket.order_count += 1;
            bucket.revenue_total = add_revenue(bucket.revenue_total, order.total_price());
        }
        months.into_values().collect()
    }

    /// Completed orders grouped by local calendar day, ascending.
    pub fn compute_daily_breakdown(&self, orders: &[Order]) -> Vec<DailyBucket> {
        let mut days: BTreeMap<NaiveDate, DailyBucket> = BTreeMap::new();
        for (order, day) in self.completed_days(orders) {
            let bucket = days.entry(day).or_insert_with(|| DailyBucket {
                day_key: day.format("%Y-%m-%d").to_string(),
                label: day.format("%a, %b %-d, %Y").to_string(),
                weekday: day.format("%A").to_string(),
                month: day.format("%B").to_string(),
                order_count: 0,
                revenue_total: Decimal::ZERO,
                avg_order_value: Decimal::ZERO,
            });
            bucket.order_count += 1;
            bucket.revenue_total = add_revenue(bucket.revenue_total, order.total_price());
            bucket.avg_order_value = bucket.revenue_total / Decimal::from(bucket.order_count);
        }
        days.into_values().collect()
    }

    pub fn compute_status_counts(&self, orders: &[Order]) -> StatusCounts {
        orders.iter().fold(StatusCounts { total: orders.len() as u64, ..Default::default() }, |mut counts, order| {
            match order.status() {
                OrderStatus::Pending => counts.pending += 1,
                OrderStatus::Completed => counts.completed += 1,
                OrderStatus::Cancelled => counts.cancelled += 1,
                OrderStatus::Other(_) => {}
            }
            counts
        })
    }

    /// `round(count / total * 100)` clamped to `0..=100`; a non-positive total gives 0.
    pub fn compute_percentage(count: i64, total: i64) -> u8 { Percentage::of(count, total).value() }

    fn completed_days<'a>(&'a self, orders: &'a [Order]) -> impl Iterator<Item = (&'a Order, NaiveDate)> + 'a {
        orders
            .iter()
            .filter(|o| o.is_completed())
            .filter_map(move |o| o.created_at().filter(|at| is_supported_instant(*at)).map(|at| (o, at.with_timezone(&self.tz).date_naive())))
    }
}
