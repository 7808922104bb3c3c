//! Read-model types produced by the stats aggregator.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Reporting window, anchored at UTC midnight of the current day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
	#[serde(alias = "day")]
	Today,
	Week,
	Month,
	Year,
	#[default]
	All,
}

impl TimeWindow {
	/// Inclusive lower bound of the window relative to `now`, or `None` for `All`.
	pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
		let today = now.date_naive();
		let date = match self {
			TimeWindow::Today => Some(today),
			TimeWindow::Week => today.checked_sub_days(Days::new(7)),
			TimeWindow::Month => today.checked_sub_months(Months::new(1)),
			TimeWindow::Year => today.checked_sub_months(Months::new(12)),
			TimeWindow::All => return None,
		};
		Some(
			date.unwrap_or(NaiveDate::MIN)
				.and_hms_opt(0, 0, 0)
				.unwrap_or_default()
				.and_utc(),
		)
	}

	/// Returns true if `timestamp` falls inside the window.
	pub fn contains(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
		self.start(now).is_none_or(|start| timestamp >= start)
	}
}

impl FromStr for TimeWindow {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"today" | "day" => Ok(TimeWindow::Today),
			"week" => Ok(TimeWindow::Week),
			"month" => Ok(TimeWindow::Month),
			"year" => Ok(TimeWindow::Year),
			"all" => Ok(TimeWindow::All),
			_ => Err(format!("unknown time window '{}'", s)),
		}
	}
}

/// Per-courier figures over a window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStats {
	pub total_assigned: usize,
	pub total_delivered: usize,
	/// Commission earned on orders delivered inside the window.
	pub total_earnings: Decimal,
	/// Assigned orders that are not yet delivered or cancelled.
	pub pending_orders: usize,
}

/// Platform-wide figures over a window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
	pub total_orders: usize,
	/// Sum of `total_price` over every order created in the window, whatever its status.
	pub total_revenue: Decimal,
	pub pending_orders: usize,
	pub active_user_count: usize,
}

/// Lifetime stats shown next to a courier in the roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonStats {
	pub total_orders: usize,
	pub completed_orders: usize,
	pub pending_orders: usize,
	pub total_earnings: Decimal,
	pub today_deliveries: usize,
	/// Completed over total, as a rounded percentage.
	pub efficiency: u32,
}

/// One day of delivered orders for a courier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EarningsBucket {
	pub date: NaiveDate,
	pub order_count: usize,
	pub earnings: Decimal,
	pub total_revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSummary {
	pub total_orders: usize,
	pub total_earnings: Decimal,
	pub total_revenue: Decimal,
}

/// Daily earnings breakdown plus totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EarningsReport {
	pub earnings: Vec<EarningsBucket>,
	pub summary: EarningsSummary,
}
