//! Stats aggregator.
//!
//! Every figure is recomputed from the order store on each call; nothing is
//! cached or persisted. Methods with an `_at` suffix take the reference time
//! explicitly, the others use the current time.

use crate::state::{OrderStore, UserDirectory};
use crate::LifecycleError;
use chrono::{DateTime, NaiveDate, Utc};
use dairy_types::{
	Decimal, DeliveryStats, EarningsBucket, EarningsReport, EarningsSummary, Order, OrderFilter,
	OrderStatus, PersonStats, PersonnelEntry, PlatformStats, TimeWindow,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct StatsAggregator {
	orders: Arc<OrderStore>,
	users: Arc<UserDirectory>,
	commission_rate: Decimal,
}

/// Rounded percentage of `completed` over `total`, halves rounding up.
/// Zero when `total` is zero.
pub fn efficiency_percent(completed: usize, total: usize) -> u32 {
	if total == 0 {
		return 0;
	}
	let (completed, total) = (completed as u64, total as u64);
	((completed * 200 + total) / (total * 2)) as u32
}

fn is_delivered_within(order: &Order, window: TimeWindow, now: DateTime<Utc>) -> bool {
	order.status == OrderStatus::Delivered
		&& order
			.delivery_completed_at
			.is_some_and(|at| window.contains(at, now))
}

impl StatsAggregator {
	pub fn new(orders: Arc<OrderStore>, users: Arc<UserDirectory>, commission_rate: Decimal) -> Self {
		Self {
			orders,
			users,
			commission_rate,
		}
	}

	pub fn commission_rate(&self) -> Decimal {
		self.commission_rate
	}

	fn commission(&self, revenue: Decimal) -> Decimal {
		self.commission_rate * revenue
	}

	async fn assigned_to(&self, delivery_id: &str) -> Result<Vec<Order>, LifecycleError> {
		self.orders
			.list_orders(&OrderFilter::by_delivery(delivery_id))
			.await
	}

	pub async fn delivery_stats(
		&self,
		delivery_id: &str,
		window: TimeWindow,
	) -> Result<DeliveryStats, LifecycleError> {
		self.delivery_stats_at(delivery_id, window, Utc::now()).await
	}

	/// Counts for one delivery person.
	///
	/// `total_assigned` counts assigned orders created in the window.
	/// Delivered counts and earnings use `delivery_completed_at`.
	/// `pending_orders` is every assigned order not yet finished, whatever
	/// the window.
	pub async fn delivery_stats_at(
		&self,
		delivery_id: &str,
		window: TimeWindow,
		now: DateTime<Utc>,
	) -> Result<DeliveryStats, LifecycleError> {
		let orders = self.assigned_to(delivery_id).await?;

		let delivered: Vec<&Order> = orders
			.iter()
			.filter(|o| is_delivered_within(o, window, now))
			.collect();
		let revenue: Decimal = delivered.iter().map(|o| o.total_price).sum();

		Ok(DeliveryStats {
			total_assigned: orders
				.iter()
				.filter(|o| window.contains(o.created_at, now))
				.count(),
			total_delivered: delivered.len(),
			total_earnings: self.commission(revenue),
			pending_orders: orders.iter().filter(|o| o.is_active()).count(),
		})
	}

	pub async fn platform_stats(&self, window: TimeWindow) -> Result<PlatformStats, LifecycleError> {
		self.platform_stats_at(window, Utc::now()).await
	}

	/// Platform totals over orders created in the window.
	///
	/// Revenue sums every such order regardless of status.
	pub async fn platform_stats_at(
		&self,
		window: TimeWindow,
		now: DateTime<Utc>,
	) -> Result<PlatformStats, LifecycleError> {
		let orders: Vec<Order> = self
			.orders
			.list_orders(&OrderFilter::default())
			.await?
			.into_iter()
			.filter(|o| window.contains(o.created_at, now))
			.collect();
		let active_user_count = self
			.users
			.list(None)
			.await?
			.iter()
			.filter(|u| u.is_active)
			.count();

		Ok(PlatformStats {
			total_orders: orders.len(),
			total_revenue: orders.iter().map(|o| o.total_price).sum(),
			pending_orders: orders
				.iter()
				.filter(|o| o.status == OrderStatus::Pending)
				.count(),
			active_user_count,
		})
	}

	/// Share of a delivery person's assigned orders that were delivered.
	pub async fn efficiency(&self, delivery_id: &str) -> Result<u32, LifecycleError> {
		let orders = self.assigned_to(delivery_id).await?;
		let completed = orders
			.iter()
			.filter(|o| o.status == OrderStatus::Delivered)
			.count();
		Ok(efficiency_percent(completed, orders.len()))
	}

	pub async fn person_stats(&self, delivery_id: &str) -> Result<PersonStats, LifecycleError> {
		self.person_stats_at(delivery_id, Utc::now()).await
	}

	pub async fn person_stats_at(
		&self,
		delivery_id: &str,
		now: DateTime<Utc>,
	) -> Result<PersonStats, LifecycleError> {
		let orders = self.assigned_to(delivery_id).await?;
		Ok(self.person_stats_from(&orders, now))
	}

	fn person_stats_from(&self, orders: &[Order], now: DateTime<Utc>) -> PersonStats {
		let completed: Vec<&Order> = orders
			.iter()
			.filter(|o| o.status == OrderStatus::Delivered)
			.collect();
		let revenue: Decimal = completed.iter().map(|o| o.total_price).sum();

		PersonStats {
			total_orders: orders.len(),
			completed_orders: completed.len(),
			pending_orders: orders.iter().filter(|o| o.is_active()).count(),
			total_earnings: self.commission(revenue),
			today_deliveries: orders
				.iter()
				.filter(|o| is_delivered_within(o, TimeWindow::Today, now))
				.count(),
			efficiency: efficiency_percent(completed.len(), orders.len()),
		}
	}

	/// Every delivery person with their derived stats.
	pub async fn personnel(&self) -> Result<Vec<PersonnelEntry>, LifecycleError> {
		self.personnel_at(Utc::now()).await
	}

	pub async fn personnel_at(
		&self,
		now: DateTime<Utc>,
	) -> Result<Vec<PersonnelEntry>, LifecycleError> {
		let all_orders = self.orders.list_orders(&OrderFilter::default()).await?;
		let personnel = self.users.personnel().await?;

		Ok(personnel
			.into_iter()
			.map(|user| {
				let assigned: Vec<Order> = all_orders
					.iter()
					.filter(|o| o.is_assigned_to(&user.id))
					.cloned()
					.collect();
				let stats = self.person_stats_from(&assigned, now);
				PersonnelEntry { user, stats }
			})
			.collect())
	}

	pub async fn earnings(
		&self,
		delivery_id: &str,
		window: TimeWindow,
	) -> Result<EarningsReport, LifecycleError> {
		self.earnings_at(delivery_id, window, Utc::now()).await
	}

	/// Daily earnings of delivered orders, bucketed by completion date in
	/// ascending order, with a summary across the window.
	pub async fn earnings_at(
		&self,
		delivery_id: &str,
		window: TimeWindow,
		now: DateTime<Utc>,
	) -> Result<EarningsReport, LifecycleError> {
		let orders = self.assigned_to(delivery_id).await?;

		let mut days: BTreeMap<NaiveDate, (usize, Decimal)> = BTreeMap::new();
		for order in orders.iter().filter(|o| is_delivered_within(o, window, now)) {
			let Some(completed_at) = order.delivery_completed_at else {
				continue;
			};
			let day = days.entry(completed_at.date_naive()).or_default();
			day.0 += 1;
			day.1 += order.total_price;
		}

		let earnings: Vec<EarningsBucket> = days
			.into_iter()
			.map(|(date, (order_count, revenue))| EarningsBucket {
				date,
				order_count,
				earnings: self.commission(revenue),
				total_revenue: revenue,
			})
			.collect();

		let total_revenue: Decimal = earnings.iter().map(|b| b.total_revenue).sum();
		let summary = EarningsSummary {
			total_orders: earnings.iter().map(|b| b.order_count).sum(),
			total_earnings: self.commission(total_revenue),
			total_revenue,
		};

		Ok(EarningsReport { earnings, summary })
	}

	/// Orders assigned to a delivery person that are still in flight.
	pub async fn active_orders(&self, delivery_id: &str) -> Result<Vec<Order>, LifecycleError> {
		let mut orders = self.assigned_to(delivery_id).await?;
		orders.retain(|o| o.is_active());
		Ok(orders)
	}

	/// The most recently created orders.
	pub async fn recent_orders(&self, limit: usize) -> Result<Vec<Order>, LifecycleError> {
		let mut orders = self.orders.list_orders(&OrderFilter::default()).await?;
		orders.truncate(limit);
		Ok(orders)
	}
}
