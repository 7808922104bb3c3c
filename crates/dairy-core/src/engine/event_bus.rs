//! Broadcast channel for order events.

use dairy_types::OrderEvent;
use tokio::sync::broadcast;

/// Fan-out bus for [`OrderEvent`]s.
///
/// Publishing never blocks. Subscribers that fall behind by more than the
/// channel capacity miss the oldest events.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<OrderEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event. Fails only when nobody is subscribed.
	pub fn publish(
		&self,
		event: OrderEvent,
	) -> Result<(), broadcast::error::SendError<OrderEvent>> {
		self.sender.send(event)?;
		Ok(())
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(1000)
	}
}
