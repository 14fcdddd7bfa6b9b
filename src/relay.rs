use crate::notifier;
use crate::queue::DeliveryQueue;
use crate::types::{OrderUpdateEvent, Result};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Forwards pushed order-update events to the delivery queue.
///
/// No state, no dedup, no retry beyond the queue's own: push events are not
/// replayed by the exchange, so each is relayed at most once, best-effort.
pub struct OrderStreamRelay {
    queue: DeliveryQueue,
}

impl OrderStreamRelay {
    pub fn new(queue: DeliveryQueue) -> Self {
        Self { queue }
    }

    /// Spawn the relay task. The returned sender is the intake the exchange
    /// streaming client pushes decoded events into; dropping every clone of
    /// it ends the task.
    pub fn start(queue: DeliveryQueue) -> (mpsc::UnboundedSender<OrderUpdateEvent>, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let relay = Self::new(queue);
        let task = tokio::spawn(relay.run(receiver));
        (sender, task)
    }

    pub async fn run(self, mut events: mpsc::UnboundedReceiver<OrderUpdateEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(&event);
        }
        info!("Order update stream closed");
    }

    /// Render and enqueue one event, dropping the delivery ticket: terminal
    /// failures are the queue's to report.
    pub fn dispatch(&self, event: &OrderUpdateEvent) {
        let payload = notifier::render_order_update(event);
        match self.queue.enqueue(payload) {
            Ok(_ticket) => debug!(
                "Relayed order update for {}",
                event.symbol.as_deref().unwrap_or("Unknown")
            ),
            Err(e) => error!("Could not enqueue order update: {}", e),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamFrame {
    #[serde(rename = "e", default)]
    event_type: Option<String>,
    #[serde(rename = "o")]
    order: Option<OrderUpdateEvent>,
}

/// Decode one raw stream frame. Returns `None` for frames that are not order
/// updates (account snapshots, listen-key pings and the like).
pub fn decode_stream_frame(raw: &str) -> Result<Option<OrderUpdateEvent>> {
    let frame: StreamFrame = serde_json::from_str(raw)?;
    match frame.event_type.as_deref() {
        Some("ORDER_TRADE_UPDATE") => Ok(frame.order),
        _ => Ok(None),
    }
}
