use crate::traits::NotificationSink;
use crate::types::{HeraldError, Outbound, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Send attempts per message before it is dropped.
    pub max_attempts: u32,
    /// Backoff after the n-th failed attempt is `n * backoff_base`.
    pub backoff_base: Duration,
    /// Minimum gap between any two consecutive send attempts, same or
    /// different message, independent of retry backoff.
    pub send_gap: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            send_gap: Duration::from_secs(1),
        }
    }
}

/// Terminal fate of one queued message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    Failed { attempts: u32 },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

struct QueuedMessage {
    id: Uuid,
    payload: Outbound,
    enqueued_at: DateTime<Utc>,
    attempt: u32,
    confirm: oneshot::Sender<DeliveryOutcome>,
}

/// Resolves once the queue has either delivered the message or given up on
/// it. Producers that do not need confirmation simply drop the ticket.
pub struct DeliveryTicket {
    receiver: oneshot::Receiver<DeliveryOutcome>,
}

impl DeliveryTicket {
    pub async fn wait(self) -> DeliveryOutcome {
        // The consumer dying before resolution counts as a failed delivery.
        self.receiver
            .await
            .unwrap_or(DeliveryOutcome::Failed { attempts: 0 })
    }
}

/// Strictly-ordered outbound queue with a single consumer task.
///
/// `enqueue` appends to the tail without blocking; the consumer drains
/// head-first, one message at a time, never concurrently, so the sink
/// observes notifications in enqueue order. A permanently failing message is
/// dropped after its retries and never blocks the messages behind it.
#[derive(Clone)]
pub struct DeliveryQueue {
    sender: mpsc::UnboundedSender<QueuedMessage>,
}

impl DeliveryQueue {
    pub fn start(sink: Arc<dyn NotificationSink>, config: QueueConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(consume(receiver, sink, config));
        Self { sender }
    }

    pub fn enqueue(&self, payload: Outbound) -> Result<DeliveryTicket> {
        let (confirm, receiver) = oneshot::channel();
        let message = QueuedMessage {
            id: Uuid::new_v4(),
            payload,
            enqueued_at: Utc::now(),
            attempt: 0,
            confirm,
        };

        debug!("Queued message {}", message.id);
        self.sender
            .send(message)
            .map_err(|_| HeraldError::QueueClosed)?;

        Ok(DeliveryTicket { receiver })
    }
}

async fn consume(
    mut receiver: mpsc::UnboundedReceiver<QueuedMessage>,
    sink: Arc<dyn NotificationSink>,
    config: QueueConfig,
) {
    let mut last_send: Option<Instant> = None;

    while let Some(mut message) = receiver.recv().await {
        let outcome = deliver(sink.as_ref(), &config, &mut message, &mut last_send).await;

        match outcome {
            DeliveryOutcome::Delivered { attempts } => {
                let queued_for = Utc::now() - message.enqueued_at;
                info!(
                    "Delivered message {} after {} attempt(s), {}ms in queue",
                    message.id,
                    attempts,
                    queued_for.num_milliseconds()
                );
            }
            DeliveryOutcome::Failed { attempts } => {
                error!(
                    "Dropping message {} after {} failed attempt(s)",
                    message.id, attempts
                );
            }
        }

        // The producer may have dropped its ticket; that is fine.
        let _ = message.confirm.send(outcome);
    }

    debug!("Delivery queue consumer stopped");
}

async fn deliver(
    sink: &dyn NotificationSink,
    config: &QueueConfig,
    message: &mut QueuedMessage,
    last_send: &mut Option<Instant>,
) -> DeliveryOutcome {
    loop {
        message.attempt += 1;

        // Pacing gap applies between any two sends, even across messages.
        if let Some(at) = *last_send {
            let since = at.elapsed();
            if since < config.send_gap {
                sleep(config.send_gap - since).await;
            }
        }
        *last_send = Some(Instant::now());

        match sink.send(&message.payload).await {
            Ok(()) => {
                return DeliveryOutcome::Delivered {
                    attempts: message.attempt,
                }
            }
            Err(e) => {
                if message.attempt >= config.max_attempts {
                    return DeliveryOutcome::Failed {
                        attempts: message.attempt,
                    };
                }

                let delay = config.backoff_base * message.attempt;
                warn!(
                    "Send attempt {} for message {} failed: {}, retrying in {:?}",
                    message.attempt, message.id, e, delay
                );
                sleep(delay).await;
            }
        }
    }
}
