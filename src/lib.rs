pub mod config;
pub mod fetcher;
pub mod health;
pub mod notifier;
pub mod poller;
pub mod queue;
pub mod relay;
pub mod sink;
pub mod store;
pub mod traits;
pub mod types;

pub use config::Config;
pub use fetcher::NewsFetcher;
pub use poller::{NewsPoller, PollCycle};
pub use queue::{DeliveryOutcome, DeliveryQueue, DeliveryTicket, QueueConfig};
pub use relay::OrderStreamRelay;
pub use sink::WebhookSink;
pub use store::NewsStore;
pub use traits::{ArticleRepository, CheckpointStore, InsertOutcome, NewsSource, NotificationSink};
pub use types::*;
