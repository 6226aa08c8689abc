/// Outbound event notifications.
/// Delivery is fire-and-forget: a lost notification never fails the request
/// that produced it, so the trait methods are infallible and implementations
/// log their own errors.
// region:    --- Imports
use crate::bidding::model::{AutoBidRule, StandingBid};
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Events

pub const BID_UPDATES_TOPIC: &str = "bid-updates";
pub const AUTO_BID_UPDATES_TOPIC: &str = "auto-bid-updates";

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BidAction {
    Placed,
    Updated,
    AutoPlaced,
    AutoUpdated,
}

/// Scoped to an auction topic: someone's standing bid changed.
#[derive(Debug, Serialize)]
pub struct BidUpdate {
    pub action: BidAction,
    pub bid: StandingBid,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoBidAction {
    Set,
    Removed,
}

/// Scoped to a user topic: the user's own auto-bid rule changed.
#[derive(Debug, Serialize)]
pub struct AutoBidUpdate {
    pub auction_id: i64,
    pub action: AutoBidAction,
    pub auto_bid: Option<AutoBidRule>,
}

// endregion: --- Events

// region:    --- Notifier Trait

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn bid_update(&self, auction_id: i64, update: &BidUpdate);
    async fn auto_bid_update(&self, user_id: i64, update: &AutoBidUpdate);
}

// endregion: --- Notifier Trait

// region:    --- Kafka Notifier

pub struct KafkaNotifier {
    producer: Arc<FutureProducer>,
    brokers: String,
}

impl KafkaNotifier {
    /// Brokers come from `KAFKA_BROKERS`, defaulting to a local single node.
    pub fn new() -> Self {
        let brokers =
            std::env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string());
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .expect("Producer creation error");

        KafkaNotifier {
            producer: Arc::new(producer),
            brokers,
        }
    }

    pub async fn create_topic(
        &self,
        topic_name: &str,
        num_partitions: i32,
        replication_factor: i32,
    ) -> Result<(), String> {
        info!("{:<12} --> creating topic: {}", "Notifier", topic_name);

        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()
            .map_err(|e| format!("AdminClient creation failed: {:?}", e))?;

        let new_topic = NewTopic::new(
            topic_name,
            num_partitions,
            TopicReplication::Fixed(replication_factor),
        );

        admin_client
            .create_topics(&[new_topic], &AdminOptions::new())
            .await
            .map_err(|e| format!("Topic creation failed: {:?}", e))?;

        info!("{:<12} --> topic ready: {}", "Notifier", topic_name);
        Ok(())
    }

    async fn send_message(&self, topic: &str, key: &str, value: &str) {
        info!(
            "{:<12} --> sending message: topic={}, key={}",
            "Notifier", topic, key
        );
        let record = FutureRecord::to(topic).key(key).payload(value);

        if let Err((e, _)) = self
            .producer
            .send(record, std::time::Duration::from_secs(0))
            .await
        {
            // Best effort only; the triggering request already succeeded.
            error!(
                "{:<12} --> send failed: topic={}, key={}, error={:?}",
                "Notifier", topic, key, e
            );
        }
    }
}

impl Default for KafkaNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for KafkaNotifier {
    async fn bid_update(&self, auction_id: i64, update: &BidUpdate) {
        match serde_json::to_string(update) {
            Ok(payload) => {
                self.send_message(
                    BID_UPDATES_TOPIC,
                    &format!("auction:{}", auction_id),
                    &payload,
                )
                .await
            }
            Err(e) => error!("{:<12} --> serialize failed: {:?}", "Notifier", e),
        }
    }

    async fn auto_bid_update(&self, user_id: i64, update: &AutoBidUpdate) {
        match serde_json::to_string(update) {
            Ok(payload) => {
                self.send_message(
                    AUTO_BID_UPDATES_TOPIC,
                    &format!("user:{}", user_id),
                    &payload,
                )
                .await
            }
            Err(e) => error!("{:<12} --> serialize failed: {:?}", "Notifier", e),
        }
    }
}

// endregion: --- Kafka Notifier

// region:    --- Noop Notifier

/// Notifier that drops everything. Used where no broker is wired up.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn bid_update(&self, _auction_id: i64, _update: &BidUpdate) {}
    async fn auto_bid_update(&self, _user_id: i64, _update: &AutoBidUpdate) {}
}

// endregion: --- Noop Notifier
