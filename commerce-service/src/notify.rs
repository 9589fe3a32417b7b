use anyhow::Result;
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use shared::OrderPlacedEvent;
use std::time::Duration;

/// Customer messaging. Delivery is best effort; callers log failures and
/// move on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn order_placed(&self, event: &OrderPlacedEvent) -> Result<()>;
}

pub struct KafkaNotifier {
    producer: FutureProducer,
    topic: String,
}

impl KafkaNotifier {
    pub fn new(producer: FutureProducer, topic: String) -> Self {
        Self { producer, topic }
    }
}

#[async_trait]
impl Notifier for KafkaNotifier {
    async fn order_placed(&self, event: &OrderPlacedEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;
        let key = event.customer_id.to_string();
        let record = FutureRecord::to(&self.topic)
            .payload(&json)
            .key(&key);

        self.producer.send(record, Duration::from_secs(5)).await
            .map_err(|(e, _)| anyhow::anyhow!("Failed to send order notification: {}", e))?;

        Ok(())
    }
}
