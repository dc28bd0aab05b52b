use async_trait::async_trait;
use chrono::Utc;
use marquee_core::{CollaboratorError, NotificationSender};
use marquee_shared::{Masked, NotificationMessage};
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{debug, error};

/// Publishes notifications to a Kafka topic for a downstream mail/SMS relay.
/// Messages are keyed by recipient so one recipient's notices stay ordered.
pub struct KafkaNotificationSender {
    producer: FutureProducer,
    topic: String,
}

impl KafkaNotificationSender {
    pub fn new(brokers: &str, topic: impl Into<String>) -> Result<Self, KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("client.id", "marquee-notifier")
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self {
            producer,
            topic: topic.into(),
        })
    }
}

#[async_trait]
impl NotificationSender for KafkaNotificationSender {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), CollaboratorError> {
        let message = NotificationMessage {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            timestamp: Utc::now().timestamp(),
        };
        let payload = serde_json::to_string(&message)
            .map_err(|e| CollaboratorError::Permanent(e.to_string()))?;

        let record = FutureRecord::to(&self.topic).key(recipient).payload(&payload);
        // queue full counts as a delivery failure instead of blocking the caller
        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                debug!(
                    "Notification for {} queued on {}: partition {} offset {}",
                    Masked(recipient),
                    self.topic,
                    delivery.partition,
                    delivery.offset
                );
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to publish notification to {}: {}", self.topic, e);
                Err(CollaboratorError::Transient(e.to_string()))
            }
        }
    }
}
