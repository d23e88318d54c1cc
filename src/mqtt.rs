use std::time::Duration;

use log::{debug, error, info};
use rumqttc::{MqttOptions, QoS};

use crate::config;
use crate::messages::EventKind;
use crate::reporter::ReportSink;

#[derive(Debug, Clone)]
pub struct MqttClient {
    client: rumqttc::AsyncClient,
    publisher_id: String,
    topic_path: String,
}

impl MqttClient {
    pub fn new(config: &config::MqttConfig) -> (Self, rumqttc::EventLoop) {
        let publisher_id = config
            .publisher_id
            .clone()
            .unwrap_or_else(|| "rb50-hub".to_string());

        let mut mqttoptions = MqttOptions::new(
            publisher_id.clone(),
            config.host.clone(),
            config.port.unwrap_or(1883),
        );

        mqttoptions.set_keep_alive(Duration::from_secs(config.keep_alive_seconds.unwrap_or(5)));

        if let (Some(username), Some(password)) =
            (config.username.as_ref(), config.password.as_ref())
        {
            mqttoptions.set_credentials(username.clone(), password.clone());
        }

        let (client, eventloop) = rumqttc::AsyncClient::new(mqttoptions, 10);

        (
            MqttClient {
                client,
                publisher_id,
                topic_path: config.topic_path.clone().unwrap_or("rb50".to_string()),
            },
            eventloop,
        )
    }

    /// Drives the connection. Nothing is subscribed, so incoming traffic is
    /// only logged.
    pub async fn event_loop(eventloop: &mut rumqttc::EventLoop) {
        loop {
            match eventloop.poll().await {
                Ok(rumqttc::Event::Incoming(rumqttc::Packet::ConnAck(_))) => {
                    info!("Connected to MQTT broker");
                }
                Ok(notification) => {
                    debug!("MQTT event: {:?}", notification);
                }
                Err(e) => {
                    error!("Error polling MQTT event loop: {:?}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    fn topic(&self, event: EventKind) -> String {
        format!(
            "{}/{}/{}",
            self.topic_path,
            self.publisher_id,
            sanitize_name(event.name())
        )
    }

    pub async fn disconnect(&self) -> Result<(), rumqttc::ClientError> {
        debug!("Disconnecting MQTT client");
        self.client.disconnect().await
    }
}

impl ReportSink for MqttClient {
    fn publish(&self, event: EventKind, payload: String) {
        if let Err(err) = self
            .client
            .try_publish(self.topic(event), QoS::AtMostOnce, false, payload)
        {
            error!("Error publishing {} on MQTT: {:?}", event.name(), err);
        }
    }
}

fn sanitize_name(name: &str) -> String {
    // Lowercase, every non-alphanumeric character becomes an underscore
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("RB50 Data"), "rb50_data");
        assert_eq!(sanitize_name("RB50 Warning"), "rb50_warning");
    }

    #[tokio::test]
    async fn test_topic_layout() {
        let config = config::MqttConfig {
            host: "localhost".to_string(),
            port: None,
            username: None,
            password: None,
            publisher_id: Some("hub-1".to_string()),
            topic_path: None,
            keep_alive_seconds: None,
        };
        let (client, _eventloop) = MqttClient::new(&config);
        assert_eq!(client.topic(EventKind::Data), "rb50/hub-1/rb50_data");
        assert_eq!(client.topic(EventKind::Warning), "rb50/hub-1/rb50_warning");
    }
}
