//! MQTT publisher for stored CO2sense readings.
//!
//! This module provides an MQTT client that subscribes to the internal reading
//! broadcast channel and republishes every stored reading to a broker.
//!
//! # Topic Structure
//!
//! - `{prefix}/{device}/co2` - CO2 value (ppm)
//! - `{prefix}/{device}/json` - Full reading as JSON
//!
//! `{prefix}/` is only present when `topic_prefix` is configured, so by
//! default dashboards subscribe to `{device}/co2` directly.
//!
//! # Example Configuration
//!
//! ```toml
//! [mqtt]
//! enabled = true
//! broker = "mqtt://localhost:1883"
//! topic_prefix = "home/sensors"
//! qos = 1
//! retain = true
//! ```
//!
//! # Reconnection
//!
//! The client automatically reconnects if the connection is lost. Connection
//! errors are logged but don't stop the publisher task.

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::MqttConfig;
use crate::state::{AppState, ReadingEvent};

/// MQTT publisher that forwards readings to an MQTT broker.
pub struct MqttPublisher {
    state: Arc<AppState>,
}

impl MqttPublisher {
    /// Create a new MQTT publisher.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Start the MQTT publisher.
    ///
    /// This spawns a background task that:
    /// 1. Connects to the configured MQTT broker
    /// 2. Subscribes to the internal readings broadcast channel
    /// 3. Publishes each reading to the broker until shutdown is signalled
    ///
    /// Returns `None` without spawning anything when MQTT is disabled.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        let config = self.state.config.mqtt.clone();

        if !config.enabled {
            info!("MQTT publisher is disabled");
            return None;
        }

        info!("Starting MQTT publisher to {}", config.broker);

        let readings_rx = self.state.readings_tx.subscribe();
        let shutdown_rx = self.state.subscribe_shutdown();

        Some(tokio::spawn(async move {
            run_mqtt_publisher(config, readings_rx, shutdown_rx).await;
        }))
    }
}

/// Run the MQTT publisher loop.
async fn run_mqtt_publisher(
    config: MqttConfig,
    mut readings_rx: broadcast::Receiver<ReadingEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let (host, port, use_tls) = match parse_broker_url(&config.broker) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("Invalid MQTT broker URL: {}", e);
            return;
        }
    };

    let mut mqtt_options = MqttOptions::new(&config.client_id, host, port);
    mqtt_options.set_keep_alive(Duration::from_secs(config.keep_alive));

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        mqtt_options.set_credentials(username, password);
    }

    if use_tls {
        mqtt_options.set_transport(rumqttc::Transport::tls_with_default_config());
    }

    let qos = qos_from_level(config.qos);
    let (client, mut eventloop) = AsyncClient::new(mqtt_options, 100);

    info!(
        "MQTT publisher connected to {} with prefix '{}'",
        config.broker,
        config.topic_prefix.as_deref().unwrap_or("")
    );

    let eventloop_task = tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!("MQTT connected: {:?}", ack);
                }
                Ok(Event::Incoming(Packet::PingResp)) => {
                    debug!("MQTT ping response received");
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("MQTT connection error: {}. Reconnecting...", e);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    });

    loop {
        tokio::select! {
            result = readings_rx.recv() => {
                match result {
                    Ok(event) => {
                        if let Err(e) = publish_reading(&client, &config, &event, qos).await {
                            warn!("Failed to publish reading: {}", e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("MQTT publisher lagged, missed {} readings", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Readings channel closed, stopping MQTT publisher");
                        break;
                    }
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!("MQTT publisher received stop signal");
                    break;
                }
            }
        }
    }

    if let Err(e) = client.disconnect().await {
        debug!("Error disconnecting MQTT client: {}", e);
    }
    eventloop_task.abort();

    info!("MQTT publisher stopped");
}

/// Errors from publishing one reading.
#[derive(Debug, thiserror::Error)]
enum PublishError {
    #[error("failed to encode reading: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Client(#[from] rumqttc::ClientError),
}

/// Publish a reading to its CO2 and JSON topics.
async fn publish_reading(
    client: &AsyncClient,
    config: &MqttConfig,
    event: &ReadingEvent,
    qos: QoS,
) -> Result<(), PublishError> {
    let prefix = config.topic_prefix.as_deref();
    let device = event.device_id.as_str();
    let retain = config.retain;

    client
        .publish(
            topic(prefix, device, "co2"),
            qos,
            retain,
            event.reading.co2.to_string(),
        )
        .await?;

    let json_payload = serde_json::to_string(&event.reading)?;
    client
        .publish(topic(prefix, device, "json"), qos, retain, json_payload)
        .await?;

    debug!(
        "Published reading for {} to MQTT (CO2={})",
        event.device_id, event.reading.co2
    );

    Ok(())
}

/// Build `{prefix}/{device}/{leaf}`, leaving out an unset or blank prefix.
fn topic(prefix: Option<&str>, device: &str, leaf: &str) -> String {
    match prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}/{}/{}", prefix, device, leaf),
        None => format!("{}/{}", device, leaf),
    }
}

fn qos_from_level(level: u8) -> QoS {
    match level {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::ExactlyOnce,
    }
}

/// Parse an MQTT broker URL into (host, port, use_tls).
fn parse_broker_url(url: &str) -> Result<(String, u16, bool), String> {
    let (use_tls, rest) = if let Some(stripped) = url.strip_prefix("mqtt://") {
        (false, stripped)
    } else if let Some(stripped) = url.strip_prefix("mqtts://") {
        (true, stripped)
    } else {
        return Err("Invalid scheme: URL must start with mqtt:// or mqtts://".to_string());
    };

    let default_port = if use_tls { 8883 } else { 1883 };

    let (host, port) = if let Some((h, p)) = rest.rsplit_once(':') {
        let port = p
            .parse::<u16>()
            .map_err(|_| format!("Invalid port: {}", p))?;
        (h.to_string(), port)
    } else {
        (rest.to_string(), default_port)
    };

    if host.is_empty() {
        return Err("Host cannot be empty".to_string());
    }

    Ok((host, port, use_tls))
}
