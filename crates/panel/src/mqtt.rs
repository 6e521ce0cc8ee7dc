use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::time::sleep;
use tracing::{info, warn};

use irrigation_engine::{CommandExecutor, ExecutorError, ZoneId};

use crate::config::MqttSection;

pub const PUMP_TOPIC: &str = "pump/set";

// ---------------------------------------------------------------------------
// Topic / payload helpers
// ---------------------------------------------------------------------------

/// "valve/<zone_id>/set".
pub(crate) fn valve_topic(zone_id: ZoneId) -> String {
    format!("valve/{zone_id}/set")
}

pub(crate) fn switch_payload(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Publishes valve and pump commands to the field controller. Commands are
/// refused while the broker is not connected, and when the outgoing queue
/// is full, so a dead link never blocks the caller.
pub struct MqttExecutor {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
}

/// Event loop half of the connection. Must be driven with [`MqttLink::run`]
/// for anything to be sent.
pub struct MqttLink {
    eventloop: EventLoop,
    connected: Arc<AtomicBool>,
}

impl MqttExecutor {
    pub fn connect(cfg: &MqttSection) -> (Self, MqttLink) {
        let mut options = MqttOptions::new(cfg.client_id.clone(), cfg.host.clone(), cfg.port);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, eventloop) = AsyncClient::new(options, 20);
        let connected = Arc::new(AtomicBool::new(false));
        (
            Self {
                client,
                connected: Arc::clone(&connected),
            },
            MqttLink {
                eventloop,
                connected,
            },
        )
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn publish(&self, topic: String, on: bool) -> Result<(), ExecutorError> {
        if !self.is_connected() {
            warn!(%topic, "mqtt not connected, command refused");
            return Err(ExecutorError::Unreachable("broker not connected".into()));
        }

        self.client
            .try_publish(topic.as_str(), QoS::AtLeastOnce, false, switch_payload(on))
            .map_err(|e| ExecutorError::Unreachable(e.to_string()))?;
        info!(%topic, payload = switch_payload(on), "mqtt command queued");
        Ok(())
    }
}

#[async_trait]
impl CommandExecutor for MqttExecutor {
    async fn set_valve(&mut self, zone_id: ZoneId, open: bool) -> Result<(), ExecutorError> {
        self.publish(valve_topic(zone_id), open)
    }

    async fn set_pump(&mut self, on: bool) -> Result<(), ExecutorError> {
        self.publish(PUMP_TOPIC.to_string(), on)
    }
}

impl MqttLink {
    /// Drive the connection forever, retrying after errors. Keeps the
    /// executor's connected flag current.
    pub async fn run(mut self) {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("mqtt connected");
                    self.connected.store(true, Ordering::Relaxed);
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    warn!("mqtt disconnected");
                    self.connected.store(false, Ordering::Relaxed);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("mqtt error: {e}. reconnecting...");
                    self.connected.store(false, Ordering::Relaxed);
                    sleep(Duration::from_secs(2)).await;
                }
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
