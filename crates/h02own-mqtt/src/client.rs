//! rumqttc-backed bus client

use async_trait::async_trait;
use h02own_core::{BusClient, PublishError, QualityOfService};
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, Packet, QoS};
use tracing::{info, trace, warn};

use crate::error::MqttError;
use crate::settings::MqttSettings;

/// Requests buffered between the client handle and the event loop
const REQUEST_CHANNEL_CAPACITY: usize = 100;

/// Publishing handle for the broker connection.
///
/// Cloning is cheap; all clones feed the same [`MqttConnection`].
#[derive(Clone, Debug)]
pub struct MqttBus {
    client: AsyncClient,
}

/// Event loop half of the broker connection
pub struct MqttConnection {
    eventloop: EventLoop,
    broker: String,
}

impl MqttBus {
    /// Connect to the broker and wait for it to accept the session.
    ///
    /// Any failure before CONNACK is returned as an error; nothing is retried.
    pub async fn connect(settings: &MqttSettings) -> Result<(Self, MqttConnection), MqttError> {
        let (client, mut eventloop) =
            AsyncClient::new(settings.to_options(), REQUEST_CHANNEL_CAPACITY);

        info!(broker = %settings.broker(), client_id = %settings.client_id, "Connecting to MQTT broker");

        tokio::time::timeout(settings.connect_timeout, wait_for_connack(&mut eventloop))
            .await
            .map_err(|_| MqttError::ConnectTimeout(settings.connect_timeout))??;

        info!(broker = %settings.broker(), "MQTT Connected");

        let connection = MqttConnection {
            eventloop,
            broker: settings.broker(),
        };
        Ok((Self { client }, connection))
    }

    /// Ask the broker to close the session.
    ///
    /// Only queues the request; the [`MqttConnection`] must still be running
    /// to send it.
    pub async fn disconnect(&self) {
        if let Err(e) = self.client.disconnect().await {
            warn!(error = %e, "MQTT disconnect request failed");
        }
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<(), MqttError> {
    loop {
        match eventloop.poll().await? {
            Event::Incoming(Packet::ConnAck(ack)) => {
                return if ack.code == ConnectReturnCode::Success {
                    Ok(())
                } else {
                    Err(MqttError::Refused(format!("{:?}", ack.code)))
                };
            }
            event => trace!(?event, "MQTT event before CONNACK"),
        }
    }
}

impl MqttConnection {
    /// Drive the connection until the broker goes away.
    ///
    /// Never returns `Ok`: losing the broker is always reported as an error so
    /// the caller can decide to shut down.
    pub async fn run(mut self) -> Result<(), MqttError> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    info!(broker = %self.broker, "MQTT broker sent disconnect");
                    return Err(MqttError::Disconnected);
                }
                Ok(Event::Outgoing(rumqttc::Outgoing::Disconnect)) => {
                    info!(broker = %self.broker, "MQTT session closed");
                    return Err(MqttError::Disconnected);
                }
                Ok(event) => trace!(?event, "MQTT event"),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl std::fmt::Debug for MqttConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttConnection")
            .field("broker", &self.broker)
            .finish_non_exhaustive()
    }
}

fn to_qos(qos: QualityOfService) -> QoS {
    match qos {
        QualityOfService::AtMostOnce => QoS::AtMostOnce,
    }
}

#[async_trait]
impl BusClient for MqttBus {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
        qos: QualityOfService,
    ) -> Result<(), PublishError> {
        self.client
            .publish(topic, to_qos(qos), retain, payload)
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))
    }
}
