// ── Home Assistant discovery ──
//
// Formats MQTT discovery payloads and publishes them retained under
// `{prefix}/{component}/{device_id}{object_id}/config`.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::CoreError;
use crate::mqtt::Broker;

const MANUFACTURER: &str = "keenmqtt";

/// Sensor presentation hints for Home Assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorClass {
    pub unit: &'static str,
    pub device_class: Option<&'static str>,
    pub state_class: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct DiscoveryPayload<'a> {
    name: &'a str,
    unique_id: String,
    state_topic: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    command_topic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit_of_measurement: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_class: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_class: Option<&'a str>,
    device: DeviceInfo<'a>,
}

#[derive(Debug, Serialize)]
struct DeviceInfo<'a> {
    identifiers: Vec<String>,
    name: &'a str,
    manufacturer: &'a str,
}

/// Publishes discovery messages for entities.
pub struct DiscoveryPublisher {
    broker: Arc<dyn Broker>,
    prefix: String,
    device_id: String,
}

impl DiscoveryPublisher {
    pub fn new(broker: Arc<dyn Broker>, prefix: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            broker,
            prefix: prefix.into(),
            device_id: device_id.into(),
        }
    }

    /// Announce a `select` entity with a fixed option list.
    pub async fn send_select(
        &self,
        command_topic: &str,
        state_topic: &str,
        device_name: &str,
        entity_name: &str,
        options: &[String],
    ) -> Result<(), CoreError> {
        let mut payload = self.payload(state_topic, device_name, entity_name);
        payload.command_topic = Some(command_topic);
        payload.options = Some(options);
        self.send("select", entity_name, &payload).await
    }

    /// Announce an ON/OFF `switch` entity.
    pub async fn send_switch(
        &self,
        command_topic: &str,
        state_topic: &str,
        device_name: &str,
        entity_name: &str,
    ) -> Result<(), CoreError> {
        let mut payload = self.payload(state_topic, device_name, entity_name);
        payload.command_topic = Some(command_topic);
        self.send("switch", entity_name, &payload).await
    }

    /// Announce a read-only `sensor` entity.
    pub async fn send_sensor(
        &self,
        state_topic: &str,
        device_name: &str,
        entity_name: &str,
        class: SensorClass,
    ) -> Result<(), CoreError> {
        let mut payload = self.payload(state_topic, device_name, entity_name);
        payload.unit_of_measurement = Some(class.unit);
        payload.device_class = class.device_class;
        payload.state_class = class.state_class;
        self.send("sensor", entity_name, &payload).await
    }

    /// Discovery topic for an entity of the given component.
    pub fn topic(&self, component: &str, entity_name: &str) -> String {
        format!(
            "{}/{}/{}{}/config",
            self.prefix,
            component,
            self.device_id,
            object_id(entity_name)
        )
    }

    fn payload<'a>(
        &self,
        state_topic: &'a str,
        device_name: &'a str,
        entity_name: &'a str,
    ) -> DiscoveryPayload<'a> {
        DiscoveryPayload {
            name: entity_name,
            unique_id: format!("{}{}", self.device_id, object_id(entity_name)),
            state_topic,
            command_topic: None,
            options: None,
            unit_of_measurement: None,
            device_class: None,
            state_class: None,
            device: DeviceInfo {
                identifiers: vec![format!("{}{}", self.device_id, object_id(device_name))],
                name: device_name,
                manufacturer: MANUFACTURER,
            },
        }
    }

    async fn send(
        &self,
        component: &str,
        entity_name: &str,
        payload: &DiscoveryPayload<'_>,
    ) -> Result<(), CoreError> {
        let body = serde_json::to_string(payload).map_err(|e| CoreError::Discovery {
            entity: entity_name.to_owned(),
            message: e.to_string(),
        })?;
        let topic = self.topic(component, entity_name);

        debug!(topic = %topic, "sending discovery");
        self.broker
            .publish(&topic, body, true)
            .await
            .map_err(|e| CoreError::Discovery {
                entity: entity_name.to_owned(),
                message: e.to_string(),
            })
    }
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn object_id(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
