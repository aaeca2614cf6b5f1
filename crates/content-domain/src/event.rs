// event.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Tipo de mutación notificada a los suscriptores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
  Create,
  Update,
  Delete,
}

impl EventType {
  pub fn as_str(&self) -> &'static str {
    match self {
      EventType::Create => "create",
      EventType::Update => "update",
      EventType::Delete => "delete",
    }
  }
}

impl fmt::Display for EventType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Notificación efímera de mutación. El motor no la persiste; un suscriptor
/// que se conecta después de emitida no la verá.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  #[serde(rename = "type")]
  pub event_type: EventType,
  pub entity: String,
  pub entity_id: Uuid,
  pub data: serde_json::Value,
  pub timestamp: DateTime<Utc>,
  pub user_id: Option<Uuid>,
}

impl Event {
  pub fn new(event_type: EventType, entity: impl Into<String>, entity_id: Uuid, data: serde_json::Value, user_id: Option<Uuid>) -> Self {
    Self { event_type,
           entity: entity.into(),
           entity_id,
           data,
           timestamp: Utc::now(),
           user_id }
  }
}
