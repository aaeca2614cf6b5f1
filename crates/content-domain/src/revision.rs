// revision.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{ContentKind, ContentStatus, DomainError};

/// Estado de una revisión dentro de la máquina de estados:
/// `Draft -> InReview -> Approved -> Published`, con `InReview -> Rejected`
/// como salida terminal. Un rollback crea una revisión nueva que entra
/// directamente en `Published`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionStatus {
  #[default]
  Draft,
  InReview,
  Approved,
  Rejected,
  Published,
}

impl RevisionStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      RevisionStatus::Draft => "draft",
      RevisionStatus::InReview => "in_review",
      RevisionStatus::Approved => "approved",
      RevisionStatus::Rejected => "rejected",
      RevisionStatus::Published => "published",
    }
  }

  /// Estados terminales para esta revisión concreta; el ítem sigue
  /// aceptando revisiones nuevas.
  pub fn is_terminal(&self) -> bool {
    matches!(self, RevisionStatus::Rejected | RevisionStatus::Published)
  }

  /// Una revisión activa bloquea el envío de otra a revisión
  /// (regla de "una sola revisión activa" por ítem).
  pub fn is_active(&self) -> bool {
    matches!(self, RevisionStatus::InReview | RevisionStatus::Approved)
  }

  /// Estado del ítem que refleja este estado de revisión. `Rejected` se
  /// refleja como `Draft`: el ítem vuelve a manos del editor.
  pub fn mirrored(&self) -> ContentStatus {
    match self {
      RevisionStatus::Draft | RevisionStatus::Rejected => ContentStatus::Draft,
      RevisionStatus::InReview => ContentStatus::InReview,
      RevisionStatus::Approved => ContentStatus::Approved,
      RevisionStatus::Published => ContentStatus::Published,
    }
  }
}

impl fmt::Display for RevisionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Instantánea inmutable del payload de un ítem más su estado de workflow.
/// Tras la creación sólo cambian `status`, `review_notes`, `decided_by` y
/// `decided_at`, exactamente una vez por transición y únicamente a través
/// del repositorio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
  pub id: Uuid,
  pub kind: ContentKind,
  pub content_id: Uuid,
  pub author_id: Uuid,
  pub payload: serde_json::Value,
  pub base_revision_id: Option<Uuid>,
  pub status: RevisionStatus,
  pub review_notes: Option<String>,
  pub created_at: DateTime<Utc>,
  pub decided_at: Option<DateTime<Utc>>,
  pub decided_by: Option<Uuid>,
}

impl Revision {
  /// Crea una revisión nueva, siempre en `Draft`. El payload debe ser un
  /// objeto JSON: es opaco para el motor pero el diff de preview necesita
  /// rutas de campo.
  pub fn new(kind: ContentKind,
             content_id: Uuid,
             author_id: Uuid,
             payload: serde_json::Value,
             base_revision_id: Option<Uuid>)
             -> Result<Self, DomainError> {
    if !payload.is_object() {
      return Err(DomainError::ValidationError("el payload de una revisión debe ser un objeto JSON".to_string()));
    }
    Ok(Self { id: Uuid::new_v4(),
              kind,
              content_id,
              author_id,
              payload,
              base_revision_id,
              status: RevisionStatus::Draft,
              review_notes: None,
              created_at: Utc::now(),
              decided_at: None,
              decided_by: None })
  }
}
