// content_item.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::RevisionStatus;

/// Variantes editoriales gestionadas por el motor. El payload de cada
/// variante es opaco: el motor nunca inspecciona campos específicos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
  Course,
  BlogPost,
  Package,
  Lesson,
  Media,
  Section,
}

impl ContentKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ContentKind::Course => "course",
      ContentKind::BlogPost => "blog_post",
      ContentKind::Package => "package",
      ContentKind::Lesson => "lesson",
      ContentKind::Media => "media",
      ContentKind::Section => "section",
    }
  }
}

impl fmt::Display for ContentKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for ContentKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "course" => Ok(Self::Course),
      "blog_post" => Ok(Self::BlogPost),
      "package" => Ok(Self::Package),
      "lesson" => Ok(Self::Lesson),
      "media" => Ok(Self::Media),
      "section" => Ok(Self::Section),
      _ => Err(format!("tipo de contenido inválido: {}", s)),
    }
  }
}

/// Estado de workflow de un ítem. Refleja siempre el estado de la revisión
/// apuntada por `current_revision_id`; `Rejected` se refleja como `Draft`
/// porque el ítem vuelve a ser editable.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
  #[default]
  Draft,
  InReview,
  Approved,
  Published,
}

impl ContentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ContentStatus::Draft => "draft",
      ContentStatus::InReview => "in_review",
      ContentStatus::Approved => "approved",
      ContentStatus::Published => "published",
    }
  }
}

impl fmt::Display for ContentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for ContentStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "draft" => Ok(Self::Draft),
      "in_review" => Ok(Self::InReview),
      "approved" => Ok(Self::Approved),
      "published" => Ok(Self::Published),
      _ => Err(format!("estado de contenido inválido: {}", s)),
    }
  }
}

/// Envoltorio de workflow de una entidad editorial. La carga útil vive en
/// las revisiones; el ítem sólo guarda punteros y metadatos de ciclo de
/// vida. Nunca se borra físicamente mientras existan revisiones: el borrado
/// marca `deleted_at` y conserva el historial para auditoría.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
  pub id: Uuid,
  pub kind: ContentKind,
  pub status: ContentStatus,
  pub current_revision_id: Option<Uuid>,
  /// Revisión publicada vigente. Sólo la mueven publicar y rollback; un
  /// envío posterior a revisión mueve `current_revision_id` pero no este
  /// puntero, así el contenido en vivo sigue siendo servible.
  pub published_revision_id: Option<Uuid>,
  pub scheduled_publish_at: Option<DateTime<Utc>>,
  pub published_at: Option<DateTime<Utc>>,
  pub creator_id: Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

impl ContentItem {
  /// Crea el envoltorio inicial de un ítem recién guardado por un editor.
  pub fn new(kind: ContentKind, creator_id: Uuid) -> Self {
    let now = Utc::now();
    Self { id: Uuid::new_v4(),
           kind,
           status: ContentStatus::Draft,
           current_revision_id: None,
           published_revision_id: None,
           scheduled_publish_at: None,
           published_at: None,
           creator_id,
           created_at: now,
           updated_at: now,
           deleted_at: None }
  }

  pub fn is_deleted(&self) -> bool {
    self.deleted_at.is_some()
  }

  /// Refleja el estado de la revisión dada sobre el ítem.
  pub fn mirror_status(&mut self, revision_status: RevisionStatus) {
    self.status = revision_status.mirrored();
    self.updated_at = Utc::now();
  }
}
