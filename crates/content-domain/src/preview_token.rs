// preview_token.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ContentKind;

/// Credencial opaca y efímera para renderizar en vivo una revisión no
/// publicada sin autenticación. Ligada a una única revisión: no puede
/// escalarse a otras revisiones ni a otros ítems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewToken {
  pub token: String,
  pub revision_id: Uuid,
  pub kind: ContentKind,
  pub content_id: Uuid,
  pub expires_at: DateTime<Utc>,
}

impl PreviewToken {
  /// Un token expirado se trata igual que uno desconocido.
  pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
    now >= self.expires_at
  }
}
