// Archivo: preview.rs
// Propósito: servicio de tokens de preview efímeros. Emite tokens opacos
// ligados a una única revisión (posiblemente no publicada) y resuelve el
// diff de campos pendientes contra el payload publicado actual.
use crate::errors::{Result, WorkflowError};
use crate::repository::ContentRepository;
use chrono::{Duration, Utc};
use content_domain::PreviewToken;
use dashmap::DashMap;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Campos de estilo conocidos por el editor visual y la propiedad CSS que
/// gobiernan en el render en vivo. Cualquier otro campo no lleva hint.
static CSS_HINTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([("background_color", "background-color"),
                   ("text_color", "color"),
                   ("accent_color", "border-color"),
                   ("font_family", "font-family"),
                   ("font_size", "font-size")])
});

/// Cambio pendiente de un campo: valor nuevo, tipo JSON y propiedad CSS
/// asociada si el campo es de estilo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub value: serde_json::Value,
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(rename = "cssProperty")]
    pub css_property: Option<String>,
}

/// Diff de preview: ruta de campo -> cambio, en orden estable de payload.
pub type PreviewDiff = IndexMap<String, FieldChange>;

/// Servicio de emisión y resolución de tokens de preview.
///
/// Los tokens son opacos (hex blake3), de un solo alcance (una revisión) y
/// expiran por sí mismos. La resolución es de sólo lectura y sin efectos;
/// un token expirado responde exactamente igual que uno desconocido para
/// no filtrar existencia.
pub struct PreviewService<R>
    where R: ContentRepository
{
    repo: Arc<R>,
    tokens: DashMap<String, PreviewToken>,
    ttl: Duration,
}

impl<R> PreviewService<R> where R: ContentRepository
{
    pub fn new(repo: Arc<R>, ttl: Duration) -> Self {
        Self { repo, tokens: DashMap::new(), ttl }
    }

    /// Emite un token ligado a la revisión dada, con el TTL fijo del
    /// servicio. La revisión debe existir.
    pub fn issue(&self, revision_id: &Uuid) -> Result<PreviewToken> {
        let rev = self.repo.get_revision(revision_id)?;
        let seed = format!("{}:{}:{}", Uuid::new_v4(), rev.id, Utc::now().timestamp_nanos_opt().unwrap_or_default());
        let token = PreviewToken { token: blake3::hash(seed.as_bytes()).to_hex().to_string(),
                                   revision_id: rev.id,
                                   kind: rev.kind,
                                   content_id: rev.content_id,
                                   expires_at: Utc::now() + self.ttl };
        self.tokens.insert(token.token.clone(), token.clone());
        Ok(token)
    }

    /// Resuelve un token en el diff de cambios pendientes de su revisión
    /// contra el payload publicado actual del ítem. Señal uniforme de
    /// `NotFound` para token desconocido o expirado.
    pub fn resolve(&self, token: &str) -> Result<PreviewDiff> {
        let bound = match self.tokens.get(token) {
            Some(t) => t.clone(),
            None => return Err(unknown_token()),
        };
        if bound.is_expired_at(Utc::now()) {
            self.tokens.remove(token);
            return Err(unknown_token());
        }

        let rev = self.repo.get_revision(&bound.revision_id)?;
        let published = self.published_payload(&bound.content_id)?;
        Ok(diff_payloads(&published, &rev.payload))
    }

    /// Retira los tokens vencidos. Retorna cuántos se recolectaron.
    pub fn gc_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.tokens.len();
        self.tokens.retain(|_, t| !t.is_expired_at(now));
        before.saturating_sub(self.tokens.len())
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Payload de la revisión publicada vigente del ítem, u objeto vacío si
    /// nada está publicado todavía. Se lee por `published_revision_id`, que
    /// no se mueve cuando una revisión sucesora entra a revisión.
    fn published_payload(&self, content_id: &Uuid) -> Result<serde_json::Value> {
        let item = self.repo.get_item(content_id)?;
        match item.published_revision_id {
            Some(published) => Ok(self.repo.get_revision(&published)?.payload),
            None => Ok(serde_json::json!({})),
        }
    }
}

fn unknown_token() -> WorkflowError {
    // Mismo mensaje para desconocido y expirado, a propósito.
    WorkflowError::NotFound("token de preview".to_string())
}

/// Aplana un objeto JSON en rutas de campo con puntos; los arrays y
/// escalares son hojas.
fn flatten(prefix: &str, value: &serde_json::Value, out: &mut IndexMap<String, serde_json::Value>) {
    match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                let path = if prefix.is_empty() { k.clone() } else { format!("{}.{}", prefix, k) };
                flatten(&path, v, out);
            }
        }
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}

/// Campos del payload pendiente que difieren del publicado (cambiados o
/// nuevos), en el orden del payload pendiente.
pub fn diff_payloads(published: &serde_json::Value, pending: &serde_json::Value) -> PreviewDiff {
    let mut published_flat = IndexMap::new();
    let mut pending_flat = IndexMap::new();
    flatten("", published, &mut published_flat);
    flatten("", pending, &mut pending_flat);

    let mut diff = PreviewDiff::new();
    for (path, value) in pending_flat {
        if published_flat.get(&path) == Some(&value) {
            continue;
        }
        let leaf = path.rsplit('.').next().unwrap_or(&path);
        diff.insert(path.clone(),
                    FieldChange { value_type: value_type_name(&value).to_string(),
                                  css_property: CSS_HINTS.get(leaf).map(|p| p.to_string()),
                                  value });
    }
    diff
}

fn value_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
