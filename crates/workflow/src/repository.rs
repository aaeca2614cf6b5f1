// Archivo: repository.rs
// Propósito: definir el trait `ContentRepository`, el contrato que deben
// implementar las persistencias (Postgres, in-memory, etc.) para el motor
// de workflow. Las revisiones son append-only: no existe API de borrado.
use crate::errors::Result;
use chrono::{DateTime, Utc};
use content_domain::{ContentItem, ContentKind, Revision, RevisionStatus};
use uuid::Uuid;

/// Contrato mínimo del almacén de ítems y revisiones.
///
/// Las revisiones nunca se borran físicamente y su `payload` es inmutable
/// tras la creación; la única vía de mutación es `update_revision_status`,
/// usada exclusivamente por el motor de workflow. Los ítems tampoco se
/// borran mientras existan revisiones: el borrado es lógico (`deleted_at`).
pub trait ContentRepository: Send + Sync {
    /// Inserta el envoltorio de un ítem recién creado.
    fn create_item(&self, item: &ContentItem) -> Result<()>;

    /// Obtiene un ítem por id. Retorna `NotFound` si no existe.
    fn get_item(&self, id: &Uuid) -> Result<ContentItem>;

    /// Reescribe los campos mutables del ítem (estado, punteros, fechas).
    /// Sólo el motor de workflow invoca esta operación.
    fn update_item(&self, item: &ContentItem) -> Result<()>;

    /// Lista ítems, opcionalmente filtrados por variante.
    fn list_items(&self, kind: Option<ContentKind>) -> Result<Vec<ContentItem>>;

    /// Crea una revisión nueva para el ítem, siempre en `Draft`. El
    /// repositorio genera la fila y la encadena al historial.
    fn create_revision(&self,
                       content_id: &Uuid,
                       author_id: Uuid,
                       payload: serde_json::Value,
                       base_revision_id: Option<Uuid>)
                       -> Result<Revision>;

    /// Obtiene una revisión por id. Retorna `NotFound` si no existe.
    fn get_revision(&self, id: &Uuid) -> Result<Revision>;

    /// Historial completo de un ítem, la revisión más reciente primero.
    fn history(&self, content_id: &Uuid) -> Result<Vec<Revision>>;

    /// Revisión activa del ítem si la hay: a lo sumo una revisión por ítem
    /// puede estar en `InReview` o `Approved` (regla de revisión única).
    fn active_revision(&self, content_id: &Uuid) -> Result<Option<Revision>>;

    /// Única vía de mutación de una revisión: actualiza estado y campos de
    /// decisión exactamente una vez por transición. El payload no cambia.
    fn update_revision_status(&self,
                              id: &Uuid,
                              new_status: RevisionStatus,
                              decided_by: Option<Uuid>,
                              review_notes: Option<String>)
                              -> Result<Revision>;

    /// Ítems no borrados cuya publicación programada ya venció.
    fn due_for_publish(&self, now: DateTime<Utc>) -> Result<Vec<ContentItem>>;
}
