// Archivo: stubs.rs
// Propósito: implementación en memoria del repositorio para pruebas y
// wiring rápido. No es durable; se usa en demos, tests y como referencia
// del contrato.
use crate::errors::{Result, WorkflowError};
use crate::repository::ContentRepository;
use chrono::{DateTime, Utc};
use content_domain::{ContentItem, ContentKind, Revision, RevisionStatus};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

// Minimal in-memory repository for wiring examples (not durable)
pub struct InMemoryContentRepository {
    /// Ítems indexados por id.
    items: Mutex<HashMap<Uuid, ContentItem>>,
    /// Revisiones indexadas por id.
    revisions: Mutex<HashMap<Uuid, Revision>>,
    /// Historial por ítem, en orden de inserción (creación).
    by_content: Mutex<HashMap<Uuid, Vec<Uuid>>>,
}

impl InMemoryContentRepository {
    /// Crea una nueva instancia del repositorio en memoria.
    pub fn new() -> Self {
        Self { items: Mutex::new(HashMap::new()),
               revisions: Mutex::new(HashMap::new()),
               by_content: Mutex::new(HashMap::new()) }
    }

    /// Helper para mapear `Mutex::lock()` en un `Result` con
    /// `WorkflowError::Storage`.
    fn lock<'a, T>(&'a self, m: &'a Mutex<T>) -> std::result::Result<MutexGuard<'a, T>, WorkflowError> {
        m.lock().map_err(|e| WorkflowError::Storage(format!("mutex poisoned: {:?}", e)))
    }
}

impl Default for InMemoryContentRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentRepository for InMemoryContentRepository {
    fn create_item(&self, item: &ContentItem) -> Result<()> {
        self.lock(&self.items)?.insert(item.id, item.clone());
        Ok(())
    }

    /// Obtiene un ítem por id. Retorna `NotFound` si no existe.
    fn get_item(&self, id: &Uuid) -> Result<ContentItem> {
        let items = self.lock(&self.items)?;
        items.get(id)
             .cloned()
             .ok_or(WorkflowError::NotFound(format!("ítem {}", id)))
    }

    /// Reescribe los campos mutables del ítem. `NotFound` si no existe.
    fn update_item(&self, item: &ContentItem) -> Result<()> {
        let mut items = self.lock(&self.items)?;
        if !items.contains_key(&item.id) {
            return Err(WorkflowError::NotFound(format!("ítem {}", item.id)));
        }
        items.insert(item.id, item.clone());
        Ok(())
    }

    fn list_items(&self, kind: Option<ContentKind>) -> Result<Vec<ContentItem>> {
        let items = self.lock(&self.items)?;
        let mut out: Vec<ContentItem> = items.values()
                                             .filter(|i| kind.map(|k| i.kind == k).unwrap_or(true))
                                             .cloned()
                                             .collect();
        out.sort_by_key(|i| i.created_at);
        Ok(out)
    }

    /// Crea y encadena una revisión nueva, siempre en `Draft`.
    fn create_revision(&self,
                       content_id: &Uuid,
                       author_id: Uuid,
                       payload: serde_json::Value,
                       base_revision_id: Option<Uuid>)
                       -> Result<Revision> {
        let kind = self.get_item(content_id)?.kind;
        let rev = Revision::new(kind, *content_id, author_id, payload, base_revision_id)?;
        self.lock(&self.revisions)?.insert(rev.id, rev.clone());
        self.lock(&self.by_content)?.entry(*content_id).or_default().push(rev.id);
        Ok(rev)
    }

    fn get_revision(&self, id: &Uuid) -> Result<Revision> {
        let revisions = self.lock(&self.revisions)?;
        revisions.get(id)
                 .cloned()
                 .ok_or(WorkflowError::NotFound(format!("revisión {}", id)))
    }

    /// Historial del ítem, la revisión más reciente primero. El orden se
    /// deriva del encadenado de inserción, no de timestamps.
    fn history(&self, content_id: &Uuid) -> Result<Vec<Revision>> {
        let by_content = self.lock(&self.by_content)?;
        let revisions = self.lock(&self.revisions)?;
        let ids = by_content.get(content_id).cloned().unwrap_or_default();
        Ok(ids.iter()
              .rev()
              .filter_map(|id| revisions.get(id).cloned())
              .collect())
    }

    fn active_revision(&self, content_id: &Uuid) -> Result<Option<Revision>> {
        Ok(self.history(content_id)?
               .into_iter()
               .find(|r| r.status.is_active()))
    }

    /// Única vía de mutación de una revisión: estado + campos de decisión.
    /// El payload y el resto de campos quedan intactos.
    fn update_revision_status(&self,
                              id: &Uuid,
                              new_status: RevisionStatus,
                              decided_by: Option<Uuid>,
                              review_notes: Option<String>)
                              -> Result<Revision> {
        let mut revisions = self.lock(&self.revisions)?;
        let rev = revisions.get_mut(id)
                           .ok_or(WorkflowError::NotFound(format!("revisión {}", id)))?;
        rev.status = new_status;
        if decided_by.is_some() {
            rev.decided_by = decided_by;
            rev.decided_at = Some(Utc::now());
        }
        if review_notes.is_some() {
            rev.review_notes = review_notes;
        }
        Ok(rev.clone())
    }

    fn due_for_publish(&self, now: DateTime<Utc>) -> Result<Vec<ContentItem>> {
        let items = self.lock(&self.items)?;
        let mut due: Vec<ContentItem> = items.values()
                                             .filter(|i| !i.is_deleted())
                                             .filter(|i| i.scheduled_publish_at.map(|at| at <= now).unwrap_or(false))
                                             .cloned()
                                             .collect();
        due.sort_by_key(|i| i.scheduled_publish_at);
        Ok(due)
    }
}
