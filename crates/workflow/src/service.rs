// Archivo: service.rs
// Propósito: fachada `ContentService` que cablea motor, caché, eventos y
// previews sobre un repositorio concreto, y ofrece la superficie que
// consumen los handlers HTTP y el scheduler.
use crate::cache::ViewCache;
use crate::engine::{WorkflowEngine, WorkflowEngineConfig};
use crate::errors::{Result, WorkflowError};
use crate::events::{EventBroadcaster, EventFilter, Subscription};
use crate::preview::{PreviewDiff, PreviewService};
use crate::repository::ContentRepository;
use chrono::{DateTime, Utc};
use content_domain::{Actor, ContentItem, ContentKind, PreviewToken, PrivilegeClass, Revision};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Servicio de contenido: punto de entrada único de la aplicación.
///
/// Construye los colaboradores compartidos (caché, difusor de eventos,
/// servicio de previews) a partir de la configuración y delega las
/// transiciones en el motor. Las lecturas de vista pasan por el caché
/// (read-through).
pub struct ContentService<R>
    where R: ContentRepository
{
    repo: Arc<R>,
    engine: WorkflowEngine<R>,
    cache: Arc<ViewCache>,
    events: Arc<EventBroadcaster>,
    previews: Arc<PreviewService<R>>,
}

impl<R> ContentService<R> where R: ContentRepository
{
    pub fn new(repo: Arc<R>, config: WorkflowEngineConfig) -> Self {
        let cache = Arc::new(ViewCache::new(config.cache_ttl));
        let events = Arc::new(EventBroadcaster::new(config.event_capacity));
        let previews = Arc::new(PreviewService::new(repo.clone(), config.preview_ttl));
        let engine = WorkflowEngine::new(repo.clone(),
                                         cache.clone(),
                                         events.clone(),
                                         previews.clone(),
                                         config);
        Self { repo,
               engine,
               cache,
               events,
               previews }
    }

    // ----- transiciones de workflow (delegadas al motor) -----

    pub async fn create_draft(&self,
                              kind: ContentKind,
                              actor: &Actor,
                              payload: serde_json::Value,
                              base_revision_id: Option<Uuid>)
                              -> Result<(ContentItem, Revision)> {
        self.engine.create_draft(kind, actor, payload, base_revision_id).await
    }

    pub async fn submit_for_review(&self, content_id: Uuid, revision_id: Uuid, actor: &Actor) -> Result<Revision> {
        self.engine.submit_for_review(content_id, revision_id, actor).await
    }

    pub async fn approve(&self, content_id: Uuid, revision_id: Uuid, actor: &Actor) -> Result<Revision> {
        self.engine.approve(content_id, revision_id, actor).await
    }

    pub async fn reject(&self, content_id: Uuid, revision_id: Uuid, actor: &Actor, review_notes: &str) -> Result<Revision> {
        self.engine.reject(content_id, revision_id, actor, review_notes).await
    }

    pub async fn publish(&self, content_id: Uuid, revision_id: Uuid, actor: &Actor) -> Result<ContentItem> {
        self.engine.publish(content_id, revision_id, actor).await
    }

    pub async fn publish_direct(&self, content_id: Uuid, revision_id: Uuid, actor: &Actor) -> Result<ContentItem> {
        self.engine.publish_direct(content_id, revision_id, actor).await
    }

    pub async fn rollback(&self, content_id: Uuid, target_revision_id: Uuid, actor: &Actor) -> Result<Revision> {
        self.engine.rollback(content_id, target_revision_id, actor).await
    }

    pub async fn schedule_publish(&self, content_id: Uuid, revision_id: Uuid, at: DateTime<Utc>, actor: &Actor) -> Result<ContentItem> {
        self.engine.schedule_publish(content_id, revision_id, at, actor).await
    }

    pub async fn unschedule_publish(&self, content_id: Uuid, actor: &Actor) -> Result<ContentItem> {
        self.engine.unschedule_publish(content_id, actor).await
    }

    pub async fn publish_due(&self, now: DateTime<Utc>) -> Result<Vec<ContentItem>> {
        self.engine.publish_due(now).await
    }

    pub async fn delete_item(&self, content_id: Uuid, actor: &Actor) -> Result<ContentItem> {
        self.engine.delete_item(content_id, actor).await
    }

    pub fn generate_preview(&self, revision_id: Uuid, actor: &Actor) -> Result<PreviewToken> {
        self.engine.generate_preview(revision_id, actor)
    }

    /// Resuelve un token de preview en el diff de campos pendientes.
    /// No requiere actor: el token es la credencial.
    pub fn resolve_preview(&self, token: &str) -> Result<PreviewDiff> {
        self.previews.resolve(token)
    }

    // ----- lecturas -----

    pub fn get_item(&self, content_id: &Uuid) -> Result<ContentItem> {
        self.repo.get_item(content_id)
    }

    pub fn list_items(&self, kind: Option<ContentKind>) -> Result<Vec<ContentItem>> {
        self.repo.list_items(kind)
    }

    pub fn history(&self, content_id: &Uuid) -> Result<Vec<Revision>> {
        self.repo.history(content_id)
    }

    /// Vista calculada de un ítem para la clase de privilegio dada, con
    /// caché read-through.
    ///
    /// - `Anonymous`/`Member` sólo ven ítems publicados y no borrados (lo
    ///   demás es `NotFound`), con el payload de la revisión publicada.
    /// - `Staff` ve cualquier ítem no borrado, con los campos de workflow
    ///   y el payload de la revisión vigente.
    pub fn get_view(&self,
                    kind: ContentKind,
                    content_id: Uuid,
                    class: PrivilegeClass,
                    query: &serde_json::Value)
                    -> Result<serde_json::Value> {
        let key = ViewCache::key(kind, &content_id, class, query);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let view = self.render_view(kind, &content_id, class)?;
        self.cache.set(key, view.clone(), None);
        Ok(view)
    }

    fn render_view(&self, kind: ContentKind, content_id: &Uuid, class: PrivilegeClass) -> Result<serde_json::Value> {
        let item = self.repo.get_item(content_id)?;
        if item.kind != kind || item.is_deleted() {
            return Err(WorkflowError::NotFound(format!("ítem {}", content_id)));
        }

        match class {
            PrivilegeClass::Anonymous | PrivilegeClass::Member => {
                // El público lee la revisión publicada vigente; una sucesora
                // en revisión no oculta el contenido en vivo.
                let published = match item.published_revision_id {
                    Some(rev_id) => rev_id,
                    None => return Err(WorkflowError::NotFound(format!("ítem {}", content_id))),
                };
                let payload = self.repo.get_revision(&published)?.payload;
                Ok(json!({
                    "id": item.id,
                    "kind": item.kind,
                    "published_at": item.published_at,
                    "payload": payload,
                }))
            }
            PrivilegeClass::Staff => {
                let payload = match item.current_revision_id {
                    Some(rev_id) => self.repo.get_revision(&rev_id)?.payload,
                    None => json!({}),
                };
                Ok(json!({
                    "id": item.id,
                    "kind": item.kind,
                    "status": item.status,
                    "current_revision_id": item.current_revision_id,
                    "published_revision_id": item.published_revision_id,
                    "scheduled_publish_at": item.scheduled_publish_at,
                    "published_at": item.published_at,
                    "creator_id": item.creator_id,
                    "updated_at": item.updated_at,
                    "payload": payload,
                }))
            }
        }
    }

    // ----- suscripciones y colaboradores -----

    /// Suscripción al flujo de eventos de mutación.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.events.subscribe(filter)
    }

    pub fn cache(&self) -> &ViewCache {
        &self.cache
    }

    pub fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    pub fn previews(&self) -> &PreviewService<R> {
        &self.previews
    }
}
