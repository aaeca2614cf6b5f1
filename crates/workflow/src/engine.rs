// Archivo: engine.rs
// Propósito: implementar el `WorkflowEngine`, el orquestador de la máquina
// de estados editorial. Cada transición adquiere el mutex por ítem, valida
// rol y estado, escribe en el repositorio, invalida caché y encola el
// evento antes de soltar el lock.
use crate::cache::ViewCache;
use crate::errors::{Result, WorkflowError};
use crate::events::EventBroadcaster;
use crate::preview::PreviewService;
use crate::repository::ContentRepository;
use chrono::{DateTime, Utc};
use content_domain::{Actor, ContentItem, ContentKind, Event, EventType, PreviewToken, Revision,
                     RevisionStatus, Role};
use dashmap::DashMap;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Configuración del motor.
///
/// - `lock_timeout`: espera máxima por el mutex de un ítem; al vencer se
///   responde `Conflict` en lugar de bloquear indefinidamente.
/// - `preview_ttl`: vida fija de los tokens de preview.
/// - `cache_ttl`: expiración de seguridad de las entradas de caché.
/// - `event_capacity`: buffer del canal broadcast por suscriptor.
/// - `allow_direct_publish`: habilita la acción explícita
///   `publish_direct` (PUBLISHER publica un borrador sin revisión previa).
///   Nunca es un fallback implícito de `publish`.
#[derive(Debug, Clone)]
pub struct WorkflowEngineConfig {
    pub lock_timeout: Duration,
    pub preview_ttl: chrono::Duration,
    pub cache_ttl: chrono::Duration,
    pub event_capacity: usize,
    pub allow_direct_publish: bool,
}

impl Default for WorkflowEngineConfig {
    fn default() -> Self {
        Self { lock_timeout: Duration::from_secs(5),
               preview_ttl: chrono::Duration::hours(24),
               cache_ttl: chrono::Duration::minutes(10),
               event_capacity: 256,
               allow_direct_publish: false }
    }
}

/// Motor de workflow editorial.
///
/// Responsabilidades principales:
/// - Hacer cumplir la máquina de estados por revisión y las puertas de rol
/// - Garantizar la regla de revisión activa única por ítem
/// - Secuenciar escritura -> invalidación de caché -> emisión de evento
///   bajo el mutex del ítem
///
/// Nota sobre errores y concurrencia:
/// - Si la escritura en el repositorio falla, no se invalida caché ni se
///   emite evento: la acción se reporta fallida sin aplicación parcial.
/// - Las transiciones de ítems distintos proceden en paralelo; las del
///   mismo ítem se serializan en orden de adquisición del lock.
pub struct WorkflowEngine<R>
    where R: ContentRepository
{
    repo: Arc<R>,
    cache: Arc<ViewCache>,
    events: Arc<EventBroadcaster>,
    previews: Arc<PreviewService<R>>,
    /// Mapa de mutex por ítem, poblado bajo demanda.
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
    config: WorkflowEngineConfig,
}

impl<R> WorkflowEngine<R> where R: ContentRepository
{
    pub fn new(repo: Arc<R>,
               cache: Arc<ViewCache>,
               events: Arc<EventBroadcaster>,
               previews: Arc<PreviewService<R>>,
               config: WorkflowEngineConfig)
               -> Self {
        Self { repo,
               cache,
               events,
               previews,
               locks: DashMap::new(),
               config }
    }

    /// Primer guardado de un editor: crea el ítem y su revisión inicial, o
    /// encadena un borrador nuevo sobre `base_revision_id` en un ítem
    /// existente. Rol mínimo: EDITOR.
    pub async fn create_draft(&self,
                              kind: ContentKind,
                              actor: &Actor,
                              payload: serde_json::Value,
                              base_revision_id: Option<Uuid>)
                              -> Result<(ContentItem, Revision)> {
        require_role(actor, Role::Editor, "crear borrador")?;

        match base_revision_id {
            None => {
                let item = ContentItem::new(kind, actor.id);
                self.repo.create_item(&item)?;
                let _guard = self.lock_item(item.id).await?;
                let rev = self.repo.create_revision(&item.id, actor.id, payload, None)?;
                let mut item = item;
                item.current_revision_id = Some(rev.id);
                item.mirror_status(rev.status);
                self.repo.update_item(&item)?;
                self.cache.invalidate(item.kind, &item.id);
                self.emit(EventType::Create, &item, actor.id, json!({ "action": "create_draft", "revision": rev.id }));
                Ok((item, rev))
            }
            Some(base_id) => {
                let base = self.repo.get_revision(&base_id)?;
                if base.kind != kind {
                    return Err(WorkflowError::Validation(format!("la revisión base {} no es de tipo {}", base_id, kind)));
                }
                let _guard = self.lock_item(base.content_id).await?;
                let item = self.existing_item(&base.content_id)?;
                let rev = self.repo.create_revision(&item.id, actor.id, payload, Some(base_id))?;
                self.cache.invalidate(item.kind, &item.id);
                self.emit(EventType::Update, &item, actor.id, json!({ "action": "create_draft", "revision": rev.id, "base": base_id }));
                Ok((item, rev))
            }
        }
    }

    /// Envía un borrador a revisión. Falla con `Conflict` si el ítem ya
    /// tiene otra revisión activa (InReview o Approved). Rol: EDITOR.
    pub async fn submit_for_review(&self, content_id: Uuid, revision_id: Uuid, actor: &Actor) -> Result<Revision> {
        require_role(actor, Role::Editor, "enviar a revisión")?;
        let _guard = self.lock_item(content_id).await?;

        let mut item = self.existing_item(&content_id)?;
        let rev = self.owned_revision(&content_id, &revision_id)?;
        if rev.status != RevisionStatus::Draft {
            return Err(WorkflowError::InvalidTransition(format!("la revisión {} está en {}, no en draft", revision_id, rev.status)));
        }
        if let Some(active) = self.repo.active_revision(&content_id)? {
            return Err(WorkflowError::Conflict(format!("la revisión {} ya está activa ({}) para el ítem {}",
                                                       active.id, active.status, content_id)));
        }

        let rev = self.repo.update_revision_status(&revision_id, RevisionStatus::InReview, None, None)?;
        item.current_revision_id = Some(rev.id);
        item.mirror_status(rev.status);
        self.repo.update_item(&item)?;
        self.cache.invalidate(item.kind, &item.id);
        self.emit(EventType::Update, &item, actor.id, json!({ "action": "submit_review", "revision": rev.id }));
        Ok(rev)
    }

    /// Aprueba una revisión en revisión. Fija `decided_by`/`decided_at`.
    /// Rol: REVIEWER.
    pub async fn approve(&self, content_id: Uuid, revision_id: Uuid, actor: &Actor) -> Result<Revision> {
        require_role(actor, Role::Reviewer, "aprobar")?;
        let _guard = self.lock_item(content_id).await?;

        let mut item = self.existing_item(&content_id)?;
        let rev = self.owned_revision(&content_id, &revision_id)?;
        if rev.status != RevisionStatus::InReview {
            return Err(WorkflowError::InvalidTransition(format!("sólo se aprueba desde in_review; la revisión {} está en {}",
                                                                revision_id, rev.status)));
        }

        let rev = self.repo.update_revision_status(&revision_id, RevisionStatus::Approved, Some(actor.id), None)?;
        item.mirror_status(rev.status);
        self.repo.update_item(&item)?;
        self.cache.invalidate(item.kind, &item.id);
        self.emit(EventType::Update, &item, actor.id, json!({ "action": "approve", "revision": rev.id }));
        Ok(rev)
    }

    /// Rechaza una revisión en revisión. Las notas son obligatorias y se
    /// validan antes de tocar estado alguno. Terminal para esa revisión:
    /// continuar exige un borrador nuevo basado en ella. Rol: REVIEWER.
    pub async fn reject(&self, content_id: Uuid, revision_id: Uuid, actor: &Actor, review_notes: &str) -> Result<Revision> {
        require_role(actor, Role::Reviewer, "rechazar")?;
        if review_notes.trim().is_empty() {
            return Err(WorkflowError::Validation("el rechazo requiere notas de revisión".to_string()));
        }
        let _guard = self.lock_item(content_id).await?;

        let mut item = self.existing_item(&content_id)?;
        let rev = self.owned_revision(&content_id, &revision_id)?;
        if rev.status != RevisionStatus::InReview {
            return Err(WorkflowError::InvalidTransition(format!("sólo se rechaza desde in_review; la revisión {} está en {}",
                                                                revision_id, rev.status)));
        }

        let rev = self.repo.update_revision_status(&revision_id,
                                                   RevisionStatus::Rejected,
                                                   Some(actor.id),
                                                   Some(review_notes.trim().to_string()))?;
        // El ítem vuelve a ser editable: Rejected se refleja como Draft.
        item.mirror_status(rev.status);
        self.repo.update_item(&item)?;
        self.cache.invalidate(item.kind, &item.id);
        self.emit(EventType::Update, &item, actor.id, json!({ "action": "reject", "revision": rev.id, "notes": rev.review_notes }));
        Ok(rev)
    }

    /// Publica una revisión aprobada. Fija `published_at`, limpia la
    /// programación y mueve `current_revision_id`. Rol: PUBLISHER.
    pub async fn publish(&self, content_id: Uuid, revision_id: Uuid, actor: &Actor) -> Result<ContentItem> {
        require_role(actor, Role::Publisher, "publicar")?;
        let _guard = self.lock_item(content_id).await?;

        let rev = self.owned_revision(&content_id, &revision_id)?;
        if rev.status != RevisionStatus::Approved {
            return Err(WorkflowError::InvalidTransition(format!("sólo se publica una revisión aprobada; {} está en {}",
                                                                revision_id, rev.status)));
        }
        self.publish_locked(content_id, revision_id, Some(actor.id), Some(actor.id), json!({ "action": "publish" }))
    }

    /// Publicación directa sin aprobación previa: acción explícita, sólo
    /// disponible con `allow_direct_publish` y rol PUBLISHER. Acepta
    /// revisiones en `Draft` o `Approved`.
    pub async fn publish_direct(&self, content_id: Uuid, revision_id: Uuid, actor: &Actor) -> Result<ContentItem> {
        require_role(actor, Role::Publisher, "publicar directo")?;
        if !self.config.allow_direct_publish {
            return Err(WorkflowError::InvalidTransition("la publicación directa está deshabilitada por política".to_string()));
        }
        let _guard = self.lock_item(content_id).await?;

        let rev = self.owned_revision(&content_id, &revision_id)?;
        if !matches!(rev.status, RevisionStatus::Draft | RevisionStatus::Approved) {
            return Err(WorkflowError::InvalidTransition(format!("publicación directa sólo desde draft o approved; {} está en {}",
                                                                revision_id, rev.status)));
        }
        self.publish_locked(content_id, revision_id, Some(actor.id), Some(actor.id), json!({ "action": "publish", "direct": true }))
    }

    /// Restaura estado conocido-bueno: crea una revisión **nueva** con el
    /// payload de una revisión publicada anterior, que entra directamente
    /// en `Published`. No borra nada del historial. Rol: PUBLISHER.
    pub async fn rollback(&self, content_id: Uuid, target_revision_id: Uuid, actor: &Actor) -> Result<Revision> {
        require_role(actor, Role::Publisher, "rollback")?;
        let _guard = self.lock_item(content_id).await?;

        let mut item = self.existing_item(&content_id)?;
        let target = self.owned_revision(&content_id, &target_revision_id)?;
        if target.status != RevisionStatus::Published {
            return Err(WorkflowError::InvalidTransition(format!("sólo se puede revertir a una revisión publicada; {} está en {}",
                                                                target_revision_id, target.status)));
        }

        let fresh = self.repo.create_revision(&content_id, actor.id, target.payload.clone(), Some(target.id))?;
        let fresh = self.repo.update_revision_status(&fresh.id, RevisionStatus::Published, Some(actor.id), None)?;

        item.current_revision_id = Some(fresh.id);
        item.published_revision_id = Some(fresh.id);
        item.published_at = Some(Utc::now());
        item.scheduled_publish_at = None;
        item.mirror_status(fresh.status);
        self.repo.update_item(&item)?;
        self.cache.invalidate(item.kind, &item.id);
        self.emit(EventType::Update,
                  &item,
                  actor.id,
                  json!({ "action": "rollback", "revision": fresh.id, "rolled_back_to": target.id }));
        Ok(fresh)
    }

    /// Programa la publicación de una revisión aprobada. Rol: PUBLISHER.
    pub async fn schedule_publish(&self, content_id: Uuid, revision_id: Uuid, at: DateTime<Utc>, actor: &Actor) -> Result<ContentItem> {
        require_role(actor, Role::Publisher, "programar publicación")?;
        if at <= Utc::now() {
            return Err(WorkflowError::Validation("la fecha programada debe estar en el futuro".to_string()));
        }
        let _guard = self.lock_item(content_id).await?;

        let mut item = self.existing_item(&content_id)?;
        let rev = self.owned_revision(&content_id, &revision_id)?;
        if rev.status != RevisionStatus::Approved {
            return Err(WorkflowError::InvalidTransition(format!("sólo se programa una revisión aprobada; {} está en {}",
                                                                revision_id, rev.status)));
        }

        item.scheduled_publish_at = Some(at);
        item.updated_at = Utc::now();
        self.repo.update_item(&item)?;
        self.cache.invalidate(item.kind, &item.id);
        self.emit(EventType::Update, &item, actor.id, json!({ "action": "schedule_publish", "at": at }));
        Ok(item)
    }

    /// Cancela una publicación programada. Rol: PUBLISHER.
    pub async fn unschedule_publish(&self, content_id: Uuid, actor: &Actor) -> Result<ContentItem> {
        require_role(actor, Role::Publisher, "cancelar programación")?;
        let _guard = self.lock_item(content_id).await?;

        let mut item = self.existing_item(&content_id)?;
        item.scheduled_publish_at = None;
        item.updated_at = Utc::now();
        self.repo.update_item(&item)?;
        self.cache.invalidate(item.kind, &item.id);
        self.emit(EventType::Update, &item, actor.id, json!({ "action": "unschedule_publish" }));
        Ok(item)
    }

    /// Punto de entrada del scheduler: publica cada ítem cuya programación
    /// ya venció y cuya revisión vigente sigue aprobada. Una programación
    /// huérfana (la revisión dejó de estar aprobada) se limpia y se omite.
    pub async fn publish_due(&self, now: DateTime<Utc>) -> Result<Vec<ContentItem>> {
        let mut published = Vec::new();
        for due in self.repo.due_for_publish(now)? {
            let _guard = self.lock_item(due.id).await?;
            // Revalidar bajo el lock: el estado pudo cambiar desde el scan.
            // Un ítem que desapareció se omite; cualquier otro error corta
            // el barrido.
            let mut item = match self.existing_item(&due.id) {
                Ok(i) => i,
                Err(WorkflowError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };
            if item.scheduled_publish_at.map(|at| at > now).unwrap_or(true) {
                continue;
            }
            let current = match item.current_revision_id {
                Some(id) => self.repo.get_revision(&id)?,
                None => continue,
            };
            if current.status != RevisionStatus::Approved {
                log::warn!("programación huérfana en el ítem {}: la revisión {} está en {}",
                           item.id, current.id, current.status);
                item.scheduled_publish_at = None;
                self.repo.update_item(&item)?;
                continue;
            }
            let item = self.publish_locked(item.id, current.id, None, Some(item.creator_id), json!({ "action": "publish", "scheduled": true }))?;
            published.push(item);
        }
        Ok(published)
    }

    /// Borrado lógico: el ítem deja de ser visible pero su historial de
    /// revisiones se conserva para auditoría. Rol: PUBLISHER.
    pub async fn delete_item(&self, content_id: Uuid, actor: &Actor) -> Result<ContentItem> {
        require_role(actor, Role::Publisher, "eliminar")?;
        let _guard = self.lock_item(content_id).await?;

        let mut item = self.existing_item(&content_id)?;
        item.deleted_at = Some(Utc::now());
        item.updated_at = Utc::now();
        self.repo.update_item(&item)?;
        self.cache.invalidate(item.kind, &item.id);
        self.emit(EventType::Delete, &item, actor.id, json!({ "action": "delete" }));
        Ok(item)
    }

    /// Emite un token de preview ligado a la revisión dada (posiblemente
    /// no publicada). No adquiere el lock del ítem. Rol: EDITOR.
    pub fn generate_preview(&self, revision_id: Uuid, actor: &Actor) -> Result<PreviewToken> {
        require_role(actor, Role::Editor, "generar preview")?;
        self.previews.issue(&revision_id)
    }

    /// Adquiere el mutex del ítem con espera acotada; el timeout se
    /// expone como `Conflict` para que el llamador reintente con backoff.
    async fn lock_item(&self, content_id: Uuid) -> Result<OwnedMutexGuard<()>> {
        let mutex = self.locks
                        .entry(content_id)
                        .or_insert_with(|| Arc::new(Mutex::new(())))
                        .value()
                        .clone();
        tokio::time::timeout(self.config.lock_timeout, mutex.lock_owned())
            .await
            .map_err(|_| WorkflowError::Conflict(format!("el ítem {} está ocupado por otra transición", content_id)))
    }

    /// Secuencia común de publicación, ya bajo el lock del ítem y con la
    /// transición validada: escritura, espejo de estado, invalidación y
    /// evento.
    fn publish_locked(&self,
                      content_id: Uuid,
                      revision_id: Uuid,
                      decided_by: Option<Uuid>,
                      event_user: Option<Uuid>,
                      data: serde_json::Value)
                      -> Result<ContentItem> {
        let mut item = self.existing_item(&content_id)?;
        let rev = self.repo.update_revision_status(&revision_id, RevisionStatus::Published, decided_by, None)?;

        item.current_revision_id = Some(rev.id);
        item.published_revision_id = Some(rev.id);
        item.published_at = Some(Utc::now());
        item.scheduled_publish_at = None;
        item.mirror_status(rev.status);
        self.repo.update_item(&item)?;

        self.cache.invalidate(item.kind, &item.id);
        let event = Event::new(EventType::Update, item.kind.as_str(), item.id, data, event_user);
        self.events.publish(event);
        log::debug!("ítem {} publicado con la revisión {}", item.id, rev.id);
        Ok(item)
    }

    /// Ítem existente y no borrado; un ítem borrado es `NotFound` hacia
    /// afuera.
    fn existing_item(&self, content_id: &Uuid) -> Result<ContentItem> {
        let item = self.repo.get_item(content_id)?;
        if item.is_deleted() {
            return Err(WorkflowError::NotFound(format!("ítem {}", content_id)));
        }
        Ok(item)
    }

    /// Revisión que pertenece al ítem indicado.
    fn owned_revision(&self, content_id: &Uuid, revision_id: &Uuid) -> Result<Revision> {
        let rev = self.repo.get_revision(revision_id)?;
        if &rev.content_id != content_id {
            return Err(WorkflowError::Validation(format!("la revisión {} no pertenece al ítem {}", revision_id, content_id)));
        }
        Ok(rev)
    }

    fn emit(&self, event_type: EventType, item: &ContentItem, user_id: Uuid, data: serde_json::Value) {
        self.events.publish(Event::new(event_type, item.kind.as_str(), item.id, data, Some(user_id)));
    }
}

/// Puerta de rol única: `actor.role >= required`.
fn require_role(actor: &Actor, required: Role, action: &str) -> Result<()> {
    if actor.role.allows(required) {
        Ok(())
    } else {
        Err(WorkflowError::Forbidden(format!("{} requiere rol {} o superior (actor: {})",
                                             action, required, actor.role)))
    }
}
