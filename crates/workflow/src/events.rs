// Archivo: events.rs
// Propósito: bus de eventos de mutación (create/update/delete) hacia los
// suscriptores interesados (UIs de edición, dashboards). Entrega
// fire-and-forget: un suscriptor lento o muerto nunca hace fallar la
// transición que originó el evento.
use content_domain::Event;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Difusor de eventos sobre un canal `broadcast` de tokio.
///
/// Garantías: entrega al-menos-una-vez a cada suscriptor vivo; el orden se
/// conserva por `entity_id` porque la emisión se serializa tras el mutex
/// por ítem del motor. No hay durabilidad: quien se suscribe tarde no ve
/// eventos anteriores.
pub struct EventBroadcaster {
    tx: broadcast::Sender<Event>,
}

impl EventBroadcaster {
    /// Crea el difusor con la capacidad de buffer dada por suscriptor.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publica un evento a todos los suscriptores vivos. Nunca bloquea ni
    /// falla hacia el llamador; sin suscriptores el evento se descarta.
    pub fn publish(&self, event: Event) {
        if let Err(e) = self.tx.send(event) {
            log::debug!("evento descartado sin suscriptores: {}", e.0.entity);
        }
    }

    /// Se suscribe al flujo de eventos, filtrado opcionalmente por entidad
    /// y/o id de entidad.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        Subscription { rx: self.tx.subscribe(), filter }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Filtro de suscripción. Campos en `None` no filtran.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub entity: Option<String>,
    pub entity_id: Option<Uuid>,
}

impl EventFilter {
    fn matches(&self, event: &Event) -> bool {
        if let Some(entity) = &self.entity {
            if &event.entity != entity {
                return false;
            }
        }
        if let Some(id) = &self.entity_id {
            if &event.entity_id != id {
                return false;
            }
        }
        true
    }
}

/// Flujo de eventos de un suscriptor. `next` salta los eventos que no
/// pasan el filtro y sobrevive a un `Lagged` (se pierden los eventos más
/// antiguos del buffer, pero el flujo continúa).
pub struct Subscription {
    rx: broadcast::Receiver<Event>,
    filter: EventFilter,
}

impl Subscription {
    /// Siguiente evento que pasa el filtro; `None` cuando el difusor se
    /// ha cerrado.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("suscriptor atrasado: {} eventos perdidos", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Variante no bloqueante: `None` si no hay eventos pendientes que
    /// pasen el filtro.
    pub fn try_next(&mut self) -> Option<Event> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    log::warn!("suscriptor atrasado: {} eventos perdidos", skipped);
                    continue;
                }
                Err(_) => return None,
            }
        }
    }
}
