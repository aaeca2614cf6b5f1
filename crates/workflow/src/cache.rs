// Archivo: cache.rs
// Propósito: caché read-through de vistas calculadas, con invalidación por
// prefijo (tipo + id). El TTL es una red de seguridad secundaria; la
// consistencia primaria la aporta la invalidación explícita del motor.
use chrono::{DateTime, Duration, Utc};
use content_domain::{ContentKind, PrivilegeClass};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    expires_at: DateTime<Utc>,
}

/// Caché de vistas serializadas, indexada por clave opaca compuesta de
/// `(tipo, id, clase de privilegio, hash de la consulta)`.
///
/// Garantía: cuando `invalidate` retorna, cualquier `get` posterior para
/// ese id es un miss hasta que se repueble. No hay ventana en la que se
/// observe un valor anterior a la invalidación.
pub struct ViewCache {
    entries: DashMap<String, CacheEntry>,
    default_ttl: Duration,
}

impl ViewCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self { entries: DashMap::new(), default_ttl }
    }

    /// Construye la clave opaca de una vista. Todas las claves de un mismo
    /// ítem comparten el prefijo `tipo:id:`, lo que permite invalidar
    /// juntas las variantes de clase de privilegio y de consulta.
    pub fn key(kind: ContentKind, content_id: &Uuid, class: PrivilegeClass, query: &serde_json::Value) -> String {
        let digest = Sha256::digest(query.to_string().as_bytes());
        let mut shape = String::with_capacity(16);
        for b in digest.iter().take(8) {
            shape.push_str(&format!("{:02x}", b));
        }
        format!("{}:{}:{}:{}", kind.as_str(), content_id, class.as_str(), shape)
    }

    /// Lectura: `None` es un miss (ausente o expirado). Las entradas
    /// vencidas se retiran perezosamente al leerlas.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Utc::now() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    /// Puebla una entrada tras un miss. `ttl` en `None` usa el valor por
    /// defecto del caché.
    pub fn set(&self, key: String, value: serde_json::Value, ttl: Option<Duration>) {
        let entry = CacheEntry { value,
                                 expires_at: Utc::now() + ttl.unwrap_or(self.default_ttl) };
        self.entries.insert(key, entry);
    }

    /// Elimina todas las entradas del ítem, sin importar clase de
    /// privilegio ni forma de consulta. Retorna cuántas se retiraron; al
    /// retornar, la eliminación ya es visible para lecturas posteriores.
    pub fn invalidate(&self, kind: ContentKind, content_id: &Uuid) -> usize {
        let prefix = format!("{}:{}:", kind.as_str(), content_id);
        let before = self.entries.len();
        self.entries.retain(|k, _| !k.starts_with(&prefix));
        before.saturating_sub(self.entries.len())
    }

    /// Barrido de entradas vencidas (mantenimiento periódico).
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
