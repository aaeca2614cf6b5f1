//! Crate `workflow` — motor de workflow editorial con revisiones
//!
//! Este crate define el contrato de persistencia `ContentRepository`, una
//! implementación en memoria útil para pruebas (`InMemoryContentRepository`),
//! el motor de transiciones `WorkflowEngine` y la fachada `ContentService`
//! que cablea caché de vistas, difusor de eventos y tokens de preview.
//!
//! Diseño resumido:
//! - Revisiones append-only: el payload es inmutable tras la creación y la
//!   única mutación permitida es el estado de workflow con sus campos de
//!   decisión.
//! - Revisión activa única: a lo sumo una revisión por ítem en `InReview` o
//!   `Approved`; un segundo envío concurrente recibe `Conflict`.
//! - Mutex por ítem: cada transición serializa escritura, invalidación de
//!   caché y emisión de evento; ítems distintos proceden en paralelo.
//!
//! Ejemplo rápido:
//! ```rust
//! use workflow::stubs::InMemoryContentRepository;
//! use workflow::engine::WorkflowEngineConfig;
//! use workflow::service::ContentService;
//! use std::sync::Arc;
//! let repo = Arc::new(InMemoryContentRepository::new());
//! let service = ContentService::new(repo, WorkflowEngineConfig::default());
//! ```
pub mod cache;
pub mod engine;
pub mod errors;
pub mod events;
pub mod preview;
pub mod repository;
pub mod service;
pub mod stubs;

pub use cache::*;
pub use engine::*;
pub use errors::*;
pub use events::*;
pub use preview::*;
pub use repository::*;
pub use service::*;
pub use stubs::*;
