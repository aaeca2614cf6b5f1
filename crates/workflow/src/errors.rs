// Archivo: errors.rs
// Propósito: definir los errores del motor de workflow y el alias Result<T>
// usado por las APIs del crate.
use content_domain::DomainError;
use thiserror::Error;

/// Errores comunes del motor de workflow editorial.
///
/// - `Forbidden`: el rol del actor no cubre el mínimo de la acción.
/// - `NotFound`: ítem, revisión o token desconocidos (o expirados).
/// - `InvalidTransition`: la acción no es válida para el estado actual.
/// - `Validation`: falta un campo obligatorio (p.ej. rechazo sin notas).
/// - `Conflict`: otra revisión activa para el ítem, o contención del lock.
/// - `Storage`: fallo de almacenamiento; la acción mutante se considera
///   fallida y no se aplica parcialmente.
#[derive(Error, Debug)]
pub enum WorkflowError {
  /// Rol insuficiente. Se expone como prohibido, nunca se reintenta.
  #[error("Prohibido: {0}")]
  Forbidden(String),
  /// Entidad no encontrada. Para tokens de preview la señal es uniforme:
  /// desconocido y expirado son indistinguibles.
  #[error("No encontrado: {0}")]
  NotFound(String),
  /// Acción inválida para el estado actual de la revisión.
  #[error("Transición inválida: {0}")]
  InvalidTransition(String),
  /// Entrada incompleta o malformada, corregible por el usuario.
  #[error("Error de validación: {0}")]
  Validation(String),
  /// Conflicto de concurrencia; el llamador puede reintentar con backoff.
  #[error("Conflicto: {0}")]
  Conflict(String),
  /// Error genérico de almacenamiento.
  #[error("Error de almacenamiento: {0}")]
  Storage(String),
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, WorkflowError>;

impl From<DomainError> for WorkflowError {
  fn from(e: DomainError) -> Self {
    match e {
      DomainError::ValidationError(msg) => Self::Validation(msg),
      DomainError::SerializationError(msg) => Self::Storage(msg),
    }
  }
}
