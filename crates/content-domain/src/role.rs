// role.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Jerarquía de roles editoriales. El orden de declaración define la
/// comparación: un rol autoriza cualquier acción cuyo mínimo sea menor o
/// igual (`allows`). No hay grafo de permisos dinámico.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Viewer,
  Editor,
  Reviewer,
  Publisher,
  Admin,
}

impl Role {
  /// Comparación única de autorización: `actor.role.allows(minimo)`.
  pub fn allows(&self, required: Role) -> bool {
    *self >= required
  }

  /// Proyección del rol a la clase de privilegio usada en claves de caché.
  /// Las vistas calculadas sólo distinguen estas tres clases.
  pub fn privilege_class(&self) -> PrivilegeClass {
    match self {
      Role::Viewer => PrivilegeClass::Member,
      _ => PrivilegeClass::Staff,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Viewer => "viewer",
      Role::Editor => "editor",
      Role::Reviewer => "reviewer",
      Role::Publisher => "publisher",
      Role::Admin => "admin",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for Role {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "viewer" => Ok(Self::Viewer),
      "editor" => Ok(Self::Editor),
      "reviewer" => Ok(Self::Reviewer),
      "publisher" => Ok(Self::Publisher),
      "admin" => Ok(Self::Admin),
      _ => Err(format!("rol inválido: {}", s)),
    }
  }
}

/// Clase de visibilidad de una vista calculada. Las entradas de caché de un
/// mismo ítem se invalidan juntas para las tres clases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeClass {
  Anonymous,
  Member,
  Staff,
}

impl PrivilegeClass {
  pub fn as_str(&self) -> &'static str {
    match self {
      PrivilegeClass::Anonymous => "anonymous",
      PrivilegeClass::Member => "member",
      PrivilegeClass::Staff => "staff",
    }
  }
}

impl fmt::Display for PrivilegeClass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Usuario ya autenticado por la capa de peticiones. El motor sólo necesita
/// su id y su rol resuelto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub id: Uuid,
  pub role: Role,
}

impl Actor {
  pub fn new(id: Uuid, role: Role) -> Self {
    Self { id, role }
  }
}
