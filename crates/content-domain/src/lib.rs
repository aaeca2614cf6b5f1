mod content_item;
mod errors;
mod event;
mod preview_token;
mod revision;
mod role;

pub use content_item::{ContentItem, ContentKind, ContentStatus};
pub use errors::DomainError;
pub use event::{Event, EventType};
pub use preview_token::PreviewToken;
pub use revision::{Revision, RevisionStatus};
pub use role::{Actor, PrivilegeClass, Role};
