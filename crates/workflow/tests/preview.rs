use content_domain::{Actor, ContentKind, Role};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use workflow::engine::WorkflowEngineConfig;
use workflow::errors::WorkflowError;
use workflow::service::ContentService;
use workflow::stubs::InMemoryContentRepository;

fn actor(role: Role) -> Actor {
  Actor { id: Uuid::new_v4(), role }
}

fn service_with_ttl(ttl: chrono::Duration) -> ContentService<InMemoryContentRepository> {
  ContentService::new(Arc::new(InMemoryContentRepository::new()),
                      WorkflowEngineConfig { preview_ttl: ttl,
                                             ..WorkflowEngineConfig::default() })
}

async fn published_item(service: &ContentService<InMemoryContentRepository>,
                        payload: serde_json::Value,
                        editor: &Actor,
                        admin: &Actor)
                        -> (Uuid, Uuid) {
  let (item, rev) = service.create_draft(ContentKind::Course, editor, payload, None)
                           .await
                           .expect("create draft");
  service.submit_for_review(item.id, rev.id, editor).await.expect("submit");
  service.approve(item.id, rev.id, admin).await.expect("approve");
  service.publish(item.id, rev.id, admin).await.expect("publish");
  (item.id, rev.id)
}

#[tokio::test]
async fn preview_diff_shows_pending_changes_with_css_hints() {
  let service = service_with_ttl(chrono::Duration::hours(24));
  let editor = actor(Role::Editor);
  let admin = actor(Role::Admin);

  let published = json!({
    "title": "Landing",
    "theme": { "background_color": "#ffffff", "text_color": "#111111" },
    "blocks": 3
  });
  let (_, rev_id) = published_item(&service, published, &editor, &admin).await;

  // editor drafts new colors and a new field on top of the published page
  let pending = json!({
    "title": "Landing",
    "theme": { "background_color": "#0a0a23", "text_color": "#fafafa", "font_size": "18px" },
    "blocks": 3
  });
  let (_, draft) = service.create_draft(ContentKind::Course, &editor, pending, Some(rev_id))
                          .await
                          .expect("draft on top");

  let token = service.generate_preview(draft.id, &editor).expect("issue token");
  assert!(!token.token.is_empty());

  let diff = service.resolve_preview(&token.token).expect("resolve");

  // unchanged fields are absent
  assert!(diff.get("title").is_none());
  assert!(diff.get("blocks").is_none());

  let bg = diff.get("theme.background_color").expect("changed color");
  assert_eq!(bg.value, json!("#0a0a23"));
  assert_eq!(bg.value_type, "string");
  assert_eq!(bg.css_property.as_deref(), Some("background-color"));

  let fg = diff.get("theme.text_color").expect("changed color");
  assert_eq!(fg.css_property.as_deref(), Some("color"));

  // new field appears too, with its hint
  let size = diff.get("theme.font_size").expect("new field");
  assert_eq!(size.value, json!("18px"));
  assert_eq!(size.css_property.as_deref(), Some("font-size"));

  // order follows the pending payload
  let paths: Vec<_> = diff.keys().cloned().collect();
  assert_eq!(paths, vec!["theme.background_color", "theme.text_color", "theme.font_size"]);
}

#[tokio::test]
async fn preview_diffs_against_published_even_while_under_review() {
  let service = service_with_ttl(chrono::Duration::hours(24));
  let editor = actor(Role::Editor);
  let admin = actor(Role::Admin);

  let (item_id, rev_id) = published_item(&service, json!({"title": "same", "body": "old"}), &editor, &admin).await;

  // a follow-up draft goes under review, moving the current pointer
  let (_, draft) = service.create_draft(ContentKind::Course, &editor, json!({"title": "same", "body": "new"}), Some(rev_id))
                          .await
                          .expect("draft on top");
  service.submit_for_review(item_id, draft.id, &editor).await.expect("submit");

  let token = service.generate_preview(draft.id, &editor).expect("issue token");
  let diff = service.resolve_preview(&token.token).expect("resolve");

  // the baseline is still the published payload, not an empty object
  assert!(diff.get("title").is_none(), "unchanged field reported as pending: {:?}", diff.keys().collect::<Vec<_>>());
  assert_eq!(diff.len(), 1);
  assert_eq!(diff.get("body").expect("changed field").value, json!("new"));
}

#[tokio::test]
async fn preview_of_never_published_item_diffs_against_empty() {
  let service = service_with_ttl(chrono::Duration::hours(24));
  let editor = actor(Role::Editor);

  let (_, draft) = service.create_draft(ContentKind::BlogPost, &editor, json!({"title": "wip", "words": 120}), None)
                          .await
                          .expect("create draft");
  let token = service.generate_preview(draft.id, &editor).expect("issue token");
  let diff = service.resolve_preview(&token.token).expect("resolve");

  assert_eq!(diff.len(), 2);
  assert_eq!(diff.get("title").expect("title").value, json!("wip"));
  assert_eq!(diff.get("words").expect("words").value_type, "number");
  assert!(diff.get("words").expect("words").css_property.is_none());
}

#[tokio::test]
async fn unknown_and_expired_tokens_are_indistinguishable() {
  let service = service_with_ttl(chrono::Duration::seconds(0));
  let editor = actor(Role::Editor);

  let (_, draft) = service.create_draft(ContentKind::Lesson, &editor, json!({"v": 1}), None)
                          .await
                          .expect("create draft");
  let token = service.generate_preview(draft.id, &editor).expect("issue token");

  // zero TTL: the token is already expired when resolved
  let expired = service.resolve_preview(&token.token).expect_err("expired must fail");
  let unknown = service.resolve_preview("feedfacefeedface").expect_err("unknown must fail");

  assert!(matches!(expired, WorkflowError::NotFound(_)), "got {:?}", expired);
  assert!(matches!(unknown, WorkflowError::NotFound(_)), "got {:?}", unknown);
  // identical signal: nothing distinguishes expiry from absence
  assert_eq!(expired.to_string(), unknown.to_string());
}

#[tokio::test]
async fn tokens_are_opaque_and_single_scope() {
  let service = service_with_ttl(chrono::Duration::hours(1));
  let editor = actor(Role::Editor);

  let (_, a) = service.create_draft(ContentKind::Media, &editor, json!({"alt": "a"}), None)
                      .await
                      .expect("draft a");
  let (_, b) = service.create_draft(ContentKind::Media, &editor, json!({"alt": "b"}), None)
                      .await
                      .expect("draft b");

  let token_a = service.generate_preview(a.id, &editor).expect("token a");
  let token_b = service.generate_preview(b.id, &editor).expect("token b");
  assert_ne!(token_a.token, token_b.token);
  assert_eq!(token_a.revision_id, a.id);
  assert_eq!(token_b.revision_id, b.id);

  // the token embeds no readable ids
  assert!(!token_a.token.contains(&a.id.to_string()));
}

#[tokio::test]
async fn viewer_cannot_issue_preview_tokens() {
  let service = service_with_ttl(chrono::Duration::hours(1));
  let editor = actor(Role::Editor);
  let viewer = actor(Role::Viewer);

  let (_, draft) = service.create_draft(ContentKind::Section, &editor, json!({"order": 1}), None)
                          .await
                          .expect("create draft");
  let err = service.generate_preview(draft.id, &viewer).expect_err("must fail");
  assert!(matches!(err, WorkflowError::Forbidden(_)), "got {:?}", err);
}

#[tokio::test]
async fn expired_tokens_are_garbage_collected() {
  let service = service_with_ttl(chrono::Duration::seconds(0));
  let editor = actor(Role::Editor);

  let (_, draft) = service.create_draft(ContentKind::Course, &editor, json!({"v": 1}), None)
                          .await
                          .expect("create draft");
  service.generate_preview(draft.id, &editor).expect("token");
  service.generate_preview(draft.id, &editor).expect("token");

  assert_eq!(service.previews().token_count(), 2);
  assert_eq!(service.previews().gc_expired(), 2);
  assert_eq!(service.previews().token_count(), 0);
}
