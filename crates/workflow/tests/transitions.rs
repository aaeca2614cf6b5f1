use content_domain::{Actor, ContentKind, ContentStatus, RevisionStatus, Role};
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

fn service() -> ContentService<InMemoryContentRepository> {
  ContentService::new(Arc::new(InMemoryContentRepository::new()), WorkflowEngineConfig::default())
}

#[tokio::test]
async fn full_editorial_lifecycle() {
  let service = service();
  let editor = actor(Role::Editor);
  let reviewer = actor(Role::Reviewer);
  let publisher = actor(Role::Publisher);

  // editor saves a draft
  let (item, rev) = service.create_draft(ContentKind::Course, &editor, json!({"title": "Rust 101"}), None)
                           .await
                           .expect("create draft");
  assert_eq!(item.status, ContentStatus::Draft);
  assert_eq!(item.current_revision_id, Some(rev.id));
  assert_eq!(rev.status, RevisionStatus::Draft);
  assert_eq!(rev.author_id, editor.id);

  // submit moves the revision and the item to in_review
  let rev = service.submit_for_review(item.id, rev.id, &editor).await.expect("submit");
  assert_eq!(rev.status, RevisionStatus::InReview);
  assert_eq!(service.get_item(&item.id).expect("item").status, ContentStatus::InReview);

  // approval records who decided
  let rev = service.approve(item.id, rev.id, &reviewer).await.expect("approve");
  assert_eq!(rev.status, RevisionStatus::Approved);
  assert_eq!(rev.decided_by, Some(reviewer.id));
  assert!(rev.decided_at.is_some());

  // publish stamps the item and moves the current pointer
  let published = service.publish(item.id, rev.id, &publisher).await.expect("publish");
  assert_eq!(published.status, ContentStatus::Published);
  assert_eq!(published.current_revision_id, Some(rev.id));
  assert_eq!(published.published_revision_id, Some(rev.id));
  assert!(published.published_at.is_some());
  assert!(published.scheduled_publish_at.is_none());
}

#[tokio::test]
async fn reject_requires_notes_and_leaves_state_untouched() {
  let service = service();
  let editor = actor(Role::Editor);
  let reviewer = actor(Role::Reviewer);

  let (item, rev) = service.create_draft(ContentKind::BlogPost, &editor, json!({"title": "x"}), None)
                           .await
                           .expect("create draft");
  let rev = service.submit_for_review(item.id, rev.id, &editor).await.expect("submit");

  // empty notes are rejected before any state change
  let err = service.reject(item.id, rev.id, &reviewer, "   ").await.expect_err("must fail");
  assert!(matches!(err, WorkflowError::Validation(_)), "got {:?}", err);
  let untouched = service.history(&item.id).expect("history").remove(0);
  assert_eq!(untouched.status, RevisionStatus::InReview);
  assert!(untouched.review_notes.is_none());

  // with notes the rejection lands and the item is editable again
  let rejected = service.reject(item.id, rev.id, &reviewer, "needs a real intro").await.expect("reject");
  assert_eq!(rejected.status, RevisionStatus::Rejected);
  assert_eq!(rejected.review_notes.as_deref(), Some("needs a real intro"));
  assert_eq!(rejected.decided_by, Some(reviewer.id));
  assert_eq!(service.get_item(&item.id).expect("item").status, ContentStatus::Draft);
}

#[tokio::test]
async fn rejected_revision_is_terminal_but_can_seed_a_new_draft() {
  let service = service();
  let editor = actor(Role::Editor);
  let reviewer = actor(Role::Reviewer);

  let (item, rev) = service.create_draft(ContentKind::Lesson, &editor, json!({"body": "v1"}), None)
                           .await
                           .expect("create draft");
  let rev = service.submit_for_review(item.id, rev.id, &editor).await.expect("submit");
  service.reject(item.id, rev.id, &reviewer, "typos").await.expect("reject");

  // the rejected revision cannot move again
  let err = service.submit_for_review(item.id, rev.id, &editor).await.expect_err("must fail");
  assert!(matches!(err, WorkflowError::InvalidTransition(_)), "got {:?}", err);

  // but a new draft chained on it continues the thread
  let (_, fresh) = service.create_draft(ContentKind::Lesson, &editor, json!({"body": "v2"}), Some(rev.id))
                          .await
                          .expect("chained draft");
  assert_eq!(fresh.base_revision_id, Some(rev.id));
  assert_eq!(fresh.content_id, item.id);
  assert_eq!(fresh.status, RevisionStatus::Draft);
  service.submit_for_review(item.id, fresh.id, &editor).await.expect("resubmit");
}

#[tokio::test]
async fn out_of_order_transitions_are_invalid() {
  let service = service();
  let editor = actor(Role::Editor);
  let admin = actor(Role::Admin);

  let (item, rev) = service.create_draft(ContentKind::Package, &editor, json!({"sku": 1}), None)
                           .await
                           .expect("create draft");

  // approve straight from draft
  let err = service.approve(item.id, rev.id, &admin).await.expect_err("must fail");
  assert!(matches!(err, WorkflowError::InvalidTransition(_)), "got {:?}", err);

  // publish straight from draft
  let err = service.publish(item.id, rev.id, &admin).await.expect_err("must fail");
  assert!(matches!(err, WorkflowError::InvalidTransition(_)), "got {:?}", err);

  // double approve
  service.submit_for_review(item.id, rev.id, &editor).await.expect("submit");
  service.approve(item.id, rev.id, &admin).await.expect("approve");
  let err = service.approve(item.id, rev.id, &admin).await.expect_err("must fail");
  assert!(matches!(err, WorkflowError::InvalidTransition(_)), "got {:?}", err);
}

#[tokio::test]
async fn role_gates_are_enforced() {
  let service = service();
  let viewer = actor(Role::Viewer);
  let editor = actor(Role::Editor);
  let reviewer = actor(Role::Reviewer);

  let err = service.create_draft(ContentKind::Media, &viewer, json!({"alt": "x"}), None)
                   .await
                   .expect_err("viewer cannot draft");
  assert!(matches!(err, WorkflowError::Forbidden(_)), "got {:?}", err);

  let (item, rev) = service.create_draft(ContentKind::Media, &editor, json!({"alt": "x"}), None)
                           .await
                           .expect("create draft");
  service.submit_for_review(item.id, rev.id, &editor).await.expect("submit");

  // editor cannot review their own work
  let err = service.approve(item.id, rev.id, &editor).await.expect_err("editor cannot approve");
  assert!(matches!(err, WorkflowError::Forbidden(_)), "got {:?}", err);

  // reviewer cannot publish
  service.approve(item.id, rev.id, &reviewer).await.expect("approve");
  let err = service.publish(item.id, rev.id, &reviewer).await.expect_err("reviewer cannot publish");
  assert!(matches!(err, WorkflowError::Forbidden(_)), "got {:?}", err);
}

#[tokio::test]
async fn direct_publish_is_off_by_default_and_explicit_when_enabled() {
  let disabled = service();
  let editor = actor(Role::Editor);
  let publisher = actor(Role::Publisher);

  let (item, rev) = disabled.create_draft(ContentKind::Section, &editor, json!({"order": 1}), None)
                            .await
                            .expect("create draft");
  let err = disabled.publish_direct(item.id, rev.id, &publisher).await.expect_err("must fail");
  assert!(matches!(err, WorkflowError::InvalidTransition(_)), "got {:?}", err);

  let enabled = ContentService::new(Arc::new(InMemoryContentRepository::new()),
                                    WorkflowEngineConfig { allow_direct_publish: true,
                                                           ..WorkflowEngineConfig::default() });
  let (item, rev) = enabled.create_draft(ContentKind::Section, &editor, json!({"order": 1}), None)
                           .await
                           .expect("create draft");
  let published = enabled.publish_direct(item.id, rev.id, &publisher).await.expect("direct publish");
  assert_eq!(published.status, ContentStatus::Published);
  assert_eq!(published.current_revision_id, Some(rev.id));
}

#[tokio::test]
async fn deleted_items_vanish_but_keep_history() {
  let service = service();
  let editor = actor(Role::Editor);
  let publisher = actor(Role::Publisher);

  let (item, rev) = service.create_draft(ContentKind::Course, &editor, json!({"title": "a"}), None)
                           .await
                           .expect("create draft");
  service.delete_item(item.id, &publisher).await.expect("delete");

  let err = service.submit_for_review(item.id, rev.id, &editor).await.expect_err("must fail");
  assert!(matches!(err, WorkflowError::NotFound(_)), "got {:?}", err);

  // revisions survive the soft delete
  assert_eq!(service.history(&item.id).expect("history").len(), 1);
}
