use chrono::{Duration, Utc};
use content_domain::{ContentItem, ContentKind, RevisionStatus};
use serde_json::json;
use uuid::Uuid;
use workflow::errors::WorkflowError;
use workflow::repository::ContentRepository;
use workflow::stubs::InMemoryContentRepository;

fn seeded_item(repo: &InMemoryContentRepository, kind: ContentKind) -> ContentItem {
  let item = ContentItem::new(kind, Uuid::new_v4());
  repo.create_item(&item).expect("create item");
  item
}

#[test]
fn revisions_are_born_draft_and_never_mutate_their_payload() {
  let repo = InMemoryContentRepository::new();
  let item = seeded_item(&repo, ContentKind::Course);

  let rev = repo.create_revision(&item.id, Uuid::new_v4(), json!({"title": "v1"}), None)
                .expect("create revision");
  assert_eq!(rev.status, RevisionStatus::Draft);
  assert!(rev.decided_by.is_none());
  assert!(rev.decided_at.is_none());

  // a status change leaves everything else alone
  let moved = repo.update_revision_status(&rev.id, RevisionStatus::InReview, None, None)
                  .expect("update status");
  assert_eq!(moved.status, RevisionStatus::InReview);
  assert_eq!(moved.payload, json!({"title": "v1"}));
  assert!(moved.decided_by.is_none(), "no decider on submit");
  assert!(moved.decided_at.is_none());

  // a decision records who and when
  let decider = Uuid::new_v4();
  let decided = repo.update_revision_status(&rev.id, RevisionStatus::Approved, Some(decider), None)
                    .expect("decide");
  assert_eq!(decided.decided_by, Some(decider));
  assert!(decided.decided_at.is_some());
}

#[test]
fn non_object_payloads_are_rejected() {
  let repo = InMemoryContentRepository::new();
  let item = seeded_item(&repo, ContentKind::BlogPost);

  for bad in [json!("plain string"), json!(42), json!([1, 2, 3]), json!(null)] {
    let err = repo.create_revision(&item.id, Uuid::new_v4(), bad, None).expect_err("must fail");
    assert!(matches!(err, WorkflowError::Validation(_)), "got {:?}", err);
  }
}

#[test]
fn history_is_most_recent_first() {
  let repo = InMemoryContentRepository::new();
  let item = seeded_item(&repo, ContentKind::Lesson);
  let author = Uuid::new_v4();

  let mut ids = Vec::new();
  for i in 0..5 {
    let base = ids.last().copied();
    let rev = repo.create_revision(&item.id, author, json!({"v": i}), base).expect("create revision");
    ids.push(rev.id);
  }

  let history = repo.history(&item.id).expect("history");
  assert_eq!(history.len(), 5);
  let seen: Vec<_> = history.iter().map(|r| r.id).collect();
  ids.reverse();
  assert_eq!(seen, ids);

  // each revision chains to its predecessor
  assert_eq!(history[0].base_revision_id, Some(history[1].id));
}

#[test]
fn active_revision_reports_in_review_or_approved_only() {
  let repo = InMemoryContentRepository::new();
  let item = seeded_item(&repo, ContentKind::Package);
  let author = Uuid::new_v4();

  let rev = repo.create_revision(&item.id, author, json!({"v": 1}), None).expect("create");
  assert!(repo.active_revision(&item.id).expect("query").is_none(), "drafts are not active");

  repo.update_revision_status(&rev.id, RevisionStatus::InReview, None, None).expect("submit");
  assert_eq!(repo.active_revision(&item.id).expect("query").map(|r| r.id), Some(rev.id));

  repo.update_revision_status(&rev.id, RevisionStatus::Approved, Some(author), None).expect("approve");
  assert_eq!(repo.active_revision(&item.id).expect("query").map(|r| r.id), Some(rev.id));

  repo.update_revision_status(&rev.id, RevisionStatus::Published, Some(author), None).expect("publish");
  assert!(repo.active_revision(&item.id).expect("query").is_none(), "published is not active");
}

#[test]
fn missing_ids_surface_not_found() {
  let repo = InMemoryContentRepository::new();
  let ghost = Uuid::new_v4();

  assert!(matches!(repo.get_item(&ghost), Err(WorkflowError::NotFound(_))));
  assert!(matches!(repo.get_revision(&ghost), Err(WorkflowError::NotFound(_))));
  assert!(matches!(repo.create_revision(&ghost, Uuid::new_v4(), json!({}), None),
                   Err(WorkflowError::NotFound(_))));
  assert!(repo.history(&ghost).expect("empty history").is_empty());
}

#[test]
fn due_for_publish_filters_by_deadline_and_deletion() {
  let repo = InMemoryContentRepository::new();
  let now = Utc::now();

  let mut due = seeded_item(&repo, ContentKind::Course);
  due.scheduled_publish_at = Some(now - Duration::minutes(5));
  repo.update_item(&due).expect("update");

  let mut later = seeded_item(&repo, ContentKind::Course);
  later.scheduled_publish_at = Some(now + Duration::hours(1));
  repo.update_item(&later).expect("update");

  let mut deleted = seeded_item(&repo, ContentKind::Course);
  deleted.scheduled_publish_at = Some(now - Duration::minutes(5));
  deleted.deleted_at = Some(now);
  repo.update_item(&deleted).expect("update");

  seeded_item(&repo, ContentKind::Course); // never scheduled

  let hits = repo.due_for_publish(now).expect("sweep");
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].id, due.id);
}

#[test]
fn list_items_filters_by_kind() {
  let repo = InMemoryContentRepository::new();
  seeded_item(&repo, ContentKind::Course);
  seeded_item(&repo, ContentKind::Course);
  seeded_item(&repo, ContentKind::Media);

  assert_eq!(repo.list_items(None).expect("all").len(), 3);
  assert_eq!(repo.list_items(Some(ContentKind::Course)).expect("courses").len(), 2);
  assert!(repo.list_items(Some(ContentKind::Section)).expect("none").is_empty());
}
