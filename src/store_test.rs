#![allow(clippy::float_cmp)]

use super::*;
use crate::note::NOTE_TEMPLATES;
use crate::remote::InMemoryNoteService;

fn store() -> NoteStore<InMemoryNoteService> {
    // Route warn! lines from the failure-path tests into captured output.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let scope = NoteScope {
        content_id: Some("content-1".to_owned()),
        course_id: Some("course-1".to_owned()),
        user_id: Some("user-1".to_owned()),
    };
    NoteStore::new(InMemoryNoteService::new(), scope)
}

fn foreign_shared(id: &str) -> Note {
    let mut note = Note::new_local(Point::new(20.0, 20.0), NoteKind::Floating, "from a classmate".to_owned());
    note.id = id.to_owned();
    note.is_shared = true;
    note.is_new = false;
    note.author_id = Some("user-2".to_owned());
    note.author_name = Some("Someone Else".to_owned());
    note
}

// =============================================================
// Local creation and placement
// =============================================================

#[test]
fn create_note_is_local_and_floating() {
    let mut s = store();
    let id = s.create_note(None).id.clone();
    assert!(id.starts_with("temp-"));
    assert!(s.is_floating(&id));
    assert!(s.is_owned(&id));
    assert_eq!(s.len(), 1);
}

#[test]
fn create_note_first_placement_is_top_left() {
    let mut s = store();
    let note = s.create_note(None);
    assert_eq!(note.position, Point::new(20.0, 20.0));
}

#[test]
fn create_note_template_seeds_kind_and_content() {
    let mut s = store();
    let note = s.create_note(Some(&NOTE_TEMPLATES[0]));
    assert_eq!(note.kind, NoteKind::Question);
    assert_eq!(note.content, "Question: ");
}

#[test]
fn create_three_notes_do_not_overlap() {
    let mut s = store();
    s.set_container(Size::new(1000.0, 600.0));
    let a = s.create_note(None).id.clone();
    let b = s.create_note(None).id.clone();
    let c = s.create_note(None).id.clone();

    let first = s.get(&a).map(Note::rect).expect("first note");
    let second = s.get(&b).map(Note::rect).expect("second note");
    assert_eq!((first.left, first.top), (20.0, 20.0));
    assert_eq!((second.left, second.top), (340.0, 20.0));

    let rects = [first, second, s.get(&c).map(Note::rect).expect("third note")];
    for (i, r) in rects.iter().enumerate() {
        for other in &rects[i + 1..] {
            assert!(!geometry::rects_overlap(*r, *other, PLACEMENT_MARGIN));
        }
    }
}

#[test]
fn create_contextual_note_carries_anchor() {
    let mut s = store();
    let note = s.create_contextual_note("the quoted passage", "para-7");
    assert_eq!(note.kind, NoteKind::Contextual);
    assert_eq!(note.content, "the quoted passage");
    assert_eq!(note.contextual_text.as_deref(), Some("the quoted passage"));
    assert_eq!(note.contextual_id.as_deref(), Some("para-7"));
}

// =============================================================
// save_note
// =============================================================

#[tokio::test]
async fn save_new_note_swaps_temp_id() {
    let mut s = store();
    let temp_id = s.create_note(None).id.clone();
    s.set_content(&temp_id, "hello");

    let saved = s.save_note(&temp_id).await.unwrap();
    assert!(saved.created);
    assert!(!saved.id.starts_with("temp-"));
    assert!(s.get(&temp_id).is_none());

    let note = s.get(&saved.id).expect("persisted note");
    assert!(note.is_persisted());
    assert!(!note.is_new);
    assert_eq!(note.content, "hello");
    assert!(s.is_floating(&saved.id));
    assert!(!s.is_floating(&temp_id));
}

#[tokio::test]
async fn save_preserves_geometry_round_trip() {
    let mut s = store();
    let temp_id = s.create_note(None).id.clone();
    s.apply_geometry(&temp_id, Point::new(120.0, 80.0), Size::new(320.0, 240.0));

    let saved = s.save_note(&temp_id).await.unwrap();
    let note = s.get(&saved.id).expect("persisted note");
    assert_eq!(note.position, Point::new(120.0, 80.0));
    assert_eq!(note.size, Size::new(320.0, 240.0));
}

#[tokio::test]
async fn save_is_idempotent_for_unchanged_fields() {
    let mut s = store();
    let temp_id = s.create_note(None).id.clone();
    let first = s.save_note(&temp_id).await.unwrap();
    let again = s.save_note(&first.id).await.unwrap();
    assert_eq!(again.id, first.id);
    assert!(!again.created);
    assert_eq!(s.len(), 1);
}

#[tokio::test]
async fn save_failure_keeps_optimistic_state() {
    let mut s = store();
    let temp_id = s.create_note(None).id.clone();
    s.set_content(&temp_id, "unsaved edit");

    s.service_for_test().set_failing(true);
    let result = s.save_note(&temp_id).await;
    assert!(matches!(result.unwrap_err(), StoreError::Service(_)));

    // The user's edit is still there under the temp id.
    let note = s.get(&temp_id).expect("local note retained");
    assert_eq!(note.content, "unsaved edit");
    assert!(s.is_floating(&temp_id));
}

#[tokio::test]
async fn save_unknown_id_is_not_found() {
    let mut s = store();
    let result = s.save_note("missing").await;
    assert!(matches!(result.unwrap_err(), StoreError::NotFound(_)));
}

#[tokio::test]
async fn save_persisted_note_updates_in_place() {
    let mut s = store();
    let temp_id = s.create_note(None).id.clone();
    let saved = s.save_note(&temp_id).await.unwrap();

    s.set_content(&saved.id, "second revision");
    let again = s.save_note(&saved.id).await.unwrap();
    assert!(!again.created);
    assert_eq!(s.get(&saved.id).expect("note").content, "second revision");
}

// =============================================================
// delete_note
// =============================================================

#[tokio::test]
async fn delete_persisted_note_removes_everywhere() {
    let mut s = store();
    let temp_id = s.create_note(None).id.clone();
    let saved = s.save_note(&temp_id).await.unwrap();

    s.delete_note(&saved.id).await.unwrap();
    assert!(s.get(&saved.id).is_none());
    assert!(!s.is_floating(&saved.id));
    assert!(s.service_for_test().is_empty());
}

#[tokio::test]
async fn delete_failure_keeps_note_visible() {
    let mut s = store();
    let temp_id = s.create_note(None).id.clone();
    let saved = s.save_note(&temp_id).await.unwrap();

    s.service_for_test().set_failing(true);
    let result = s.delete_note(&saved.id).await;
    assert!(result.is_err());
    assert!(s.get(&saved.id).is_some());
    assert!(s.is_floating(&saved.id));
}

#[tokio::test]
async fn delete_local_only_note_skips_remote() {
    let mut s = store();
    let temp_id = s.create_note(None).id.clone();

    // Even an unreachable backend can't block discarding a local-only note.
    s.service_for_test().set_failing(true);
    s.delete_note(&temp_id).await.unwrap();
    assert!(s.get(&temp_id).is_none());
}

#[tokio::test]
async fn delete_unknown_id_is_not_found() {
    let mut s = store();
    let result = s.delete_note("missing").await;
    assert!(matches!(result.unwrap_err(), StoreError::NotFound(_)));
}

// =============================================================
// hide / show
// =============================================================

#[tokio::test]
async fn hide_keeps_record_show_replaces_it() {
    let mut s = store();
    let temp_id = s.create_note(None).id.clone();
    let saved = s.save_note(&temp_id).await.unwrap();

    s.hide_note(&saved.id);
    assert!(!s.is_floating(&saved.id));
    assert!(s.get(&saved.id).is_some());

    assert!(s.show_note(&saved.id));
    assert!(s.is_floating(&saved.id));
}

#[test]
fn show_recomputes_placement_against_floating_set() {
    let mut s = store();
    let a = s.create_note(None).id.clone();
    let b = s.create_note(None).id.clone();
    s.hide_note(&b);

    assert!(s.show_note(&b));
    let first = s.get(&a).map(Note::rect).expect("note a");
    let second = s.get(&b).map(Note::rect).expect("note b");
    assert!(!geometry::rects_overlap(first, second, PLACEMENT_MARGIN));
}

#[test]
fn show_unknown_or_already_floating_is_false() {
    let mut s = store();
    let id = s.create_note(None).id.clone();
    assert!(!s.show_note(&id)); // already floating
    assert!(!s.show_note("missing"));
}

// =============================================================
// toggle_sharing
// =============================================================

#[tokio::test]
async fn toggle_sharing_flips_and_persists() {
    let mut s = store();
    let temp_id = s.create_note(None).id.clone();
    let saved = s.save_note(&temp_id).await.unwrap();

    assert!(s.toggle_sharing(&saved.id).await.unwrap());
    assert!(s.get(&saved.id).expect("note").is_shared);
    assert!(!s.toggle_sharing(&saved.id).await.unwrap());
}

#[tokio::test]
async fn toggle_sharing_failure_reverts_flag() {
    let mut s = store();
    let temp_id = s.create_note(None).id.clone();
    let saved = s.save_note(&temp_id).await.unwrap();

    s.service_for_test().set_failing(true);
    assert!(s.toggle_sharing(&saved.id).await.is_err());
    assert!(!s.get(&saved.id).expect("note").is_shared);
}

#[tokio::test]
async fn toggle_sharing_unsaved_note_rejected() {
    let mut s = store();
    let temp_id = s.create_note(None).id.clone();
    let result = s.toggle_sharing(&temp_id).await;
    assert!(matches!(result.unwrap_err(), StoreError::NotFound(_)));
}

// =============================================================
// Content edits and geometry commits
// =============================================================

#[test]
fn set_content_caps_length() {
    let mut s = store();
    let id = s.create_note(None).id.clone();
    let long = "x".repeat(5000);
    assert!(s.set_content(&id, &long));
    assert_eq!(s.get(&id).expect("note").content.chars().count(), 2000);
}

#[test]
fn set_title_and_content_unknown_id_false() {
    let mut s = store();
    assert!(!s.set_content("missing", "x"));
    assert!(!s.set_title("missing", "x"));
}

#[test]
fn apply_geometry_clamps_size_and_position() {
    let mut s = store();
    s.set_container(Size::new(1000.0, 600.0));
    let id = s.create_note(None).id.clone();

    assert!(s.apply_geometry(&id, Point::new(-50.0, 900.0), Size::new(9999.0, 10.0)));
    let note = s.get(&id).expect("note");
    assert_eq!(note.size, Size::new(600.0, 150.0));
    assert_eq!(note.position, Point::new(0.0, 450.0));
}

#[test]
fn apply_geometry_foreign_note_refused() {
    let mut s = store();
    let mut service_note = foreign_shared("shared-1");
    service_note.position = Point::new(10.0, 10.0);
    s.shared_insert_for_test(service_note);

    assert!(!s.apply_geometry("shared-1", Point::new(0.0, 0.0), Size::new(280.0, 200.0)));
}

// =============================================================
// load
// =============================================================

#[tokio::test]
async fn load_populates_own_and_shared_sets() {
    let mut s = store();
    let service = s.service_for_test();
    let draft_note = crate::remote::NoteDraft {
        content_id: Some("content-1".to_owned()),
        course_id: Some("course-1".to_owned()),
        title: "Untitled Note".to_owned(),
        content: "stored".to_owned(),
        position: Point::new(20.0, 20.0),
        size: Size::new(280.0, 200.0),
        kind: NoteKind::Floating,
        contextual_text: None,
        contextual_id: None,
    };
    let stored = service.create(&draft_note).await.unwrap();
    service.insert(foreign_shared("shared-1"));

    s.load().await.unwrap();
    assert!(s.get_own(&stored.id).is_some());
    assert_eq!(s.shared_notes().len(), 1);
    assert!(!s.is_owned("shared-1"));
}

#[tokio::test]
async fn load_keeps_local_only_notes() {
    let mut s = store();
    let temp_id = s.create_note(None).id.clone();
    s.load().await.unwrap();
    assert!(s.get(&temp_id).is_some());
    assert!(s.is_floating(&temp_id));
}

#[tokio::test]
async fn load_failure_leaves_state_untouched() {
    let mut s = store();
    let temp_id = s.create_note(None).id.clone();
    s.service_for_test().set_failing(true);
    assert!(s.load().await.is_err());
    assert!(s.get(&temp_id).is_some());
}

#[tokio::test]
async fn load_prunes_floating_ids_for_vanished_notes() {
    let mut s = store();
    let temp_id = s.create_note(None).id.clone();
    let saved = s.save_note(&temp_id).await.unwrap();

    // The record disappears server-side (deleted elsewhere).
    s.service_for_test().delete(&saved.id).await.unwrap();
    s.load().await.unwrap();
    assert!(!s.is_floating(&saved.id));
    assert!(s.get(&saved.id).is_none());
}
