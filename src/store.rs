//! Note collections and the optimistic-persistence pipeline.
//!
//! DESIGN
//! ======
//! The store is the single writer of note records. It owns three
//! collections: the full set of the user's notes (persisted and local-only),
//! the read-only shared overlay fetched from other users, and the floating
//! subset currently rendered on the canvas. Mutations apply to local state
//! immediately; the network is touched only by `save_note`, `delete_note`,
//! `toggle_sharing`, and `load`, and a failure there never rolls back the
//! user's in-progress edits — except for delete, which refuses the removal
//! entirely so a failed destructive call cannot hide a live record.
//!
//! ERROR HANDLING
//! ==============
//! Remote failures are caught here, logged with `tracing::warn!`, and
//! surfaced as a `StoreError` return value. They never propagate into the
//! gesture handlers, which are synchronous and infallible.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::HashMap;

use crate::consts::{
    DEFAULT_CONTAINER_HEIGHT, DEFAULT_CONTAINER_WIDTH, MAX_CONTENT_LEN, PLACEMENT_GRID_STEP, PLACEMENT_MARGIN,
};
use crate::geometry::{self, Point, Rect, Size};
use crate::note::{Note, NoteKind, NoteTemplate, PartialNote, clamp_size};
use crate::remote::{NoteDraft, NoteFilter, NoteService, ServiceError};

/// Which content/course this canvas annotates. Sent with every create and
/// used to scope the load query.
#[derive(Debug, Clone, Default)]
pub struct NoteScope {
    pub content_id: Option<String>,
    pub course_id: Option<String>,
    /// The current user; shared notes from other authors are read-only.
    pub user_id: Option<String>,
}

/// Failures surfaced by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("note not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Result of a successful `save_note`: the canonical id (which differs from
/// the requested id when a temp note was just created) and whether the call
/// created or updated the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saved {
    pub id: String,
    pub created: bool,
}

/// The authoritative collection of notes plus its remote-sync adapter.
pub struct NoteStore<S> {
    service: S,
    scope: NoteScope,
    notes: HashMap<String, Note>,
    shared: HashMap<String, Note>,
    floating: Vec<String>,
    container: Size,
}

impl<S> NoteStore<S> {
    /// Create an empty store over `service`.
    #[must_use]
    pub fn new(service: S, scope: NoteScope) -> Self {
        Self {
            service,
            scope,
            notes: HashMap::new(),
            shared: HashMap::new(),
            floating: Vec::new(),
            container: Size::new(DEFAULT_CONTAINER_WIDTH, DEFAULT_CONTAINER_HEIGHT),
        }
    }

    // --- Container ---

    /// Record the canvas container dimensions reported by the host.
    pub fn set_container(&mut self, container: Size) {
        self.container = container;
    }

    #[must_use]
    pub fn container(&self) -> Size {
        self.container
    }

    // --- Queries ---

    /// Look up a note by id in the full set or the shared overlay.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.get(id).or_else(|| self.shared.get(id))
    }

    /// The current user from the store's scope, if known.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.scope.user_id.as_deref()
    }

    /// Look up a note the current user owns.
    #[must_use]
    pub fn get_own(&self, id: &str) -> Option<&Note> {
        self.notes.get(id)
    }

    /// Whether the current user may drag, resize, edit, or delete this note.
    #[must_use]
    pub fn is_owned(&self, id: &str) -> bool {
        self.notes.contains_key(id)
    }

    /// Whether the note is currently rendered on the canvas.
    #[must_use]
    pub fn is_floating(&self, id: &str) -> bool {
        self.floating.iter().any(|f| f == id)
    }

    /// Floating notes in their stable stacking order.
    #[must_use]
    pub fn floating_notes(&self) -> Vec<&Note> {
        self.floating.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Bounding rectangles of the floating set, the obstacle list for
    /// placement.
    #[must_use]
    pub fn floating_rects(&self) -> Vec<Rect> {
        self.floating_notes().iter().map(|n| n.rect()).collect()
    }

    /// All notes the user owns, newest first.
    #[must_use]
    pub fn saved_notes(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.values().collect();
        notes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        notes
    }

    /// The read-only shared overlay, newest first.
    #[must_use]
    pub fn shared_notes(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.shared.values().collect();
        notes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        notes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    // --- Local mutations ---

    /// Create a note locally with a `temp-` id, auto-placed to avoid the
    /// current floating set. Nothing is persisted until `save_note`.
    pub fn create_note(&mut self, template: Option<&NoteTemplate>) -> &Note {
        let (kind, seed) = match template {
            Some(t) => (t.kind, t.seed_content.to_owned()),
            None => (NoteKind::Floating, String::new()),
        };
        self.spawn_local(kind, seed, None, None)
    }

    /// Create a note anchored to a text selection in the source content.
    pub fn create_contextual_note(&mut self, contextual_text: &str, contextual_id: &str) -> &Note {
        self.spawn_local(
            NoteKind::Contextual,
            contextual_text.to_owned(),
            Some(contextual_text.to_owned()),
            Some(contextual_id.to_owned()),
        )
    }

    fn spawn_local(
        &mut self,
        kind: NoteKind,
        content: String,
        contextual_text: Option<String>,
        contextual_id: Option<String>,
    ) -> &Note {
        let mut note = Note::new_local(Point::new(0.0, 0.0), kind, content);
        note.position = geometry::find_placement(
            &self.floating_rects(),
            self.container,
            note.size,
            PLACEMENT_GRID_STEP,
            PLACEMENT_MARGIN,
        );
        note.contextual_text = contextual_text;
        note.contextual_id = contextual_id;
        note.author_id = self.scope.user_id.clone();
        let id = note.id.clone();
        self.floating.push(id.clone());
        self.notes.entry(id).or_insert(note)
    }

    /// Remove a note from the canvas without touching the persisted record.
    pub fn hide_note(&mut self, id: &str) {
        self.floating.retain(|f| f != id);
    }

    /// Bring a stored note back onto the canvas with a fresh placement.
    /// Returns false if the note is unknown or already floating.
    pub fn show_note(&mut self, id: &str) -> bool {
        if self.is_floating(id) || self.get(id).is_none() {
            return false;
        }
        let size = self.get(id).map_or_else(|| Size::new(0.0, 0.0), |n| n.size);
        let position = geometry::find_placement(
            &self.floating_rects(),
            self.container,
            size,
            PLACEMENT_GRID_STEP,
            PLACEMENT_MARGIN,
        );
        if let Some(note) = self.notes.get_mut(id).or_else(|| self.shared.get_mut(id)) {
            note.position = position;
        }
        self.floating.push(id.to_owned());
        true
    }

    /// Replace a note's content, capped at the server's length limit.
    /// Returns false for unknown or foreign notes.
    pub fn set_content(&mut self, id: &str, content: &str) -> bool {
        let Some(note) = self.notes.get_mut(id) else {
            return false;
        };
        note.content = cap_content(content);
        true
    }

    /// Replace a note's title. Returns false for unknown or foreign notes.
    pub fn set_title(&mut self, id: &str, title: &str) -> bool {
        let Some(note) = self.notes.get_mut(id) else {
            return false;
        };
        note.title = title.to_owned();
        true
    }

    /// The drag/resize commit path: write a gesture's final geometry.
    /// Size is clamped to the note bounds and position to the container.
    /// Returns false for unknown or foreign notes.
    pub fn apply_geometry(&mut self, id: &str, position: Point, size: Size) -> bool {
        let container = self.container;
        let Some(note) = self.notes.get_mut(id) else {
            return false;
        };
        note.size = clamp_size(size);
        note.position = geometry::clamp_to_container(position, note.size, container);
        true
    }
}

impl<S: NoteService> NoteStore<S> {
    // --- Remote operations ---

    /// Populate the note sets from the remote service. Local-only notes
    /// (temp ids) survive a reload; persisted entries are replaced
    /// wholesale. Floating ids whose notes vanished are dropped.
    ///
    /// # Errors
    ///
    /// Returns the service failure; existing local state is untouched.
    pub async fn load(&mut self) -> Result<(), StoreError> {
        let filter = NoteFilter {
            content_id: self.scope.content_id.clone(),
            course_id: self.scope.course_id.clone(),
            include_shared: true,
            exclude_content_id: self.scope.content_id.clone(),
        };
        let batch = match self.service.list(&filter).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(error = %e, "note load failed");
                return Err(e.into());
            }
        };

        self.notes.retain(|_, n| !n.is_persisted());
        for note in batch.notes {
            self.notes.insert(note.id.clone(), note);
        }
        self.shared.clear();
        for note in batch.shared {
            self.shared.insert(note.id.clone(), note);
        }
        let known: Vec<String> = self.floating.iter().filter(|id| self.get(id.as_str()).is_some()).cloned().collect();
        self.floating = known;
        Ok(())
    }

    /// Persist a note: create when it still has a `temp-` id, update
    /// otherwise. On create the temp entry is replaced in both sets under
    /// the server id. Failures keep the optimistic local state; the caller
    /// surfaces the error.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is unknown (or not owned), otherwise the
    /// service failure.
    pub async fn save_note(&mut self, id: &str) -> Result<Saved, StoreError> {
        let note = self.notes.get(id).cloned().ok_or_else(|| StoreError::NotFound(id.to_owned()))?;

        if note.is_persisted() {
            let fields = PartialNote::from_note(&note);
            match self.service.update(id, &fields).await {
                Ok(saved) => {
                    self.merge_saved(id, saved);
                    Ok(Saved { id: id.to_owned(), created: false })
                }
                Err(e) => {
                    tracing::warn!(error = %e, note_id = %id, "note update failed; keeping local state");
                    Err(e.into())
                }
            }
        } else {
            let draft = self.draft_for(&note);
            match self.service.create(&draft).await {
                Ok(saved) => {
                    let new_id = saved.id.clone();
                    self.notes.remove(id);
                    self.merge_saved(&new_id, saved);
                    for slot in &mut self.floating {
                        if slot == id {
                            slot.clone_from(&new_id);
                        }
                    }
                    Ok(Saved { id: new_id, created: true })
                }
                Err(e) => {
                    tracing::warn!(error = %e, note_id = %id, "note create failed; keeping local copy");
                    Err(e.into())
                }
            }
        }
    }

    /// Delete a note. No optimistic removal: local sets change only after
    /// the remote accepts (local-only temp notes skip the remote call).
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids; the service failure otherwise, in which
    /// case the note stays visible.
    pub async fn delete_note(&mut self, id: &str) -> Result<(), StoreError> {
        let note = self.notes.get(id).ok_or_else(|| StoreError::NotFound(id.to_owned()))?;

        if note.is_persisted() {
            if let Err(e) = self.service.delete(id).await {
                tracing::warn!(error = %e, note_id = %id, "note delete failed; record retained");
                return Err(e.into());
            }
        }
        self.notes.remove(id);
        self.floating.retain(|f| f != id);
        Ok(())
    }

    /// Flip a note's shared flag and persist the change. The flag is rolled
    /// back if the remote rejects it, so visibility never silently
    /// diverges from the server.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids or notes never persisted; the service
    /// failure otherwise.
    pub async fn toggle_sharing(&mut self, id: &str) -> Result<bool, StoreError> {
        let note = self.notes.get_mut(id).ok_or_else(|| StoreError::NotFound(id.to_owned()))?;
        if !note.is_persisted() {
            return Err(StoreError::NotFound(id.to_owned()));
        }
        note.is_shared = !note.is_shared;
        let shared = note.is_shared;

        let fields = PartialNote { is_shared: Some(shared), ..Default::default() };
        match self.service.update(id, &fields).await {
            Ok(saved) => {
                self.merge_saved(id, saved);
                Ok(shared)
            }
            Err(e) => {
                if let Some(note) = self.notes.get_mut(id) {
                    note.is_shared = !shared;
                }
                tracing::warn!(error = %e, note_id = %id, "sharing toggle failed; flag reverted");
                Err(e.into())
            }
        }
    }

    fn merge_saved(&mut self, id: &str, mut saved: Note) {
        saved.is_new = false;
        self.notes.insert(id.to_owned(), saved);
    }

    fn draft_for(&self, note: &Note) -> NoteDraft {
        NoteDraft {
            content_id: self.scope.content_id.clone(),
            course_id: self.scope.course_id.clone(),
            title: note.title.clone(),
            content: note.content.clone(),
            position: note.position,
            size: note.size,
            kind: note.kind,
            contextual_text: note.contextual_text.clone(),
            contextual_id: note.contextual_id.clone(),
        }
    }
}

#[cfg(test)]
impl<S> NoteStore<S> {
    pub(crate) fn service_for_test(&self) -> &S {
        &self.service
    }

    pub(crate) fn shared_insert_for_test(&mut self, note: Note) {
        self.shared.insert(note.id.clone(), note);
    }
}

fn cap_content(content: &str) -> String {
    if content.chars().count() <= MAX_CONTENT_LEN {
        return content.to_owned();
    }
    content.chars().take(MAX_CONTENT_LEN).collect()
}
