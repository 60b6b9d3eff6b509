//! The remote note-persistence collaborator.
//!
//! The canvas consumes persistence through four logical operations —
//! create, update, delete, list — behind the [`NoteService`] trait, so the
//! transport is swappable. [`HttpNoteService`] speaks the REST shape of the
//! backing API; [`InMemoryNoteService`] is an id-assigning double for tests
//! and offline hosts.
//!
//! ERROR HANDLING
//! ==============
//! Every operation returns `Result<_, ServiceError>`. Callers (the store)
//! convert failures into a return status plus a log line; nothing here
//! panics or retries.

#[cfg(test)]
#[path = "remote_test.rs"]
mod remote_test;

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Size};
use crate::note::{Note, NoteKind, PartialNote};

/// Failures crossing the persistence boundary.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("note not found: {0}")]
    NotFound(String),
}

/// Client-side fields sent when creating a note. The server answers with
/// the canonical record, including its assigned id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    pub title: String,
    pub content: String,
    pub position: Point,
    pub size: Size,
    #[serde(rename = "type")]
    pub kind: NoteKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contextual_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contextual_id: Option<String>,
}

/// Query used on load to populate the note sets.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    /// Restrict to notes annotating this content item.
    pub content_id: Option<String>,
    /// Restrict to notes within this course.
    pub course_id: Option<String>,
    /// Also return other users' notes with `is_shared = true`.
    pub include_shared: bool,
    /// Drop shared notes anchored to this content (already shown locally).
    pub exclude_content_id: Option<String>,
}

/// Result of a `list` call: the caller's own notes plus, when requested,
/// the read-only shared overlay.
#[derive(Debug, Clone, Default)]
pub struct NoteBatch {
    pub notes: Vec<Note>,
    pub shared: Vec<Note>,
}

/// The four logical persistence operations. Implementations are free to use
/// any transport; the store never assumes more than these semantics.
#[allow(async_fn_in_trait)]
pub trait NoteService {
    /// Persist a new note and return the server's canonical record.
    ///
    /// # Errors
    ///
    /// Returns a `ServiceError` when the request fails or is rejected.
    async fn create(&self, draft: &NoteDraft) -> Result<Note, ServiceError>;

    /// Merge `fields` into an existing record and return the result.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids, or a transport/status error.
    async fn update(&self, id: &str, fields: &PartialNote) -> Result<Note, ServiceError>;

    /// Remove a record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids, or a transport/status error.
    async fn delete(&self, id: &str) -> Result<(), ServiceError>;

    /// Fetch the notes matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a `ServiceError` when the request fails.
    async fn list(&self, filter: &NoteFilter) -> Result<NoteBatch, ServiceError>;
}

// =============================================================================
// HTTP ADAPTER
// =============================================================================

#[derive(Debug, Deserialize)]
struct NoteEnvelope {
    note: Note,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    notes: Vec<Note>,
    #[serde(default, rename = "sharedNotes")]
    shared_notes: Vec<Note>,
}

/// [`NoteService`] over the backing REST API:
/// `GET/POST {base}/api/notes`, `PUT/DELETE {base}/api/notes/{id}`.
pub struct HttpNoteService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNoteService {
    /// Build a service rooted at `base_url` (no trailing slash).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp.text().await.unwrap_or_default();
        Err(ServiceError::Status { status: status.as_u16(), message })
    }
}

impl NoteService for HttpNoteService {
    async fn create(&self, draft: &NoteDraft) -> Result<Note, ServiceError> {
        let url = format!("{}/api/notes", self.base_url);
        let resp = self.client.post(&url).json(draft).send().await?;
        let body: NoteEnvelope = Self::check(resp).await?.json().await?;
        Ok(body.note)
    }

    async fn update(&self, id: &str, fields: &PartialNote) -> Result<Note, ServiceError> {
        let url = format!("{}/api/notes/{id}", self.base_url);
        let resp = self.client.put(&url).json(fields).send().await?;
        let body: NoteEnvelope = Self::check(resp).await?.json().await?;
        Ok(body.note)
    }

    async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let url = format!("{}/api/notes/{id}", self.base_url);
        let resp = self.client.delete(&url).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn list(&self, filter: &NoteFilter) -> Result<NoteBatch, ServiceError> {
        let url = format!("{}/api/notes", self.base_url);
        let mut req = self.client.get(&url);
        if let Some(ref content_id) = filter.content_id {
            req = req.query(&[("contentId", content_id.as_str())]);
        }
        if let Some(ref course_id) = filter.course_id {
            req = req.query(&[("courseId", course_id.as_str())]);
        }
        if filter.include_shared {
            req = req.query(&[("includeShared", "true")]);
        }
        if let Some(ref exclude) = filter.exclude_content_id {
            req = req.query(&[("excludeContentId", exclude.as_str())]);
        }
        let resp = req.send().await?;
        let body: ListEnvelope = Self::check(resp).await?.json().await?;
        Ok(NoteBatch { notes: body.notes, shared: body.shared_notes })
    }
}

// =============================================================================
// IN-MEMORY ADAPTER
// =============================================================================

/// Id-assigning in-memory [`NoteService`]. Used as the test double and by
/// hosts running without a backend. A failure toggle lets tests exercise
/// the store's optimistic-state recovery paths.
#[derive(Default)]
pub struct InMemoryNoteService {
    notes: Mutex<HashMap<String, Note>>,
    next_id: AtomicU64,
    failing: AtomicBool,
}

impl InMemoryNoteService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every subsequent call fails with a 503-style status error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of records currently persisted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Seed a record directly, bypassing id assignment.
    pub fn insert(&self, note: Note) {
        self.lock().insert(note.id.clone(), note);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Note>> {
        match self.notes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn gate(&self) -> Result<(), ServiceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::Status { status: 503, message: "service unavailable".to_owned() });
        }
        Ok(())
    }
}

impl NoteService for InMemoryNoteService {
    async fn create(&self, draft: &NoteDraft) -> Result<Note, ServiceError> {
        self.gate()?;
        let id = format!("note-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let note = Note {
            id: id.clone(),
            title: draft.title.clone(),
            content: draft.content.clone(),
            position: draft.position,
            size: draft.size,
            kind: draft.kind,
            contextual_text: draft.contextual_text.clone(),
            contextual_id: draft.contextual_id.clone(),
            is_shared: false,
            author_id: None,
            author_name: None,
            timestamp: 0,
            is_new: false,
        };
        self.lock().insert(id, note.clone());
        Ok(note)
    }

    async fn update(&self, id: &str, fields: &PartialNote) -> Result<Note, ServiceError> {
        self.gate()?;
        let mut notes = self.lock();
        let note = notes.get_mut(id).ok_or_else(|| ServiceError::NotFound(id.to_owned()))?;
        if let Some(ref title) = fields.title {
            note.title = title.clone();
        }
        if let Some(ref content) = fields.content {
            note.content = content.clone();
        }
        if let Some(position) = fields.position {
            note.position = position;
        }
        if let Some(size) = fields.size {
            note.size = size;
        }
        if let Some(kind) = fields.kind {
            note.kind = kind;
        }
        if let Some(ref text) = fields.contextual_text {
            note.contextual_text = Some(text.clone());
        }
        if let Some(ref ctx_id) = fields.contextual_id {
            note.contextual_id = Some(ctx_id.clone());
        }
        if let Some(is_shared) = fields.is_shared {
            note.is_shared = is_shared;
        }
        Ok(note.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.gate()?;
        self.lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound(id.to_owned()))
    }

    async fn list(&self, filter: &NoteFilter) -> Result<NoteBatch, ServiceError> {
        self.gate()?;
        // Records carrying an author belong to "other users"; they only
        // surface through the shared overlay.
        let notes = self.lock();
        let mut own: Vec<Note> = notes.values().filter(|n| n.author_id.is_none()).cloned().collect();
        own.sort_by(|a, b| a.id.cmp(&b.id));
        let mut shared = Vec::new();
        if filter.include_shared {
            shared = notes
                .values()
                .filter(|n| n.is_shared && n.author_id.is_some())
                .cloned()
                .collect();
            shared.sort_by(|a, b| a.id.cmp(&b.id));
        }
        Ok(NoteBatch { notes: own, shared })
    }
}
