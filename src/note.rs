//! Note records: the core entity, its kinds, creation templates, and the
//! sparse-update type used on the wire.
//!
//! A note's identity is a string id. Ids carrying the `temp-` prefix belong
//! to notes created locally and never persisted; any other id was assigned
//! by the server. On first successful save the temp entry is replaced in
//! place by the persisted record, reconciled by matching the old id.

#[cfg(test)]
#[path = "note_test.rs"]
mod note_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{
    DEFAULT_NOTE_HEIGHT, DEFAULT_NOTE_TITLE, DEFAULT_NOTE_WIDTH, MAX_NOTE_HEIGHT, MAX_NOTE_WIDTH, MIN_NOTE_HEIGHT,
    MIN_NOTE_WIDTH, TEMP_ID_PREFIX,
};
use crate::geometry::{Point, Rect, Size};

/// Classification tag for a note. Presentation only — kind never affects
/// geometry or placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Question,
    Important,
    Todo,
    Summary,
    Idea,
    /// Free-standing note with no template and no source anchor.
    #[default]
    Floating,
    /// Note anchored to a text selection in the underlying content.
    Contextual,
}

/// A note as held in the store and sent on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// String identifier; `temp-` prefix means not yet persisted.
    pub id: String,
    /// Short display title.
    #[serde(default = "default_title")]
    pub title: String,
    /// Plain text with optional `**bold**` / `*italic*` markers.
    #[serde(default)]
    pub content: String,
    /// Top-left corner relative to the canvas container.
    pub position: Point,
    /// Width/height in pixels, within the configured clamps.
    pub size: Size,
    /// Classification tag.
    #[serde(default, rename = "type")]
    pub kind: NoteKind,
    /// Source text this note annotates, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contextual_text: Option<String>,
    /// Id of the annotated source fragment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contextual_id: Option<String>,
    /// Visible to other users of the same course when true.
    #[serde(default)]
    pub is_shared: bool,
    /// User who owns the note, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    /// Display name of the author, populated on shared notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    /// Creation/update time in epoch milliseconds.
    #[serde(default)]
    pub timestamp: i64,
    /// True until the first successful save.
    #[serde(default, skip_serializing)]
    pub is_new: bool,
}

fn default_title() -> String {
    DEFAULT_NOTE_TITLE.to_owned()
}

impl Note {
    /// Build a local, unpersisted note at `position` with default size.
    #[must_use]
    pub fn new_local(position: Point, kind: NoteKind, content: String) -> Self {
        Self {
            id: temp_id(),
            title: default_title(),
            content,
            position,
            size: Size::new(DEFAULT_NOTE_WIDTH, DEFAULT_NOTE_HEIGHT),
            kind,
            contextual_text: None,
            contextual_id: None,
            is_shared: false,
            author_id: None,
            author_name: None,
            timestamp: 0,
            is_new: true,
        }
    }

    /// The note's bounding rectangle in container coordinates.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_origin(self.position, self.size)
    }

    /// Whether this note has a server-assigned id.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        !self.id.starts_with(TEMP_ID_PREFIX)
    }
}

/// Allocate a fresh temporary id.
#[must_use]
pub fn temp_id() -> String {
    format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4())
}

/// Clamp a size to the allowed note dimensions.
#[must_use]
pub fn clamp_size(size: Size) -> Size {
    Size {
        width: size.width.clamp(MIN_NOTE_WIDTH, MAX_NOTE_WIDTH),
        height: size.height.clamp(MIN_NOTE_HEIGHT, MAX_NOTE_HEIGHT),
    }
}

/// Quick-creation template: a kind plus the content it seeds.
#[derive(Debug, Clone)]
pub struct NoteTemplate {
    pub kind: NoteKind,
    pub seed_content: &'static str,
}

/// Templates offered by the creation panel, one per tagged kind.
pub const NOTE_TEMPLATES: [NoteTemplate; 5] = [
    NoteTemplate { kind: NoteKind::Question, seed_content: "Question: " },
    NoteTemplate { kind: NoteKind::Important, seed_content: "Important: " },
    NoteTemplate { kind: NoteKind::Todo, seed_content: "Todo: " },
    NoteTemplate { kind: NoteKind::Summary, seed_content: "Summary: " },
    NoteTemplate { kind: NoteKind::Idea, seed_content: "Idea: " },
];

/// Sparse update for a note. Only present fields are sent and applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialNote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<NoteKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contextual_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contextual_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_shared: Option<bool>,
}

impl PartialNote {
    /// Sparse update carrying every client-owned field of `note`, the shape
    /// sent by `save_note` for an already-persisted record.
    #[must_use]
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: Some(note.title.clone()),
            content: Some(note.content.clone()),
            position: Some(note.position),
            size: Some(note.size),
            kind: Some(note.kind),
            contextual_text: note.contextual_text.clone(),
            contextual_id: note.contextual_id.clone(),
            is_shared: Some(note.is_shared),
        }
    }
}
