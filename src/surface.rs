//! Canvas view-model: widgets, edit sessions, notices, overlays.
//!
//! Everything here is presentation state layered over the store. The
//! surface never talks to the network itself; `commit_edit` hands back an
//! [`Action::SaveRequested`] for the host to await, the same contract the
//! gesture controller uses. The active note id is purely visual (stacking
//! and highlight) and is dropped silently when its note disappears.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use crate::geometry::{Point, Size};
use crate::input::{self, Action};
use crate::note::{Note, NoteKind};
use crate::store::NoteStore;

/// Severity of a dismissible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A transient message shown to the user until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
}

/// The overlays the surface can show. At most one is open at a time;
/// opening a second closes the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    /// Quick-create menu listing the note templates.
    TemplatePicker,
    /// Per-note action menu (share, hide, delete).
    NoteMenu { note_id: String },
}

/// Owner of the single open overlay.
#[derive(Debug, Default)]
pub struct OverlayManager {
    current: Option<Overlay>,
}

impl OverlayManager {
    /// Open `overlay`, replacing whatever was open before.
    pub fn open(&mut self, overlay: Overlay) {
        self.current = Some(overlay);
    }

    pub fn close(&mut self) {
        self.current = None;
    }

    #[must_use]
    pub fn current(&self) -> Option<&Overlay> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }
}

/// In-progress content edit on one note. The draft lives here; the store
/// is only written on commit, or on cancel to restore the captured text.
#[derive(Debug, Clone)]
struct EditSession {
    id: String,
    draft: String,
    original: String,
}

/// Render-ready description of one floating note.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteWidget {
    pub id: String,
    pub title: String,
    pub kind: NoteKind,
    pub position: Point,
    pub size: Size,
    /// Content with inline `**`/`*` markers rendered to HTML.
    pub html: String,
    /// `"W × H"` readout for the resize indicator.
    pub size_label: String,
    pub shared: bool,
    pub author_name: Option<String>,
    /// Highlighted and stacked on top.
    pub active: bool,
    /// False for shared notes authored by someone else; the host must not
    /// attach drag/resize/edit handlers to these.
    pub interactive: bool,
    /// An edit session is open on this note.
    pub editing: bool,
}

/// Presentation state for the floating-note canvas.
#[derive(Debug, Default)]
pub struct CanvasSurface {
    pub overlays: OverlayManager,
    active: Option<String>,
    edit: Option<EditSession>,
    notices: Vec<Notice>,
    next_notice_id: u64,
}

impl CanvasSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Active note ---

    /// Mark `id` as the active note. Clears with `None`.
    pub fn set_active(&mut self, id: Option<&str>) {
        self.active = id.map(str::to_owned);
    }

    #[must_use]
    pub fn active_note(&self) -> Option<&str> {
        self.active.as_deref()
    }

    // --- Edit sessions ---

    /// Open an edit session on an owned note, capturing its current content
    /// so a cancel can restore it. Refused for unknown or foreign notes and
    /// while another session is open.
    pub fn begin_edit<S>(&mut self, store: &NoteStore<S>, id: &str) -> bool {
        if self.edit.is_some() {
            return false;
        }
        let Some(note) = store.get_own(id) else {
            return false;
        };
        self.edit = Some(EditSession {
            id: id.to_owned(),
            draft: note.content.clone(),
            original: note.content.clone(),
        });
        self.active = Some(id.to_owned());
        true
    }

    /// Replace the session draft with the latest textarea contents.
    pub fn update_draft(&mut self, text: &str) -> bool {
        let Some(session) = self.edit.as_mut() else {
            return false;
        };
        session.draft = text.to_owned();
        true
    }

    #[must_use]
    pub fn draft(&self) -> Option<&str> {
        self.edit.as_ref().map(|s| s.draft.as_str())
    }

    /// The note an edit session is open on, if any.
    #[must_use]
    pub fn editing(&self) -> Option<&str> {
        self.edit.as_ref().map(|s| s.id.as_str())
    }

    /// Write the draft into the store and request persistence. A session
    /// whose note vanished mid-edit is dropped without effect.
    pub fn commit_edit<S>(&mut self, store: &mut NoteStore<S>) -> Action {
        let Some(session) = self.edit.take() else {
            return Action::None;
        };
        if !store.set_content(&session.id, &session.draft) {
            return Action::None;
        }
        Action::SaveRequested { id: session.id }
    }

    /// Escape: drop the session and put the captured content back, leaving
    /// the note exactly as it was when editing began. Geometry is untouched.
    pub fn cancel_edit<S>(&mut self, store: &mut NoteStore<S>) {
        if let Some(session) = self.edit.take() {
            store.set_content(&session.id, &session.original);
        }
    }

    // --- Notices ---

    /// Queue a dismissible notice and return its id.
    pub fn push_notice(&mut self, kind: NoticeKind, message: &str) -> u64 {
        let id = self.next_notice_id;
        self.next_notice_id += 1;
        self.notices.push(Notice { id, kind, message: message.to_owned() });
        id
    }

    /// Dismiss a notice by id. Returns false if it was already gone.
    pub fn dismiss_notice(&mut self, id: u64) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    // --- Rendering ---

    /// Build widgets for the floating set in stacking order, the active
    /// note moved on top. The stale active id is cleared as a side effect.
    pub fn widgets<S>(&mut self, store: &NoteStore<S>) -> Vec<NoteWidget> {
        if self.active.as_deref().is_some_and(|id| store.get(id).is_none()) {
            self.active = None;
        }
        let user = store.user_id();
        let mut widgets: Vec<NoteWidget> =
            store.floating_notes().into_iter().map(|note| self.widget_for(note, user)).collect();
        if let Some(active) = &self.active {
            if let Some(idx) = widgets.iter().position(|w| &w.id == active) {
                let top = widgets.remove(idx);
                widgets.push(top);
            }
        }
        widgets
    }

    fn widget_for(&self, note: &Note, user: Option<&str>) -> NoteWidget {
        NoteWidget {
            id: note.id.clone(),
            title: note.title.clone(),
            kind: note.kind,
            position: note.position,
            size: note.size,
            html: format_content(&note.content),
            size_label: size_label(note.size),
            shared: note.is_shared,
            author_name: note.author_name.clone(),
            active: self.active.as_deref() == Some(note.id.as_str()),
            interactive: input::is_interactive(note, user),
            editing: self.editing() == Some(note.id.as_str()),
        }
    }
}

/// Saved and shared notes matching a search string and optional kind,
/// newest first with the user's own notes ahead of the shared overlay.
/// The search is case-insensitive over title and content; empty matches all.
#[must_use]
pub fn filtered_notes<'a, S>(store: &'a NoteStore<S>, search: &str, kind: Option<NoteKind>) -> Vec<&'a Note> {
    let needle = search.to_lowercase();
    let matches = |note: &Note| {
        if let Some(k) = kind {
            if note.kind != k {
                return false;
            }
        }
        needle.is_empty()
            || note.title.to_lowercase().contains(&needle)
            || note.content.to_lowercase().contains(&needle)
    };
    let mut out: Vec<&Note> = store.saved_notes().into_iter().filter(|n| matches(n)).collect();
    out.extend(store.shared_notes().into_iter().filter(|n| matches(n)));
    out
}

/// Render the lightweight inline markers to HTML: `**text**` becomes
/// `<strong>text</strong>` and `*text*` becomes `<em>text</em>`. The raw
/// content is HTML-escaped first, so note text can never inject markup.
#[must_use]
pub fn format_content(content: &str) -> String {
    let escaped = escape_html(content);
    let bold = wrap_pairs(&escaped, "**", "strong");
    wrap_pairs(&bold, "*", "em")
}

/// `"280 × 200"` style label, dimensions rounded to whole pixels.
#[must_use]
pub fn size_label(size: Size) -> String {
    format!("{} × {}", size.width.round(), size.height.round())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap each delimiter pair in `<tag>..</tag>`, shortest match first.
/// An unpaired trailing delimiter is left as literal text, and adjacent
/// delimiters enclosing nothing are not treated as a pair.
fn wrap_pairs(text: &str, marker: &str, tag: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some(start) = rest.find(marker) else {
            out.push_str(rest);
            return out;
        };
        let after = &rest[start + marker.len()..];
        let Some(end) = after.find(marker) else {
            out.push_str(rest);
            return out;
        };
        if end == 0 {
            // Zero-length span, e.g. the two stars of a leftover `**`
            // reaching the italic pass. Emit one marker literally and
            // rescan from the next.
            out.push_str(&rest[..start + marker.len()]);
            rest = after;
            continue;
        }
        out.push_str(&rest[..start]);
        out.push('<');
        out.push_str(tag);
        out.push('>');
        out.push_str(&after[..end]);
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
        rest = &after[end + marker.len()..];
    }
}
