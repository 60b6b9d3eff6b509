//! Drag/resize gesture state machine.
//!
//! A single [`Gesture`] token tracks the active manipulation, so drag and
//! resize are mutually exclusive by construction and at most one note is
//! manipulated at a time. Handlers are synchronous and infallible: they
//! write transient geometry into the store on every pointer-move and, on
//! gesture end, hand the host an [`Action::SaveRequested`] to drive the
//! asynchronous persistence call. Every handler re-checks that the target
//! note still exists before touching it — a note deleted mid-gesture
//! (by a collaborator, say) aborts the gesture cleanly instead of
//! resurrecting stale geometry.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::consts::{MAX_NOTE_HEIGHT, MAX_NOTE_WIDTH, MIN_NOTE_HEIGHT, MIN_NOTE_WIDTH};
use crate::geometry::{Point, Size};
use crate::note::Note;
use crate::store::NoteStore;

/// Which of the eight border handles a resize was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    /// Parse a handle name such as `"nw"` or `"e"`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "n" => Some(Self::N),
            "ne" => Some(Self::Ne),
            "e" => Some(Self::E),
            "se" => Some(Self::Se),
            "s" => Some(Self::S),
            "sw" => Some(Self::Sw),
            "w" => Some(Self::W),
            "nw" => Some(Self::Nw),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::N => "n",
            Self::Ne => "ne",
            Self::E => "e",
            Self::Se => "se",
            Self::S => "s",
            Self::Sw => "sw",
            Self::W => "w",
            Self::Nw => "nw",
        }
    }

    #[must_use]
    pub fn has_north(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    #[must_use]
    pub fn has_south(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    #[must_use]
    pub fn has_east(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    #[must_use]
    pub fn has_west(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }
}

/// The active gesture, carrying the context captured at pointer-down.
#[derive(Debug, Clone, Default)]
pub enum Gesture {
    /// No manipulation in progress.
    #[default]
    Idle,
    /// A note is following the pointer.
    Dragging {
        /// Id of the note being dragged.
        id: String,
        /// Pointer offset from the note's top-left corner at grab time.
        grab_offset: Point,
    },
    /// A note is being resized from one of its handles.
    Resizing {
        /// Id of the note being resized.
        id: String,
        /// Which handle is being dragged.
        anchor: ResizeAnchor,
        /// Pointer position at the start of the resize.
        start_pointer: Point,
        /// Note position at the start of the resize.
        orig_position: Point,
        /// Note size at the start of the resize.
        orig_size: Size,
    },
}

impl Gesture {
    /// The note engaged by this gesture, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Gesture::Idle => None,
            Gesture::Dragging { id, .. } | Gesture::Resizing { id, .. } => Some(id),
        }
    }
}

/// What the host must do after a pointer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing — the event did not apply.
    None,
    /// Transient geometry changed; redraw the canvas.
    RenderNeeded,
    /// A gesture committed; await `store.save_note(id)` and surface any
    /// failure as a notice.
    SaveRequested { id: String },
}

/// Pointer-event entry points for the canvas host.
#[derive(Debug, Default)]
pub struct GestureController {
    gesture: Gesture,
    size_indicator: Option<Size>,
}

impl GestureController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Queries ---

    #[must_use]
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, Gesture::Idle)
    }

    /// Id of the note currently being dragged, if any.
    #[must_use]
    pub fn drag_target(&self) -> Option<&str> {
        match &self.gesture {
            Gesture::Dragging { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Id of the note currently being resized, if any.
    #[must_use]
    pub fn resize_target(&self) -> Option<&str> {
        match &self.gesture {
            Gesture::Resizing { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Live width × height readout shown while a resize is in progress.
    #[must_use]
    pub fn size_indicator(&self) -> Option<Size> {
        self.size_indicator
    }

    // --- Gesture entry ---

    /// Pointer-down on a note's header: begin dragging it. Refused while
    /// another gesture is active or when the note is unknown or foreign.
    pub fn on_note_grab<S>(&mut self, store: &NoteStore<S>, id: &str, pointer: Point) -> Action {
        if !self.is_idle() {
            return Action::None;
        }
        let Some(note) = store.get_own(id) else {
            return Action::None;
        };
        let grab_offset = Point::new(pointer.x - note.position.x, pointer.y - note.position.y);
        self.gesture = Gesture::Dragging { id: id.to_owned(), grab_offset };
        Action::RenderNeeded
    }

    /// Pointer-down on a resize handle: begin resizing. Refused while any
    /// gesture (drag included) is active.
    pub fn on_resize_grab<S>(&mut self, store: &NoteStore<S>, id: &str, anchor: ResizeAnchor, pointer: Point) -> Action {
        if !self.is_idle() {
            return Action::None;
        }
        let Some(note) = store.get_own(id) else {
            return Action::None;
        };
        self.gesture = Gesture::Resizing {
            id: id.to_owned(),
            anchor,
            start_pointer: pointer,
            orig_position: note.position,
            orig_size: note.size,
        };
        self.size_indicator = Some(note.size);
        Action::RenderNeeded
    }

    // --- Pointer tracking ---

    /// Pointer-move. `primary_down` mirrors the button bitmask: when the
    /// primary button was released without a pointer-up reaching us, the
    /// gesture finishes here exactly as on pointer-up.
    pub fn on_pointer_move<S>(&mut self, store: &mut NoteStore<S>, pointer: Point, primary_down: bool) -> Action {
        match self.gesture.clone() {
            Gesture::Idle => Action::None,
            Gesture::Dragging { id, grab_offset } => {
                if store.get_own(&id).is_none() {
                    self.reset();
                    return Action::None;
                }
                apply_drag(store, &id, grab_offset, pointer);
                if primary_down {
                    Action::RenderNeeded
                } else {
                    self.finish(id)
                }
            }
            Gesture::Resizing { id, anchor, start_pointer, orig_position, orig_size } => {
                if store.get_own(&id).is_none() {
                    self.reset();
                    return Action::None;
                }
                let (position, size) = resize_from(anchor, orig_position, orig_size, start_pointer, pointer);
                store.apply_geometry(&id, position, size);
                self.size_indicator = Some(size);
                if primary_down {
                    Action::RenderNeeded
                } else {
                    self.finish(id)
                }
            }
        }
    }

    /// Pointer-up: commit the gesture's final geometry and request a save.
    /// The target is re-checked at commit time; a vanished note aborts
    /// silently.
    pub fn on_pointer_up<S>(&mut self, store: &mut NoteStore<S>, pointer: Point) -> Action {
        match self.gesture.clone() {
            Gesture::Idle => Action::None,
            Gesture::Dragging { id, grab_offset } => {
                if store.get_own(&id).is_none() {
                    self.reset();
                    return Action::None;
                }
                apply_drag(store, &id, grab_offset, pointer);
                self.finish(id)
            }
            Gesture::Resizing { id, anchor, start_pointer, orig_position, orig_size } => {
                if store.get_own(&id).is_none() {
                    self.reset();
                    return Action::None;
                }
                let (position, size) = resize_from(anchor, orig_position, orig_size, start_pointer, pointer);
                store.apply_geometry(&id, position, size);
                self.finish(id)
            }
        }
    }

    /// Drop the active gesture without committing (e.g. pointer capture
    /// torn down by the host).
    pub fn cancel(&mut self) {
        self.reset();
    }

    fn finish(&mut self, id: String) -> Action {
        self.reset();
        Action::SaveRequested { id }
    }

    fn reset(&mut self) {
        self.gesture = Gesture::Idle;
        self.size_indicator = None;
    }
}

fn apply_drag<S>(store: &mut NoteStore<S>, id: &str, grab_offset: Point, pointer: Point) {
    let size = store.get_own(id).map_or_else(|| Size::new(0.0, 0.0), |n| n.size);
    let candidate = Point::new(pointer.x - grab_offset.x, pointer.y - grab_offset.y);
    // apply_geometry clamps against the container.
    store.apply_geometry(id, candidate, size);
}

/// Resize math: apply the pointer delta along the anchor's active axes.
/// Width/height clamp to the note bounds; west/north anchors shift the
/// position so the right/bottom edge stays fixed.
fn resize_from(
    anchor: ResizeAnchor,
    orig_position: Point,
    orig_size: Size,
    start_pointer: Point,
    pointer: Point,
) -> (Point, Size) {
    let dx = pointer.x - start_pointer.x;
    let dy = pointer.y - start_pointer.y;

    let mut width = orig_size.width;
    let mut height = orig_size.height;
    let mut x = orig_position.x;
    let mut y = orig_position.y;

    if anchor.has_east() {
        width = (orig_size.width + dx).clamp(MIN_NOTE_WIDTH, MAX_NOTE_WIDTH);
    }
    if anchor.has_west() {
        width = (orig_size.width - dx).clamp(MIN_NOTE_WIDTH, MAX_NOTE_WIDTH);
        x = orig_position.x + (orig_size.width - width);
    }
    if anchor.has_south() {
        height = (orig_size.height + dy).clamp(MIN_NOTE_HEIGHT, MAX_NOTE_HEIGHT);
    }
    if anchor.has_north() {
        height = (orig_size.height - dy).clamp(MIN_NOTE_HEIGHT, MAX_NOTE_HEIGHT);
        y = orig_position.y + (orig_size.height - height);
    }

    (Point::new(x, y), Size::new(width, height))
}

/// Whether `note` may be manipulated by the current user (shared notes
/// authored by someone else are read-only overlays).
#[must_use]
pub fn is_interactive(note: &Note, current_user: Option<&str>) -> bool {
    match (&note.author_id, current_user) {
        (None, _) => true,
        (Some(author), Some(user)) => author == user,
        (Some(_), None) => false,
    }
}
