//! Shared numeric constants for the note canvas.

// ── Note geometry ───────────────────────────────────────────────

/// Minimum note width in pixels; resize clamps here.
pub const MIN_NOTE_WIDTH: f64 = 200.0;

/// Maximum note width in pixels; resize clamps here.
pub const MAX_NOTE_WIDTH: f64 = 600.0;

/// Minimum note height in pixels.
pub const MIN_NOTE_HEIGHT: f64 = 150.0;

/// Maximum note height in pixels.
pub const MAX_NOTE_HEIGHT: f64 = 500.0;

/// Width of a freshly created note.
pub const DEFAULT_NOTE_WIDTH: f64 = 280.0;

/// Height of a freshly created note.
pub const DEFAULT_NOTE_HEIGHT: f64 = 200.0;

// ── Placement ───────────────────────────────────────────────────

/// Step between candidate positions in the placement grid scan.
pub const PLACEMENT_GRID_STEP: f64 = 40.0;

/// Minimum clearance between a placed note and its neighbours.
pub const PLACEMENT_MARGIN: f64 = 10.0;

/// Gap kept between any auto-placed note and the container edges.
pub const CONTAINER_MARGIN: f64 = 20.0;

/// Container size assumed before the host reports real dimensions.
pub const DEFAULT_CONTAINER_WIDTH: f64 = 1200.0;
pub const DEFAULT_CONTAINER_HEIGHT: f64 = 800.0;

// ── Notes ───────────────────────────────────────────────────────

/// Upper bound on note content length, matching the server's limit.
pub const MAX_CONTENT_LEN: usize = 2000;

/// Title assigned to notes created without one.
pub const DEFAULT_NOTE_TITLE: &str = "Untitled Note";

/// Id prefix marking a note that has never been persisted.
pub const TEMP_ID_PREFIX: &str = "temp-";
