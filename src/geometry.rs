//! Rectangle math, collision-avoiding placement, and boundary clamping.
//!
//! Everything here is pure and synchronous; placement and clamping run
//! inside pointer-move handlers, so they must stay cheap. The grid scan is
//! O(rows × cols × existing notes), which is fine for the tens of notes a
//! canvas realistically holds.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::CONTAINER_MARGIN;

/// A position in container-relative pixels (origin at the top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    /// Build a rectangle from a top-left origin and a size.
    #[must_use]
    pub fn from_origin(origin: Point, size: Size) -> Self {
        Self {
            left: origin.x,
            top: origin.y,
            right: origin.x + size.width,
            bottom: origin.y + size.height,
        }
    }
}

/// Whether two rectangles intersect once each is inflated by `margin` on
/// every side. A zero margin is a plain AABB overlap test.
#[must_use]
pub fn rects_overlap(a: Rect, b: Rect, margin: f64) -> bool {
    !(a.right + margin < b.left
        || a.left - margin > b.right
        || a.bottom + margin < b.top
        || a.top - margin > b.bottom)
}

/// Find a position for a new note that avoids every rectangle in `existing`.
///
/// Candidate top-left positions are scanned row-major from the container's
/// top-left at `grid_step` increments, keeping [`CONTAINER_MARGIN`] clear of
/// the container edges. The first candidate whose rectangle clears every
/// existing rectangle by `margin` wins. When the whole grid is occupied the
/// note is dropped at a uniformly-random in-bounds position instead — a
/// crowded canvas is not an error.
#[must_use]
pub fn find_placement(existing: &[Rect], container: Size, note: Size, grid_step: f64, margin: f64) -> Point {
    let mut y = CONTAINER_MARGIN;
    while y < container.height - note.height - CONTAINER_MARGIN {
        let mut x = CONTAINER_MARGIN;
        while x < container.width - note.width - CONTAINER_MARGIN {
            let candidate = Rect::from_origin(Point::new(x, y), note);
            if !existing.iter().any(|r| rects_overlap(candidate, *r, margin)) {
                return Point::new(x, y);
            }
            x += grid_step;
        }
        y += grid_step;
    }

    random_placement(container, note)
}

/// Uniformly-random position keeping the note inside the container, used
/// when the grid scan finds no free cell.
fn random_placement(container: Size, note: Size) -> Point {
    let span_x = container.width - note.width - CONTAINER_MARGIN * 2.0;
    let span_y = container.height - note.height - CONTAINER_MARGIN * 2.0;
    let mut rng = rand::rng();
    Point {
        x: if span_x > 0.0 { rng.random_range(0.0..span_x) + CONTAINER_MARGIN } else { 0.0 },
        y: if span_y > 0.0 { rng.random_range(0.0..span_y) + CONTAINER_MARGIN } else { 0.0 },
    }
}

/// Clamp a note's top-left position so its rectangle stays fully inside the
/// container: `0 ≤ x ≤ container.width − size.width`, and likewise for y.
#[must_use]
pub fn clamp_to_container(pos: Point, size: Size, container: Size) -> Point {
    Point {
        x: pos.x.clamp(0.0, (container.width - size.width).max(0.0)),
        y: pos.y.clamp(0.0, (container.height - size.height).max(0.0)),
    }
}
