//! Core engine for a floating-note annotation canvas.
//!
//! This crate owns the non-visual half of a free-form note surface: the note
//! collections and their persistence contract, collision-avoiding placement
//! of new notes, and the drag/resize gesture state machine. The host shell
//! (a browser front-end or a native widget tree) is responsible only for
//! wiring pointer events into [`input::GestureController`], rendering the
//! widgets produced by [`surface::CanvasSurface`], and awaiting the
//! persistence calls requested via [`input::Action`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`note`] | Note records, kinds, templates, and sparse updates |
//! | [`geometry`] | Rectangle math, grid-scan placement, boundary clamping |
//! | [`store`] | Note collections and the optimistic-persistence pipeline |
//! | [`input`] | Drag/resize gesture state machine |
//! | [`surface`] | Render view-model: widgets, editing, notices, overlays |
//! | [`remote`] | The note-persistence collaborator and its HTTP adapter |
//! | [`consts`] | Shared numeric constants (size clamps, grid step, margins) |

pub mod consts;
pub mod geometry;
pub mod input;
pub mod note;
pub mod remote;
pub mod store;
pub mod surface;
