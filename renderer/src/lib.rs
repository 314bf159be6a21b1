//! Resolves the latest commenter of a SharePoint list row and renders it into
//! the row's cell.
//!
//! The host calls [`render::RenderStateController::render_cell`] once per row
//! per render pass. Identifier resolution and cache lookups happen
//! synchronously; cache misses show a loading marker and resolve on a Tokio
//! task.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fetchers;
pub mod identifier;
pub mod logging;
pub mod pipeline;
pub mod render;

pub use last_commenter_shared::{
    markup, AdministratorPair, Annotation, CellState, PayloadStyle, ResolvedPayload, RowId,
};
