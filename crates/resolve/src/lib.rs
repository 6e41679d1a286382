//! `incimap-resolve` — Incident coordinate resolution engine.
//!
//! Pure engine crate: receives pre-loaded incident and registry tables,
//! returns the incidents enriched with coordinates plus a resolution report.
//! No CLI dependencies; file access belongs to the caller.

pub mod config;
pub mod error;
pub mod exact;
pub mod fuzzy;
pub mod loader;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod similarity;
pub mod table;

pub use config::ResolveConfig;
pub use error::ResolveError;
pub use model::{MatchResult, MatchSource, PipelineState, Resolution, ResolutionReport};
pub use pipeline::resolve;
pub use table::Table;
