//! Scrollytelling data binding.
//!
//! A pure, stateless transform from a declarative [`Scene`] and a record set
//! into concrete visualization inputs. Every number keeps its provenance:
//! the records that produced it, so a reader can click through to sources.

mod binding;
mod coerce;
mod filter;
mod scene;

pub use binding::{DataBinding, Group, ResolvedBinding, resolve_data_binding};
pub use coerce::{to_js_string, to_number};
pub use filter::{Filter, FilterClause, RangeClause, apply_filter, matches_filter};
pub use scene::{ResolvedScene, Scene, Visualization, VisualizationKind, resolve_scene};

/// One row of data: a JSON object.
pub type Record = serde_json::Map<String, serde_json::Value>;
