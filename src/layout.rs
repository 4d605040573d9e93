//! Layout engines: assign positions to graph nodes.
//!
//! Engines are selected by name through a [`LayoutRegistry`]; unknown names
//! fall back to the layered engine.

mod engine;
mod grid;
mod hierarchical;
mod ordering;
mod placement;
mod ranking;
mod types;

pub use engine::{DEFAULT_ENGINE, LayoutEngine, LayoutRegistry, layout_graph};
pub use grid::GridLayout;
pub use hierarchical::HierarchicalLayout;
pub use types::{Direction, LayoutOptions, ParseDirectionError};
