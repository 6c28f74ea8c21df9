pub mod catalog;
pub mod hierarchy;
pub mod id;
pub mod layout;
pub mod model;
pub mod visibility;

pub use catalog::{Catalog, parse_label};
pub use hierarchy::{HierarchyError, build_tree, build_tree_from_str};
pub use id::NodeId;
pub use layout::{LayoutConfig, LayoutResult, Placement, PlacementRules, ViewBox, layout_tree};
pub use model::*;

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
