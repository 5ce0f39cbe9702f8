//! Rule-driven expansion of BtJson trees.
//!
//! This crate handles:
//! - Rule registration keyed by selector
//! - Default variants per component
//! - The mutation context handed to each rule
//! - Breadth-first fixpoint expansion with divergence detection

mod context;
mod engine;
mod expander;
mod library;
mod options;
mod registry;

pub use context::Context;
pub use engine::Engine;
pub use library::Library;
pub use options::EngineOptions;
pub use registry::{IntoSelectors, RuleId, RuleRegistry, RuleResult, Transform};

use btjson_core::{ExpandError, Node};

/// Expand a tree with the rules registered on `engine`.
pub fn expand(engine: &Engine, root: Node) -> Result<Node, ExpandError> {
    engine.expand(root)
}
