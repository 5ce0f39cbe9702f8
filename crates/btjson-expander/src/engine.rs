//! The engine: rules, default variants, options and the shared library.

use std::cell::Cell;

use btjson_core::{ExpandError, Node};
use tracing::debug;

use crate::expander::{self, Session};
use crate::registry::{IntoSelectors, RuleId, RuleRegistry, RuleResult};
use crate::{Context, EngineOptions, Library};

/// A BtJson expansion engine.
///
/// Rules and default variants are registered up front; [`Engine::expand`]
/// then rewrites trees until no rule applies.
#[derive(Debug, Default)]
pub struct Engine {
    registry: RuleRegistry,
    options: EngineOptions,
    library: Library,
    /// Counter behind [`Context::generate_id`]; monotonic for the engine's lifetime.
    next_id: Cell<u64>,
}

impl Engine {
    /// Create an engine with default options and no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the given options.
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// The current options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Replace the options.
    pub fn set_options(&mut self, options: EngineOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Turn the divergence guard on or off.
    pub fn enable_divergence_guard(&mut self, enable: bool) -> &mut Self {
        self.options.divergence_guard = enable;
        self
    }

    /// Register a rule. See [`RuleRegistry::register`].
    pub fn register_rule<F>(&mut self, selectors: impl IntoSelectors, transform: F) -> RuleId
    where
        F: Fn(&mut Context<'_>) -> RuleResult + 'static,
    {
        self.registry.register(selectors, transform)
    }

    /// Variant used by nodes of `component` that neither set nor inherit one.
    pub fn set_default_variant(
        &mut self,
        component: impl Into<String>,
        variant: impl Into<String>,
    ) -> &mut Self {
        self.registry.set_default_variant(component, variant);
        self
    }

    /// The default variant registered for `component`.
    pub fn default_variant(&self, component: &str) -> Option<&str> {
        self.registry.default_variant(component)
    }

    /// The registered rules.
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// The shared library rules read from.
    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Mutable access to the library, for populating it before expansion.
    pub fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    /// Expand `root` until no rule changes it.
    ///
    /// Rule-application bookkeeping is scoped to this call.
    pub fn expand(&self, root: Node) -> Result<Node, ExpandError> {
        debug!(rules = self.registry.len(), "expanding tree");
        let mut session = Session::default();
        expander::process(self, &mut session, root, None, false).map(|pass| pass.tree)
    }

    /// Next identifier, `<id_prefix><n>`.
    pub(crate) fn generate_id(&self) -> String {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        format!("{}{}", self.options.id_prefix, id)
    }
}
