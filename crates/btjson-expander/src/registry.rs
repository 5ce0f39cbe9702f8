//! Rule registry for storing and looking up rewrite rules.

use std::collections::HashMap;
use std::fmt;

use btjson_core::{ExpandError, Node, SelectorKey};

use crate::Context;

/// What a rule returns: `Ok(Some(node))` replaces the current node,
/// `Ok(None)` keeps it.
pub type RuleResult = Result<Option<Node>, ExpandError>;

/// A rewrite rule body.
pub type Transform = dyn Fn(&mut Context<'_>) -> RuleResult;

/// Identity of a registered rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u32);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule{}", self.0)
    }
}

/// Anything accepted as the selector list of a rule.
pub trait IntoSelectors {
    fn into_selectors(self) -> Vec<SelectorKey>;
}

impl IntoSelectors for &str {
    fn into_selectors(self) -> Vec<SelectorKey> {
        SelectorKey::interpretations(self)
    }
}

impl IntoSelectors for String {
    fn into_selectors(self) -> Vec<SelectorKey> {
        SelectorKey::interpretations(&self)
    }
}

impl IntoSelectors for SelectorKey {
    fn into_selectors(self) -> Vec<SelectorKey> {
        vec![self]
    }
}

impl<S: AsRef<str>> IntoSelectors for &[S] {
    fn into_selectors(self) -> Vec<SelectorKey> {
        self.iter().flat_map(|s| SelectorKey::interpretations(s.as_ref())).collect()
    }
}

impl<S: AsRef<str>, const N: usize> IntoSelectors for [S; N] {
    fn into_selectors(self) -> Vec<SelectorKey> {
        self.iter().flat_map(|s| SelectorKey::interpretations(s.as_ref())).collect()
    }
}

impl<S: AsRef<str>> IntoSelectors for Vec<S> {
    fn into_selectors(self) -> Vec<SelectorKey> {
        self.iter().flat_map(|s| SelectorKey::interpretations(s.as_ref())).collect()
    }
}

struct Rule {
    selectors: Vec<SelectorKey>,
    transform: Box<Transform>,
}

/// A registry of rewrite rules and default variants.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
    /// Rules per selector, most recently registered first.
    by_selector: HashMap<SelectorKey, Vec<RuleId>>,
    default_variants: HashMap<String, String>,
}

impl RuleRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule under each of the given selectors.
    ///
    /// Each selector string is stored under every key it can stand for (see
    /// [`SelectorKey::interpretations`]). Rules registered later for the same
    /// selector run before earlier ones.
    pub fn register<F>(&mut self, selectors: impl IntoSelectors, transform: F) -> RuleId
    where
        F: Fn(&mut Context<'_>) -> RuleResult + 'static,
    {
        let id = RuleId(self.rules.len() as u32);
        let selectors = selectors.into_selectors();
        for selector in &selectors {
            let rules = self.by_selector.entry(selector.clone()).or_default();
            if !rules.contains(&id) {
                rules.insert(0, id);
            }
        }
        self.rules.push(Rule {
            selectors,
            transform: Box::new(transform),
        });
        id
    }

    /// Rules stored under exactly this selector.
    pub fn rules_for(&self, selector: &SelectorKey) -> Option<&[RuleId]> {
        self.by_selector
            .get(selector)
            .map(Vec::as_slice)
            .filter(|rules| !rules.is_empty())
    }

    /// Find the rules for a node: the first candidate key with any rules wins.
    pub fn resolve(
        &self,
        component: &str,
        variant: Option<&str>,
        part: Option<&str>,
    ) -> Option<(&SelectorKey, &[RuleId])> {
        SelectorKey::candidates(component, variant, part)
            .into_iter()
            .find_map(|candidate| {
                self.by_selector
                    .get_key_value(&candidate)
                    .filter(|(_, rules)| !rules.is_empty())
                    .map(|(key, rules)| (key, rules.as_slice()))
            })
    }

    /// The body of a rule.
    pub fn transform(&self, id: RuleId) -> Option<&Transform> {
        self.rules.get(id.0 as usize).map(|rule| rule.transform.as_ref())
    }

    /// The selectors a rule was registered under.
    pub fn selectors(&self, id: RuleId) -> Option<&[SelectorKey]> {
        self.rules.get(id.0 as usize).map(|rule| rule.selectors.as_slice())
    }

    /// Remember the variant used by `component` nodes that have none.
    pub fn set_default_variant(&mut self, component: impl Into<String>, variant: impl Into<String>) {
        self.default_variants.insert(component.into(), variant.into());
    }

    /// The default variant for `component`.
    pub fn default_variant(&self, component: &str) -> Option<&str> {
        self.default_variants.get(component).map(String::as_str)
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut selectors: Vec<String> = self.by_selector.keys().map(ToString::to_string).collect();
        selectors.sort();
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rules.len())
            .field("selectors", &selectors)
            .field("default_variants", &self.default_variants)
            .finish()
    }
}
