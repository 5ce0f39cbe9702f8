//! Fixpoint expansion.
//!
//! Expansion walks the tree breadth-first over a queue of work items. Each
//! item addresses one slot of the tree by path. For a record owned by a
//! component, the rules found for its selector key run in registration
//! order; a rule that returns a replacement sends the slot back to the end
//! of the queue, otherwise the record's content is flattened and its
//! children are queued.

use std::collections::{HashMap, HashSet, VecDeque};

use btjson_core::{flatten, ExpandError, Node, NodeKey, Record, SelectorKey};
use tracing::{debug, trace, warn};

use crate::registry::RuleId;
use crate::{Context, Engine};

/// Bookkeeping for one top-level expansion, shared with nested
/// `apply_templates` passes.
#[derive(Debug, Default)]
pub(crate) struct Session {
    applied: HashMap<NodeKey, HashSet<RuleId>>,
}

impl Session {
    /// Record that `rule` ran on `node`; `false` if it already had.
    fn mark_applied(&mut self, node: NodeKey, rule: RuleId) -> bool {
        self.applied.entry(node).or_default().insert(rule)
    }
}

/// Where a node sits in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Element `index` of a list of `len` elements.
    At { index: usize, len: usize },
    /// The whole, non-list content of a record.
    Sole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Index(usize),
    Content,
}

#[derive(Debug)]
struct WorkItem {
    path: Vec<Step>,
    slot: Slot,
    component: Option<String>,
    variant: Option<String>,
    /// Times this lineage went through rule matching.
    rewrites: u32,
}

impl WorkItem {
    fn child(&self, steps: &[Step], slot: Slot, component: &Option<String>, variant: &Option<String>) -> Self {
        let mut path = Vec::with_capacity(self.path.len() + steps.len());
        path.extend_from_slice(&self.path);
        path.extend_from_slice(steps);
        WorkItem {
            path,
            slot,
            component: component.clone(),
            variant: variant.clone(),
            rewrites: 0,
        }
    }

    /// Count one more pass of this lineage through rule matching.
    fn count_rewrite(&mut self) -> u32 {
        self.rewrites = self.rewrites.saturating_add(1);
        self.rewrites
    }
}

enum Outcome {
    Kept(Box<Record>),
    /// The record as the replacing rule left it, and its replacement.
    Replaced(Box<Record>, Node),
}

/// Result of one run of the worklist.
pub(crate) struct Pass {
    pub(crate) tree: Node,
    /// The root record as it stood when a rule first replaced it.
    pub(crate) replaced_root: Option<Box<Record>>,
}

fn slot_mut<'t>(tree: &'t mut Node, path: &[Step]) -> Option<&'t mut Node> {
    let mut current = tree;
    for step in path {
        current = match (step, current) {
            (Step::Index(index), Node::List(items)) => items.get_mut(*index)?,
            (Step::Content, Node::Record(record)) => &mut record.content,
            _ => return None,
        };
    }
    Some(current)
}

/// Run the worklist over `root`.
///
/// With `skip_content` only the root itself is matched; its content is
/// left alone.
pub(crate) fn process(
    engine: &Engine,
    session: &mut Session,
    root: Node,
    component: Option<String>,
    skip_content: bool,
) -> Result<Pass, ExpandError> {
    let root_key = root.as_record().map(Record::key);
    let mut replaced_root = None;
    let mut tree = Node::List(vec![root]);
    let mut queue = VecDeque::new();
    queue.push_back(WorkItem {
        path: vec![Step::Index(0)],
        slot: Slot::At { index: 0, len: 1 },
        component,
        variant: None,
        rewrites: 0,
    });

    while let Some(mut item) = queue.pop_front() {
        let Some(slot) = slot_mut(&mut tree, &item.path) else {
            continue;
        };

        let mut record = match std::mem::take(slot) {
            Node::List(children) => {
                let len = children.len();
                for (index, child) in children.iter().enumerate() {
                    if child.is_expandable() {
                        queue.push_back(item.child(
                            &[Step::Index(index)],
                            Slot::At { index, len },
                            &item.component,
                            &item.variant,
                        ));
                    }
                }
                *slot = Node::List(children);
                continue;
            }
            Node::Record(record) => record,
            other => {
                *slot = other;
                continue;
            }
        };

        let (component, variant) = resolve_identity(
            engine,
            &mut record,
            item.component.as_deref(),
            item.variant.as_deref(),
        );

        // Plain records only carry the inherited component down to their children.
        let owner = component.as_deref().filter(|_| record.component.is_some());
        if let Some(owner) = owner {
            let rewrites = item.count_rewrite();
            let options = engine.options();
            if options.divergence_guard && rewrites > options.divergence_limit {
                let selector = SelectorKey::describe(owner, record.part.as_deref());
                warn!(%selector, limit = options.divergence_limit, "divergence guard tripped");
                return Err(ExpandError::Divergence {
                    selector,
                    limit: options.divergence_limit,
                });
            }

            if !record.stopped {
                match apply_rules(engine, session, record, item.slot, owner, variant.as_deref())? {
                    Outcome::Kept(kept) => record = kept,
                    Outcome::Replaced(replaced, replacement) => {
                        if replaced_root.is_none() && Some(replaced.key()) == root_key {
                            replaced_root = Some(replaced);
                        }
                        *slot = replacement;
                        item.component = component;
                        item.variant = variant;
                        queue.push_back(item);
                        continue;
                    }
                }
            }
        }

        if !skip_content && !record.content.is_absent() {
            if let Node::List(items) = &mut record.content {
                if items.iter().any(Node::is_list) {
                    *items = flatten(std::mem::take(items));
                }
            }
            match &record.content {
                Node::List(items) => {
                    let len = items.len();
                    for (index, child) in items.iter().enumerate() {
                        if child.is_expandable() {
                            queue.push_back(item.child(
                                &[Step::Content, Step::Index(index)],
                                Slot::At { index, len },
                                &component,
                                &variant,
                            ));
                        }
                    }
                }
                child if child.is_expandable() => {
                    queue.push_back(item.child(&[Step::Content], Slot::Sole, &component, &variant));
                }
                _ => {}
            }
        }

        *slot = Node::Record(record);
    }

    let tree = match tree {
        Node::List(mut items) => items.pop().unwrap_or_default(),
        other => other,
    };
    Ok(Pass { tree, replaced_root })
}

/// Work out the owning component and variant of a record and write them
/// back onto it.
///
/// A part inherits both from its context unless it names a different
/// component of its own. A component switch falls back to the component's
/// default variant. Plain records pass the inherited pair through.
fn resolve_identity(
    engine: &Engine,
    record: &mut Record,
    inherited_component: Option<&str>,
    inherited_variant: Option<&str>,
) -> (Option<String>, Option<String>) {
    let default_for = |component: &str| engine.default_variant(component).map(str::to_string);

    let switches_component = match (&record.component, inherited_component) {
        (Some(own), Some(inherited)) => own != inherited,
        (Some(_), None) => true,
        (None, _) => false,
    };

    if record.part.is_some() && !switches_component {
        let component = record
            .component
            .clone()
            .or_else(|| inherited_component.map(str::to_string));
        let variant = record
            .variant
            .clone()
            .or_else(|| inherited_variant.map(str::to_string))
            .or_else(|| component.as_deref().and_then(default_for));
        record.component = component.clone();
        record.variant = variant.clone();
        return (component, variant);
    }

    match record.component.clone() {
        Some(component) => {
            let variant = record.variant.clone().or_else(|| default_for(&component));
            record.variant = variant.clone();
            (Some(component), variant)
        }
        None => (
            inherited_component.map(str::to_string),
            inherited_variant.map(str::to_string),
        ),
    }
}

/// Run the rules resolved for `record` until one replaces it or stops it.
fn apply_rules(
    engine: &Engine,
    session: &mut Session,
    mut record: Box<Record>,
    slot: Slot,
    component: &str,
    variant: Option<&str>,
) -> Result<Outcome, ExpandError> {
    let registry = engine.registry();
    let Some((selector, rules)) = registry.resolve(component, variant, record.part.as_deref()) else {
        return Ok(Outcome::Kept(record));
    };
    let key = record.key();

    for &rule in rules {
        if !session.mark_applied(key, rule) {
            continue;
        }
        let Some(transform) = registry.transform(rule) else {
            continue;
        };
        trace!(%selector, %rule, node = %key, "applying rule");

        let mut ctx = Context::new(engine, &mut *session, record, slot);
        let result = transform(&mut ctx)?;
        record = ctx.into_record();

        match result {
            Some(replacement) if !replacement.is_absent() => {
                debug!(%selector, %rule, "node replaced");
                return Ok(Outcome::Replaced(record, replacement));
            }
            _ if record.stopped => break,
            _ => {}
        }
    }

    Ok(Outcome::Kept(record))
}
