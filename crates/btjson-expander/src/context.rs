//! The mutation context handed to rules.

use std::fmt::Display;

use btjson_core::{escape_text, AttrValue, ExpandError, Node, Record, StateValue};
use indexmap::IndexMap;
use serde_json::Value;

use crate::expander::{self, Pass, Session, Slot};
use crate::{Engine, Library};

/// Access to the node a rule is running on.
///
/// Every read and write a rule performs on its node goes through the
/// context. Setters return `&mut Self` so calls can be chained.
pub struct Context<'a> {
    engine: &'a Engine,
    session: &'a mut Session,
    record: Box<Record>,
    slot: Slot,
    /// Result of the last `apply_templates` call that replaced the node.
    templated: Option<Node>,
}

impl<'a> Context<'a> {
    /// Context over `record`, sitting at `slot` in its parent.
    pub(crate) fn new(engine: &'a Engine, session: &'a mut Session, record: Box<Record>, slot: Slot) -> Self {
        Self {
            engine,
            session,
            record,
            slot,
            templated: None,
        }
    }

    /// Hand the record back to the expander.
    pub(crate) fn into_record(self) -> Box<Record> {
        self.record
    }

    // --- Position ---

    /// 1-based position of the node within its parent.
    pub fn position(&self) -> usize {
        match self.slot {
            Slot::At { index, .. } => index + 1,
            Slot::Sole => 1,
        }
    }

    /// Whether the node is the first child of its parent.
    pub fn is_first(&self) -> bool {
        match self.slot {
            Slot::At { index, .. } => index == 0,
            Slot::Sole => true,
        }
    }

    /// Whether the node is the last child of its parent.
    pub fn is_last(&self) -> bool {
        match self.slot {
            Slot::At { index, len } => index + 1 == len,
            Slot::Sole => true,
        }
    }

    // --- Markup ---

    /// The tag set so far.
    pub fn tag(&self) -> Option<&str> {
        self.record.tag.as_deref()
    }

    /// Set the tag to render.
    pub fn set_tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.record.tag = Some(tag.into());
        self
    }

    /// An attribute set so far.
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.record.attrs.get(name)
    }

    /// Set an attribute; `true` renders a bare name, `false` or `None` omits it.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> &mut Self {
        self.record.attrs.insert(name.into(), value.into());
        self
    }

    /// Render no `class` attribute.
    pub fn disable_css_class_generation(&mut self) -> &mut Self {
        self.record.class_generation_disabled = true;
        self
    }

    /// Render the generated `class` attribute.
    pub fn enable_css_class_generation(&mut self) -> &mut Self {
        self.record.class_generation_disabled = false;
        self
    }

    /// Whether the `class` attribute will be rendered.
    pub fn is_css_class_generation_enabled(&self) -> bool {
        !self.record.class_generation_disabled
    }

    /// Suppress the `data-block` attribute.
    pub fn disable_data_attr_generation(&mut self) -> &mut Self {
        self.record.data_attr_disabled = true;
        self
    }

    /// Render the `data-block` attribute.
    pub fn enable_data_attr_generation(&mut self) -> &mut Self {
        self.record.data_attr_disabled = false;
        self
    }

    /// Whether the `data-block` attribute will be rendered.
    pub fn is_data_attr_generation_enabled(&self) -> bool {
        !self.record.data_attr_disabled
    }

    // --- State ---

    /// A state set so far.
    pub fn state(&self, name: &str) -> Option<&StateValue> {
        self.record.state.get(name)
    }

    /// Set a state to `true`.
    pub fn set_state(&mut self, name: impl Into<String>) -> &mut Self {
        self.set_state_value(name, true)
    }

    /// Set a state to a value; `false`, `None` and `""` produce no class.
    pub fn set_state_value(&mut self, name: impl Into<String>, value: impl Into<StateValue>) -> &mut Self {
        self.record.state.insert(name.into(), value.into());
        self
    }

    // --- Parameters ---

    /// A literal field of the node.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.record.params.get(name)
    }

    /// A literal field read as text.
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(Value::as_str)
    }

    /// A literal field read as a tree, absent when missing.
    pub fn param_node(&self, name: &str) -> Node {
        self.param(name).map(Node::from).unwrap_or_default()
    }

    /// The effective variant.
    pub fn variant(&self) -> Option<&str> {
        self.record.variant.as_deref()
    }

    /// The owning component.
    pub fn component_name(&self) -> Option<&str> {
        self.record.component.as_deref()
    }

    /// The part name, for part nodes.
    pub fn part_name(&self) -> Option<&str> {
        self.record.part.as_deref()
    }

    // --- Content ---

    /// The node's content.
    pub fn content(&self) -> &Node {
        &self.record.content
    }

    /// Replace the node's content.
    pub fn set_content(&mut self, content: impl Into<Node>) -> &mut Self {
        self.record.content = content.into();
        self
    }

    /// Move the content out, leaving the node empty.
    pub fn take_content(&mut self) -> Node {
        std::mem::take(&mut self.record.content)
    }

    /// The node's mixins.
    pub fn mixins(&self) -> &[Node] {
        &self.record.mixins
    }

    /// Append a mixin.
    pub fn add_mixin(&mut self, mixin: impl Into<Node>) -> &mut Self {
        self.record.mixins.push(mixin.into());
        self
    }

    // --- Initialization ---

    /// Turn auto-init on unless it was explicitly turned off.
    pub fn enable_auto_init(&mut self) -> &mut Self {
        if self.record.auto_init != Some(false) {
            self.record.auto_init = Some(true);
        }
        self
    }

    /// Whether the node is marked for client-side initialization.
    pub fn is_auto_init_enabled(&self) -> bool {
        self.record.auto_init.unwrap_or(false)
    }

    /// An init option set so far.
    pub fn init_option(&self, name: &str) -> Option<&Value> {
        self.record.init_options.as_ref().and_then(|options| options.get(name))
    }

    /// Set an init option, rendered into `data-options`.
    pub fn set_init_option(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.record
            .init_options
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), value.into());
        self
    }

    // --- Engine services ---

    /// A new identifier, unique for the lifetime of the engine.
    pub fn generate_id(&self) -> String {
        self.engine.generate_id()
    }

    /// Stop the remaining rules for this node.
    pub fn stop(&mut self) -> &mut Self {
        self.record.stopped = true;
        self
    }

    /// Run the remaining rules for this node now, without touching its
    /// content.
    ///
    /// Rules that already ran on the node are skipped. If the pass replaces
    /// the node, the replacement is what [`Context::json`] returns, and the
    /// context keeps the node as the rules before the replacement left it.
    pub fn apply_templates(&mut self) -> Result<&mut Self, ExpandError> {
        let key = self.record.key();
        let component = self.record.component.clone();
        let pass = Node::Record(Box::new(self.record.snapshot()));

        let Pass { tree, replaced_root } =
            expander::process(self.engine, &mut *self.session, pass, component, true)?;
        match tree {
            Node::Record(record) if record.key() == key => {
                self.record = record;
                self.templated = None;
            }
            replacement => {
                // Keep what the rules before the replacement wrote.
                if let Some(record) = replaced_root {
                    self.record = record;
                }
                self.templated = Some(replacement);
            }
        }
        Ok(self)
    }

    /// The node as a tree, for wrapping in a replacement.
    ///
    /// After [`Context::apply_templates`] replaced the node this is the
    /// replacement. The returned tree keeps node identity, so rules that
    /// already ran on the node do not run on it again.
    pub fn json(&self) -> Node {
        match &self.templated {
            Some(templated) => templated.snapshot(),
            None => Node::Record(Box::new(self.record.snapshot())),
        }
    }

    /// Escape a value for use as text content.
    pub fn escape(&self, value: impl Display) -> String {
        escape_text(value)
    }

    /// The engine's shared library.
    pub fn library(&self) -> &Library {
        self.engine.library()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_context<R>(record: Record, slot: Slot, f: impl FnOnce(&mut Context<'_>) -> R) -> (R, Box<Record>) {
        let engine = Engine::new();
        let mut session = Session::default();
        let mut ctx = Context::new(&engine, &mut session, Box::new(record), slot);
        let result = f(&mut ctx);
        (result, ctx.into_record())
    }

    #[test]
    fn test_position_in_list() {
        let ((position, first, last), _) = with_context(Record::part("item"), Slot::At { index: 2, len: 3 }, |ctx| {
            (ctx.position(), ctx.is_first(), ctx.is_last())
        });
        assert_eq!(position, 3);
        assert!(!first);
        assert!(last);
    }

    #[test]
    fn test_sole_content_is_first_and_last() {
        let ((position, first, last), _) = with_context(Record::part("item"), Slot::Sole, |ctx| {
            (ctx.position(), ctx.is_first(), ctx.is_last())
        });
        assert_eq!(position, 1);
        assert!(first);
        assert!(last);
    }

    #[test]
    fn test_setters_write_rendering_fields() {
        let (_, record) = with_context(Record::component("input"), Slot::Sole, |ctx| {
            ctx.set_tag("input")
                .set_attr("type", "text")
                .set_attr("disabled", true)
                .set_state("focused")
                .set_state_value("size", "m")
                .disable_css_class_generation()
                .disable_data_attr_generation()
                .set_init_option("delay", 300)
                .add_mixin(Record::component("y-ua"))
                .stop();
        });

        assert_eq!(record.tag.as_deref(), Some("input"));
        assert_eq!(record.attrs.get("type"), Some(&AttrValue::Text("text".into())));
        assert_eq!(record.attrs.get("disabled"), Some(&AttrValue::Flag));
        assert_eq!(record.state.get("focused"), Some(&StateValue::Bool(true)));
        assert_eq!(record.state.get("size"), Some(&StateValue::Text("m".into())));
        assert!(record.class_generation_disabled);
        assert!(record.data_attr_disabled);
        assert_eq!(record.init_options.as_ref().and_then(|o| o.get("delay")), Some(&json!(300)));
        assert_eq!(record.mixins.len(), 1);
        assert!(record.stopped);
    }

    #[test]
    fn test_auto_init_respects_explicit_false() {
        let mut record = Record::component("popup");
        record.auto_init = Some(false);
        let (enabled, _) = with_context(record, Slot::Sole, |ctx| {
            ctx.enable_auto_init();
            ctx.is_auto_init_enabled()
        });
        assert!(!enabled);

        let (enabled, _) = with_context(Record::component("popup"), Slot::Sole, |ctx| {
            ctx.enable_auto_init();
            ctx.is_auto_init_enabled()
        });
        assert!(enabled);
    }

    #[test]
    fn test_params_and_identity() {
        let record = Record::component("y-logo")
            .with_variant("islet")
            .with_param("logoSrc", "logo.png")
            .with_param("items", json!([{"part": "item"}]));
        let ((src, missing, items, component, variant), _) = with_context(record, Slot::Sole, |ctx| {
            (
                ctx.param_str("logoSrc").map(str::to_string),
                ctx.param("logoAlt").is_none(),
                ctx.param_node("items"),
                ctx.component_name().map(str::to_string),
                ctx.variant().map(str::to_string),
            )
        });
        assert_eq!(src.as_deref(), Some("logo.png"));
        assert!(missing);
        assert_eq!(items.as_list().map(<[Node]>::len), Some(1));
        assert_eq!(component.as_deref(), Some("y-logo"));
        assert_eq!(variant.as_deref(), Some("islet"));
    }

    #[test]
    fn test_generate_id_is_monotonic() {
        let engine = Engine::new();
        let mut session = Session::default();
        let ctx = Context::new(&engine, &mut session, Box::new(Record::new()), Slot::Sole);
        assert_eq!(ctx.generate_id(), "uniq0");
        assert_eq!(ctx.generate_id(), "uniq1");
    }

    #[test]
    fn test_json_keeps_identity() {
        let record = Record::component("card");
        let key = record.key();
        let (json, _) = with_context(record, Slot::Sole, |ctx| ctx.json());
        assert_eq!(json.as_record().map(Record::key), Some(key));
    }

    #[test]
    fn test_escape() {
        let (escaped, _) = with_context(Record::new(), Slot::Sole, |ctx| ctx.escape("<i>"));
        assert_eq!(escaped, "&lt;i&gt;");
    }
}
