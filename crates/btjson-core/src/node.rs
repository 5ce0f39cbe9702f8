//! Node model for BtJson trees.
//!
//! A tree is made of [`Node`]s: records (component instances, parts, or plain
//! markup), ordered lists, primitives, and the absent sentinel. Records carry
//! their declared fields, arbitrary rule parameters, and the rendering fields
//! that rules fill in during expansion.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

static NEXT_NODE_KEY: AtomicU64 = AtomicU64::new(1);

/// Identity of a record instance.
///
/// Two records compare equal by value regardless of their keys. Moving a
/// record keeps its key; cloning issues a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(u64);

impl NodeKey {
    fn fresh() -> Self {
        NodeKey(NEXT_NODE_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity slot embedded in [`Record`]; invisible to equality.
struct Identity(NodeKey);

impl Default for Identity {
    fn default() -> Self {
        Identity(NodeKey::fresh())
    }
}

impl Clone for Identity {
    fn clone(&self) -> Self {
        Identity::default()
    }
}

impl PartialEq for Identity {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node of a BtJson tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    /// Omitted from the tree (`null`).
    #[default]
    Absent,
    /// A boolean; `false` is treated like [`Node::Absent`].
    Bool(bool),
    Number(f64),
    /// Raw text. Rendered as-is, without escaping.
    Text(String),
    List(Vec<Node>),
    Record(Box<Record>),
}

impl Node {
    /// Raw text node.
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// Record owned by `component`.
    pub fn component(component: impl Into<String>) -> Self {
        Record::component(component).into()
    }

    /// Record for a part of the enclosing component.
    pub fn part(part: impl Into<String>) -> Self {
        Record::part(part).into()
    }

    /// Plain element with no component or part.
    pub fn element() -> Self {
        Record::new().into()
    }

    /// List node.
    pub fn list<I, N>(items: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        Node::List(items.into_iter().map(Into::into).collect())
    }

    /// `true` for [`Node::Absent`] and `Bool(false)`.
    pub fn is_absent(&self) -> bool {
        matches!(self, Node::Absent | Node::Bool(false))
    }

    /// `true` for [`Node::List`].
    pub fn is_list(&self) -> bool {
        matches!(self, Node::List(_))
    }

    /// `true` for records and lists, the nodes expansion descends into.
    pub fn is_expandable(&self) -> bool {
        matches!(self, Node::List(_) | Node::Record(_))
    }

    /// The record, if this is a record node.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Node::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Mutable access to the record, if this is a record node.
    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Node::Record(record) => Some(record),
            _ => None,
        }
    }

    /// The items, if this is a list node.
    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    /// Text form of a primitive, `None` for absent values, lists and records.
    pub fn primitive_text(&self) -> Option<String> {
        match self {
            Node::Bool(true) => Some("true".to_string()),
            Node::Number(n) => Some(n.to_string()),
            Node::Text(text) => Some(text.clone()),
            _ => None,
        }
    }

    /// Copy of this node that keeps the identity of every record inside it.
    pub fn snapshot(&self) -> Node {
        match self {
            Node::List(items) => Node::List(items.iter().map(Node::snapshot).collect()),
            Node::Record(record) => Node::Record(Box::new(record.snapshot())),
            other => other.clone(),
        }
    }
}

/// Flatten nested lists into a single level.
///
/// Absent entries are kept in place. A list that is already flat comes back
/// unchanged.
pub fn flatten(items: Vec<Node>) -> Vec<Node> {
    if !items.iter().any(Node::is_list) {
        return items;
    }
    let mut flat = Vec::with_capacity(items.len());
    flatten_into(items, &mut flat);
    flat
}

fn flatten_into(items: Vec<Node>, out: &mut Vec<Node>) {
    for item in items {
        match item {
            Node::List(inner) => flatten_into(inner, out),
            other => out.push(other),
        }
    }
}

/// Value of an HTML attribute set by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Rendered as a bare attribute name.
    Flag,
    Text(String),
    /// Not rendered.
    Null,
}

/// Value of a component state, rendered as a class modifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    Bool(bool),
    Text(String),
    Null,
}

impl StateValue {
    /// `false`, `null` and the empty string produce no class token.
    pub fn is_set(&self) -> bool {
        match self {
            StateValue::Bool(flag) => *flag,
            StateValue::Text(text) => !text.is_empty(),
            StateValue::Null => false,
        }
    }
}

/// A record node: a component, a part of a component, or plain markup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Owning component; `None` for plain markup.
    pub component: Option<String>,
    /// Part of the owning component.
    pub part: Option<String>,
    /// Display variant, inherited by parts.
    pub variant: Option<String>,
    /// Children.
    pub content: Node,
    /// Nodes layered onto the same rendered element.
    pub mixins: Vec<Node>,
    /// Every other literal field, read by rules as parameters.
    pub params: IndexMap<String, Value>,

    // Rendering fields, written by rules only.
    pub tag: Option<String>,
    pub attrs: IndexMap<String, AttrValue>,
    pub class_generation_disabled: bool,
    pub data_attr_disabled: bool,
    pub stopped: bool,
    pub auto_init: Option<bool>,
    pub state: IndexMap<String, StateValue>,
    pub init_options: Option<IndexMap<String, Value>>,

    identity: Identity,
}

impl Record {
    /// Create an empty plain record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record owned by `component`.
    pub fn component(component: impl Into<String>) -> Self {
        Self {
            component: Some(component.into()),
            ..Self::default()
        }
    }

    /// Part record; the owning component is inherited during expansion.
    pub fn part(part: impl Into<String>) -> Self {
        Self {
            part: Some(part.into()),
            ..Self::default()
        }
    }

    /// Set the owning component.
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Set the variant.
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Set the part name.
    pub fn with_part(mut self, part: impl Into<String>) -> Self {
        self.part = Some(part.into());
        self
    }

    /// Set the content.
    pub fn with_content(mut self, content: impl Into<Node>) -> Self {
        self.content = content.into();
        self
    }

    /// Append a mixin.
    pub fn with_mixin(mut self, mixin: impl Into<Node>) -> Self {
        self.mixins.push(mixin.into());
        self
    }

    /// Set a literal parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Identity of this instance.
    pub fn key(&self) -> NodeKey {
        self.identity.0
    }

    /// Copy that keeps this record's identity, and that of every record
    /// inside its content and mixins.
    pub fn snapshot(&self) -> Record {
        Record {
            component: self.component.clone(),
            part: self.part.clone(),
            variant: self.variant.clone(),
            content: self.content.snapshot(),
            mixins: self.mixins.iter().map(Node::snapshot).collect(),
            params: self.params.clone(),
            tag: self.tag.clone(),
            attrs: self.attrs.clone(),
            class_generation_disabled: self.class_generation_disabled,
            data_attr_disabled: self.data_attr_disabled,
            stopped: self.stopped,
            auto_init: self.auto_init,
            state: self.state.clone(),
            init_options: self.init_options.clone(),
            identity: Identity(self.identity.0),
        }
    }

    /// Build a record from literal object fields.
    ///
    /// `component`, `part`, `variant`, `content` and `mixins` are declared
    /// fields; everything else becomes a parameter.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        let mut record = Record::new();
        for (name, value) in fields {
            let value = match (name.as_str(), value) {
                ("component", Value::String(component)) => {
                    record.component = Some(component);
                    continue;
                }
                ("part", Value::String(part)) => {
                    record.part = Some(part);
                    continue;
                }
                ("variant", Value::String(variant)) => {
                    record.variant = Some(variant);
                    continue;
                }
                ("content", content) => {
                    record.content = Node::from(content);
                    continue;
                }
                ("mixins", Value::Array(mixins)) => {
                    record.mixins = mixins.into_iter().map(Node::from).collect();
                    continue;
                }
                ("mixins", mixin @ Value::Object(_)) => {
                    record.mixins.push(Node::from(mixin));
                    continue;
                }
                (_, value) => value,
            };
            record.params.insert(name, value);
        }
        record
    }
}

impl From<Record> for Node {
    fn from(record: Record) -> Self {
        Node::Record(Box::new(record))
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

impl From<bool> for Node {
    fn from(flag: bool) -> Self {
        Node::Bool(flag)
    }
}

impl From<f64> for Node {
    fn from(number: f64) -> Self {
        Node::Number(number)
    }
}

impl From<i64> for Node {
    fn from(number: i64) -> Self {
        Node::Number(number as f64)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::List(items)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Node::Absent)
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null | Value::Bool(false) => Node::Absent,
            Value::Bool(true) => Node::Bool(true),
            Value::Number(number) => Node::Number(number.as_f64().unwrap_or_default()),
            Value::String(text) => Node::Text(text),
            Value::Array(items) => Node::List(items.into_iter().map(Node::from).collect()),
            Value::Object(fields) => Node::Record(Box::new(Record::from_fields(fields))),
        }
    }
}

impl From<&Value> for Node {
    fn from(value: &Value) -> Self {
        Node::from(value.clone())
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Absent => serializer.serialize_unit(),
            Node::Bool(flag) => serializer.serialize_bool(*flag),
            Node::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                serializer.serialize_i64(*n as i64)
            }
            Node::Number(n) => serializer.serialize_f64(*n),
            Node::Text(text) => serializer.serialize_str(text),
            Node::List(items) => items.serialize(serializer),
            Node::Record(record) => record.serialize(serializer),
        }
    }
}

/// Records serialize their declared fields and parameters only.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(component) = &self.component {
            map.serialize_entry("component", component)?;
        }
        if let Some(part) = &self.part {
            map.serialize_entry("part", part)?;
        }
        if let Some(variant) = &self.variant {
            map.serialize_entry("variant", variant)?;
        }
        for (name, value) in &self.params {
            map.serialize_entry(name, value)?;
        }
        if !self.content.is_absent() {
            map.serialize_entry("content", &self.content)?;
        }
        if !self.mixins.is_empty() {
            map.serialize_entry("mixins", &self.mixins)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Node::from)
    }
}

impl From<&str> for AttrValue {
    fn from(text: &str) -> Self {
        AttrValue::Text(text.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(text: String) -> Self {
        AttrValue::Text(text)
    }
}

impl From<&String> for AttrValue {
    fn from(text: &String) -> Self {
        AttrValue::Text(text.clone())
    }
}

/// `true` renders a bare attribute, `false` omits it.
impl From<bool> for AttrValue {
    fn from(flag: bool) -> Self {
        if flag {
            AttrValue::Flag
        } else {
            AttrValue::Null
        }
    }
}

impl From<i64> for AttrValue {
    fn from(number: i64) -> Self {
        AttrValue::Text(number.to_string())
    }
}

impl From<usize> for AttrValue {
    fn from(number: usize) -> Self {
        AttrValue::Text(number.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(number: f64) -> Self {
        AttrValue::Text(number.to_string())
    }
}

impl From<&Value> for AttrValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => AttrValue::Null,
            Value::Bool(flag) => AttrValue::from(*flag),
            Value::String(text) => AttrValue::Text(text.clone()),
            other => AttrValue::Text(other.to_string()),
        }
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttrValue::Null)
    }
}

impl From<&str> for StateValue {
    fn from(text: &str) -> Self {
        StateValue::Text(text.to_string())
    }
}

impl From<String> for StateValue {
    fn from(text: String) -> Self {
        StateValue::Text(text)
    }
}

impl From<bool> for StateValue {
    fn from(flag: bool) -> Self {
        StateValue::Bool(flag)
    }
}

impl From<i64> for StateValue {
    fn from(number: i64) -> Self {
        StateValue::Text(number.to_string())
    }
}

impl From<&Value> for StateValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => StateValue::Null,
            Value::Bool(flag) => StateValue::Bool(*flag),
            Value::String(text) => StateValue::Text(text.clone()),
            other => StateValue::Text(other.to_string()),
        }
    }
}

impl<T: Into<StateValue>> From<Option<T>> for StateValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(StateValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_record() {
        let node = Node::from(json!({
            "component": "button",
            "variant": "action",
            "text": "Go",
            "content": ["a", null, {"part": "icon"}],
            "mixins": [{"component": "y-ua"}]
        }));

        let record = node.as_record().unwrap();
        assert_eq!(record.component.as_deref(), Some("button"));
        assert_eq!(record.variant.as_deref(), Some("action"));
        assert_eq!(record.params.get("text"), Some(&json!("Go")));
        assert_eq!(record.mixins.len(), 1);

        let content = record.content.as_list().unwrap();
        assert_eq!(content.len(), 3);
        assert!(content[1].is_absent());
        assert_eq!(content[2].as_record().unwrap().part.as_deref(), Some("icon"));
    }

    #[test]
    fn test_false_is_absent() {
        assert!(Node::from(json!(false)).is_absent());
        assert!(Node::Bool(false).is_absent());
        assert!(!Node::Bool(true).is_absent());
    }

    #[test]
    fn test_clone_issues_new_identity() {
        let record = Record::component("card");
        let copy = record.clone();
        assert_ne!(record.key(), copy.key());
        assert_eq!(record, copy);
    }

    #[test]
    fn test_snapshot_keeps_nested_identity() {
        let inner = Record::part("body");
        let inner_key = inner.key();
        let outer = Record::component("card").with_content(vec![Node::from(inner)]);

        let snapshot = outer.snapshot();
        assert_eq!(snapshot.key(), outer.key());
        let nested = snapshot.content.as_list().unwrap()[0].as_record().unwrap();
        assert_eq!(nested.key(), inner_key);
    }

    #[test]
    fn test_flatten() {
        let nested = vec![
            Node::list(vec![Node::text("a"), Node::list(vec!["b", "c"])]),
            Node::text("d"),
        ];
        let flat = flatten(nested);
        assert_eq!(flat, vec![Node::text("a"), "b".into(), "c".into(), "d".into()]);
        assert_eq!(flatten(flat.clone()), flat);
    }

    #[test]
    fn test_serialize_record_skips_rendering_fields() {
        let mut record = Record::component("y-ua").with_param("lang", "ru");
        record.tag = Some("span".to_string());
        record.stopped = true;
        let text = serde_json::to_string(&Node::from(record)).unwrap();
        assert_eq!(text, r#"{"component":"y-ua","lang":"ru"}"#);
    }

    #[test]
    fn test_serialize_integral_numbers() {
        assert_eq!(serde_json::to_string(&Node::Number(3.0)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&Node::Number(1.5)).unwrap(), "1.5");
    }

    #[test]
    fn test_attr_value_conversions() {
        assert_eq!(AttrValue::from(true), AttrValue::Flag);
        assert_eq!(AttrValue::from(false), AttrValue::Null);
        assert_eq!(AttrValue::from(None::<&str>), AttrValue::Null);
        assert_eq!(AttrValue::from(Some(&json!("x"))), AttrValue::Text("x".into()));
        assert_eq!(AttrValue::from(&json!(5)), AttrValue::Text("5".into()));
    }

    #[test]
    fn test_state_value_is_set() {
        assert!(StateValue::Bool(true).is_set());
        assert!(!StateValue::Bool(false).is_set());
        assert!(!StateValue::Text(String::new()).is_set());
        assert!(!StateValue::Null.is_set());
        assert!(StateValue::from("large").is_set());
    }
}
