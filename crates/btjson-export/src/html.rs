//! HTML export for expanded trees.

use btjson_core::{escape_attr, AttrValue, Node, Record, StateValue};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Tag used when a rule never set one.
pub const DEFAULT_TAG: &str = "div";

/// Class token marking nodes that need client-side initialization.
pub const INIT_CLASS: &str = "_init";

/// Elements written as `<tag .../>` with no content.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "wbr",
];

/// Render an expanded tree to HTML.
///
/// Text is written as-is; rules are expected to escape it.
pub fn render(node: &Node) -> String {
    let mut html = String::new();
    let mut builder = HtmlBuilder { html: &mut html };
    builder.write_node(node);
    html
}

/// Payload of the `data-options` attribute.
#[derive(Serialize)]
struct InitPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a IndexMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mixins: Option<&'a [Node]>,
}

struct HtmlBuilder<'a> {
    html: &'a mut String,
}

impl<'a> HtmlBuilder<'a> {
    fn write_node(&mut self, node: &Node) {
        match node {
            Node::Absent | Node::Bool(false) => {}
            Node::List(items) => {
                for item in items {
                    self.write_node(item);
                }
            }
            Node::Record(record) => self.write_record(record),
            primitive => {
                if let Some(text) = primitive.primitive_text() {
                    self.html.push_str(&text);
                }
            }
        }
    }

    fn write_record(&mut self, record: &Record) {
        let tag = record.tag.as_deref().unwrap_or(DEFAULT_TAG);

        self.html.push('<');
        self.html.push_str(tag);

        if !record.class_generation_disabled {
            let class = class_value(record);
            if !class.is_empty() {
                self.html.push_str(&format!(" class=\"{}\"", class));
            }
        }

        if !record.data_attr_disabled && record.part.is_none() {
            if let Some(component) = &record.component {
                self.html.push_str(&format!(" data-block=\"{}\"", component));
            }
        }

        for (name, value) in &record.attrs {
            match value {
                AttrValue::Flag => {
                    self.html.push(' ');
                    self.html.push_str(name);
                }
                AttrValue::Text(text) => {
                    self.html.push_str(&format!(" {}=\"{}\"", name, escape_attr(text)));
                }
                AttrValue::Null => {}
            }
        }

        if let Some(options) = init_payload(record) {
            self.html.push_str(&format!(" data-options=\"{}\"", escape_attr(&options)));
        }

        if VOID_TAGS.contains(&tag) {
            self.html.push_str("/>");
            return;
        }

        self.html.push('>');
        self.write_node(&record.content);
        self.html.push_str(&format!("</{}>", tag));
    }
}

/// `component[_variant][__part]`, then one token per set state, then the
/// init marker.
fn class_value(record: &Record) -> String {
    let mut tokens: Vec<String> = Vec::new();

    if let Some(component) = &record.component {
        let mut base = component.clone();
        if let Some(variant) = &record.variant {
            base.push('_');
            base.push_str(variant);
        }
        if let Some(part) = &record.part {
            base.push_str("__");
            base.push_str(part);
        }
        tokens.push(base);
    }

    for (name, value) in &record.state {
        if !value.is_set() {
            continue;
        }
        match value {
            StateValue::Text(text) => tokens.push(format!("_{}_{}", name, text)),
            _ => tokens.push(format!("_{}", name)),
        }
    }

    if record.auto_init == Some(true) || !record.mixins.is_empty() {
        tokens.push(INIT_CLASS.to_string());
    }

    tokens.join(" ")
}

fn init_payload(record: &Record) -> Option<String> {
    let mixins = (!record.mixins.is_empty()).then_some(record.mixins.as_slice());
    if record.init_options.is_none() && mixins.is_none() {
        return None;
    }
    let payload = InitPayload {
        options: record.init_options.as_ref(),
        mixins,
    };
    serde_json::to_string(&payload).ok()
}
