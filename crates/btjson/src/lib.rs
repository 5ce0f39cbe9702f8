//! BtJson: rule-based expansion of component trees into HTML.
//!
//! Rules are registered on an [`Engine`] against selector keys such as
//! `"y-header"`, `"y-header_islet"`, `"y-header_islet*"` or
//! `"y-header__logo"`. [`Engine::expand`] rewrites a tree until no rule
//! applies and [`render`] turns the result into markup; [`apply`] does both.
//!
//! ```
//! use btjson::prelude::*;
//!
//! let mut engine = Engine::new();
//! engine.register_rule("y-link", |ctx| {
//!     let url = ctx.param_str("url").unwrap_or("#").to_string();
//!     ctx.set_tag("a").set_attr("href", url);
//!     Ok(None)
//! });
//!
//! let page = Node::from(serde_json::json!({"component": "y-link", "url": "/", "content": "Home"}));
//! let html = btjson::apply(&engine, page).unwrap();
//! assert_eq!(html, r#"<a class="y-link" data-block="y-link" href="/">Home</a>"#);
//! ```

use tracing::debug;

pub use btjson_core::{
    errors, flatten, AttrValue, BtError, ExpandError, LookupError, Node, NodeKey, Record,
    SelectorKey, StateValue, VariantSelector,
};
pub use btjson_expander::{
    expand, Context, Engine, EngineOptions, IntoSelectors, Library, RuleId, RuleRegistry,
    RuleResult, Transform,
};
pub use btjson_export::{escape_attr, escape_text, render};
pub use btjson_i18n::{KeyValue, Keysets};

/// Common imports for rule authors.
pub mod prelude {
    pub use btjson_core::{AttrValue, ExpandError, Node, Record, StateValue};
    pub use btjson_expander::{Context, Engine, EngineOptions, RuleResult};
    pub use btjson_export::render;
    pub use btjson_i18n::Keysets;
}

/// Expand `root` with `engine` and render the result.
pub fn apply(engine: &Engine, root: Node) -> Result<String, BtError> {
    let expanded = engine.expand(root)?;
    let html = render(&expanded);
    debug!(bytes = html.len(), "rendered tree");
    Ok(html)
}

/// Build an engine from JSON options text.
pub fn engine_from_json(options: &str) -> Result<Engine, BtError> {
    Ok(Engine::with_options(EngineOptions::from_json(options)?))
}
