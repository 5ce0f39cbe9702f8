//! Property tests for flattening and render idempotence.

use btjson::prelude::*;
use btjson::{flatten, render};
use proptest::prelude::*;

fn arb_leaf() -> impl Strategy<Value = Node> {
    prop_oneof![
        "[a-z]{1,5}".prop_map(Node::text),
        (0i64..1000).prop_map(Node::from),
        Just(Node::Absent),
        Just(Node::part("item")),
    ]
}

fn arb_nested() -> impl Strategy<Value = Vec<Node>> {
    let tree = arb_leaf().prop_recursive(4, 48, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Node::List)
    });
    prop::collection::vec(tree, 0..6)
}

fn leaves(items: &[Node], out: &mut Vec<Node>) {
    for item in items {
        match item {
            Node::List(inner) => leaves(inner, out),
            other => out.push(other.clone()),
        }
    }
}

fn arb_page() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        "[a-z ]{0,8}".prop_map(Node::text),
        Just(Node::component("btn")),
        "[a-z/]{1,6}".prop_map(|url| Record::component("y-link").with_param("url", url).into()),
        Just(Node::part("title")),
        Just(Node::element()),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Node::List),
            (
                prop::option::of("(islet|islet-search|plain)"),
                prop::collection::vec(inner, 0..4),
            )
                .prop_map(|(variant, content)| {
                    let mut card = Record::component("card").with_content(content);
                    card.variant = variant;
                    card.into()
                }),
        ]
    })
}

/// Rules whose output is stable when they run again on it.
fn page_engine() -> Engine {
    let mut engine = Engine::new();
    engine.register_rule("btn", |ctx| {
        ctx.set_tag("button").set_state("active");
        Ok(None)
    });
    engine.register_rule("y-link", |ctx| {
        let url = ctx.param_str("url").unwrap_or("#").to_string();
        ctx.set_tag("a").set_attr("href", url);
        Ok(None)
    });
    engine.register_rule("card*", |ctx| {
        let variant = ctx.variant().unwrap_or("none").to_string();
        ctx.set_state_value("look", variant);
        Ok(None)
    });
    engine.register_rule("card_islet*__title", |ctx| {
        ctx.set_tag("h2");
        Ok(None)
    });
    engine.register_rule("card*__title", |ctx| {
        let position = ctx.position();
        ctx.set_tag("h3").set_attr("data-position", position);
        Ok(None)
    });
    engine
}

proptest! {
    #[test]
    fn flatten_leaves_no_nested_lists(items in arb_nested()) {
        let mut expected = Vec::new();
        leaves(&items, &mut expected);

        let flat = flatten(items);
        prop_assert!(flat.iter().all(|node| !node.is_list()));
        prop_assert_eq!(flat, expected);
    }

    #[test]
    fn expanded_content_is_flat(items in arb_nested()) {
        let engine = Engine::new();
        let root = Record::component("list").with_content(Node::List(items));
        let expanded = engine.expand(root.into()).unwrap();

        let content = &expanded.as_record().unwrap().content;
        if let Some(children) = content.as_list() {
            prop_assert!(children.iter().all(|child| !child.is_list()));
        }
    }

    #[test]
    fn render_is_stable_under_reexpansion(page in arb_page()) {
        let engine = page_engine();
        let expanded = engine.expand(page).unwrap();
        let html = render(&expanded);

        let again = engine.expand(expanded).unwrap();
        prop_assert_eq!(render(&again), html);
    }
}
