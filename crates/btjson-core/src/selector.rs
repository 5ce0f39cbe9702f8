//! Selector keys.
//!
//! Rules are registered against string selectors such as `button`,
//! `button_action`, `button_islet*`, `button*` or `button_action__icon`.
//! Those strings are parsed once into a [`SelectorKey`]; lookups derive
//! candidate keys from a node's component, variant and part.

use std::fmt;

/// Separator between a variant family and the rest of the variant name.
pub const VARIANT_FAMILY_SEPARATOR: char = '-';

/// Variant part of a selector key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VariantSelector {
    /// No variant (`button`).
    None,
    /// An exact variant (`button_action`).
    Exact(String),
    /// A variant family (`button_islet*`), matching `islet`, `islet-search`, ...
    Family(String),
    /// Any variant of the component (`button*`).
    Any,
}

/// Canonical key under which rules are stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectorKey {
    pub component: String,
    pub variant: VariantSelector,
    pub part: Option<String>,
}

impl SelectorKey {
    /// Create a key from its parts.
    pub fn new(component: impl Into<String>, variant: VariantSelector, part: Option<String>) -> Self {
        Self {
            component: component.into(),
            variant,
            part,
        }
    }

    /// Parse a selector string.
    ///
    /// The grammar is `component[_variant][*][__part]`. A trailing `*` on the
    /// variant turns it into a family; a `*` directly after the component
    /// name matches any variant.
    pub fn parse(selector: &str) -> Self {
        let (head, part) = match selector.split_once("__") {
            Some((head, part)) => (head, Some(part.to_string())),
            None => (selector, None),
        };

        let (component, variant) = match head.strip_suffix('*') {
            Some(stem) => match stem.split_once('_') {
                Some((component, family)) => {
                    (component, VariantSelector::Family(family.to_string()))
                }
                None => (stem, VariantSelector::Any),
            },
            None => match head.split_once('_') {
                Some((component, variant)) => {
                    (component, VariantSelector::Exact(variant.to_string()))
                }
                None => (head, VariantSelector::None),
            },
        };

        Self::new(component, variant, part)
    }

    /// Every key a registration string can stand for.
    ///
    /// An `_` either separates the component from its variant or belongs to
    /// the component name, so `my_comp` yields both component `my` with
    /// variant `comp` and component `my_comp` with no variant. The first key
    /// is the one [`SelectorKey::parse`] returns.
    pub fn interpretations(selector: &str) -> Vec<SelectorKey> {
        let (head, part) = match selector.split_once("__") {
            Some((head, part)) => (head, Some(part.to_string())),
            None => (selector, None),
        };
        let (stem, wildcard) = match head.strip_suffix('*') {
            Some(stem) => (stem, true),
            None => (head, false),
        };

        let mut keys = Vec::new();
        for (index, _) in stem.match_indices('_') {
            let (component, variant) = (&stem[..index], &stem[index + 1..]);
            if component.is_empty() || variant.is_empty() {
                continue;
            }
            let variant = if wildcard {
                VariantSelector::Family(variant.to_string())
            } else {
                VariantSelector::Exact(variant.to_string())
            };
            keys.push(Self::new(component, variant, part.clone()));
        }
        let whole = if wildcard { VariantSelector::Any } else { VariantSelector::None };
        keys.push(Self::new(stem, whole, part));
        keys
    }

    /// Candidate keys for a node, most specific first.
    ///
    /// 1. the exact key (`c_v__p`, or `c__p` without a variant)
    /// 2. with a variant, the family key built from the variant text before
    ///    the first [`VARIANT_FAMILY_SEPARATOR`] (`c_v*__p`)
    /// 3. the component-wide wildcard (`c*__p`)
    pub fn candidates(component: &str, variant: Option<&str>, part: Option<&str>) -> Vec<SelectorKey> {
        let part = part.map(str::to_string);
        let mut keys = Vec::with_capacity(3);
        match variant {
            Some(variant) => {
                keys.push(Self::new(
                    component,
                    VariantSelector::Exact(variant.to_string()),
                    part.clone(),
                ));
                let family = variant
                    .split(VARIANT_FAMILY_SEPARATOR)
                    .next()
                    .unwrap_or(variant);
                keys.push(Self::new(
                    component,
                    VariantSelector::Family(family.to_string()),
                    part.clone(),
                ));
            }
            None => keys.push(Self::new(component, VariantSelector::None, part.clone())),
        }
        keys.push(Self::new(component, VariantSelector::Any, part));
        keys
    }

    /// Human-readable `component[__part]` label used in diagnostics.
    pub fn describe(component: &str, part: Option<&str>) -> String {
        match part {
            Some(part) => format!("{}__{}", component, part),
            None => component.to_string(),
        }
    }
}

impl fmt::Display for SelectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.component)?;
        match &self.variant {
            VariantSelector::None => {}
            VariantSelector::Exact(variant) => write!(f, "_{}", variant)?,
            VariantSelector::Family(family) => write!(f, "_{}*", family)?,
            VariantSelector::Any => f.write_str("*")?,
        }
        if let Some(part) = &self.part {
            write!(f, "__{}", part)?;
        }
        Ok(())
    }
}

impl From<&str> for SelectorKey {
    fn from(selector: &str) -> Self {
        SelectorKey::parse(selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            SelectorKey::parse("y-page"),
            SelectorKey::new("y-page", VariantSelector::None, None)
        );
        assert_eq!(
            SelectorKey::parse("button_action"),
            SelectorKey::new("button", VariantSelector::Exact("action".into()), None)
        );
        assert_eq!(
            SelectorKey::parse("y-page_islet*__title"),
            SelectorKey::new(
                "y-page",
                VariantSelector::Family("islet".into()),
                Some("title".into())
            )
        );
        assert_eq!(
            SelectorKey::parse("input*__control"),
            SelectorKey::new("input", VariantSelector::Any, Some("control".into()))
        );
        assert_eq!(
            SelectorKey::parse("list__item"),
            SelectorKey::new("list", VariantSelector::None, Some("item".into()))
        );
    }

    #[test]
    fn test_display_roundtrips_registration_strings() {
        for selector in ["c", "c_v", "c_v-x", "c_v*", "c*", "c__p", "c_v*__p", "c*__p"] {
            assert_eq!(SelectorKey::parse(selector).to_string(), selector);
        }
    }

    #[test]
    fn test_candidates_order() {
        let keys: Vec<String> = SelectorKey::candidates("c", Some("v-x"), Some("p"))
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, vec!["c_v-x__p", "c_v*__p", "c*__p"]);
    }

    #[test]
    fn test_candidates_without_variant() {
        let keys: Vec<String> = SelectorKey::candidates("c", None, None)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, vec!["c", "c*"]);
    }

    #[test]
    fn test_family_of_plain_variant_is_itself() {
        let keys = SelectorKey::candidates("y-page", Some("islet"), None);
        assert_eq!(keys[1], SelectorKey::parse("y-page_islet*"));
    }

    #[test]
    fn test_interpretations_keep_underscored_components() {
        let keys: Vec<SelectorKey> = SelectorKey::interpretations("my_comp");
        assert_eq!(
            keys,
            vec![
                SelectorKey::new("my", VariantSelector::Exact("comp".into()), None),
                SelectorKey::new("my_comp", VariantSelector::None, None),
            ]
        );
        assert_eq!(keys[0], SelectorKey::parse("my_comp"));

        let keys = SelectorKey::interpretations("a_b_c*__p");
        let shown: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(shown, vec!["a_b_c*__p"; 3]);
        assert_eq!(keys[1], SelectorKey::new("a_b", VariantSelector::Family("c".into()), Some("p".into())));
        assert_eq!(keys[2], SelectorKey::new("a_b_c", VariantSelector::Any, Some("p".into())));
    }

    #[test]
    fn test_interpretations_of_plain_name() {
        assert_eq!(SelectorKey::interpretations("y-page"), vec![SelectorKey::parse("y-page")]);
        assert_eq!(SelectorKey::interpretations("_x").len(), 1);
    }

    #[test]
    fn test_describe() {
        assert_eq!(SelectorKey::describe("loop", None), "loop");
        assert_eq!(SelectorKey::describe("loop", Some("item")), "loop__item");
    }
}
