//! Declarative interaction rules: which attribute of which element links a
//! template to which kind of node.

use ckgraph::{EdgeType, NodeType};

/// Kind of node an attribute value points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Route,
    /// A stylesheet file of the project, resolved to its path
    Stylesheet,
    StaticAsset,
    /// Whitespace-separated class tokens
    StyleClasses,
    StyleId,
}

impl TargetKind {
    pub fn node_type(self) -> NodeType {
        match self {
            TargetKind::Route => NodeType::Route,
            TargetKind::Stylesheet => NodeType::Stylesheet,
            TargetKind::StaticAsset => NodeType::StaticAsset,
            TargetKind::StyleClasses => NodeType::StyleClass,
            TargetKind::StyleId => NodeType::StyleId,
        }
    }

    /// Whether the value is a URL (as opposed to a style name)
    pub fn is_link(self) -> bool {
        matches!(
            self,
            TargetKind::Route | TargetKind::Stylesheet | TargetKind::StaticAsset
        )
    }
}

/// HTTP method recorded on `calls_api` edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodSource {
    None,
    Fixed(&'static str),
    /// The element's `method` attribute, `GET` when absent
    FormAttribute,
}

#[derive(Debug, Clone, Copy)]
pub struct InteractionRule {
    /// Element the rule applies to; `None` matches every element
    pub tag: Option<&'static str>,
    pub attribute: &'static str,
    /// The element's `rel` must contain one of these tokens (empty: no condition)
    pub rel: &'static [&'static str],
    pub target: TargetKind,
    pub edge: EdgeType,
    pub method: MethodSource,
}

const fn htmx(attribute: &'static str, method: &'static str) -> InteractionRule {
    InteractionRule {
        tag: None,
        attribute,
        rel: &[],
        target: TargetKind::Route,
        edge: EdgeType::CallsApi,
        method: MethodSource::Fixed(method),
    }
}

const fn asset(tag: &'static str, attribute: &'static str, rel: &'static [&'static str]) -> InteractionRule {
    InteractionRule {
        tag: Some(tag),
        attribute,
        rel,
        target: TargetKind::StaticAsset,
        edge: EdgeType::LinksStaticAsset,
        method: MethodSource::None,
    }
}

pub const RULES: &[InteractionRule] = &[
    htmx("hx-get", "GET"),
    htmx("hx-post", "POST"),
    htmx("hx-put", "PUT"),
    htmx("hx-patch", "PATCH"),
    htmx("hx-delete", "DELETE"),
    InteractionRule {
        tag: Some("form"),
        attribute: "action",
        rel: &[],
        target: TargetKind::Route,
        edge: EdgeType::CallsApi,
        method: MethodSource::FormAttribute,
    },
    InteractionRule {
        tag: Some("link"),
        attribute: "href",
        rel: &["stylesheet"],
        target: TargetKind::Stylesheet,
        edge: EdgeType::LinksStaticAsset,
        method: MethodSource::None,
    },
    asset("link", "href", &["icon", "apple-touch-icon"]),
    asset("script", "src", &[]),
    asset("img", "src", &[]),
    InteractionRule {
        tag: None,
        attribute: "class",
        rel: &[],
        target: TargetKind::StyleClasses,
        edge: EdgeType::UsesStyle,
        method: MethodSource::None,
    },
    InteractionRule {
        tag: None,
        attribute: "id",
        rel: &[],
        target: TargetKind::StyleId,
        edge: EdgeType::UsesStyle,
        method: MethodSource::None,
    },
];

impl InteractionRule {
    /// Whether the rule fires on an element, given its lowercase tag name and
    /// a lookup for its attributes.
    pub fn applies<'a>(&self, tag: &str, attribute: impl Fn(&str) -> Option<&'a str>) -> bool {
        if self.tag.is_some_and(|t| t != tag) || attribute(self.attribute).is_none() {
            return false;
        }
        if self.rel.is_empty() {
            return true;
        }
        attribute("rel").is_some_and(|rel| {
            rel.split_whitespace()
                .any(|token| self.rel.iter().any(|r| token.eq_ignore_ascii_case(r)))
        })
    }

    /// HTTP method for the edge; `declared` is the element's `method` attribute.
    pub fn method(&self, declared: Option<&str>) -> Option<String> {
        match self.method {
            MethodSource::None => None,
            MethodSource::Fixed(method) => Some(method.to_string()),
            MethodSource::FormAttribute => Some(
                declared
                    .map(|m| m.trim().to_ascii_uppercase())
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "GET".to_string()),
            ),
        }
    }
}
