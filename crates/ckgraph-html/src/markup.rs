//! Reading elements and attributes out of the tree-sitter HTML tree.

use tree_sitter::Node;

/// Opening tag of an element with its attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Lowercase tag name
    pub name: String,
    /// Lowercase attribute names with raw values; valueless attributes map to ""
    pub attributes: Vec<(String, String)>,
    pub line: usize,
}

impl Tag {
    /// First value of an attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Element-like node kinds; each one adds a level of nesting.
pub fn is_element(node: Node) -> bool {
    matches!(node.kind(), "element" | "script_element" | "style_element")
}

/// Opening tag of an element, or the element itself when self-closing.
pub fn opening_tag(element: Node, source: &[u8]) -> Option<Tag> {
    let mut cursor = element.walk();
    let tag = element
        .named_children(&mut cursor)
        .find(|child| matches!(child.kind(), "start_tag" | "self_closing_tag"))?;
    parse_tag(tag, source)
}

fn parse_tag(tag: Node, source: &[u8]) -> Option<Tag> {
    let mut cursor = tag.walk();
    let mut name = None;
    let mut attributes = Vec::new();

    for child in tag.named_children(&mut cursor) {
        match child.kind() {
            "tag_name" => name = Some(text(child, source).to_ascii_lowercase()),
            "attribute" => {
                if let Some(attribute) = parse_attribute(child, source) {
                    attributes.push(attribute);
                }
            }
            _ => {}
        }
    }

    Some(Tag {
        name: name?,
        attributes,
        line: tag.start_position().row + 1,
    })
}

fn parse_attribute(attribute: Node, source: &[u8]) -> Option<(String, String)> {
    let mut cursor = attribute.walk();
    let mut name = None;
    let mut value = String::new();

    for child in attribute.named_children(&mut cursor) {
        match child.kind() {
            "attribute_name" => name = Some(text(child, source).to_ascii_lowercase()),
            "attribute_value" => value = text(child, source).to_string(),
            "quoted_attribute_value" => {
                // `""` has no attribute_value child
                let mut inner = child.walk();
                value = child
                    .named_children(&mut inner)
                    .find(|n| n.kind() == "attribute_value")
                    .map(|n| text(n, source).to_string())
                    .unwrap_or_default();
            }
            _ => {}
        }
    }

    Some((name?, value))
}

fn text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn first_tag(html: &str) -> Tag {
        let mut parser = Parser::new();
        let language: tree_sitter::Language = tree_sitter_html::LANGUAGE.into();
        parser.set_language(&language).unwrap();
        let tree = parser.parse(html, None).unwrap();

        let mut stack = vec![tree.root_node()];
        while let Some(node) = stack.pop() {
            if is_element(node) {
                return opening_tag(node, html.as_bytes()).unwrap();
            }
            let mut cursor = node.walk();
            stack.extend(node.named_children(&mut cursor));
        }
        panic!("no element in {html}");
    }

    #[test]
    fn test_attributes() {
        let tag = first_tag("<DIV Class=\"btn primary\" id=main hidden data-x=''></DIV>");
        assert_eq!(tag.name, "div");
        assert_eq!(tag.attribute("class"), Some("btn primary"));
        assert_eq!(tag.attribute("id"), Some("main"));
        assert_eq!(tag.attribute("hidden"), Some(""));
        assert_eq!(tag.attribute("data-x"), Some(""));
        assert_eq!(tag.attribute("missing"), None);
        assert_eq!(tag.line, 1);
    }

    #[test]
    fn test_void_and_self_closing() {
        let tag = first_tag("\n<link rel=\"stylesheet\" href=\"/static/site.css\">");
        assert_eq!(tag.name, "link");
        assert_eq!(tag.attribute("href"), Some("/static/site.css"));
        assert_eq!(tag.line, 2);

        let tag = first_tag("<img src=\"logo.png\"/>");
        assert_eq!(tag.name, "img");
        assert_eq!(tag.attribute("src"), Some("logo.png"));
    }
}
