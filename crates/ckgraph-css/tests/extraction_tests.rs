//! Fragment extraction from stylesheets.

use ckgraph::{ensure_valid, schema, AmbiguityKind, EdgeType, Fragment, NodeType};
use ckgraph_builder_api::{BuilderConfig, BuilderError, StructuralBuilder};
use ckgraph_css::CssBuilder;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SITE: &str = r#"/* Site styles */
@import "reset.css";
@import url("https://fonts.example.com/inter.css");
@import url(../../outside.css);

.btn, .btn-primary:hover {
  color: white;
}

#main .btn:focus::after {
  content: "{ .fake }";
}

a[href=".not-a-class"] { color: blue; }

@media (max-width: 600px) {
  .btn { padding: 0; }
  .mobile-only {}
}

@keyframes spin {
  from { transform: rotate(0deg); }
  to { transform: rotate(360deg); }
}

@font-face { font-family: Inter; src: url(inter.woff2); }
"#;

fn extract(source: &str, path: &str) -> Fragment {
    let fragment = CssBuilder::new().extract(source, path).unwrap();
    ensure_valid(&fragment, schema::global()).unwrap();
    fragment
}

fn ambiguity_targets(fragment: &Fragment, kind: AmbiguityKind) -> Vec<(&str, Option<usize>)> {
    fragment
        .ambiguities
        .iter()
        .filter(|a| a.kind == kind)
        .map(|a| (a.unresolved_target.as_str(), a.line))
        .collect()
}

#[test]
fn test_stylesheet_node() {
    let fragment = extract(SITE, "static/site.css");
    let sheet = fragment.node("Stylesheet:static/site.css").unwrap();

    assert_eq!(sheet.node_type, NodeType::Stylesheet);
    assert_eq!(sheet.name, "site.css");
    assert_eq!(sheet.file_hash.as_deref(), Some(fragment.file_hash.as_str()));
    assert_eq!(sheet.line_start, Some(1));
    assert_eq!(sheet.line_end, Some(26));
    assert_eq!(fragment.language, "css");
}

#[test]
fn test_selectors_defined() {
    let fragment = extract(SITE, "static/site.css");

    let mut ids: Vec<&str> = fragment.nodes.iter().map(|n| n.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(
        ids,
        vec![
            "StyleClass:.btn",
            "StyleClass:.btn-primary",
            "StyleClass:.mobile-only",
            "StyleId:#main",
            "Stylesheet:static/site.css",
        ]
    );

    let defines: Vec<&str> = fragment
        .edges
        .iter()
        .filter(|e| e.edge_type == EdgeType::Defines)
        .map(|e| {
            assert_eq!(e.source, "Stylesheet:static/site.css");
            e.target.as_str()
        })
        .collect();
    assert_eq!(defines.len(), 4);

    // First definition wins the line
    let btn = fragment.node("StyleClass:.btn").unwrap();
    assert_eq!(btn.file_path.as_deref(), Some("static/site.css"));
    assert_eq!(btn.line_start, Some(6));
    assert_eq!(fragment.node("StyleId:#main").unwrap().line_start, Some(10));
    assert_eq!(fragment.node("StyleClass:.mobile-only").unwrap().line_start, Some(18));
}

#[test]
fn test_pseudo_states_are_collected() {
    let fragment = extract(SITE, "static/site.css");

    let btn = fragment.node("StyleClass:.btn").unwrap();
    assert_eq!(
        btn.attributes.get_string_list("pseudo_states"),
        Some(&["focus".to_string(), "after".to_string()][..])
    );
    let primary = fragment.node("StyleClass:.btn-primary").unwrap();
    assert_eq!(
        primary.attributes.get_string_list("pseudo_states"),
        Some(&["hover".to_string()][..])
    );
    assert!(fragment
        .node("StyleClass:.mobile-only")
        .unwrap()
        .attributes
        .get_string_list("pseudo_states")
        .is_none());
}

#[test]
fn test_strings_and_attribute_selectors_ignored() {
    let fragment = extract(SITE, "static/site.css");
    assert!(!fragment.contains_node("StyleClass:.fake"));
    assert!(!fragment.contains_node("StyleClass:.not-a-class"));
}

#[test]
fn test_imports() {
    let fragment = extract(SITE, "static/site.css");

    let imports: Vec<_> = fragment
        .edges
        .iter()
        .filter(|e| e.edge_type == EdgeType::Imports)
        .collect();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].source, "Stylesheet:static/site.css");
    assert_eq!(imports[0].target, "Stylesheet:static/reset.css");
    assert_eq!(imports[0].attributes.get_int("line"), Some(2));

    assert_eq!(
        ambiguity_targets(&fragment, AmbiguityKind::ExternalReference),
        vec![("https://fonts.example.com/inter.css", Some(3))]
    );
    assert_eq!(
        ambiguity_targets(&fragment, AmbiguityKind::UnresolvedImport),
        vec![("../../outside.css", Some(4))]
    );
}

#[test]
fn test_at_rule_ambiguities() {
    let fragment = extract(SITE, "static/site.css");

    assert_eq!(
        ambiguity_targets(&fragment, AmbiguityKind::ResponsiveBreakpoint),
        vec![("@media (max-width: 600px)", Some(16))]
    );
    assert_eq!(
        ambiguity_targets(&fragment, AmbiguityKind::AnimationDefined),
        vec![("@keyframes spin", Some(21))]
    );
    // @font-face is skipped silently
    assert_eq!(fragment.ambiguities.len(), 4);
    assert!(fragment
        .ambiguities
        .iter()
        .all(|a| a.source == "Stylesheet:static/site.css"));
}

#[test]
fn test_grouping_rules_are_scanned() {
    let css = "@supports (display: grid) {\n  @layer base {\n    .grid { display: grid; }\n  }\n}\n";
    let fragment = extract(css, "grid.css");

    assert_eq!(fragment.node("StyleClass:.grid").unwrap().line_start, Some(3));
    assert!(fragment.ambiguities.is_empty());
}

#[test]
fn test_nested_rules_define_selectors() {
    let css = ".card {\n  color: red;\n  &:hover { color: blue; }\n  .title {\n    &.active {}\n  }\n}\n";
    let fragment = extract(css, "card.css");

    assert_eq!(fragment.node("StyleClass:.card").unwrap().line_start, Some(1));
    assert_eq!(fragment.node("StyleClass:.title").unwrap().line_start, Some(4));
    assert_eq!(fragment.node("StyleClass:.active").unwrap().line_start, Some(5));
    assert!(fragment
        .edges
        .iter()
        .any(|e| e.edge_type == EdgeType::Defines && e.target == "StyleClass:.title"));
    assert!(fragment.ambiguities.is_empty());
}

#[test]
fn test_scope_rules_are_scanned() {
    let fragment = extract("@scope (.card) {\n  .inner { color: red; }\n}\n", "scope.css");

    assert_eq!(fragment.node("StyleClass:.inner").unwrap().line_start, Some(2));
    // The scoping root is a reference, not a definition
    assert!(!fragment.contains_node("StyleClass:.card"));
    assert!(fragment.ambiguities.is_empty());
}

#[test]
fn test_unknown_at_rule_block_is_reported() {
    let css = ".a {}\n@custom-block --wide {\n  .hidden {}\n}\n@font-face { font-family: X; }\n";
    let fragment = extract(css, "custom.css");

    assert!(fragment.contains_node("StyleClass:.a"));
    assert!(!fragment.contains_node("StyleClass:.hidden"));
    assert_eq!(
        ambiguity_targets(&fragment, AmbiguityKind::UnresolvedSymbol),
        vec![("@custom-block --wide", Some(2))]
    );
    assert_eq!(fragment.ambiguities.len(), 1);
}

#[test]
fn test_depth_limit() {
    let builder = CssBuilder::with_config(BuilderConfig::default().with_max_depth(1));
    let css = "@media print {\n  .hidden { display: none; }\n}\n.top {}\n";
    let fragment = builder.extract(css, "print.css").unwrap();

    assert!(fragment.contains_node("StyleClass:.top"));
    assert!(!fragment.contains_node("StyleClass:.hidden"));
    let limit = fragment
        .ambiguities
        .iter()
        .find(|a| a.kind == AmbiguityKind::RecursionLimit)
        .unwrap();
    assert_eq!(limit.unresolved_target, ".hidden");
    assert_eq!(limit.line, Some(2));
    assert!(limit.reason.as_deref().unwrap().contains("max_depth 1"));
}

#[test]
fn test_malformed_css_does_not_fail() {
    let fragment = extract("} .a { color: red;\n/* never closed .b {}", "broken.css");
    assert!(fragment.contains_node("StyleClass:.a"));
    assert!(!fragment.contains_node("StyleClass:.b"));

    let fragment = extract(".c { content: \"unterminated\n}\n.d {}", "strings.css");
    assert!(fragment.contains_node("StyleClass:.c"));
    assert!(fragment.contains_node("StyleClass:.d"));
}

#[test]
fn test_non_ascii_names() {
    let fragment = extract(".héllo, #_x-1 {}", "i18n.css");
    assert!(fragment.contains_node("StyleClass:.héllo"));
    assert!(fragment.contains_node("StyleId:#_x-1"));
}

#[test]
fn test_empty_stylesheet() {
    let fragment = extract("", "empty.css");
    assert_eq!(fragment.nodes.len(), 1);
    assert!(fragment.edges.is_empty());
    assert!(fragment.ambiguities.is_empty());
}

#[test]
fn test_windows_path_is_normalized() {
    let fragment = extract(".a {}", "static\\css\\a.css");
    assert!(fragment.contains_node("Stylesheet:static/css/a.css"));
    assert_eq!(
        fragment.node("StyleClass:.a").unwrap().file_path.as_deref(),
        Some("static/css/a.css")
    );
}

#[test]
fn test_extraction_is_deterministic() {
    let builder = CssBuilder::new();
    let first = builder.extract(SITE, "site.css").unwrap();
    let second = builder.extract(SITE, "site.css").unwrap();

    assert_eq!(first.nodes, second.nodes);
    assert_eq!(first.edges, second.edges);
    assert_eq!(first.ambiguities, second.ambiguities);
}

#[test]
fn test_extract_file_anchors_to_root() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("static/css")).unwrap();
    fs::write(dir.path().join("static/css/app.css"), "@import \"../base.css\";\n.app {}\n").unwrap();

    let fragment = CssBuilder::new()
        .extract_file(dir.path(), Path::new("static/css/app.css"))
        .unwrap();
    assert_eq!(fragment.source_file, "static/css/app.css");
    assert!(fragment.contains_node("Stylesheet:static/css/app.css"));
    assert!(fragment
        .edges
        .iter()
        .any(|e| e.edge_type == EdgeType::Imports && e.target == "Stylesheet:static/base.css"));
}

#[test]
fn test_oversized_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("big.css"), ".x {}\n".repeat(100)).unwrap();

    let builder = CssBuilder::with_config(BuilderConfig::default().with_max_file_size(64));
    let result = builder.extract_file(dir.path(), Path::new("big.css"));
    assert!(matches!(result, Err(BuilderError::FileTooLarge(_, 600))));
}
