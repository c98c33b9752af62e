//! Templates and stylesheets merged into one graph.

use ckgraph::{merge, AmbiguityKind, EdgeType, QueryEngine};
use ckgraph_builder_api::{Pipeline, PipelineConfig, StructuralBuilder};
use ckgraph_css::CssBuilder;
use ckgraph_html::HtmlBuilder;
use std::fs;
use tempfile::TempDir;

const STYLE: &str = ".btn { color: red; }\n.btn:hover { color: blue; }\n";
const INDEX: &str = "<link rel=\"stylesheet\" href=\"style.css\">\n<button class=\"btn\">Go</button>\n";

#[test]
fn test_style_class_merges_across_languages() {
    let css = CssBuilder::new().extract(STYLE, "style.css").unwrap();
    let html = HtmlBuilder::new().extract(INDEX, "index.html").unwrap();

    let graph = merge(vec![css, html]);

    let btn = graph.get_node("StyleClass:.btn").unwrap();
    assert_eq!(btn.file_path.as_deref(), Some("style.css"));
    assert_eq!(btn.line_start, Some(1));
    assert_eq!(
        btn.attributes.get_string_list("pseudo_states"),
        Some(&["hover".to_string()][..])
    );

    let incoming: Vec<_> = graph
        .incoming("StyleClass:.btn")
        .map(|e| (e.source.as_str(), e.edge_type))
        .collect();
    assert_eq!(
        incoming,
        vec![
            ("Stylesheet:style.css", EdgeType::Defines),
            ("Template:index.html", EdgeType::UsesStyle),
        ]
    );

    let link = graph
        .outgoing("Template:index.html")
        .find(|e| e.target == "Stylesheet:style.css")
        .unwrap();
    assert_eq!(link.edge_type, EdgeType::LinksStaticAsset);
    assert!(graph.ambiguities().is_empty());
}

#[test]
fn test_merge_is_order_independent() {
    let css = || CssBuilder::new().extract(STYLE, "style.css").unwrap();
    let html = || HtmlBuilder::new().extract(INDEX, "index.html").unwrap();

    assert_eq!(merge(vec![css(), html()]), merge(vec![html(), css()]));
}

#[test]
fn test_missing_stylesheet_drops_link() {
    let html = HtmlBuilder::new().extract(INDEX, "index.html").unwrap();
    let graph = merge(vec![html]);

    assert!(!graph.contains_node("Stylesheet:style.css"));
    assert_eq!(graph.outgoing("Template:index.html").count(), 1);
    let dropped: Vec<_> = graph
        .ambiguities()
        .iter()
        .filter(|a| a.kind == AmbiguityKind::OrphanEdgeDropped)
        .collect();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].source, "Template:index.html");
}

#[test]
fn test_competing_definitions_keep_first_stylesheet() {
    let a = CssBuilder::new().extract(".btn {}", "a.css").unwrap();
    let b = CssBuilder::new().extract("\n.btn {}", "b.css").unwrap();

    let graph = merge(vec![b, a]);

    let btn = graph.get_node("StyleClass:.btn").unwrap();
    assert_eq!(btn.file_path.as_deref(), Some("a.css"));
    assert_eq!(btn.line_start, Some(1));
    assert_eq!(graph.incoming("StyleClass:.btn").count(), 2);

    let conflicts: Vec<_> = graph
        .ambiguities()
        .iter()
        .filter(|a| a.kind == AmbiguityKind::AttributeConflict)
        .map(|a| a.unresolved_target.as_str())
        .collect();
    assert!(conflicts.contains(&"file_path=b.css"));
}

#[test]
fn test_project_build_with_both_builders() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("templates")).unwrap();
    fs::create_dir_all(root.join("static")).unwrap();
    fs::create_dir_all(root.join("node_modules/lib")).unwrap();

    fs::write(
        root.join("templates/index.html"),
        "<link rel=\"stylesheet\" href=\"/static/site.css\">\n<nav id=\"menu\" class=\"btn\" hx-get=\"/api/menu\"></nav>\n",
    )
    .unwrap();
    fs::write(
        root.join("templates/about.html"),
        "<button class=\"btn\" hx-get=\"/api/menu\">Menu</button>\n",
    )
    .unwrap();
    fs::write(root.join("static/site.css"), "@import \"theme.css\";\n.btn {}\n#menu {}\n").unwrap();
    fs::write(root.join("static/theme.css"), ".dark {}\n").unwrap();
    fs::write(root.join("node_modules/lib/vendor.css"), ".vendor {}\n").unwrap();

    let pipeline = Pipeline::new(PipelineConfig::new(root))
        .with_builder(HtmlBuilder::new())
        .with_builder(CssBuilder::new());
    let outcome = pipeline.build_project().unwrap();
    let graph = &outcome.graph;

    assert_eq!(outcome.report.files, 4);
    assert_eq!(outcome.report.per_language.get("html"), Some(&2));
    assert_eq!(outcome.report.per_language.get("css"), Some(&2));
    assert!(!graph.contains_node("StyleClass:.vendor"));

    // Both templates reach the same route node
    let callers: Vec<_> = graph
        .incoming("Route:/api/menu")
        .map(|e| e.source.as_str())
        .collect();
    assert_eq!(callers, vec!["Template:templates/about.html", "Template:templates/index.html"]);

    assert!(graph
        .outgoing("Stylesheet:static/site.css")
        .any(|e| e.edge_type == EdgeType::Imports && e.target == "Stylesheet:static/theme.css"));
    assert!(graph
        .outgoing("Template:templates/index.html")
        .any(|e| e.target == "Stylesheet:static/site.css"));
    assert_eq!(
        graph.get_node("StyleId:#menu").unwrap().file_path.as_deref(),
        Some("static/site.css")
    );

    // Changing .btn affects both templates through their shared class
    let engine = QueryEngine::new(graph);
    let impact = engine.impact("StyleClass:.btn", None).unwrap();
    assert!(impact.reached.contains_key("Template:templates/index.html"));
    assert!(impact.reached.contains_key("Template:templates/about.html"));
    assert!(impact.reached.contains_key("Stylesheet:static/site.css"));
}
