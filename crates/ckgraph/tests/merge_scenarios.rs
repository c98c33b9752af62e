//! Integration tests for validation and merge across fragments of different languages.

use ckgraph::identity::{file_id, symbol_id};
use ckgraph::{
    content_hash, ensure_valid, export, merge, schema, Ambiguity, AmbiguityKind, Edge, EdgeType,
    Fragment, GraphError, Node, NodeType, QueryEngine,
};

fn stylesheet(path: &str, selectors: &[(&str, usize)]) -> Fragment {
    let hash = content_hash(path.as_bytes());
    let sheet_id = file_id(NodeType::Stylesheet, path);
    let mut fragment = Fragment::new(path, &hash, "css");
    fragment.add_node(
        Node::new(&sheet_id, NodeType::Stylesheet, path)
            .with_file(path)
            .with_hash(&hash),
    );
    for (selector, line) in selectors {
        let id = symbol_id(NodeType::StyleClass, selector);
        fragment.add_node(
            Node::new(&id, NodeType::StyleClass, *selector)
                .with_file(path)
                .with_line(*line),
        );
        fragment.add_edge(Edge::new(&sheet_id, id, EdgeType::Defines));
    }
    fragment
}

fn template(path: &str, classes: &[&str], stylesheet_href: Option<&str>) -> Fragment {
    let hash = content_hash(format!("{path}{classes:?}").as_bytes());
    let template_id = file_id(NodeType::Template, path);
    let mut fragment = Fragment::new(path, &hash, "html");
    fragment.add_node(
        Node::new(&template_id, NodeType::Template, path)
            .with_file(path)
            .with_hash(&hash),
    );
    for class in classes {
        let id = symbol_id(NodeType::StyleClass, class);
        fragment.add_node(Node::new(&id, NodeType::StyleClass, *class));
        fragment.add_edge(Edge::new(&template_id, id, EdgeType::UsesStyle));
    }
    if let Some(href) = stylesheet_href {
        fragment.add_edge(Edge::new(
            &template_id,
            file_id(NodeType::Stylesheet, href),
            EdgeType::LinksStaticAsset,
        ));
    }
    fragment
}

#[test]
fn test_style_class_is_shared_between_stylesheet_and_template() {
    let css = stylesheet("style.css", &[(".btn", 1)]);
    let html = template("index.html", &[".btn"], Some("style.css"));
    for fragment in [&css, &html] {
        ensure_valid(fragment, schema::global()).unwrap();
    }

    let graph = merge(vec![html, css]);

    let btn = graph.get_node("StyleClass:.btn").unwrap();
    assert_eq!(btn.file_path.as_deref(), Some("style.css"));
    assert_eq!(btn.line_start, Some(1));

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
    assert!(graph.outgoing("Template:index.html").any(|e| e.target == "Stylesheet:style.css"));
    assert!(graph.ambiguities().is_empty());
}

#[test]
fn test_merge_is_independent_of_input_order() {
    let fragments = vec![
        stylesheet("static/a.css", &[(".btn", 2), (".card", 9)]),
        stylesheet("static/b.css", &[(".btn", 5)]),
        template("templates/index.html", &[".btn", ".card", ".missing"], Some("static/a.css")),
        template("templates/login.html", &[".btn"], Some("static/gone.css")),
    ];
    let mut reversed = fragments.clone();
    reversed.reverse();

    let forward = export::to_json(&merge(fragments)).unwrap();
    let backward = export::to_json(&merge(reversed)).unwrap();

    assert_eq!(forward, backward);
}

#[test]
fn test_merged_graph_has_no_orphans() {
    let html = template("templates/login.html", &[".btn"], Some("static/gone.css"));
    let graph = merge(vec![html]);

    for edge in graph.edges() {
        assert!(graph.contains_node(&edge.source));
        assert!(graph.contains_node(&edge.target));
    }
    let orphan = graph
        .ambiguities()
        .iter()
        .find(|a| a.kind == AmbiguityKind::OrphanEdgeDropped)
        .unwrap();
    assert_eq!(orphan.unresolved_target, "Stylesheet:static/gone.css");
    assert_eq!(orphan.source, "Template:templates/login.html");
}

#[test]
fn test_invalid_fragment_stops_before_merge() {
    let mut html = template("index.html", &[], None);
    html.add_edge(Edge::new("Template:index.html", "Route:/login", EdgeType::Calls));

    let err = ensure_valid(&html, schema::global()).unwrap_err();
    assert!(matches!(err, GraphError::SchemaViolation { ref source_file, .. } if source_file == "index.html"));
}

#[test]
fn test_scoped_declarations_with_same_name_stay_distinct() {
    let mut fragments = Vec::new();
    for path in ["app/a.py", "app/b.py"] {
        let hash = content_hash(path.as_bytes());
        let mut fragment = Fragment::new(path, &hash, "python");
        let file = file_id(NodeType::File, path);
        fragment.add_node(Node::new(&file, NodeType::File, path).with_file(path).with_hash(&hash));
        let func = format!("{path}::helper");
        fragment.add_node(Node::new(&func, NodeType::Function, "helper").with_file(path));
        fragment.add_edge(Edge::new(&file, &func, EdgeType::Defines));
        fragment.add_ambiguity(Ambiguity::new(&func, "os.getenv", AmbiguityKind::UnresolvedCall).with_line(3));
        fragments.push(fragment);
    }

    let graph = merge(fragments);
    let engine = QueryEngine::new(&graph);

    let hits = engine.search("helper", Some(NodeType::Function));
    assert_eq!(hits.len(), 2);
    assert_eq!(graph.ambiguity_count(), 2);
    assert_eq!(engine.stats().node_type_histogram[&NodeType::File], 2);
}

#[test]
fn test_same_file_under_two_spellings_merges_into_one_node() {
    let mut fragments = Vec::new();
    for (path, content) in [("app/a.py", "x = 1\n"), ("./app/a.py", "x = 2\n")] {
        let hash = content_hash(content.as_bytes());
        let mut fragment = Fragment::new(path, &hash, "python");
        fragment.add_node(
            Node::new(format!("File:{path}"), NodeType::File, "a.py")
                .with_file(path)
                .with_hash(&hash),
        );
        fragments.push(fragment);
    }
    let mut hashes: Vec<String> = fragments.iter().map(|f| f.file_hash.clone()).collect();
    hashes.sort();

    let graph = merge(fragments);

    assert_eq!(graph.node_count(), 1);
    let file = graph.get_node("File:app/a.py").unwrap();
    assert_eq!(file.file_path.as_deref(), Some("app/a.py"));
    assert_eq!(file.file_hash.as_deref(), Some(hashes[0].as_str()));

    let conflicts: Vec<_> = graph
        .ambiguities()
        .iter()
        .filter(|a| a.kind == AmbiguityKind::AttributeConflict)
        .collect();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].source, "File:app/a.py");
    assert_eq!(conflicts[0].unresolved_target, format!("file_hash={}", hashes[1]));
}
