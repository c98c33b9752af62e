//! Pipeline behavior with a line-based toy builder.

use ckgraph::identity::{file_id, scoped_id};
use ckgraph::{AmbiguityKind, Edge, EdgeType, Fragment, Node, NodeType};
use ckgraph_builder_api::{
    BuilderConfig, BuilderError, BuilderMetrics, EmitContext, Pipeline, PipelineConfig,
    StructuralBuilder,
};
use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;

/// Understands `.toy` files: `def NAME` declares a function, `use PATH`
/// imports another toy file, `bad` emits an edge the schema rejects and
/// `raw` emits an edge without going through the schema check.
struct ToyBuilder {
    config: BuilderConfig,
    metrics: Mutex<BuilderMetrics>,
}

impl ToyBuilder {
    fn new(config: BuilderConfig) -> Self {
        Self {
            config,
            metrics: Mutex::new(BuilderMetrics::default()),
        }
    }
}

impl StructuralBuilder for ToyBuilder {
    fn language(&self) -> &str {
        "toy"
    }

    fn file_extensions(&self) -> &[&str] {
        &[".toy"]
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Fragment, BuilderError> {
        let schema = ckgraph::schema::global();
        let mut ctx = EmitContext::new(file_path, "toy", source, schema);
        let file = file_id(NodeType::File, file_path);
        let hash = ctx.file_hash().to_string();
        ctx.node(Node::new(&file, NodeType::File, file_path).with_file(file_path).with_hash(hash));

        let mut raw_edges = Vec::new();
        for (index, line) in source.lines().enumerate() {
            let line_no = index + 1;
            let mut words = line.split_whitespace();
            match (words.next(), words.next()) {
                (Some("def"), Some(name)) => {
                    let id = scoped_id(file_path, name);
                    ctx.node(
                        Node::new(&id, NodeType::Function, name)
                            .with_file(file_path)
                            .with_line(line_no),
                    );
                    ctx.edge(Edge::new(&file, &id, EdgeType::Defines));
                }
                (Some("use"), Some(path)) => {
                    ctx.edge(Edge::new(&file, file_id(NodeType::File, path), EdgeType::Imports));
                }
                (Some("bad"), _) => {
                    ctx.edge(Edge::new(&file, &file, EdgeType::Extends).with_attribute("line", line_no));
                }
                (Some("raw"), _) => {
                    raw_edges.push(Edge::new(&file, &file, EdgeType::Extends));
                }
                _ => {}
            }
        }

        let mut fragment = ctx.finish();
        for edge in raw_edges {
            fragment.add_edge(edge);
        }
        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.record_success(&fragment, std::time::Duration::ZERO);
        }
        Ok(fragment)
    }

    fn config(&self) -> &BuilderConfig {
        &self.config
    }

    fn metrics(&self) -> BuilderMetrics {
        self.metrics.lock().unwrap().clone()
    }

    fn reset_metrics(&mut self) {
        *self.metrics.lock().unwrap() = BuilderMetrics::default();
    }
}

fn write_project(dir: &TempDir) {
    let root = dir.path();
    fs::create_dir_all(root.join("lib")).unwrap();
    fs::create_dir_all(root.join("node_modules/dep")).unwrap();
    fs::write(root.join("main.toy"), "use lib/util.toy\nuse lib/missing.toy\ndef main\n").unwrap();
    fs::write(root.join("lib/util.toy"), "def helper\n").unwrap();
    fs::write(root.join("node_modules/dep/x.toy"), "def ignored\n").unwrap();
    fs::write(root.join("README.md"), "# not toy\n").unwrap();
}

#[test]
fn test_build_project_merges_and_drops_orphans() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);

    let pipeline = Pipeline::new(PipelineConfig::new(dir.path()))
        .with_builder(ToyBuilder::new(BuilderConfig::default()));
    let outcome = pipeline.build_project().unwrap();

    assert_eq!(outcome.report.files, 2);
    assert_eq!(outcome.report.per_language.get("toy"), Some(&2));

    let graph = &outcome.graph;
    assert!(graph.contains_node("File:main.toy"));
    assert!(graph.contains_node("lib/util.toy::helper"));
    assert!(!graph.contains_node("node_modules/dep/x.toy::ignored"));

    let imports: Vec<_> = graph
        .outgoing("File:main.toy")
        .filter(|e| e.edge_type == EdgeType::Imports)
        .map(|e| e.target.clone())
        .collect();
    assert_eq!(imports, vec!["File:lib/util.toy".to_string()]);

    let orphan = graph
        .ambiguities()
        .iter()
        .find(|a| a.kind == AmbiguityKind::OrphanEdgeDropped)
        .unwrap();
    assert_eq!(orphan.unresolved_target, "File:lib/missing.toy");
    assert_eq!(outcome.report.ambiguities, graph.ambiguity_count());
}

#[test]
fn test_parallel_build_matches_sequential() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);

    let sequential = Pipeline::new(PipelineConfig::new(dir.path()))
        .with_builder(ToyBuilder::new(BuilderConfig::default()))
        .build_project()
        .unwrap();

    let mut config = PipelineConfig::new(dir.path());
    config.builder = BuilderConfig::default().with_parallel(true);
    config.builder.parallel_workers = Some(2);
    let parallel = Pipeline::new(config.clone())
        .with_builder(ToyBuilder::new(config.builder.clone()))
        .build_project()
        .unwrap();

    assert_eq!(sequential.graph, parallel.graph);
}

#[test]
fn test_schema_rejection_recorded_as_ambiguity() {
    let pipeline = Pipeline::new(PipelineConfig::default())
        .with_builder(ToyBuilder::new(BuilderConfig::default()));
    let outcome = pipeline
        .build_sources(&[("a.toy".to_string(), "def f\nbad\n".to_string())])
        .unwrap();

    let violation = outcome
        .graph
        .ambiguities()
        .iter()
        .find(|a| a.kind == AmbiguityKind::SchemaViolation)
        .unwrap();
    assert_eq!(violation.source, "File:a.toy");
    assert_eq!(violation.line, Some(2));
}

#[test]
fn test_invalid_fragment_aborts_build() {
    let pipeline = Pipeline::new(PipelineConfig::default())
        .with_builder(ToyBuilder::new(BuilderConfig::default()));
    let err = pipeline
        .build_sources(&[
            ("a.toy".to_string(), "def f\n".to_string()),
            ("b.toy".to_string(), "raw\n".to_string()),
        ])
        .unwrap_err();

    match err {
        BuilderError::Graph(ckgraph::GraphError::SchemaViolation { source_file, .. }) => {
            assert_eq!(source_file, "b.toy");
        }
        other => panic!("expected schema violation, got {other}"),
    }
}

#[test]
fn test_language_filter_and_exclude_patterns() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);

    let config = PipelineConfig::new(dir.path()).with_exclude_pattern("lib/**");
    let pipeline = Pipeline::new(config).with_builder(ToyBuilder::new(BuilderConfig::default()));
    let files = pipeline.discover().unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("main.toy"));

    let config = PipelineConfig::new(dir.path()).with_languages(["python"]);
    let pipeline = Pipeline::new(config).with_builder(ToyBuilder::new(BuilderConfig::default()));
    assert!(pipeline.discover().unwrap().is_empty());
}

#[test]
fn test_metrics_and_reset() {
    let mut builder = ToyBuilder::new(BuilderConfig::default());
    builder.extract("def a\ndef b\n", "m.toy").unwrap();

    let metrics = builder.metrics();
    assert_eq!(metrics.files_succeeded, 1);
    assert_eq!(metrics.total_nodes, 3);
    assert_eq!(metrics.total_edges, 2);

    builder.reset_metrics();
    assert_eq!(builder.metrics().files_attempted, 0);
}

#[test]
fn test_extract_file_too_large() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("big.toy"), "def x\n".repeat(100)).unwrap();

    let builder = ToyBuilder::new(BuilderConfig::default().with_max_file_size(16));
    let err = builder
        .extract_file(dir.path(), &dir.path().join("big.toy"))
        .unwrap_err();
    assert!(matches!(err, BuilderError::FileTooLarge(..)));
}
