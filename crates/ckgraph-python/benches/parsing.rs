use ckgraph_builder_api::{BuilderConfig, Pipeline, PipelineConfig, StructuralBuilder};
use ckgraph_python::PythonBuilder;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fs;
use tempfile::TempDir;

fn module_source(index: usize) -> String {
    let mut source = format!("\"\"\"Module {index}.\"\"\"\n\nimport os\nfrom .base import Base\n\nLIMIT = {index}\n\n");
    for class in 0..5 {
        source.push_str(&format!(
            "class Model{class}(Base):\n    count = 0\n\n    def save(self, force=False):\n        self.count = 1\n        return self.validate()\n\n    def validate(self):\n        return os.path.exists(\"x\")\n\n"
        ));
    }
    for func in 0..10 {
        source.push_str(&format!(
            "def helper_{func}(value, limit=LIMIT):\n    result = Model0()\n    return len(str(value))\n\n"
        ));
    }
    source
}

fn bench_extract_single_file(c: &mut Criterion) {
    let source = module_source(0);
    let builder = PythonBuilder::new();

    c.bench_function("extract_single_file", |b| {
        b.iter(|| builder.extract(black_box(&source), "pkg/module_0.py").unwrap());
    });
}

fn bench_build_project(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let package = dir.path().join("pkg");
    fs::create_dir_all(&package).unwrap();
    fs::write(package.join("base.py"), "class Base:\n    pass\n").unwrap();
    for index in 0..50 {
        fs::write(package.join(format!("module_{index}.py")), module_source(index)).unwrap();
    }

    let mut group = c.benchmark_group("project");

    group.bench_function("sequential", |b| {
        let pipeline = Pipeline::new(PipelineConfig::new(dir.path())).with_builder(PythonBuilder::new());
        b.iter(|| pipeline.build_project().unwrap());
    });

    for workers in [2, 4] {
        group.bench_function(format!("parallel_{workers}"), |b| {
            let mut builder_config = BuilderConfig::default().with_parallel(true);
            builder_config.parallel_workers = Some(workers);
            let config = PipelineConfig::new(dir.path()).with_builder_config(builder_config.clone());
            let pipeline =
                Pipeline::new(config).with_builder(PythonBuilder::with_config(builder_config));
            b.iter(|| pipeline.build_project().unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_extract_single_file, bench_build_project);
criterion_main!(benches);
