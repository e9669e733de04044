use std::collections::BTreeSet;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use blastradius_analyzer::{FilePropagator, SymbolMatcher};
use blastradius_core::{
    ChangeType, ChangedSymbol, ExportType, ImportBinding, ImportKind, ImportRecord, ImportSource,
    ReferenceCache, SymbolChange, SymbolKind,
};
use blastradius_graph::FileDependencyGraph;

/// Layered fan-out: every file in layer N imports one file in layer N-1,
/// plus a shared util everyone imports.
fn layered_imports(layers: usize, width: usize) -> Vec<ImportRecord> {
    let mut records = Vec::new();
    for layer in 1..layers {
        for slot in 0..width {
            let file = format!("src/l{}/f{}.ts", layer, slot);
            records.push(ImportRecord {
                file: file.clone(),
                source: ImportSource::Local(format!("src/l{}/f{}.ts", layer - 1, slot % width)),
                bindings: vec![ImportBinding {
                    imported: "entry".into(),
                    kind: ImportKind::Named,
                }],
            });
            records.push(ImportRecord {
                file,
                source: ImportSource::Local("src/l0/f0.ts".into()),
                bindings: vec![ImportBinding {
                    imported: "entry".into(),
                    kind: ImportKind::Named,
                }],
            });
        }
    }
    records
}

fn changed_root() -> SymbolChange {
    SymbolChange {
        name: "entry".into(),
        kind: SymbolKind::Function,
        file_path: "src/l0/f0.ts".into(),
        start_line: 1,
        end_line: 20,
        changed_lines: BTreeSet::from([5]),
        change_type: ChangeType::Modified,
        export_type: ExportType::Named,
        is_exported: true,
    }
}

fn bench_file_propagation(c: &mut Criterion) {
    let records = layered_imports(10, 100);
    let graph = FileDependencyGraph::from_imports(&records);
    let matcher = SymbolMatcher::new(&records);
    let cache = ReferenceCache::new();
    let symbols = vec![changed_root()];
    let changed: Vec<ChangedSymbol> = symbols.iter().map(SymbolChange::to_changed_symbol).collect();
    let consumers = matcher.match_all(&changed, &cache);
    let assets = BTreeSet::new();

    c.bench_function("file_propagation_layered_1k", |b| {
        b.iter(|| {
            let analysis =
                FilePropagator::new(&graph).propagate(&symbols, &assets, black_box(&consumers));
            black_box(analysis.meta.impact_file_count)
        })
    });
}

fn bench_symbol_matching(c: &mut Criterion) {
    let records = layered_imports(10, 100);
    let matcher = SymbolMatcher::new(&records);
    let symbols = vec![changed_root().to_changed_symbol()];

    c.bench_function("symbol_matching_cold_cache", |b| {
        b.iter(|| {
            let cache = ReferenceCache::new();
            black_box(matcher.match_all(&symbols, &cache))
        })
    });
}

criterion_group!(benches, bench_file_propagation, bench_symbol_matching);
criterion_main!(benches);
