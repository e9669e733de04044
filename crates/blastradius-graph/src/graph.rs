use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::debug;

use blastradius_core::{ImportRecord, ImportSource};

/// Bidirectional file dependency graph: forward edges (file → resolved local
/// imports), reverse edges (file → importers), and external package edges
/// (propagation leaves, never traversed).
///
/// Forward and reverse maps are filled together in the same pass, so
/// `g ∈ rev[f] ⟺ f ∈ dep[g]` holds by construction rather than by a lazy
/// derivation that could drift. The graph is an immutable snapshot once
/// handed to a run; the engine never writes back into it.
#[derive(Debug, Clone, Default)]
pub struct FileDependencyGraph {
    dep: FxHashMap<String, Vec<String>>,
    rev: FxHashMap<String, Vec<String>>,
    external: FxHashMap<String, Vec<String>>,
    files: BTreeSet<String>,
}

impl FileDependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph in one pass over per-file import metadata.
    /// Unresolved imports contribute to neither edge set.
    pub fn from_imports(records: &[ImportRecord]) -> Self {
        let mut graph = Self::new();
        for record in records {
            graph.register_file(&record.file);
            match &record.source {
                ImportSource::Local(target) => graph.add_import(&record.file, target),
                ImportSource::Package(name) => graph.add_external(&record.file, name),
                ImportSource::Unresolved => {
                    debug!(file = %record.file, "skipping unresolved import");
                }
            }
        }
        graph
    }

    /// Adopts caller-built adjacency maps. The maps are trusted as-is: a
    /// node missing from one side simply has no edges on that side.
    pub fn from_parts(
        dep: FxHashMap<String, Vec<String>>,
        rev: FxHashMap<String, Vec<String>>,
        external: FxHashMap<String, Vec<String>>,
    ) -> Self {
        let mut files = BTreeSet::new();
        for (from, targets) in dep.iter().chain(rev.iter()) {
            files.insert(from.clone());
            files.extend(targets.iter().cloned());
        }
        files.extend(external.keys().cloned());
        Self {
            dep,
            rev,
            external,
            files,
        }
    }

    /// Records a project file that may carry no edges at all.
    pub fn register_file(&mut self, path: &str) {
        if !self.files.contains(path) {
            self.files.insert(path.to_string());
        }
    }

    /// Adds `from → to` to the forward map and `to → from` to the reverse
    /// map together (idempotent).
    pub fn add_import(&mut self, from: &str, to: &str) {
        self.register_file(from);
        self.register_file(to);
        push_unique(self.dep.entry(from.to_string()).or_default(), to);
        push_unique(self.rev.entry(to.to_string()).or_default(), from);
    }

    pub fn add_external(&mut self, from: &str, package: &str) {
        self.register_file(from);
        push_unique(self.external.entry(from.to_string()).or_default(), package);
    }

    /// Resolved local imports of `file` (edges out).
    pub fn dependencies_of(&self, file: &str) -> &[String] {
        self.dep.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Files importing `file` (edges in, via the reverse map).
    pub fn dependents_of(&self, file: &str) -> &[String] {
        self.rev.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Npm packages imported by `file`.
    pub fn external_deps_of(&self, file: &str) -> &[String] {
        self.external.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, file: &str) -> bool {
        self.files.contains(file)
    }

    /// All known project files, in path order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

fn push_unique(edges: &mut Vec<String>, value: &str) {
    if !edges.iter().any(|existing| existing == value) {
        edges.push(value.to_string());
    }
}
