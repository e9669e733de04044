use rustc_hash::FxHashMap;
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

use blastradius_core::{ChangeType, FileChangeInfo, FileImpactInfo, ImpactType, SymbolChange};
use blastradius_graph::FileDependencyGraph;

use crate::matcher::ConsumerMap;
use crate::result::{FileAnalysis, FileAnalysisMeta};

/// Multi-source BFS over the reverse file graph.
///
/// Seeds are the changed files at level 0. The first hop out of a seed uses
/// the matcher's consumer set (symbol-aware edges); every later hop uses the
/// plain reverse import edges. Levels are assigned on first discovery and
/// never relaxed: uniform edge weights make BFS level assignment minimal by
/// construction, so a node seen at a larger level is simply skipped.
pub struct FilePropagator<'a> {
    graph: &'a FileDependencyGraph,
}

#[derive(Debug, Clone)]
struct Visit {
    level: u32,
    /// Originating changed files reaching this node at its minimal level.
    origins: BTreeSet<String>,
}

impl<'a> FilePropagator<'a> {
    pub fn new(graph: &'a FileDependencyGraph) -> Self {
        Self { graph }
    }

    /// Runs propagation and assembles the file-granularity report.
    ///
    /// `asset_files` are changed files with no symbols at all (stylesheets,
    /// images): recorded as changes, marked visited at level 0 so no path
    /// can re-report them as impacted, and never expanded: they export
    /// nothing for a consumer edge to carry.
    pub fn propagate(
        &self,
        symbol_changes: &[SymbolChange],
        asset_files: &BTreeSet<String>,
        consumers: &ConsumerMap,
    ) -> FileAnalysis {
        let changes = build_change_infos(symbol_changes, asset_files);

        let mut visits: FxHashMap<String, Visit> = FxHashMap::default();
        let mut queue: VecDeque<String> = VecDeque::new();

        for change in &changes {
            visits.insert(
                change.path.clone(),
                Visit {
                    level: 0,
                    origins: BTreeSet::from([change.path.clone()]),
                },
            );
            queue.push_back(change.path.clone());
        }

        while let Some(file) = queue.pop_front() {
            // All same-level predecessors were dequeued before this node,
            // so its origin set is complete here.
            let Some(current) = visits.get(&file).cloned() else {
                continue;
            };
            let next_level = current.level + 1;

            let neighbors: Vec<String> = if current.level == 0 {
                consumers
                    .consumers_of(&file)
                    .map(|set| set.iter().cloned().collect())
                    .unwrap_or_default()
            } else {
                self.graph.dependents_of(&file).to_vec()
            };

            for importer in neighbors {
                match visits.get_mut(&importer) {
                    None => {
                        visits.insert(
                            importer.clone(),
                            Visit {
                                level: next_level,
                                origins: current.origins.clone(),
                            },
                        );
                        queue.push_back(importer);
                    }
                    Some(existing) if existing.level == next_level => {
                        // Confluence: another source reaches this node at
                        // the same minimal distance.
                        existing.origins.extend(current.origins.iter().cloned());
                    }
                    Some(_) => {}
                }
            }
        }

        let mut impact: Vec<FileImpactInfo> = visits
            .into_iter()
            .filter(|(_, visit)| visit.level > 0)
            .map(|(path, visit)| FileImpactInfo {
                path,
                impact_level: visit.level,
                impact_type: ImpactType::from_level(visit.level),
                change_paths: visit.origins.into_iter().collect(),
            })
            .collect();
        impact.sort_by(|a, b| a.path.cmp(&b.path));

        debug!(
            changed = changes.len(),
            impacted = impact.len(),
            "file propagation complete"
        );

        FileAnalysis {
            meta: FileAnalysisMeta {
                total_file_count: self.graph.file_count(),
                changed_file_count: changes.len(),
                impact_file_count: impact.len(),
            },
            changes,
            impact,
        }
    }
}

/// One record per changed file, path-sorted. A file's change type follows
/// the strongest of its symbols (removed over modified over added); assets
/// carry no symbols and report as modified.
fn build_change_infos(
    symbol_changes: &[SymbolChange],
    asset_files: &BTreeSet<String>,
) -> Vec<FileChangeInfo> {
    let mut by_file: FxHashMap<&str, Vec<&SymbolChange>> = FxHashMap::default();
    for change in symbol_changes {
        by_file.entry(change.file_path.as_str()).or_default().push(change);
    }

    let mut changes: Vec<FileChangeInfo> = by_file
        .into_iter()
        .map(|(path, symbols)| FileChangeInfo {
            path: path.to_string(),
            change_type: file_change_type(&symbols),
            symbol_count: symbols.len(),
        })
        .collect();

    for asset in asset_files {
        changes.push(FileChangeInfo {
            path: asset.clone(),
            change_type: ChangeType::Modified,
            symbol_count: 0,
        });
    }

    changes.sort_by(|a, b| a.path.cmp(&b.path));
    changes
}

fn file_change_type(symbols: &[&SymbolChange]) -> ChangeType {
    let mut has_added = false;
    for symbol in symbols {
        match symbol.change_type {
            ChangeType::Removed => return ChangeType::Removed,
            ChangeType::Added => has_added = true,
            ChangeType::Modified => {}
        }
    }
    if symbols
        .iter()
        .any(|symbol| symbol.change_type == ChangeType::Modified)
    {
        ChangeType::Modified
    } else if has_added {
        ChangeType::Added
    } else {
        ChangeType::Modified
    }
}
