use rustc_hash::FxHashMap;
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

use blastradius_core::{ComponentChangeInfo, ComponentImpactInfo, ImpactType};
use blastradius_graph::ComponentGraph;

/// Depth-bounded multi-source BFS over the reverse component graph.
///
/// Structurally the same walk as the file-level propagator, with two
/// differences: every hop uses the component reverse edges (the component
/// graph already encodes which imports cross component boundaries), and a
/// maximum depth truncates the search. Components past the bound are
/// omitted, not errored: very deep chains are rarely actionable, and the
/// meta count reflects exactly what was kept.
pub struct ComponentPropagator<'a> {
    graph: &'a ComponentGraph,
    max_depth: u32,
}

#[derive(Debug, Clone)]
struct Visit {
    level: u32,
    /// Originating changed file paths, carried from the seed component's
    /// changed members so component impact stays joinable with the
    /// file-level report.
    origins: BTreeSet<String>,
}

impl<'a> ComponentPropagator<'a> {
    pub fn new(graph: &'a ComponentGraph, max_depth: u32) -> Self {
        Self { graph, max_depth }
    }

    pub fn propagate(&self, changes: &[ComponentChangeInfo]) -> Vec<ComponentImpactInfo> {
        let mut visits: FxHashMap<String, Visit> = FxHashMap::default();
        let mut queue: VecDeque<String> = VecDeque::new();

        for change in changes {
            visits.insert(
                change.name.clone(),
                Visit {
                    level: 0,
                    origins: change.changed_files.iter().cloned().collect(),
                },
            );
            queue.push_back(change.name.clone());
        }

        while let Some(component) = queue.pop_front() {
            let Some(current) = visits.get(&component).cloned() else {
                continue;
            };
            let next_level = current.level + 1;
            if next_level > self.max_depth {
                continue;
            }

            for dependent in self.graph.dependents_of(&component) {
                match visits.get_mut(dependent) {
                    None => {
                        visits.insert(
                            dependent.clone(),
                            Visit {
                                level: next_level,
                                origins: current.origins.clone(),
                            },
                        );
                        queue.push_back(dependent.clone());
                    }
                    Some(existing) if existing.level == next_level => {
                        existing.origins.extend(current.origins.iter().cloned());
                    }
                    Some(_) => {}
                }
            }
        }

        let mut impact: Vec<ComponentImpactInfo> = visits
            .into_iter()
            .filter(|(_, visit)| visit.level > 0)
            .map(|(name, visit)| ComponentImpactInfo {
                name,
                impact_level: visit.level,
                impact_type: ImpactType::from_level(visit.level),
                change_paths: visit.origins.into_iter().collect(),
            })
            .collect();
        impact.sort_by(|a, b| {
            a.impact_level
                .cmp(&b.impact_level)
                .then_with(|| a.name.cmp(&b.name))
        });

        debug!(
            seeds = changes.len(),
            impacted = impact.len(),
            max_depth = self.max_depth,
            "component propagation complete"
        );
        impact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blastradius_core::{ChangeType, ComponentEntry, ComponentManifest};
    use blastradius_graph::{FileDependencyGraph, MembershipIndex};

    fn chain_graph(edges: &[(&str, &str)], manifest: &[(&str, &str)]) -> ComponentGraph {
        let mut graph = FileDependencyGraph::new();
        for (from, to) in edges {
            graph.add_import(from, to);
        }
        let manifest = ComponentManifest {
            components: manifest
                .iter()
                .map(|(name, entry)| ComponentEntry {
                    name: name.to_string(),
                    entry: entry.to_string(),
                })
                .collect(),
        };
        let index = MembershipIndex::build(&manifest, &graph);
        ComponentGraph::derive(&index, &graph)
    }

    fn changed(name: &str, files: &[&str]) -> ComponentChangeInfo {
        ComponentChangeInfo {
            name: name.into(),
            change_type: ChangeType::Modified,
            changed_files: files.iter().map(|f| f.to_string()).collect(),
            symbol_count: 1,
        }
    }

    #[test]
    fn impact_walks_the_reverse_component_chain() {
        // C depends on B depends on A.
        let graph = chain_graph(
            &[("B/index.ts", "A/index.ts"), ("C/index.ts", "B/index.ts")],
            &[("A", "A/index.ts"), ("B", "B/index.ts"), ("C", "C/index.ts")],
        );
        let propagator = ComponentPropagator::new(&graph, 10);
        let impact = propagator.propagate(&[changed("A", &["A/index.ts"])]);

        assert_eq!(impact.len(), 2);
        assert_eq!(impact[0].name, "B");
        assert_eq!(impact[0].impact_level, 1);
        assert_eq!(impact[0].impact_type, ImpactType::Direct);
        assert_eq!(impact[1].name, "C");
        assert_eq!(impact[1].impact_level, 2);
        assert_eq!(impact[1].impact_type, ImpactType::Transitive);
    }

    #[test]
    fn depth_bound_silently_omits_distant_components() {
        let graph = chain_graph(
            &[("B/index.ts", "A/index.ts"), ("C/index.ts", "B/index.ts")],
            &[("A", "A/index.ts"), ("B", "B/index.ts"), ("C", "C/index.ts")],
        );
        let propagator = ComponentPropagator::new(&graph, 1);
        let impact = propagator.propagate(&[changed("A", &["A/index.ts"])]);

        assert_eq!(impact.len(), 1);
        assert_eq!(impact[0].name, "B");
        assert!(impact.iter().all(|info| info.impact_level <= 1));
    }

    #[test]
    fn origins_carry_changed_file_paths() {
        let graph = chain_graph(
            &[("B/index.ts", "A/index.ts")],
            &[("A", "A/index.ts"), ("B", "B/index.ts")],
        );
        let propagator = ComponentPropagator::new(&graph, 10);
        let impact = propagator.propagate(&[changed("A", &["A/index.ts", "A/util.ts"])]);

        assert_eq!(
            impact[0].change_paths,
            ["A/index.ts".to_string(), "A/util.ts".to_string()]
        );
    }

    #[test]
    fn confluence_merges_origins_at_equal_level() {
        // C depends on both A and B.
        let graph = chain_graph(
            &[("C/index.ts", "A/index.ts"), ("C/index.ts", "B/index.ts")],
            &[("A", "A/index.ts"), ("B", "B/index.ts"), ("C", "C/index.ts")],
        );
        let propagator = ComponentPropagator::new(&graph, 10);
        let impact = propagator.propagate(&[
            changed("A", &["A/index.ts"]),
            changed("B", &["B/index.ts"]),
        ]);

        assert_eq!(impact.len(), 1);
        assert_eq!(impact[0].name, "C");
        assert_eq!(
            impact[0].change_paths,
            ["A/index.ts".to_string(), "B/index.ts".to_string()]
        );
    }

    #[test]
    fn changed_components_never_report_as_impacted() {
        let graph = chain_graph(
            &[
                ("B/index.ts", "A/index.ts"),
                ("A/extra.ts", "B/index.ts"),
                ("A/index.ts", "A/extra.ts"),
            ],
            &[("A", "A/index.ts"), ("B", "B/index.ts")],
        );
        let propagator = ComponentPropagator::new(&graph, 10);
        let impact = propagator.propagate(&[changed("A", &["A/index.ts"]), changed("B", &["B/index.ts"])]);
        assert!(impact.is_empty());
    }

    #[test]
    fn sorted_by_level_then_name() {
        let graph = chain_graph(
            &[
                ("B/index.ts", "A/index.ts"),
                ("D/index.ts", "A/index.ts"),
                ("C/index.ts", "B/index.ts"),
            ],
            &[
                ("A", "A/index.ts"),
                ("B", "B/index.ts"),
                ("C", "C/index.ts"),
                ("D", "D/index.ts"),
            ],
        );
        let propagator = ComponentPropagator::new(&graph, 10);
        let impact = propagator.propagate(&[changed("A", &["A/index.ts"])]);

        let order: Vec<(&str, u32)> = impact
            .iter()
            .map(|info| (info.name.as_str(), info.impact_level))
            .collect();
        assert_eq!(order, [("B", 1), ("D", 1), ("C", 2)]);
    }
}
