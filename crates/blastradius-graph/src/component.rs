use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeSet, VecDeque};
use tracing::warn;

use blastradius_core::ComponentManifest;

use crate::FileDependencyGraph;

/// Component membership: for each manifest entry, the set of project files
/// reachable forward from its entry file, halting at the entry files of
/// other components. Another component's entry marks its territory: an
/// import reaching one is an inter-component dependency, not membership.
///
/// Computed once per (manifest, graph) pair and reused across runs against
/// the same project.
#[derive(Debug, Clone, Default)]
pub struct MembershipIndex {
    members: FxHashMap<String, BTreeSet<String>>,
    owners: FxHashMap<String, Vec<String>>,
    names: Vec<String>,
}

impl MembershipIndex {
    pub fn build(manifest: &ComponentManifest, graph: &FileDependencyGraph) -> Self {
        let mut index = Self::default();

        let entries: FxHashSet<&str> = manifest
            .components
            .iter()
            .map(|component| component.entry.as_str())
            .collect();

        for component in &manifest.components {
            let members = if graph.contains(&component.entry) {
                forward_closure(graph, &component.entry, &entries)
            } else {
                // Tolerated: the component reports zero files, zero impact.
                warn!(
                    component = %component.name,
                    entry = %component.entry,
                    "manifest entry does not resolve to a project file"
                );
                BTreeSet::new()
            };

            for file in &members {
                let owners = index.owners.entry(file.clone()).or_default();
                if !owners.iter().any(|name| name == &component.name) {
                    owners.push(component.name.clone());
                }
            }
            index.names.push(component.name.clone());
            index.members.insert(component.name.clone(), members);
        }

        index
    }

    pub fn members_of(&self, component: &str) -> Option<&BTreeSet<String>> {
        self.members.get(component)
    }

    /// Components owning `file`, in manifest order. A shared utility file
    /// reachable from several entries belongs to every such component.
    pub fn owners_of(&self, file: &str) -> &[String] {
        self.owners.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Component names in manifest order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn component_count(&self) -> usize {
        self.names.len()
    }
}

/// Files reachable from `entry` by following forward import edges, including
/// the entry itself. The walk does not continue through other manifest
/// entries; external packages are not graph nodes, so it terminates at them
/// naturally.
fn forward_closure(
    graph: &FileDependencyGraph,
    entry: &str,
    boundaries: &FxHashSet<&str>,
) -> BTreeSet<String> {
    let mut members = BTreeSet::new();
    let mut queue = VecDeque::new();

    members.insert(entry.to_string());
    queue.push_back(entry.to_string());

    while let Some(file) = queue.pop_front() {
        for target in graph.dependencies_of(&file) {
            if target != entry && boundaries.contains(target.as_str()) {
                continue;
            }
            if members.insert(target.clone()) {
                queue.push_back(target.clone());
            }
        }
    }

    members
}

/// Component-level dependency graph derived from the file graph and the
/// membership index: edge `A → B` iff some member of `A` imports a file
/// outside `A`'s membership that belongs to `B`. Intra-component imports
/// never become edges.
#[derive(Debug, Clone, Default)]
pub struct ComponentGraph {
    dep: FxHashMap<String, Vec<String>>,
    rev: FxHashMap<String, Vec<String>>,
}

impl ComponentGraph {
    pub fn derive(index: &MembershipIndex, graph: &FileDependencyGraph) -> Self {
        let mut component_graph = Self::default();

        for name in index.names() {
            let Some(members) = index.members_of(name) else {
                continue;
            };
            for file in members {
                for target in graph.dependencies_of(file) {
                    if members.contains(target) {
                        continue;
                    }
                    for owner in index.owners_of(target) {
                        if owner != name {
                            component_graph.add_edge(name, owner);
                        }
                    }
                }
            }
        }

        component_graph
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        push_unique(self.dep.entry(from.to_string()).or_default(), to);
        push_unique(self.rev.entry(to.to_string()).or_default(), from);
    }

    pub fn dependencies_of(&self, component: &str) -> &[String] {
        self.dep.get(component).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dependents_of(&self, component: &str) -> &[String] {
        self.rev.get(component).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn push_unique(edges: &mut Vec<String>, value: &str) {
    if !edges.iter().any(|existing| existing == value) {
        edges.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blastradius_core::ComponentEntry;

    fn manifest(entries: &[(&str, &str)]) -> ComponentManifest {
        ComponentManifest {
            components: entries
                .iter()
                .map(|(name, entry)| ComponentEntry {
                    name: name.to_string(),
                    entry: entry.to_string(),
                })
                .collect(),
        }
    }

    fn two_component_graph() -> FileDependencyGraph {
        let mut graph = FileDependencyGraph::new();
        graph.add_import("X/index.ts", "X/helpers.ts");
        graph.add_import("Y/index.ts", "X/index.ts");
        graph
    }

    #[test]
    fn membership_is_the_forward_closure_of_the_entry() {
        let graph = two_component_graph();
        let index = MembershipIndex::build(
            &manifest(&[("X", "X/index.ts"), ("Y", "Y/index.ts")]),
            &graph,
        );

        let x_members = index.members_of("X").unwrap();
        assert!(x_members.contains("X/index.ts"));
        assert!(x_members.contains("X/helpers.ts"));
        assert_eq!(x_members.len(), 2);
    }

    #[test]
    fn closure_halts_at_other_component_entries() {
        let graph = two_component_graph();
        let index = MembershipIndex::build(
            &manifest(&[("X", "X/index.ts"), ("Y", "Y/index.ts")]),
            &graph,
        );

        // Y imports X's entry; X's files stay X's territory.
        let y_members = index.members_of("Y").unwrap();
        assert_eq!(y_members.len(), 1);
        assert!(y_members.contains("Y/index.ts"));
        assert_eq!(index.owners_of("X/index.ts"), ["X".to_string()]);
    }

    #[test]
    fn shared_utility_files_belong_to_every_reaching_component() {
        let mut graph = FileDependencyGraph::new();
        graph.add_import("A/index.ts", "shared/utils.ts");
        graph.add_import("B/index.ts", "shared/utils.ts");
        let index = MembershipIndex::build(
            &manifest(&[("A", "A/index.ts"), ("B", "B/index.ts")]),
            &graph,
        );

        assert_eq!(
            index.owners_of("shared/utils.ts"),
            ["A".to_string(), "B".to_string()]
        );
        // Shared membership is not a cross-component edge.
        let component_graph = ComponentGraph::derive(&index, &graph);
        assert!(component_graph.dependencies_of("A").is_empty());
        assert!(component_graph.dependencies_of("B").is_empty());
    }

    #[test]
    fn unresolvable_entry_yields_empty_membership() {
        let graph = two_component_graph();
        let index = MembershipIndex::build(&manifest(&[("Z", "Z/missing.ts")]), &graph);
        assert!(index.members_of("Z").unwrap().is_empty());
        assert_eq!(index.component_count(), 1);
    }

    #[test]
    fn closure_survives_import_cycles() {
        let mut graph = FileDependencyGraph::new();
        graph.add_import("A/a.ts", "A/b.ts");
        graph.add_import("A/b.ts", "A/a.ts");
        let index = MembershipIndex::build(&manifest(&[("A", "A/a.ts")]), &graph);
        assert_eq!(index.members_of("A").unwrap().len(), 2);
    }

    #[test]
    fn component_edges_cross_membership_boundaries_only() {
        let graph = two_component_graph();
        let index = MembershipIndex::build(
            &manifest(&[("X", "X/index.ts"), ("Y", "Y/index.ts")]),
            &graph,
        );
        let component_graph = ComponentGraph::derive(&index, &graph);

        assert!(component_graph.dependencies_of("X").is_empty());
        assert_eq!(component_graph.dependencies_of("Y"), ["X".to_string()]);
        assert_eq!(component_graph.dependents_of("X"), ["Y".to_string()]);
    }
}
