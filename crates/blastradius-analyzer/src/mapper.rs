use rustc_hash::FxHashMap;
use tracing::debug;

use blastradius_core::{ChangeType, ComponentChangeInfo, FileChangeInfo};
use blastradius_graph::MembershipIndex;

/// Projects file-level changes onto components. Impact is *not* projected
/// here: component impact levels are recomputed over the component graph,
/// since a file-internal chain inside one component is not inter-component
/// impact.
pub struct ComponentMapper<'a> {
    index: &'a MembershipIndex,
}

impl<'a> ComponentMapper<'a> {
    pub fn new(index: &'a MembershipIndex) -> Self {
        Self { index }
    }

    /// A component is changed iff one of its member files is in the
    /// file-level changes list. Aggregates changed files and symbol counts
    /// over the membership; result sorted by component name.
    pub fn map_changes(&self, file_changes: &[FileChangeInfo]) -> Vec<ComponentChangeInfo> {
        let by_path: FxHashMap<&str, &FileChangeInfo> = file_changes
            .iter()
            .map(|change| (change.path.as_str(), change))
            .collect();

        let mut changes = Vec::new();
        for name in self.index.names() {
            let Some(members) = self.index.members_of(name) else {
                continue;
            };

            let mut changed_files = Vec::new();
            let mut symbol_count = 0;
            let mut file_types = Vec::new();
            // Members are path-ordered, so changed_files comes out sorted.
            for member in members {
                if let Some(change) = by_path.get(member.as_str()) {
                    changed_files.push(member.clone());
                    symbol_count += change.symbol_count;
                    file_types.push(change.change_type);
                }
            }
            if changed_files.is_empty() {
                continue;
            }

            changes.push(ComponentChangeInfo {
                name: name.clone(),
                change_type: component_change_type(&file_types),
                changed_files,
                symbol_count,
            });
        }

        changes.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(changed_components = changes.len(), "mapped file changes to components");
        changes
    }
}

/// Removal dominates, then modification, then pure addition.
fn component_change_type(file_types: &[ChangeType]) -> ChangeType {
    if file_types.contains(&ChangeType::Removed) {
        ChangeType::Removed
    } else if file_types.contains(&ChangeType::Modified) {
        ChangeType::Modified
    } else {
        ChangeType::Added
    }
}
