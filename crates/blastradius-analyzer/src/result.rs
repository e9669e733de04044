use serde::{Deserialize, Serialize};

use blastradius_core::{
    ComponentChangeInfo, ComponentImpactInfo, FileChangeInfo, FileImpactInfo, Severity,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysisMeta {
    pub total_file_count: usize,
    pub changed_file_count: usize,
    pub impact_file_count: usize,
}

/// File-granularity report: directly changed files plus everything the
/// reverse graph reaches from them. Both lists are path-sorted so identical
/// inputs serialize byte-identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysis {
    pub meta: FileAnalysisMeta,
    pub changes: Vec<FileChangeInfo>,
    pub impact: Vec<FileImpactInfo>,
}

impl FileAnalysis {
    /// Changed and impacted paths, deduplicated, in first-seen order.
    pub fn impacted_paths(&self) -> Vec<String> {
        let mut seen = std::collections::BTreeSet::new();
        let mut paths = Vec::new();
        for path in self
            .changes
            .iter()
            .map(|change| &change.path)
            .chain(self.impact.iter().map(|impact| &impact.path))
        {
            if seen.insert(path.clone()) {
                paths.push(path.clone());
            }
        }
        paths
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentAnalysisMeta {
    pub total_component_count: usize,
    pub changed_component_count: usize,
    /// Exactly what was found within the depth bound; truncation is never
    /// silent relative to this count.
    pub impact_component_count: usize,
}

/// Component-granularity report. The impact list is sorted by
/// (impact level, name); changes by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentAnalysis {
    pub meta: ComponentAnalysisMeta,
    pub changes: Vec<ComponentChangeInfo>,
    pub impact: Vec<ComponentImpactInfo>,
}

impl ComponentAnalysis {
    pub fn impacted_components(&self) -> Vec<String> {
        let mut seen = std::collections::BTreeSet::new();
        let mut names = Vec::new();
        for name in self
            .changes
            .iter()
            .map(|change| &change.name)
            .chain(self.impact.iter().map(|impact| &impact.name))
        {
            if seen.insert(name.clone()) {
                names.push(name.clone());
            }
        }
        names
    }
}

/// Severity of one impacted entity (file path or component name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySeverity {
    pub name: String,
    pub impact_level: u32,
    pub score: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityReport {
    pub overall: Option<Severity>,
    pub files: Vec<EntitySeverity>,
    pub components: Vec<EntitySeverity>,
}

/// The complete output of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    pub files: FileAnalysis,
    pub components: ComponentAnalysis,
    pub severity: SeverityReport,
}
