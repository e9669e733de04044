use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use blastradius_core::{
    AssessorConfig, BlastRadiusError, ChangedLineSet, ChangedSymbol, ComponentChangeInfo,
    ImportRecord, PropagationConfig, ReferenceCache, SymbolChange,
};
use blastradius_graph::{ComponentGraph, FileDependencyGraph, MembershipIndex};

use crate::assessor::ImpactAssessor;
use crate::component_propagator::ComponentPropagator;
use crate::mapper::ComponentMapper;
use crate::matcher::SymbolMatcher;
use crate::propagator::FilePropagator;
use crate::result::{ComponentAnalysis, ComponentAnalysisMeta, FileAnalysis, ImpactReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    SymbolMatching,
    FilePropagation,
    ComponentMapping,
    ComponentPropagation,
    Assessment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::SymbolMatching => "symbol matching",
            Stage::FilePropagation => "file propagation",
            Stage::ComponentMapping => "component mapping",
            Stage::ComponentPropagation => "component propagation",
            Stage::Assessment => "assessment",
        };
        write!(f, "{}", s)
    }
}

/// Everything one analysis run consumes besides the collaborator-owned
/// graph and membership index.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    pub symbol_changes: Vec<SymbolChange>,
    /// Changed lines per file from diff parsing; files present here with no
    /// symbol change are non-symbol changed assets.
    pub changed_lines: ChangedLineSet,
    /// Per-file import metadata from project parsing.
    pub imports: Vec<ImportRecord>,
}

/// Outputs of the stages that completed before a failure or cancellation.
#[derive(Debug, Clone, Default)]
pub struct PartialReport {
    pub files: Option<FileAnalysis>,
    pub component_changes: Option<Vec<ComponentChangeInfo>>,
    pub components: Option<ComponentAnalysis>,
}

/// The pipeline halted: `stage` names where, `completed` the last stage
/// that finished, and `partial` carries exactly what those stages produced.
/// Nothing is synthesized past the failure.
#[derive(Debug, Error)]
#[error("pipeline halted during {stage}: {error}")]
pub struct PipelineFailure {
    pub stage: Stage,
    pub completed: Option<Stage>,
    #[source]
    pub error: BlastRadiusError,
    pub partial: PartialReport,
}

/// Sequences matching → file propagation → component mapping → component
/// propagation → assessment under a single cancellable operation.
///
/// Each stage is a bounded in-memory computation, so cancellation is
/// observed between stages only; those boundaries are also the run's only
/// suspension points. The pipeline holds no state across runs: graphs,
/// membership and caches are caller-owned snapshots, and concurrent runs
/// over the same snapshots need no locking.
#[derive(Debug, Clone, Default)]
pub struct ImpactPipeline {
    propagation: PropagationConfig,
    assessor: AssessorConfig,
}

impl ImpactPipeline {
    pub fn new(propagation: PropagationConfig, assessor: AssessorConfig) -> Self {
        Self {
            propagation,
            assessor,
        }
    }

    pub async fn analyze(
        &self,
        input: &AnalysisInput,
        graph: &FileDependencyGraph,
        membership: &MembershipIndex,
        cache: &ReferenceCache,
        cancel: &CancellationToken,
    ) -> Result<ImpactReport, PipelineFailure> {
        let started = Instant::now();
        let mut partial = PartialReport::default();
        let mut completed: Option<Stage> = None;

        // Stage 1: symbol matching.
        if cancel.is_cancelled() {
            return Err(halt(Stage::SymbolMatching, completed, partial));
        }
        for symbol in &input.symbol_changes {
            if let Err(error) = symbol.validate() {
                return Err(PipelineFailure {
                    stage: Stage::SymbolMatching,
                    completed,
                    error,
                    partial,
                });
            }
        }
        let matcher = SymbolMatcher::new(&input.imports);
        let changed_symbols: Vec<ChangedSymbol> = input
            .symbol_changes
            .iter()
            .map(SymbolChange::to_changed_symbol)
            .collect();
        let consumers = matcher.match_all(&changed_symbols, cache);
        completed = Some(Stage::SymbolMatching);
        debug!(symbols = changed_symbols.len(), "symbol matching done");
        tokio::task::yield_now().await;

        // Stage 2: file propagation.
        if cancel.is_cancelled() {
            return Err(halt(Stage::FilePropagation, completed, partial));
        }
        let symbol_files: BTreeSet<&str> = input
            .symbol_changes
            .iter()
            .map(|symbol| symbol.file_path.as_str())
            .collect();
        let asset_files: BTreeSet<String> = input
            .changed_lines
            .keys()
            .filter(|path| !symbol_files.contains(path.as_str()))
            .cloned()
            .collect();
        let files = FilePropagator::new(graph).propagate(
            &input.symbol_changes,
            &asset_files,
            &consumers,
        );
        partial.files = Some(files.clone());
        completed = Some(Stage::FilePropagation);
        tokio::task::yield_now().await;

        // Stage 3: component mapping.
        if cancel.is_cancelled() {
            return Err(halt(Stage::ComponentMapping, completed, partial));
        }
        let component_changes = ComponentMapper::new(membership).map_changes(&files.changes);
        partial.component_changes = Some(component_changes.clone());
        completed = Some(Stage::ComponentMapping);
        tokio::task::yield_now().await;

        // Stage 4: component propagation.
        if cancel.is_cancelled() {
            return Err(halt(Stage::ComponentPropagation, completed, partial));
        }
        let component_graph = ComponentGraph::derive(membership, graph);
        let impact = ComponentPropagator::new(
            &component_graph,
            self.propagation.component_max_depth,
        )
        .propagate(&component_changes);
        let components = ComponentAnalysis {
            meta: ComponentAnalysisMeta {
                total_component_count: membership.component_count(),
                changed_component_count: component_changes.len(),
                impact_component_count: impact.len(),
            },
            changes: component_changes,
            impact,
        };
        partial.components = Some(components.clone());
        completed = Some(Stage::ComponentPropagation);
        tokio::task::yield_now().await;

        // Stage 5: assessment.
        if cancel.is_cancelled() {
            return Err(halt(Stage::Assessment, completed, partial));
        }
        if let Err(error) = self.assessor.validate() {
            return Err(PipelineFailure {
                stage: Stage::Assessment,
                completed,
                error,
                partial,
            });
        }
        let severity = ImpactAssessor::new(self.assessor.clone()).assess(
            &files,
            &components,
            &input.symbol_changes,
        );

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            changed_files = files.meta.changed_file_count,
            impacted_files = files.meta.impact_file_count,
            impacted_components = components.meta.impact_component_count,
            "impact analysis complete"
        );

        Ok(ImpactReport {
            files,
            components,
            severity,
        })
    }
}

fn halt(stage: Stage, completed: Option<Stage>, partial: PartialReport) -> PipelineFailure {
    PipelineFailure {
        stage,
        completed,
        error: BlastRadiusError::Cancelled,
        partial,
    }
}
