use rustc_hash::FxHashMap;

use blastradius_core::{
    AssessorConfig, ChangeType, ExportType, Severity, SymbolChange, SymbolKind, FALLBACK_WEIGHT,
};

use crate::result::{ComponentAnalysis, EntitySeverity, FileAnalysis, SeverityReport};

/// Turns (impact level, symbol kind, export form, change type) tuples into
/// normalized severity scores for triage. All policy lives in
/// [`AssessorConfig`]; propagation logic never reads it.
pub struct ImpactAssessor {
    config: AssessorConfig,
}

impl ImpactAssessor {
    pub fn new(config: AssessorConfig) -> Self {
        Self { config }
    }

    /// Normalized score in [0, 1], strictly decreasing in level: closer
    /// impact is more severe.
    pub fn score(
        &self,
        level: u32,
        kind: SymbolKind,
        export: ExportType,
        change: ChangeType,
    ) -> f64 {
        let base = self.config.kind_weight(kind)
            * self.config.change_weight(change)
            * self.config.export_weight(export);
        base * self.config.level_decay.powi(level as i32)
    }

    /// Scores every impacted file and component. An entity's score is the
    /// strongest contribution among the symbol changes in its originating
    /// changed files; origins without symbols (changed assets) contribute
    /// a flat fallback weight.
    pub fn assess(
        &self,
        files: &FileAnalysis,
        components: &ComponentAnalysis,
        symbol_changes: &[SymbolChange],
    ) -> SeverityReport {
        let mut by_file: FxHashMap<&str, Vec<&SymbolChange>> = FxHashMap::default();
        for change in symbol_changes {
            by_file.entry(change.file_path.as_str()).or_default().push(change);
        }

        let mut file_entries: Vec<EntitySeverity> = files
            .impact
            .iter()
            .map(|info| self.entity(&info.path, info.impact_level, &info.change_paths, &by_file))
            .collect();
        sort_entries(&mut file_entries);

        let mut component_entries: Vec<EntitySeverity> = components
            .impact
            .iter()
            .map(|info| self.entity(&info.name, info.impact_level, &info.change_paths, &by_file))
            .collect();
        sort_entries(&mut component_entries);

        let overall = overall_risk(file_entries.iter().chain(component_entries.iter()));

        SeverityReport {
            overall,
            files: file_entries,
            components: component_entries,
        }
    }

    fn entity(
        &self,
        name: &str,
        level: u32,
        change_paths: &[String],
        by_file: &FxHashMap<&str, Vec<&SymbolChange>>,
    ) -> EntitySeverity {
        let mut best: Option<f64> = None;
        for origin in change_paths {
            if let Some(symbols) = by_file.get(origin.as_str()) {
                for symbol in symbols {
                    let score = self.score(
                        level,
                        symbol.kind,
                        symbol.export_type,
                        symbol.normalized_change_type(),
                    );
                    best = Some(best.map_or(score, |current: f64| current.max(score)));
                }
            }
        }
        let score =
            best.unwrap_or_else(|| FALLBACK_WEIGHT * self.config.level_decay.powi(level as i32));

        EntitySeverity {
            name: name.to_string(),
            impact_level: level,
            score,
            severity: self.config.thresholds.band(score),
        }
    }
}

impl Default for ImpactAssessor {
    fn default() -> Self {
        Self::new(AssessorConfig::default())
    }
}

/// Level ascending, then score descending, then name: equal levels order by
/// the configured weights before falling back to the path.
fn sort_entries(entries: &mut [EntitySeverity]) {
    entries.sort_by(|a, b| {
        a.impact_level
            .cmp(&b.impact_level)
            .then_with(|| b.score.total_cmp(&a.score))
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Roll-up across every scored entity: one critical taints the run; piles
/// of high or medium findings escalate.
fn overall_risk<'a>(entries: impl Iterator<Item = &'a EntitySeverity>) -> Option<Severity> {
    let mut counts = [0usize; 4];
    let mut any = false;
    for entry in entries {
        any = true;
        counts[entry.severity as usize] += 1;
    }
    if !any {
        return None;
    }

    let critical = counts[Severity::Critical as usize];
    let high = counts[Severity::High as usize];
    let medium = counts[Severity::Medium as usize];

    Some(if critical > 0 || high >= 3 {
        Severity::Critical
    } else if high > 0 || medium >= 5 {
        Severity::High
    } else if medium > 0 {
        Severity::Medium
    } else {
        Severity::Low
    })
}
