use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{BlastRadiusError, ChangeType, ExportType, Result, Severity, SymbolKind};

/// Weight used when a tuning table has no entry for a kind/change/export,
/// and for scoring origins that carry no symbols at all (changed assets).
pub const FALLBACK_WEIGHT: f64 = 0.5;

/// Tuning for the component-level propagation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationConfig {
    /// Maximum component hop count; components past the bound are omitted.
    #[serde(default = "PropagationConfig::default_component_max_depth")]
    pub component_max_depth: u32,
}

impl PropagationConfig {
    fn default_component_max_depth() -> u32 {
        10
    }
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            component_max_depth: Self::default_component_max_depth(),
        }
    }
}

/// Triage policy for the impact assessor. Callers tune the tables; the
/// propagation logic never reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessorConfig {
    #[serde(default = "AssessorConfig::default_kind_weights")]
    pub kind_weights: HashMap<SymbolKind, f64>,
    #[serde(default = "AssessorConfig::default_change_weights")]
    pub change_weights: HashMap<ChangeType, f64>,
    #[serde(default = "AssessorConfig::default_export_weights")]
    pub export_weights: HashMap<ExportType, f64>,
    /// Per-hop decay applied to the base weight; must stay in (0, 1).
    #[serde(default = "AssessorConfig::default_level_decay")]
    pub level_decay: f64,
    #[serde(default)]
    pub thresholds: SeverityThresholds,
}

impl AssessorConfig {
    fn default_kind_weights() -> HashMap<SymbolKind, f64> {
        HashMap::from([
            (SymbolKind::Interface, 1.0),
            (SymbolKind::TypeAlias, 1.0),
            (SymbolKind::Enum, 0.9),
            (SymbolKind::Class, 0.85),
            (SymbolKind::Function, 0.75),
            (SymbolKind::Method, 0.6),
            (SymbolKind::Variable, 0.5),
        ])
    }

    fn default_change_weights() -> HashMap<ChangeType, f64> {
        HashMap::from([
            (ChangeType::Removed, 1.0),
            (ChangeType::Modified, 0.7),
            (ChangeType::Added, 0.4),
        ])
    }

    fn default_export_weights() -> HashMap<ExportType, f64> {
        HashMap::from([
            (ExportType::Default, 1.0),
            (ExportType::Named, 1.0),
            (ExportType::Namespace, 0.9),
            (ExportType::None, 0.4),
        ])
    }

    fn default_level_decay() -> f64 {
        0.8
    }

    pub fn kind_weight(&self, kind: SymbolKind) -> f64 {
        self.kind_weights.get(&kind).copied().unwrap_or(FALLBACK_WEIGHT)
    }

    pub fn change_weight(&self, change: ChangeType) -> f64 {
        self.change_weights.get(&change).copied().unwrap_or(FALLBACK_WEIGHT)
    }

    pub fn export_weight(&self, export: ExportType) -> f64 {
        self.export_weights.get(&export).copied().unwrap_or(FALLBACK_WEIGHT)
    }

    /// Scores must stay normalized and strictly decreasing in distance.
    pub fn validate(&self) -> Result<()> {
        if !(self.level_decay > 0.0 && self.level_decay < 1.0) {
            return Err(BlastRadiusError::InvalidInput(format!(
                "level decay {} outside (0, 1)",
                self.level_decay
            )));
        }
        let thresholds = &self.thresholds;
        if thresholds.critical < thresholds.high || thresholds.high < thresholds.medium {
            return Err(BlastRadiusError::InvalidInput(
                "severity thresholds must be ordered critical >= high >= medium".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AssessorConfig {
    fn default() -> Self {
        Self {
            kind_weights: Self::default_kind_weights(),
            change_weights: Self::default_change_weights(),
            export_weights: Self::default_export_weights(),
            level_decay: Self::default_level_decay(),
            thresholds: SeverityThresholds::default(),
        }
    }
}

/// Band boundaries over normalized [0, 1] scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityThresholds {
    #[serde(default = "SeverityThresholds::default_critical")]
    pub critical: f64,
    #[serde(default = "SeverityThresholds::default_high")]
    pub high: f64,
    #[serde(default = "SeverityThresholds::default_medium")]
    pub medium: f64,
}

impl SeverityThresholds {
    fn default_critical() -> f64 {
        0.6
    }

    fn default_high() -> f64 {
        0.35
    }

    fn default_medium() -> f64 {
        0.15
    }

    pub fn band(&self, score: f64) -> Severity {
        if score >= self.critical {
            Severity::Critical
        } else if score >= self.high {
            Severity::High
        } else if score >= self.medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            critical: Self::default_critical(),
            high: Self::default_high(),
            medium: Self::default_medium(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_rank_type_surface_above_values() {
        let config = AssessorConfig::default();
        assert!(config.kind_weight(SymbolKind::Interface) > config.kind_weight(SymbolKind::Variable));
        assert!(config.change_weight(ChangeType::Removed) > config.change_weight(ChangeType::Added));
    }

    #[test]
    fn missing_table_entry_falls_back() {
        let mut config = AssessorConfig::default();
        config.kind_weights.clear();
        assert_eq!(config.kind_weight(SymbolKind::Class), 0.5);
    }

    #[test]
    fn thresholds_band_scores() {
        let thresholds = SeverityThresholds::default();
        assert_eq!(thresholds.band(0.9), Severity::Critical);
        assert_eq!(thresholds.band(0.4), Severity::High);
        assert_eq!(thresholds.band(0.2), Severity::Medium);
        assert_eq!(thresholds.band(0.01), Severity::Low);
    }

    #[test]
    fn config_deserializes_with_partial_fields() {
        let config: AssessorConfig = serde_json::from_str(r#"{"levelDecay": 0.5}"#).unwrap();
        assert_eq!(config.level_decay, 0.5);
        assert!(!config.kind_weights.is_empty());
    }

    #[test]
    fn validate_rejects_bad_decay_and_threshold_order() {
        let mut config = AssessorConfig::default();
        assert!(config.validate().is_ok());

        config.level_decay = 1.0;
        assert!(config.validate().is_err());

        config.level_decay = 0.8;
        config.thresholds.medium = 0.9;
        assert!(config.validate().is_err());
    }
}
