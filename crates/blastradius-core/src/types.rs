use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::{BlastRadiusError, Result};

/// Per-file changed line numbers, as produced by diff parsing.
pub type ChangedLineSet = BTreeMap<String, BTreeSet<u32>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolKind {
    Function,
    Variable,
    Class,
    Interface,
    TypeAlias,
    Enum,
    Method,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SymbolKind::Function => "function",
            SymbolKind::Variable => "variable",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::TypeAlias => "type-alias",
            SymbolKind::Enum => "enum",
            SymbolKind::Method => "method",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "function" => Ok(SymbolKind::Function),
            "variable" => Ok(SymbolKind::Variable),
            "class" => Ok(SymbolKind::Class),
            "interface" => Ok(SymbolKind::Interface),
            "type-alias" => Ok(SymbolKind::TypeAlias),
            "enum" => Ok(SymbolKind::Enum),
            "method" => Ok(SymbolKind::Method),
            other => Err(format!("unknown symbol kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Removed,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeType::Added => "added",
            ChangeType::Modified => "modified",
            ChangeType::Removed => "removed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    #[default]
    None,
    Default,
    Named,
    Namespace,
}

impl ExportType {
    /// A symbol is exported iff it has any export form at all.
    pub fn is_exported(self) -> bool {
        self != ExportType::None
    }
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExportType::None => "none",
            ExportType::Default => "default",
            ExportType::Named => "named",
            ExportType::Namespace => "namespace",
        };
        write!(f, "{}", s)
    }
}

/// One modified/added/removed declaration, as produced by symbol extraction.
///
/// Immutable for the duration of an analysis run; never retained past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolChange {
    pub name: String,
    pub kind: SymbolKind,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    /// Line numbers within the declaration that actually differ.
    pub changed_lines: BTreeSet<u32>,
    pub change_type: ChangeType,
    pub export_type: ExportType,
    pub is_exported: bool,
}

impl SymbolChange {
    /// Checks the structural invariants the extractor is expected to uphold:
    /// `changed_lines ⊆ [start_line, end_line]` and
    /// `is_exported == (export_type != None)`.
    pub fn validate(&self) -> Result<()> {
        if self.start_line > self.end_line {
            return Err(BlastRadiusError::InvalidInput(format!(
                "symbol {} in {}: start line {} past end line {}",
                self.name, self.file_path, self.start_line, self.end_line
            )));
        }
        if let (Some(&first), Some(&last)) =
            (self.changed_lines.first(), self.changed_lines.last())
        {
            if first < self.start_line || last > self.end_line {
                return Err(BlastRadiusError::InvalidInput(format!(
                    "symbol {} in {}: changed lines outside declaration span {}..={}",
                    self.name, self.file_path, self.start_line, self.end_line
                )));
            }
        }
        if self.is_exported != self.export_type.is_exported() {
            return Err(BlastRadiusError::InvalidInput(format!(
                "symbol {} in {}: export flag disagrees with export type {}",
                self.name, self.file_path, self.export_type
            )));
        }
        Ok(())
    }

    /// Projection carried into propagation.
    pub fn to_changed_symbol(&self) -> ChangedSymbol {
        ChangedSymbol {
            name: self.name.clone(),
            file_path: self.file_path.clone(),
            export_type: self.export_type,
        }
    }

    /// Change type used for scoring. A `Modified` declaration whose changed
    /// lines cover its entire span is treated as `Added`: at this layer a
    /// fully rewritten declaration is indistinguishable from new text.
    /// `Removed` is never inferred; only the extractor sees both revisions.
    pub fn normalized_change_type(&self) -> ChangeType {
        if self.change_type == ChangeType::Modified {
            let span = (self.start_line..=self.end_line).count();
            if span > 0 && self.changed_lines.len() >= span {
                return ChangeType::Added;
            }
        }
        self.change_type
    }
}

/// The subset of [`SymbolChange`] relevant to cross-file propagation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedSymbol {
    pub name: String,
    pub file_path: String,
    pub export_type: ExportType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Named,
    Default,
    Namespace,
}

/// One specifier of an import declaration (`{ foo }`, `Button`, `* as ns`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBinding {
    pub imported: String,
    pub kind: ImportKind,
}

/// Where an import declaration resolved to, per the project parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportSource {
    /// A project file, by resolved path (never the textual specifier).
    Local(String),
    /// An npm package; a propagation leaf.
    Package(String),
    /// Neither a local file nor a recognized package; inert.
    Unresolved,
}

/// Per-file import metadata consumed by the matcher and the graph builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    /// The importing file, by resolved path.
    pub file: String,
    pub source: ImportSource,
    pub bindings: Vec<ImportBinding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactType {
    Direct,
    Transitive,
}

impl ImpactType {
    /// Classification is a pure function of the minimal impact level.
    pub fn from_level(level: u32) -> Self {
        if level == 1 {
            ImpactType::Direct
        } else {
            ImpactType::Transitive
        }
    }
}

impl fmt::Display for ImpactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpactType::Direct => write!(f, "direct"),
            ImpactType::Transitive => write!(f, "transitive"),
        }
    }
}

/// A file that contains at least one symbol change, or a changed non-symbol
/// asset (stylesheet, image) with no symbols at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChangeInfo {
    pub path: String,
    pub change_type: ChangeType,
    pub symbol_count: usize,
}

/// A file reached from a changed file through reverse dependency edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileImpactInfo {
    pub path: String,
    pub impact_level: u32,
    pub impact_type: ImpactType,
    /// Originating changed file paths that reach this file at its minimal
    /// level; more than one under confluence.
    pub change_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentChangeInfo {
    pub name: String,
    pub change_type: ChangeType,
    pub changed_files: Vec<String>,
    pub symbol_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentImpactInfo {
    pub name: String,
    pub impact_level: u32,
    pub impact_type: ImpactType,
    /// Originating changed file paths, so component impact stays joinable
    /// with the file-level report.
    pub change_paths: Vec<String>,
}

/// Severity band derived from a normalized score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// Static component manifest: name plus the entry file whose forward
/// closure defines the component's membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentManifest {
    pub components: Vec<ComponentEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentEntry {
    pub name: String,
    pub entry: String,
}
