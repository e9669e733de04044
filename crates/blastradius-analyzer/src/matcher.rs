use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use blastradius_core::{
    ChangedSymbol, ExportType, ImportBinding, ImportKind, ImportRecord, ImportSource,
    ReferenceCache,
};

/// Which files consume each changed defining file. These sets are exactly
/// the reverse edges the file-level propagator seeds from.
#[derive(Debug, Clone, Default)]
pub struct ConsumerMap {
    by_defining_file: FxHashMap<String, BTreeSet<String>>,
}

impl ConsumerMap {
    pub fn consumers_of(&self, defining_file: &str) -> Option<&BTreeSet<String>> {
        self.by_defining_file.get(defining_file)
    }

    pub fn is_empty(&self) -> bool {
        self.by_defining_file.is_empty()
    }

    fn merge(&mut self, defining_file: &str, consumers: &BTreeSet<String>) {
        if consumers.is_empty() {
            return;
        }
        self.by_defining_file
            .entry(defining_file.to_string())
            .or_default()
            .extend(consumers.iter().cloned());
    }
}

/// Resolves changed symbols to the files whose import declarations reference
/// them. Matching is by resolved file path, never the textual specifier, so
/// relative-path variance collapses before it gets here.
pub struct SymbolMatcher<'a> {
    /// resolved local source file -> import records naming it
    imports_by_source: FxHashMap<&'a str, Vec<&'a ImportRecord>>,
}

impl<'a> SymbolMatcher<'a> {
    pub fn new(records: &'a [ImportRecord]) -> Self {
        let mut imports_by_source: FxHashMap<&'a str, Vec<&'a ImportRecord>> =
            FxHashMap::default();
        for record in records {
            // Unresolved and package imports are inert here: they can never
            // name a changed project file.
            if let ImportSource::Local(source) = &record.source {
                imports_by_source.entry(source.as_str()).or_default().push(record);
            }
        }
        Self { imports_by_source }
    }

    /// Files that consume `symbol`. An unexported symbol affects only its
    /// own defining file, so it has no consumers at all.
    pub fn match_symbol(
        &self,
        symbol: &ChangedSymbol,
        cache: &ReferenceCache,
    ) -> Arc<BTreeSet<String>> {
        if !symbol.export_type.is_exported() {
            return Arc::new(BTreeSet::new());
        }

        let key = ReferenceCache::key(&symbol.file_path, &symbol.name);
        if let Some(hit) = cache.get(&key) {
            return hit;
        }

        let mut consumers = BTreeSet::new();
        if let Some(records) = self.imports_by_source.get(symbol.file_path.as_str()) {
            for record in records {
                if record
                    .bindings
                    .iter()
                    .any(|binding| binding_matches(binding, symbol))
                {
                    consumers.insert(record.file.clone());
                }
            }
        }

        debug!(
            symbol = %symbol.name,
            file = %symbol.file_path,
            consumers = consumers.len(),
            "matched changed symbol"
        );
        cache.insert(key, consumers)
    }

    /// Batch form: one merged map of defining file -> consuming files.
    pub fn match_all(&self, symbols: &[ChangedSymbol], cache: &ReferenceCache) -> ConsumerMap {
        let mut map = ConsumerMap::default();
        for symbol in symbols {
            let consumers = self.match_symbol(symbol, cache);
            map.merge(&symbol.file_path, &consumers);
        }
        map
    }
}

/// Export/import form matching:
/// - `import * as X` consumes every exported symbol of the target file,
///   since the concrete name cannot be statically disambiguated here
///   (false positives preferred over false negatives).
/// - a default import matches the default export whatever its local name.
/// - a named import matches a named export of the same name.
fn binding_matches(binding: &ImportBinding, symbol: &ChangedSymbol) -> bool {
    match binding.kind {
        ImportKind::Namespace => true,
        ImportKind::Default => symbol.export_type == ExportType::Default,
        ImportKind::Named => {
            symbol.export_type == ExportType::Named && binding.imported == symbol.name
        }
    }
}
