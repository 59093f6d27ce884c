//! Per-document analysis state.

use std::collections::HashMap;

use awk_syntax::{Dialect, SymbolKind};
use tower_lsp::lsp_types::{Diagnostic, Position, Range, Url};

use crate::position::{covers, last_at_or_before};
use crate::symbols::{SymbolDefinition, SymbolUsage};

/// Marker at an argument boundary of a recorded call. `index == -1` is the
/// sentinel placed at the closing parenthesis; signature help uses it to
/// detect a cursor past the last argument.
#[derive(Debug, Clone)]
pub struct ParameterMarker {
    pub function_name: String,
    pub index: i32,
    pub position: Position,
}

/// Lexical extent of one function body.
#[derive(Debug, Clone)]
pub struct FunctionBlock {
    pub start: Position,
    pub end: Position,
    pub function: String,
}

/// A completed call site, checked by the cross-document analyzer.
#[derive(Debug, Clone)]
pub struct CallSite {
    pub name: String,
    pub arg_count: usize,
    pub range: Range,
}

#[derive(Debug)]
pub struct Document {
    pub uri: Url,
    /// Last known source text, kept for revalidation.
    pub text: String,
    pub parse_diagnostics: Vec<Diagnostic>,
    pub analysis_diagnostics: Vec<Diagnostic>,
    /// Definitions keyed by `(kind, name)`, in parse order per key.
    pub defined: HashMap<(SymbolKind, String), Vec<SymbolDefinition>>,
    /// Sorted by position after every parse.
    pub used: Vec<SymbolUsage>,
    /// Sorted by position after every parse; sentinels sort after a start
    /// marker at the same position.
    pub parameter_usage: Vec<ParameterMarker>,
    /// Sorted by start, non-overlapping (AWK functions do not nest).
    pub function_blocks: Vec<FunctionBlock>,
    pub function_calls: Vec<CallSite>,
    /// Include edges out of this document, with every directive site.
    pub includes: HashMap<Url, Vec<Range>>,
    /// Inverse edges; the synthetic editor root appears here for open
    /// buffers. A document with no entry left is dead.
    pub included_by: HashMap<Url, Vec<Range>>,
    /// Dialect the last parse ran under, shebang override included.
    pub dialect: Dialect,
    /// Outline container hint from the file's base name.
    pub file_symbol: Option<String>,
    /// `(name, parameters, arity)` of every function, sorted; compared
    /// across parses to detect signature changes.
    pub signature_fingerprint: Vec<(String, Vec<String>, usize)>,
}

impl Document {
    pub fn new(uri: Url) -> Self {
        Document {
            uri,
            text: String::new(),
            parse_diagnostics: Vec::new(),
            analysis_diagnostics: Vec::new(),
            defined: HashMap::new(),
            used: Vec::new(),
            parameter_usage: Vec::new(),
            function_blocks: Vec::new(),
            function_calls: Vec::new(),
            includes: HashMap::new(),
            included_by: HashMap::new(),
            dialect: Dialect::default(),
            file_symbol: None,
            signature_fingerprint: Vec::new(),
        }
    }

    /// Drop everything the next parse rebuilds. Edges are managed by the
    /// graph and analysis diagnostics by the wrap-up analyzer.
    pub fn clear_for_parse(&mut self) {
        self.parse_diagnostics.clear();
        self.defined.clear();
        self.used.clear();
        self.parameter_usage.clear();
        self.function_blocks.clear();
        self.function_calls.clear();
    }

    pub fn open_in_editor(&self) -> bool {
        self.included_by.contains_key(&crate::graph::editor_root())
    }

    pub fn definitions_of(&self, kind: SymbolKind, name: &str) -> &[SymbolDefinition] {
        self.defined
            .get(&(kind, name.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Function whose body covers `pos`, by binary search over the sorted
    /// block list.
    pub fn scope_at(&self, pos: Position) -> Option<&str> {
        let idx = last_at_or_before(&self.function_blocks, pos, |block| block.start)?;
        let block = &self.function_blocks[idx];
        (crate::position::cmp_position(pos, block.end) != std::cmp::Ordering::Greater)
            .then_some(block.function.as_str())
    }

    /// Usage covering `pos`, by binary search over the sorted usage list.
    pub fn find_usage_at(&self, pos: Position) -> Option<&SymbolUsage> {
        let idx = last_at_or_before(&self.used, pos, |usage| usage.position)?;
        let usage = &self.used[idx];
        covers(usage.position, usage.name.len() as u32, pos).then_some(usage)
    }

    /// Sorted `(name, parameters, arity)` of every function definition.
    pub fn signatures(&self) -> Vec<(String, Vec<String>, usize)> {
        let mut out: Vec<(String, Vec<String>, usize)> = self
            .defined
            .iter()
            .filter(|((kind, _), _)| *kind == SymbolKind::Function)
            .flat_map(|(_, defs)| defs.iter())
            .map(|def| (def.name.clone(), def.parameters.clone(), def.arity))
            .collect();
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_blocks() -> Document {
        let mut doc = Document::new(Url::parse("file:///scope.awk").unwrap());
        doc.function_blocks = vec![
            FunctionBlock {
                start: Position::new(0, 16),
                end: Position::new(2, 0),
                function: "first".into(),
            },
            FunctionBlock {
                start: Position::new(4, 17),
                end: Position::new(6, 0),
                function: "second".into(),
            },
        ];
        doc
    }

    #[test]
    fn scope_at_resolves_inside_blocks_only() {
        let doc = doc_with_blocks();
        assert_eq!(doc.scope_at(Position::new(1, 2)), Some("first"));
        assert_eq!(doc.scope_at(Position::new(5, 0)), Some("second"));
        // Between the blocks and before the first one: file scope.
        assert_eq!(doc.scope_at(Position::new(3, 0)), None);
        assert_eq!(doc.scope_at(Position::new(0, 2)), None);
    }

    #[test]
    fn find_usage_at_honors_span_ends() {
        let mut doc = Document::new(Url::parse("file:///use.awk").unwrap());
        doc.used = vec![
            SymbolUsage {
                kind: SymbolKind::Global,
                name: "total".into(),
                position: Position::new(0, 8),
                is_definition: false,
            },
            SymbolUsage {
                kind: SymbolKind::Global,
                name: "n".into(),
                position: Position::new(1, 4),
                is_definition: false,
            },
        ];
        assert_eq!(doc.find_usage_at(Position::new(0, 8)).unwrap().name, "total");
        assert_eq!(doc.find_usage_at(Position::new(0, 13)).unwrap().name, "total");
        assert!(doc.find_usage_at(Position::new(0, 14)).is_none());
        assert_eq!(doc.find_usage_at(Position::new(1, 5)).unwrap().name, "n");
        assert!(doc.find_usage_at(Position::new(2, 0)).is_none());
    }
}
