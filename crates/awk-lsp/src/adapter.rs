//! Adapts the parser's event stream into document mutations.
//!
//! A fresh [`DocumentSink`] wraps the target document for every parse; the
//! engine hands it to `awk_syntax::parse` as the explicit event context.

use awk_syntax::{MessageKind, MessageSeverity, ParseSink, SymbolKind, TokenPos};
use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticSeverity, NumberOrString, Position, Range, Url,
};

use crate::document::{CallSite, Document, FunctionBlock, ParameterMarker};
use crate::position::cmp_position;
use crate::symbols::{SymbolDefinition, SymbolUsage};

/// An `@include` discovered mid-parse. Resolution and scheduling happen in
/// the engine after the current parse returns, in discovery order.
#[derive(Debug, Clone)]
pub struct IncludeRequest {
    pub filename: String,
    pub relative: bool,
    pub range: Range,
}

struct OpenCall {
    name: String,
    start: Position,
    arg_count: usize,
}

/// Parser line/column are 1-based; everything past this boundary is a
/// zero-based LSP position.
fn to_position(pos: TokenPos) -> Position {
    Position::new(pos.line.saturating_sub(1), pos.column.saturating_sub(1))
}

pub struct DocumentSink<'a> {
    doc: &'a mut Document,
    includes: Vec<IncludeRequest>,
    open_calls: Vec<OpenCall>,
    open_block: Option<(Position, String)>,
    /// Most recent function-kind usage; names the call span that follows.
    last_callee: Option<(String, Position)>,
    last_defined_function: Option<String>,
}

impl<'a> DocumentSink<'a> {
    pub fn new(doc: &'a mut Document) -> Self {
        DocumentSink {
            doc,
            includes: Vec::new(),
            open_calls: Vec::new(),
            open_block: None,
            last_callee: None,
            last_defined_function: None,
        }
    }

    fn owner(&self) -> Url {
        self.doc.uri.clone()
    }

    /// Close spans a truncated parse left open, then restore the sorted
    /// orders the query layer binary-searches over.
    pub fn finish(&mut self, last: Position) {
        while let Some(call) = self.open_calls.pop() {
            self.doc.function_calls.push(CallSite {
                name: call.name,
                arg_count: call.arg_count,
                range: Range::new(call.start, last),
            });
        }
        if let Some((start, function)) = self.open_block.take() {
            self.doc.function_blocks.push(FunctionBlock {
                start,
                end: last,
                function,
            });
        }
        self.doc
            .used
            .sort_by(|a, b| cmp_position(a.position, b.position));
        self.doc
            .parameter_usage
            .sort_by(|a, b| cmp_position(a.position, b.position));
        self.doc
            .function_blocks
            .sort_by(|a, b| cmp_position(a.start, b.start));
    }

    pub fn into_includes(self) -> Vec<IncludeRequest> {
        self.includes
    }
}

impl ParseSink for DocumentSink<'_> {
    fn define(
        &mut self,
        kind: SymbolKind,
        scope: Option<&str>,
        name: &str,
        pos: TokenPos,
        doc_comment: &str,
    ) {
        let position = to_position(pos);
        if kind == SymbolKind::Function {
            self.last_defined_function = Some(name.to_string());
        }
        if matches!(kind, SymbolKind::Parameter | SymbolKind::Local) {
            if let Some(function) = scope {
                if let Some(defs) = self
                    .doc
                    .defined
                    .get_mut(&(SymbolKind::Function, function.to_string()))
                {
                    if let Some(def) = defs.last_mut() {
                        def.parameters.push(name.to_string());
                    }
                }
            }
        }
        let def = SymbolDefinition {
            uri: self.owner(),
            position,
            kind,
            name: name.to_string(),
            doc_comment: doc_comment.to_string(),
            scope: scope.map(str::to_owned),
            is_implicit: false,
            parameters: Vec::new(),
            arity: 0,
        };
        self.doc
            .defined
            .entry((kind, name.to_string()))
            .or_default()
            .push(def);
        self.doc.used.push(SymbolUsage {
            kind,
            name: name.to_string(),
            position,
            is_definition: true,
        });
    }

    fn use_symbol(&mut self, kind: SymbolKind, _scope: Option<&str>, name: &str, pos: TokenPos) {
        let position = to_position(pos);
        if kind == SymbolKind::Function {
            self.last_callee = Some((name.to_string(), position));
        }

        // Referencing a global is its declaration: synthesize a definition
        // at the first use of an undeclared name. Built-in variables
        // resolve against the static table instead.
        if kind == SymbolKind::Global
            && awk_syntax::builtins::lookup(name).is_none()
            && !self
                .doc
                .defined
                .contains_key(&(SymbolKind::Global, name.to_string()))
        {
            let implicit = SymbolDefinition {
                uri: self.owner(),
                position,
                kind: SymbolKind::Global,
                name: name.to_string(),
                doc_comment: String::new(),
                scope: None,
                is_implicit: true,
                parameters: Vec::new(),
                arity: 0,
            };
            self.doc
                .defined
                .entry((SymbolKind::Global, name.to_string()))
                .or_default()
                .push(implicit);
        }

        self.doc.used.push(SymbolUsage {
            kind,
            name: name.to_string(),
            position,
            is_definition: false,
        });
    }

    fn include(&mut self, filename: &str, relative: bool, pos: TokenPos, length: u32) {
        let position = to_position(pos);
        self.includes.push(IncludeRequest {
            filename: filename.to_string(),
            relative,
            range: Range::new(
                position,
                Position::new(position.line, position.character + length),
            ),
        });
    }

    fn message(
        &mut self,
        severity: MessageSeverity,
        kind: MessageKind,
        text: &str,
        pos: TokenPos,
        length: u32,
    ) {
        let position = to_position(pos);
        self.doc.parse_diagnostics.push(Diagnostic {
            range: Range::new(
                position,
                Position::new(position.line, position.character + length.max(1)),
            ),
            severity: Some(match severity {
                MessageSeverity::Error => DiagnosticSeverity::ERROR,
                MessageSeverity::Warning => DiagnosticSeverity::WARNING,
            }),
            source: Some("awk".into()),
            code: Some(NumberOrString::String(format!(
                "awk::parse::{}",
                kind.as_str()
            ))),
            message: text.to_string(),
            ..Default::default()
        });
    }

    fn function_call(&mut self, is_start: bool, pos: TokenPos) {
        let position = to_position(pos);
        if is_start {
            let (name, start) = self
                .last_callee
                .clone()
                .unwrap_or((String::new(), position));
            self.open_calls.push(OpenCall {
                name,
                start,
                arg_count: 0,
            });
        } else if let Some(call) = self.open_calls.pop() {
            self.doc.function_calls.push(CallSite {
                name: call.name,
                arg_count: call.arg_count,
                range: Range::new(
                    call.start,
                    Position::new(position.line, position.character + 1),
                ),
            });
        }
    }

    fn parameter(&mut self, index: i32, is_start: bool, pos: TokenPos) {
        let position = to_position(pos);
        let Some(call) = self.open_calls.last_mut() else {
            return;
        };
        if is_start {
            call.arg_count = call.arg_count.max(index.max(0) as usize + 1);
            self.doc.parameter_usage.push(ParameterMarker {
                function_name: call.name.clone(),
                index,
                position,
            });
        } else {
            // The end event carries the final argument count; the marker it
            // leaves behind is the past-the-arguments sentinel.
            call.arg_count = if index >= 0 { index as usize + 1 } else { 0 };
            self.doc.parameter_usage.push(ParameterMarker {
                function_name: call.name.clone(),
                index: -1,
                position,
            });
        }
    }

    fn function_block(&mut self, is_start: bool, pos: TokenPos) {
        let position = to_position(pos);
        if is_start {
            let function = self.last_defined_function.clone().unwrap_or_default();
            self.open_block = Some((position, function));
        } else if let Some((start, function)) = self.open_block.take() {
            self.doc.function_blocks.push(FunctionBlock {
                start,
                end: position,
                function,
            });
        }
    }

    fn arity(&mut self, name: &str, count: usize) {
        if let Some(defs) = self
            .doc
            .defined
            .get_mut(&(SymbolKind::Function, name.to_string()))
        {
            if let Some(def) = defs.last_mut() {
                def.arity = count;
            }
        }
    }
}
