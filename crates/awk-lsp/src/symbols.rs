//! Definition and usage value types.

use awk_syntax::SymbolKind;
use tower_lsp::lsp_types::{Position, Url};

#[derive(Debug, Clone)]
pub struct SymbolDefinition {
    /// Document the definition lives in.
    pub uri: Url,
    pub position: Position,
    pub kind: SymbolKind,
    pub name: String,
    /// Raw `##` block preceding the definition, empty when absent.
    pub doc_comment: String,
    /// Enclosing function, `None` at file scope.
    pub scope: Option<String>,
    /// Synthesized at the first use of an otherwise-undeclared global.
    /// Hidden from go-to-definition, visible to hover.
    pub is_implicit: bool,
    /// For functions: declared parameters in order, locals included.
    pub parameters: Vec<String>,
    /// For functions: count of true parameters, before the
    /// local-convention tail.
    pub arity: usize,
}

impl SymbolDefinition {
    /// Definitions at file scope are visible everywhere; scoped ones only
    /// from inside their function.
    pub fn visible_from(&self, scope: Option<&str>) -> bool {
        self.scope.is_none() || self.scope.as_deref() == scope
    }

    pub fn kind_label(&self) -> &'static str {
        kind_label(self.kind)
    }

    /// Hover/signature display: `function add(x, y)` with the local tail
    /// omitted, or the plain kind label for variables.
    pub fn display(&self) -> String {
        match self.kind {
            SymbolKind::Function => {
                format!("function {}({})", self.name, self.parameters[..self.arity].join(", "))
            }
            _ => self.kind_label().to_string(),
        }
    }
}

/// A reference to a symbol, kept position-sorted per document.
/// `is_definition` marks the usage recorded at a definition site.
#[derive(Debug, Clone)]
pub struct SymbolUsage {
    pub kind: SymbolKind,
    pub name: String,
    pub position: Position,
    pub is_definition: bool,
}

pub fn kind_label(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::Function => "function",
        SymbolKind::Global => "global variable",
        SymbolKind::Local => "local variable",
        SymbolKind::Parameter => "function parameter",
    }
}
