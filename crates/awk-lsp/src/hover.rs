//! Hover content for built-ins and user-defined symbols.

use awk_syntax::{builtins, Dialect, SymbolKind};
use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position, Url};

use crate::config::Settings;
use crate::graph::DocumentGraph;
use crate::position::name_range;
use crate::utils::align_doc_comment;

/// Whether a built-in participates in lookups under the document's
/// dialect. The compatibility warning setting also surfaces gawk-only
/// entries in strict mode, so the warning and its explanation line up.
pub(crate) fn builtin_visible(
    builtin: &builtins::Builtin,
    dialect: Dialect,
    settings: &Settings,
) -> bool {
    builtin.awk || dialect == Dialect::Gawk || settings.stylistic_warnings.compatibility
}

pub(crate) fn builtin_hover_text(builtin: &builtins::Builtin) -> String {
    format!("`{}`\n\n{}", builtins::signature(builtin), builtin.description)
}

pub(crate) fn hover(
    graph: &DocumentGraph,
    settings: &Settings,
    uri: &Url,
    pos: Position,
) -> Option<Hover> {
    let doc = graph.get(uri)?;
    let usage = doc.find_usage_at(pos)?;
    let range = name_range(usage.position, &usage.name);

    if matches!(usage.kind, SymbolKind::Function | SymbolKind::Global) {
        if let Some(builtin) = builtins::lookup(&usage.name) {
            if builtin_visible(builtin, doc.dialect, settings) {
                return Some(markdown_hover(builtin_hover_text(builtin), range));
            }
        }
    }

    let scope = doc.scope_at(pos);
    let mut parts: Vec<String> = Vec::new();
    for other in graph.iter() {
        for def in other.definitions_of(usage.kind, &usage.name) {
            if !def.visible_from(scope) {
                continue;
            }
            let mut text = def.display();
            if !def.doc_comment.is_empty() {
                text.push_str("\n\n");
                text.push_str(&align_doc_comment(&def.doc_comment));
            }
            parts.push(text);
        }
    }

    if parts.is_empty() {
        // Nothing declared anywhere: name the kind for callables and
        // globals, stay quiet otherwise.
        return match usage.kind {
            SymbolKind::Function => Some(markdown_hover("function".into(), range)),
            SymbolKind::Global => Some(markdown_hover("global variable".into(), range)),
            _ => None,
        };
    }

    parts.sort();
    parts.dedup();
    Some(markdown_hover(parts.join("\n\n"), range))
}

fn markdown_hover(value: String, range: tower_lsp::lsp_types::Range) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: Some(range),
    }
}
