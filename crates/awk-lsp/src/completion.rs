//! Completion items: built-in functions plus every symbol visible from the
//! cursor's scope, across all documents.

use std::collections::BTreeMap;

use awk_syntax::{builtins, SymbolKind};
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, Documentation, Position, Url,
};

use crate::graph::DocumentGraph;
use crate::utils::align_doc_comment;

pub(crate) fn completions(graph: &DocumentGraph, uri: &Url, pos: Position) -> Vec<CompletionItem> {
    let mut items: Vec<CompletionItem> = Vec::new();

    for builtin in builtins::BUILTINS {
        if builtin.kind != builtins::BuiltinKind::Function {
            continue;
        }
        items.push(CompletionItem {
            label: builtin.name.to_string(),
            kind: Some(CompletionItemKind::FUNCTION),
            detail: Some(builtins::signature(builtin)),
            // Resolved lazily; see `resolve`.
            data: Some(serde_json::Value::String(builtin.name.to_string())),
            ..Default::default()
        });
    }

    let Some(doc) = graph.get(uri) else {
        return items;
    };
    let scope = doc.scope_at(pos);

    // name -> (kind, detail, distinct non-empty doc-comment variants)
    let mut visible: BTreeMap<String, (SymbolKind, String, Vec<String>)> = BTreeMap::new();
    for other in graph.iter() {
        for ((kind, name), defs) in &other.defined {
            for def in defs {
                if !def.visible_from(scope) {
                    continue;
                }
                let entry = visible
                    .entry(name.clone())
                    .or_insert_with(|| (*kind, def.display(), Vec::new()));
                // A name defined under several kinds shows its strongest one.
                if kind_rank(*kind) < kind_rank(entry.0) {
                    entry.0 = *kind;
                    entry.1 = def.display();
                }
                if !def.doc_comment.is_empty() {
                    let doc_text = align_doc_comment(&def.doc_comment);
                    if !entry.2.contains(&doc_text) {
                        entry.2.push(doc_text);
                    }
                }
            }
        }
    }

    for (name, (kind, detail, docs)) in visible {
        let item_kind = match kind {
            SymbolKind::Function => CompletionItemKind::FUNCTION,
            _ => CompletionItemKind::VARIABLE,
        };
        if docs.is_empty() {
            items.push(CompletionItem {
                label: name,
                kind: Some(item_kind),
                detail: Some(detail),
                ..Default::default()
            });
        } else {
            // One item per distinct doc-comment variant, so differently
            // documented redefinitions stay distinguishable.
            for doc_text in docs {
                items.push(CompletionItem {
                    label: name.clone(),
                    kind: Some(item_kind),
                    detail: Some(detail.clone()),
                    documentation: Some(Documentation::String(doc_text)),
                    ..Default::default()
                });
            }
        }
    }

    items
}

fn kind_rank(kind: SymbolKind) -> u8 {
    match kind {
        SymbolKind::Function => 0,
        SymbolKind::Global => 1,
        SymbolKind::Parameter => 2,
        SymbolKind::Local => 3,
    }
}

/// Completion resolve: attach the built-in description the list omitted.
pub(crate) fn resolve(mut item: CompletionItem) -> CompletionItem {
    let Some(serde_json::Value::String(name)) = &item.data else {
        return item;
    };
    if let Some(builtin) = builtins::lookup(name) {
        item.documentation = Some(Documentation::String(builtin.description.to_string()));
    }
    item
}
