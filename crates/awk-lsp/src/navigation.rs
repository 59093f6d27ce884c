//! Go-to-definition, references, and symbol listings.

use awk_syntax::SymbolKind;
use tower_lsp::lsp_types::{
    GotoDefinitionResponse, Location, Position, SymbolInformation, Url,
};

use crate::graph::DocumentGraph;
use crate::position::name_range;

pub(crate) fn definition(
    graph: &DocumentGraph,
    uri: &Url,
    pos: Position,
) -> Option<GotoDefinitionResponse> {
    let doc = graph.get(uri)?;
    let usage = doc.find_usage_at(pos)?;
    let scope = doc.scope_at(pos);

    let mut locations = Vec::new();
    for other in graph.iter() {
        for def in other.definitions_of(usage.kind, &usage.name) {
            // Jumping to an implicit definition would land on the first
            // use, which is where the cursor already is.
            if def.is_implicit || !def.visible_from(scope) {
                continue;
            }
            locations.push(Location {
                uri: def.uri.clone(),
                range: name_range(def.position, &def.name),
            });
        }
    }
    as_goto_definition_response(locations)
}

pub(crate) fn references(
    graph: &DocumentGraph,
    uri: &Url,
    pos: Position,
    include_declaration: bool,
) -> Vec<Location> {
    let Some(doc) = graph.get(uri) else {
        return Vec::new();
    };
    let Some(usage) = doc.find_usage_at(pos) else {
        return Vec::new();
    };

    let mut locations = Vec::new();
    for other in graph.iter() {
        for reference in &other.used {
            if reference.kind != usage.kind || reference.name != usage.name {
                continue;
            }
            if reference.is_definition && !include_declaration {
                continue;
            }
            locations.push(Location {
                uri: other.uri.clone(),
                range: name_range(reference.position, &reference.name),
            });
        }
        if include_declaration {
            for def in other.definitions_of(usage.kind, &usage.name) {
                locations.push(Location {
                    uri: def.uri.clone(),
                    range: name_range(def.position, &def.name),
                });
            }
        }
    }
    dedup_and_sort_locations(&mut locations);
    locations
}

pub(crate) fn document_symbols(graph: &DocumentGraph, uri: &Url) -> Vec<SymbolInformation> {
    let Some(doc) = graph.get(uri) else {
        return Vec::new();
    };
    let mut symbols: Vec<SymbolInformation> = doc
        .defined
        .iter()
        .filter(|((kind, _), _)| *kind == SymbolKind::Function)
        .flat_map(|(_, defs)| defs.iter())
        .map(|def| {
            #[allow(deprecated)]
            SymbolInformation {
                name: def.name.clone(),
                kind: tower_lsp::lsp_types::SymbolKind::FUNCTION,
                tags: None,
                deprecated: None,
                location: Location {
                    uri: def.uri.clone(),
                    range: name_range(def.position, &def.name),
                },
                container_name: doc.file_symbol.clone(),
            }
        })
        .collect();
    dedup_and_sort_symbols(&mut symbols);
    symbols
}

pub(crate) fn workspace_symbols(graph: &DocumentGraph, query: &str) -> Vec<SymbolInformation> {
    let mut symbols = Vec::new();
    for doc in graph.iter() {
        for ((kind, name), defs) in &doc.defined {
            if *kind != SymbolKind::Function || !name.starts_with(query) {
                continue;
            }
            for def in defs {
                #[allow(deprecated)]
                symbols.push(SymbolInformation {
                    name: def.name.clone(),
                    kind: tower_lsp::lsp_types::SymbolKind::FUNCTION,
                    tags: None,
                    deprecated: None,
                    location: Location {
                        uri: def.uri.clone(),
                        range: name_range(def.position, &def.name),
                    },
                    container_name: doc.file_symbol.clone(),
                });
            }
        }
    }
    dedup_and_sort_symbols(&mut symbols);
    symbols
}

fn location_sort_key(location: &Location) -> (String, u32, u32, u32, u32) {
    (
        location.uri.to_string(),
        location.range.start.line,
        location.range.start.character,
        location.range.end.line,
        location.range.end.character,
    )
}

pub(crate) fn dedup_and_sort_locations(locations: &mut Vec<Location>) {
    locations.sort_by_key(location_sort_key);
    locations.dedup_by(|a, b| location_sort_key(a) == location_sort_key(b));
}

fn dedup_and_sort_symbols(symbols: &mut Vec<SymbolInformation>) {
    symbols.sort_by_key(|symbol| {
        let key = location_sort_key(&symbol.location);
        (symbol.name.clone(), key)
    });
    symbols.dedup_by(|a, b| {
        a.name == b.name && location_sort_key(&a.location) == location_sort_key(&b.location)
    });
}

pub(crate) fn as_goto_definition_response(
    mut locations: Vec<Location>,
) -> Option<GotoDefinitionResponse> {
    dedup_and_sort_locations(&mut locations);
    match locations.len() {
        0 => None,
        1 => Some(GotoDefinitionResponse::Scalar(locations.remove(0))),
        _ => Some(GotoDefinitionResponse::Array(locations)),
    }
}
