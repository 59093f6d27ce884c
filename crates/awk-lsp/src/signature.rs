//! Signature help driven by the position-sorted argument markers.

use std::cmp::Ordering;

use awk_syntax::{builtins, SymbolKind};
use tower_lsp::lsp_types::{
    Documentation, ParameterInformation, ParameterLabel, Position, SignatureHelp,
    SignatureInformation, Url,
};

use crate::config::Settings;
use crate::graph::DocumentGraph;
use crate::hover::builtin_visible;
use crate::position::{cmp_position, last_at_or_before};
use crate::utils::align_doc_comment;

pub(crate) fn signature_help(
    graph: &DocumentGraph,
    settings: &Settings,
    uri: &Url,
    pos: Position,
) -> Option<SignatureHelp> {
    let doc = graph.get(uri)?;
    let idx = last_at_or_before(&doc.parameter_usage, pos, |marker| marker.position)?;
    let marker = &doc.parameter_usage[idx];

    // A sentinel strictly before the cursor means the call closed behind
    // it; one exactly at the cursor means the cursor sits on the closing
    // paren of an argument list that is still being edited.
    if marker.index < 0 && cmp_position(marker.position, pos) == Ordering::Less {
        return None;
    }

    let name = marker.function_name.as_str();
    let signature = user_signature(graph, name)
        .or_else(|| builtin_signature(doc.dialect, settings, name))
        .unwrap_or_else(|| SignatureInformation {
            label: format!("Undeclared function: {name}"),
            documentation: None,
            parameters: None,
            active_parameter: None,
        });

    Some(SignatureHelp {
        signatures: vec![signature],
        active_signature: Some(0),
        active_parameter: Some(marker.index.max(0) as u32),
    })
}

fn user_signature(graph: &DocumentGraph, name: &str) -> Option<SignatureInformation> {
    let def = graph
        .iter()
        .flat_map(|doc| doc.definitions_of(SymbolKind::Function, name))
        .min_by_key(|def| {
            (
                def.uri.to_string(),
                def.position.line,
                def.position.character,
            )
        })?;
    let parameters = def.parameters[..def.arity]
        .iter()
        .map(|param| ParameterInformation {
            label: ParameterLabel::Simple(param.clone()),
            documentation: None,
        })
        .collect();
    Some(SignatureInformation {
        label: def.display(),
        documentation: (!def.doc_comment.is_empty())
            .then(|| Documentation::String(align_doc_comment(&def.doc_comment))),
        parameters: Some(parameters),
        active_parameter: None,
    })
}

fn builtin_signature(
    dialect: awk_syntax::Dialect,
    settings: &Settings,
    name: &str,
) -> Option<SignatureInformation> {
    let builtin = builtins::lookup(name)?;
    if builtin.kind != builtins::BuiltinKind::Function
        || !builtin_visible(builtin, dialect, settings)
    {
        return None;
    }
    let parameters = builtin
        .parameters
        .iter()
        .map(|param| ParameterInformation {
            label: ParameterLabel::Simple(param.to_string()),
            documentation: None,
        })
        .collect();
    Some(SignatureInformation {
        label: builtins::signature(builtin),
        documentation: Some(Documentation::String(builtin.description.to_string())),
        parameters: Some(parameters),
        active_parameter: None,
    })
}
