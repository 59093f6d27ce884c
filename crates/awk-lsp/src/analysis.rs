//! Cross-document semantic analysis: function-call arity checking over the
//! altered closure.

use std::collections::HashSet;

use awk_syntax::{builtins, Dialect, SymbolKind};
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Url};

use crate::document::{CallSite, Document};
use crate::graph::DocumentGraph;
use crate::symbols::SymbolDefinition;

/// Check every call site of every document that needs re-analysis: the
/// documents altered this batch, plus everything that transitively includes
/// a document whose function signatures changed. Returns replacement
/// analysis-diagnostic lists; documents outside the closure keep theirs.
pub(crate) fn check_function_calls(
    graph: &DocumentGraph,
    altered: &HashSet<Url>,
    altered_definitions: &HashSet<Url>,
    enabled: bool,
) -> Vec<(Url, Vec<Diagnostic>)> {
    let mut closure = graph.including_closure(altered_definitions);
    closure.extend(altered.iter().cloned());

    let mut results = Vec::new();
    for uri in closure {
        let Some(doc) = graph.get(&uri) else { continue };
        let diagnostics = if enabled {
            check_document(graph, doc)
        } else {
            Vec::new()
        };
        results.push((uri, diagnostics));
    }
    results
}

fn check_document(graph: &DocumentGraph, doc: &Document) -> Vec<Diagnostic> {
    let reachable = graph.reachable_from(&doc.uri);
    let mut diagnostics = Vec::new();
    for call in &doc.function_calls {
        if let Some(diagnostic) = check_call(graph, doc, &reachable, call) {
            diagnostics.push(diagnostic);
        }
    }
    diagnostics
}

/// Resolve the callee — user definitions anywhere in the calling document's
/// include closure first, built-ins second — and verify the argument count.
/// Unresolvable callees are not this analyzer's business.
fn check_call(
    graph: &DocumentGraph,
    doc: &Document,
    reachable: &[Url],
    call: &CallSite,
) -> Option<Diagnostic> {
    if let Some(def) = resolve_user_function(graph, reachable, &call.name) {
        return check_user_call(call, def);
    }

    let builtin = builtins::lookup(&call.name)?;
    if builtin.kind != builtins::BuiltinKind::Function {
        return None;
    }
    if doc.dialect != Dialect::Gawk && !builtin.awk {
        // Invisible in strict mode; the compatibility warning from the
        // parse already covers the reference itself.
        return None;
    }
    check_builtin_call(call, builtin)
}

fn resolve_user_function<'graph>(
    graph: &'graph DocumentGraph,
    reachable: &[Url],
    name: &str,
) -> Option<&'graph SymbolDefinition> {
    for uri in reachable {
        if let Some(doc) = graph.get(uri) {
            if let Some(def) = doc.definitions_of(SymbolKind::Function, name).first() {
                return Some(def);
            }
        }
    }
    None
}

fn check_user_call(call: &CallSite, def: &SymbolDefinition) -> Option<Diagnostic> {
    let declared = def.parameters.len();
    let message = if call.arg_count > declared {
        format!(
            "'{}' called with {} argument(s), expects at most {}",
            call.name, call.arg_count, declared
        )
    } else if call.arg_count > def.arity {
        format!(
            "'{}' called with {} argument(s); arguments beyond {} fill its local variables",
            call.name, call.arg_count, def.arity
        )
    } else if call.arg_count < def.arity {
        format!(
            "'{}' called with {} argument(s), expects {}",
            call.name, call.arg_count, def.arity
        )
    } else {
        return None;
    };
    Some(warning(call, message))
}

fn check_builtin_call(call: &CallSite, builtin: &builtins::Builtin) -> Option<Diagnostic> {
    let max = builtin.parameters.len();
    let min = builtin.first_optional.unwrap_or(max);
    let message = if call.arg_count < min {
        format!(
            "'{}' called with {} argument(s), expects at least {}",
            call.name, call.arg_count, min
        )
    } else if call.arg_count > max && !builtin.variadic {
        format!(
            "'{}' called with {} argument(s), expects at most {}",
            call.name, call.arg_count, max
        )
    } else {
        return None;
    };
    Some(warning(call, message))
}

fn warning(call: &CallSite, message: String) -> Diagnostic {
    Diagnostic {
        range: call.range,
        severity: Some(DiagnosticSeverity::WARNING),
        source: Some("awk".into()),
        code: Some(NumberOrString::String("awk::analysis::call-arity".into())),
        message,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::engine::Engine;

    async fn diagnostics_for(text: &str) -> Vec<Diagnostic> {
        let mut engine = Engine::new(Settings::default());
        let uri = Url::parse("file:///virtual/arity.awk").unwrap();
        let batch = engine.update_document(uri.clone(), text.to_string()).await;
        batch
            .into_iter()
            .find(|(u, _)| *u == uri)
            .map(|(_, diags)| diags)
            .unwrap_or_default()
    }

    fn arity_only(diags: Vec<Diagnostic>) -> Vec<Diagnostic> {
        diags
            .into_iter()
            .filter(|d| {
                d.code == Some(NumberOrString::String("awk::analysis::call-arity".into()))
            })
            .collect()
    }

    #[tokio::test]
    async fn matching_user_call_is_quiet() {
        let diags =
            diagnostics_for("function f(a, b) { return a + b }\nBEGIN { print f(1, 2) }\n").await;
        assert!(arity_only(diags).is_empty());
    }

    #[tokio::test]
    async fn short_user_call_warns() {
        let diags =
            diagnostics_for("function f(a, b) { return a + b }\nBEGIN { print f(1) }\n").await;
        let arity = arity_only(diags);
        assert_eq!(arity.len(), 1);
        assert!(arity[0].message.contains("expects 2"));
    }

    #[tokio::test]
    async fn call_into_local_tail_warns() {
        let diags = diagnostics_for(
            "function f(a,   i) { i = a }\nBEGIN { print f(1, 2) }\n",
        )
        .await;
        let arity = arity_only(diags);
        assert_eq!(arity.len(), 1);
        assert!(arity[0].message.contains("local variables"));
    }

    #[tokio::test]
    async fn builtin_optional_arguments_are_honored() {
        let quiet = diagnostics_for("BEGIN { print substr(\"abc\", 1) }\n").await;
        assert!(arity_only(quiet).is_empty());

        let noisy = diagnostics_for("BEGIN { print substr(\"abc\") }\n").await;
        let arity = arity_only(noisy);
        assert_eq!(arity.len(), 1);
        assert!(arity[0].message.contains("at least 2"));

        let too_many = diagnostics_for("BEGIN { print substr(\"abc\", 1, 2, 3) }\n").await;
        assert_eq!(arity_only(too_many).len(), 1);
    }

    #[tokio::test]
    async fn variadic_builtins_accept_long_tails() {
        let diags =
            diagnostics_for("BEGIN { s = sprintf(\"%d-%d-%d\", 1, 2, 3) }\n").await;
        assert!(arity_only(diags).is_empty());
    }

    #[tokio::test]
    async fn unknown_callee_is_ignored() {
        let diags = diagnostics_for("BEGIN { mystery(1, 2, 3) }\n").await;
        assert!(arity_only(diags).is_empty());
    }

    #[tokio::test]
    async fn disabled_check_clears_analysis_diagnostics() {
        let mut engine = Engine::new(Settings::default());
        let uri = Url::parse("file:///virtual/toggle.awk").unwrap();
        let text = "function f(a, b) { return a }\nBEGIN { print f(1) }\n";

        let batch = engine.update_document(uri.clone(), text.to_string()).await;
        let initial = arity_only(batch.into_iter().find(|(u, _)| *u == uri).unwrap().1);
        assert_eq!(initial.len(), 1);

        let mut off = Settings::default();
        off.stylistic_warnings.check_function_calls = false;
        let batch = engine.change_configuration(off).await;
        let silenced = arity_only(batch.into_iter().find(|(u, _)| *u == uri).unwrap().1);
        assert!(silenced.is_empty());

        // Back on: same diagnostics as never having toggled.
        let batch = engine.change_configuration(Settings::default()).await;
        let restored = arity_only(batch.into_iter().find(|(u, _)| *u == uri).unwrap().1);
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].message, initial[0].message);
    }
}
