//! The processing engine: a single work queue interleaving parses with
//! include-driven file reads, and the wrap-up pass that follows a drained
//! batch.
//!
//! The backend owns one engine behind a `tokio::sync::Mutex`, which is this
//! server's rendition of a single-threaded event loop: every mutation runs
//! with the lock held, and the only suspension points are the `tokio::fs`
//! reads between parses. A parse therefore never observes partial I/O
//! state; `open_reads` and the validation depth counter remain as cheap
//! assertions on that discipline.

use std::collections::{HashSet, VecDeque};

use awk_syntax::ParseOptions;
use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticSeverity, NumberOrString, Position, Url,
};

use crate::adapter::{DocumentSink, IncludeRequest};
use crate::analysis;
use crate::config::Settings;
use crate::document::Document;
use crate::graph::{resolve_include_path, DocumentGraph};

struct QueueItem {
    uri: Url,
    text: String,
    open_in_editor: bool,
}

/// Diagnostics to publish, one entry per live (or just-closed) document.
pub type PublishBatch = Vec<(Url, Vec<Diagnostic>)>;

pub struct Engine {
    pub(crate) graph: DocumentGraph,
    pub(crate) settings: Settings,
    queue: VecDeque<QueueItem>,
    open_reads: usize,
    validate_depth: u32,
    altered: HashSet<Url>,
    altered_definitions: HashSet<Url>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(Settings::default())
    }
}

impl Engine {
    pub fn new(settings: Settings) -> Self {
        Engine {
            graph: DocumentGraph::new(),
            settings,
            queue: VecDeque::new(),
            open_reads: 0,
            validate_depth: 0,
            altered: HashSet::new(),
            altered_definitions: HashSet::new(),
        }
    }

    /// Editor opened (or fully replaced) a buffer.
    pub async fn update_document(&mut self, uri: Url, text: String) -> PublishBatch {
        self.graph.ensure(&uri);
        self.graph.remove_editor_edge(&uri);
        self.graph.add_editor_edge(&uri);
        self.queue.push_back(QueueItem {
            uri,
            text,
            open_in_editor: true,
        });
        self.process().await
    }

    /// Editor closed a buffer: drop its root edge and collect whatever
    /// nothing references anymore. Closed documents get their diagnostics
    /// cleared.
    pub fn close_document(&mut self, uri: &Url) -> PublishBatch {
        self.graph.remove_editor_edge(uri);
        self.graph
            .collect_orphans()
            .into_iter()
            .map(|closed| (closed, Vec::new()))
            .collect()
    }

    /// Apply new settings and revalidate every open buffer.
    pub async fn change_configuration(&mut self, settings: Settings) -> PublishBatch {
        self.settings = settings;
        let open: Vec<(Url, String)> = self
            .graph
            .iter()
            .filter(|doc| doc.open_in_editor())
            .map(|doc| (doc.uri.clone(), doc.text.clone()))
            .collect();
        for (uri, text) in open {
            self.queue.push_back(QueueItem {
                uri,
                text,
                open_in_editor: true,
            });
        }
        self.process().await
    }

    /// Drain the queue, resolving includes as parses discover them, then
    /// run the wrap-up exactly once for the batch.
    async fn process(&mut self) -> PublishBatch {
        while let Some(item) = self.queue.pop_front() {
            if self.open_reads > 0 {
                // The await structure below makes this unreachable; keep
                // the original guard as an assertion.
                tracing::warn!(open_reads = self.open_reads, "parse attempted during a read");
            }
            let requests = self.validate(&item);
            for request in requests {
                self.resolve_include(&item.uri, request).await;
            }
        }
        self.wrap_up()
    }

    /// Parse one queue item into its document and report what it includes.
    fn validate(&mut self, item: &QueueItem) -> Vec<IncludeRequest> {
        self.validate_depth += 1;
        if self.validate_depth > 1 {
            tracing::warn!(depth = self.validate_depth, "re-entrant validation");
        }
        tracing::debug!(uri = %item.uri, open_in_editor = item.open_in_editor, "validating");

        self.graph.detach_includes(&item.uri);

        let options = ParseOptions {
            dialect: self.settings.dialect(),
            file_base_name: file_base_name(&item.uri),
            warn_missing_semicolon: self.settings.stylistic_warnings.missing_semicolon,
            warn_compatibility: self.settings.stylistic_warnings.compatibility,
        };

        let doc = self.graph.ensure(&item.uri);
        doc.clear_for_parse();
        doc.text = item.text.clone();

        let mut sink = DocumentSink::new(&mut *doc);
        let requests = match awk_syntax::parse(&item.text, &options, &mut sink) {
            Ok(summary) => {
                let last = Position::new(
                    summary.last_pos.line.saturating_sub(1),
                    summary.last_pos.column.saturating_sub(1),
                );
                sink.finish(last);
                let requests = sink.into_includes();
                doc.dialect = summary.dialect;
                doc.file_symbol = summary.file_symbol;
                requests
            }
            Err(error) => {
                // A front-end crash becomes one diagnostic at the last
                // token; other documents keep processing.
                let awk_syntax::ParseError::Stalled { pos } = &error;
                let last = Position::new(pos.line.saturating_sub(1), pos.column.saturating_sub(1));
                sink.finish(last);
                let requests = sink.into_includes();
                doc.parse_diagnostics.push(Diagnostic {
                    range: crate::position::name_range(last, " "),
                    severity: Some(DiagnosticSeverity::ERROR),
                    source: Some("awk".into()),
                    code: Some(NumberOrString::String("awk::parse::crash".into())),
                    message: format!("AWK parser failed: {error}"),
                    ..Default::default()
                });
                requests
            }
        };

        let fingerprint = doc.signatures();
        let signatures_changed = fingerprint != doc.signature_fingerprint;
        doc.signature_fingerprint = fingerprint;

        self.altered.insert(item.uri.clone());
        if signatures_changed {
            self.altered_definitions.insert(item.uri.clone());
        }

        self.validate_depth -= 1;
        requests
    }

    /// Resolve one `@include`: link an existing document, or register a new
    /// one and read its file. Registration precedes the read, so a cycle's
    /// second include finds the entry and only adds an edge.
    async fn resolve_include(&mut self, includer: &Url, request: IncludeRequest) {
        let search_path = self.settings.include_path();
        let Some(path) = resolve_include_path(
            includer,
            &request.filename,
            request.relative,
            &search_path,
        ) else {
            if let Some(doc) = self.graph.get_mut(includer) {
                doc.parse_diagnostics.push(Diagnostic {
                    range: request.range,
                    severity: Some(DiagnosticSeverity::ERROR),
                    source: Some("awk".into()),
                    code: Some(NumberOrString::String("awk::include::not-found".into())),
                    message: format!("could not find include file \"{}\"", request.filename),
                    ..Default::default()
                });
            }
            return;
        };

        let Ok(uri) = Url::from_file_path(&path) else {
            return;
        };

        if self.graph.contains(&uri) {
            self.graph.add_edge(includer, &uri, request.range);
            return;
        }

        self.graph.ensure(&uri);
        self.graph.add_edge(includer, &uri, request.range);

        self.open_reads += 1;
        let read = tokio::fs::read_to_string(&path).await;
        self.open_reads -= 1;

        match read {
            Ok(text) => self.queue.push_back(QueueItem {
                uri,
                text,
                open_in_editor: false,
            }),
            Err(error) => {
                // The missing-include diagnostic already covers the
                // user-visible case; a read failure just skips the enqueue.
                tracing::debug!(%uri, %error, "include read failed");
            }
        }
    }

    /// Post-drain phase: close orphans, analyze the altered closure, and
    /// assemble the diagnostics batch for every live document.
    fn wrap_up(&mut self) -> PublishBatch {
        let closed = self.graph.collect_orphans();

        let results = analysis::check_function_calls(
            &self.graph,
            &self.altered,
            &self.altered_definitions,
            self.settings.stylistic_warnings.check_function_calls,
        );
        for (uri, diagnostics) in results {
            if let Some(doc) = self.graph.get_mut(&uri) {
                doc.analysis_diagnostics = diagnostics;
            }
        }
        self.altered.clear();
        self.altered_definitions.clear();

        let mut batch: PublishBatch = closed.into_iter().map(|uri| (uri, Vec::new())).collect();
        for doc in self.graph.iter() {
            let mut diagnostics: Vec<Diagnostic> = doc
                .parse_diagnostics
                .iter()
                .chain(doc.analysis_diagnostics.iter())
                .cloned()
                .collect();
            diagnostics.truncate(self.settings.max_number_of_problems);
            batch.push((doc.uri.clone(), diagnostics));
        }
        batch
    }

    pub(crate) fn document(&self, uri: &Url) -> Option<&Document> {
        self.graph.get(uri)
    }
}

/// Outline container hint: the file stem, e.g. `mathUtils` for
/// `/lib/mathUtils.awk`. The front-end decides whether to honor it.
fn file_base_name(uri: &Url) -> Option<String> {
    let path = uri.to_file_path().ok()?;
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use awk_syntax::SymbolKind;

    fn scratch_dir(tag: &str) -> std::path::PathBuf {
        let unique = format!(
            "awk-lsp-engine-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn file_uri(path: &std::path::Path) -> Url {
        Url::from_file_path(std::fs::canonicalize(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn include_cycle_parses_each_document_once() {
        let dir = scratch_dir("cycle");
        let a = dir.join("a.awk");
        let b = dir.join("b.awk");
        std::fs::write(&a, "@include \"b.awk\"\nBEGIN { x = 1 }\n").unwrap();
        std::fs::write(&b, "@include \"a.awk\"\nBEGIN { y = 2 }\n").unwrap();

        let mut engine = Engine::default();
        let a_uri = file_uri(&a);
        let b_uri = file_uri(&b);
        let text = std::fs::read_to_string(&a).unwrap();
        engine.update_document(a_uri.clone(), text).await;

        assert_eq!(engine.graph.len(), 2);
        let a_doc = engine.document(&a_uri).unwrap();
        let b_doc = engine.document(&b_uri).unwrap();
        assert!(a_doc.includes.contains_key(&b_uri));
        assert!(b_doc.includes.contains_key(&a_uri));
        assert!(a_doc.included_by.contains_key(&b_uri));
        // Both sides parsed: their globals are defined.
        assert!(!a_doc.definitions_of(SymbolKind::Global, "x").is_empty());
        assert!(!b_doc.definitions_of(SymbolKind::Global, "y").is_empty());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn missing_include_reports_at_the_directive() {
        let dir = scratch_dir("missing");
        let main = dir.join("main.awk");
        std::fs::write(&main, "@include \"nope.awk\"\nBEGIN { x = 1 }\n").unwrap();

        let mut engine = Engine::default();
        let uri = file_uri(&main);
        let text = std::fs::read_to_string(&main).unwrap();
        let batch = engine.update_document(uri.clone(), text).await;

        let (_, diagnostics) = batch.iter().find(|(u, _)| *u == uri).unwrap();
        assert!(diagnostics
            .iter()
            .any(|d| d.message.contains("nope.awk") && d.range.start == Position::new(0, 0)));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn arity_mismatch_across_include_is_reported_and_rechecked() {
        let dir = scratch_dir("arity");
        let lib = dir.join("lib.awk");
        let main = dir.join("main.awk");
        std::fs::write(&lib, "function f(x, y) { return x + y }\n").unwrap();
        std::fs::write(&main, "@include \"lib.awk\"\nBEGIN { print f(1) }\n").unwrap();

        let mut engine = Engine::default();
        let main_uri = file_uri(&main);
        let lib_uri = file_uri(&lib);
        let text = std::fs::read_to_string(&main).unwrap();
        let batch = engine.update_document(main_uri.clone(), text).await;

        let (_, diagnostics) = batch.iter().find(|(u, _)| *u == main_uri).unwrap();
        assert!(
            diagnostics.iter().any(|d| d.message.contains("'f'")),
            "expected an arity diagnostic on the caller: {diagnostics:?}"
        );

        // Widening the signature in lib re-checks main in the next batch.
        let batch = engine
            .update_document(
                lib_uri.clone(),
                "function f(x, y, z) { return x + y + z }\n".into(),
            )
            .await;
        let (_, diagnostics) = batch.iter().find(|(u, _)| *u == main_uri).unwrap();
        assert!(
            diagnostics.iter().any(|d| d.message.contains("'f'")),
            "re-analysis should still flag the one-argument call"
        );

        // Altered registers drain after every wrap-up.
        assert!(engine.altered.is_empty());
        assert!(engine.altered_definitions.is_empty());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn close_collects_unreferenced_includes() {
        let dir = scratch_dir("close");
        let lib = dir.join("lib.awk");
        let main = dir.join("main.awk");
        std::fs::write(&lib, "function f() { return 1 }\n").unwrap();
        std::fs::write(&main, "@include \"lib.awk\"\nBEGIN { x = f() }\n").unwrap();

        let mut engine = Engine::default();
        let main_uri = file_uri(&main);
        let text = std::fs::read_to_string(&main).unwrap();
        engine.update_document(main_uri.clone(), text).await;
        assert_eq!(engine.graph.len(), 2);

        let batch = engine.close_document(&main_uri);
        assert_eq!(engine.graph.len(), 0);
        // Both closed documents get their diagnostics cleared.
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|(_, diags)| diags.is_empty()));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn reparsing_identical_text_is_idempotent() {
        let mut engine = Engine::default();
        let uri = Url::parse("file:///virtual/one.awk").unwrap();
        let text = "function f(a) { return a }\nBEGIN { x = f(1); print y }\n";

        let first = engine.update_document(uri.clone(), text.to_string()).await;
        let snapshot_used: Vec<(String, Position)> = engine
            .document(&uri)
            .unwrap()
            .used
            .iter()
            .map(|u| (u.name.clone(), u.position))
            .collect();

        let second = engine.update_document(uri.clone(), text.to_string()).await;
        let again: Vec<(String, Position)> = engine
            .document(&uri)
            .unwrap()
            .used
            .iter()
            .map(|u| (u.name.clone(), u.position))
            .collect();

        assert_eq!(snapshot_used, again);
        let diags = |batch: &PublishBatch| {
            batch
                .iter()
                .find(|(u, _)| *u == uri)
                .map(|(_, d)| d.clone())
                .unwrap()
        };
        assert_eq!(diags(&first).len(), diags(&second).len());
    }

    #[tokio::test]
    async fn diagnostics_are_capped_by_configuration() {
        let mut engine = Engine::new(Settings {
            max_number_of_problems: 1,
            ..Settings::default()
        });
        let uri = Url::parse("file:///virtual/noisy.awk").unwrap();
        // Two missing-separator warnings on two lines.
        let text = "BEGIN { a = 1 print a }\nEND { b = 2 print b }\n";
        let batch = engine.update_document(uri.clone(), text.to_string()).await;
        let (_, diagnostics) = batch.iter().find(|(u, _)| *u == uri).unwrap();
        assert_eq!(diagnostics.len(), 1);
    }
}
