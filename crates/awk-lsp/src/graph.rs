//! The document graph: URI-keyed map with bidirectional include edges,
//! reachability queries, and orphan collection.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::{Range, Url};

use crate::document::Document;

/// Synthetic root that "includes" every open editor buffer, so buffer
/// lifetime and include lifetime go through the same reachability rule.
pub const EDITOR_ROOT_URI: &str = "editor://buffers";

pub fn editor_root() -> Url {
    Url::parse(EDITOR_ROOT_URI).expect("editor root URI is well-formed")
}

#[derive(Default)]
pub struct DocumentGraph {
    documents: HashMap<Url, Document>,
}

impl DocumentGraph {
    pub fn new() -> Self {
        DocumentGraph::default()
    }

    pub fn get(&self, uri: &Url) -> Option<&Document> {
        self.documents.get(uri)
    }

    pub fn get_mut(&mut self, uri: &Url) -> Option<&mut Document> {
        self.documents.get_mut(uri)
    }

    pub fn contains(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Register an empty document. Creation happens before any content
    /// loads; a second include of the same URI finds this entry, which is
    /// what keeps include cycles from re-scheduling parses.
    pub fn ensure(&mut self, uri: &Url) -> &mut Document {
        self.documents
            .entry(uri.clone())
            .or_insert_with(|| Document::new(uri.clone()))
    }

    /// Record `includer → included` in both directions.
    pub fn add_edge(&mut self, includer: &Url, included: &Url, site: Range) {
        if let Some(doc) = self.documents.get_mut(includer) {
            doc.includes.entry(included.clone()).or_default().push(site);
        }
        if let Some(doc) = self.documents.get_mut(included) {
            doc.included_by.entry(includer.clone()).or_default().push(site);
        }
    }

    pub fn add_editor_edge(&mut self, uri: &Url) {
        let root = editor_root();
        if let Some(doc) = self.documents.get_mut(uri) {
            doc.included_by.entry(root).or_default().push(Range::default());
        }
    }

    pub fn remove_editor_edge(&mut self, uri: &Url) {
        if let Some(doc) = self.documents.get_mut(uri) {
            doc.included_by.remove(&editor_root());
        }
    }

    /// Drop every outgoing edge of `uri`, clearing the inverse entries on
    /// the targets. Runs before each re-parse so removed `@include` lines
    /// release their targets.
    pub fn detach_includes(&mut self, uri: &Url) {
        let targets: Vec<Url> = match self.documents.get_mut(uri) {
            Some(doc) => {
                let targets = doc.includes.keys().cloned().collect();
                doc.includes.clear();
                targets
            }
            None => return,
        };
        for target in targets {
            if let Some(doc) = self.documents.get_mut(&target) {
                doc.included_by.remove(uri);
            }
        }
    }

    /// Delete every document nothing references, transitively, and return
    /// the closed URIs.
    pub fn collect_orphans(&mut self) -> Vec<Url> {
        let mut closed = Vec::new();
        loop {
            let orphan = self
                .documents
                .iter()
                .find(|(_, doc)| doc.included_by.is_empty())
                .map(|(uri, _)| uri.clone());
            let Some(uri) = orphan else { break };
            self.detach_includes(&uri);
            self.documents.remove(&uri);
            closed.push(uri);
        }
        closed
    }

    /// URIs reachable from `start` along include edges, `start` first.
    pub fn reachable_from(&self, start: &Url) -> Vec<Url> {
        let mut seen: HashSet<Url> = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();
        seen.insert(start.clone());
        queue.push_back(start.clone());
        while let Some(uri) = queue.pop_front() {
            order.push(uri.clone());
            if let Some(doc) = self.documents.get(&uri) {
                for target in doc.includes.keys() {
                    if seen.insert(target.clone()) {
                        queue.push_back(target.clone());
                    }
                }
            }
        }
        order
    }

    /// Transitive closure of `seeds` along `included_by` edges: every
    /// document that directly or indirectly includes one of them, seeds
    /// included.
    pub fn including_closure(&self, seeds: &HashSet<Url>) -> HashSet<Url> {
        let mut closure = seeds.clone();
        let mut queue: VecDeque<Url> = seeds.iter().cloned().collect();
        let root = editor_root();
        while let Some(uri) = queue.pop_front() {
            if let Some(doc) = self.documents.get(&uri) {
                for includer in doc.included_by.keys() {
                    if *includer != root && closure.insert(includer.clone()) {
                        queue.push_back(includer.clone());
                    }
                }
            }
        }
        closure
    }
}

/// Pick the first existing candidate for an `@include` target and
/// canonicalize it. Relative targets resolve against the including file's
/// directory; others walk the search path, whose own relative entries
/// anchor at the including file (an editor process has no useful working
/// directory). Extensionless candidates also try `.awk` appended.
pub fn resolve_include_path(
    includer: &Url,
    filename: &str,
    relative: bool,
    search_path: &[PathBuf],
) -> Option<PathBuf> {
    let base_dir: Option<PathBuf> = includer
        .to_file_path()
        .ok()
        .and_then(|path| path.parent().map(Path::to_path_buf));

    let mut candidates: Vec<PathBuf> = Vec::new();
    if relative {
        if let Some(dir) = &base_dir {
            candidates.push(dir.join(filename));
        }
    } else {
        for entry in search_path {
            if entry.is_absolute() {
                candidates.push(entry.join(filename));
            } else if let Some(dir) = &base_dir {
                candidates.push(dir.join(entry).join(filename));
            }
        }
    }

    if Path::new(filename).extension().is_none() {
        let mut with_ext: Vec<PathBuf> = Vec::new();
        for candidate in &candidates {
            let mut alternative = candidate.clone();
            alternative.set_extension("awk");
            with_ext.push(alternative);
        }
        candidates.extend(with_ext);
    }

    for candidate in candidates {
        if candidate.exists() {
            if let Ok(canonical) = std::fs::canonicalize(&candidate) {
                return Some(canonical);
            }
        }
    }
    None
}
