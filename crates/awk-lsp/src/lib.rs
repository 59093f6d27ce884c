#![doc = include_str!("../README.md")]

mod adapter;
mod analysis;
mod completion;
mod config;
mod document;
mod engine;
mod graph;
mod hover;
mod navigation;
mod position;
mod signature;
mod symbols;
mod utils;

pub use config::{Settings, StylisticWarnings};
pub use engine::Engine;
pub use graph::EDITOR_ROOT_URI;

use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use engine::PublishBatch;

/// LSP backend. One engine guards all mutable state; handlers either drive
/// the processing queue (text sync, configuration) or read the query
/// structures between wrap-ups.
pub struct AwkLspBackend {
    client: Client,
    engine: Mutex<Engine>,
}

impl AwkLspBackend {
    pub fn new(client: Client) -> Self {
        AwkLspBackend {
            client,
            engine: Mutex::new(Engine::default()),
        }
    }

    async fn publish(&self, batch: PublishBatch) {
        for (uri, diagnostics) in batch {
            self.client.publish_diagnostics(uri, diagnostics, None).await;
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for AwkLspBackend {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "awk-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(true),
                    ..Default::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                workspace_symbol_provider: Some(OneOf::Left(true)),
                signature_help_provider: Some(SignatureHelpOptions {
                    trigger_characters: Some(vec!["(".to_string()]),
                    retrigger_characters: None,
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                }),
                ..Default::default()
            },
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("awk-lsp initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let text = params.text_document.text;
        let batch = self.engine.lock().await.update_document(uri, text).await;
        self.publish(batch).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the final change carries the whole document.
        let Some(change) = params.content_changes.into_iter().next_back() else {
            return;
        };
        let uri = params.text_document.uri;
        let batch = self
            .engine
            .lock()
            .await
            .update_document(uri, change.text)
            .await;
        self.publish(batch).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        let batch = self.engine.lock().await.close_document(&uri);
        self.publish(batch).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let value = params.settings;
        let section = value.get("awk").cloned().unwrap_or(value);
        let settings = match serde_json::from_value::<Settings>(section) {
            Ok(settings) => settings,
            Err(error) => {
                tracing::warn!(%error, "ignoring malformed configuration");
                return;
            }
        };
        let batch = {
            let mut engine = self.engine.lock().await;
            if engine.settings == settings {
                Vec::new()
            } else {
                engine.change_configuration(settings).await
            }
        };
        self.publish(batch).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let pos = params.text_document_position_params.position;
        let engine = self.engine.lock().await;
        Ok(hover::hover(&engine.graph, &engine.settings, &uri, pos))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let pos = params.text_document_position_params.position;
        let engine = self.engine.lock().await;
        Ok(navigation::definition(&engine.graph, &uri, pos))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let pos = params.text_document_position.position;
        let include_declaration = params.context.include_declaration;
        let engine = self.engine.lock().await;
        let locations = navigation::references(&engine.graph, &uri, pos, include_declaration);
        Ok((!locations.is_empty()).then_some(locations))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let pos = params.text_document_position.position;
        let engine = self.engine.lock().await;
        let items = completion::completions(&engine.graph, &uri, pos);
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn completion_resolve(&self, item: CompletionItem) -> Result<CompletionItem> {
        Ok(completion::resolve(item))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        let engine = self.engine.lock().await;
        let symbols = navigation::document_symbols(&engine.graph, &uri);
        Ok((!symbols.is_empty()).then_some(DocumentSymbolResponse::Flat(symbols)))
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        let engine = self.engine.lock().await;
        let symbols = navigation::workspace_symbols(&engine.graph, &params.query);
        Ok((!symbols.is_empty()).then_some(symbols))
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> Result<Option<SignatureHelp>> {
        let uri = params.text_document_position_params.text_document.uri;
        let pos = params.text_document_position_params.position;
        let engine = self.engine.lock().await;
        Ok(signature::signature_help(
            &engine.graph,
            &engine.settings,
            &uri,
            pos,
        ))
    }
}
