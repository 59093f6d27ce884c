//! End-to-end LSP protocol tests.
//!
//! These exercise the full LanguageServer implementation by constructing a
//! real AwkLspBackend via tower-lsp's service builder, sending protocol
//! messages, and verifying responses.

use serde_json::{json, Value};
use tower::{Service, ServiceExt};
use tower_lsp::LspService;

fn build_service() -> LspService<awk_lsp::AwkLspBackend> {
    let (service, _socket) = LspService::new(awk_lsp::AwkLspBackend::new);
    service
}

async fn send_request(
    service: &mut LspService<awk_lsp::AwkLspBackend>,
    id: i64,
    method: &str,
    params: Value,
) -> Option<Value> {
    use tower_lsp::jsonrpc;

    let req_value = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    });
    let req: jsonrpc::Request = serde_json::from_value(req_value).unwrap();

    let resp = service.ready().await.unwrap().call(req).await.unwrap();
    resp.map(|r| serde_json::to_value(r).unwrap())
}

async fn send_notification(
    service: &mut LspService<awk_lsp::AwkLspBackend>,
    method: &str,
    params: Value,
) {
    use tower_lsp::jsonrpc;

    let req_value = json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params
    });
    let req: jsonrpc::Request = serde_json::from_value(req_value).unwrap();
    let _ = service.ready().await.unwrap().call(req).await;
}

async fn initialize(service: &mut LspService<awk_lsp::AwkLspBackend>) {
    let init_params = json!({
        "processId": null,
        "capabilities": {},
        "rootUri": null
    });
    let resp = send_request(service, 1, "initialize", init_params).await;
    assert!(resp.is_some(), "initialize should return a response");

    send_notification(service, "initialized", json!({})).await;
}

async fn open_document(
    service: &mut LspService<awk_lsp::AwkLspBackend>,
    uri: &str,
    text: &str,
) {
    send_notification(
        service,
        "textDocument/didOpen",
        json!({
            "textDocument": {
                "uri": uri,
                "languageId": "awk",
                "version": 1,
                "text": text
            }
        }),
    )
    .await;
}

async fn close_document(service: &mut LspService<awk_lsp::AwkLspBackend>, uri: &str) {
    send_notification(
        service,
        "textDocument/didClose",
        json!({ "textDocument": { "uri": uri } }),
    )
    .await;
}

async fn hover_at(
    service: &mut LspService<awk_lsp::AwkLspBackend>,
    id: i64,
    uri: &str,
    line: u32,
    character: u32,
) -> Value {
    send_request(
        service,
        id,
        "textDocument/hover",
        json!({
            "textDocument": { "uri": uri },
            "position": { "line": line, "character": character }
        }),
    )
    .await
    .expect("hover should return a response")["result"]
        .clone()
}

fn scratch_dir(tag: &str) -> std::path::PathBuf {
    let unique = format!(
        "awk-lsp-protocol-{tag}-{}-{}",
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

const IMPLICIT_GLOBAL: &str = "BEGIN { x = 1; print y }\n";

#[tokio::test]
async fn initialize_advertises_core_capabilities() {
    let mut service = build_service();
    let resp = send_request(
        &mut service,
        1,
        "initialize",
        json!({ "processId": null, "capabilities": {}, "rootUri": null }),
    )
    .await
    .expect("initialize should return a response");

    let capabilities = &resp["result"]["capabilities"];
    assert_eq!(capabilities["textDocumentSync"], json!(1), "full sync");
    assert_eq!(capabilities["completionProvider"]["resolveProvider"], json!(true));
    assert!(capabilities["hoverProvider"].as_bool().unwrap_or(false));
    assert!(capabilities["definitionProvider"].as_bool().unwrap_or(false));
    assert!(capabilities["referencesProvider"].as_bool().unwrap_or(false));
    assert!(capabilities["documentSymbolProvider"].as_bool().unwrap_or(false));
    assert!(capabilities["workspaceSymbolProvider"].as_bool().unwrap_or(false));
    assert_eq!(
        capabilities["signatureHelpProvider"]["triggerCharacters"],
        json!(["("])
    );
}

#[tokio::test]
async fn implicit_global_hover_definition_references() {
    let mut service = build_service();
    initialize(&mut service).await;

    let uri = "file:///test/foo.awk";
    open_document(&mut service, uri, IMPLICIT_GLOBAL).await;

    // Go-to-definition over `y` filters the implicit definition out.
    let resp = send_request(
        &mut service,
        2,
        "textDocument/definition",
        json!({
            "textDocument": { "uri": uri },
            "position": { "line": 0, "character": 21 }
        }),
    )
    .await
    .unwrap();
    assert!(resp["result"].is_null(), "implicit definitions are hidden");

    // Hover still names the kind.
    let hover = hover_at(&mut service, 3, uri, 0, 21).await;
    let contents = hover["contents"]["value"].as_str().unwrap();
    assert!(contents.contains("global variable"), "got: {contents}");

    // References with declarations included find the single use site.
    let resp = send_request(
        &mut service,
        4,
        "textDocument/references",
        json!({
            "textDocument": { "uri": uri },
            "position": { "line": 0, "character": 21 },
            "context": { "includeDeclaration": true }
        }),
    )
    .await
    .unwrap();
    let locations = resp["result"].as_array().expect("reference list");
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0]["range"]["start"], json!({ "line": 0, "character": 21 }));

    // The explicit assignment to `x` is a real definition target.
    let resp = send_request(
        &mut service,
        5,
        "textDocument/definition",
        json!({
            "textDocument": { "uri": uri },
            "position": { "line": 0, "character": 8 }
        }),
    )
    .await
    .unwrap();
    assert_eq!(resp["result"]["range"]["start"], json!({ "line": 0, "character": 8 }));
}

#[tokio::test]
async fn include_cycle_links_both_documents() {
    let dir = scratch_dir("cycle");
    let a = dir.join("a.awk");
    let b = dir.join("b.awk");
    std::fs::write(&a, "@include \"b.awk\"\nBEGIN { x = 1 }\n").unwrap();
    std::fs::write(&b, "@include \"a.awk\"\nfunction from_b() { return 1 }\n").unwrap();

    let mut service = build_service();
    initialize(&mut service).await;

    let a_uri =
        tower_lsp::lsp_types::Url::from_file_path(std::fs::canonicalize(&a).unwrap()).unwrap();
    let text = std::fs::read_to_string(&a).unwrap();
    open_document(&mut service, a_uri.as_str(), &text).await;

    // The cycle resolved without recursion; b's symbols are queryable.
    let resp = send_request(
        &mut service,
        2,
        "workspace/symbol",
        json!({ "query": "from_b" }),
    )
    .await
    .unwrap();
    let symbols = resp["result"].as_array().expect("workspace symbols");
    assert_eq!(symbols.len(), 1);
    assert!(symbols[0]["location"]["uri"]
        .as_str()
        .unwrap()
        .ends_with("b.awk"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn signature_help_rejects_cursor_past_closing_paren() {
    let mut service = build_service();
    initialize(&mut service).await;

    let uri = "file:///test/sig.awk";
    open_document(&mut service, uri, "BEGIN { print substr(\"abc\", 1, 2) }\n").await;

    // Inside the second argument: substr's signature, parameter 1 active.
    let resp = send_request(
        &mut service,
        2,
        "textDocument/signatureHelp",
        json!({
            "textDocument": { "uri": uri },
            "position": { "line": 0, "character": 28 }
        }),
    )
    .await
    .unwrap();
    let help = &resp["result"];
    assert_eq!(help["activeParameter"], json!(1));
    assert!(help["signatures"][0]["label"]
        .as_str()
        .unwrap()
        .starts_with("substr("));

    // Past the closing paren: no signatures.
    let resp = send_request(
        &mut service,
        3,
        "textDocument/signatureHelp",
        json!({
            "textDocument": { "uri": uri },
            "position": { "line": 0, "character": 33 }
        }),
    )
    .await
    .unwrap();
    assert!(resp["result"].is_null());
}

#[tokio::test]
async fn completion_respects_function_scope() {
    let mut service = build_service();
    initialize(&mut service).await;

    let uri = "file:///test/scope.awk";
    let text = "function f(a) { a = 1 }\nfunction g(b) { b = 2 }\nBEGIN { total = 0 }\n";
    open_document(&mut service, uri, text).await;

    let resp = send_request(
        &mut service,
        2,
        "textDocument/completion",
        json!({
            "textDocument": { "uri": uri },
            "position": { "line": 0, "character": 17 }
        }),
    )
    .await
    .unwrap();
    let labels: Vec<&str> = resp["result"]
        .as_array()
        .expect("completion list")
        .iter()
        .map(|item| item["label"].as_str().unwrap())
        .collect();

    assert!(labels.contains(&"a"), "own parameter completes");
    assert!(!labels.contains(&"b"), "other function's parameter is out of scope");
    assert!(labels.contains(&"total"), "file-scope global completes");
    assert!(labels.contains(&"f") && labels.contains(&"g"));
    assert!(labels.contains(&"substr"), "built-ins always complete");
}

#[tokio::test]
async fn shebang_overrides_strict_mode() {
    let mut service = build_service();
    initialize(&mut service).await;

    // Strict mode, and no compatibility listing of gawk built-ins.
    send_notification(
        &mut service,
        "workspace/didChangeConfiguration",
        json!({
            "settings": {
                "awk": {
                    "mode": "awk",
                    "stylisticWarnings": { "compatibility": false }
                }
            }
        }),
    )
    .await;

    let plain = "file:///test/plain.awk";
    open_document(&mut service, plain, "BEGIN { x = systime() }\n").await;
    let hover = hover_at(&mut service, 2, plain, 0, 13).await;
    let contents = hover["contents"]["value"].as_str().unwrap();
    assert!(
        !contents.contains("epoch"),
        "gawk built-in must stay hidden in strict mode: {contents}"
    );

    let gawk = "file:///test/gawk.awk";
    open_document(
        &mut service,
        gawk,
        "#!/usr/bin/gawk -f\nBEGIN { x = systime() }\n",
    )
    .await;
    let hover = hover_at(&mut service, 3, gawk, 1, 13).await;
    let contents = hover["contents"]["value"].as_str().unwrap();
    assert!(
        contents.contains("epoch"),
        "shebang flips this file to gawk mode: {contents}"
    );
}

#[tokio::test]
async fn document_symbols_use_the_file_container_hint() {
    let mut service = build_service();
    initialize(&mut service).await;

    let utils = "file:///lib/mathUtils.awk";
    open_document(&mut service, utils, "function square(x) { return x * x }\n").await;
    let resp = send_request(
        &mut service,
        2,
        "textDocument/documentSymbol",
        json!({ "textDocument": { "uri": utils } }),
    )
    .await
    .unwrap();
    let symbols = resp["result"].as_array().expect("document symbols");
    assert_eq!(symbols[0]["name"], json!("square"));
    assert_eq!(symbols[0]["containerName"], json!("mathUtils"));

    // The `Constants` suffix suppresses the hint.
    let constants = "file:///lib/mathConstants.awk";
    open_document(&mut service, constants, "function pi() { return 3.14159 }\n").await;
    let resp = send_request(
        &mut service,
        3,
        "textDocument/documentSymbol",
        json!({ "textDocument": { "uri": constants } }),
    )
    .await
    .unwrap();
    let symbols = resp["result"].as_array().expect("document symbols");
    assert_eq!(symbols[0]["name"], json!("pi"));
    assert!(symbols[0]["containerName"].is_null());
}

#[tokio::test]
async fn workspace_symbols_match_by_prefix() {
    let mut service = build_service();
    initialize(&mut service).await;

    let uri = "file:///test/funcs.awk";
    open_document(
        &mut service,
        uri,
        "function alpha() { return 1 }\nfunction beta() { return 2 }\n",
    )
    .await;

    let resp = send_request(&mut service, 2, "workspace/symbol", json!({ "query": "al" }))
        .await
        .unwrap();
    let symbols = resp["result"].as_array().expect("workspace symbols");
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0]["name"], json!("alpha"));
}

#[tokio::test]
async fn open_close_open_is_idempotent() {
    let mut service = build_service();
    initialize(&mut service).await;

    let uri = "file:///test/cycle-open.awk";
    open_document(&mut service, uri, IMPLICIT_GLOBAL).await;
    let first = hover_at(&mut service, 2, uri, 0, 21).await;
    assert!(!first.is_null());

    close_document(&mut service, uri).await;
    let gone = hover_at(&mut service, 3, uri, 0, 21).await;
    assert!(gone.is_null(), "closed documents answer nothing");

    open_document(&mut service, uri, IMPLICIT_GLOBAL).await;
    let again = hover_at(&mut service, 4, uri, 0, 21).await;
    assert_eq!(first, again, "reopening restores identical results");
}
