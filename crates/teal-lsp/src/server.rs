use dashmap::DashMap;
use tower_lsp_server::{Client, LanguageServer, jsonrpc, ls_types};
use tracing::debug;

use crate::capabilities;
use crate::diagnostics::DiagnosticsHandler;

#[derive(Debug)]
pub(crate) struct Backend {
    client: Client,
    handler: DiagnosticsHandler,
    documents: DashMap<String, String>,
}

impl Backend {
    pub(crate) fn new(client: Client, handler: DiagnosticsHandler) -> Self {
        Self {
            client,
            handler,
            documents: DashMap::new(),
        }
    }

    async fn publish(&self, uri: ls_types::Uri, text: &str, version: Option<i32>) {
        let diagnostics = (self.handler)(text);
        debug!(?uri, count = diagnostics.len(), "Publishing diagnostics");
        self.client.publish_diagnostics(uri, diagnostics, version).await;
    }
}

impl LanguageServer for Backend {
    async fn initialize(&self, _: ls_types::InitializeParams) -> jsonrpc::Result<ls_types::InitializeResult> {
        self.client
            .log_message(ls_types::MessageType::INFO, "Server initialized")
            .await;
        Ok(ls_types::InitializeResult {
            capabilities: capabilities::server_capabilities(),
            server_info: Some(ls_types::ServerInfo {
                name: "tealsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            ..Default::default()
        })
    }

    async fn shutdown(&self) -> jsonrpc::Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: ls_types::DidOpenTextDocumentParams) {
        let document = params.text_document;
        self.documents
            .insert(document.uri.to_string(), document.text.clone());
        self.publish(document.uri, &document.text, Some(document.version))
            .await;
    }

    async fn did_change(&self, mut params: ls_types::DidChangeTextDocumentParams) {
        // Full sync: the last change holds the whole document.
        let Some(change) = params.content_changes.pop() else {
            return;
        };

        let uri = params.text_document.uri;
        self.documents.insert(uri.to_string(), change.text.clone());
        self.publish(uri, &change.text, Some(params.text_document.version))
            .await;
    }

    async fn did_save(&self, params: ls_types::DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        let text = match params.text {
            Some(text) => {
                self.documents.insert(uri.to_string(), text.clone());
                Some(text)
            }
            None => self
                .documents
                .get(&uri.to_string())
                .map(|text| text.value().clone()),
        };

        if let Some(text) = text {
            self.publish(uri, &text, None).await;
        }
    }

    async fn did_close(&self, params: ls_types::DidCloseTextDocumentParams) {
        self.documents.remove(&params.text_document.uri.to_string());
        self.client
            .publish_diagnostics(params.text_document.uri, Vec::new(), None)
            .await;
    }
}
