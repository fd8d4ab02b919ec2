//! Lifecycle (§4.8): `initialize`/`initialized`/`shutdown`/`exit` state
//! transitions, narrowed to this server's exact capability set.

use std::path::PathBuf;

use lsp_types::{InitializeParams, InitializeResult, ServerInfo};

use crate::error::ServerError;
use crate::util::uri::uri_to_path;

/// Tracks whether `initialize` and `shutdown` have been seen, and the
/// workspace root recorded at `initialize` (§4.8).
#[derive(Default)]
pub struct Lifecycle {
    initialized: bool,
    shutdown_requested: bool,
    workspace_root: Option<PathBuf>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workspace_root(&self) -> Option<&PathBuf> {
        self.workspace_root.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// `initialize`: record the workspace root (preferring
    /// `root_uri`/`workspace_folders[0]` over the deprecated `root_path`,
    /// §6) and return this server's capabilities.
    pub fn initialize(&mut self, params: &InitializeParams) -> InitializeResult {
        self.workspace_root = workspace_root_from_params(params);
        self.initialized = true;

        InitializeResult {
            capabilities: sg_protocol::capabilities::capabilities(),
            server_info: Some(ServerInfo { name: "sg-lsp".to_string(), version: Some(env!("CARGO_PKG_VERSION").to_string()) }),
        }
    }

    /// `shutdown`: record the request. The server keeps running (still
    /// answering requests per spec) but will only exit cleanly after
    /// this, and publishes no further diagnostics for documents that
    /// later close (§4.8).
    pub fn shutdown(&mut self) {
        self.shutdown_requested = true;
    }

    /// `exit`: success only if `shutdown` preceded it (§4.8).
    pub fn exit(&self) -> Result<(), ServerError> {
        if self.shutdown_requested {
            Ok(())
        } else {
            Err(ServerError::ExitBeforeShutdown)
        }
    }
}

fn workspace_root_from_params(params: &InitializeParams) -> Option<PathBuf> {
    if let Some(folders) = &params.workspace_folders {
        if let Some(first) = folders.first() {
            if let Some(path) = uri_to_path(first.uri.as_str()) {
                return Some(path);
            }
        }
    }
    #[allow(deprecated)]
    if let Some(uri) = &params.root_uri {
        if let Some(path) = uri_to_path(uri.as_str()) {
            return Some(path);
        }
    }
    #[allow(deprecated)]
    params.root_path.as_ref().map(PathBuf::from)
}
