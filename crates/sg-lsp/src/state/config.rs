//! Server configuration (§4.6).
//!
//! Runtime configuration for the LSP server's inlay hints and tracing,
//! updated dynamically via `workspace/didChangeConfiguration`.

/// Server configuration, applied from `workspace/didChangeConfiguration`
/// (§4.6). Updated by probing the incoming JSON value field-by-field via
/// `update_from_value` rather than deserializing a closed struct, so
/// unrecognized client settings are silently ignored instead of causing a
/// parse failure.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `inlayHints.letTypes` — inferred-type hints on `let` bindings.
    pub inlay_hints_let_types: bool,
    /// `inlayHints.hideObvious` — suppress the above when the initializer
    /// is a matching literal.
    pub inlay_hints_hide_obvious: bool,
    /// `inlayHints.defaultInit` — `= default::<T>()` hints on
    /// uninitialized typed `let`s.
    pub inlay_hints_default_init: bool,
    /// `inlayHints.enumImplicitValues` — enum-variant value hints.
    pub inlay_hints_enum_implicit_values: bool,
    /// `lsp.trace` — verbose server-side tracing to stderr.
    pub lsp_trace: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            inlay_hints_let_types: true,
            inlay_hints_hide_obvious: true,
            inlay_hints_default_init: true,
            inlay_hints_enum_implicit_values: true,
            lsp_trace: false,
        }
    }
}

impl ServerConfig {
    /// Update configuration from LSP settings. Unknown keys are ignored
    /// (§4.6: forward compatibility with client settings schemas the
    /// server doesn't yet recognize).
    pub fn update_from_value(&mut self, settings: &serde_json::Value) {
        if let Some(inlay) = settings.get("inlayHints") {
            if let Some(let_types) = inlay.get("letTypes").and_then(|v| v.as_bool()) {
                self.inlay_hints_let_types = let_types;
            }
            if let Some(hide_obvious) = inlay.get("hideObvious").and_then(|v| v.as_bool()) {
                self.inlay_hints_hide_obvious = hide_obvious;
            }
            if let Some(default_init) = inlay.get("defaultInit").and_then(|v| v.as_bool()) {
                self.inlay_hints_default_init = default_init;
            }
            if let Some(enum_values) = inlay.get("enumImplicitValues").and_then(|v| v.as_bool()) {
                self.inlay_hints_enum_implicit_values = enum_values;
            }
        }

        if let Some(lsp) = settings.get("lsp") {
            if let Some(trace) = lsp.get("trace").and_then(|v| v.as_bool()) {
                self.lsp_trace = trace;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_enable_all_hints_and_disable_trace() {
        let config = ServerConfig::default();
        assert!(config.inlay_hints_let_types);
        assert!(config.inlay_hints_hide_obvious);
        assert!(config.inlay_hints_default_init);
        assert!(config.inlay_hints_enum_implicit_values);
        assert!(!config.lsp_trace);
    }

    #[test]
    fn updates_recognized_inlay_hint_keys() {
        let mut config = ServerConfig::default();
        config.update_from_value(&json!({
            "inlayHints": { "letTypes": false, "enumImplicitValues": false },
            "lsp": { "trace": true },
        }));
        assert!(!config.inlay_hints_let_types);
        assert!(config.inlay_hints_hide_obvious);
        assert!(!config.inlay_hints_enum_implicit_values);
        assert!(config.lsp_trace);
    }

    #[test]
    fn unknown_keys_are_ignored_not_rejected() {
        let mut config = ServerConfig::default();
        config.update_from_value(&json!({
            "inlayHints": { "letTypes": false, "somethingUnrecognized": 42 },
            "somethingElseEntirely": { "nested": true },
        }));
        assert!(!config.inlay_hints_let_types);
    }
}
