//! MCP wire protocol: JSON-RPC envelopes, method names, and the tool catalog.

pub mod envelope;
pub mod tools;

use serde_json::{json, Value};

pub use envelope::{EnvelopeError, Request, Response, RpcError, JSONRPC_VERSION, SERVER_ERROR};
pub use tools::{tools_list_result, ParamSpec, ParamType, Tool, ToolSpec, CATALOG};

/// MCP protocol revision announced by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Implementation name reported in `serverInfo`.
pub const IMPLEMENTATION_NAME: &str = "ducky-hid-mcp-server";

/// Implementation version reported in `serverInfo`.
pub const IMPLEMENTATION_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Display name reported by `system_status`.
pub const SERVER_NAME: &str = "Ducky-HID-Controller";

/// Methods understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Initialize,
    ToolsList,
    ToolsCall,
    Macro(MacroMethod),
}

/// The `macros/*` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroMethod {
    List,
    Status,
    RecordStart,
    RecordStop,
    RecordDelay,
    Play,
    Stop,
    Load,
    Export,
    Import,
    Delete,
}

impl Method {
    pub fn parse(name: &str) -> Option<Self> {
        let method = match name {
            "initialize" => Method::Initialize,
            "tools/list" => Method::ToolsList,
            "tools/call" => Method::ToolsCall,
            "macros/list" => Method::Macro(MacroMethod::List),
            "macros/status" => Method::Macro(MacroMethod::Status),
            "macros/record/start" => Method::Macro(MacroMethod::RecordStart),
            "macros/record/stop" => Method::Macro(MacroMethod::RecordStop),
            "macros/record/delay" => Method::Macro(MacroMethod::RecordDelay),
            "macros/play" => Method::Macro(MacroMethod::Play),
            "macros/stop" => Method::Macro(MacroMethod::Stop),
            "macros/load" => Method::Macro(MacroMethod::Load),
            "macros/export" => Method::Macro(MacroMethod::Export),
            "macros/import" => Method::Macro(MacroMethod::Import),
            "macros/delete" => Method::Macro(MacroMethod::Delete),
            _ => return None,
        };
        Some(method)
    }
}

/// The `initialize` result object.
pub fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "serverInfo": {
            "name": IMPLEMENTATION_NAME,
            "version": IMPLEMENTATION_VERSION,
        },
        "capabilities": { "tools": true },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::parse("initialize"), Some(Method::Initialize));
        assert_eq!(
            Method::parse("macros/record/start"),
            Some(Method::Macro(MacroMethod::RecordStart))
        );
        assert_eq!(Method::parse("tools/delete"), None);
    }

    #[test]
    fn test_initialize_result_shape() {
        // Arrange / Act
        let result = initialize_result();

        // Assert
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], IMPLEMENTATION_NAME);
        assert_eq!(result["capabilities"]["tools"], true);
    }
}
