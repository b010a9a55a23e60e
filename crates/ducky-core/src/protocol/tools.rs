//! The static tool catalog returned by `tools/list`.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Map, Value};

/// Every tool the dispatcher can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    KeyboardType,
    KeyboardKey,
    KeyboardShortcut,
    MouseMove,
    MouseClick,
    MouseScroll,
    SystemStatus,
}

impl Tool {
    pub const ALL: [Tool; 7] = [
        Tool::KeyboardType,
        Tool::KeyboardKey,
        Tool::KeyboardShortcut,
        Tool::MouseMove,
        Tool::MouseClick,
        Tool::MouseScroll,
        Tool::SystemStatus,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::KeyboardType => "keyboard_type",
            Tool::KeyboardKey => "keyboard_key",
            Tool::KeyboardShortcut => "keyboard_shortcut",
            Tool::MouseMove => "mouse_move",
            Tool::MouseClick => "mouse_click",
            Tool::MouseScroll => "mouse_scroll",
            Tool::SystemStatus => "system_status",
        }
    }

    pub fn spec(self) -> &'static ToolSpec {
        &CATALOG[self as usize]
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tool {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL.iter().copied().find(|t| t.name() == s).ok_or(())
    }
}

/// JSON-Schema primitive type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Boolean,
}

impl ParamType {
    fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
        }
    }
}

#[derive(Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamType,
    pub description: &'static str,
}

/// Name, description and input schema of one tool.
#[derive(Debug)]
pub struct ToolSpec {
    pub tool: Tool,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
    /// Omitted from the schema when empty.
    pub required: &'static [&'static str],
}

impl ToolSpec {
    /// `{name, description, inputSchema:{type, properties, required?}}`.
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for param in self.params {
            properties.insert(
                param.name.to_string(),
                json!({ "type": param.kind.as_str(), "description": param.description }),
            );
        }
        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !self.required.is_empty() {
            schema.insert("required".into(), json!(self.required));
        }
        json!({
            "name": self.tool.name(),
            "description": self.description,
            "inputSchema": Value::Object(schema),
        })
    }
}

/// Catalog in [`Tool`] declaration order.
pub static CATALOG: [ToolSpec; 7] = [
    ToolSpec {
        tool: Tool::KeyboardType,
        description: "Type text using the keyboard",
        params: &[ParamSpec {
            name: "text",
            kind: ParamType::String,
            description: "Text to type",
        }],
        required: &["text"],
    },
    ToolSpec {
        tool: Tool::KeyboardKey,
        description: "Press a specific key or key combination",
        params: &[
            ParamSpec {
                name: "key",
                kind: ParamType::String,
                description: "Key to press (e.g., 'a', 'Enter', 'F1')",
            },
            ParamSpec {
                name: "modifiers",
                kind: ParamType::String,
                description: "Modifier keys (ctrl, shift, alt, gui)",
            },
        ],
        required: &["key"],
    },
    ToolSpec {
        tool: Tool::KeyboardShortcut,
        description: "Send a keyboard shortcut combination",
        params: &[ParamSpec {
            name: "shortcut",
            kind: ParamType::String,
            description: "Shortcut in ctrl+alt+delete format",
        }],
        required: &["shortcut"],
    },
    ToolSpec {
        tool: Tool::MouseMove,
        description: "Move the mouse cursor",
        params: &[
            ParamSpec {
                name: "x",
                kind: ParamType::Integer,
                description: "X coordinate or relative movement",
            },
            ParamSpec {
                name: "y",
                kind: ParamType::Integer,
                description: "Y coordinate or relative movement",
            },
            ParamSpec {
                name: "relative",
                kind: ParamType::Boolean,
                description: "Whether movement is relative (default: true)",
            },
        ],
        required: &["x", "y"],
    },
    ToolSpec {
        tool: Tool::MouseClick,
        description: "Click mouse button",
        params: &[
            ParamSpec {
                name: "button",
                kind: ParamType::String,
                description: "Mouse button (left, right, middle)",
            },
            ParamSpec {
                name: "duration",
                kind: ParamType::Integer,
                description: "Click duration in milliseconds",
            },
        ],
        required: &[],
    },
    ToolSpec {
        tool: Tool::MouseScroll,
        description: "Scroll the mouse wheel",
        params: &[ParamSpec {
            name: "scroll",
            kind: ParamType::Integer,
            description: "Scroll amount (positive = up, negative = down)",
        }],
        required: &["scroll"],
    },
    ToolSpec {
        tool: Tool::SystemStatus,
        description: "Get system status information",
        params: &[],
        required: &[],
    },
];

/// The `tools/list` result object.
pub fn tools_list_result() -> Value {
    json!({ "tools": CATALOG.iter().map(ToolSpec::to_json).collect::<Vec<_>>() })
}
