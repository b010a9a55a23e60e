//! Application layer: ports, the macro engine, and the protocol dispatcher.
//!
//! | Module         | Role                                                  |
//! |----------------|-------------------------------------------------------|
//! | `hid_sink`     | Port: keyboard/mouse primitives                       |
//! | `clock`        | Port: millisecond clock                               |
//! | `macro_store`  | Port: named macro documents                           |
//! | `macro_engine` | Recorder/player state machine                         |
//! | `dispatcher`   | JSON-RPC routing to tools and the engine              |
//! | `core_loop`    | Single thread that owns the dispatcher and ticks it   |

pub mod clock;
pub mod core_loop;
pub mod dispatcher;
pub mod hid_sink;
pub mod macro_engine;
pub mod macro_store;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use core_loop::{spawn_core_loop, CoreError, CoreHandle, InboundMessage};
pub use dispatcher::McpDispatcher;
pub use hid_sink::{HidError, HidSink};
pub use macro_engine::{EngineStatus, MacroEngine, MacroError};
pub use macro_store::{MacroStore, StorageError};
