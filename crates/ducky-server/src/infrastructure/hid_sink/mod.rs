//! HID sink adapters.
//!
//! - [`report`] – encodes USB boot reports for a Linux USB gadget, or
//!   discards them in dry-run mode.
//! - [`mock`] – records calls for tests.

pub mod mock;
pub mod report;

pub use mock::{HidCall, MockHidSink};
pub use report::{DryRunHidSink, GadgetHidSink, ReportHidSink};
