//! Diagnostic configuration for a state machine.

use serde::{Deserialize, Serialize};

/// Default number of transitions kept in the debug trace
pub const DEFAULT_TRACE_CAPACITY: usize = 64;

/// Options fixed when a machine is constructed.
///
/// Missing fields take their defaults when deserialized, so hosts can embed
/// a partial table in their own configuration files.
///
/// # Example
///
/// ```rust
/// use signalbox::machine::MachineOptions;
///
/// let options: MachineOptions = serde_json::from_str(r#"{ "debug": true }"#).unwrap();
/// assert!(options.debug);
/// assert!(options.report_errors);
/// assert_eq!(options.trace_capacity, signalbox::machine::DEFAULT_TRACE_CAPACITY);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineOptions {
    /// Emit a `debug` event and keep a trace record for every transition
    pub debug: bool,

    /// Report rejected self-transitions; used by the builder when it
    /// configures the initial state set
    pub report_errors: bool,

    /// Number of trace records retained while `debug` is on
    pub trace_capacity: usize,
}

impl Default for MachineOptions {
    fn default() -> Self {
        Self {
            debug: false,
            report_errors: true,
            trace_capacity: DEFAULT_TRACE_CAPACITY,
        }
    }
}
