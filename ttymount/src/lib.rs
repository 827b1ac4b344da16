//! # ttymount
//!
//! Bridges host serial hardware into a sandboxed process.
//!
//! A single pass discovers serial device files on the host, makes sure an
//! equivalent character node exists inside the sandbox, reports whether each
//! one is readable and writable, and publishes the result to the consumer
//! through two environment variables:
//!
//! - `DEFAULT_SERIAL_PORT`: the highest-priority device, or empty
//! - `ALL_SERIAL_PORTS`: every device in priority order, comma separated
//!
//! No per-device problem is fatal. A host without serial hardware produces
//! two empty values and the consumer still starts.
//!
//! ## Platform
//!
//! Linux only: device numbers are decoded with the Linux `dev_t` layout.
//!
//! ## Features
//!
//! - `native` (default): USB bridge details via the `serialport` crate
//! - `serde`: Serialization support for report types
//!
//! ## Example
//!
//! ```rust,no_run
//! use ttymount::{DeviceScanner, ExecHandoff, NativeFs, Pipeline};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scanner = DeviceScanner::new("/dev", "/dev")?;
//!     let prepared = Pipeline::new(scanner, NativeFs).run();
//!
//!     for (device, outcome, access) in prepared.report().entries() {
//!         println!(
//!             "{} [{}] {outcome} rw={}",
//!             device.path.display(),
//!             device.category,
//!             access.is_accessible()
//!         );
//!     }
//!
//!     let mut consumer = ExecHandoff::new(vec!["python3".into(), "serial_reader.py".into()]);
//!     prepared.hand_off(&mut consumer)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod device;
pub mod error;
pub mod export;
pub mod fs;
pub mod host;
pub mod pipeline;
pub mod provision;
pub mod scan;
pub mod validate;

// Re-exports for convenience
pub use {
    device::{DeviceCandidate, DeviceCategory, DeviceIdentity, DeviceSet},
    error::{Error, Result},
    export::{ALL_SERIAL_PORTS_VAR, DEFAULT_SERIAL_PORT_VAR, ExportedConfig},
    fs::{DeviceFs, NativeFs, NodeMetadata},
    host::{UsbDetails, usb_details},
    pipeline::{ExecHandoff, HandedOff, Handoff, Pipeline, PipelineReport, PipelineState, Prepared},
    provision::{DEFAULT_NODE_MODE, DeviceNodeProvisioner, ProvisionOutcome, Provisioned},
    scan::{BUILTIN_PATTERNS, DEFAULT_DEV_DIR, DeviceScanner, PatternMatcher},
    validate::{PermissionReport, PermissionValidator},
};
