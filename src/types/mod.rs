//! Core value types using newtype patterns for type safety.
//!
//! These types make invalid ports and malformed ranges unrepresentable once
//! parsed.

mod port;
mod range;
mod scan_id;

pub use port::{Port, PortError, PortList};
pub use range::{RangeError, RangeSpec};
pub use scan_id::{ScanId, ScanIdError};
