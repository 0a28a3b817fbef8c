//! Wire codec for RDP primary drawing orders (MS-RDPEGDI section 2.2.2.2.1.1).
//!
//! Primary orders are differentially encoded: each order only carries the
//! fields that changed since the last order of the same type, and coordinates
//! may be sent as signed 8-bit deltas against the previous values. Both peers
//! keep a mirrored [`OrderHistory`] so that the field masks and deltas resolve
//! to the same absolute state on each side.

#[macro_use]
mod macros;

mod bounds;
mod common;
mod geometry;
mod header;
mod orders;

pub use bounds::Bounds;
pub use common::{OrderCommon, OrderHistory};
pub use geometry::{Brush, Pen, Rect};
pub use header::{delta_fits, ControlFlags, OrderHeader, OrderType};
pub use orders::{DestBlt, LineTo, MemBlt, OpaqueRect, Order, PatBlt, PrimaryOrder, ScrBlt};

use core::fmt;

/// Failure to decode a primary order from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    NotEnoughBytes {
        name: &'static str,
        received: usize,
        expected: usize,
    },
    UnknownOrderType {
        code: u8,
    },
    UnsupportedOrderType {
        order: OrderType,
    },
    FieldMaskOverflow {
        order: OrderType,
        fields: u32,
        max: u32,
    },
    NotPrimaryOrder {
        control: u8,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotEnoughBytes {
                name,
                received,
                expected,
            } => write!(
                f,
                "not enough bytes for {name}: received {received} bytes, expected {expected} bytes"
            ),
            Error::UnknownOrderType { code } => write!(f, "unknown primary order type: {code}"),
            Error::UnsupportedOrderType { order } => {
                write!(f, "unsupported primary order type: {order:?}")
            }
            Error::FieldMaskOverflow { order, fields, max } => write!(
                f,
                "field mask {fields:#x} out of range for {order:?} (max {max:#x})"
            ),
            Error::NotPrimaryOrder { control } => {
                write!(f, "control byte {control:#04x} does not introduce a primary order")
            }
        }
    }
}

impl std::error::Error for Error {}
