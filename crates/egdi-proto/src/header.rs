use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::geometry::{Brush, Pen, Rect};
use crate::Error;

bitflags! {
    /// Control byte leading every primary order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControlFlags: u8 {
        /// Primary order marker, always set.
        const STANDARD = 0x01;
        /// Secondary order marker, never combined with STANDARD here.
        const SECONDARY = 0x02;
        /// A bounds description follows the field mask.
        const BOUNDS = 0x04;
        /// The order type changed, an order type byte follows the control byte.
        const CHANGE = 0x08;
        /// Coordinate fields are signed 8-bit deltas instead of absolutes.
        const DELTA = 0x10;
        /// BOUNDS is set but the clip is unchanged, no bounds bytes follow.
        const LASTBOUNDS = 0x20;
        /// One trailing zero byte of the field mask is elided.
        const SMALL = 0x40;
        /// Two trailing zero bytes of the field mask are elided.
        const TINY = 0x80;
    }
}

/// Primary drawing order types, by protocol code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OrderType {
    DestBlt = 0,
    PatBlt = 1,
    ScrBlt = 2,
    LineTo = 9,
    OpaqueRect = 10,
    DeskSave = 11,
    MemBlt = 13,
    TriBlt = 14,
    Polyline = 22,
    GlyphIndex = 27,
}

impl OrderType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(OrderType::DestBlt),
            1 => Some(OrderType::PatBlt),
            2 => Some(OrderType::ScrBlt),
            9 => Some(OrderType::LineTo),
            10 => Some(OrderType::OpaqueRect),
            11 => Some(OrderType::DeskSave),
            13 => Some(OrderType::MemBlt),
            14 => Some(OrderType::TriBlt),
            22 => Some(OrderType::Polyline),
            27 => Some(OrderType::GlyphIndex),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Number of field mask bytes carried by an order of this type,
    /// before the SMALL/TINY elision.
    pub fn mask_bytes(self) -> usize {
        match self {
            OrderType::DestBlt
            | OrderType::ScrBlt
            | OrderType::OpaqueRect
            | OrderType::DeskSave
            | OrderType::Polyline => 1,
            OrderType::PatBlt | OrderType::LineTo | OrderType::MemBlt => 2,
            OrderType::TriBlt | OrderType::GlyphIndex => 3,
        }
    }

    /// Highest field mask value an order of this type may carry.
    pub fn max_fields(self) -> u32 {
        match self {
            OrderType::DestBlt => 0x1F,
            OrderType::PatBlt => 0xFFF,
            OrderType::ScrBlt | OrderType::OpaqueRect | OrderType::Polyline => 0x7F,
            OrderType::LineTo => 0x3FF,
            OrderType::DeskSave => 0xFF,
            OrderType::MemBlt => 0x1FF,
            OrderType::TriBlt => 0xFFFF,
            OrderType::GlyphIndex => 0x3F_FFFF,
        }
    }
}

/// Whether a coordinate difference is representable as a wire delta.
pub fn delta_fits(diff: i16) -> bool {
    i8::try_from(diff).is_ok()
}

/// Decoded control byte and field change mask of one primary order.
///
/// The per-field helpers below read or write a single presence-gated field.
/// A field is only on the wire when its bit is set in `fields`, and
/// coordinate fields switch between absolute and delta form based on the
/// DELTA control flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderHeader {
    pub control: ControlFlags,
    pub fields: u32,
}

impl OrderHeader {
    pub fn new(control: ControlFlags, fields: u32) -> Self {
        Self { control, fields }
    }

    fn is_delta(&self) -> bool {
        self.control.contains(ControlFlags::DELTA)
    }

    pub fn encode_coord(&self, buf: &mut BytesMut, base: u32, coord: i16, old: i16) {
        if self.fields & base != 0 {
            if self.is_delta() {
                buf.put_i8(coord.wrapping_sub(old) as i8);
            } else {
                buf.put_i16_le(coord);
            }
        }
    }

    pub fn decode_coord(&self, buf: &mut Bytes, base: u32, coord: &mut i16) -> Result<(), Error> {
        if self.fields & base != 0 {
            if self.is_delta() {
                ensure_size!(buf[1] for "coordinate delta");
                *coord = coord.wrapping_add(i16::from(buf.get_i8()));
            } else {
                ensure_size!(buf[2] for "coordinate");
                *coord = buf.get_i16_le();
            }
        }
        Ok(())
    }

    pub fn encode_rect(&self, buf: &mut BytesMut, base: u32, rect: &Rect, old: &Rect) {
        self.encode_coord(buf, base, rect.x, old.x);
        self.encode_coord(buf, base << 1, rect.y, old.y);
        self.encode_coord(buf, base << 2, rect.cx, old.cx);
        self.encode_coord(buf, base << 3, rect.cy, old.cy);
    }

    pub fn decode_rect(&self, buf: &mut Bytes, base: u32, rect: &mut Rect) -> Result<(), Error> {
        self.decode_coord(buf, base, &mut rect.x)?;
        self.decode_coord(buf, base << 1, &mut rect.y)?;
        self.decode_coord(buf, base << 2, &mut rect.cx)?;
        self.decode_coord(buf, base << 3, &mut rect.cy)?;
        Ok(())
    }

    pub fn encode_src(&self, buf: &mut BytesMut, base: u32, srcx: i16, srcy: i16, old_srcx: i16, old_srcy: i16) {
        self.encode_coord(buf, base, srcx, old_srcx);
        self.encode_coord(buf, base << 1, srcy, old_srcy);
    }

    pub fn decode_src(&self, buf: &mut Bytes, base: u32, srcx: &mut i16, srcy: &mut i16) -> Result<(), Error> {
        self.decode_coord(buf, base, srcx)?;
        self.decode_coord(buf, base << 1, srcy)?;
        Ok(())
    }

    /// Pen attributes are never delta encoded.
    pub fn encode_pen(&self, buf: &mut BytesMut, base: u32, pen: &Pen) {
        if self.fields & base != 0 {
            buf.put_u8(pen.style);
        }
        if self.fields & (base << 1) != 0 {
            buf.put_u8(pen.width);
        }
        if self.fields & (base << 2) != 0 {
            buf.put_u8(pen.color as u8);
            buf.put_u8((pen.color >> 8) as u8);
            buf.put_u8((pen.color >> 16) as u8);
        }
    }

    pub fn decode_pen(&self, buf: &mut Bytes, base: u32, pen: &mut Pen) -> Result<(), Error> {
        if self.fields & base != 0 {
            ensure_size!(buf[1] for "pen style");
            pen.style = buf.get_u8();
        }
        if self.fields & (base << 1) != 0 {
            ensure_size!(buf[1] for "pen width");
            pen.width = buf.get_u8();
        }
        if self.fields & (base << 2) != 0 {
            ensure_size!(buf[3] for "pen color");
            let r = u32::from(buf.get_u8());
            let g = u32::from(buf.get_u8());
            let b = u32::from(buf.get_u8());
            pen.color = r | (g << 8) | (b << 16);
        }
        Ok(())
    }

    /// Brush attributes are never delta encoded.
    pub fn encode_brush(&self, buf: &mut BytesMut, base: u32, brush: &Brush) {
        if self.fields & base != 0 {
            buf.put_i8(brush.org_x);
        }
        if self.fields & (base << 1) != 0 {
            buf.put_i8(brush.org_y);
        }
        if self.fields & (base << 2) != 0 {
            buf.put_u8(brush.style);
        }
        if self.fields & (base << 3) != 0 {
            buf.put_u8(brush.hatch);
        }
        if self.fields & (base << 4) != 0 {
            buf.put_slice(&brush.extra);
        }
    }

    pub fn decode_brush(&self, buf: &mut Bytes, base: u32, brush: &mut Brush) -> Result<(), Error> {
        if self.fields & base != 0 {
            ensure_size!(buf[1] for "brush origin x");
            brush.org_x = buf.get_i8();
        }
        if self.fields & (base << 1) != 0 {
            ensure_size!(buf[1] for "brush origin y");
            brush.org_y = buf.get_i8();
        }
        if self.fields & (base << 2) != 0 {
            ensure_size!(buf[1] for "brush style");
            brush.style = buf.get_u8();
        }
        if self.fields & (base << 3) != 0 {
            ensure_size!(buf[1] for "brush hatch");
            brush.hatch = buf.get_u8();
        }
        if self.fields & (base << 4) != 0 {
            ensure_size!(buf[7] for "brush pattern");
            buf.copy_to_slice(&mut brush.extra);
        }
        Ok(())
    }
}
