use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::bounds::Bounds;
use crate::geometry::Rect;
use crate::header::{ControlFlags, OrderHeader, OrderType};
use crate::orders::{DestBlt, LineTo, MemBlt, OpaqueRect, Order, PatBlt, PrimaryOrder, ScrBlt};
use crate::Error;

/// Order type and clipping rectangle shared by consecutive orders.
///
/// Encoding mutates this state the same way decoding does on the peer, so
/// one value of this type doubles as the differential history for the
/// order header itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderCommon {
    pub order: OrderType,
    pub clip: Rect,
}

impl Default for OrderCommon {
    fn default() -> Self {
        Self {
            order: OrderType::DestBlt,
            clip: Rect::default(),
        }
    }
}

impl OrderCommon {
    pub fn new(order: OrderType, clip: Rect) -> Self {
        Self { order, clip }
    }

    /// Writes the control byte, optional order type, field mask and optional
    /// bounds. `self` holds the new order type and clip, `history` the state
    /// left by the previous order. `header.control` carries the BOUNDS and
    /// DELTA decisions on entry and is completed in place.
    pub fn encode(&mut self, buf: &mut BytesMut, header: &mut OrderHeader, history: &OrderCommon) {
        let mut control = header.control | ControlFlags::STANDARD;

        if self.order != history.order {
            control |= ControlFlags::CHANGE;
        }

        let mut bounds = None;
        if control.contains(ControlFlags::BOUNDS) {
            let encoded = Bounds::new(&history.clip, &self.clip);
            if encoded.is_empty() {
                control |= ControlFlags::LASTBOUNDS;
            } else {
                bounds = Some(encoded);
            }
        } else {
            // Unclipped orders leave the clip untouched on the peer.
            self.clip = history.clip;
        }

        let size = self.order.mask_bytes() as i32;
        let realsize: i32 = if header.fields == 0 {
            0
        } else if header.fields < 0x100 {
            1
        } else if header.fields < 0x1_0000 {
            2
        } else {
            3
        };
        match size - realsize {
            1 => control |= ControlFlags::SMALL,
            2 => control |= ControlFlags::TINY,
            3 => control |= ControlFlags::TINY | ControlFlags::SMALL,
            _ => {}
        }

        header.control = control;

        buf.put_u8(control.bits());
        if control.contains(ControlFlags::CHANGE) {
            buf.put_u8(self.order.code());
        }
        if realsize >= 1 {
            buf.put_u8(header.fields as u8);
        }
        if realsize >= 2 {
            buf.put_u8((header.fields >> 8) as u8);
        }
        if realsize >= 3 {
            buf.put_u8((header.fields >> 16) as u8);
        }
        if let Some(bounds) = bounds {
            bounds.encode(buf);
        }
    }

    /// Reads everything between the control byte and the field data,
    /// updating the order type and clip in place. The control byte itself
    /// has already been consumed by the caller.
    pub fn decode(&mut self, buf: &mut Bytes, control: ControlFlags) -> Result<OrderHeader, Error> {
        if control.contains(ControlFlags::CHANGE) {
            ensure_size!(buf[1] for "order type");
            let code = buf.get_u8();
            self.order = OrderType::from_code(code).ok_or(Error::UnknownOrderType { code })?;
        }

        let mut size = self.order.mask_bytes();
        if control.contains(ControlFlags::SMALL) {
            size = if size <= 1 { 0 } else { size - 1 };
        }
        if control.contains(ControlFlags::TINY) {
            size = if size <= 2 { 0 } else { size - 2 };
        }

        ensure_size!(buf[size] for "field mask");
        let mut fields = 0u32;
        for i in 0..size {
            fields |= u32::from(buf.get_u8()) << (8 * i);
        }
        if fields > self.order.max_fields() {
            return Err(Error::FieldMaskOverflow {
                order: self.order,
                fields,
                max: self.order.max_fields(),
            });
        }

        if control.contains(ControlFlags::BOUNDS) && !control.contains(ControlFlags::LASTBOUNDS) {
            Bounds::decode_into(buf, &mut self.clip)?;
        }

        Ok(OrderHeader::new(control, fields))
    }
}

/// Mirrored differential state of one order stream.
///
/// Both sides of the connection keep one of these and feed every order
/// through it, in stream order. Encoding against stale history produces
/// orders the peer cannot resolve.
#[derive(Debug, Clone, Default)]
pub struct OrderHistory {
    pub common: OrderCommon,
    pub dest_blt: DestBlt,
    pub pat_blt: PatBlt,
    pub scr_blt: ScrBlt,
    pub opaque_rect: OpaqueRect,
    pub line_to: LineTo,
    pub mem_blt: MemBlt,
}

impl OrderHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode_dest_blt(&mut self, buf: &mut BytesMut, cmd: &DestBlt, clip: Option<Rect>) {
        encode_order(buf, cmd, clip, &mut self.common, &mut self.dest_blt);
    }

    pub fn encode_pat_blt(&mut self, buf: &mut BytesMut, cmd: &PatBlt, clip: Option<Rect>) {
        encode_order(buf, cmd, clip, &mut self.common, &mut self.pat_blt);
    }

    pub fn encode_scr_blt(&mut self, buf: &mut BytesMut, cmd: &ScrBlt, clip: Option<Rect>) {
        encode_order(buf, cmd, clip, &mut self.common, &mut self.scr_blt);
    }

    pub fn encode_opaque_rect(&mut self, buf: &mut BytesMut, cmd: &OpaqueRect, clip: Option<Rect>) {
        encode_order(buf, cmd, clip, &mut self.common, &mut self.opaque_rect);
    }

    pub fn encode_line_to(&mut self, buf: &mut BytesMut, cmd: &LineTo, clip: Option<Rect>) {
        encode_order(buf, cmd, clip, &mut self.common, &mut self.line_to);
    }

    pub fn encode_mem_blt(&mut self, buf: &mut BytesMut, cmd: &MemBlt, clip: Option<Rect>) {
        encode_order(buf, cmd, clip, &mut self.common, &mut self.mem_blt);
    }

    /// Decodes the next primary order, resolving deltas and omitted fields
    /// against the stored history.
    pub fn decode_next(&mut self, buf: &mut Bytes) -> Result<Order, Error> {
        ensure_size!(buf[1] for "control byte");
        let raw = buf.get_u8();
        let control = ControlFlags::from_bits_retain(raw);
        if !control.contains(ControlFlags::STANDARD) || control.contains(ControlFlags::SECONDARY) {
            return Err(Error::NotPrimaryOrder { control: raw });
        }

        let header = self.common.decode(buf, control)?;

        match self.common.order {
            OrderType::DestBlt => {
                self.dest_blt.decode_fields(buf, &header)?;
                Ok(Order::DestBlt(self.dest_blt))
            }
            OrderType::PatBlt => {
                self.pat_blt.decode_fields(buf, &header)?;
                Ok(Order::PatBlt(self.pat_blt))
            }
            OrderType::ScrBlt => {
                self.scr_blt.decode_fields(buf, &header)?;
                Ok(Order::ScrBlt(self.scr_blt))
            }
            OrderType::OpaqueRect => {
                self.opaque_rect.decode_fields(buf, &header)?;
                Ok(Order::OpaqueRect(self.opaque_rect))
            }
            OrderType::LineTo => {
                self.line_to.decode_fields(buf, &header)?;
                Ok(Order::LineTo(self.line_to))
            }
            OrderType::MemBlt => {
                self.mem_blt.decode_fields(buf, &header)?;
                Ok(Order::MemBlt(self.mem_blt))
            }
            order => Err(Error::UnsupportedOrderType { order }),
        }
    }

    /// Clipping rectangle left behind by the last order.
    pub fn clip(&self) -> Rect {
        self.common.clip
    }
}

fn encode_order<T: PrimaryOrder>(
    buf: &mut BytesMut,
    cmd: &T,
    clip: Option<Rect>,
    common: &mut OrderCommon,
    last: &mut T,
) {
    let mut control = ControlFlags::empty();
    if clip.is_some() {
        control |= ControlFlags::BOUNDS;
    }
    if cmd.delta_eligible(last) {
        control |= ControlFlags::DELTA;
    }

    let mut header = OrderHeader::new(control, cmd.changed_fields(last));
    let mut newcommon = OrderCommon::new(T::ORDER, clip.unwrap_or(common.clip));
    newcommon.encode(buf, &mut header, common);
    cmd.encode_fields(buf, &header, last);

    *common = newcommon;
    *last = *cmd;
}
