use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::geometry::{Brush, Pen, Rect};
use crate::header::{delta_fits, OrderHeader, OrderType};
use crate::Error;

/// One fully resolved primary order, as produced by
/// [`OrderHistory::decode_next`](crate::OrderHistory::decode_next).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    DestBlt(DestBlt),
    PatBlt(PatBlt),
    ScrBlt(ScrBlt),
    OpaqueRect(OpaqueRect),
    LineTo(LineTo),
    MemBlt(MemBlt),
}

/// Field-level codec of one primary order type.
///
/// Implementations describe which fields changed against the previous
/// order of the same type and read or write only those fields, in the
/// fixed per-type field order.
pub trait PrimaryOrder: Copy {
    const ORDER: OrderType;
    const NAME: &'static str;

    /// Field mask with a bit set for every field differing from `old`.
    fn changed_fields(&self, old: &Self) -> u32;

    /// Whether every coordinate field is within a signed byte of `old`.
    fn delta_eligible(&self, old: &Self) -> bool;

    fn encode_fields(&self, buf: &mut BytesMut, header: &OrderHeader, old: &Self);

    fn decode_fields(&mut self, buf: &mut Bytes, header: &OrderHeader) -> Result<(), Error>;
}

fn encode_color(buf: &mut BytesMut, header: &OrderHeader, base: u32, color: u32) {
    if header.fields & base != 0 {
        buf.put_u8(color as u8);
        buf.put_u8((color >> 8) as u8);
        buf.put_u8((color >> 16) as u8);
    }
}

fn decode_color(buf: &mut Bytes, header: &OrderHeader, base: u32, color: &mut u32) -> Result<(), Error> {
    if header.fields & base != 0 {
        ensure_size!(buf[3] for "color");
        let r = u32::from(buf.get_u8());
        let g = u32::from(buf.get_u8());
        let b = u32::from(buf.get_u8());
        *color = r | (g << 8) | (b << 16);
    }
    Ok(())
}

fn rect_fields(base: u32, rect: &Rect, old: &Rect) -> u32 {
    (u32::from(rect.x != old.x) * base)
        | (u32::from(rect.y != old.y) * (base << 1))
        | (u32::from(rect.cx != old.cx) * (base << 2))
        | (u32::from(rect.cy != old.cy) * (base << 3))
}

fn rect_delta_fits(rect: &Rect, old: &Rect) -> bool {
    delta_fits(rect.x.wrapping_sub(old.x))
        && delta_fits(rect.y.wrapping_sub(old.y))
        && delta_fits(rect.cx.wrapping_sub(old.cx))
        && delta_fits(rect.cy.wrapping_sub(old.cy))
}

fn pen_fields(base: u32, pen: &Pen, old: &Pen) -> u32 {
    (u32::from(pen.style != old.style) * base)
        | (u32::from(pen.width != old.width) * (base << 1))
        | (u32::from(pen.color != old.color) * (base << 2))
}

fn brush_fields(base: u32, brush: &Brush, old: &Brush) -> u32 {
    (u32::from(brush.org_x != old.org_x) * base)
        | (u32::from(brush.org_y != old.org_y) * (base << 1))
        | (u32::from(brush.style != old.style) * (base << 2))
        | (u32::from(brush.hatch != old.hatch) * (base << 3))
        | (u32::from(brush.extra != old.extra) * (base << 4))
}

/// Fills the destination rectangle with a raster operation on the
/// existing framebuffer content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DestBlt {
    pub rect: Rect,
    pub rop: u8,
}

impl PrimaryOrder for DestBlt {
    const ORDER: OrderType = OrderType::DestBlt;
    const NAME: &'static str = "DESTBLT";

    fn changed_fields(&self, old: &Self) -> u32 {
        rect_fields(0x01, &self.rect, &old.rect) | (u32::from(self.rop != old.rop) * 0x10)
    }

    fn delta_eligible(&self, old: &Self) -> bool {
        rect_delta_fits(&self.rect, &old.rect)
    }

    fn encode_fields(&self, buf: &mut BytesMut, header: &OrderHeader, old: &Self) {
        header.encode_rect(buf, 0x01, &self.rect, &old.rect);
        if header.fields & 0x10 != 0 {
            buf.put_u8(self.rop);
        }
    }

    fn decode_fields(&mut self, buf: &mut Bytes, header: &OrderHeader) -> Result<(), Error> {
        header.decode_rect(buf, 0x01, &mut self.rect)?;
        if header.fields & 0x10 != 0 {
            ensure_size!(buf[1] for Self::NAME);
            self.rop = buf.get_u8();
        }
        Ok(())
    }
}

/// Fills the destination rectangle with a brush pattern combined with
/// the foreground and background colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatBlt {
    pub rect: Rect,
    pub rop: u8,
    pub back_color: u32,
    pub fore_color: u32,
    pub brush: Brush,
}

impl PrimaryOrder for PatBlt {
    const ORDER: OrderType = OrderType::PatBlt;
    const NAME: &'static str = "PATBLT";

    fn changed_fields(&self, old: &Self) -> u32 {
        rect_fields(0x01, &self.rect, &old.rect)
            | (u32::from(self.rop != old.rop) * 0x10)
            | (u32::from(self.back_color != old.back_color) * 0x20)
            | (u32::from(self.fore_color != old.fore_color) * 0x40)
            | brush_fields(0x80, &self.brush, &old.brush)
    }

    fn delta_eligible(&self, old: &Self) -> bool {
        rect_delta_fits(&self.rect, &old.rect)
    }

    fn encode_fields(&self, buf: &mut BytesMut, header: &OrderHeader, old: &Self) {
        header.encode_rect(buf, 0x01, &self.rect, &old.rect);
        if header.fields & 0x10 != 0 {
            buf.put_u8(self.rop);
        }
        encode_color(buf, header, 0x20, self.back_color);
        encode_color(buf, header, 0x40, self.fore_color);
        header.encode_brush(buf, 0x80, &self.brush);
    }

    fn decode_fields(&mut self, buf: &mut Bytes, header: &OrderHeader) -> Result<(), Error> {
        header.decode_rect(buf, 0x01, &mut self.rect)?;
        if header.fields & 0x10 != 0 {
            ensure_size!(buf[1] for Self::NAME);
            self.rop = buf.get_u8();
        }
        decode_color(buf, header, 0x20, &mut self.back_color)?;
        decode_color(buf, header, 0x40, &mut self.fore_color)?;
        header.decode_brush(buf, 0x80, &mut self.brush)?;
        Ok(())
    }
}

/// Copies a screen region to the destination rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrBlt {
    pub rect: Rect,
    pub rop: u8,
    pub srcx: i16,
    pub srcy: i16,
}

impl PrimaryOrder for ScrBlt {
    const ORDER: OrderType = OrderType::ScrBlt;
    const NAME: &'static str = "SCREENBLT";

    fn changed_fields(&self, old: &Self) -> u32 {
        rect_fields(0x01, &self.rect, &old.rect)
            | (u32::from(self.rop != old.rop) * 0x10)
            | (u32::from(self.srcx != old.srcx) * 0x20)
            | (u32::from(self.srcy != old.srcy) * 0x40)
    }

    fn delta_eligible(&self, old: &Self) -> bool {
        rect_delta_fits(&self.rect, &old.rect)
            && delta_fits(self.srcx.wrapping_sub(old.srcx))
            && delta_fits(self.srcy.wrapping_sub(old.srcy))
    }

    fn encode_fields(&self, buf: &mut BytesMut, header: &OrderHeader, old: &Self) {
        header.encode_rect(buf, 0x01, &self.rect, &old.rect);
        if header.fields & 0x10 != 0 {
            buf.put_u8(self.rop);
        }
        header.encode_src(buf, 0x20, self.srcx, self.srcy, old.srcx, old.srcy);
    }

    fn decode_fields(&mut self, buf: &mut Bytes, header: &OrderHeader) -> Result<(), Error> {
        header.decode_rect(buf, 0x01, &mut self.rect)?;
        if header.fields & 0x10 != 0 {
            ensure_size!(buf[1] for Self::NAME);
            self.rop = buf.get_u8();
        }
        header.decode_src(buf, 0x20, &mut self.srcx, &mut self.srcy)?;
        Ok(())
    }
}

/// Fills the destination rectangle with a solid color. The three color
/// components travel as independent fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpaqueRect {
    pub rect: Rect,
    pub color: u32,
}

impl PrimaryOrder for OpaqueRect {
    const ORDER: OrderType = OrderType::OpaqueRect;
    const NAME: &'static str = "RECT";

    fn changed_fields(&self, old: &Self) -> u32 {
        rect_fields(0x01, &self.rect, &old.rect)
            | (u32::from(self.color as u8 != old.color as u8) * 0x10)
            | (u32::from((self.color >> 8) as u8 != (old.color >> 8) as u8) * 0x20)
            | (u32::from((self.color >> 16) as u8 != (old.color >> 16) as u8) * 0x40)
    }

    fn delta_eligible(&self, old: &Self) -> bool {
        rect_delta_fits(&self.rect, &old.rect)
    }

    fn encode_fields(&self, buf: &mut BytesMut, header: &OrderHeader, old: &Self) {
        header.encode_rect(buf, 0x01, &self.rect, &old.rect);
        if header.fields & 0x10 != 0 {
            buf.put_u8(self.color as u8);
        }
        if header.fields & 0x20 != 0 {
            buf.put_u8((self.color >> 8) as u8);
        }
        if header.fields & 0x40 != 0 {
            buf.put_u8((self.color >> 16) as u8);
        }
    }

    fn decode_fields(&mut self, buf: &mut Bytes, header: &OrderHeader) -> Result<(), Error> {
        header.decode_rect(buf, 0x01, &mut self.rect)?;
        if header.fields & 0x10 != 0 {
            ensure_size!(buf[1] for Self::NAME);
            self.color = (self.color & 0x00FF_FF00) | u32::from(buf.get_u8());
        }
        if header.fields & 0x20 != 0 {
            ensure_size!(buf[1] for Self::NAME);
            self.color = (self.color & 0x00FF_00FF) | (u32::from(buf.get_u8()) << 8);
        }
        if header.fields & 0x40 != 0 {
            ensure_size!(buf[1] for Self::NAME);
            self.color = (self.color & 0x0000_FFFF) | (u32::from(buf.get_u8()) << 16);
        }
        Ok(())
    }
}

/// Draws a line between two endpoints with the given pen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineTo {
    pub back_mode: u16,
    pub startx: i16,
    pub starty: i16,
    pub endx: i16,
    pub endy: i16,
    pub back_color: u32,
    pub rop2: u8,
    pub pen: Pen,
}

impl PrimaryOrder for LineTo {
    const ORDER: OrderType = OrderType::LineTo;
    const NAME: &'static str = "LINE";

    fn changed_fields(&self, old: &Self) -> u32 {
        u32::from(self.back_mode != old.back_mode)
            | (u32::from(self.startx != old.startx) * 0x02)
            | (u32::from(self.starty != old.starty) * 0x04)
            | (u32::from(self.endx != old.endx) * 0x08)
            | (u32::from(self.endy != old.endy) * 0x10)
            | (u32::from(self.back_color != old.back_color) * 0x20)
            | (u32::from(self.rop2 != old.rop2) * 0x40)
            | pen_fields(0x80, &self.pen, &old.pen)
    }

    fn delta_eligible(&self, old: &Self) -> bool {
        delta_fits(self.startx.wrapping_sub(old.startx))
            && delta_fits(self.starty.wrapping_sub(old.starty))
            && delta_fits(self.endx.wrapping_sub(old.endx))
            && delta_fits(self.endy.wrapping_sub(old.endy))
    }

    fn encode_fields(&self, buf: &mut BytesMut, header: &OrderHeader, old: &Self) {
        if header.fields & 0x01 != 0 {
            buf.put_u16_le(self.back_mode);
        }
        header.encode_coord(buf, 0x02, self.startx, old.startx);
        header.encode_coord(buf, 0x04, self.starty, old.starty);
        header.encode_coord(buf, 0x08, self.endx, old.endx);
        header.encode_coord(buf, 0x10, self.endy, old.endy);
        encode_color(buf, header, 0x20, self.back_color);
        if header.fields & 0x40 != 0 {
            buf.put_u8(self.rop2);
        }
        header.encode_pen(buf, 0x80, &self.pen);
    }

    fn decode_fields(&mut self, buf: &mut Bytes, header: &OrderHeader) -> Result<(), Error> {
        if header.fields & 0x01 != 0 {
            ensure_size!(buf[2] for Self::NAME);
            self.back_mode = buf.get_u16_le();
        }
        header.decode_coord(buf, 0x02, &mut self.startx)?;
        header.decode_coord(buf, 0x04, &mut self.starty)?;
        header.decode_coord(buf, 0x08, &mut self.endx)?;
        header.decode_coord(buf, 0x10, &mut self.endy)?;
        decode_color(buf, header, 0x20, &mut self.back_color)?;
        if header.fields & 0x40 != 0 {
            ensure_size!(buf[1] for Self::NAME);
            self.rop2 = buf.get_u8();
        }
        header.decode_pen(buf, 0x80, &mut self.pen)?;
        Ok(())
    }
}

/// Copies a cached bitmap tile to the destination rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemBlt {
    pub cache_id: u16,
    pub rect: Rect,
    pub rop: u8,
    pub srcx: i16,
    pub srcy: i16,
    pub cache_idx: u16,
}

impl PrimaryOrder for MemBlt {
    const ORDER: OrderType = OrderType::MemBlt;
    const NAME: &'static str = "MEMBLT";

    fn changed_fields(&self, old: &Self) -> u32 {
        u32::from(self.cache_id != old.cache_id)
            | rect_fields(0x02, &self.rect, &old.rect)
            | (u32::from(self.rop != old.rop) * 0x20)
            | (u32::from(self.srcx != old.srcx) * 0x40)
            | (u32::from(self.srcy != old.srcy) * 0x80)
            | (u32::from(self.cache_idx != old.cache_idx) * 0x100)
    }

    fn delta_eligible(&self, old: &Self) -> bool {
        rect_delta_fits(&self.rect, &old.rect)
            && delta_fits(self.srcx.wrapping_sub(old.srcx))
            && delta_fits(self.srcy.wrapping_sub(old.srcy))
    }

    fn encode_fields(&self, buf: &mut BytesMut, header: &OrderHeader, old: &Self) {
        if header.fields & 0x01 != 0 {
            buf.put_u16_le(self.cache_id);
        }
        header.encode_rect(buf, 0x02, &self.rect, &old.rect);
        if header.fields & 0x20 != 0 {
            buf.put_u8(self.rop);
        }
        header.encode_src(buf, 0x40, self.srcx, self.srcy, old.srcx, old.srcy);
        if header.fields & 0x100 != 0 {
            buf.put_u16_le(self.cache_idx);
        }
    }

    fn decode_fields(&mut self, buf: &mut Bytes, header: &OrderHeader) -> Result<(), Error> {
        if header.fields & 0x01 != 0 {
            ensure_size!(buf[2] for Self::NAME);
            self.cache_id = buf.get_u16_le();
        }
        header.decode_rect(buf, 0x02, &mut self.rect)?;
        if header.fields & 0x20 != 0 {
            ensure_size!(buf[1] for Self::NAME);
            self.rop = buf.get_u8();
        }
        header.decode_src(buf, 0x40, &mut self.srcx, &mut self.srcy)?;
        if header.fields & 0x100 != 0 {
            ensure_size!(buf[2] for Self::NAME);
            self.cache_idx = buf.get_u16_le();
        }
        Ok(())
    }
}
