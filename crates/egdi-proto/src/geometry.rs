/// Inclusive-exclusive rectangle used both as drawing geometry and as the
/// clipping region carried by the order bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i16,
    pub y: i16,
    pub cx: i16,
    pub cy: i16,
}

impl Rect {
    pub const fn new(x: i16, y: i16, cx: i16, cy: i16) -> Self {
        Self { x, y, cx, cy }
    }

    /// Rightmost column covered by the rectangle.
    ///
    /// All coordinate arithmetic wraps mod 2^16, matching the unsigned
    /// 16-bit arithmetic the wire format is defined in.
    pub const fn right(&self) -> i16 {
        self.x.wrapping_add(self.cx).wrapping_sub(1)
    }

    /// Bottom row covered by the rectangle.
    pub const fn bottom(&self) -> i16 {
        self.y.wrapping_add(self.cy).wrapping_sub(1)
    }
}

/// Pen attributes for line orders. The color is a packed 24-bit value,
/// low byte first on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pen {
    pub style: u8,
    pub width: u8,
    pub color: u32,
}

/// Brush attributes for fill orders. The seven extra bytes carry the
/// bitmap pattern of custom brushes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Brush {
    pub org_x: i8,
    pub org_y: i8,
    pub style: u8,
    pub hatch: u8,
    pub extra: [u8; 7],
}
