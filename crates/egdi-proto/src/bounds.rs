use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::geometry::Rect;
use crate::Error;

const LEFT: usize = 0;
const TOP: usize = 1;
const RIGHT: usize = 2;
const BOTTOM: usize = 3;

/// Differential encoding of a clipping rectangle against the previous one.
///
/// Each of the four edges is encoded independently: unchanged edges cost
/// nothing, edges within a signed byte of the previous value cost one byte,
/// and the rest are sent as 16-bit absolutes. A leading flag byte records
/// which form each edge took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    flags: u8,
    absolute: [i16; 4],
    delta: [i8; 4],
}

impl Bounds {
    pub fn new(old_clip: &Rect, new_clip: &Rect) -> Self {
        let old_edges = edges(old_clip);
        let new_edges = edges(new_clip);

        let mut bounds = Bounds {
            flags: 0,
            absolute: [0; 4],
            delta: [0; 4],
        };

        for edge in LEFT..=BOTTOM {
            let diff = new_edges[edge].wrapping_sub(old_edges[edge]);
            if let (Ok(delta), true) = (i8::try_from(diff), diff != 0) {
                bounds.flags |= 0x10 << edge;
                bounds.delta[edge] = delta;
            } else if diff != 0 {
                bounds.flags |= 1 << edge;
                bounds.absolute[edge] = new_edges[edge];
            }
        }

        bounds
    }

    /// An empty encoding means the clip did not move, the caller signals
    /// this with LASTBOUNDS instead of emitting any bounds bytes.
    pub fn is_empty(&self) -> bool {
        self.flags == 0
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.flags);
        for edge in LEFT..=BOTTOM {
            if self.flags & (0x10 << edge) != 0 {
                buf.put_i8(self.delta[edge]);
            } else if self.flags & (1 << edge) != 0 {
                buf.put_i16_le(self.absolute[edge]);
            }
        }
    }

    /// Reads a bounds description and applies it to `clip` in place.
    pub fn decode_into(buf: &mut Bytes, clip: &mut Rect) -> Result<(), Error> {
        ensure_size!(buf[1] for "bounds flags");
        let flags = buf.get_u8();

        // The absolute bit wins when a peer sets both forms for one edge.
        let mut current = edges(clip);
        for edge in LEFT..=BOTTOM {
            if flags & (1 << edge) != 0 {
                ensure_size!(buf[2] for "bounds edge");
                current[edge] = buf.get_i16_le();
            } else if flags & (0x10 << edge) != 0 {
                ensure_size!(buf[1] for "bounds delta");
                current[edge] = current[edge].wrapping_add(i16::from(buf.get_i8()));
            }
        }

        *clip = Rect {
            x: current[LEFT],
            y: current[TOP],
            cx: current[RIGHT].wrapping_sub(current[LEFT]).wrapping_add(1),
            cy: current[BOTTOM].wrapping_sub(current[TOP]).wrapping_add(1),
        };
        Ok(())
    }
}

fn edges(clip: &Rect) -> [i16; 4] {
    [clip.x, clip.y, clip.right(), clip.bottom()]
}
