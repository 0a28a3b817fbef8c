use bytes::{Bytes, BytesMut};
use egdi_proto::{
    Error, LineTo, MemBlt, OpaqueRect, Order, OrderHistory, OrderType, Pen, Rect, ScrBlt,
};

fn decode_all(history: &mut OrderHistory, bytes: &[u8]) -> Vec<Order> {
    let mut buf = Bytes::copy_from_slice(bytes);
    let mut orders = Vec::new();
    while !buf.is_empty() {
        orders.push(history.decode_next(&mut buf).unwrap());
    }
    orders
}

#[test]
fn opaque_rect_first_order_uses_change_and_delta() {
    let cmd = OpaqueRect {
        rect: Rect::new(10, 20, 30, 40),
        color: 0x0000FF,
    };

    let mut encoder = OrderHistory::new();
    let mut buf = BytesMut::new();
    encoder.encode_opaque_rect(&mut buf, &cmd, None);

    // STANDARD|CHANGE|DELTA, type 10, one mask byte, four coordinate
    // deltas and the red component.
    assert_eq!(
        buf.as_ref(),
        [0x19, 0x0A, 0x1F, 0x0A, 0x14, 0x1E, 0x28, 0xFF]
    );

    let mut decoder = OrderHistory::new();
    let orders = decode_all(&mut decoder, &buf);
    assert_eq!(orders, vec![Order::OpaqueRect(cmd)]);
}

#[test]
fn clip_and_out_of_range_coordinate_fall_back_to_absolutes() {
    let first = OpaqueRect {
        rect: Rect::new(10, 20, 30, 40),
        color: 0x0000FF,
    };
    let second = OpaqueRect {
        rect: Rect::new(300, 20, 30, 40),
        color: 0x0000FF,
    };
    let clip = Rect::new(5, 5, 100, 100);

    let mut encoder = OrderHistory::new();
    let mut buf = BytesMut::new();
    encoder.encode_opaque_rect(&mut buf, &first, None);
    buf.clear();
    encoder.encode_opaque_rect(&mut buf, &second, Some(clip));

    // STANDARD|BOUNDS, single mask byte for x, four one-byte bound
    // deltas, then x as a 16-bit absolute.
    assert_eq!(
        buf.as_ref(),
        [0x05, 0x01, 0xF0, 0x05, 0x05, 0x69, 0x69, 0x2C, 0x01]
    );

    let mut decoder = OrderHistory::new();
    let mut replay = Bytes::copy_from_slice(&[0x19, 0x0A, 0x1F, 0x0A, 0x14, 0x1E, 0x28, 0xFF]);
    decoder.decode_next(&mut replay).unwrap();
    let orders = decode_all(&mut decoder, &buf);
    assert_eq!(orders, vec![Order::OpaqueRect(second)]);
    assert_eq!(decoder.clip(), clip);
}

#[test]
fn repeated_order_with_same_clip_collapses_to_one_byte() {
    let cmd = OpaqueRect {
        rect: Rect::new(10, 20, 30, 40),
        color: 0x0000FF,
    };
    let clip = Rect::new(5, 5, 100, 100);

    let mut encoder = OrderHistory::new();
    let mut buf = BytesMut::new();
    encoder.encode_opaque_rect(&mut buf, &cmd, Some(clip));
    buf.clear();
    encoder.encode_opaque_rect(&mut buf, &cmd, Some(clip));

    // STANDARD|BOUNDS|DELTA|LASTBOUNDS|SMALL: nothing changed.
    assert_eq!(buf.as_ref(), [0x75]);

    let mut decoder = OrderHistory::new();
    let mut first = BytesMut::new();
    OrderHistory::new().encode_opaque_rect(&mut first, &cmd, Some(clip));
    decode_all(&mut decoder, &first);
    let orders = decode_all(&mut decoder, &buf);
    assert_eq!(orders, vec![Order::OpaqueRect(cmd)]);
    assert_eq!(decoder.clip(), clip);
}

#[test]
fn line_to_two_byte_mask_and_tiny_elision() {
    let cmd = LineTo {
        back_mode: 1,
        startx: 5,
        starty: 6,
        endx: 7,
        endy: 8,
        back_color: 0,
        rop2: 13,
        pen: Pen {
            style: 0,
            width: 0,
            color: 0xFF0000,
        },
    };

    let mut encoder = OrderHistory::new();
    let mut buf = BytesMut::new();
    encoder.encode_line_to(&mut buf, &cmd, None);

    assert_eq!(
        buf.as_ref(),
        [0x19, 0x09, 0x5F, 0x02, 0x01, 0x00, 0x05, 0x06, 0x07, 0x08, 0x0D, 0x00, 0x00, 0xFF]
    );

    buf.clear();
    encoder.encode_line_to(&mut buf, &cmd, None);
    // Both mask bytes elided: STANDARD|DELTA|TINY.
    assert_eq!(buf.as_ref(), [0x91]);

    let mut decoder = OrderHistory::new();
    let mut stream = BytesMut::new();
    let mut replay = OrderHistory::new();
    replay.encode_line_to(&mut stream, &cmd, None);
    replay.encode_line_to(&mut stream, &cmd, None);
    let orders = decode_all(&mut decoder, &stream);
    assert_eq!(orders, vec![Order::LineTo(cmd), Order::LineTo(cmd)]);
}

#[test]
fn mem_blt_high_mask_bit_keeps_two_mask_bytes() {
    let cmd = MemBlt {
        cache_id: 3,
        rect: Rect::new(1, 2, 3, 4),
        rop: 0xCC,
        srcx: 0,
        srcy: 0,
        cache_idx: 5,
    };

    let mut encoder = OrderHistory::new();
    let mut buf = BytesMut::new();
    encoder.encode_mem_blt(&mut buf, &cmd, None);

    // Mask 0x13F spills into the second byte, no SMALL/TINY.
    assert_eq!(buf[0], 0x19);
    assert_eq!(buf[1], 13);
    assert_eq!(&buf[2..4], [0x3F, 0x01]);

    let mut decoder = OrderHistory::new();
    let orders = decode_all(&mut decoder, &buf);
    assert_eq!(orders, vec![Order::MemBlt(cmd)]);
}

#[test]
fn scr_blt_source_deltas_round_trip() {
    let first = ScrBlt {
        rect: Rect::new(100, 100, 50, 50),
        rop: 0xCC,
        srcx: 10,
        srcy: 10,
    };
    let second = ScrBlt {
        rect: Rect::new(110, 105, 50, 50),
        rop: 0xCC,
        srcx: 20,
        srcy: 15,
    };

    let mut encoder = OrderHistory::new();
    let mut stream = BytesMut::new();
    encoder.encode_scr_blt(&mut stream, &first, None);
    encoder.encode_scr_blt(&mut stream, &second, None);

    let mut decoder = OrderHistory::new();
    let orders = decode_all(&mut decoder, &stream);
    assert_eq!(orders, vec![Order::ScrBlt(first), Order::ScrBlt(second)]);
}

#[test]
fn far_apart_coordinates_wrap_instead_of_overflowing() {
    // Coordinate history differences larger than i16::MAX wrap mod 2^16,
    // matching the unsigned 16-bit wire arithmetic.
    let first = OpaqueRect {
        rect: Rect::new(20000, 20000, 30, 40),
        color: 0x0000FF,
    };
    let second = OpaqueRect {
        rect: Rect::new(-20000, -20000, 30, 40),
        color: 0x0000FF,
    };
    let near_clip = Rect::new(30000, 30000, 1000, 1000);
    let far_clip = Rect::new(-30000, -30000, 1000, 1000);

    let mut encoder = OrderHistory::new();
    let mut stream = BytesMut::new();
    encoder.encode_opaque_rect(&mut stream, &first, Some(near_clip));
    encoder.encode_opaque_rect(&mut stream, &second, Some(far_clip));

    let mut decoder = OrderHistory::new();
    let orders = decode_all(&mut decoder, &stream);
    assert_eq!(orders, vec![Order::OpaqueRect(first), Order::OpaqueRect(second)]);
    assert_eq!(decoder.clip(), far_clip);
}

#[test]
fn bound_with_both_edge_forms_takes_the_absolute() {
    // Flag byte 0x11 sets the left edge in both delta and absolute form.
    // Only the absolute is on the wire and it takes precedence.
    let mut decoder = OrderHistory::new();
    let orders = decode_all(
        &mut decoder,
        &[
            0x0D, 0x0A, 0x7F, 0x11, 0x32, 0x00, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00,
            0x00, 0x00, 0x00,
        ],
    );
    assert_eq!(
        orders,
        vec![Order::OpaqueRect(OpaqueRect {
            rect: Rect::new(1, 2, 3, 4),
            color: 0,
        })]
    );
    assert_eq!(decoder.clip(), Rect::new(50, 0, -50, 0));
}

#[test]
fn field_mask_over_type_maximum_is_rejected() {
    let mut decoder = OrderHistory::new();
    let mut buf = Bytes::copy_from_slice(&[0x09, 0x00, 0x3F]);
    assert_eq!(
        decoder.decode_next(&mut buf),
        Err(Error::FieldMaskOverflow {
            order: OrderType::DestBlt,
            fields: 0x3F,
            max: 0x1F,
        })
    );
}

#[test]
fn unknown_order_type_is_rejected() {
    let mut decoder = OrderHistory::new();
    let mut buf = Bytes::copy_from_slice(&[0x09, 0x05]);
    assert_eq!(
        decoder.decode_next(&mut buf),
        Err(Error::UnknownOrderType { code: 5 })
    );
}

#[test]
fn secondary_and_non_standard_control_bytes_are_rejected() {
    let mut decoder = OrderHistory::new();

    let mut buf = Bytes::copy_from_slice(&[0x02]);
    assert_eq!(
        decoder.decode_next(&mut buf),
        Err(Error::NotPrimaryOrder { control: 0x02 })
    );

    let mut buf = Bytes::copy_from_slice(&[0x03]);
    assert_eq!(
        decoder.decode_next(&mut buf),
        Err(Error::NotPrimaryOrder { control: 0x03 })
    );
}

#[test]
fn glyph_index_header_decodes_but_fields_are_unsupported() {
    // Three mask bytes when no elision flag is present.
    let mut decoder = OrderHistory::new();
    let mut buf = Bytes::copy_from_slice(&[0x09, 27, 0x00, 0x00, 0x00]);
    assert_eq!(
        decoder.decode_next(&mut buf),
        Err(Error::UnsupportedOrderType {
            order: OrderType::GlyphIndex,
        })
    );
}

#[test]
fn small_and_tiny_together_elide_a_three_byte_mask() {
    // SMALL drops one mask byte, TINY then floors the remaining two to
    // zero, so no mask byte is read at all.
    let mut decoder = OrderHistory::new();
    let mut buf = Bytes::copy_from_slice(&[0xC9, 27]);
    assert_eq!(
        decoder.decode_next(&mut buf),
        Err(Error::UnsupportedOrderType {
            order: OrderType::GlyphIndex,
        })
    );
    assert!(buf.is_empty());
}

#[test]
fn truncated_header_reports_missing_bytes() {
    let mut decoder = OrderHistory::new();
    let mut buf = Bytes::copy_from_slice(&[0x09]);
    assert_eq!(
        decoder.decode_next(&mut buf),
        Err(Error::NotEnoughBytes {
            name: "order type",
            received: 0,
            expected: 1,
        })
    );
}
