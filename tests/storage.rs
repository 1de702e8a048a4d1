#![cfg(feature = "alloc")]

use std::collections::VecDeque;

use inplace_cbor::{
    validate, Codec, Cursor, DecodeLimits, ErrorCode, Item, ItemType, Storage, StorageMut,
    Value,
};

fn ring(bytes: &[u8]) -> VecDeque<u8> {
    // Start the contents past the ring's first slot.
    let mut ring = VecDeque::with_capacity(bytes.len() + 4);
    for _ in 0..3 {
        ring.push_back(0);
    }
    ring.extend(bytes.iter().copied());
    for _ in 0..3 {
        ring.pop_front();
    }
    ring
}

#[test]
fn ring_buffer_reads_and_edits() {
    let mut codec = Codec::new(ring(&[0x83, 0x01, 0x02, 0x03]));
    assert_eq!(codec.size().unwrap(), 1);
    assert_eq!(codec.validate(DecodeLimits::unlimited()).unwrap(), 1);
    {
        let mut array = codec.array_mut(codec.begin()).unwrap();
        array.push(Value::map([("k", 4u8)])).unwrap();
        array.remove(0).unwrap();
        array.set(0, -5i8).unwrap();
    }
    let bytes: Vec<u8> = codec.storage().iter().copied().collect();
    assert_eq!(bytes, [0x83, 0x24, 0x03, 0xa1, 0x61, b'k', 0x04]);

    let array = codec.array(codec.begin()).unwrap();
    let ints: Vec<i64> = array
        .iter()
        .take(2)
        .map(|i| i.unwrap().get().unwrap())
        .collect();
    assert_eq!(ints, [-5, 3]);
    let map = array.get(2).unwrap().as_map().unwrap();
    assert_eq!(map.get("k").unwrap().unwrap().get::<u8>().unwrap(), 4);
    assert!(map.get("kk").unwrap().is_none());
}

#[test]
fn ring_buffer_top_level_sequence() {
    let mut codec = Codec::new(VecDeque::<u8>::new());
    codec.push_back("tail").unwrap();
    codec.push_front(1u8).unwrap();
    assert_eq!(codec.size().unwrap(), 2);
    assert_eq!(codec.back().unwrap().kind().unwrap(), ItemType::String);
    codec.pop_front().unwrap();
    assert_eq!(codec.storage().len(), 5);
}

#[test]
fn storage_bounds_are_checked() {
    let mut buf = vec![1u8, 2, 3];
    let mut out = [0u8; 2];
    assert_eq!(
        Storage::read_at(&buf, 2, &mut out).unwrap_err().code,
        ErrorCode::UnexpectedEof
    );
    assert_eq!(
        buf.insert_at(4, &[0]).unwrap_err().code,
        ErrorCode::UnexpectedEof
    );
    assert_eq!(
        StorageMut::erase(&mut buf, 2..4).unwrap_err().code,
        ErrorCode::UnexpectedEof
    );
    buf.write_at(1, &[9, 9]).unwrap();
    assert_eq!(buf, [1, 9, 9]);
    assert_eq!(buf.byte_at(3).unwrap_err().code, ErrorCode::UnexpectedEof);

    let mut ring = ring(&[1, 2, 3]);
    ring.insert_at(1, &[7, 8]).unwrap();
    StorageMut::erase(&mut ring, 0..1).unwrap();
    assert_eq!(ring, [7, 8, 2, 3]);
    let mut out = [0u8; 3];
    Storage::read_at(&ring, 1, &mut out).unwrap();
    assert_eq!(out, [8, 2, 3]);
}

#[test]
fn fixed_arrays_and_slices_are_read_only_storage() {
    let fixed = [0x82u8, 0x01, 0x02];
    assert_eq!(validate(&fixed, DecodeLimits::unlimited()).unwrap(), 1);
    let item = Item::new(&fixed, Cursor::root());
    assert_eq!(item.as_array().unwrap().len(), 2);
    assert_eq!(Codec::new(&fixed[1..]).size().unwrap(), 2);
}

#[cfg(feature = "sha2")]
#[test]
fn digests_cover_items_and_buffers() {
    const EMPTY: [u8; 32] = [
        0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc, 0x1c, 0x14, 0x9a, 0xfb, 0xf4, 0xc8, 0x99, 0x6f, 0xb9,
        0x24, 0x27, 0xae, 0x41, 0xe4, 0x64, 0x9b, 0x93, 0x4c, 0xa4, 0x95, 0x99, 0x1b, 0x78, 0x52,
        0xb8, 0x55,
    ];
    assert_eq!(Codec::new(Vec::new()).sha256().unwrap(), EMPTY);

    let mut codec = Codec::new(Vec::new());
    codec.push(Value::array(["x"; 300])).unwrap();
    let whole = codec.sha256().unwrap();
    assert_eq!(codec.front().unwrap().sha256().unwrap(), whole);

    let deque = Codec::new(ring(codec.storage()));
    assert_eq!(deque.sha256().unwrap(), whole);

    codec.push(0u8).unwrap();
    assert_ne!(codec.sha256().unwrap(), whole);
    assert_eq!(codec.front().unwrap().sha256().unwrap(), whole);
}
