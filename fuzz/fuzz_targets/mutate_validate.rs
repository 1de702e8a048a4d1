#![no_main]

use libfuzzer_sys::fuzz_target;

use inplace_cbor::{validate, Codec, DecodeLimits};

fuzz_target!(|data: &[u8]| {
    let Some((&op, doc)) = data.split_first() else {
        return;
    };
    if validate(doc, DecodeLimits::for_bytes(doc.len())).is_err() {
        return;
    }
    let mut codec = Codec::new(doc.to_vec());
    let Ok(first) = codec.front().map(|item| item.cursor()) else {
        return;
    };

    let edited = match op % 4 {
        0 => codec.array_mut(first).and_then(|mut a| a.push(u64::from(op))),
        1 => codec.array_mut(first).and_then(|mut a| a.remove(0)),
        2 => codec.replace(first, "replaced"),
        _ => codec.map_mut(first).and_then(|mut m| m.insert("k", op)),
    };

    // A successful edit keeps the buffer well formed.
    if edited.is_ok() {
        let bytes = codec.storage();
        validate(&bytes[..], DecodeLimits::unlimited()).unwrap();
    }
});
