#![no_main]

use libfuzzer_sys::fuzz_target;

use inplace_cbor::{validate, Codec, DecodeLimits};

fn fuzz_limits(input_len: usize) -> DecodeLimits {
    DecodeLimits {
        max_input_bytes: input_len.min(1 << 20),
        max_depth: 64,
        max_total_items: 1 << 16,
    }
}

fuzz_target!(|data: &[u8]| {
    let validated = validate(data, fuzz_limits(data.len()));
    let codec = Codec::new(data);

    // Navigation must never panic, valid or not.
    let mut walked = 0usize;
    for item in &codec {
        let Ok(item) = item else { break };
        walked += 1;
        let _ = item.kind();
        let _ = item.encoded_len();
        if let Ok(array) = item.as_array() {
            for child in array.iter().take(64) {
                let _ = child.map(|c| c.kind());
            }
        }
        if let Ok(map) = item.as_map() {
            let _ = map.get("k");
        }
    }

    if let Ok(n) = validated {
        assert_eq!(n, walked);
    }
});
