use inplace_cbor::{validate, CborError, DecodeLimits, ErrorCode, DEFAULT_MAX_DEPTH};

fn check(bytes: &[u8]) -> Result<usize, CborError> {
    validate(bytes, DecodeLimits::for_bytes(bytes.len()))
}

fn assert_err(bytes: &[u8], code: ErrorCode, offset: usize) {
    let err = check(bytes).unwrap_err();
    assert_eq!((err.code, err.offset), (code, offset), "{bytes:02x?}");
}

#[test]
fn accepts_every_supported_kind() {
    let bytes: &[u8] = &[
        0x00, 0x17, 0x18, 0x18, 0x39, 0x01, 0x00, // ints
        0x42, 0x01, 0x02, 0x63, b'a', b'b', b'c', // bytes, text
        0x82, 0xf4, 0xf5, 0xa1, 0x61, b'k', 0xf6, 0xf7, // containers, simple
        0xc2, 0x41, 0x01, // tag
        0xf9, 0x7e, 0x00, 0xf9, 0x7c, 0x00, 0xf9, 0xfc, 0x00, // half specials
        0xfa, 0x3f, 0xc0, 0x00, 0x00, // float32
        0xfb, 0x3f, 0xb9, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9a, // float64
    ];
    assert_eq!(check(bytes).unwrap(), 15);
    assert_eq!(check(&[]).unwrap(), 0);
}

#[test]
fn rejects_reserved_additional_info() {
    assert_err(&[0x1c], ErrorCode::MalformedHead, 0);
    assert_err(&[0x81, 0x5d], ErrorCode::MalformedHead, 1);
    assert_err(&[0xfe], ErrorCode::MalformedHead, 0);
}

#[test]
fn rejects_indefinite_lengths() {
    assert_err(&[0x5f, 0x41, 0x00, 0xff], ErrorCode::UnsupportedFeature, 0);
    assert_err(&[0x7f, 0xff], ErrorCode::UnsupportedFeature, 0);
    assert_err(&[0x9f, 0xff], ErrorCode::UnsupportedFeature, 0);
    assert_err(&[0xbf, 0xff], ErrorCode::UnsupportedFeature, 0);
    assert_err(&[0x01, 0xff], ErrorCode::UnsupportedFeature, 1);
}

#[test]
fn rejects_unknown_simple_and_half_values() {
    assert_err(&[0xf0], ErrorCode::UnsupportedFeature, 0);
    assert_err(&[0xf8, 0xff], ErrorCode::UnsupportedFeature, 0);
    assert_err(&[0xf9, 0x3c, 0x00], ErrorCode::UnsupportedFeature, 0);
    assert_err(&[0xf9, 0x7e, 0x01], ErrorCode::UnsupportedFeature, 0);
}

#[test]
fn rejects_truncation() {
    assert_err(&[0x19, 0x01], ErrorCode::UnexpectedEof, 0);
    assert_err(&[0x43, 0x01, 0x02], ErrorCode::UnexpectedEof, 0);
    assert_err(&[0x82, 0x01], ErrorCode::UnexpectedEof, 0);
    assert_err(&[0xa1, 0x01], ErrorCode::UnexpectedEof, 0);
    assert_err(&[0xc1], ErrorCode::UnexpectedEof, 0);
    assert_err(
        &[0x9b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
        ErrorCode::UnexpectedEof,
        0,
    );
}

#[test]
fn limits_apply() {
    let mut nested = vec![0x81u8; DEFAULT_MAX_DEPTH + 1];
    nested.push(0x00);
    let err = check(&nested).unwrap_err();
    assert_eq!(err.code, ErrorCode::DepthLimitExceeded);
    assert_eq!(check(&nested[1..]).unwrap(), 1);

    let limits = DecodeLimits {
        max_total_items: 3,
        ..DecodeLimits::for_bytes(16)
    };
    let bytes = [0x82u8, 0x01, 0x82, 0x02, 0x03];
    let err = validate(&bytes[..], limits).unwrap_err();
    assert_eq!((err.code, err.offset), (ErrorCode::TotalItemsLimitExceeded, 2));

    let err = validate(&bytes[..], DecodeLimits::for_bytes(4)).unwrap_err();
    assert_eq!(err.code, ErrorCode::InputLenLimitExceeded);
}
