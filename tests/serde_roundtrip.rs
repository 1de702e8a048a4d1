#![cfg(feature = "serde")]

use serde::{Deserialize, Serialize};

use inplace_cbor::{to_vec, Codec, DecodeLimits, ErrorCode, Value, DEFAULT_MAX_DEPTH};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Reading<'a> {
    sensor: &'a str,
    #[serde(with = "raw_bytes")]
    raw: Vec<u8>,
    values: Vec<f64>,
    unit: Option<Unit>,
    calibration: Calibration,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
enum Unit {
    Celsius,
    Ratio { num: u32, den: u32 },
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Calibration(i64, bool);

mod raw_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(v)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        <&[u8]>::deserialize(d).map(<[u8]>::to_vec)
    }
}

fn reading(sensor: &str) -> Reading<'_> {
    Reading {
        sensor,
        raw: vec![0xde, 0xad],
        values: vec![1.5, -0.25, f64::INFINITY],
        unit: Some(Unit::Ratio { num: 3, den: 4 }),
        calibration: Calibration(-7, true),
    }
}

#[test]
fn structs_round_trip_through_a_codec() {
    let mut codec = Codec::new(Vec::new());
    codec.push(0u8).unwrap();
    codec.push_serialize(&reading("north")).unwrap();
    codec
        .push_serialize(&Reading {
            unit: None,
            ..reading("south")
        })
        .unwrap();
    assert_eq!(codec.size().unwrap(), 3);

    let north: Reading<'_> = codec.get(1).unwrap().deserialize().unwrap();
    assert_eq!(north, reading("north"));
    let south: Reading<'_> = codec.get(2).unwrap().deserialize().unwrap();
    assert_eq!(south.unit, None);
    assert_eq!(south.sensor, "south");

    let map = codec.map(codec.cursor(1).unwrap()).unwrap();
    assert_eq!(map.len(), 5);
    assert_eq!(
        map.get("raw").unwrap().unwrap().get_bytes().unwrap(),
        &[0xde, 0xad]
    );
}

#[test]
fn in_place_edits_show_up_when_deserializing() {
    let mut codec = Codec::new(to_vec(&reading("east")).unwrap());
    {
        let mut map = codec.map_mut(codec.begin()).unwrap();
        map.get_mut("sensor").unwrap().unwrap().set("west").unwrap();
        let values = map.get_mut("values").unwrap().unwrap();
        values.into_array().unwrap().push(2.0f64).unwrap();
        map.get_mut("unit").unwrap().unwrap().set("Celsius").unwrap();
    }
    let back: Reading<'_> = codec.front().unwrap().deserialize().unwrap();
    assert_eq!(back.sensor, "west");
    assert_eq!(back.values, [1.5, -0.25, f64::INFINITY, 2.0]);
    assert_eq!(back.unit, Some(Unit::Celsius));
}

#[test]
fn tags_are_transparent() {
    let mut codec = Codec::new(Vec::new());
    codec
        .push(Value::tagged(1u64, Value::array([Value::from(5i8), Value::from(false)])))
        .unwrap();
    let cal: Calibration = codec.front().unwrap().deserialize().unwrap();
    assert_eq!(cal, Calibration(5, false));
}

#[test]
fn mismatches_report_codes() {
    let codec = Codec::new(to_vec(&[1u8, 2]).unwrap());
    let err = codec
        .front()
        .unwrap()
        .deserialize::<Reading<'_>>()
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::SerdeError);

    let codec = Codec::new(to_vec("Kelvin").unwrap());
    let err = codec.front().unwrap().deserialize::<Unit>().unwrap_err();
    assert_eq!(err.code, ErrorCode::SerdeError);

    let codec = Codec::new(vec![0x62u8, 0xc3, 0x28]);
    let err = codec.front().unwrap().deserialize::<&str>().unwrap_err();
    assert_eq!(err.code, ErrorCode::Utf8Invalid);
}

#[derive(Debug, PartialEq, Deserialize)]
struct Nested(Vec<Nested>);

#[test]
fn deep_nesting_stops_at_the_depth_limit() {
    let mut deep = vec![0x81u8; 200_000];
    deep.push(0x80);
    let codec = Codec::new(deep);
    let err = codec.front().unwrap().deserialize::<Nested>().unwrap_err();
    assert_eq!(
        (err.code, err.offset),
        (ErrorCode::DepthLimitExceeded, DEFAULT_MAX_DEPTH)
    );

    let codec = Codec::new(vec![0x81u8, 0x81, 0x80]);
    let limits = |max_depth| DecodeLimits {
        max_depth,
        ..DecodeLimits::unlimited()
    };
    let front = codec.front().unwrap();
    assert_eq!(
        front.deserialize_with_limits::<Nested>(limits(3)).unwrap(),
        Nested(vec![Nested(vec![Nested(vec![])])])
    );
    let err = front.deserialize_with_limits::<Nested>(limits(2)).unwrap_err();
    assert_eq!((err.code, err.offset), (ErrorCode::DepthLimitExceeded, 2));

    let mut codec = Codec::new(Vec::new());
    codec
        .push(Value::tagged(1u64, Value::array([Value::from(5i8), Value::from(false)])))
        .unwrap();
    let err = codec
        .front()
        .unwrap()
        .deserialize_with_limits::<Calibration>(limits(1))
        .unwrap_err();
    assert_eq!((err.code, err.offset), (ErrorCode::DepthLimitExceeded, 1));
}
