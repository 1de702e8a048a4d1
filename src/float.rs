use crate::head::{IB_FP16, IB_FP32, IB_FP64};

/// Half precision NaN as emitted by the encoder (`0xf9 0x7e 0x00`).
pub const HALF_NAN: [u8; 3] = [IB_FP16, 0x7e, 0x00];
/// Half precision +Infinity (`0xf9 0x7c 0x00`).
pub const HALF_POS_INFINITY: [u8; 3] = [IB_FP16, 0x7c, 0x00];
/// Half precision -Infinity (`0xf9 0xfc 0x00`).
pub const HALF_NEG_INFINITY: [u8; 3] = [IB_FP16, 0xfc, 0x00];

/// The three half precision values this codec emits and accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfSpecial {
    Nan,
    PosInfinity,
    NegInfinity,
}

impl HalfSpecial {
    pub const fn from_payload(payload: u16) -> Option<Self> {
        match payload {
            0x7e00 => Some(Self::Nan),
            0x7c00 => Some(Self::PosInfinity),
            0xfc00 => Some(Self::NegInfinity),
            _ => None,
        }
    }

    pub const fn to_f64(self) -> f64 {
        match self {
            Self::Nan => f64::NAN,
            Self::PosInfinity => f64::INFINITY,
            Self::NegInfinity => f64::NEG_INFINITY,
        }
    }
}

/// Canonical encoding of a float: NaN and infinities as the half precision patterns,
/// values that survive a round trip through `f32` as float32, everything else as float64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatRepr {
    Half([u8; 3]),
    Single([u8; 5]),
    Double([u8; 9]),
}

impl FloatRepr {
    pub fn from_f64(v: f64) -> Self {
        if let Some(half) = special_half(v) {
            return Self::Half(half);
        }
        #[allow(clippy::cast_possible_truncation)]
        let narrowed = v as f32;
        if f64::from(narrowed) == v {
            return Self::single(narrowed);
        }
        let mut buf = [0u8; 9];
        buf[0] = IB_FP64;
        buf[1..].copy_from_slice(&v.to_bits().to_be_bytes());
        Self::Double(buf)
    }

    pub fn from_f32(v: f32) -> Self {
        match special_half(f64::from(v)) {
            Some(half) => Self::Half(half),
            None => Self::single(v),
        }
    }

    fn single(v: f32) -> Self {
        let mut buf = [0u8; 5];
        buf[0] = IB_FP32;
        buf[1..].copy_from_slice(&v.to_bits().to_be_bytes());
        Self::Single(buf)
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Half(b) => b,
            Self::Single(b) => b,
            Self::Double(b) => b,
        }
    }
}

fn special_half(v: f64) -> Option<[u8; 3]> {
    if v.is_nan() {
        Some(HALF_NAN)
    } else if v.is_infinite() {
        Some(if v > 0.0 {
            HALF_POS_INFINITY
        } else {
            HALF_NEG_INFINITY
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specials_use_half_patterns() {
        assert_eq!(FloatRepr::from_f64(f64::NAN).as_bytes(), &HALF_NAN);
        assert_eq!(FloatRepr::from_f32(f32::NAN).as_bytes(), &HALF_NAN);
        assert_eq!(
            FloatRepr::from_f64(f64::INFINITY).as_bytes(),
            &HALF_POS_INFINITY
        );
        assert_eq!(
            FloatRepr::from_f32(f32::NEG_INFINITY).as_bytes(),
            &HALF_NEG_INFINITY
        );
    }

    #[test]
    fn exact_doubles_shrink_to_single() {
        assert_eq!(
            FloatRepr::from_f64(1.5).as_bytes(),
            &[0xfa, 0x3f, 0xc0, 0x00, 0x00]
        );
        assert_eq!(
            FloatRepr::from_f64(0.1).as_bytes(),
            &[0xfb, 0x3f, 0xb9, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9a]
        );
    }

    #[test]
    fn half_payload_lookup() {
        assert_eq!(HalfSpecial::from_payload(0x7e00), Some(HalfSpecial::Nan));
        assert_eq!(HalfSpecial::from_payload(0x3c00), None);
        assert_eq!(HalfSpecial::from_payload(0x7e01), None);
    }
}
