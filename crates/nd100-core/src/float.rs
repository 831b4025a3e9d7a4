//! ND float format (spec §4.5): 48 bits split into a 16-bit biased exponent
//! and a 32-bit fraction, sign carried in the fraction's MSB. Packed across
//! three consecutive registers or memory words (exponent word, then the
//! fraction's high and low halves), matching how `LDF`/`STF` move 48 bits
//! through the AD(X) register group.

const BIAS: i32 = 0x8000;
const FRACTION_SIGN: u32 = 1 << 31;
const FRACTION_MAGNITUDE: u32 = !FRACTION_SIGN;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NdFloat {
    pub exponent: u16,
    pub fraction: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloatStatus {
    pub overflow: bool,
    pub underflow: bool,
}

impl NdFloat {
    pub fn zero() -> Self {
        Self {
            exponent: 0,
            fraction: 0,
        }
    }

    pub fn from_words(exponent: u16, fraction_hi: u16, fraction_lo: u16) -> Self {
        Self {
            exponent,
            fraction: ((fraction_hi as u32) << 16) | fraction_lo as u32,
        }
    }

    pub fn to_words(self) -> (u16, u16, u16) {
        (
            self.exponent,
            (self.fraction >> 16) as u16,
            (self.fraction & 0xffff) as u16,
        )
    }

    pub fn to_f64(self) -> f64 {
        if self.fraction & FRACTION_MAGNITUDE == 0 {
            return 0.0;
        }
        let sign = self.fraction & FRACTION_SIGN != 0;
        let magnitude = (self.fraction & FRACTION_MAGNITUDE) as f64 / (1u64 << 31) as f64;
        let exp = self.exponent as i32 - BIAS;
        let value = magnitude * 2f64.powi(exp);
        if sign { -value } else { value }
    }

    /// Normalizes `v` into a biased-exponent/magnitude pair, reporting
    /// overflow (biased exponent above `u16::MAX`) or underflow (below 0)
    /// so the caller can set O/Z per spec §4.5.
    pub fn from_f64(v: f64) -> (Self, FloatStatus) {
        if v == 0.0 {
            return (Self::zero(), FloatStatus::default());
        }
        let sign = v.is_sign_negative();
        let mut mantissa = v.abs();
        let mut exp = mantissa.log2().floor() as i32 + 1;
        mantissa /= 2f64.powi(exp);
        while mantissa >= 1.0 {
            mantissa /= 2.0;
            exp += 1;
        }
        while mantissa < 0.5 {
            mantissa *= 2.0;
            exp -= 1;
        }

        let biased = exp + BIAS;
        let mut status = FloatStatus::default();
        let exponent = if biased > u16::MAX as i32 {
            status.overflow = true;
            u16::MAX
        } else if biased < 0 {
            status.underflow = true;
            0
        } else {
            biased as u16
        };

        let magnitude = (mantissa * (1u64 << 31) as f64) as u32 & FRACTION_MAGNITUDE;
        let fraction = if sign { magnitude | FRACTION_SIGN } else { magnitude };
        (Self { exponent, fraction }, status)
    }

    pub fn add(self, rhs: Self) -> (Self, FloatStatus) {
        Self::from_f64(self.to_f64() + rhs.to_f64())
    }

    pub fn sub(self, rhs: Self) -> (Self, FloatStatus) {
        Self::from_f64(self.to_f64() - rhs.to_f64())
    }

    pub fn mul(self, rhs: Self) -> (Self, FloatStatus) {
        Self::from_f64(self.to_f64() * rhs.to_f64())
    }

    pub fn div(self, rhs: Self) -> (Self, FloatStatus) {
        Self::from_f64(self.to_f64() / rhs.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_f64() {
        let (f, status) = NdFloat::from_f64(3.5);
        assert!(!status.overflow && !status.underflow);
        assert!((f.to_f64() - 3.5).abs() < 1e-9);
    }

    #[test]
    fn negative_values_keep_sign_in_fraction_msb() {
        let (f, _) = NdFloat::from_f64(-2.0);
        assert_eq!(f.fraction & FRACTION_SIGN, FRACTION_SIGN);
        assert!((f.to_f64() + 2.0).abs() < 1e-9);
    }

    #[test]
    fn add_matches_f64_addition() {
        let (a, _) = NdFloat::from_f64(1.25);
        let (b, _) = NdFloat::from_f64(2.5);
        let (sum, status) = a.add(b);
        assert!(!status.overflow && !status.underflow);
        assert!((sum.to_f64() - 3.75).abs() < 1e-9);
    }

    #[test]
    fn words_round_trip() {
        let (f, _) = NdFloat::from_f64(-123.456);
        let (e, hi, lo) = f.to_words();
        let back = NdFloat::from_words(e, hi, lo);
        assert_eq!(back, f);
    }
}
