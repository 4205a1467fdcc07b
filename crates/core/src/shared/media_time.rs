use std::fmt;

/// A rational time base, e.g. `1/30` for a 30 fps video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    pub fn is_valid(&self) -> bool {
        self.num > 0 && self.den > 0
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Rescale `ts` from one time base to another, rounding to the nearest tick
/// (halfway cases away from zero). Results outside `i64` saturate.
pub fn rescale(ts: i64, from: Rational, to: Rational) -> i64 {
    if from == to {
        return ts;
    }
    let num = ts as i128 * from.num as i128 * to.den as i128;
    let den = from.den as i128 * to.num as i128;
    if den == 0 {
        return 0;
    }
    let half = den.abs() / 2;
    let rounded = if (num >= 0) == (den > 0) {
        (num.abs() + half) / den.abs()
    } else {
        -((num.abs() + half) / den.abs())
    };
    saturate(rounded)
}

fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// A capture timestamp: `value / timescale` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaTime {
    pub value: i64,
    pub timescale: i32,
}

impl MediaTime {
    pub const fn new(value: i64, timescale: i32) -> Self {
        Self { value, timescale }
    }

    pub fn is_valid(&self) -> bool {
        self.timescale > 0
    }

    pub fn seconds(&self) -> f64 {
        self.value as f64 / self.timescale as f64
    }

    /// `self - other`, expressed in this timestamp's timescale.
    pub fn checked_sub(self, other: MediaTime) -> Option<MediaTime> {
        if !self.is_valid() || !other.is_valid() {
            return None;
        }
        let other_value = if other.timescale == self.timescale {
            other.value
        } else {
            rescale(
                other.value,
                Rational::new(1, other.timescale),
                Rational::new(1, self.timescale),
            )
        };
        Some(MediaTime::new(
            self.value.checked_sub(other_value)?,
            self.timescale,
        ))
    }

    /// Convert into ticks of `time_base`, rounding to nearest.
    pub fn to_time_base(self, time_base: Rational) -> i64 {
        rescale(self.value, Rational::new(1, self.timescale), time_base)
    }

    /// Whole ticks elapsed at `rate` ticks per second, truncated toward zero.
    pub fn count_at_rate(self, rate: u32) -> i64 {
        if !self.is_valid() {
            return 0;
        }
        saturate(self.value as i128 * rate as i128 / self.timescale as i128)
    }
}
