//! Optional numeric value with absence-propagating arithmetic
//!
//! Every formula in the engine is written over `Measure`. Any operation that
//! touches an absent operand yields an absent result, and division by an
//! exact zero yields an absent result instead of infinity or NaN.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Measure(Option<f64>);

impl Measure {
    pub const MISSING: Measure = Measure(None);

    /// Build a present value. Non-finite inputs are treated as absent.
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Measure(Some(value))
        } else {
            Measure(None)
        }
    }

    pub fn value(self) -> Option<f64> {
        self.0
    }

    pub fn is_present(self) -> bool {
        self.0.is_some()
    }

    pub fn is_missing(self) -> bool {
        self.0.is_none()
    }

    /// Row-wise maximum used for the inflation floor.
    /// Absent when either side is absent.
    pub fn floor_at(self, floor: Measure) -> Measure {
        match (self.0, floor.0) {
            (Some(v), Some(f)) => Measure(Some(v.max(f))),
            _ => Measure::MISSING,
        }
    }

    /// Strict comparison; an absent side never compares greater
    pub fn gt(self, other: Measure) -> bool {
        matches!((self.0, other.0), (Some(a), Some(b)) if a > b)
    }

    pub fn gte(self, other: f64) -> bool {
        matches!(self.0, Some(a) if a >= other)
    }

    pub fn abs_diff(self, other: Measure) -> Measure {
        (self - other).map(f64::abs)
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Measure {
        match self.0 {
            Some(v) => Measure::new(f(v)),
            None => Measure::MISSING,
        }
    }
}

impl From<f64> for Measure {
    fn from(value: f64) -> Self {
        Measure::new(value)
    }
}

impl From<Option<f64>> for Measure {
    fn from(value: Option<f64>) -> Self {
        value.map(Measure::new).unwrap_or(Measure::MISSING)
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{}", v),
            None => Ok(()),
        }
    }
}

macro_rules! propagate_op {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait for Measure {
            type Output = Measure;

            fn $method(self, rhs: Measure) -> Measure {
                match (self.0, rhs.0) {
                    (Some(a), Some(b)) => Measure::new(a $op b),
                    _ => Measure::MISSING,
                }
            }
        }

        impl $trait<f64> for Measure {
            type Output = Measure;

            fn $method(self, rhs: f64) -> Measure {
                self $op Measure::new(rhs)
            }
        }
    };
}

propagate_op!(Add, add, +);
propagate_op!(Sub, sub, -);
propagate_op!(Mul, mul, *);

impl Div for Measure {
    type Output = Measure;

    fn div(self, rhs: Measure) -> Measure {
        match (self.0, rhs.0) {
            (Some(_), Some(d)) if d == 0.0 => Measure::MISSING,
            (Some(n), Some(d)) => Measure::new(n / d),
            _ => Measure::MISSING,
        }
    }
}

impl Div<f64> for Measure {
    type Output = Measure;

    fn div(self, rhs: f64) -> Measure {
        self / Measure::new(rhs)
    }
}
