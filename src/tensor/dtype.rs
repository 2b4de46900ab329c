//! Traits for types that can be used as elements in a tensor.

use std::ops::{Add, Div, Mul, Sub};

/// Tensor elements.
pub trait Elem: 'static + Clone {}

impl Elem for i32 {}
impl Elem for f32 {}
impl Elem for f64 {}

/// Numeric values.
pub trait Num:
    Elem
    + Copy
    + PartialOrd
    + num::Zero
    + num::One
    + Add<Self, Output = Self>
    + Sub<Self, Output = Self>
    + Mul<Self, Output = Self>
    + Div<Self, Output = Self>
{
}

impl Num for i32 {}
impl Num for f32 {}
impl Num for f64 {}

/// Floating values.
pub trait Float: Num + num::Float {
    /// Convert a double-precision value, rounding if the type is narrower.
    fn from_f64(value: f64) -> Self;
}

impl Float for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Float for f64 {
    fn from_f64(value: f64) -> Self {
        value
    }
}
