// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::fmt;

use rand::Rng;

/// A range of numbers centered on a base value. A concrete number is drawn
/// uniformly from `[value - variance, value + variance]` each time one is
/// generated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Variance {
    /// The base value.
    value: f32,
    /// The maximum distance from the base value. Always non-negative.
    variance: f32,
}

impl Variance {
    /// A range that always generates the same value.
    pub const fn constant(value: f32) -> Self {
        Self {
            value,
            variance: 0.0,
        }
    }

    /// A range covering `[min, max]` inclusive. The bounds may be given in
    /// either order.
    pub fn range(min: f32, max: f32) -> Self {
        let mid = (min + max) / 2.0;
        Self {
            value: mid,
            variance: (max - mid).abs(),
        }
    }

    /// A range of `value` plus or minus `variance`.
    pub fn variance(value: f32, variance: f32) -> Self {
        Self {
            value,
            variance: variance.abs(),
        }
    }

    /// The base value.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// The maximum distance from the base value.
    pub fn spread(&self) -> f32 {
        self.variance
    }

    /// The smallest value that can be generated.
    pub fn min(&self) -> f32 {
        self.value - self.variance
    }

    /// The largest value that can be generated.
    pub fn max(&self) -> f32 {
        self.value + self.variance
    }

    /// Returns true if every generated value is the same.
    pub fn is_constant(&self) -> bool {
        self.variance == 0.0
    }

    /// Returns true if the range can generate anything other than zero.
    pub fn can_be_nonzero(&self) -> bool {
        self.value != 0.0 || self.variance != 0.0
    }

    /// Generates a value within the range. Always finite: a non-finite base
    /// value generates 0, and samples outside what an `f32` can hold are
    /// clamped.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if !self.value.is_finite() {
            return 0.0;
        }
        if self.is_constant() || !self.variance.is_finite() {
            return self.value;
        }

        let offset = f64::from(self.variance) * rng.gen_range(-1.0f64..=1.0);
        let sample = (f64::from(self.value) + offset)
            .clamp(f64::from(f32::MIN), f64::from(f32::MAX)) as f32;
        sample.clamp(self.min(), self.max())
    }
}

impl Default for Variance {
    fn default() -> Self {
        Variance::constant(0.0)
    }
}

impl fmt::Display for Variance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constant() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{}±{}", self.value, self.variance)
        }
    }
}
