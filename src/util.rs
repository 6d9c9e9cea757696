//! Miscellaneous utility structs and functions.

use std::fmt::Debug;

use cgmath::num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An interval on the real number line.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    /// Creates a new interval.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: std::cmp::PartialOrd> Interval<T> {
    /// Returns true if this interval contains the value.
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }
}

impl<T: std::ops::Sub<T, Output = T> + Copy> Interval<T> {
    /// Gets the magnitude of the interval.
    pub fn length(&self) -> T {
        self.max - self.min
    }
}

impl<T: Float> Interval<T> {
    /// Returns the centre/mid-point of the interval.
    pub fn midpoint(&self) -> T {
        (self.min + self.max) / (T::one() + T::one())
    }

    /// Restricts a value to lie within the interval.
    pub fn clamp(&self, value: T) -> T {
        value.max(self.min).min(self.max)
    }

    /// How far the value lies below the interval, or zero if it doesn't.
    pub fn depth_below(&self, value: T) -> T {
        T::max(self.min - value, T::zero())
    }

    /// How far the value lies above the interval, or zero if it doesn't.
    pub fn depth_above(&self, value: T) -> T {
        T::max(value - self.max, T::zero())
    }
}

impl<T: Debug> Debug for Interval<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interval({:?}, {:?})", &self.min, &self.max)
    }
}

#[cfg(test)]
mod test {
    use super::Interval;

    #[test]
    fn clamp_and_depth() {
        let range = Interval::new(20.0, 1380.0);
        assert_eq!(range.clamp(5.0), 20.0);
        assert_eq!(range.clamp(1400.0), 1380.0);
        assert_eq!(range.clamp(700.0), 700.0);
        assert_eq!(range.depth_below(12.5), 7.5);
        assert_eq!(range.depth_below(30.0), 0.0);
        assert_eq!(range.depth_above(1390.0), 10.0);
        assert_eq!(range.length(), 1360.0);
        assert_eq!(range.midpoint(), 700.0);
        assert!(range.contains(20.0));
        assert!(!range.contains(19.9));
    }
}
