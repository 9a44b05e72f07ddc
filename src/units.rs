//! Units module - Physical length and angle quantities

use std::f64::consts::PI;
use std::ops::{Mul, Neg};

const METERS_PER_INCH: f64 = 0.0254;

/// A linear distance, stored in meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Length(f64);

impl Length {
    pub const ZERO: Length = Length(0.0);

    pub fn meters(value: f64) -> Self {
        Self(value)
    }

    pub fn centimeters(value: f64) -> Self {
        Self(value / 100.0)
    }

    pub fn inches(value: f64) -> Self {
        Self(value * METERS_PER_INCH)
    }

    pub fn feet(value: f64) -> Self {
        Self::inches(value * 12.0)
    }

    pub fn as_meters(&self) -> f64 {
        self.0
    }

    pub fn as_inches(&self) -> f64 {
        self.0 / METERS_PER_INCH
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }
}

impl Neg for Length {
    type Output = Length;

    fn neg(self) -> Length {
        Length(-self.0)
    }
}

impl Mul<f64> for Length {
    type Output = Length;

    fn mul(self, rhs: f64) -> Length {
        Length(self.0 * rhs)
    }
}

/// A rotation, stored in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn degrees(value: f64) -> Self {
        Self(value)
    }

    pub fn radians(value: f64) -> Self {
        Self(value * 180.0 / PI)
    }

    pub fn as_degrees(&self) -> f64 {
        self.0
    }

    pub fn as_radians(&self) -> f64 {
        self.0 * PI / 180.0
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }
}

impl Neg for Angle {
    type Output = Angle;

    fn neg(self) -> Angle {
        Angle(-self.0)
    }
}

impl Mul<f64> for Angle {
    type Output = Angle;

    fn mul(self, rhs: f64) -> Angle {
        Angle(self.0 * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_conversions() {
        assert!((Length::inches(39.37007874).as_meters() - 1.0).abs() < 1e-6);
        assert!((Length::feet(1.0).as_inches() - 12.0).abs() < 1e-9);
        assert_eq!(Length::centimeters(250.0), Length::meters(2.5));
    }

    #[test]
    fn test_angle_conversions() {
        assert!((Angle::radians(PI).as_degrees() - 180.0).abs() < 1e-9);
        assert!((Angle::degrees(90.0).as_radians() - PI / 2.0).abs() < 1e-9);
        assert_eq!((-Angle::degrees(6.0)).abs(), Angle::degrees(6.0));
    }
}
