//! Shared macro totals
//!
//! Used by entries, daily totals, range totals and goal progress.

use serde::{Deserialize, Serialize};

use crate::nutrition::units::round1;

/// Calories plus the three macronutrients.
///
/// Calories are whole numbers everywhere; grams keep full precision through
/// summation and are only rounded for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub calories: i64,
    pub protein: f64, // grams
    pub carbs: f64,   // grams
    pub fat: f64,     // grams
}

impl Macros {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn add(&self, other: &Macros) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fat: self.fat + other.fat,
        }
    }

    /// Divide every field by `n` (calories rounded), zero when `n` is 0
    pub fn average_over(&self, n: usize) -> Self {
        if n == 0 {
            return Self::zero();
        }
        let n = n as f64;
        Self {
            calories: (self.calories as f64 / n).round() as i64,
            protein: self.protein / n,
            carbs: self.carbs / n,
            fat: self.fat / n,
        }
    }

    /// Display rounding: grams to one decimal
    pub fn rounded(&self) -> Self {
        Self {
            calories: self.calories,
            protein: round1(self.protein),
            carbs: round1(self.carbs),
            fat: round1(self.fat),
        }
    }
}

impl std::ops::Add for Macros {
    type Output = Macros;

    fn add(self, other: Macros) -> Macros {
        Macros::add(&self, &other)
    }
}

impl std::ops::AddAssign for Macros {
    fn add_assign(&mut self, other: Macros) {
        *self = Macros::add(self, &other);
    }
}

impl std::iter::Sum for Macros {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Macros::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum() {
        let total: Macros = vec![
            Macros { calories: 300, protein: 20.5, carbs: 30.25, fat: 10.0 },
            Macros { calories: 450, protein: 0.5, carbs: 12.0, fat: 3.3 },
        ]
        .into_iter()
        .sum();
        assert_eq!(total.calories, 750);
        assert!((total.protein - 21.0).abs() < 1e-9);
        assert!((total.carbs - 42.25).abs() < 1e-9);
        assert!((total.fat - 13.3).abs() < 1e-9);
    }

    #[test]
    fn test_average_over() {
        let m = Macros { calories: 1001, protein: 30.0, carbs: 0.0, fat: 7.0 };
        let avg = m.average_over(2);
        assert_eq!(avg.calories, 501);
        assert!((avg.protein - 15.0).abs() < 1e-9);
        assert_eq!(m.average_over(0), Macros::zero());
    }

    #[test]
    fn test_rounded_only_touches_grams() {
        let m = Macros { calories: 512, protein: 12.345, carbs: 0.04, fat: 9.96 };
        let r = m.rounded();
        assert_eq!(r.calories, 512);
        assert_eq!(r.protein, 12.3);
        assert_eq!(r.carbs, 0.0);
        assert_eq!(r.fat, 10.0);
        assert_eq!(r.protein, round1(m.protein));
    }
}
