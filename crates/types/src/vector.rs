//! Resource vectors
//!
//! A [`ResourceVector`] holds one non-negative count per resource type. The
//! same shape is used for totals, availability, allocations, declared
//! maximum demand and pending requests.

use dlsim_errors::AllocationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

/// Fixed-length tuple of unit counts, one component per resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceVector(Vec<u32>);

impl ResourceVector {
    /// Create a vector from raw components
    #[must_use]
    pub fn new(components: Vec<u32>) -> Self {
        Self(components)
    }

    /// All-zero vector with `len` components
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self(vec![0; len])
    }

    /// Number of resource types
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// True when every component is zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0)
    }

    /// Sum across all resource types
    #[must_use]
    pub fn sum(&self) -> u64 {
        self.0.iter().map(|&c| u64::from(c)).sum()
    }

    /// Component-wise `self <= other`.
    ///
    /// Vectors of different length never fit.
    #[must_use]
    pub fn fits_within(&self, other: &Self) -> bool {
        self.len() == other.len() && self.0.iter().zip(&other.0).all(|(a, b)| a <= b)
    }

    /// First resource type where `self` exceeds `other`
    #[must_use]
    pub fn first_excess(&self, other: &Self) -> Option<usize> {
        self.0
            .iter()
            .zip(&other.0)
            .position(|(a, b)| a > b)
    }

    /// Component-wise addition, `None` on overflow or length mismatch
    #[must_use]
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        if self.len() != other.len() {
            return None;
        }
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.checked_add(*b))
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// Component-wise subtraction, `None` if any component would go negative
    #[must_use]
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        if self.len() != other.len() {
            return None;
        }
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.checked_sub(*b))
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// Component-wise subtraction clamped at zero
    #[must_use]
    pub fn saturating_sub(&self, other: &Self) -> Self {
        Self(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(a, b)| a.saturating_sub(*b))
                .collect(),
        )
    }

    /// Reject vectors whose length does not match the number of resource types
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the lengths differ.
    pub fn ensure_len(&self, expected: usize) -> Result<(), AllocationError> {
        if self.len() == expected {
            Ok(())
        } else {
            Err(AllocationError::DimensionMismatch {
                expected,
                actual: self.len(),
            })
        }
    }
}

impl Index<usize> for ResourceVector {
    type Output = u32;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<Vec<u32>> for ResourceVector {
    fn from(components: Vec<u32>) -> Self {
        Self(components)
    }
}

impl<const N: usize> From<[u32; N]> for ResourceVector {
    fn from(components: [u32; N]) -> Self {
        Self(components.to_vec())
    }
}

impl FromIterator<u32> for ResourceVector {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ResourceVector::from([3, 3, 2]).to_string(), "[3, 3, 2]");
        assert_eq!(ResourceVector::zeros(0).to_string(), "[]");
    }

    #[test]
    fn test_fits_within() {
        let a = ResourceVector::from([1, 2, 0]);
        let b = ResourceVector::from([1, 3, 0]);
        assert!(a.fits_within(&b));
        assert!(!b.fits_within(&a));
        assert!(!a.fits_within(&ResourceVector::from([1, 2])));
        assert_eq!(b.first_excess(&a), Some(1));
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = ResourceVector::from([3, 3, 2]);
        let b = ResourceVector::from([1, 0, 2]);
        assert_eq!(a.checked_sub(&b), Some(ResourceVector::from([2, 3, 0])));
        assert_eq!(b.checked_sub(&a), None);
        assert_eq!(a.checked_add(&b), Some(ResourceVector::from([4, 3, 4])));
        assert_eq!(b.saturating_sub(&a), ResourceVector::zeros(3));
        assert_eq!(a.sum(), 8);
    }

    #[test]
    fn test_ensure_len() {
        let v = ResourceVector::from([1, 2]);
        assert!(v.ensure_len(2).is_ok());
        assert_eq!(
            v.ensure_len(3),
            Err(AllocationError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        );
    }
}
