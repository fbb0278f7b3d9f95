//! Tiered approximate equality for `f64` values and tensors.
//!
//! Gradient checks compare analytic gradients with finite differences, which
//! never agree exactly. Instead of a single epsilon, differences are graded
//! into tiers so callers can state how strict they want to be.

/// Differences at or above this are [`ApproxEquality::Scarce`].
pub const MAX_ERROR: f64 = 1e-3;

/// Differences below this are at least [`ApproxEquality::Partial`].
///
/// This is the tolerance finite-difference gradient checks are held to.
pub const AVG_ERROR: f64 = 1e-5;

/// Differences below this are [`ApproxEquality::Precise`].
pub const MIN_ERROR: f64 = 1e-10;

/// The approximated equality enumerated, from best to worst.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ApproxEquality {
    /// Very strong epsilon.
    Precise = 0,

    /// Good epsilon.
    Partial = 1,

    /// Acceptable epsilon.
    Relative = 2,

    /// No relative equality.
    Scarce = 3,
}

impl ApproxEquality {
    /// Grades a single absolute difference.
    #[must_use]
    pub fn grade(dif: f64) -> Self {
        if dif < MIN_ERROR {
            Self::Precise
        } else if dif < AVG_ERROR {
            Self::Partial
        } else if dif < MAX_ERROR {
            Self::Relative
        } else {
            // NaN lands here too
            Self::Scarce
        }
    }

    /// Whether this grade is `tier` or better.
    #[must_use]
    pub fn at_least(self, tier: Self) -> bool {
        self <= tier
    }
}

/// Checks the distance between two values against the error tiers.
pub trait RelativeEq<Rhs: ?Sized = Self> {
    /// Grades the equality of `self` and `rhs`.
    fn approx_eq(&self, rhs: &Rhs) -> ApproxEquality;
}

impl RelativeEq for f64 {
    fn approx_eq(&self, rhs: &Self) -> ApproxEquality {
        ApproxEquality::grade((self - rhs).abs())
    }
}

impl RelativeEq for [f64] {
    /// The grade of a slice is the worst grade of its elements; slices of
    /// different lengths are never equal.
    fn approx_eq(&self, rhs: &Self) -> ApproxEquality {
        if self.len() != rhs.len() {
            return ApproxEquality::Scarce;
        }
        let mut eq = ApproxEquality::Precise;
        for (a, b) in self.iter().zip(rhs) {
            eq = eq.max(a.approx_eq(b));
            if eq == ApproxEquality::Scarce {
                break;
            }
        }
        eq
    }
}

/// Whether `a` and `b` are equal to within [`AVG_ERROR`].
pub fn approx_eq<A: RelativeEq<B> + ?Sized, B: ?Sized>(a: &A, b: &B) -> bool {
    a.approx_eq(b).at_least(ApproxEquality::Partial)
}
