use std::ops::{Add, AddAssign};

/// Number of LK-ball score terms, i.e. rows of the batched energy output.
pub const N_TERMS: usize = 4;

/// The four LK-ball terms, in output-row order.
///
/// The payload is generic so the same record carries energies (`T`) and the
/// matching per-term gradient records.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LkBallTerms<X> {
    pub iso: X,
    pub ball: X,
    pub bridge: X,
    pub bridge_uncpl: X,
}

impl<X> LkBallTerms<X> {
    pub fn new(iso: X, ball: X, bridge: X, bridge_uncpl: X) -> Self {
        Self {
            iso,
            ball,
            bridge,
            bridge_uncpl,
        }
    }

    /// Terms as an array indexed by output row.
    pub fn into_array(self) -> [X; N_TERMS] {
        [self.iso, self.ball, self.bridge, self.bridge_uncpl]
    }
}

impl<X: Copy + Add<Output = X>> LkBallTerms<X> {
    #[inline]
    pub fn total(&self) -> X {
        self.iso + self.ball + self.bridge + self.bridge_uncpl
    }
}

impl<X: Add<Output = X>> Add for LkBallTerms<X> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            iso: self.iso + rhs.iso,
            ball: self.ball + rhs.ball,
            bridge: self.bridge + rhs.bridge,
            bridge_uncpl: self.bridge_uncpl + rhs.bridge_uncpl,
        }
    }
}

impl<X: AddAssign> AddAssign for LkBallTerms<X> {
    fn add_assign(&mut self, rhs: Self) {
        self.iso += rhs.iso;
        self.ball += rhs.ball;
        self.bridge += rhs.bridge;
        self.bridge_uncpl += rhs.bridge_uncpl;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_terms_with_specified_values() {
        let terms = LkBallTerms::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(terms.iso, 1.0);
        assert_eq!(terms.ball, 2.0);
        assert_eq!(terms.bridge, 3.0);
        assert_eq!(terms.bridge_uncpl, 4.0);
    }

    #[test]
    fn total_returns_sum_of_all_terms() {
        let terms = LkBallTerms::new(1.5, -2.0, 0.25, 0.25);
        assert_eq!(terms.total(), 0.0);
    }

    #[test]
    fn into_array_follows_output_row_order() {
        let terms = LkBallTerms::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(terms.into_array(), [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn add_sums_each_field_correctly() {
        let a = LkBallTerms::new(1.0, 2.0, 3.0, 4.0);
        let b = LkBallTerms::new(4.0, 5.0, 6.0, 7.0);
        assert_eq!(a + b, LkBallTerms::new(5.0, 7.0, 9.0, 11.0));
    }

    #[test]
    fn add_assign_accumulates_each_field_correctly() {
        let mut a = LkBallTerms::new(1.0, 2.0, 3.0, 4.0);
        a += LkBallTerms::new(-1.0, 0.5, 0.0, 2.0);
        assert_eq!(a, LkBallTerms::new(0.0, 2.5, 3.0, 6.0));
    }

    #[test]
    fn default_initializes_all_fields_to_zero() {
        let terms = LkBallTerms::<f64>::default();
        assert_eq!(terms.into_array(), [0.0; N_TERMS]);
    }
}
