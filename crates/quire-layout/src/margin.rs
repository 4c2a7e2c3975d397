//! Vertical margin collapsing.
//!
//! [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
//!
//! "When two or more margins collapse, the resulting margin width is the
//! maximum of the collapsing margins' widths. In the case of negative
//! margins, the maximum of the absolute values of the negative adjoining
//! margins is deducted from the maximum of the positive adjoining margins.
//! If there are no positive margins, the maximum of the absolute values
//! of the adjoining margins is deducted from zero."

/// Collapse a set of adjoining margins into one.
///
/// - only non-negative margins: the largest (0 for an empty set)
/// - only non-positive margins: the most negative
/// - mixed: largest positive plus most negative
#[must_use]
pub fn collapse_margin_set(margins: &[f32]) -> f32 {
    margins
        .iter()
        .fold(CollapsedMargin::zero(), |acc, &m| acc.adjoin(CollapsedMargin::new(m)))
        .solve()
}

/// Gap between a box's bottom margin and the next box's top margin.
///
/// When a new block formatting context starts at this boundary the margins
/// do not collapse through it and the gap is their sum. Otherwise they
/// collapse as a set.
#[must_use]
pub fn collapsed_gap_between(
    prev_bottom: f32,
    next_top: f32,
    parent_establishes_new_formatting_context: bool,
) -> f32 {
    if parent_establishes_new_formatting_context {
        prev_bottom + next_top
    } else {
        collapse_margin_set(&[prev_bottom, next_top])
    }
}

/// A set of adjoining margins, kept as its extremes so more margins can be
/// folded in as block layout walks down the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollapsedMargin {
    /// Largest positive margin seen, or 0.
    pub max_positive: f32,
    /// Most negative margin seen, or 0.
    pub min_negative: f32,
}

impl CollapsedMargin {
    /// The empty set.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            max_positive: 0.0,
            min_negative: 0.0,
        }
    }

    /// A set holding one margin. Non-finite input counts as 0.
    #[must_use]
    pub fn new(margin: f32) -> Self {
        let margin = if margin.is_finite() { margin } else { 0.0 };
        Self {
            max_positive: margin.max(0.0),
            min_negative: margin.min(0.0),
        }
    }

    /// Union of two sets.
    #[must_use]
    pub fn adjoin(&self, other: Self) -> Self {
        Self {
            max_positive: self.max_positive.max(other.max_positive),
            min_negative: self.min_negative.min(other.min_negative),
        }
    }

    /// Fold `other` into `self`.
    pub fn adjoin_assign(&mut self, other: Self) {
        *self = self.adjoin(other);
    }

    /// The used width of the collapsed margin.
    #[must_use]
    pub fn solve(&self) -> f32 {
        self.max_positive + self.min_negative
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    fn finite(values: &[f32]) -> Vec<f32> {
        values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .map(|v| v % 1.0e6)
            .collect()
    }

    #[quickcheck]
    fn prop_non_negative_set_collapses_to_max(values: Vec<f32>) -> bool {
        let set: Vec<f32> = finite(&values).into_iter().map(f32::abs).collect();
        let expected = set.iter().copied().fold(0.0_f32, f32::max);
        collapse_margin_set(&set) == expected
    }

    #[quickcheck]
    fn prop_non_positive_set_collapses_to_min(values: Vec<f32>) -> bool {
        let set: Vec<f32> = finite(&values).into_iter().map(|v| -v.abs()).collect();
        let expected = set.iter().copied().fold(0.0_f32, f32::min);
        collapse_margin_set(&set) == expected
    }

    #[quickcheck]
    fn prop_mixed_set_is_max_plus_min(values: Vec<f32>) -> bool {
        let set = finite(&values);
        let max_positive = set.iter().copied().filter(|v| *v > 0.0).fold(0.0_f32, f32::max);
        let min_negative = set.iter().copied().filter(|v| *v < 0.0).fold(0.0_f32, f32::min);
        collapse_margin_set(&set) == max_positive + min_negative
    }

    #[quickcheck]
    fn prop_order_does_not_matter(values: Vec<f32>) -> bool {
        let set = finite(&values);
        let mut reversed = set.clone();
        reversed.reverse();
        collapse_margin_set(&set) == collapse_margin_set(&reversed)
    }

    #[test]
    fn test_mixed_example() {
        assert_eq!(collapse_margin_set(&[10.0, -4.0, 6.0]), 6.0);
        assert_eq!(collapse_margin_set(&[]), 0.0);
        assert_eq!(collapse_margin_set(&[-3.0, -8.0]), -8.0);
    }

    #[test]
    fn test_gap_between_respects_formatting_context_boundary() {
        assert_eq!(collapsed_gap_between(8.0, -3.0, false), 5.0);
        assert_eq!(collapsed_gap_between(8.0, -3.0, true), 5.0);
        assert_eq!(collapsed_gap_between(8.0, 4.0, true), 12.0);
        assert_eq!(collapsed_gap_between(8.0, 4.0, false), 8.0);
    }

    #[test]
    fn test_adjoin_assign_accumulates() {
        let mut strut = CollapsedMargin::new(12.0);
        strut.adjoin_assign(CollapsedMargin::new(-5.0));
        strut.adjoin_assign(CollapsedMargin::new(20.0));
        assert_eq!(strut.solve(), 15.0);
        assert_eq!(CollapsedMargin::new(f32::NAN), CollapsedMargin::zero());
    }
}
