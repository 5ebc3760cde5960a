//! OrderedPair: element type of Cartesian products.

use core::fmt;

/// An ordered pair `(first, second)`. Two pairs are equal only when both
/// components are equal in the same positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderedPair<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> OrderedPair<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn into_tuple(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A, B> From<(A, B)> for OrderedPair<A, B> {
    fn from((first, second): (A, B)) -> Self {
        Self { first, second }
    }
}

impl<A: fmt::Display, B: fmt::Display> fmt::Display for OrderedPair<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::OrderedPair;

    /// Invariant: Position matters for equality.
    #[test]
    fn equality_is_positional() {
        assert_eq!(OrderedPair::new(1, 2), OrderedPair::from((1, 2)));
        assert_ne!(OrderedPair::new(1, 2), OrderedPair::new(2, 1));
    }

    #[test]
    fn display_format() {
        assert_eq!(OrderedPair::new("a", 3).to_string(), "(a, 3)");
        assert_eq!(OrderedPair::new(1, 2).into_tuple(), (1, 2));
    }
}
