//! Query specifications.
//!
//! A specification wraps a reusable filter predicate (and optionally an
//! ordering) over a type. Repositories evaluate them against stored
//! aggregates; combinators compose them without writing new types.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A reusable filter over `T`.
pub trait Specification<T>: Send + Sync {
    /// Returns true if `candidate` matches.
    fn is_satisfied_by(&self, candidate: &T) -> bool;

    /// Orders two matching candidates. Defaults to keeping storage order.
    fn compare(&self, _a: &T, _b: &T) -> Ordering {
        Ordering::Equal
    }
}

impl<T, S: Specification<T> + ?Sized> Specification<T> for Box<S> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (**self).is_satisfied_by(candidate)
    }

    fn compare(&self, a: &T, b: &T) -> Ordering {
        (**self).compare(a, b)
    }
}

impl<T, S: Specification<T> + ?Sized> Specification<T> for &S {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (**self).is_satisfied_by(candidate)
    }

    fn compare(&self, a: &T, b: &T) -> Ordering {
        (**self).compare(a, b)
    }
}

/// Matches every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct All;

impl<T> Specification<T> for All {
    fn is_satisfied_by(&self, _candidate: &T) -> bool {
        true
    }
}

/// Both specifications must match. Ordering comes from the left side.
#[derive(Debug, Clone)]
pub struct And<A, B>(pub A, pub B);

impl<T, A: Specification<T>, B: Specification<T>> Specification<T> for And<A, B> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.0.is_satisfied_by(candidate) && self.1.is_satisfied_by(candidate)
    }

    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.0.compare(a, b).then_with(|| self.1.compare(a, b))
    }
}

/// Either specification must match.
#[derive(Debug, Clone)]
pub struct Or<A, B>(pub A, pub B);

impl<T, A: Specification<T>, B: Specification<T>> Specification<T> for Or<A, B> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.0.is_satisfied_by(candidate) || self.1.is_satisfied_by(candidate)
    }

    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.0.compare(a, b).then_with(|| self.1.compare(a, b))
    }
}

/// Inverts a specification.
#[derive(Debug, Clone)]
pub struct Not<A>(pub A);

impl<T, A: Specification<T>> Specification<T> for Not<A> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        !self.0.is_satisfied_by(candidate)
    }
}

/// Closure-backed specification, see [`spec_fn`].
pub struct FnSpecification<F>(F);

impl<T, F> Specification<T> for FnSpecification<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (self.0)(candidate)
    }
}

/// Builds a specification from a predicate.
pub fn spec_fn<T, F>(predicate: F) -> FnSpecification<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    FnSpecification(predicate)
}

/// Combinators available on every specification.
pub trait SpecificationExt<T>: Specification<T> + Sized {
    /// Both `self` and `other` must match.
    fn and<S: Specification<T>>(self, other: S) -> And<Self, S> {
        And(self, other)
    }

    /// Either `self` or `other` must match.
    fn or<S: Specification<T>>(self, other: S) -> Or<Self, S> {
        Or(self, other)
    }

    /// Matches what `self` rejects.
    fn not(self) -> Not<Self> {
        Not(self)
    }
}

impl<T, S: Specification<T>> SpecificationExt<T> for S {}

/// Offset/limit window over a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    /// Default page size.
    pub const DEFAULT_LIMIT: usize = 20;

    /// Largest page size a caller may request.
    pub const MAX_LIMIT: usize = 100;

    /// Creates a page, clamping the limit to `1..=MAX_LIMIT`.
    pub fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    /// A page large enough to return every match, for internal lookups.
    pub fn unbounded() -> Self {
        Self {
            offset: 0,
            limit: usize::MAX,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_LIMIT)
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

impl<T> Paged<T> {
    /// Filters, sorts and pages `candidates` with `spec`.
    pub fn from_candidates<S>(candidates: Vec<T>, spec: &S, page: Page) -> Self
    where
        S: Specification<T> + ?Sized,
    {
        let mut matches: Vec<T> = candidates
            .into_iter()
            .filter(|c| spec.is_satisfied_by(c))
            .collect();
        matches.sort_by(|a, b| spec.compare(a, b));

        let total = matches.len();
        let items = matches
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect();

        Self {
            items,
            total,
            offset: page.offset,
            limit: page.limit,
        }
    }

    /// Maps every item, keeping the paging information.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Even;

    impl Specification<i32> for Even {
        fn is_satisfied_by(&self, candidate: &i32) -> bool {
            candidate % 2 == 0
        }

        fn compare(&self, a: &i32, b: &i32) -> Ordering {
            b.cmp(a)
        }
    }

    #[test]
    fn combinators() {
        let positive = spec_fn(|n: &i32| *n > 0);
        let even_and_positive = Even.and(positive);
        assert!(even_and_positive.is_satisfied_by(&4));
        assert!(!even_and_positive.is_satisfied_by(&-4));
        assert!(!even_and_positive.is_satisfied_by(&3));

        let odd = Even.not();
        assert!(odd.is_satisfied_by(&3));

        let even_or_big = Even.or(spec_fn(|n: &i32| *n > 100));
        assert!(even_or_big.is_satisfied_by(&101));
        assert!(!even_or_big.is_satisfied_by(&7));
    }

    #[test]
    fn paged_filters_sorts_and_windows() {
        let numbers: Vec<i32> = (1..=10).collect();
        let page = Paged::from_candidates(numbers, &Even, Page::new(1, 2));
        assert_eq!(page.total, 5);
        assert_eq!(page.items, vec![8, 6]);
    }

    #[test]
    fn page_limit_is_clamped() {
        assert_eq!(Page::new(0, 0).limit, 1);
        assert_eq!(Page::new(0, 1_000).limit, Page::MAX_LIMIT);
        assert_eq!(Page::default().limit, Page::DEFAULT_LIMIT);
    }

    #[test]
    fn all_matches_everything() {
        let page = Paged::from_candidates(vec![1, 2, 3], &All, Page::unbounded());
        assert_eq!(page.items, vec![1, 2, 3]);
    }
}
