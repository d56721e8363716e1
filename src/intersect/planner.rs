//! Picks a kernel for a pair of sets by their size ratio.

use std::{env, fmt};

use lazy_static::lazy_static;

use crate::{
    instructions::Isa,
    intersect::Kernel,
    visitor::{Counter, VecWriter},
};

/// Environment variable overriding [`DEFAULT_GALLOP_OVERHEAD`].
pub const GALLOP_OVERHEAD_VAR: &str = "INTERSECTION_GALLOP_OVERHEAD";

/// Galloping is chosen when the larger set is more than this many times the
/// size of the smaller one.
pub const DEFAULT_GALLOP_OVERHEAD: usize = 4;

lazy_static! {
    static ref PLANNER: Planner = Planner::from_env().unwrap_or_default();
}

/// Planner configured from the environment on first use. An invalid
/// `INTERSECTION_GALLOP_OVERHEAD` falls back to the default.
pub fn global() -> &'static Planner {
    &PLANNER
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    ZeroOverhead,
    BadOverhead(String),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::ZeroOverhead =>
                write!(f, "gallop overhead must be at least 1"),
            PlannerError::BadOverhead(value) =>
                write!(f, "invalid {} {:?}", GALLOP_OVERHEAD_VAR, value),
        }
    }
}

impl std::error::Error for PlannerError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Planner {
    gallop_overhead: usize,
}

impl Default for Planner {
    fn default() -> Self {
        Self { gallop_overhead: DEFAULT_GALLOP_OVERHEAD }
    }
}

impl Planner {
    pub fn new(gallop_overhead: usize) -> Result<Self, PlannerError> {
        if gallop_overhead == 0 {
            return Err(PlannerError::ZeroOverhead);
        }
        Ok(Self { gallop_overhead })
    }

    /// Reads `INTERSECTION_GALLOP_OVERHEAD`, defaulting when it is unset.
    pub fn from_env() -> Result<Self, PlannerError> {
        match env::var(GALLOP_OVERHEAD_VAR) {
            Ok(value) => Self::parse(&value),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn parse(value: &str) -> Result<Self, PlannerError> {
        let overhead = value.trim().parse()
            .map_err(|_| PlannerError::BadOverhead(value.to_string()))?;
        Self::new(overhead)
    }

    pub fn gallop_overhead(&self) -> usize {
        self.gallop_overhead
    }

    /// `SimdGalloping` when the smaller set is less than `1/overhead` of the
    /// larger one, `QFilter` otherwise.
    pub fn choose(&self, set_a: &[u32], set_b: &[u32]) -> Kernel {
        let (small, large) = by_size(set_a, set_b);
        if small.len() < large.len() / self.gallop_overhead {
            Kernel::SimdGalloping
        } else {
            Kernel::QFilter
        }
    }

    /// Intersects with the chosen kernel. Matches are appended to `results`
    /// when given, otherwise only counted. Returns the number of matches.
    pub fn intersect(&self, set_a: &[u32], set_b: &[u32], results: Option<&mut Vec<u32>>) -> usize {
        let (small, large) = by_size(set_a, set_b);
        let kernel = self.choose(small, large);
        let isa = Isa::detect();

        match results {
            Some(results) => {
                let before = results.len();
                let mut writer = VecWriter::from(std::mem::take(results));
                kernel.run(isa, small, large, &mut writer);
                *results = writer.into();
                results.len() - before
            }
            None => {
                let mut counter = Counter::new();
                kernel.run(isa, small, large, &mut counter);
                counter.count()
            }
        }
    }
}

fn by_size<'a>(set_a: &'a [u32], set_b: &'a [u32]) -> (&'a [u32], &'a [u32]) {
    if set_a.len() <= set_b.len() {
        (set_a, set_b)
    } else {
        (set_b, set_a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chooses_by_ratio() {
        let planner = Planner::default();
        let small: Vec<u32> = (0..10).collect();
        let large: Vec<u32> = (0..100).collect();
        let even: Vec<u32> = (0..40).collect();

        assert_eq!(planner.choose(&small, &large), Kernel::SimdGalloping);
        assert_eq!(planner.choose(&large, &small), Kernel::SimdGalloping);
        assert_eq!(planner.choose(&small, &even), Kernel::QFilter);
        assert_eq!(planner.choose(&[], &[]), Kernel::QFilter);
    }

    #[test]
    fn overhead_is_configurable() {
        let small: Vec<u32> = (0..10).collect();
        let large: Vec<u32> = (0..100).collect();
        let planner = Planner::new(20).unwrap();
        assert_eq!(planner.choose(&small, &large), Kernel::QFilter);
    }

    #[test]
    fn parses_overhead() {
        assert_eq!(Planner::parse("8").unwrap().gallop_overhead(), 8);
        assert_eq!(Planner::parse(" 2 ").unwrap().gallop_overhead(), 2);
        assert_eq!(Planner::parse("0"), Err(PlannerError::ZeroOverhead));
        assert_eq!(
            Planner::parse("four"),
            Err(PlannerError::BadOverhead("four".to_string()))
        );
        assert_eq!(Planner::new(0), Err(PlannerError::ZeroOverhead));
    }

    #[test]
    fn appends_or_counts() {
        let planner = Planner::default();
        let set_a: Vec<u32> = (0..200).map(|i| i * 2).collect();
        let set_b = [3, 4, 10, 11, 398];

        let mut results = vec![1];
        assert_eq!(planner.intersect(&set_a, &set_b, Some(&mut results)), 3);
        assert_eq!(results, vec![1, 4, 10, 398]);

        assert_eq!(planner.intersect(&set_b, &set_a, None), 3);
        assert_eq!(global().intersect(&set_a, &set_a, None), 200);
    }
}
