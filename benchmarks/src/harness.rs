//! Wall-clock timing of single intersections.

use std::{
    hint,
    time::{Duration, Instant},
};

use postings::{
    intersect::{planner, run_2set, scalar_merge},
    visitor::SliceWriter,
    AlignedVec, Isa, Kernel,
};
use roaring::RoaringBitmap;

/// Anything `benchmark` knows how to time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Kernel(Kernel),
    /// Kernel picked by the size-ratio planner.
    Planner,
    /// `RoaringBitmap` intersection as a baseline.
    Roaring,
}

impl Algorithm {
    pub fn from_name(name: &str) -> Option<Algorithm> {
        match name {
            "planner" => Some(Algorithm::Planner),
            "roaring" => Some(Algorithm::Roaring),
            _ => Kernel::from_name(name).map(Algorithm::Kernel),
        }
    }

    pub fn time(self, warmup: Duration, set_a: &[u32], set_b: &[u32]) -> Result<Duration, String> {
        match self {
            Algorithm::Kernel(kernel) => time_kernel(warmup, kernel, Isa::detect(), set_a, set_b),
            Algorithm::Planner => time_planner(warmup, set_a, set_b),
            Algorithm::Roaring => Ok(time_roaring(warmup, set_a, set_b)),
        }
    }
}

fn time<D>(
    warmup: Duration,
    prepare: impl Fn() -> D,
    run: impl Fn(&mut D)) -> (Duration, D)
{
    let warmup_start = Instant::now();
    while warmup_start.elapsed() < warmup {
        let mut data = prepare();
        hint::black_box(run(&mut data));
    }

    let mut data = prepare();

    let start = Instant::now();
    hint::black_box(run(&mut data));
    let elapsed = start.elapsed();

    (elapsed, data)
}

/// Times `kernel` on copies of the inputs aligned for every kernel, writing
/// into a buffer sized to the smaller set. The result is checked against the
/// scalar merge.
pub fn time_kernel(
    warmup: Duration,
    kernel: Kernel,
    isa: Isa,
    set_a: &[u32],
    set_b: &[u32]) -> Result<Duration, String>
{
    let (set_a, set_b) = if kernel == Kernel::SimdGalloping && set_b.len() < set_a.len() {
        (set_b, set_a)
    } else {
        (set_a, set_b)
    };
    let aligned_a = AlignedVec::from(set_a);
    let aligned_b = AlignedVec::from(set_b);

    let capacity = set_a.len().min(set_b.len());

    let prepare = || (vec![0u32; capacity], 0);
    let run = |(out, len): &mut (Vec<u32>, usize)| {
        let mut writer = SliceWriter::from(out.as_mut_slice());
        kernel.run(isa, &aligned_a, &aligned_b, &mut writer);
        *len = writer.position();
    };

    let (elapsed, (out, len)) = time(warmup, prepare, run);

    ensure_same_as_merge(kernel.name(), set_a, set_b, &out[..len])?;
    Ok(elapsed)
}

fn time_planner(warmup: Duration, set_a: &[u32], set_b: &[u32]) -> Result<Duration, String> {
    let capacity = set_a.len().min(set_b.len());

    let prepare = || Vec::with_capacity(capacity);
    let run = |out: &mut Vec<u32>| {
        planner::global().intersect(set_a, set_b, Some(out));
    };

    let (elapsed, out) = time(warmup, prepare, run);

    ensure_same_as_merge("planner", set_a, set_b, &out)?;
    Ok(elapsed)
}

pub fn time_roaring(warmup: Duration, set_a: &[u32], set_b: &[u32]) -> Duration {
    let prepare = || {
        let victim = RoaringBitmap::from_sorted_iter(set_a.iter().copied())
            .unwrap_or_default();
        let other = RoaringBitmap::from_sorted_iter(set_b.iter().copied())
            .unwrap_or_default();
        (victim, other)
    };
    let run = |(victim, other): &mut (RoaringBitmap, RoaringBitmap)| {
        *victim &= &*other
    };

    let (elapsed, _) = time(warmup, prepare, run);
    elapsed
}

fn ensure_same_as_merge(
    name: &str,
    set_a: &[u32],
    set_b: &[u32],
    result: &[u32]) -> Result<(), String>
{
    let expected = run_2set(set_a, set_b, scalar_merge);
    if result == expected.as_slice() {
        Ok(())
    }
    else {
        Err(format!(
            "{} returned {} elements, expected {}",
            name, result.len(), expected.len()
        ))
    }
}
