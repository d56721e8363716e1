use colored::Colorize;
use rand::{distributions::Uniform, seq::SliceRandom, Rng};

use crate::{schema::{SetInfo, PERCENT_F}, datafile::DatafileSet};

const MIN_SET_LENGTH: usize = 100;

struct GenContext {
    pub density: f64,
    pub selectivity: f64,
    pub max_len: usize,
    pub skewness_factor: u32,
}

impl From<&SetInfo> for GenContext {
    fn from(props: &SetInfo) -> Self {
        Self {
            density:     props.density     as f64 / PERCENT_F,
            selectivity: props.selectivity as f64 / PERCENT_F,
            max_len: 1 << props.max_len,
            skewness_factor: props.skewness_factor,
        }
    }
}

/// Generates a sorted pair `(small, large)` with the requested length, skew,
/// density and selectivity. Values are uniform over `0..max_value` where
/// `max_value` follows from the density of the large set.
pub fn gen_twoset<R: Rng>(rng: &mut R, props: &SetInfo) -> (DatafileSet, DatafileSet) {
    let gen: GenContext = props.into();

    let large_len = gen.max_len;
    let small_len = (large_len >> gen.skewness_factor.min(31)).max(1);

    if small_len < MIN_SET_LENGTH {
        warn_set_len(small_len);
    }

    let max_value = ((large_len as f64 / gen.density) as u64)
        .clamp(large_len as u64, u32::MAX as u64) as u32;

    let (target_shared_count, target_gen_count) =
        get_gen_counts(gen.selectivity, small_len, large_len);

    let (shared_count, gen_count) = if target_gen_count > max_value as usize {
        let shared_count = small_len + large_len - max_value as usize;
        warn_selectivity(shared_count, small_len, gen.selectivity, gen.density);
        (shared_count, max_value as usize)
    }
    else {
        (target_shared_count, target_gen_count)
    };

    let values = shuffled_set(rng, gen_count, max_value);

    let (shared, unshared) = values.split_at(shared_count);
    let (only_small, only_large) = unshared.split_at(small_len - shared_count);

    let mut small = [shared, only_small].concat();
    let mut large = [shared, only_large].concat();
    small.sort_unstable();
    large.sort_unstable();

    assert!(small.len() == small_len);
    assert!(large.len() == large_len);

    (small, large)
}

fn get_gen_counts(
    selectivity: f64,
    small_len: usize,
    large_len: usize) -> (usize, usize)
{
    let shared_count = ((selectivity * small_len as f64) as usize).min(small_len);
    let different_count = small_len + large_len - 2*shared_count;
    let gen_count = shared_count + different_count;
    (shared_count, gen_count)
}

/// Returns `result_len` distinct values from `0..max_value` in random order.
fn shuffled_set<R: Rng>(rng: &mut R, result_len: usize, max_value: u32) -> Vec<u32> {
    // if gen_count is <50% of domain
    let low_density = result_len * 2 < max_value as usize;
    if low_density {
        let distribution = Uniform::from(0..max_value);

        let mut items: Vec<u32> = Vec::new();
        while items.len() < result_len {
            let need = result_len - items.len();
            items.extend(rng.sample_iter(distribution).take(need * 2));
            items.sort_unstable();
            items.dedup();
        }
        items.shuffle(rng);
        items.truncate(result_len);
        items
    }
    else {
        let mut everything: Vec<u32> = (0..max_value).collect();
        everything.shuffle(rng);
        everything.truncate(result_len);
        everything
    }
}

#[cfg(debug_assertions)]
fn warn_selectivity(
    shared_count: usize,
    small_len: usize,
    target_selectivity: f64,
    density: f64)
{
    let actual_selectivity = shared_count as f64 / small_len as f64;
    let warning = format!(
        "\nwarning: target selectivity {:.2} \
        is unachievable with density {:.2}\n(minimum selectivity {:.2})",
        target_selectivity, density, actual_selectivity
    );
    println!("{}", warning.yellow());
}

#[cfg(not(debug_assertions))]
fn warn_selectivity(
    _shared_count: usize,
    _small_len: usize,
    _target_selectivity: f64,
    _density: f64) {}

fn warn_set_len(len: usize) {
    println!("{}", format!(
        "warning: smallest set is of length {}",
        len).yellow());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PERCENT;
    use rand::{rngs::StdRng, SeedableRng};
    use postings::intersect::{run_2set, scalar_merge};

    fn props(density: u32, selectivity: u32, max_len: u32, skewness_factor: u32) -> SetInfo {
        SetInfo { density, selectivity, max_len, skewness_factor }
    }

    fn strictly_increasing(set: &[u32]) -> bool {
        set.windows(2).all(|w| w[0] < w[1])
    }

    #[test]
    fn twoset_lengths_and_selectivity() {
        let rng = &mut StdRng::seed_from_u64(7);
        let (small, large) = gen_twoset(rng, &props(100, 2500, 12, 2));

        assert_eq!(large.len(), 4096);
        assert_eq!(small.len(), 1024);
        assert!(strictly_increasing(&small));
        assert!(strictly_increasing(&large));
        assert_eq!(run_2set(&small, &large, scalar_merge).len(), 256);
    }

    #[test]
    fn twoset_dense_domain() {
        let rng = &mut StdRng::seed_from_u64(11);
        let (small, large) = gen_twoset(rng, &props(PERCENT, 0, 8, 0));

        assert_eq!(small.len(), 256);
        assert_eq!(large.len(), 256);
        assert!(large.iter().all(|&v| v < 256));
        assert!(strictly_increasing(&small));
    }

    #[test]
    fn shuffled_set_is_distinct() {
        let rng = &mut StdRng::seed_from_u64(3);
        let mut set = shuffled_set(rng, 500, 100_000);
        set.sort_unstable();
        set.dedup();
        assert_eq!(set.len(), 500);
        assert!(set.iter().all(|&v| v < 100_000));
    }
}
