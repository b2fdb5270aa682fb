//! Feeds synthetic T-Walk output through the reader and checks what the diagnostic
//! layer sees: R-hat close to one for walkers sampling the same target, well above
//! one when a walker is stuck elsewhere, and every figure written.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use twalk_reader::store::MemoryStore;
use twalk_reader::{stats, TWalk};

const SEED: u64 = 42;

/// Interleaves `n_per_chain` states for every walker, marks the first `burnin`
/// rounds invalid and gives every state a multiplicity between 1 and 3.
fn synthetic_run(offsets: &[f64], n_per_chain: usize, burnin: usize) -> MemoryStore {
    let mut rng = SmallRng::seed_from_u64(SEED);
    let (mut valid, mut chain, mut mult, mut mu, mut sigma) =
        (Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new());

    for round in 0..n_per_chain {
        for (c, offset) in offsets.iter().enumerate() {
            valid.push(if round < burnin { 0.0 } else { 1.0 });
            chain.push(c as f64);
            mult.push(rng.gen_range(1..=3) as f64);
            mu.push(offset + rng.sample::<f64, _>(StandardNormal));
            sigma.push(1.0 + 0.1 * rng.sample::<f64, _>(StandardNormal).abs());
        }
    }

    MemoryStore::new()
        .with_array("sampler", "chain_isvalid", valid)
        .with_array("sampler", "chain", chain)
        .with_array("sampler", "mult", mult)
        .with_array("sampler", "model::primary_parameters::mu", mu)
        .with_array("sampler", "model::primary_parameters::sigma", sigma)
}

#[test]
fn test_mixed_walkers_have_rhat_near_one() {
    let store = synthetic_run(&[0.0, 0.0, 0.0, 0.0], 500, 50);
    let posterior = TWalk::open(store).unwrap().to_posterior().unwrap();

    assert_eq!(posterior.n_chains(), 4);
    let mu = posterior.get("mu").unwrap();
    // 450 valid states per walker, each repeated at least once.
    assert!(mu.ncols() >= 450);

    let max = stats::max_rhat(&posterior).expect("R-hat should be defined");
    assert!(max < 1.05, "max R-hat too large: {max}");

    let rows = stats::summarize(&posterior);
    assert_eq!(rows.len(), 2);
    assert!(rows[0].mean.abs() < 0.2, "mean of mu: {}", rows[0].mean);
    assert!(rows[0].hdi_low < rows[0].mean && rows[0].mean < rows[0].hdi_high);
}

#[test]
fn test_stuck_walker_is_flagged() {
    let store = synthetic_run(&[0.0, 0.0, 0.0, 5.0], 300, 0);
    let posterior = TWalk::open(store).unwrap().to_posterior().unwrap();

    let rhat: Vec<(String, f64)> = stats::rhat_all(&posterior);
    assert_eq!(rhat[0].0, "mu");
    assert!(rhat[0].1 > 1.5, "R-hat of mu: {}", rhat[0].1);
    assert!(rhat[1].1 < 1.1, "R-hat of sigma: {}", rhat[1].1);
}

#[test]
fn test_summary_table_lists_every_parameter() {
    let store = synthetic_run(&[0.0, 0.0], 100, 10);
    let posterior = TWalk::open(store).unwrap().to_posterior().unwrap();
    let table = stats::summary_table(&stats::summarize(&posterior));

    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("r_hat"));
    assert!(lines[1].starts_with("mu"));
    assert!(lines[2].starts_with("sigma"));
}

#[cfg(feature = "plot")]
#[test]
fn test_write_all_figures() {
    let dir = tempfile::tempdir().expect("Could not create temp dir");
    let store = synthetic_run(&[0.0, 0.5], 60, 10);
    let posterior = TWalk::open(store).unwrap().to_posterior().unwrap();

    let written = twalk_reader::plot::write_all(&posterior, dir.path()).unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["trace.svg", "pair.svg", "posterior.svg", "autocorr.svg", "corner.svg"]
    );
    assert!(written.iter().all(|p| p.metadata().unwrap().len() > 0));
}
