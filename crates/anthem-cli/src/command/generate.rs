use std::{f64::consts::TAU, path::PathBuf};

use anthem_features::FEATURE_NAMES;
use anthem_mapper::feature_space::{EntityDataset, EntityRecord};
use anyhow::Context;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use rand_pcg::Pcg32;

use crate::util::Output;

const RING_CENTER: f64 = 7.5;
const RING_RADIUS: f64 = 1.5;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GenerateArg {
    /// Number of entities on the ring
    #[arg(long, default_value_t = 40)]
    count: usize,
    /// Number of low-performing outliers
    #[arg(long, default_value_t = 4)]
    outliers: usize,
    /// Random seed
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &GenerateArg) -> anyhow::Result<()> {
    eprintln!(
        "Generating {} ring entities and {} outliers (seed {})...",
        arg.count, arg.outliers, arg.seed
    );
    let dataset = generate_dataset(arg.count, arg.outliers, arg.seed)?;
    Output::save_json(&dataset, arg.output.clone())?;
    Ok(())
}

/// Samples a synthetic entity set in the layout of the fight-song features.
///
/// Ring entities sit on a circle in the (energy, aggression) plane with a high win
/// percentage, so for most seeds their Mapper graph closes into a winning loop. Outliers are
/// low-energy, low-win entities scattered away from the ring.
#[expect(clippy::cast_precision_loss)]
fn generate_dataset(count: usize, outliers: usize, seed: u64) -> anyhow::Result<EntityDataset> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let jitter = Normal::new(0.0_f64, 0.15).context("Invalid jitter distribution")?;
    let win_noise = Normal::new(0.0_f64, 0.03).context("Invalid win distribution")?;
    let score = |value: f64| value.clamp(1.0, 10.0);

    let mut entities = Vec::with_capacity(count + outliers);
    for i in 0..count {
        let angle = TAU * i as f64 / count as f64;
        let energy = score(RING_CENTER + RING_RADIUS * angle.cos() + rng.sample(jitter));
        let aggression = score(RING_CENTER + RING_RADIUS * angle.sin() + rng.sample(jitter));
        let win = (0.66 + rng.sample(win_noise)).clamp(0.0, 1.0);
        entities.push(EntityRecord {
            id: format!("ring{i:03}").into(),
            label: None,
            features: vec![
                energy,
                win,
                aggression,
                score(4.0 + rng.sample(jitter)),
                score(5.0 + rng.sample(jitter)),
            ],
            win_percentage: win,
            spirit_score: (energy + aggression) / 2.0,
        });
    }
    for i in 0..outliers {
        let energy = rng.random_range(1.0..3.0);
        let aggression = rng.random_range(1.0..3.0);
        let win = rng.random_range(0.35..0.45);
        entities.push(EntityRecord {
            id: format!("outlier{i:02}").into(),
            label: None,
            features: vec![
                energy,
                win,
                aggression,
                rng.random_range(0.0..8.0),
                rng.random_range(1.0..10.0),
            ],
            win_percentage: win,
            spirit_score: (energy + aggression) / 2.0,
        });
    }

    Ok(EntityDataset {
        feature_names: FEATURE_NAMES.map(str::to_owned).to_vec(),
        entities,
    })
}
