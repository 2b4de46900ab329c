use std::{
    error::Error,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use hydronet::{
    config::Suite,
    metrics,
    models::Model,
    nn::Module,
    tensor::{try_shape, Tensor},
};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build every model of a suite and run it on a random batch.
    Forward {
        /// TOML suite listing the models.
        #[arg(long)]
        config: PathBuf,
        /// Number of sequences in the batch.
        #[arg(long, default_value_t = 4)]
        batch: usize,
        /// Number of time steps per sequence.
        #[arg(long, default_value_t = 30)]
        steps: usize,
    },
    /// Score predictions against observations read from a CSV file.
    Score {
        /// File with `observed` and `predicted` columns.
        pairs: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
struct Pair {
    observed: f64,
    predicted: f64,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    match Args::parse().command {
        Command::Forward {
            config,
            batch,
            steps,
        } => forward(&config, batch, steps),
        Command::Score { pairs } => score(&pairs),
    }
}

fn forward(config: &Path, batch: usize, steps: usize) -> Result<(), Box<dyn Error>> {
    let suite = Suite::load(config)?;
    let seed = suite.seed.unwrap_or_default();
    info!("running {} models with seed {}", suite.models.len(), seed);
    let mut rng = StdRng::seed_from_u64(seed);
    for model_config in &suite.models {
        let model = Model::<f32>::new(model_config, &mut rng)?;
        let shape = try_shape(&[batch, steps, model_config.input_dim])?;
        let data: Vec<f32> = (&mut rng)
            .sample_iter(StandardNormal)
            .take(batch * steps * model_config.input_dim)
            .collect();
        let xs = Tensor::new(&shape, &data)?;
        let ys = model.forward(&xs)?;
        println!(
            "{}: {} parameters, output {:?}",
            model.name(),
            model.parameter_count(),
            ys.dims()
        );
    }
    Ok(())
}

fn score(pairs: &Path) -> Result<(), Box<dyn Error>> {
    let mut reader = csv::Reader::from_path(pairs)?;
    let (observed, predicted): (Vec<f64>, Vec<f64>) = reader
        .deserialize()
        .map(|record| record.map(|Pair { observed, predicted }| (observed, predicted)))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .unzip();
    info!("scoring {} pairs from {}", observed.len(), pairs.display());
    let scores = metrics::evaluate(&observed, &predicted)?;
    println!("NSE: {:.4}", scores.nse);
    println!("KGE: {:.4}", scores.kge);
    Ok(())
}
