//! Command-line entry point: read a T-Walk store, write diagnostic figures and print
//! the posterior summary with R-hat values.

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::info;

use twalk_reader::store::SampleStore;
use twalk_reader::{stats, Posterior, Schema, TWalk, TwalkError};

#[derive(Parser, Debug)]
#[command(name = "twalk-reader")]
#[command(about = "Summarise T-Walk MCMC output as equally weighted posterior samples")]
#[command(version)]
struct Cli {
    /// Sample store to read (.h5, .hdf5 or .csv)
    store: PathBuf,

    /// Group to read instead of the last one in the store
    #[arg(long)]
    group: Option<String>,

    /// Directory the figures are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Do not write any figures
    #[arg(long)]
    no_plots: bool,

    /// Also save the posterior table (.csv, .arrow or .parquet)
    #[arg(long)]
    export: Option<PathBuf>,
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Opens a store, dispatching on the file extension.
fn open_store(path: &Path) -> Result<Box<dyn SampleStore>, TwalkError> {
    match extension(path).as_str() {
        #[cfg(feature = "hdf5")]
        "h5" | "hdf5" => Ok(Box::new(twalk_reader::io::hdf5::Hdf5Store::open(path)?)),
        #[cfg(feature = "csv")]
        "csv" => Ok(Box::new(twalk_reader::io::csv::CsvStore::open(path)?)),
        other => Err(TwalkError::UnsupportedFormat(format!(
            "cannot read `.{other}` stores with this build"
        ))),
    }
}

/// Saves the posterior table, dispatching on the file extension.
fn export(posterior: &Posterior, path: &Path) -> Result<(), TwalkError> {
    match extension(path).as_str() {
        #[cfg(feature = "csv")]
        "csv" => twalk_reader::io::csv::save_csv(posterior, path),
        #[cfg(feature = "arrow")]
        "arrow" => twalk_reader::io::arrow::save_arrow(posterior, path),
        #[cfg(feature = "parquet")]
        "parquet" => twalk_reader::io::parquet::save_parquet(posterior, path),
        other => Err(TwalkError::UnsupportedFormat(format!(
            "cannot export to `.{other}` with this build"
        ))),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut schema = Schema::default();
    if let Some(group) = cli.group {
        schema = schema.with_group(group);
    }

    let posterior = {
        let twalk = TWalk::with_schema(open_store(&cli.store)?, schema)?;
        info!(
            "Reading group `{}` of {} ({} chains)",
            twalk.group(),
            cli.store.display(),
            twalk.n_chains()
        );
        twalk.to_posterior()?
    };

    #[cfg(feature = "plot")]
    {
        if !cli.no_plots {
            twalk_reader::plot::write_all(&posterior, &cli.output_dir)?;
        }
    }

    if let Some(path) = &cli.export {
        export(&posterior, path)?;
        info!("Saved posterior table to {}", path.display());
    }

    print!("{}", stats::summary_table(&stats::summarize(&posterior)));
    println!();
    for (name, r_hat) in stats::rhat_all(&posterior) {
        println!("r_hat {name}: {r_hat:.4}");
    }
    Ok(())
}
