use std::error::Error;

use clap::Parser;
use log::{error, info};
use nem_demand::{
    config::{load_env_file, Config},
    db::prod_db::ProdDb,
    interval::month::Month,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Environment name, e.g., test, prod
    #[arg(short, long, default_value = "prod")]
    env: String,

    /// First month to download, e.g. 2015-01
    #[arg(short, long)]
    start: Month,

    /// Last month to download, defaults to the first one
    #[arg(short = 'n', long)]
    end: Option<Month>,

    /// Make the yearly demand files for every complete year in the range
    #[arg(long)]
    years: bool,
}

/// Fill the cache with monthly price and demand files.  Always downloads.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    load_env_file(&args.env);
    let config = Config::from_env()?;
    let archive = ProdDb::aemo_price_and_demand(&config);

    let end = args.end.unwrap_or(args.start);
    let months = args
        .start
        .up_to(end)
        .ok_or_else(|| format!("End month {} is before start month {}", end, args.start))?;
    for month in &months {
        match archive.download_file(month, false) {
            Ok(path) => info!("Downloaded {} to {}", month, path.display()),
            Err(e) => error!("{} failed: {}", month, e),
        }
    }

    if args.years {
        let history = ProdDb::aemo_historical_demand(&config);
        for year in args.start.year()..=end.year() {
            let complete = months.iter().filter(|m| m.year() == year).count() == 12;
            if complete {
                history.make_year_file(year, &archive, true)?;
            }
        }
    }

    Ok(())
}
