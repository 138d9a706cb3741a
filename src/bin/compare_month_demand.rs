use std::{error::Error, fs, fs::File, path::Path};

use clap::Parser;
use log::{info, warn};
use nem_demand::{
    config::{load_env_file, Config},
    db::prod_db::ProdDb,
    demand::{
        comparison::compare,
        projection::{self, average_by_calendar_day, project},
        reshape::actual_series,
    },
    interval::month::Month,
    plot::plot_comparison,
    report::{daily_table, summary_table, write_json},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Environment name, e.g., test, prod
    #[arg(short, long, default_value = "prod")]
    env: String,

    /// Month to compare against the history, e.g. 2020-04
    #[arg(short, long, default_value = "2020-04")]
    month: Month,

    /// Number of years of history before the month's year
    #[arg(long, value_parser = clap::value_parser!(i16).range(1..))]
    history_years: Option<i16>,

    /// Download again even if a cached file is fresh
    #[arg(long)]
    refresh: bool,

    /// Don't write the html chart
    #[arg(long)]
    no_plot: bool,

    /// Open the chart in a browser
    #[arg(long)]
    show: bool,
}

/// Compare one month of actual demand with the average of the previous years.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    load_env_file(&args.env);
    let mut config = Config::from_env()?;
    if let Some(n) = args.history_years {
        config.history_years = n;
    }
    fs::create_dir_all(&config.data_dir)?;
    let use_cached = !args.refresh;
    let month = args.month;

    // actuals for the month
    let monthly = ProdDb::aemo_price_and_demand(&config);
    monthly.download_file(&month, use_cached)?;
    let rows = monthly.read_file(&month)?;
    let actual = actual_series(&rows, &month)?;
    info!("Read {} actual half hours for {}", actual.len(), month);

    // history, averaged by calendar day
    let history = ProdDb::aemo_historical_demand(&config);
    let years = config.history_years_for(&month);
    history.ensure_years(&years, &monthly, use_cached)?;
    let mut days = Vec::new();
    for year in &years {
        days.extend(history.read_file(*year)?);
    }
    let calendar = average_by_calendar_day(&days);
    let calendar_path = config.projected_path(month.year());
    projection::write_csv(File::create(&calendar_path)?, &calendar)?;
    info!("Wrote projected calendar to {}", calendar_path);
    let projected = project(&calendar, &month)?;

    let comparison = compare(month, &projected, &actual);
    if comparison.unmatched_projected > 0 || comparison.unmatched_actual > 0 {
        warn!(
            "{} projected and {} actual half hours have no counterpart",
            comparison.unmatched_projected, comparison.unmatched_actual
        );
    }
    let csv_path = config.snapshot_path("comparison", &month, "csv");
    comparison.write_csv(&csv_path)?;
    info!("Wrote comparison to {}", csv_path);

    match comparison.summary() {
        Some(summary) => {
            println!("{}", summary_table(&summary));
            println!();
            println!("{}", daily_table(&comparison.daily()));
            let json_path = config.snapshot_path("summary", &month, "json");
            write_json(&json_path, &summary)?;
            info!("Wrote summary to {}", json_path);
        }
        None => warn!("No half hour of {} has both a projection and an actual", month),
    }

    if !args.no_plot {
        let title = format!(
            "{} demand, {}: actual vs average of {} previous years",
            config.region, month, config.history_years
        );
        let plot = plot_comparison(&comparison, &title);
        let html_path = config.snapshot_path("comparison", &month, "html");
        plot.write_html(Path::new(&html_path));
        info!("Wrote chart to {}", html_path);
        if args.show {
            plot.show();
        }
    }

    Ok(())
}
