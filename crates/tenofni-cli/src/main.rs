use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use tenofni::ScrapeSession;
use tenofni::fetcher::{self, FetchConfig, HttpSource};
use tenofni::sink::{self, WriteMode};
use tenofni::utils::{self, DatasetStats, RunMetadata};

#[derive(Parser)]
#[command(name = "tenofni")]
#[command(about = "An infonet.fr company directory scraper", long_about = None)]
struct Cli {
    #[arg(
        long,
        default_value_t = 5,
        help = "Number of search result pages to scrape"
    )]
    max_pages: u32,

    #[arg(
        long,
        default_value = "data/scraped_data/companies.csv",
        help = "Output CSV path"
    )]
    out: PathBuf,

    #[arg(long, help = "Append to an existing CSV instead of overwriting it")]
    append: bool,

    #[arg(
        long,
        value_name = "URL",
        help = "Proxy URLs to rotate through; unreachable ones are dropped"
    )]
    proxy: Vec<String>,

    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = 30,
        help = "Per-request timeout"
    )]
    timeout: u64,

    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        help = "Set the logging level"
    )]
    log_level: LogLevel,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    // A failed run still exits cleanly; the message is for the
    // operator, and everything the run held is dropped on the way out.
    if let Err(e) = run(cli) {
        println!("Error during scraping: {}", e);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let proxies: Vec<String> = cli
        .proxy
        .into_iter()
        .filter(|proxy| {
            if fetcher::proxy_is_working(proxy) {
                true
            } else {
                log::warn!("Dropping unreachable proxy {}", proxy);
                false
            }
        })
        .collect();

    let config = FetchConfig {
        proxies,
        timeout: Duration::from_secs(cli.timeout),
        ..FetchConfig::default()
    };
    let source = HttpSource::new(config)?;
    let mut session = ScrapeSession::new(source);

    let dataset = session.scrape(cli.max_pages);
    let dataset = session.enrich(dataset);

    print!("{}", DatasetStats::from_records(&dataset));

    let mode = if cli.append {
        WriteMode::Append
    } else {
        WriteMode::Create
    };
    sink::save_to_csv(&dataset, &cli.out, mode)?;

    let metadata = RunMetadata::new(cli.max_pages, dataset.len());
    utils::save_metadata(&metadata, &cli.out.with_extension("meta.json"));

    println!("Successfully scraped {} companies!", dataset.len());
    Ok(())
}
