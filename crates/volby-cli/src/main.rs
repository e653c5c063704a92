use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use volby::UnifiedTable;
use volby::request::DetailUrlTemplate;
use volby::scraper::WebScraper;
use volby::utils::{LocationFilter, ScrapeStats};

#[derive(Parser)]
#[command(name = "volby")]
#[command(about = "A volby.cz election results scraper", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
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

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
enum TableFormat {
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List the municipalities of a territorial unit
    List {
        #[arg(help = "URL of the territorial unit listing page")]
        url: String,

        #[arg(
            long,
            help = "Maximum number of locations to return",
            value_parser = clap::value_parser!(u16).range(1..)
        )]
        limit: Option<u16>,

        #[arg(
            long,
            help = "Number of locations to skip from the beginning",
            value_parser = clap::value_parser!(u16).range(1..)
        )]
        offset: Option<u16>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Scrape the results of every municipality of a territorial unit into one table
    Scrape {
        #[arg(help = "URL of the territorial unit listing page")]
        url: String,

        #[arg(help = "File to write the results table to")]
        output_file: PathBuf,

        #[arg(
            short = 'f',
            long = "format",
            value_enum,
            default_value = "csv",
            help = "Table format"
        )]
        format: TableFormat,

        #[arg(
            long,
            help = "Maximum number of locations to scrape",
            value_parser = clap::value_parser!(u16).range(1..)
        )]
        limit: Option<u16>,

        #[arg(
            long,
            help = "Number of locations to skip from the beginning",
            value_parser = clap::value_parser!(u16).range(1..)
        )]
        offset: Option<u16>,

        #[arg(
            short = 'c',
            long,
            default_value = "1",
            help = "Number of result pages fetched at once",
            value_parser = clap::value_parser!(u16).range(1..)
        )]
        concurrency: u16,
    },
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn write_table(table: &UnifiedTable, path: &Path, format: &TableFormat) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("Cannot create {}: {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);

    match format {
        TableFormat::Csv => table.write_csv(&mut writer).map_err(|e| e.to_string())?,
        TableFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, table).map_err(|e| e.to_string())?
        }
    }
    writer.flush().map_err(|e| e.to_string())
}

fn location_filter(limit: Option<u16>, offset: Option<u16>) -> LocationFilter {
    LocationFilter {
        limit: limit.map(usize::from),
        offset: offset.map(usize::from),
    }
    .validate()
    .unwrap_or_else(|e| {
        log::error!("Invalid args: {e}");
        process::exit(1);
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let scraper = WebScraper::new().unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    });

    match cli.command {
        Commands::List {
            url,
            limit,
            offset,
            format,
        } => {
            let filter = location_filter(limit, offset);

            let directory = scraper
                .fetch_location_directory(&url)
                .await
                .unwrap_or_else(|e| {
                    log::error!("Error fetching location directory: {}", e);
                    process::exit(1);
                });

            let directory = filter.apply(directory);

            match format {
                OutputFormat::Json => serialize_json(&directory),
                OutputFormat::Text => {
                    if directory.is_empty() {
                        println!("No locations to display.");
                    } else {
                        for location in &directory {
                            println!("{}", location);
                        }
                        println!("\nTotal: {}", directory.len());
                    }
                }
            }
        }

        Commands::Scrape {
            url,
            output_file,
            format,
            limit,
            offset,
            concurrency,
        } => {
            let filter = location_filter(limit, offset);

            log::info!("Downloading data from {}", url);

            let template = DetailUrlTemplate::from_listing_url(&url).unwrap_or_else(|e| {
                log::error!("Invalid listing URL: {}", e);
                process::exit(1);
            });

            let directory = scraper
                .fetch_location_directory(&url)
                .await
                .unwrap_or_else(|e| {
                    log::error!("Error fetching location directory: {}", e);
                    process::exit(1);
                });

            let directory = filter.apply(directory);

            let results = scraper
                .with_concurrency(usize::from(concurrency))
                .scrape_locations(&template, &directory)
                .await
                .unwrap_or_else(|e| {
                    log::error!("Error scraping locations: {}", e);
                    process::exit(1);
                });

            let table = UnifiedTable::from_results(&results);

            log::info!("Saving to {}", output_file.display());
            write_table(&table, &output_file, &format).unwrap_or_else(|e| {
                log::error!("Error writing results: {}", e);
                process::exit(1);
            });

            print!("{}", ScrapeStats::from_results(&results));
            log::info!("Done");
        }
    }
}
