mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{cmd_inspect, cmd_query};

#[derive(Parser)]
#[command(name = "ip2loc")]
#[command(
    about = "Look up IP addresses in IP2Location BIN databases",
    long_about = "ip2loc - Embedded lookup engine for IP2Location-style range databases\n\n\
    Resolves IPv4 and IPv6 addresses to country, region, city, ISP, coordinates,\n\
    time zone and other attributes by binary-searching BIN database files.\n\n\
    Examples:\n\
      ip2loc query IP2LOCATION-LITE-DB11.BIN 8.8.8.8\n\
      ip2loc query /var/lib/ip2location 8.8.8.8 2001:4860::8888 --json\n\
      ip2loc query DB11.BIN 1.1.1.1 --fields country_code,city,latitude,longitude\n\
      ip2loc inspect IP2LOCATION-LITE-DB11.BIN\n\n\
    Set RUST_LOG=debug to trace database opening and searches."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query one or more addresses
    Query {
        /// Database file, or a directory searched recursively for *.bin files
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// IPv4 or IPv6 addresses to look up
        #[arg(value_name = "IP", required = true)]
        ips: Vec<String>,

        /// Fields to decode (comma-separated names, or "all")
        #[arg(short, long, default_value = "all")]
        fields: String,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,

        /// Read through a file handle instead of memory-mapping
        #[arg(long)]
        no_mmap: bool,
    },

    /// Show header metadata and supported fields of a database file
    Inspect {
        /// Database file
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Output metadata as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Query {
            database,
            ips,
            fields,
            json,
            no_mmap,
        } => cmd_query(database, ips, fields, json, no_mmap),
        Commands::Inspect { database, json } => cmd_inspect(database, json),
    }
}
