use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use covid19_api::{
    Covid19Client, DailyReportBatch, Region, SeriesKind, TimeSeriesBatch, TimeSeriesRecord,
};
use dotenv::dotenv;
use std::env;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Override the API base URL (falls back to $COVID19_API_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Seconds to wait before retrying a rate-limited request
    #[arg(long, default_value = "60")]
    retry_sleep: u64,

    /// Number of records to print from each batch
    #[arg(long, default_value = "2")]
    show: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Daily reports for one month, e.g. `reports --month 2020-09`
    Reports {
        #[arg(long)]
        month: String,
    },
    /// Time series for a kind (deaths, confirmed, recovered) and region (us, global)
    Series {
        #[arg(long, default_value = "deaths")]
        kind: SeriesKind,
        #[arg(long, default_value = "global")]
        region: Region,
    },
    /// Exchange $COVID19_API_USERNAME / $COVID19_API_PASSWORD for a token and print it
    Token,
}

fn parse_month(month: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .with_context(|| format!("invalid month {month:?}, expected YYYY-MM"))
}

fn credentials() -> anyhow::Result<(String, String)> {
    let username = env::var("COVID19_API_USERNAME").context("COVID19_API_USERNAME not set")?;
    let password = env::var("COVID19_API_PASSWORD").context("COVID19_API_PASSWORD not set")?;
    Ok((username, password))
}

fn base_url(args: &Args) -> Option<String> {
    args.base_url.clone().or_else(|| env::var("COVID19_API_URL").ok())
}

fn build_client(args: &Args) -> anyhow::Result<Covid19Client> {
    let mut client = Covid19Client::new(env::var("COVID19_API_TOKEN").unwrap_or_default());

    if let Some(url) = base_url(args) {
        client.set_base_url(url);
    }
    client.set_retry_sleep(Duration::from_secs(args.retry_sleep));

    if client.token().is_empty() {
        let (username, password) = credentials()
            .context("set COVID19_API_TOKEN or COVID19_API_USERNAME/COVID19_API_PASSWORD")?;
        client = client
            .authenticate(&username, &password)
            .context("Failed to exchange credentials for a token")?;
    }

    Ok(client)
}

fn print_reports(batch: &DailyReportBatch, month: NaiveDate, show: usize) {
    println!(
        "Got {} reports for {}",
        batch.reports.len(),
        month.format("%b %Y")
    );
    println!("Code: {}\nMessage: {}", batch.code, batch.message);
    for (index, report) in batch.reports.iter().take(show).enumerate() {
        println!("\nreport #{}: {:#?}", index + 1, report);
    }
}

// Largest count in the series and the date it was reported on
fn highest_count(record: &TimeSeriesRecord) -> Option<String> {
    record
        .counts
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(date, count)| format!("{count} ({date})"))
}

fn print_series(batch: &TimeSeriesBatch, kind: SeriesKind, region: Region, show: usize) {
    println!(
        "Got {} series for {} in {}",
        batch.records.len(),
        kind,
        region
    );
    println!("Code: {}\nMessage: {}", batch.code, batch.message);
    for (index, record) in batch.records.iter().take(show).enumerate() {

        println!(
            "\nseries #{}: {} / {} ({} dates, highest {})",
            index + 1,
            record.country_region,
            if record.province_state.is_empty() {
                "-"
            } else {
                record.province_state.as_str()
            },
            record.counts.len(),
            highest_count(record).unwrap_or_else(|| "n/a".to_string())
        );
    }
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    match &args.command {
        Command::Token => {
            let (username, password) = credentials()?;
            let mut client = Covid19Client::new(String::new());
            if let Some(url) = base_url(&args) {
                client.set_base_url(url);
            }
            let client = client.authenticate(&username, &password)?;
            println!("{}", client.token());
        }
        Command::Reports { month } => {
            let month = parse_month(month)?;
            let client = build_client(&args)?;
            info!(month = %month.format("%Y-%m"), "fetching daily reports");

            let batch = client
                .get_reports_at(&month)
                .context("Failed to fetch daily reports")?;
            if batch.reports.is_empty() {
                bail!("API returned no reports for {}", month.format("%b %Y"));
            }
            print_reports(&batch, month, args.show);
        }
        Command::Series { kind, region } => {
            let client = build_client(&args)?;
            info!(%kind, %region, "fetching time series");

            let batch = client
                .get_time_series(*kind, *region)
                .context("Failed to fetch time series")?;
            print_series(&batch, *kind, *region, args.show);
        }
    }

    Ok(())
}
