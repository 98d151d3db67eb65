use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::Parser;
use wxhist_core::{App, AppError, Config, LookupRequest, WeatherReport};
use wxhist_form::FormInput;
use wxhist_weather::{Coordinates, DailyRecord};

/// Daily weather history for a place and date range.
#[derive(Debug, Parser)]
#[command(name = "wxhist", version, about)]
struct Cli {
    /// First day, YYYY-MM-DD (default: yesterday)
    #[arg(long)]
    start: Option<String>,

    /// Last day, YYYY-MM-DD (default: yesterday)
    #[arg(long)]
    end: Option<String>,

    /// Place to search for
    #[arg(long)]
    location: Option<String>,

    /// Pick this place id from the search results
    #[arg(long, requires = "location")]
    place_id: Option<String>,

    /// Latitude; skips the place search
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude; skips the place search
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Config file (default: the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn request(&self) -> LookupRequest {
        let mut input = FormInput::with_defaults(Local::now().date_naive());
        if let Some(start) = &self.start {
            input.start_date = Some(start.clone());
        }
        if let Some(end) = &self.end {
            input.end_date = Some(end.clone());
        }
        input.location = self.location.clone();

        let coordinates = self.lat.zip(self.lon).map(|(lat, lon)| Coordinates::new(lat, lon));
        input.use_location_api = coordinates.is_some() || self.place_id.is_some();

        LookupRequest {
            input,
            place_id: self.place_id.clone(),
            coordinates,
        }
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }
}

async fn run(cli: &Cli) -> Result<WeatherReport, AppError> {
    let app = App::new(cli.load_config()?)?;
    app.lookup(&cli.request()).await
}

fn render(report: &WeatherReport) {
    let weather = &report.weather;
    let units = &weather.units;

    println!("{} ({})", report.location, report.coordinates);
    println!(
        "{} to {}, {} day(s)",
        report.form.start_date_text(),
        report.form.end_date_text(),
        report.form.day_count()
    );
    println!();
    println!(
        "{:<12} {:>12} {:>14} {:>14}",
        "Date",
        format!("Temp ({})", units.temperature),
        "Sunshine (h)",
        format!("Precip ({})", units.precipitation)
    );

    let rows: HashMap<NaiveDate, &DailyRecord> =
        weather.days.iter().map(|day| (day.date, day)).collect();
    let range = report.form.range();
    if rows.len() != report.form.day_count() {
        tracing::warn!(
            "Archive returned {} of {} days",
            rows.len(),
            report.form.day_count()
        );
    }

    for date in range.days() {
        let day = rows.get(&date);
        println!(
            "{:<12} {:>12} {:>14} {:>14}",
            date.to_string(),
            cell(day.and_then(|d| d.temperature_mean)),
            cell(day.and_then(|d| d.sunshine_hours())),
            cell(day.and_then(|d| d.precipitation_sum))
        );
    }

    let summary = weather.summary();
    println!();
    println!(
        "{:<12} {:>12} {:>14} {:>14}",
        "Total/mean",
        cell(summary.mean_temperature),
        cell(summary.total_sunshine_hours),
        cell(summary.total_precipitation)
    );
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = wxhist_core::init() {
        eprintln!("{e}");
    }

    match run(&cli).await {
        Ok(report) => {
            render(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            if let Some(errors) = err.field_errors() {
                for error in errors {
                    eprintln!("{}: {}", error.path.label(), error.message);
                }
                return ExitCode::from(2);
            }
            tracing::error!("Lookup failed: {err}");
            eprintln!("{}", err.user_message());
            ExitCode::FAILURE
        }
    }
}
