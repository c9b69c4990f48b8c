//! rpaper - Browse and book reservations from the terminal

use anyhow::{Context, Result};
use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone,
};
use clap::{Parser, Subcommand};
use librpaper::app::{ActionCreators, AppState, Store};
use librpaper::logging::LoggingConfig;
use librpaper::types::{Filter, Record, RecordError, RecordForm, Thing};
use librpaper::{Config, RpaperError, Transport};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "rpaper")]
#[command(version, about = "Browse and book reservations of a thing")]
#[command(long_about = r#"Browse and book reservations of a bookable thing.

EXAMPLES:
    # Show a thing
    rpaper thing abc12345

    # List its records, optionally narrowed to a year, month or day
    rpaper records abc12345
    rpaper records abc12345 --year 2017 --month 4
    rpaper records abc12345 --year 2017 --month 4 --date 1

    # Book it
    rpaper reserve abc12345 --name Alice --contact alice@example.com \
        --start-at "2017-04-01 09:00" --end-at "2017-04-01 10:00"

    # JSON output for scripting
    rpaper records abc12345 --year 2017 --format json | jq '.[].name'

CONFIGURATION:
    Read from $RPAPER_CONFIG or ~/.config/rpaper/config.toml:

        [api]
        base_url = "https://rpaper.example.com"

EXIT CODES:
    0 - Success
    1 - Request or configuration failed
    3 - Invalid input (rejected locally, by the server, or overlapping
        an existing reservation)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to $RPAPER_CONFIG or ~/.config/rpaper/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the API base URL from the config
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a thing
    Thing {
        /// Thing ID
        id: String,
    },

    /// List the records of a thing
    Records {
        /// Thing ID
        id: String,

        /// Only records in this year
        #[arg(long)]
        year: Option<i32>,

        /// Only records in this month (needs --year)
        #[arg(long)]
        month: Option<u32>,

        /// Only records on this day of the month (needs --year and --month)
        #[arg(long)]
        date: Option<u32>,
    },

    /// Reserve a thing
    Reserve {
        /// Thing ID
        id: String,

        /// Name of the person reserving
        #[arg(long)]
        name: String,

        /// How to reach them
        #[arg(long)]
        contact: String,

        #[arg(long, default_value = "")]
        remarks: String,

        /// Start time (RFC 3339 or "YYYY-MM-DD HH:MM" local time)
        #[arg(long, value_name = "TIME")]
        start_at: String,

        /// End time (RFC 3339 or "YYYY-MM-DD HH:MM" local time)
        #[arg(long, value_name = "TIME")]
        end_at: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.verbose).init();

    tracing::debug!("rpaper started with args: {:?}", cli);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", render_error(&e));
        let code = e
            .downcast_ref::<RpaperError>()
            .map(RpaperError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let json = cli.format == "json";

    // Reject bad input before touching config or network
    let form = match &cli.command {
        Command::Reserve {
            name,
            contact,
            remarks,
            start_at,
            end_at,
            ..
        } => Some(build_form(name, contact, remarks, start_at, end_at)?),
        _ => None,
    };

    let creators = connect(&cli)?;

    match cli.command {
        Command::Thing { id } => {
            let thing = creators.fetch_thing(&id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&thing)?);
            } else {
                print_thing(&thing);
            }
        }
        Command::Records {
            id,
            year,
            month,
            date,
        } => {
            let filter = Filter { year, month, date };
            creators.set_filter(filter);
            creators.fetch_records(&id, filter).await?;

            let state = creators.store().state();
            if json {
                println!("{}", serde_json::to_string_pretty(&state.thing.records.items)?);
            } else {
                print_records(&state.thing.records.items);
            }
        }
        Command::Reserve { id, .. } => {
            let form = form.context("reservation form missing")?;
            check_collisions(&creators, &id, &form).await?;

            match creators.post_record(&id, &form).await {
                Ok(record) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&record)?);
                    } else {
                        println!("Reserved {} ({})", record.timespan_display(), record.id);
                        if let Some(credential) = record.credential {
                            println!("Credential: {}", credential);
                        }
                    }
                }
                Err(e) => {
                    let state = creators.store().state();
                    report_record_errors(&state, json)?;
                    if is_validation_rejection(&e) {
                        return Err(
                            RpaperError::InvalidInput(describe_errors(&state.error.record)).into(),
                        );
                    }
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

fn connect(cli: &Cli) -> Result<ActionCreators> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load_or_default(),
    }
    .context("Failed to load configuration")?;

    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }

    let transport = Transport::from_config(&config.api).map_err(RpaperError::from)?;
    tracing::debug!(base_url = transport.base_url(), "Using API");
    let store = Arc::new(Store::new());
    Ok(ActionCreators::new(store, transport))
}

/// Build and validate a reservation form from command line input
fn build_form(
    name: &str,
    contact: &str,
    remarks: &str,
    start_at: &str,
    end_at: &str,
) -> std::result::Result<RecordForm, RpaperError> {
    let form = RecordForm {
        name: name.to_string(),
        contact: contact.to_string(),
        remarks: remarks.to_string(),
        start_at: parse_time(start_at)?,
        end_at: parse_time(end_at)?,
    };

    let errors = form.validate();
    if !errors.is_empty() {
        return Err(RpaperError::InvalidInput(describe_errors(&errors)));
    }
    Ok(form)
}

/// Parse a time argument into the RFC 3339 form sent to the API
///
/// Accepts RFC 3339 as is, or `YYYY-MM-DD HH:MM` in local time.
fn parse_time(input: &str) -> std::result::Result<String, RpaperError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.to_rfc3339_opts(SecondsFormat::Secs, false));
    }

    let naive = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .ok_or_else(|| {
            RpaperError::InvalidInput(format!(
                "Invalid time '{}'. Use RFC 3339 or YYYY-MM-DD HH:MM",
                input
            ))
        })?;

    let local = Local.from_local_datetime(&naive).earliest().ok_or_else(|| {
        RpaperError::InvalidInput(format!("'{}' does not exist in the local time zone", input))
    })?;

    Ok(local.to_rfc3339_opts(SecondsFormat::Secs, false))
}

/// Refuse to submit a record that overlaps one already booked on the days
/// it touches
///
/// The listing is best effort: if it cannot be fetched the server gets
/// the final word.
async fn check_collisions(creators: &ActionCreators, id: &str, form: &RecordForm) -> Result<()> {
    let (Ok(start_at), Ok(end_at)) = (
        DateTime::parse_from_rfc3339(&form.start_at),
        DateTime::parse_from_rfc3339(&form.end_at),
    ) else {
        return Ok(());
    };

    let mut existing = Vec::new();
    for day in touched_days(start_at, end_at) {
        let filter = Filter::for_date(day.year(), day.month(), day.day());
        match creators.fetch_records(id, filter).await {
            Ok(records) => existing.extend(records),
            Err(e) => {
                tracing::warn!(error = %e, "Could not check for overlapping records");
                return Ok(());
            }
        }
    }

    let candidate = Record {
        id: String::new(),
        name: form.name.clone(),
        contact: form.contact.clone(),
        remarks: form.remarks.clone(),
        start_at,
        end_at,
        credential: None,
    };

    if let Some(other) = existing.iter().find(|r| r.is_collided(&candidate)) {
        return Err(RpaperError::InvalidInput(format!(
            "Overlaps the reservation {} by {}",
            other.timespan_display(),
            other.name
        ))
        .into());
    }
    Ok(())
}

/// Local calendar days covered by `[start_at, end_at]`
fn touched_days(start_at: DateTime<FixedOffset>, end_at: DateTime<FixedOffset>) -> Vec<NaiveDate> {
    let first = start_at.with_timezone(&Local).date_naive();
    let last = end_at.with_timezone(&Local).date_naive();
    first
        .iter_days()
        .take_while(|day| *day <= last)
        .collect()
}

/// The server answered with field errors for the submitted form
fn is_validation_rejection(error: &RpaperError) -> bool {
    match error {
        RpaperError::Transport(e) => e.response().and_then(RecordError::from_response).is_some(),
        _ => false,
    }
}

/// Join the error chain, skipping causes already quoted by their wrapper
fn render_error(error: &anyhow::Error) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in error.chain() {
        let text = cause.to_string();
        if parts.last().is_some_and(|prev| prev.ends_with(&text)) {
            continue;
        }
        parts.push(text);
    }
    parts.join(": ")
}

fn describe_errors(errors: &RecordError) -> String {
    errors
        .fields()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
        .collect::<Vec<_>>()
        .join("; ")
}

fn report_record_errors(state: &AppState, json: bool) -> Result<()> {
    let errors = &state.error.record;
    if errors.is_empty() {
        return Ok(());
    }
    if json {
        println!("{}", serde_json::to_string_pretty(errors)?);
    } else {
        for (field, messages) in errors.fields() {
            for message in messages {
                eprintln!("  {}: {}", field, message);
            }
        }
    }
    Ok(())
}

fn print_thing(thing: &Thing) {
    println!("{} ({})", thing.name, thing.id);
    println!("  Owner: {}", thing.owner.username);
    if !thing.remarks.is_empty() {
        println!("  {}", thing.remarks);
    }
    if let Some(thumbnail) = &thing.thumbnail {
        println!("  Thumbnail: {}", thumbnail);
    }
}

fn print_records(records: &[Record]) {
    // Empty results print nothing
    for record in records {
        println!(
            "{} | {} | {}",
            record.timespan_display(),
            record.name,
            record.contact
        );
        if !record.remarks.is_empty() {
            println!("  {}", record.remarks);
        }
    }
}
