use std::fs;

use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use inquire::{Select, Text};

use crate::calendar::WEEKDAY_ABBR;
use crate::export;
use crate::models::booking::BookingKey;
use crate::store::{BookingStore, FlushMode, FlushPolicy};

#[derive(Parser)]
#[command(name = "deskbook", about = "Desk booking calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the booking calendar for the configured months
    Show,
    /// Book a desk for a team member on a date
    Book {
        date: NaiveDate,
        /// Desk position (1-based) or desk label
        desk: String,
        member: String,
    },
    /// Clear a booking back to the desk's default
    Clear {
        date: NaiveDate,
        /// Desk position (1-based) or desk label
        desk: String,
    },
    /// Book a desk interactively
    BookPrompt,
    /// Persist pending changes to the backend
    Flush {
        /// Replace the whole backend content instead of appending changes
        #[arg(long)]
        full: bool,
    },
    /// Re-read the backend, keeping pending local edits
    Sync,
    /// Write the booking summary CSV
    Export {
        /// Destination file; prints to stdout when omitted
        #[arg(long)]
        output: Option<String>,
    },
}

pub fn cli(store: &mut BookingStore) {
    // Fine to panic here
    let cli = Cli::parse();
    match &cli.command {
        Commands::Show => show(store),
        Commands::Book { date, desk, member } => book(store, *date, desk, member),
        Commands::Clear { date, desk } => clear(store, *date, desk),
        Commands::BookPrompt => {
            if let Err(e) = book_from_prompt(store) {
                println!("Failed to book from prompt: {}", e);
            }
        }
        Commands::Flush { full } => {
            let mode = if *full {
                FlushMode::Full
            } else {
                FlushMode::Incremental
            };
            match store.flush(mode) {
                Ok(written) => println!("Flushed {} record(s)", written),
                Err(e) => println!("Failed to flush bookings: {}", e),
            }
        }
        Commands::Sync => match store.load() {
            Ok(summary) => println!(
                "Synced: {} applied, {} skipped, {} kept local",
                summary.applied, summary.skipped, summary.kept_local
            ),
            Err(e) => println!("Failed to sync bookings: {}", e),
        },
        Commands::Export { output } => export_csv(store, output.as_deref()),
    }
}

fn book(store: &mut BookingStore, date: NaiveDate, desk: &str, member: &str) {
    let Some(position) = resolve_desk(store, desk) else {
        println!("Unknown desk '{}'", desk);
        return;
    };
    let key = BookingKey::new(date, position);
    match store.set_occupant(key, member) {
        Ok(()) => report_pending(store, &format!("Booked {} for {}", key, member)),
        Err(e) => println!("Failed to book desk: {}", e),
    }
}

fn clear(store: &mut BookingStore, date: NaiveDate, desk: &str) {
    let Some(position) = resolve_desk(store, desk) else {
        println!("Unknown desk '{}'", desk);
        return;
    };
    let default = store
        .catalog()
        .by_position(position)
        .map(|d| d.default_occupant().to_string())
        .unwrap_or_default();
    let key = BookingKey::new(date, position);
    match store.set_occupant(key, &default) {
        Ok(()) => report_pending(store, &format!("Cleared {}", key)),
        Err(e) => println!("Failed to clear booking: {}", e),
    }
}

fn export_csv(store: &BookingStore, output: Option<&str>) {
    let snapshot = store.export_snapshot();
    match export::to_csv(&snapshot) {
        Ok(csv) => match output {
            Some(path) => match fs::write(path, &csv) {
                Ok(()) => println!("Wrote {} row(s) to {}", snapshot.len(), path),
                Err(e) => println!("Failed to write {}: {}", path, e),
            },
            None => print!("{}", csv),
        },
        Err(e) => println!("Failed to export bookings: {}", e),
    }
}

fn book_from_prompt(store: &mut BookingStore) -> Result<(), Box<dyn std::error::Error>> {
    let date_text = Text::new("Date (YYYY-MM-DD):").prompt()?;
    let date: NaiveDate = date_text.trim().parse()?;
    let labels: Vec<String> = store.catalog().iter().map(|d| d.label.clone()).collect();
    let desk = Select::new("Desk:", labels).prompt()?;
    let member = Select::new("Booked by:", store.roster().members().to_vec()).prompt()?;
    book(store, date, &desk, &member);
    Ok(())
}

fn resolve_desk(store: &BookingStore, raw: &str) -> Option<u32> {
    if let Ok(position) = raw.parse::<u32>() {
        return store.catalog().by_position(position).map(|d| d.position);
    }
    store.catalog().by_label(raw).map(|d| d.position)
}

fn report_pending(store: &BookingStore, message: &str) {
    println!("{}", message);
    if store.policy() == FlushPolicy::Explicit && store.dirty_count() > 0 {
        println!(
            "{} pending change(s); run 'deskbook flush' to save",
            store.dirty_count()
        );
    }
}

fn show(store: &BookingStore) {
    let span = *store.span();
    for month in span.months() {
        println!("== {}-{:02} ==", span.year, month);
        for day in span.days().into_iter().filter(|d| d.month() == month) {
            let weekday = WEEKDAY_ABBR[day.weekday().num_days_from_monday() as usize];
            println!("{} {}", weekday, day);
            for desk in store.catalog().iter() {
                let key = BookingKey::new(day, desk.position);
                let occupant = store.occupant(&key).unwrap_or("");
                if occupant.is_empty() {
                    println!("  {}: -", desk.label);
                } else {
                    println!("  {}: {}", desk.label, occupant);
                }
            }
        }
    }
}
