use std::env;
use std::sync::Arc;

use deskbook::cli;
use deskbook::config::{AppConfig, Settings};
use deskbook::server;
use deskbook::store::BookingStore;

const DEFAULT_RUN_MODE: &str = "cli";

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match env::var("CONFIG_FILE") {
        Ok(path) => AppConfig::from_file(&path).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    };

    let settings = Settings::resolve(&config).expect("Invalid booking configuration.");
    let backend = settings
        .make_backend()
        .expect("Unable to set up booking backend.");
    let mut store = BookingStore::new(
        settings.catalog(),
        settings.roster(),
        settings.span(),
        backend,
        settings.flush_policy,
    );

    // A dead backend only costs historical visibility; the calendar still
    // renders with defaults.
    if let Err(e) = store.load() {
        eprintln!(
            "Could not load existing bookings ({}); starting from defaults",
            e
        );
    }

    let run_mode = config
        .get("RUN_MODE")
        .unwrap_or(DEFAULT_RUN_MODE.to_string());
    if run_mode == "api" {
        let shared_store = Arc::new(tokio::sync::Mutex::new(store));
        let runtime = tokio::runtime::Runtime::new().expect("Unable to start server runtime.");
        runtime.block_on(server::run_api(shared_store, settings.port));
    } else if run_mode == "cli" {
        cli::cli(&mut store);
    } else {
        println!("Invalid run mode {}", run_mode);
    }
}
