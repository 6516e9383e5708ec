use std::collections::HashMap;
use std::env;
use std::fs;

use crate::backend::{FileBackend, MemoryBackend, PersistenceBackend, SheetBackend};
use crate::calendar::MonthSpan;
use crate::models::desk::{DeskCatalog, TeamRoster};
use crate::store::FlushPolicy;

#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, String> {
        let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(format!("Invalid config line {}: {}", idx + 1, line));
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if (value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\''))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    /// Config file value if present, else the environment variable.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .cloned()
            .or_else(|| env::var(key).ok())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

const DEFAULT_YEAR: i32 = 2025;
const DEFAULT_MONTH: u32 = 5;
const DEFAULT_PORT: u16 = 3030;
const DEFAULT_BOOKINGS_FILE: &str = "./data/bookings.json";

const DEFAULT_DESKS: [&str; 5] = [
    "Bianca's Office",
    "Manuel's Desk",
    "Ioana's Desk",
    "Ecaterina's Desk",
    "Dana's Desk",
];

const DEFAULT_TEAM: [&str; 7] = [
    "Bianca", "Barry", "Manuel", "Catarina", "Ecaterina", "Dana", "Audun",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendChoice {
    Memory,
    File { path: String },
    Sheet { url: String, token: Option<String> },
}

/// Typed settings resolved from the config file and environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub year: i32,
    pub first_month: u32,
    pub last_month: u32,
    pub desks: Vec<String>,
    pub desk_defaults: Vec<(String, String)>,
    pub team: Vec<String>,
    pub backend: BackendChoice,
    pub flush_policy: FlushPolicy,
    pub port: u16,
}

impl Settings {
    pub fn resolve(config: &AppConfig) -> Result<Self, String> {
        let year = match config.get("YEAR") {
            Some(raw) => raw
                .parse::<i32>()
                .map_err(|_| format!("YEAR must be a number, got '{}'", raw))?,
            None => DEFAULT_YEAR,
        };

        let (first_month, last_month) = match config.get("MONTHS") {
            Some(raw) => parse_months(&raw)?,
            None => (DEFAULT_MONTH, DEFAULT_MONTH),
        };

        let desks = match config.get("DESKS") {
            Some(raw) => parse_list(&raw),
            None => DEFAULT_DESKS.iter().map(|d| d.to_string()).collect(),
        };
        if desks.is_empty() {
            return Err("DESKS must name at least one desk".to_string());
        }

        let desk_defaults = match config.get("DESK_DEFAULTS") {
            Some(raw) => parse_pairs(&raw)?,
            None => Vec::new(),
        };

        let team = match config.get("TEAM") {
            Some(raw) => parse_list(&raw),
            None => DEFAULT_TEAM.iter().map(|m| m.to_string()).collect(),
        };

        let backend = match config.get("BACKEND").as_deref() {
            None | Some("file") => BackendChoice::File {
                path: config
                    .get("BOOKINGS_FILE")
                    .unwrap_or(DEFAULT_BOOKINGS_FILE.to_string()),
            },
            Some("memory") => BackendChoice::Memory,
            Some("sheet") => BackendChoice::Sheet {
                url: config
                    .get("SHEET_URL")
                    .ok_or("SHEET_URL must be set for the sheet backend".to_string())?,
                token: config.get("SHEET_TOKEN"),
            },
            Some(other) => {
                return Err(format!(
                    "BACKEND must be memory, file or sheet, got '{}'",
                    other
                ));
            }
        };

        let flush_policy = match config.get("FLUSH_POLICY").as_deref() {
            None | Some("explicit") => FlushPolicy::Explicit,
            Some("per_edit") => FlushPolicy::PerEdit,
            Some(other) => {
                return Err(format!(
                    "FLUSH_POLICY must be per_edit or explicit, got '{}'",
                    other
                ));
            }
        };

        let port = match config.get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| format!("PORT must be a number, got '{}'", raw))?,
            None => DEFAULT_PORT,
        };

        let settings = Self {
            year,
            first_month,
            last_month,
            desks,
            desk_defaults,
            team,
            backend,
            flush_policy,
            port,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), String> {
        let roster = self.roster();
        for (label, member) in &self.desk_defaults {
            if !self.desks.iter().any(|d| d == label) {
                return Err(format!("DESK_DEFAULTS names unknown desk '{}'", label));
            }
            if !roster.contains(member) {
                return Err(format!(
                    "DESK_DEFAULTS assigns unknown member '{}' to '{}'",
                    member, label
                ));
            }
        }
        MonthSpan::new(self.year, self.first_month, self.last_month)?;
        Ok(())
    }

    pub fn span(&self) -> MonthSpan {
        // Validated in resolve()
        MonthSpan::new(self.year, self.first_month, self.last_month)
            .expect("month span validated at startup")
    }

    pub fn catalog(&self) -> DeskCatalog {
        let mut catalog = DeskCatalog::new(self.desks.clone());
        for (label, member) in &self.desk_defaults {
            catalog.set_default_occupant(label, member);
        }
        catalog
    }

    pub fn roster(&self) -> TeamRoster {
        TeamRoster::new(self.team.clone())
    }

    pub fn make_backend(&self) -> Result<Box<dyn PersistenceBackend>, String> {
        match &self.backend {
            BackendChoice::Memory => Ok(Box::new(MemoryBackend::new())),
            BackendChoice::File { path } => Ok(Box::new(FileBackend::new(path))),
            BackendChoice::Sheet { url, token } => {
                let backend =
                    SheetBackend::new(url.clone(), token.clone()).map_err(|e| e.to_string())?;
                Ok(Box::new(backend))
            }
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_pairs(raw: &str) -> Result<Vec<(String, String)>, String> {
    raw.split(',')
        .filter(|item| !item.trim().is_empty())
        .map(|item| {
            item.split_once('=')
                .map(|(label, member)| (label.trim().to_string(), member.trim().to_string()))
                .ok_or(format!("Invalid DESK_DEFAULTS entry '{}'", item.trim()))
        })
        .collect()
}

fn parse_months(raw: &str) -> Result<(u32, u32), String> {
    let parse = |value: &str| {
        value
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("MONTHS must be like '5' or '5-8', got '{}'", raw))
    };
    match raw.split_once('-') {
        Some((first, last)) => Ok((parse(first)?, parse(last)?)),
        None => {
            let month = parse(raw)?;
            Ok((month, month))
        }
    }
}
