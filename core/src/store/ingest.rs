//! Profile ingestion: CSV loading, column auto-heal, synthetic populations.
//!
//! Missing required columns are never an error. Each one is synthesized
//! row by row from the AutoHeal stream and logged once.
//! Malformed cells are never an error either: each is logged with its row
//! and column, then filled (numbers) or healed (labels). No row is dropped.

use super::{DataSource, ProfileStore};
use crate::{
    config::EngineConfig,
    error::EngineResult,
    profile::{DigitalAccess, OpportunityLevel, Profile, SettlementType},
    rng::{RngBank, StreamRng, StreamSlot},
    signals::{Signal, SignalVector},
    types::round1,
};
use csv::StringRecord;
use std::{
    collections::HashMap,
    io::Read,
    path::Path,
    str::FromStr,
};

pub const REQUIRED_COLUMNS: [&str; 16] = [
    "creation_output",
    "learning_behavior",
    "experience_consistency",
    "economic_activity",
    "innovation_problem_solving",
    "collaboration_community",
    "offline_capability",
    "digital_presence",
    "learning_hours",
    "projects",
    "state",
    "digital_access",
    "opportunity_level",
    "skill_score",
    "domain",
    "area_type",
];

const HISTORY_COLUMN: &str = "skill_history";

// Empty numeric cells.
const SIGNAL_FILL: f64 = 0.0;
const SKILL_FILL: f64 = 50.0;

// Synthesized value ranges, half-open.
const HEAL_SIGNAL_RANGE: (i64, i64) = (20, 90);
const HEAL_SKILL_RANGE: (i64, i64) = (30, 95);

impl ProfileStore {
    /// Load `path` if it exists, otherwise generate a synthetic population.
    pub fn load_or_synthesize(
        path: &Path,
        config: &EngineConfig,
        bank: &RngBank,
    ) -> EngineResult<Self> {
        if path.exists() {
            Self::load_csv(path, config, bank)
        } else {
            log::info!("No dataset at {}; generating synthetic data", path.display());
            Self::synthesize(config, bank)
        }
    }

    pub fn load_csv(path: &Path, config: &EngineConfig, bank: &RngBank) -> EngineResult<Self> {
        let file = std::fs::File::open(path)?;
        let profiles = read_profiles(file, config, bank)?;
        log::info!("Loaded {} profiles from {}", profiles.len(), path.display());
        Ok(Self::new(profiles, DataSource::File(path.display().to_string())))
    }

    /// Ingest CSV from any reader; the store is tagged as in-memory.
    pub fn from_csv_reader<R: Read>(
        reader: R,
        config: &EngineConfig,
        bank: &RngBank,
    ) -> EngineResult<Self> {
        let profiles = read_profiles(reader, config, bank)?;
        Ok(Self::from_profiles(profiles))
    }

    /// Generate `config.synthetic_population` profiles with trajectories.
    /// Fails only on a config with nothing to draw regions or domains from.
    pub fn synthesize(config: &EngineConfig, bank: &RngBank) -> EngineResult<Self> {
        config.validate()?;
        let mut rng = bank.for_stream(StreamSlot::Population);
        let profiles: Vec<Profile> = (0..config.synthetic_population)
            .map(|_| synthetic_profile(&mut rng, config))
            .collect();
        log::info!("Synthetic dataset created: {} profiles", profiles.len());
        Ok(Self::new(profiles, DataSource::Synthetic))
    }
}

// ── CSV ──────────────────────────────────────────────────────────────────────

struct ColumnMap {
    index: HashMap<String, usize>,
}

impl ColumnMap {
    fn new(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();
        Self { index }
    }

    fn has(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// `None` when the column is absent from the file.
    fn cell<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        self.index
            .get(column)
            .map(|&i| record.get(i).unwrap_or("").trim())
    }
}

fn read_profiles<R: Read>(
    reader: R,
    config: &EngineConfig,
    bank: &RngBank,
) -> EngineResult<Vec<Profile>> {
    config.validate()?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let columns = ColumnMap::new(rdr.headers()?);

    for column in REQUIRED_COLUMNS {
        if !columns.has(column) {
            log::warn!("Auto-healing missing column: {column}");
        }
    }

    let mut healer = Healer::new(bank.for_stream(StreamSlot::AutoHeal), config);
    let mut profiles = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        profiles.push(parse_row(&record, row, &columns, &mut healer));
    }
    Ok(profiles)
}

fn parse_row(
    record: &StringRecord,
    row: usize,
    columns: &ColumnMap,
    healer: &mut Healer,
) -> Profile {
    let mut signals = SignalVector::default();
    for signal in Signal::ALL {
        let value = match columns.cell(record, signal.column()) {
            Some(cell) => parse_number(cell, signal.column(), row).unwrap_or(SIGNAL_FILL),
            None => healer.signal(),
        };
        signals.set(signal, value);
    }

    let skill_score = match columns.cell(record, "skill_score") {
        Some(cell) => parse_number(cell, "skill_score", row).unwrap_or(SKILL_FILL),
        None => healer.skill_score(),
    };

    let region = match columns.cell(record, "state") {
        Some(cell) if !cell.is_empty() => cell.to_string(),
        _ => healer.region(),
    };
    let domain = match columns.cell(record, "domain") {
        Some(cell) if !cell.is_empty() => cell.to_string(),
        _ => healer.domain(),
    };

    let digital_access = match columns.cell(record, "digital_access") {
        Some(cell) if !cell.is_empty() => parse_label(cell, "digital_access", row),
        _ => None,
    }
    .unwrap_or_else(|| *healer.rng.choose(DigitalAccess::ALL));
    let opportunity_level = match columns.cell(record, "opportunity_level") {
        Some(cell) if !cell.is_empty() => parse_label(cell, "opportunity_level", row),
        _ => None,
    }
    .unwrap_or_else(|| *healer.rng.choose(OpportunityLevel::ALL));
    let settlement = match columns.cell(record, "area_type") {
        Some(cell) if !cell.is_empty() => parse_label(cell, "area_type", row),
        _ => None,
    }
    .unwrap_or_else(|| *healer.rng.choose(SettlementType::ALL));

    let skill_history = columns
        .cell(record, HISTORY_COLUMN)
        .filter(|cell| !cell.is_empty())
        .and_then(|cell| match serde_json::from_str::<Vec<f64>>(cell) {
            Ok(history) => Some(history),
            Err(e) => {
                log::debug!("row {row}: ignoring malformed {HISTORY_COLUMN}: {e}");
                None
            }
        });

    Profile {
        signals,
        region,
        digital_access,
        opportunity_level,
        settlement,
        domain,
        skill_score,
        skill_history,
    }
}

/// Empty, NaN and infinite cells read as missing.
/// Unparseable cells are logged and read as missing too.
fn parse_number(cell: &str, column: &str, row: usize) -> Option<f64> {
    if cell.is_empty() {
        return None;
    }
    match cell.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        Ok(value) => {
            log::warn!("row {row}: non-finite {value} in column '{column}'; filling");
            None
        }
        Err(_) => {
            log::warn!("row {row}: invalid number {cell:?} in column '{column}'; filling");
            None
        }
    }
}

/// `None` for an unrecognized label; the caller heals it.
fn parse_label<T: FromStr>(cell: &str, column: &str, row: usize) -> Option<T> {
    let parsed = cell.parse().ok();
    if parsed.is_none() {
        log::warn!("row {row}: unknown label {cell:?} in column '{column}'; healing");
    }
    parsed
}

// ── Synthesis ────────────────────────────────────────────────────────────────

struct Healer<'c> {
    rng:     StreamRng,
    regions: &'c [String],
    domains: &'c [String],
}

impl<'c> Healer<'c> {
    fn new(rng: StreamRng, config: &'c EngineConfig) -> Self {
        Self {
            rng,
            regions: &config.regions,
            domains: &config.domains,
        }
    }

    fn signal(&mut self) -> f64 {
        self.rng.int_in(HEAL_SIGNAL_RANGE.0, HEAL_SIGNAL_RANGE.1)
    }

    fn skill_score(&mut self) -> f64 {
        self.rng.int_in(HEAL_SKILL_RANGE.0, HEAL_SKILL_RANGE.1)
    }

    fn region(&mut self) -> String {
        self.rng.choose(self.regions).clone()
    }

    fn domain(&mut self) -> String {
        self.rng.choose(self.domains).clone()
    }
}

fn synthetic_profile(rng: &mut StreamRng, config: &EngineConfig) -> Profile {
    let mut signals = SignalVector::default();
    for signal in Signal::ALL {
        let value = match signal {
            Signal::LearningHours => rng.int_in(1, 40),
            Signal::Projects      => rng.int_in(0, 10),
            _ => rng.int_in(HEAL_SIGNAL_RANGE.0, HEAL_SIGNAL_RANGE.1),
        };
        signals.set(signal, value);
    }

    // Skill tracks the eight behavioral signals with noise, kept inside the
    // synthesized skill range so the regressor has structure to learn.
    let behavioral: f64 = Signal::ALL[..8].iter().map(|s| signals.get(*s)).sum::<f64>() / 8.0;
    let noise = rng.next_f64() * 16.0 - 8.0;
    let skill_score = (30.0 + (behavioral - 20.0) / 70.0 * 50.0 + noise)
        .round()
        .clamp(HEAL_SKILL_RANGE.0 as f64, (HEAL_SKILL_RANGE.1 - 1) as f64);

    let region = rng.choose(&config.regions).clone();
    let domain = rng.choose(&config.domains).clone();

    Profile {
        signals,
        region,
        digital_access:    *rng.choose(DigitalAccess::ALL),
        opportunity_level: *rng.choose(OpportunityLevel::ALL),
        settlement:        *rng.choose(SettlementType::ALL),
        domain,
        skill_score,
        skill_history: Some(synthetic_history(rng, skill_score, config.synthetic_history_months)),
    }
}

/// Monthly trajectory ending at `skill_score`, with a per-profile drift.
fn synthetic_history(rng: &mut StreamRng, skill_score: f64, months: usize) -> Vec<f64> {
    if months == 0 {
        return Vec::new();
    }
    let drift = rng.next_f64() * 3.0 - 1.0;
    let start = skill_score - drift * (months - 1) as f64;
    let mut history: Vec<f64> = (0..months)
        .map(|m| {
            let jitter = rng.next_f64() * 3.0 - 1.5;
            round1((start + drift * m as f64 + jitter).clamp(0.0, 100.0))
        })
        .collect();
    if let Some(last) = history.last_mut() {
        *last = skill_score;
    }
    history
}
