//! The fully-typed input record and its JSON loader.
//!
//! The on-disk record keys every history by state name and calendar date
//! string; loading converts the date keys to integer reference days (see
//! [`crate::dates`]) so nothing downstream touches calendar dates.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::dates::{parse_date, to_reference_date};
use crate::error::SimError;
use crate::log::warn;
use crate::variant::Variant;

/// Clamped integer-indexed lookup table: `f(d) = values[clamp(d + offset, 0, len - 1)]`.
///
/// This is a lookup, not an interpolation; out-of-range days saturate at the
/// first or last table entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscreteFunction {
    pub values: Vec<f64>,
    pub offset: i32,
}

impl DiscreteFunction {
    pub fn evaluate(&self, day: i32) -> f64 {
        let shifted = day + self.offset;
        let clamped = shifted.clamp(0, self.values.len() as i32 - 1);
        self.values[clamped as usize]
    }
}

/// The tabulated probability curves for a single variant.
#[derive(Debug, Clone, Deserialize)]
pub struct VariantProperties {
    /// Incubation-period distribution, stored as the cumulative table the
    /// estimation pipeline produces.
    pub incubation: Vec<f64>,
    pub infectivity: DiscreteFunction,
    pub vax_immunity: DiscreteFunction,
    pub natural_immunity: DiscreteFunction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorldProperties {
    pub alpha: VariantProperties,
    pub delta: VariantProperties,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct InfectedHistory {
    pub total_infections: i64,
    pub total_cases: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VaccineHistory {
    pub total_completed_vax: i64,
}

/// One row of the variant-mix timeline: the mix of circulating variants
/// that is valid up to and including `date`.
#[derive(Debug, Clone)]
pub struct VariantRecord {
    pub date: i32,
    pub variants: HashMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateInfo {
    pub population: i64,
    /// Optional age histogram; one relative weight per year of age.
    #[serde(default)]
    pub ages: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramMode {
    Simulate,
    FindContactProb,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ProgramOptions {
    pub full_history: bool,
    pub expensive_stats: bool,
    pub mode: ProgramMode,
}

/// Everything the program needs for one invocation, with all dates already
/// converted to reference days except the start/end bounds, which stay as
/// calendar dates until the driver converts them.
#[derive(Debug, Clone)]
pub struct ProgramInput {
    pub start_day: NaiveDate,
    pub end_day: NaiveDate,
    pub state: String,
    pub output_file: String,
    pub contact_probability: f64,
    pub contact_day_interval: i32,
    pub population_scale: i64,
    pub run_count: usize,
    pub options: ProgramOptions,
    pub world_properties: WorldProperties,
    pub infected_history: HashMap<String, HashMap<i32, InfectedHistory>>,
    pub vax_history: HashMap<String, HashMap<i32, VaccineHistory>>,
    pub variant_history: HashMap<String, Vec<VariantRecord>>,
    pub state_info: HashMap<String, StateInfo>,
}

impl ProgramInput {
    /// The history tables for the configured state, or an input error
    /// naming what is missing.
    pub fn state_info(&self) -> Result<&StateInfo, SimError> {
        self.state_info
            .get(&self.state)
            .ok_or_else(|| SimError::from(format!("no state_info entry for '{}'", self.state)))
    }

    pub fn infected_history(&self) -> Result<&HashMap<i32, InfectedHistory>, SimError> {
        self.infected_history.get(&self.state).ok_or_else(|| {
            SimError::from(format!("no infected_history entry for '{}'", self.state))
        })
    }

    pub fn vax_history(&self) -> Result<&HashMap<i32, VaccineHistory>, SimError> {
        self.vax_history
            .get(&self.state)
            .ok_or_else(|| SimError::from(format!("no vax_history entry for '{}'", self.state)))
    }

    pub fn variant_history(&self) -> Result<&[VariantRecord], SimError> {
        self.variant_history
            .get(&self.state)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                SimError::from(format!("no variant_history entry for '{}'", self.state))
            })
    }
}

/// Looks up the variant mix valid for `day`: the first record whose date is
/// on or after the query day. With no matching record everything is
/// attributed to Alpha. Entries come back in a fixed variant order so
/// callers that iterate them stay deterministic.
pub fn variant_fractions(day: i32, records: &[VariantRecord]) -> Vec<(Variant, f64)> {
    for record in records {
        if day <= record.date {
            let mut fractions = Vec::with_capacity(record.variants.len());
            for (name, &fraction) in &record.variants {
                match name.as_str() {
                    "alpha" => fractions.push((Variant::Alpha, fraction)),
                    "delta" => fractions.push((Variant::Delta, fraction)),
                    other => warn!("ignoring unknown variant '{other}' in variant history"),
                }
            }
            fractions.sort_by_key(|(variant, _)| *variant);
            return fractions;
        }
    }

    vec![(Variant::Alpha, 1.0)]
}

// The raw on-disk shape, before date keys are converted.

#[derive(Deserialize)]
struct RawVariantRecord {
    date: String,
    variants: HashMap<String, f64>,
}

#[derive(Deserialize)]
struct RawProgramInput {
    start_day: String,
    end_day: String,
    state: String,
    output_file: String,
    contact_probability: f64,
    contact_day_interval: i32,
    population_scale: i64,
    run_count: usize,
    options: ProgramOptions,
    world_properties: WorldProperties,
    infected_history: HashMap<String, HashMap<String, InfectedHistory>>,
    vax_history: HashMap<String, HashMap<String, VaccineHistory>>,
    variant_history: HashMap<String, Vec<RawVariantRecord>>,
    state_info: HashMap<String, StateInfo>,
}

fn convert_history<T>(
    raw: HashMap<String, HashMap<String, T>>,
) -> Result<HashMap<String, HashMap<i32, T>>, SimError> {
    let mut converted = HashMap::with_capacity(raw.len());
    for (state, days) in raw {
        let mut by_day = HashMap::with_capacity(days.len());
        for (text, record) in days {
            by_day.insert(to_reference_date(parse_date(&text)?), record);
        }
        converted.insert(state, by_day);
    }
    Ok(converted)
}

impl TryFrom<RawProgramInput> for ProgramInput {
    type Error = SimError;

    fn try_from(raw: RawProgramInput) -> Result<ProgramInput, SimError> {
        let mut variant_history = HashMap::with_capacity(raw.variant_history.len());
        for (state, records) in raw.variant_history {
            let mut converted = Vec::with_capacity(records.len());
            for record in records {
                converted.push(VariantRecord {
                    date: to_reference_date(parse_date(&record.date)?),
                    variants: record.variants,
                });
            }
            variant_history.insert(state, converted);
        }

        Ok(ProgramInput {
            start_day: parse_date(&raw.start_day)?,
            end_day: parse_date(&raw.end_day)?,
            state: raw.state,
            output_file: raw.output_file,
            contact_probability: raw.contact_probability,
            contact_day_interval: raw.contact_day_interval,
            population_scale: raw.population_scale,
            run_count: raw.run_count,
            options: raw.options,
            world_properties: raw.world_properties,
            infected_history: convert_history(raw.infected_history)?,
            vax_history: convert_history(raw.vax_history)?,
            variant_history,
            state_info: raw.state_info,
        })
    }
}

/// Loads and validates the input record from a JSON file.
pub fn load_input<P: AsRef<Path>>(path: P) -> Result<ProgramInput, SimError> {
    let file = File::open(path)?;
    let raw: RawProgramInput = serde_json::from_reader(BufReader::new(file))?;
    let input = ProgramInput::try_from(raw)?;

    if input.population_scale < 1 {
        return Err(SimError::from("population_scale must be at least 1"));
    }
    if input.run_count == 0 {
        return Err(SimError::from("run_count must be at least 1"));
    }
    for (name, properties) in [
        ("alpha", &input.world_properties.alpha),
        ("delta", &input.world_properties.delta),
    ] {
        if properties.infectivity.values.is_empty()
            || properties.vax_immunity.values.is_empty()
            || properties.natural_immunity.values.is_empty()
        {
            return Err(SimError::from(format!(
                "variant '{name}' has an empty curve table"
            )));
        }
    }

    Ok(input)
}
