//! Output records and their JSON emission.
//!
//! Everything reported to the outside world is in real-people units: the
//! simulator multiplies its internal counters by the population scale
//! before they land here.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::SimError;

/// The state of one population at the end of one simulated day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub day: i32,
    pub total_infections: i64,
    pub total_vaccinated: i64,
    pub never_infected: i64,
    pub reinfections: i64,
    pub vaccinated_infections: i64,
    pub total_alpha_infections: i64,
    pub total_delta_infections: i64,
    pub vaccine_saves: i64,
    pub natural_saves: i64,
    pub virus_carriers: i64,
    /// Summed infectivity of the carrier prefix. Only populated when the
    /// expensive-stats option is on; zero otherwise.
    pub population_infectiousness: f64,
}

/// One simulation run for one state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateResult {
    pub name: String,
    pub results: Vec<DailySummary>,
}

/// The output of a contact-probability sweep, one entry per searched day.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactSearchResultSet {
    pub days: Vec<i32>,
    pub probabilities: Vec<f64>,
    pub stdevs: Vec<f64>,
}

/// Serializes any result tree as JSON to `path`.
pub fn write_results<T: Serialize, P: AsRef<Path>>(path: P, results: &T) -> Result<(), SimError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, results)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(day: i32) -> DailySummary {
        DailySummary {
            day,
            total_infections: 100,
            total_vaccinated: 50,
            never_infected: 900,
            reinfections: 2,
            vaccinated_infections: 1,
            total_alpha_infections: 90,
            total_delta_infections: 10,
            vaccine_saves: 4,
            natural_saves: 7,
            virus_carriers: 30,
            population_infectiousness: 0.0,
        }
    }

    #[test]
    fn state_results_round_trip_through_json() {
        let results = vec![StateResult {
            name: "CO".to_string(),
            results: vec![summary(800), summary(801)],
        }];

        let file = tempfile::NamedTempFile::new().unwrap();
        write_results(file.path(), &results).unwrap();

        let value: serde_json::Value =
            serde_json::from_reader(File::open(file.path()).unwrap()).unwrap();
        assert_eq!(value[0]["name"], "CO");
        assert_eq!(value[0]["results"][1]["day"], 801);
        assert_eq!(value[0]["results"][0]["total_infections"], 100);
        assert_eq!(value[0]["results"][0]["virus_carriers"], 30);
    }

    #[test]
    fn search_results_serialize_parallel_arrays() {
        let results = ContactSearchResultSet {
            days: vec![700, 705],
            probabilities: vec![1.61, 1.58],
            stdevs: vec![0.02, 0.03],
        };

        let file = tempfile::NamedTempFile::new().unwrap();
        write_results(file.path(), &results).unwrap();

        let value: serde_json::Value =
            serde_json::from_reader(File::open(file.path()).unwrap()).unwrap();
        assert_eq!(value["days"], serde_json::json!([700, 705]));
        assert_eq!(value["probabilities"][0], 1.61);
        assert_eq!(value["stdevs"][1], 0.03);
    }
}
