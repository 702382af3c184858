//! End-to-end runs of the binary's driver path: load a JSON input record,
//! run a mode, and check the written result tree.

use std::fs;
use std::path::Path;

use covidsim::dates::from_reference_date;
use covidsim::runner::{run, BaseArgs};

/// Builds a complete input record as JSON. History covers reference days
/// `0..history_days`; the simulated window is `[start_day, end_day)`.
fn input_json(
    mode: &str,
    output_file: &Path,
    history_days: i32,
    start_day: i32,
    end_day: i32,
    run_count: usize,
) -> String {
    let date = |d: i32| from_reference_date(d).to_string();

    let infected: Vec<String> = (0..history_days)
        .map(|d| {
            format!(
                r#""{}": {{"total_infections": {}, "total_cases": {}}}"#,
                date(d),
                20 + 10 * i64::from(d),
                16 + 8 * i64::from(d)
            )
        })
        .collect();
    // The vaccination record runs past the infection history so the
    // 21-day completed-vaccination shift finds entries during the
    // simulated window.
    let vax: Vec<String> = (0..history_days + 30)
        .map(|d| {
            format!(
                r#""{}": {{"total_completed_vax": {}}}"#,
                date(d),
                4 * i64::from(d)
            )
        })
        .collect();

    format!(
        r#"{{
            "start_day": "{start}",
            "end_day": "{end}",
            "state": "CO",
            "output_file": {output:?},
            "contact_probability": 1.4,
            "contact_day_interval": 2,
            "population_scale": 2,
            "run_count": {run_count},
            "options": {{"full_history": false, "expensive_stats": true, "mode": "{mode}"}},
            "world_properties": {{
                "alpha": {{
                    "incubation": [0.3, 0.7, 1.0],
                    "infectivity": {{"values": [0.05, 0.2, 0.3, 0.2, 0.1, 0.0], "offset": 2}},
                    "vax_immunity": {{"values": [0.0, 0.3, 0.6, 0.9], "offset": 0}},
                    "natural_immunity": {{"values": [0.95, 0.9, 0.85], "offset": 0}}
                }},
                "delta": {{
                    "incubation": [0.5, 1.0],
                    "infectivity": {{"values": [0.1, 0.3, 0.4, 0.3, 0.1, 0.0], "offset": 2}},
                    "vax_immunity": {{"values": [0.0, 0.2, 0.5, 0.8], "offset": 0}},
                    "natural_immunity": {{"values": [0.9, 0.85, 0.8], "offset": 0}}
                }}
            }},
            "infected_history": {{"CO": {{{infected}}}}},
            "vax_history": {{"CO": {{{vax}}}}},
            "variant_history": {{"CO": [
                {{"date": "{variant_switch}", "variants": {{"alpha": 1.0}}}},
                {{"date": "{far_future}", "variants": {{"alpha": 0.4, "delta": 0.6}}}}
            ]}},
            "state_info": {{"CO": {{"population": 600, "ages": [0.2, 0.5, 0.3]}}}}
        }}"#,
        start = date(start_day),
        end = date(end_day),
        output = output_file,
        infected = infected.join(", "),
        vax = vax.join(", "),
        variant_switch = date(4),
        far_future = date(10_000),
    )
}

fn run_once(json: &str, seed: u64) {
    let input_file = tempfile::NamedTempFile::new().unwrap();
    fs::write(input_file.path(), json).unwrap();
    let args = BaseArgs {
        input: input_file.path().to_path_buf(),
        random_seed: seed,
        threads: 1,
        verbose: 0,
    };
    run(&args).unwrap();
}

#[test]
fn simulate_mode_writes_a_result_tree() {
    let output = tempfile::NamedTempFile::new().unwrap();
    let json = input_json("simulate", output.path(), 8, 8, 14, 3);
    run_once(&json, 7);

    let value: serde_json::Value =
        serde_json::from_reader(fs::File::open(output.path()).unwrap()).unwrap();

    let runs = value.as_array().unwrap();
    assert_eq!(runs.len(), 3);
    for run in runs {
        assert_eq!(run["name"], "CO");
        let days = run["results"].as_array().unwrap();
        assert_eq!(days.len(), 6);
        assert_eq!(days[0]["day"], 8);
        assert_eq!(days[5]["day"], 13);

        // Counters are reported in real-people units, so they move in
        // multiples of the scale.
        let infections = days[5]["total_infections"].as_i64().unwrap();
        assert!(infections >= 90, "seeded history alone gives 90: {infections}");
        assert_eq!(infections % 2, 0);
    }
}

#[test]
fn identical_seeds_produce_byte_identical_output() {
    let output_a = tempfile::NamedTempFile::new().unwrap();
    let output_b = tempfile::NamedTempFile::new().unwrap();

    run_once(&input_json("simulate", output_a.path(), 8, 8, 14, 2), 42);
    run_once(&input_json("simulate", output_b.path(), 8, 8, 14, 2), 42);

    let bytes_a = fs::read(output_a.path()).unwrap();
    let bytes_b = fs::read(output_b.path()).unwrap();
    assert!(!bytes_a.is_empty());
    assert_eq!(bytes_a, bytes_b);
}

#[test]
fn find_contact_prob_mode_writes_parallel_arrays() {
    let output = tempfile::NamedTempFile::new().unwrap();
    // Sweep days 8 and 10; history must cover each day's comparison
    // window, two days past the last swept day.
    let json = input_json("find_contact_prob", output.path(), 14, 8, 10, 6);
    run_once(&json, 3);

    let value: serde_json::Value =
        serde_json::from_reader(fs::File::open(output.path()).unwrap()).unwrap();

    assert_eq!(value["days"], serde_json::json!([8, 10]));
    let probabilities = value["probabilities"].as_array().unwrap();
    let stdevs = value["stdevs"].as_array().unwrap();
    assert_eq!(probabilities.len(), 2);
    assert_eq!(stdevs.len(), 2);
}
