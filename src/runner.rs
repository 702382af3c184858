//! The top-level driver: loads the input record, dispatches on the program
//! mode, and writes the result tree.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Parser};

use crate::contact_prob::{sweep_days, ContactProbabilitySearch};
use crate::dates::to_reference_date;
use crate::error::SimError;
use crate::input::{load_input, ProgramInput, ProgramMode};
use crate::log::{debug, info, level_from_verbosity, set_log_level};
use crate::population::Population;
use crate::random::Sampler;
use crate::report::{write_results, ContactSearchResultSet, StateResult};
use crate::simulator::Simulator;
use crate::variant::{build_variant_dictionary, VariantDictionary};

/// Command line arguments for the simulator binary.
#[derive(Parser, Debug)]
#[command(name = "covidsim", about = "Agent-based SARS-CoV-2 simulator")]
pub struct BaseArgs {
    /// Path to the JSON input record.
    #[arg(default_value = "/tmp/input_data.json")]
    pub input: PathBuf,

    /// Random seed.
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Worker threads for the carrier scan. Results are reproducible only
    /// for a fixed thread count.
    #[arg(short, long, default_value = "1")]
    pub threads: usize,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Loads the input and runs the configured mode to completion.
pub fn run(args: &BaseArgs) -> Result<(), SimError> {
    set_log_level(level_from_verbosity(args.verbose));

    info!("loading input from {}", args.input.display());
    let input = load_input(&args.input)?;
    let variants = build_variant_dictionary(&input.world_properties);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build()?;

    pool.install(|| match input.options.mode {
        ProgramMode::Simulate => {
            let results = run_simulation(&input, &variants, args.random_seed)?;
            info!("writing results to {}", input.output_file);
            write_results(&input.output_file, &results)
        }
        ProgramMode::FindContactProb => {
            let results = run_contact_search(&input, &variants, args.random_seed)?;
            info!("writing results to {}", input.output_file);
            write_results(&input.output_file, &results)
        }
    })
}

/// Simulate mode: seed a reference population through the start day, then
/// run `run_count` independent projections to the end day.
pub fn run_simulation(
    input: &ProgramInput,
    variants: &Arc<VariantDictionary>,
    seed: u64,
) -> Result<Vec<StateResult>, SimError> {
    let state_info = input.state_info()?;
    let infected_history = input.infected_history()?;
    let vax_history = input.vax_history()?;
    let variant_history = input.variant_history()?;

    let start_day = to_reference_date(input.start_day);
    let end_day = to_reference_date(input.end_day);

    let mut simulator = Simulator::new(input.options, Arc::clone(variants), seed);
    let mut age_sampler = Sampler::seed_from_u64(seed);
    let ages = (!state_info.ages.is_empty()).then_some(state_info.ages.as_slice());
    let mut reference = Population::new(
        state_info.population,
        input.population_scale,
        ages,
        &mut age_sampler,
    )?;
    let mut working = Population::new(
        state_info.population,
        input.population_scale,
        None,
        &mut age_sampler,
    )?;

    info!("seeding population from infection history");
    let seeded_history = simulator.initialize_population(
        &mut reference,
        infected_history,
        vax_history,
        variant_history,
        Some(start_day),
    );
    info!(
        "seeded {} infections, {} still infectious",
        reference.scaled_total_infections(),
        reference.currently_infectious()
    );

    let mut results = Vec::with_capacity(input.run_count);
    for run in 0..input.run_count {
        working.copy_from(&reference)?;
        simulator.set_contact_probability(input.contact_probability);

        let mut summaries = seeded_history.clone();
        while working.today < end_day {
            simulator.apply_vaccines(&mut working, vax_history);
            summaries.push(simulator.simulate_day(&mut working));
        }

        debug!(
            "run {run}: {} total infections",
            working.scaled_total_infections()
        );
        results.push(StateResult {
            name: input.state.clone(),
            results: summaries,
        });
    }

    Ok(results)
}

/// FindContactProb mode: sweep the configured day range, estimating the
/// contact probability for each visited day.
pub fn run_contact_search(
    input: &ProgramInput,
    variants: &Arc<VariantDictionary>,
    seed: u64,
) -> Result<ContactSearchResultSet, SimError> {
    let search = ContactProbabilitySearch::new(input, Arc::clone(variants));

    let mut results = ContactSearchResultSet::default();
    for day in sweep_days(input.start_day, input.end_day, input.contact_day_interval) {
        let result = search.find_contact_probability(day, seed.wrapping_add(day as u64))?;
        info!(
            "day {day}: contact probability {:.4} (stdev {:.4})",
            result.prob, result.stdev
        );

        results.days.push(day);
        results.probabilities.push(result.prob);
        results.stdevs.push(result.stdev);
    }

    Ok(results)
}
