//! Back-solves the effective contact probability: finds the value whose
//! simulated new-infection counts match the observed increments around a
//! given day.

use std::sync::Arc;

use crate::dates::to_reference_date;
use crate::error::SimError;
use crate::input::{ProgramInput, VaccineHistory};
use crate::log::debug;
use crate::population::Population;
use crate::random::Sampler;
use crate::simulator::Simulator;
use crate::variant::VariantDictionary;
use std::collections::HashMap;

/// How many simulated days each run is compared against the observed
/// record.
pub const CHECK_DAYS: usize = 3;

/// A search result: the zero-crossing of the error regression and the
/// residual standard deviation translated into contact-probability units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactResult {
    pub prob: f64,
    pub stdev: f64,
}

/// Two-pass regression search wrapping a [`Simulator`].
///
/// A pass sweeps `run_count` contact probabilities across an interval,
/// scores each by the mean daily difference between simulated and observed
/// new infections, and fits a line through the (probability, error) pairs.
/// The first pass brackets the answer from fixed bounds; the second zooms
/// into three standard deviations around the first estimate.
pub struct ContactProbabilitySearch<'a> {
    input: &'a ProgramInput,
    variants: Arc<VariantDictionary>,
}

impl<'a> ContactProbabilitySearch<'a> {
    pub fn new(input: &'a ProgramInput, variants: Arc<VariantDictionary>) -> Self {
        ContactProbabilitySearch { input, variants }
    }

    /// Finds the contact probability that reproduces the observed
    /// incidence on `day` (a reference day).
    pub fn find_contact_probability(&self, day: i32, seed: u64) -> Result<ContactResult, SimError> {
        let state_info = self.input.state_info()?;
        let infected_history = self.input.infected_history()?;
        let vax_history = self.input.vax_history()?;
        let variant_history = self.input.variant_history()?;

        // The observed day-over-day increments the runs are scored
        // against.
        let mut expected = Vec::with_capacity(CHECK_DAYS);
        for i in 0..CHECK_DAYS as i32 {
            let lookup = |d: i32| -> Result<i64, SimError> {
                Ok(infected_history
                    .get(&d)
                    .ok_or_else(|| {
                        SimError::from(format!("no infected_history entry for day {d}"))
                    })?
                    .total_infections)
            };
            expected.push(lookup(day + i)? - lookup(day + i - 1)?);
        }

        let mut simulator = Simulator::new(self.input.options, Arc::clone(&self.variants), seed);
        let mut age_sampler = Sampler::seed_from_u64(seed);
        let ages = (!state_info.ages.is_empty()).then_some(state_info.ages.as_slice());
        let mut reference = Population::new(
            state_info.population,
            self.input.population_scale,
            ages,
            &mut age_sampler,
        )?;
        let mut working = Population::new(
            state_info.population,
            self.input.population_scale,
            None,
            &mut age_sampler,
        )?;

        simulator.initialize_population(
            &mut reference,
            infected_history,
            vax_history,
            variant_history,
            Some(day),
        );

        // Bracket, then refine around the first estimate.
        let bounds = self.result_from_bounds(
            &reference,
            &mut working,
            &expected,
            &mut simulator,
            vax_history,
            2.0,
            0.5,
        )?;
        debug!(
            "day {day}: bracket pass gave prob {:.4} stdev {:.4}",
            bounds.prob, bounds.stdev
        );
        if !bounds.prob.is_finite() {
            return Ok(bounds);
        }

        let upper = bounds.prob + 3.0 * bounds.stdev;
        let lower = bounds.prob - 3.0 * bounds.stdev;
        self.result_from_bounds(
            &reference,
            &mut working,
            &expected,
            &mut simulator,
            vax_history,
            upper,
            lower,
        )
    }

    /// One regression pass between two contact-probability bounds.
    #[allow(clippy::too_many_arguments)]
    fn result_from_bounds(
        &self,
        reference: &Population,
        working: &mut Population,
        expected: &[i64],
        simulator: &mut Simulator,
        vax_history: &HashMap<i32, VaccineHistory>,
        upper: f64,
        lower: f64,
    ) -> Result<ContactResult, SimError> {
        let run_count = self.input.run_count;
        let step = (upper - lower) / run_count as f64;
        let mut xs = Vec::with_capacity(run_count);
        let mut ys = Vec::with_capacity(run_count);

        for run in 0..run_count {
            working.copy_from(reference)?;

            let contact_prob = lower + step * run as f64;
            simulator.set_contact_probability(contact_prob);

            let mut last_infections = working.scaled_total_infections();
            let mut error = 0.0;
            for &expected_new in expected {
                simulator.apply_vaccines(working, vax_history);
                simulator.simulate_day(working);

                let new_infections = working.scaled_total_infections() - last_infections;
                last_infections = working.scaled_total_infections();
                error += (new_infections - expected_new) as f64;
            }

            xs.push(contact_prob);
            ys.push(error / CHECK_DAYS as f64);
        }

        Ok(fit_zero_crossing(&xs, &ys))
    }
}

/// Ordinary-least-squares fit of the (probability, error) pairs, returning
/// the zero crossing and the residual standard deviation scaled into
/// x units. A degenerate fit (zero or non-finite slope) yields the
/// sentinel `(NaN, inf)` instead of a division by zero.
fn fit_zero_crossing(xs: &[f64], ys: &[f64]) -> ContactResult {
    let n = xs.len() as f64;
    let sum_x: f64 = xs.iter().sum();
    let sum_y: f64 = ys.iter().sum();
    let sum_xy: f64 = xs.iter().zip(ys).map(|(x, y)| x * y).sum();
    let sum_x2: f64 = xs.iter().map(|x| x * x).sum();

    let mean_x = sum_x / n;
    let mean_y = sum_y / n;
    let ss_xx = sum_x2 - sum_x * sum_x / n;
    let ss_xy = sum_xy - sum_x * sum_y / n;
    let slope = ss_xy / ss_xx;
    let intercept = mean_y - slope * mean_x;

    if slope == 0.0 || !slope.is_finite() {
        return ContactResult {
            prob: f64::NAN,
            stdev: f64::INFINITY,
        };
    }

    let variance = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| {
            let residual = y - (slope * x + intercept);
            residual * residual
        })
        .sum::<f64>()
        / n;

    ContactResult {
        prob: -intercept / slope,
        stdev: variance.sqrt() / slope.abs(),
    }
}

/// The reference-day numbers a sweep will visit: `start` through `end`
/// inclusive, stepping by `max(1, interval)`.
pub fn sweep_days(start: chrono::NaiveDate, end: chrono::NaiveDate, interval: i32) -> Vec<i32> {
    let step = interval.max(1);
    let mut days = Vec::new();
    let mut day = to_reference_date(start);
    let last = to_reference_date(end);
    while day <= last {
        days.push(day);
        day += step;
    }
    days
}
