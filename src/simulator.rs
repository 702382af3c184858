//! The per-day stochastic update, the seeding procedure that replays the
//! historical infection record, and the vaccination scheduler.

use std::collections::HashMap;
use std::sync::Arc;

use rand_distr::Binomial;
use rayon::prelude::*;

use crate::input::{variant_fractions, InfectedHistory, ProgramOptions, VaccineHistory, VariantRecord};
use crate::log::warn;
use crate::population::Population;
use crate::random::Sampler;
use crate::report::DailySummary;
use crate::variant::{Variant, VariantDictionary, VariantProbabilities};

/// Completed-vaccination counts are applied this many days before they were
/// recorded, so the efficacy ramp starts at the first shot.
const VACCINE_COMPLETION_LAG: i32 = 21;

/// A person infected longer ago than this may be vaccinated even while
/// still carrying the virus.
const VACCINE_INFECTION_COOLDOWN: i32 = 30;

/// Scratch produced by one worker chunk of the carrier scan.
#[derive(Default)]
struct WorkerScratch {
    expired: Vec<usize>,
    to_infect: Vec<(usize, Variant)>,
    natural_saves: i64,
    vaccine_saves: i64,
}

/// Advances a [`Population`] one day at a time.
///
/// The simulator owns the random source and the contact probability; the
/// population is passed in by exclusive reference so the driver can keep a
/// seeded reference copy and reuse it across runs.
pub struct Simulator {
    options: ProgramOptions,
    variants: Arc<VariantDictionary>,
    contact_probability: f64,
    base_seed: u64,
    sampler: Sampler,
}

fn lookup(variants: &VariantDictionary, variant: Variant) -> &VariantProbabilities {
    variants
        .get(&variant)
        .expect("every circulating variant has curves")
}

impl Simulator {
    pub fn new(options: ProgramOptions, variants: Arc<VariantDictionary>, seed: u64) -> Simulator {
        Simulator {
            options,
            variants,
            contact_probability: 0.0,
            base_seed: seed,
            sampler: Sampler::seed_from_u64(seed),
        }
    }

    /// Sets the expected daily contacts per carrier. Must be called before
    /// [`Simulator::simulate_day`].
    pub fn set_contact_probability(&mut self, contact_probability: f64) {
        self.contact_probability = contact_probability;
    }

    pub fn contact_probability(&self) -> f64 {
        self.contact_probability
    }

    /// Replays the historical infection record, seeding the population
    /// forward one day at a time until `up_to` (or the end of the history).
    /// Newly seeded people join the infectious prefix; a final pass retires
    /// everyone whose infectious window has already closed.
    ///
    /// Returns one summary per seeded day when the full-history option is
    /// on, and nothing otherwise.
    pub fn initialize_population(
        &mut self,
        pop: &mut Population,
        history: &HashMap<i32, InfectedHistory>,
        vaccines: &HashMap<i32, VaccineHistory>,
        variant_history: &[VariantRecord],
        up_to: Option<i32>,
    ) -> Vec<DailySummary> {
        pop.reset();
        let mut summaries = Vec::new();

        let Some(first_day) = history.keys().min().copied() else {
            return summaries;
        };
        let mut last_day = history.keys().max().copied().unwrap_or(first_day);
        if let Some(limit) = up_to {
            last_day = limit;
        }

        pop.today = first_day;
        let mut infected_pointer: usize = 0;

        while pop.today < last_day {
            if let Some(h) = history.get(&pop.today) {
                let fractions = variant_fractions(pop.today, variant_history);

                // The number of additional infections needed to hit the
                // historical total for this day.
                let target = h.total_infections / pop.scale();
                let total_to_add = target - infected_pointer as i64;

                for &(variant, fraction) in &fractions {
                    let mut to_add = (fraction * total_to_add as f64).round() as i64;
                    let available = (pop.people.len() - infected_pointer) as i64;
                    if to_add > available {
                        warn!(
                            "infection history exceeds population on day {}; seeding truncated",
                            pop.today
                        );
                        to_add = available;
                    }
                    for _ in 0..to_add {
                        self.infect_person(pop, infected_pointer, variant);
                        infected_pointer += 1;
                    }
                }

                self.apply_vaccines(pop, vaccines);

                if self.options.full_history {
                    summaries.push(self.daily_summary(pop));
                }
            }

            pop.today += 1;
        }

        // Seeding pushed everyone into the infectious prefix, including
        // people whose infections have long since run their course. Retire
        // them, walking high to low so the swaps cannot reshuffle an index
        // we have yet to visit.
        let mut to_remove = Vec::new();
        for i in (0..pop.end_of_infectious()).rev() {
            let person = &pop.people[i];
            let days_from_symptoms = pop.today - person.symptom_onset;
            if days_from_symptoms > 0
                && lookup(&self.variants, person.variant).get_infectivity(days_from_symptoms) <= 0.0
            {
                to_remove.push(i);
            }
        }
        for index in to_remove {
            pop.remove_from_infected(index);
        }

        summaries
    }

    /// Vaccinates enough randomly drawn people to hit the historical
    /// completed-vaccination count for today.
    ///
    /// Completed counts lag first shots, so the target is read
    /// [`VACCINE_COMPLETION_LAG`] days ahead and applied now; immunity then
    /// ramps up from today on the efficacy curve. Candidates come from the
    /// unvaccinated index list; a drawn candidate who is currently infected
    /// (and not past the cooldown) is consumed without being vaccinated.
    pub fn apply_vaccines(&mut self, pop: &mut Population, vaccines: &HashMap<i32, VaccineHistory>) {
        let shifted = pop.today + VACCINE_COMPLETION_LAG;
        let Some(vax) = vaccines.get(&shifted) else {
            return;
        };

        let target = vax.total_completed_vax / pop.scale();
        while pop.total_vaccinated < target {
            if pop.unvaxxed_indices.is_empty() {
                break;
            }

            let pick = self.sampler.index(pop.unvaxxed_indices.len());
            let index = pop.unvaxxed_indices.swap_remove(pick);
            let today = pop.today;
            let person = &mut pop.people[index];
            if person.is_vaccinated {
                continue;
            }
            if !person.is_infected() || today - person.infected_day > VACCINE_INFECTION_COOLDOWN {
                person.is_vaccinated = true;
                person.vaccination_day = today;
                person.vaccine_immunity_scalar = self.sampler.scalar() as f32;
                pop.total_vaccinated += 1;
            }
        }
    }

    /// Infects the person at `person_index` with `variant` and moves them
    /// into the infectious prefix. The caller guarantees the index is
    /// outside the prefix; after the swap the person's data lives at
    /// `end_of_infectious() - 1`.
    fn infect_person(&mut self, pop: &mut Population, person_index: usize, variant: Variant) {
        debug_assert!(person_index >= pop.end_of_infectious());

        let person = &pop.people[person_index];
        if person.variant == Variant::None {
            pop.never_infected -= 1;
        } else {
            pop.reinfections += 1;
        }
        if person.is_vaccinated {
            pop.vaccinated_infections += 1;
        }

        let curves = lookup(&self.variants, variant);
        let incubation = curves.get_random_incubation(&mut self.sampler);
        let scalar = self.sampler.scalar() as f32;

        let today = pop.today;
        let person = &mut pop.people[person_index];
        person.variant = variant;
        person.infected_day = today;
        person.symptom_onset = today + incubation;
        person.natural_immunity_scalar = scalar;
        pop.add_to_infected(person_index);

        pop.total_infections += 1;
        match variant {
            Variant::Alpha => pop.total_alpha_infections += 1,
            Variant::Delta => pop.total_delta_infections += 1,
            Variant::None => {}
        }
    }

    /// Runs one day of transmission.
    ///
    /// Every carrier draws a Binomial(N, p/N) number of contacts, each
    /// contact is drawn uniformly from the whole population, and a contact
    /// that is not already infectious must fail the carrier's infectivity
    /// roll, the natural-immunity check, and the vaccine-immunity check, in
    /// that order, to become infected. Carriers whose infectivity has
    /// decayed to zero after symptom onset retire from the prefix.
    ///
    /// The scan reads the start-of-day population; all swaps are applied
    /// afterwards, expired carriers from the highest index down, then new
    /// infections from the lowest contact index up, each distinct contact
    /// index at most once.
    pub fn simulate_day(&mut self, pop: &mut Population) -> DailySummary {
        let population_size = pop.people.len();
        let today = pop.today;
        let infectious_end = pop.end_of_infectious();

        if population_size == 0 {
            let summary = self.daily_summary(pop);
            pop.today += 1;
            return summary;
        }

        let normalized_contact =
            (self.contact_probability / population_size as f64).clamp(0.0, 1.0);
        let contact_dist = Binomial::new(population_size as u64, normalized_contact)
            .expect("contact probability is clamped to [0, 1]");

        let base_seed = self.base_seed;
        let variants = &self.variants;
        let people = &pop.people;

        let worker_count = rayon::current_num_threads();
        let chunk_size = infectious_end.div_ceil(worker_count).max(1);

        let scratches: Vec<WorkerScratch> = (0..worker_count)
            .into_par_iter()
            .map(|chunk| {
                let start = chunk * chunk_size;
                let end = ((chunk + 1) * chunk_size).min(infectious_end);
                let mut scratch = WorkerScratch::default();
                if start >= end {
                    return scratch;
                }

                let mut sampler = Sampler::for_worker(base_seed, today, chunk);
                for carrier_index in start..end {
                    let carrier = &people[carrier_index];
                    let curves = lookup(variants, carrier.variant);
                    let infection_p = curves.get_infectivity(today - carrier.symptom_onset);

                    // Past the infectious tail. The guard on symptom onset
                    // keeps pre-symptomatic carriers with zero infectivity
                    // in the prefix.
                    if infection_p <= 0.0 && today > carrier.symptom_onset {
                        scratch.expired.push(carrier_index);
                        continue;
                    }

                    let contact_count = sampler.draw(&contact_dist);
                    for _ in 0..contact_count {
                        let contact_index = sampler.index(population_size);
                        if contact_index < infectious_end {
                            continue;
                        }
                        if !sampler.chance(infection_p) {
                            continue;
                        }

                        // The carrier's roll succeeded; the contact's
                        // immunities get the last word.
                        let contact = &people[contact_index];
                        if curves.is_person_nat_immune(contact, today) {
                            scratch.natural_saves += 1;
                            continue;
                        }
                        if curves.is_person_vax_immune(contact, today) {
                            scratch.vaccine_saves += 1;
                            continue;
                        }

                        scratch.to_infect.push((contact_index, carrier.variant));
                    }
                }
                scratch
            })
            .collect();

        let mut expired = Vec::new();
        let mut to_infect = Vec::new();
        for mut scratch in scratches {
            expired.append(&mut scratch.expired);
            to_infect.append(&mut scratch.to_infect);
            pop.natural_saves += scratch.natural_saves;
            pop.vaccine_saves += scratch.vaccine_saves;
        }

        // Largest first, so earlier removals cannot move a person another
        // stored index still points at.
        expired.sort_unstable_by(|a, b| b.cmp(a));
        for index in expired {
            pop.remove_from_infected(index);
        }

        // Smallest first, de-duplicated: after the first infection at an
        // index the swap has moved somebody else into that slot.
        to_infect.sort_by_key(|&(index, _)| index);
        let mut last_infected = usize::MAX;
        for (index, variant) in to_infect {
            if index == last_infected {
                continue;
            }
            self.infect_person(pop, index, variant);
            last_infected = index;
        }

        let summary = self.daily_summary(pop);
        pop.today += 1;
        summary
    }

    /// Snapshots the population's counters, scaled back to real people.
    pub fn daily_summary(&self, pop: &Population) -> DailySummary {
        let scale = pop.scale();
        let mut summary = DailySummary {
            day: pop.today,
            total_infections: pop.total_infections * scale,
            total_vaccinated: pop.total_vaccinated * scale,
            never_infected: pop.never_infected * scale,
            reinfections: pop.reinfections * scale,
            vaccinated_infections: pop.vaccinated_infections * scale,
            total_alpha_infections: pop.total_alpha_infections * scale,
            total_delta_infections: pop.total_delta_infections * scale,
            vaccine_saves: pop.vaccine_saves * scale,
            natural_saves: pop.natural_saves * scale,
            virus_carriers: pop.currently_infectious(),
            population_infectiousness: 0.0,
        };

        if self.options.expensive_stats {
            let mut total = 0.0;
            for person in &pop.people[..pop.end_of_infectious()] {
                total += lookup(&self.variants, person.variant)
                    .get_infectivity(pop.today - person.symptom_onset);
            }
            summary.population_infectiousness = total * scale as f64;
        }

        summary
    }
}
