//! The agent population: a dense array of people partitioned so that the
//! currently-infectious prefix can be scanned as a contiguous range.

use rand::distr::weighted::WeightedIndex;

use crate::error::SimError;
use crate::random::Sampler;
use crate::variant::Variant;

/// A data-only representation of a single member of the population.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Person {
    /// What variant the individual is currently carrying; `Variant::None`
    /// means they are not an active carrier.
    pub variant: Variant,
    /// The day the individual was infected with the variant they carry.
    pub infected_day: i32,
    /// The day the individual's symptoms manifest.
    pub symptom_onset: i32,
    pub test_day: i32,
    /// Rolled once at infection time; compared against the natural-immunity
    /// curve to decide whether a later exposure is shrugged off.
    pub natural_immunity_scalar: f32,
    /// Rolled once at vaccination time; compared against the vaccine
    /// efficacy ramp.
    pub vaccine_immunity_scalar: f32,
    pub is_vaccinated: bool,
    pub vaccination_day: i32,
    pub age: i32,
}

impl Person {
    /// Whether the individual is carrying a variant.
    pub fn is_infected(&self) -> bool {
        self.variant != Variant::None
    }

    /// Resets every field to its default except age, which is a fixed
    /// attribute of the individual.
    pub fn reset(&mut self) {
        *self = Person {
            age: self.age,
            ..Person::default()
        };
    }
}

/// A population of individuals at a given time.
///
/// One simulated person stands in for `scale` real people, so the array
/// holds `ceil(unscaled_size / scale)` entries. The array is kept
/// partitioned: indices `[0, infectious_end)` are exactly the people who
/// are currently infectious, everyone else sits at `[infectious_end, len)`.
/// Joining and leaving the infectious prefix is a swap, so indices are NOT
/// stable across mutations; scratch lists of indices must be consumed in
/// the documented order.
pub struct Population {
    pub people: Vec<Person>,
    /// Indices of people who have not been vaccinated yet. May lag reality;
    /// stale entries are filtered when candidates are drawn.
    pub unvaxxed_indices: Vec<usize>,

    pub today: i32,

    // Aggregate counters, all in unscaled (simulated-person) units.
    pub total_infections: i64,
    pub total_vaccinated: i64,
    pub never_infected: i64,
    pub total_alpha_infections: i64,
    pub total_delta_infections: i64,
    pub reinfections: i64,
    pub vaccinated_infections: i64,
    pub vaccine_saves: i64,
    pub natural_saves: i64,

    scale: i64,
    infectious_end: usize,
}

impl Population {
    /// Creates a population from an unscaled head count and a scale factor.
    /// When an age histogram is supplied, each person's age is sampled
    /// from it.
    pub fn new(
        unscaled_size: i64,
        scale: i64,
        ages: Option<&[f64]>,
        sampler: &mut Sampler,
    ) -> Result<Population, SimError> {
        let size = ((unscaled_size + scale - 1) / scale) as usize;
        let mut people = vec![Person::default(); size];

        if let Some(weights) = ages {
            if !weights.is_empty() {
                let by_age = WeightedIndex::new(weights.iter().copied())
                    .map_err(|e| SimError::from(format!("invalid age histogram: {e}")))?;
                for person in &mut people {
                    person.age = sampler.draw(&by_age) as i32;
                }
            }
        }

        Ok(Population {
            people,
            unvaxxed_indices: (0..size).collect(),
            today: 0,
            total_infections: 0,
            total_vaccinated: 0,
            never_infected: size as i64,
            total_alpha_infections: 0,
            total_delta_infections: 0,
            reinfections: 0,
            vaccinated_infections: 0,
            vaccine_saves: 0,
            natural_saves: 0,
            scale,
            infectious_end: 0,
        })
    }

    /// Brings every person and counter back to the pre-pandemic state.
    pub fn reset(&mut self) {
        self.today = 0;
        self.total_infections = 0;
        self.total_vaccinated = 0;
        self.never_infected = self.people.len() as i64;
        self.total_alpha_infections = 0;
        self.total_delta_infections = 0;
        self.reinfections = 0;
        self.vaccinated_infections = 0;
        self.vaccine_saves = 0;
        self.natural_saves = 0;
        self.infectious_end = 0;

        for person in &mut self.people {
            person.reset();
        }

        self.unvaxxed_indices.clear();
        self.unvaxxed_indices.extend(0..self.people.len());
    }

    /// Bulk value-copy of another population of the same size. The RNG is
    /// deliberately not part of the population, so copies advance
    /// independently afterwards.
    pub fn copy_from(&mut self, other: &Population) -> Result<(), SimError> {
        if self.people.len() != other.people.len() {
            return Err(SimError::from(format!(
                "population size mismatch in copy: {} vs {}",
                self.people.len(),
                other.people.len()
            )));
        }

        self.people.copy_from_slice(&other.people);
        self.unvaxxed_indices.clear();
        self.unvaxxed_indices.extend_from_slice(&other.unvaxxed_indices);

        self.today = other.today;
        self.total_infections = other.total_infections;
        self.total_vaccinated = other.total_vaccinated;
        self.never_infected = other.never_infected;
        self.total_alpha_infections = other.total_alpha_infections;
        self.total_delta_infections = other.total_delta_infections;
        self.reinfections = other.reinfections;
        self.vaccinated_infections = other.vaccinated_infections;
        self.vaccine_saves = other.vaccine_saves;
        self.natural_saves = other.natural_saves;
        self.scale = other.scale;
        self.infectious_end = other.infectious_end;
        Ok(())
    }

    /// Moves the person at `current_index` into the infectious prefix by
    /// swapping them with the first non-infectious person. A no-op if they
    /// are already inside the prefix. After the call the person's data
    /// lives at `end_of_infectious() - 1`.
    pub fn add_to_infected(&mut self, current_index: usize) {
        if current_index < self.infectious_end {
            return;
        }
        self.people.swap(current_index, self.infectious_end);
        self.infectious_end += 1;
    }

    /// Moves the person at `current_index` out of the infectious prefix,
    /// swapping the last infectious person into their slot. A no-op if they
    /// are already outside the prefix.
    pub fn remove_from_infected(&mut self, current_index: usize) {
        if current_index >= self.infectious_end {
            return;
        }
        self.infectious_end -= 1;
        self.people.swap(current_index, self.infectious_end);
    }

    /// One past the last infectious index; `[0, end_of_infectious())` is
    /// exactly the set of current carriers.
    pub fn end_of_infectious(&self) -> usize {
        self.infectious_end
    }

    pub fn scale(&self) -> i64 {
        self.scale
    }

    // Scaled views of the counters, in real-people units.

    pub fn currently_infectious(&self) -> i64 {
        self.infectious_end as i64 * self.scale
    }

    pub fn scaled_total_infections(&self) -> i64 {
        self.total_infections * self.scale
    }

    pub fn scaled_total_vaccinated(&self) -> i64 {
        self.total_vaccinated * self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_pop(size: i64) -> Population {
        let mut sampler = Sampler::seed_from_u64(0);
        Population::new(size, 1, None, &mut sampler).unwrap()
    }

    fn check_partition(pop: &Population) {
        for i in 0..pop.end_of_infectious() {
            assert_eq!(pop.people[i].variant, Variant::Alpha);
        }
        for i in pop.end_of_infectious()..pop.people.len() {
            assert_eq!(pop.people[i].variant, Variant::None);
        }
    }

    #[test]
    fn infectious_stress_test() {
        let mut sampler = Sampler::seed_from_u64(20210501);
        let mut pop = small_pop(1000);
        let mut infectious: i64 = 0;

        for _ in 0..10_000 {
            // Add a random batch of infectious people.
            let not_infectious = pop.people.len() - pop.end_of_infectious();
            let to_infect = sampler.index(not_infectious.min(100) + 1);
            for _ in 0..to_infect {
                let span = pop.people.len() - pop.end_of_infectious();
                let index = pop.end_of_infectious() + sampler.index(span);
                pop.people[index].variant = Variant::Alpha;
                pop.add_to_infected(index);
                infectious += 1;
            }

            // Remove a random batch.
            let to_disinfect = sampler.index(pop.end_of_infectious().min(100) + 1);
            for _ in 0..to_disinfect {
                let index = sampler.index(pop.end_of_infectious());
                pop.people[index].variant = Variant::None;
                pop.remove_from_infected(index);
                infectious -= 1;
            }

            check_partition(&pop);
            assert_eq!(infectious, pop.currently_infectious());
        }
    }

    #[test]
    fn add_inside_prefix_is_a_no_op() {
        let mut pop = small_pop(10);
        pop.people[0].variant = Variant::Alpha;
        pop.add_to_infected(0);
        assert_eq!(pop.end_of_infectious(), 1);

        pop.add_to_infected(0);
        assert_eq!(pop.end_of_infectious(), 1);
        check_partition(&pop);
    }

    #[test]
    fn remove_outside_prefix_is_a_no_op() {
        let mut pop = small_pop(10);
        pop.remove_from_infected(5);
        assert_eq!(pop.end_of_infectious(), 0);
    }

    #[test]
    fn swap_moves_displaced_person_out() {
        let mut pop = small_pop(4);
        for i in 0..3 {
            pop.people[i].variant = Variant::Alpha;
            pop.people[i].infected_day = i as i32;
            pop.add_to_infected(i);
        }

        // Removing index 0 swaps the last carrier (infected_day 2) into
        // slot 0.
        pop.remove_from_infected(0);
        assert_eq!(pop.end_of_infectious(), 2);
        assert_eq!(pop.people[0].infected_day, 2);
        assert_eq!(pop.people[2].infected_day, 0);
    }

    #[test]
    fn new_population_scales_size() {
        let pop = small_pop(1000);
        assert_eq!(pop.people.len(), 1000);
        assert_eq!(pop.never_infected, 1000);
        assert_eq!(pop.unvaxxed_indices.len(), 1000);

        let mut sampler = Sampler::seed_from_u64(0);
        let scaled = Population::new(1001, 10, None, &mut sampler).unwrap();
        assert_eq!(scaled.people.len(), 101);
        assert_eq!(scaled.currently_infectious(), 0);
        assert_eq!(scaled.scale(), 10);
    }

    #[test]
    fn ages_sampled_from_histogram() {
        let mut sampler = Sampler::seed_from_u64(7);
        // All weight on age 3.
        let weights = [0.0, 0.0, 0.0, 1.0];
        let pop = Population::new(50, 1, Some(&weights), &mut sampler).unwrap();
        assert!(pop.people.iter().all(|p| p.age == 3));
    }

    #[test]
    fn reset_restores_pristine_state() {
        let mut sampler = Sampler::seed_from_u64(1);
        let mut pop = small_pop(10);
        pop.people[3].variant = Variant::Alpha;
        pop.add_to_infected(3);
        pop.total_infections = 5;
        pop.never_infected = 5;
        pop.vaccine_saves = 2;
        pop.today = 40;
        pop.unvaxxed_indices.swap_remove(sampler.index(10));

        pop.reset();
        assert_eq!(pop.today, 0);
        assert_eq!(pop.total_infections, 0);
        assert_eq!(pop.never_infected, 10);
        assert_eq!(pop.vaccine_saves, 0);
        assert_eq!(pop.end_of_infectious(), 0);
        assert_eq!(pop.unvaxxed_indices.len(), 10);
        assert!(pop.people.iter().all(|p| !p.is_infected()));
    }

    #[test]
    fn copy_from_requires_matching_sizes() {
        let mut big = small_pop(100);
        let small = small_pop(10);
        assert!(big.copy_from(&small).is_err());
    }

    #[test]
    fn copy_from_duplicates_everything() {
        let mut src = small_pop(20);
        src.people[0].variant = Variant::Delta;
        src.add_to_infected(0);
        src.total_infections = 1;
        src.total_delta_infections = 1;
        src.never_infected = 19;
        src.today = 12;
        src.unvaxxed_indices.swap_remove(0);

        let mut dst = small_pop(20);
        dst.copy_from(&src).unwrap();

        assert_eq!(dst.today, 12);
        assert_eq!(dst.total_infections, 1);
        assert_eq!(dst.end_of_infectious(), 1);
        assert_eq!(dst.people[0].variant, Variant::Delta);
        assert_eq!(dst.unvaxxed_indices, src.unvaxxed_indices);
    }
}
