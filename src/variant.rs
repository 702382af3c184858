//! SARS-CoV-2 variants and their tabulated probability curves.

use std::collections::HashMap;
use std::sync::Arc;

use crate::input::{VariantProperties, WorldProperties};
use crate::population::Person;
use crate::random::Sampler;

/// A virus variant, or `None` for someone who is not carrying one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variant {
    #[default]
    None,
    Alpha,
    Delta,
}

/// The immutable per-variant probability curves: incubation, infectivity by
/// days from symptom onset, and the two immunity ramps. Built once from a
/// [`VariantProperties`] record and shared read-only between simulators.
pub struct VariantProbabilities {
    variant: Variant,
    properties: VariantProperties,
}

impl VariantProbabilities {
    pub fn new(properties: VariantProperties, variant: Variant) -> VariantProbabilities {
        VariantProbabilities {
            variant,
            properties,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// How infectious a carrier is, `days_from_symptoms` relative to onset
    /// (negative during the pre-symptomatic window).
    pub fn get_infectivity(&self, days_from_symptoms: i32) -> f64 {
        self.properties.infectivity.evaluate(days_from_symptoms)
    }

    pub fn get_vax_immunity(&self, days_from_vax: i32) -> f64 {
        self.properties.vax_immunity.evaluate(days_from_vax)
    }

    pub fn get_natural_immunity(&self, days_from_infection: i32) -> f64 {
        self.properties.natural_immunity.evaluate(days_from_infection)
    }

    /// Draws an incubation period. The table is a CDF: the draw is the
    /// smallest index whose entry is at least the uniform roll, or the
    /// table length if the roll lands past every entry.
    pub fn get_random_incubation(&self, sampler: &mut Sampler) -> i32 {
        let value = sampler.scalar();
        for (i, &cumulative) in self.properties.incubation.iter().enumerate() {
            if value <= cumulative {
                return i as i32;
            }
        }
        self.properties.incubation.len() as i32
    }

    /// Whether this person's infection history protects them from this
    /// variant today. The scalar rolled at infection time is compared
    /// against the decaying immunity curve.
    pub fn is_person_nat_immune(&self, person: &Person, today: i32) -> bool {
        person.is_infected()
            && f64::from(person.natural_immunity_scalar)
                <= self.get_natural_immunity(today - person.infected_day)
    }

    pub fn is_person_vax_immune(&self, person: &Person, today: i32) -> bool {
        person.is_vaccinated
            && f64::from(person.vaccine_immunity_scalar)
                <= self.get_vax_immunity(today - person.vaccination_day)
    }
}

/// The curves for every circulating variant. `Variant::None` has no entry
/// and is never looked up.
pub type VariantDictionary = HashMap<Variant, VariantProbabilities>;

/// Builds the shared dictionary from the input's world properties.
pub fn build_variant_dictionary(world: &WorldProperties) -> Arc<VariantDictionary> {
    let mut variants = VariantDictionary::new();
    variants.insert(
        Variant::Alpha,
        VariantProbabilities::new(world.alpha.clone(), Variant::Alpha),
    );
    variants.insert(
        Variant::Delta,
        VariantProbabilities::new(world.delta.clone(), Variant::Delta),
    );
    Arc::new(variants)
}
