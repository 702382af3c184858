//! A stochastic agent-based SARS-CoV-2 simulator.
//!
//! The simulator reproduces historical case trajectories at a scaled
//! per-individual resolution: one simulated person stands in for a fixed
//! number of real people. A population is advanced one day at a time; each
//! infectious individual samples a random number of contacts, which may
//! then be infected according to variant-specific infectivity,
//! natural-immunity, and vaccine-immunity curves.
//!
//! The same engine drives two modes:
//! * **Simulate** projects incidence forward from a start date, seeded from
//!   the historical daily infection record.
//! * **FindContactProb** back-solves for the effective contact probability
//!   that reproduces the observed incidence on a given day, by linearly
//!   regressing simulated-versus-observed new infections across a sweep of
//!   candidate probabilities.
//!
//! The population keeps its currently-infectious members in a contiguous
//! array prefix, so the hot per-day carrier scan iterates a dense range and
//! joining or leaving the infectious set is a single swap. See
//! [`population::Population`] for the invariants this imposes on stored
//! indices.

pub mod contact_prob;
pub use contact_prob::{ContactProbabilitySearch, ContactResult};

pub mod dates;

pub mod error;
pub use error::SimError;

pub mod input;
pub use input::{load_input, ProgramInput, ProgramMode};

pub mod log;
pub use log::{debug, error, info, set_log_level, trace, warn, LevelFilter};

pub mod population;
pub use population::{Person, Population};

pub mod random;
pub use random::Sampler;

pub mod report;
pub use report::{ContactSearchResultSet, DailySummary, StateResult};

pub mod runner;
pub use runner::{run_contact_search, run_simulation, BaseArgs};

pub mod simulator;
pub use simulator::Simulator;

pub mod variant;
pub use variant::{build_variant_dictionary, Variant, VariantDictionary};
