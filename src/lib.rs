//! Timetable planner - CSP + genetic-algorithm university scheduling engine.
//!
//! Scheduling runs in two stages:
//! 1. **CSP search**: one MRV-ordered, forward-checking backtracking pass
//!    over the scheduling variables (one per required session) produces a
//!    feasible or partial seed assignment.
//! 2. **Guided genetic algorithm**: the CSP seed becomes generation zero of
//!    a population that evolves under feasibility-preserving crossover and
//!    mutation operators, optimizing student idle time, lecturer workload
//!    balance, room utilization, and weekday distribution.
//!
//! A faculty-scoped [`ledger::BookingLedger`] makes independent runs for
//! different faculties safe to interleave without double-booking shared
//! rooms.

pub mod config;
pub mod csp;
pub mod error;
pub mod gga;
pub mod ledger;
pub mod orchestrator;
pub mod resolver;
pub mod rng;
pub mod source;
pub mod term_planner;
pub mod types;

pub use config::PlannerConfig;
pub use error::{PlannerError, Result};
pub use rng::PlannerRng;
