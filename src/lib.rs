//! ADHD medication dispensation data: import, normalization and the
//! derived views behind the dashboard.
//!
//! Source workbooks (one per age group) and a pre-processed long CSV are
//! reshaped into two read-only tables, national and regional, held in a
//! [`Dataset`]. Charts read filtered slices of these tables through the
//! functions in [`views`] and [`metrics`].

pub mod aggregate;
pub mod config;
pub mod error;
pub mod frames;
pub mod geo;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;
pub mod views;

pub use aggregate::{Dataset, Table};
pub use config::Config;
pub use error::{DashboardError, Result};
pub use types::{AgeGroup, MedicationCategory, PrescriptionRecord, Sex};
