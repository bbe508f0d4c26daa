//! Batch interfaces: booking input and outcome output as CSV.

pub mod csv;
