//! Domain layer: payment value objects, the observable flow state, and the
//! ports the orchestrator drives.

pub mod booking;
pub mod flow;
pub mod payment;
pub mod ports;
