//! Application layer containing the payment flow orchestration.
//!
//! This module defines the `PaymentFlowOrchestrator`, which sequences the
//! reference service, the payment gateway and the status service into a
//! single cancellable flow, and the `BookingUiState` projection consumers
//! use to render it.

pub mod orchestrator;
pub mod projection;
