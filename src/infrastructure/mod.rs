//! Concrete collaborators for the payment flow: the HTTP backend, an
//! in-memory backend and a simulated gateway.

pub mod http;
pub mod in_memory;
pub mod simulated_gateway;
