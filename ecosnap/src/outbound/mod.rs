//! Outbound adapters implementing domain ports.
//!
//! - **supabase**: reqwest clients for hosted storage and PostgREST tables
//! - **memory**: process-local store for dry runs and tests
//! - **jpeg**: frame encoder backed by the `image` crate
//! - **session**: fixed-session provider for command-line use
//!
//! Adapters translate between domain types and transport shapes. They
//! contain no business logic.

pub mod jpeg;
pub mod memory;
pub mod session;
pub mod supabase;
