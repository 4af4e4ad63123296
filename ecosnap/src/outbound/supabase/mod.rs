//! Supabase outbound adapters.
//!
//! Thin reqwest clients for the storage and PostgREST endpoints that back
//! the `ImageStorage` and `EcoActionRepository` ports. Every request carries
//! the project anon key plus the caller's bearer token so row-level security
//! applies.

mod client;
mod dto;
mod image_storage;
mod repository;

pub use client::{SupabaseClient, SupabaseConfig};
pub use image_storage::SupabaseImageStorage;
pub use repository::SupabaseEcoActionRepository;
