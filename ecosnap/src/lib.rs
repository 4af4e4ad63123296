//! EcoSnap capture-to-commit core.
//!
//! - [`domain`]: location watcher, capture controller, submission pipeline,
//!   and the ports they drive
//! - [`outbound`]: Supabase, in-memory, and JPEG adapters
//! - [`settings`]: OrthoConfig-backed runtime settings

pub mod domain;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
