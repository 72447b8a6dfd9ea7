//! Core library for the `locus` location screen.
//!
//! This crate defines:
//! - Location samples and permission answers
//! - Abstraction over location providers, plus the built-in ones
//! - The screen controller state machine and the views it selects
//! - Configuration handling
//!
//! It is used by `locus-cli`, but the controller and views know nothing about
//! terminals and can back other front ends.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod screen;
pub mod view;

pub use config::{Config, ProviderConfig};
pub use error::{FetchError, ScreenError};
pub use model::{Coordinates, LocationSample, PermissionResponse};
pub use provider::{LocationProvider, ProviderId};
pub use screen::{FetchOutcome, ScreenController, ScreenState};
pub use view::{MapRenderer, View};
