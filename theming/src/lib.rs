//! Theming for Lunary
//!
//! Resolves the user's theme preference against the operating system's
//! dark mode signal and pushes the result to whatever renders the UI.

pub mod appearance;
pub mod context;
pub mod controller;

pub use appearance::{ManualAppearance, SystemAppearance};
pub use context::{PreferenceContext, SubscriptionId};
pub use controller::{PresentationSink, ThemeController};
