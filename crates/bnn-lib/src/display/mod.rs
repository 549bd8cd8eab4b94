//! Terminal display system
//!
//! User-facing communication (status lines, spinners, confirmations, tables)
//! kept separate from diagnostics, which go through `tracing`.

pub mod live;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod providers;
pub mod styling;

pub use live::LiveDisplayProvider;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::{DisplayCall, MockDisplayProvider};
pub use providers::{
    DisplayProvider, ProgressProvider, ProgressTracker, PromptProvider, StatusProvider,
    StructuredProvider,
};
pub use styling::StyleManager;
