// Library exports for testing and potential library use
//
// The activity engine lives in `rec-cue-watch` and the persisted settings in
// `rec-cue-config`; this crate is the headless host that wires them to the
// console indicator.

/// Application version (root crate version, for use by sub-crates).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod app;
pub mod cli;
pub mod debug;
pub mod indicator;
pub mod recovery;

pub use rec_cue_config as config;
pub use rec_cue_watch as watch;
