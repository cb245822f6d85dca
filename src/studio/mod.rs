pub mod caption;
pub mod error;
pub mod options;
pub mod prompt;
pub mod session;

pub use options::HeadshotConfig;
pub use session::{Studio, TriggerOutcome};
