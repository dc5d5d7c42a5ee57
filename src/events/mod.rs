pub mod focus;

pub use focus::{DispatchOutcome, FocusTransition};
