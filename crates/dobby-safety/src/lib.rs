pub mod filter;

pub use filter::{SafetyFilter, ValidationAction, ValidationResult};
