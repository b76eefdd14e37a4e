// Transition Policy - table-driven lifecycle validation
//
// Every status change in the crate goes through a TransitionPolicy so the
// legal moves live in one table instead of being re-checked at call sites.

pub mod policy;

pub use policy::{SequenceViolation, TransitionPolicy};
