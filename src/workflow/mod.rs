pub mod phase;

pub use phase::{AdvanceOutcome, Phase, WorkshopOperation, auto_switch_due, can};
