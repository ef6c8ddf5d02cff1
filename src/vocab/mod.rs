pub mod filter;
pub mod lifecycle;
pub mod normalize;

pub use filter::CommonTermFilter;
pub use lifecycle::{ReviewOutcome, Transition};
