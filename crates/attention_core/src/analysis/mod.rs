//! Pure analysis stages.
//!
//! Every function here takes borrowed input and returns owned output; none
//! touches storage. Diagnostics go through an injected
//! [`Reporter`](crate::report::Reporter).

pub mod aggregate;
pub mod categorize;
pub mod correlate;
pub mod insight;
pub mod recommend;
pub mod schedule;
