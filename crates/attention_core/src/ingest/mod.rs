//! Raw record intake: collaborator contracts, file-backed sources and the
//! record normalizer.

pub mod calendar_export;
pub mod dayone;
pub mod normalize;
pub mod source;
