//! Repository implementations
//!
//! Repositories own the SQL and the row types. Reads run on the pool;
//! writes and the tenant lock take an explicit connection so the caller
//! decides which transaction they belong to.

pub mod partner;

pub use partner::PartnerRepository;
