//! Request and response bodies

pub mod partner;
