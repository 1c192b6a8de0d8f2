//! The GroupingEngine applies join, merge, and leave to the group registry.
//!
//! Every public operation first resolves the identities it needs, which
//! may suspend on a remote runtime, and only then takes the registry lock
//! and applies all of its mutations and event emissions in one go. Owning
//! runtimes of proxy members hear about the new membership afterwards, in
//! a separate step with its own atomic bookkeeping update.

mod operations;
mod proxy;
mod resolve;
mod transitions;
mod types;

pub use types::*;
