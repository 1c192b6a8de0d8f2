//! Errors raised by mesh bookkeeping.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("unknown runtime: {0}")]
    UnknownRuntime(String),

    #[error("owner {owner} is bound to runtime {runtime}")]
    OwnerBound { owner: String, runtime: String },
}
