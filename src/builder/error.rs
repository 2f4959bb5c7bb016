//! Build errors for machine construction.

use crate::definition::DefinitionError;
use crate::engine::FireError;
use thiserror::Error;

/// Errors that can occur when building a machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error("Initial transition failed: {0}")]
    Startup(#[from] FireError),
}
