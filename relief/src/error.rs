use std::path::PathBuf;
use tessadem::DemError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReliefError {
    #[error("missing required parameters")]
    Builder,

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("no elevation tiles in {0}")]
    Path(PathBuf),

    #[error("{0}")]
    Dem(#[from] DemError),
}
