use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("action target not found: {0}")]
    NotFound(String),
}

/// A resolved external target that can be told to fire.
pub trait ActionTarget: Send {
    fn trigger(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    /// Short human-readable name for logs.
    fn describe(&self) -> String;
}

/// Finds the external target. Resolution may be slow and may fail.
pub trait TargetLocator: Send {
    fn locate(&mut self) -> Result<Box<dyn ActionTarget>, ResolveError>;
}
