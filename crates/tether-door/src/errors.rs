//! Front door error types.

/// Result alias for front door operations.
pub type Result<T> = std::result::Result<T, DoorError>;

/// Errors raised while starting or driving the front door.
#[derive(Debug, thiserror::Error)]
pub enum DoorError {
    /// Push channel failure.
    #[error(transparent)]
    Net(#[from] tether_net::NetError),

    /// Binding or serving the query API failed.
    #[error("query api error: {0}")]
    Io(#[from] std::io::Error),
}
