use thiserror::Error;

/// Convenience result type for simulation operations.
pub type SimulationResult<T> = Result<T, SimulationError>;

/// Error type shared by the waiting room, the rendezvous channel, the actors and the driver.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Admission was denied because every waiting slot is taken.
    ///
    /// This is an expected outcome: clients handle it by balking.
    #[error("waiting room is full (capacity {capacity})")]
    RoomFull { capacity: usize },

    /// `leave` was called on a room with no occupants.
    #[error("leave called on an empty waiting room")]
    EmptyRoom,

    /// The rendezvous channel was closed while an actor was waiting on it.
    #[error("rendezvous channel closed")]
    ChannelClosed,

    /// The simulation configuration is not usable.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// An actor thread could not be spawned.
    #[error("failed to spawn actor thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// An actor thread panicked before it could report its outcome.
    #[error("actor '{actor}' panicked")]
    ActorPanicked { actor: String },
}
