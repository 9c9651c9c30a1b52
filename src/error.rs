use thiserror::Error;

/// Failure classes of a simulation run. Every variant is fatal: there is no
/// recovery, and the driver maps each class to a distinct process exit code.
#[derive(Debug, Error)]
pub enum SimError {
    /// Rejected run parameters (bad CLI values, tile size not dividing the
    /// grid, too few ranks).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A wire frame arrived with the wrong size or undecodable contents.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The underlying messaging layer failed, usually a peer going away.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A protocol invariant was violated. This is a bug, not bad input.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl SimError {
    /// Process exit code for this failure class.
    pub const fn exit_code(&self) -> i32 {
        match self {
            SimError::Config(_) => 2,
            SimError::MalformedFrame(_) => 3,
            SimError::Transport(_) => 4,
            SimError::Internal(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let errors = [
            SimError::Config(String::new()),
            SimError::MalformedFrame(String::new()),
            SimError::Transport(String::new()),
            SimError::Internal(String::new()),
        ];

        let mut codes: Vec<i32> = errors.iter().map(SimError::exit_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(codes.iter().all(|&code| code != 0));
    }
}
