//! Rank-to-rank messaging. The engine only ever talks through the
//! [`Transport`] trait; the in-process mesh in [`mesh`] is the one backend.

pub mod mesh;

use crate::error::SimError;

/// Process identity within a run. Rank 0 coordinates, everyone else works.
pub type Rank = usize;

/// The coordinating rank.
pub const COORDINATOR: Rank = 0;

/// Token for an in-flight asynchronous send. The frame belongs to the
/// transport until the handle is retired with [`Transport::wait`].
#[derive(Debug)]
pub struct SendHandle {
    pub(crate) seq: u64,
}

/// Reliable, ordered point-to-point messaging among the ranks of one run.
///
/// Between any (source, destination) pair, frames arrive in send order.
/// A single logical tag is used throughout: a receiver always knows which
/// frame comes next and how long it must be.
pub trait Transport {
    /// This endpoint's rank.
    fn rank(&self) -> Rank;

    /// Total rank count, coordinator included.
    fn peers(&self) -> usize;

    /// Blocking send: returns once the transport has accepted the frame.
    fn send(&mut self, dest: Rank, frame: Vec<u8>) -> Result<(), SimError>;

    /// Non-blocking send. The returned handle must be retired with
    /// [`Transport::wait`] before the endpoint is torn down.
    fn send_async(&mut self, dest: Rank, frame: Vec<u8>) -> Result<SendHandle, SimError>;

    /// Blocking receive of the next frame from `src`. The frame must be
    /// exactly `expected_len` bytes; anything else is a malformed frame.
    fn recv(&mut self, src: Rank, expected_len: usize) -> Result<Vec<u8>, SimError>;

    /// Block until the asynchronous send behind `handle` has completed.
    fn wait(&mut self, handle: SendHandle) -> Result<(), SimError>;
}
