//! In-process transport backend: every rank runs on its own thread and each
//! ordered rank pair gets a dedicated unbounded channel, so per-pair FIFO
//! delivery falls out of the channel semantics.

use crossbeam_channel::{Receiver, Sender, unbounded};

use super::{Rank, SendHandle, Transport};
use crate::error::SimError;

/// One rank's view of the mesh: a sender per destination and a receiver per
/// source.
pub struct MeshEndpoint {
    rank: Rank,
    peers: usize,
    senders: Vec<Sender<Vec<u8>>>,
    receivers: Vec<Receiver<Vec<u8>>>,
    next_seq: u64,
    in_flight: Vec<u64>,
}

/// Mint fully connected endpoints for `peers` ranks.
pub fn build_mesh(peers: usize) -> Vec<MeshEndpoint> {
    let mut senders: Vec<Vec<Sender<Vec<u8>>>> =
        (0..peers).map(|_| Vec::with_capacity(peers)).collect();
    let mut receivers: Vec<Vec<Receiver<Vec<u8>>>> =
        (0..peers).map(|_| Vec::with_capacity(peers)).collect();

    for src in 0..peers {
        for dst in 0..peers {
            let (tx, rx) = unbounded();
            senders[src].push(tx);
            receivers[dst].push(rx);
        }
    }

    senders
        .into_iter()
        .zip(receivers)
        .enumerate()
        .map(|(rank, (senders, receivers))| MeshEndpoint {
            rank,
            peers,
            senders,
            receivers,
            next_seq: 0,
            in_flight: Vec::new(),
        })
        .collect()
}

impl MeshEndpoint {
    fn check_peer(&self, peer: Rank) -> Result<(), SimError> {
        if peer >= self.peers {
            return Err(SimError::Internal(format!(
                "rank {} addressed peer {peer}, but there are only {} ranks",
                self.rank, self.peers
            )));
        }
        Ok(())
    }
}

impl Transport for MeshEndpoint {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn peers(&self) -> usize {
        self.peers
    }

    fn send(&mut self, dest: Rank, frame: Vec<u8>) -> Result<(), SimError> {
        self.check_peer(dest)?;
        self.senders[dest].send(frame).map_err(|_| {
            SimError::Transport(format!("rank {dest} is no longer receiving"))
        })
    }

    fn send_async(&mut self, dest: Rank, frame: Vec<u8>) -> Result<SendHandle, SimError> {
        // Ownership of the frame moves into the channel, so the transfer is
        // already complete by the time the handle exists; the handle keeps
        // callers honest about draining their sends.
        self.send(dest, frame)?;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight.push(seq);
        Ok(SendHandle { seq })
    }

    fn recv(&mut self, src: Rank, expected_len: usize) -> Result<Vec<u8>, SimError> {
        self.check_peer(src)?;
        let frame = self.receivers[src].recv().map_err(|_| {
            SimError::Transport(format!("rank {src} went away before sending"))
        })?;
        if frame.len() != expected_len {
            return Err(SimError::MalformedFrame(format!(
                "frame from rank {src} is {} bytes, expected {expected_len}",
                frame.len()
            )));
        }
        Ok(frame)
    }

    fn wait(&mut self, handle: SendHandle) -> Result<(), SimError> {
        match self.in_flight.iter().position(|&seq| seq == handle.seq) {
            Some(index) => {
                self.in_flight.remove(index);
                Ok(())
            }
            None => Err(SimError::Internal(format!(
                "rank {}: send handle {} retired twice",
                self.rank, handle.seq
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_arrive_in_send_order_per_pair() {
        let mut mesh = build_mesh(2);
        let mut receiver = mesh.pop().unwrap();
        let mut sender = mesh.pop().unwrap();

        sender.send(1, vec![1, 2, 3]).unwrap();
        sender.send(1, vec![4, 5, 6]).unwrap();

        assert_eq!(receiver.recv(0, 3).unwrap(), vec![1, 2, 3]);
        assert_eq!(receiver.recv(0, 3).unwrap(), vec![4, 5, 6]);
    }

    #[test]
    fn unexpected_frame_length_is_malformed() {
        let mut mesh = build_mesh(2);
        let mut receiver = mesh.pop().unwrap();
        let mut sender = mesh.pop().unwrap();

        sender.send(1, vec![0; 8]).unwrap();
        assert!(matches!(
            receiver.recv(0, 4),
            Err(SimError::MalformedFrame(_))
        ));
    }

    #[test]
    fn receiving_from_a_dropped_peer_fails() {
        let mut mesh = build_mesh(2);
        let mut receiver = mesh.pop().unwrap();
        drop(mesh.pop());

        assert!(matches!(
            receiver.recv(0, 4),
            Err(SimError::Transport(_))
        ));
    }

    #[test]
    fn async_sends_are_retired_once() {
        let mut mesh = build_mesh(2);
        let mut receiver = mesh.pop().unwrap();
        let mut sender = mesh.pop().unwrap();

        let handle = sender.send_async(1, vec![7; 4]).unwrap();
        let seq = handle.seq;
        sender.wait(handle).unwrap();
        assert!(matches!(
            sender.wait(SendHandle { seq }),
            Err(SimError::Internal(_))
        ));

        assert_eq!(receiver.recv(0, 4).unwrap(), vec![7; 4]);
    }

    #[test]
    fn cross_thread_delivery_blocks_until_sent() {
        let mut mesh = build_mesh(2);
        let mut receiver = mesh.pop().unwrap();
        let mut sender = mesh.pop().unwrap();

        std::thread::scope(|scope| {
            scope.spawn(move || {
                sender.send(1, vec![42; 2]).unwrap();
            });
            assert_eq!(receiver.recv(0, 2).unwrap(), vec![42; 2]);
        });
    }
}
