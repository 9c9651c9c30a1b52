//! Worker role: owns the rows of some tile rows, steps them through the
//! red/blue iteration, and trades boundary rows with its ring neighbours so
//! blue movement across tile-row seams matches the reference rule.
//!
//! The red phase never leaves the rank. Blue movement out of a tile row's
//! last row may land in a row owned by another rank; that is handled by a
//! two-phase exchange. First every tile row's top row travels up to the rank
//! owning its predecessor, which uses it as the read-only picture of where
//! its own blues may fall and marks the placements in a response copy. The
//! response then travels back down and the owner merges the placements in.

use rayon::prelude::*;
use tracing::debug;

use super::config::SimConfig;
use super::protocol::{self, Report};
use crate::domain::{Cell, Row, check_tiles, partition, step_red_row};
use crate::error::SimError;
use crate::transport::{COORDINATOR, Rank, Transport};

/// One remote boundary: the downstream neighbour's top row as it looked
/// after the red phase, and the response copy that carries our blue
/// placements back to it.
struct Exchange {
    peer: Rank,
    incoming: Row,
    response: Row,
}

/// Receive this rank's share of the grid and run the iteration loop to
/// completion. Ranks that own nothing return immediately.
pub fn run(transport: &mut dyn Transport, config: &SimConfig) -> Result<(), SimError> {
    let n = config.grid_size;
    let rank = transport.rank();

    let frame = transport.recv(COORDINATOR, protocol::partition_len(n))?;
    let owners = protocol::decode_partition(&frame, n)?;

    let owned = owners.iter().filter(|&&owner| owner == rank).count();
    if owned == 0 {
        debug!(rank, "no tile rows assigned, idling");
        return Ok(());
    }

    let mut rows = Vec::with_capacity(owned);
    for _ in 0..owned {
        let frame = transport.recv(COORDINATOR, protocol::assignment_len(n))?;
        rows.push(protocol::decode_assignment(&frame, n)?);
    }
    if !rows.windows(2).all(|pair| pair[0].id < pair[1].id) {
        return Err(SimError::Internal(format!(
            "rank {rank}: row assignments arrived out of order"
        )));
    }

    // Row id -> slot in `rows`, computed once so neighbour lookups in the
    // blue phase are constant time.
    let mut slots = vec![None; n];
    for (slot, row) in rows.iter().enumerate() {
        slots[row.id as usize] = Some(slot);
    }

    let groups: Vec<usize> = (0..config.tile_rows())
        .filter(|&group| owners[group * config.tile_size] == rank)
        .collect();
    debug!(rank, rows = owned, groups = groups.len(), "worker ready");

    let mut worker = Worker {
        transport,
        config,
        rank,
        rows,
        slots,
        groups,
    };

    let mut finished = false;
    let mut iteration = 0;
    while iteration < config.max_iters && !finished {
        finished = worker.iterate(iteration)?;
        iteration += 1;
    }
    debug!(rank, iterations = iteration, finished, "worker loop done");

    worker.send_rows_back()
}

struct Worker<'a> {
    transport: &'a mut dyn Transport,
    config: &'a SimConfig,
    rank: Rank,
    rows: Vec<Row>,
    slots: Vec<Option<usize>>,
    groups: Vec<usize>,
}

impl Worker<'_> {
    fn owner_of(&self, group: usize) -> Rank {
        partition::group_owner(group, self.config.procs)
    }

    fn slot_of(&self, id: usize) -> Result<usize, SimError> {
        self.slots[id].ok_or_else(|| {
            SimError::Internal(format!("rank {}: row {id} is not owned here", self.rank))
        })
    }

    /// One full iteration. Returns the coordinator's verdict: true means
    /// stop.
    fn iterate(&mut self, iteration: u32) -> Result<bool, SimError> {
        let n = self.config.grid_size;
        let t = self.config.tile_size;
        let tile_rows = self.config.tile_rows();
        let groups = self.groups.clone();

        // Red phase: every owned row moves independently.
        self.rows.par_iter_mut().for_each(|row| step_red_row(row));

        // Send each owned tile row's top row to the upstream neighbour; it
        // needs the post-red contents to decide where its bottom-row blues
        // may fall. Tile rows bordered by our own rows skip the exchange
        // and are handled locally in the blue move.
        let mut pending = Vec::new();
        for &group in &groups {
            let upstream = self.owner_of((group + tile_rows - 1) % tile_rows);
            if upstream == self.rank {
                continue;
            }
            let slot = self.slot_of(group * t)?;
            let frame = self.rows[slot].to_bytes();
            pending.push(self.transport.send_async(upstream, frame)?);
        }

        // Receive the top row of each downstream tile row. Receives are
        // ordered by downstream tile row: senders emit frames in ascending
        // tile-row order, so this keeps every per-peer stream aligned even
        // when the ring wraps past the last tile row.
        let mut exchange_groups: Vec<usize> = groups
            .iter()
            .copied()
            .filter(|&group| self.owner_of((group + 1) % tile_rows) != self.rank)
            .collect();
        exchange_groups.sort_by_key(|&group| (group + 1) % tile_rows);

        let mut exchanges = Vec::with_capacity(exchange_groups.len());
        for &group in &exchange_groups {
            let down_group = (group + 1) % tile_rows;
            let peer = self.owner_of(down_group);
            let frame = self.transport.recv(peer, Row::frame_len(n))?;
            let incoming = Row::from_bytes(&frame, n)?;
            if incoming.id as usize != down_group * t {
                return Err(SimError::Internal(format!(
                    "rank {}: expected row {} from rank {peer}, got row {}",
                    self.rank,
                    down_group * t,
                    incoming.id
                )));
            }
            let response = incoming.clone();
            exchanges.push(Exchange {
                peer,
                incoming,
                response,
            });
        }

        // The post-red state is the source of truth for every blue read;
        // writes go to the live rows (or response copies) only.
        let snapshot = self.rows.clone();
        for slot in 0..self.rows.len() {
            let rid = self.rows[slot].id as usize;
            let next_id = (rid + 1) % n;
            if let Some(next_slot) = self.slots[next_id] {
                for c in 0..n {
                    if snapshot[slot].cell(c) == Cell::Blue
                        && snapshot[next_slot].cell(c) == Cell::White
                    {
                        self.rows[slot].set(c, Cell::White);
                        self.rows[next_slot].set(c, Cell::Blue);
                    }
                }
            } else {
                let exchange = exchanges
                    .iter_mut()
                    .find(|exchange| exchange.incoming.id as usize == next_id)
                    .ok_or_else(|| {
                        SimError::Internal(format!(
                            "rank {}: no incoming row {next_id} for the blue move",
                            self.rank
                        ))
                    })?;
                for c in 0..n {
                    if snapshot[slot].cell(c) == Cell::Blue
                        && exchange.incoming.cell(c) == Cell::White
                    {
                        self.rows[slot].set(c, Cell::White);
                        exchange.response.set(c, Cell::Blue);
                    }
                }
            }
        }

        // Return the response copies, again in downstream tile-row order.
        for exchange in &exchanges {
            let frame = exchange.response.to_bytes();
            pending.push(self.transport.send_async(exchange.peer, frame)?);
        }

        // Collect the blues our upstream neighbour pushed into our top rows.
        // A returned cell is merged only where the post-red snapshot was
        // white: those are exactly the columns an upstream blue could land
        // in, while stale blues that have since moved on stay gone.
        for &group in &groups {
            let upstream = self.owner_of((group + tile_rows - 1) % tile_rows);
            if upstream == self.rank {
                continue;
            }
            let top_id = group * t;
            let frame = self.transport.recv(upstream, Row::frame_len(n))?;
            let returned = Row::from_bytes(&frame, n)?;
            if returned.id as usize != top_id {
                return Err(SimError::Internal(format!(
                    "rank {}: expected returned row {top_id} from rank {upstream}, got row {}",
                    self.rank, returned.id
                )));
            }
            let slot = self.slot_of(top_id)?;
            for c in 0..n {
                if returned.cell(c) == Cell::Blue && snapshot[slot].cell(c) == Cell::White {
                    self.rows[slot].set(c, Cell::Blue);
                }
            }
        }

        // Every boundary frame from this iteration is drained before the
        // next one starts.
        for handle in pending {
            self.transport.wait(handle)?;
        }

        // Scan owned tiles in tile-row order and report the first hit.
        let mut hit = None;
        for &group in &groups {
            let start = self.slot_of(group * t)?;
            if let Some(found) = check_tiles(&self.rows[start..start + t], t, self.config.threshold)
            {
                hit = Some(found);
                break;
            }
        }

        let report = match &hit {
            Some(hit) => Report::finished(hit),
            None => Report::none(),
        };
        debug!(
            rank = self.rank,
            iteration,
            finished = hit.is_some(),
            "reporting"
        );
        self.transport.send(COORDINATOR, report.to_bytes())?;

        let frame = self.transport.recv(COORDINATOR, protocol::DECISION_LEN)?;
        protocol::decode_decision(&frame)
    }

    /// Stream the owned rows back to the coordinator, ascending by id, for
    /// the final gather.
    fn send_rows_back(&mut self) -> Result<(), SimError> {
        for slot in 0..self.rows.len() {
            let frame = self.rows[slot].to_bytes();
            self.transport.send(COORDINATOR, frame)?;
        }
        Ok(())
    }
}
