//! Duplicate-use assertions checked between ticks.
use crate::account::IdentityPool;
use crate::window::Window;
use alloy_primitives::{Address, B256};
use std::collections::HashSet;
use surge_core::{InvariantViolation, StopReason};
#[allow(unused)]
use tracing::{debug, error, info};

#[derive(Debug, Default)]
pub struct SanityGuard {
    used_senders: HashSet<Address>,
    seen_content_ids: HashSet<B256>,
    selections: u64,
}

impl SanityGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the senders of `tick`. A repeat stops the run.
    ///
    /// Once cumulative selections exceed the pool a repeat is unavoidable and is reported as
    /// [`StopReason::PoolExhausted`]. Any earlier repeat is a selection bug.
    pub fn check_senders(
        &mut self,
        tick: u64,
        senders: &IdentityPool,
        window: &Window,
    ) -> Option<StopReason> {
        self.selections += window.len() as u64;
        let wrapped = self.selections > senders.len() as u64;

        let mut fresh = Vec::with_capacity(window.len());
        for address in window.iter().filter_map(|idx| senders.get(idx)).map(|s| s.address()) {
            if self.used_senders.contains(&address) || fresh.contains(&address) {
                if wrapped {
                    info!("Sender {address} comes around again in tick {tick}, every sender has been used");
                    return Some(StopReason::PoolExhausted);
                }
                let violation = InvariantViolation::DuplicateAddress {
                    address: address.to_string(),
                    tick,
                };
                error!("{violation}");
                return Some(StopReason::Violation(violation));
            }
            fresh.push(address);
        }

        self.used_senders.extend(fresh);
        None
    }

    /// Record content identifiers that the endpoint accepted in `tick`.
    pub fn check_content_ids<'a, I>(&mut self, tick: u64, accepted: I) -> Option<StopReason>
    where
        I: IntoIterator<Item = &'a B256>,
    {
        for content_id in accepted {
            if !self.seen_content_ids.insert(*content_id) {
                let violation = InvariantViolation::DuplicateContentId {
                    content_id: content_id.to_string(),
                    tick,
                };
                error!("{violation}");
                return Some(StopReason::Violation(violation));
            }
        }
        None
    }

    pub fn distinct_senders(&self) -> usize {
        self.used_senders.len()
    }

    pub fn distinct_content_ids(&self) -> usize {
        self.seen_content_ids.len()
    }
}
