// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-cycle sender pool and the tie-break policy.
//!
//! The pool is built from one capacity snapshot and is the only place the
//! dispatcher tracks remaining headroom during a cycle. Selection order is
//! branch match, then the default sender, then any sender in snapshot order.

use waflow_core::types::Sender;

/// Messages sent by one sender during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderTally {
    pub phone_number: String,
    pub sent: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    sender: Sender,
    remaining: u32,
    sent: u32,
}

/// Senders available for one drain cycle with their running headroom.
#[derive(Debug, Clone)]
pub struct SenderPool {
    slots: Vec<Slot>,
}

impl SenderPool {
    pub fn new(snapshot: Vec<Sender>) -> Self {
        let slots = snapshot
            .into_iter()
            .map(|sender| Slot {
                remaining: sender.remaining(),
                sender,
                sent: 0,
            })
            .collect();
        Self { slots }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sum of remaining headroom across the pool.
    pub fn capacity(&self) -> u64 {
        self.slots.iter().map(|s| u64::from(s.remaining)).sum()
    }

    /// Index of the sender to use for a message with the given branch.
    ///
    /// Returns `None` when no sender has headroom left.
    pub fn select(&self, branch: Option<&str>) -> Option<usize> {
        let open = |slot: &&Slot| slot.remaining > 0;

        let by_branch = branch.and_then(|wanted| {
            self.slots
                .iter()
                .position(|s| open(&s) && s.sender.branch.as_deref() == Some(wanted))
        });

        by_branch
            .or_else(|| self.slots.iter().position(|s| open(&s) && s.sender.is_default))
            .or_else(|| self.slots.iter().position(|s| open(&s)))
    }

    pub fn sender(&self, index: usize) -> Option<&Sender> {
        self.slots.get(index).map(|s| &s.sender)
    }

    /// Count one confirmed send and return the sender's total for the
    /// snapshot's business day.
    pub fn record_success(&mut self, index: usize) -> Option<u32> {
        let slot = self.slots.get_mut(index)?;
        slot.remaining = slot.remaining.saturating_sub(1);
        slot.sent += 1;
        Some(slot.sender.messages_sent_today + slot.sent)
    }

    /// Senders that sent at least one message, in snapshot order.
    pub fn tallies(&self) -> Vec<SenderTally> {
        self.slots
            .iter()
            .filter(|s| s.sent > 0)
            .map(|s| SenderTally {
                phone_number: s.sender.phone_number.clone(),
                sent: s.sent,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(phone: &str, limit: u32, used: u32) -> Sender {
        Sender {
            id: 0,
            phone_number: phone.to_string(),
            instance_id: format!("inst-{phone}"),
            daily_limit: limit,
            messages_sent_today: used,
            last_reset_date: None,
            branch: None,
            is_default: false,
        }
    }

    #[test]
    fn capacity_sums_headroom() {
        let pool = SenderPool::new(vec![sender("a", 10, 4), sender("b", 3, 3), sender("c", 2, 5)]);
        assert_eq!(pool.capacity(), 6);
    }

    #[test]
    fn branch_match_beats_default_regardless_of_order() {
        let mut default = sender("default", 5, 0);
        default.is_default = true;
        let mut branch = sender("branch", 1, 0);
        branch.branch = Some("X".into());

        let pool = SenderPool::new(vec![default, branch]);
        let chosen = pool.select(Some("X")).unwrap();
        assert_eq!(pool.sender(chosen).unwrap().phone_number, "branch");
    }

    #[test]
    fn default_beats_snapshot_order_when_branch_is_full() {
        let mut branch = sender("branch", 1, 1);
        branch.branch = Some("X".into());
        let plain = sender("plain", 5, 0);
        let mut default = sender("default", 5, 0);
        default.is_default = true;

        let pool = SenderPool::new(vec![branch, plain, default]);
        let chosen = pool.select(Some("X")).unwrap();
        assert_eq!(pool.sender(chosen).unwrap().phone_number, "default");
    }

    #[test]
    fn falls_back_to_first_open_sender() {
        let pool = SenderPool::new(vec![sender("full", 2, 2), sender("open", 2, 0)]);
        let chosen = pool.select(None).unwrap();
        assert_eq!(pool.sender(chosen).unwrap().phone_number, "open");
    }

    #[test]
    fn exhausting_the_pool_stops_selection() {
        let mut pool = SenderPool::new(vec![sender("only", 2, 1)]);
        let slot = pool.select(None).unwrap();
        assert_eq!(pool.record_success(slot), Some(2));
        assert_eq!(pool.select(None), None);
        assert_eq!(pool.capacity(), 0);
    }

    #[test]
    fn tallies_skip_idle_senders() {
        let mut pool = SenderPool::new(vec![sender("a", 5, 0), sender("b", 5, 0)]);
        let b = 1;
        pool.record_success(b);
        pool.record_success(b);
        assert_eq!(
            pool.tallies(),
            vec![SenderTally {
                phone_number: "b".into(),
                sent: 2
            }]
        );
        assert!(pool.record_success(9).is_none());
    }
}
