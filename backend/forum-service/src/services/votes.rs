//! Vote ledger.
//!
//! One open vote per (user, target). Casting the vote a user already holds
//! removes it; casting the other direction switches it. Each request runs
//! as a single transaction: a conditional write on the vote record decides
//! the transition, the counter deltas land through the counter service on
//! the same connection, and the whole thing commits or rolls back as a
//! unit, so counters can never reflect half a switch.
//!
//! Two requests from the same user racing on the same target make one of
//! the conditional writes miss; that surfaces as a conflict which is
//! retried here a bounded number of times before being returned, since
//! double-submission (double-click) is the expected cause.

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::vote_repo;
use crate::error::{AppError, Result};
use crate::metrics::votes as vote_metrics;
use crate::models::{VoteTarget, VoteType};
use crate::services::counters::{CounterService, VoteDeltas};

/// Bounded retries for same-user conditional-write races.
const MAX_VOTE_ATTEMPTS: u32 = 3;

/// One step of the vote state machine, decided from the caller's current
/// vote and the requested direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTransition {
    /// No open vote: record one.
    Create(VoteType),
    /// Same direction as the open vote: toggle it off.
    Remove(VoteType),
    /// Opposite direction: flip the open vote.
    Switch { from: VoteType, to: VoteType },
}

impl VoteTransition {
    pub fn decide(existing: Option<VoteType>, requested: VoteType) -> Self {
        match existing {
            None => VoteTransition::Create(requested),
            Some(current) if current == requested => VoteTransition::Remove(current),
            Some(current) => VoteTransition::Switch {
                from: current,
                to: requested,
            },
        }
    }

    /// Counter deltas this transition must apply. A switch carries both
    /// halves; they are never applied separately.
    pub fn deltas(&self) -> VoteDeltas {
        match self {
            VoteTransition::Create(VoteType::Upvote) => VoteDeltas { upvotes: 1, downvotes: 0 },
            VoteTransition::Create(VoteType::Downvote) => VoteDeltas { upvotes: 0, downvotes: 1 },
            VoteTransition::Remove(VoteType::Upvote) => VoteDeltas { upvotes: -1, downvotes: 0 },
            VoteTransition::Remove(VoteType::Downvote) => VoteDeltas { upvotes: 0, downvotes: -1 },
            VoteTransition::Switch { from: VoteType::Upvote, .. } => {
                VoteDeltas { upvotes: -1, downvotes: 1 }
            }
            VoteTransition::Switch { from: VoteType::Downvote, .. } => {
                VoteDeltas { upvotes: 1, downvotes: -1 }
            }
        }
    }

    /// The state the ledger ends up in: `None` after a toggle-off.
    pub fn resulting_state(&self) -> Option<VoteType> {
        match self {
            VoteTransition::Create(vote_type) => Some(*vote_type),
            VoteTransition::Remove(_) => None,
            VoteTransition::Switch { to, .. } => Some(*to),
        }
    }
}

/// Result of a vote request: the state the ledger now holds (not the
/// input), plus the updated counters for the client to echo.
#[derive(Debug, Clone, Copy)]
pub struct VoteReceipt {
    pub voted: bool,
    pub vote_type: Option<VoteType>,
    pub upvotes: i64,
    pub downvotes: i64,
}

/// The caller's current vote on a target.
#[derive(Debug, Clone, Copy)]
pub struct VoteStatus {
    pub voted: bool,
    pub vote_type: Option<VoteType>,
}

#[derive(Clone)]
pub struct VoteService {
    pool: PgPool,
    counters: CounterService,
}

impl VoteService {
    pub fn new(pool: PgPool) -> Self {
        let counters = CounterService::new(pool.clone());
        Self { pool, counters }
    }

    /// Apply one vote request, retrying transparently when a concurrent
    /// request from the same user invalidates the read-then-decide step.
    pub async fn apply_vote(
        &self,
        user_id: Uuid,
        target: VoteTarget,
        requested: VoteType,
    ) -> Result<VoteReceipt> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_apply(user_id, target, requested).await {
                Err(AppError::Conflict(reason)) if attempt < MAX_VOTE_ATTEMPTS => {
                    vote_metrics::VOTE_CONFLICT_RETRIES_TOTAL.inc();
                    tracing::debug!(
                        %user_id,
                        target_id = %target.id(),
                        target_type = target.kind(),
                        attempt,
                        "Vote conditional write lost a race, retrying: {}",
                        reason
                    );
                }
                Err(err) => {
                    vote_metrics::VOTE_REQUEST_TOTAL
                        .with_label_values(&[target.kind(), "error"])
                        .inc();
                    return Err(err);
                }
                Ok(receipt) => {
                    let outcome = match receipt.vote_type {
                        Some(VoteType::Upvote) => "upvoted",
                        Some(VoteType::Downvote) => "downvoted",
                        None => "removed",
                    };
                    vote_metrics::VOTE_REQUEST_TOTAL
                        .with_label_values(&[target.kind(), outcome])
                        .inc();
                    return Ok(receipt);
                }
            }
        }
    }

    /// The caller's current vote on a target, for UI state
    pub async fn vote_status(&self, user_id: Uuid, target: VoteTarget) -> Result<VoteStatus> {
        let exists = match target {
            VoteTarget::Post(post_id) => {
                crate::db::post_repo::post_exists(&self.pool, post_id).await?
            }
            VoteTarget::Comment(comment_id) => {
                crate::db::comment_repo::comment_exists(&self.pool, comment_id).await?
            }
        };
        if !exists {
            return Err(AppError::NotFound(format!("{} not found", target.kind())));
        }

        let mut conn = self.pool.acquire().await?;
        let vote = vote_repo::find_vote(&mut conn, user_id, target).await?;
        let vote_type = vote.as_ref().and_then(|v| VoteType::parse(&v.vote_type));

        Ok(VoteStatus {
            voted: vote_type.is_some(),
            vote_type,
        })
    }

    async fn try_apply(
        &self,
        user_id: Uuid,
        target: VoteTarget,
        requested: VoteType,
    ) -> Result<VoteReceipt> {
        let mut tx = self.pool.begin().await?;

        let existing = vote_repo::find_vote(&mut tx, user_id, target)
            .await?
            .map(|vote| {
                VoteType::parse(&vote.vote_type).ok_or_else(|| {
                    AppError::Internal(format!("Corrupt vote record {}", vote.id))
                })
            })
            .transpose()?;

        let transition = VoteTransition::decide(existing, requested);

        let applied = match transition {
            VoteTransition::Create(vote_type) => {
                vote_repo::insert_vote(&mut tx, user_id, target, vote_type).await?
            }
            VoteTransition::Remove(vote_type) => {
                vote_repo::delete_vote(&mut tx, user_id, target, vote_type).await?
            }
            VoteTransition::Switch { from, to } => {
                vote_repo::switch_vote(&mut tx, user_id, target, from, to).await?
            }
        };

        if !applied {
            tx.rollback().await?;
            return Err(AppError::Conflict(format!(
                "Vote record for target {} changed concurrently",
                target.id()
            )));
        }

        let counters = self
            .counters
            .apply_vote_deltas(&mut tx, target, transition.deltas())
            .await?;

        let (upvotes, downvotes) = match counters {
            Some(counts) => counts,
            None => {
                // Target vanished under us; roll everything back so the
                // ledger write is not left behind.
                tx.rollback().await?;
                return Err(AppError::NotFound(format!("{} not found", target.kind())));
            }
        };

        tx.commit().await?;

        let vote_type = transition.resulting_state();
        Ok(VoteReceipt {
            voted: vote_type.is_some(),
            vote_type,
            upvotes,
            downvotes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_vote_creates_and_increments() {
        let t = VoteTransition::decide(None, VoteType::Upvote);
        assert_eq!(t, VoteTransition::Create(VoteType::Upvote));
        assert_eq!(t.deltas(), VoteDeltas { upvotes: 1, downvotes: 0 });
        assert_eq!(t.resulting_state(), Some(VoteType::Upvote));
    }

    #[test]
    fn repeating_a_vote_toggles_it_off() {
        let t = VoteTransition::decide(Some(VoteType::Upvote), VoteType::Upvote);
        assert_eq!(t, VoteTransition::Remove(VoteType::Upvote));
        assert_eq!(t.deltas(), VoteDeltas { upvotes: -1, downvotes: 0 });
        assert_eq!(t.resulting_state(), None);

        let t = VoteTransition::decide(Some(VoteType::Downvote), VoteType::Downvote);
        assert_eq!(t.deltas(), VoteDeltas { upvotes: 0, downvotes: -1 });
        assert_eq!(t.resulting_state(), None);
    }

    #[test]
    fn opposite_vote_switches_with_paired_deltas() {
        let t = VoteTransition::decide(Some(VoteType::Upvote), VoteType::Downvote);
        assert_eq!(
            t,
            VoteTransition::Switch {
                from: VoteType::Upvote,
                to: VoteType::Downvote
            }
        );
        assert_eq!(t.deltas(), VoteDeltas { upvotes: -1, downvotes: 1 });
        assert_eq!(t.resulting_state(), Some(VoteType::Downvote));
    }

    #[test]
    fn switch_conserves_total_vote_count() {
        for (from, to) in [
            (VoteType::Upvote, VoteType::Downvote),
            (VoteType::Downvote, VoteType::Upvote),
        ] {
            let deltas = VoteTransition::decide(Some(from), to).deltas();
            assert_eq!(deltas.upvotes + deltas.downvotes, 0);
            assert_eq!(deltas.upvotes.abs(), 1);
        }
    }

    #[test]
    fn double_vote_round_trip_returns_to_the_initial_state() {
        // upvote then upvote again: net counter movement is zero and the
        // ledger ends where it started.
        let first = VoteTransition::decide(None, VoteType::Upvote);
        let second = VoteTransition::decide(first.resulting_state(), VoteType::Upvote);

        let net_up = first.deltas().upvotes + second.deltas().upvotes;
        let net_down = first.deltas().downvotes + second.deltas().downvotes;
        assert_eq!((net_up, net_down), (0, 0));
        assert_eq!(second.resulting_state(), None);
    }

    #[test]
    fn every_reachable_delta_keeps_counters_non_negative() {
        // Starting from counters that reflect the pre-state, no transition
        // drives a counter below zero.
        let states = [None, Some(VoteType::Upvote), Some(VoteType::Downvote)];
        for existing in states {
            for requested in [VoteType::Upvote, VoteType::Downvote] {
                let (up, down) = match existing {
                    Some(VoteType::Upvote) => (1i64, 0i64),
                    Some(VoteType::Downvote) => (0, 1),
                    None => (0, 0),
                };
                let deltas = VoteTransition::decide(existing, requested).deltas();
                assert!(up + deltas.upvotes >= 0);
                assert!(down + deltas.downvotes >= 0);
            }
        }
    }
}
