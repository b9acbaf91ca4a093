//! Denormalized counter maintenance.
//!
//! This service is the only mutation path for the upvote/downvote,
//! comment-count, reply-count and view counters stored on content rows.
//! Vote deltas are applied as one multi-column `UPDATE` so both halves of
//! a switch land together, and the callers run that statement inside their
//! own transaction alongside the vote-record write.
//!
//! The counters are caches of the votes/comments tables;
//! [`CounterService::reconcile_from_ledger`] recomputes them from those
//! source tables and corrects any drift.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::VoteTarget;

/// Signed counter deltas produced by a vote transition. Values are always
/// -1, 0 or +1; a switch carries one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteDeltas {
    pub upvotes: i64,
    pub downvotes: i64,
}

/// Totals corrected by a reconciliation pass, per counter family.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReconcileReport {
    pub post_vote_rows: u64,
    pub comment_vote_rows: u64,
    pub comment_count_rows: u64,
    pub reply_count_rows: u64,
}

impl ReconcileReport {
    pub fn total(&self) -> u64 {
        self.post_vote_rows + self.comment_vote_rows + self.comment_count_rows + self.reply_count_rows
    }
}

#[derive(Clone)]
pub struct CounterService {
    pool: PgPool,
}

impl CounterService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply both vote deltas to the target's counters in a single
    /// statement, returning the updated (upvotes, downvotes) pair, or
    /// `None` when the target row does not exist. Runs on the caller's
    /// transaction connection so it commits or rolls back together with
    /// the vote-record write.
    pub async fn apply_vote_deltas(
        &self,
        conn: &mut PgConnection,
        target: VoteTarget,
        deltas: VoteDeltas,
    ) -> Result<Option<(i64, i64)>> {
        let updated = match target {
            VoteTarget::Post(post_id) => {
                sqlx::query_as::<_, (i64, i64)>(
                    r#"
                    UPDATE posts
                    SET upvotes = upvotes + $1, downvotes = downvotes + $2, updated_at = NOW()
                    WHERE id = $3
                    RETURNING upvotes, downvotes
                    "#,
                )
                .bind(deltas.upvotes)
                .bind(deltas.downvotes)
                .bind(post_id)
                .fetch_optional(&mut *conn)
                .await?
            }
            VoteTarget::Comment(comment_id) => {
                sqlx::query_as::<_, (i64, i64)>(
                    r#"
                    UPDATE comments
                    SET upvotes = upvotes + $1, downvotes = downvotes + $2, updated_at = NOW()
                    WHERE id = $3
                    RETURNING upvotes, downvotes
                    "#,
                )
                .bind(deltas.upvotes)
                .bind(deltas.downvotes)
                .bind(comment_id)
                .fetch_optional(&mut *conn)
                .await?
            }
        };

        Ok(updated)
    }

    /// Adjust a post's comment count (±1). Used by comment creation and
    /// deletion, never by voting.
    pub async fn increment_comment_count(
        &self,
        conn: &mut PgConnection,
        post_id: Uuid,
        delta: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET comment_count = comment_count + $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(delta)
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Adjust a parent comment's reply count (±1)
    pub async fn increment_reply_count(
        &self,
        conn: &mut PgConnection,
        comment_id: Uuid,
        delta: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE comments
            SET reply_count = reply_count + $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(delta)
        .bind(comment_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Bump a post's view counter. Concurrent bumps commute, so this is a
    /// plain atomic add outside any transaction.
    pub async fn increment_view_count(&self, post_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE posts
            SET views = views + 1
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Recompute every denormalized counter from its source table and fix
    /// rows that drifted. Returns how many rows each pass corrected.
    pub async fn reconcile_from_ledger(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        let result = sqlx::query(
            r#"
            UPDATE posts p
            SET upvotes = s.up, downvotes = s.down, updated_at = NOW()
            FROM (
                SELECT p2.id,
                       COALESCE(v.up, 0) AS up,
                       COALESCE(v.down, 0) AS down
                FROM posts p2
                LEFT JOIN (
                    SELECT target_id,
                           COUNT(*) FILTER (WHERE vote_type = 'upvote') AS up,
                           COUNT(*) FILTER (WHERE vote_type = 'downvote') AS down
                    FROM votes
                    WHERE target_type = 'post'
                    GROUP BY target_id
                ) v ON v.target_id = p2.id
            ) s
            WHERE p.id = s.id AND (p.upvotes <> s.up OR p.downvotes <> s.down)
            "#,
        )
        .execute(&self.pool)
        .await?;
        report.post_vote_rows = result.rows_affected();

        let result = sqlx::query(
            r#"
            UPDATE comments c
            SET upvotes = s.up, downvotes = s.down, updated_at = NOW()
            FROM (
                SELECT c2.id,
                       COALESCE(v.up, 0) AS up,
                       COALESCE(v.down, 0) AS down
                FROM comments c2
                LEFT JOIN (
                    SELECT target_id,
                           COUNT(*) FILTER (WHERE vote_type = 'upvote') AS up,
                           COUNT(*) FILTER (WHERE vote_type = 'downvote') AS down
                    FROM votes
                    WHERE target_type = 'comment'
                    GROUP BY target_id
                ) v ON v.target_id = c2.id
            ) s
            WHERE c.id = s.id AND (c.upvotes <> s.up OR c.downvotes <> s.down)
            "#,
        )
        .execute(&self.pool)
        .await?;
        report.comment_vote_rows = result.rows_affected();

        let result = sqlx::query(
            r#"
            UPDATE posts p
            SET comment_count = s.cnt, updated_at = NOW()
            FROM (
                SELECT p2.id, COALESCE(c.cnt, 0) AS cnt
                FROM posts p2
                LEFT JOIN (
                    SELECT post_id, COUNT(*) AS cnt
                    FROM comments
                    WHERE is_deleted = FALSE
                    GROUP BY post_id
                ) c ON c.post_id = p2.id
            ) s
            WHERE p.id = s.id AND p.comment_count <> s.cnt
            "#,
        )
        .execute(&self.pool)
        .await?;
        report.comment_count_rows = result.rows_affected();

        let result = sqlx::query(
            r#"
            UPDATE comments c
            SET reply_count = s.cnt, updated_at = NOW()
            FROM (
                SELECT c2.id, COALESCE(r.cnt, 0) AS cnt
                FROM comments c2
                LEFT JOIN (
                    SELECT parent_id, COUNT(*) AS cnt
                    FROM comments
                    WHERE parent_id IS NOT NULL AND is_deleted = FALSE
                    GROUP BY parent_id
                ) r ON r.parent_id = c2.id
            ) s
            WHERE c.id = s.id AND c.reply_count <> s.cnt
            "#,
        )
        .execute(&self.pool)
        .await?;
        report.reply_count_rows = result.rows_affected();

        Ok(report)
    }
}
