use crate::models::{Vote, VoteTarget, VoteType};
use sqlx::PgConnection;
use uuid::Uuid;

/// Look up the caller's open vote on a target, if any
pub async fn find_vote(
    conn: &mut PgConnection,
    user_id: Uuid,
    target: VoteTarget,
) -> Result<Option<Vote>, sqlx::Error> {
    let vote = sqlx::query_as::<_, Vote>(
        r#"
        SELECT id, user_id, target_id, target_type, vote_type, created_at
        FROM votes
        WHERE user_id = $1 AND target_id = $2 AND target_type = $3
        "#,
    )
    .bind(user_id)
    .bind(target.id())
    .bind(target.kind())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(vote)
}

/// Insert-if-absent. Returns false when another request from the same user
/// created the row first; the unique index on (user_id, target_id,
/// target_type) is what makes this a compare-and-set.
pub async fn insert_vote(
    conn: &mut PgConnection,
    user_id: Uuid,
    target: VoteTarget,
    vote_type: VoteType,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO votes (user_id, target_id, target_type, vote_type)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, target_id, target_type) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(target.id())
    .bind(target.kind())
    .bind(vote_type.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Flip an existing vote, guarded by its expected current type. Returns
/// false when the record no longer holds `from` (lost race or toggle-off
/// landed in between).
pub async fn switch_vote(
    conn: &mut PgConnection,
    user_id: Uuid,
    target: VoteTarget,
    from: VoteType,
    to: VoteType,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE votes
        SET vote_type = $5
        WHERE user_id = $1 AND target_id = $2 AND target_type = $3 AND vote_type = $4
        "#,
    )
    .bind(user_id)
    .bind(target.id())
    .bind(target.kind())
    .bind(from.as_str())
    .bind(to.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove a vote, guarded by its expected current type
pub async fn delete_vote(
    conn: &mut PgConnection,
    user_id: Uuid,
    target: VoteTarget,
    expected: VoteType,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM votes
        WHERE user_id = $1 AND target_id = $2 AND target_type = $3 AND vote_type = $4
        "#,
    )
    .bind(user_id)
    .bind(target.id())
    .bind(target.kind())
    .bind(expected.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}
