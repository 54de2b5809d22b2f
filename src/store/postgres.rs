use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Postgres, Row, Transaction};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

use crate::challenge::models::{ChallengeModel, ChallengeStatus, MatchModel, MatchResult, Side};
use crate::challenge::repository::{ChallengeRepository, ResultSubmission, StatusTransition};
use crate::challenge::settlement::{SettlementOutcome, SettlementPlan};
use crate::ranking::repository::RankingRepository;
use crate::ranking::{RankingDelta, RankingModel};
use crate::shared::AppError;

const CHALLENGE_COLUMNS: &str = "id, challenger_id, challenged_id, game_id, status, \
                                 challenger_result, challenged_result, created_at, updated_at";
const MATCH_COLUMNS: &str = "id, challenge_id, game_id, player1_id, player2_id, player1_result, \
                             player2_result, winner_id, created_at";
const RANKING_COLUMNS: &str = "id, player_id, game_id, points, wins, losses, updated_at";

/// PostgreSQL challenge, match and ranking store.
///
/// Guarded writes lock the challenge row inside a transaction; a settlement
/// commits the match, both ranking upserts and the status change together.
pub struct PostgresGameStore {
    pool: PgPool,
}

impl PostgresGameStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, AppError> {
        self.pool.begin().await.map_err(db_error)
    }
}

fn db_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Database operation failed");
    AppError::DatabaseError(e.to_string())
}

fn parse_column<T: FromStr>(value: &str, column: &str) -> Result<T, AppError> {
    value.parse().map_err(|_| {
        warn!(column, value, "Unexpected value stored in column");
        AppError::DatabaseError(format!("Invalid {} value: {}", column, value))
    })
}

fn challenge_from_row(row: &PgRow) -> Result<ChallengeModel, AppError> {
    let status: String = row.try_get("status").map_err(db_error)?;
    let challenger_result: Option<String> = row.try_get("challenger_result").map_err(db_error)?;
    let challenged_result: Option<String> = row.try_get("challenged_result").map_err(db_error)?;

    Ok(ChallengeModel {
        id: row.try_get("id").map_err(db_error)?,
        challenger_id: row.try_get("challenger_id").map_err(db_error)?,
        challenged_id: row.try_get("challenged_id").map_err(db_error)?,
        game_id: row.try_get("game_id").map_err(db_error)?,
        status: parse_column::<ChallengeStatus>(&status, "status")?,
        challenger_result: challenger_result
            .map(|r| parse_column::<MatchResult>(&r, "challenger_result"))
            .transpose()?,
        challenged_result: challenged_result
            .map(|r| parse_column::<MatchResult>(&r, "challenged_result"))
            .transpose()?,
        created_at: row.try_get("created_at").map_err(db_error)?,
        updated_at: row.try_get("updated_at").map_err(db_error)?,
    })
}

async fn lock_challenge(
    tx: &mut Transaction<'static, Postgres>,
    challenge_id: &str,
) -> Result<Option<ChallengeModel>, AppError> {
    let query = format!(
        "SELECT {} FROM challenges WHERE id = $1 FOR UPDATE",
        CHALLENGE_COLUMNS
    );
    let row = sqlx::query(&query)
        .bind(challenge_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error)?;

    row.as_ref().map(challenge_from_row).transpose()
}

/// Adds a delta to the (player, game) ranking in one statement so the
/// addition always applies to the row value current at write time
async fn upsert_ranking(
    tx: &mut Transaction<'static, Postgres>,
    delta: &RankingDelta,
) -> Result<RankingModel, AppError> {
    let query = format!(
        "INSERT INTO rankings (id, player_id, game_id, points, wins, losses, updated_at) \
         VALUES ($1, $2, $3, GREATEST($4, 0), $5, $6, $7) \
         ON CONFLICT (player_id, game_id) DO UPDATE SET \
           points = GREATEST(rankings.points + $4, 0), \
           wins = rankings.wins + $5, \
           losses = rankings.losses + $6, \
           updated_at = $7 \
         RETURNING {}",
        RANKING_COLUMNS
    );

    sqlx::query_as::<_, RankingModel>(&query)
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&delta.player_id)
        .bind(&delta.game_id)
        .bind(delta.points)
        .bind(delta.wins)
        .bind(delta.losses)
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await
        .map_err(db_error)
}

impl PostgresGameStore {
    async fn challenges_where(
        &self,
        condition: &str,
        player_id: &str,
    ) -> Result<Vec<ChallengeModel>, AppError> {
        let query = format!(
            "SELECT {} FROM challenges WHERE {} ORDER BY created_at DESC",
            CHALLENGE_COLUMNS, condition
        );
        let rows = sqlx::query(&query)
            .bind(player_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter().map(challenge_from_row).collect()
    }
}

#[async_trait]
impl ChallengeRepository for PostgresGameStore {
    #[instrument(skip(self, challenge))]
    async fn create_challenge(&self, challenge: &ChallengeModel) -> Result<(), AppError> {
        debug!(challenge_id = %challenge.id, "Creating challenge in database");

        sqlx::query(
            "INSERT INTO challenges (id, challenger_id, challenged_id, game_id, status, \
             challenger_result, challenged_result, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&challenge.id)
        .bind(&challenge.challenger_id)
        .bind(&challenge.challenged_id)
        .bind(&challenge.game_id)
        .bind(challenge.status.to_string())
        .bind(challenge.challenger_result.map(|r| r.to_string()))
        .bind(challenge.challenged_result.map(|r| r.to_string()))
        .bind(challenge.created_at)
        .bind(challenge.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_challenge(&self, challenge_id: &str) -> Result<Option<ChallengeModel>, AppError> {
        let query = format!("SELECT {} FROM challenges WHERE id = $1", CHALLENGE_COLUMNS);
        let row = sqlx::query(&query)
            .bind(challenge_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.as_ref().map(challenge_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn incoming_challenges(&self, player_id: &str) -> Result<Vec<ChallengeModel>, AppError> {
        self.challenges_where("challenged_id = $1 AND status = 'pending'", player_id)
            .await
    }

    #[instrument(skip(self))]
    async fn outgoing_challenges(&self, player_id: &str) -> Result<Vec<ChallengeModel>, AppError> {
        self.challenges_where("challenger_id = $1", player_id).await
    }

    #[instrument(skip(self))]
    async fn accepted_challenges(&self, player_id: &str) -> Result<Vec<ChallengeModel>, AppError> {
        self.challenges_where(
            "(challenger_id = $1 OR challenged_id = $1) AND status = 'accepted'",
            player_id,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn transition_status(
        &self,
        challenge_id: &str,
        expected: ChallengeStatus,
        next: ChallengeStatus,
    ) -> Result<StatusTransition, AppError> {
        let mut tx = self.begin().await?;

        let Some(mut challenge) = lock_challenge(&mut tx, challenge_id).await? else {
            return Ok(StatusTransition::NotFound);
        };

        if challenge.status != expected {
            debug!(current = %challenge.status, expected = %expected, "Status transition refused");
            return Ok(StatusTransition::WrongStatus(challenge.status));
        }

        challenge.set_status(next);
        sqlx::query("UPDATE challenges SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(challenge_id)
            .bind(next.to_string())
            .bind(challenge.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        debug!(from = %expected, to = %next, "Challenge status changed");
        Ok(StatusTransition::Applied(challenge))
    }

    #[instrument(skip(self))]
    async fn record_result(
        &self,
        challenge_id: &str,
        player_id: &str,
        result: MatchResult,
    ) -> Result<ResultSubmission, AppError> {
        let mut tx = self.begin().await?;

        let Some(mut challenge) = lock_challenge(&mut tx, challenge_id).await? else {
            return Ok(ResultSubmission::NotFound);
        };

        let Some(side) = challenge.side_of(player_id) else {
            return Ok(ResultSubmission::NotParticipant);
        };

        if challenge.status != ChallengeStatus::Accepted {
            return Ok(ResultSubmission::NotActive(challenge.status));
        }

        if challenge.result_of(side).is_some() {
            return Ok(ResultSubmission::AlreadySubmitted);
        }

        challenge.set_result(side, result);
        let column = match side {
            Side::Challenger => "challenger_result",
            Side::Challenged => "challenged_result",
        };
        let update = format!(
            "UPDATE challenges SET {} = $2, updated_at = $3 WHERE id = $1",
            column
        );
        sqlx::query(&update)
            .bind(challenge_id)
            .bind(result.to_string())
            .bind(challenge.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        debug!(result = %result, "Result recorded in database");
        Ok(ResultSubmission::Recorded(challenge))
    }

    #[instrument(skip(self, plan), fields(challenge_id = %plan.challenge_id()))]
    async fn apply_settlement(
        &self,
        plan: &SettlementPlan,
    ) -> Result<SettlementOutcome, AppError> {
        let mut tx = self.begin().await?;

        let challenge = lock_challenge(&mut tx, plan.challenge_id())
            .await?
            .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))?;

        if challenge.status != ChallengeStatus::Accepted || !challenge.has_both_results() {
            info!("Challenge already settled; nothing written");
            return Ok(SettlementOutcome::AlreadySettled);
        }

        let (next_status, outcome) = match plan {
            SettlementPlan::Dispute { .. } => {
                (ChallengeStatus::Disputed, SettlementOutcome::Disputed)
            }
            SettlementPlan::Complete {
                record,
                winner,
                loser,
                ..
            } => {
                sqlx::query(
                    "INSERT INTO matches (id, challenge_id, game_id, player1_id, player2_id, \
                     player1_result, player2_result, winner_id, created_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                )
                .bind(&record.id)
                .bind(&record.challenge_id)
                .bind(&record.game_id)
                .bind(&record.player1_id)
                .bind(&record.player2_id)
                .bind(&record.player1_result)
                .bind(&record.player2_result)
                .bind(&record.winner_id)
                .bind(record.created_at)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;

                upsert_ranking(&mut tx, winner).await?;
                upsert_ranking(&mut tx, loser).await?;

                (
                    ChallengeStatus::Completed,
                    SettlementOutcome::Completed(record.clone()),
                )
            }
        };

        sqlx::query("UPDATE challenges SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(plan.challenge_id())
            .bind(next_status.to_string())
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        info!(status = %next_status, "Settlement applied");
        Ok(outcome)
    }

    #[instrument(skip(self))]
    async fn match_history(&self, player_id: &str) -> Result<Vec<MatchModel>, AppError> {
        let query = format!(
            "SELECT {} FROM matches WHERE player1_id = $1 OR player2_id = $1 ORDER BY created_at DESC",
            MATCH_COLUMNS
        );
        sqlx::query_as::<_, MatchModel>(&query)
            .bind(player_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }
}

#[async_trait]
impl RankingRepository for PostgresGameStore {
    #[instrument(skip(self))]
    async fn get_ranking(
        &self,
        player_id: &str,
        game_id: &str,
    ) -> Result<Option<RankingModel>, AppError> {
        let query = format!(
            "SELECT {} FROM rankings WHERE player_id = $1 AND game_id = $2",
            RANKING_COLUMNS
        );
        sqlx::query_as::<_, RankingModel>(&query)
            .bind(player_id)
            .bind(game_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    #[instrument(skip(self))]
    async fn leaderboard(
        &self,
        game_id: &str,
        limit: usize,
    ) -> Result<Vec<RankingModel>, AppError> {
        let query = format!(
            "SELECT {} FROM rankings WHERE game_id = $1 \
             ORDER BY points DESC, wins DESC, player_id ASC LIMIT $2",
            RANKING_COLUMNS
        );
        sqlx::query_as::<_, RankingModel>(&query)
            .bind(game_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }

    #[instrument(skip(self))]
    async fn rankings_for_player(&self, player_id: &str) -> Result<Vec<RankingModel>, AppError> {
        let query = format!(
            "SELECT {} FROM rankings WHERE player_id = $1 ORDER BY game_id",
            RANKING_COLUMNS
        );
        sqlx::query_as::<_, RankingModel>(&query)
            .bind(player_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }
}
