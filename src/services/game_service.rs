//! Game Service
//!
//! Training game sessions: dealing questions, recording answers, finishing
//! sessions and awarding experience.

use std::sync::Arc;

use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use crate::logging::log_game_completed;
use crate::models::game_session::{
    AnswerOutcome, Difficulty, GameSession, GameSessionError, GameStats, GameStatus, GameType,
    GameTypeStats, StartGameRequest, SubmitAnswerRequest,
};
use crate::models::pagination::{Page, PageParams};
use crate::models::quiz::{self, QuizQuestion};
use crate::services::user_service::{apply_xp, XpAward};

const SESSION_COLUMNS: &str = "id, user_id, game_type, difficulty, status, score, correct_answers, \
                               total_questions, question_ids, answers, current_streak, xp_earned, \
                               created_at, updated_at, completed_at";

// Database row structure for game sessions
#[derive(Debug, sqlx::FromRow)]
struct GameSessionRow {
    id: String,
    user_id: String,
    game_type: String,
    difficulty: String,
    status: String,
    score: i64,
    correct_answers: i64,
    total_questions: i64,
    question_ids: String,
    answers: String,
    current_streak: i64,
    xp_earned: i64,
    created_at: i64,
    updated_at: i64,
    completed_at: Option<i64>,
}

fn corrupt(field: &'static str, value: &str) -> GameSessionError {
    GameSessionError::CorruptRecord {
        field,
        value: value.to_string(),
    }
}

impl GameSessionRow {
    fn into_session(self) -> AppResult<GameSession> {
        let game_type = self
            .game_type
            .parse::<GameType>()
            .map_err(|_| corrupt("game_type", &self.game_type))?;
        let difficulty = self
            .difficulty
            .parse::<Difficulty>()
            .map_err(|_| corrupt("difficulty", &self.difficulty))?;
        let status = self
            .status
            .parse::<GameStatus>()
            .map_err(|_| corrupt("status", &self.status))?;

        Ok(GameSession {
            id: self.id,
            user_id: self.user_id,
            game_type,
            difficulty,
            status,
            score: self.score,
            correct_answers: self.correct_answers,
            total_questions: self.total_questions,
            question_ids: serde_json::from_str(&self.question_ids)?,
            answers: serde_json::from_str(&self.answers)?,
            current_streak: self.current_streak,
            xp_earned: self.xp_earned,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        })
    }
}

/// A session together with the questions it dealt
#[derive(Debug, Clone, Serialize)]
pub struct GameSessionView {
    #[serde(flatten)]
    pub session: GameSession,
    pub questions: Vec<&'static QuizQuestion>,
}

impl GameSessionView {
    fn new(session: GameSession) -> Self {
        let questions = session
            .question_ids
            .iter()
            .filter_map(|id| quiz::find_question(id))
            .collect();
        Self { session, questions }
    }
}

/// Game service responsible for session lifecycle
#[derive(Debug, Clone)]
pub struct GameService {
    database_manager: Arc<DatabaseManager>,
}

impl GameService {
    pub fn new(database_manager: Arc<DatabaseManager>) -> Self {
        Self { database_manager }
    }

    /// Deal a new session
    pub async fn start(&self, user_id: &str, request: StartGameRequest) -> AppResult<GameSessionView> {
        let questions = quiz::questions_for(request.game_type, request.difficulty);
        if questions.is_empty() {
            return Err(AppError::bad_request("no questions available for this game"));
        }

        let session = GameSession::new(user_id, request.game_type, request.difficulty, &questions);

        sqlx::query(
            r#"
            INSERT INTO game_sessions (id, user_id, game_type, difficulty, status, score,
                                       correct_answers, total_questions, question_ids, answers,
                                       current_streak, xp_earned, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 0, 0, ?, ?, '[]', 0, 0, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.game_type.as_ref())
        .bind(session.difficulty.as_ref())
        .bind(session.status.as_ref())
        .bind(session.total_questions)
        .bind(serde_json::to_string(&session.question_ids)?)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.database_manager.pool)
        .await?;

        info!(
            user_id = %user_id,
            session_id = %session.id,
            game_type = %session.game_type,
            difficulty = %session.difficulty,
            "Game session started"
        );
        Ok(GameSessionView::new(session))
    }

    /// Load a session owned by `user_id`; other players' sessions are not found
    async fn load(&self, user_id: &str, session_id: &str) -> AppResult<GameSession> {
        let row = sqlx::query_as::<_, GameSessionRow>(&format!(
            "SELECT {} FROM game_sessions WHERE id = ? AND user_id = ?",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.database_manager.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Game session"))?;

        row.into_session()
    }

    pub async fn get(&self, user_id: &str, session_id: &str) -> AppResult<GameSessionView> {
        Ok(GameSessionView::new(self.load(user_id, session_id).await?))
    }

    /// Record an answer to one of the session's questions
    pub async fn submit_answer(
        &self,
        user_id: &str,
        session_id: &str,
        request: SubmitAnswerRequest,
    ) -> AppResult<AnswerOutcome> {
        let mut session = self.load(user_id, session_id).await?;
        let question = quiz::find_question(&request.question_id)
            .ok_or_else(|| GameSessionError::QuestionNotInSession(request.question_id.clone()))?;

        let outcome = session.record_answer(question, request.selected_option)?;

        let mut conn = self.database_manager.pool.acquire().await?;
        save(&mut conn, &session, session.answers.len() - 1).await?;

        debug!(
            session_id = %session.id,
            question_id = %outcome.question_id,
            correct = outcome.correct,
            "Answer recorded"
        );
        Ok(outcome)
    }

    /// Finish a session and credit the experience it earned
    pub async fn complete(&self, user_id: &str, session_id: &str) -> AppResult<GameSession> {
        let mut session = self.load(user_id, session_id).await?;
        let answered = session.answers.len();
        let xp = session.complete()?;

        let mut tx = self.database_manager.pool.begin().await?;
        save(&mut tx, &session, answered).await?;
        apply_xp(
            &mut tx,
            user_id,
            XpAward {
                xp,
                games_played: 1,
                threats_reported: 0,
            },
        )
        .await?;
        tx.commit().await?;

        log_game_completed(
            user_id,
            &session.id,
            session.game_type.as_ref(),
            session.score,
            xp,
        );
        Ok(session)
    }

    pub async fn abandon(&self, user_id: &str, session_id: &str) -> AppResult<GameSession> {
        let mut session = self.load(user_id, session_id).await?;
        let answered = session.answers.len();
        session.abandon()?;

        let mut conn = self.database_manager.pool.acquire().await?;
        save(&mut conn, &session, answered).await?;

        info!(user_id = %user_id, session_id = %session.id, "Game session abandoned");
        Ok(session)
    }

    /// Session history, newest first
    pub async fn list(&self, user_id: &str, params: PageParams) -> AppResult<Page<GameSession>> {
        params.validate()?;
        let pool = &self.database_manager.pool;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM game_sessions WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        let rows = sqlx::query_as::<_, GameSessionRow>(&format!(
            "SELECT {} FROM game_sessions WHERE user_id = ? \
             ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            SESSION_COLUMNS
        ))
        .bind(user_id)
        .bind(i64::from(params.limit()))
        .bind(params.offset())
        .fetch_all(pool)
        .await?;

        let items = rows
            .into_iter()
            .map(GameSessionRow::into_session)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Page::new(items, &params, total))
    }

    /// Aggregate statistics across a player's sessions
    pub async fn stats(&self, user_id: &str) -> AppResult<GameStats> {
        let pool = &self.database_manager.pool;

        let (games_completed, games_abandoned, total_score, total_xp, best_score, correct, answered): (
            i64,
            i64,
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'abandoned' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'completed' THEN score ELSE 0 END), 0),
                COALESCE(SUM(xp_earned), 0),
                COALESCE(MAX(CASE WHEN status = 'completed' THEN score END), 0),
                COALESCE(SUM(correct_answers), 0),
                COALESCE(SUM(json_array_length(answers)), 0)
            FROM game_sessions
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT game_type, COUNT(*), MAX(score)
            FROM game_sessions
            WHERE user_id = ? AND status = 'completed'
            GROUP BY game_type
            ORDER BY game_type
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let by_game_type = rows
            .into_iter()
            .map(|(game_type, games_completed, best_score)| {
                let game_type = game_type
                    .parse::<GameType>()
                    .map_err(|_| corrupt("game_type", &game_type))?;
                Ok(GameTypeStats {
                    game_type,
                    games_completed,
                    best_score,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(GameStats {
            games_completed,
            games_abandoned,
            total_score,
            total_xp,
            best_score,
            accuracy: if answered > 0 {
                correct as f64 / answered as f64
            } else {
                0.0
            },
            by_game_type,
        })
    }
}

/// Persist session progress
///
/// Only succeeds while the stored row is still in progress with `answered`
/// recorded answers, so a concurrent update cannot be overwritten.
async fn save(conn: &mut SqliteConnection, session: &GameSession, answered: usize) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE game_sessions
        SET status = ?, score = ?, correct_answers = ?, answers = ?, current_streak = ?,
            xp_earned = ?, updated_at = ?, completed_at = ?
        WHERE id = ? AND status = 'in_progress' AND json_array_length(answers) = ?
        "#,
    )
    .bind(session.status.as_ref())
    .bind(session.score)
    .bind(session.correct_answers)
    .bind(serde_json::to_string(&session.answers)?)
    .bind(session.current_streak)
    .bind(session.xp_earned)
    .bind(session.updated_at)
    .bind(session.completed_at)
    .bind(&session.id)
    .bind(answered as i64)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::conflict("game session was modified concurrently"));
    }
    Ok(())
}
