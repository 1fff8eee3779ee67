//! Game Session Model
//!
//! A single play-through of a training game: the questions dealt, the
//! answers given, and the score and experience it produced.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use super::quiz::QuizQuestion;

/// Bonus experience for answering every question correctly
pub const PERFECT_RUN_BONUS: i64 = 50;

/// Bonus points per consecutive correct answer after the first
pub const STREAK_BONUS: i64 = 5;

/// Training game types
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameType {
    PhishingSpotter,
    PasswordHero,
    ScamBuster,
    SafeChat,
}

impl GameType {
    pub fn display_name(&self) -> &'static str {
        match self {
            GameType::PhishingSpotter => "Phishing Spotter",
            GameType::PasswordHero => "Password Hero",
            GameType::ScamBuster => "Scam Buster",
            GameType::SafeChat => "Safe Chat",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GameType::PhishingSpotter => "Tell real messages from phishing attempts",
            GameType::PasswordHero => "Build and protect strong passwords",
            GameType::ScamBuster => "Recognize too-good-to-be-true offers",
            GameType::SafeChat => "Stay safe when talking to people online",
        }
    }
}

/// Difficulty tiers; harder tiers deal more questions
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Easy
    }
}

impl Difficulty {
    /// Experience multiplier in halves (2 = 1.0x)
    pub fn xp_multiplier_halves(&self) -> i64 {
        match self {
            Difficulty::Easy => 2,
            Difficulty::Medium => 3,
            Difficulty::Hard => 4,
        }
    }
}

/// Lifecycle state of a session
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Completed,
    Abandoned,
}

/// One recorded answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub selected_option: usize,
    pub correct: bool,
    pub points_awarded: i64,
}

/// Result returned to the player after answering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub question_id: String,
    pub correct: bool,
    pub correct_option: usize,
    pub explanation: String,
    pub points_awarded: i64,
    pub score: i64,
    pub streak: i64,
    pub remaining_questions: usize,
}

/// A play-through of one game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    pub id: String,
    pub user_id: String,
    pub game_type: GameType,
    pub difficulty: Difficulty,
    pub status: GameStatus,
    pub score: i64,
    pub correct_answers: i64,
    pub total_questions: i64,
    pub question_ids: Vec<String>,
    pub answers: Vec<AnswerRecord>,
    pub current_streak: i64,
    pub xp_earned: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub completed_at: Option<i64>,
}

impl GameSession {
    /// Start a session over the given questions
    pub fn new(
        user_id: &str,
        game_type: GameType,
        difficulty: Difficulty,
        questions: &[&QuizQuestion],
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            game_type,
            difficulty,
            status: GameStatus::InProgress,
            score: 0,
            correct_answers: 0,
            total_questions: questions.len() as i64,
            question_ids: questions.iter().map(|q| q.id.to_string()).collect(),
            answers: Vec::new(),
            current_streak: 0,
            xp_earned: 0,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == GameStatus::InProgress
    }

    pub fn has_answered(&self, question_id: &str) -> bool {
        self.answers.iter().any(|a| a.question_id == question_id)
    }

    pub fn remaining_questions(&self) -> usize {
        self.question_ids.len().saturating_sub(self.answers.len())
    }

    /// Fraction of answered questions that were correct
    pub fn accuracy(&self) -> f64 {
        if self.answers.is_empty() {
            0.0
        } else {
            self.correct_answers as f64 / self.answers.len() as f64
        }
    }

    /// Record an answer to one of the dealt questions
    pub fn record_answer(
        &mut self,
        question: &QuizQuestion,
        selected_option: usize,
    ) -> Result<AnswerOutcome, GameSessionError> {
        if !self.is_in_progress() {
            return Err(GameSessionError::NotInProgress(self.status));
        }
        if !self.question_ids.iter().any(|id| id == question.id) {
            return Err(GameSessionError::QuestionNotInSession(question.id.to_string()));
        }
        if self.has_answered(question.id) {
            return Err(GameSessionError::AlreadyAnswered(question.id.to_string()));
        }
        if selected_option >= question.options.len() {
            return Err(GameSessionError::InvalidOption {
                selected: selected_option,
                available: question.options.len(),
            });
        }

        let correct = selected_option == question.correct_option;
        let points_awarded = if correct {
            self.current_streak += 1;
            self.correct_answers += 1;
            question.points + STREAK_BONUS * (self.current_streak - 1)
        } else {
            self.current_streak = 0;
            0
        };
        self.score += points_awarded;

        self.answers.push(AnswerRecord {
            question_id: question.id.to_string(),
            selected_option,
            correct,
            points_awarded,
        });
        self.touch();

        Ok(AnswerOutcome {
            question_id: question.id.to_string(),
            correct,
            correct_option: question.correct_option,
            explanation: question.explanation.to_string(),
            points_awarded,
            score: self.score,
            streak: self.current_streak,
            remaining_questions: self.remaining_questions(),
        })
    }

    /// Finish the session and compute the experience earned
    pub fn complete(&mut self) -> Result<i64, GameSessionError> {
        if !self.is_in_progress() {
            return Err(GameSessionError::NotInProgress(self.status));
        }

        let mut xp = self.score * self.difficulty.xp_multiplier_halves() / 2;
        if self.total_questions > 0 && self.correct_answers == self.total_questions {
            xp += PERFECT_RUN_BONUS;
        }

        self.xp_earned = xp;
        self.status = GameStatus::Completed;
        self.touch();
        self.completed_at = Some(self.updated_at);
        Ok(xp)
    }

    /// Give up on the session; no experience is awarded
    pub fn abandon(&mut self) -> Result<(), GameSessionError> {
        if !self.is_in_progress() {
            return Err(GameSessionError::NotInProgress(self.status));
        }
        self.status = GameStatus::Abandoned;
        self.touch();
        self.completed_at = Some(self.updated_at);
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp().max(self.created_at);
    }
}

/// Start-session request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartGameRequest {
    pub game_type: GameType,
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// Answer submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: String,
    pub selected_option: usize,
}

/// Aggregate statistics for one player
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameStats {
    pub games_completed: i64,
    pub games_abandoned: i64,
    pub total_score: i64,
    pub total_xp: i64,
    pub best_score: i64,
    pub accuracy: f64,
    pub by_game_type: Vec<GameTypeStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameTypeStats {
    pub game_type: GameType,
    pub games_completed: i64,
    pub best_score: i64,
}

/// Game session errors
#[derive(Debug, thiserror::Error)]
pub enum GameSessionError {
    #[error("Game session is {0}, not in progress")]
    NotInProgress(GameStatus),

    #[error("Question {0} is not part of this session")]
    QuestionNotInSession(String),

    #[error("Question {0} has already been answered")]
    AlreadyAnswered(String),

    #[error("Option {selected} is out of range (question has {available} options)")]
    InvalidOption { selected: usize, available: usize },

    #[error("Invalid stored value for {field}: {value}")]
    CorruptRecord { field: &'static str, value: String },
}
