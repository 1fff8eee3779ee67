//! Threat Service
//!
//! Content analysis and persisted threat reports.

use std::sync::Arc;

use tracing::{info, Instrument};
use uuid::Uuid;

use crate::analysis::{AnalysisReport, ThreatAnalyzer};
use crate::analysis_span;
use crate::database::{now_timestamp, DatabaseManager};
use crate::error::{AppError, AppResult};
use crate::logging::{log_database_operation, log_threat_analysis};
use crate::models::pagination::{Page, PageParams};
use crate::models::threat::{
    CountEntry, NewThreatReport, Severity, Threat, ThreatCategory, ThreatError, ThreatFilter,
    ThreatStatus, ThreatSummary, MAX_CONTENT_LENGTH,
};
use crate::services::auth_service::AuthenticatedUser;
use crate::services::user_service::{apply_xp, XpAward};

/// Experience credited for each submitted report
pub const REPORT_XP: i64 = 10;

const THREAT_COLUMNS: &str = "id, reporter_id, category, severity, status, title, content, \
                              source_url, confidence, indicators, created_at, updated_at";

// Database row structure for threat reports
#[derive(Debug, sqlx::FromRow)]
struct ThreatRow {
    id: String,
    reporter_id: String,
    category: String,
    severity: String,
    status: String,
    title: String,
    content: String,
    source_url: Option<String>,
    confidence: f64,
    indicators: String,
    created_at: i64,
    updated_at: i64,
}

fn corrupt(field: &'static str, value: &str) -> ThreatError {
    ThreatError::CorruptRecord {
        field,
        value: value.to_string(),
    }
}

impl ThreatRow {
    fn into_threat(self) -> AppResult<Threat> {
        Ok(Threat {
            category: self
                .category
                .parse()
                .map_err(|_| corrupt("category", &self.category))?,
            severity: self
                .severity
                .parse()
                .map_err(|_| corrupt("severity", &self.severity))?,
            status: self
                .status
                .parse()
                .map_err(|_| corrupt("status", &self.status))?,
            indicators: serde_json::from_str(&self.indicators)?,
            id: self.id,
            reporter_id: self.reporter_id,
            title: self.title,
            content: self.content,
            source_url: self.source_url,
            confidence: self.confidence,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn collect_threats(rows: Vec<ThreatRow>) -> AppResult<Vec<Threat>> {
    rows.into_iter().map(ThreatRow::into_threat).collect()
}

/// Threat service responsible for analysis and reports
#[derive(Debug, Clone)]
pub struct ThreatService {
    database_manager: Arc<DatabaseManager>,
    analyzer: Arc<ThreatAnalyzer>,
}

impl ThreatService {
    pub fn new(database_manager: Arc<DatabaseManager>, analyzer: Arc<ThreatAnalyzer>) -> Self {
        Self {
            database_manager,
            analyzer,
        }
    }

    /// Classify text without storing anything
    pub fn analyze(&self, content: &str) -> AppResult<AnalysisReport> {
        let span = analysis_span!("analyze", content.chars().count());
        let _guard = span.enter();

        let report = self.analyzer.analyze(content)?;
        span.record("risk_score", report.risk_score);
        if let Some(category) = report.primary_category {
            span.record("primary_category", category.as_ref());
        }
        log_threat_analysis("analyze", &report);
        Ok(report)
    }

    /// Store a report with the classifier verdict attached
    pub async fn report(&self, reporter_id: &str, submission: NewThreatReport) -> AppResult<Threat> {
        submission.validate()?;

        let verdict = self.analyze_submission(&submission)?;
        let (category, confidence) = match submission.category {
            Some(category) => {
                let confidence = verdict
                    .score_for(category)
                    .map(|s| s.confidence)
                    .unwrap_or(verdict.risk_score);
                (category, confidence)
            }
            None => (
                verdict.primary_category.unwrap_or(ThreatCategory::Other),
                verdict.risk_score,
            ),
        };

        let now = now_timestamp();
        let threat = Threat {
            id: Uuid::new_v4().to_string(),
            reporter_id: reporter_id.to_string(),
            category,
            severity: Severity::from_confidence(confidence),
            status: ThreatStatus::Reported,
            title: submission.title.trim().to_string(),
            content: submission.content,
            source_url: submission.source_url,
            confidence,
            indicators: verdict.indicators,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.database_manager.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO threats (id, reporter_id, category, severity, status, title, content,
                                 source_url, confidence, indicators, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&threat.id)
        .bind(&threat.reporter_id)
        .bind(threat.category.as_ref())
        .bind(threat.severity.as_ref())
        .bind(threat.status.as_ref())
        .bind(&threat.title)
        .bind(&threat.content)
        .bind(&threat.source_url)
        .bind(threat.confidence)
        .bind(serde_json::to_string(&threat.indicators)?)
        .bind(threat.created_at)
        .bind(threat.updated_at)
        .execute(&mut *tx)
        .await?;

        apply_xp(
            &mut tx,
            reporter_id,
            XpAward {
                xp: REPORT_XP,
                games_played: 0,
                threats_reported: 1,
            },
        )
        .await?;
        tx.commit().await?;

        info!(
            threat_id = %threat.id,
            reporter_id = %reporter_id,
            category = %threat.category,
            severity = %threat.severity,
            "Threat reported"
        );
        Ok(threat)
    }

    fn analyze_submission(&self, submission: &NewThreatReport) -> AppResult<AnalysisReport> {
        let mut text = format!("{}\n{}", submission.title, submission.content);
        if let Some(ref url) = submission.source_url {
            text.push('\n');
            text.push_str(url);
        }
        if text.chars().count() > MAX_CONTENT_LENGTH {
            text = submission.content.clone();
        }

        let report = self.analyzer.analyze(&text)?;
        log_threat_analysis("report", &report);
        Ok(report)
    }

    /// The caller's own reports, newest first
    pub async fn list(
        &self,
        reporter_id: &str,
        filter: &ThreatFilter,
        params: PageParams,
    ) -> AppResult<Page<Threat>> {
        params.validate()?;
        let pool = &self.database_manager.pool;
        let category = filter.category.map(|c| c.to_string());
        let status = filter.status.map(|s| s.to_string());

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM threats
            WHERE reporter_id = ? AND (? IS NULL OR category = ?) AND (? IS NULL OR status = ?)
            "#,
        )
        .bind(reporter_id)
        .bind(&category)
        .bind(&category)
        .bind(&status)
        .bind(&status)
        .fetch_one(pool)
        .await?;

        let rows = sqlx::query_as::<_, ThreatRow>(&format!(
            "SELECT {} FROM threats \
             WHERE reporter_id = ? AND (? IS NULL OR category = ?) AND (? IS NULL OR status = ?) \
             ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            THREAT_COLUMNS
        ))
        .bind(reporter_id)
        .bind(&category)
        .bind(&category)
        .bind(&status)
        .bind(&status)
        .bind(i64::from(params.limit()))
        .bind(params.offset())
        .fetch_all(pool)
        .instrument(crate::db_span!("SELECT", "threats"))
        .await?;

        log_database_operation("SELECT", "threats", Some(rows.len() as u64));
        Ok(Page::new(collect_threats(rows)?, &params, total))
    }

    /// Reports submitted by any member of a family, newest first
    pub async fn list_for_family(&self, family_id: &str, params: PageParams) -> AppResult<Page<Threat>> {
        params.validate()?;
        let pool = &self.database_manager.pool;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM threats \
             WHERE reporter_id IN (SELECT id FROM users WHERE family_id = ?)",
        )
        .bind(family_id)
        .fetch_one(pool)
        .await?;

        let rows = sqlx::query_as::<_, ThreatRow>(&format!(
            "SELECT {} FROM threats \
             WHERE reporter_id IN (SELECT id FROM users WHERE family_id = ?) \
             ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            THREAT_COLUMNS
        ))
        .bind(family_id)
        .bind(i64::from(params.limit()))
        .bind(params.offset())
        .fetch_all(pool)
        .await?;

        Ok(Page::new(collect_threats(rows)?, &params, total))
    }

    async fn find(&self, threat_id: &str) -> AppResult<Threat> {
        sqlx::query_as::<_, ThreatRow>(&format!(
            "SELECT {} FROM threats WHERE id = ?",
            THREAT_COLUMNS
        ))
        .bind(threat_id)
        .fetch_optional(&self.database_manager.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Threat"))?
        .into_threat()
    }

    /// Whether `actor` is a guardian in the same family as `reporter_id`
    async fn is_family_guardian(&self, actor: &AuthenticatedUser, reporter_id: &str) -> AppResult<bool> {
        if !actor.role.is_guardian() {
            return Ok(false);
        }
        let shared: Option<(bool,)> = sqlx::query_as(
            r#"
            SELECT COALESCE(a.family_id IS NOT NULL AND a.family_id = r.family_id, 0)
            FROM users a, users r
            WHERE a.id = ? AND r.id = ?
            "#,
        )
        .bind(&actor.user_id)
        .bind(reporter_id)
        .fetch_optional(&self.database_manager.pool)
        .await?;
        Ok(matches!(shared, Some((true,))))
    }

    async fn can_manage(&self, actor: &AuthenticatedUser, threat: &Threat) -> AppResult<bool> {
        if actor.user_id == threat.reporter_id || actor.is_admin() {
            return Ok(true);
        }
        self.is_family_guardian(actor, &threat.reporter_id).await
    }

    /// Fetch a report visible to the caller
    pub async fn get(&self, actor: &AuthenticatedUser, threat_id: &str) -> AppResult<Threat> {
        let threat = self.find(threat_id).await?;
        if self.can_manage(actor, &threat).await? {
            Ok(threat)
        } else {
            Err(AppError::not_found("Threat"))
        }
    }

    /// Move a report through its review states
    pub async fn update_status(
        &self,
        actor: &AuthenticatedUser,
        threat_id: &str,
        status: ThreatStatus,
    ) -> AppResult<Threat> {
        let mut threat = self.find(threat_id).await?;
        if !self.can_manage(actor, &threat).await? {
            return Err(AppError::forbidden("not allowed to update this report"));
        }
        if !threat.status.can_transition_to(status) {
            return Err(ThreatError::InvalidTransition {
                from: threat.status,
                to: status,
            }
            .into());
        }

        let previous = threat.status;
        threat.status = status;
        threat.updated_at = now_timestamp().max(threat.created_at);

        let result = sqlx::query("UPDATE threats SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
            .bind(threat.status.as_ref())
            .bind(threat.updated_at)
            .bind(&threat.id)
            .bind(previous.as_ref())
            .execute(&self.database_manager.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::conflict("report was modified concurrently"));
        }

        info!(
            threat_id = %threat.id,
            actor_id = %actor.user_id,
            from = %previous,
            to = %status,
            "Threat status updated"
        );
        Ok(threat)
    }

    /// Remove a report; only the reporter or an admin may do this
    pub async fn delete(&self, actor: &AuthenticatedUser, threat_id: &str) -> AppResult<()> {
        let threat = self.find(threat_id).await?;
        if actor.user_id != threat.reporter_id && !actor.is_admin() {
            return Err(AppError::forbidden("only the reporter may delete this report"));
        }

        sqlx::query("DELETE FROM threats WHERE id = ?")
            .bind(&threat.id)
            .execute(&self.database_manager.pool)
            .await?;

        info!(threat_id = %threat.id, actor_id = %actor.user_id, "Threat deleted");
        Ok(())
    }

    /// Counts over the caller's reports
    pub async fn summary(&self, reporter_id: &str) -> AppResult<ThreatSummary> {
        let pool = &self.database_manager.pool;

        let (total, open): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN status IN ('reported', 'investigating') THEN 1 ELSE 0 END), 0)
            FROM threats
            WHERE reporter_id = ?
            "#,
        )
        .bind(reporter_id)
        .fetch_one(pool)
        .await?;

        let by_category: Vec<(String, i64)> = sqlx::query_as(
            "SELECT category, COUNT(*) FROM threats WHERE reporter_id = ? \
             GROUP BY category ORDER BY COUNT(*) DESC, category",
        )
        .bind(reporter_id)
        .fetch_all(pool)
        .await?;

        let by_severity: Vec<(String, i64)> = sqlx::query_as(
            "SELECT severity, COUNT(*) FROM threats WHERE reporter_id = ? \
             GROUP BY severity ORDER BY COUNT(*) DESC, severity",
        )
        .bind(reporter_id)
        .fetch_all(pool)
        .await?;

        let entries = |rows: Vec<(String, i64)>| -> Vec<CountEntry> {
            rows.into_iter()
                .map(|(key, count)| CountEntry { key, count })
                .collect()
        };

        Ok(ThreatSummary {
            total,
            by_category: entries(by_category),
            by_severity: entries(by_severity),
            open,
        })
    }
}
