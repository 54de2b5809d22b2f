use serde::{Deserialize, Serialize};

use super::models::{ChallengeModel, MatchModel, MatchResult};
use super::service::{AcceptanceReport, ResultReport};
use super::settlement::SettlementOutcome;
use crate::notification::NotificationOutcome;

/// Request payload for challenging another player
#[derive(Debug, Deserialize)]
pub struct CreateChallengeRequest {
    pub challenged_id: String,
    pub game_id: String,
}

/// Request payload for self-reporting a result
#[derive(Debug, Deserialize)]
pub struct SubmitResultRequest {
    pub result: MatchResult,
}

/// Response after submitting a result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResultResponse {
    pub challenge: ChallengeModel,
    pub settled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#match: Option<MatchModel>,
}

impl From<ResultReport> for SubmitResultResponse {
    fn from(report: ResultReport) -> Self {
        let r#match = match &report.settlement {
            Some(SettlementOutcome::Completed(record)) => Some(record.clone()),
            _ => None,
        };

        Self {
            settled: report.challenge.status.is_terminal(),
            challenge: report.challenge,
            r#match,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptanceResponse {
    pub outcome: NotificationOutcome,
    pub challenge: ChallengeModel,
}

impl From<AcceptanceReport> for AcceptanceResponse {
    fn from(report: AcceptanceReport) -> Self {
        Self {
            outcome: report.outcome,
            challenge: report.challenge,
        }
    }
}
