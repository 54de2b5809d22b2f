use serde::Serialize;

use crate::ranking::RankingModel;

/// What a screen shows for one piece of remote data
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum ViewState<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Leaderboard for the game currently selected on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub game_id: String,
    pub entries: Vec<RankingModel>,
}
