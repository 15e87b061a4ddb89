//! Session-scoped persistence
//!
//! On game over the final stats go to session storage for the results view.
//! The avatar image is configured by a separate setup flow; the game only
//! checks that one exists.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::sim::{GameStats, WeaponKind};

/// Storage key for the final stats record
pub const RESULTS_KEY: &str = "gameResults";
/// Storage key for the player's avatar image (data URL)
pub const AVATAR_KEY: &str = "playerImage";

/// Final stats of a run, as handed to the results view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResults {
    pub score: u64,
    pub enemies_killed: u32,
    pub time_alive_seconds: u32,
    pub current_weapon_type: WeaponKind,
}

impl From<&GameStats> for GameResults {
    fn from(stats: &GameStats) -> Self {
        Self {
            score: stats.score,
            enemies_killed: stats.enemies_killed,
            time_alive_seconds: stats.time_alive_secs,
            current_weapon_type: stats.current_weapon,
        }
    }
}

impl GameResults {
    pub fn rating(&self) -> ScoreRating {
        ScoreRating::for_score(self.score)
    }
}

/// Results-screen verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreRating {
    Legendary,
    Great,
    Good,
    Average,
    TryAgain,
}

impl ScoreRating {
    pub fn for_score(score: u64) -> Self {
        match score {
            2000.. => ScoreRating::Legendary,
            1500.. => ScoreRating::Great,
            1000.. => ScoreRating::Good,
            500.. => ScoreRating::Average,
            _ => ScoreRating::TryAgain,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreRating::Legendary => "Legendary!",
            ScoreRating::Great => "Great!",
            ScoreRating::Good => "Good!",
            ScoreRating::Average => "Not bad",
            ScoreRating::TryAgain => "Try again!",
        }
    }
}

/// Where results and the avatar reference live
pub trait SessionStore {
    fn save_results(&mut self, results: &GameResults) -> Result<(), SessionError>;

    fn load_results(&self) -> Result<Option<GameResults>, SessionError>;

    /// The configured avatar, or [`SessionError::MissingAvatar`]
    fn avatar(&self) -> Result<String, SessionError>;
}

/// In-process store (native builds and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    results_json: Option<String>,
    avatar: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_avatar(avatar: impl Into<String>) -> Self {
        Self {
            results_json: None,
            avatar: Some(avatar.into()),
        }
    }
}

impl SessionStore for MemoryStore {
    fn save_results(&mut self, results: &GameResults) -> Result<(), SessionError> {
        self.results_json = Some(serde_json::to_string(results)?);
        Ok(())
    }

    fn load_results(&self) -> Result<Option<GameResults>, SessionError> {
        match &self.results_json {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn avatar(&self) -> Result<String, SessionError> {
        self.avatar.clone().ok_or(SessionError::MissingAvatar)
    }
}

/// Browser store: results in sessionStorage, avatar in localStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct WebStore;

#[cfg(target_arch = "wasm32")]
impl WebStore {
    fn session() -> Result<web_sys::Storage, SessionError> {
        web_sys::window()
            .and_then(|w| w.session_storage().ok())
            .flatten()
            .ok_or(SessionError::Unavailable)
    }

    fn local() -> Result<web_sys::Storage, SessionError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(SessionError::Unavailable)
    }
}

#[cfg(target_arch = "wasm32")]
impl SessionStore for WebStore {
    fn save_results(&mut self, results: &GameResults) -> Result<(), SessionError> {
        let json = serde_json::to_string(results)?;
        Self::session()?
            .set_item(RESULTS_KEY, &json)
            .map_err(|_| SessionError::WriteRejected { key: RESULTS_KEY })?;
        log::info!("Results saved (score {})", results.score);
        Ok(())
    }

    fn load_results(&self) -> Result<Option<GameResults>, SessionError> {
        match Self::session()?.get_item(RESULTS_KEY).ok().flatten() {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn avatar(&self) -> Result<String, SessionError> {
        Self::local()?
            .get_item(AVATAR_KEY)
            .ok()
            .flatten()
            .ok_or(SessionError::MissingAvatar)
    }
}
