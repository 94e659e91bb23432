//! Game snapshots: the JSON persistence contract.
//!
//! A [`GameSnapshot`] captures everything needed to resume a game: config,
//! all team states, the market state, and the upcoming round number. The
//! layout is stable-field-name JSON; unknown fields on team and market
//! states survive a load/save cycle untouched (forward compatibility), and
//! missing tunables take config defaults through serde.

use crate::config::GameConfig;
use crate::engine::Game;
use crate::error::{Result, SimulationError};
use crate::market::MarketState;
use crate::team::TeamState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Everything needed to resume a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub config: GameConfig,
    /// Upcoming round number
    pub round: u32,
    pub teams: BTreeMap<String, TeamState>,
    pub market: MarketState,
}

impl GameSnapshot {
    /// Captures a running game.
    pub fn capture(game: &Game) -> Self {
        GameSnapshot {
            config: game.config().clone(),
            round: game.round(),
            teams: game.teams.clone(),
            market: game.market.clone(),
        }
    }

    /// Restores a game from this snapshot. The config is re-validated,
    /// schema version included.
    pub fn restore(self) -> Result<Game> {
        let mut game = Game::new(self.config, &[])?;
        game.teams = self.teams;
        game.market = self.market;
        game.set_round(self.round);
        Ok(game)
    }

    /// Saves as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SimulationError::JsonSerialize(e.to_string()))
    }

    /// Loads from JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| SimulationError::JsonSerialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn test_capture_restore_roundtrip() {
        let config = GameConfig::default();
        let mut game = Game::new(config, &["Aurora", "Borealis"]).unwrap();
        game.advance(&BTreeMap::new()).unwrap();

        let snapshot = GameSnapshot::capture(&game);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        snapshot.save(&path).unwrap();

        let restored = GameSnapshot::load(&path).unwrap().restore().unwrap();
        assert_eq!(restored.round(), game.round());
        assert_eq!(restored.teams.len(), game.teams.len());
        assert_eq!(
            serde_json::to_string(&restored.teams).unwrap(),
            serde_json::to_string(&game.teams).unwrap(),
        );
    }

    #[test]
    fn test_restored_game_continues_deterministically() {
        let config = GameConfig::default();
        let mut original = Game::new(config.clone(), &["Aurora", "Borealis"]).unwrap();
        original.advance(&BTreeMap::new()).unwrap();
        let snapshot = GameSnapshot::capture(&original);

        // Advance the original and a restored copy by the same empty round.
        let report_a = original.advance(&BTreeMap::new()).unwrap().clone();
        let mut restored = snapshot.restore().unwrap();
        let report_b = restored.advance(&BTreeMap::new()).unwrap().clone();
        assert_eq!(
            serde_json::to_string(&report_a).unwrap(),
            serde_json::to_string(&report_b).unwrap(),
        );
    }

    #[test]
    fn test_snapshot_with_bad_schema_version_refused() {
        let mut config = GameConfig::default();
        let game = Game::new(config.clone(), &["Aurora"]).unwrap();
        let mut snapshot = GameSnapshot::capture(&game);
        config.schema_version = 99;
        snapshot.config = config;
        assert!(snapshot.restore().is_err());
    }
}
