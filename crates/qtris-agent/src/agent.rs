use std::io;

use qtris_engine::{Action, BoardConfig, GameSession, StepReport};
use qtris_evaluator::{RewardEvaluator, Transition};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use tracing::{debug, info, warn};

use crate::{
    config::{AgentConfig, ConfigError},
    exploration::Exploration,
    history::EpisodeScore,
    persistence::{AgentSnapshot, LoadError},
    state::{StateEncoder, StateKey},
    value::{ValueFunction, ValueModel},
};

/// What happened during one [`LearningAgent::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStep {
    /// State the action was chosen in.
    pub state: StateKey,
    pub action: Action,
    pub report: StepReport,
    pub reward: f64,
}

/// Epsilon-greedy value learner playing one [`GameSession`] at a time.
///
/// Each step encodes the session into a [`StateKey`], picks an action, applies
/// it, scores the transition with a [`RewardEvaluator`] and moves the chosen
/// action's value toward `reward + γ · max next value`. A step that ends the
/// game bootstraps from 0.
///
/// In greedy mode ([`LearningAgent::set_greedy`]) the agent never explores and
/// never changes its values, which is how trained models are played.
#[derive(Debug, Clone)]
pub struct LearningAgent {
    encoder: StateEncoder,
    values: ValueModel,
    exploration: Exploration,
    learning_rate: f64,
    discount: f64,
    greedy: bool,
    rng: Pcg32,
    history: Vec<EpisodeScore>,
    episode: EpisodeScore,
}

impl LearningAgent {
    /// Creates an agent with an empty value model and an entropy-seeded random stream.
    pub fn new(config: &AgentConfig, board: &BoardConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, board, Pcg32::from_rng(&mut rand::rng()))
    }

    pub fn with_seed(
        config: &AgentConfig,
        board: &BoardConfig,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::with_rng(config, board, Pcg32::seed_from_u64(seed))
    }

    fn with_rng(
        config: &AgentConfig,
        board: &BoardConfig,
        mut rng: Pcg32,
    ) -> Result<Self, ConfigError> {
        config.validate(board)?;
        let encoder = StateEncoder::new(config.radar, board)?;
        let values = ValueModel::from_config(config, board.height, &mut rng);
        Ok(Self {
            encoder,
            values,
            exploration: Exploration::new(
                config.exploration.initial_rate,
                config.exploration.cooling_rate,
            ),
            learning_rate: config.learning_rate,
            discount: config.discount,
            greedy: false,
            rng,
            history: vec![],
            episode: EpisodeScore::default(),
        })
    }

    #[must_use]
    pub fn values(&self) -> &ValueModel {
        &self.values
    }

    #[must_use]
    pub fn exploration_rate(&self) -> f64 {
        self.exploration.rate()
    }

    /// Finished episodes, oldest first.
    #[must_use]
    pub fn history(&self) -> &[EpisodeScore] {
        &self.history
    }

    pub fn set_greedy(&mut self, greedy: bool) {
        self.greedy = greedy;
    }

    /// Restores full exploration.
    pub fn heat(&mut self) {
        self.exploration.heat();
    }

    #[must_use]
    pub fn state_key(&self, session: &GameSession) -> StateKey {
        self.encoder.encode(session)
    }

    /// Picks the action to play in `state`.
    ///
    /// Explores with the current rate, cooling it after every exploratory
    /// pick, and otherwise takes the best known action. A state seen for the
    /// first time gets an all-zero row.
    pub fn select_action(&mut self, state: &StateKey) -> Action {
        if self.greedy {
            return self.values.predict(state).best_action();
        }
        self.values.visit(state);
        if self.exploration.explore(&mut self.rng) {
            return Action::ALL[self.rng.random_range(0..Action::LEN)];
        }
        self.values.predict(state).best_action()
    }

    /// Moves the value of `action` in `state` toward
    /// `reward + discount * next_max_value`.
    pub fn update(&mut self, state: &StateKey, action: Action, reward: f64, next_max_value: f64) {
        let target = reward + self.discount * next_max_value;
        self.values.update(state, action, target, self.learning_rate);
    }

    /// Plays one action in `session` and learns from it.
    ///
    /// Returns `None` without touching anything if the game is already over.
    pub fn step(
        &mut self,
        session: &mut GameSession,
        evaluator: &RewardEvaluator,
    ) -> Option<AgentStep> {
        if session.state().is_game_over() {
            return None;
        }

        let state = self.state_key(session);
        let action = self.select_action(&state);
        let before = session.settled_board();
        let report = session.apply(action);
        let transition = Transition::from_step(before, session.settled_board(), &report);
        let reward = evaluator.evaluate(&transition);

        if !self.greedy {
            let next_max_value = if report.game_over() {
                0.0
            } else {
                self.values.predict(&self.state_key(session)).max_value()
            };
            self.update(&state, action, reward, next_max_value);
        }

        self.episode.reward += reward;
        self.episode.steps += 1;
        Some(AgentStep {
            state,
            action,
            report,
            reward,
        })
    }

    /// Steps until the game is over or `max_steps` steps were taken, then
    /// ends the episode.
    pub fn run_episode(
        &mut self,
        session: &mut GameSession,
        evaluator: &RewardEvaluator,
        max_steps: usize,
    ) -> EpisodeScore {
        for _ in 0..max_steps {
            let Some(step) = self.step(session, evaluator) else {
                break;
            };
            if step.report.game_over() {
                break;
            }
        }
        self.end_episode(session)
    }

    /// Records the episode played in `session` and resets the session for
    /// the next one.
    pub fn end_episode(&mut self, session: &mut GameSession) -> EpisodeScore {
        let stats = session.stats();
        let score = EpisodeScore {
            score: stats.score(),
            cleared_lines: stats.total_cleared_lines(),
            locked_pieces: stats.completed_pieces(),
            ..std::mem::take(&mut self.episode)
        };
        self.history.push(score);
        info!(
            episode = self.history.len(),
            reward = score.reward,
            score = score.score,
            cleared_lines = score.cleared_lines,
            steps = score.steps,
            exploration_rate = self.exploration.rate(),
            "episode finished"
        );
        session.reset();
        score
    }

    #[must_use]
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot::new(self.exploration, self.values.clone(), self.history.clone())
    }

    pub fn save_json<W>(&self, writer: W) -> Result<(), serde_json::Error>
    where
        W: io::Write,
    {
        self.snapshot().to_writer(writer)
    }

    /// Replaces the learned state with a saved snapshot.
    ///
    /// On error the agent is left exactly as it was.
    pub fn load_json<R>(&mut self, reader: R) -> Result<(), LoadError>
    where
        R: io::Read,
    {
        let result = AgentSnapshot::from_reader(reader).and_then(|snapshot| {
            self.check_compatible(&snapshot.values)?;
            Ok(snapshot)
        });
        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("failed to load agent: {e}");
                return Err(e);
            }
        };
        debug!(
            saved_at = %snapshot.saved_at,
            entries = snapshot.values.len(),
            episodes = snapshot.history.len(),
            "agent loaded"
        );
        self.values = snapshot.values;
        self.exploration = snapshot.exploration;
        self.history = snapshot.history;
        Ok(())
    }

    fn check_compatible(&self, values: &ValueModel) -> Result<(), LoadError> {
        let incompatible = |reason: String| Err(LoadError::IncompatibleModel { reason });
        if values.kind() != self.values.kind() {
            return incompatible(format!(
                "saved {} model, configured {}",
                values.kind(),
                self.values.kind()
            ));
        }
        match values {
            ValueModel::Tabular(table) => {
                if let Some((state, _)) = table
                    .entries()
                    .find(|(state, _)| !self.encoder.fits_radar(state))
                {
                    let radar = self.encoder.radar();
                    return incompatible(format!(
                        "state radar {:?} does not fit a {}x{} radar",
                        state.radar, radar.width, radar.depth
                    ));
                }
            }
            ValueModel::Regressor(model) => {
                let height = self.encoder.board_config().height;
                if model.layout().radar != *self.encoder.radar()
                    || model.layout().board_height != height
                {
                    return incompatible("regressor input layout differs".to_owned());
                }
                if let Err(e) = model.validate() {
                    return incompatible(e.to_string());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use qtris_engine::{BagSeed, PieceCatalog, PieceKind, Rotation};
    use qtris_evaluator::RewardWeights;

    use super::*;
    use crate::config::{BackendConfig, BackendKind, ExplorationConfig, RadarConfig};

    fn config(initial_rate: f64) -> AgentConfig {
        AgentConfig {
            exploration: ExplorationConfig {
                initial_rate,
                cooling_rate: 0.9,
            },
            ..AgentConfig::default()
        }
    }

    fn regressor_config() -> AgentConfig {
        AgentConfig {
            backend: BackendConfig {
                kind: BackendKind::Regressor,
                hidden_units: 4,
            },
            ..config(1.0)
        }
    }

    fn key() -> StateKey {
        StateKey {
            kind: PieceKind::O,
            rotation: Rotation::Deg0,
            offsets: *PieceCatalog::standard().shape(PieceKind::O, Rotation::Deg0),
            radar: vec![0, 0, 0],
            column_offset: 2,
            anchor_row: 5,
        }
    }

    fn session(seed: u128) -> GameSession {
        GameSession::with_seed(BoardConfig::default(), BagSeed::from_u128(seed))
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = config(1.0);
        config.radar = RadarConfig {
            width: 11,
            depth: 3,
        };
        let err = LearningAgent::with_seed(&config, &BoardConfig::default(), 0).unwrap_err();
        assert_eq!(
            err,
            ConfigError::RadarTooWide {
                radar_width: 11,
                board_width: 10
            }
        );
    }

    #[test]
    fn test_update_rule() {
        let mut agent = LearningAgent::with_seed(&config(0.0), &BoardConfig::default(), 0).unwrap();
        let state = key();
        // old 0, α 0.1, γ 0.9: 0 + 0.1 * (1 + 0.9 * 2 - 0)
        agent.update(&state, Action::Rotate, 1.0, 2.0);
        let value = agent.values().predict(&state).get(Action::Rotate);
        assert!((value - 0.28).abs() < 1e-12);
        // 0.28 + 0.1 * (-1 + 0 - 0.28)
        agent.update(&state, Action::Rotate, -1.0, 0.0);
        let value = agent.values().predict(&state).get(Action::Rotate);
        assert!((value - 0.152).abs() < 1e-12);
    }

    #[test]
    fn test_select_action_without_exploration_is_greedy() {
        let mut agent = LearningAgent::with_seed(&config(0.0), &BoardConfig::default(), 0).unwrap();
        let state = key();
        assert_eq!(agent.select_action(&state), Action::MoveLeft);
        assert_eq!(agent.values().len(), 1);

        agent.update(&state, Action::None, 1.0, 0.0);
        for _ in 0..10 {
            assert_eq!(agent.select_action(&state), Action::None);
        }
    }

    #[test]
    fn test_full_exploration_cools_on_every_pick() {
        let mut agent = LearningAgent::with_seed(&config(1.0), &BoardConfig::default(), 5).unwrap();
        let state = key();
        agent.select_action(&state);
        assert!((agent.exploration_rate() - 0.9).abs() < 1e-12);
        agent.heat();
        assert!((agent.exploration_rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_episode_is_recorded_and_session_reset() {
        let mut agent = LearningAgent::with_seed(&config(1.0), &BoardConfig::default(), 1).unwrap();
        let evaluator = RewardEvaluator::default();
        let mut session = session(1);

        let score = agent.run_episode(&mut session, &evaluator, 5000);
        assert!(score.steps > 0);
        assert!(score.locked_pieces > 0);
        assert_eq!(agent.history(), &[score]);
        assert!(session.state().is_falling());
        assert_eq!(session.stats().completed_pieces(), 0);
        assert!(!agent.values().is_empty());
        assert!(agent.exploration_rate() < 1.0);
    }

    #[test]
    fn test_step_after_game_over_does_nothing() {
        let mut agent = LearningAgent::with_seed(&config(0.0), &BoardConfig::default(), 2).unwrap();
        let evaluator = RewardEvaluator::default();
        let mut session = session(2);
        for _ in 0..100_000 {
            if session.state().is_game_over() {
                break;
            }
            agent.step(&mut session, &evaluator);
        }
        assert!(session.state().is_game_over());
        let entries = agent.values().len();
        assert!(agent.step(&mut session, &evaluator).is_none());
        assert_eq!(agent.values().len(), entries);
    }

    #[test]
    fn test_terminal_step_bootstraps_from_zero() {
        let weights = RewardWeights {
            game_over: 2.0,
            ..RewardWeights::default()
        };
        let evaluator = RewardEvaluator::from_weights(&weights);
        let mut agent = LearningAgent::with_seed(&config(0.0), &BoardConfig::default(), 3).unwrap();
        let mut session = session(3);
        for _ in 0..100_000 {
            let state = agent.state_key(&session);
            let before = agent.values().predict(&state);
            let step = agent.step(&mut session, &evaluator).unwrap();
            if step.report.game_over() {
                assert_eq!(step.state, state);
                let old = before.get(step.action);
                let value = agent.values().predict(&state).get(step.action);
                // no discounted next value on the final step
                assert!((value - (old + 0.1 * (step.reward - old))).abs() < 1e-12);
                return;
            }
        }
        panic!("game never ended");
    }

    #[test]
    fn test_greedy_play_leaves_values_untouched() {
        let mut trainer = LearningAgent::with_seed(&config(1.0), &BoardConfig::default(), 4).unwrap();
        let evaluator = RewardEvaluator::default();
        let mut session = session(4);
        trainer.run_episode(&mut session, &evaluator, 300);
        let learned = trainer.values().clone();
        let rate = trainer.exploration_rate();

        trainer.set_greedy(true);
        trainer.run_episode(&mut session, &evaluator, 300);
        assert_eq!(trainer.values(), &learned);
        assert!((trainer.exploration_rate() - rate).abs() < f64::EPSILON);
        assert_eq!(trainer.history().len(), 2);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let mut trainer = LearningAgent::with_seed(&config(1.0), &BoardConfig::default(), 6).unwrap();
        let evaluator = RewardEvaluator::default();
        let mut session = session(6);
        trainer.run_episode(&mut session, &evaluator, 200);

        let mut buf = Vec::new();
        trainer.save_json(&mut buf).unwrap();

        let mut loaded = LearningAgent::with_seed(&config(1.0), &BoardConfig::default(), 7).unwrap();
        loaded.load_json(buf.as_slice()).unwrap();
        assert_eq!(loaded.values(), trainer.values());
        assert_eq!(loaded.history(), trainer.history());
        assert!((loaded.exploration_rate() - trainer.exploration_rate()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failed_load_keeps_empty_table() {
        let mut agent = LearningAgent::with_seed(&config(1.0), &BoardConfig::default(), 8).unwrap();
        assert!(matches!(agent.load_json(&b""[..]), Err(LoadError::Empty)));
        assert!(matches!(
            agent.load_json(&b"{not json"[..]),
            Err(LoadError::Malformed(_))
        ));
        assert!(agent.values().is_empty());
        assert!(agent.history().is_empty());
    }

    #[test]
    fn test_load_rejects_other_backend() {
        let saved = LearningAgent::with_seed(&regressor_config(), &BoardConfig::default(), 9)
            .unwrap();
        let mut buf = Vec::new();
        saved.save_json(&mut buf).unwrap();

        let mut agent = LearningAgent::with_seed(&config(1.0), &BoardConfig::default(), 9).unwrap();
        let err = agent.load_json(buf.as_slice()).unwrap_err();
        assert!(matches!(err, LoadError::IncompatibleModel { .. }));
        assert!(agent.values().is_tabular());
    }

    #[test]
    fn test_load_rejects_regressor_with_broken_layers() {
        let board = BoardConfig::default();
        let saved = LearningAgent::with_seed(&regressor_config(), &board, 10).unwrap();
        let mut buf = Vec::new();
        saved.save_json(&mut buf).unwrap();
        let mut json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        json["values"]["output"]["weights"] = serde_json::json!([0.1, 0.2]);
        let corrupted = serde_json::to_vec(&json).unwrap();

        let mut agent = LearningAgent::with_seed(&regressor_config(), &board, 11).unwrap();
        let fresh = agent.values().clone();
        let err = agent.load_json(corrupted.as_slice()).unwrap_err();
        assert!(matches!(err, LoadError::IncompatibleModel { .. }), "{err}");
        assert_eq!(agent.values(), &fresh);

        let evaluator = RewardEvaluator::default();
        let mut session = session(10);
        let score = agent.run_episode(&mut session, &evaluator, 50);
        assert!(score.steps > 0);
    }

    #[test]
    fn test_load_rejects_table_from_wider_radar() {
        let board = BoardConfig::default();
        let mut trainer = LearningAgent::with_seed(&config(1.0), &board, 12).unwrap();
        let mut state = key();
        state.radar = vec![0b11_0000, 0, 0];
        trainer.update(&state, Action::Rotate, 1.0, 0.0);
        let mut buf = Vec::new();
        trainer.save_json(&mut buf).unwrap();

        let narrow = AgentConfig {
            radar: RadarConfig { width: 4, depth: 3 },
            ..config(1.0)
        };
        let mut agent = LearningAgent::with_seed(&narrow, &board, 12).unwrap();
        let err = agent.load_json(buf.as_slice()).unwrap_err();
        assert!(matches!(err, LoadError::IncompatibleModel { .. }), "{err}");
        assert!(agent.values().is_empty());

        let mut wide = LearningAgent::with_seed(&config(1.0), &board, 12).unwrap();
        wide.load_json(buf.as_slice()).unwrap();
        assert_eq!(wide.values(), trainer.values());
    }
}
