use std::path::PathBuf;

use qtris_engine::{BagSeed, Board, StepReport};
use qtris_evaluator::{RewardEvaluator, Transition};

use crate::{command::train::print_summary, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// Path to the model file (JSON format)
    #[arg(long)]
    model: PathBuf,
    /// Configuration file the model was trained with
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of episodes to play
    #[arg(long, default_value_t = 1)]
    episodes: usize,
    /// Step limit per episode
    #[arg(long, default_value_t = 10_000)]
    max_steps: usize,
    /// Piece bag seed (32 hex characters)
    #[arg(long)]
    seed: Option<BagSeed>,
    /// Print the board and its reward terms after every locked piece
    #[arg(long)]
    show_board: bool,
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg {
        model,
        config,
        episodes,
        max_steps,
        seed,
        show_board,
    } = arg;

    let config = util::read_config_file(config.as_deref())?;
    let (mut agent, mut session) = util::new_game(&config, *seed)?;
    util::load_model_file(&mut agent, model)?;
    agent.set_greedy(true);

    let evaluator = RewardEvaluator::from_weights(&config.reward);
    for episode in 1..=*episodes {
        for _ in 0..*max_steps {
            let before = show_board.then(|| session.settled_board());
            let Some(step) = agent.step(&mut session, &evaluator) else {
                break;
            };
            if let (Some(before), Some(_)) = (before, step.report.outcome.lock()) {
                print_lock(&evaluator, before, session.settled_board(), &step.report);
            }
            if step.report.game_over() {
                break;
            }
        }
        let score = agent.end_episode(&mut session);
        eprintln!(
            "Episode #{episode}: score {}, lines {}, pieces {}, steps {}, reward {:.3}",
            score.score, score.cleared_lines, score.locked_pieces, score.steps, score.reward
        );
    }

    eprintln!("Play finished:");
    print_summary(&agent, *episodes);
    Ok(())
}

fn print_lock(evaluator: &RewardEvaluator, before: Board, after: Board, report: &StepReport) {
    let transition = Transition::from_step(before, after, report);
    eprintln!("{}", transition.after().board());
    eprintln!(
        "  height {}, holes {}, bumpiness {}",
        transition.after().max_height(),
        transition.after().num_holes(),
        transition.after().surface_bumpiness()
    );
    for (term, value) in evaluator.breakdown(&transition) {
        eprintln!("  {:<16} {:+.3}", term.name(), value.weighted);
    }
}
