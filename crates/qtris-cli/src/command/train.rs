use std::path::PathBuf;

use qtris_agent::{HistoryStats, LearningAgent, ValueFunction as _};
use qtris_engine::BagSeed;
use qtris_evaluator::RewardEvaluator;

use crate::util::{self, Output};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Configuration file (JSON); defaults are used for missing fields
    #[arg(long)]
    config: Option<PathBuf>,
    /// Model to continue training from; an unreadable model starts a fresh one
    #[arg(long)]
    model: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
    /// Number of episodes to play
    #[arg(long, default_value_t = 1000)]
    episodes: usize,
    /// Step limit per episode
    #[arg(long, default_value_t = 10_000)]
    max_steps: usize,
    /// Piece bag seed (32 hex characters)
    #[arg(long)]
    seed: Option<BagSeed>,
    /// Print progress every N episodes (0 to disable)
    #[arg(long, default_value_t = 100)]
    log_every: usize,
    /// Restore full exploration before training
    #[arg(long)]
    heat: bool,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        config,
        model,
        output,
        episodes,
        max_steps,
        seed,
        log_every,
        heat,
    } = arg;

    let config = util::read_config_file(config.as_deref())?;
    let (mut agent, mut session) = util::new_game(&config, *seed)?;
    if let Some(path) = model {
        match util::load_model_file(&mut agent, path) {
            Ok(()) => eprintln!(
                "Continuing from {} ({} episodes, {} entries)",
                path.display(),
                agent.history().len(),
                agent.values().len()
            ),
            Err(e) => eprintln!("Starting a fresh model: {e:#}"),
        }
    }
    if *heat {
        agent.heat();
    }

    let evaluator = RewardEvaluator::from_weights(&config.reward);
    for episode in 1..=*episodes {
        agent.run_episode(&mut session, &evaluator, *max_steps);
        if *log_every > 0 && episode.is_multiple_of(*log_every) {
            print_progress(episode, &agent, *log_every);
        }
    }

    eprintln!("Training finished:");
    print_summary(&agent, *episodes);

    Output::save_json(&agent.snapshot(), output.clone())?;
    Ok(())
}

fn print_progress(episode: usize, agent: &LearningAgent, window: usize) {
    let Some(stats) = HistoryStats::recent(agent.history(), window) else {
        return;
    };
    eprintln!(
        "Episode #{episode}: reward {:.3} [{:.3}, {:.3}], lines {:.2} (max {}), exploration {:.4}, entries {}",
        stats.reward.mean,
        stats.reward.min,
        stats.reward.max,
        stats.cleared_lines.mean,
        stats.cleared_lines.max,
        agent.exploration_rate(),
        agent.values().len(),
    );
}

pub(crate) fn print_summary(agent: &LearningAgent, window: usize) {
    let Some(stats) = HistoryStats::recent(agent.history(), window) else {
        eprintln!("  No episodes played");
        return;
    };
    eprintln!("  Episodes:      {}", stats.episodes);
    eprintln!(
        "  Reward:        mean {:.3}, median {:.3}, std dev {:.3}",
        stats.reward.mean, stats.reward.median, stats.reward.std_dev
    );
    eprintln!(
        "  Score:         mean {:.1}, max {}",
        stats.score.mean, stats.score.max
    );
    eprintln!(
        "  Cleared lines: mean {:.2}, max {}",
        stats.cleared_lines.mean, stats.cleared_lines.max
    );
    eprintln!("  Exploration:   {:.4}", agent.exploration_rate());
}
