use std::path::PathBuf;

use qtris_agent::{HistoryStats, ValueFunction as _, ValueModel};

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct InspectArg {
    /// Path to the model file (JSON format)
    #[arg(long)]
    model: PathBuf,
    /// Only summarize the last N episodes (0 for all)
    #[arg(long, default_value_t = 0)]
    window: usize,
}

pub(crate) fn run(arg: &InspectArg) -> anyhow::Result<()> {
    let InspectArg { model, window } = arg;
    let snapshot = util::read_snapshot_file(model)?;

    println!("Model:       {}", model.display());
    println!("Saved at:    {}", snapshot.saved_at);
    println!("Backend:     {}", snapshot.values.kind());
    match &snapshot.values {
        ValueModel::Tabular(table) => {
            let visited = table
                .entries()
                .filter(|(_, values)| values.as_array().iter().any(|v| *v != 0.0))
                .count();
            println!("States:      {} ({visited} updated)", table.len());
        }
        ValueModel::Regressor(model) => {
            println!(
                "Parameters:  {} ({} hidden units, {} inputs)",
                model.len(),
                model.hidden_units(),
                model.layout().input_len()
            );
        }
    }
    println!(
        "Exploration: {:.4} (cooling {})",
        snapshot.exploration.rate(),
        snapshot.exploration.cooling_rate()
    );
    println!("Episodes:    {}", snapshot.history.len());

    let Some(stats) = HistoryStats::recent(&snapshot.history, *window) else {
        return Ok(());
    };
    println!("Last {} episodes:", stats.episodes);
    for (name, s) in [
        ("Reward", stats.reward),
        ("Score", stats.score),
        ("Lines", stats.cleared_lines),
    ] {
        println!(
            "  {name:<7} min {:>9.3}  median {:>9.3}  mean {:>9.3}  max {:>9.3}  std dev {:>9.3}",
            s.min, s.median, s.mean, s.max, s.std_dev
        );
    }
    Ok(())
}
