use std::{
    fs::File,
    io::{self, BufReader, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use qtris_agent::{AgentSnapshot, LearningAgent, QtrisConfig};
use qtris_engine::{BagSeed, GameSession};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Reads and validates the configuration, or the defaults when no file is given.
pub fn read_config_file(path: Option<&Path>) -> anyhow::Result<QtrisConfig> {
    let config: QtrisConfig = match path {
        Some(path) => read_json_file("config", path)?,
        None => QtrisConfig::default(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Replaces the agent's learned state with the model saved at `path`.
///
/// On error the agent keeps its current state.
pub fn load_model_file<P>(agent: &mut LearningAgent, path: P) -> anyhow::Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open model file: {}", path.display()))?;
    agent
        .load_json(BufReader::new(file))
        .with_context(|| format!("Failed to load model file: {}", path.display()))?;
    Ok(())
}

pub fn read_snapshot_file<P>(path: P) -> anyhow::Result<AgentSnapshot>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open model file: {}", path.display()))?;
    let snapshot = AgentSnapshot::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to load model file: {}", path.display()))?;
    Ok(snapshot)
}

/// Builds an agent and a session for `config`, both seeded from one bag seed.
///
/// A random seed is drawn when none is given. The seed is printed so the run
/// can be repeated.
pub fn new_game(
    config: &QtrisConfig,
    seed: Option<BagSeed>,
) -> anyhow::Result<(LearningAgent, GameSession)> {
    let seed = seed.unwrap_or_else(rand::random);
    eprintln!("Seed: {seed}");
    let agent_seed = Pcg32::from_seed(*seed.as_bytes()).random();
    let agent = LearningAgent::with_seed(&config.agent, &config.board, agent_seed)
        .context("Invalid agent configuration")?;
    let session = GameSession::with_seed(config.board, seed);
    Ok((agent, session))
}
