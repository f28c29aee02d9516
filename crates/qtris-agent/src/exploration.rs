use rand::Rng;
use serde::{Deserialize, Serialize};

/// Epsilon-greedy exploration schedule.
///
/// The rate only ever decreases, by `cooling_rate` after each exploratory
/// pick, until [`Exploration::heat`] puts it back to 1.
///
/// # Example
///
/// ```
/// use qtris_agent::Exploration;
///
/// let mut exploration = Exploration::new(1.0, 0.5);
/// exploration.cool();
/// assert_eq!(exploration.rate(), 0.5);
/// exploration.heat();
/// assert_eq!(exploration.rate(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Exploration {
    rate: f64,
    cooling_rate: f64,
}

impl Exploration {
    #[must_use]
    pub fn new(rate: f64, cooling_rate: f64) -> Self {
        Self { rate, cooling_rate }
    }

    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    #[must_use]
    pub fn cooling_rate(&self) -> f64 {
        self.cooling_rate
    }

    /// Restores full exploration.
    pub fn heat(&mut self) {
        self.rate = 1.0;
    }

    pub fn cool(&mut self) {
        self.rate *= self.cooling_rate;
    }

    /// Decides whether the next pick explores, cooling the rate if it does.
    pub fn explore<R>(&mut self, rng: &mut R) -> bool
    where
        R: Rng + ?Sized,
    {
        let explore = rng.random::<f64>() < self.rate;
        if explore {
            self.cool();
        }
        explore
    }
}
