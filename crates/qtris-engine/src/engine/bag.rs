use std::{collections::VecDeque, fmt, str::FromStr};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PieceKind;

/// Supplies pieces using the 7-bag randomization algorithm.
///
/// # 7-Bag System
///
/// 1. Create a "bag" containing all 7 piece types
/// 2. Shuffle the bag
/// 3. Draw pieces in order from the bag
/// 4. Append a new shuffled bag when 7 or fewer pieces remain
///
/// Draws are therefore grouped in cycles of 7 where every kind appears exactly
/// once, and at least 7 upcoming pieces can always be previewed.
///
/// # Example
///
/// ```
/// use qtris_engine::PieceBag;
///
/// let mut bag = PieceBag::new();
///
/// let first = bag.pop_next();
/// let upcoming: Vec<_> = bag.next_pieces().take(5).collect();
/// assert_eq!(upcoming.len(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct PieceBag {
    rng: Pcg32,
    bag: VecDeque<PieceKind>,
}

impl Default for PieceBag {
    fn default() -> Self {
        Self::new()
    }
}

/// Seed for deterministic piece generation.
///
/// A 128-bit seed, serialized as 32 hex characters. The same seed always
/// produces the same piece sequence.
///
/// # Example
///
/// ```
/// use qtris_engine::{BagSeed, PieceBag};
///
/// let seed: BagSeed = "0123456789abcdeffedcba9876543210".parse().unwrap();
/// let mut a = PieceBag::with_seed(seed);
/// let mut b = PieceBag::with_seed(seed);
/// assert_eq!(a.pop_next(), b.pop_next());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BagSeed([u8; 16]);

impl BagSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("invalid hex seed: {reason}")]
pub struct ParseSeedError {
    #[error(not(source))]
    reason: String,
}

impl fmt::Display for BagSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl FromStr for BagSeed {
    type Err = ParseSeedError;

    fn from_str(hex_str: &str) -> Result<Self, Self::Err> {
        if hex_str.len() != 32 {
            return Err(ParseSeedError {
                reason: format!("expected 32 characters, got {}", hex_str.len()),
            });
        }
        let num = u128::from_str_radix(hex_str, 16).map_err(|e| ParseSeedError {
            reason: format!("{hex_str} ({e})"),
        })?;
        Ok(Self::from_u128(num))
    }
}

impl Serialize for BagSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BagSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

/// Allows generating random `BagSeed` values with `rng.random()`.
impl Distribution<BagSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> BagSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        BagSeed(seed)
    }
}

impl PieceBag {
    /// Creates a new bag with a random seed.
    ///
    /// For deterministic piece generation, use [`Self::with_seed`] instead.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic piece generation.
    #[must_use]
    pub fn with_seed(seed: BagSeed) -> Self {
        let rng = Pcg32::from_seed(seed.0);
        let bag = VecDeque::with_capacity(PieceKind::LEN * 2);
        let mut this = Self { rng, bag };
        this.fill_bag();
        this
    }

    /// Appends shuffled bags until more than 7 pieces are queued.
    fn fill_bag(&mut self) {
        while self.bag.len() <= PieceKind::LEN {
            let mut new_bag = PieceKind::ALL;
            new_bag.shuffle(&mut self.rng);
            self.bag.extend(new_bag);
        }
    }

    /// Draws the next piece from the bag.
    ///
    /// # Panics
    ///
    /// Panics if the bag is empty (should never happen with proper refill logic).
    pub fn pop_next(&mut self) -> PieceKind {
        self.fill_bag();
        self.bag
            .pop_front()
            .expect("Piece bag should never be empty")
    }

    /// Returns an iterator over the upcoming pieces in the queue.
    pub fn next_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.bag.iter().copied()
    }
}
