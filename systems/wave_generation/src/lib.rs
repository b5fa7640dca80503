#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave composition and spawn ordering.
//!
//! A wave's composition is a pure function of its number. Its spawn order is
//! drawn from a [`RandomSource`]: ordinary runs shuffle with operating system
//! entropy while daily runs derive a seed from the calendar day so that every
//! player faces the same order.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use training_defence_core::{EnemyKind, QUEUE_CAP};

/// Order in which kinds are laid into the queue before shuffling.
///
/// Rare kinds come first so that truncation at the queue cap drops the
/// plentiful basic walkers rather than the boss.
const FLATTEN_ORDER: [EnemyKind; 7] = [
    EnemyKind::Boss,
    EnemyKind::Regen,
    EnemyKind::Shield,
    EnemyKind::Tank,
    EnemyKind::Fast,
    EnemyKind::Swarm,
    EnemyKind::Basic,
];

/// Per-kind enemy counts of a single wave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaveStats {
    wave: u32,
    counts: [u32; 7],
}

impl WaveStats {
    /// Computes the composition of the provided wave number.
    #[must_use]
    pub fn for_wave(wave: u32) -> Self {
        let n = i64::from(wave);
        let mut counts = [0; 7];
        for (slot, kind) in counts.iter_mut().zip(EnemyKind::ALL) {
            let count = match kind {
                // round(6 + 1.8n) in integer arithmetic, halves rounding up.
                EnemyKind::Basic => (60 + 18 * n + 5).div_euclid(10),
                EnemyKind::Fast => n - 1,
                EnemyKind::Tank => (n - 1).div_euclid(3),
                EnemyKind::Shield => (n - 2).div_euclid(2),
                EnemyKind::Swarm => n - 2,
                EnemyKind::Regen => (n - 3).div_euclid(3),
                EnemyKind::Boss => i64::from(wave != 0 && wave % 5 == 0),
            };
            *slot = u32::try_from(count.max(0)).unwrap_or(u32::MAX);
        }
        Self { wave, counts }
    }

    /// Wave number the composition belongs to.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Number of enemies of the provided kind.
    #[must_use]
    pub fn count(&self, kind: EnemyKind) -> u32 {
        EnemyKind::ALL
            .iter()
            .position(|candidate| *candidate == kind)
            .map_or(0, |index| self.counts[index])
    }

    /// Iterates over the kinds present in the wave, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (EnemyKind, u32)> + '_ {
        EnemyKind::ALL
            .into_iter()
            .zip(self.counts)
            .filter(|(_, count)| *count > 0)
    }

    /// Total number of enemies before the queue cap is applied.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

impl fmt::Display for WaveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (kind, count) in self.iter() {
            if !first {
                f.write_str(" | ")?;
            }
            write!(f, "{count} {}", kind.profile().label)?;
            first = false;
        }
        if first {
            f.write_str("quiet")?;
        }
        Ok(())
    }
}

/// Source of uniform draws used to order a wave.
pub trait RandomSource {
    /// Returns a uniformly distributed index in `0..bound`.
    ///
    /// `bound` is never zero.
    fn below(&mut self, bound: usize) -> usize;
}

/// Nondeterministic source backed by an entropy-seeded ChaCha stream.
#[derive(Clone, Debug)]
pub struct EntropySource {
    rng: ChaCha8Rng,
}

impl EntropySource {
    /// Seeds a fresh stream from the operating system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl Default for EntropySource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropySource {
    fn below(&mut self, bound: usize) -> usize {
        self.rng.gen_range(0..bound)
    }
}

/// Deterministic linear congruential generator used for daily waves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeededLcg {
    state: u32,
}

impl SeededLcg {
    const MULTIPLIER: u32 = 1_664_525;
    const INCREMENT: u32 = 1_013_904_223;

    /// Creates a generator starting from the provided state.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Advances the generator and returns a value in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        f64::from(self.state) / 4_294_967_296.0
    }
}

impl RandomSource for SeededLcg {
    fn below(&mut self, bound: usize) -> usize {
        let scaled = (self.next_unit() * bound as f64) as usize;
        scaled.min(bound - 1)
    }
}

/// Derives the 32-bit shuffle seed for a daily wave.
///
/// The seed is the first four bytes of the SHA-256 digest of `"{seed}:{wave}"`.
#[must_use]
pub fn daily_seed(seed: &str, wave: u32) -> u32 {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(b":");
    hasher.update(wave.to_string().as_bytes());
    let digest = hasher.finalize();
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Builds the spawn queue of a wave using the provided random source.
///
/// The composition is flattened, truncated to [`QUEUE_CAP`] and shuffled with
/// a Fisher-Yates pass.
pub fn wave_queue<R: RandomSource + ?Sized>(wave: u32, rng: &mut R) -> Vec<EnemyKind> {
    let stats = WaveStats::for_wave(wave);
    let mut queue = Vec::with_capacity(QUEUE_CAP.min(stats.total() as usize));
    for kind in FLATTEN_ORDER {
        for _ in 0..stats.count(kind) {
            if queue.len() == QUEUE_CAP {
                break;
            }
            queue.push(kind);
        }
    }
    shuffle(&mut queue, rng);
    queue
}

fn shuffle<T, R: RandomSource + ?Sized>(items: &mut [T], rng: &mut R) {
    for index in (1..items.len()).rev() {
        let swap = rng.below(index + 1);
        items.swap(index, swap);
    }
}

/// Selects how spawn orders are drawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeedMode {
    /// Fresh entropy for every wave.
    Entropy,
    /// Deterministic order derived from the contained calendar-day seed.
    Daily(String),
}

impl SeedMode {
    /// Returns the daily seed when running in daily mode.
    #[must_use]
    pub fn daily(&self) -> Option<&str> {
        match self {
            Self::Entropy => None,
            Self::Daily(seed) => Some(seed),
        }
    }
}

/// Wave generator that owns the entropy stream and the active seed mode.
#[derive(Clone, Debug)]
pub struct WaveGeneration {
    mode: SeedMode,
    entropy: EntropySource,
}

impl WaveGeneration {
    /// Creates a generator in the provided mode.
    #[must_use]
    pub fn new(mode: SeedMode) -> Self {
        Self {
            mode,
            entropy: EntropySource::new(),
        }
    }

    /// Active seed mode.
    #[must_use]
    pub fn mode(&self) -> &SeedMode {
        &self.mode
    }

    /// Switches the seed mode used for subsequent waves.
    pub fn set_mode(&mut self, mode: SeedMode) {
        self.mode = mode;
    }

    /// Builds the spawn queue for the provided wave number.
    ///
    /// Daily mode never touches the entropy stream so replays stay identical.
    pub fn queue(&mut self, wave: u32) -> Vec<EnemyKind> {
        match &self.mode {
            SeedMode::Entropy => wave_queue(wave, &mut self.entropy),
            SeedMode::Daily(seed) => {
                let mut lcg = SeededLcg::new(daily_seed(seed, wave));
                wave_queue(wave, &mut lcg)
            }
        }
    }
}

impl Default for WaveGeneration {
    fn default() -> Self {
        Self::new(SeedMode::Entropy)
    }
}
