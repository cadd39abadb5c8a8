//! Deterministic synthetic corpora.
//!
//! Generates reference-game sessions whose dialogues are grounded in the referents: the giver
//! names the target's color and shape (and its size when it is notably big or small), so a
//! words-as-classifiers model has something to learn. The same configuration always yields
//! the same corpus.
//!
//! # Examples
//!
//! ```
//! use tangrams_data::synthetic::SyntheticCorpus;
//!
//! let config = SyntheticCorpus {
//!     sessions: 3,
//!     rounds_per_session: 5,
//!     referents_per_round: 4,
//!     ..SyntheticCorpus::default()
//! };
//! let corpus = config.generate();
//! assert_eq!(corpus.len(), 3);
//! assert_eq!(corpus, config.generate());
//! assert!(corpus.rounds().all(|round| round.validate().is_ok()));
//! ```

use rand::{Rng, SeedableRng as _, seq::IndexedRandom as _};
use rand_distr::{Distribution as _, Normal};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{Referent, Round, Session, SessionSet, Utterance};

pub const SHAPES: [&str; 6] = ["bird", "boat", "bowl", "cat", "heart", "house"];

pub const COLORS: [(&str, [f64; 3]); 5] = [
    ("red", [0.9, 0.1, 0.1]),
    ("green", [0.1, 0.8, 0.2]),
    ("blue", [0.1, 0.2, 0.9]),
    ("yellow", [0.9, 0.9, 0.1]),
    ("purple", [0.6, 0.1, 0.7]),
];

const FILLERS: [&str; 4] = ["the", "uh", "um", "okay"];
const ACKNOWLEDGEMENTS: [&str; 3] = ["okay", "got", "yes"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticCorpus {
    pub sessions: usize,
    pub rounds_per_session: usize,
    pub referents_per_round: usize,
    /// Standard deviation of the Gaussian noise added to each color channel.
    pub color_noise: f64,
    pub seed: u64,
}

impl Default for SyntheticCorpus {
    fn default() -> Self {
        Self {
            sessions: 6,
            rounds_per_session: 20,
            referents_per_round: 10,
            color_noise: 0.05,
            seed: 0,
        }
    }
}

impl SyntheticCorpus {
    #[must_use]
    pub fn generate(&self) -> SessionSet {
        let mut rng = Pcg32::seed_from_u64(self.seed);
        let noise = Normal::new(0.0, self.color_noise).ok();
        let sessions = (0..self.sessions)
            .map(|s| {
                let rounds = (1..=self.rounds_per_session)
                    .map(|n| self.generate_round(&mut rng, noise.as_ref(), n))
                    .collect();
                Session::new(format!("session-{:02}", s + 1), rounds)
            })
            .collect();
        SessionSet::new(sessions)
    }

    fn generate_round<R>(&self, rng: &mut R, noise: Option<&Normal<f64>>, n: usize) -> Round
    where
        R: Rng,
    {
        let n = i32::try_from(n).unwrap_or(i32::MAX);
        let count = self.referents_per_round.max(1);
        let target = rng.random_range(0..count);

        let mut descriptions = Vec::with_capacity(count);
        let referents = (0..count)
            .map(|i| {
                let shape = SHAPES[rng.random_range(0..SHAPES.len())];
                let (color, rgb) = COLORS[rng.random_range(0..COLORS.len())];
                let [red, green, blue] = rgb.map(|c| {
                    let jitter = noise.map_or(0.0, |normal| normal.sample(rng));
                    (c + jitter).clamp(0.0, 1.0)
                });
                let size = rng.random_range(0.2..1.0);
                descriptions.push((shape, color, size));
                Referent::new(u32::try_from(i).unwrap_or(u32::MAX), n, shape)
                    .with_size(size)
                    .with_color(red, green, blue)
                    .with_pos(rng.random(), rng.random())
                    .with_target(i == target)
            })
            .collect();

        let (shape, color, size) = descriptions[target];
        let mut description = vec![];
        if size > 0.75 {
            description.push("big");
        } else if size < 0.4 {
            description.push("small");
        }
        description.extend([color, shape]);

        let mut giver_text = vec![*FILLERS.choose(rng).unwrap_or(&"the")];
        giver_text.extend(&description);
        let giver = Utterance::new("A", true, giver_text).with_ref_text(description);
        let follower = Utterance::new(
            "B",
            false,
            [*ACKNOWLEDGEMENTS.choose(rng).unwrap_or(&"okay")],
        );

        Round::new(n, vec![giver, follower], referents)
    }
}
