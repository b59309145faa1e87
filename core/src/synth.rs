//! Synthetic records for the insert benchmark.
//!
//! Every record has the same shape: a running number, a UUID, a word, a
//! pre-release version string, an ISO timestamp, an owner object encoded as
//! JSON text, a yes/no/maybe answer and a whole-number revenue. Generation is
//! seeded so the same `(nrows, seed)` always yields the same dataset.

use crate::dataset::{Dataset, Value};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

pub const COLUMNS: [&str; 8] = [
    "number",
    "uid",
    "name",
    "version",
    "timestamp",
    "owner",
    "published",
    "revenue",
];

/// Default dataset sizes written by the generator: 1e2 through 1e7 rows.
pub const DEFAULT_SIZES: [usize; 6] = [100, 1_000, 10_000, 100_000, 1_000_000, 10_000_000];

pub const DEFAULT_SEED: u64 = 42;

const OWNER_DOMAIN: &str = "test.com";
const ANSWERS: [&str; 3] = ["Yes", "No", "Maybe"];
const PRE_RELEASES: [&str; 3] = ["alpha", "beta", "rc"];

// 2000-01-01T00:00:00Z .. 2023-12-31T23:59:59Z
const TIMESTAMP_MIN: i64 = 946_684_800;
const TIMESTAMP_MAX: i64 = 1_704_067_199;

const WORDS: [&str; 32] = [
    "anchor", "basin", "cactus", "delta", "ember", "fjord", "glacier", "harbor", "island",
    "jungle", "kelp", "lagoon", "meadow", "nebula", "orchard", "prairie", "quarry", "ridge",
    "savanna", "tundra", "upland", "valley", "willow", "xenon", "yonder", "zephyr", "canyon",
    "summit", "grove", "marsh", "plateau", "reef",
];

const FEMALE_NAMES: [&str; 16] = [
    "Ada", "Beatrice", "Clara", "Dorothy", "Edith", "Frances", "Grace", "Hazel", "Irene",
    "Josephine", "Katherine", "Louise", "Margaret", "Nora", "Olive", "Pearl",
];

const SURNAMES: [&str; 16] = [
    "Abbott", "Barker", "Carver", "Dalton", "Ellis", "Fletcher", "Garner", "Hale", "Ingram",
    "Jensen", "Keller", "Lowell", "Mercer", "Norris", "Osborne", "Prescott",
];

#[derive(Debug, Clone, Serialize)]
struct Owner {
    email: String,
    token: String,
    creator: String,
}

/// One generated record before it is flattened into dataset cells.
#[derive(Debug, Clone)]
pub struct Record {
    pub number: i64,
    pub uid: String,
    pub name: String,
    pub version: String,
    pub timestamp: String,
    /// Owner object already encoded as JSON text.
    pub owner: String,
    pub published: String,
    pub revenue: f64,
}

impl Record {
    fn into_row(self) -> Vec<Value> {
        vec![
            self.number.into(),
            self.uid.into(),
            self.name.into(),
            self.version.into(),
            self.timestamp.into(),
            self.owner.into(),
            self.published.into(),
            self.revenue.into(),
        ]
    }
}

/// Deterministic record source.
pub struct Generator {
    rng: StdRng,
    next_number: i64,
}

impl Generator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            next_number: 1,
        }
    }

    pub fn record(&mut self) -> Result<Record> {
        let number = self.next_number;
        self.next_number += 1;

        let owner = Owner {
            email: self.email(),
            token: self.hex_token(32),
            creator: format!("{} {}", self.pick(&FEMALE_NAMES), self.pick(&SURNAMES)),
        };

        Ok(Record {
            number,
            uid: self.uuid_v4(),
            name: self.pick(&WORDS).to_string(),
            version: self.version(),
            timestamp: self.timestamp(),
            owner: serde_json::to_string(&owner)?,
            published: self.pick(&ANSWERS).to_string(),
            revenue: self.rng.gen_range(2.0..100_000.0_f64).round(),
        })
    }

    fn pick<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn uuid_v4(&mut self) -> String {
        let mut b: [u8; 16] = self.rng.gen();
        b[6] = (b[6] & 0x0f) | 0x40;
        b[8] = (b[8] & 0x3f) | 0x80;
        format!(
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7], b[8], b[9], b[10], b[11], b[12], b[13],
            b[14], b[15]
        )
    }

    fn hex_token(&mut self, nbytes: usize) -> String {
        (0..nbytes)
            .map(|_| format!("{:02x}", self.rng.gen::<u8>()))
            .collect()
    }

    fn email(&mut self) -> String {
        let user = format!(
            "{}{}{}",
            self.pick(&WORDS),
            self.pick(&SURNAMES),
            self.rng.gen_range(1..10_000)
        );
        format!("{}@{}", user.to_lowercase(), OWNER_DOMAIN)
    }

    fn version(&mut self) -> String {
        format!(
            "{}.{}.{}-{}.{}",
            self.rng.gen_range(0..10),
            self.rng.gen_range(0..20),
            self.rng.gen_range(0..50),
            self.pick(&PRE_RELEASES),
            self.rng.gen_range(1..10)
        )
    }

    fn timestamp(&mut self) -> String {
        let secs = self.rng.gen_range(TIMESTAMP_MIN..=TIMESTAMP_MAX);
        DateTime::<Utc>::from_timestamp(secs, 0)
            .unwrap_or_default()
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string()
    }
}

/// Generate `nrows` records as a dataset with [`COLUMNS`].
pub fn generate(nrows: usize, seed: u64) -> Result<Dataset> {
    let mut generator = Generator::new(seed);
    let mut rows = Vec::with_capacity(nrows);
    for _ in 0..nrows {
        rows.push(generator.record()?.into_row());
    }
    Dataset::new(COLUMNS.iter().map(|c| c.to_string()).collect(), rows)
}

/// File name the generator and the experiment driver agree on.
pub fn file_name(nrows: usize) -> String {
    format!("sim_data_{nrows}.csv")
}
