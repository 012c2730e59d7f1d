use core::fmt;
use std::sync::OnceLock;

/// Automated player levels. The numeric level is part of the trace file
/// naming contract (`p1_d<level>_p2_d<level>_trace_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    Random,
    MirrorPrize,
    #[default]
    WeightedDistance,
    ExternalModel,
    BidPrediction,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Random,
        Difficulty::MirrorPrize,
        Difficulty::WeightedDistance,
        Difficulty::ExternalModel,
        Difficulty::BidPrediction,
    ];

    pub const fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Difficulty::Random),
            2 => Some(Difficulty::MirrorPrize),
            3 => Some(Difficulty::WeightedDistance),
            4 => Some(Difficulty::ExternalModel),
            5 => Some(Difficulty::BidPrediction),
            _ => None,
        }
    }

    pub const fn level(self) -> u8 {
        match self {
            Difficulty::Random => 1,
            Difficulty::MirrorPrize => 2,
            Difficulty::WeightedDistance => 3,
            Difficulty::ExternalModel => 4,
            Difficulty::BidPrediction => 5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Difficulty::Random => "random",
            Difficulty::MirrorPrize => "mirror-prize",
            Difficulty::WeightedDistance => "weighted-distance",
            Difficulty::ExternalModel => "external-model",
            Difficulty::BidPrediction => "bid-prediction",
        }
    }

    pub const fn needs_model(self) -> bool {
        matches!(self, Difficulty::ExternalModel)
    }

    /// Reads `GOPS_BOT_DIFFICULTY` once per process.
    pub fn from_env() -> Self {
        static CACHED: OnceLock<Difficulty> = OnceLock::new();
        *CACHED.get_or_init(|| Self::from_reader(|key| std::env::var(key).ok()))
    }

    fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        read("GOPS_BOT_DIFFICULTY")
            .and_then(|raw| Self::parse(&raw))
            .unwrap_or_default()
    }

    /// Accepts a level number or a label, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        if let Ok(level) = raw.parse::<u8>() {
            return Self::from_level(level);
        }
        Self::ALL.into_iter().find(|difficulty| {
            difficulty.label() == raw || difficulty.label().replace('-', "_") == raw
        })
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (d{})", self.label(), self.level())
    }
}
