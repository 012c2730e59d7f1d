pub mod difficulty;
pub mod policy;

pub use difficulty::Difficulty;
pub use policy::{
    BidPredictionPolicy, CardPrompt, ExternalModelPolicy, HumanPolicy, MirrorPrizePolicy,
    PolicyError, PromptReply, RandomPolicy, WeightedDistancePolicy, build_policy,
};
