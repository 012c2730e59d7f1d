use super::log_play_decision;
use gops_core::game::strategy::{Choice, SelectionStrategy, TurnContext};
use gops_core::model::hand::Hand;
use gops_core::model::rank::Rank;
use rand::RngCore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptReply {
    Rank(Rank),
    Quit,
    Unrecognized(String),
}

/// Reads a reply typed at a prompt: a rank symbol, or `q`/`quit`.
pub fn parse_reply(raw: &str) -> PromptReply {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("q") || trimmed.eq_ignore_ascii_case("quit") {
        return PromptReply::Quit;
    }
    match trimmed.parse::<Rank>() {
        Ok(rank) => PromptReply::Rank(rank),
        Err(_) => PromptReply::Unrecognized(trimmed.to_string()),
    }
}

/// The seat's input channel; a console, a UI, or a test script.
pub trait CardPrompt: Send {
    fn present(&mut self, hand: &Hand, ctx: &TurnContext<'_>);

    fn ask(&mut self) -> PromptReply;

    fn reject(&mut self, message: &str);
}

/// Lets a person pick the card, re-prompting until the reply names a held card.
#[derive(Debug)]
pub struct HumanPolicy<P> {
    prompt: P,
}

impl<P: CardPrompt> HumanPolicy<P> {
    pub fn new(prompt: P) -> Self {
        Self { prompt }
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }
}

impl<P: CardPrompt> SelectionStrategy for HumanPolicy<P> {
    fn choose(&mut self, hand: &mut Hand, ctx: &TurnContext<'_>, _rng: &mut dyn RngCore) -> Choice {
        self.prompt.present(hand, ctx);
        loop {
            match self.prompt.ask() {
                PromptReply::Quit => return Choice::Quit,
                PromptReply::Rank(rank) => {
                    let remaining = hand.len();
                    match hand.select_by_identity(hand.suit(), rank) {
                        Some(card) => {
                            log_play_decision(ctx, self.label(), remaining, card, "prompt");
                            return Choice::Play(card);
                        }
                        None => self.prompt.reject(&format!("{rank} is not in your hand")),
                    }
                }
                PromptReply::Unrecognized(raw) => {
                    self.prompt.reject(&format!("'{raw}' is not a card value"));
                }
            }
        }
    }

    fn label(&self) -> &'static str {
        "human"
    }
}
