//! Interactive game: one person against one bot over stdin/stdout.

use std::io::{self, BufRead, Write};

use gops_bot::{CardPrompt, Difficulty, HumanPolicy, PolicyError, PromptReply, build_policy};
use gops_bot::policy::parse_reply;
use gops_core::game::strategy::TurnContext;
use gops_core::game::{Game, GameError, TurnReport, Winner};
use gops_core::model::card::Card;
use gops_core::model::hand::Hand;
use gops_core::model::player::Seat;
use gops_core::statement::MovePredictor;
use rand::rngs::StdRng;
use thiserror::Error;

/// Line-oriented prompt. End of input counts as quitting.
pub struct StdinPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead + Send, W: Write + Send> StdinPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl StdinPrompt<io::BufReader<io::Stdin>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stdout())
    }
}

fn card_list<'a>(cards: impl Iterator<Item = &'a Card>) -> String {
    let mut cards: Vec<Card> = cards.copied().collect();
    cards.sort_by_key(|card| card.rank().token());
    cards
        .iter()
        .map(|card| card.rank().symbol())
        .collect::<Vec<_>>()
        .join(" ")
}

impl<R: BufRead + Send, W: Write + Send> CardPrompt for StdinPrompt<R, W> {
    fn present(&mut self, hand: &Hand, ctx: &TurnContext<'_>) {
        let _ = writeln!(
            self.output,
            "\nTurn {turn} | prize {prize} | pot [{pot}] worth {value}",
            turn = ctx.turn,
            prize = ctx.prize,
            pot = card_list(ctx.prize_cards.iter()),
            value = ctx.prize_value,
        );
        let _ = writeln!(
            self.output,
            "Score: you {} | bot {}",
            ctx.own_score, ctx.opponent_score
        );
        let _ = writeln!(self.output, "Your {}: {}", hand.suit(), card_list(hand.iter()));
    }

    fn ask(&mut self) -> PromptReply {
        let _ = write!(self.output, "Play a card (q to quit): ");
        let _ = self.output.flush();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => PromptReply::Quit,
            Ok(_) => parse_reply(&line),
        }
    }

    fn reject(&mut self, message: &str) {
        let _ = writeln!(self.output, "{message}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleOutcome {
    pub winner: Winner,
    /// Bot first, then the person.
    pub scores: [u32; 2],
    pub rounds: u32,
    pub quit: bool,
}

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("console output failed: {0}")]
    Io(#[from] io::Error),
}

/// Plays one game with the bot in seat one and `prompt` in seat two.
///
/// Round results go to `report`; the prompt owns its own output.
pub fn run_console_game<P: CardPrompt>(
    difficulty: Difficulty,
    model: Option<Box<dyn MovePredictor>>,
    prompt: P,
    report: &mut dyn Write,
    rng: &mut StdRng,
) -> Result<ConsoleOutcome, ConsoleError> {
    let mut game = Game::new(&mut *rng);
    let mut bot = build_policy(difficulty, model)?;
    let mut person = HumanPolicy::new(prompt);

    writeln!(
        report,
        "You hold Spades; the bot ({difficulty}) holds Hearts. Prizes are Clubs."
    )?;

    let mut quit = false;
    while !game.game_over() {
        match game.play_turn(&mut bot, &mut person, &mut *rng)? {
            TurnReport::Played(round) => {
                let result = match round.outcome.winner {
                    Some(Seat::One) => format!("bot takes {}", round.outcome.points),
                    Some(Seat::Two) => format!("you take {}", round.outcome.points),
                    None => "tie, the pot carries over".to_string(),
                };
                writeln!(
                    report,
                    "Turn {}: bot {} vs you {}: {}",
                    round.turn,
                    round.cards[0].rank(),
                    round.cards[1].rank(),
                    result
                )?;
            }
            TurnReport::Quit(seat) => {
                quit = true;
                writeln!(report, "{seat} quit.")?;
            }
        }
    }

    let winner = game.decide_winner();
    let scores = game.scores();
    let verdict = match winner {
        Winner::PlayerOne => "The bot wins.",
        Winner::PlayerTwo => "You win!",
        Winner::Tie => "It's a tie.",
    };
    writeln!(
        report,
        "Final score: you {} | bot {}. {verdict}",
        scores[1], scores[0]
    )?;

    Ok(ConsoleOutcome {
        winner,
        scores,
        rounds: game.arena().round(),
        quit,
    })
}
