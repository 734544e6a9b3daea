//! The countdown that runs before play begins.

use std::time::Duration;

/// The tokens shown before the first round, in order.
pub const INTRO_TOKENS: [&str; 4] = ["3", "2", "1", "GO"];

/// What the intro is doing after a step boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroStep {
    /// Show `token` and hold it for the step time.
    Show { index: usize, token: &'static str },
    /// Every token has been held for its full time.
    Completed,
}

/// A run-once sequence of timed steps.
///
/// The sequence advances one step each time the owner's step timer fires.
/// It never skips or repeats a token. Once it reports `Completed` it stays
/// there until `begin` is called again.
#[derive(Debug, Clone)]
pub struct IntroSequence {
    tokens: &'static [&'static str],
    step_time: Duration,
    current_step: Option<usize>,
    finished: bool,
}

impl IntroSequence {
    pub fn new(step_time: Duration) -> Self {
        Self::with_tokens(&INTRO_TOKENS, step_time)
    }

    pub fn with_tokens(tokens: &'static [&'static str], step_time: Duration) -> Self {
        Self {
            tokens,
            step_time,
            current_step: None,
            finished: false,
        }
    }

    pub fn step_time(&self) -> Duration {
        self.step_time
    }

    /// Total time from `begin` until `Completed`.
    pub fn total_time(&self) -> Duration {
        self.step_time * self.tokens.len() as u32
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Rewinds to the first token and returns it.
    pub fn begin(&mut self) -> IntroStep {
        self.current_step = None;
        self.finished = false;
        self.advance()
    }

    /// Moves past the current token. Called when its hold time is over.
    pub fn advance(&mut self) -> IntroStep {
        if self.finished {
            return IntroStep::Completed;
        }
        let next = self.current_step.map_or(0, |i| i + 1);
        match self.tokens.get(next) {
            Some(&token) => {
                self.current_step = Some(next);
                IntroStep::Show { index: next, token }
            }
            None => {
                self.finished = true;
                IntroStep::Completed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plays_every_token_in_order_then_completes() {
        let mut intro = IntroSequence::new(Duration::from_millis(750));
        let mut shown = Vec::new();
        let mut step = intro.begin();
        while let IntroStep::Show { token, .. } = step {
            shown.push(token);
            step = intro.advance();
        }
        assert_eq!(shown, INTRO_TOKENS);
        assert!(intro.is_finished());
        assert_eq!(intro.advance(), IntroStep::Completed);
    }

    #[test]
    fn begin_rewinds_a_finished_sequence() {
        let mut intro = IntroSequence::new(Duration::from_millis(10));
        intro.begin();
        for _ in 0..INTRO_TOKENS.len() {
            intro.advance();
        }
        assert!(intro.is_finished());
        assert_eq!(intro.begin(), IntroStep::Show { index: 0, token: "3" });
        assert!(!intro.is_finished());
    }

    #[test]
    fn total_time_covers_all_tokens() {
        let intro = IntroSequence::new(Duration::from_millis(750));
        assert_eq!(intro.total_time(), Duration::from_millis(3_000));
    }
}
