//! One-shot multiple-choice verification for private chats.
//!
//! A deliberately weak filter against naive automated joiners, not a security
//! boundary: one static question, one correct option among several wrong ones,
//! no retry limit. No per-user state is kept between attempts; a wrong answer
//! simply points back at `/start`. Verification is terminal for the process
//! lifetime.
//!
//! Option order is shuffled per prompt so the correct button is not always in
//! the same position.

use rand::seq::SliceRandom;

/// Callback token carried by the correct option.
pub const CALLBACK_CORRECT: &str = "verify_ok";
/// Callback token carried by every wrong option.
pub const CALLBACK_WRONG: &str = "verify_no";

/// The challenge prompt text.
pub const QUESTION: &str = "Verification: which of these is a fruit?";

const CORRECT_OPTION: (&str, &str) = ("Apple", CALLBACK_CORRECT);
const WRONG_OPTIONS: [(&str, &str); 2] = [("Car", CALLBACK_WRONG), ("Brick", CALLBACK_WRONG)];

/// (label, callback token) pairs for one challenge prompt, shuffled.
pub fn challenge_options() -> Vec<(&'static str, &'static str)> {
    let mut options = vec![CORRECT_OPTION];
    options.extend_from_slice(&WRONG_OPTIONS);
    options.shuffle(&mut rand::thread_rng());
    options
}

/// Whether a callback data token is the correct answer.
pub fn is_correct(data: &str) -> bool {
    data == CALLBACK_CORRECT
}
