//! Hardcoded canned replies for when every generation backend is down.

use rand::Rng;

pub const EMERGENCY_RESPONSES: [&str; 3] = [
    "I'm feeling a bit overwhelmed right now, but I'm still here for you. 💕",
    "Something's not quite right in my circuits, but I'm listening. 💕",
    "I'm having a moment of confusion, but I still care. What's on your heart? 💞",
];

/// Pick one of the canned replies.
///
/// The randomness source is injected so tests can seed it and assert a
/// specific selection.
pub fn emergency_response<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    EMERGENCY_RESPONSES[rng.random_range(0..EMERGENCY_RESPONSES.len())]
}
