//! Mutation: small cyclic shifts of individual symbols
//!
//! Each position is shifted with probability `rate` by 1 to 3 steps, forward or
//! backward, around the alphabet ring.

use super::{Alphabet, Candidate};
use rand::Rng;

/// Largest step a single mutation may take
pub const MAX_SHIFT: usize = 3;

/// Largest usable step for this ring. A step equal to the ring length would
/// leave the symbol unchanged, so rings shorter than 4 clamp to `len - 1`.
pub fn max_shift(alphabet: &Alphabet) -> usize {
    MAX_SHIFT.min(alphabet.len().saturating_sub(1)).max(1)
}

/// Return a mutated copy of `candidate`.
///
/// `rate == 0.0` is the identity; `rate == 1.0` changes every position that is
/// on the ring.
pub fn mutate<R: Rng + ?Sized>(
    candidate: &Candidate,
    rate: f64,
    alphabet: &Alphabet,
    rng: &mut R,
) -> Candidate {
    if rate <= 0.0 {
        return candidate.clone();
    }
    let max = max_shift(alphabet);
    Candidate::from_symbols(candidate.as_bytes().iter().map(|&symbol| {
        if rng.gen::<f64>() < rate {
            let distance = rng.gen_range(1..=max) as isize;
            if rng.gen_bool(0.5) {
                alphabet.shift(symbol, distance)
            } else {
                alphabet.shift(symbol, -distance)
            }
        } else {
            symbol
        }
    }))
}
