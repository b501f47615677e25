//! Room code generation.

use chase_protocol::RoomCode;
use rand::Rng;

/// Characters a room code is drawn from: digits and upper-case letters,
/// nothing that needs shift-toggling on a phone keyboard beyond caps.
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Draws a random code of `len` characters.
///
/// Codes are not unique by construction; the store retries on collision.
pub fn generate_code(rng: &mut impl Rng, len: usize) -> RoomCode {
    let code: String = (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    RoomCode::new(code)
}
