//! Deck generation: sample symbols, pair them, shuffle.

use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::domain::cards::{Card, MatchKey};
use crate::errors::domain::{DomainError, ValidationKind};

/// Pair count used when a caller does not ask for one.
pub const DEFAULT_PAIR_COUNT: usize = 8;

/// Built-in symbol pool.
pub const CARD_SLUGS: [&str; 24] = [
    "apple",
    "balloon",
    "butterfly",
    "cat",
    "circus",
    "cupcake",
    "diamond",
    "dice",
    "fire",
    "flower",
    "fox",
    "lightning",
    "moon",
    "music",
    "octopus",
    "panda",
    "parrot",
    "pizza",
    "puzzle",
    "rainbow",
    "rocket",
    "star",
    "target",
    "unicorn",
];

/// Asset path of the face image for a symbol.
pub fn face_path(key: &str) -> String {
    format!("/assets/cards/card-{key}-200x280.webp")
}

/// Generate `2 * pair_count` cards from `pool` using `rng`.
///
/// Symbols are drawn without replacement, duplicated, and the whole deck is
/// permuted with a Fisher-Yates shuffle. Ids are assigned after the shuffle so
/// that `cards[i].id == i`.
pub fn generate_deck<R: Rng + ?Sized>(
    pair_count: usize,
    pool: &[&str],
    rng: &mut R,
) -> Result<Vec<Card>, DomainError> {
    if pair_count == 0 {
        return Err(DomainError::validation(
            ValidationKind::Other("PAIR_COUNT".into()),
            "pair count must be at least 1",
        ));
    }

    let mut distinct: Vec<&str> = Vec::with_capacity(pool.len());
    for symbol in pool {
        if !distinct.contains(symbol) {
            distinct.push(symbol);
        }
    }

    if distinct.len() < pair_count {
        return Err(DomainError::validation(
            ValidationKind::InsufficientPoolSize,
            format!(
                "pool has {} distinct symbols, {} pairs requested",
                distinct.len(),
                pair_count
            ),
        ));
    }

    let chosen = index::sample(rng, distinct.len(), pair_count);

    let mut keys: Vec<&str> = Vec::with_capacity(pair_count * 2);
    for i in chosen.into_iter() {
        keys.push(distinct[i]);
        keys.push(distinct[i]);
    }
    keys.shuffle(rng);

    Ok(keys
        .into_iter()
        .enumerate()
        .map(|(id, key)| Card::new(id, MatchKey::new(key), face_path(key)))
        .collect())
}

/// Deterministic deck for a given seed.
pub fn generate_deck_with_seed(
    pair_count: usize,
    pool: &[&str],
    seed: u64,
) -> Result<Vec<Card>, DomainError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    generate_deck(pair_count, pool, &mut rng)
}

/// Deck from the built-in pool with a fresh random seed.
pub fn default_deck(pair_count: usize) -> Result<Vec<Card>, DomainError> {
    generate_deck_with_seed(pair_count, &CARD_SLUGS, rand::random::<u64>())
}
