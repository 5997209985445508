use rand::Rng;
use thiserror::Error;

pub const MIN_LENGTH: usize = 4;
pub const DEFAULT_LENGTH: usize = 16;

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>/?";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("password length {requested} is below the minimum of {minimum}")]
    TooShort { requested: usize, minimum: usize },
}

/// The four disjoint character classes every generated password covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Lower,
    Upper,
    Digit,
    Symbol,
}

impl CharClass {
    pub const ALL: [CharClass; 4] = [
        CharClass::Lower,
        CharClass::Upper,
        CharClass::Digit,
        CharClass::Symbol,
    ];

    pub fn alphabet(self) -> &'static str {
        match self {
            CharClass::Lower => LOWERCASE,
            CharClass::Upper => UPPERCASE,
            CharClass::Digit => DIGITS,
            CharClass::Symbol => SYMBOLS,
        }
    }

    /// Returns the class `c` belongs to, or `None` if it is outside the alphabet.
    pub fn classify(c: char) -> Option<CharClass> {
        Self::ALL
            .into_iter()
            .find(|class| class.alphabet().contains(c))
    }
}

/// Union of all four classes, in class order.
pub fn full_alphabet() -> Vec<char> {
    CharClass::ALL
        .iter()
        .flat_map(|class| class.alphabet().chars())
        .collect()
}

/// Generates a password using the thread-local CSPRNG.
pub fn generate(length: usize) -> Result<String, GeneratorError> {
    generate_with(&mut rand::rng(), length)
}

/// Generates a password of exactly `length` characters containing at least one
/// character of every [`CharClass`].
///
/// One character per class is drawn first, the remainder is drawn from the full
/// alphabet, and the whole sequence is then Fisher–Yates shuffled so the seeded
/// characters do not sit at fixed positions. With a uniform `rng` every ordering
/// of the drawn multiset is equally likely.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> Result<String, GeneratorError> {
    if length < MIN_LENGTH {
        return Err(GeneratorError::TooShort {
            requested: length,
            minimum: MIN_LENGTH,
        });
    }

    let mut chars: Vec<char> = Vec::with_capacity(length);
    for class in CharClass::ALL {
        let alphabet: Vec<char> = class.alphabet().chars().collect();
        chars.push(pick(rng, &alphabet));
    }

    let all = full_alphabet();
    while chars.len() < length {
        chars.push(pick(rng, &all));
    }

    fisher_yates(rng, &mut chars);
    Ok(chars.into_iter().collect())
}

fn pick<R: Rng + ?Sized>(rng: &mut R, alphabet: &[char]) -> char {
    alphabet[rng.random_range(0..alphabet.len())]
}

/// In-place Fisher–Yates: walk from the last index down to 1 and swap with a
/// uniformly chosen index in `[0, i]`.
pub fn fisher_yates<T, R: Rng + ?Sized>(rng: &mut R, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}
