use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

const ADJECTIVES: &[&str] = &[
    "brave", "calm", "dark", "fast", "green", "happy", "jolly", "kind", "loud", "magic", "new",
    "orange", "proud", "quiet", "red", "shy", "smart", "strong", "tall", "tiny", "vivid", "wild",
    "yellow", "zealous", "ancient", "bold", "clever", "daring", "eager", "fancy", "gentle",
    "honest", "icy", "juicy", "keen", "lively", "mighty", "noble", "polite", "quick", "radiant",
    "silver", "tidy", "unique", "vibrant", "witty", "exotic", "young", "zesty", "blue", "golden",
    "royal", "rustic", "swift", "lucky", "merry", "prime",
];

const NOUNS: &[&str] = &[
    "apple", "bear", "cloud", "door", "eagle", "forest", "garden", "hill", "island", "jungle",
    "king", "lake", "mountain", "night", "ocean", "planet", "queen", "river", "star", "tree",
    "unicorn", "valley", "whale", "xylophone", "yeti", "zebra", "arrow", "bell", "castle",
    "diamond", "elephant", "falcon", "galaxy", "harbor", "igloo", "jewel", "knight", "lantern",
    "moon", "ninja", "oasis", "panda", "quest", "rocket", "sailor", "tiger", "umbrella", "village",
    "warrior", "yacht", "zeppelin", "dragon", "phoenix", "treasure", "wizard", "crown", "carnival",
    "banana", "compass", "dolphin",
];

/// Attempts at a bare id before falling back to a numeric suffix
pub const MAX_PLAIN_ATTEMPTS: usize = 10;

/// Suffixed candidates tried before giving up with a conflict
pub const MAX_SUFFIX_ATTEMPTS: usize = 10;

/// Produces candidate game ids
pub trait GameIdGenerator: Send + Sync {
    fn generate(&self) -> String;

    /// Candidate used once the plain ids keep colliding
    fn generate_with_suffix(&self) -> String {
        format!("{}-{}", self.generate(), thread_rng().gen_range(1..=999))
    }
}

/// `adjective-noun` ids such as `brave-falcon`
#[derive(Debug, Default, Clone, Copy)]
pub struct WordPairGenerator;

impl GameIdGenerator for WordPairGenerator {
    fn generate(&self) -> String {
        let mut rng = thread_rng();
        let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("brave");
        let noun = NOUNS.choose(&mut rng).copied().unwrap_or("falcon");
        format!("{}-{}", adjective, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_pairs_come_from_the_lists() {
        let id = WordPairGenerator.generate();
        let (adjective, noun) = id.split_once('-').unwrap();

        assert!(ADJECTIVES.contains(&adjective));
        assert!(NOUNS.contains(&noun));
    }

    #[test]
    fn suffix_is_in_range() {
        let id = WordPairGenerator.generate_with_suffix();
        let suffix: u32 = id.rsplit('-').next().unwrap().parse().unwrap();

        assert!((1..=999).contains(&suffix));
        assert_eq!(id.matches('-').count(), 2);
    }
}
