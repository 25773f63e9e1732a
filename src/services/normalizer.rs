//! Text normalization shared by index building and query handling.
//!
//! Corpus tags and user attributes must pass through the same [`Normalizer`]
//! or their tokens will not line up with the fitted vocabulary. Both
//! strategies map a token to a fixed point, so normalizing twice is the same
//! as normalizing once.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Upper bound on rewrite passes per token
const MAX_PASSES: usize = 16;

/// Token normalization strategy, chosen once per index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizerKind {
    /// Porter-style suffix stripping
    #[default]
    Stem,
    /// Dictionary-free noun lemmatization
    Lemmatize,
}

impl FromStr for NormalizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stem" | "stemming" => Ok(NormalizerKind::Stem),
            "lemmatize" | "lemmatization" | "lemma" => Ok(NormalizerKind::Lemmatize),
            other => Err(format!(
                "unknown normalizer '{}', expected 'stem' or 'lemmatize'",
                other
            )),
        }
    }
}

impl fmt::Display for NormalizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizerKind::Stem => write!(f, "stem"),
            NormalizerKind::Lemmatize => write!(f, "lemmatize"),
        }
    }
}

/// Maps free text to canonical, whitespace-joined tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalizer {
    kind: NormalizerKind,
}

impl Normalizer {
    pub fn new(kind: NormalizerKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> NormalizerKind {
        self.kind
    }

    /// Splits on whitespace, canonicalizes every token and rejoins with single spaces
    pub fn normalize(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|token| self.canonical(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Normalizes a list of tokens as if they were one space-separated text
    pub fn normalize_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> String {
        tokens
            .iter()
            .map(|token| self.normalize(token.as_ref()))
            .filter(|token| !token.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn canonical(&self, token: &str) -> String {
        let rewrite = match self.kind {
            NormalizerKind::Stem => porter::stem,
            NormalizerKind::Lemmatize => lemma::lemmatize,
        };

        let mut current = token.to_lowercase();
        for _ in 0..MAX_PASSES {
            let next = rewrite(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}

mod porter {
    fn is_vowel(c: char) -> bool {
        matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
    }

    /// Number of vowel-consonant sequences in `word`
    fn measure(word: &str) -> usize {
        let mut count = 0;
        let mut prev_vowel = false;
        for c in word.chars() {
            let vowel = is_vowel(c);
            if !vowel && prev_vowel {
                count += 1;
            }
            prev_vowel = vowel;
        }
        count
    }

    fn has_vowel(word: &str) -> bool {
        word.chars().any(is_vowel)
    }

    fn ends_with_double_consonant(word: &str) -> bool {
        let mut rev = word.chars().rev();
        match (rev.next(), rev.next()) {
            (Some(last), Some(prev)) => last == prev && !is_vowel(last),
            _ => false,
        }
    }

    /// Consonant-vowel-consonant ending where the last consonant is not w, x or y
    fn ends_with_cvc(word: &str) -> bool {
        let mut rev = word.chars().rev();
        match (rev.next(), rev.next(), rev.next()) {
            (Some(c2), Some(v), Some(c1)) => {
                !is_vowel(c2) && is_vowel(v) && !is_vowel(c1) && !matches!(c2, 'w' | 'x' | 'y')
            }
            _ => false,
        }
    }

    const STEP2: &[(&str, &str)] = &[
        ("ational", "ate"),
        ("tional", "tion"),
        ("enci", "ence"),
        ("anci", "ance"),
        ("izer", "ize"),
        ("abli", "able"),
        ("alli", "al"),
        ("entli", "ent"),
        ("eli", "e"),
        ("ousli", "ous"),
        ("ization", "ize"),
        ("ation", "ate"),
        ("ator", "ate"),
        ("alism", "al"),
        ("iveness", "ive"),
        ("fulness", "ful"),
        ("ousness", "ous"),
        ("aliti", "al"),
        ("iviti", "ive"),
        ("biliti", "ble"),
    ];

    const STEP3: &[(&str, &str)] = &[
        ("icate", "ic"),
        ("ative", ""),
        ("alize", "al"),
        ("iciti", "ic"),
        ("ical", "ic"),
        ("ful", ""),
        ("ness", ""),
    ];

    const STEP4: &[&str] = &[
        "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion",
        "ou", "ism", "ate", "iti", "ous", "ive", "ize",
    ];

    /// First matching suffix wins; it is replaced only when the remaining stem has measure > 0
    fn apply_table(word: String, table: &[(&str, &str)]) -> String {
        for (suffix, replacement) in table {
            if let Some(stem) = word.strip_suffix(suffix) {
                if measure(stem) > 0 {
                    return format!("{stem}{replacement}");
                }
                return word;
            }
        }
        word
    }

    pub(super) fn stem(word: &str) -> String {
        if word.chars().count() <= 2 {
            return word.to_string();
        }
        let mut word = word.to_string();

        // Step 1a: plurals
        if let Some(stem) = word.strip_suffix("sses") {
            word = format!("{stem}ss");
        } else if let Some(stem) = word.strip_suffix("ies") {
            word = format!("{stem}i");
        } else if !word.ends_with("ss") {
            if let Some(stem) = word.strip_suffix('s') {
                word = stem.to_string();
            }
        }

        // Step 1b: -eed, -ed, -ing
        let mut trimmed = false;
        if let Some(stem) = word.strip_suffix("eed") {
            if measure(stem) > 0 {
                word = format!("{stem}ee");
            }
        } else if let Some(stem) = word.strip_suffix("ed").or_else(|| word.strip_suffix("ing")) {
            if has_vowel(stem) {
                word = stem.to_string();
                trimmed = true;
            }
        }

        if trimmed {
            if word.ends_with("at") || word.ends_with("bl") || word.ends_with("iz") {
                word.push('e');
            } else if ends_with_double_consonant(&word)
                && !(word.ends_with('l') || word.ends_with('s') || word.ends_with('z'))
            {
                word.pop();
            } else if measure(&word) == 1 && ends_with_cvc(&word) {
                word.push('e');
            }
        }

        // Step 1c: terminal y
        if let Some(stem) = word.strip_suffix('y') {
            if has_vowel(stem) {
                word = format!("{stem}i");
            }
        }

        word = apply_table(word, STEP2);
        word = apply_table(word, STEP3);

        // Step 4: drop residual suffixes from longer stems
        for suffix in STEP4 {
            if let Some(stem) = word.strip_suffix(suffix) {
                let allowed = if *suffix == "ion" {
                    stem.ends_with('s') || stem.ends_with('t')
                } else {
                    true
                };
                if allowed && measure(stem) > 1 {
                    word = stem.to_string();
                }
                break;
            }
        }

        // Step 5a: -e
        if let Some(stem) = word.strip_suffix('e') {
            let m = measure(stem);
            if m > 1 || (m == 1 && !ends_with_cvc(stem)) {
                word = stem.to_string();
            }
        }

        // Step 5b: -ll
        if word.ends_with("ll") && measure(&word) > 1 {
            word.pop();
        }

        word
    }
}

mod lemma {
    const IRREGULAR: &[(&str, &str)] = &[
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("people", "person"),
        ("mice", "mouse"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("geese", "goose"),
        ("indices", "index"),
        ("matrices", "matrix"),
        ("vertices", "vertex"),
        ("analyses", "analysis"),
        ("criteria", "criterion"),
        ("phenomena", "phenomenon"),
    ];

    /// Nouns that look plural but are their own lemma
    const INVARIANT: &[&str] = &[
        "series",
        "species",
        "news",
        "analytics",
        "statistics",
        "physics",
        "mathematics",
        "robotics",
        "graphics",
        "economics",
        "electronics",
        "ethics",
        "genetics",
        "logistics",
        "linguistics",
    ];

    pub(super) fn lemmatize(word: &str) -> String {
        if let Some((_, lemma)) = IRREGULAR.iter().find(|(plural, _)| *plural == word) {
            return lemma.to_string();
        }
        if word.chars().count() <= 3 || INVARIANT.contains(&word) {
            return word.to_string();
        }
        if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
            return word.to_string();
        }
        if let Some(stem) = word.strip_suffix("ies") {
            if stem.chars().count() > 1 {
                return format!("{stem}y");
            }
        }
        for suffix in ["sses", "xes", "zes", "ches", "shes"] {
            if word.ends_with(suffix) {
                return word[..word.len() - 2].to_string();
            }
        }
        match word.strip_suffix('s') {
            Some(stem) => stem.to_string(),
            None => word.to_string(),
        }
    }
}
