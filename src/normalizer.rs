//! Text canonicalization for fuzzy facility comparison.
//!
//! Two casual spellings of the same Arabic word (different hamza seat,
//! final taa-marbuta vs haa, alef-maqsura vs yaa, diacritics, tatweel)
//! normalize to the same string. The function is pure and idempotent.

use unicode_normalization::UnicodeNormalization;

const TATWEEL: char = '\u{0640}';
const BARE_ALEF: char = '\u{0627}';
const WAW: char = '\u{0648}';
const YAA: char = '\u{064A}';
const HAA: char = '\u{0647}';

/// Combining marks stripped after canonical decomposition.
const MARK_RANGES: &[(char, char)] = &[
    ('\u{0300}', '\u{036F}'), // Combining diacritical marks (Latin)
    ('\u{064B}', '\u{065F}'), // Arabic harakat, madda, hamza above/below
    ('\u{0670}', '\u{0670}'), // Superscript alef
    ('\u{06D6}', '\u{06ED}'), // Quranic annotation signs
];

fn is_stripped_mark(c: char) -> bool {
    MARK_RANGES.iter().any(|&(lo, hi)| (lo..=hi).contains(&c))
}

/// Letter folds applied to precomposed characters, before decomposition
/// would split the hamza off its seat. Input is composed first so a
/// decomposed seat plus hamza folds the same way.
fn fold_letter(c: char) -> char {
    match c {
        '\u{0622}' | '\u{0623}' | '\u{0625}' | '\u{0671}' => BARE_ALEF,
        '\u{0624}' | '\u{0626}' => WAW,
        '\u{0649}' => YAA,
        '\u{0629}' => HAA,
        _ => c,
    }
}

pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    lowered
        .trim()
        .nfc()
        .map(fold_letter)
        .nfd()
        .filter(|&c| c != TATWEEL && !is_stripped_mark(c))
        .map(fold_letter)
        .collect::<String>()
        .trim()
        .to_string()
}
