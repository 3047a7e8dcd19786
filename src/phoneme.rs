//! IPA → markup-engine phone set.
//!
//! The markup engine accepts its own phone symbols (`aa ae ah … zh`) rather
//! than IPA.  Conversion is a greedy longest-match over a fixed table: two-
//! character IPA clusters (diphthongs, affricates) first, then single
//! characters.  Stress marks are moved behind the next vowel, which is where
//! the phone set expects them.
//!
//! Any character missing from the table fails the whole conversion with
//! [`Error::UnknownPhoneme`]; the caller falls back to display text.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::{Error, Result};

/// Phones that carry stress.
const VOWELS: &[&str] = &[
    "aa", "ae", "ah", "ao", "aw", "ax", "ay", "eh", "er", "ey", "ih", "iy", "ow", "oy", "uh", "uw",
];

/// IPA → phone mapping.  Empty phones are accepted but produce no output.
static PHONES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        // diphthongs and affricates
        ("eɪ", "ey"), ("aɪ", "ay"), ("oʊ", "ow"), ("əʊ", "ow"), ("aʊ", "aw"), ("ɔɪ", "oy"),
        ("tʃ", "ch"), ("dʒ", "jh"), ("ɜː", "er"), ("ɝ", "er"), ("ɚ", "er"),
        // vowels
        ("ɑ", "aa"), ("ɒ", "aa"), ("æ", "ae"), ("ʌ", "ah"), ("ɔ", "ao"), ("ə", "ax"),
        ("ɛ", "eh"), ("e", "eh"), ("ɪ", "ih"), ("i", "iy"), ("ʊ", "uh"), ("u", "uw"),
        ("a", "aa"), ("o", "ow"),
        // consonants
        ("b", "b"), ("d", "d"), ("ð", "dh"), ("f", "f"), ("ɡ", "g"), ("g", "g"),
        ("h", "h"), ("j", "y"), ("k", "k"), ("l", "l"), ("ɫ", "l"), ("m", "m"),
        ("n", "n"), ("ŋ", "ng"), ("p", "p"), ("ɹ", "r"), ("r", "r"), ("ɾ", "t"),
        ("s", "s"), ("ʃ", "sh"), ("t", "t"), ("θ", "th"), ("v", "v"), ("w", "w"),
        ("z", "z"), ("ʒ", "zh"), ("ʤ", "jh"), ("ʧ", "ch"),
        // marks without a phone of their own
        ("ː", ""), ("ˑ", ""), (".", ""), ("\u{0329}", ""),
    ]
    .into_iter()
    .collect()
});

fn stress_symbol(c: char) -> Option<&'static str> {
    match c {
        'ˈ' => Some("1"),
        'ˌ' => Some("2"),
        _ => None,
    }
}

/// Convert an IPA string to space-separated markup phones.
pub fn ipa_to_phones(ipa: &str) -> Result<String> {
    let chars: Vec<char> = ipa.chars().collect();
    let mut phones: Vec<&str> = Vec::new();
    let mut stress: Option<&'static str> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if let Some(mark) = stress_symbol(c) {
            stress = Some(mark);
            i += 1;
            continue;
        }

        let pair: Option<String> = chars.get(i + 1).map(|next| [c, *next].iter().collect());
        let (phone, width) = match pair.as_deref().and_then(|p| PHONES.get(p)) {
            Some(phone) => (*phone, 2),
            None => {
                let single = c.to_string();
                match PHONES.get(single.as_str()) {
                    Some(phone) => (*phone, 1),
                    None => {
                        return Err(Error::UnknownPhoneme { symbol: c, ipa: ipa.to_string() })
                    }
                }
            }
        };
        i += width;

        if phone.is_empty() {
            continue;
        }
        phones.push(phone);
        if VOWELS.contains(&phone) {
            if let Some(mark) = stress.take() {
                phones.push(mark);
            }
        }
    }

    Ok(phones.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_word() {
        assert_eq!(ipa_to_phones("kæt").unwrap(), "k ae t");
    }

    #[test]
    fn test_diphthong_and_stress() {
        // "hello": stress lands behind the stressed vowel
        assert_eq!(ipa_to_phones("həˈloʊ").unwrap(), "h ax l ow 1");
        assert_eq!(ipa_to_phones("ˈtʃeɪs").unwrap(), "ch ey 1 s");
    }

    #[test]
    fn test_length_marks_dropped() {
        assert_eq!(ipa_to_phones("biːt").unwrap(), "b iy t");
    }

    #[test]
    fn test_multiple_words() {
        assert_eq!(ipa_to_phones("ðə kæt").unwrap(), "dh ax k ae t");
    }

    #[test]
    fn test_unknown_symbol() {
        let err = ipa_to_phones("kæʘ").unwrap_err();
        assert_eq!(err, Error::UnknownPhoneme { symbol: 'ʘ', ipa: "kæʘ".to_string() });
    }

    #[test]
    fn test_table_has_every_vowel_phone() {
        for vowel in VOWELS {
            assert!(PHONES.values().any(|p| p == vowel), "no IPA maps to {}", vowel);
        }
    }
}
