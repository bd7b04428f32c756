//! Morse alphabet lookup.
//!
//! `lookup` is total: codes without an entry decode to the empty string, so an
//! unknown character silently drops out of the message.

use std::collections::HashMap;
use std::sync::OnceLock;

const INTERNATIONAL: &[(&str, &str)] = &[
    (".-", "A"),
    ("-...", "B"),
    ("-.-.", "C"),
    ("-..", "D"),
    (".", "E"),
    ("..-.", "F"),
    ("--.", "G"),
    ("....", "H"),
    ("..", "I"),
    (".---", "J"),
    ("-.-", "K"),
    (".-..", "L"),
    ("--", "M"),
    ("-.", "N"),
    ("---", "O"),
    (".--.", "P"),
    ("--.-", "Q"),
    (".-.", "R"),
    ("...", "S"),
    ("-", "T"),
    ("..-", "U"),
    ("...-", "V"),
    (".--", "W"),
    ("-..-", "X"),
    ("-.--", "Y"),
    ("--..", "Z"),
    ("-----", "0"),
    (".----", "1"),
    ("..---", "2"),
    ("...--", "3"),
    ("....-", "4"),
    (".....", "5"),
    ("-....", "6"),
    ("--...", "7"),
    ("---..", "8"),
    ("----.", "9"),
    (".-.-.-", "."),
    ("--..--", ","),
    ("..--..", "?"),
    (".----.", "'"),
    ("-.-.--", "!"),
    ("-..-.", "/"),
    ("-.--.", "("),
    ("-.--.-", ")"),
    (".-...", "&"),
    ("---...", ":"),
    ("-.-.-.", ";"),
    ("-...-", "="),
    (".-.-.", "+"),
    ("-....-", "-"),
    ("..--.-", "_"),
    (".-..-.", "\""),
    ("...-..-", "$"),
    (".--.-.", "@"),
];

/// Bidirectional code table.
#[derive(Debug, Clone, Default)]
pub struct Alphabet {
    by_code: HashMap<String, String>,
    by_char: HashMap<char, String>,
}

impl Alphabet {
    /// The standard international table, built once.
    pub fn international() -> &'static Alphabet {
        static TABLE: OnceLock<Alphabet> = OnceLock::new();
        TABLE.get_or_init(|| {
            Alphabet::from_pairs(
                INTERNATIONAL
                    .iter()
                    .map(|(code, sym)| ((*code).to_string(), (*sym).to_string())),
            )
        })
    }

    /// Build a table from `(code, symbol)` pairs. Later duplicates win.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut table = Self::default();
        for (code, symbol) in pairs {
            let mut chars = symbol.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                table.by_char.insert(c.to_ascii_uppercase(), code.clone());
            }
            table.by_code.insert(code, symbol);
        }
        table
    }

    /// Symbol for a code, or `""` when the code is unknown.
    pub fn lookup(&self, code: &str) -> &str {
        self.by_code.get(code).map_or("", String::as_str)
    }

    /// Code for a single character (case-insensitive).
    pub fn encode(&self, c: char) -> Option<&str> {
        self.by_char.get(&c.to_ascii_uppercase()).map(String::as_str)
    }

    /// Encode text: one space between letters, three between words.
    /// Characters without a code are skipped.
    pub fn encode_text(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|word| {
                word.chars()
                    .filter_map(|c| self.encode(c))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join("   ")
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}
