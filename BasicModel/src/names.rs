//! Mesh name sanitizing
//!
//! Mesh names end up in a fixed 64-byte header field and are matched by
//! tools that only understand ASCII. [`NameSanitizer`] folds names to ASCII,
//! truncates them to [`MAX_NAME_LEN`] and resolves collisions with a
//! `.000`, `.001`, ... suffix.
//!
//! A sanitizer lives in the [`ExportContext`](crate::export::ExportContext) of
//! a single export run and is dropped with it.

use std::collections::HashSet;

/// Characters kept from the source name before a collision suffix is added.
pub const MAX_NAME_LEN: usize = 12;

/// Substitute for characters with no ASCII equivalent.
const REPLACEMENT: char = '?';

#[derive(Debug, Default)]
pub struct NameSanitizer {
    assigned: HashSet<String>,
}

impl NameSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a new unique name for `name`.
    ///
    /// Every call returns a name not handed out before in this sanitizer,
    /// including repeated calls with the same input.
    pub fn assign(&mut self, name: &str) -> String {
        let base: String = name.chars().map(fold_ascii).take(MAX_NAME_LEN).collect();

        let mut candidate = base.clone();
        let mut counter = 0u32;
        while self.assigned.contains(&candidate) {
            candidate = format!("{base}.{counter:03}");
            counter += 1;
        }

        if candidate != base {
            tracing::debug!("Renamed '{}' to '{}' to avoid a collision", name, candidate);
        }

        self.assigned.insert(candidate.clone());
        candidate
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

/// Map one character to ASCII, dropping Latin-1 diacritics.
fn fold_ascii(c: char) -> char {
    if c.is_ascii() {
        return c;
    }
    match c {
        'À'..='Å' => 'A',
        'à'..='å' => 'a',
        'Ç' => 'C',
        'ç' => 'c',
        'È'..='Ë' => 'E',
        'è'..='ë' => 'e',
        'Ì'..='Ï' => 'I',
        'ì'..='ï' => 'i',
        'Ð' => 'D',
        'ð' => 'd',
        'Ñ' => 'N',
        'ñ' => 'n',
        'Ò'..='Ö' | 'Ø' => 'O',
        'ò'..='ö' | 'ø' => 'o',
        'Ù'..='Ü' => 'U',
        'ù'..='ü' => 'u',
        'Ý' => 'Y',
        'ý' | 'ÿ' => 'y',
        'ß' => 's',
        _ => REPLACEMENT,
    }
}
