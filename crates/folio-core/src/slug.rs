//! Slug derivation.
//!
//! This module only produces candidates. Uniqueness is decided by the
//! storage layer's unique key; a store walks [`candidates`] and treats a
//! failed insert as "taken, try the next one".

use unicode_normalization::{UnicodeNormalization as _, char::is_combining_mark};

/// Used when a title normalises to nothing (e.g. only punctuation).
pub const FALLBACK_SLUG: &str = "post";

pub const SEPARATOR: char = '-';

/// Longest base slug produced by [`normalize`], before any numeric suffix.
pub const MAX_BASE_LEN: usize = 80;

/// Normalise `title` into a URL-safe base slug.
///
/// Decomposes (NFKD), drops combining marks, transliterates the Latin
/// letters NFKD leaves alone (see [`transliterate`]), lowercases, and
/// collapses every run of other characters into a single [`SEPARATOR`].
/// Leading and trailing separators are trimmed. Scripts without a Latin
/// spelling yield [`FALLBACK_SLUG`]. Never returns an empty string.
pub fn normalize(title: &str) -> String {
  let mut out = String::with_capacity(title.len());
  let mut separate = false;

  for c in title.nfkd().filter(|c| !is_combining_mark(*c)) {
    let mut buf = [0u8; 4];
    let piece: &str = if c.is_ascii_alphanumeric() {
      c.to_ascii_lowercase().encode_utf8(&mut buf)
    } else if let Some(latin) = transliterate(c) {
      latin
    } else {
      separate = true;
      continue;
    };
    if separate && !out.is_empty() {
      out.push(SEPARATOR);
    }
    separate = false;
    out.push_str(piece);
  }

  if out.len() > MAX_BASE_LEN {
    out.truncate(MAX_BASE_LEN);
    let trimmed = out.trim_end_matches(SEPARATOR).len();
    out.truncate(trimmed);
  }

  if out.is_empty() {
    FALLBACK_SLUG.to_owned()
  } else {
    out
  }
}

/// Lowercase ASCII spelling of Latin letters that have no canonical
/// decomposition.
fn transliterate(c: char) -> Option<&'static str> {
  let s = match c {
    'ß' | 'ẞ' => "ss",
    'æ' | 'Æ' => "ae",
    'œ' | 'Œ' => "oe",
    'ø' | 'Ø' => "o",
    'ł' | 'Ł' => "l",
    'đ' | 'Đ' | 'ð' | 'Ð' => "d",
    'þ' | 'Þ' => "th",
    'ı' => "i",
    _ => return None,
  };
  Some(s)
}

/// `base`, then `base-1`, `base-2`, … in increasing order. Infinite.
pub fn candidates(base: &str) -> impl Iterator<Item = String> + '_ {
  std::iter::once(base.to_owned())
    .chain((1u64..).map(move |n| format!("{base}{SEPARATOR}{n}")))
}

/// Whether `slug` is `base` or one of its numbered candidates.
pub fn is_candidate_of(base: &str, slug: &str) -> bool {
  match slug.strip_prefix(base) {
    Some("") => true,
    Some(rest) => rest
      .strip_prefix(SEPARATOR)
      .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())),
    None => false,
  }
}
