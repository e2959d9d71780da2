//! File-name mask groups.
//!
//! A mask is one or more glob-style patterns separated by semicolons
//! (e.g., `*.jpg;*.png`). Matching is case-insensitive: `*` matches any
//! run of characters (possibly empty) and `?` matches exactly one.
//! A leading `|` on the whole mask string inverts the match, turning the
//! group into an exclude list. A doubled `;;` escapes a literal semicolon
//! inside a pattern.
//!
//! Masks are validated up front; `MaskGroup::parse` is the only way to
//! construct one, so an invalid mask can never reach a running walk.

use crate::error::WalkerError;

/// Characters that cannot appear in a file-name pattern.
const FORBIDDEN: &[char] = &['\\', '/', '<', '>', ':', '"'];

/// A validated, normalized set of name patterns.
#[derive(Debug, Clone)]
pub struct MaskGroup {
    source: String,
    patterns: Vec<Vec<char>>,
    invert: bool,
}

impl MaskGroup {
    /// Parses and validates a mask string.
    ///
    /// # Errors
    /// Returns `WalkerError::InvalidMask` with the character position of
    /// the offending character when the string contains a path separator,
    /// a control character, a non-leading `|`, or a leading `|` with no
    /// patterns after it.
    pub fn parse(mask: &str) -> Result<MaskGroup, WalkerError> {
        let chars: Vec<char> = mask.chars().collect();
        let invalid = |position: usize| WalkerError::InvalidMask {
            mask: mask.to_string(),
            position,
        };

        let mut start = 0;
        let invert = chars.first() == Some(&'|');
        if invert {
            start = 1;
        }

        let mut patterns: Vec<Vec<char>> = Vec::new();
        let mut current = String::new();
        let flush = |current: &mut String, patterns: &mut Vec<Vec<char>>| {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                patterns.push(normalize(trimmed));
            }
            current.clear();
        };

        let mut i = start;
        while i < chars.len() {
            let c = chars[i];
            if c == ';' {
                // ";;" is a literal semicolon inside a pattern
                if chars.get(i + 1) == Some(&';') {
                    current.push(';');
                    i += 2;
                    continue;
                }
                flush(&mut current, &mut patterns);
            } else if c == '|' {
                // the invert marker is consumed as one unit at the front
                return Err(invalid(i));
            } else if (c as u32) < 0x20 || FORBIDDEN.contains(&c) {
                return Err(invalid(i));
            } else {
                current.push(c);
            }
            i += 1;
        }
        flush(&mut current, &mut patterns);

        if invert && patterns.is_empty() {
            return Err(invalid(0));
        }

        Ok(MaskGroup {
            source: mask.to_string(),
            patterns,
            invert,
        })
    }

    /// Tests a plain file name against the group.
    ///
    /// An empty group matches nothing. For an inverted group the result is
    /// flipped: a name matches when no pattern agrees with it.
    pub fn matches(&self, name: &str) -> bool {
        let name_chars: Vec<char> = name.chars().collect();
        let has_extension = name_has_extension(name);
        let hit = self
            .patterns
            .iter()
            .any(|pattern| agree_mask(&name_chars, pattern, has_extension));
        hit != self.invert
    }

    /// The original mask string, as given by the caller.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when a leading `|` turned this group into an exclude list.
    pub fn is_inverted(&self) -> bool {
        self.invert
    }
}

/// A name "has an extension" when there is a dot with something after it;
/// ".profile" counts, "Makefile" and "name." do not.
fn name_has_extension(name: &str) -> bool {
    match name.rfind('.') {
        Some(i) => i + 1 < name.len(),
        None => false,
    }
}

/// Normalizes one trimmed pattern: "**" collapses to "*" and "*?"
/// reorders to "?*", so that a single trailing "*" check suffices during
/// matching.
fn normalize(pattern: &str) -> Vec<char> {
    let mut out: Vec<char> = Vec::new();
    let mut last = '\0';
    for c in pattern.chars() {
        if c == '*' && last == '*' {
            continue;
        }
        if c == '?' && last == '*' {
            let end = out.len() - 1;
            out[end] = '?';
            out.push('*');
            continue;
        }
        out.push(c);
        last = c;
    }
    out
}

fn chars_eq(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Recursive pattern match over characters.
///
/// A pattern ending in "." or ".*" still agrees with a name that has no
/// extension ("readme" matches "*.*"), mirroring how file managers treat
/// the all-files mask.
fn agree_mask(name: &[char], mask: &[char], has_extension: bool) -> bool {
    let mut n = 0;
    let mut m = 0;
    while n < name.len() {
        if m >= mask.len() {
            return false; // mask too short
        }
        let mc = mask[m];
        if mc == '?' || chars_eq(mc, name[n]) {
            n += 1;
            m += 1;
        } else if mc == '*' {
            m += 1;
            while n < name.len() {
                if agree_mask(&name[n..], &mask[m..], has_extension) {
                    return true;
                }
                n += 1;
            }
            break; // name exhausted under the star
        } else {
            return false;
        }
    }
    if m < mask.len() && mask[m] == '*' {
        m += 1;
    }
    if !has_extension && m < mask.len() && mask[m] == '.' {
        m + 1 == mask.len() || (m + 2 == mask.len() && mask[m + 1] == '*')
    } else {
        m == mask.len()
    }
}
