//! Profile descriptor and namespace slugs

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const SLUG_SEPARATOR: char = '-';
const RESERVED_SLUG: &str = "default";
const ESCAPE_PREFIX: char = '~';

/// Minimum length of a display name, in characters
pub const MIN_NAME_LEN: usize = 2;

/// The last-used local profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            photo: None,
        }
    }

    pub fn with_photo(mut self, photo: impl Into<String>) -> Self {
        self.photo = Some(photo.into());
        self
    }

    pub fn slug(&self) -> String {
        profile_slug(&self.name)
    }

    /// First word of the name when it has at least two characters,
    /// otherwise the whole trimmed name
    pub fn greeting_name(&self) -> &str {
        let name = self.name.trim();
        match name.split_whitespace().next() {
            Some(first) if first.chars().count() >= MIN_NAME_LEN => first,
            _ => name,
        }
    }

    /// Upper-cased initial, `'A'` for an empty name
    pub fn avatar_letter(&self) -> char {
        self.name
            .trim()
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next())
            .unwrap_or('A')
    }
}

/// Validate a typed display name, returning it trimmed
pub fn validate_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.chars().count() < MIN_NAME_LEN {
        return Err(Error::InvalidInput(format!(
            "Profile name must be at least {} characters",
            MIN_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

/// Derive the storage slug for a display name.
///
/// Trims, lower-cases and collapses whitespace runs into `-`. A slug that
/// would read `default` or start with `~` gains a `~` prefix, keeping the
/// mapping injective and off the default namespace.
pub fn profile_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for (index, word) in name.split_whitespace().enumerate() {
        if index > 0 {
            slug.push(SLUG_SEPARATOR);
        }
        slug.extend(word.chars().flat_map(char::to_lowercase));
    }

    if slug == RESERVED_SLUG || slug.starts_with(ESCAPE_PREFIX) {
        slug.insert(0, ESCAPE_PREFIX);
    }
    slug
}
