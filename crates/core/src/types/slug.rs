//! Public store slug.
//!
//! The slug is the first path segment of every public proof link, so it is
//! restricted to lowercase ASCII letters, digits and single hyphens.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when validating a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug cannot be empty")]
    Empty,
    #[error("slug must be at most {max} characters")]
    TooLong { max: usize },
    #[error("slug may only contain lowercase letters, digits and hyphens")]
    InvalidCharacter,
    #[error("slug cannot start or end with a hyphen, or contain consecutive hyphens")]
    MisplacedHyphen,
}

/// A validated store slug, e.g. `sunny-prints`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Maximum slug length.
    pub const MAX_LENGTH: usize = 50;

    /// Validate an explicit slug.
    ///
    /// # Errors
    ///
    /// Returns a [`SlugError`] if the input is not already in canonical form.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(SlugError::InvalidCharacter);
        }
        if s.starts_with('-') || s.ends_with('-') || s.contains("--") {
            return Err(SlugError::MisplacedHyphen);
        }
        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from a display name.
    ///
    /// Lowercases, turns whitespace runs into hyphens, drops everything that is
    /// not a letter, digit, underscore or hyphen (underscores then become
    /// hyphens), collapses hyphen runs and truncates to [`Self::MAX_LENGTH`].
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if nothing usable remains.
    ///
    /// ```
    /// use simpler_proofs_core::Slug;
    ///
    /// let slug = Slug::from_name("  Sunny Prints & Co. ").unwrap();
    /// assert_eq!(slug.as_str(), "sunny-prints-co");
    /// ```
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let mut out = String::with_capacity(name.len());
        let mut pending_hyphen = false;

        for c in name.trim().chars().flat_map(char::to_lowercase) {
            if c.is_whitespace() || c == '-' || c == '_' {
                pending_hyphen = true;
            } else if c.is_ascii_alphanumeric() {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                out.push(c);
            }
        }

        out.truncate(Self::MAX_LENGTH);
        let trimmed = out.trim_end_matches('-');
        if trimmed.is_empty() {
            return Err(SlugError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical() {
        assert!(Slug::parse("sunny-prints").is_ok());
        assert!(Slug::parse("shop42").is_ok());
    }

    #[test]
    fn test_parse_rejects_non_canonical() {
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
        assert_eq!(Slug::parse("Sunny"), Err(SlugError::InvalidCharacter));
        assert_eq!(Slug::parse("sunny prints"), Err(SlugError::InvalidCharacter));
        assert_eq!(Slug::parse("-sunny"), Err(SlugError::MisplacedHyphen));
        assert_eq!(Slug::parse("sunny--prints"), Err(SlugError::MisplacedHyphen));
        assert!(matches!(
            Slug::parse(&"a".repeat(51)),
            Err(SlugError::TooLong { max: 50 })
        ));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Slug::from_name("Sunny Prints").unwrap().as_str(), "sunny-prints");
        assert_eq!(Slug::from_name("a  --  b").unwrap().as_str(), "a-b");
        assert_eq!(Slug::from_name("Mugs_and_More").unwrap().as_str(), "mugs-and-more");
        assert_eq!(Slug::from_name("!!!"), Err(SlugError::Empty));
    }

    #[test]
    fn test_from_name_output_always_parses() {
        for name in ["Sunny Prints", " x ", "Café Noir 2", &"long name ".repeat(10)] {
            let slug = Slug::from_name(name).unwrap();
            assert!(Slug::parse(slug.as_str()).is_ok(), "{slug} should be canonical");
        }
    }
}
