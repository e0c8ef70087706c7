use std::{fmt, ops::Deref};

pub const APP_NAME_MAX: usize = 20;
pub const SUMMARY_MAX: usize = 64;
pub const BODY_MAX: usize = 256;

/// A string that holds at most `N` characters.
///
/// Anything longer is cut off when the value is assigned. Truncation is silent and always happens
/// on a character boundary, so a multi-byte code point is either kept whole or dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BoundedString<const N: usize>(String);

impl<const N: usize> BoundedString<N> {
    pub fn new(s: impl Into<String>) -> Self {
        let mut s = s.into();
        truncate_chars(&mut s, N);
        Self(s)
    }

    pub fn set(&mut self, s: impl Into<String>) {
        *self = Self::new(s);
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rewrite the contents in place. The result is truncated again, so `f` can never grow the
    /// string past the bound.
    pub fn map(&mut self, f: impl FnOnce(&str) -> String) {
        let mapped = f(&self.0);
        self.set(mapped);
    }
}

impl<const N: usize> Deref for BoundedString<N> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> AsRef<str> for BoundedString<N> {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> fmt::Display for BoundedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const N: usize> From<&str> for BoundedString<N> {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl<const N: usize> From<String> for BoundedString<N> {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

fn truncate_chars(s: &mut String, max_chars: usize) {
    if let Some((idx, _)) = s.char_indices().nth(max_chars) {
        s.truncate(idx);
    }
}
