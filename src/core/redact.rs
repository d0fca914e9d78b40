//! Path redaction for caller locations
//!
//! Rules apply in order: custom patterns, then the working directory (shown
//! as `.`), then the home directory (shown as `~`).

use super::error::Result;
use regex::Regex;
use std::borrow::Cow;

#[derive(Debug, Clone, Default)]
pub struct Redactor {
    rules: Vec<(Regex, String)>,
    cwd: Option<String>,
    home: Option<String>,
}

impl Redactor {
    /// A redactor that leaves every path unchanged
    pub fn empty() -> Self {
        Self::default()
    }

    /// Redact the current working directory and the user's home directory
    pub fn from_env() -> Self {
        let mut redactor = Self::empty();
        if let Ok(cwd) = std::env::current_dir() {
            redactor = redactor.with_cwd(cwd.to_string_lossy());
        }
        if let Some(home) = dirs::home_dir() {
            redactor = redactor.with_home(home.to_string_lossy());
        }
        redactor
    }

    #[must_use]
    pub fn with_home(mut self, path: impl AsRef<str>) -> Self {
        self.home = normalize(path.as_ref());
        self
    }

    #[must_use]
    pub fn with_cwd(mut self, path: impl AsRef<str>) -> Self {
        self.cwd = normalize(path.as_ref());
        self
    }

    /// Replace matches of `pattern` with `alias`
    ///
    /// `alias` may use `$1`-style capture references.
    pub fn with_rule(mut self, pattern: &str, alias: impl Into<String>) -> Result<Self> {
        self.rules.push((Regex::new(pattern)?, alias.into()));
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.cwd.is_none() && self.home.is_none()
    }

    pub fn redact<'a>(&self, path: &'a str) -> Cow<'a, str> {
        let mut out = Cow::Borrowed(path);
        for (pattern, alias) in &self.rules {
            let replaced = match pattern.replace_all(&out, alias.as_str()) {
                Cow::Owned(replaced) => Some(replaced),
                Cow::Borrowed(_) => None,
            };
            if let Some(replaced) = replaced {
                out = Cow::Owned(replaced);
            }
        }

        if let Some(rest) = self.cwd.as_deref().and_then(|cwd| strip_dir(&out, cwd)) {
            return Cow::Owned(format!(".{}", rest));
        }
        if let Some(rest) = self.home.as_deref().and_then(|home| strip_dir(&out, home)) {
            return Cow::Owned(format!("~{}", rest));
        }
        out
    }
}

fn normalize(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Remainder of `path` after `dir`, only on a path-component boundary
fn strip_dir<'a>(path: &'a str, dir: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(dir)?;
    if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') {
        Some(rest)
    } else {
        None
    }
}
