//! Cache file-name pattern with a wildcard run for the year.
//!
//! `solarviewdata_????.json.br` names the 2024 cache
//! `solarviewdata_2024.json.br`. Only the wildcard positions are read back
//! when enumerating the cache directory.

use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("file pattern '{0}' has no '?' wildcard")]
    NoWildcard(String),

    #[error("file pattern '{0}' has more than one '?' run")]
    SplitWildcard(String),

    #[error("file pattern '{0}' must not contain a path separator")]
    PathSeparator(String),
}

/// Parsed file-name pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    chars: Vec<char>,
    wildcard: Range<usize>,
}

impl FilePattern {
    pub fn parse(template: &str) -> Result<Self, PatternError> {
        if template.contains(['/', '\\']) {
            return Err(PatternError::PathSeparator(template.to_string()));
        }
        let chars: Vec<char> = template.chars().collect();
        let start = chars
            .iter()
            .position(|c| *c == '?')
            .ok_or_else(|| PatternError::NoWildcard(template.to_string()))?;
        let end = chars[start..]
            .iter()
            .position(|c| *c != '?')
            .map_or(chars.len(), |n| start + n);
        if chars[end..].contains(&'?') {
            return Err(PatternError::SplitWildcard(template.to_string()));
        }
        Ok(Self {
            chars,
            wildcard: start..end,
        })
    }

    /// Number of wildcard characters.
    pub fn width(&self) -> usize {
        self.wildcard.len()
    }

    /// File name for `year`, zero-padded to the wildcard width.
    pub fn file_name(&self, year: i32) -> String {
        let prefix: String = self.chars[..self.wildcard.start].iter().collect();
        let suffix: String = self.chars[self.wildcard.end..].iter().collect();
        format!("{prefix}{year:0width$}{suffix}", width = self.width())
    }

    /// Year encoded in `file_name`, if it matches the pattern.
    ///
    /// Literal characters must match exactly; the wildcard positions must
    /// hold an integer.
    pub fn year_of(&self, file_name: &str) -> Option<i32> {
        let name: Vec<char> = file_name.chars().collect();
        if name.len() != self.chars.len() {
            return None;
        }
        let literal_match = name
            .iter()
            .zip(&self.chars)
            .enumerate()
            .all(|(i, (n, p))| self.wildcard.contains(&i) || n == p);
        if !literal_match {
            return None;
        }
        let token: String = name[self.wildcard.clone()].iter().collect();
        token.parse().ok()
    }
}

impl std::fmt::Display for FilePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: String = self.chars.iter().collect();
        f.write_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> FilePattern {
        FilePattern::parse("solarviewdata_????.json.br").unwrap()
    }

    #[test]
    fn substitutes_year() {
        assert_eq!(pattern().file_name(2024), "solarviewdata_2024.json.br");
        assert_eq!(pattern().file_name(987), "solarviewdata_0987.json.br");
    }

    #[test]
    fn extracts_year_from_wildcard_positions() {
        let p = pattern();
        assert_eq!(p.year_of("solarviewdata_2019.json.br"), Some(2019));
        assert_eq!(p.year_of("solarviewdata_abcd.json.br"), None);
        assert_eq!(p.year_of("solarviewdata_2019.json.br.tmp"), None);
        assert_eq!(p.year_of("otherfile_2019.json.brxx"), None);
    }

    #[test]
    fn rejects_bad_templates() {
        assert!(matches!(
            FilePattern::parse("cache.bin"),
            Err(PatternError::NoWildcard(_))
        ));
        assert!(matches!(
            FilePattern::parse("c_??_??.bin"),
            Err(PatternError::SplitWildcard(_))
        ));
        assert!(matches!(
            FilePattern::parse("dir/c_????.bin"),
            Err(PatternError::PathSeparator(_))
        ));
    }

    #[test]
    fn wildcard_at_end() {
        let p = FilePattern::parse("year????").unwrap();
        assert_eq!(p.file_name(2021), "year2021");
        assert_eq!(p.year_of("year2021"), Some(2021));
    }
}
