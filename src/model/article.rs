use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::Bibcode;

/// Placeholder used when the index has no title or author for a document
pub const NOT_AVAILABLE: &str = "NA";

/// Article metadata as returned by the search index
/// Fields the index did not return are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleMeta {
    pub bibcode: Bibcode,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub first_author: Option<String>,
    #[serde(default)]
    pub citation_count: Option<u64>,
    #[serde(default)]
    pub references: Option<Vec<Bibcode>>,
    #[serde(default)]
    pub pubdate: Option<String>,
}

impl ArticleMeta {
    pub fn new(bibcode: impl Into<Bibcode>) -> Self {
        Self {
            bibcode: bibcode.into(),
            title: None,
            first_author: None,
            citation_count: None,
            references: None,
            pubdate: None,
        }
    }

    /// Missing citation counts count as zero
    #[inline]
    pub fn citations(&self) -> u64 {
        self.citation_count.unwrap_or(0)
    }

    pub fn display_title(&self) -> String {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(NOT_AVAILABLE)
            .to_string()
    }

    /// Surname of the first author followed by `,+`
    /// e.g. `"Kurtz, M. J."` -> `"Kurtz,+"`
    pub fn abbreviated_author(&self) -> String {
        match self.first_author.as_deref() {
            Some(author) if !author.trim().is_empty() => {
                let surname = author.split(',').next().unwrap_or(author).trim();
                format!("{surname},+")
            }
            _ => NOT_AVAILABLE.to_string(),
        }
    }

    pub fn parsed_pubdate(&self) -> Option<PubDate> {
        self.pubdate.as_deref().and_then(|d| d.parse().ok())
    }
}

/// Month-resolution publication date
/// ADS dates look like `2014-03-00`; an unknown month (`00`) is read as January.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PubDate {
    pub year: u16,
    pub month: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubDateParseError(pub String);

impl fmt::Display for PubDateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid publication date: {:?}", self.0)
    }
}

impl std::error::Error for PubDateParseError {}

impl FromStr for PubDate {
    type Err = PubDateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PubDateParseError(s.to_string());
        let mut parts = s.trim().split('-');
        let year = parts
            .next()
            .and_then(|y| y.parse::<u16>().ok())
            .ok_or_else(err)?;
        let month = match parts.next() {
            Some(m) => m.parse::<u8>().map_err(|_| err())?,
            None => 0,
        };
        if month > 12 {
            return Err(err());
        }
        Ok(PubDate {
            year,
            month: month.max(1),
        })
    }
}

impl fmt::Display for PubDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-01", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_month_becomes_january() {
        let d: PubDate = "2014-00-00".parse().unwrap();
        assert_eq!(d, PubDate { year: 2014, month: 1 });
        assert_eq!(d.to_string(), "2014-01-01");
    }

    #[test]
    fn dates_order_by_year_then_month() {
        let a: PubDate = "2013-11-00".parse().unwrap();
        let b: PubDate = "2014-02-00".parse().unwrap();
        assert!(a < b);
        assert!("garbage".parse::<PubDate>().is_err());
        assert!("2014-13-00".parse::<PubDate>().is_err());
    }

    #[test]
    fn author_and_title_fallbacks() {
        let mut meta = ArticleMeta::new("2014A&A...1..1K");
        assert_eq!(meta.display_title(), "NA");
        assert_eq!(meta.abbreviated_author(), "NA");
        assert_eq!(meta.citations(), 0);

        meta.title = Some("Dark energy survey".into());
        meta.first_author = Some("Kurtz, M. J.".into());
        assert_eq!(meta.display_title(), "Dark energy survey");
        assert_eq!(meta.abbreviated_author(), "Kurtz,+");

        meta.first_author = Some("Collaboration".into());
        assert_eq!(meta.abbreviated_author(), "Collaboration,+");
    }
}
