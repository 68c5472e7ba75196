use indexmap::IndexSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Vocabulary
/// Fixed, ordered set of recognized normalized keywords.
/// The position of a keyword is its dimension in every frequency vector,
/// so the order must never change for a deployed model.
///
/// Keywords are stored lower-cased; duplicates collapse onto the first position.
///
/// # Examples
/// ```
/// use paper_recommender::Vocabulary;
/// let vocab = Vocabulary::new(["Stars", "galaxies", "stars"]);
/// assert_eq!(vocab.len(), 2);
/// assert_eq!(vocab.index_of("stars"), Some(0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: IndexSet<Box<str>>,
}

impl Vocabulary {
    pub fn new<I, T>(terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase().into_boxed_str())
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms }
    }

    /// Number of dimensions (N)
    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Position of a normalized keyword
    #[inline]
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.terms.get_index_of(term)
    }

    #[inline]
    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    /// Keyword at a dimension
    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get_index(index).map(|t| t.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.as_ref())
    }
}

impl Serialize for Vocabulary {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for Vocabulary {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let terms = Vec::<String>::deserialize(deserializer)?;
        Ok(Vocabulary::new(terms))
    }
}
