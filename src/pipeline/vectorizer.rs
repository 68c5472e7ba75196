use indexmap::IndexMap;
use tracing::debug;

use crate::error::{RecommendError, Result};
use crate::model::Vocabulary;

/// KeywordFrequency
/// Counts the occurrences of normalized keywords of a document and its references.
///
/// # Examples
/// ```
/// use paper_recommender::pipeline::vectorizer::KeywordFrequency;
/// let mut freq = KeywordFrequency::new();
/// freq.add_keywords(&["stars", "galaxies", "stars"]);
/// assert_eq!(freq.keyword_count("stars"), 2);
/// assert_eq!(freq.keyword_sum(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct KeywordFrequency {
    keyword_count: IndexMap<String, u64>,
    total_keyword_count: u64,
}

impl KeywordFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count only the keywords present in the vocabulary.
    /// Keywords are lower-cased before lookup.
    pub fn from_vocabulary_filter<T>(vocab: &Vocabulary, keywords: &[T]) -> Self
    where
        T: AsRef<str>,
    {
        let mut freq = Self::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if vocab.contains(&keyword) {
                freq.add_keyword(&keyword);
            }
        }
        freq
    }

    #[inline]
    pub fn add_keyword(&mut self, keyword: &str) -> &mut Self {
        let count = self.keyword_count.entry(keyword.to_string()).or_insert(0);
        *count += 1;
        self.total_keyword_count += 1;
        self
    }

    #[inline]
    pub fn add_keywords<T>(&mut self, keywords: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for keyword in keywords {
            self.add_keyword(keyword.as_ref());
        }
        self
    }

    #[inline]
    pub fn keyword_count(&self, keyword: &str) -> u64 {
        self.keyword_count.get(keyword).copied().unwrap_or(0)
    }

    /// Total number of counted keywords
    #[inline]
    pub fn keyword_sum(&self) -> u64 {
        self.total_keyword_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_keyword_count == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.keyword_count.iter().map(|(k, &c)| (k.as_str(), c))
    }
}

/// Vectorizer
/// Turns keyword counts into a normalized frequency vector over the vocabulary:
/// slot i = count(keyword_i) / total count.
pub struct Vectorizer<'a> {
    vocab: &'a Vocabulary,
}

impl<'a> Vectorizer<'a> {
    pub fn new(vocab: &'a Vocabulary) -> Self {
        Self { vocab }
    }

    /// # Arguments
    /// * `bibcode` - document the keywords belong to (for error reporting)
    /// * `keywords` - raw keyword bag from the index (own + references)
    ///
    /// # Returns
    /// * `Vec<f64>` - length `vocab.len()`, entries sum to 1.0
    pub fn vectorize<T>(&self, bibcode: &str, keywords: &[T]) -> Result<Vec<f64>>
    where
        T: AsRef<str>,
    {
        let freq = KeywordFrequency::from_vocabulary_filter(self.vocab, keywords);
        self.vectorize_freq(bibcode, &freq)
    }

    /// Same as `vectorize` for already counted keywords.
    /// Keywords outside the vocabulary are ignored.
    pub fn vectorize_freq(&self, bibcode: &str, freq: &KeywordFrequency) -> Result<Vec<f64>> {
        let mut vec = vec![0.0_f64; self.vocab.len()];
        let mut total = 0_u64;
        for (keyword, count) in freq.iter() {
            if let Some(idx) = self.vocab.index_of(keyword) {
                vec[idx] += count as f64;
                total += count;
            }
        }
        if total == 0 {
            return Err(RecommendError::NoUsableKeywords { bibcode: bibcode.to_string() });
        }
        let total = total as f64;
        vec.iter_mut().for_each(|v| *v /= total);
        debug!(bibcode, keywords = total, dims = vec.len(), "built frequency vector");
        Ok(vec)
    }
}
