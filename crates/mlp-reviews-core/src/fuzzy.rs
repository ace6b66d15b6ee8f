//! Field-weighted fuzzy search over an in-memory review list.
//!
//! The index tokenizes every searchable field once at [`SearchIndex::initialize`]
//! and answers queries by comparing query tokens against field tokens with
//! normalized Levenshtein similarity.
//!
//! # Scoring
//!
//! 1. Split the query into lowercase alphanumeric tokens, dropping tokens
//!    shorter than `min_match_char_length`.
//! 2. For each query token, find the best `weight × similarity` over all
//!    field tokens. A field token matches when its similarity is at least
//!    `1 - threshold`. Prefix matches ("transf" → "transformer") score just
//!    below an exact match.
//! 3. A review is a hit only when every query token matched somewhere.
//! 4. Score = mean of the per-token bests divided by the highest field weight,
//!    so it lies in `(0, 1]`.
//! 5. Sort by score descending; equal scores keep index order.

use serde::Serialize;
use std::sync::Arc;

use crate::models::Review;

/// Searchable review fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    Title,
    Authors,
    Tags,
    Domain,
    #[serde(rename = "reviewSummary")]
    Summary,
    Content,
}

impl FieldKey {
    pub const ALL: [FieldKey; 6] = [
        FieldKey::Title,
        FieldKey::Authors,
        FieldKey::Tags,
        FieldKey::Domain,
        FieldKey::Summary,
        FieldKey::Content,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::Title => "title",
            FieldKey::Authors => "authors",
            FieldKey::Tags => "tags",
            FieldKey::Domain => "domain",
            FieldKey::Summary => "reviewSummary",
            FieldKey::Content => "content",
        }
    }
}

/// Relative importance of each field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldWeights {
    pub title: f64,
    pub authors: f64,
    pub tags: f64,
    pub domain: f64,
    pub summary: f64,
    pub content: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            title: 3.0,
            authors: 2.0,
            tags: 2.0,
            domain: 1.5,
            summary: 1.25,
            content: 1.0,
        }
    }
}

impl FieldWeights {
    pub fn get(&self, key: FieldKey) -> f64 {
        match key {
            FieldKey::Title => self.title,
            FieldKey::Authors => self.authors,
            FieldKey::Tags => self.tags,
            FieldKey::Domain => self.domain,
            FieldKey::Summary => self.summary,
            FieldKey::Content => self.content,
        }
    }

    fn max(&self) -> f64 {
        FieldKey::ALL
            .iter()
            .map(|k| self.get(*k))
            .fold(f64::MIN_POSITIVE, f64::max)
    }
}

/// Tunables for the fuzzy matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyOptions {
    /// `0.0` requires exact tokens, `1.0` matches anything.
    pub threshold: f64,
    /// Query tokens shorter than this (in chars) are ignored.
    pub min_match_char_length: usize,
    pub weights: FieldWeights,
}

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            min_match_char_length: 2,
            weights: FieldWeights::default(),
        }
    }
}

impl FuzzyOptions {
    fn min_similarity(&self) -> f64 {
        1.0 - self.threshold.clamp(0.0, 1.0)
    }
}

/// A matched span inside one field value.
///
/// Offsets are byte offsets into the original field text, `end` exclusive.
/// `value_index` selects the element for list fields (authors, tags) and is
/// always 0 for scalar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchLocation {
    pub field: FieldKey,
    pub value_index: usize,
    pub start: usize,
    pub end: usize,
}

/// One ranked search hit.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub review: Arc<Review>,
    /// Relevance in `(0.0, 1.0]`, higher is better.
    pub score: f64,
    pub matches: Vec<MatchLocation>,
}

/// A lowercase word with its byte span in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Split text into maximal alphanumeric runs, lowercased.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if c.is_alphanumeric() {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            tokens.push(Token {
                text: text[s..i].to_lowercase(),
                start: s,
                end: i,
            });
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            text: text[s..].to_lowercase(),
            start: s,
            end: text.len(),
        });
    }

    tokens
}

struct IndexedField {
    key: FieldKey,
    value_index: usize,
    tokens: Vec<Token>,
}

struct IndexedReview {
    review: Arc<Review>,
    fields: Vec<IndexedField>,
}

/// Field values of a review in index order.
fn field_values(review: &Review, key: FieldKey) -> Vec<&str> {
    match key {
        FieldKey::Title => vec![review.title.as_str()],
        FieldKey::Authors => review.authors.iter().map(String::as_str).collect(),
        FieldKey::Tags => review.tags.iter().map(String::as_str).collect(),
        FieldKey::Domain => vec![review.domain.as_str()],
        FieldKey::Summary => vec![review.review_summary.as_str()],
        FieldKey::Content => vec![review.content.as_str()],
    }
}

/// How a query token matched a field token.
struct TokenMatch {
    similarity: f64,
    /// Matched length in chars from the token start, `None` for the whole token.
    prefix_chars: Option<usize>,
}

fn match_token(query: &str, query_chars: usize, token: &str, min_sim: f64) -> Option<TokenMatch> {
    if token == query {
        return Some(TokenMatch {
            similarity: 1.0,
            prefix_chars: None,
        });
    }

    let token_chars = token.chars().count();

    if token_chars > query_chars && token.starts_with(query) {
        let similarity = 0.9 + 0.1 * (query_chars as f64 / token_chars as f64);
        return Some(TokenMatch {
            similarity,
            prefix_chars: Some(query_chars),
        });
    }

    let mut best: Option<TokenMatch> = None;

    // Length difference bounds the edit distance from below.
    let longest = query_chars.max(token_chars) as f64;
    let diff = (query_chars as isize - token_chars as isize).unsigned_abs() as f64;
    if 1.0 - diff / longest >= min_sim {
        let sim = strsim::normalized_levenshtein(query, token);
        if sim >= min_sim {
            best = Some(TokenMatch {
                similarity: sim,
                prefix_chars: None,
            });
        }
    }

    if token_chars > query_chars {
        let prefix: String = token.chars().take(query_chars).collect();
        let sim = strsim::normalized_levenshtein(query, &prefix) * 0.9;
        if sim >= min_sim && best.as_ref().map_or(true, |b| sim > b.similarity) {
            best = Some(TokenMatch {
                similarity: sim,
                prefix_chars: Some(query_chars),
            });
        }
    }

    best
}

/// Byte offset after `chars` characters of `text[start..]`.
fn advance_chars(text: &str, start: usize, chars: usize) -> usize {
    text[start..]
        .char_indices()
        .nth(chars)
        .map(|(i, _)| start + i)
        .unwrap_or(text.len())
}

/// In-memory fuzzy index. Owned by the caller; there is no global instance.
pub struct SearchIndex {
    options: FuzzyOptions,
    entries: Option<Vec<IndexedReview>>,
}

impl SearchIndex {
    pub fn new(options: FuzzyOptions) -> Self {
        Self {
            options,
            entries: None,
        }
    }

    pub fn options(&self) -> &FuzzyOptions {
        &self.options
    }

    pub fn is_initialized(&self) -> bool {
        self.entries.is_some()
    }

    /// Number of indexed reviews (0 before initialization).
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build the index, fully replacing any previous one.
    pub fn initialize(&mut self, reviews: &[Arc<Review>]) {
        let entries = reviews
            .iter()
            .map(|review| {
                let mut fields = Vec::new();
                for key in FieldKey::ALL {
                    for (value_index, value) in field_values(review, key).into_iter().enumerate() {
                        fields.push(IndexedField {
                            key,
                            value_index,
                            tokens: tokenize(value),
                        });
                    }
                }
                IndexedReview {
                    review: Arc::clone(review),
                    fields,
                }
            })
            .collect();
        self.entries = Some(entries);
    }

    /// Ranked fuzzy hits for `query`.
    ///
    /// Returns an empty list for a blank query or an uninitialized index.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let entries = match &self.entries {
            Some(e) => e,
            None => return Vec::new(),
        };
        if query.trim().is_empty() {
            return Vec::new();
        }

        let mut query_tokens: Vec<(String, usize)> = Vec::new();
        for token in tokenize(query) {
            let chars = token.text.chars().count();
            if chars >= self.options.min_match_char_length
                && !query_tokens.iter().any(|(t, _)| *t == token.text)
            {
                query_tokens.push((token.text, chars));
            }
        }
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let min_sim = self.options.min_similarity();
        let max_weight = self.options.weights.max();

        let mut hits: Vec<SearchHit> = entries
            .iter()
            .filter_map(|entry| {
                self.score_entry(entry, &query_tokens, min_sim, max_weight)
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        hits
    }

    fn score_entry(
        &self,
        entry: &IndexedReview,
        query_tokens: &[(String, usize)],
        min_sim: f64,
        max_weight: f64,
    ) -> Option<SearchHit> {
        let mut best_per_query = vec![0.0_f64; query_tokens.len()];
        let mut matches: Vec<MatchLocation> = Vec::new();

        for field in &entry.fields {
            let weight = self.options.weights.get(field.key);
            let mut source: Option<&str> = None;

            for token in &field.tokens {
                let mut token_span: Option<(usize, usize)> = None;

                for (qi, (q, q_chars)) in query_tokens.iter().enumerate() {
                    let Some(m) = match_token(q, *q_chars, &token.text, min_sim) else {
                        continue;
                    };
                    let weighted = weight * m.similarity;
                    if weighted > best_per_query[qi] {
                        best_per_query[qi] = weighted;
                    }

                    let end = match m.prefix_chars {
                        None => token.end,
                        Some(chars) => {
                            let text = *source.get_or_insert_with(|| {
                                field_values(&entry.review, field.key)[field.value_index]
                            });
                            advance_chars(text, token.start, chars).min(token.end)
                        }
                    };
                    token_span = Some(match token_span {
                        Some((s, e)) => (s, e.max(end)),
                        None => (token.start, end),
                    });
                }

                if let Some((start, end)) = token_span {
                    matches.push(MatchLocation {
                        field: field.key,
                        value_index: field.value_index,
                        start,
                        end,
                    });
                }
            }
        }

        if best_per_query.iter().any(|b| *b <= 0.0) {
            return None;
        }

        let score = best_per_query.iter().sum::<f64>() / (query_tokens.len() as f64 * max_weight);

        Some(SearchHit {
            review: Arc::clone(&entry.review),
            score,
            matches,
        })
    }
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new(FuzzyOptions::default())
    }
}
