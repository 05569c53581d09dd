//! TF-IDF text vectorizer over unigrams and bigrams.
//!
//! Vocabulary is the `max_features` most frequent terms across the corpus
//! (ties broken alphabetically), indexed in alphabetical order. Weights use
//! smoothed idf `ln((1 + n) / (1 + df)) + 1` and rows are L2-normalized.

use std::collections::{BTreeMap, HashMap, HashSet};

/// Sparse row: `(feature index, value)` pairs sorted by index.
pub type SparseVector = Vec<(u32, f32)>;

/// Value of `feature` in a sparse row, zero when absent.
pub fn sparse_value(row: &[(u32, f32)], feature: u32) -> f32 {
    row.binary_search_by_key(&feature, |&(f, _)| f)
        .map(|i| row[i].1)
        .unwrap_or(0.0)
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, u32>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    pub fn fit(docs: &[String], max_features: usize) -> Self {
        let mut term_count: HashMap<String, u64> = HashMap::new();
        let mut doc_freq: HashMap<String, u32> = HashMap::new();

        for doc in docs {
            let terms = ngrams(doc);
            let mut seen = HashSet::new();
            for term in terms {
                *term_count.entry(term.clone()).or_default() += 1;
                if seen.insert(term.clone()) {
                    *doc_freq.entry(term).or_default() += 1;
                }
            }
        }

        let mut ranked: Vec<(String, u64)> = term_count.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_features);

        let mut terms: Vec<String> = ranked.into_iter().map(|(t, _)| t).collect();
        terms.sort();

        let n_docs = docs.len() as f32;
        let idf = terms
            .iter()
            .map(|t| {
                let df = doc_freq.get(t).copied().unwrap_or(0) as f32;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        let vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t, i as u32))
            .collect();

        Self { vocabulary, idf }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    pub fn transform(&self, doc: &str) -> SparseVector {
        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();
        for term in ngrams(doc) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_default() += 1.0;
            }
        }

        let mut row: SparseVector = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx as usize]))
            .collect();

        let norm = row.iter().map(|(_, v)| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, v) in &mut row {
                *v /= norm;
            }
        }
        row
    }
}

/// Unigrams followed by space-joined bigrams.
fn ngrams(doc: &str) -> Vec<String> {
    let tokens: Vec<&str> = doc.split_whitespace().collect();
    let mut out: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    out.extend(tokens.windows(2).map(|w| format!("{} {}", w[0], w[1])));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "dog has cough".to_string(),
            "cat has cough and fever".to_string(),
            "dog has rash".to_string(),
        ]
    }

    #[test]
    fn ngrams_include_bigrams() {
        assert_eq!(ngrams("a b c"), vec!["a", "b", "c", "a b", "b c"]);
        assert!(ngrams("").is_empty());
    }

    #[test]
    fn transform_is_unit_length() {
        let v = TfidfVectorizer::fit(&corpus(), 100);
        let row = v.transform("dog has cough");
        let norm: f32 = row.iter().map(|(_, x)| x * x).sum();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!(row.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn rarer_terms_weigh_more() {
        let v = TfidfVectorizer::fit(&corpus(), 100);
        let row = v.transform("has rash");
        let has = sparse_value(&row, v.vocabulary["has"]);
        let rash = sparse_value(&row, v.vocabulary["rash"]);
        assert!(rash > has);
    }

    #[test]
    fn unknown_text_is_empty_row() {
        let v = TfidfVectorizer::fit(&corpus(), 100);
        assert!(v.transform("xyzzy plugh").is_empty());
    }

    #[test]
    fn max_features_keeps_most_frequent() {
        let v = TfidfVectorizer::fit(&corpus(), 2);
        assert_eq!(v.vocabulary_len(), 2);
        assert!(v.vocabulary.contains_key("has"));
        // cough (2) ties with dog (2) and dog has (2); alphabetical wins
        assert!(v.vocabulary.contains_key("cough"));
    }

    #[test]
    fn sparse_value_lookup() {
        let row = vec![(1, 0.5), (4, 0.25)];
        assert_eq!(sparse_value(&row, 4), 0.25);
        assert_eq!(sparse_value(&row, 2), 0.0);
    }
}
