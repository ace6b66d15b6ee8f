//! Sample catalog used by `mlp seed` and the tests.

use anyhow::Result;
use mlp_reviews_core::models::NewReview;
use mlp_reviews_core::store::ReviewStore;

const TRANSFORMERS_CONTENT: &str = r#"# Executive Summary

This review examines the latest developments in transformer architecture for natural language processing, focusing on computational efficiency improvements and performance optimizations introduced in recent research papers.

## Key Findings

- **Efficiency Improvements:** New attention mechanisms reduce computational complexity by 35% while maintaining performance.
- **Scalability:** Novel architectural modifications enable training on longer sequences without proportional memory increases.
- **Performance Benchmarks:** Consistent improvements across GLUE, SuperGLUE, and domain-specific evaluation metrics.

## Technical Analysis

Recent work has focused on addressing the quadratic complexity of self-attention mechanisms, particularly for long sequence processing.

## Future Directions

Promising avenues include hybrid architectures that combine different attention mechanisms and task-specific optimizations."#;

const QUANTUM_CONTENT: &str = r#"# Executive Summary

This review analyzes the intersection of quantum computing and cryptography, examining the threats posed to current cryptographic systems and the solutions designed to maintain security in a post-quantum world.

## Current Cryptographic Vulnerabilities

- **RSA Encryption:** Shor's algorithm factors large integers exponentially faster than classical computers.
- **Elliptic Curve Cryptography:** Also vulnerable to Shor's algorithm.
- **Symmetric Ciphers:** Less vulnerable but still affected by Grover's algorithm.

## Post-Quantum Solutions

Lattice-based, code-based and multivariate schemes are the leading candidates, with lattice-based cryptography currently the most mature.

## Conclusion

Organizations must begin planning their post-quantum transition now."#;

const ENERGY_CONTENT: &str = r#"# Executive Summary

This review examines sustainable energy storage systems from a materials science perspective, focusing on materials that promise better batteries with a smaller environmental footprint.

## Advanced Battery Materials

- **Solid-State Electrolytes:** garnet ceramics, sulfides and polymers.
- **Cathode Materials:** lithium-rich layered oxides, sodium-ion alternatives, organic electrodes.

## Environmental Considerations

Life cycle assessment covers raw material extraction, manufacturing energy, end-of-life recycling and carbon footprint.

## Future Outlook

Room-temperature solid-state batteries are expected by 2027."#;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The three sample reviews, oldest first.
pub fn sample_reviews() -> Vec<NewReview> {
    vec![
        NewReview {
            nid: "1".to_string(),
            slug: "transformer-architecture-improvements-nlp".to_string(),
            title: "Transformer Architecture Improvements for Natural Language Processing"
                .to_string(),
            review_summary: "Comprehensive analysis of recent improvements to transformer models, focusing on efficiency gains and performance benchmarks.".to_string(),
            content: TRANSFORMERS_CONTENT.to_string(),
            authors: strings(&["Smith, J.", "Johnson, M.", "Chen, L."]),
            doi: "10.1000/182".to_string(),
            domain: "Machine Learning".to_string(),
            tags: strings(&["NLP", "Transformers", "Deep Learning"]),
            version: "1.2".to_string(),
            word_count: 2847,
            estimated_reading_time: 12,
            review_author: None,
            impact_metrics: None,
            reuse_license: None,
            source_attribution: None,
            published: true,
        },
        NewReview {
            nid: "2".to_string(),
            slug: "quantum-computing-cryptography-applications".to_string(),
            title: "Quantum Computing Applications in Cryptography".to_string(),
            review_summary: "Analysis of quantum computing threats to current cryptographic systems and emerging post-quantum solutions.".to_string(),
            content: QUANTUM_CONTENT.to_string(),
            authors: strings(&["Williams, R.", "Davis, K."]),
            doi: "10.1000/183".to_string(),
            domain: "Quantum Computing".to_string(),
            tags: strings(&["Cryptography", "Quantum", "Security"]),
            version: "1.0".to_string(),
            word_count: 3421,
            estimated_reading_time: 15,
            review_author: None,
            impact_metrics: None,
            reuse_license: None,
            source_attribution: None,
            published: true,
        },
        NewReview {
            nid: "3".to_string(),
            slug: "sustainable-energy-storage-materials-science".to_string(),
            title: "Sustainable Energy Storage Systems: A Materials Science Perspective"
                .to_string(),
            review_summary: "Review of advanced materials for next-generation battery technologies and their environmental impact.".to_string(),
            content: ENERGY_CONTENT.to_string(),
            authors: strings(&["Thompson, A.", "Martinez, C.", "Lee, S."]),
            doi: "10.1000/184".to_string(),
            domain: "Materials Science".to_string(),
            tags: strings(&["Energy Storage", "Sustainability", "Materials"]),
            version: "1.1".to_string(),
            word_count: 4156,
            estimated_reading_time: 18,
            review_author: None,
            impact_metrics: None,
            reuse_license: None,
            source_attribution: None,
            published: true,
        },
    ]
}

/// Insert the sample reviews into an empty store. Returns how many were added.
pub async fn seed_reviews<S: ReviewStore + ?Sized>(store: &S) -> Result<usize> {
    if !store.list_published().await?.is_empty() {
        tracing::info!("store already has reviews, skipping seed");
        return Ok(0);
    }

    let mut inserted = 0;
    for review in sample_reviews() {
        store.create_review(review).await?;
        inserted += 1;
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlp_reviews_core::store::memory::InMemoryStore;

    #[tokio::test]
    async fn test_seed_once() {
        let store = InMemoryStore::new();
        assert_eq!(seed_reviews(&store).await.unwrap(), 3);
        assert_eq!(seed_reviews(&store).await.unwrap(), 0);
        assert_eq!(store.list_published().await.unwrap().len(), 3);
    }

    #[test]
    fn test_samples_are_valid() {
        for review in sample_reviews() {
            assert!(review.validate().is_ok());
        }
    }
}
