//! Local engagement heuristics for a generated post.

use serde::Serialize;

/// Words per engagement point.
const WORDS_PER_POINT: f64 = 30.0;
const MIN_WORDS: usize = 50;
const MAX_WORDS: usize = 500;

/// Hashtags suggested when the post has none.
const DEFAULT_HASHTAGS: &[&str] = &["#linkedin", "#professional", "#business"];

/// Heuristic scoring of a post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementAnalysis {
    /// 0 to 100.
    pub engagement_score: f64,
    pub suggested_improvements: Vec<String>,
    pub hashtag_suggestions: Vec<String>,
}

/// Score a post. Pure; never fails.
#[must_use]
pub fn analyze(post: &str, max_hashtags: usize) -> EngagementAnalysis {
    let words: Vec<&str> = post.split_whitespace().collect();
    let word_count = words.len();

    let engagement_score = (word_count as f64 / WORDS_PER_POINT).clamp(0.0, 100.0);

    let mut suggested_improvements = Vec::new();
    if word_count < MIN_WORDS {
        suggested_improvements.push("Consider adding more content for better engagement".to_string());
    } else if word_count > MAX_WORDS {
        suggested_improvements.push("Post might be too long for optimal engagement".to_string());
    }

    let mut hashtags: Vec<String> = Vec::new();
    for word in words.iter().filter(|w| w.starts_with('#') && w.len() > 1) {
        if !hashtags.iter().any(|h| h.eq_ignore_ascii_case(word)) {
            hashtags.push((*word).to_string());
        }
    }

    if !post.contains('#') {
        suggested_improvements.push("Consider adding relevant hashtags".to_string());
    } else if hashtags.len() > max_hashtags {
        suggested_improvements.push(format!(
            "Consider trimming to at most {max_hashtags} hashtags"
        ));
    }

    let hashtag_suggestions = if hashtags.is_empty() {
        DEFAULT_HASHTAGS.iter().map(|h| (*h).to_string()).collect()
    } else {
        hashtags
    };

    EngagementAnalysis {
        engagement_score,
        suggested_improvements,
        hashtag_suggestions,
    }
}
