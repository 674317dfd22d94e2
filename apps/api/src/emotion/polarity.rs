//! Polarity scorer for plain (non-Marathi) text, backed by VADER.
//!
//! `vader_sentiment` carries the full VADER lexicon and its rules (boosters,
//! negation, caps emphasis, contrastive "but", exclamation and question
//! emphasis, emoji). Only the compound score is used here.
//!
//! Pass the original text, not a lowercased copy: caps emphasis depends on case.

use vader_sentiment::SentimentIntensityAnalyzer;

/// Compound polarity of `text`, bounded to [-1, 1]. Empty or unknown text scores 0.
pub fn compound_score(text: &str) -> f32 {
    if text.trim().is_empty() {
        return 0.0;
    }
    let analyzer = SentimentIntensityAnalyzer::new();
    let compound = analyzer
        .polarity_scores(text)
        .get("compound")
        .copied()
        .unwrap_or(0.0);
    (compound as f32).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_scores_zero() {
        assert_eq!(compound_score(""), 0.0);
        assert_eq!(compound_score("   "), 0.0);
    }

    #[test]
    fn test_unknown_words_score_zero() {
        assert_eq!(compound_score("the table is wooden"), 0.0);
    }

    #[test]
    fn test_strong_positive_word() {
        let score = compound_score("i love this");
        assert!(score >= 0.5, "got {score}");
    }

    #[test]
    fn test_mild_positive_word() {
        let score = compound_score("this is good");
        assert!(score > 0.05 && score < 0.5, "got {score}");
    }

    #[test]
    fn test_strong_negative_words() {
        let score = compound_score("this is horrible and i hate it");
        assert!(score <= -0.5, "got {score}");
    }

    #[test]
    fn test_everyday_sentiment_is_scored() {
        for text in [
            "this sucks",
            "i am so frustrated",
            "what a disaster",
        ] {
            let score = compound_score(text);
            assert!(score <= -0.05, "{text:?} got {score}");
        }
        for text in ["that was hilarious", "i am thrilled"] {
            let score = compound_score(text);
            assert!(score >= 0.05, "{text:?} got {score}");
        }
    }

    #[test]
    fn test_negation_flips_sign() {
        let plain = compound_score("this is good");
        let negated = compound_score("this is not good");
        assert!(negated < 0.0, "got {negated}");
        assert!(negated.abs() < plain.abs());
    }

    #[test]
    fn test_booster_increases_magnitude() {
        assert!(compound_score("this is very good") > compound_score("this is good"));
        assert!(compound_score("this is slightly good") < compound_score("this is good"));
    }

    #[test]
    fn test_exclamations_increase_magnitude() {
        assert!(compound_score("this is good!!!") > compound_score("this is good"));
        assert!(compound_score("this is bad!!!") < compound_score("this is bad"));
    }

    #[test]
    fn test_caps_emphasis_only_in_mixed_case() {
        assert!(compound_score("this is GOOD") > compound_score("this is good"));
        assert_eq!(compound_score("THIS IS GOOD"), compound_score("this is good"));
    }

    #[test]
    fn test_but_shifts_weight_to_second_clause() {
        let score = compound_score("the food was good but the service was terrible");
        assert!(score < 0.0, "got {score}");
    }

    #[test]
    fn test_score_is_bounded() {
        let score = compound_score("best best best best best love love love love !!!!");
        assert!(score <= 1.0 && score > 0.9, "got {score}");
        let score = compound_score("worst worst worst hate hate hate");
        assert!(score >= -1.0 && score < -0.9, "got {score}");
    }
}
