//! crates/virality_core/src/synthesis.rs
//!
//! Expands a single scoring outcome into the presentable six-dimension score
//! plus narrative insights and recommendations.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};

use crate::domain::{Synthesis, Verdict, ViralityScore};

//=========================================================================================
// Derived Dimension Spreads
//=========================================================================================

pub const EMOTIONAL_IMPACT_SPREAD: i16 = 10;
pub const SHAREABILITY_SPREAD: i16 = 10;
pub const TIMING_SPREAD: i16 = 7;
pub const UNIQUENESS_SPREAD: i16 = 12;
pub const ENGAGEMENT_SPREAD: i16 = 10;

/// Narrative lists are cut to a length drawn from this range.
const NARRATIVE_LEN_MIN: usize = 3;
const NARRATIVE_LEN_MAX: usize = 4;

//=========================================================================================
// Narrative Sources
//=========================================================================================

/// Candidate texts for one verdict, before truncation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Maps a verdict to its candidate insights and recommendations.
///
/// The synthesizer only ever sees this trait, so a generated narrative can be
/// swapped in for the fixed scripts without touching the service.
pub trait NarrativeSource: Send + Sync {
    fn narrative(&self, verdict: Verdict) -> Narrative;
}

/// The three fixed four-item scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedNarratives;

const HIGH_INSIGHTS: [&str; 4] = [
    "Strong viral potential detected by ML model",
    "Content shows high engagement probability",
    "Optimal characteristics for social media spread",
    "Language patterns indicate broad audience appeal",
];

const MEDIUM_INSIGHTS: [&str; 4] = [
    "Moderate viral potential identified",
    "Content has decent engagement probability",
    "Some improvements could boost virality",
    "Target audience may be somewhat limited",
];

const LOW_INSIGHTS: [&str; 4] = [
    "Lower viral potential according to ML analysis",
    "Content may need optimization for better reach",
    "Consider revising core messaging",
    "Engagement probability is below average",
];

const HIGH_RECOMMENDATIONS: [&str; 4] = [
    "Post at peak engagement times for maximum impact",
    "Add compelling visuals to boost shareability",
    "Consider using trending hashtags",
    "Engage with early commenters to amplify reach",
];

const MEDIUM_RECOMMENDATIONS: [&str; 4] = [
    "Add a stronger call-to-action",
    "Incorporate emotional triggers or storytelling",
    "Test different headlines or openings",
    "Include relevant trending topics",
];

const LOW_RECOMMENDATIONS: [&str; 4] = [
    "Completely rework the content angle",
    "Focus on more engaging or controversial topics",
    "Add strong emotional hooks in the opening",
    "Consider what's currently trending in your niche",
];

impl NarrativeSource for ScriptedNarratives {
    fn narrative(&self, verdict: Verdict) -> Narrative {
        let (insights, recommendations) = match verdict {
            Verdict::High => (HIGH_INSIGHTS, HIGH_RECOMMENDATIONS),
            Verdict::Medium => (MEDIUM_INSIGHTS, MEDIUM_RECOMMENDATIONS),
            Verdict::Low => (LOW_INSIGHTS, LOW_RECOMMENDATIONS),
        };
        Narrative {
            insights: insights.iter().map(|s| s.to_string()).collect(),
            recommendations: recommendations.iter().map(|s| s.to_string()).collect(),
        }
    }
}

//=========================================================================================
// The Synthesizer
//=========================================================================================

/// Owns the random source and the narrative mapping used for every synthesis.
pub struct Synthesizer {
    rng: Mutex<StdRng>,
    narratives: Arc<dyn NarrativeSource>,
}

impl Synthesizer {
    /// An entropy-seeded synthesizer using the fixed scripts.
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A deterministic synthesizer: the same seed yields the same sequence of results.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            narratives: Arc::new(ScriptedNarratives),
        }
    }

    /// Replaces the narrative mapping.
    pub fn with_narratives(mut self, narratives: Arc<dyn NarrativeSource>) -> Self {
        self.narratives = narratives;
        self
    }

    pub fn synthesize(&self, probability: f64, verdict: Verdict) -> Synthesis {
        // RNG state stays valid across a poisoning panic.
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        synthesize_with(&mut *rng, self.narratives.as_ref(), probability, verdict)
    }
}

/// Synthesis against an explicit random source.
pub fn synthesize_with<R: Rng + ?Sized>(
    rng: &mut R,
    narratives: &dyn NarrativeSource,
    probability: f64,
    verdict: Verdict,
) -> Synthesis {
    let overall = overall_score(probability);
    let score = ViralityScore {
        overall,
        emotional_impact: perturb(rng, overall, EMOTIONAL_IMPACT_SPREAD),
        shareability: perturb(rng, overall, SHAREABILITY_SPREAD),
        timing: perturb(rng, overall, TIMING_SPREAD),
        uniqueness: perturb(rng, overall, UNIQUENESS_SPREAD),
        engagement: perturb(rng, overall, ENGAGEMENT_SPREAD),
    };

    let Narrative {
        mut insights,
        mut recommendations,
    } = narratives.narrative(verdict);
    insights.truncate(rng.gen_range(NARRATIVE_LEN_MIN..=NARRATIVE_LEN_MAX));
    recommendations.truncate(rng.gen_range(NARRATIVE_LEN_MIN..=NARRATIVE_LEN_MAX));

    Synthesis {
        score,
        insights,
        recommendations,
    }
}

/// `round(probability * 100)`, clamped to `[0, 100]`. NaN maps to 0.
pub fn overall_score(probability: f64) -> u8 {
    let scaled = (probability * 100.0).round();
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(0.0, 100.0) as u8
}

fn perturb<R: Rng + ?Sized>(rng: &mut R, overall: u8, spread: i16) -> u8 {
    let offset = rng.gen_range(-spread..=spread);
    (i16::from(overall) + offset).clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn within(value: u8, overall: u8, spread: i16) -> bool {
        let lo = (i16::from(overall) - spread).max(0);
        let hi = (i16::from(overall) + spread).min(100);
        (lo..=hi).contains(&i16::from(value))
    }

    #[test]
    fn overall_is_rounded_percentage() {
        assert_eq!(overall_score(0.0), 0);
        assert_eq!(overall_score(0.82), 82);
        assert_eq!(overall_score(0.826), 83);
        assert_eq!(overall_score(0.004), 0);
        assert_eq!(overall_score(1.0), 100);
        assert_eq!(overall_score(f64::NAN), 0);
    }

    #[test]
    fn derived_dimensions_stay_within_their_bands() {
        let synthesizer = Synthesizer::seeded(7);
        for step in 0..=100 {
            let probability = f64::from(step) / 100.0;
            let synthesis = synthesizer.synthesize(probability, Verdict::Medium);
            let score = synthesis.score;
            assert_eq!(score.overall, overall_score(probability));
            assert!(score.overall <= 100);
            assert!(within(score.emotional_impact, score.overall, EMOTIONAL_IMPACT_SPREAD));
            assert!(within(score.shareability, score.overall, SHAREABILITY_SPREAD));
            assert!(within(score.timing, score.overall, TIMING_SPREAD));
            assert!(within(score.uniqueness, score.overall, UNIQUENESS_SPREAD));
            assert!(within(score.engagement, score.overall, ENGAGEMENT_SPREAD));
        }
    }

    #[test]
    fn narratives_have_three_or_four_items_from_the_matching_script() {
        let synthesizer = Synthesizer::seeded(11);
        for verdict in [Verdict::High, Verdict::Medium, Verdict::Low] {
            let script = ScriptedNarratives.narrative(verdict);
            for _ in 0..50 {
                let synthesis = synthesizer.synthesize(0.5, verdict);
                assert!((3..=4).contains(&synthesis.insights.len()));
                assert!((3..=4).contains(&synthesis.recommendations.len()));
                assert_eq!(
                    synthesis.insights[..],
                    script.insights[..synthesis.insights.len()]
                );
                assert_eq!(
                    synthesis.recommendations[..],
                    script.recommendations[..synthesis.recommendations.len()]
                );
            }
        }
    }

    #[test]
    fn both_narrative_lengths_occur() {
        let synthesizer = Synthesizer::seeded(3);
        let lengths: HashSet<usize> = (0..200)
            .map(|_| synthesizer.synthesize(0.9, Verdict::High).insights.len())
            .collect();
        assert_eq!(lengths, HashSet::from([3, 4]));
    }

    #[test]
    fn same_seed_gives_same_results() {
        let a = Synthesizer::seeded(42);
        let b = Synthesizer::seeded(42);
        for _ in 0..10 {
            assert_eq!(
                a.synthesize(0.61, Verdict::Medium),
                b.synthesize(0.61, Verdict::Medium)
            );
        }
    }

    #[test]
    fn extremes_are_clamped() {
        let synthesizer = Synthesizer::seeded(5);
        for _ in 0..50 {
            let low = synthesizer.synthesize(0.0, Verdict::Low).score;
            assert!(low.uniqueness <= UNIQUENESS_SPREAD as u8);
            let high = synthesizer.synthesize(1.0, Verdict::High).score;
            assert!(high.uniqueness >= 100 - UNIQUENESS_SPREAD as u8);
            assert!(high.engagement <= 100);
        }
    }

    struct ShortNarrative;

    impl NarrativeSource for ShortNarrative {
        fn narrative(&self, _verdict: Verdict) -> Narrative {
            Narrative {
                insights: vec!["only one".to_string()],
                recommendations: Vec::new(),
            }
        }
    }

    #[test]
    fn pluggable_source_replaces_scripts() {
        let synthesizer = Synthesizer::seeded(1).with_narratives(Arc::new(ShortNarrative));
        let synthesis = synthesizer.synthesize(0.3, Verdict::Low);
        assert_eq!(synthesis.insights, vec!["only one".to_string()]);
        assert!(synthesis.recommendations.is_empty());
    }
}
