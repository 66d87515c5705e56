//! Offline concept generator.
//!
//! Synthesizes a concept from the budget tier alone, after an artificial delay, so the page can be
//! exercised without credentials or network access. Output is a pure function of the brief.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{BudgetTier, ConceptBrief, ConceptGenerator};
use crate::config::GenerationMode;
use crate::errors::Result;

const LOW_FACTOR: f64 = 0.85;
const HIGH_FACTOR: f64 = 1.15;

pub struct DemoGenerator {
    delay: Duration,
}

impl DemoGenerator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DemoConcept {
    budget_tier: BudgetTier,
    recommended_focus: Vec<&'static str>,
    sample_zones: Vec<&'static str>,
    rough_cost_buckets: CostRange,
}

#[derive(Debug, Serialize)]
struct CostRange {
    demo_range_low: i64,
    demo_range_high: i64,
}

fn recommended_focus(tier: BudgetTier) -> Vec<&'static str> {
    match tier {
        BudgetTier::Starter => vec![
            "Sheet-mulch turf into planting beds",
            "Seed a native pollinator strip",
            "Convert spray heads to drip",
        ],
        BudgetTier::Mid => vec![
            "Replace thirsty turf with buffalo grass and native beds",
            "Add a dry-laid flagstone patio",
            "Install smart drip irrigation with a weather-based controller",
            "Plant two shade trees on the west exposure",
        ],
        BudgetTier::Premium => vec![
            "Regrade for rain gardens and a dry creek bed",
            "Build a stone patio with a pergola",
            "Install zoned drip irrigation with rain sensors",
            "Add an edible garden with raised steel beds",
            "Layer native trees, shrubs and groundcovers for four-season interest",
        ],
    }
}

fn sample_zones(tier: BudgetTier) -> Vec<&'static str> {
    match tier {
        BudgetTier::Starter => vec!["Front pollinator bed", "Mulched path"],
        BudgetTier::Mid => vec!["Front xeric garden", "Back patio", "Shade corner"],
        BudgetTier::Premium => vec![
            "Entry garden",
            "Rain garden swale",
            "Outdoor living patio",
            "Kitchen garden",
        ],
    }
}

fn cost_range(budget: f64) -> CostRange {
    CostRange {
        demo_range_low: (budget * LOW_FACTOR).round() as i64,
        demo_range_high: (budget * HIGH_FACTOR).round() as i64,
    }
}

/// The demo concept for a brief, without the delay
pub fn demo_concept(brief: &ConceptBrief) -> Result<Value> {
    let concept = DemoConcept {
        budget_tier: brief.tier,
        recommended_focus: recommended_focus(brief.tier),
        sample_zones: sample_zones(brief.tier),
        rough_cost_buckets: cost_range(brief.budget),
    };
    Ok(serde_json::to_value(concept).map_err(anyhow::Error::from)?)
}

#[async_trait]
impl ConceptGenerator for DemoGenerator {
    fn mode(&self) -> GenerationMode {
        GenerationMode::Demo
    }

    #[instrument(skip(self, brief), fields(tier = %brief.tier))]
    async fn generate(&self, brief: &ConceptBrief) -> Result<Value> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        debug!(delay_ms = self.delay.as_millis() as u64, "Demo concept synthesized");
        demo_concept(brief)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn brief(budget: f64) -> ConceptBrief {
        ConceptBrief {
            address: "123 Main St".to_string(),
            budget,
            tier: BudgetTier::from_budget(budget),
            notes: "xeriscape".to_string(),
            photo_data_url: None,
        }
    }

    #[test]
    fn test_demo_concept_shape() {
        let concept = demo_concept(&brief(15000.0)).unwrap();

        assert_eq!(concept["budgetTier"], "mid");
        assert_eq!(concept["recommendedFocus"].as_array().unwrap().len(), 4);
        assert_eq!(concept["sampleZones"].as_array().unwrap().len(), 3);
        assert_eq!(
            concept["roughCostBuckets"],
            json!({ "demo_range_low": 12750, "demo_range_high": 17250 })
        );
    }

    #[test]
    fn test_cost_range_brackets_budget() {
        for budget in [0.0, 1000.0, 7999.0, 8000.0, 12345.0, 25000.0, 75000.0] {
            let range = cost_range(budget);
            assert!(range.demo_range_low as f64 <= budget, "low for {budget}");
            assert!(budget <= range.demo_range_high as f64, "high for {budget}");
        }
    }

    #[test]
    fn test_tier_drives_content() {
        let starter = demo_concept(&brief(2000.0)).unwrap();
        let premium = demo_concept(&brief(40000.0)).unwrap();

        assert_eq!(starter["budgetTier"], "starter");
        assert_eq!(premium["budgetTier"], "premium");
        assert_ne!(starter["sampleZones"], premium["sampleZones"]);
    }

    #[tokio::test]
    async fn test_generate_is_deterministic() {
        let generator = DemoGenerator::new(Duration::ZERO);

        let first = generator.generate(&brief(15000.0)).await.unwrap();
        let second = generator.generate(&brief(15000.0)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_generate_waits_for_configured_delay() {
        let generator = DemoGenerator::new(Duration::from_millis(50));
        let started = tokio::time::Instant::now();

        generator.generate(&brief(15000.0)).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
