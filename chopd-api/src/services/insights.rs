//! Premium insight content attached to detailed-suggestion tiers

use serde::Serialize;

/// Extra guidance returned only to tiers with the detailedSuggestions
/// feature enabled
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumInsights {
    pub product_recommendations: Vec<String>,
    pub style_trends: Vec<String>,
    pub improvement_timeline: String,
    pub professional_tips: Vec<String>,
}

/// Build the premium insight block
///
/// Static content for now; a real deployment would derive these from the
/// analysis itself.
pub fn premium_insights() -> PremiumInsights {
    PremiumInsights {
        product_recommendations: vec![
            "Consider a high-quality facial cleanser for better skin health".to_string(),
            "Invest in a good hair styling product for better hold".to_string(),
            "Try a vitamin C serum for brighter skin".to_string(),
        ],
        style_trends: vec![
            "Current trends favor natural, well-groomed looks".to_string(),
            "Minimalist styling is very popular this season".to_string(),
            "Sustainable fashion choices are gaining popularity".to_string(),
        ],
        improvement_timeline:
            "You can see significant improvements within 2-3 weeks of consistent routine"
                .to_string(),
        professional_tips: vec![
            "Schedule regular grooming appointments".to_string(),
            "Invest in quality basics over trendy pieces".to_string(),
            "Consider consulting with a personal stylist".to_string(),
        ],
    }
}
