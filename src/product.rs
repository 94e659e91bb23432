//! Product definitions and consumer segments.
//!
//! Products are the unit of competition: each launched product contends in
//! exactly one consumer segment and is scored against every other team's
//! products in that segment during market resolution.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{EnumIter, EnumString};

/// Consumer segments with their own demand curves and scoring weights.
///
/// This is a closed, wire-exact enumeration: serialized names must match the
/// snapshot contract (`"Active Lifestyle"`, not `"ActiveLifestyle"`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
)]
pub enum Segment {
    Budget,
    General,
    Enthusiast,
    Professional,
    #[serde(rename = "Active Lifestyle")]
    #[strum(serialize = "Active Lifestyle")]
    ActiveLifestyle,
}

impl Segment {
    /// All segments in stable (wire) order.
    pub fn all() -> Vec<Segment> {
        vec![
            Segment::Budget,
            Segment::General,
            Segment::Enthusiast,
            Segment::Professional,
            Segment::ActiveLifestyle,
        ]
    }

    /// Wire-exact name of this segment.
    pub fn as_str(&self) -> &str {
        match self {
            Segment::Budget => "Budget",
            Segment::General => "General",
            Segment::Enthusiast => "Enthusiast",
            Segment::Professional => "Professional",
            Segment::ActiveLifestyle => "Active Lifestyle",
        }
    }

    /// Segments considered adjacent for research spillover purposes.
    ///
    /// Adjacency follows the price ladder: Budget ↔ General ↔ Enthusiast ↔
    /// Professional, with Active Lifestyle adjacent to General and Enthusiast.
    pub fn adjacent(&self) -> Vec<Segment> {
        match self {
            Segment::Budget => vec![Segment::General],
            Segment::General => {
                vec![Segment::Budget, Segment::Enthusiast, Segment::ActiveLifestyle]
            },
            Segment::Enthusiast => {
                vec![Segment::General, Segment::Professional, Segment::ActiveLifestyle]
            },
            Segment::Professional => vec![Segment::Enthusiast],
            Segment::ActiveLifestyle => vec![Segment::General, Segment::Enthusiast],
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DevelopmentStatus {
    Planning,
    Developing,
    Launched,
    Cancelled,
}

/// A product a team develops and sells into one segment.
///
/// Quality, features and reliability all live on a 0–100 scale; development
/// progress runs 0–100 and the product only contends in the market once its
/// status is [`DevelopmentStatus::Launched`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Stable product id, unique within the owning team
    pub id: String,
    /// Display name
    pub name: String,
    /// Segment this product contends in
    pub segment: Segment,
    /// List price, >= 0
    pub price: f64,
    /// Product quality, 0-100
    pub quality: f64,
    /// Feature score, 0-100
    pub features: f64,
    /// Reliability score, 0-100
    pub reliability: f64,
    /// Development progress, 0-100
    pub development_progress: f64,
    /// Quality target the development run aims for
    pub target_quality: f64,
    /// Per-unit manufacturing cost
    pub unit_cost: f64,
    /// Lifecycle status
    pub status: DevelopmentStatus,
}

impl Product {
    /// Creates a product in the planning stage.
    pub fn new(id: &str, name: &str, segment: Segment, target_quality: f64, price: f64) -> Self {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            segment,
            price: price.max(0.0),
            quality: 0.0,
            features: 0.0,
            reliability: 50.0,
            development_progress: 0.0,
            target_quality: target_quality.clamp(0.0, 100.0),
            unit_cost: 0.0,
            status: DevelopmentStatus::Planning,
        }
    }

    /// Whether this product takes part in market resolution.
    pub fn is_contending(&self) -> bool {
        self.status == DevelopmentStatus::Launched
    }

    /// Clamps all bounded fields into their documented ranges.
    pub fn clamp_ranges(&mut self) {
        self.price = self.price.max(0.0);
        self.quality = self.quality.clamp(0.0, 100.0);
        self.features = self.features.clamp(0.0, 100.0);
        self.reliability = self.reliability.clamp(0.0, 100.0);
        self.development_progress = self.development_progress.clamp(0.0, 100.0);
        self.unit_cost = self.unit_cost.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_segment_wire_names() {
        assert_eq!(Segment::ActiveLifestyle.as_str(), "Active Lifestyle");
        let json = serde_json::to_string(&Segment::ActiveLifestyle).unwrap();
        assert_eq!(json, "\"Active Lifestyle\"");
        let parsed: Segment = serde_json::from_str("\"Active Lifestyle\"").unwrap();
        assert_eq!(parsed, Segment::ActiveLifestyle);
    }

    #[test]
    fn test_segment_from_str() {
        assert_eq!(Segment::from_str("Budget").unwrap(), Segment::Budget);
        assert_eq!(Segment::from_str("Active Lifestyle").unwrap(), Segment::ActiveLifestyle);
        assert!(Segment::from_str("Luxury").is_err());
    }

    #[test]
    fn test_segment_adjacency_is_symmetric() {
        for seg in Segment::all() {
            for adj in seg.adjacent() {
                assert!(
                    adj.adjacent().contains(&seg),
                    "adjacency between {} and {} is not symmetric",
                    seg,
                    adj
                );
            }
        }
    }

    #[test]
    fn test_development_status_wire_names() {
        let json = serde_json::to_string(&DevelopmentStatus::Developing).unwrap();
        assert_eq!(json, "\"developing\"");
    }

    #[test]
    fn test_product_clamping() {
        let mut product = Product::new("p1", "Alpha", Segment::Budget, 120.0, -10.0);
        assert_eq!(product.price, 0.0);
        assert_eq!(product.target_quality, 100.0);

        product.quality = 140.0;
        product.development_progress = -5.0;
        product.clamp_ranges();
        assert_eq!(product.quality, 100.0);
        assert_eq!(product.development_progress, 0.0);
    }

    #[test]
    fn test_only_launched_products_contend() {
        let mut product = Product::new("p1", "Alpha", Segment::General, 60.0, 250.0);
        assert!(!product.is_contending());
        product.status = DevelopmentStatus::Launched;
        assert!(product.is_contending());
    }
}
