//! Technology tree: a DAG of research nodes with AND/OR prerequisites.
//!
//! A node becomes startable when all of its AND prerequisites are unlocked
//! and, if it carries OR groups, at least one group is fully satisfied.
//! Tree content is data: games may load their own catalogue, and the engine
//! only relies on the structural rules here. [`TechTree::standard`] provides
//! the built-in catalogue used by the demo game and the tests.

use crate::error::{Result, SimulationError};
use crate::product::Segment;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Effect granted when a tech node completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TechEffect {
    /// Quality bonus, either for one segment or (with `segment: None`) all
    QualityBonus {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        segment: Option<Segment>,
        amount: f64,
    },
    /// Feature points added to newly launched products
    FeatureUnlock { points: f64 },
    /// Fractional unit-cost reduction
    CostReduction { fraction: f64 },
    /// Fractional development speedup
    DevSpeed { fraction: f64 },
    /// Competitive bonus in one segment
    SegmentBonus { segment: Segment, amount: f64 },
    /// Bonus shared by every node of a family already unlocked
    FamilyBonus { family: String, amount: f64 },
}

/// One research node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechNode {
    pub id: String,
    pub name: String,
    /// Tier, 1 = foundational
    pub tier: u32,
    /// Research cost charged when the project starts
    pub cost: f64,
    /// Base rounds to completion
    pub rounds: u32,
    /// All of these must be unlocked (AND)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub and_prereqs: Vec<String>,
    /// At least one group must be fully unlocked (OR over ANDs)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub or_prereq_groups: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<TechEffect>,
    /// Family tag for family bonuses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
}

/// The full tech catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechTree {
    pub nodes: BTreeMap<String, TechNode>,
}

impl TechTree {
    /// Builds a tree from nodes, verifying referential integrity and
    /// acyclicity.
    pub fn new(nodes: Vec<TechNode>) -> Result<Self> {
        let tree =
            TechTree { nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect() };
        tree.validate()?;
        Ok(tree)
    }

    /// Verifies all prerequisite references resolve and the graph is a DAG.
    pub fn validate(&self) -> Result<()> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut indices = HashMap::new();
        for id in self.nodes.keys() {
            indices.insert(id.as_str(), graph.add_node(id.as_str()));
        }
        for node in self.nodes.values() {
            let deps =
                node.and_prereqs.iter().chain(node.or_prereq_groups.iter().flatten());
            for dep in deps {
                let Some(&from) = indices.get(dep.as_str()) else {
                    return Err(SimulationError::ConfigError(format!(
                        "tech node '{}' references unknown prerequisite '{}'",
                        node.id, dep
                    )));
                };
                graph.add_edge(from, indices[node.id.as_str()], ());
            }
        }
        toposort(&graph, None).map_err(|cycle| {
            SimulationError::ConfigError(format!(
                "tech tree contains a cycle through '{}'",
                graph[cycle.node_id()]
            ))
        })?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&TechNode> {
        self.nodes.get(id)
    }

    /// Whether a node's prerequisites are satisfied by an unlocked set.
    pub fn is_startable(&self, id: &str, unlocked: &BTreeSet<String>) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        if !node.and_prereqs.iter().all(|p| unlocked.contains(p)) {
            return false;
        }
        if node.or_prereq_groups.is_empty() {
            return true;
        }
        node.or_prereq_groups
            .iter()
            .any(|group| group.iter().all(|p| unlocked.contains(p)))
    }

    /// The built-in catalogue.
    pub fn standard() -> Self {
        let nodes = vec![
            TechNode {
                id: "materials_science".to_string(),
                name: "Materials Science".to_string(),
                tier: 1,
                cost: 4_000_000.0,
                rounds: 2,
                and_prereqs: vec![],
                or_prereq_groups: vec![],
                effects: vec![TechEffect::QualityBonus { segment: None, amount: 3.0 }],
                family: Some("materials".to_string()),
            },
            TechNode {
                id: "lean_production".to_string(),
                name: "Lean Production".to_string(),
                tier: 1,
                cost: 3_000_000.0,
                rounds: 2,
                and_prereqs: vec![],
                or_prereq_groups: vec![],
                effects: vec![TechEffect::CostReduction { fraction: 0.05 }],
                family: Some("process".to_string()),
            },
            TechNode {
                id: "rapid_prototyping".to_string(),
                name: "Rapid Prototyping".to_string(),
                tier: 1,
                cost: 3_500_000.0,
                rounds: 2,
                and_prereqs: vec![],
                or_prereq_groups: vec![],
                effects: vec![TechEffect::DevSpeed { fraction: 0.10 }],
                family: Some("process".to_string()),
            },
            TechNode {
                id: "composite_shells".to_string(),
                name: "Composite Shells".to_string(),
                tier: 2,
                cost: 8_000_000.0,
                rounds: 3,
                and_prereqs: vec!["materials_science".to_string()],
                or_prereq_groups: vec![],
                effects: vec![
                    TechEffect::QualityBonus {
                        segment: Some(Segment::Enthusiast),
                        amount: 6.0,
                    },
                    TechEffect::QualityBonus {
                        segment: Some(Segment::ActiveLifestyle),
                        amount: 4.0,
                    },
                ],
                family: Some("materials".to_string()),
            },
            TechNode {
                id: "modular_platform".to_string(),
                name: "Modular Platform".to_string(),
                tier: 2,
                cost: 9_000_000.0,
                rounds: 3,
                and_prereqs: vec!["lean_production".to_string()],
                or_prereq_groups: vec![vec!["rapid_prototyping".to_string()]],
                effects: vec![
                    TechEffect::CostReduction { fraction: 0.08 },
                    TechEffect::DevSpeed { fraction: 0.10 },
                ],
                family: Some("process".to_string()),
            },
            TechNode {
                id: "smart_sensors".to_string(),
                name: "Smart Sensors".to_string(),
                tier: 2,
                cost: 10_000_000.0,
                rounds: 3,
                and_prereqs: vec!["materials_science".to_string()],
                or_prereq_groups: vec![],
                effects: vec![TechEffect::FeatureUnlock { points: 8.0 }],
                family: Some("electronics".to_string()),
            },
            TechNode {
                id: "pro_calibration".to_string(),
                name: "Professional Calibration".to_string(),
                tier: 3,
                cost: 16_000_000.0,
                rounds: 4,
                and_prereqs: vec!["composite_shells".to_string()],
                or_prereq_groups: vec![
                    vec!["smart_sensors".to_string()],
                    vec!["modular_platform".to_string(), "rapid_prototyping".to_string()],
                ],
                effects: vec![
                    TechEffect::QualityBonus {
                        segment: Some(Segment::Professional),
                        amount: 10.0,
                    },
                    TechEffect::SegmentBonus { segment: Segment::Professional, amount: 0.05 },
                ],
                family: Some("materials".to_string()),
            },
            TechNode {
                id: "adaptive_manufacturing".to_string(),
                name: "Adaptive Manufacturing".to_string(),
                tier: 3,
                cost: 14_000_000.0,
                rounds: 4,
                and_prereqs: vec!["modular_platform".to_string()],
                or_prereq_groups: vec![],
                effects: vec![
                    TechEffect::CostReduction { fraction: 0.10 },
                    TechEffect::FamilyBonus { family: "process".to_string(), amount: 2.0 },
                ],
                family: Some("process".to_string()),
            },
        ];
        TechTree::new(nodes).expect("standard tech tree is well-formed")
    }

    /// Sum of quality-effect amounts on one node, for spillover computation.
    pub fn quality_effect_total(&self, id: &str) -> f64 {
        self.nodes
            .get(id)
            .map(|node| {
                node.effects
                    .iter()
                    .map(|e| match e {
                        TechEffect::QualityBonus { amount, .. } => *amount,
                        _ => 0.0,
                    })
                    .sum()
            })
            .unwrap_or(0.0)
    }

    /// Segments touched by a node's quality effects (all segments for a
    /// global bonus).
    pub fn quality_segments(&self, id: &str) -> Vec<Segment> {
        let Some(node) = self.nodes.get(id) else {
            return Vec::new();
        };
        let mut segments = BTreeSet::new();
        for effect in &node.effects {
            if let TechEffect::QualityBonus { segment, .. } = effect {
                match segment {
                    Some(s) => {
                        segments.insert(*s);
                    },
                    None => {
                        for s in Segment::all() {
                            segments.insert(s);
                        }
                    },
                }
            }
        }
        segments.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tree_is_valid() {
        let tree = TechTree::standard();
        assert!(tree.validate().is_ok());
        assert!(tree.nodes.len() >= 6);
    }

    #[test]
    fn test_and_prereqs_gate_start() {
        let tree = TechTree::standard();
        let mut unlocked = BTreeSet::new();
        assert!(!tree.is_startable("composite_shells", &unlocked));
        unlocked.insert("materials_science".to_string());
        assert!(tree.is_startable("composite_shells", &unlocked));
    }

    #[test]
    fn test_or_groups_need_one_full_group() {
        let tree = TechTree::standard();
        let mut unlocked = BTreeSet::new();
        unlocked.insert("composite_shells".to_string());
        // AND met, no OR group satisfied.
        assert!(!tree.is_startable("pro_calibration", &unlocked));
        // Partial second group is not enough.
        unlocked.insert("modular_platform".to_string());
        assert!(!tree.is_startable("pro_calibration", &unlocked));
        // Completing the second group opens the node.
        unlocked.insert("rapid_prototyping".to_string());
        assert!(tree.is_startable("pro_calibration", &unlocked));
    }

    #[test]
    fn test_single_node_or_group() {
        let tree = TechTree::standard();
        let mut unlocked = BTreeSet::new();
        unlocked.insert("composite_shells".to_string());
        unlocked.insert("smart_sensors".to_string());
        assert!(tree.is_startable("pro_calibration", &unlocked));
    }

    #[test]
    fn test_unknown_prereq_rejected() {
        let node = TechNode {
            id: "x".to_string(),
            name: "X".to_string(),
            tier: 1,
            cost: 1.0,
            rounds: 1,
            and_prereqs: vec!["missing".to_string()],
            or_prereq_groups: vec![],
            effects: vec![],
            family: None,
        };
        assert!(TechTree::new(vec![node]).is_err());
    }

    #[test]
    fn test_cycle_rejected() {
        let a = TechNode {
            id: "a".to_string(),
            name: "A".to_string(),
            tier: 1,
            cost: 1.0,
            rounds: 1,
            and_prereqs: vec!["b".to_string()],
            or_prereq_groups: vec![],
            effects: vec![],
            family: None,
        };
        let b = TechNode {
            id: "b".to_string(),
            name: "B".to_string(),
            tier: 1,
            cost: 1.0,
            rounds: 1,
            and_prereqs: vec!["a".to_string()],
            or_prereq_groups: vec![],
            effects: vec![],
            family: None,
        };
        assert!(TechTree::new(vec![a, b]).is_err());
    }

    #[test]
    fn test_quality_effect_total() {
        let tree = TechTree::standard();
        assert_eq!(tree.quality_effect_total("composite_shells"), 10.0);
        assert_eq!(tree.quality_effect_total("lean_production"), 0.0);
    }
}
