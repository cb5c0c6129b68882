//! Road-network description and derived control topology.
//!
//! The roadnet file is externally supplied static configuration. It is parsed
//! once at environment construction into [`Roadnet`], then distilled into a
//! [`NetworkTopology`]: the ordered set of controllable intersections, their
//! phase counts, and the stable lane ordering that defines the positional
//! action and observation mappings. Topology never changes at runtime.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Deserialize;

use crate::error::{EnvError, Result};
use crate::{IntersectionId, LaneId, RoadId};

/// One selectable traffic-signal configuration of an intersection.
#[derive(Debug, Clone, Deserialize)]
pub struct LightPhase {
    /// Nominal phase duration in seconds (unused by the adapter; phases are
    /// switched by the agent, not by a timer).
    #[serde(default)]
    pub time: f64,
    /// Road links allowed to move during this phase.
    #[serde(default, rename = "availableRoadLinks")]
    pub available_road_links: Vec<usize>,
}

/// Signal definition of an intersection.
#[derive(Debug, Clone, Deserialize)]
pub struct TrafficLight {
    #[serde(rename = "lightphases")]
    pub light_phases: Vec<LightPhase>,
}

/// A network node. Virtual intersections are peripheral boundary points and
/// carry no controllable signal.
#[derive(Debug, Clone, Deserialize)]
pub struct Intersection {
    pub id: IntersectionId,
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    #[serde(default)]
    pub roads: Vec<RoadId>,
    #[serde(rename = "trafficLight")]
    pub traffic_light: Option<TrafficLight>,
}

/// Geometric lane attributes. Only the lane's existence and position matter
/// to the adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct Lane {
    #[serde(default)]
    pub width: f64,
    #[serde(default, rename = "maxSpeed")]
    pub max_speed: f64,
}

/// A directed road between two intersections with an ordered list of lanes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Road {
    pub id: RoadId,
    pub start_intersection: IntersectionId,
    pub end_intersection: IntersectionId,
    pub lanes: Vec<Lane>,
}

/// Parsed road-network description.
#[derive(Debug, Clone, Deserialize)]
pub struct Roadnet {
    pub intersections: Vec<Intersection>,
    pub roads: Vec<Road>,
}

impl Roadnet {
    /// Parses a roadnet from its JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a roadnet file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

/// Fully-qualified lane identity: `"{road_id}_{lane_index}"`.
pub fn lane_id(road: &RoadId, index: usize) -> LaneId {
    format!("{}_{}", road, index)
}

/// Control topology derived once from a [`Roadnet`].
///
/// Field invariants, fixed for the life of an environment instance:
/// - `controllable` preserves the source iteration order; position `i` in an
///   action vector addresses `controllable[i]`.
/// - `phase_counts[i]` is the number of selectable phases of `controllable[i]`.
/// - `lane_order` enumerates every lane, roads in source order, lane indices
///   ascending within each road. Flat observations follow this order.
/// - `incoming_lanes[i]` lists the lanes of roads ending at `controllable[i]`,
///   used by the keyed observation encoding.
#[derive(Debug, Clone)]
pub struct NetworkTopology {
    pub controllable: Vec<IntersectionId>,
    pub phase_counts: Vec<usize>,
    pub lane_order: Vec<LaneId>,
    pub lanes_by_road: HashMap<RoadId, Vec<LaneId>>,
    pub incoming_lanes: Vec<Vec<LaneId>>,
}

impl NetworkTopology {
    /// Derives the control topology, validating the description.
    ///
    /// # Errors
    ///
    /// `EnvError::Configuration` when a non-virtual intersection has no
    /// traffic-light phases, a road references an unknown intersection, no
    /// intersection is controllable, or the network has no lanes.
    pub fn from_roadnet(roadnet: &Roadnet) -> Result<Self> {
        let mut graph: DiGraph<IntersectionId, RoadId> = DiGraph::new();
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();
        for intersection in &roadnet.intersections {
            let idx = graph.add_node(intersection.id.clone());
            nodes.insert(intersection.id.as_str(), idx);
        }

        let mut lanes_by_road = HashMap::new();
        let mut lane_order = Vec::new();
        for road in &roadnet.roads {
            let start = *nodes.get(road.start_intersection.as_str()).ok_or_else(|| {
                EnvError::Configuration(format!(
                    "road '{}' starts at unknown intersection '{}'",
                    road.id, road.start_intersection
                ))
            })?;
            let end = *nodes.get(road.end_intersection.as_str()).ok_or_else(|| {
                EnvError::Configuration(format!(
                    "road '{}' ends at unknown intersection '{}'",
                    road.id, road.end_intersection
                ))
            })?;
            graph.add_edge(start, end, road.id.clone());

            let lanes: Vec<LaneId> = (0..road.lanes.len())
                .map(|i| lane_id(&road.id, i))
                .collect();
            lane_order.extend(lanes.iter().cloned());
            lanes_by_road.insert(road.id.clone(), lanes);
        }

        if lane_order.is_empty() {
            return Err(EnvError::Configuration(
                "road network declares no lanes".to_string(),
            ));
        }

        let mut controllable = Vec::new();
        let mut phase_counts = Vec::new();
        let mut incoming_lanes = Vec::new();
        for intersection in &roadnet.intersections {
            if intersection.is_virtual {
                continue;
            }
            let phases = intersection
                .traffic_light
                .as_ref()
                .map(|tl| tl.light_phases.len())
                .unwrap_or(0);
            if phases == 0 {
                return Err(EnvError::Configuration(format!(
                    "non-virtual intersection '{}' has no light phases",
                    intersection.id
                )));
            }

            // Incoming roads, in the source road order the edges were added in.
            let node = nodes[intersection.id.as_str()];
            let mut incoming: Vec<LaneId> = Vec::new();
            let mut edges: Vec<_> = graph
                .edges_directed(node, Direction::Incoming)
                .map(|e| e.weight().clone())
                .collect();
            edges.sort_by_key(|road| {
                roadnet
                    .roads
                    .iter()
                    .position(|r| &r.id == road)
                    .unwrap_or(usize::MAX)
            });
            for road in &edges {
                incoming.extend(lanes_by_road[road].iter().cloned());
            }

            controllable.push(intersection.id.clone());
            phase_counts.push(phases);
            incoming_lanes.push(incoming);
        }

        if controllable.is_empty() {
            return Err(EnvError::Configuration(
                "road network has no controllable intersections".to_string(),
            ));
        }

        Ok(Self {
            controllable,
            phase_counts,
            lane_order,
            lanes_by_road,
            incoming_lanes,
        })
    }

    /// Number of controllable intersections (action vector arity).
    pub fn n_controllable(&self) -> usize {
        self.controllable.len()
    }

    /// Total lane count across all roads.
    pub fn total_lanes(&self) -> usize {
        self.lane_order.len()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// A 1x1 grid: one controllable intersection `mid` with four incident
    /// virtual boundary intersections, four incoming and four outgoing roads,
    /// two lanes each.
    pub const SAMPLE_ROADNET: &str = r#"{
        "intersections": [
            {"id": "north", "virtual": true, "roads": ["road_n_in", "road_n_out"]},
            {"id": "south", "virtual": true, "roads": ["road_s_in", "road_s_out"]},
            {"id": "east", "virtual": true, "roads": ["road_e_in", "road_e_out"]},
            {"id": "west", "virtual": true, "roads": ["road_w_in", "road_w_out"]},
            {"id": "mid", "virtual": false,
             "roads": ["road_n_in", "road_s_in", "road_e_in", "road_w_in",
                       "road_n_out", "road_s_out", "road_e_out", "road_w_out"],
             "trafficLight": {"lightphases": [
                {"time": 30, "availableRoadLinks": [0, 1]},
                {"time": 30, "availableRoadLinks": [2, 3]},
                {"time": 30, "availableRoadLinks": [4, 5]},
                {"time": 30, "availableRoadLinks": [6, 7]}
             ]}}
        ],
        "roads": [
            {"id": "road_n_in", "startIntersection": "north", "endIntersection": "mid",
             "lanes": [{"width": 3.5, "maxSpeed": 11.11}, {"width": 3.5, "maxSpeed": 11.11}]},
            {"id": "road_s_in", "startIntersection": "south", "endIntersection": "mid",
             "lanes": [{"width": 3.5, "maxSpeed": 11.11}, {"width": 3.5, "maxSpeed": 11.11}]},
            {"id": "road_e_in", "startIntersection": "east", "endIntersection": "mid",
             "lanes": [{"width": 3.5, "maxSpeed": 11.11}, {"width": 3.5, "maxSpeed": 11.11}]},
            {"id": "road_w_in", "startIntersection": "west", "endIntersection": "mid",
             "lanes": [{"width": 3.5, "maxSpeed": 11.11}, {"width": 3.5, "maxSpeed": 11.11}]},
            {"id": "road_n_out", "startIntersection": "mid", "endIntersection": "north",
             "lanes": [{"width": 3.5, "maxSpeed": 11.11}, {"width": 3.5, "maxSpeed": 11.11}]},
            {"id": "road_s_out", "startIntersection": "mid", "endIntersection": "south",
             "lanes": [{"width": 3.5, "maxSpeed": 11.11}, {"width": 3.5, "maxSpeed": 11.11}]},
            {"id": "road_e_out", "startIntersection": "mid", "endIntersection": "east",
             "lanes": [{"width": 3.5, "maxSpeed": 11.11}, {"width": 3.5, "maxSpeed": 11.11}]},
            {"id": "road_w_out", "startIntersection": "mid", "endIntersection": "west",
             "lanes": [{"width": 3.5, "maxSpeed": 11.11}, {"width": 3.5, "maxSpeed": 11.11}]}
        ]
    }"#;

    /// Two controllable intersections `a` (3 phases) and `b` (2 phases),
    /// matching the concrete scenario used by the step-controller tests.
    pub const TWO_INTERSECTION_ROADNET: &str = r#"{
        "intersections": [
            {"id": "west", "virtual": true, "roads": ["r_in_a"]},
            {"id": "a", "virtual": false, "roads": ["r_in_a", "r_a_b"],
             "trafficLight": {"lightphases": [
                {"time": 30, "availableRoadLinks": [0]},
                {"time": 30, "availableRoadLinks": [1]},
                {"time": 30, "availableRoadLinks": [2]}
             ]}},
            {"id": "b", "virtual": false, "roads": ["r_a_b", "r_out_b"],
             "trafficLight": {"lightphases": [
                {"time": 30, "availableRoadLinks": [0]},
                {"time": 30, "availableRoadLinks": [1]}
             ]}},
            {"id": "east", "virtual": true, "roads": ["r_out_b"]}
        ],
        "roads": [
            {"id": "r_in_a", "startIntersection": "west", "endIntersection": "a",
             "lanes": [{"width": 3.5, "maxSpeed": 11.11}, {"width": 3.5, "maxSpeed": 11.11}]},
            {"id": "r_a_b", "startIntersection": "a", "endIntersection": "b",
             "lanes": [{"width": 3.5, "maxSpeed": 11.11}, {"width": 3.5, "maxSpeed": 11.11}]},
            {"id": "r_out_b", "startIntersection": "b", "endIntersection": "east",
             "lanes": [{"width": 3.5, "maxSpeed": 11.11}]}
        ]
    }"#;

    pub fn sample_topology() -> NetworkTopology {
        let roadnet = Roadnet::from_json(SAMPLE_ROADNET).expect("sample parses");
        NetworkTopology::from_roadnet(&roadnet).expect("sample topology builds")
    }

    pub fn two_intersection_topology() -> NetworkTopology {
        let roadnet = Roadnet::from_json(TWO_INTERSECTION_ROADNET).expect("fixture parses");
        NetworkTopology::from_roadnet(&roadnet).expect("fixture topology builds")
    }

    #[test]
    fn parses_sample_roadnet() {
        let roadnet = Roadnet::from_json(SAMPLE_ROADNET).unwrap();
        assert_eq!(roadnet.intersections.len(), 5);
        assert_eq!(roadnet.roads.len(), 8);
    }

    #[test]
    fn topology_preserves_source_order() {
        let topo = two_intersection_topology();
        assert_eq!(topo.controllable, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(topo.phase_counts, vec![3, 2]);
    }

    #[test]
    fn lane_order_is_roads_times_lane_index() {
        let topo = two_intersection_topology();
        assert_eq!(
            topo.lane_order,
            vec![
                "r_in_a_0".to_string(),
                "r_in_a_1".to_string(),
                "r_a_b_0".to_string(),
                "r_a_b_1".to_string(),
                "r_out_b_0".to_string(),
            ]
        );
        assert_eq!(topo.total_lanes(), 5);
    }

    #[test]
    fn incoming_lanes_follow_road_direction() {
        let topo = two_intersection_topology();
        // Intersection "a" is fed only by r_in_a; "b" only by r_a_b.
        assert_eq!(
            topo.incoming_lanes[0],
            vec!["r_in_a_0".to_string(), "r_in_a_1".to_string()]
        );
        assert_eq!(
            topo.incoming_lanes[1],
            vec!["r_a_b_0".to_string(), "r_a_b_1".to_string()]
        );
    }

    #[test]
    fn missing_traffic_light_is_configuration_error() {
        let json = r#"{
            "intersections": [
                {"id": "x", "virtual": false, "roads": ["r"]},
                {"id": "y", "virtual": true, "roads": ["r"]}
            ],
            "roads": [
                {"id": "r", "startIntersection": "y", "endIntersection": "x",
                 "lanes": [{"width": 3.5, "maxSpeed": 11.11}]}
            ]
        }"#;
        let roadnet = Roadnet::from_json(json).unwrap();
        let err = NetworkTopology::from_roadnet(&roadnet).unwrap_err();
        assert!(matches!(err, EnvError::Configuration(_)));
    }

    #[test]
    fn dangling_road_endpoint_is_configuration_error() {
        let json = r#"{
            "intersections": [
                {"id": "x", "virtual": false, "roads": ["r"],
                 "trafficLight": {"lightphases": [{"time": 30, "availableRoadLinks": []}]}}
            ],
            "roads": [
                {"id": "r", "startIntersection": "ghost", "endIntersection": "x",
                 "lanes": [{"width": 3.5, "maxSpeed": 11.11}]}
            ]
        }"#;
        let roadnet = Roadnet::from_json(json).unwrap();
        let err = NetworkTopology::from_roadnet(&roadnet).unwrap_err();
        assert!(matches!(err, EnvError::Configuration(_)));
    }

    #[test]
    fn zero_lane_network_is_configuration_error() {
        let json = r#"{
            "intersections": [
                {"id": "x", "virtual": false, "roads": [],
                 "trafficLight": {"lightphases": [{"time": 30, "availableRoadLinks": []}]}}
            ],
            "roads": []
        }"#;
        let roadnet = Roadnet::from_json(json).unwrap();
        let err = NetworkTopology::from_roadnet(&roadnet).unwrap_err();
        assert!(matches!(err, EnvError::Configuration(_)));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = Roadnet::from_json("{not json").unwrap_err();
        assert!(matches!(err, EnvError::Json(_)));
    }
}
