use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::config::DiagramConfig;
use crate::error::SerializationError;
use crate::graph_ast::*;

#[derive(Debug, Clone, PartialEq)]
pub struct GraphLayout {
    /// Positioned nodes, in declaration order.
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionedNode {
    pub id: String,
    pub label: String,
    pub depth: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl GraphLayout {
    pub fn position(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn width(&self) -> u32 {
        self.nodes.iter().map(|n| n.x.saturating_add(n.width)).max().unwrap_or(0)
    }

    pub fn height(&self) -> u32 {
        self.nodes.iter().map(|n| n.y.saturating_add(n.height)).max().unwrap_or(0)
    }
}

/// Place every node of `diagram` on a grid of depth levels.
///
/// Depth is the breadth-first distance from the nearest root, where roots are
/// the nodes without incoming edges (or the first node when every node has
/// one). A node keeps the depth of its first visit, so back edges and
/// converging paths never move it. Nodes no root reaches sit at depth 0 after
/// everything reachable. No attempt is made to reduce edge crossings.
///
/// Fails with [`SerializationError::GeometryOverflow`] when a node's position
/// or far edge does not fit in `u32`.
pub fn compute(diagram: &GraphDiagram, config: &DiagramConfig) -> Result<GraphLayout, SerializationError> {
    let index: HashMap<&str, usize> = diagram
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); diagram.nodes.len()];
    let mut in_degree: Vec<usize> = vec![0; diagram.nodes.len()];
    for edge in &diagram.edges {
        if let (Some(&from), Some(&to)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str())) {
            successors[from].push(to);
            in_degree[to] += 1;
        }
    }

    let mut roots: Vec<usize> = (0..diagram.nodes.len())
        .filter(|&i| in_degree[i] == 0)
        .collect();
    if roots.is_empty() && !diagram.nodes.is_empty() {
        roots.push(0);
    }

    let (mut order, mut depths) = breadth_first(&roots, &successors);
    let reachable = order.len();

    // Unreachable components go after the traversal, at depth 0.
    for (i, depth) in depths.iter_mut().enumerate() {
        if depth.is_none() {
            *depth = Some(0);
            order.push(i);
        }
    }

    debug!(
        roots = roots.len(),
        reachable,
        unreachable = order.len() - reachable,
        "assigned depths"
    );

    let mut slots: Vec<usize> = vec![0; diagram.nodes.len()];
    let mut level_fill: HashMap<usize, usize> = HashMap::new();
    for &i in &order {
        let depth = depths[i].unwrap_or(0);
        let fill = level_fill.entry(depth).or_insert(0);
        slots[i] = *fill;
        *fill += 1;
    }

    let nodes = diagram
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let depth = depths[i].unwrap_or(0);
            let overflow = || SerializationError::GeometryOverflow { id: node.id.clone() };
            let (x, y) = coordinates(diagram.direction, depth, slots[i], config).ok_or_else(overflow)?;
            x.checked_add(config.node_width).ok_or_else(overflow)?;
            y.checked_add(config.node_height).ok_or_else(overflow)?;
            Ok(PositionedNode {
                id: node.id.clone(),
                label: node.label.clone(),
                depth,
                x,
                y,
                width: config.node_width,
                height: config.node_height,
            })
        })
        .collect::<Result<Vec<_>, SerializationError>>()?;

    Ok(GraphLayout {
        nodes,
        edges: diagram.edges.clone(),
    })
}

/// Multi-source BFS. Returns the visitation order and each node's depth,
/// `None` for nodes no root reaches.
fn breadth_first(roots: &[usize], successors: &[Vec<usize>]) -> (Vec<usize>, Vec<Option<usize>>) {
    let mut depths: Vec<Option<usize>> = vec![None; successors.len()];
    let mut order = Vec::with_capacity(successors.len());
    let mut queue = VecDeque::new();

    for &root in roots {
        if depths[root].is_none() {
            depths[root] = Some(0);
            queue.push_back(root);
        }
    }

    while let Some(current) = queue.pop_front() {
        order.push(current);
        let next_depth = depths[current].unwrap_or(0) + 1;
        for &child in &successors[current] {
            if depths[child].is_none() {
                depths[child] = Some(next_depth);
                queue.push_back(child);
            }
        }
    }

    (order, depths)
}

/// `None` when the position does not fit in `u32`.
fn coordinates(direction: Direction, depth: usize, slot: usize, config: &DiagramConfig) -> Option<(u32, u32)> {
    let scaled = |n: usize, spacing: u32| u32::try_from(n).ok()?.checked_mul(spacing);
    let primary = scaled(depth, config.rank_spacing)?;
    match direction {
        Direction::TopDown => Some((scaled(slot, config.horizontal_spacing)?, primary)),
        Direction::LeftRight => Some((primary, scaled(slot, config.vertical_spacing)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_parser::parse_graph;
    use pretty_assertions::assert_eq;

    fn layout(input: &str) -> GraphLayout {
        compute(&parse_graph(input).unwrap(), &DiagramConfig::default()).unwrap()
    }

    fn depth_of(layout: &GraphLayout, id: &str) -> usize {
        layout.position(id).unwrap().depth
    }

    fn xy(layout: &GraphLayout, id: &str) -> (u32, u32) {
        let n = layout.position(id).unwrap();
        (n.x, n.y)
    }

    #[test]
    fn chain_depths() {
        let l = layout("graph TD\n    A --> B\n    B --> C\n");
        assert_eq!(depth_of(&l, "A"), 0);
        assert_eq!(depth_of(&l, "B"), 1);
        assert_eq!(depth_of(&l, "C"), 2);
    }

    #[test]
    fn td_coordinates() {
        let l = layout("graph TD\n    A --> B\n    A --> C\n");
        assert_eq!(xy(&l, "A"), (0, 0));
        assert_eq!(xy(&l, "B"), (0, 200));
        assert_eq!(xy(&l, "C"), (200, 200));
    }

    #[test]
    fn lr_coordinates() {
        let l = layout("graph LR\n    A --> B\n    A --> C\n");
        assert_eq!(xy(&l, "A"), (0, 0));
        assert_eq!(xy(&l, "B"), (200, 0));
        assert_eq!(xy(&l, "C"), (200, 120));
    }

    #[test]
    fn fixed_node_size() {
        let l = layout("graph TD\n    A[A very long label indeed] --> B\n");
        for n in &l.nodes {
            assert_eq!((n.width, n.height), (120, 60));
        }
    }

    #[test]
    fn cycle_uses_first_node_as_root() {
        let l = layout("graph TD\n    A --> B\n    B --> A\n");
        assert_eq!(depth_of(&l, "A"), 0);
        assert_eq!(depth_of(&l, "B"), 1);
    }

    #[test]
    fn back_edge_does_not_move_visited_node() {
        let l = layout("graph TD\n    A --> B\n    B --> C\n    C --> B\n");
        assert_eq!(depth_of(&l, "B"), 1);
        assert_eq!(depth_of(&l, "C"), 2);
    }

    #[test]
    fn diamond_takes_first_visit_depth() {
        let l = layout("graph TD\n    A --> B\n    B --> C\n    C --> D\n    A --> D\n");
        assert_eq!(depth_of(&l, "D"), 1);
        assert_eq!(xy(&l, "D"), (200, 200));
    }

    #[test]
    fn multiple_roots_share_level_zero() {
        let l = layout("graph TD\n    A --> C\n    B --> C\n");
        assert_eq!(xy(&l, "A"), (0, 0));
        assert_eq!(xy(&l, "B"), (200, 0));
        assert_eq!(xy(&l, "C"), (0, 200));
    }

    #[test]
    fn unreachable_cycle_placed_after_reachable_nodes() {
        let l = layout("graph TD\n    A --> B\n    C --> D\n    D --> C\n    E\n");
        // A and E are roots; C/D form a cycle no root reaches.
        assert_eq!(depth_of(&l, "C"), 0);
        assert_eq!(depth_of(&l, "D"), 0);
        assert_eq!(xy(&l, "A"), (0, 0));
        assert_eq!(xy(&l, "E"), (200, 0));
        assert_eq!(xy(&l, "C"), (400, 0));
        assert_eq!(xy(&l, "D"), (600, 0));
        assert_eq!(xy(&l, "B"), (0, 200));
    }

    #[test]
    fn level_order_follows_visitation() {
        let l = layout("graph TD\n    R --> X\n    R --> Y\n    Y --> P\n    X --> Q\n");
        // Y is dequeued after X, so X's child Q comes before P.
        assert_eq!(xy(&l, "Q"), (0, 400));
        assert_eq!(xy(&l, "P"), (200, 400));
    }

    #[test]
    fn nodes_keep_declaration_order() {
        let l = layout("graph TD\n    C --> A\n    B --> C\n");
        let ids: Vec<&str> = l.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn custom_spacing() {
        let config = DiagramConfig {
            rank_spacing: 100,
            horizontal_spacing: 150,
            ..DiagramConfig::default()
        };
        let diagram = parse_graph("graph TD\n    A --> B\n    A --> C\n").unwrap();
        let l = compute(&diagram, &config).unwrap();
        assert_eq!(xy(&l, "C"), (150, 100));
    }

    #[test]
    fn chain_of_ids_with_spaces_and_hyphens() {
        let l = layout("graph TD\n    Start Here --> node-1 --> End There\n");
        assert_eq!(depth_of(&l, "Start Here"), 0);
        assert_eq!(depth_of(&l, "node-1"), 1);
        assert_eq!(depth_of(&l, "End There"), 2);
    }

    #[test]
    fn rank_spacing_overflow_is_an_error() {
        let config = DiagramConfig {
            rank_spacing: 3_000_000_000,
            ..DiagramConfig::default()
        };
        let diagram = parse_graph("graph TD\n    A --> B --> C\n").unwrap();
        assert_eq!(
            compute(&diagram, &config),
            Err(SerializationError::GeometryOverflow { id: "C".to_string() })
        );
    }

    #[test]
    fn node_extent_overflow_is_an_error() {
        let config = DiagramConfig {
            node_width: u32::MAX,
            ..DiagramConfig::default()
        };
        let diagram = parse_graph("graph TD\n    A --> B\n    A --> C\n").unwrap();
        // B sits at x = 0, so its extent fits; C at x = 200 does not.
        assert_eq!(
            compute(&diagram, &config),
            Err(SerializationError::GeometryOverflow { id: "C".to_string() })
        );
    }

    #[test]
    fn lr_ignores_horizontal_spacing_overflow() {
        let config = DiagramConfig {
            horizontal_spacing: u32::MAX,
            ..DiagramConfig::default()
        };
        let diagram = parse_graph("graph LR\n    A --> B\n    A --> C\n").unwrap();
        let l = compute(&diagram, &config).unwrap();
        assert_eq!(xy(&l, "C"), (200, 120));
    }

    #[test]
    fn empty_diagram_has_empty_layout() {
        let l = layout("graph TD\n");
        assert!(l.nodes.is_empty());
        assert_eq!((l.width(), l.height()), (0, 0));
    }

    #[test]
    fn bounding_box() {
        let l = layout("graph LR\n    A --> B\n    A --> C\n");
        assert_eq!(l.width(), 320);
        assert_eq!(l.height(), 180);
    }
}
