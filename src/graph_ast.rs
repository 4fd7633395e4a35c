#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    TopDown,
    LeftRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphDiagram {
    pub direction: Direction,
    pub nodes: Vec<NodeDecl>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeDecl {
    pub id: String,
    pub label: String,
}

impl NodeDecl {
    pub fn bare(id: &str) -> Self {
        NodeDecl {
            id: id.to_string(),
            label: id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
}
