/// Geometry, style and link settings shared by layout and emission.
///
/// Passed explicitly through every stage so that conversions never share state.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramConfig {
    /// Width of every vertex.
    pub node_width: u32,
    /// Height of every vertex.
    pub node_height: u32,
    /// Distance between consecutive depth levels along the primary axis.
    pub rank_spacing: u32,
    /// Cross-axis step between siblings in a top-down layout.
    pub horizontal_spacing: u32,
    /// Cross-axis step between siblings in a left-right layout.
    pub vertical_spacing: u32,
    pub vertex_style: String,
    pub edge_style: String,
    /// Viewer URL; the encoded diagram is appended as a `#R` fragment.
    pub viewer_base_url: String,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            node_width: 120,
            node_height: 60,
            rank_spacing: 200,
            horizontal_spacing: 200,
            vertical_spacing: 120,
            vertex_style: "rounded=1;whiteSpace=wrap;html=1;".to_string(),
            edge_style: "edgeStyle=orthogonalEdgeStyle;rounded=0;orthogonalLoop=1;jettySize=auto;html=1;"
                .to_string(),
            viewer_base_url: "https://app.diagrams.net/?splash=0&clibs=U&lang=en".to_string(),
        }
    }
}
