pub mod config;
pub mod drawio_link;
pub mod drawio_xml;
pub mod error;
pub mod graph_ast;
pub mod graph_layout;
pub mod graph_parser;

pub use config::DiagramConfig;
pub use error::{Error, ParseError, Result, SerializationError};

/// Everything produced from one Mermaid input.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    /// The Mermaid text as given, suitable for saving as `.mmd`.
    pub source: String,
    /// Draw.io document.
    pub xml: String,
    /// Viewer link that opens `xml`.
    pub url: String,
}

pub fn convert(input: &str) -> Result<Conversion> {
    convert_with_config(input, &DiagramConfig::default())
}

pub fn convert_with_config(input: &str, config: &DiagramConfig) -> Result<Conversion> {
    let diagram = graph_parser::parse_graph(input)?;
    let layout = graph_layout::compute(&diagram, config)?;
    let xml = drawio_xml::to_xml(&layout, config)?;
    let url = drawio_link::viewer_url(&xml, config)?;
    Ok(Conversion {
        source: input.to_string(),
        xml,
        url,
    })
}
