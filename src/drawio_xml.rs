use std::collections::HashMap;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use tracing::debug;

use crate::config::DiagramConfig;
use crate::error::SerializationError;
use crate::graph_layout::{GraphLayout, PositionedNode};

/// Ids `0` and `1` are the mxGraph root and default layer.
const FIRST_CELL_ID: usize = 2;
const MIN_PAGE_WIDTH: u32 = 850;
const MIN_PAGE_HEIGHT: u32 = 1100;
const PAGE_MARGIN: u32 = 40;

/// Serialize a positioned graph as a Draw.io `mxfile` document.
///
/// Vertices are numbered from 2 in node order, edges continue the sequence
/// in edge order, so the same layout always yields the same bytes.
pub fn to_xml(layout: &GraphLayout, config: &DiagramConfig) -> Result<String, SerializationError> {
    let mut emitter = Emitter::new(config);
    emitter.document(layout)?;
    emitter.finish()
}

struct Emitter<'a> {
    config: &'a DiagramConfig,
    writer: Writer<Vec<u8>>,
    next_id: usize,
    vertex_ids: HashMap<String, String>,
}

impl<'a> Emitter<'a> {
    fn new(config: &'a DiagramConfig) -> Self {
        Emitter {
            config,
            writer: Writer::new(Vec::new()),
            next_id: FIRST_CELL_ID,
            vertex_ids: HashMap::new(),
        }
    }

    fn allocate_id(&mut self) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;
        id
    }

    fn document(&mut self, layout: &GraphLayout) -> Result<(), SerializationError> {
        let page_width = layout.width().saturating_add(PAGE_MARGIN).max(MIN_PAGE_WIDTH).to_string();
        let page_height = layout.height().saturating_add(PAGE_MARGIN).max(MIN_PAGE_HEIGHT).to_string();

        self.start(BytesStart::new("mxfile").with_attributes([("host", "mermaid-drawio")]))?;
        self.start(
            BytesStart::new("diagram").with_attributes([("id", "mermaid-diagram"), ("name", "Page-1")]),
        )?;
        self.start(BytesStart::new("mxGraphModel").with_attributes([
            ("grid", "1"),
            ("gridSize", "10"),
            ("page", "1"),
            ("pageWidth", page_width.as_str()),
            ("pageHeight", page_height.as_str()),
        ]))?;
        self.start(BytesStart::new("root"))?;

        self.empty(BytesStart::new("mxCell").with_attributes([("id", "0")]))?;
        self.empty(BytesStart::new("mxCell").with_attributes([("id", "1"), ("parent", "0")]))?;

        for node in &layout.nodes {
            self.vertex(node)?;
        }
        for edge in &layout.edges {
            self.edge(&edge.from, &edge.to, edge.label.as_deref())?;
        }

        self.end("root")?;
        self.end("mxGraphModel")?;
        self.end("diagram")?;
        self.end("mxfile")?;

        debug!(
            vertices = layout.nodes.len(),
            edges = layout.edges.len(),
            "emitted drawio document"
        );
        Ok(())
    }

    fn vertex(&mut self, node: &PositionedNode) -> Result<(), SerializationError> {
        let config = self.config;
        let id = self.allocate_id();
        let style = config.vertex_style.as_str();
        self.start(BytesStart::new("mxCell").with_attributes([
            ("id", id.as_str()),
            ("value", node.label.as_str()),
            ("style", style),
            ("vertex", "1"),
            ("parent", "1"),
        ]))?;

        let (x, y) = (node.x.to_string(), node.y.to_string());
        let (width, height) = (node.width.to_string(), node.height.to_string());
        self.empty(BytesStart::new("mxGeometry").with_attributes([
            ("x", x.as_str()),
            ("y", y.as_str()),
            ("width", width.as_str()),
            ("height", height.as_str()),
            ("as", "geometry"),
        ]))?;
        self.end("mxCell")?;

        self.vertex_ids.insert(node.id.clone(), id);
        Ok(())
    }

    fn edge(&mut self, from: &str, to: &str, label: Option<&str>) -> Result<(), SerializationError> {
        let source = self.vertex_id(from)?;
        let target = self.vertex_id(to)?;
        let config = self.config;
        let id = self.allocate_id();
        let style = config.edge_style.as_str();

        let mut cell = BytesStart::new("mxCell").with_attributes([("id", id.as_str())]);
        if let Some(label) = label {
            cell.push_attribute(("value", label));
        }
        cell.extend_attributes([
            ("style", style),
            ("edge", "1"),
            ("parent", "1"),
            ("source", source.as_str()),
            ("target", target.as_str()),
        ]);
        self.start(cell)?;
        self.empty(
            BytesStart::new("mxGeometry").with_attributes([("relative", "1"), ("as", "geometry")]),
        )?;
        self.end("mxCell")
    }

    fn vertex_id(&self, node_id: &str) -> Result<String, SerializationError> {
        self.vertex_ids
            .get(node_id)
            .cloned()
            .ok_or_else(|| SerializationError::UnplacedNode {
                id: node_id.to_string(),
            })
    }

    fn start(&mut self, tag: BytesStart<'_>) -> Result<(), SerializationError> {
        self.write(Event::Start(tag))
    }

    fn empty(&mut self, tag: BytesStart<'_>) -> Result<(), SerializationError> {
        self.write(Event::Empty(tag))
    }

    fn end(&mut self, name: &str) -> Result<(), SerializationError> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), SerializationError> {
        self.writer
            .write_event(event)
            .map_err(|e| SerializationError::Write(e.to_string()))
    }

    fn finish(self) -> Result<String, SerializationError> {
        String::from_utf8(self.writer.into_inner())
            .map_err(|e| SerializationError::Write(e.to_string()))
    }
}
