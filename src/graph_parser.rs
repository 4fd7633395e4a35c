use tracing::debug;
use winnow::ascii::{space0, space1};
use winnow::combinator::{alt, delimited, eof, opt, preceded, repeat, terminated};
use winnow::error::ParserError;
use winnow::prelude::*;
use winnow::token::{take_until, take_while};

use crate::error::ParseError;
use crate::graph_ast::*;

/// Parse Mermaid flowchart text into a diagram.
///
/// Each line is split into `;`-separated statements which are classified one
/// at a time; anything that is not a declaration, a node or an edge chain is
/// skipped. Fails only when neither a `graph` / `flowchart` declaration nor a
/// single edge was found.
pub fn parse_graph(input: &str) -> Result<GraphDiagram, ParseError> {
    let mut direction: Option<Direction> = None;
    let mut nodes: Vec<NodeDecl> = Vec::new();
    let mut edges: Vec<Edge> = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        for statement in statements(line) {
            match classify_line(statement) {
                GraphLine::Declaration(d) => {
                    if direction.is_some() {
                        debug!(line = line_no, "ignoring repeated graph declaration");
                    } else {
                        direction = Some(d);
                    }
                }
                GraphLine::Node(decl) => add_node(&mut nodes, decl),
                GraphLine::Edges(links) => {
                    for Link { from, to, label } in links {
                        edges.push(Edge {
                            from: from.id.clone(),
                            to: to.id.clone(),
                            label,
                        });
                        add_node(&mut nodes, from);
                        add_node(&mut nodes, to);
                    }
                }
                GraphLine::Unrecognized => {
                    let text = statement.trim();
                    if !text.is_empty() {
                        debug!(line = line_no, text, "skipping unrecognized line");
                    }
                }
            }
        }
    }

    if direction.is_none() && edges.is_empty() {
        return Err(ParseError::Empty);
    }

    let direction = direction.unwrap_or_default();
    debug!(?direction, nodes = nodes.len(), edges = edges.len(), "parsed graph");
    Ok(GraphDiagram {
        direction,
        nodes,
        edges,
    })
}

fn add_node(nodes: &mut Vec<NodeDecl>, decl: NodeDecl) {
    if !nodes.iter().any(|n| n.id == decl.id) {
        nodes.push(decl);
    }
}

/// Split on `;` outside double quotes. Comment lines are kept whole.
fn statements(line: &str) -> Vec<&str> {
    if line.trim_start().starts_with("%%") {
        return vec![line];
    }
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => {
                parts.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&line[start..]);
    parts
}

#[derive(Debug, PartialEq)]
struct Link {
    from: NodeDecl,
    to: NodeDecl,
    label: Option<String>,
}

#[derive(Debug, PartialEq)]
enum GraphLine {
    Declaration(Direction),
    Node(NodeDecl),
    /// `A --> B`, or a chain `A --> B --> C` as consecutive links.
    Edges(Vec<Link>),
    Unrecognized,
}

fn classify_line(line: &str) -> GraphLine {
    let text = line.trim();
    if text.is_empty() || text.starts_with("%%") {
        return GraphLine::Unrecognized;
    }

    alt((
        terminated(declaration, eof).map(GraphLine::Declaration),
        terminated(edge_chain, eof).map(GraphLine::Edges),
        terminated(node_line, eof).map(GraphLine::Node),
    ))
    .parse(text)
    .unwrap_or(GraphLine::Unrecognized)
}

fn declaration(input: &mut &str) -> winnow::Result<Direction> {
    alt(("graph", "flowchart")).parse_next(input)?;
    let token = opt(preceded(
        space1,
        take_while(1.., |c: char| !c.is_whitespace()),
    ))
    .parse_next(input)?;
    space0.parse_next(input)?;
    Ok(direction_from_token(token))
}

fn direction_from_token(token: Option<&str>) -> Direction {
    let Some(token) = token else {
        return Direction::TopDown;
    };
    match token.to_ascii_uppercase().as_str() {
        "TD" | "TB" => Direction::TopDown,
        "LR" => Direction::LeftRight,
        _ => {
            debug!(token, "unsupported direction, falling back to top-down");
            Direction::TopDown
        }
    }
}

/// Byte length of the id at the start of `text`. An id ends at a label
/// opener, a pipe, a quote, `>` or the `--` of a link; whitespace ends it
/// too unless `spaced`.
fn id_len(text: &str, spaced: bool) -> usize {
    let mut end = 0;
    for (i, c) in text.char_indices() {
        let stop = match c {
            '[' | '(' | '{' | '|' | '"' | '>' => true,
            '-' => text[i..].starts_with("--"),
            c if c.is_whitespace() => !spaced,
            _ => false,
        };
        if stop {
            break;
        }
        end = i + c.len_utf8();
    }
    end
}

fn bare_id<'s>(input: &mut &'s str, spaced: bool) -> winnow::Result<&'s str> {
    let text: &'s str = *input;
    let (raw, rest) = text.split_at(id_len(text, spaced));
    let id = raw.trim_end();
    if id.is_empty() {
        return Err(ParserError::from_input(&*input));
    }
    *input = rest;
    Ok(id)
}

fn with_label(input: &mut &str, id: &str) -> winnow::Result<NodeDecl> {
    let label = opt(shape_label).parse_next(input)?;
    Ok(match label {
        Some(label) => NodeDecl {
            id: id.to_string(),
            label,
        },
        None => NodeDecl::bare(id),
    })
}

/// A node reference whose id has no whitespace, e.g. `node-1[Start]`.
fn node_ref(input: &mut &str) -> winnow::Result<NodeDecl> {
    let id = bare_id(input, false)?;
    with_label(input, id)
}

/// A link endpoint; the id may contain inner spaces (`Start Here --> End`).
fn endpoint(input: &mut &str) -> winnow::Result<NodeDecl> {
    let id = bare_id(input, true)?;
    with_label(input, id)
}

fn node_line(input: &mut &str) -> winnow::Result<NodeDecl> {
    let decl = node_ref.parse_next(input)?;
    // closes a subgraph block
    if decl.id == "end" {
        return Err(ParserError::from_input(&*input));
    }
    Ok(decl)
}

fn shape_label(input: &mut &str) -> winnow::Result<String> {
    alt((
        enclosed_label('[', ']'),
        enclosed_label('(', ')'),
        enclosed_label('{', '}'),
    ))
    .parse_next(input)
}

// Doubled delimiters (`((x))`, `{{x}}`) collapse to the same label.
fn enclosed_label(open: char, close: char) -> impl FnMut(&mut &str) -> winnow::Result<String> {
    move |input: &mut &str| {
        take_while(1.., open).parse_next(input)?;
        let text = quoted_inner(close).parse_next(input)?;
        take_while(1.., close).parse_next(input)?;
        Ok(text)
    }
}

fn quoted_inner(closer: char) -> impl FnMut(&mut &str) -> winnow::Result<String> {
    move |input: &mut &str| {
        if input.starts_with('"') {
            let text = delimited('"', take_while(0.., |c: char| c != '"'), '"').parse_next(input)?;
            Ok(text.to_string())
        } else {
            let text = take_while(1.., move |c: char| c != closer).parse_next(input)?;
            Ok(text.trim().to_string())
        }
    }
}

fn edge_chain(input: &mut &str) -> winnow::Result<Vec<Link>> {
    let first = endpoint.parse_next(input)?;
    let hops: Vec<(Option<String>, NodeDecl)> =
        repeat(1.., (preceded(space0, link), preceded(space0, endpoint))).parse_next(input)?;

    let mut links = Vec::with_capacity(hops.len());
    let mut from = first;
    for (label, to) in hops {
        links.push(Link {
            from,
            to: to.clone(),
            label,
        });
        from = to;
    }
    Ok(links)
}

fn link(input: &mut &str) -> winnow::Result<Option<String>> {
    let label = alt((arrow_with_pipe_label, dashed_label_arrow)).parse_next(input)?;
    Ok(label
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty()))
}

fn arrow_with_pipe_label(input: &mut &str) -> winnow::Result<Option<String>> {
    "-->".parse_next(input)?;
    opt(pipe_label).parse_next(input)
}

fn pipe_label(input: &mut &str) -> winnow::Result<String> {
    let text = delimited('|', take_while(0.., |c: char| c != '|'), '|').parse_next(input)?;
    Ok(text.to_string())
}

fn dashed_label_arrow(input: &mut &str) -> winnow::Result<Option<String>> {
    "--".parse_next(input)?;
    let text = take_until(1.., "-->").parse_next(input)?;
    "-->".parse_next(input)?;
    Ok(Some(text.to_string()))
}
