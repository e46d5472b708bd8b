use std::{fs::File, io::Write};

use indexmap::IndexSet;
use log::{debug, error, info};
use svg::{
    Document,
    node::element::{self as svg_element, Definitions, Group, Marker, Path},
};

use quiver_core::{
    color::Color,
    geometry::{Bounds, Polygon},
};

use crate::{
    config::StyleConfig,
    export,
    structure::{Connector, DiagramGraph, ShapeNode, TextLabel},
};

/// Margin around the content, in scene units.
const MARGIN: f32 = 50.0;

/// SVG exporter writing one diagram to `file_name`.
pub struct Svg {
    pub file_name: String,
    background: Option<Color>,
}

impl Svg {
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            background: None,
        }
    }

    /// Creates an exporter using the canvas settings of `style`.
    ///
    /// # Errors
    ///
    /// Returns [`export::Error::Render`] if the background color does not parse.
    pub fn from_style(file_name: &str, style: &StyleConfig) -> Result<Self, export::Error> {
        let background = style.background_color().map_err(export::Error::Render)?;
        Ok(Self::new(file_name).with_background(background))
    }

    /// Fills the whole canvas with `color` before drawing.
    pub fn with_background(mut self, color: Option<Color>) -> Self {
        self.background = color;
        self
    }

    /// Renders the graph into an SVG document.
    ///
    /// Connectors are drawn first so nodes cover their ends, then nodes in
    /// ascending z order, then labels on top.
    pub fn render_graph(&self, graph: &DiagramGraph) -> Document {
        let content = content_bounds(graph);
        let (min_x, min_y, width, height) = match content {
            Some(bounds) => (
                bounds.min_x() - MARGIN,
                bounds.min_y() - MARGIN,
                MARGIN.mul_add(2.0, bounds.width()),
                MARGIN.mul_add(2.0, bounds.height()),
            ),
            None => (-MARGIN, -MARGIN, MARGIN * 2.0, MARGIN * 2.0),
        };
        debug!(width = width, height = height; "Final SVG dimensions");

        let mut doc = Document::new()
            .set("viewBox", format!("{min_x} {min_y} {width} {height}"))
            .set("width", width)
            .set("height", height);

        if let Some(color) = &self.background {
            doc = doc.add(
                svg_element::Rectangle::new()
                    .set("x", min_x)
                    .set("y", min_y)
                    .set("width", width)
                    .set("height", height)
                    .set("fill", color)
                    .set("fill-opacity", color.alpha()),
            );
        }

        let colors: IndexSet<Color> = graph.connectors().iter().map(Connector::color).collect();
        if !colors.is_empty() {
            doc = doc.add(marker_definitions(&colors));
        }

        let mut connectors = Group::new().set("class", "connectors");
        for connector in graph.connectors() {
            let marker = colors.get_index_of(&connector.color()).unwrap_or_default();
            connectors = connectors.add(render_connector(connector, marker));
        }

        let mut nodes: Vec<&ShapeNode> = graph.nodes().collect();
        nodes.sort_by(|a, b| a.z_value().total_cmp(&b.z_value()));
        let mut shapes = Group::new().set("class", "nodes");
        for node in nodes {
            shapes = shapes.add(render_node(node));
        }

        let mut labels = Group::new().set("class", "labels");
        for label in graph.labels() {
            labels = labels.add(render_label(label));
        }

        doc.add(connectors).add(shapes).add(labels)
    }

    /// Writes an SVG document to the specified file
    pub fn write_document(&self, doc: Document) -> Result<(), export::Error> {
        info!(file_name = self.file_name; "Creating SVG file");
        let f = match File::create(&self.file_name) {
            Ok(file) => file,
            Err(err) => {
                error!(file_name = self.file_name, err:err; "Failed to create SVG file");
                return Err(export::Error::Io(err));
            }
        };

        if let Err(err) = write!(&f, "{doc}") {
            error!(file_name = self.file_name, err:err; "Failed to write SVG content");
            return Err(export::Error::Io(err));
        }

        Ok(())
    }
}

/// Renders `graph` with the canvas settings of `style`.
///
/// # Errors
///
/// Returns [`export::Error::Render`] if the configured background color
/// does not parse.
pub fn render(graph: &DiagramGraph, style: &StyleConfig) -> Result<Document, export::Error> {
    let background = style.background_color().map_err(export::Error::Render)?;
    Ok(Svg::new("").with_background(background).render_graph(graph))
}

impl export::Exporter for Svg {
    fn export_graph(&self, graph: &DiagramGraph) -> Result<(), export::Error> {
        let doc = self.render_graph(graph);
        debug!("SVG document rendered");

        self.write_document(doc)
    }
}

/// Bounds of every node, connector and label anchor in the graph.
fn content_bounds(graph: &DiagramGraph) -> Option<Bounds> {
    let nodes = graph.nodes().map(ShapeNode::scene_bounds);
    let connectors = graph.connectors().iter().filter_map(|connector| {
        let line = connector.cached_line();
        Bounds::from_points([line.start(), line.end()])
    });
    let labels = graph
        .labels()
        .filter_map(|label| Bounds::from_points([label.position()]));
    nodes
        .chain(connectors)
        .chain(labels)
        .reduce(|acc, bounds| acc.merge(&bounds))
}

fn marker_definitions(colors: &IndexSet<Color>) -> Definitions {
    let mut defs = Definitions::new();
    for (index, color) in colors.iter().enumerate() {
        let arrow = Marker::new()
            .set("id", format!("arrow-{index}"))
            .set("viewBox", "0 0 10 10")
            .set("refX", 9)
            .set("refY", 5)
            .set("markerWidth", 6)
            .set("markerHeight", 6)
            .set("orient", "auto")
            .add(
                Path::new()
                    .set("d", "M 0 0 L 10 5 L 0 10 z")
                    .set("fill", color),
            );
        defs = defs.add(arrow);
    }
    defs
}

fn render_connector(connector: &Connector, marker: usize) -> Path {
    let line = connector.cached_line();
    let color = connector.color();
    Path::new()
        .set(
            "d",
            format!(
                "M {} {} L {} {}",
                line.start().x(),
                line.start().y(),
                line.end().x(),
                line.end().y()
            ),
        )
        .set("stroke", &color)
        .set("stroke-opacity", color.alpha())
        .set("stroke-width", 1.5)
        .set("fill", "none")
        .set("marker-end", format!("url(#arrow-{marker})"))
}

fn render_node(node: &ShapeNode) -> svg_element::Polygon {
    let fill = node.fill_color();
    svg_element::Polygon::new()
        .set("points", polygon_points(&node.scene_boundary()))
        .set("fill", &fill)
        .set("fill-opacity", fill.alpha())
        .set("stroke", "black")
        .set("stroke-width", 1.0)
}

fn render_label(label: &TextLabel) -> svg_element::Text {
    let color = label.color();
    svg_element::Text::new(label.text())
        .set("x", label.position().x())
        .set("y", label.position().y())
        .set("dominant-baseline", "hanging")
        .set("style", format!("font: {}", label.font()))
        .set("fill", &color)
        .set("fill-opacity", color.alpha())
}

fn polygon_points(polygon: &Polygon) -> String {
    polygon
        .points()
        .iter()
        .map(|point| format!("{},{}", point.x(), point.y()))
        .collect::<Vec<_>>()
        .join(" ")
}
