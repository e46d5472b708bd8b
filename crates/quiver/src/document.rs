//! Format-agnostic persistence contract.
//!
//! A [`DiagramDocument`] is the serializable form of a [`DiagramGraph`]: shape
//! records, connector records, label records and, when present, group
//! records. Any serde format can carry it; the CLI uses TOML:
//!
//! ```toml
//! [[shapes]]
//! id = 1
//! kind = "rectangle"
//! x = 0.0
//! y = 0.0
//! bounding_center_x = 0.0
//! bounding_center_y = 0.0
//!
//! [[connectors]]
//! start_id = 1
//! end_id = 2
//! color = "black"
//! endpoint_x = 200.0
//! endpoint_y = 0.0
//!
//! [[groups]]
//! members = [1, 2]
//! ```
//!
//! Loading is two-pass: shapes (and labels) first, then connectors and groups
//! resolved against the loaded shapes. Connectors naming an unknown shape are
//! dropped and counted in the [`LoadReport`], so a loaded graph never holds a
//! dangling connector.

use std::collections::BTreeSet;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use quiver_core::{
    color::Color,
    geometry::{Point, Polygon},
    identifier::EntityId,
    shape::{ShapeKind, boundary_template},
};

use crate::structure::{DiagramGraph, ShapeNode};

/// Serializable form of a diagram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramDocument {
    #[serde(default)]
    pub shapes: Vec<ShapeRecord>,
    #[serde(default)]
    pub connectors: Vec<ConnectorRecord>,
    #[serde(default)]
    pub labels: Vec<LabelRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupRecord>,
}

/// One shape node.
///
/// `bounding_center_*` is the scene-space center of the node's bounding box;
/// it is informational and recomputed on load. `boundary` is only written for
/// nodes whose polygon differs from their kind's template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
    pub id: EntityId,
    pub kind: ShapeKind,
    pub x: f32,
    pub y: f32,
    pub bounding_center_x: f32,
    pub bounding_center_y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_value: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<Polygon>,
}

/// One connector. The endpoint is the end-node side of the routed line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorRecord {
    pub start_id: EntityId,
    pub end_id: EntityId,
    #[serde(default)]
    pub color: Color,
    pub endpoint_x: f32,
    pub endpoint_y: f32,
}

/// One text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub text: String,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
}

/// One node group, by the ids of its member shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub members: Vec<EntityId>,
}

/// What happened to the records of a loaded document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub shapes: usize,
    pub connectors: usize,
    pub labels: usize,
    pub groups: usize,
    /// Connectors whose endpoints did not resolve to two distinct shapes.
    pub dropped_connectors: usize,
    /// Shape records reusing an id already loaded.
    pub duplicate_shape_ids: usize,
    /// Shape records with an out-of-range id, non-finite coordinates or an
    /// unusable boundary.
    pub invalid_shapes: usize,
    /// Groups left with fewer than two loadable, ungrouped member shapes.
    pub dropped_groups: usize,
}

impl LoadReport {
    /// Returns true if every record was loaded.
    pub fn is_clean(&self) -> bool {
        self.dropped_connectors == 0
            && self.duplicate_shape_ids == 0
            && self.invalid_shapes == 0
            && self.dropped_groups == 0
    }
}

/// Captures the current state of `graph`.
pub fn to_document(graph: &DiagramGraph) -> DiagramDocument {
    let shapes = graph
        .nodes()
        .map(|node| {
            let center = node.bounding_center();
            let boundary = (node.boundary() != &boundary_template(node.kind()))
                .then(|| node.boundary().clone());
            ShapeRecord {
                id: node.id(),
                kind: node.kind(),
                x: node.position().x(),
                y: node.position().y(),
                bounding_center_x: center.x(),
                bounding_center_y: center.y(),
                fill_color: Some(node.fill_color()),
                z_value: Some(node.z_value()),
                boundary,
            }
        })
        .collect();

    let connectors = graph
        .connectors()
        .iter()
        .map(|connector| {
            let endpoint = connector.cached_line().end();
            ConnectorRecord {
                start_id: connector.start(),
                end_id: connector.end(),
                color: connector.color(),
                endpoint_x: endpoint.x(),
                endpoint_y: endpoint.y(),
            }
        })
        .collect();

    let labels = graph
        .labels()
        .map(|label| LabelRecord {
            text: label.text().to_string(),
            x: label.position().x(),
            y: label.position().y(),
            color: Some(label.color()),
            font: Some(label.font().to_string()),
        })
        .collect();

    let groups = graph
        .groups()
        .map(|group| GroupRecord {
            members: group.members().iter().copied().collect(),
        })
        .collect();

    DiagramDocument {
        shapes,
        connectors,
        labels,
        groups,
    }
}

/// Builds a graph from a document.
///
/// Shape ids are kept; labels, connectors and groups get fresh ids allocated
/// after the largest shape id. Records that cannot be loaded are skipped with a
/// warning and counted in the returned [`LoadReport`].
pub fn from_document(document: &DiagramDocument) -> (DiagramGraph, LoadReport) {
    let mut graph = DiagramGraph::new();
    let mut report = LoadReport::default();

    for record in &document.shapes {
        let Some(node) = shape_from_record(record) else {
            warn!(shape_id:% = record.id; "Skipping shape with invalid id or geometry");
            report.invalid_shapes += 1;
            continue;
        };
        match graph.insert_node(node) {
            Ok(()) => report.shapes += 1,
            Err(err) => {
                warn!(shape_id:% = record.id, err:%; "Skipping duplicate shape");
                report.duplicate_shape_ids += 1;
            }
        }
    }

    for record in &document.labels {
        let id = graph.add_label(record.text.clone(), Point::new(record.x, record.y));
        if let Some(color) = record.color {
            graph.set_label_color(id, color).ok();
        }
        if let Some(font) = &record.font {
            graph.set_label_font(id, font.clone()).ok();
        }
        report.labels += 1;
    }

    for record in &document.connectors {
        match graph.add_connector(record.start_id, record.end_id) {
            Ok(id) => {
                graph.set_connector_color(id, record.color).ok();
                report.connectors += 1;
            }
            Err(err) => {
                warn!(
                    start_id:% = record.start_id,
                    end_id:% = record.end_id,
                    err:%;
                    "Dropping connector"
                );
                report.dropped_connectors += 1;
            }
        }
    }

    for record in &document.groups {
        let members: BTreeSet<EntityId> = record
            .members
            .iter()
            .copied()
            .filter(|id| graph.node(*id).is_some() && graph.group_of(*id).is_none())
            .collect();
        if members.len() < 2 {
            warn!(members = record.members.len(); "Dropping group without two loadable members");
            report.dropped_groups += 1;
            continue;
        }
        match graph.create_group(&members) {
            Ok(_) => report.groups += 1,
            Err(err) => {
                warn!(err:%; "Dropping group");
                report.dropped_groups += 1;
            }
        }
    }

    info!(
        shapes = report.shapes,
        connectors = report.connectors,
        labels = report.labels,
        groups = report.groups,
        dropped_connectors = report.dropped_connectors;
        "Document loaded"
    );
    (graph, report)
}

fn shape_from_record(record: &ShapeRecord) -> Option<ShapeNode> {
    if record.id > EntityId::MAX_STORED {
        return None;
    }
    let position = Point::new(record.x, record.y);
    if !position.is_finite() {
        return None;
    }

    let mut node = ShapeNode::new(record.id, record.kind, position);
    if let Some(boundary) = &record.boundary {
        if boundary.is_degenerate() || !boundary.points().iter().all(|p| p.is_finite()) {
            return None;
        }
        node.set_boundary(Polygon::new(boundary.points().iter().copied()));
    }
    if let Some(color) = record.fill_color {
        node.set_fill_color(color);
    }
    if let Some(z_value) = record.z_value.filter(|z| z.is_finite()) {
        node.set_z_value(z_value);
    }
    Some(node)
}
