//! Quiver Core Types and Definitions
//!
//! This crate provides the foundational value types of the Quiver diagram
//! editor. It includes:
//!
//! - **Identifiers**: Graph-scoped entity ids ([`identifier::EntityId`])
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Points, bounds, segments and polygons ([`geometry`] module)
//! - **Shapes**: Shape kinds, boundary templates and resize handles ([`shape`] module)

pub mod color;
pub mod geometry;
pub mod identifier;
pub mod shape;
