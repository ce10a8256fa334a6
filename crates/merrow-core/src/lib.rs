//! Merrow Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Merrow parser,
//! renderers and orchestrator. It includes:
//!
//! - **Kinds**: The closed set of supported diagram grammars ([`kind::DiagramKind`])
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Draw**: Layered SVG output and stroke helpers ([`draw`] module)
//! - **Scene**: The presentation substrate that hosts scratch surfaces ([`scene`] module)
//! - **Semantic**: The parsed model of each diagram type ([`semantic`] module)

pub mod draw;
pub mod geometry;
pub mod identifier;
pub mod kind;
pub mod scene;
pub mod semantic;
