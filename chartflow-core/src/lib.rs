//! Chartflow Core
//!
//! This crate compiles declarative chart specifications into a computation
//! graph and evaluates it. It implements:
//!
//! - Typed graph nodes with structurally discovered dependencies
//! - Cycle-safe topological ordering and downstream-impact analysis
//! - Memoized evaluation with context-free and per-row resolution
//! - A rendering adapter that drives any drawing surface
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Node model, arena and scheduler (sorting, downstream closure)
//! - `spec`: Specification model and the graph builder
//! - `eval`: Evaluator, resolved values, aggregation and scale construction
//! - `render`: Evaluated chart output and drawing surfaces
//!
//! Control flows one way: specification, builder, scheduler, evaluator,
//! surface.
//!
//! # Example
//!
//! ```rust
//! use chartflow_core::{render, EngineConfig, Specification, SvgSurface};
//!
//! let spec = Specification::from_json(r#"{
//!     "width": 200,
//!     "height": 100,
//!     "data": [{"name": "table", "rows": [{"value": 0}, {"value": 1}]}],
//!     "scales": [{
//!         "name": "x", "type": "linear",
//!         "domain": {"data": "table", "field": "value"},
//!         "range": "width"
//!     }],
//!     "marks": [{
//!         "type": "circle",
//!         "from": {"data": "table"},
//!         "encode": {"cx": {"scale": "x", "field": "value"}, "r": {"value": 2}}
//!     }]
//! }"#)?;
//!
//! let mut surface = SvgSurface::new();
//! render(&spec, &EngineConfig::default(), &mut surface)?;
//! assert_eq!(surface.len(), 2);
//! # Ok::<(), chartflow_core::ChartError>(())
//! ```

pub mod config;
pub mod error;
pub mod eval;
pub mod graph;
pub mod render;
pub mod spec;

pub use config::{BandConfig, EngineConfig};
pub use error::{ChartError, Result};
pub use eval::{evaluate, Evaluation, Evaluator, Resolved};
pub use graph::{Graph, Node, NodeId, NodeKind};
pub use render::{ChartOutput, MarkDescriptor, RenderSurface, SvgSurface};
pub use spec::{parse, ChartGraph, Specification};

/// Build, sort and evaluate a specification.
///
/// Any error aborts the whole compile; nothing partial is returned.
pub fn compile(spec: &Specification, config: &EngineConfig) -> Result<ChartOutput> {
    let chart = parse(spec)?;
    let order = chart.evaluation_order()?;
    let evaluation = Evaluator::new(chart.graph(), config).run(&order)?;
    ChartOutput::collect(&chart, &evaluation)
}

/// Compile a specification and draw it onto `surface`.
pub fn render<S: RenderSurface + ?Sized>(
    spec: &Specification,
    config: &EngineConfig,
    surface: &mut S,
) -> Result<()> {
    let output = compile(spec, config)?;
    render::draw(&output, surface)
}
