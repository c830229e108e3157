// Bar-chart DSL parser module

pub mod aesthetics;
pub mod ast;
pub mod coord;
pub mod geom;
pub mod labels;
pub mod lexer;
pub mod pipeline;
pub mod scale;

// Public API re-exports
pub use ast::PlotSpec;
pub use pipeline::parse_plot_spec;
