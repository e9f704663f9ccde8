//! Static passes run over a parsed [`walle_parser::ast::Program`] before it is executed.

pub mod check;
pub mod labels;
