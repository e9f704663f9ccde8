//! Label collection pass.

use std::collections::HashMap;

use walle_parser::ast::{Program, Stmt, StmtKind};
use walle_parser::visitor::{walk_stmt, Visitor};
use walle_source::{CodeLocation, Error, Source};

/// Where a label is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelDecl {
    /// Index of the `Label` statement in [`Program::stmts`].
    pub index: usize,
    pub loc: CodeLocation,
}

/// Collects label declarations and `GoTo` references.
/// Labels may be referenced before they are declared, so references are only resolved in
/// [`LabelCollector::resolve`] once the whole program has been visited.
pub struct LabelCollector<'a> {
    /// First declaration of every label.
    labels: HashMap<&'a str, LabelDecl>,
    /// Every `GoTo` target, in program order.
    references: Vec<(&'a str, CodeLocation)>,
    /// Index of the statement currently visited.
    index: usize,
    source: &'a Source<'a>,
}

impl<'a> LabelCollector<'a> {
    pub fn new(source: &'a Source<'a>) -> Self {
        Self {
            labels: HashMap::new(),
            references: Vec::new(),
            index: 0,
            source,
        }
    }

    pub fn labels(&self) -> &HashMap<&'a str, LabelDecl> {
        &self.labels
    }

    /// Reports every `GoTo` whose target is never declared.
    pub fn resolve(&self) {
        for (label, loc) in &self.references {
            if !self.labels.contains_key(label) {
                self.source.errors.add_error(Error::semantic(
                    *loc,
                    format!("Label '{}' is not declared.", label),
                ));
            }
        }
    }
}

impl<'a> Visitor<'a> for LabelCollector<'a> {
    fn visit_program(&mut self, program: &'a Program) {
        for (index, stmt) in program.stmts.iter().enumerate() {
            self.index = index;
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        match &stmt.kind {
            StmtKind::Label(label) => {
                if let Some(first) = self.labels.get(label.as_str()) {
                    self.source.errors.add_error(Error::semantic(
                        stmt.loc,
                        format!("Label '{}' is already declared at {}.", label, first.loc),
                    ));
                } else {
                    self.labels.insert(
                        label.as_str(),
                        LabelDecl {
                            index: self.index,
                            loc: stmt.loc,
                        },
                    );
                }
            }
            StmtKind::GoTo { label, .. } => self.references.push((label.as_str(), stmt.loc)),
            _ => {}
        }

        walk_stmt(self, stmt);
    }
}
