//! Program counter, jump table and execution limit.

use std::collections::HashMap;

use walle_parser::ast::{Program, Stmt, StmtKind};
use walle_source::{CodeLocation, Error};

/// Drives the statement loop of one run over a flat list of statements.
#[derive(Debug)]
pub struct ProgramController {
    /// Index of every label statement.
    labels: HashMap<String, usize>,
    /// Index of the next statement to execute.
    pc: usize,
    /// Number of statements executed so far.
    executed: usize,
    max_statements: usize,
}

impl ProgramController {
    /// Builds the jump table of `program`. Duplicate labels are an error.
    pub fn new(program: &Program, max_statements: usize) -> Result<Self, Error> {
        let mut labels = HashMap::new();
        for (index, stmt) in program.stmts.iter().enumerate() {
            if let StmtKind::Label(label) = &stmt.kind {
                if labels.insert(label.clone(), index).is_some() {
                    return Err(Error::runtime(
                        stmt.loc,
                        format!("Label '{}' is declared more than once.", label),
                    ));
                }
            }
        }

        Ok(Self {
            labels,
            pc: 0,
            executed: 0,
            max_statements,
        })
    }

    /// Returns the next statement to execute and advances the program counter, or `None` once
    /// the end of the program is reached.
    /// Fails when `max_statements` statements have already been executed.
    pub fn next_stmt<'p>(&mut self, program: &'p Program) -> Result<Option<&'p Stmt>, Error> {
        let stmt = match program.stmts.get(self.pc) {
            Some(stmt) => stmt,
            None => return Ok(None),
        };
        if self.executed >= self.max_statements {
            return Err(Error::runtime(
                stmt.loc,
                format!(
                    "Execution limit of {} statements exceeded. Check for an infinite 'GoTo' loop.",
                    self.max_statements
                ),
            ));
        }

        self.executed += 1;
        self.pc += 1;
        Ok(Some(stmt))
    }

    /// Continues execution at the statement declaring `label`.
    pub fn jump(&mut self, label: &str, loc: CodeLocation) -> Result<(), Error> {
        match self.labels.get(label) {
            Some(&index) => {
                self.pc = index;
                Ok(())
            }
            None => Err(Error::runtime(
                loc,
                format!("Label '{}' is not declared.", label),
            )),
        }
    }

    pub fn executed(&self) -> usize {
        self.executed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walle_parser::parser::Parser;
    use walle_source::Source;

    fn program(source: &str) -> Program {
        let source: Source = source.into();
        let program = Parser::new(&source).parse_program();
        assert!(source.has_no_errors(), "{}", source.errors);
        program
    }

    #[test]
    fn test_sequential() {
        let program = program("Spawn(0, 0)\nFill()\n");
        let mut controller = ProgramController::new(&program, 100).unwrap();
        assert!(matches!(
            controller.next_stmt(&program),
            Ok(Some(Stmt { kind: StmtKind::Spawn { .. }, .. }))
        ));
        assert!(matches!(
            controller.next_stmt(&program),
            Ok(Some(Stmt { kind: StmtKind::Fill, .. }))
        ));
        assert!(matches!(controller.next_stmt(&program), Ok(None)));
        assert_eq!(controller.executed(), 2);
    }

    #[test]
    fn test_jump() {
        let program = program("Spawn(0, 0)\nloop\nFill()\nGoTo[loop](1)\n");
        let mut controller = ProgramController::new(&program, 100).unwrap();
        for _ in 0..4 {
            controller.next_stmt(&program).unwrap();
        }
        controller.jump("loop", CodeLocation::new(4, 1)).unwrap();
        let stmt = controller.next_stmt(&program).unwrap().unwrap();
        assert_eq!(stmt.kind, StmtKind::Label("loop".to_string()));

        let err = controller.jump("missing", CodeLocation::new(4, 1)).unwrap_err();
        assert!(err.is_runtime());
    }

    #[test]
    fn test_execution_limit() {
        let program = program("Spawn(0, 0)\nl\nGoTo[l](1)\n");
        let mut controller = ProgramController::new(&program, 5).unwrap();
        for _ in 0..5 {
            let stmt = controller.next_stmt(&program).unwrap().unwrap();
            if let StmtKind::GoTo { label, .. } = &stmt.kind {
                controller.jump(label, stmt.loc).unwrap();
            }
        }
        let err = controller.next_stmt(&program).unwrap_err();
        assert!(err.is_runtime());
        assert_eq!(err.location(), Some(CodeLocation::new(2, 1)));
        assert_eq!(controller.executed(), 5);
    }

    #[test]
    fn test_duplicate_label() {
        let program = program("Spawn(0, 0)\na\na\n");
        let err = ProgramController::new(&program, 5).unwrap_err();
        assert_eq!(err.location(), Some(CodeLocation::new(3, 1)));
    }
}
