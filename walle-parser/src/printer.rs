//! S-expression rendering of AST nodes, used by the `walle ast` command and by snapshot tests.

use crate::ast::{Expr, ExprKind, Literal, Program, Stmt, StmtKind, UnaryOp};
use std::fmt;

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(val) => write!(f, "{}", val),
            Literal::Bool(val) => write!(f, "{}", val),
            Literal::Str(val) => write!(f, "\"{}\"", val),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Bang => "!",
            UnaryOp::Minus => "-",
        })
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(literal) => write!(f, "{}", literal),
            ExprKind::Variable(ident) => f.write_str(ident),
            ExprKind::Call { ident, args } => {
                write!(f, "(call {}", ident)?;
                write_args(f, args.iter())?;
                f.write_str(")")
            }
            ExprKind::Group(inner) => write!(f, "(group {})", inner),
            ExprKind::Unary { op, arg } => write!(f, "({} {})", op, arg),
            ExprKind::Binary { lhs, op, rhs } => write!(f, "({} {} {})", op.symbol(), lhs, rhs),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, args): (&str, Vec<&Expr>) = match &self.kind {
            StmtKind::Spawn { x, y } => ("Spawn", vec![x, y]),
            StmtKind::Respawn { x, y } => ("Respawn", vec![x, y]),
            StmtKind::Color(color) => ("Color", vec![color]),
            StmtKind::Size(size) => ("Size", vec![size]),
            StmtKind::DrawLine {
                dir_x,
                dir_y,
                distance,
            } => ("DrawLine", vec![dir_x, dir_y, distance]),
            StmtKind::DrawCircle {
                dir_x,
                dir_y,
                radius,
            } => ("DrawCircle", vec![dir_x, dir_y, radius]),
            StmtKind::DrawRectangle {
                dir_x,
                dir_y,
                distance,
                width,
                height,
            } => ("DrawRectangle", vec![dir_x, dir_y, distance, width, height]),
            StmtKind::Fill => ("Fill", Vec::new()),
            StmtKind::Filling(filling) => ("Filling", vec![filling]),
            StmtKind::Assign { ident, value } => return write!(f, "(<- {} {})", ident, value),
            StmtKind::Label(label) => return write!(f, "(label {})", label),
            StmtKind::GoTo { label, condition } => {
                return write!(f, "(GoTo {} {})", label, condition)
            }
            StmtKind::ExprStmt(expr) => return write!(f, "{}", expr),
        };

        write!(f, "({}", name)?;
        write_args(f, args.into_iter())?;
        f.write_str(")")
    }
}

impl fmt::Display for Program {
    /// One statement per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stmt) in self.stmts.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

fn write_args<'e>(f: &mut fmt::Formatter<'_>, args: impl Iterator<Item = &'e Expr>) -> fmt::Result {
    for arg in args {
        write!(f, " {}", arg)?;
    }
    Ok(())
}
