//! Visitor pattern for AST nodes.

use crate::ast::{Expr, ExprKind, Program, Stmt, StmtKind};

pub trait Visitor<'ast>: Sized {
    fn visit_program(&mut self, program: &'ast Program) {
        walk_program(self, program);
    }
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }
    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_program<'ast>(visitor: &mut impl Visitor<'ast>, program: &'ast Program) {
    for stmt in &program.stmts {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_expr<'ast>(visitor: &mut impl Visitor<'ast>, expr: &'ast Expr) {
    match &expr.kind {
        ExprKind::Literal(_) => {}
        ExprKind::Variable(_) => {}
        ExprKind::Call { ident: _, args } => {
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Group(inner) => visitor.visit_expr(inner),
        ExprKind::Unary { op: _, arg } => visitor.visit_expr(arg),
        ExprKind::Binary { lhs, op: _, rhs } => {
            visitor.visit_expr(lhs);
            visitor.visit_expr(rhs);
        }
    }
}

pub fn walk_stmt<'ast>(visitor: &mut impl Visitor<'ast>, stmt: &'ast Stmt) {
    // visits every argument expression of a command in order
    macro_rules! visit_args {
        ($visitor: ident, $($arg: expr),*) => {{
            $($visitor.visit_expr($arg);)*
        }};
    }

    match &stmt.kind {
        StmtKind::Spawn { x, y } | StmtKind::Respawn { x, y } => visit_args!(visitor, x, y),
        StmtKind::Color(expr) | StmtKind::Size(expr) | StmtKind::Filling(expr) => {
            visitor.visit_expr(expr)
        }
        StmtKind::DrawLine {
            dir_x,
            dir_y,
            distance,
        } => visit_args!(visitor, dir_x, dir_y, distance),
        StmtKind::DrawCircle {
            dir_x,
            dir_y,
            radius,
        } => visit_args!(visitor, dir_x, dir_y, radius),
        StmtKind::DrawRectangle {
            dir_x,
            dir_y,
            distance,
            width,
            height,
        } => visit_args!(visitor, dir_x, dir_y, distance, width, height),
        StmtKind::Fill => {}
        StmtKind::Assign { ident: _, value } => visitor.visit_expr(value),
        StmtKind::Label(_) => {}
        StmtKind::GoTo {
            label: _,
            condition,
        } => visitor.visit_expr(condition),
        StmtKind::ExprStmt(expr) => visitor.visit_expr(expr),
    }
}
