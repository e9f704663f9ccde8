//! Semantic checking pass.
//!
//! Infers the static type of every expression, validates command arguments and enforces the
//! structural rules of a program. Errors are appended to [`Source::errors`]; the AST is never
//! modified.

use std::collections::HashMap;

use walle_parser::ast::{BinaryOp, Expr, ExprKind, Literal, Program, Stmt, StmtKind, UnaryOp};
use walle_parser::visitor::Visitor;
use walle_source::{CodeLocation, Error, Source};
use walle_value::{Builtin, Color, ValueType};

use crate::labels::LabelCollector;

/// Static type of an expression. `None` means an error has already been reported for it, which
/// silences follow-up errors on the enclosing expression.
type Inferred = Option<ValueType>;

/// Semantic checker.
pub struct Checker<'a> {
    /// Type of the last assignment seen for every variable. Reassignment may change it.
    /// `None` if the assigned expression was already erroneous.
    symbols: HashMap<String, Inferred>,
    source: &'a Source<'a>,
}

/// Checks `program` and appends every semantic error to `source.errors`.
pub fn check_program<'a>(program: &'a Program, source: &'a Source<'a>) {
    let mut labels = LabelCollector::new(source);
    labels.visit_program(program);
    labels.resolve();

    Checker::new(source).check(program);
}

impl<'a> Checker<'a> {
    pub fn new(source: &'a Source<'a>) -> Self {
        Self {
            symbols: HashMap::new(),
            source,
        }
    }

    fn error(&self, loc: CodeLocation, message: impl ToString) {
        self.source.errors.add_error(Error::semantic(loc, message));
    }

    /// Checks the structure of the program and every statement in order.
    pub fn check(&mut self, program: &Program) {
        let starts_with_spawn = match program.stmts.first() {
            None => {
                self.error(program.loc, "Program is empty, it must start with 'Spawn'.");
                false
            }
            Some(first) if !matches!(first.kind, StmtKind::Spawn { .. }) => {
                self.error(first.loc, "Program must start with 'Spawn'.");
                false
            }
            Some(_) => true,
        };

        for (i, stmt) in program.stmts.iter().enumerate() {
            // a misplaced `Spawn` is already covered by the error above
            if i > 0 && starts_with_spawn && matches!(stmt.kind, StmtKind::Spawn { .. }) {
                self.error(
                    stmt.loc,
                    "'Spawn' can only be used once, as the first statement.",
                );
            }
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Spawn { x, y } => {
                self.check_args("Spawn", &[(x, ValueType::IntOrBool), (y, ValueType::IntOrBool)]);
            }
            StmtKind::Respawn { x, y } => {
                self.check_args(
                    "Respawn",
                    &[(x, ValueType::IntOrBool), (y, ValueType::IntOrBool)],
                );
            }
            StmtKind::Color(color) => {
                self.check_args("Color", &[(color, ValueType::Str)]);
                if let ExprKind::Literal(Literal::Str(literal)) = &color.kind {
                    if literal.parse::<Color>().is_err() {
                        self.error(color.loc, format!("Invalid color '{}'.", literal));
                    }
                }
            }
            StmtKind::Size(size) => self.check_args("Size", &[(size, ValueType::IntOrBool)]),
            StmtKind::DrawLine {
                dir_x,
                dir_y,
                distance,
            } => {
                self.check_direction(dir_x);
                self.check_direction(dir_y);
                self.check_args(
                    "DrawLine",
                    &[
                        (dir_x, ValueType::IntOrBool),
                        (dir_y, ValueType::IntOrBool),
                        (distance, ValueType::IntOrBool),
                    ],
                );
            }
            StmtKind::DrawCircle {
                dir_x,
                dir_y,
                radius,
            } => {
                self.check_direction(dir_x);
                self.check_direction(dir_y);
                self.check_args(
                    "DrawCircle",
                    &[
                        (dir_x, ValueType::IntOrBool),
                        (dir_y, ValueType::IntOrBool),
                        (radius, ValueType::IntOrBool),
                    ],
                );
            }
            StmtKind::DrawRectangle {
                dir_x,
                dir_y,
                distance,
                width,
                height,
            } => {
                self.check_direction(dir_x);
                self.check_direction(dir_y);
                self.check_args(
                    "DrawRectangle",
                    &[
                        (dir_x, ValueType::IntOrBool),
                        (dir_y, ValueType::IntOrBool),
                        (distance, ValueType::IntOrBool),
                        (width, ValueType::IntOrBool),
                        (height, ValueType::IntOrBool),
                    ],
                );
            }
            StmtKind::Fill => {}
            StmtKind::Filling(filling) => {
                self.check_args("Filling", &[(filling, ValueType::IntOrBool)])
            }
            StmtKind::Assign { ident, value } => {
                let ty = self.infer_expr(value);
                if ty == Some(ValueType::Void) {
                    self.error(
                        value.loc,
                        format!("Cannot assign a value of type Void to '{}'.", ident),
                    );
                }
                self.symbols.insert(ident.clone(), ty);
            }
            StmtKind::Label(_) => {}
            StmtKind::GoTo { label, condition } => {
                let ty = self.infer_expr(condition);
                self.expect_type(
                    ty,
                    ValueType::IntOrBool,
                    condition.loc,
                    &format!("Condition of 'GoTo[{}]'", label),
                );
            }
            StmtKind::ExprStmt(expr) => {
                self.infer_expr(expr);
            }
        }
    }

    /// Checks the arguments of a command against their expected types.
    fn check_args(&mut self, command: &str, args: &[(&Expr, ValueType)]) {
        for (i, (arg, expected)) in args.iter().enumerate() {
            let ty = self.infer_expr(arg);
            self.expect_type(
                ty,
                *expected,
                arg.loc,
                &format!("Argument {} of '{}'", i + 1, command),
            );
        }
    }

    /// Constant direction components must be `-1`, `0` or `1`.
    /// Computed components can only be checked at runtime.
    fn check_direction(&self, dir: &Expr) {
        if let Some(val) = dir.constant_int() {
            if !(-1..=1).contains(&val) {
                self.error(
                    dir.loc,
                    format!("Direction component must be -1, 0 or 1, found {}.", val),
                );
            }
        }
    }

    /// Reports an error if `found` is known and differs from `expected`.
    /// Returns `true` if the type matches.
    fn expect_type(
        &self,
        found: Inferred,
        expected: ValueType,
        loc: CodeLocation,
        role: &str,
    ) -> bool {
        match found {
            Some(found) if found != expected => {
                self.error(
                    loc,
                    format!("{} must be of type {}, found {}.", role, expected, found),
                );
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Infers the static type of `expr`, reporting every type error found inside it.
    fn infer_expr(&mut self, expr: &Expr) -> Inferred {
        match &expr.kind {
            ExprKind::Literal(Literal::Int(_)) | ExprKind::Literal(Literal::Bool(_)) => {
                Some(ValueType::IntOrBool)
            }
            ExprKind::Literal(Literal::Str(_)) => Some(ValueType::Str),
            ExprKind::Variable(ident) => match self.symbols.get(ident) {
                Some(ty) => *ty,
                None => {
                    self.error(expr.loc, format!("Undefined variable '{}'.", ident));
                    None
                }
            },
            ExprKind::Call { ident, args } => self.infer_call(ident, args, expr.loc),
            ExprKind::Group(inner) => self.infer_expr(inner),
            ExprKind::Unary { op, arg } => {
                let ty = self.infer_expr(arg);
                let symbol = match op {
                    UnaryOp::Bang => "!",
                    UnaryOp::Minus => "-",
                };
                self.expect_type(
                    ty,
                    ValueType::IntOrBool,
                    arg.loc,
                    &format!("Operand of unary '{}'", symbol),
                );
                Some(ValueType::IntOrBool)
            }
            ExprKind::Binary { lhs, op, rhs } => {
                let lhs_ty = self.infer_expr(lhs);
                let rhs_ty = self.infer_expr(rhs);
                self.infer_binary(*op, (lhs_ty, lhs), (rhs_ty, rhs), expr.loc)
            }
        }
    }

    fn infer_binary(
        &self,
        op: BinaryOp,
        (lhs_ty, lhs): (Inferred, &Expr),
        (rhs_ty, rhs): (Inferred, &Expr),
        loc: CodeLocation,
    ) -> Inferred {
        use ValueType::{IntOrBool, Str};

        match op {
            BinaryOp::Add => match (lhs_ty?, rhs_ty?) {
                (IntOrBool, IntOrBool) => Some(IntOrBool),
                (Str, _) | (_, Str) => Some(Str),
                (lhs_ty, rhs_ty) => {
                    self.error(
                        loc,
                        format!(
                            "Operator '+' cannot be applied to {} and {}.",
                            lhs_ty, rhs_ty
                        ),
                    );
                    None
                }
            },
            BinaryOp::Mul => match (lhs_ty?, rhs_ty?) {
                (IntOrBool, IntOrBool) => Some(IntOrBool),
                (Str, IntOrBool) | (IntOrBool, Str) => Some(Str),
                (lhs_ty, rhs_ty) => {
                    self.error(
                        loc,
                        format!(
                            "Operator '*' cannot be applied to {} and {}.",
                            lhs_ty, rhs_ty
                        ),
                    );
                    None
                }
            },
            BinaryOp::Eq | BinaryOp::Ne => {
                let (lhs_ty, rhs_ty) = (lhs_ty?, rhs_ty?);
                if lhs_ty != rhs_ty || lhs_ty == ValueType::Void {
                    self.error(
                        loc,
                        format!(
                            "Operands of '{}' must have the same type, found {} and {}.",
                            op.symbol(),
                            lhs_ty,
                            rhs_ty
                        ),
                    );
                    return None;
                }
                Some(IntOrBool)
            }
            BinaryOp::Sub
            | BinaryOp::Div
            | BinaryOp::Pow
            | BinaryOp::Mod
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::And
            | BinaryOp::Or => {
                let lhs_ok = self.expect_type(
                    lhs_ty,
                    IntOrBool,
                    lhs.loc,
                    &format!("Left operand of '{}'", op.symbol()),
                );
                let rhs_ok = self.expect_type(
                    rhs_ty,
                    IntOrBool,
                    rhs.loc,
                    &format!("Right operand of '{}'", op.symbol()),
                );
                if lhs_ok && rhs_ok {
                    Some(IntOrBool)
                } else {
                    None
                }
            }
        }
    }

    fn infer_call(&mut self, ident: &str, args: &[Expr], loc: CodeLocation) -> Inferred {
        let arg_types: Vec<_> = args.iter().map(|arg| self.infer_expr(arg)).collect();

        let builtin = match Builtin::from_name(ident) {
            Some(builtin) => builtin,
            None => {
                self.error(loc, format!("Unknown function '{}'.", ident));
                return None;
            }
        };

        if args.len() != builtin.arity() {
            self.error(
                loc,
                format!(
                    "Function '{}' expects {} argument(s), found {}.",
                    ident,
                    builtin.arity(),
                    args.len()
                ),
            );
        } else {
            for (i, ((arg, ty), expected)) in args
                .iter()
                .zip(arg_types)
                .zip(builtin.params().iter().copied())
                .enumerate()
            {
                self.expect_type(
                    ty,
                    expected,
                    arg.loc,
                    &format!("Argument {} of '{}'", i + 1, ident),
                );
            }
        }

        Some(builtin.return_type())
    }
}
