//! Tree-walking interpreter.

use std::collections::{HashMap, HashSet};

use walle_parser::ast::{BinaryOp, Expr, ExprKind, Literal, Program, Stmt, StmtKind, UnaryOp};
use walle_source::{CodeLocation, Error};
use walle_value::{Builtin, Color, IntOrBool, Value};

use crate::canvas::Canvas;
use crate::controller::ProgramController;
use crate::draw::{self, Point};
use crate::functions::{call_builtin, Context};
use crate::progress::{CancellationToken, ProgressReporter, ProgressSink};
use crate::state::WallEState;
use crate::ExecutionOptions;

/// Largest accepted circle radius.
pub const MAX_RADIUS: i64 = 1 << 20;
/// Largest string a repetition may produce, in bytes.
pub const MAX_STRING_LEN: usize = 1 << 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpretResult {
    /// The last statement was executed.
    Completed,
    /// The run was stopped through its [`CancellationToken`].
    Cancelled,
    /// The run stopped at the first runtime error.
    RuntimeError(Error),
}

/// Why the statement loop stopped early.
enum Halt {
    Cancelled,
    Error(Error),
}

impl From<Error> for Halt {
    fn from(err: Error) -> Self {
        Halt::Error(err)
    }
}

pub struct Interpreter<'a> {
    program: &'a Program,
    canvas: Canvas,
    state: WallEState,
    /// Flat global variable table.
    variables: HashMap<String, Value>,
    reporter: ProgressReporter<'a>,
    max_statements: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        program: &'a Program,
        canvas: Canvas,
        options: &ExecutionOptions,
        sink: &'a mut dyn ProgressSink,
        token: CancellationToken,
    ) -> Self {
        Self {
            program,
            canvas,
            state: WallEState::new(),
            variables: HashMap::new(),
            reporter: ProgressReporter::new(
                sink,
                options.mode,
                options.step_delay,
                options.pixel_batch,
                token,
            ),
            max_statements: options.max_statements,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn into_canvas(self) -> Canvas {
        self.canvas
    }

    pub fn state(&self) -> &WallEState {
        &self.state
    }

    pub fn variable(&self, ident: &str) -> Option<&Value> {
        self.variables.get(ident)
    }

    /// Runs the program from its first statement and reports the outcome to the progress sink.
    /// The canvas keeps every pixel written before the run stopped.
    pub fn run(&mut self) -> InterpretResult {
        self.state = WallEState::new();
        self.variables.clear();

        let result = match self.run_stmts() {
            Ok(()) => InterpretResult::Completed,
            Err(Halt::Cancelled) => InterpretResult::Cancelled,
            Err(Halt::Error(err)) => InterpretResult::RuntimeError(err),
        };

        match &result {
            InterpretResult::Completed => self.reporter.complete(&self.canvas, "Execution completed"),
            InterpretResult::Cancelled => self.reporter.complete(&self.canvas, "Execution cancelled"),
            InterpretResult::RuntimeError(err) => self.reporter.error(&self.canvas, vec![err.clone()]),
        }
        result
    }

    fn run_stmts(&mut self) -> Result<(), Halt> {
        let program = self.program;
        let mut controller = ProgramController::new(program, self.max_statements)?;

        loop {
            if self.reporter.is_cancelled() {
                return Err(Halt::Cancelled);
            }
            let stmt = match controller.next_stmt(program)? {
                Some(stmt) => stmt,
                None => return Ok(()),
            };

            self.exec_stmt(stmt, &mut controller)?;
            if stmt.is_drawing() {
                self.reporter.step(&self.canvas, format!("Executed {}", stmt));
            }
        }
    }

    /* Statements */
    fn exec_stmt(&mut self, stmt: &Stmt, controller: &mut ProgramController) -> Result<(), Halt> {
        match &stmt.kind {
            StmtKind::Spawn { x, y } => self.exec_move("Spawn", x, y)?,
            StmtKind::Respawn { x, y } => self.exec_move("Respawn", x, y)?,
            StmtKind::Color(color) => {
                let literal = self.eval_str(color, "argument 1 of 'Color'")?;
                self.state.color = literal
                    .parse::<Color>()
                    .map_err(|_| Error::runtime(color.loc, format!("Invalid color '{}'.", literal)))?;
            }
            StmtKind::Size(size) => {
                let size = self.eval_int(size, "argument 1 of 'Size'")?;
                self.state.set_brush_size(size);
            }
            StmtKind::DrawLine {
                dir_x,
                dir_y,
                distance,
            } => {
                let dir = self.eval_direction("DrawLine", dir_x, dir_y)?;
                let distance = self.eval_int(distance, "argument 3 of 'DrawLine'")?;
                check_distance("Line", dir, distance, stmt.loc)?;

                let start = (self.state.x, self.state.y);
                let end = if distance > 0 {
                    offset(start, dir, distance - 1, stmt.loc)?
                } else {
                    start
                };
                let size = self.state.brush_size();
                let points = draw::line(&self.canvas, start, dir, distance, size);
                self.paint(points, size)?;
                self.state.move_to(end.0, end.1);
            }
            StmtKind::DrawCircle {
                dir_x,
                dir_y,
                radius,
            } => {
                let dir = self.eval_direction("DrawCircle", dir_x, dir_y)?;
                let radius = self.eval_int(radius, "argument 3 of 'DrawCircle'")?;
                if radius <= 0 || radius > MAX_RADIUS {
                    return Err(Error::runtime(
                        stmt.loc,
                        format!(
                            "Circle radius must be between 1 and {}, found {}.",
                            MAX_RADIUS, radius
                        ),
                    )
                    .into());
                }

                let center = offset((self.state.x, self.state.y), dir, radius, stmt.loc)?;
                if self.state.filling {
                    let points = draw::circle_filled(&self.canvas, center, radius);
                    self.paint(points, 1)?;
                } else {
                    let points = draw::circle_outline(center, radius);
                    self.paint(points, self.state.brush_size())?;
                }
                self.state.move_to(center.0, center.1);
            }
            StmtKind::DrawRectangle {
                dir_x,
                dir_y,
                distance,
                width,
                height,
            } => {
                let dir = self.eval_direction("DrawRectangle", dir_x, dir_y)?;
                let distance = self.eval_int(distance, "argument 3 of 'DrawRectangle'")?;
                let width = self.eval_int(width, "argument 4 of 'DrawRectangle'")?;
                let height = self.eval_int(height, "argument 5 of 'DrawRectangle'")?;
                check_distance("Rectangle", dir, distance, stmt.loc)?;
                if width <= 0 || height <= 0 {
                    return Err(Error::runtime(
                        stmt.loc,
                        format!(
                            "Rectangle width and height must be positive, found {}x{}.",
                            width, height
                        ),
                    )
                    .into());
                }

                let top_left = offset((self.state.x, self.state.y), dir, distance, stmt.loc)?;
                if self.state.filling {
                    let points = draw::rectangle_filled(&self.canvas, top_left, width, height);
                    self.paint(points, 1)?;
                } else {
                    let size = self.state.brush_size();
                    let points =
                        draw::rectangle_outline(&self.canvas, top_left, width, height, size);
                    self.paint(points, size)?;
                }
                self.state.move_to(top_left.0, top_left.1);
            }
            StmtKind::Fill => {
                let region =
                    draw::flood_region(&self.canvas, (self.state.x, self.state.y), self.state.color);
                self.paint(region, 1)?;
            }
            StmtKind::Filling(filling) => {
                self.state.filling = self.eval_int_or_bool(filling, "argument 1 of 'Filling'")?.as_bool();
            }
            StmtKind::Assign { ident, value } => {
                let value = self.eval(value)?;
                self.variables.insert(ident.clone(), value);
            }
            StmtKind::Label(_) => {}
            StmtKind::GoTo { label, condition } => {
                let condition = self.eval_int_or_bool(condition, "condition of 'GoTo'")?;
                if condition.as_bool() {
                    controller.jump(label, stmt.loc)?;
                }
            }
            StmtKind::ExprStmt(expr) => {
                self.eval(expr)?;
            }
        }
        Ok(())
    }

    /// Moves the pen to a position that must lie on the canvas.
    fn exec_move(&mut self, command: &str, x: &Expr, y: &Expr) -> Result<(), Error> {
        let px = self.eval_int(x, &format!("argument 1 of '{}'", command))?;
        let py = self.eval_int(y, &format!("argument 2 of '{}'", command))?;
        if !self.canvas.in_bounds(px, py) {
            return Err(Error::runtime(
                x.loc,
                format!(
                    "Position ({}, {}) is outside the {}x{} canvas.",
                    px,
                    py,
                    self.canvas.width(),
                    self.canvas.height()
                ),
            ));
        }
        self.state.move_to(px, py);
        Ok(())
    }

    /// Writes `points` with the current color, stamping a brush of `size` on each of them.
    /// A pixel covered by several stamps is blended once per statement.
    /// Checks for cancellation before every pixel.
    fn paint(&mut self, points: Vec<Point>, size: i64) -> Result<(), Halt> {
        let color = self.state.color;
        let mut painted = HashSet::new();
        for (x, y) in points {
            for (px, py) in draw::stamp(x, y, size) {
                if !self.canvas.in_bounds(px, py) || !painted.insert((px, py)) {
                    continue;
                }
                if self.reporter.is_cancelled() {
                    return Err(Halt::Cancelled);
                }
                if self.canvas.blend(px, py, color) {
                    self.reporter.pixel(&self.canvas);
                }
            }
        }
        Ok(())
    }

    fn eval_direction(&self, command: &str, dir_x: &Expr, dir_y: &Expr) -> Result<Point, Error> {
        let mut dir = [0; 2];
        for (i, expr) in [dir_x, dir_y].iter().enumerate() {
            let val = self.eval_int(expr, &format!("argument {} of '{}'", i + 1, command))?;
            if !(-1..=1).contains(&val) {
                return Err(Error::runtime(
                    expr.loc,
                    format!("Direction component must be -1, 0 or 1, found {}.", val),
                ));
            }
            dir[i] = val;
        }
        Ok((dir[0], dir[1]))
    }

    /* Expressions */
    fn eval_int_or_bool(&self, expr: &Expr, role: &str) -> Result<IntOrBool, Error> {
        let value = self.eval(expr)?;
        expect_int_or_bool(value, role, expr.loc)
    }

    fn eval_int(&self, expr: &Expr, role: &str) -> Result<i64, Error> {
        Ok(self.eval_int_or_bool(expr, role)?.as_int())
    }

    fn eval_str(&self, expr: &Expr, role: &str) -> Result<String, Error> {
        match self.eval(expr)? {
            Value::Str(val) => Ok(val),
            Value::IntOrBool(_) => Err(Error::runtime(
                expr.loc,
                format!("Expected string for {}, got integer.", role),
            )),
        }
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value, Error> {
        match &expr.kind {
            ExprKind::Literal(Literal::Int(val)) => Ok(Value::int(*val)),
            ExprKind::Literal(Literal::Bool(val)) => Ok(Value::bool(*val)),
            ExprKind::Literal(Literal::Str(val)) => Ok(Value::Str(val.clone())),
            ExprKind::Variable(ident) => self.variables.get(ident).cloned().ok_or_else(|| {
                Error::runtime(expr.loc, format!("Undefined variable '{}'.", ident))
            }),
            ExprKind::Call { ident, args } => {
                let builtin = Builtin::from_name(ident).ok_or_else(|| {
                    Error::runtime(expr.loc, format!("Unknown function '{}'.", ident))
                })?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                let ctx = Context {
                    canvas: &self.canvas,
                    state: &self.state,
                };
                call_builtin(builtin, &args, &ctx, expr.loc)
            }
            ExprKind::Group(inner) => self.eval(inner),
            ExprKind::Unary { op, arg } => match op {
                UnaryOp::Bang => {
                    let val = self.eval_int_or_bool(arg, "operand of '!'")?;
                    Ok(Value::bool(!val.as_bool()))
                }
                UnaryOp::Minus => {
                    let val = self.eval_int(arg, "operand of '-'")?;
                    let val = val.checked_neg().ok_or_else(|| overflow("-", expr.loc))?;
                    Ok(Value::int(val))
                }
            },
            ExprKind::Binary { lhs, op, rhs } => self.eval_binary(lhs, *op, rhs, expr.loc),
        }
    }

    fn eval_binary(&self, lhs: &Expr, op: BinaryOp, rhs: &Expr, loc: CodeLocation) -> Result<Value, Error> {
        let symbol = op.symbol();
        match op {
            BinaryOp::And | BinaryOp::Or => {
                let left = self
                    .eval_int_or_bool(lhs, &format!("left operand of '{}'", symbol))?
                    .as_bool();
                // short-circuit
                if left == (op == BinaryOp::Or) {
                    return Ok(Value::bool(left));
                }
                let right = self
                    .eval_int_or_bool(rhs, &format!("right operand of '{}'", symbol))?
                    .as_bool();
                Ok(Value::bool(right))
            }
            BinaryOp::Add => match (self.eval(lhs)?, self.eval(rhs)?) {
                (Value::IntOrBool(a), Value::IntOrBool(b)) => a
                    .as_int()
                    .checked_add(b.as_int())
                    .map(Value::int)
                    .ok_or_else(|| overflow(symbol, loc)),
                (left, right) => Ok(Value::Str(format!("{}{}", left, right))),
            },
            BinaryOp::Mul => match (self.eval(lhs)?, self.eval(rhs)?) {
                (Value::IntOrBool(a), Value::IntOrBool(b)) => a
                    .as_int()
                    .checked_mul(b.as_int())
                    .map(Value::int)
                    .ok_or_else(|| overflow(symbol, loc)),
                (Value::Str(s), Value::IntOrBool(count)) | (Value::IntOrBool(count), Value::Str(s)) => {
                    repeat(&s, count.as_int(), loc)
                }
                (Value::Str(_), Value::Str(_)) => Err(Error::runtime(
                    rhs.loc,
                    "Expected integer for right operand of '*', got string.",
                )),
            },
            BinaryOp::Eq | BinaryOp::Ne => {
                let equal = match (self.eval(lhs)?, self.eval(rhs)?) {
                    (Value::IntOrBool(a), Value::IntOrBool(b)) => a == b,
                    (Value::Str(a), Value::Str(b)) => a == b,
                    (left, right) => {
                        return Err(Error::runtime(
                            loc,
                            format!(
                                "Cannot compare {} and {} with '{}'.",
                                type_name(&left),
                                type_name(&right),
                                symbol
                            ),
                        ))
                    }
                };
                Ok(Value::bool(equal == (op == BinaryOp::Eq)))
            }
            BinaryOp::Sub => {
                let (a, b) = self.eval_int_operands(lhs, rhs, symbol)?;
                a.checked_sub(b).map(Value::int).ok_or_else(|| overflow(symbol, loc))
            }
            BinaryOp::Div => {
                let (a, b) = self.eval_int_operands(lhs, rhs, symbol)?;
                if b == 0 {
                    return Err(Error::runtime(rhs.loc, "Division by zero."));
                }
                a.checked_div(b).map(Value::int).ok_or_else(|| overflow(symbol, loc))
            }
            BinaryOp::Mod => {
                let (a, b) = self.eval_int_operands(lhs, rhs, symbol)?;
                if b == 0 {
                    return Err(Error::runtime(rhs.loc, "Modulo by zero."));
                }
                a.checked_rem(b).map(Value::int).ok_or_else(|| overflow(symbol, loc))
            }
            BinaryOp::Pow => {
                let (a, b) = self.eval_int_operands(lhs, rhs, symbol)?;
                pow(a, b, rhs.loc, loc).map(Value::int)
            }
            BinaryOp::Gt => {
                let (a, b) = self.eval_int_operands(lhs, rhs, symbol)?;
                Ok(Value::bool(a > b))
            }
            BinaryOp::Ge => {
                let (a, b) = self.eval_int_operands(lhs, rhs, symbol)?;
                Ok(Value::bool(a >= b))
            }
            BinaryOp::Lt => {
                let (a, b) = self.eval_int_operands(lhs, rhs, symbol)?;
                Ok(Value::bool(a < b))
            }
            BinaryOp::Le => {
                let (a, b) = self.eval_int_operands(lhs, rhs, symbol)?;
                Ok(Value::bool(a <= b))
            }
        }
    }

    fn eval_int_operands(&self, lhs: &Expr, rhs: &Expr, symbol: &str) -> Result<(i64, i64), Error> {
        let a = self.eval_int(lhs, &format!("left operand of '{}'", symbol))?;
        let b = self.eval_int(rhs, &format!("right operand of '{}'", symbol))?;
        Ok((a, b))
    }
}

fn expect_int_or_bool(value: Value, role: &str, loc: CodeLocation) -> Result<IntOrBool, Error> {
    match value {
        Value::IntOrBool(val) => Ok(val),
        Value::Str(_) => Err(Error::runtime(
            loc,
            format!("Expected integer for {}, got string.", role),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::IntOrBool(_) => "integer",
        Value::Str(_) => "string",
    }
}

fn overflow(symbol: &str, loc: CodeLocation) -> Error {
    Error::runtime(loc, format!("Integer overflow in '{}'.", symbol))
}

fn pow(base: i64, exp: i64, exp_loc: CodeLocation, loc: CodeLocation) -> Result<i64, Error> {
    if exp < 0 {
        return Err(Error::runtime(
            exp_loc,
            format!("Negative exponent {} in '**'.", exp),
        ));
    }
    match u32::try_from(exp) {
        Ok(exp) => base.checked_pow(exp).ok_or_else(|| overflow("**", loc)),
        Err(_) => match base {
            0 | 1 => Ok(base),
            -1 if exp % 2 == 0 => Ok(1),
            -1 => Ok(-1),
            _ => Err(overflow("**", loc)),
        },
    }
}

fn repeat(s: &str, count: i64, loc: CodeLocation) -> Result<Value, Error> {
    let count = usize::try_from(count).map_err(|_| {
        Error::runtime(
            loc,
            format!("Cannot repeat a string a negative number of times ({}).", count),
        )
    })?;
    match s.len().checked_mul(count) {
        Some(len) if len <= MAX_STRING_LEN => Ok(Value::Str(s.repeat(count))),
        _ => Err(Error::runtime(
            loc,
            format!("String repetition result is longer than {} bytes.", MAX_STRING_LEN),
        )),
    }
}

/// Lines and rectangles cannot have a negative distance, nor a non-zero distance without a direction.
fn check_distance(shape: &str, dir: Point, distance: i64, loc: CodeLocation) -> Result<(), Error> {
    if distance < 0 {
        return Err(Error::runtime(
            loc,
            format!("{} distance must not be negative, found {}.", shape, distance),
        ));
    }
    if dir == (0, 0) && distance != 0 {
        return Err(Error::runtime(
            loc,
            "Direction (0, 0) cannot be used with a non-zero distance.",
        ));
    }
    Ok(())
}

/// `start + dir * distance`, failing on overflow.
fn offset((x, y): Point, (dir_x, dir_y): Point, distance: i64, loc: CodeLocation) -> Result<Point, Error> {
    let moved = |start: i64, dir: i64| dir.checked_mul(distance).and_then(|d| start.checked_add(d));
    match (moved(x, dir_x), moved(y, dir_y)) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(Error::runtime(loc, "Pen position overflows.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{DrawingUpdate, ExecutionMode, UpdateKind};
    use std::time::Duration;
    use walle_parser::parser::Parser;
    use walle_source::Source;

    const BLUE: Color = Color::rgb(0, 0, 255);
    const RED: Color = Color::rgb(255, 0, 0);

    fn parse(source: &str) -> Program {
        let source: Source = source.into();
        let program = Parser::new(&source).parse_program();
        assert!(source.has_no_errors(), "{}", source.errors);
        program
    }

    struct Run {
        result: InterpretResult,
        canvas: Canvas,
        state: WallEState,
        variables: HashMap<String, Value>,
    }

    fn run_with(source: &str, options: &ExecutionOptions, sink: &mut dyn ProgressSink, token: CancellationToken) -> Run {
        let program = parse(source);
        let canvas = Canvas::new(options.width, options.height);
        let mut interpreter = Interpreter::new(&program, canvas, options, sink, token);
        let result = interpreter.run();
        Run {
            result,
            state: interpreter.state().clone(),
            variables: interpreter.variables.clone(),
            canvas: interpreter.into_canvas(),
        }
    }

    fn run(source: &str) -> Run {
        let options = ExecutionOptions {
            width: 10,
            height: 10,
            ..ExecutionOptions::default()
        };
        run_with(source, &options, &mut |_: DrawingUpdate| {}, CancellationToken::new())
    }

    fn runtime_error(source: &str) -> Error {
        match run(source).result {
            InterpretResult::RuntimeError(err) => err,
            other => panic!("expected a runtime error, got {:?}", other),
        }
    }

    #[test]
    fn test_circle_outline() {
        let run = run("Spawn(0, 0)\nColor(\"blue\")\nDrawCircle(0, 0, 3)\n");
        assert_eq!(run.result, InterpretResult::Completed);
        for &(x, y) in &[(3, 0), (0, 3), (1, 3), (3, 1), (2, 2)] {
            assert_eq!(run.canvas.get(x, y), BLUE, "({}, {})", x, y);
        }
        assert_eq!(run.canvas.get(0, 0), Color::WHITE);
        assert_eq!(run.canvas.count(BLUE, 0, 0, 10, 10), 5);
        assert_eq!((run.state.x, run.state.y), (0, 0));
    }

    #[test]
    fn test_circle_moves_pen_to_center() {
        let run = run("Spawn(1, 1)\nFilling(true)\nDrawCircle(1, 1, 2)\n");
        assert_eq!((run.state.x, run.state.y), (3, 3));
        assert_eq!(run.canvas.count(Color::BLACK, 0, 0, 10, 10), 13);
    }

    #[test]
    fn test_draw_line() {
        let run = run("Spawn(0, 0)\nDrawLine(1, 0, 5)\n");
        assert_eq!(run.result, InterpretResult::Completed);
        assert_eq!(run.canvas.count(Color::BLACK, 0, 0, 5, 1), 5);
        assert_eq!(run.canvas.count(Color::BLACK, 0, 0, 10, 10), 5);
        assert_eq!((run.state.x, run.state.y), (4, 0));

        let run = self::run("Spawn(5, 5)\nDrawLine(0, 0, 0)\n");
        assert_eq!(run.result, InterpretResult::Completed);
        assert_eq!(run.canvas.count(Color::BLACK, 0, 0, 10, 10), 0);
        assert_eq!((run.state.x, run.state.y), (5, 5));
    }

    #[test]
    fn test_brush_size() {
        let run = run("Spawn(2, 2)\nSize(4)\nDrawLine(1, 0, 1)\n");
        assert_eq!(run.state.brush_size(), 3);
        assert_eq!(run.canvas.count(Color::BLACK, 0, 0, 10, 10), 9);
        assert_eq!(run.canvas.count(Color::BLACK, 1, 1, 3, 3), 9);
    }

    #[test]
    fn test_line_leaves_canvas() {
        let run = run("Spawn(8, 0)\nDrawLine(1, 0, 5)\n");
        assert_eq!(run.result, InterpretResult::Completed);
        assert_eq!(run.canvas.count(Color::BLACK, 0, 0, 10, 10), 2);
        assert_eq!((run.state.x, run.state.y), (12, 0));
    }

    #[test]
    fn test_rectangle() {
        let run = run("Spawn(0, 0)\nDrawRectangle(1, 1, 2, 3, 2)\n");
        assert_eq!(run.result, InterpretResult::Completed);
        assert_eq!((run.state.x, run.state.y), (2, 2));
        assert_eq!(run.canvas.count(Color::BLACK, 2, 2, 3, 2), 6);
        assert_eq!(run.canvas.count(Color::BLACK, 0, 0, 10, 10), 6);

        let run = self::run("Spawn(0, 0)\nSize(3)\nFilling(1)\nDrawRectangle(0, 0, 0, 4, 4)\n");
        assert_eq!(run.canvas.count(Color::BLACK, 0, 0, 10, 10), 16);
    }

    #[test]
    fn test_fill() {
        let run = run(
            "Spawn(4, 0)\nDrawLine(0, 1, 10)\nRespawn(0, 0)\nColor(\"red\")\nFill()\n",
        );
        assert_eq!(run.result, InterpretResult::Completed);
        assert_eq!(run.canvas.count(RED, 0, 0, 10, 10), 40);
        assert_eq!(run.canvas.count(RED, 0, 0, 4, 10), 40);
        assert_eq!(run.canvas.count(Color::BLACK, 0, 0, 10, 10), 10);
        assert_eq!(run.canvas.count(Color::WHITE, 5, 0, 5, 10), 50);
    }

    #[test]
    fn test_transparent_colors_blend() {
        let run = run("Spawn(0, 0)\nColor(\"#80000000\")\nDrawLine(1, 0, 1)\nColor(\"transparent\")\nDrawLine(0, 1, 2)\n");
        assert_eq!(run.canvas.get(0, 0), Color::rgba(127, 127, 127, 255));
        assert_eq!(run.canvas.get(0, 1), Color::WHITE);
    }

    #[test]
    fn test_wide_brush_blends_each_pixel_once() {
        let line = run("Spawn(5, 5)\nColor(\"#80000000\")\nSize(3)\nDrawLine(1, 0, 3)\n");
        let gray = Color::rgba(127, 127, 127, 255);
        assert_eq!(line.canvas.count(gray, 4, 4, 5, 3), 15);
        assert_eq!(line.canvas.count(gray, 0, 0, 10, 10), 15);

        // separate statements still blend again
        let twice = run("Spawn(5, 5)\nColor(\"#80000000\")\nSize(3)\nDrawLine(1, 0, 1)\nDrawLine(1, 0, 1)\n");
        assert_eq!(twice.canvas.get(5, 5), Color::rgba(63, 63, 63, 255));
    }

    #[test]
    fn test_goto_skips_statements() {
        let run = run("Spawn(0, 0)\nGoTo[Skip](1)\nColor(\"red\")\nLabel Skip\nDrawLine(1, 0, 1)\n");
        assert_eq!(run.result, InterpretResult::Completed);
        assert_eq!(run.canvas.get(0, 0), Color::BLACK);
        assert_eq!(run.state.color, Color::BLACK);
    }

    #[test]
    fn test_loop() {
        let run = run(
            "Spawn(0, 0)\ni <- 0\nloop\nDrawLine(0, 1, 1)\nRespawn(GetActualX() + 1, 0)\ni <- i + 1\nGoTo[loop](i < 5)\n",
        );
        assert_eq!(run.result, InterpretResult::Completed);
        assert_eq!(run.variables["i"], Value::int(5));
        assert_eq!(run.canvas.count(Color::BLACK, 0, 0, 10, 1), 5);
    }

    #[test]
    fn test_execution_limit() {
        let err = runtime_error("Spawn(0, 0)\nLabel L\nGoTo[L](1)\n");
        assert!(err.message().starts_with("Execution limit of 10000 statements exceeded."));
        // the statement that would have been the 10001st
        assert_eq!(err.location(), Some(CodeLocation::new(3, 1)));
    }

    #[test]
    fn test_runtime_error_keeps_partial_canvas() {
        let run = run("Spawn(0, 0)\nDrawLine(1, 0, 3)\nx <- 1 / 0\nDrawLine(0, 1, 3)\n");
        match run.result {
            InterpretResult::RuntimeError(err) => {
                assert_eq!(err.to_string(), "[3:10] Runtime error: Division by zero.")
            }
            other => panic!("expected a runtime error, got {:?}", other),
        }
        assert_eq!(run.canvas.count(Color::BLACK, 0, 0, 10, 10), 3);
    }

    #[test]
    fn test_expressions() {
        let run = run(
            "Spawn(0, 0)
a <- 7 / 2 + 7 % 3 * 2 ** 3
b <- \"n=\" + 5 + true
c <- 2 * \"ab\"
d <- true == 1
e <- \"x\" != \"y\"
f <- -2 ** 2
g <- !0 and 3 > 2
h <- -7 / 2
",
        );
        assert_eq!(run.result, InterpretResult::Completed);
        let var = |name: &str| run.variables[name].clone();
        assert_eq!(var("a"), Value::int(11));
        assert_eq!(var("b"), Value::Str("n=5true".to_string()));
        assert_eq!(var("c"), Value::Str("abab".to_string()));
        assert_eq!(var("d"), Value::bool(true));
        assert_eq!(var("e"), Value::bool(true));
        assert_eq!(var("f"), Value::int(4));
        assert_eq!(var("g"), Value::bool(true));
        assert_eq!(var("h"), Value::int(-3));
    }

    #[test]
    fn test_short_circuit() {
        let run = run("Spawn(0, 0)\nx <- 0 and 1 / 0\ny <- 1 or Unknown()\n");
        assert_eq!(run.result, InterpretResult::Completed);
        assert_eq!(run.variables["x"], Value::bool(false));
        assert_eq!(run.variables["y"], Value::bool(true));
    }

    #[test]
    fn test_runtime_errors() {
        let message = |source: &str| runtime_error(source).message().to_string();
        assert_eq!(message("Spawn(10, 0)"), "Position (10, 0) is outside the 10x10 canvas.");
        assert_eq!(message("Spawn(0, 0)\nRespawn(0, -1)"), "Position (0, -1) is outside the 10x10 canvas.");
        assert_eq!(message("Spawn(0, 0)\nColor(\"nope\")"), "Invalid color 'nope'.");
        assert_eq!(message("Spawn(0, 0)\nx <- y"), "Undefined variable 'y'.");
        assert_eq!(message("Spawn(0, 0)\nx <- Foo()"), "Unknown function 'Foo'.");
        assert_eq!(message("Spawn(0, 0)\nx <- 1 % 0"), "Modulo by zero.");
        assert_eq!(message("Spawn(0, 0)\nx <- 2 ** -1"), "Negative exponent -1 in '**'.");
        assert_eq!(message("Spawn(0, 0)\nx <- 2 ** 63"), "Integer overflow in '**'.");
        assert_eq!(message("Spawn(0, 0)\nx <- \"a\" * -1"), "Cannot repeat a string a negative number of times (-1).");
        assert_eq!(message("Spawn(0, 0)\nx <- \"a\" - 1"), "Expected integer for left operand of '-', got string.");
        assert_eq!(message("Spawn(0, 0)\nx <- 1 == \"1\""), "Cannot compare integer and string with '=='.");
        assert_eq!(message("Spawn(0, 0)\nd <- 2\nDrawLine(d, 0, 1)"), "Direction component must be -1, 0 or 1, found 2.");
        assert_eq!(message("Spawn(0, 0)\nDrawLine(1, 0, -1)"), "Line distance must not be negative, found -1.");
        assert_eq!(message("Spawn(0, 0)\nDrawLine(0, 0, 3)"), "Direction (0, 0) cannot be used with a non-zero distance.");
        assert_eq!(message("Spawn(0, 0)\nDrawCircle(1, 0, 0)"), "Circle radius must be between 1 and 1048576, found 0.");
        assert_eq!(message("Spawn(0, 0)\nDrawRectangle(1, 0, 1, 0, 2)"), "Rectangle width and height must be positive, found 0x2.");
        assert_eq!(message("Spawn(0, 0)\nGoTo[nowhere](1)"), "Label 'nowhere' is not declared.");
        assert_eq!(message("Spawn(0, 0)\nx <- GetRandomInt(5, 1)"), "'GetRandomInt' needs min <= max, found min = 5 and max = 1.");
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let mut updates = Vec::new();
        let run = run_with(
            "Spawn(0, 0)\nDrawLine(1, 0, 5)\n",
            &ExecutionOptions::default(),
            &mut |update: DrawingUpdate| updates.push(update),
            token,
        );
        assert_eq!(run.result, InterpretResult::Cancelled);
        assert_eq!(run.canvas, Canvas::new(64, 64));
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].kind, UpdateKind::Complete);
        assert_eq!(updates[0].message.as_deref(), Some("Execution cancelled"));
    }

    #[test]
    fn test_cancelled_while_drawing() {
        let token = CancellationToken::new();
        let sink_token = token.clone();
        let options = ExecutionOptions {
            width: 10,
            height: 10,
            mode: ExecutionMode::PixelByPixel,
            ..ExecutionOptions::default()
        };
        let mut pixel_updates = 0;
        let run = run_with(
            "Spawn(0, 0)\nDrawLine(1, 0, 5)\nDrawLine(0, 1, 5)\n",
            &options,
            &mut |update: DrawingUpdate| {
                if update.kind == UpdateKind::Pixel {
                    pixel_updates += 1;
                    if pixel_updates == 3 {
                        sink_token.cancel();
                    }
                }
            },
            token,
        );
        assert_eq!(run.result, InterpretResult::Cancelled);
        assert_eq!(run.canvas.count(Color::BLACK, 0, 0, 10, 10), 3);
        assert_eq!(pixel_updates, 3);
    }

    #[test]
    fn test_step_updates() {
        let options = ExecutionOptions {
            width: 10,
            height: 10,
            mode: ExecutionMode::StepByStep,
            step_delay: Duration::from_millis(1),
            ..ExecutionOptions::default()
        };
        let mut kinds = Vec::new();
        let run = run_with(
            "Spawn(0, 0)\nDrawLine(1, 0, 2)\nColor(\"red\")\nFill()\nx <- 1\n",
            &options,
            &mut |update: DrawingUpdate| kinds.push(update.kind),
            CancellationToken::new(),
        );
        assert_eq!(run.result, InterpretResult::Completed);
        assert_eq!(
            kinds,
            vec![UpdateKind::Step, UpdateKind::Step, UpdateKind::Complete]
        );
    }

    #[test]
    fn test_error_update() {
        let mut updates = Vec::new();
        let options = ExecutionOptions {
            width: 10,
            height: 10,
            ..ExecutionOptions::default()
        };
        run_with(
            "Spawn(0, 0)\nColor(\"nope\")\n",
            &options,
            &mut |update: DrawingUpdate| updates.push(update),
            CancellationToken::new(),
        );
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].kind, UpdateKind::Error);
        assert_eq!(updates[0].errors.len(), 1);
        assert!(updates[0].errors[0].is_runtime());
    }
}
