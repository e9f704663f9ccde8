//! Built-in query functions. None of them has side effects on the canvas or the pen.

use rand::Rng;
use walle_source::{CodeLocation, Error};
use walle_value::{Builtin, Color, Value};

use crate::canvas::Canvas;
use crate::state::WallEState;

/// Everything a built-in function may observe.
pub struct Context<'a> {
    pub canvas: &'a Canvas,
    pub state: &'a WallEState,
}

/// Calls `builtin` with already evaluated `args`.
pub fn call_builtin(
    builtin: Builtin,
    args: &[Value],
    ctx: &Context,
    loc: CodeLocation,
) -> Result<Value, Error> {
    if args.len() != builtin.arity() {
        return Err(Error::runtime(
            loc,
            format!(
                "Function '{}' expects {} argument(s), found {}.",
                builtin.name(),
                builtin.arity(),
                args.len()
            ),
        ));
    }
    let args = Args {
        builtin,
        args,
        loc,
    };

    let value = match builtin {
        Builtin::GetActualX => Value::int(ctx.state.x),
        Builtin::GetActualY => Value::int(ctx.state.y),
        Builtin::GetCanvasSize => Value::int(ctx.canvas.width() as i64),
        Builtin::IsBrushColor => Value::bool(args.color(0)? == ctx.state.color),
        Builtin::IsBrushSize => Value::bool(args.int(0)? == ctx.state.brush_size()),
        Builtin::IsCanvasColor => {
            let color = args.color(0)?;
            let (x, y) = (args.int(1)?, args.int(2)?);
            Value::bool(ctx.canvas.in_bounds(x, y) && ctx.canvas.get(x, y) == color)
        }
        // (x, y) is the top-left corner and (w, h) the extent: counts `[x, x + w) x [y, y + h)`
        // clipped to the canvas, so a region hanging off the canvas only counts what is on it
        // and a zero or negative extent counts nothing.
        Builtin::GetColorCount => {
            let color = args.color(0)?;
            let count = ctx.canvas.count(
                color,
                args.int(1)?,
                args.int(2)?,
                args.int(3)?,
                args.int(4)?,
            );
            Value::int(count as i64)
        }
        Builtin::GetRandomInt => {
            let (min, max) = (args.int(0)?, args.int(1)?);
            if min > max {
                return Err(Error::runtime(
                    loc,
                    format!(
                        "'GetRandomInt' needs min <= max, found min = {} and max = {}.",
                        min, max
                    ),
                ));
            }
            Value::int(rand::thread_rng().gen_range(min..=max))
        }
    };
    Ok(value)
}

/// Typed access to call arguments.
struct Args<'a> {
    builtin: Builtin,
    args: &'a [Value],
    loc: CodeLocation,
}

impl<'a> Args<'a> {
    fn int(&self, i: usize) -> Result<i64, Error> {
        self.args[i].cast_to_int_or_bool().map(|val| val.as_int()).ok_or_else(|| {
            Error::runtime(
                self.loc,
                format!(
                    "Expected integer for argument {} of '{}', got string.",
                    i + 1,
                    self.builtin.name()
                ),
            )
        })
    }

    fn color(&self, i: usize) -> Result<Color, Error> {
        let literal = self.args[i].cast_to_str().ok_or_else(|| {
            Error::runtime(
                self.loc,
                format!(
                    "Expected string for argument {} of '{}', got integer.",
                    i + 1,
                    self.builtin.name()
                ),
            )
        })?;
        literal
            .parse()
            .map_err(|_| Error::runtime(self.loc, format!("Invalid color '{}'.", literal)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(builtin: Builtin, args: &[Value], canvas: &Canvas, state: &WallEState) -> Result<Value, Error> {
        call_builtin(builtin, args, &Context { canvas, state }, CodeLocation::new(1, 1))
    }

    #[test]
    fn test_position_and_size() {
        let canvas = Canvas::new(30, 20);
        let mut state = WallEState::new();
        state.move_to(4, 7);
        assert_eq!(call(Builtin::GetActualX, &[], &canvas, &state), Ok(Value::int(4)));
        assert_eq!(call(Builtin::GetActualY, &[], &canvas, &state), Ok(Value::int(7)));
        assert_eq!(call(Builtin::GetCanvasSize, &[], &canvas, &state), Ok(Value::int(30)));
    }

    #[test]
    fn test_brush_queries() {
        let canvas = Canvas::new(5, 5);
        let mut state = WallEState::new();
        state.set_brush_size(4);
        state.color = Color::rgb(255, 0, 0);
        let red = Value::Str("Red".to_string());
        assert_eq!(call(Builtin::IsBrushColor, &[red], &canvas, &state), Ok(Value::bool(true)));
        assert_eq!(
            call(Builtin::IsBrushSize, &[Value::int(3)], &canvas, &state),
            Ok(Value::bool(true))
        );
        // compared against the normalized size
        assert_eq!(
            call(Builtin::IsBrushSize, &[Value::int(4)], &canvas, &state),
            Ok(Value::bool(false))
        );
    }

    #[test]
    fn test_canvas_queries() {
        let mut canvas = Canvas::new(4, 4);
        canvas.set(1, 1, Color::BLACK);
        let state = WallEState::new();
        let black = || Value::Str("black".to_string());

        assert_eq!(
            call(Builtin::IsCanvasColor, &[black(), Value::int(1), Value::int(1)], &canvas, &state),
            Ok(Value::bool(true))
        );
        assert_eq!(
            call(Builtin::IsCanvasColor, &[black(), Value::int(-1), Value::int(9)], &canvas, &state),
            Ok(Value::bool(false))
        );
        let args = [
            Value::Str("white".to_string()),
            Value::int(0),
            Value::int(0),
            Value::int(4),
            Value::int(4),
        ];
        assert_eq!(call(Builtin::GetColorCount, &args, &canvas, &state), Ok(Value::int(15)));
    }

    #[test]
    fn test_color_count_region() {
        let mut canvas = Canvas::new(4, 4);
        canvas.set(1, 1, Color::BLACK);
        let state = WallEState::new();
        let count = |x, y, w, h| {
            let args = [
                Value::Str("white".to_string()),
                Value::int(x),
                Value::int(y),
                Value::int(w),
                Value::int(h),
            ];
            call(Builtin::GetColorCount, &args, &canvas, &state)
        };

        assert_eq!(count(1, 1, 2, 2), Ok(Value::int(3)));
        assert_eq!(count(2, 2, 10, 10), Ok(Value::int(4)));
        assert_eq!(count(-2, -2, 3, 3), Ok(Value::int(1)));
        assert_eq!(count(0, 0, 0, 4), Ok(Value::int(0)));
        assert_eq!(count(3, 3, -2, -2), Ok(Value::int(0)));
    }

    #[test]
    fn test_random_int() {
        let canvas = Canvas::new(1, 1);
        let state = WallEState::new();
        for _ in 0..50 {
            let value = call(Builtin::GetRandomInt, &[Value::int(-2), Value::int(2)], &canvas, &state);
            let value = value.ok().and_then(|v| v.cast_to_int_or_bool()).map(|v| v.as_int());
            assert!(matches!(value, Some(-2..=2)));
        }
        assert_eq!(
            call(Builtin::GetRandomInt, &[Value::int(3), Value::int(3)], &canvas, &state),
            Ok(Value::int(3))
        );
        assert!(call(Builtin::GetRandomInt, &[Value::int(3), Value::int(2)], &canvas, &state).is_err());
    }

    #[test]
    fn test_argument_errors() {
        let canvas = Canvas::new(1, 1);
        let state = WallEState::new();
        let err = call(Builtin::IsBrushColor, &[Value::int(1)], &canvas, &state).unwrap_err();
        assert_eq!(err.message(), "Expected string for argument 1 of 'IsBrushColor', got integer.");
        let err = call(Builtin::IsBrushColor, &[Value::Str("nope".to_string())], &canvas, &state)
            .unwrap_err();
        assert_eq!(err.message(), "Invalid color 'nope'.");
        assert!(call(Builtin::GetActualX, &[Value::int(1)], &canvas, &state).is_err());
    }
}
