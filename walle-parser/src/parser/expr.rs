use super::*;
use crate::ast::{BinaryOp, Literal, UnaryOp};

impl<'a> Parser<'a> {
    /* Expressions */
    /// Parses any expression.
    /// This is equivalent to calling [`Self::parse_expr_bp`] with `min_bp = 0`.
    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_expr_bp(0) // 0 to accept any expression
    }

    /// Parses an expression with the specified `min_bp`.
    /// To parse any expression use, [`Self::parse_expr`].
    fn parse_expr_bp(&mut self, min_bp: u8) -> ParseResult<Expr> {
        let depth = self.depth;
        let result = self.parse_binary_chain(min_bp);
        self.depth = depth;
        result
    }

    /// Every operand and every folded operator counts towards the nesting depth,
    /// so long left-associative chains are bounded as well.
    fn parse_binary_chain(&mut self, min_bp: u8) -> ParseResult<Expr> {
        self.nest()?;
        let mut lhs = self.parse_unary_expr()?;

        loop {
            let (l_bp, r_bp) = match self.current_token().binop_bp() {
                Some(bp) => bp,
                None => break, // not a valid binop, stop parsing
            };
            if l_bp < min_bp {
                break; // less than the min_bp, stop parsing
            }

            // self.current_token is a valid binop
            let op = match binary_op(self.current_token()) {
                Some(op) => op,
                None => break,
            };
            self.next();
            self.nest()?;

            let rhs = self.parse_expr_bp(r_bp)?;

            let loc = lhs.loc;
            lhs = Expr::new(
                ExprKind::Binary {
                    lhs: Box::new(lhs),
                    op,
                    rhs: Box::new(rhs),
                },
                loc,
            );
        }

        Ok(lhs)
    }

    /// Parses prefix operators. They bind tighter than any binary operator, `**` included.
    fn parse_unary_expr(&mut self) -> ParseResult<Expr> {
        let op = match self.current_token() {
            Token::LogicalNot => UnaryOp::Bang,
            Token::Minus => UnaryOp::Minus,
            _ => return self.parse_primary_expr(),
        };
        let loc = self.current_loc();
        self.next();

        let depth = self.depth;
        let arg = self.nest().and_then(|()| self.parse_unary_expr());
        self.depth = depth;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                arg: Box::new(arg?),
            },
            loc,
        ))
    }

    /// Parses a primary (atom) expression.
    fn parse_primary_expr(&mut self) -> ParseResult<Expr> {
        let loc = self.current_loc();
        match self.current_token().clone() {
            Token::NumberLit(val) => {
                self.next();
                Ok(Expr::new(ExprKind::Literal(Literal::Int(val)), loc))
            }
            Token::BoolLit(val) => {
                self.next();
                Ok(Expr::new(ExprKind::Literal(Literal::Bool(val)), loc))
            }
            Token::StringLit(val) => {
                self.next();
                Ok(Expr::new(ExprKind::Literal(Literal::Str(val)), loc))
            }
            Token::Identifier(ident) => {
                self.next();
                self.parse_identifier_or_call_expr(ident, loc)
            }
            Token::OpenParen => {
                self.next();
                let inner = self.parse_expr()?;
                self.expect(Token::CloseParen, "')' to close group")?;
                Ok(Expr::new(ExprKind::Group(Box::new(inner)), loc))
            }
            Token::OpenBracket => {
                self.next();
                let inner = self.parse_expr()?;
                self.expect(Token::CloseBracket, "']' to close group")?;
                Ok(Expr::new(ExprKind::Group(Box::new(inner)), loc))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /* Expressions.Identifier */
    /// Parses an identifier or a call expression. `ident` has already been eaten.
    fn parse_identifier_or_call_expr(
        &mut self,
        ident: String,
        loc: CodeLocation,
    ) -> ParseResult<Expr> {
        if self.eat(Token::OpenParen) {
            // parse call expression
            let mut args = Vec::new();

            if !self.eat(Token::CloseParen) {
                loop {
                    args.push(self.parse_expr()?);

                    if self.eat(Token::CloseParen) {
                        break;
                    } else if !self.eat(Token::Comma) {
                        return Err(self.unexpected("',' or ')' in argument list"));
                    }
                }
            }

            Ok(Expr::new(ExprKind::Call { ident, args }, loc))
        } else {
            // parse identifier expression
            Ok(Expr::new(ExprKind::Variable(ident), loc))
        }
    }
}

/// Maps a binary operator token to its AST operator.
fn binary_op(token: &Token) -> Option<BinaryOp> {
    let op = match token {
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Asterisk => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        Token::Percent => BinaryOp::Mod,
        Token::AsteriskAsterisk => BinaryOp::Pow,
        Token::EqualsEquals => BinaryOp::Eq,
        Token::NotEquals => BinaryOp::Ne,
        Token::GreaterThan => BinaryOp::Gt,
        Token::GreaterThanEquals => BinaryOp::Ge,
        Token::LessThan => BinaryOp::Lt,
        Token::LessThanEquals => BinaryOp::Le,
        Token::And => BinaryOp::And,
        Token::Or => BinaryOp::Or,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn expr(source: &str) -> String {
        let source = source.into();
        let ast = Parser::new(&source).parse_expr();
        assert!(source.has_no_errors());
        match ast {
            Ok(ast) => ast.to_string(),
            Err(err) => panic!("{}", err),
        }
    }

    #[test]
    fn test_literal() {
        assert_snapshot!(expr("true"), @"true");
        assert_snapshot!(expr("false"), @"false");
        assert_snapshot!(expr("12"), @"12");
        assert_snapshot!(expr("\"hello\""), @r###""hello""###);
    }

    #[test]
    fn test_binary_expr() {
        assert_snapshot!(expr("1 + 1"), @"(+ 1 1)");
        assert_snapshot!(expr("1 == 2 - 1"), @"(== 1 (- 2 1))");
        assert_snapshot!(expr("2 * 2 * 2"), @"(* (* 2 2) 2)");
        assert_snapshot!(expr("1 + 2 * 3 % 4"), @"(+ 1 (% (* 2 3) 4))");
        assert_snapshot!(expr("a < b == c >= d"), @"(== (< a b) (>= c d))");
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_snapshot!(expr("2 ** 3 ** 2"), @"(** 2 (** 3 2))");
        assert_snapshot!(expr("2 * 3 ** 2"), @"(* 2 (** 3 2))");
    }

    #[test]
    fn test_logical_precedence() {
        // `and` binds looser than `or`
        assert_snapshot!(expr("a and b or c"), @"(and a (or b c))");
        assert_snapshot!(expr("a or b and c"), @"(and (or a b) c)");
        assert_snapshot!(expr("x == 1 and y != 2"), @"(and (== x 1) (!= y 2))");
    }

    #[test]
    fn test_unary_expr() {
        assert_snapshot!(expr("-x"), @"(- x)");
        assert_snapshot!(expr("!!true"), @"(! (! true))");
        assert_snapshot!(expr("-2 ** 2"), @"(** (- 2) 2)");
        assert_snapshot!(expr("1 - -1"), @"(- 1 (- 1))");
    }

    #[test]
    fn test_grouping() {
        assert_snapshot!(expr("(1 + 2) * 3"), @"(* (group (+ 1 2)) 3)");
        assert_snapshot!(expr("[1 + 2] * 3"), @"(* (group (+ 1 2)) 3)");
    }

    #[test]
    fn test_fn_call() {
        assert_snapshot!(expr("GetActualX()"), @"(call GetActualX)");
        assert_snapshot!(expr("IsBrushSize(1 + n)"), @"(call IsBrushSize (+ 1 n))");
        assert_snapshot!(
            expr("GetColorCount(\"red\", 0, 0, GetCanvasSize(), GetCanvasSize())"),
            @r###"(call GetColorCount "red" 0 0 (call GetCanvasSize) (call GetCanvasSize))"###
        );
    }

    #[test]
    fn test_constant_int() {
        let source = "-(1)".into();
        let ast = Parser::new(&source).parse_expr();
        assert_eq!(ast.ok().and_then(|e| e.constant_int()), Some(-1));

        let source = "x + 1".into();
        let ast = Parser::new(&source).parse_expr();
        assert_eq!(ast.ok().and_then(|e| e.constant_int()), None);
    }

    fn nesting_errors(expr: &str) -> Vec<Error> {
        let content = format!("Spawn(0, 0)\nx <- {}\nSize(2)\n", expr);
        let source: Source = content.as_str().into();
        let program = Parser::new(&source).parse_program();
        // the statement after the deep one still parses
        assert_eq!(program.stmts.len(), 2);
        source.errors.errors()
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        let negations = format!("{}1", "-".repeat(100_000));
        let sum = format!("1{}", " + 1".repeat(100_000));
        let power = format!("2{}", " ** 2".repeat(100_000));
        let calls = format!("{}1{}", "IsBrushSize(".repeat(50_000), ")".repeat(50_000));

        for expr in [parens, negations, sum, power, calls] {
            let errors = nesting_errors(&expr);
            assert_eq!(errors.len(), 1, "{:?}", errors);
            assert!(matches!(errors[0], Error::Syntax { .. }));
            assert!(errors[0].message().contains("nested more than 128 levels"));
        }
    }

    #[test]
    fn test_moderate_nesting() {
        let parens = format!("{}1{}", "(".repeat(60), ")".repeat(60));
        let sum = format!("1{}", " + 1".repeat(100));
        for expr in [parens, sum] {
            let source: Source = expr.as_str().into();
            assert!(Parser::new(&source).parse_expr().is_ok(), "{}", source.errors);
        }
    }
}
