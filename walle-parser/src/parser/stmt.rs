use super::*;

impl<'a> Parser<'a> {
    /// Parses a statement, including its terminating line break.
    pub fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let loc = self.current_loc();
        let kind = match self.current_token().clone() {
            Token::Spawn => {
                let [x, y] = self.parse_command_args("Spawn")?;
                StmtKind::Spawn { x, y }
            }
            Token::Respawn => {
                let [x, y] = self.parse_command_args("Respawn")?;
                StmtKind::Respawn { x, y }
            }
            Token::Color => {
                let [color] = self.parse_command_args("Color")?;
                StmtKind::Color(color)
            }
            Token::Size => {
                let [size] = self.parse_command_args("Size")?;
                StmtKind::Size(size)
            }
            Token::DrawLine => {
                let [dir_x, dir_y, distance] = self.parse_command_args("DrawLine")?;
                StmtKind::DrawLine {
                    dir_x,
                    dir_y,
                    distance,
                }
            }
            Token::DrawCircle => {
                let [dir_x, dir_y, radius] = self.parse_command_args("DrawCircle")?;
                StmtKind::DrawCircle {
                    dir_x,
                    dir_y,
                    radius,
                }
            }
            Token::DrawRectangle => {
                let [dir_x, dir_y, distance, width, height] =
                    self.parse_command_args("DrawRectangle")?;
                StmtKind::DrawRectangle {
                    dir_x,
                    dir_y,
                    distance,
                    width,
                    height,
                }
            }
            Token::Fill => {
                let [] = self.parse_command_args::<0>("Fill")?;
                StmtKind::Fill
            }
            Token::Filling => {
                let [filling] = self.parse_command_args("Filling")?;
                StmtKind::Filling(filling)
            }
            Token::GoTo => self.parse_goto_stmt()?,
            Token::Identifier(ident) => self.parse_identifier_stmt(ident)?,
            _ => StmtKind::ExprStmt(self.parse_expr()?),
        };

        self.expect_line_end()?;
        Ok(Stmt::new(kind, loc))
    }

    /// Eats the command keyword and its parenthesized list of exactly `N` arguments.
    fn parse_command_args<const N: usize>(&mut self, command: &str) -> ParseResult<[Expr; N]> {
        self.next(); // eat command keyword
        self.expect(Token::OpenParen, &format!("'(' after '{}'", command))?;

        let mut args = Vec::with_capacity(N);
        for i in 0..N {
            args.push(self.parse_expr()?);
            if i + 1 < N {
                self.expect(
                    Token::Comma,
                    &format!("',' between arguments of '{}'", command),
                )?;
            }
        }
        self.expect(
            Token::CloseParen,
            &format!("')' after {} argument(s) of '{}'", N, command),
        )?;

        let loc = self.current_loc();
        args.try_into().map_err(|_| {
            Error::syntax(
                loc,
                format!("Wrong number of arguments for '{}'.", command),
                command.to_string(),
                Vec::new(),
            )
        })
    }

    /// Parses `GoTo[label](condition)`.
    fn parse_goto_stmt(&mut self) -> ParseResult<StmtKind> {
        self.next(); // eat `GoTo`
        self.expect(Token::OpenBracket, "'[' after 'GoTo'")?;
        let label = match self.current_token().clone() {
            Token::Identifier(label) => {
                self.next();
                label
            }
            _ => return Err(self.unexpected("label name")),
        };
        self.expect(Token::CloseBracket, "']' after label name")?;
        self.expect(Token::OpenParen, "'(' before 'GoTo' condition")?;
        let condition = self.parse_expr()?;
        self.expect(Token::CloseParen, "')' after 'GoTo' condition")?;

        Ok(StmtKind::GoTo { label, condition })
    }

    /// Parses a statement starting with an identifier: an assignment, a label declaration
    /// (either `name` or `Label name` alone on a line) or an expression statement.
    fn parse_identifier_stmt(&mut self, ident: String) -> ParseResult<StmtKind> {
        match (self.peek_token(1), self.peek_token(2)) {
            (Token::Assign, _) => {
                self.next(); // eat identifier
                self.next(); // eat `<-`
                let value = self.parse_expr()?;
                Ok(StmtKind::Assign { ident, value })
            }
            (Token::Endl, _) | (Token::Eof, _) => {
                self.next();
                Ok(StmtKind::Label(ident))
            }
            (Token::Identifier(label), Token::Endl) | (Token::Identifier(label), Token::Eof)
                if ident == "Label" =>
            {
                let label = label.clone();
                self.next(); // eat `Label`
                self.next(); // eat label name
                Ok(StmtKind::Label(label))
            }
            _ => Ok(StmtKind::ExprStmt(self.parse_expr()?)),
        }
    }
}
