use walle_source::CodeLocation;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Bang,
    /// `-`
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Mod,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "**",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: CodeLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    /// A variable reference (e.g. `foo`).
    Variable(String),
    /// A call to a built-in function (e.g. `GetActualX()`).
    Call { ident: String, args: Vec<Expr> },
    /// A parenthesized or bracketed expression.
    Group(Box<Expr>),
    Unary { op: UnaryOp, arg: Box<Expr> },
    /// A binary expression (e.g. `1+1`).
    Binary {
        lhs: Box<Expr>,
        op: BinaryOp,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn new(kind: ExprKind, loc: CodeLocation) -> Self {
        Self { kind, loc }
    }

    /// Folds literal integers, grouping and negation into a constant.
    /// Returns `None` for anything that needs runtime information.
    pub fn constant_int(&self) -> Option<i64> {
        match &self.kind {
            ExprKind::Literal(Literal::Int(val)) => Some(*val),
            ExprKind::Literal(Literal::Bool(val)) => Some(*val as i64),
            ExprKind::Group(inner) => inner.constant_int(),
            ExprKind::Unary {
                op: UnaryOp::Minus,
                arg,
            } => arg.constant_int()?.checked_neg(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: CodeLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Spawn {
        x: Expr,
        y: Expr,
    },
    Respawn {
        x: Expr,
        y: Expr,
    },
    Color(Expr),
    Size(Expr),
    DrawLine {
        dir_x: Expr,
        dir_y: Expr,
        distance: Expr,
    },
    DrawCircle {
        dir_x: Expr,
        dir_y: Expr,
        radius: Expr,
    },
    DrawRectangle {
        dir_x: Expr,
        dir_y: Expr,
        distance: Expr,
        width: Expr,
        height: Expr,
    },
    Fill,
    Filling(Expr),
    Assign {
        ident: String,
        value: Expr,
    },
    Label(String),
    GoTo {
        label: String,
        condition: Expr,
    },
    ExprStmt(Expr),
}

impl Stmt {
    pub fn new(kind: StmtKind, loc: CodeLocation) -> Self {
        Self { kind, loc }
    }

    /// Returns `true` for statements that write pixels.
    pub fn is_drawing(&self) -> bool {
        matches!(
            self.kind,
            StmtKind::DrawLine { .. }
                | StmtKind::DrawCircle { .. }
                | StmtKind::DrawRectangle { .. }
                | StmtKind::Fill
        )
    }
}

/// A whole program: a flat list of statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub stmts: Vec<Stmt>,
    pub loc: CodeLocation,
}
