//! Statement and expression discriminants.
//!
//! Both enums are `#[repr(u8)]` so the packed form stores them as one byte.

/// What a statement does.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StmtKind {
    #[default]
    Nop = 0,
    /// Evaluate `expressions[0]` for effect.
    Expression = 1,
    /// A bare `{ ... }` block; owns a nested scope.
    Block = 2,
    If = 3,
    Else = 4,
    While = 5,
    For = 6,
    /// Leaves `referenced_loop`.
    Break = 7,
    /// Re-enters `referenced_loop`.
    Continue = 8,
    /// Jumps to the statement labelled `label`.
    Goto = 9,
    Label = 10,
    /// Dispatches on `expressions[0]` to `switch_labels`.
    Switch = 11,
    Return = 12,
}

impl StmtKind {
    pub const fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => StmtKind::Nop,
            1 => StmtKind::Expression,
            2 => StmtKind::Block,
            3 => StmtKind::If,
            4 => StmtKind::Else,
            5 => StmtKind::While,
            6 => StmtKind::For,
            7 => StmtKind::Break,
            8 => StmtKind::Continue,
            9 => StmtKind::Goto,
            10 => StmtKind::Label,
            11 => StmtKind::Switch,
            12 => StmtKind::Return,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            StmtKind::Nop => "nop",
            StmtKind::Expression => "expr",
            StmtKind::Block => "block",
            StmtKind::If => "if",
            StmtKind::Else => "else",
            StmtKind::While => "while",
            StmtKind::For => "for",
            StmtKind::Break => "break",
            StmtKind::Continue => "continue",
            StmtKind::Goto => "goto",
            StmtKind::Label => "label",
            StmtKind::Switch => "switch",
            StmtKind::Return => "return",
        }
    }

    /// Statements a `break`/`continue` may target.
    pub const fn is_loop_target(self) -> bool {
        matches!(self, StmtKind::While | StmtKind::For | StmtKind::Switch)
    }
}

/// Expression node kind.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExprKind {
    /// Integer literal; payload in `value`.
    #[default]
    IntLit = 0,
    /// Float literal; `f64` bits in `value`.
    FloatLit = 1,
    /// String literal; text in `symname`.
    StringLit = 2,
    /// Variable or function reference; name in `symname`.
    Ident = 3,
    /// `symname(children...)`
    Call = 4,
    /// `children[0].method_name(children[1..])`
    MethodCall = 5,
    /// `children[0].symname`
    Member = 6,
    Index = 7,
    Cast = 8,
    Neg = 9,
    Not = 10,
    Compl = 11,
    Deref = 12,
    AddrOf = 13,
    Add = 14,
    Sub = 15,
    Mul = 16,
    Div = 17,
    Rem = 18,
    Shl = 19,
    Shr = 20,
    BitAnd = 21,
    BitOr = 22,
    BitXor = 23,
    Eq = 24,
    Ne = 25,
    Lt = 26,
    Le = 27,
    Gt = 28,
    Ge = 29,
    LogAnd = 30,
    LogOr = 31,
    Assign = 32,
}

impl ExprKind {
    pub const fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => ExprKind::IntLit,
            1 => ExprKind::FloatLit,
            2 => ExprKind::StringLit,
            3 => ExprKind::Ident,
            4 => ExprKind::Call,
            5 => ExprKind::MethodCall,
            6 => ExprKind::Member,
            7 => ExprKind::Index,
            8 => ExprKind::Cast,
            9 => ExprKind::Neg,
            10 => ExprKind::Not,
            11 => ExprKind::Compl,
            12 => ExprKind::Deref,
            13 => ExprKind::AddrOf,
            14 => ExprKind::Add,
            15 => ExprKind::Sub,
            16 => ExprKind::Mul,
            17 => ExprKind::Div,
            18 => ExprKind::Rem,
            19 => ExprKind::Shl,
            20 => ExprKind::Shr,
            21 => ExprKind::BitAnd,
            22 => ExprKind::BitOr,
            23 => ExprKind::BitXor,
            24 => ExprKind::Eq,
            25 => ExprKind::Ne,
            26 => ExprKind::Lt,
            27 => ExprKind::Le,
            28 => ExprKind::Gt,
            29 => ExprKind::Ge,
            30 => ExprKind::LogAnd,
            31 => ExprKind::LogOr,
            32 => ExprKind::Assign,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            ExprKind::IntLit => "int",
            ExprKind::FloatLit => "float",
            ExprKind::StringLit => "string",
            ExprKind::Ident => "ident",
            ExprKind::Call => "call",
            ExprKind::MethodCall => "method",
            ExprKind::Member => "member",
            ExprKind::Index => "index",
            ExprKind::Cast => "cast",
            ExprKind::Neg => "neg",
            ExprKind::Not => "not",
            ExprKind::Compl => "compl",
            ExprKind::Deref => "deref",
            ExprKind::AddrOf => "addr",
            ExprKind::Add => "add",
            ExprKind::Sub => "sub",
            ExprKind::Mul => "mul",
            ExprKind::Div => "div",
            ExprKind::Rem => "rem",
            ExprKind::Shl => "shl",
            ExprKind::Shr => "shr",
            ExprKind::BitAnd => "bitand",
            ExprKind::BitOr => "bitor",
            ExprKind::BitXor => "bitxor",
            ExprKind::Eq => "eq",
            ExprKind::Ne => "ne",
            ExprKind::Lt => "lt",
            ExprKind::Le => "le",
            ExprKind::Gt => "gt",
            ExprKind::Ge => "ge",
            ExprKind::LogAnd => "and",
            ExprKind::LogOr => "or",
            ExprKind::Assign => "assign",
        }
    }
}
