//! Python syntax tree
//!
//! A closed set of tagged node variants. Every node exclusively owns its
//! children; rewriting a node means building a new value in its slot.
//!
//! Only the shapes the mutation engine needs to tell apart are modelled in
//! detail. Plain string literals keep their exact source spelling and are
//! opaque leaves; f-strings and `case` patterns keep their text but expose
//! the expressions embedded in it as [`Segment::Expr`] children.

use std::fmt;

/// Parsed Python module (the tree root)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    /// Top-level statements in source order
    pub body: Vec<Stmt>,
}

impl Module {
    /// Create module from statements
    #[inline]
    #[must_use]
    pub fn new(body: Vec<Stmt>) -> Self {
        Self { body }
    }

    /// Check if module has no statements
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Statement node
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `def` / `async def`
    FunctionDef(FunctionDef),
    /// `class`
    ClassDef(ClassDef),
    /// `return [value]`
    Return(Option<Expr>),
    /// `del a, b`
    Delete(Vec<Expr>),
    /// `a = b = value`
    Assign { targets: Vec<Expr>, value: Expr },
    /// `target op= value`
    AugAssign { target: Expr, op: BinOp, value: Expr },
    /// `target: annotation [= value]`
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
    },
    /// `for` / `async for`
    For(For),
    /// `while test: ... else: ...`
    While {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    /// `if test: ... elif/else ...`
    ///
    /// `elif` chains are nested `If` statements in `orelse`.
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    /// `with` / `async with`
    With(With),
    /// `raise [exc [from cause]]`
    Raise {
        exc: Option<Expr>,
        cause: Option<Expr>,
    },
    /// `try` with handlers, `else` and `finally`
    Try(Try),
    /// `assert test[, msg]`
    Assert { test: Expr, msg: Option<Expr> },
    /// `match subject:` with its `case` clauses
    Match { subject: Expr, cases: Vec<MatchCase> },
    /// `import a.b as c, d`
    Import(Vec<Alias>),
    /// `from module import names`
    ///
    /// `module` keeps leading dots of relative imports; a wildcard import is
    /// a single alias named `*`.
    ImportFrom { module: String, names: Vec<Alias> },
    /// `global a, b`
    Global(Vec<String>),
    /// `nonlocal a, b`
    Nonlocal(Vec<String>),
    /// Bare expression statement
    Expr(Expr),
    /// `pass`
    Pass,
    /// `break`
    Break,
    /// `continue`
    Continue,
}

impl Stmt {
    /// Short lowercase name of the statement kind (for logs and errors)
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::FunctionDef(_) => "function definition",
            Stmt::ClassDef(_) => "class definition",
            Stmt::Return(_) => "return",
            Stmt::Delete(_) => "del",
            Stmt::Assign { .. } => "assignment",
            Stmt::AugAssign { .. } => "augmented assignment",
            Stmt::AnnAssign { .. } => "annotated assignment",
            Stmt::For(_) => "for",
            Stmt::While { .. } => "while",
            Stmt::If { .. } => "if",
            Stmt::With(_) => "with",
            Stmt::Raise { .. } => "raise",
            Stmt::Try(_) => "try",
            Stmt::Assert { .. } => "assert",
            Stmt::Match { .. } => "match",
            Stmt::Import(_) => "import",
            Stmt::ImportFrom { .. } => "from-import",
            Stmt::Global(_) => "global",
            Stmt::Nonlocal(_) => "nonlocal",
            Stmt::Expr(_) => "expression",
            Stmt::Pass => "pass",
            Stmt::Break => "break",
            Stmt::Continue => "continue",
        }
    }
}

/// Function definition
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// `async def`
    pub is_async: bool,
    /// Function name (not a name expression; never renamed)
    pub name: String,
    /// Parameters in source order
    pub params: Vec<Param>,
    /// Return annotation
    pub returns: Option<Expr>,
    /// Body statements
    pub body: Vec<Stmt>,
    /// Decorator expressions, outermost first
    pub decorators: Vec<Expr>,
}

/// Class definition
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    /// Base classes and class keywords (`metaclass=...`)
    pub bases: Vec<Arg>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
}

/// `for` loop
#[derive(Debug, Clone, PartialEq)]
pub struct For {
    pub is_async: bool,
    pub target: Expr,
    pub iter: Expr,
    pub body: Vec<Stmt>,
    pub orelse: Vec<Stmt>,
}

/// `with` statement
#[derive(Debug, Clone, PartialEq)]
pub struct With {
    pub is_async: bool,
    pub items: Vec<WithItem>,
    pub body: Vec<Stmt>,
}

/// One `context [as target]` item of a `with` statement
#[derive(Debug, Clone, PartialEq)]
pub struct WithItem {
    pub context: Expr,
    pub target: Option<Expr>,
}

/// `try` statement
#[derive(Debug, Clone, PartialEq)]
pub struct Try {
    pub body: Vec<Stmt>,
    pub handlers: Vec<ExceptHandler>,
    pub orelse: Vec<Stmt>,
    pub finalbody: Vec<Stmt>,
}

/// `except [type [as name]]:` clause
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    /// `except*` (exception groups)
    pub is_star: bool,
    pub kind: Option<Expr>,
    /// Bound name (plain string, like a parameter)
    pub name: Option<String>,
    pub body: Vec<Stmt>,
}

/// `case pattern [if guard]:` clause of a `match` statement
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCase {
    /// Pattern source text; value and class references are [`Segment::Expr`]
    pub pattern: Vec<Segment>,
    pub guard: Option<Expr>,
    pub body: Vec<Stmt>,
}

/// Piece of source text that embeds expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Verbatim text
    Text(String),
    /// Embedded expression, rendered in place
    Expr(Expr),
}

impl Segment {
    /// Append `text`, merging with a trailing [`Segment::Text`]
    pub fn push_text(segments: &mut Vec<Segment>, text: &str) {
        if text.is_empty() {
            return;
        }
        match segments.last_mut() {
            Some(Segment::Text(last)) => last.push_str(text),
            _ => segments.push(Segment::Text(text.to_string())),
        }
    }
}

/// Import alias `name [as asname]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
}

impl Alias {
    /// Alias without `as`
    #[inline]
    #[must_use]
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            asname: None,
        }
    }
}

/// Function or lambda parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// `name[: annotation][= default]`
    Plain {
        name: String,
        annotation: Option<Expr>,
        default: Option<Expr>,
    },
    /// `*name[: annotation]`
    VarArgs {
        name: String,
        annotation: Option<Expr>,
    },
    /// `**name[: annotation]`
    KwArgs {
        name: String,
        annotation: Option<Expr>,
    },
    /// Bare `*`
    KeywordOnlyMarker,
    /// `/`
    PositionalOnlyMarker,
}

/// Call argument (also used for class bases)
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Positional argument; `*xs` is a positional [`Expr::Starred`]
    Positional(Expr),
    /// `name=value`
    Keyword { name: String, value: Expr },
    /// `**mapping`
    KeywordUnpack(Expr),
}

/// Dictionary display entry
#[derive(Debug, Clone, PartialEq)]
pub enum DictItem {
    /// `key: value`
    Pair { key: Expr, value: Expr },
    /// `**mapping`
    Unpack(Expr),
}

/// One `for ... in ... [if ...]` clause of a comprehension
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub is_async: bool,
    pub target: Expr,
    pub iter: Expr,
    pub ifs: Vec<Expr>,
}

/// Comprehension display kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompKind {
    List,
    Set,
    Generator,
}

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Name expression (the only node the rename mutation touches)
    Name(String),
    /// Integer literal
    Int(IntLiteral),
    /// Float or imaginary literal, spelled as in source
    Number(String),
    /// String literal(s) without interpolations, spelled as in source
    Str(String),
    /// f-string (possibly concatenated with plain strings) with its
    /// interpolated expressions
    FString(Vec<Segment>),
    /// `True` / `False`
    Bool(bool),
    /// `None`
    None,
    /// `...`
    Ellipsis,
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BoolOp {
        left: Box<Expr>,
        op: BoolOp,
        right: Box<Expr>,
    },
    /// `left op1 c1 op2 c2 ...`
    Compare {
        left: Box<Expr>,
        comparisons: Vec<(CmpOp, Expr)>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Arg>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    /// `value[i]` or `value[i, j]`
    Subscript {
        value: Box<Expr>,
        indices: Vec<Expr>,
    },
    /// `lower:upper[:step]` inside a subscript
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    Tuple {
        elts: Vec<Expr>,
        parenthesized: bool,
    },
    List(Vec<Expr>),
    Set(Vec<Expr>),
    Dict(Vec<DictItem>),
    /// `*value`
    Starred(Box<Expr>),
    /// `body if test else orelse`
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Lambda {
        params: Vec<Param>,
        body: Box<Expr>,
    },
    /// `target := value`; `target` is always an [`Expr::Name`]
    NamedExpr {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Await(Box<Expr>),
    Yield(Option<Box<Expr>>),
    YieldFrom(Box<Expr>),
    /// List, set or generator comprehension
    Comp {
        kind: CompKind,
        element: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    DictComp {
        key: Box<Expr>,
        value: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    /// Parentheses kept from source
    Paren(Box<Expr>),
}

impl Expr {
    /// Name expression
    #[inline]
    #[must_use]
    pub fn name(id: impl Into<String>) -> Self {
        Expr::Name(id.into())
    }

    /// Call with positional arguments only
    #[must_use]
    pub fn call(func: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            func: Box::new(func),
            args: args.into_iter().map(Arg::Positional).collect(),
        }
    }
}

/// Longest non-decimal literal converted to decimal
///
/// Matches CPython's default limit on integer string conversion.
pub const MAX_CONVERTED_DIGITS: usize = 4300;

/// Integer literal with its source spelling
///
/// Values are unbounded, like Python ints. Literals are never negative: a
/// leading minus is a unary operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntLiteral {
    /// Decimal digits without leading zeros
    digits: String,
    spelling: String,
}

impl IntLiteral {
    /// Literal spelled in decimal
    #[must_use]
    pub fn new(value: u128) -> Self {
        Self::from_digits(value.to_string())
    }

    fn from_digits(digits: String) -> Self {
        Self {
            spelling: digits.clone(),
            digits,
        }
    }

    /// Parse a Python integer token (`42`, `0x2A`, `0o52`, `0b101010`, `1_000`)
    ///
    /// Returns `None` for spellings that are not plain integers (imaginary
    /// `5j`, legacy `10L`, leading-zero decimals) and for non-decimal
    /// spellings longer than [`MAX_CONVERTED_DIGITS`].
    #[must_use]
    pub fn parse(spelling: &str) -> Option<Self> {
        let digits: String = spelling.chars().filter(|c| *c != '_').collect();
        let lower = digits.to_ascii_lowercase();
        let (radix, body) = if let Some(rest) = lower.strip_prefix("0x") {
            (16, rest)
        } else if let Some(rest) = lower.strip_prefix("0o") {
            (8, rest)
        } else if let Some(rest) = lower.strip_prefix("0b") {
            (2, rest)
        } else {
            if lower.len() > 1 && lower.starts_with('0') && lower.chars().any(|c| c != '0') {
                return None;
            }
            (10, lower.as_str())
        };
        if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
            return None;
        }

        let digits = if radix == 10 {
            match body.trim_start_matches('0') {
                "" => "0".to_string(),
                trimmed => trimmed.to_string(),
            }
        } else {
            if body.len() > MAX_CONVERTED_DIGITS {
                return None;
            }
            to_decimal(body, radix)
        };
        Some(Self {
            digits,
            spelling: spelling.to_string(),
        })
    }

    /// Decimal digits of the value
    #[inline]
    #[must_use]
    pub fn decimal(&self) -> &str {
        &self.digits
    }

    /// Value, when it fits in `u128`
    #[must_use]
    pub fn to_u128(&self) -> Option<u128> {
        self.digits.parse().ok()
    }

    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.digits == "0"
    }

    /// Source spelling
    #[inline]
    #[must_use]
    pub fn spelling(&self) -> &str {
        &self.spelling
    }

    /// Literal shifted by one in either direction, spelled in decimal
    ///
    /// Returns `None` only when shifting zero down.
    #[must_use]
    pub fn shifted(&self, up: bool) -> Option<Self> {
        let mut digits: Vec<u8> = self.digits.bytes().collect();
        if up {
            let mut carry = true;
            for d in digits.iter_mut().rev() {
                if *d == b'9' {
                    *d = b'0';
                } else {
                    *d += 1;
                    carry = false;
                    break;
                }
            }
            if carry {
                digits.insert(0, b'1');
            }
        } else {
            if self.is_zero() {
                return None;
            }
            for d in digits.iter_mut().rev() {
                if *d == b'0' {
                    *d = b'9';
                } else {
                    *d -= 1;
                    break;
                }
            }
            // 1000 - 1 leaves one leading zero
            if digits.len() > 1 && digits.first() == Some(&b'0') {
                digits.remove(0);
            }
        }
        Some(Self::from_digits(digits.into_iter().map(char::from).collect()))
    }
}

/// Convert validated digits in `radix` to decimal
fn to_decimal(body: &str, radix: u32) -> String {
    const LIMB: u64 = 1_000_000_000;

    // little-endian base 10^9 limbs
    let mut limbs: Vec<u64> = vec![0];
    for c in body.chars() {
        let mut carry = u64::from(c.to_digit(radix).unwrap_or(0));
        for limb in &mut limbs {
            let v = *limb * u64::from(radix) + carry;
            *limb = v % LIMB;
            carry = v / LIMB;
        }
        if carry > 0 {
            limbs.push(carry);
        }
    }

    let mut out = String::new();
    let mut iter = limbs.iter().rev();
    if let Some(top) = iter.next() {
        out.push_str(&top.to_string());
    }
    for limb in iter {
        out.push_str(&format!("{:09}", limb));
    }
    out
}

impl fmt::Display for IntLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digits)
    }
}

/// Binary arithmetic/bitwise operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
}

impl BinOp {
    /// Every binary operator
    pub const ALL: [BinOp; 13] = [
        BinOp::Add,
        BinOp::Sub,
        BinOp::Mult,
        BinOp::MatMult,
        BinOp::Div,
        BinOp::FloorDiv,
        BinOp::Mod,
        BinOp::Pow,
        BinOp::LShift,
        BinOp::RShift,
        BinOp::BitOr,
        BinOp::BitXor,
        BinOp::BitAnd,
    ];

    /// Source symbol
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mult => "*",
            BinOp::MatMult => "@",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::LShift => "<<",
            BinOp::RShift => ">>",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::BitAnd => "&",
        }
    }

    /// Operator from its source symbol
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `+x`
    Plus,
    /// `-x`
    Minus,
    /// `~x`
    Invert,
    /// `not x`
    Not,
}

impl UnaryOp {
    /// Source spelling, including the space after `not`
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Invert => "~",
            UnaryOp::Not => "not ",
        }
    }
}

/// Boolean connective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            BoolOp::And => "and",
            BoolOp::Or => "or",
        }
    }
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl CmpOp {
    /// Source spelling
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        }
    }

    /// Operator from its source spelling
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "==" => CmpOp::Eq,
            "!=" => CmpOp::NotEq,
            "<" => CmpOp::Lt,
            "<=" => CmpOp::LtE,
            ">" => CmpOp::Gt,
            ">=" => CmpOp::GtE,
            "is" => CmpOp::Is,
            "is not" => CmpOp::IsNot,
            "in" => CmpOp::In,
            "not in" => CmpOp::NotIn,
            _ => return None,
        };
        Some(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(spelling: &str) -> Option<u128> {
        IntLiteral::parse(spelling).and_then(|l| l.to_u128())
    }

    #[test]
    fn int_literal_parses_python_spellings() {
        assert_eq!(value("42"), Some(42));
        assert_eq!(value("0x2A"), Some(42));
        assert_eq!(value("0o52"), Some(42));
        assert_eq!(value("0b101010"), Some(42));
        assert_eq!(value("1_000"), Some(1000));
        assert_eq!(value("0"), Some(0));
        assert_eq!(value("000"), Some(0));
        assert!(IntLiteral::parse("000").unwrap().is_zero());
    }

    #[test]
    fn int_literal_rejects_non_integers() {
        assert!(IntLiteral::parse("5j").is_none());
        assert!(IntLiteral::parse("10L").is_none());
        assert!(IntLiteral::parse("0777").is_none());
        assert!(IntLiteral::parse("0x").is_none());
        assert!(IntLiteral::parse("0b102").is_none());
    }

    #[test]
    fn int_literal_keeps_spelling_until_shifted() {
        let lit = IntLiteral::parse("0xFF").unwrap();
        assert_eq!(lit.spelling(), "0xFF");

        let up = lit.shifted(true).unwrap();
        assert_eq!(up.to_u128(), Some(256));
        assert_eq!(up.spelling(), "256");

        let down = lit.shifted(false).unwrap();
        assert_eq!(down.spelling(), "254");
    }

    #[test]
    fn int_literal_shift_carries_and_borrows() {
        assert_eq!(IntLiteral::new(999).shifted(true).unwrap().spelling(), "1000");
        assert_eq!(IntLiteral::new(1000).shifted(false).unwrap().spelling(), "999");
        assert_eq!(IntLiteral::new(1).shifted(false).unwrap(), IntLiteral::new(0));
        assert!(IntLiteral::new(0).shifted(false).is_none());
    }

    #[test]
    fn int_literal_is_unbounded() {
        let max = IntLiteral::new(u128::MAX);
        let up = max.shifted(true).unwrap();
        assert_eq!(up.decimal(), "340282366920938463463374607431768211456");
        assert_eq!(up.to_u128(), None);

        let big = IntLiteral::parse("1234567890123456789012345678901234567890").unwrap();
        assert_eq!(
            big.shifted(false).unwrap().to_string(),
            "1234567890123456789012345678901234567889"
        );

        // 2**128 in hex
        let hex = IntLiteral::parse("0x1_0000_0000_0000_0000_0000_0000_0000_0000").unwrap();
        assert_eq!(hex.decimal(), up.decimal());
    }

    #[test]
    fn long_non_decimal_literal_is_not_converted() {
        let long = format!("0x{}", "f".repeat(MAX_CONVERTED_DIGITS + 1));
        assert!(IntLiteral::parse(&long).is_none());
        let long_decimal = "9".repeat(MAX_CONVERTED_DIGITS + 1);
        assert!(IntLiteral::parse(&long_decimal).is_some());
    }

    #[test]
    fn operator_lookup_by_symbol() {
        assert_eq!(BinOp::from_symbol("//"), Some(BinOp::FloorDiv));
        assert_eq!(BinOp::from_symbol("+="), None);
        assert_eq!(CmpOp::from_symbol("not in"), Some(CmpOp::NotIn));
        assert_eq!(CmpOp::from_symbol("<>"), None);
    }
}
