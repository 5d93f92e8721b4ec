use std::fmt;
use std::str::FromStr;

/// Binary operators.
///
/// Declaration order encodes precedence, loosest first:
/// `Or` < `And` and the comparisons < additive < multiplicative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BinaryOp {
    // Logical
    /// Logical OR (`or`)
    Or,
    /// Logical AND (`and`)
    And,

    // Comparison
    /// Equal (`eq`)
    Equal,
    /// Not equal (`ne`)
    NotEqual,
    /// Greater than (`gt`)
    GreaterThan,
    /// Greater than or equal (`ge`)
    GreaterThanOrEqual,
    /// Less than (`lt`)
    LessThan,
    /// Less than or equal (`le`)
    LessThanOrEqual,

    // Additive
    /// Addition (`add`)
    Add,
    /// Subtraction (`sub`)
    Subtract,

    // Multiplicative
    /// Multiplication (`mul`)
    Multiply,
    /// Division (`div`)
    Divide,
    /// Modulo (`mod`)
    Modulo,
}

impl BinaryOp {
    /// Whether the operator produces a Boolean regardless of operand type.
    pub fn is_boolean_op(self) -> bool {
        self <= BinaryOp::LessThanOrEqual
    }

    pub fn is_comparison(self) -> bool {
        self >= BinaryOp::Equal && self <= BinaryOp::LessThanOrEqual
    }

    pub fn is_arithmetic(self) -> bool {
        self >= BinaryOp::Add
    }

    pub fn keyword(self) -> &'static str {
        use BinaryOp::*;
        match self {
            Or => "or",
            And => "and",
            Equal => "eq",
            NotEqual => "ne",
            GreaterThan => "gt",
            GreaterThanOrEqual => "ge",
            LessThan => "lt",
            LessThanOrEqual => "le",
            Add => "add",
            Subtract => "sub",
            Multiply => "mul",
            Divide => "div",
            Modulo => "mod",
        }
    }

    /// Whether `child`, printed as an operand of `self`, needs parentheses.
    ///
    /// Each child operator is bucketed to the highest operator of its
    /// precedence class (`Or`, `And`, `Subtract`); the child is wrapped only
    /// when the parent binds tighter than that bucket.
    pub fn needs_parens(self, child: BinaryOp) -> bool {
        use BinaryOp::*;
        let bucket = match child {
            Or => Or,
            And | Equal | NotEqual | GreaterThan | GreaterThanOrEqual | LessThan
            | LessThanOrEqual => And,
            Add | Subtract | Multiply | Divide | Modulo => Subtract,
        };
        self > bucket
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Logical negation (`not`)
    Not,
    /// Arithmetic negation (`-`)
    Negate,
}

impl UnaryOp {
    pub fn keyword(self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::Negate => "-",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Built-in query functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    // String
    SubstringOf,
    EndsWith,
    StartsWith,
    Length,
    IndexOf,
    Replace,
    Substring,
    ToLower,
    ToUpper,
    Trim,
    Concat,

    // Date
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,

    // Math
    Round,
    Floor,
    Ceiling,

    // Type
    IsOf,
    Cast,
}

impl Function {
    const ALL: [Function; 22] = [
        Function::SubstringOf,
        Function::EndsWith,
        Function::StartsWith,
        Function::Length,
        Function::IndexOf,
        Function::Replace,
        Function::Substring,
        Function::ToLower,
        Function::ToUpper,
        Function::Trim,
        Function::Concat,
        Function::Year,
        Function::Month,
        Function::Day,
        Function::Hour,
        Function::Minute,
        Function::Second,
        Function::Round,
        Function::Floor,
        Function::Ceiling,
        Function::IsOf,
        Function::Cast,
    ];

    pub fn keyword(self) -> &'static str {
        use Function::*;
        match self {
            SubstringOf => "substringof",
            EndsWith => "endswith",
            StartsWith => "startswith",
            Length => "length",
            IndexOf => "indexof",
            Replace => "replace",
            Substring => "substring",
            ToLower => "tolower",
            ToUpper => "toupper",
            Trim => "trim",
            Concat => "concat",
            Year => "year",
            Month => "month",
            Day => "day",
            Hour => "hour",
            Minute => "minute",
            Second => "second",
            Round => "round",
            Floor => "floor",
            Ceiling => "ceiling",
            IsOf => "isof",
            Cast => "cast",
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Function {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Function::ALL
            .iter()
            .copied()
            .find(|func| func.keyword().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown function '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(format!("unknown sort direction '{s}'")),
        }
    }
}

/// `$inlinecount` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InlineCount {
    #[default]
    None,
    AllPages,
}

impl InlineCount {
    pub fn keyword(self) -> &'static str {
        match self {
            InlineCount::None => "none",
            InlineCount::AllPages => "allpages",
        }
    }
}

impl fmt::Display for InlineCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for InlineCount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(InlineCount::None),
            "allpages" => Ok(InlineCount::AllPages),
            _ => Err(format!("unknown inline count mode '{s}'")),
        }
    }
}
