// PL/SQL Grammar Rules
//
// Closed set of syntactic categories. Every interior AST node is tagged with
// one of these; leaves are tagged with their token type.

use std::fmt;

use serde::Serialize;

use super::lexer::TokenType;

macro_rules! grammar_rules {
    ($($variant:ident => $name:literal,)+) => {
        /// Syntactic category produced by one grammar production
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum GrammarRule {
            $($variant,)+
        }

        impl GrammarRule {
            /// Every rule, in declaration order
            pub const ALL: &'static [GrammarRule] = &[$(GrammarRule::$variant,)+];

            /// Conventional upper-case rule name, e.g. `COMPARISON_EXPRESSION`
            pub fn name(&self) -> &'static str {
                match self {
                    $(GrammarRule::$variant => $name,)+
                }
            }
        }
    };
}

grammar_rules! {
    // Compilation unit
    FileInput => "FILE_INPUT",

    // Blocks and declarations
    BlockStatement => "BLOCK_STATEMENT",
    DeclareSection => "DECLARE_SECTION",
    VariableDeclaration => "VARIABLE_DECLARATION",
    ExceptionDeclaration => "EXCEPTION_DECLARATION",
    CursorDeclaration => "CURSOR_DECLARATION",
    Datatype => "DATATYPE",
    ExceptionHandler => "EXCEPTION_HANDLER",
    Label => "LABEL",

    // PL/SQL statements
    NullStatement => "NULL_STATEMENT",
    AssignmentStatement => "ASSIGNMENT_STATEMENT",
    CallStatement => "CALL_STATEMENT",
    IfStatement => "IF_STATEMENT",
    ElsifClause => "ELSIF_CLAUSE",
    ElseClause => "ELSE_CLAUSE",
    LoopStatement => "LOOP_STATEMENT",
    WhileStatement => "WHILE_STATEMENT",
    ForStatement => "FOR_STATEMENT",
    ExitStatement => "EXIT_STATEMENT",
    ContinueStatement => "CONTINUE_STATEMENT",
    ReturnStatement => "RETURN_STATEMENT",
    RaiseStatement => "RAISE_STATEMENT",

    // SQL statements and clauses
    CommitStatement => "COMMIT_STATEMENT",
    RollbackStatement => "ROLLBACK_STATEMENT",
    SelectStatement => "SELECT_STATEMENT",
    SelectExpression => "SELECT_EXPRESSION",
    SelectColumn => "SELECT_COLUMN",
    IntoClause => "INTO_CLAUSE",
    FromClause => "FROM_CLAUSE",
    TableReference => "TABLE_REFERENCE",
    WhereClause => "WHERE_CLAUSE",
    GroupByClause => "GROUP_BY_CLAUSE",
    OrderByClause => "ORDER_BY_CLAUSE",
    ForUpdateClause => "FOR_UPDATE_CLAUSE",
    ColumnReference => "COLUMN_REFERENCE",
    InsertStatement => "INSERT_STATEMENT",
    UpdateStatement => "UPDATE_STATEMENT",
    SetClause => "SET_CLAUSE",
    DeleteStatement => "DELETE_STATEMENT",

    // Expressions
    OrExpression => "OR_EXPRESSION",
    AndExpression => "AND_EXPRESSION",
    NotExpression => "NOT_EXPRESSION",
    ComparisonExpression => "COMPARISON_EXPRESSION",
    RelationalOperator => "RELATIONAL_OPERATOR",
    IsNullExpression => "IS_NULL_EXPRESSION",
    LikeExpression => "LIKE_EXPRESSION",
    BetweenExpression => "BETWEEN_EXPRESSION",
    InExpression => "IN_EXPRESSION",
    ConcatenationExpression => "CONCATENATION_EXPRESSION",
    AdditiveExpression => "ADDITIVE_EXPRESSION",
    MultiplicativeExpression => "MULTIPLICATIVE_EXPRESSION",
    UnaryExpression => "UNARY_EXPRESSION",
    ExponentiationExpression => "EXPONENTIATION_EXPRESSION",
    BracketedExpression => "BRACKETED_EXPRESSION",
    NumericLiteral => "NUMERIC_LITERAL",
    CharacterLiteral => "CHARACTER_LITERAL",
    BooleanLiteral => "BOOLEAN_LITERAL",
    NullLiteral => "NULL_LITERAL",
    BindVariable => "BIND_VARIABLE",
    VariableName => "VARIABLE_NAME",
    MemberExpression => "MEMBER_EXPRESSION",
    MethodCall => "METHOD_CALL",
    Arguments => "ARGUMENTS",
    Argument => "ARGUMENT",
    AttributeExpression => "ATTRIBUTE_EXPRESSION",
}

impl fmt::Display for GrammarRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tag of an AST node: the rule that produced it, or the token type of a leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Rule(GrammarRule),
    Token(TokenType),
}

impl From<GrammarRule> for NodeKind {
    fn from(rule: GrammarRule) -> Self {
        NodeKind::Rule(rule)
    }
}

impl From<TokenType> for NodeKind {
    fn from(token_type: TokenType) -> Self {
        NodeKind::Token(token_type)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NodeKind::Rule(rule) => write!(f, "{}", rule),
            NodeKind::Token(token_type) => write!(f, "{:?}", token_type),
        }
    }
}
