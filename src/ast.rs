// ABOUTME: Syntax tree node families produced by the parser

use crate::token::Token;
use std::fmt;
use std::rc::Rc;

/// The whole program: an ordered sequence of statements.
#[derive(Debug, Clone, Default)]
pub struct Root {
    pub statements: Vec<Stmt>,
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

/// An identifier occurrence, anchored to its token.
#[derive(Debug, Clone)]
pub struct Ident {
    pub token: Token,
    pub name: String,
}

impl Ident {
    pub fn from_token(token: Token) -> Self {
        let name = token.literal.clone();
        Ident { token, name }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A braced sequence of statements. Blocks do not open a new scope; only
/// function calls do.
#[derive(Debug, Clone)]
pub struct Block {
    pub token: Token,
    pub statements: Vec<Stmt>,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `make NAME = EXPR` — introduces a binding in the current scope.
    Make {
        token: Token,
        name: Ident,
        value: Expr,
    },
    /// `return EXPR` — the expression may be missing when the parser could
    /// not read one.
    Return { token: Token, value: Option<Expr> },
    /// `stop` — leaves the nearest enclosing loop.
    Stop { token: Token },
    /// `loop COND { ... }` — a missing condition parses as `true`.
    Loop {
        token: Token,
        condition: Expr,
        body: Block,
    },
    /// A bare expression in statement position.
    Expression { token: Token, expr: Expr },
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Stmt::Make { token, .. }
            | Stmt::Return { token, .. }
            | Stmt::Stop { token }
            | Stmt::Loop { token, .. }
            | Stmt::Expression { token, .. } => token.line,
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Make { name, value, .. } => write!(f, "make {} = {}", name, value),
            Stmt::Return { value, .. } => match value {
                Some(value) => write!(f, "return {};", value),
                None => write!(f, "return;"),
            },
            Stmt::Stop { .. } => write!(f, "stop"),
            Stmt::Loop {
                condition, body, ..
            } => write!(f, "loop {} {{{}}}", condition, body),
            Stmt::Expression { expr, .. } => write!(f, "{}", expr),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Ident(Ident),
    Int {
        token: Token,
        value: i64,
    },
    Float {
        token: Token,
        value: f64,
    },
    Bool {
        token: Token,
        value: bool,
    },
    Str {
        token: Token,
        value: String,
    },
    Array {
        token: Token,
        elements: Vec<Expr>,
    },
    Index {
        token: Token,
        left: Box<Expr>,
        index: Box<Expr>,
    },
    Prefix {
        token: Token,
        operator: String,
        operand: Box<Expr>,
    },
    Infix {
        token: Token,
        operator: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    If {
        token: Token,
        condition: Box<Expr>,
        consequence: Block,
        alternative: Option<Block>,
    },
    /// A function literal. Named functions bind themselves when evaluated;
    /// anonymous ones are plain values. Parameters and body are shared so a
    /// closure created in a loop does not clone the tree.
    Function {
        token: Token,
        name: Option<Ident>,
        params: Rc<Vec<Ident>>,
        body: Rc<Block>,
    },
    Call {
        token: Token,
        function: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `NAME = EXPR` — mutates an existing binding; usable in expression
    /// position but produces no value.
    Assign {
        token: Token,
        name: Ident,
        value: Box<Expr>,
    },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Ident(ident) => ident.token.line,
            Expr::Int { token, .. }
            | Expr::Float { token, .. }
            | Expr::Bool { token, .. }
            | Expr::Str { token, .. }
            | Expr::Array { token, .. }
            | Expr::Index { token, .. }
            | Expr::Prefix { token, .. }
            | Expr::Infix { token, .. }
            | Expr::If { token, .. }
            | Expr::Function { token, .. }
            | Expr::Call { token, .. }
            | Expr::Assign { token, .. } => token.line,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(ident) => write!(f, "{}", ident),
            Expr::Int { token, .. }
            | Expr::Float { token, .. }
            | Expr::Bool { token, .. } => write!(f, "{}", token.literal),
            Expr::Str { value, .. } => write!(f, "{}", value),
            Expr::Array { elements, .. } => {
                let rendered: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Expr::Index { left, index, .. } => write!(f, "({}[{}])", left, index),
            Expr::Prefix {
                operator, operand, ..
            } => write!(f, "({}{})", operator, operand),
            Expr::Infix {
                operator,
                left,
                right,
                ..
            } => write!(f, "({} {} {})", left, operator, right),
            Expr::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                write!(f, "if {} {{{}}}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {{{}}}", alternative)?;
                }
                Ok(())
            }
            Expr::Function {
                name, params, body, ..
            } => {
                let rendered: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                match name {
                    Some(name) => {
                        write!(f, "func {}({}) {{{}}}", name, rendered.join(", "), body)
                    }
                    None => write!(f, "func({}) {{{}}}", rendered.join(", "), body),
                }
            }
            Expr::Call { function, args, .. } => {
                let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", function, rendered.join(", "))
            }
            Expr::Assign { name, value, .. } => write!(f, "{} = {}", name, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn tok(kind: TokenKind, literal: &str) -> Token {
        Token::new(kind, literal, 1)
    }

    #[test]
    fn test_statement_display() {
        let stmt = Stmt::Make {
            token: tok(TokenKind::Make, "make"),
            name: Ident::from_token(tok(TokenKind::Ident, "x")),
            value: Expr::Int {
                token: tok(TokenKind::Int, "5"),
                value: 5,
            },
        };
        assert_eq!(stmt.to_string(), "make x = 5");
    }

    #[test]
    fn test_infix_display_is_parenthesized() {
        let expr = Expr::Infix {
            token: tok(TokenKind::Plus, "+"),
            operator: "+".to_string(),
            left: Box::new(Expr::Int {
                token: tok(TokenKind::Int, "1"),
                value: 1,
            }),
            right: Box::new(Expr::Int {
                token: tok(TokenKind::Int, "2"),
                value: 2,
            }),
        };
        assert_eq!(expr.to_string(), "(1 + 2)");
    }

    #[test]
    fn test_call_display() {
        let expr = Expr::Call {
            token: tok(TokenKind::LParen, "("),
            function: Box::new(Expr::Ident(Ident::from_token(tok(TokenKind::Ident, "f")))),
            args: vec![
                Expr::Int {
                    token: tok(TokenKind::Int, "1"),
                    value: 1,
                },
                Expr::Str {
                    token: tok(TokenKind::Str, "a"),
                    value: "a".to_string(),
                },
            ],
        };
        assert_eq!(expr.to_string(), "f(1, a)");
    }
}
