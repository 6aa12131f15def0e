// ABOUTME: Pratt parser turning the token stream into a syntax tree

use crate::ast::{Block, Expr, Ident, Root, Stmt};
use crate::errors::SyntaxError;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use std::rc::Rc;

/// Binding strength, lowest to highest. An infix token only captures the
/// expression to its left when its precedence beats the enclosing level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Or,
    And,
    Equality,
    Relational,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Or => Precedence::Or,
        TokenKind::And => Precedence::And,
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equality,
        TokenKind::Lt | TokenKind::Gt | TokenKind::Le | TokenKind::Ge => Precedence::Relational,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent => Precedence::Product,
        TokenKind::LParen => Precedence::Call,
        TokenKind::LBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

/// The parser accumulates errors instead of raising them: a failed
/// sub-parse records a diagnostic and drops the enclosing node, and parsing
/// continues with the next statement.
pub struct Parser {
    lexer: Lexer,
    cur: Token,
    peek: Token,
    errors: Vec<SyntaxError>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let cur = lexer.next_token();
        let peek = lexer.next_token();
        Parser {
            lexer,
            cur,
            peek,
            errors: Vec::new(),
        }
    }

    pub fn parse(&mut self) -> Root {
        let mut root = Root::default();
        while self.cur.kind != TokenKind::Eof {
            if let Some(stmt) = self.parse_stmt() {
                root.statements.push(stmt);
            }
            self.next_token();
        }
        root
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    fn next_token(&mut self) {
        let next = self.lexer.next_token();
        self.cur = std::mem::replace(&mut self.peek, next);
    }

    /// Advances when the next token has the wanted kind; otherwise records
    /// error 101 and leaves the position unchanged.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.peek.kind == kind {
            self.next_token();
            true
        } else {
            self.errors.push(SyntaxError::new(
                101,
                self.peek.line,
                &[&kind, &self.peek.literal],
            ));
            false
        }
    }

    fn eat_semicolon(&mut self) {
        if self.peek.kind == TokenKind::Semicolon {
            self.next_token();
        }
    }

    fn parse_stmt(&mut self) -> Option<Stmt> {
        match self.cur.kind {
            TokenKind::Make => self.parse_make(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Loop => self.parse_loop(),
            TokenKind::Stop => self.parse_stop(),
            TokenKind::Semicolon => None,
            _ => self.parse_expression_stmt(),
        }
    }

    fn parse_make(&mut self) -> Option<Stmt> {
        let token = self.cur.clone();
        if !self.expect(TokenKind::Ident) {
            return None;
        }
        let name = Ident::from_token(self.cur.clone());
        if !self.expect(TokenKind::Assign) {
            return None;
        }
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.eat_semicolon();
        Some(Stmt::Make { token, name, value })
    }

    fn parse_return(&mut self) -> Option<Stmt> {
        let token = self.cur.clone();
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest);
        self.eat_semicolon();
        Some(Stmt::Return { token, value })
    }

    fn parse_stop(&mut self) -> Option<Stmt> {
        let token = self.cur.clone();
        self.eat_semicolon();
        Some(Stmt::Stop { token })
    }

    fn parse_loop(&mut self) -> Option<Stmt> {
        let token = self.cur.clone();
        let condition = if self.peek.kind == TokenKind::LBrace {
            // `loop { ... }` runs until something stops it.
            Expr::Bool {
                token: Token::new(TokenKind::True, "true", token.line),
                value: true,
            }
        } else {
            self.next_token();
            self.parse_expression(Precedence::Lowest)?
        };
        if !self.expect(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block();
        self.eat_semicolon();
        Some(Stmt::Loop {
            token,
            condition,
            body,
        })
    }

    fn parse_expression_stmt(&mut self) -> Option<Stmt> {
        let token = self.cur.clone();
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.eat_semicolon();
        Some(Stmt::Expression { token, expr })
    }

    fn parse_expression(&mut self, level: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;
        while level < precedence_of(self.peek.kind) {
            self.next_token();
            left = self.parse_infix(left)?;
        }
        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.cur.kind {
            TokenKind::If => self.parse_if(),
            TokenKind::Func => self.parse_function(),
            TokenKind::Ident => self.parse_ident(),
            TokenKind::Int => self.parse_int(),
            TokenKind::Float => self.parse_float(),
            TokenKind::True | TokenKind::False => Some(Expr::Bool {
                token: self.cur.clone(),
                value: self.cur.kind == TokenKind::True,
            }),
            TokenKind::Str => Some(Expr::Str {
                token: self.cur.clone(),
                value: self.cur.literal.clone(),
            }),
            TokenKind::LParen => self.parse_group(),
            TokenKind::LBracket => self.parse_array(),
            TokenKind::Minus | TokenKind::Bang => self.parse_prefix_op(),
            TokenKind::Assign => {
                // A stray `=` in expression position is almost always a
                // mistyped `==`.
                self.errors.push(SyntaxError::new(
                    122,
                    self.cur.line,
                    &[&self.cur.literal],
                ));
                None
            }
            _ => {
                self.errors.push(SyntaxError::new(
                    121,
                    self.cur.line,
                    &[&self.cur.literal],
                ));
                None
            }
        }
    }

    fn parse_infix(&mut self, left: Expr) -> Option<Expr> {
        match self.cur.kind {
            TokenKind::LParen => self.parse_call(left),
            TokenKind::LBracket => self.parse_index(left),
            _ => {
                let token = self.cur.clone();
                let operator = token.literal.clone();
                let level = precedence_of(token.kind);
                self.next_token();
                let right = self.parse_expression(level)?;
                Some(Expr::Infix {
                    token,
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
        }
    }

    fn parse_ident(&mut self) -> Option<Expr> {
        if self.cur.literal.contains('\u{3000}') {
            self.errors
                .push(SyntaxError::new(130, self.cur.line, &[]));
        }
        if self.peek.kind == TokenKind::Assign {
            let token = self.cur.clone();
            let name = Ident::from_token(token.clone());
            self.next_token();
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            self.eat_semicolon();
            return Some(Expr::Assign {
                token,
                name,
                value: Box::new(value),
            });
        }
        Some(Expr::Ident(Ident::from_token(self.cur.clone())))
    }

    fn parse_int(&mut self) -> Option<Expr> {
        match self.cur.literal.parse::<i64>() {
            Ok(value) => Some(Expr::Int {
                token: self.cur.clone(),
                value,
            }),
            Err(_) => {
                self.errors.push(SyntaxError::new(
                    111,
                    self.cur.line,
                    &[&self.cur.literal],
                ));
                None
            }
        }
    }

    fn parse_float(&mut self) -> Option<Expr> {
        match self.cur.literal.parse::<f64>() {
            Ok(value) => Some(Expr::Float {
                token: self.cur.clone(),
                value,
            }),
            Err(_) => {
                self.errors.push(SyntaxError::new(
                    112,
                    self.cur.line,
                    &[&self.cur.literal],
                ));
                None
            }
        }
    }

    fn parse_group(&mut self) -> Option<Expr> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect(TokenKind::RParen) {
            return None;
        }
        Some(expr)
    }

    fn parse_prefix_op(&mut self) -> Option<Expr> {
        let token = self.cur.clone();
        let operator = token.literal.clone();
        self.next_token();
        let operand = self.parse_expression(Precedence::Prefix)?;
        Some(Expr::Prefix {
            token,
            operator,
            operand: Box::new(operand),
        })
    }

    fn parse_if(&mut self) -> Option<Expr> {
        let token = self.cur.clone();
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect(TokenKind::LBrace) {
            return None;
        }
        let consequence = self.parse_block();
        let mut alternative = None;
        if self.peek.kind == TokenKind::Else {
            self.next_token();
            if self.peek.kind == TokenKind::If {
                // `else if` recurses: the nested if becomes the single
                // statement of the alternative block.
                let else_token = self.cur.clone();
                self.next_token();
                let nested = self.parse_if()?;
                alternative = Some(Block {
                    token: else_token.clone(),
                    statements: vec![Stmt::Expression {
                        token: else_token,
                        expr: nested,
                    }],
                });
            } else {
                if !self.expect(TokenKind::LBrace) {
                    return None;
                }
                alternative = Some(self.parse_block());
            }
        }
        Some(Expr::If {
            token,
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function(&mut self) -> Option<Expr> {
        let token = self.cur.clone();
        let name = if self.peek.kind == TokenKind::Ident {
            self.next_token();
            Some(Ident::from_token(self.cur.clone()))
        } else {
            None
        };
        if !self.expect(TokenKind::LParen) {
            return None;
        }
        let params = self.parse_params()?;
        if !self.expect(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block();
        Some(Expr::Function {
            token,
            name,
            params: Rc::new(params),
            body: Rc::new(body),
        })
    }

    fn parse_params(&mut self) -> Option<Vec<Ident>> {
        let mut params = Vec::new();
        if self.peek.kind == TokenKind::RParen {
            self.next_token();
            return Some(params);
        }
        self.next_token();
        params.push(Ident::from_token(self.cur.clone()));
        while self.peek.kind == TokenKind::Comma {
            self.next_token();
            self.next_token();
            params.push(Ident::from_token(self.cur.clone()));
        }
        if !self.expect(TokenKind::RParen) {
            return None;
        }
        Some(params)
    }

    fn parse_call(&mut self, function: Expr) -> Option<Expr> {
        let token = self.cur.clone();
        let args = self.parse_list(TokenKind::RParen)?;
        Some(Expr::Call {
            token,
            function: Box::new(function),
            args,
        })
    }

    fn parse_array(&mut self) -> Option<Expr> {
        let token = self.cur.clone();
        let elements = self.parse_list(TokenKind::RBracket)?;
        Some(Expr::Array { token, elements })
    }

    /// Comma-separated expressions up to `end`; shared by calls and arrays.
    fn parse_list(&mut self, end: TokenKind) -> Option<Vec<Expr>> {
        let mut list = Vec::new();
        if self.peek.kind == end {
            self.next_token();
            return Some(list);
        }
        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek.kind == TokenKind::Comma {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        if !self.expect(end) {
            return None;
        }
        Some(list)
    }

    fn parse_index(&mut self, left: Expr) -> Option<Expr> {
        let token = self.cur.clone();
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect(TokenKind::RBracket) {
            return None;
        }
        Some(Expr::Index {
            token,
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_block(&mut self) -> Block {
        let token = self.cur.clone();
        let mut statements = Vec::new();
        self.next_token();
        while self.cur.kind != TokenKind::RBrace && self.cur.kind != TokenKind::Eof {
            if let Some(stmt) = self.parse_stmt() {
                statements.push(stmt);
            }
            self.next_token();
        }
        Block { token, statements }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> Root {
        let mut parser = Parser::new(Lexer::new(input));
        let root = parser.parse();
        assert!(
            parser.errors().is_empty(),
            "unexpected syntax errors for {:?}: {:?}",
            input,
            parser.errors()
        );
        root
    }

    fn parse_errors(input: &str) -> Vec<SyntaxError> {
        let mut parser = Parser::new(Lexer::new(input));
        parser.parse();
        parser.errors().to_vec()
    }

    fn first_expr(root: &Root) -> &Expr {
        match &root.statements[0] {
            Stmt::Expression { expr, .. } => expr,
            other => panic!("expected an expression statement, got {}", other),
        }
    }

    #[test]
    fn test_make_statement() {
        let root = parse_ok("make x = 5");
        assert_eq!(root.statements.len(), 1);
        match &root.statements[0] {
            Stmt::Make { name, value, .. } => {
                assert_eq!(name.name, "x");
                assert!(matches!(value, Expr::Int { value: 5, .. }));
            }
            other => panic!("expected make, got {}", other),
        }
    }

    #[test]
    fn test_assignment_is_not_a_binding() {
        let root = parse_ok("x = 5");
        assert!(matches!(first_expr(&root), Expr::Assign { .. }));
    }

    #[test]
    fn test_operator_precedence() {
        let cases = [
            ("1 + 2 * 3", "(1 + (2 * 3))"),
            ("a - b - c", "((a - b) - c)"),
            ("-a * b", "((-a) * b)"),
            ("!true == false", "((!true) == false)"),
            ("1 < 2 == true", "((1 < 2) == true)"),
            ("a or b and c", "(a or (b and c))"),
            ("(1 + 2) * 3", "((1 + 2) * 3)"),
            ("a + b % c", "(a + (b % c))"),
            ("-a[0]", "(-(a[0]))"),
            ("f(1, 2 + 3)", "f(1, (2 + 3))"),
        ];
        for (input, expected) in cases {
            let root = parse_ok(input);
            assert_eq!(first_expr(&root).to_string(), expected, "input {:?}", input);
        }
    }

    #[test]
    fn test_if_without_else() {
        let root = parse_ok("if x < 1 { 2 }");
        match first_expr(&root) {
            Expr::If { alternative, .. } => assert!(alternative.is_none()),
            other => panic!("expected if, got {}", other),
        }
    }

    #[test]
    fn test_if_else() {
        let root = parse_ok("if x { 1 } else { 2 }");
        match first_expr(&root) {
            Expr::If { alternative, .. } => {
                assert_eq!(alternative.as_ref().unwrap().statements.len(), 1);
            }
            other => panic!("expected if, got {}", other),
        }
    }

    #[test]
    fn test_else_if_chains() {
        let root = parse_ok("if a { 1 } else if b { 2 } else { 3 }");
        match first_expr(&root) {
            Expr::If { alternative, .. } => {
                let alternative = alternative.as_ref().unwrap();
                assert_eq!(alternative.statements.len(), 1);
                match &alternative.statements[0] {
                    Stmt::Expression {
                        expr: Expr::If { alternative, .. },
                        ..
                    } => assert!(alternative.is_some()),
                    other => panic!("expected a nested if, got {}", other),
                }
            }
            other => panic!("expected if, got {}", other),
        }
    }

    #[test]
    fn test_loop_with_condition() {
        let root = parse_ok("loop x < 3 { x = x + 1 }");
        match &root.statements[0] {
            Stmt::Loop {
                condition, body, ..
            } => {
                assert_eq!(condition.to_string(), "(x < 3)");
                assert_eq!(body.statements.len(), 1);
            }
            other => panic!("expected loop, got {}", other),
        }
    }

    #[test]
    fn test_loop_without_condition_defaults_to_true() {
        let root = parse_ok("loop { stop }");
        match &root.statements[0] {
            Stmt::Loop { condition, .. } => {
                assert!(matches!(condition, Expr::Bool { value: true, .. }));
            }
            other => panic!("expected loop, got {}", other),
        }
    }

    #[test]
    fn test_named_function() {
        let root = parse_ok("func add(a, b) { return a + b }");
        match first_expr(&root) {
            Expr::Function { name, params, .. } => {
                assert_eq!(name.as_ref().unwrap().name, "add");
                let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["a", "b"]);
            }
            other => panic!("expected function, got {}", other),
        }
    }

    #[test]
    fn test_anonymous_function_with_empty_params() {
        let root = parse_ok("make f = func() { return 1 }");
        match &root.statements[0] {
            Stmt::Make { value, .. } => match value {
                Expr::Function { name, params, .. } => {
                    assert!(name.is_none());
                    assert!(params.is_empty());
                }
                other => panic!("expected function, got {}", other),
            },
            other => panic!("expected make, got {}", other),
        }
    }

    #[test]
    fn test_array_and_index() {
        let root = parse_ok("[1, 2 * 2, \"x\"][1]");
        match first_expr(&root) {
            Expr::Index { left, index, .. } => {
                assert!(matches!(**left, Expr::Array { .. }));
                assert_eq!(index.to_string(), "1");
            }
            other => panic!("expected index, got {}", other),
        }
    }

    #[test]
    fn test_call_on_call_result() {
        let root = parse_ok("mk(3)(4)");
        assert_eq!(first_expr(&root).to_string(), "mk(3)(4)");
    }

    #[test]
    fn test_newlines_separate_statements() {
        let root = parse_ok("make x = 1\nmake y = 2\nx + y");
        assert_eq!(root.statements.len(), 3);
    }

    #[test]
    fn test_missing_name_in_make() {
        let errors = parse_errors("make = 5");
        assert!(!errors.is_empty());
        assert_eq!(errors[0].code, 101);
    }

    #[test]
    fn test_stray_assign_suggests_equality() {
        let errors = parse_errors("1 + = 2");
        assert!(errors.iter().any(|e| e.code == 122));
    }

    #[test]
    fn test_unexpected_token_in_expression() {
        let errors = parse_errors("make x = *");
        assert!(errors.iter().any(|e| e.code == 121));
    }

    #[test]
    fn test_full_width_space_in_identifier() {
        // The full-width space is an identifier character as far as the
        // scanner cares; the parser flags it when the name is used.
        let errors = parse_errors("a\u{3000}b + 1");
        assert!(errors.iter().any(|e| e.code == 130));
    }

    #[test]
    fn test_parser_keeps_going_after_errors() {
        let mut parser = Parser::new(Lexer::new("make = 1\nmake y = 2"));
        let root = parser.parse();
        assert!(!parser.errors().is_empty());
        // The statement after the broken one still parses.
        assert!(root
            .statements
            .iter()
            .any(|s| matches!(s, Stmt::Make { name, .. } if name.name == "y")));
    }

    #[test]
    fn test_huge_integer_literal_is_reported() {
        let errors = parse_errors("99999999999999999999999999");
        assert!(errors.iter().any(|e| e.code == 111));
    }
}
