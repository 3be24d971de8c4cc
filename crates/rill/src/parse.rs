//! The recursive-descent parser: tokens to statements.
//!
//! Errors are reported to the [`DiagnosticSink`] and recovered from by
//! synchronizing to the next statement boundary, so one pass surfaces as many
//! problems as possible. The caller never sees a failed parse as `Err`; it
//! sees diagnostics plus whatever statements survived.
//!
//! Two constructs are desugared here rather than represented in the AST:
//! `for` loops become `while` loops (with init and increment spliced into
//! blocks), and `fun` followed by an identifier is a declaration while any
//! other `fun` starts a lambda expression.

use std::rc::Rc;

use crate::{
    diagnostics::DiagnosticSink,
    expressions::{
        BinaryOp, Expr, ExprLoc, FunctionDecl, Literal, LogicalOp, Name, Stmt, UnaryOp, VarUse, VarUseId,
    },
    intern::Interner,
    scan::{Token, TokenKind},
};

/// Hard limit on parameter and argument counts. Exceeding it is a diagnostic,
/// not a parse failure.
const MAX_ARITY: usize = 255;

/// Result of parsing one token stream.
pub(crate) struct ParseOutcome {
    pub stmts: Vec<Stmt>,
    /// One past the highest [`VarUseId`] allocated; the size the resolver's
    /// depth table needs to grow to.
    pub var_use_count: u32,
}

/// Parses `tokens` into statements, reporting errors to `sink`.
///
/// `first_use_id` seeds the variable-use counter; a REPL session passes the
/// count from its previous line so ids stay dense and unique across lines.
pub(crate) fn parse(
    tokens: Vec<Token>,
    interner: &Interner,
    first_use_id: u32,
    sink: &mut impl DiagnosticSink,
) -> ParseOutcome {
    let mut parser = Parser {
        tokens,
        current: 0,
        interner,
        sink,
        loop_depth: 0,
        use_counter: first_use_id,
    };
    let stmts = parser.program();
    ParseOutcome {
        stmts,
        var_use_count: parser.use_counter,
    }
}

/// Internal signal that a parse error was reported and the current construct
/// should be abandoned; `declaration` catches it and synchronizes.
struct Recover;

type PResult<T> = Result<T, Recover>;

struct Parser<'a, S: DiagnosticSink> {
    tokens: Vec<Token>,
    current: usize,
    interner: &'a Interner,
    sink: &'a mut S,
    /// Lexical loop nesting; zeroed while parsing a function body so `break`
    /// cannot cross a function boundary.
    loop_depth: u32,
    use_counter: u32,
}

impl<S: DiagnosticSink> Parser<'_, S> {
    fn program(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                stmts.push(stmt);
            }
        }
        stmts
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.check(TokenKind::Fun) && self.check_next_identifier() {
            self.advance();
            self.function_declaration()
        } else if self.match_kind(TokenKind::Var) {
            self.var_declaration()
        } else {
            self.statement()
        };
        match result {
            Ok(stmt) => Some(stmt),
            Err(Recover) => {
                self.synchronize();
                None
            }
        }
    }

    fn var_declaration(&mut self) -> PResult<Stmt> {
        let name = self.consume_identifier("Expect variable name.")?;
        let initializer = if self.match_kind(TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    fn function_declaration(&mut self) -> PResult<Stmt> {
        let name = self.consume_identifier("Expect function name.")?;
        let decl = self.function_rest(Some(name))?;
        Ok(Stmt::Function(Rc::new(decl)))
    }

    /// Parses `( params? ) block`, shared by declarations and lambdas; the
    /// `fun` keyword (and name, if any) has already been consumed.
    fn function_rest(&mut self, name: Option<Name>) -> PResult<FunctionDecl> {
        let paren_message = if name.is_some() {
            "Expect '(' after function name."
        } else {
            "Expect '(' after 'fun'."
        };
        self.consume(TokenKind::LeftParen, paren_message)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARITY {
                    self.report_at(self.current, "Can't have more than 255 parameters.");
                }
                params.push(self.consume_identifier("Expect parameter name.")?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;
        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.")?;
        // break may not escape the function, whatever loops surround it
        let enclosing_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.block();
        self.loop_depth = enclosing_loop_depth;
        Ok(FunctionDecl {
            name,
            params,
            body: body?,
        })
    }

    fn statement(&mut self) -> PResult<Stmt> {
        if self.match_kind(TokenKind::Print) {
            return self.print_statement();
        }
        if self.match_kind(TokenKind::LeftBrace) {
            return Ok(Stmt::Block(self.block()?));
        }
        if self.match_kind(TokenKind::If) {
            return self.if_statement();
        }
        if self.match_kind(TokenKind::While) {
            return self.while_statement();
        }
        if self.match_kind(TokenKind::For) {
            return self.for_statement();
        }
        if self.match_kind(TokenKind::Break) {
            return self.break_statement();
        }
        if self.match_kind(TokenKind::Return) {
            return self.return_statement();
        }
        self.expression_statement()
    }

    fn print_statement(&mut self) -> PResult<Stmt> {
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(value))
    }

    fn block(&mut self) -> PResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                stmts.push(stmt);
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(stmts)
    }

    fn if_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_kind(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;
        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;
        Ok(Stmt::While {
            condition,
            body: Box::new(body?),
        })
    }

    /// `for (init; cond; inc) body` desugars to
    /// `{ init; while (cond) { body; inc; } }` with each piece omissible and
    /// the condition defaulting to `true`.
    fn for_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;
        let initializer = if self.match_kind(TokenKind::Semicolon) {
            None
        } else if self.match_kind(TokenKind::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };
        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        let condition_line = self.peek().line;
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;
        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;
        let mut desugared = body?;

        if let Some(increment) = increment {
            desugared = Stmt::Block(vec![desugared, Stmt::Expression(increment)]);
        }
        let condition =
            condition.unwrap_or_else(|| ExprLoc::new(condition_line, Expr::Literal(Literal::Bool(true))));
        desugared = Stmt::While {
            condition,
            body: Box::new(desugared),
        };
        if let Some(initializer) = initializer {
            desugared = Stmt::Block(vec![initializer, desugared]);
        }
        Ok(desugared)
    }

    fn break_statement(&mut self) -> PResult<Stmt> {
        let line = self.previous().line;
        if self.loop_depth == 0 {
            self.report_at(self.current - 1, "Can't use 'break' outside of a loop.");
        }
        self.consume(TokenKind::Semicolon, "Expect ';' after 'break'.")?;
        Ok(Stmt::Break { line })
    }

    fn return_statement(&mut self) -> PResult<Stmt> {
        let line = self.previous().line;
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { line, value })
    }

    fn expression_statement(&mut self) -> PResult<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn expression(&mut self) -> PResult<ExprLoc> {
        self.assignment()
    }

    /// `=` is right-associative and only a plain variable is a valid target.
    /// A bad target is a diagnostic, not a parse failure; the left-hand
    /// expression is returned as-is.
    fn assignment(&mut self) -> PResult<ExprLoc> {
        let expr = self.ternary()?;
        if self.match_kind(TokenKind::Equal) {
            let equals_index = self.current - 1;
            let value = self.assignment()?;
            return match expr.expr {
                Expr::Variable(target) => Ok(ExprLoc::new(
                    expr.line,
                    Expr::Assign {
                        target,
                        value: Box::new(value),
                    },
                )),
                other => {
                    self.report_at(equals_index, "Invalid assignment target.");
                    Ok(ExprLoc::new(expr.line, other))
                }
            };
        }
        Ok(expr)
    }

    fn ternary(&mut self) -> PResult<ExprLoc> {
        let cond = self.logic_or()?;
        if self.match_kind(TokenKind::Question) {
            let line = self.previous().line;
            let if_true = self.ternary()?;
            self.consume(TokenKind::Colon, "Expect ':' after then branch of ternary.")?;
            let if_false = self.ternary()?;
            return Ok(ExprLoc::new(
                line,
                Expr::Ternary {
                    cond: Box::new(cond),
                    if_true: Box::new(if_true),
                    if_false: Box::new(if_false),
                },
            ));
        }
        Ok(cond)
    }

    fn logic_or(&mut self) -> PResult<ExprLoc> {
        let mut expr = self.logic_and()?;
        while self.match_kind(TokenKind::Or) {
            let line = self.previous().line;
            let right = self.logic_and()?;
            expr = ExprLoc::new(
                line,
                Expr::Logical {
                    left: Box::new(expr),
                    op: LogicalOp::Or,
                    right: Box::new(right),
                },
            );
        }
        Ok(expr)
    }

    fn logic_and(&mut self) -> PResult<ExprLoc> {
        let mut expr = self.equality()?;
        while self.match_kind(TokenKind::And) {
            let line = self.previous().line;
            let right = self.equality()?;
            expr = ExprLoc::new(
                line,
                Expr::Logical {
                    left: Box::new(expr),
                    op: LogicalOp::And,
                    right: Box::new(right),
                },
            );
        }
        Ok(expr)
    }

    fn equality(&mut self) -> PResult<ExprLoc> {
        let mut expr = self.comparison()?;
        while let Some((op, line)) = self.match_op(&[
            (TokenKind::BangEqual, BinaryOp::NotEq),
            (TokenKind::EqualEqual, BinaryOp::Eq),
        ]) {
            let right = self.comparison()?;
            expr = binary(expr, op, line, right);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> PResult<ExprLoc> {
        let mut expr = self.term()?;
        while let Some((op, line)) = self.match_op(&[
            (TokenKind::Greater, BinaryOp::Gt),
            (TokenKind::GreaterEqual, BinaryOp::GtE),
            (TokenKind::Less, BinaryOp::Lt),
            (TokenKind::LessEqual, BinaryOp::LtE),
        ]) {
            let right = self.term()?;
            expr = binary(expr, op, line, right);
        }
        Ok(expr)
    }

    fn term(&mut self) -> PResult<ExprLoc> {
        let mut expr = self.factor()?;
        while let Some((op, line)) = self.match_op(&[
            (TokenKind::Minus, BinaryOp::Sub),
            (TokenKind::Plus, BinaryOp::Add),
        ]) {
            let right = self.factor()?;
            expr = binary(expr, op, line, right);
        }
        Ok(expr)
    }

    fn factor(&mut self) -> PResult<ExprLoc> {
        let mut expr = self.unary()?;
        while let Some((op, line)) = self.match_op(&[
            (TokenKind::Slash, BinaryOp::Div),
            (TokenKind::Star, BinaryOp::Mul),
        ]) {
            let right = self.unary()?;
            expr = binary(expr, op, line, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> PResult<ExprLoc> {
        let op = if self.match_kind(TokenKind::Bang) {
            Some(UnaryOp::Not)
        } else if self.match_kind(TokenKind::Minus) {
            Some(UnaryOp::Neg)
        } else {
            None
        };
        if let Some(op) = op {
            let line = self.previous().line;
            let operand = self.unary()?;
            return Ok(ExprLoc::new(
                line,
                Expr::Unary {
                    op,
                    operand: Box::new(operand),
                },
            ));
        }
        self.call()
    }

    fn call(&mut self) -> PResult<ExprLoc> {
        let mut expr = self.lambda()?;
        while self.match_kind(TokenKind::LeftParen) {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: ExprLoc) -> PResult<ExprLoc> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if args.len() >= MAX_ARITY {
                    self.report_at(self.current, "Can't have more than 255 arguments.");
                }
                args.push(self.expression()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        // call errors report at the closing paren
        let paren_line = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok(ExprLoc::new(
            paren_line,
            Expr::Call {
                callee: Box::new(callee),
                args,
            },
        ))
    }

    fn lambda(&mut self) -> PResult<ExprLoc> {
        if self.check(TokenKind::Fun) {
            let line = self.peek().line;
            self.advance();
            let decl = self.function_rest(None)?;
            return Ok(ExprLoc::new(line, Expr::Lambda(Rc::new(decl))));
        }
        self.primary()
    }

    fn primary(&mut self) -> PResult<ExprLoc> {
        let token = *self.peek();
        match token.kind {
            TokenKind::True => {
                self.advance();
                Ok(ExprLoc::new(token.line, Expr::Literal(Literal::Bool(true))))
            }
            TokenKind::False => {
                self.advance();
                Ok(ExprLoc::new(token.line, Expr::Literal(Literal::Bool(false))))
            }
            TokenKind::Nil => {
                self.advance();
                Ok(ExprLoc::new(token.line, Expr::Literal(Literal::Nil)))
            }
            TokenKind::Number(value) => {
                self.advance();
                Ok(ExprLoc::new(token.line, Expr::Literal(Literal::Number(value))))
            }
            TokenKind::Str(id) => {
                self.advance();
                Ok(ExprLoc::new(token.line, Expr::Literal(Literal::Str(id))))
            }
            TokenKind::Identifier(id) => {
                self.advance();
                let use_id = self.next_use_id();
                Ok(ExprLoc::new(
                    token.line,
                    Expr::Variable(VarUse {
                        name: id,
                        line: token.line,
                        use_id,
                    }),
                ))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.expression()?;
                self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
                Ok(ExprLoc::new(token.line, Expr::Grouping(Box::new(inner))))
            }
            _ => Err(self.error_at_current("Expect expression.")),
        }
    }

    /// Discards tokens until a likely statement boundary: just past a `;`,
    /// or just before a statement-starter keyword. Both conditions are
    /// checked every iteration.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {}
            }
            self.advance();
        }
    }

    // token plumbing

    fn next_use_id(&mut self) -> VarUseId {
        let id = VarUseId::new(self.use_counter);
        self.use_counter += 1;
        id
    }

    fn match_op(&mut self, table: &[(TokenKind, BinaryOp)]) -> Option<(BinaryOp, u32)> {
        for &(kind, op) in table {
            if self.match_kind(kind) {
                return Some((op, self.previous().line));
            }
        }
        None
    }

    /// Consumes the expected token and returns its line, or reports `message`.
    fn consume(&mut self, kind: TokenKind, message: &str) -> PResult<u32> {
        if self.check(kind) {
            let line = self.peek().line;
            self.advance();
            Ok(line)
        } else {
            Err(self.error_at_current(message))
        }
    }

    fn consume_identifier(&mut self, message: &str) -> PResult<Name> {
        if let TokenKind::Identifier(id) = self.peek().kind {
            let line = self.peek().line;
            self.advance();
            Ok(Name { id, line })
        } else {
            Err(self.error_at_current(message))
        }
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Only valid for payload-free kinds; literal kinds have their own
    /// matchers above.
    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn check_next_identifier(&self) -> bool {
        matches!(
            self.tokens.get(self.current + 1).map(|t| t.kind),
            Some(TokenKind::Identifier(_))
        )
    }

    fn error_at_current(&mut self, message: &str) -> Recover {
        self.report_at(self.current, message);
        Recover
    }

    /// Reports a diagnostic at the token at `index` without raising recovery.
    fn report_at(&mut self, index: usize, message: &str) {
        let token = self.tokens[index];
        let text = if token.kind == TokenKind::Eof {
            format!("Error at end: {message}")
        } else {
            format!("Error at '{}': {message}", token.lexeme(self.interner))
        };
        self.sink.report(token.line, &text);
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }
}

fn binary(left: ExprLoc, op: BinaryOp, line: u32, right: ExprLoc) -> ExprLoc {
    ExprLoc::new(
        line,
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
    )
}
