//! Recursive-descent parser from tokens to [`Script`].

use std::collections::HashSet;
use std::rc::Rc;

use crate::ast::{BinOp, Block, Expr, ExprKind, FnDecl, Script, Stmt, StmtKind, UnaryOp};
use crate::error::{Pos, Result, ScriptError};
use crate::interp::ScriptLimits;
use crate::lexer::{tokenize, Tok, Token};

/// Parse a whole script with the default nesting limit.
pub fn parse(source: &str) -> Result<Script> {
    parse_with_depth(source, ScriptLimits::default().max_nesting_depth)
}

/// Parse a whole script, rejecting expressions or blocks nested more than
/// `max_depth` levels.
pub fn parse_with_depth(source: &str, max_depth: usize) -> Result<Script> {
    let tokens = tokenize(source)?;
    Parser::new(tokens, max_depth).script()
}

struct Parser {
    tokens: Vec<Token>,
    at: usize,
    loop_depth: usize,
    in_fn: bool,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>, max_depth: usize) -> Self {
        Self {
            tokens,
            at: 0,
            loop_depth: 0,
            in_fn: false,
            depth: 0,
            max_depth,
        }
    }

    /// One level deeper; callers restore `depth` once the nested part parsed.
    fn nest(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(ScriptError::limit(
                self.pos(),
                format!("nesting deeper than {}", self.max_depth),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn peek(&self) -> &Tok {
        &self.current().tok
    }

    fn current(&self) -> &Token {
        // The token list always ends with Eof and `advance` never moves past it.
        &self.tokens[self.at.min(self.tokens.len() - 1)]
    }

    fn pos(&self) -> Pos {
        self.current().pos
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.tok != Tok::Eof {
            self.at += 1;
        }
        token
    }

    fn check(&self, tok: &Tok) -> bool {
        self.peek() == tok
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.check(tok) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: &Tok, context: &str) -> Result<Pos> {
        if self.check(tok) {
            Ok(self.advance().pos)
        } else {
            Err(self.unexpected(&format!("{tok} {context}")))
        }
    }

    fn ident(&mut self, context: &str) -> Result<String> {
        match self.peek().clone() {
            Tok::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(&format!("identifier {context}"))),
        }
    }

    fn unexpected(&self, expected: &str) -> ScriptError {
        ScriptError::syntax(
            self.pos(),
            format!("expected {expected}, found {}", self.peek()),
        )
    }

    fn script(mut self) -> Result<Script> {
        let mut script = Script::default();
        let mut names = HashSet::new();
        while !self.check(&Tok::Eof) {
            if self.check(&Tok::Fn) {
                let decl = self.fn_decl()?;
                if !names.insert(decl.name.clone()) {
                    return Err(ScriptError::syntax(
                        decl.pos,
                        format!("function `{}` is already declared", decl.name),
                    ));
                }
                script.functions.push(Rc::new(decl));
            } else {
                script.body.push(self.stmt()?);
            }
        }
        Ok(script)
    }

    fn fn_decl(&mut self) -> Result<FnDecl> {
        let pos = self.expect(&Tok::Fn, "")?;
        let name = self.ident("after `fn`")?;
        self.expect(&Tok::LParen, "after function name")?;
        let mut params = Vec::new();
        if !self.check(&Tok::RParen) {
            loop {
                let param_pos = self.pos();
                let param = self.ident("in parameter list")?;
                if params.contains(&param) {
                    return Err(ScriptError::syntax(
                        param_pos,
                        format!("duplicate parameter `{param}`"),
                    ));
                }
                params.push(param);
                if !self.eat(&Tok::Comma) {
                    break;
                }
            }
        }
        self.expect(&Tok::RParen, "to close parameter list")?;

        self.in_fn = true;
        let body = self.block();
        self.in_fn = false;
        Ok(FnDecl {
            name,
            params,
            body: body?,
            pos,
        })
    }

    fn block(&mut self) -> Result<Block> {
        self.expect(&Tok::LBrace, "to open block")?;
        self.nest()?;
        let mut stmts = Vec::new();
        while !self.check(&Tok::RBrace) {
            if self.check(&Tok::Eof) {
                return Err(self.unexpected("`}`"));
            }
            stmts.push(self.stmt()?);
        }
        self.advance();
        self.depth -= 1;
        Ok(stmts)
    }

    fn loop_body(&mut self) -> Result<Block> {
        self.loop_depth += 1;
        let body = self.block();
        self.loop_depth -= 1;
        body
    }

    fn stmt(&mut self) -> Result<Stmt> {
        let pos = self.pos();
        let kind = match self.peek().clone() {
            Tok::Fn => {
                return Err(ScriptError::syntax(
                    pos,
                    "functions may only be declared at top level",
                ))
            }
            Tok::Let => {
                self.advance();
                let name = self.ident("after `let`")?;
                self.expect(&Tok::Assign, "after variable name")?;
                let value = self.expr()?;
                self.expect(&Tok::Semi, "after `let` statement")?;
                StmtKind::Let(name, value)
            }
            Tok::Return => {
                if !self.in_fn {
                    return Err(ScriptError::syntax(pos, "`return` outside of a function"));
                }
                self.advance();
                let value = if self.check(&Tok::Semi) {
                    None
                } else {
                    Some(self.expr()?)
                };
                self.expect(&Tok::Semi, "after `return`")?;
                StmtKind::Return(value)
            }
            Tok::If => self.if_stmt()?,
            Tok::For => {
                self.advance();
                let name = self.ident("after `for`")?;
                self.expect(&Tok::In, "after loop variable")?;
                let iter = self.expr()?;
                StmtKind::For(name, iter, self.loop_body()?)
            }
            Tok::While => {
                self.advance();
                let cond = self.expr()?;
                StmtKind::While(cond, self.loop_body()?)
            }
            Tok::Break | Tok::Continue => {
                let tok = self.advance().tok;
                if self.loop_depth == 0 {
                    return Err(ScriptError::syntax(pos, format!("{tok} outside of a loop")));
                }
                self.expect(&Tok::Semi, &format!("after {tok}"))?;
                if tok == Tok::Break {
                    StmtKind::Break
                } else {
                    StmtKind::Continue
                }
            }
            Tok::Ident(name) => match self.assign_op() {
                Some(op) => {
                    self.advance();
                    self.advance();
                    let value = self.expr()?;
                    self.expect(&Tok::Semi, "after assignment")?;
                    StmtKind::Assign(name, op, value)
                }
                None => self.expr_stmt()?,
            },
            _ => self.expr_stmt()?,
        };
        Ok(Stmt { kind, pos })
    }

    /// Assignment operator following the current identifier, if any.
    /// `Some(None)` is plain `=`.
    fn assign_op(&self) -> Option<Option<BinOp>> {
        let next = self.tokens.get(self.at + 1)?;
        Some(match next.tok {
            Tok::Assign => None,
            Tok::PlusAssign => Some(BinOp::Add),
            Tok::MinusAssign => Some(BinOp::Sub),
            Tok::StarAssign => Some(BinOp::Mul),
            Tok::SlashAssign => Some(BinOp::Div),
            Tok::PercentAssign => Some(BinOp::Rem),
            Tok::PipeAssign => Some(BinOp::BitOr),
            Tok::AmpAssign => Some(BinOp::BitAnd),
            _ => return None,
        })
    }

    fn expr_stmt(&mut self) -> Result<StmtKind> {
        let expr = self.expr()?;
        self.expect(&Tok::Semi, "after expression")?;
        Ok(StmtKind::Expr(expr))
    }

    fn if_stmt(&mut self) -> Result<StmtKind> {
        self.expect(&Tok::If, "")?;
        let mut branches = vec![(self.expr()?, self.block()?)];
        let mut otherwise = None;
        while self.eat(&Tok::Else) {
            if self.eat(&Tok::If) {
                branches.push((self.expr()?, self.block()?));
            } else {
                otherwise = Some(self.block()?);
                break;
            }
        }
        Ok(StmtKind::If(branches, otherwise))
    }

    fn expr(&mut self) -> Result<Expr> {
        self.nest()?;
        let expr = self.binary(0)?;
        self.depth -= 1;
        Ok(expr)
    }

    fn binary(&mut self, level: usize) -> Result<Expr> {
        if level == LEVELS {
            return self.unary();
        }
        let depth = self.depth;
        let mut lhs = self.binary(level + 1)?;
        while let Some(op) = binop_at(level, self.peek()) {
            self.nest()?;
            let pos = self.advance().pos;
            let rhs = self.binary(level + 1)?;
            lhs = Expr {
                kind: ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)),
                pos,
            };
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr> {
        let pos = self.pos();
        let op = match self.peek() {
            Tok::Minus => UnaryOp::Neg,
            Tok::Bang => UnaryOp::Not,
            _ => return self.postfix(),
        };
        self.advance();
        self.nest()?;
        let operand = self.unary()?;
        self.depth -= 1;
        if let (UnaryOp::Neg, ExprKind::Int(v)) = (op, &operand.kind) {
            return Ok(Expr {
                kind: ExprKind::Int(v.wrapping_neg()),
                pos,
            });
        }
        Ok(Expr {
            kind: ExprKind::Unary(op, Box::new(operand)),
            pos,
        })
    }

    fn postfix(&mut self) -> Result<Expr> {
        let depth = self.depth;
        let mut expr = self.primary()?;
        while self.check(&Tok::LBracket) {
            self.nest()?;
            let pos = self.advance().pos;
            let index = self.expr()?;
            self.expect(&Tok::RBracket, "to close index")?;
            expr = Expr {
                kind: ExprKind::Index(Box::new(expr), Box::new(index)),
                pos,
            };
        }
        self.depth = depth;
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr> {
        let pos = self.pos();
        let kind = match self.peek().clone() {
            Tok::Int(v) => {
                self.advance();
                ExprKind::Int(v)
            }
            Tok::Str(s) => {
                self.advance();
                ExprKind::Str(s)
            }
            Tok::True | Tok::False => ExprKind::Bool(self.advance().tok == Tok::True),
            Tok::Ident(name) => {
                self.advance();
                if self.eat(&Tok::LParen) {
                    ExprKind::Call(name, self.list_tail(&Tok::RParen)?)
                } else {
                    ExprKind::Var(name)
                }
            }
            Tok::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.expect(&Tok::RParen, "to close parenthesis")?;
                return Ok(inner);
            }
            Tok::LBracket => {
                self.advance();
                ExprKind::List(self.list_tail(&Tok::RBracket)?)
            }
            _ => return Err(self.unexpected("expression")),
        };
        Ok(Expr { kind, pos })
    }

    /// Comma-separated expressions up to `close`; a trailing comma is allowed.
    fn list_tail(&mut self, close: &Tok) -> Result<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(self.expr()?);
            if !self.eat(&Tok::Comma) {
                break;
            }
        }
        self.expect(close, "to close list")?;
        Ok(items)
    }
}

/// Number of binary precedence levels.
const LEVELS: usize = 9;

/// Binary operator for `tok` at precedence `level`, loosest first.
fn binop_at(level: usize, tok: &Tok) -> Option<BinOp> {
    let op = match (level, tok) {
        (0, Tok::OrOr) => BinOp::Or,
        (1, Tok::AndAnd) => BinOp::And,
        (2, Tok::EqEq) => BinOp::Eq,
        (2, Tok::NotEq) => BinOp::Ne,
        (2, Tok::Lt) => BinOp::Lt,
        (2, Tok::Le) => BinOp::Le,
        (2, Tok::Gt) => BinOp::Gt,
        (2, Tok::Ge) => BinOp::Ge,
        (3, Tok::Pipe) => BinOp::BitOr,
        (4, Tok::Caret) => BinOp::BitXor,
        (5, Tok::Amp) => BinOp::BitAnd,
        (6, Tok::Shl) => BinOp::Shl,
        (6, Tok::Shr) => BinOp::Shr,
        (7, Tok::Plus) => BinOp::Add,
        (7, Tok::Minus) => BinOp::Sub,
        (8, Tok::Star) => BinOp::Mul,
        (8, Tok::Slash) => BinOp::Div,
        (8, Tok::Percent) => BinOp::Rem,
        _ => return None,
    };
    Some(op)
}
