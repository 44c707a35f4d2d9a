//! Source text to tokens.

use std::fmt;

use crate::error::{Pos, Result, ScriptError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tok {
    Int(i64),
    Str(String),
    Ident(String),

    Let,
    Fn,
    Return,
    If,
    Else,
    For,
    In,
    While,
    Break,
    Continue,
    True,
    False,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,

    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    PipeAssign,
    AmpAssign,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Pipe,
    Caret,
    Amp,
    Shl,
    Shr,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,

    Eof,
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Int(v) => return write!(f, "integer {v}"),
            Self::Str(s) => return write!(f, "string {s:?}"),
            Self::Ident(name) => return write!(f, "identifier `{name}`"),
            Self::Let => "`let`",
            Self::Fn => "`fn`",
            Self::Return => "`return`",
            Self::If => "`if`",
            Self::Else => "`else`",
            Self::For => "`for`",
            Self::In => "`in`",
            Self::While => "`while`",
            Self::Break => "`break`",
            Self::Continue => "`continue`",
            Self::True => "`true`",
            Self::False => "`false`",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::LBrace => "`{`",
            Self::RBrace => "`}`",
            Self::LBracket => "`[`",
            Self::RBracket => "`]`",
            Self::Comma => "`,`",
            Self::Semi => "`;`",
            Self::Assign => "`=`",
            Self::PlusAssign => "`+=`",
            Self::MinusAssign => "`-=`",
            Self::StarAssign => "`*=`",
            Self::SlashAssign => "`/=`",
            Self::PercentAssign => "`%=`",
            Self::PipeAssign => "`|=`",
            Self::AmpAssign => "`&=`",
            Self::Plus => "`+`",
            Self::Minus => "`-`",
            Self::Star => "`*`",
            Self::Slash => "`/`",
            Self::Percent => "`%`",
            Self::Pipe => "`|`",
            Self::Caret => "`^`",
            Self::Amp => "`&`",
            Self::Shl => "`<<`",
            Self::Shr => "`>>`",
            Self::EqEq => "`==`",
            Self::NotEq => "`!=`",
            Self::Lt => "`<`",
            Self::Le => "`<=`",
            Self::Gt => "`>`",
            Self::Ge => "`>=`",
            Self::AndAnd => "`&&`",
            Self::OrOr => "`||`",
            Self::Bang => "`!`",
            Self::Eof => "end of input",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub tok: Tok,
    pub pos: Pos,
}

/// Tokenize a whole script. The result always ends with [`Tok::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    col: u32,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn pos(&self) -> Pos {
        Pos::new(self.line, self.col)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn run(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let pos = self.pos();
            let Some(c) = self.bump() else {
                tokens.push(Token { tok: Tok::Eof, pos });
                return Ok(tokens);
            };
            let tok = match c {
                '0'..='9' => self.number(c, pos)?,
                '"' => self.string(pos)?,
                c if c == '_' || c.is_ascii_alphabetic() => self.word(c),
                '(' => Tok::LParen,
                ')' => Tok::RParen,
                '{' => Tok::LBrace,
                '}' => Tok::RBrace,
                '[' => Tok::LBracket,
                ']' => Tok::RBracket,
                ',' => Tok::Comma,
                ';' => Tok::Semi,
                '^' => Tok::Caret,
                '+' => self.with_assign(Tok::Plus, Tok::PlusAssign),
                '-' => self.with_assign(Tok::Minus, Tok::MinusAssign),
                '*' => self.with_assign(Tok::Star, Tok::StarAssign),
                '/' => self.with_assign(Tok::Slash, Tok::SlashAssign),
                '%' => self.with_assign(Tok::Percent, Tok::PercentAssign),
                '=' => self.with_assign(Tok::Assign, Tok::EqEq),
                '!' => self.with_assign(Tok::Bang, Tok::NotEq),
                '|' if self.eat('|') => Tok::OrOr,
                '|' => self.with_assign(Tok::Pipe, Tok::PipeAssign),
                '&' if self.eat('&') => Tok::AndAnd,
                '&' => self.with_assign(Tok::Amp, Tok::AmpAssign),
                '<' if self.eat('<') => Tok::Shl,
                '<' => self.with_assign(Tok::Lt, Tok::Le),
                '>' if self.eat('>') => Tok::Shr,
                '>' => self.with_assign(Tok::Gt, Tok::Ge),
                other => {
                    return Err(ScriptError::syntax(
                        pos,
                        format!("unexpected character {other:?}"),
                    ))
                }
            };
            tokens.push(Token { tok, pos });
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn with_assign(&mut self, plain: Tok, assign: Tok) -> Tok {
        if self.eat('=') {
            assign
        } else {
            plain
        }
    }

    fn number(&mut self, first: char, pos: Pos) -> Result<Tok> {
        let radix = match (first, self.peek()) {
            ('0', Some('x' | 'X')) => 16,
            ('0', Some('b' | 'B')) => 2,
            _ => 10,
        };
        let mut digits = String::new();
        if radix == 10 {
            digits.push(first);
        } else {
            self.bump();
        }
        while let Some(c) = self.peek() {
            if c == '_' {
                self.bump();
            } else if c.is_ascii_alphanumeric() {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if digits.is_empty() {
            return Err(ScriptError::syntax(pos, "integer literal has no digits"));
        }
        i64::from_str_radix(&digits, radix)
            .map(Tok::Int)
            .map_err(|err| ScriptError::syntax(pos, format!("invalid integer literal: {err}")))
    }

    fn string(&mut self, pos: Pos) -> Result<Tok> {
        let mut text = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(ScriptError::syntax(pos, "unterminated string literal"))
                }
                Some('"') => return Ok(Tok::Str(text)),
                Some('\\') => {
                    let escape_pos = self.pos();
                    let c = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        other => {
                            return Err(ScriptError::syntax(
                                escape_pos,
                                format!("unknown escape {other:?}"),
                            ))
                        }
                    };
                    text.push(c);
                }
                Some(c) => text.push(c),
            }
        }
    }

    fn word(&mut self, first: char) -> Tok {
        let mut word = String::from(first);
        while let Some(c) = self.peek() {
            if c == '_' || c.is_ascii_alphanumeric() {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match word.as_str() {
            "let" => Tok::Let,
            "fn" => Tok::Fn,
            "return" => Tok::Return,
            "if" => Tok::If,
            "else" => Tok::Else,
            "for" => Tok::For,
            "in" => Tok::In,
            "while" => Tok::While,
            "break" => Tok::Break,
            "continue" => Tok::Continue,
            "true" => Tok::True,
            "false" => Tok::False,
            _ => Tok::Ident(word),
        }
    }
}
