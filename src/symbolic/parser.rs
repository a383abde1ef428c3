//! Parser for the restricted algebraic grammar accepted in questions.
//!
//! Supports implicit multiplication (`2x`, `3(x + 1)`, `x y`), `^` and `**`
//! for exponents, and function application with or without parentheses
//! (`sin(x)`, `sin x`). Multi-letter identifiers that are not function names
//! or `pi` are split into single-letter symbols, so `xy` reads as `x*y`.

use super::expr::{Expr, Func, SymResult};
use super::rational::Rational;
use crate::error::SymbolicError;

const FUNCTION_NAMES: &[&str] = &["sqrt", "sin", "cos", "tan", "exp", "log", "ln"];

/// Deepest nesting of groups, signs, exponents and function calls accepted.
const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Rational),
    Sym(String),
    Func(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn superscript_digit(c: char) -> Option<char> {
    match c {
        '⁰' => Some('0'),
        '¹' => Some('1'),
        '²' => Some('2'),
        '³' => Some('3'),
        '⁴' => Some('4'),
        '⁵' => Some('5'),
        '⁶' => Some('6'),
        '⁷' => Some('7'),
        '⁸' => Some('8'),
        '⁹' => Some('9'),
        _ => None,
    }
}

fn lex_identifier(word: &str, tokens: &mut Vec<Token>) {
    let mut rest = word;
    while !rest.is_empty() {
        if let Some(name) = FUNCTION_NAMES.iter().find(|n| rest.starts_with(*n)) {
            tokens.push(Token::Func((*name).to_string()));
            rest = &rest[name.len()..];
        } else if rest.starts_with("pi") {
            tokens.push(Token::Sym("pi".into()));
            rest = &rest[2..];
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                tokens.push(Token::Sym(c.to_string()));
            }
            rest = chars.as_str();
        }
    }
}

fn tokenize(input: &str) -> SymResult<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                tokens.push(Token::Num(Rational::from_decimal(&literal)?));
            }
            c if c.is_alphabetic() => {
                let start = i;
                while i < chars.len() && chars[i].is_alphabetic() {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                lex_identifier(&word, &mut tokens);
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Caret);
                i += 2;
            }
            '*' | '·' | '×' | '⋅' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' | '÷' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' | '−' | '–' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '(' | '[' | '{' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' | ']' | '}' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if superscript_digit(c).is_some() => {
                let mut digits = String::new();
                while let Some(d) = chars.get(i).copied().and_then(superscript_digit) {
                    digits.push(d);
                    i += 1;
                }
                tokens.push(Token::Caret);
                tokens.push(Token::Num(Rational::from_decimal(&digits)?));
            }
            other => {
                return Err(SymbolicError::Parse(format!(
                    "unexpected character '{other}'"
                )));
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> SymResult<T>) -> SymResult<T> {
        if self.depth >= MAX_DEPTH {
            return Err(SymbolicError::Parse("expression nested too deeply".into()));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> SymResult<Expr> {
        let mut terms = vec![self.term()?];
        loop {
            if self.eat(&Token::Plus) {
                terms.push(self.term()?);
            } else if self.eat(&Token::Minus) {
                terms.push(self.term()?.neg()?);
            } else {
                break;
            }
        }
        Expr::add(terms)
    }

    // term := unary (('*' | '/') unary | <implicit> power)*
    fn term(&mut self) -> SymResult<Expr> {
        let mut acc = self.unary()?;
        loop {
            if self.eat(&Token::Star) {
                acc = Expr::mul(vec![acc, self.unary()?])?;
            } else if self.eat(&Token::Slash) {
                acc = acc.div(self.unary()?)?;
            } else if self.starts_operand() {
                acc = Expr::mul(vec![acc, self.power()?])?;
            } else {
                break;
            }
        }
        Ok(acc)
    }

    fn starts_operand(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Num(_) | Token::Sym(_) | Token::Func(_) | Token::LParen)
        )
    }

    // unary := ('+' | '-') unary | power
    fn unary(&mut self) -> SymResult<Expr> {
        if self.eat(&Token::Minus) {
            return self.nested(Self::unary)?.neg();
        }
        if self.eat(&Token::Plus) {
            return self.nested(Self::unary);
        }
        self.power()
    }

    // power := primary ('^' unary)?   (right-associative)
    fn power(&mut self) -> SymResult<Expr> {
        let base = self.primary()?;
        if self.eat(&Token::Caret) {
            let exp = self.nested(Self::unary)?;
            return Expr::pow(base, exp);
        }
        Ok(base)
    }

    fn primary(&mut self) -> SymResult<Expr> {
        match self.next() {
            Some(Token::Num(r)) => Ok(Expr::Num(r)),
            Some(Token::Sym(s)) => Ok(Expr::Sym(s)),
            Some(Token::LParen) => {
                let inner = self.nested(Self::expr)?;
                if !self.eat(&Token::RParen) {
                    return Err(SymbolicError::Parse("unbalanced parentheses".into()));
                }
                Ok(inner)
            }
            Some(Token::Func(name)) => {
                // `sin(x)` binds the group; `sin x^2` binds the next power.
                let arg = self.nested(Self::power)?;
                if name == "sqrt" {
                    return Expr::sqrt(arg);
                }
                let func = Func::from_name(&name)
                    .ok_or_else(|| SymbolicError::Unsupported(format!("function {name}")))?;
                Expr::func(func, arg)
            }
            Some(other) => Err(SymbolicError::Parse(format!("unexpected token {other:?}"))),
            None => Err(SymbolicError::Parse("unexpected end of expression".into())),
        }
    }
}

/// Parse `input` into a canonical expression.
pub fn parse_expression(input: &str) -> SymResult<Expr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(SymbolicError::Parse("empty expression".into()));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    if let Some(extra) = parser.peek() {
        return Err(SymbolicError::Parse(format!(
            "unexpected trailing token {extra:?}"
        )));
    }
    Ok(expr)
}
