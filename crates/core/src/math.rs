//! Evaluation of literal arithmetic queries.
//!
//! Supported syntax: numbers (with optional exponent), `+ - * / % ^`,
//! parentheses, unary signs, the constants `pi`, `e` and `tau`, and a small
//! set of functions such as `sqrt(x)` or `max(a, b)`. `^` is
//! right-associative and binds tighter than unary minus, so `-2^2` is `-4`.

use std::fmt::{self, Display};

const OPERATOR_CHARS: &[char] = &['+', '-', '*', '/', '%', '^'];

// Limits nesting of parentheses, function calls and exponents.
const MAX_DEPTH: usize = 256;

/// Returns `true` if the query looks like an arithmetic expression.
///
/// This is only a cheap pre-check, the query may still fail to evaluate.
pub fn looks_like_math(query: &str) -> bool {
    query.chars().any(|c| c.is_ascii_digit())
        && query.contains(OPERATOR_CHARS)
}

/// Describes why an expression could not be evaluated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MathError {
    /// The input contains a character the evaluator doesn't know.
    UnexpectedChar(char),
    /// The input ended too early.
    UnexpectedEnd,
    /// A token appeared where it isn't allowed.
    UnexpectedToken(String),
    /// A name that is neither a constant nor a function.
    UnknownIdentifier(String),
    /// A function was called with the wrong number of arguments.
    Arity {
        /// Name of the function.
        name: String,
        /// Number of arguments the function takes.
        expected: usize,
    },
    /// The result is infinite or not a number.
    NotFinite,
    /// The expression is nested too deeply.
    TooDeep,
}

impl Display for MathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathError::UnexpectedChar(c) => {
                write!(f, "unexpected character `{c}`")
            }
            MathError::UnexpectedEnd => write!(f, "unexpected end of input"),
            MathError::UnexpectedToken(token) => {
                write!(f, "unexpected token `{token}`")
            }
            MathError::UnknownIdentifier(name) => {
                write!(f, "unknown identifier `{name}`")
            }
            MathError::Arity { name, expected } => {
                write!(f, "`{name}` takes {expected} argument(s)")
            }
            MathError::NotFinite => write!(f, "result is not a finite number"),
            MathError::TooDeep => write!(f, "expression is nested too deeply"),
        }
    }
}

impl std::error::Error for MathError {}

/// Evaluates an arithmetic expression.
pub fn evaluate(input: &str) -> Result<f64, MathError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(MathError::UnexpectedToken(token.to_string()));
    }
    if !value.is_finite() {
        return Err(MathError::NotFinite);
    }
    Ok(value)
}

/// Formats a result for display.
///
/// The value is rounded to 14 significant digits, which hides binary
/// floating-point noise (`0.1 + 0.2` shows as `0.3`).
pub fn format_number(value: f64) -> String {
    let rounded: f64 = format!("{value:.13e}").parse().unwrap_or(value);
    if rounded == 0.0 {
        // Avoids printing `-0`.
        return "0".to_owned();
    }
    rounded.to_string()
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Ident(name) => f.write_str(name),
            Token::Op(op) => write!(f, "{op}"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, MathError> {
    let mut tokens = vec![];
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            let mut end = start;
            let mut prev = c;
            while let Some(&(idx, c)) = chars.peek() {
                let in_exponent = (c == '+' || c == '-')
                    && (prev == 'e' || prev == 'E');
                if c.is_ascii_digit()
                    || c == '.'
                    || c == 'e'
                    || c == 'E'
                    || in_exponent
                {
                    end = idx + c.len_utf8();
                    prev = c;
                    chars.next();
                } else {
                    break;
                }
            }
            let literal = &input[start..end];
            let number = literal
                .parse()
                .map_err(|_| MathError::UnexpectedToken(literal.to_owned()))?;
            tokens.push(Token::Number(number));
        } else if c.is_ascii_alphabetic() {
            let mut end = start;
            while let Some(&(idx, c)) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    end = idx + c.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Ident(input[start..end].to_ascii_lowercase()));
        } else {
            let token = match c {
                '+' | '-' | '*' | '/' | '%' | '^' => Token::Op(c),
                '×' => Token::Op('*'),
                '÷' => Token::Op('/'),
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                _ => return Err(MathError::UnexpectedChar(c)),
            };
            tokens.push(token);
            chars.next();
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
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Result<Token, MathError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(MathError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), MathError> {
        match self.advance()? {
            ref t if t == token => Ok(()),
            other => Err(MathError::UnexpectedToken(other.to_string())),
        }
    }

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, MathError>,
    ) -> Result<T, MathError> {
        if self.depth >= MAX_DEPTH {
            return Err(MathError::TooDeep);
        }
        self.depth += 1;
        let res = parse(self);
        self.depth -= 1;
        res
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, MathError> {
        let mut value = self.term()?;
        loop {
            if self.eat(&Token::Op('+')) {
                value += self.term()?;
            } else if self.eat(&Token::Op('-')) {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<f64, MathError> {
        let mut value = self.unary()?;
        loop {
            if self.eat(&Token::Op('*')) {
                value *= self.unary()?;
            } else if self.eat(&Token::Op('/')) {
                value /= self.unary()?;
            } else if self.eat(&Token::Op('%')) {
                value %= self.unary()?;
            } else {
                return Ok(value);
            }
        }
    }

    // unary := ('+' | '-')* power
    fn unary(&mut self) -> Result<f64, MathError> {
        let mut negate = false;
        loop {
            if self.eat(&Token::Op('-')) {
                negate = !negate;
            } else if !self.eat(&Token::Op('+')) {
                break;
            }
        }
        let value = self.power()?;
        Ok(if negate { -value } else { value })
    }

    // power := primary ('^' unary)?
    fn power(&mut self) -> Result<f64, MathError> {
        let base = self.primary()?;
        if self.eat(&Token::Op('^')) {
            let exponent = self.nested(Self::unary)?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, MathError> {
        match self.advance()? {
            Token::Number(n) => Ok(n),
            Token::LParen => {
                let value = self.nested(Self::expr)?;
                self.expect(&Token::RParen)?;
                Ok(value)
            }
            Token::Ident(name) => {
                if self.eat(&Token::LParen) {
                    let args = self.args()?;
                    call_function(&name, &args)
                } else {
                    constant(&name)
                }
            }
            other => Err(MathError::UnexpectedToken(other.to_string())),
        }
    }

    fn args(&mut self) -> Result<Vec<f64>, MathError> {
        let mut args = vec![];
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.nested(Self::expr)?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RParen)?;
            return Ok(args);
        }
    }
}

fn constant(name: &str) -> Result<f64, MathError> {
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        "tau" => Ok(std::f64::consts::TAU),
        _ => Err(MathError::UnknownIdentifier(name.to_owned())),
    }
}

fn call_function(name: &str, args: &[f64]) -> Result<f64, MathError> {
    let f: fn(f64) -> f64 = match name {
        "sqrt" => f64::sqrt,
        "abs" => f64::abs,
        "sin" => f64::sin,
        "cos" => f64::cos,
        "tan" => f64::tan,
        "asin" => f64::asin,
        "acos" => f64::acos,
        "atan" => f64::atan,
        "ln" => f64::ln,
        "log" | "log10" => f64::log10,
        "log2" => f64::log2,
        "exp" => f64::exp,
        "floor" => f64::floor,
        "ceil" => f64::ceil,
        "round" => f64::round,
        _ => return call_binary_function(name, args),
    };
    match args {
        [x] => Ok(f(*x)),
        _ => Err(MathError::Arity {
            name: name.to_owned(),
            expected: 1,
        }),
    }
}

fn call_binary_function(name: &str, args: &[f64]) -> Result<f64, MathError> {
    let f: fn(f64, f64) -> f64 = match name {
        "min" => f64::min,
        "max" => f64::max,
        "pow" => f64::powf,
        _ => return Err(MathError::UnknownIdentifier(name.to_owned())),
    };
    match args {
        [a, b] => Ok(f(*a, *b)),
        _ => Err(MathError::Arity {
            name: name.to_owned(),
            expected: 2,
        }),
    }
}
