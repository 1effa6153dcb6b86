// crates/qocim-routing-filter/src/runtime.rs
// ============================================================================
// Module: Reference Filter Runtime
// Description: Lexer, parser, and interpreter for compiled routing filters.
// Purpose: Evaluate filter artifacts in-process exactly as the bus would.
// Dependencies: crate::{artifact, generator}, qocim-core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The runtime accepts the statement subset emitted by the compiler:
//!
//! - `var <name> = message.qocMetaData;`
//! - `if (<expr>) { <statements> }`
//! - `return <expr>;`
//! - `// comment` lines
//!
//! Expressions combine `&&`, `||`, `!`, parentheses, `true`/`false`, and the
//! two built-ins `hasQoCMetricDefinition(set, "id")` and
//! `matchQoCMetricValue(set, "id", "op", number[, "MAX" | "MIN"])`, both
//! backed by the core operator matcher. Comparison errors (such as a unit
//! mismatch) evaluate to `false`; unknown operator tags are reported.
//! Filter source is untrusted: size and nesting are bounded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::str::FromStr;

use qocim_core::AggregationError;
use qocim_core::AggregationRegistry;
use qocim_core::Information;
use qocim_core::MetricDefinition;
use qocim_core::Operand;
use qocim_core::QocIndicator;
use qocim_core::QocOperator;
use qocim_core::UnknownOperator;
use qocim_core::matches;
use serde_json::Number;
use thiserror::Error;

use crate::artifact::FilterArtifact;
use crate::generator::HAS_DEFINITION_BUILTIN;
use crate::generator::MATCH_VALUE_BUILTIN;
use crate::generator::METADATA_SOURCE;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum accepted filter source size in bytes.
pub const MAX_FILTER_BYTES: usize = 1024 * 1024;
/// Maximum nesting depth of blocks, parentheses, and calls.
pub const MAX_FILTER_NESTING: usize = 32;
/// Unicode line terminators that end comments like `\n` does.
const LINE_SEPARATORS: [char; 2] = ['\u{2028}', '\u{2029}'];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while parsing or running a routing filter.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Source held no statements.
    #[error("filter source is empty")]
    EmptyInput,
    /// Source exceeded the size limit.
    #[error("filter source exceeds size limit: {actual_bytes} bytes (max {max_bytes})")]
    InputTooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual input length in bytes.
        actual_bytes: usize,
    },
    /// Source exceeded the nesting limit.
    #[error("filter nesting exceeds limit: depth {actual_depth} (max {max_depth}) at {position}")]
    NestingTooDeep {
        /// Maximum allowed nesting depth.
        max_depth: usize,
        /// Depth reached when the error occurred.
        actual_depth: usize,
        /// Byte offset in the source.
        position: usize,
    },
    /// Unexpected token encountered during parsing.
    #[error("unexpected token `{found}` at {position}, expected {expected}")]
    UnexpectedToken {
        /// Human-friendly expectation summary.
        expected: &'static str,
        /// The token that was actually seen.
        found: String,
        /// Byte offset in the source.
        position: usize,
    },
    /// String literal was not closed on its line.
    #[error("unterminated string literal at {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        position: usize,
    },
    /// Numeric literal failed to parse.
    #[error("invalid number `{raw}` at {position}")]
    InvalidNumber {
        /// The raw numeric text.
        raw: String,
        /// Byte offset in the source.
        position: usize,
    },
    /// Variable bound to an unsupported message path.
    #[error("unsupported binding source `{path}`")]
    UnsupportedSource {
        /// Dotted path that was bound.
        path: String,
    },
    /// Identifier used before being bound.
    #[error("unknown variable `{name}`")]
    UnknownVariable {
        /// Identifier name.
        name: String,
    },
    /// Call to an unknown function.
    #[error("unknown function `{name}`")]
    UnknownFunction {
        /// Function name.
        name: String,
    },
    /// Built-in called with the wrong number of arguments.
    #[error("function `{name}` expects {expected} arguments, got {found}")]
    ArityMismatch {
        /// Function name.
        name: String,
        /// Accepted argument counts.
        expected: &'static str,
        /// Supplied argument count.
        found: usize,
    },
    /// Value of the wrong kind where another was required.
    #[error("expected {expected}, found {found}")]
    TypeError {
        /// Required kind.
        expected: &'static str,
        /// Supplied kind.
        found: &'static str,
    },
    /// Operator tag inside a built-in call was not recognized.
    #[error(transparent)]
    UnknownOperator(#[from] UnknownOperator),
    /// Selection name inside a built-in call was not recognized.
    #[error(transparent)]
    UnknownAggregation(#[from] AggregationError),
    /// Execution finished without reaching a `return`.
    #[error("filter finished without returning a value")]
    MissingReturn,
}

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Parsed routing filter ready for repeated evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterProgram {
    /// Top-level statements.
    statements: Vec<Statement>,
}

impl FilterProgram {
    /// Parses filter source.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] for oversized input, syntax errors, or
    /// excessive nesting.
    pub fn parse(source: &str) -> Result<Self, RuntimeError> {
        if source.len() > MAX_FILTER_BYTES {
            return Err(RuntimeError::InputTooLarge {
                max_bytes: MAX_FILTER_BYTES,
                actual_bytes: source.len(),
            });
        }
        let tokens = Lexer::new(source).lex()?;
        let mut parser = Parser::new(tokens);
        let statements = parser.parse_statements(false)?;
        if statements.is_empty() {
            return Err(RuntimeError::EmptyInput);
        }
        Ok(Self {
            statements,
        })
    }
}

/// Interpreter for compiled routing filters.
///
/// # Invariants
/// - Evaluation is pure; the runtime holds no per-call state.
#[derive(Debug, Default)]
pub struct FilterRuntime {
    /// Aggregation operators available to selection arguments.
    aggregations: AggregationRegistry,
}

impl FilterRuntime {
    /// Creates a runtime with the built-in aggregation operators.
    #[must_use]
    pub fn new() -> Self {
        Self::with_aggregations(AggregationRegistry::with_builtin_operators())
    }

    /// Creates a runtime with a caller-supplied aggregation registry.
    #[must_use]
    pub const fn with_aggregations(aggregations: AggregationRegistry) -> Self {
        Self {
            aggregations,
        }
    }

    /// Parses and evaluates a compiled artifact against a metadata set.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when the artifact cannot be parsed or run.
    pub fn evaluate(
        &self,
        artifact: &FilterArtifact,
        indicators: &[QocIndicator],
    ) -> Result<bool, RuntimeError> {
        let program = FilterProgram::parse(artifact.as_str())?;
        self.run(&program, indicators)
    }

    /// Evaluates a parsed program against a metadata set.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] for unbound variables, bad built-in calls, or
    /// a program that never returns.
    pub fn run(
        &self,
        program: &FilterProgram,
        indicators: &[QocIndicator],
    ) -> Result<bool, RuntimeError> {
        let mut frame = Frame {
            runtime: self,
            indicators,
            bindings: BTreeSet::new(),
        };
        frame.execute(&program.statements)?.ok_or(RuntimeError::MissingReturn)
    }
}

// ============================================================================
// SECTION: Syntax Tree
// ============================================================================

/// Filter statement.
#[derive(Debug, Clone, PartialEq)]
enum Statement {
    /// `var name = a.b;`
    Var {
        /// Bound name.
        name: String,
        /// Dotted source path.
        path: String,
    },
    /// `if (condition) { body }`
    If {
        /// Guard condition.
        condition: Expr,
        /// Statements run when the guard holds.
        body: Vec<Statement>,
    },
    /// `return value;`
    Return(Expr),
}

/// Filter expression.
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    /// Boolean literal.
    Bool(bool),
    /// String literal.
    Str(String),
    /// Numeric literal.
    Number(Number),
    /// Variable reference.
    Variable(String),
    /// Logical negation.
    Not(Box<Expr>),
    /// Short-circuit conjunction.
    And(Vec<Expr>),
    /// Short-circuit disjunction.
    Or(Vec<Expr>),
    /// Built-in call.
    Call {
        /// Function name.
        name: String,
        /// Arguments in order.
        args: Vec<Expr>,
    },
}

// ============================================================================
// SECTION: Lexer
// ============================================================================

/// Lexer token produced from filter source.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    /// Identifier or keyword.
    Ident(&'a str),
    /// Numeric literal.
    Number(&'a str),
    /// String literal contents.
    Str(&'a str),
    /// `&&`
    And,
    /// `||`
    Or,
    /// `!`
    Not,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `.`
    Dot,
    /// `=`
    Assign,
    /// End-of-input marker.
    Eof,
}

impl Token<'_> {
    /// Formats the token for diagnostics.
    fn describe(&self) -> String {
        match self {
            Self::Ident(text) | Self::Number(text) => (*text).to_string(),
            Self::Str(text) => format!("\"{text}\""),
            Self::And => "&&".to_string(),
            Self::Or => "||".to_string(),
            Self::Not => "!".to_string(),
            Self::LParen => "(".to_string(),
            Self::RParen => ")".to_string(),
            Self::LBrace => "{".to_string(),
            Self::RBrace => "}".to_string(),
            Self::Comma => ",".to_string(),
            Self::Semicolon => ";".to_string(),
            Self::Dot => ".".to_string(),
            Self::Assign => "=".to_string(),
            Self::Eof => "end of input".to_string(),
        }
    }
}

/// Token paired with its byte offset.
#[derive(Debug, Clone)]
struct SpannedToken<'a> {
    /// Token value.
    token: Token<'a>,
    /// Byte offset into the source.
    position: usize,
}

/// Lexer for filter source.
struct Lexer<'a> {
    /// Source being tokenized.
    input: &'a str,
    /// Current byte offset.
    offset: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer for the given source.
    const fn new(input: &'a str) -> Self {
        Self {
            input,
            offset: 0,
        }
    }

    /// Lexes the source into tokens terminated by `Eof`.
    fn lex(mut self) -> Result<Vec<SpannedToken<'a>>, RuntimeError> {
        let mut tokens = Vec::new();
        let bytes = self.input.as_bytes();
        while let Some(&ch) = bytes.get(self.offset) {
            let start = self.offset;
            if let Some(width) = self.line_separator_width() {
                self.offset += width;
                continue;
            }
            let single = match ch {
                b' ' | b'\t' | b'\n' | b'\r' => {
                    self.offset += 1;
                    continue;
                }
                b'/' if bytes.get(start + 1) == Some(&b'/') => {
                    self.skip_comment(bytes);
                    continue;
                }
                b'(' => Some(Token::LParen),
                b')' => Some(Token::RParen),
                b'{' => Some(Token::LBrace),
                b'}' => Some(Token::RBrace),
                b',' => Some(Token::Comma),
                b';' => Some(Token::Semicolon),
                b'.' => Some(Token::Dot),
                b'=' => Some(Token::Assign),
                b'!' => Some(Token::Not),
                _ => None,
            };
            if let Some(token) = single {
                tokens.push(SpannedToken {
                    token,
                    position: start,
                });
                self.offset += 1;
                continue;
            }
            let token = match ch {
                b'&' | b'|' => self.lex_pair(bytes, ch)?,
                b'"' => self.lex_string(bytes)?,
                b'-' | b'0' ..= b'9' => self.lex_number(bytes)?,
                b'a' ..= b'z' | b'A' ..= b'Z' | b'_' => {
                    self.consume_while(bytes, |b| b.is_ascii_alphanumeric() || b == b'_');
                    Token::Ident(&self.input[start .. self.offset])
                }
                _ => {
                    return Err(RuntimeError::UnexpectedToken {
                        expected: "statement, expression, or operator",
                        found: self.input[start ..].chars().next().map(String::from).unwrap_or_default(),
                        position: start,
                    });
                }
            };
            tokens.push(SpannedToken {
                token,
                position: start,
            });
        }
        tokens.push(SpannedToken {
            token: Token::Eof,
            position: self.offset,
        });
        Ok(tokens)
    }

    /// Lexes `&&` or `||`.
    fn lex_pair(&mut self, bytes: &[u8], ch: u8) -> Result<Token<'a>, RuntimeError> {
        if bytes.get(self.offset + 1) == Some(&ch) {
            self.offset += 2;
            return Ok(if ch == b'&' { Token::And } else { Token::Or });
        }
        Err(RuntimeError::UnexpectedToken {
            expected: if ch == b'&' { "&&" } else { "||" },
            found: char::from(ch).to_string(),
            position: self.offset,
        })
    }

    /// Lexes a double-quoted string without escapes.
    fn lex_string(&mut self, bytes: &[u8]) -> Result<Token<'a>, RuntimeError> {
        let start = self.offset;
        self.offset += 1;
        self.consume_while(bytes, |b| b != b'"' && b != b'\n');
        if bytes.get(self.offset) != Some(&b'"') {
            return Err(RuntimeError::UnterminatedString {
                position: start,
            });
        }
        let contents = &self.input[start + 1 .. self.offset];
        self.offset += 1;
        Ok(Token::Str(contents))
    }

    /// Lexes a decimal literal with optional sign, fraction, and exponent.
    fn lex_number(&mut self, bytes: &[u8]) -> Result<Token<'a>, RuntimeError> {
        let start = self.offset;
        if bytes.get(self.offset) == Some(&b'-') {
            self.offset += 1;
        }
        self.consume_while(bytes, |b| b.is_ascii_digit());
        if bytes.get(self.offset) == Some(&b'.') {
            self.offset += 1;
            self.consume_while(bytes, |b| b.is_ascii_digit());
        }
        if matches!(bytes.get(self.offset), Some(b'e' | b'E')) {
            self.offset += 1;
            if matches!(bytes.get(self.offset), Some(b'+' | b'-')) {
                self.offset += 1;
            }
            self.consume_while(bytes, |b| b.is_ascii_digit());
        }
        let raw = &self.input[start .. self.offset];
        if raw == "-" {
            return Err(RuntimeError::InvalidNumber {
                raw: raw.to_string(),
                position: start,
            });
        }
        Ok(Token::Number(raw))
    }

    /// Advances while the condition matches the current byte.
    fn consume_while(&mut self, bytes: &[u8], condition: impl Fn(u8) -> bool) {
        while let Some(&b) = bytes.get(self.offset) {
            if condition(b) {
                self.offset += 1;
            } else {
                break;
            }
        }
    }

    /// Skips a `//` comment up to the next line terminator.
    fn skip_comment(&mut self, bytes: &[u8]) {
        while let Some(&b) = bytes.get(self.offset) {
            if b == b'\n' || b == b'\r' || self.line_separator_width().is_some() {
                break;
            }
            self.offset += 1;
        }
    }

    /// Returns the byte width of a U+2028/U+2029 terminator at the offset.
    fn line_separator_width(&self) -> Option<usize> {
        let rest = self.input.get(self.offset ..)?;
        rest.starts_with(LINE_SEPARATORS).then_some('\u{2028}'.len_utf8())
    }
}

// ============================================================================
// SECTION: Parser
// ============================================================================

/// Recursive-descent parser for filter source.
struct Parser<'a> {
    /// Token stream ending with `Eof`.
    tokens: Vec<SpannedToken<'a>>,
    /// Current token index.
    index: usize,
    /// Current nesting depth.
    nesting: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser over the token stream.
    const fn new(tokens: Vec<SpannedToken<'a>>) -> Self {
        Self {
            tokens,
            index: 0,
            nesting: 0,
        }
    }

    /// Parses statements until end of input or a closing brace.
    fn parse_statements(&mut self, in_block: bool) -> Result<Vec<Statement>, RuntimeError> {
        let mut statements = Vec::new();
        loop {
            match self.current_token() {
                Token::Eof if !in_block => return Ok(statements),
                Token::RBrace if in_block => return Ok(statements),
                _ => statements.push(self.parse_statement()?),
            }
        }
    }

    /// Parses one statement.
    fn parse_statement(&mut self) -> Result<Statement, RuntimeError> {
        let position = self.position();
        match self.current_token() {
            Token::Ident("var") => {
                self.advance();
                let name = self.expect_ident("variable name")?;
                self.expect(&Token::Assign, "`=`")?;
                let mut path = self.expect_ident("binding source")?;
                while self.eat(&Token::Dot) {
                    path.push('.');
                    path.push_str(&self.expect_ident("path segment")?);
                }
                self.expect(&Token::Semicolon, "`;`")?;
                Ok(Statement::Var {
                    name,
                    path,
                })
            }
            Token::Ident("if") => {
                self.advance();
                self.expect(&Token::LParen, "`(` after `if`")?;
                let condition = self.with_nesting(position, Self::parse_expression)?;
                self.expect(&Token::RParen, "`)` after condition")?;
                self.expect(&Token::LBrace, "`{`")?;
                let body = self.with_nesting(position, |parser| parser.parse_statements(true))?;
                self.expect(&Token::RBrace, "`}`")?;
                Ok(Statement::If {
                    condition,
                    body,
                })
            }
            Token::Ident("return") => {
                self.advance();
                let value = self.parse_expression()?;
                self.expect(&Token::Semicolon, "`;`")?;
                Ok(Statement::Return(value))
            }
            _ => Err(self.unexpected("`var`, `if`, or `return`")),
        }
    }

    /// Parses a full expression.
    fn parse_expression(&mut self) -> Result<Expr, RuntimeError> {
        self.parse_or()
    }

    /// Parses OR expressions.
    fn parse_or(&mut self) -> Result<Expr, RuntimeError> {
        let mut parts = vec![self.parse_and()?];
        while self.eat(&Token::Or) {
            parts.push(self.parse_and()?);
        }
        Ok(if parts.len() == 1 { parts.remove(0) } else { Expr::Or(parts) })
    }

    /// Parses AND expressions.
    fn parse_and(&mut self) -> Result<Expr, RuntimeError> {
        let mut parts = vec![self.parse_unary()?];
        while self.eat(&Token::And) {
            parts.push(self.parse_unary()?);
        }
        Ok(if parts.len() == 1 { parts.remove(0) } else { Expr::And(parts) })
    }

    /// Parses negations.
    fn parse_unary(&mut self) -> Result<Expr, RuntimeError> {
        let position = self.position();
        if self.eat(&Token::Not) {
            let inner = self.with_nesting(position, Self::parse_unary)?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    /// Parses literals, variables, calls, and parenthesized expressions.
    fn parse_primary(&mut self) -> Result<Expr, RuntimeError> {
        let position = self.position();
        match self.current_token().clone() {
            Token::LParen => {
                self.advance();
                let inner = self.with_nesting(position, Self::parse_expression)?;
                self.expect(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            Token::Str(text) => {
                self.advance();
                Ok(Expr::Str(text.to_string()))
            }
            Token::Number(raw) => {
                self.advance();
                Number::from_str(raw).map(Expr::Number).map_err(|_| RuntimeError::InvalidNumber {
                    raw: raw.to_string(),
                    position,
                })
            }
            Token::Ident("true") => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            Token::Ident("false") => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            Token::Ident(name) => {
                self.advance();
                if self.eat(&Token::LParen) {
                    let args = self.with_nesting(position, Self::parse_arguments)?;
                    Ok(Expr::Call {
                        name: name.to_string(),
                        args,
                    })
                } else {
                    Ok(Expr::Variable(name.to_string()))
                }
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Parses a comma-separated argument list after `(`.
    fn parse_arguments(&mut self) -> Result<Vec<Expr>, RuntimeError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RParen, "`)` after arguments")?;
            return Ok(args);
        }
    }

    /// Runs a parser step while enforcing the nesting limit.
    fn with_nesting<T>(
        &mut self,
        position: usize,
        f: impl FnOnce(&mut Self) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        let next_depth = self.nesting + 1;
        if next_depth > MAX_FILTER_NESTING {
            return Err(RuntimeError::NestingTooDeep {
                max_depth: MAX_FILTER_NESTING,
                actual_depth: next_depth,
                position,
            });
        }
        self.nesting = next_depth;
        let result = f(self);
        self.nesting = self.nesting.saturating_sub(1);
        result
    }

    /// Consumes an identifier.
    fn expect_ident(&mut self, expected: &'static str) -> Result<String, RuntimeError> {
        if let Token::Ident(name) = self.current_token() {
            let name = (*name).to_string();
            self.advance();
            return Ok(name);
        }
        Err(self.unexpected(expected))
    }

    /// Consumes the expected token or returns an error.
    fn expect(&mut self, token: &Token<'_>, expected: &'static str) -> Result<(), RuntimeError> {
        if self.eat(token) { Ok(()) } else { Err(self.unexpected(expected)) }
    }

    /// Consumes the token if it equals `token`.
    fn eat(&mut self, token: &Token<'_>) -> bool {
        if self.current_token() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Builds an unexpected-token error at the current position.
    fn unexpected(&self, expected: &'static str) -> RuntimeError {
        RuntimeError::UnexpectedToken {
            expected,
            found: self.current_token().describe(),
            position: self.position(),
        }
    }

    /// Returns the current token.
    fn current_token(&self) -> &Token<'a> {
        self.tokens.get(self.index).map_or(&Token::Eof, |spanned| &spanned.token)
    }

    /// Returns the byte offset of the current token.
    fn position(&self) -> usize {
        self.tokens.get(self.index).map_or(0, |spanned| spanned.position)
    }

    /// Advances to the next token, stopping at `Eof`.
    fn advance(&mut self) {
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }
}

// ============================================================================
// SECTION: Interpreter
// ============================================================================

/// Runtime value of an expression.
#[derive(Debug, Clone, PartialEq)]
enum Value<'v> {
    /// Boolean.
    Bool(bool),
    /// String.
    Str(&'v str),
    /// Number.
    Number(&'v Number),
    /// Metadata set bound from the message.
    Metadata,
}

impl Value<'_> {
    /// Names the value kind for diagnostics.
    const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Str(_) => "string",
            Self::Number(_) => "number",
            Self::Metadata => "metadata",
        }
    }
}

/// Execution frame for one evaluation.
struct Frame<'r, 'i> {
    /// Owning runtime.
    runtime: &'r FilterRuntime,
    /// Metadata set of the message.
    indicators: &'i [QocIndicator],
    /// Names bound to the metadata set.
    bindings: BTreeSet<String>,
}

impl Frame<'_, '_> {
    /// Runs statements, returning the value of the first `return` reached.
    fn execute(&mut self, statements: &[Statement]) -> Result<Option<bool>, RuntimeError> {
        for statement in statements {
            match statement {
                Statement::Var {
                    name,
                    path,
                } => {
                    if path != METADATA_SOURCE {
                        return Err(RuntimeError::UnsupportedSource {
                            path: path.clone(),
                        });
                    }
                    self.bindings.insert(name.clone());
                }
                Statement::If {
                    condition,
                    body,
                } => {
                    if self.truth(condition)?
                        && let Some(result) = self.execute(body)?
                    {
                        return Ok(Some(result));
                    }
                }
                Statement::Return(value) => return Ok(Some(self.truth(value)?)),
            }
        }
        Ok(None)
    }

    /// Evaluates an expression that must be boolean.
    fn truth(&self, expr: &Expr) -> Result<bool, RuntimeError> {
        match expr {
            Expr::Not(inner) => Ok(!self.truth(inner)?),
            Expr::And(parts) => {
                for part in parts {
                    if !self.truth(part)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Expr::Or(parts) => {
                for part in parts {
                    if self.truth(part)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Expr::Call {
                name,
                args,
            } => self.call(name, args),
            other => match self.value(other)? {
                Value::Bool(value) => Ok(value),
                value => Err(RuntimeError::TypeError {
                    expected: "boolean",
                    found: value.kind(),
                }),
            },
        }
    }

    /// Evaluates a non-logical expression.
    fn value<'e>(&self, expr: &'e Expr) -> Result<Value<'e>, RuntimeError> {
        match expr {
            Expr::Bool(value) => Ok(Value::Bool(*value)),
            Expr::Str(text) => Ok(Value::Str(text)),
            Expr::Number(number) => Ok(Value::Number(number)),
            Expr::Variable(name) => {
                if self.bindings.contains(name) {
                    Ok(Value::Metadata)
                } else {
                    Err(RuntimeError::UnknownVariable {
                        name: name.clone(),
                    })
                }
            }
            Expr::Not(_) | Expr::And(_) | Expr::Or(_) | Expr::Call {
                ..
            } => self.truth(expr).map(Value::Bool),
        }
    }

    /// Dispatches a built-in call.
    fn call(&self, name: &str, args: &[Expr]) -> Result<bool, RuntimeError> {
        match name {
            HAS_DEFINITION_BUILTIN => {
                let [set, definition_id] = args else {
                    return Err(arity(name, "2", args.len()));
                };
                self.expect_metadata(set)?;
                let definition_id = self.expect_str(definition_id)?;
                let Some(definition) = self.resolve_definition(definition_id) else {
                    return Ok(false);
                };
                let operand = Operand::Metadata {
                    indicators: self.indicators,
                    definition,
                };
                Ok(matches(QocOperator::Exists, operand, None))
            }
            MATCH_VALUE_BUILTIN => {
                let (set, definition_id, operator, threshold, selection) = match args {
                    [set, id, op, threshold] => (set, id, op, threshold, None),
                    [set, id, op, threshold, selection] => (set, id, op, threshold, Some(selection)),
                    _ => return Err(arity(name, "4 or 5", args.len())),
                };
                self.expect_metadata(set)?;
                let definition_id = self.expect_str(definition_id)?;
                let operator: QocOperator = self.expect_str(operator)?.parse()?;
                let threshold = self.expect_number(threshold)?;
                let selection = selection.map(|expr| self.expect_str(expr)).transpose()?;
                let Some(definition) = self.resolve_definition(definition_id) else {
                    return Ok(false);
                };
                let right = definition.value(threshold.clone());
                match selection {
                    None => {
                        let operand = Operand::Metadata {
                            indicators: self.indicators,
                            definition,
                        };
                        Ok(matches(operator, operand, Some(&right)))
                    }
                    Some(selection) => {
                        let aggregation = self.runtime.aggregations.get(selection)?;
                        let candidates: Vec<&QocIndicator> = self
                            .indicators
                            .iter()
                            .filter(|indicator| indicator.definition() == definition)
                            .collect();
                        let information: Vec<Information> = candidates
                            .iter()
                            .map(|indicator| Information::from_indicator(indicator))
                            .collect();
                        let chosen = aggregation.aggregate(&information).and_then(|selected| {
                            information
                                .iter()
                                .position(|item| std::ptr::eq(item, selected))
                                .and_then(|position| candidates.get(position))
                        });
                        Ok(chosen.is_some_and(|indicator| {
                            matches(operator, Operand::Value(indicator.metric_value()), Some(&right))
                        }))
                    }
                }
            }
            _ => Err(RuntimeError::UnknownFunction {
                name: name.to_string(),
            }),
        }
    }

    /// Resolves a definition identifier against built-ins, then the metadata set.
    ///
    /// Built-in identifiers always name the built-in definition.
    fn resolve_definition(&self, definition_id: &str) -> Option<MetricDefinition> {
        MetricDefinition::builtin(definition_id).or_else(|| {
            self.indicators
                .iter()
                .map(QocIndicator::definition)
                .find(|definition| definition.definition_id() == definition_id)
        })
    }

    /// Requires a metadata argument.
    fn expect_metadata(&self, expr: &Expr) -> Result<(), RuntimeError> {
        match self.value(expr)? {
            Value::Metadata => Ok(()),
            value => Err(RuntimeError::TypeError {
                expected: "metadata",
                found: value.kind(),
            }),
        }
    }

    /// Requires a string argument.
    fn expect_str<'e>(&self, expr: &'e Expr) -> Result<&'e str, RuntimeError> {
        match self.value(expr)? {
            Value::Str(text) => Ok(text),
            value => Err(RuntimeError::TypeError {
                expected: "string",
                found: value.kind(),
            }),
        }
    }

    /// Requires a numeric argument.
    fn expect_number<'e>(&self, expr: &'e Expr) -> Result<&'e Number, RuntimeError> {
        match self.value(expr)? {
            Value::Number(number) => Ok(number),
            value => Err(RuntimeError::TypeError {
                expected: "number",
                found: value.kind(),
            }),
        }
    }
}

/// Builds an arity error.
fn arity(name: &str, expected: &'static str, found: usize) -> RuntimeError {
    RuntimeError::ArityMismatch {
        name: name.to_string(),
        expected,
        found,
    }
}
