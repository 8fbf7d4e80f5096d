//! Key expressions: computing a cache key operand from named call arguments.
//!
//! The built-in [`PathEvaluator`] understands a small expression language:
//!
//! ```text
//! #user.id                    field access on a bound argument
//! #ids[0]  or  #ids.0         array indexing
//! 'tenant-' + #tenant + #id   concatenation of string forms
//! ```
//!
//! The leading `#` on variables is optional. Anything richer can be plugged in
//! through [`KeyEvaluator`].

use serde_json::Value;

use crate::args::render;
use crate::error::CacheError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    #[error("empty key expression")]
    Empty,

    #[error("malformed key expression '{expression}' at {position}: {message}")]
    Parse {
        expression: String,
        position: usize,
        message: String,
    },

    #[error("unknown variable '{0}' in key expression")]
    UnknownVariable(String),

    #[error("'{path}' does not resolve to a value")]
    MissingProperty { path: String },
}

impl From<ExprError> for CacheError {
    fn from(err: ExprError) -> Self {
        CacheError::KeyDerivation(err.to_string())
    }
}

/// Strategy for evaluating a key expression against named arguments.
pub trait KeyEvaluator: Send + Sync {
    fn evaluate(&self, expression: &str, bindings: &[(&str, &Value)]) -> Result<Value, ExprError>;
}

/// Built-in evaluator for property paths, string literals and `+`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEvaluator;

impl KeyEvaluator for PathEvaluator {
    fn evaluate(&self, expression: &str, bindings: &[(&str, &Value)]) -> Result<Value, ExprError> {
        let terms = Parser::new(expression).parse()?;

        let mut values = Vec::with_capacity(terms.len());
        for term in &terms {
            values.push(resolve(term, bindings)?);
        }

        if values.len() == 1 {
            return Ok(values.remove(0));
        }
        Ok(Value::String(values.iter().map(render).collect()))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Term {
    Literal(String),
    Path { root: String, segments: Vec<Segment> },
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Field(String),
    Index(usize),
}

fn resolve(term: &Term, bindings: &[(&str, &Value)]) -> Result<Value, ExprError> {
    let (root, segments) = match term {
        Term::Literal(s) => return Ok(Value::String(s.clone())),
        Term::Path { root, segments } => (root, segments),
    };

    let mut current = bindings
        .iter()
        .find(|(name, _)| *name == root.as_str())
        .map(|(_, value)| *value)
        .ok_or_else(|| ExprError::UnknownVariable(root.clone()))?;

    let mut path = root.clone();
    for segment in segments {
        let next = match segment {
            Segment::Field(field) => {
                path.push('.');
                path.push_str(field);
                match current {
                    Value::Object(map) => map.get(field),
                    // Numeric field names also index arrays: `#ids.0`.
                    Value::Array(items) => field.parse::<usize>().ok().and_then(|i| items.get(i)),
                    _ => None,
                }
            }
            Segment::Index(i) => {
                path.push_str(&format!("[{}]", i));
                current.as_array().and_then(|items| items.get(*i))
            }
        };
        current = next.ok_or_else(|| ExprError::MissingProperty { path: path.clone() })?;
    }

    Ok(current.clone())
}

struct Parser<'a> {
    src: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Parser {
            src,
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Vec<Term>, ExprError> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(ExprError::Empty);
        }

        let mut terms = vec![self.term()?];
        loop {
            self.skip_ws();
            match self.peek() {
                None => break,
                Some('+') => {
                    self.pos += 1;
                    self.skip_ws();
                    terms.push(self.term()?);
                }
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            }
        }
        Ok(terms)
    }

    fn term(&mut self) -> Result<Term, ExprError> {
        match self.peek() {
            Some('\'') => self.literal(),
            Some('#') => {
                self.pos += 1;
                self.path()
            }
            Some(c) if is_ident_start(c) => self.path(),
            Some(c) => Err(self.error(format!("unexpected '{}'", c))),
            None => Err(self.error("expected a term")),
        }
    }

    fn literal(&mut self) -> Result<Term, ExprError> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string literal")),
                // `''` is an escaped quote.
                Some('\'') if self.chars.get(self.pos + 1) == Some(&'\'') => {
                    out.push('\'');
                    self.pos += 2;
                }
                Some('\'') => {
                    self.pos += 1;
                    return Ok(Term::Literal(out));
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn path(&mut self) -> Result<Term, ExprError> {
        let root = self.ident()?;
        let mut segments = Vec::new();
        loop {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    let field = self.take_while(|c| c.is_alphanumeric() || c == '_');
                    if field.is_empty() {
                        return Err(self.error("expected a property name after '.'"));
                    }
                    segments.push(Segment::Field(field));
                }
                Some('[') => {
                    self.pos += 1;
                    let digits = self.take_while(|c| c.is_ascii_digit());
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| self.error("expected an index inside '[]'"))?;
                    if self.peek() != Some(']') {
                        return Err(self.error("expected ']'"));
                    }
                    self.pos += 1;
                    segments.push(Segment::Index(index));
                }
                _ => break,
            }
        }
        Ok(Term::Path { root, segments })
    }

    fn ident(&mut self) -> Result<String, ExprError> {
        match self.peek() {
            Some(c) if is_ident_start(c) => {
                Ok(self.take_while(|c| c.is_alphanumeric() || c == '_'))
            }
            _ => Err(self.error("expected a variable name")),
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> ExprError {
        ExprError::Parse {
            expression: self.src.to_string(),
            position: self.pos,
            message: message.into(),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(expression: &str, bindings: &[(&str, &Value)]) -> Result<Value, ExprError> {
        PathEvaluator.evaluate(expression, bindings)
    }

    #[test]
    fn test_variable_lookup() {
        let id = json!(42);
        assert_eq!(eval("#id", &[("id", &id)]).unwrap(), json!(42));
        assert_eq!(eval("id", &[("id", &id)]).unwrap(), json!(42));
    }

    #[test]
    fn test_property_path() {
        let user = json!({"profile": {"email": "a@b.c"}, "tags": ["x", "y"]});
        let bindings = [("user", &user)];
        assert_eq!(eval("#user.profile.email", &bindings).unwrap(), json!("a@b.c"));
        assert_eq!(eval("#user.tags[1]", &bindings).unwrap(), json!("y"));
        assert_eq!(eval("#user.tags.0", &bindings).unwrap(), json!("x"));
    }

    #[test]
    fn test_concatenation() {
        let tenant = json!("acme");
        let id = json!(7);
        let value = eval("#tenant + '-' + #id", &[("tenant", &tenant), ("id", &id)]).unwrap();
        assert_eq!(value, json!("acme-7"));

        let value = eval("'it''s'", &[]).unwrap();
        assert_eq!(value, json!("it's"));
    }

    #[test]
    fn test_unknown_variable() {
        let id = json!(1);
        assert_eq!(
            eval("#missing", &[("id", &id)]),
            Err(ExprError::UnknownVariable("missing".to_string()))
        );
    }

    #[test]
    fn test_missing_property() {
        let user = json!({"id": 1});
        let err = eval("#user.name", &[("user", &user)]).unwrap_err();
        assert_eq!(
            err,
            ExprError::MissingProperty {
                path: "user.name".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_expressions() {
        assert_eq!(eval("   ", &[]), Err(ExprError::Empty));
        assert!(matches!(eval("#a +", &[]), Err(ExprError::Parse { .. })));
        assert!(matches!(eval("'open", &[]), Err(ExprError::Parse { .. })));
        assert!(matches!(eval("#a[x]", &[]), Err(ExprError::Parse { .. })));
        assert!(matches!(eval("#a * 2", &[]), Err(ExprError::Parse { .. })));
    }

    #[test]
    fn test_converts_to_key_derivation_error() {
        let err: CacheError = ExprError::Empty.into();
        assert!(matches!(err, CacheError::KeyDerivation(_)));
    }
}
