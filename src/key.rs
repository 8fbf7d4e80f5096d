//! Cache key derivation.
//!
//! Keys have the form `<prefix>:<namespace>[:<operand>]`:
//!
//! - `namespace` is the descriptor's namespace, or `<Type>:<operation>` when
//!   none was declared.
//! - `operand` is empty for calls without arguments, the `:`-joined string
//!   forms of all arguments when there is no key expression, and otherwise
//!   the string form of the evaluated expression.
//!
//! If a key expression is declared but parameter names are unavailable, the
//! operand is skipped and the key degrades to `<prefix>:<namespace>`.

use std::fmt;
use std::sync::Arc;

use crate::args::{Args, render};
use crate::descriptor::{CacheDescriptor, CacheKind};
use crate::error::CacheError;
use crate::expr::{KeyEvaluator, PathEvaluator};

const SEPARATOR: char = ':';

/// A fully derived store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives cache keys from a descriptor and the arguments of one call.
///
/// Stateless apart from its configuration; safe to share across tasks.
#[derive(Clone)]
pub struct KeyBuilder {
    prefix: String,
    evaluator: Arc<dyn KeyEvaluator>,
}

impl fmt::Debug for KeyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBuilder")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl KeyBuilder {
    /// Key builder using the built-in [`PathEvaluator`].
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_evaluator(prefix, Arc::new(PathEvaluator))
    }

    pub fn with_evaluator(prefix: impl Into<String>, evaluator: Arc<dyn KeyEvaluator>) -> Self {
        KeyBuilder {
            prefix: prefix.into(),
            evaluator,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key and configured TTL for a read-through call.
    ///
    /// The TTL is returned as declared; the `<= 0` fallback is applied by the
    /// interceptor.
    pub fn read_key(
        &self,
        descriptor: &CacheDescriptor,
        args: &Args,
    ) -> Result<(CacheKey, i64), CacheError> {
        if descriptor.kind != CacheKind::ReadThrough {
            return Err(CacheError::KeyDerivation(format!(
                "operation '{}' is not read-through",
                descriptor.operation
            )));
        }
        Ok((self.key(descriptor, args)?, descriptor.ttl_secs))
    }

    /// Key for an evict call. Same derivation as [`KeyBuilder::read_key`].
    pub fn evict_key(&self, descriptor: &CacheDescriptor, args: &Args) -> Result<CacheKey, CacheError> {
        self.key(descriptor, args)
    }

    /// Namespace used for `descriptor`: declared, or `<Type>:<operation>`.
    pub fn namespace(&self, descriptor: &CacheDescriptor) -> String {
        if descriptor.namespace.is_empty() {
            format!(
                "{}{}{}",
                descriptor.operation.type_name(),
                SEPARATOR,
                descriptor.operation.name()
            )
        } else {
            descriptor.namespace.clone()
        }
    }

    fn key(&self, descriptor: &CacheDescriptor, args: &Args) -> Result<CacheKey, CacheError> {
        let mut key = String::with_capacity(self.prefix.len() + 32);
        key.push_str(&self.prefix);
        key.push(SEPARATOR);
        key.push_str(&self.namespace(descriptor));

        if let Some(operand) = self.operand(descriptor, args)? {
            key.push(SEPARATOR);
            key.push_str(&operand);
        }

        Ok(CacheKey(key))
    }

    fn operand(&self, descriptor: &CacheDescriptor, args: &Args) -> Result<Option<String>, CacheError> {
        if args.is_empty() {
            return Ok(None);
        }

        if let Some(reason) = args.invalid() {
            return Err(CacheError::KeyDerivation(reason.to_string()));
        }

        let expression = descriptor.key_expression.as_str();
        if expression.is_empty() {
            let joined = args
                .values()
                .iter()
                .map(render)
                .collect::<Vec<_>>()
                .join(":");
            return Ok(Some(joined));
        }

        let Some(bindings) = args.bindings() else {
            tracing::warn!(
                "Parameter names unavailable, key expression ignored: operation={}, expression={}",
                descriptor.operation,
                expression
            );
            return Ok(None);
        };

        let value = self.evaluator.evaluate(expression, &bindings)?;
        Ok(Some(render(&value)))
    }
}
