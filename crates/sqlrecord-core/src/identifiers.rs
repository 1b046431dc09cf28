//! Identifier quoting and validation.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static PLAIN_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*)?$")
        .unwrap_or_else(|e| panic!("identifier pattern is valid: {e}"))
});

/// Quote an identifier with ANSI double quotes, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote an identifier with MySQL backticks, doubling embedded backticks.
pub fn quote_ident_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Accept `name` only if it is a plain (optionally schema-qualified)
/// identifier, suitable for inlining unquoted into SQL text.
pub fn validate_identifier(name: &str) -> Result<&str> {
    if PLAIN_IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        tracing::warn!(identifier = name, "Rejected identifier for inlined SQL");
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}
