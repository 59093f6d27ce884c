//! AWK source front-end for the language server.
//!
//! [`parse`] drives a single scan over one document's text and reports
//! definitions, usages, `@include` directives, diagnostics, and
//! call/argument positions to a caller-supplied [`ParseSink`]. The sink is
//! an explicit per-call context, so nothing persists in the front-end
//! between parses.
//!
//! This is not a full AWK grammar. The scanner recognizes exactly the
//! shapes the analysis needs — function definitions and their parameter
//! lists, calls, variable references, includes, comments, string and regexp
//! literals, statement separators — and stays silent about the rest.

mod events;
mod scanner;

pub mod builtins;

pub use events::{MessageKind, MessageSeverity, ParseSink, SymbolKind, TokenPos};

use thiserror::Error;

/// Language dialect a parse runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Strict POSIX AWK: gawk-only built-ins and constructs draw
    /// compatibility warnings and are hidden from built-in lookups.
    Posix,
    /// GNU AWK with extensions. The default.
    #[default]
    Gawk,
}

#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Process-wide dialect; a shebang line in the text overrides it for
    /// this parse only.
    pub dialect: Dialect,
    /// Base name of the file (without extension), used as the outline
    /// container hint. Suppressed for base names ending in `Constants`.
    pub file_base_name: Option<String>,
    /// Emit `comma` (missing statement separator) warnings.
    pub warn_missing_semicolon: bool,
    /// Emit `future` (gawk compatibility) warnings in POSIX mode.
    pub warn_compatibility: bool,
}

/// What a completed parse reports back to the caller.
#[derive(Debug, Clone)]
pub struct ParseSummary {
    /// Dialect the parse actually ran under, after any shebang override.
    pub dialect: Dialect,
    /// Effective outline container symbol, `None` when suppressed.
    pub file_symbol: Option<String>,
    /// Position of the last token the scanner consumed.
    pub last_pos: TokenPos,
}

/// Crash-level failure. Ordinary syntax problems surface as `message`
/// events; this is reserved for the scanner detecting that it can no longer
/// make progress. The position anchors the caller's fallback diagnostic.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("scanner stalled at line {}, column {}", .pos.line, .pos.column)]
    Stalled { pos: TokenPos },
}

/// Scan `text`, emitting events into `sink`.
pub fn parse<S: ParseSink>(
    text: &str,
    options: &ParseOptions,
    sink: &mut S,
) -> Result<ParseSummary, ParseError> {
    let dialect = text
        .lines()
        .next()
        .and_then(detect_shebang_dialect)
        .unwrap_or(options.dialect);
    let file_symbol = options
        .file_base_name
        .as_deref()
        .filter(|base| !base.ends_with("Constants"))
        .map(str::to_owned);

    let last_pos = scanner::Scanner::new(text, dialect, options, sink).run()?;

    Ok(ParseSummary {
        dialect,
        file_symbol,
        last_pos,
    })
}

/// Dialect override from a shebang line, equivalent to the pattern
/// `^#!(.*[^a-z])?([a-z]?awk) +-f`: an interpreter word that is `awk` with
/// at most one lowercase letter prefixed (`gawk`, `mawk`, `nawk`), followed
/// by at least one space and `-f`.
pub fn detect_shebang_dialect(first_line: &str) -> Option<Dialect> {
    let rest = first_line.strip_prefix("#!")?;
    let bytes = rest.as_bytes();

    for (at, _) in rest.match_indices("awk") {
        let mut word_start = at;
        if word_start > 0 && bytes[word_start - 1].is_ascii_lowercase() {
            word_start -= 1;
        }
        if word_start > 0 && bytes[word_start - 1].is_ascii_lowercase() {
            continue;
        }

        let mut after = at + 3;
        if after >= bytes.len() || bytes[after] != b' ' {
            continue;
        }
        while after < bytes.len() && bytes[after] == b' ' {
            after += 1;
        }
        if !rest[after..].starts_with("-f") {
            continue;
        }

        let word = &rest[word_start..at + 3];
        return Some(if word == "gawk" { Dialect::Gawk } else { Dialect::Posix });
    }
    None
}
