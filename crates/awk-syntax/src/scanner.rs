//! Event-emitting scanner over AWK source text.
//!
//! One pass, no token buffer: each recognized shape reports straight into
//! the [`ParseSink`]. Line and column are 1-based and counted in
//! characters.

use crate::builtins;
use crate::events::{MessageKind, MessageSeverity, ParseSink, SymbolKind, TokenPos};
use crate::{Dialect, ParseError, ParseOptions};

/// Every open `(` or `[` and what it means for comma handling.
enum Group {
    /// Call argument list; `index` is the current argument number.
    Call { index: i32 },
    /// Parameter list of a function definition header.
    DefHeader,
    /// Condition parens of `if`/`while`/`for`/`switch`.
    Control,
    /// Grouping parens in an expression.
    Plain,
    /// Array subscript brackets.
    Bracket,
}

/// Progress through a `function name(params) {` header.
enum DefState {
    NamePending,
    ParenPending(String),
    InHeader(String),
    BodyPending(String),
}

/// Function whose parameter list or body is currently open.
struct Scope {
    name: String,
    params: Vec<(String, SymbolKind)>,
    locals_started: bool,
    in_body: bool,
    body_open_depth: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    None,
    Ident,
    Number,
    Str,
    Regex,
    CloseParen,
    CloseBracket,
    CloseBrace,
    Op,
    Keyword,
    Comma,
    Semi,
    OpenParen,
    OpenBrace,
    Incr,
    Dollar,
}

impl Prev {
    /// A token that can legally end a statement; a statement keyword right
    /// after one on the same line means a separator is missing.
    fn ends_statement(self) -> bool {
        matches!(
            self,
            Prev::Ident
                | Prev::Number
                | Prev::Str
                | Prev::Regex
                | Prev::CloseParen
                | Prev::CloseBracket
                | Prev::Incr
        )
    }

    /// A regexp literal (rather than division) may start after these.
    fn allows_regex(self) -> bool {
        matches!(
            self,
            Prev::None
                | Prev::Op
                | Prev::Keyword
                | Prev::Comma
                | Prev::Semi
                | Prev::OpenParen
                | Prev::OpenBrace
                | Prev::CloseBrace
        )
    }

    /// Statements continue on the next line after these.
    fn continues_line(self) -> bool {
        matches!(
            self,
            Prev::Op | Prev::Comma | Prev::OpenParen | Prev::OpenBrace | Prev::Keyword
        )
    }
}

const KEYWORDS: &[&str] = &[
    "BEGIN", "BEGINFILE", "END", "ENDFILE", "break", "case", "continue", "default", "delete",
    "do", "else", "exit", "for", "func", "function", "getline", "if", "in", "next", "nextfile",
    "print", "printf", "return", "switch", "while",
];

const GAWK_KEYWORDS: &[&str] = &["BEGINFILE", "ENDFILE", "case", "default", "switch"];

/// Keywords that begin a statement; used for the missing-separator check.
const STATEMENT_KEYWORDS: &[&str] = &[
    "break", "continue", "delete", "do", "exit", "for", "if", "next", "nextfile", "print",
    "printf", "return", "while",
];

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

pub(crate) struct Scanner<'a, S: ParseSink> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
    dialect: Dialect,
    warn_comma: bool,
    warn_future: bool,
    sink: &'a mut S,

    groups: Vec<Group>,
    brace_depth: u32,
    scope: Option<Scope>,
    def: Option<DefState>,

    pending_doc: String,
    pending_doc_end_line: u32,

    prev: Prev,
    prev_line: u32,
    token_index: u32,
    call_name_at: Option<u32>,
    control_kw_at: Option<u32>,
    control_close_at: Option<u32>,
    last_token: TokenPos,
}

impl<'a, S: ParseSink> Scanner<'a, S> {
    pub(crate) fn new(
        text: &'a str,
        dialect: Dialect,
        options: &ParseOptions,
        sink: &'a mut S,
    ) -> Self {
        Scanner {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            dialect,
            warn_comma: options.warn_missing_semicolon,
            warn_future: options.warn_compatibility,
            sink,
            groups: Vec::new(),
            brace_depth: 0,
            scope: None,
            def: None,
            pending_doc: String::new(),
            pending_doc_end_line: 0,
            prev: Prev::None,
            prev_line: 0,
            token_index: 0,
            call_name_at: None,
            control_kw_at: None,
            control_close_at: None,
            last_token: TokenPos::new(1, 1),
        }
    }

    pub(crate) fn run(mut self) -> Result<TokenPos, ParseError> {
        while self.pos < self.bytes.len() {
            let before = self.pos;
            match self.bytes[self.pos] {
                b' ' | b'\t' | b'\r' => self.advance_ascii(1),
                b'\n' => self.newline(),
                b'#' => self.comment(),
                b'"' => self.string_literal(),
                b'@' => self.directive(),
                b'(' => self.open_paren(),
                b')' => self.close_paren(),
                b'{' => self.open_brace(),
                b'}' => self.close_brace(),
                b'[' => self.open_bracket(),
                b']' => self.close_bracket(),
                b',' => self.comma(),
                b';' => self.punct(Prev::Semi),
                b'/' if self.prev.allows_regex() => self.regex_literal(),
                byte if byte.is_ascii_digit() => self.number(),
                b'.' if self.peek(1).is_some_and(|b| b.is_ascii_digit()) => self.number(),
                byte if is_ident_start(byte) => self.word(),
                b'$' => self.punct(Prev::Dollar),
                _ => self.operator(),
            }
            if self.pos == before {
                return Err(ParseError::Stalled { pos: self.last_token });
            }
        }
        self.finish();
        Ok(self.last_token)
    }

    // ----- low-level helpers -----

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn advance_ascii(&mut self, n: usize) {
        self.pos += n;
        self.col += n as u32;
    }

    /// Consume one character of any width; the column advances by one.
    fn advance_char(&mut self) {
        let byte = self.bytes[self.pos];
        let width = if byte < 0x80 {
            1
        } else {
            self.text[self.pos..].chars().next().map_or(1, char::len_utf8)
        };
        self.pos += width;
        self.col += 1;
    }

    fn newline(&mut self) {
        self.pos += 1;
        self.line += 1;
        self.col = 1;
        if !self.prev.continues_line() {
            self.prev = Prev::None;
        }
    }

    fn here(&self) -> TokenPos {
        TokenPos::new(self.line, self.col)
    }

    fn begin_token(&mut self) -> TokenPos {
        let pos = self.here();
        self.token_index += 1;
        self.last_token = pos;
        pos
    }

    fn set_prev(&mut self, prev: Prev, pos: TokenPos) {
        self.prev = prev;
        self.prev_line = pos.line;
    }

    fn error(&mut self, text: &str, pos: TokenPos, length: u32) {
        self.sink
            .message(MessageSeverity::Error, MessageKind::Syntax, text, pos, length);
    }

    fn future_warning(&mut self, text: &str, pos: TokenPos, length: u32) {
        if self.dialect == Dialect::Posix && self.warn_future {
            self.sink
                .message(MessageSeverity::Warning, MessageKind::Future, text, pos, length);
        }
    }

    fn take_doc_for(&mut self, line: u32) -> String {
        let doc = if !self.pending_doc.is_empty() && self.pending_doc_end_line + 1 == line {
            std::mem::take(&mut self.pending_doc)
        } else {
            String::new()
        };
        self.pending_doc.clear();
        self.pending_doc_end_line = 0;
        doc
    }

    /// Any token that cannot continue a `function name(params) {` header
    /// abandons the definition.
    fn abandon_def(&mut self, pos: TokenPos) {
        if self.def.take().is_some() {
            self.error("malformed function definition", pos, 1);
            if matches!(self.groups.last(), Some(Group::DefHeader)) {
                self.groups.pop();
            }
            if self.scope.as_ref().is_some_and(|scope| !scope.in_body) {
                self.scope = None;
            }
        }
    }

    // ----- token handlers -----

    fn comment(&mut self) {
        if self.line == 1 && self.col == 1 && self.peek(1) == Some(b'!') {
            // Shebang; the dialect override was applied before scanning.
            self.skip_to_eol();
            return;
        }
        if self.peek(1) == Some(b'#') {
            let line = self.line;
            let start = self.pos;
            self.skip_to_eol();
            let text = self.text[start..self.pos].trim_end();
            if self.pending_doc.is_empty() || self.pending_doc_end_line + 1 != line {
                self.pending_doc.clear();
                self.pending_doc.push_str(text);
            } else {
                self.pending_doc.push('\n');
                self.pending_doc.push_str(text);
            }
            self.pending_doc_end_line = line;
            return;
        }
        self.skip_to_eol();
    }

    fn skip_to_eol(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.advance_char();
        }
    }

    fn string_literal(&mut self) {
        let pos = self.begin_token();
        self.abandon_def(pos);
        let start = self.pos;
        self.advance_ascii(1);
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                // Backslash-newline continues the string on the next line.
                b'\\' if self.peek(1) == Some(b'\n') => {
                    self.pos += 2;
                    self.line += 1;
                    self.col = 1;
                }
                b'\\' if self.pos + 1 < self.bytes.len() => {
                    self.advance_ascii(1);
                    self.advance_char();
                }
                b'"' => {
                    self.advance_ascii(1);
                    self.set_prev(Prev::Str, pos);
                    return;
                }
                b'\n' => break,
                _ => self.advance_char(),
            }
        }
        let length = (self.pos - start) as u32;
        self.error("unterminated string", pos, length.max(1));
        self.set_prev(Prev::Str, pos);
    }

    fn regex_literal(&mut self) {
        let pos = self.begin_token();
        self.abandon_def(pos);
        let start = self.pos;
        self.advance_ascii(1);
        let mut in_bracket = false;
        let mut bracket_start = true;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' if self.pos + 1 < self.bytes.len() && self.bytes[self.pos + 1] != b'\n' => {
                    self.advance_ascii(1);
                    self.advance_char();
                    bracket_start = false;
                }
                b'[' if !in_bracket => {
                    in_bracket = true;
                    bracket_start = true;
                    self.advance_ascii(1);
                    if self.peek(0) == Some(b'^') {
                        self.advance_ascii(1);
                    }
                }
                b']' if in_bracket && !bracket_start => {
                    in_bracket = false;
                    self.advance_ascii(1);
                }
                b'/' if !in_bracket => {
                    self.advance_ascii(1);
                    self.set_prev(Prev::Regex, pos);
                    return;
                }
                b'\n' => break,
                _ => {
                    bracket_start = false;
                    self.advance_char();
                }
            }
        }
        let length = (self.pos - start) as u32;
        self.error("unterminated regexp", pos, length.max(1));
        self.set_prev(Prev::Regex, pos);
    }

    fn number(&mut self) {
        let pos = self.begin_token();
        self.abandon_def(pos);
        if self.peek(0) == Some(b'0') && matches!(self.peek(1), Some(b'x') | Some(b'X')) {
            self.advance_ascii(2);
            while self.peek(0).is_some_and(|b| b.is_ascii_hexdigit()) {
                self.advance_ascii(1);
            }
        } else {
            while self.peek(0).is_some_and(|b| b.is_ascii_digit()) {
                self.advance_ascii(1);
            }
            if self.peek(0) == Some(b'.') {
                self.advance_ascii(1);
                while self.peek(0).is_some_and(|b| b.is_ascii_digit()) {
                    self.advance_ascii(1);
                }
            }
            if matches!(self.peek(0), Some(b'e') | Some(b'E')) {
                let mut ahead = 1;
                if matches!(self.peek(1), Some(b'+') | Some(b'-')) {
                    ahead = 2;
                }
                if self.peek(ahead).is_some_and(|b| b.is_ascii_digit()) {
                    self.advance_ascii(ahead);
                    while self.peek(0).is_some_and(|b| b.is_ascii_digit()) {
                        self.advance_ascii(1);
                    }
                }
            }
        }
        self.set_prev(Prev::Number, pos);
    }

    fn word(&mut self) {
        let text = self.text;
        let pos = self.begin_token();
        let start = self.pos;
        while self.peek(0).is_some_and(is_ident_byte) {
            self.advance_ascii(1);
        }
        let name = &text[start..self.pos];

        // Name position of a function definition.
        if matches!(self.def, Some(DefState::NamePending)) && !is_keyword(name) {
            let doc = self.take_doc_for(pos.line);
            self.sink.define(SymbolKind::Function, None, name, pos, &doc);
            self.def = Some(DefState::ParenPending(name.to_string()));
            self.set_prev(Prev::Ident, pos);
            return;
        }

        // Parameter inside a definition header.
        if matches!(self.groups.last(), Some(Group::DefHeader)) {
            if is_keyword(name) {
                self.error("unexpected keyword in parameter list", pos, name.len() as u32);
                self.set_prev(Prev::Keyword, pos);
                return;
            }
            let mut gap_len = 0usize;
            let mut gap_wide = false;
            let mut back = start;
            while back > 0 && matches!(self.bytes[back - 1], b' ' | b'\t' | b'\n' | b'\r') {
                if self.bytes[back - 1] != b' ' {
                    gap_wide = true;
                }
                gap_len += 1;
                back -= 1;
            }
            let (function, kind) = {
                let scope = match self.scope.as_mut() {
                    Some(scope) => scope,
                    None => {
                        self.set_prev(Prev::Ident, pos);
                        return;
                    }
                };
                let kind = if scope.params.is_empty() {
                    SymbolKind::Parameter
                } else if scope.locals_started || gap_wide || gap_len >= 2 {
                    SymbolKind::Local
                } else {
                    SymbolKind::Parameter
                };
                if kind == SymbolKind::Local {
                    scope.locals_started = true;
                }
                scope.params.push((name.to_string(), kind));
                (scope.name.clone(), kind)
            };
            self.sink.define(kind, Some(&function), name, pos, "");
            self.set_prev(Prev::Ident, pos);
            return;
        }

        if is_keyword(name) {
            self.keyword(name, pos);
            return;
        }

        self.abandon_def(pos);
        let scope_name = self.scope.as_ref().map(|scope| scope.name.clone());

        if self.peek(0) == Some(b'(') {
            // Call syntax: no space between name and paren.
            if builtins::lookup(name).is_some_and(|b| !b.awk) {
                self.future_warning(
                    &format!("'{name}' is a gawk extension"),
                    pos,
                    name.len() as u32,
                );
            }
            self.sink
                .use_symbol(SymbolKind::Function, scope_name.as_deref(), name, pos);
            self.call_name_at = Some(self.token_index);
            self.set_prev(Prev::Ident, pos);
            return;
        }

        let param_kind = self
            .scope
            .as_ref()
            .and_then(|scope| scope.params.iter().find(|(param, _)| param == name))
            .map(|(_, kind)| *kind);

        match param_kind {
            Some(kind) => {
                self.sink.use_symbol(kind, scope_name.as_deref(), name, pos);
            }
            None => {
                let assigned = self.prev != Prev::Dollar && self.next_is_plain_assign();
                if assigned && builtins::lookup(name).is_none() {
                    let doc = self.take_doc_for(pos.line);
                    self.sink.define(SymbolKind::Global, None, name, pos, &doc);
                } else {
                    if builtins::gawk_only(name) {
                        self.future_warning(
                            &format!("'{name}' is a gawk extension"),
                            pos,
                            name.len() as u32,
                        );
                    }
                    self.sink
                        .use_symbol(SymbolKind::Global, scope_name.as_deref(), name, pos);
                }
            }
        }
        self.set_prev(Prev::Ident, pos);
    }

    /// Looks past spaces and tabs for a plain `=` (not `==`).
    fn next_is_plain_assign(&self) -> bool {
        let mut ahead = self.pos;
        while ahead < self.bytes.len() && matches!(self.bytes[ahead], b' ' | b'\t') {
            ahead += 1;
        }
        self.bytes.get(ahead) == Some(&b'=') && self.bytes.get(ahead + 1) != Some(&b'=')
    }

    fn keyword(&mut self, name: &str, pos: TokenPos) {
        if !matches!(name, "function" | "func") {
            self.abandon_def(pos);
        }
        if self.warn_comma
            && STATEMENT_KEYWORDS.contains(&name)
            && self.prev_line == pos.line
            && self.prev.ends_statement()
            && self.control_close_at != Some(self.token_index - 1)
        {
            self.sink.message(
                MessageSeverity::Warning,
                MessageKind::Comma,
                "statements on the same line should be separated with ';'",
                pos,
                name.len() as u32,
            );
        }

        if GAWK_KEYWORDS.contains(&name) {
            self.future_warning(&format!("'{name}' is a gawk extension"), pos, name.len() as u32);
        }

        match name {
            "function" | "func" => {
                if self.brace_depth == 0 && self.scope.is_none() {
                    self.def = Some(DefState::NamePending);
                }
            }
            "if" | "while" | "for" | "switch" => {
                self.control_kw_at = Some(self.token_index);
            }
            _ => {}
        }
        self.set_prev(Prev::Keyword, pos);
    }

    fn open_paren(&mut self) {
        let pos = self.begin_token();
        self.advance_ascii(1);

        if matches!(self.def, Some(DefState::NamePending) | Some(DefState::BodyPending(_))) {
            self.abandon_def(pos);
        }
        if self.call_name_at == Some(self.token_index - 1) {
            self.groups.push(Group::Call { index: 0 });
            self.sink.function_call(true, pos);
            self.sink
                .parameter(0, true, TokenPos::new(pos.line, pos.column + 1));
        } else if matches!(self.def, Some(DefState::ParenPending(_))) {
            let Some(DefState::ParenPending(name)) = self.def.take() else {
                unreachable!("matched ParenPending above");
            };
            self.groups.push(Group::DefHeader);
            self.scope = Some(Scope {
                name: name.clone(),
                params: Vec::new(),
                locals_started: false,
                in_body: false,
                body_open_depth: 0,
            });
            self.def = Some(DefState::InHeader(name));
        } else if self.control_kw_at == Some(self.token_index - 1) {
            self.groups.push(Group::Control);
        } else {
            self.groups.push(Group::Plain);
        }
        self.set_prev(Prev::OpenParen, pos);
    }

    fn close_paren(&mut self) {
        let pos = self.begin_token();
        self.advance_ascii(1);
        if !matches!(self.def, None | Some(DefState::InHeader(_))) {
            self.abandon_def(pos);
        }
        match self.groups.pop() {
            Some(Group::Call { index }) => {
                // An empty argument list reports -1 so consumers can tell
                // `f()` from `f(x)`; both got an index-0 start marker.
                let mut back = self.pos.saturating_sub(1);
                while back > 0 && matches!(self.bytes[back - 1], b' ' | b'\t' | b'\n' | b'\r') {
                    back -= 1;
                }
                let empty = back > 0 && self.bytes[back - 1] == b'(';
                self.sink.parameter(if empty { -1 } else { index }, false, pos);
                self.sink.function_call(false, pos);
                self.set_prev(Prev::CloseParen, pos);
            }
            Some(Group::DefHeader) => {
                if let Some(DefState::InHeader(name)) = self.def.take() {
                    let arity = self
                        .scope
                        .as_ref()
                        .map(|scope| {
                            scope
                                .params
                                .iter()
                                .filter(|(_, kind)| *kind == SymbolKind::Parameter)
                                .count()
                        })
                        .unwrap_or(0);
                    self.sink.arity(&name, arity);
                    self.def = Some(DefState::BodyPending(name));
                }
                self.set_prev(Prev::CloseParen, pos);
            }
            Some(Group::Control) => {
                self.control_close_at = Some(self.token_index);
                self.set_prev(Prev::CloseParen, pos);
            }
            Some(Group::Plain) | Some(Group::Bracket) => {
                self.set_prev(Prev::CloseParen, pos);
            }
            None => {
                self.error("unexpected ')'", pos, 1);
                self.set_prev(Prev::CloseParen, pos);
            }
        }
    }

    fn open_brace(&mut self) {
        let pos = self.begin_token();
        self.advance_ascii(1);
        if matches!(self.def, Some(DefState::BodyPending(_))) {
            self.def = None;
            self.sink.function_block(true, pos);
            if let Some(scope) = self.scope.as_mut() {
                scope.in_body = true;
                scope.body_open_depth = self.brace_depth;
            }
        } else {
            self.abandon_def(pos);
        }
        self.brace_depth += 1;
        self.set_prev(Prev::OpenBrace, pos);
    }

    fn close_brace(&mut self) {
        let pos = self.begin_token();
        self.advance_ascii(1);
        self.abandon_def(pos);
        if self.brace_depth == 0 {
            self.error("unexpected '}'", pos, 1);
        } else {
            self.brace_depth -= 1;
            let closes_body = self
                .scope
                .as_ref()
                .is_some_and(|scope| scope.in_body && self.brace_depth == scope.body_open_depth);
            if closes_body {
                self.sink.function_block(false, pos);
                self.scope = None;
            }
        }
        self.set_prev(Prev::CloseBrace, pos);
    }

    fn open_bracket(&mut self) {
        let pos = self.begin_token();
        self.advance_ascii(1);
        self.abandon_def(pos);
        self.groups.push(Group::Bracket);
        self.set_prev(Prev::Op, pos);
    }

    fn close_bracket(&mut self) {
        let pos = self.begin_token();
        self.advance_ascii(1);
        self.abandon_def(pos);
        if matches!(self.groups.last(), Some(Group::Bracket)) {
            self.groups.pop();
        } else {
            self.error("unexpected ']'", pos, 1);
        }
        self.set_prev(Prev::CloseBracket, pos);
    }

    fn comma(&mut self) {
        let pos = self.begin_token();
        self.advance_ascii(1);
        if self.def.is_some() && !matches!(self.groups.last(), Some(Group::DefHeader)) {
            self.abandon_def(pos);
        }
        if let Some(Group::Call { index }) = self.groups.last_mut() {
            *index += 1;
            let marker = (*index, TokenPos::new(pos.line, pos.column + 1));
            self.sink.parameter(marker.0, true, marker.1);
        }
        self.set_prev(Prev::Comma, pos);
    }

    fn punct(&mut self, prev: Prev) {
        let pos = self.begin_token();
        self.advance_ascii(1);
        self.abandon_def(pos);
        self.set_prev(prev, pos);
    }

    fn operator(&mut self) {
        let pos = self.begin_token();
        self.abandon_def(pos);
        let first = self.bytes[self.pos];
        let second = self.peek(1);
        let prev = match (first, second) {
            (b'+', Some(b'+')) | (b'-', Some(b'-')) => {
                self.advance_ascii(2);
                Prev::Incr
            }
            (b'=', Some(b'='))
            | (b'!', Some(b'='))
            | (b'<', Some(b'='))
            | (b'>', Some(b'='))
            | (b'&', Some(b'&'))
            | (b'|', Some(b'|'))
            | (b'!', Some(b'~'))
            | (b'+', Some(b'='))
            | (b'-', Some(b'='))
            | (b'*', Some(b'='))
            | (b'/', Some(b'='))
            | (b'%', Some(b'='))
            | (b'^', Some(b'='))
            | (b'>', Some(b'>'))
            | (b'|', Some(b'&'))
            | (b'*', Some(b'*')) => {
                self.advance_ascii(2);
                Prev::Op
            }
            _ => {
                self.advance_char();
                Prev::Op
            }
        };
        self.set_prev(prev, pos);
    }

    fn directive(&mut self) {
        let pos = self.begin_token();
        self.abandon_def(pos);
        let word_start = self.pos + 1;
        let mut word_end = word_start;
        while word_end < self.bytes.len() && is_ident_byte(self.bytes[word_end]) {
            word_end += 1;
        }
        let word = &self.text[word_start..word_end];
        self.advance_ascii(1 + word.len());

        match word {
            "include" => {
                self.future_warning("'@include' is a gawk extension", pos, 8);
                while matches!(self.peek(0), Some(b' ') | Some(b'\t')) {
                    self.advance_ascii(1);
                }
                if self.peek(0) != Some(b'"') {
                    self.error("expected a quoted filename after '@include'", pos, 8);
                    self.set_prev(Prev::Semi, pos);
                    return;
                }
                self.advance_ascii(1);
                let name_start = self.pos;
                while self.pos < self.bytes.len()
                    && self.bytes[self.pos] != b'"'
                    && self.bytes[self.pos] != b'\n'
                {
                    self.advance_char();
                }
                let filename = self.text[name_start..self.pos].to_string();
                if self.peek(0) == Some(b'"') {
                    self.advance_ascii(1);
                } else {
                    self.error("unterminated filename after '@include'", pos, 8);
                }
                let length = self.col - pos.column;
                let relative = filename.starts_with("./")
                    || filename.starts_with("../")
                    || filename.starts_with('/');
                self.sink.include(&filename, relative, pos, length);
                self.set_prev(Prev::Semi, pos);
            }
            "load" | "namespace" => {
                self.future_warning(
                    &format!("'@{word}' is a gawk extension"),
                    pos,
                    1 + word.len() as u32,
                );
                while matches!(self.peek(0), Some(b' ') | Some(b'\t')) {
                    self.advance_ascii(1);
                }
                if self.peek(0) == Some(b'"') {
                    self.string_literal();
                }
                self.set_prev(Prev::Semi, pos);
            }
            _ => {
                self.error("unexpected '@'", pos, 1 + word.len() as u32);
                self.set_prev(Prev::Op, pos);
            }
        }
    }

    fn finish(&mut self) {
        if self.def.is_some() {
            let pos = self.last_token;
            self.error("unterminated function definition", pos, 1);
            self.def = None;
        }
        if !self.groups.is_empty() || self.brace_depth > 0 {
            let pos = self.last_token;
            self.error("unexpected end of file", pos, 1);
        }
    }
}
