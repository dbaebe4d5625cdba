//! Lexical scanning of HDL sources for defined and referenced design units.
//!
//! This is not a parser. It tokenizes just enough of the source to find unit
//! declarations (`module`, `interface`, `program`, `package`, VHDL `entity`)
//! and the names a file refers to (module instantiations, `pkg::` scopes,
//! VHDL component and entity instantiations). References to names that the
//! project does not define are harmless: they never produce graph edges.

use crate::dialect::Dialect;
use std::collections::BTreeSet;

/// Design units found in one source file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnitScan {
    /// Units declared in the file, in source order, without duplicates.
    pub units: Vec<String>,
    /// Names the file refers to that may be units defined elsewhere.
    pub uses: BTreeSet<String>,
}

impl UnitScan {
    fn define(&mut self, name: &str) {
        if !self.units.iter().any(|u| u == name) {
            self.units.push(name.to_string());
        }
    }
}

/// Scans `source` according to `dialect`.
///
/// Unknown dialects yield an empty scan.
pub fn scan_source(source: &str, dialect: Dialect) -> UnitScan {
    match dialect {
        Dialect::Verilog | Dialect::SystemVerilog => scan_verilog(source),
        Dialect::Vhdl => scan_vhdl(source),
        Dialect::Unknown => UnitScan::default(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    Ident(String),
    Punct(u8),
}

impl Tok {
    fn ident(&self) -> Option<&str> {
        match self {
            Tok::Ident(s) => Some(s),
            Tok::Punct(_) => None,
        }
    }

    fn is(&self, b: u8) -> bool {
        *self == Tok::Punct(b)
    }
}

/// Comment syntax of the language being tokenized.
#[derive(Clone, Copy)]
enum Syntax {
    Verilog,
    Vhdl,
}

struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    syntax: Syntax,
}

impl Lexer<'_> {
    fn tokenize(source: &str, syntax: Syntax) -> Vec<Tok> {
        let mut lexer = Lexer {
            source: source.as_bytes(),
            pos: 0,
            syntax,
        };
        let mut tokens = Vec::new();
        while let Some(tok) = lexer.next_token() {
            tokens.push(tok);
        }
        tokens
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.source.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) {
        while !self.at_end() && pred(self.source[self.pos]) {
            self.pos += 1;
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            self.skip_while(|b| b.is_ascii_whitespace());
            if self.at_end() {
                return;
            }
            match self.syntax {
                Syntax::Verilog if self.peek() == b'/' && self.peek_at(1) == b'/' => {
                    self.skip_while(|b| b != b'\n');
                }
                Syntax::Verilog if self.peek() == b'/' && self.peek_at(1) == b'*' => {
                    self.pos += 2;
                    while !self.at_end() && !(self.peek() == b'*' && self.peek_at(1) == b'/') {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.source.len());
                }
                Syntax::Vhdl if self.peek() == b'-' && self.peek_at(1) == b'-' => {
                    self.skip_while(|b| b != b'\n');
                }
                _ => return,
            }
        }
    }

    fn next_token(&mut self) -> Option<Tok> {
        loop {
            self.skip_trivia();
            if self.at_end() {
                return None;
            }
            let start = self.pos;
            let b = self.peek();
            match b {
                b'"' => {
                    self.pos += 1;
                    while !self.at_end() && self.peek() != b'"' && self.peek() != b'\n' {
                        if self.peek() == b'\\' {
                            self.pos += 1;
                        }
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 1).min(self.source.len());
                }
                // Compiler directives and macro uses: `define, `include, `MACRO
                b'`' if matches!(self.syntax, Syntax::Verilog) => {
                    self.pos += 1;
                    self.skip_while(is_ident_continue);
                }
                // Escaped identifier, terminated by whitespace.
                b'\\' if matches!(self.syntax, Syntax::Verilog) => {
                    self.pos += 1;
                    self.skip_while(|b| !b.is_ascii_whitespace());
                    let text = String::from_utf8_lossy(&self.source[start + 1..self.pos]);
                    return Some(Tok::Ident(text.into_owned()));
                }
                // Numbers, including sized literals like 4'b1010 and 1ns.
                b'0'..=b'9' | b'\'' => {
                    self.pos += 1;
                    self.skip_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'\'');
                }
                // System tasks and functions: $display
                b'$' => {
                    self.pos += 1;
                    self.skip_while(is_ident_continue);
                }
                _ if is_ident_start(b) => {
                    self.skip_while(is_ident_continue);
                    let text = String::from_utf8_lossy(&self.source[start..self.pos]);
                    let text = match self.syntax {
                        Syntax::Verilog => text.into_owned(),
                        Syntax::Vhdl => text.to_ascii_lowercase(),
                    };
                    return Some(Tok::Ident(text));
                }
                _ => {
                    self.pos += 1;
                    return Some(Tok::Punct(b));
                }
            }
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Keywords that can never name an instantiated module.
const VERILOG_KEYWORDS: &[&str] = &[
    "always", "always_comb", "always_ff", "always_latch", "and", "assert", "assign",
    "assume", "automatic", "begin", "bind", "bit", "buf", "byte", "case", "casex", "casez",
    "class", "const", "constraint", "cover", "default", "defparam", "disable", "do", "else",
    "end", "endcase", "endclass", "endfunction", "endgenerate", "endinterface", "endmodule",
    "endpackage", "endprogram", "endtask", "enum", "event", "export", "extends", "final",
    "for", "forever", "fork", "function", "generate", "genvar", "if", "import", "initial",
    "inout", "input", "int", "integer", "interface", "join", "join_any", "join_none",
    "localparam", "logic", "longint", "macromodule", "module", "modport", "nand", "negedge",
    "new", "nor", "not", "or", "output", "package", "packed", "parameter", "posedge",
    "program", "property", "real", "reg", "repeat", "return", "sequence", "shortint",
    "signed", "static", "string", "struct", "super", "supply0", "supply1", "task", "this",
    "time", "tri", "typedef", "union", "unique", "unsigned", "var", "virtual", "void",
    "wait", "while", "wire", "xnor", "xor",
];

/// Unit-introducing keywords whose following identifier is a defined unit.
const VERILOG_UNIT_KEYWORDS: &[&str] = &["module", "macromodule", "interface", "program", "package"];

fn is_verilog_keyword(s: &str) -> bool {
    VERILOG_KEYWORDS.contains(&s)
}

fn scan_verilog(source: &str) -> UnitScan {
    let toks = Lexer::tokenize(source, Syntax::Verilog);
    let mut scan = UnitScan::default();
    let ident_at = |i: usize| toks.get(i).and_then(Tok::ident);
    let punct_at = |i: usize, b: u8| toks.get(i).is_some_and(|t| t.is(b));

    let mut i = 0;
    while i < toks.len() {
        let Some(word) = ident_at(i) else {
            i += 1;
            continue;
        };

        if VERILOG_UNIT_KEYWORDS.contains(&word) {
            // `virtual interface foo` declares a handle, not a unit.
            let is_virtual = i > 0 && ident_at(i - 1) == Some("virtual");
            let mut j = i + 1;
            if matches!(ident_at(j), Some("automatic" | "static")) {
                j += 1;
            }
            if !is_virtual {
                if let Some(name) = ident_at(j).filter(|n| !is_verilog_keyword(n)) {
                    scan.define(name);
                }
            }
            i = j + 1;
            continue;
        }

        if is_verilog_keyword(word) {
            i += 1;
            continue;
        }

        // pkg::item
        if punct_at(i + 1, b':') && punct_at(i + 2, b':') {
            scan.uses.insert(word.to_string());
            i += 3;
            continue;
        }

        // module_name [#( ... )] instance_name [ [range] ] (
        let mut j = i + 1;
        if punct_at(j, b'#') {
            j += 1;
            if punct_at(j, b'(') {
                j = skip_balanced(&toks, j, b'(', b')');
            } else {
                // #delay or #WIDTH with a single token
                j += 1;
            }
        }
        if ident_at(j).is_some_and(|n| !is_verilog_keyword(n)) {
            let mut k = j + 1;
            if punct_at(k, b'[') {
                k = skip_balanced(&toks, k, b'[', b']');
            }
            if punct_at(k, b'(') {
                scan.uses.insert(word.to_string());
                i = k;
                continue;
            }
        }
        i += 1;
    }
    scan
}

/// Returns the index just past the bracket matching the opener at `start`.
fn skip_balanced(toks: &[Tok], start: usize, open: u8, close: u8) -> usize {
    let mut depth = 0usize;
    let mut j = start;
    while j < toks.len() {
        if toks[j].is(open) {
            depth += 1;
        } else if toks[j].is(close) {
            depth -= 1;
            if depth == 0 {
                return j + 1;
            }
        }
        j += 1;
    }
    j
}

fn scan_vhdl(source: &str) -> UnitScan {
    let toks = Lexer::tokenize(source, Syntax::Vhdl);
    let mut scan = UnitScan::default();
    let ident_at = |i: usize| toks.get(i).and_then(Tok::ident);
    let punct_at = |i: usize, b: u8| toks.get(i).is_some_and(|t| t.is(b));

    let mut i = 0;
    while i < toks.len() {
        match ident_at(i) {
            // entity NAME is
            Some("entity") if ident_at(i + 2) == Some("is") => {
                if let Some(name) = ident_at(i + 1) {
                    scan.define(name);
                }
                i += 3;
            }
            // package NAME is (but not `package body NAME is`)
            Some("package") if ident_at(i + 2) == Some("is") => {
                if let Some(name) = ident_at(i + 1).filter(|n| *n != "body") {
                    scan.define(name);
                }
                i += 3;
            }
            // inst: entity lib.NAME
            Some("entity") if punct_at(i + 2, b'.') => {
                if let Some(name) = ident_at(i + 3) {
                    scan.uses.insert(name.to_string());
                }
                i += 4;
            }
            // component NAME
            Some("component") => {
                if let Some(name) = ident_at(i + 1) {
                    scan.uses.insert(name.to_string());
                }
                i += 2;
            }
            // use lib.PKG.all
            Some("use") if punct_at(i + 2, b'.') => {
                if let Some(name) = ident_at(i + 3) {
                    scan.uses.insert(name.to_string());
                }
                i += 4;
            }
            _ => i += 1,
        }
    }
    scan
}
