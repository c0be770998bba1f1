//! TeX source preparation for the MathML converter.
//!
//! The converter understands a smaller command set than KaTeX and recurses
//! once per nesting level, so sources are rewritten and bounded first:
//!
//! - common KaTeX spellings (`\le`, `\mathcal`, `\lvert`, `\dfrac`, ...) are
//!   mapped to commands the converter knows
//! - `cases`, `aligned`, `gathered`, `array` and friends become the matrix
//!   forms it supports
//! - formulas nesting deeper than [`MAX_TEX_DEPTH`] are rejected

use std::iter::Peekable;
use std::str::CharIndices;

/// Deepest group, `\left`, environment, argument or script nesting accepted
/// in a single formula.
pub(crate) const MAX_TEX_DEPTH: usize = 32;

/// Why a formula was refused before conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum TexError {
    #[error("formula nesting exceeds {} levels", MAX_TEX_DEPTH)]
    TooDeep,
    #[error("unsupported environment `{0}`")]
    UnknownEnvironment(String),
    #[error("`\\middle` must be followed by a delimiter")]
    MiddleWithoutDelimiter,
}

/// Commands spelled differently by KaTeX, with the converter's equivalent.
const COMMAND_ALIASES: &[(&str, &str)] = &[
    ("le", r"\leq"),
    ("ge", r"\geq"),
    ("neg", r"\lnot"),
    ("lvert", "|"),
    ("rvert", "|"),
    ("vert", "|"),
    ("lVert", r"\|"),
    ("rVert", r"\|"),
    ("Vert", r"\|"),
    ("lbrace", r"\{"),
    ("rbrace", r"\}"),
    ("lbrack", "["),
    ("rbrack", "]"),
    ("mathcal", r"\mathscr"),
    ("textrm", r"\text"),
    ("textnormal", r"\text"),
    ("mbox", r"\text"),
    ("dfrac", r"\frac"),
    ("tfrac", r"\frac"),
    ("cfrac", r"\frac"),
    ("dots", r"\ldots"),
    ("dotsc", r"\ldots"),
    ("dotsb", r"\cdots"),
    ("dotsm", r"\cdots"),
    ("varnothing", r"\emptyset"),
    ("displaystyle", ""),
    ("textstyle", ""),
    ("scriptstyle", ""),
    ("limits", ""),
    ("nolimits", ""),
];

/// Commands taking one argument (besides an optional `[..]` for `\sqrt`).
const UNARY_COMMANDS: &[&str] = &[
    "sqrt", "mathrm", "textit", "mathit", "textbf", "mathbf", "bm", "symbf", "mathbb",
    "mathfrak", "mathscr", "mathsf", "texttt", "boldsymbol", "dot", "ddot", "bar", "hat",
    "check", "breve", "acute", "grave", "tilde", "vec", "overline", "underline", "widehat",
    "widetilde", "overrightarrow", "overleftarrow", "overbrace", "underbrace", "overparen",
    "underparen", "overbracket", "underbracket", "slashed", "bigl", "bigr", "Bigl", "Bigr",
    "biggl", "biggr", "Biggl", "Biggr",
];

const BINARY_COMMANDS: &[&str] = &["frac", "binom", "tbinom", "dbinom", "overset", "underset"];

/// Delimiter commands accepted after `\middle`.
const DELIMITER_COMMANDS: &[&str] = &[
    "{", "}", "|", "langle", "rangle", "lceil", "rceil", "lfloor", "rfloor", "lgroup", "rgroup",
    "llbracket", "rrbracket",
];

/// Rewrite `source` into the converter's dialect and check its nesting.
pub(crate) fn prepare(source: &str) -> Result<String, TexError> {
    let normalized = normalize(source)?;
    check_depth(&normalized)?;
    Ok(normalized)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    /// Command name without the backslash.
    Command(&'a str),
    Char(char),
}

struct Tokens<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Tokens<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    /// `{name}` following `\begin` or `\end`, without the braces.
    fn braced_name(&mut self) -> Option<&'a str> {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
        self.chars.next_if(|(_, c)| *c == '{')?;
        let start = self.chars.peek().map_or(self.source.len(), |(i, _)| *i);
        for (i, c) in self.chars.by_ref() {
            if c == '}' {
                return Some(self.source[start..i].trim());
            }
        }
        None
    }

    /// Skip a `{...}` argument with balanced braces (`array` column specs).
    fn skip_braced(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
        if self.chars.next_if(|(_, c)| *c == '{').is_none() {
            return;
        }
        let mut depth = 1usize;
        for (_, c) in self.chars.by_ref() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    fn next_significant(&mut self) -> Option<Token<'a>> {
        loop {
            let token = self.next()?;
            if !matches!(token, Token::Char(c) if c.is_whitespace()) {
                return Some(token);
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
        self.chars.peek().map(|(_, c)| *c)
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let (_, c) = self.chars.next()?;
        if c != '\\' {
            return Some(Token::Char(c));
        }
        let Some((name_start, first)) = self.chars.next() else {
            return Some(Token::Char('\\'));
        };
        let mut end = name_start + first.len_utf8();
        if first.is_ascii_alphabetic() {
            while let Some((i, c)) = self.chars.next_if(|(_, c)| c.is_ascii_alphabetic()) {
                end = i + c.len_utf8();
            }
        }
        Some(Token::Command(&self.source[name_start..end]))
    }
}

/// Replacement text for `\begin{name}` and `\end{name}`.
fn environment(name: &str) -> Result<(&'static str, &'static str), TexError> {
    let rewritten = match name {
        "matrix" => (r"\begin{matrix}", r"\end{matrix}"),
        "pmatrix" => (r"\begin{pmatrix}", r"\end{pmatrix}"),
        "bmatrix" => (r"\begin{bmatrix}", r"\end{bmatrix}"),
        "vmatrix" => (r"\begin{vmatrix}", r"\end{vmatrix}"),
        "Bmatrix" => (r"\left\{\begin{matrix}", r"\end{matrix}\right\}"),
        "Vmatrix" => (r"\left\|\begin{matrix}", r"\end{matrix}\right\|"),
        "smallmatrix" | "gathered" | "gather" | "gather*" | "array" | "subarray" => {
            (r"\begin{matrix}", r"\end{matrix}")
        }
        "align" | "align*" | "aligned" | "split" | "alignat" | "alignat*" | "alignedat" => {
            (r"\begin{align}", r"\end{align}")
        }
        "cases" => (r"\left\{\begin{align}", r"\end{align}\right."),
        "rcases" => (r"\left.\begin{align}", r"\end{align}\right\}"),
        "equation" | "equation*" => ("", ""),
        other => return Err(TexError::UnknownEnvironment(other.to_owned())),
    };
    Ok(rewritten)
}

fn normalize(source: &str) -> Result<String, TexError> {
    let mut out = String::with_capacity(source.len());
    let mut tokens = Tokens::new(source);

    while let Some(token) = tokens.next() {
        match token {
            Token::Char(c) => out.push(c),
            Token::Command(command @ ("begin" | "end")) => {
                let name = tokens.braced_name().unwrap_or_default();
                let (begin, end) = environment(name)?;
                if command == "begin" {
                    out.push_str(begin);
                    if matches!(name, "array" | "subarray" | "alignat" | "alignat*" | "alignedat") {
                        tokens.skip_braced();
                    }
                } else {
                    out.push_str(end);
                }
                out.push(' ');
            }
            Token::Command(name) => {
                match COMMAND_ALIASES.iter().find(|(alias, _)| *alias == name) {
                    Some((_, replacement)) => out.push_str(replacement),
                    None => {
                        out.push('\\');
                        out.push_str(name);
                    }
                }
                if name.starts_with(|c: char| c.is_ascii_alphabetic()) {
                    out.push(' ');
                }
            }
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Brace,
    Left,
    Environment,
    Bracket,
}

/// One open group: how long the current chain of arguments and scripts is,
/// and how many arguments are still expected.
#[derive(Debug)]
struct Level {
    group: Group,
    chain: usize,
    pending: usize,
}

struct DepthTracker {
    levels: Vec<Level>,
    max: usize,
}

impl DepthTracker {
    fn new() -> Self {
        Self {
            levels: vec![Level {
                group: Group::Brace,
                chain: 0,
                pending: 0,
            }],
            max: 0,
        }
    }

    fn current(&self) -> Option<Group> {
        self.levels.last().map(|level| level.group)
    }

    fn top(&mut self) -> &mut Level {
        let last = self.levels.len() - 1;
        &mut self.levels[last]
    }

    fn update_max(&mut self) -> Result<(), TexError> {
        let depth: usize = self.levels.iter().map(|level| level.chain + 1).sum();
        self.max = self.max.max(depth);
        if self.max > MAX_TEX_DEPTH {
            return Err(TexError::TooDeep);
        }
        Ok(())
    }

    /// A node either fills an expected argument or starts a new chain.
    fn atom(&mut self) {
        let top = self.top();
        if top.pending > 0 {
            top.pending -= 1;
        } else {
            top.chain = 0;
        }
    }

    fn command(&mut self, arguments: usize) -> Result<(), TexError> {
        self.atom();
        let top = self.top();
        top.chain += 1;
        top.pending += arguments;
        self.update_max()
    }

    fn script(&mut self) -> Result<(), TexError> {
        let top = self.top();
        top.chain += 1;
        top.pending += 1;
        self.update_max()
    }

    fn open(&mut self, group: Group) -> Result<(), TexError> {
        self.atom();
        self.levels.push(Level {
            group,
            chain: 0,
            pending: 0,
        });
        self.update_max()
    }

    fn close(&mut self, group: Group) {
        if self.levels.len() > 1 && self.current() == Some(group) {
            self.levels.pop();
        }
    }
}

fn check_depth(source: &str) -> Result<(), TexError> {
    let mut tracker = DepthTracker::new();
    let mut tokens = Tokens::new(source);

    while let Some(token) = tokens.next() {
        match token {
            Token::Char(c) if c.is_whitespace() || c == '\'' => {}
            Token::Char('{') => tracker.open(Group::Brace)?,
            Token::Char('}') => tracker.close(Group::Brace),
            Token::Char(']') if tracker.current() == Some(Group::Bracket) => {
                tracker.close(Group::Bracket);
            }
            Token::Char('^' | '_') => tracker.script()?,
            Token::Char(_) => tracker.atom(),
            Token::Command("left") => {
                tracker.open(Group::Left)?;
                tokens.next_significant();
            }
            Token::Command("right") => {
                tracker.close(Group::Left);
                tokens.next_significant();
            }
            Token::Command("begin") => {
                tracker.open(Group::Environment)?;
                tokens.braced_name();
            }
            Token::Command("end") => {
                tracker.close(Group::Environment);
                tokens.braced_name();
            }
            Token::Command("middle") => {
                match tokens.next_significant() {
                    Some(Token::Char('(' | ')' | '[' | ']' | '|' | '/' | '.' | '<' | '>')) => {}
                    Some(Token::Command(name)) if DELIMITER_COMMANDS.contains(&name) => {}
                    _ => return Err(TexError::MiddleWithoutDelimiter),
                }
                tracker.atom();
            }
            Token::Command("sqrt") => {
                tracker.command(1)?;
                if tokens.peek_char() == Some('[') {
                    tokens.next();
                    tracker.levels.push(Level {
                        group: Group::Bracket,
                        chain: 0,
                        pending: 0,
                    });
                    tracker.update_max()?;
                }
            }
            Token::Command(name) if BINARY_COMMANDS.contains(&name) => tracker.command(2)?,
            Token::Command(name) if UNARY_COMMANDS.contains(&name) => tracker.command(1)?,
            Token::Command(_) => tracker.atom(),
        }
    }
    Ok(())
}
