//! Tokenizer for Lingo assembly text.

use crate::error::AsmError;

/// A single token from an assembly line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// A mnemonic, directive or bare identifier. Case is preserved.
    Ident(String),
    /// Decimal or `0x` hexadecimal integer, optionally negative.
    Int(i64),
    /// A number with a fraction or exponent.
    Float(f64),
    /// A double-quoted string with `\"`, `\\`, `\n`, `\r` and `\t` escapes.
    Str(String),
    /// `#name`.
    Symbol(String),
    /// `@name`, a jump target reference.
    Label(String),
    /// `@name:`, a jump target definition.
    LabelDef(String),
    /// `key=value`.
    Setting(String, String),
}

impl Token {
    /// The token as it would be written, for error messages.
    pub(crate) fn text(&self) -> String {
        match self {
            Token::Ident(s) => s.clone(),
            Token::Int(n) => n.to_string(),
            Token::Float(f) => f.to_string(),
            Token::Str(s) => format!("{s:?}"),
            Token::Symbol(s) => format!("#{s}"),
            Token::Label(s) => format!("@{s}"),
            Token::LabelDef(s) => format!("@{s}:"),
            Token::Setting(k, v) => format!("{k}={v}"),
        }
    }
}

/// Tokenize a single line of assembly text.
///
/// Returns an empty Vec for blank lines and comment-only lines.
/// Comments start with `;` outside a string and extend to end of line.
/// Commas separate tokens like whitespace does.
pub(crate) fn tokenize_line(line: &str, line_num: usize) -> Result<Vec<Token>, AsmError> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() || c == ',' {
            chars.next();
            continue;
        }
        if c == ';' {
            break;
        }
        if c == '"' {
            chars.next();
            tokens.push(Token::Str(read_string(&mut chars, line_num)?));
            continue;
        }

        let mut end = line.len();
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() || c == ',' || c == ';' {
                end = i;
                break;
            }
            chars.next();
        }
        tokens.push(classify(&line[start..end], line_num)?);
    }

    Ok(tokens)
}

fn read_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    line_num: usize,
) -> Result<String, AsmError> {
    let mut out = String::new();
    while let Some((_, c)) = chars.next() {
        match c {
            '"' => return Ok(out),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, 't')) => out.push('\t'),
                Some((_, other)) => out.push(other),
                None => break,
            },
            other => out.push(other),
        }
    }
    Err(AsmError::UnterminatedString { line: line_num })
}

fn classify(word: &str, line_num: usize) -> Result<Token, AsmError> {
    if let Some(name) = word.strip_prefix('#') {
        return Ok(Token::Symbol(name.to_string()));
    }
    if let Some(label) = word.strip_prefix('@') {
        return Ok(match label.strip_suffix(':') {
            Some(def) => Token::LabelDef(def.to_string()),
            None => Token::Label(label.to_string()),
        });
    }
    if let Some((key, value)) = word.split_once('=') {
        return Ok(Token::Setting(key.to_string(), value.to_string()));
    }

    let unsigned = word.strip_prefix('-').unwrap_or(word);
    if !unsigned.as_bytes().first().is_some_and(u8::is_ascii_digit) {
        return Ok(Token::Ident(word.to_string()));
    }

    let invalid = || AsmError::InvalidNumber {
        line: line_num,
        token: word.to_string(),
    };
    if let Some(hex) = unsigned.strip_prefix("0x").or_else(|| unsigned.strip_prefix("0X")) {
        let value = i64::from_str_radix(hex, 16).map_err(|_| invalid())?;
        return Ok(Token::Int(if word.starts_with('-') { -value } else { value }));
    }
    if let Ok(value) = word.parse::<i64>() {
        return Ok(Token::Int(value));
    }
    word.parse::<f64>().map(Token::Float).map_err(|_| invalid())
}
