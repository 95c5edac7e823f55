//! Rules DSL lexer.
//!
//! Tokenizes rule sources like `{WORD("red"), WORD("car")}->MARK("CAR")`.
//! Whether an identifier is a macro or a variable is decided by the parser
//! and resolver, not here.

use std::fmt;

use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,    // WORD, my_list
    Literal,  // "text" or 'text', unescaped
    LBrace,   // {
    RBrace,   // }
    LParen,   // (
    RParen,   // )
    Arrow,    // ->
    Comma,    // ,
    Pipe,     // |
    Assign,   // =
    Bang,     // ! (exec marker or `not` modifier)
    Question, // ?
    Star,     // *
    Plus,     // +
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-indexed source line
    pub line: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Literal => write!(f, "literal \"{}\"", self.text),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

/// A character the lexer could not place. Lexing continues after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexDiagnostic {
    pub line: usize,
    pub character: char,
    pub message: String,
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    diagnostics: Vec<LexDiagnostic>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            diagnostics: Vec::new(),
        }
    }

    pub fn diagnostics(&self) -> &[LexDiagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<LexDiagnostic> {
        self.diagnostics
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '#' {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
        self.input[start..self.pos].to_string()
    }

    fn is_ident_char(ch: char) -> bool {
        ch.is_alphanumeric() || ch == '_'
    }

    fn report(&mut self, character: char, message: String) {
        error!("Invalid Token on line {}: {}", self.line, message);
        self.diagnostics.push(LexDiagnostic {
            line: self.line,
            character,
            message,
        });
    }

    /// Read a quoted literal starting at the current quote character.
    ///
    /// Returns `None` (without consuming anything) when the closing quote is
    /// missing, so the caller can skip just the opening quote.
    fn read_literal(&mut self, quote: char) -> Option<String> {
        let mut value = String::new();
        let mut chars = self.input[self.pos..].char_indices();
        chars.next(); // opening quote
        while let Some((offset, ch)) = chars.next() {
            if ch == quote {
                let consumed = &self.input[self.pos..self.pos + offset + ch.len_utf8()];
                self.line += consumed.matches('\n').count();
                self.pos += consumed.len();
                return Some(value);
            }
            if ch == '\\' {
                match chars.next() {
                    // Only quotes and backslashes are unescaped; `\d`, `\s`
                    // and friends stay intact for regex arguments.
                    Some((_, next)) if next == quote || next == '\\' => value.push(next),
                    Some((_, next)) => {
                        value.push('\\');
                        value.push(next);
                    }
                    None => return None,
                }
            } else {
                value.push(ch);
            }
        }
        None
    }

    fn next_token(&mut self) -> Option<Token> {
        loop {
            self.skip_whitespace_and_comments();
            let ch = self.peek()?;
            let line = self.line;

            let simple = match ch {
                '{' => Some(TokenKind::LBrace),
                '}' => Some(TokenKind::RBrace),
                '(' => Some(TokenKind::LParen),
                ')' => Some(TokenKind::RParen),
                ',' => Some(TokenKind::Comma),
                '|' => Some(TokenKind::Pipe),
                '=' => Some(TokenKind::Assign),
                '!' => Some(TokenKind::Bang),
                '?' => Some(TokenKind::Question),
                '*' => Some(TokenKind::Star),
                '+' => Some(TokenKind::Plus),
                _ => None,
            };
            if let Some(kind) = simple {
                self.advance();
                return Some(Token::new(kind, ch.to_string(), line));
            }

            match ch {
                '-' if self.peek_second() == Some('>') => {
                    self.advance();
                    self.advance();
                    return Some(Token::new(TokenKind::Arrow, "->", line));
                }
                '"' | '\'' => {
                    if let Some(value) = self.read_literal(ch) {
                        return Some(Token::new(TokenKind::Literal, value, line));
                    }
                    self.report(ch, format!("unterminated literal starting with {ch}"));
                    self.advance();
                }
                _ if Self::is_ident_char(ch) => {
                    let word = self.read_while(Self::is_ident_char);
                    return Some(Token::new(TokenKind::Ident, word, line));
                }
                _ => {
                    self.report(ch, format!("unexpected character '{ch}'"));
                    self.advance();
                }
            }
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        self.by_ref().collect()
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).tokenize().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lexer_any_macro_wo_args() {
        let tokens = Lexer::new("ANY").tokenize();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].text, "ANY");
    }

    #[test]
    fn test_lexer_rule() {
        assert_eq!(
            kinds(r#"{WORD("a"), IN_LIST(x)?}->MARK("L")"#),
            vec![
                TokenKind::LBrace,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Literal,
                TokenKind::RParen,
                TokenKind::Comma,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::RParen,
                TokenKind::Question,
                TokenKind::RBrace,
                TokenKind::Arrow,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Literal,
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_lexer_literal_unescaped() {
        let tokens = Lexer::new(r#""say \"hi\"" 'it\'s'"#).tokenize();
        assert_eq!(tokens[0].text, "say \"hi\"");
        assert_eq!(tokens[1].text, "it's");
    }

    #[test]
    fn test_lexer_literal_keeps_regex_escapes() {
        let tokens = Lexer::new(r#""\d+\s?""#).tokenize();
        assert_eq!(tokens[0].text, r"\d+\s?");
    }

    #[test]
    fn test_lexer_literal_with_unicode() {
        let tokens = Lexer::new(r#"WORD("Šarūnas")"#).tokenize();
        assert_eq!(tokens[2].text, "Šarūnas");
    }

    #[test]
    fn test_lexer_skips_comments() {
        let tokens = Lexer::new("# a comment\nANY # trailing\n").tokenize();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].line, 2);
    }

    #[test]
    fn test_lexer_tracks_lines() {
        let tokens = Lexer::new("a = \"x\"\n\nWORD").tokenize();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[3].line, 3);
    }

    #[test]
    fn test_lexer_modifiers_and_bang() {
        assert_eq!(
            kinds("!IMPORT WORD+ NUM* PUNCT? WORD!"),
            vec![
                TokenKind::Bang,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::Ident,
                TokenKind::Star,
                TokenKind::Ident,
                TokenKind::Question,
                TokenKind::Ident,
                TokenKind::Bang,
            ]
        );
    }

    #[test]
    fn test_lexer_recovers_from_unknown_character() {
        let mut lexer = Lexer::new("ANY @ -> MARK");
        let tokens = lexer.tokenize();
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::Ident, TokenKind::Arrow, TokenKind::Ident]
        );
        assert_eq!(lexer.diagnostics().len(), 1);
        assert_eq!(lexer.diagnostics()[0].character, '@');
    }

    #[test]
    fn test_lexer_unterminated_literal_skips_quote_only() {
        let mut lexer = Lexer::new("\"abc");
        let tokens = lexer.tokenize();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "abc");
        assert_eq!(lexer.diagnostics().len(), 1);
    }

    #[test]
    fn test_lexer_is_restartable() {
        let source = "WORD(\"a\")->MARK(\"A\")";
        let first = Lexer::new(source).tokenize();
        let second = Lexer::new(source).tokenize();
        assert_eq!(first, second);
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn lexing_never_panics_and_terminates(input in "\\PC{0,64}") {
                let mut lexer = Lexer::new(&input);
                let tokens = lexer.tokenize();
                prop_assert!(tokens.len() <= input.chars().count());
            }

            #[test]
            fn identifiers_round_trip(name in "[A-Za-z_][A-Za-z0-9_]{0,12}") {
                let tokens = Lexer::new(&name).tokenize();
                prop_assert_eq!(tokens.len(), 1);
                prop_assert_eq!(&tokens[0].text, &name);
            }
        }
    }
}
