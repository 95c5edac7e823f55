//! Rules DSL parser.
//!
//! Parses a token stream into a list of [`Statement`]s. Grammar, loosest
//! binding first:
//!
//! ```text
//! document  := statement*
//! statement := '!' macro
//!            | NAME '=' args
//!            | (macro | '{' args '}') '->' macro
//! macro     := NAME [ '(' args? ')' | '{' args '}' ] modifier*
//! args      := arg (',' arg)*
//! arg       := primary ('|' primary)*
//! primary   := LITERAL | macro | '{' args '}'
//! modifier  := '?' | '*' | '+' | '!'
//! ```

use tracing::{debug, error};

use super::ast::{Expr, MacroCall, Statement, call_summary};
use super::lexer::{LexDiagnostic, Lexer, Token, TokenKind};
use crate::error::{Result, RitaError};
use crate::pattern::Modifier;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<LexDiagnostic>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Lex and parse a whole source.
    pub fn from_source(source: &str) -> Self {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize();
        let mut parser = Self::new(tokens);
        parser.diagnostics = lexer.into_diagnostics();
        parser
    }

    /// Characters the lexer skipped while producing this parser's tokens.
    pub fn diagnostics(&self) -> &[LexDiagnostic] {
        &self.diagnostics
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_kind_at(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos)?.clone();
        self.pos += 1;
        Some(tok)
    }

    fn current_line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn error(&self, expected: &str) -> RitaError {
        let found = match self.peek() {
            Some(tok) => tok.to_string(),
            None => "end of input".to_string(),
        };
        let line = self.current_line();
        error!("Syntax error on line {line} at {found}");
        RitaError::Syntax {
            line,
            found,
            expected: expected.to_string(),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.peek_kind() != Some(kind) {
            return Err(self.error(expected));
        }
        self.advance().ok_or_else(|| self.error(expected))
    }

    pub fn parse(&mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        while self.peek().is_some() {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let line = self.current_line();

        if self.peek_kind() == Some(TokenKind::Bang) {
            self.advance();
            let call = self.parse_call("macro name after '!'")?;
            debug!("Exec {}", call_summary(&call));
            return Ok(Statement::Exec(call));
        }

        if self.peek_kind() == Some(TokenKind::Ident)
            && self.peek_kind_at(1) == Some(TokenKind::Assign)
        {
            let name = self.expect(TokenKind::Ident, "a name")?.text;
            self.expect(TokenKind::Assign, "'='")?;
            let mut args = self.parse_args()?;
            let value = if args.len() == 1 {
                args.remove(0)
            } else {
                Expr::List(args)
            };
            return Ok(Statement::Binding { name, value, line });
        }

        let pattern = match self.peek_kind() {
            Some(TokenKind::LBrace) => self.parse_array()?,
            Some(TokenKind::Ident) => vec![self.parse_macro()?],
            _ => return Err(self.error("a rule, '!' directive or variable assignment")),
        };
        self.expect(TokenKind::Arrow, "'->'")?;
        let label = self.parse_call("label macro after '->'")?;

        if label.name == "EXEC" && label.args.is_empty() {
            if let [Expr::Call(call)] = pattern.as_slice() {
                return Ok(Statement::Exec(call.clone()));
            }
            return Err(self.error("a single macro before '-> EXEC'"));
        }

        debug!("Have {} -> {}", pattern.len(), call_summary(&label));
        Ok(Statement::Rule {
            pattern,
            label,
            line,
        })
    }

    /// A macro in a position where it must be invoked (bare names become
    /// zero-argument calls).
    fn parse_call(&mut self, expected: &str) -> Result<MacroCall> {
        if self.peek_kind() != Some(TokenKind::Ident) {
            return Err(self.error(expected));
        }
        Ok(self.parse_invocation()?.0)
    }

    fn parse_macro(&mut self) -> Result<Expr> {
        let (call, explicit_args) = self.parse_invocation()?;
        if explicit_args {
            return Ok(Expr::Call(call));
        }
        Ok(Expr::Name {
            name: call.name,
            op: call.op,
            line: call.line,
        })
    }

    /// A name with optional argument list and modifiers. The flag tells
    /// whether an argument list was written out.
    fn parse_invocation(&mut self) -> Result<(MacroCall, bool)> {
        let tok = self.expect(TokenKind::Ident, "a name")?;
        let args = match self.peek_kind() {
            Some(TokenKind::LParen) => {
                self.advance();
                let args = if self.peek_kind() == Some(TokenKind::RParen) {
                    Vec::new()
                } else {
                    self.parse_args()?
                };
                self.expect(TokenKind::RParen, "')'")?;
                Some(args)
            }
            Some(TokenKind::LBrace) => Some(self.parse_array()?),
            _ => None,
        };
        let op = self.parse_modifiers();

        let explicit_args = args.is_some();
        let call = MacroCall {
            name: tok.text,
            args: args.unwrap_or_default(),
            op,
            line: tok.line,
        };
        Ok((call, explicit_args))
    }

    /// Postfix modifiers; the last one wins. A `!` followed by a name starts
    /// the next directive instead.
    fn parse_modifiers(&mut self) -> Option<Modifier> {
        let mut op = None;
        loop {
            let modifier = match self.peek_kind() {
                Some(TokenKind::Question) => Modifier::Optional,
                Some(TokenKind::Star) => Modifier::ZeroOrMore,
                Some(TokenKind::Plus) => Modifier::OneOrMore,
                Some(TokenKind::Bang) if self.peek_kind_at(1) != Some(TokenKind::Ident) => {
                    Modifier::Not
                }
                _ => return op,
            };
            self.advance();
            op = Some(modifier);
        }
    }

    fn parse_array(&mut self) -> Result<Vec<Expr>> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let items = self.parse_args()?;
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(items)
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = vec![self.parse_arg()?];
        while self.peek_kind() == Some(TokenKind::Comma) {
            self.advance();
            args.push(self.parse_arg()?);
        }
        Ok(args)
    }

    fn parse_arg(&mut self) -> Result<Expr> {
        let first = self.parse_primary()?;
        if self.peek_kind() != Some(TokenKind::Pipe) {
            return Ok(first);
        }
        let mut alternatives = vec![first];
        while self.peek_kind() == Some(TokenKind::Pipe) {
            self.advance();
            alternatives.push(self.parse_primary()?);
        }
        Ok(Expr::Either(alternatives))
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.peek_kind() {
            Some(TokenKind::Literal) => {
                let tok = self.expect(TokenKind::Literal, "a literal")?;
                Ok(Expr::Literal(tok.text))
            }
            Some(TokenKind::Ident) => self.parse_macro(),
            Some(TokenKind::LBrace) => Ok(Expr::List(self.parse_array()?)),
            _ => Err(self.error("a literal, macro or '{'")),
        }
    }
}

/// Parse a rules source. Whitespace-only input yields no statements.
pub fn parse(source: &str) -> Result<Vec<Statement>> {
    if source.trim().is_empty() {
        return Ok(Vec::new());
    }
    Parser::from_source(source).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(s: &str) -> Expr {
        Expr::Literal(s.to_string())
    }

    fn rule(source: &str) -> (Vec<Expr>, MacroCall) {
        let statements = parse(source).unwrap();
        assert_eq!(statements.len(), 1);
        match statements.into_iter().next().unwrap() {
            Statement::Rule { pattern, label, .. } => (pattern, label),
            other => panic!("Expected rule, got {other:?}"),
        }
    }

    #[test]
    fn test_parser_empty_input() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("   \n\t ").unwrap().is_empty());
    }

    #[test]
    fn test_parser_any_macro_wo_args() {
        let (pattern, label) = rule(r#"ANY -> MARK("PlaceHolder")"#);
        assert!(matches!(&pattern[0], Expr::Name { name, op: None, .. } if name == "ANY"));
        assert_eq!(label.name, "MARK");
        assert_eq!(label.args, vec![literal("PlaceHolder")]);
    }

    #[test]
    fn test_parser_array_pattern() {
        let (pattern, _) = rule(r#"{ANY, WORD("test")} -> MARK("Test")"#);
        assert_eq!(pattern.len(), 2);
        match &pattern[1] {
            Expr::Call(call) => {
                assert_eq!(call.name, "WORD");
                assert_eq!(call.args, vec![literal("test")]);
            }
            other => panic!("Expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_parser_modifiers() {
        let (pattern, _) = rule(r#"{NUM+, WORD("-")?, IN_LIST(x)*, WORD("cold")!}->MARK("N")"#);
        let ops: Vec<Option<Modifier>> = pattern
            .iter()
            .map(|e| match e {
                Expr::Call(c) => c.op,
                Expr::Name { op, .. } => *op,
                _ => None,
            })
            .collect();
        assert_eq!(
            ops,
            vec![
                Some(Modifier::OneOrMore),
                Some(Modifier::Optional),
                Some(Modifier::ZeroOrMore),
                Some(Modifier::Not),
            ]
        );
    }

    #[test]
    fn test_parser_either() {
        let (pattern, _) = rule(r#"{WORD("a")|WORD("b")|WORD("c"), WORD("d")}->MARK("E")"#);
        assert_eq!(pattern.len(), 2);
        assert!(matches!(&pattern[0], Expr::Either(alts) if alts.len() == 3));
    }

    #[test]
    fn test_parser_assign_literal() {
        let statements = parse(
            r#"
    my_variable = "Test"

    {WORD(my_variable)} -> MARK("TEST")
    "#,
        )
        .unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0],
            Statement::Binding {
                name: "my_variable".to_string(),
                value: literal("Test"),
                line: 2,
            }
        );
    }

    #[test]
    fn test_parser_assign_list() {
        let statements = parse(r#"colors = {"red", "green"}"#).unwrap();
        match &statements[0] {
            Statement::Binding { value, .. } => {
                assert_eq!(value, &Expr::List(vec![literal("red"), literal("green")]));
            }
            other => panic!("Expected binding, got {other:?}"),
        }
    }

    #[test]
    fn test_parser_assign_macro() {
        let statements = parse(r#"x = WORD("Test")"#).unwrap();
        assert_eq!(statements.len(), 1);
        assert!(matches!(
            &statements[0],
            Statement::Binding { value: Expr::Call(call), .. } if call.name == "WORD"
        ));
    }

    #[test]
    fn test_parser_exec_shortcut() {
        let statements = parse(
            r#"
    !IMPORT("rita.modules.fuzzy")

    FUZZY("test") -> MARK("FUZZY_MATCH")
    "#,
        )
        .unwrap();
        assert_eq!(statements.len(), 2);
        assert!(matches!(&statements[0], Statement::Exec(call) if call.name == "IMPORT"));
    }

    #[test]
    fn test_parser_exec_arrow_form() {
        let statements = parse(r#"IMPORT("rita.modules.fuzzy") -> EXEC"#).unwrap();
        assert!(matches!(&statements[0], Statement::Exec(call) if call.name == "IMPORT"));
    }

    #[test]
    fn test_parser_bang_after_rule_starts_directive() {
        let statements = parse(r#"WORD("a")->MARK("A") !CONFIG("ignore_case", "N")"#).unwrap();
        assert_eq!(statements.len(), 2);
        assert!(matches!(&statements[0], Statement::Rule { label, .. } if label.op.is_none()));
        assert!(matches!(&statements[1], Statement::Exec(call) if call.name == "CONFIG"));
    }

    #[test]
    fn test_parser_brace_call_arguments() {
        let (pattern, _) = rule(r#"IN_LIST{"a", "b"}->MARK("L")"#);
        match &pattern[0] {
            Expr::Call(call) => assert_eq!(call.args, vec![literal("a"), literal("b")]),
            other => panic!("Expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_parser_nested_list_argument() {
        let (pattern, _) = rule(r#"{WORD("a"), {WORD("b"), WORD("c")}}->MARK("L")"#);
        assert!(matches!(&pattern[1], Expr::List(items) if items.len() == 2));
    }

    #[test]
    fn test_parser_missing_arrow_is_syntax_error() {
        let err = parse(r#"WORD("a") MARK("A")"#).unwrap_err();
        match err {
            RitaError::Syntax { line, found, expected } => {
                assert_eq!(line, 1);
                assert_eq!(found, "'MARK'");
                assert_eq!(expected, "'->'");
            }
            other => panic!("Expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_parser_unexpected_end_of_input() {
        let err = parse("{WORD(\"a\"),\n").unwrap_err();
        assert!(matches!(
            err,
            RitaError::Syntax { ref found, line: 1, .. } if found == "end of input"
        ));
    }

    #[test]
    fn test_parser_error_line() {
        let err = parse("WORD(\"a\")->MARK(\"A\")\n\n-> MARK(\"B\")").unwrap_err();
        assert!(matches!(err, RitaError::Syntax { line: 3, .. }));
    }

    #[test]
    fn test_parser_records_lex_diagnostics() {
        let parser = Parser::from_source("ANY @ -> MARK(\"A\")");
        assert_eq!(parser.diagnostics().len(), 1);
    }
}
