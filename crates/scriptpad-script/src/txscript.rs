#![forbid(unsafe_code)]

//! TxScript: a small expression language that compiles to script.
//!
//! Compilation is one-way. There is no decompiler, so a canonical script
//! can never be rendered back as TxScript.
//!
//! ```text
//! program    := stmt ((NEWLINE | ';') stmt)*
//! stmt       := 'verify' expr | 'return' | if_stmt | expr
//! if_stmt    := 'if' expr block ('else' (block | if_stmt))?
//! block      := '{' program '}'
//! expr       := and ('or' and)*
//! and        := not ('and' not)*
//! not        := 'not' not | cmp
//! cmp        := add (('==' | '!=' | '<' | '>' | '<=' | '>=') add)*
//! add        := mul (('+' | '-') mul)*
//! mul        := unary (('*' | '/' | '%') unary)*
//! unary      := '-' unary | primary
//! primary    := NUMBER | HEX | STRING | VARIABLE | 'true' | 'false'
//!             | TYPE '(' expr ')' | BUILTIN '(' args ')' | '(' expr ')'
//! ```

use crate::asm::ParseError;
use crate::lex::{self, Dialect, Token, TokenKind};
use crate::opcodes::*;
use crate::script::{Script, ScriptBuilder};
use crate::variables::VariableResolver;

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// Reserved word categories, shared with the syntax classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordClass {
    /// `verify`, `return`.
    Statement,
    /// `if`, `else`.
    Conditional,
    /// `and`, `or`, `not`.
    Boolean,
    /// `true`, `false`.
    Constant,
    /// `int`, `bytes`.
    TypeName,
    /// A function from [`BUILTINS`].
    Builtin,
}

/// A built-in function: name, argument count and the opcodes it emits
/// after its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: usize,
    pub ops: &'static [u8],
}

pub const BUILTINS: &[Builtin] = &[
    Builtin { name: "checkSig", arity: 2, ops: &[OP_CHECKSIG] },
    Builtin { name: "hash160", arity: 1, ops: &[OP_HASH160] },
    Builtin { name: "hash256", arity: 1, ops: &[OP_HASH256] },
    Builtin { name: "sha256", arity: 1, ops: &[OP_SHA256] },
    Builtin { name: "sha1", arity: 1, ops: &[OP_SHA1] },
    Builtin { name: "ripemd160", arity: 1, ops: &[OP_RIPEMD160] },
    Builtin { name: "size", arity: 1, ops: &[OP_SIZE, OP_NIP] },
    Builtin { name: "abs", arity: 1, ops: &[OP_ABS] },
    Builtin { name: "min", arity: 2, ops: &[OP_MIN] },
    Builtin { name: "max", arity: 2, ops: &[OP_MAX] },
    Builtin { name: "within", arity: 3, ops: &[OP_WITHIN] },
    Builtin { name: "concat", arity: 2, ops: &[OP_CAT] },
    Builtin { name: "checkLockTimeVerify", arity: 1, ops: &[OP_CHECKLOCKTIMEVERIFY] },
    Builtin { name: "checkSequenceVerify", arity: 1, ops: &[OP_CHECKSEQUENCEVERIFY] },
];

/// Look up a built-in by exact name.
#[must_use]
pub fn builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// Classify a reserved word. Returns `None` for ordinary identifiers.
#[must_use]
pub fn word_class(word: &str) -> Option<WordClass> {
    let class = match word {
        "verify" | "return" => WordClass::Statement,
        "if" | "else" => WordClass::Conditional,
        "and" | "or" | "not" => WordClass::Boolean,
        "true" | "false" => WordClass::Constant,
        "int" | "bytes" => WordClass::TypeName,
        _ if builtin(word).is_some() => WordClass::Builtin,
        _ => return None,
    };
    Some(class)
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Deepest nesting of sub-expressions, prefix operators and blocks.
pub const MAX_NESTING: usize = 64;

/// Compile TxScript source into a script.
pub fn compile(source: &str, vars: &dyn VariableResolver) -> Result<Script, ParseError> {
    let tokens: Vec<Token> = lex::tokenize(source, Dialect::TxScript)
        .map_err(|e| ParseError::from_lex(source, e))?
        .into_iter()
        .filter(|t| !t.is_trivia())
        .collect();

    let mut compiler = Compiler {
        source,
        tokens,
        pos: 0,
        depth: 0,
        nesting: 0,
        vars,
        out: ScriptBuilder::new(),
    };
    compiler.program(false)?;
    Ok(compiler.out.into_script())
}

struct Compiler<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    /// Open parentheses; newlines are insignificant while this is non-zero.
    depth: usize,
    nesting: usize,
    vars: &'a dyn VariableResolver,
    out: ScriptBuilder,
}

impl<'a> Compiler<'a> {
    // -- Token access -------------------------------------------------------

    fn skip_insignificant_newlines(&mut self) {
        if self.depth > 0 {
            self.skip_newlines();
        }
    }

    fn skip_newlines(&mut self) {
        while self
            .tokens
            .get(self.pos)
            .is_some_and(|t| t.kind == TokenKind::Newline)
        {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<&Token> {
        self.skip_insignificant_newlines();
        self.tokens.get(self.pos)
    }

    fn peek_text(&mut self) -> Option<&'a str> {
        let source = self.source;
        self.peek().map(|t| t.text(source))
    }

    fn peek_is(&mut self, kind: TokenKind, text: &str) -> bool {
        let source = self.source;
        self.peek()
            .is_some_and(|t| t.kind == kind && t.text(source) == text)
    }

    fn eat(&mut self, kind: TokenKind, text: &str) -> bool {
        if self.peek_is(kind, text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, text: &str) -> Result<(), ParseError> {
        if self.eat(kind, text) {
            Ok(())
        } else {
            Err(self.error_here(format!("expected '{text}'")))
        }
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> ParseError {
        ParseError::at(self.source, token.range.start, message)
    }

    fn error_here(&mut self, message: impl Into<String>) -> ParseError {
        let source = self.source;
        match self.peek().cloned() {
            Some(token) => {
                let found = match token.kind {
                    TokenKind::Newline => "end of line".to_string(),
                    _ => format!("'{}'", token.text(source)),
                };
                ParseError::at(source, token.range.start, format!("{}, found {found}", message.into()))
            }
            None => ParseError::at(source, source.len(), format!("{}, found end of input", message.into())),
        }
    }

    /// Run `parse` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<(), ParseError>,
    ) -> Result<(), ParseError> {
        if self.nesting >= MAX_NESTING {
            let end = self.source.len();
            let offset = self.peek().map_or(end, |t| t.range.start);
            return Err(ParseError::at(self.source, offset, "expression nested too deeply"));
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    // -- Statements ---------------------------------------------------------

    /// Statements up to end of input, or up to a closing `}` in a block.
    fn program(&mut self, in_block: bool) -> Result<(), ParseError> {
        let source = self.source;
        loop {
            while self.peek().is_some_and(|t| is_separator(t, source)) {
                self.pos += 1;
            }
            if self.peek().is_none() {
                return if in_block {
                    Err(self.error_here("expected '}'"))
                } else {
                    Ok(())
                };
            }
            if in_block && self.peek_is(TokenKind::Delimiter, "}") {
                return Ok(());
            }

            self.statement()?;

            let at_boundary = self.peek().is_none_or(|t| is_separator(t, source))
                || (in_block && self.peek_is(TokenKind::Delimiter, "}"));
            if !at_boundary {
                return Err(self.error_here("expected end of statement"));
            }
        }
    }

    fn statement(&mut self) -> Result<(), ParseError> {
        match self.peek_text() {
            Some("verify") => {
                self.pos += 1;
                self.expr()?;
                self.out.push_verify();
            }
            Some("return") => {
                self.pos += 1;
                self.out.push_opcode(OP_RETURN);
            }
            Some("if") => self.if_statement()?,
            _ => self.expr()?,
        }
        Ok(())
    }

    fn if_statement(&mut self) -> Result<(), ParseError> {
        self.expect(TokenKind::Word, "if")?;
        self.expr()?;
        self.out.push_opcode(OP_IF);
        self.block()?;

        // `else` may sit on the line after the closing brace.
        let resume = self.pos;
        self.skip_newlines();
        if self.eat(TokenKind::Word, "else") {
            self.out.push_opcode(OP_ELSE);
            if self.peek_text() == Some("if") {
                self.nested(Self::if_statement)?;
            } else {
                self.block()?;
            }
        } else {
            self.pos = resume;
        }

        self.out.push_opcode(OP_ENDIF);
        Ok(())
    }

    fn block(&mut self) -> Result<(), ParseError> {
        self.expect(TokenKind::Delimiter, "{")?;
        let outer = std::mem::take(&mut self.depth);
        let result = self.nested(|c| c.program(true));
        self.depth = outer;
        result?;
        self.expect(TokenKind::Delimiter, "}")
    }

    // -- Expressions --------------------------------------------------------

    fn expr(&mut self) -> Result<(), ParseError> {
        self.nested(|c| {
            c.and_expr()?;
            while c.eat(TokenKind::Word, "or") {
                c.and_expr()?;
                c.out.push_opcode(OP_BOOLOR);
            }
            Ok(())
        })
    }

    fn and_expr(&mut self) -> Result<(), ParseError> {
        self.not_expr()?;
        while self.eat(TokenKind::Word, "and") {
            self.not_expr()?;
            self.out.push_opcode(OP_BOOLAND);
        }
        Ok(())
    }

    fn not_expr(&mut self) -> Result<(), ParseError> {
        if self.eat(TokenKind::Word, "not") {
            self.nested(Self::not_expr)?;
            self.out.push_opcode(OP_NOT);
            Ok(())
        } else {
            self.comparison()
        }
    }

    fn comparison(&mut self) -> Result<(), ParseError> {
        self.additive()?;
        loop {
            let ops: &[u8] = match self.operator() {
                Some("==") => &[OP_EQUAL],
                Some("!=") => &[OP_EQUAL, OP_NOT],
                Some("<") => &[OP_LESSTHAN],
                Some(">") => &[OP_GREATERTHAN],
                Some("<=") => &[OP_LESSTHANOREQUAL],
                Some(">=") => &[OP_GREATERTHANOREQUAL],
                _ => return Ok(()),
            };
            self.pos += 1;
            self.additive()?;
            for &op in ops {
                self.out.push_opcode(op);
            }
        }
    }

    fn additive(&mut self) -> Result<(), ParseError> {
        self.multiplicative()?;
        loop {
            let op = match self.operator() {
                Some("+") => OP_ADD,
                Some("-") => OP_SUB,
                _ => return Ok(()),
            };
            self.pos += 1;
            self.multiplicative()?;
            self.out.push_opcode(op);
        }
    }

    fn multiplicative(&mut self) -> Result<(), ParseError> {
        self.unary()?;
        loop {
            let op = match self.operator() {
                Some("*") => OP_MUL,
                Some("/") => OP_DIV,
                Some("%") => OP_MOD,
                _ => return Ok(()),
            };
            self.pos += 1;
            self.unary()?;
            self.out.push_opcode(op);
        }
    }

    fn unary(&mut self) -> Result<(), ParseError> {
        if !self.eat(TokenKind::Operator, "-") {
            return self.primary();
        }
        // Fold negative literals into a single push.
        if let Some(token) = self.peek().cloned() {
            if token.kind == TokenKind::Number {
                self.pos += 1;
                let value = self.number(&token, true)?;
                self.out.push_int(value);
                return Ok(());
            }
        }
        self.nested(Self::unary)?;
        self.out.push_opcode(OP_NEGATE);
        Ok(())
    }

    fn primary(&mut self) -> Result<(), ParseError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error_here("expected expression"));
        };
        let text = token.text(self.source);

        match token.kind {
            TokenKind::Number => {
                self.pos += 1;
                let value = self.number(&token, false)?;
                self.out.push_int(value);
            }
            TokenKind::Hex => {
                self.pos += 1;
                self.out.push_slice(&lex::hex_literal_bytes(text));
            }
            TokenKind::String => {
                self.pos += 1;
                self.out
                    .push_slice(lex::string_literal_contents(text).as_bytes());
            }
            TokenKind::Variable => {
                self.pos += 1;
                let name = lex::variable_name(text);
                let value = self.vars.resolve(name).ok_or_else(|| {
                    self.error_at(&token, format!("undefined variable '{name}'"))
                })?;
                self.out.push_slice(&value);
            }
            TokenKind::Delimiter if text == "(" => {
                self.pos += 1;
                self.depth += 1;
                self.expr()?;
                self.expect(TokenKind::Delimiter, ")")?;
                self.depth -= 1;
            }
            TokenKind::Word => {
                self.pos += 1;
                match (text, word_class(text)) {
                    ("true", _) => {
                        self.out.push_int(1);
                    }
                    ("false", _) => {
                        self.out.push_int(0);
                    }
                    (_, Some(WordClass::TypeName)) => {
                        self.call(&token, 1)?;
                    }
                    (_, Some(WordClass::Builtin)) => {
                        let Some(function) = builtin(text) else {
                            return Err(self.error_at(&token, format!("unknown function '{text}'")));
                        };
                        self.call(&token, function.arity)?;
                        for &op in function.ops {
                            self.out.push_opcode(op);
                        }
                    }
                    (_, Some(_)) => {
                        return Err(self.error_at(&token, format!("unexpected keyword '{text}'")));
                    }
                    (_, None) => {
                        return Err(self.error_at(&token, format!("unknown name '{text}'")));
                    }
                }
            }
            _ => return Err(self.error_here("expected expression")),
        }
        Ok(())
    }

    /// Compile a parenthesised argument list of exactly `arity` expressions.
    fn call(&mut self, callee: &Token, arity: usize) -> Result<(), ParseError> {
        let name = callee.text(self.source);
        self.expect(TokenKind::Delimiter, "(")?;
        self.depth += 1;
        let mut count = 0;
        if !self.peek_is(TokenKind::Delimiter, ")") {
            loop {
                self.expr()?;
                count += 1;
                if !self.eat(TokenKind::Delimiter, ",") {
                    break;
                }
            }
        }
        self.expect(TokenKind::Delimiter, ")")?;
        self.depth -= 1;

        if count != arity {
            return Err(self.error_at(
                callee,
                format!("{name} takes {arity} argument(s), got {count}"),
            ));
        }
        Ok(())
    }

    fn operator(&mut self) -> Option<&'a str> {
        let source = self.source;
        self.peek()
            .filter(|t| t.kind == TokenKind::Operator)
            .map(|t| t.text(source))
    }

    fn number(&self, token: &Token, negative: bool) -> Result<i64, ParseError> {
        let text = token.text(self.source);
        let magnitude: i128 = text
            .parse()
            .map_err(|_| self.error_at(token, format!("number out of range: {text}")))?;
        let value = if negative { -magnitude } else { magnitude };
        i64::try_from(value).map_err(|_| self.error_at(token, format!("number out of range: {text}")))
    }
}

fn is_separator(token: &Token, source: &str) -> bool {
    token.kind == TokenKind::Newline
        || (token.kind == TokenKind::Delimiter && token.text(source) == ";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::{NoVariables, VariableTable};

    fn compile_bytes(source: &str) -> Vec<u8> {
        compile(source, &NoVariables).unwrap().into_bytes()
    }

    // -- Vocabulary ---------------------------------------------------------

    #[test]
    fn word_classes() {
        assert_eq!(word_class("verify"), Some(WordClass::Statement));
        assert_eq!(word_class("else"), Some(WordClass::Conditional));
        assert_eq!(word_class("not"), Some(WordClass::Boolean));
        assert_eq!(word_class("false"), Some(WordClass::Constant));
        assert_eq!(word_class("bytes"), Some(WordClass::TypeName));
        assert_eq!(word_class("hash160"), Some(WordClass::Builtin));
        assert_eq!(word_class("foo"), None);
    }

    // -- Expressions --------------------------------------------------------

    #[test]
    fn arithmetic_precedence() {
        // 1 + 2 * 3 => 1 2 3 MUL ADD
        assert_eq!(
            compile_bytes("1 + 2 * 3"),
            vec![OP_1, OP_1 + 1, OP_1 + 2, OP_MUL, OP_ADD]
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(
            compile_bytes("(1 + 2) * 3"),
            vec![OP_1, OP_1 + 1, OP_ADD, OP_1 + 2, OP_MUL]
        );
    }

    #[test]
    fn negative_literal_folds() {
        assert_eq!(compile_bytes("-1"), vec![OP_1NEGATE]);
        assert_eq!(compile_bytes("-(2)"), vec![OP_1 + 1, OP_NEGATE]);
        assert_eq!(compile_bytes("5-1"), vec![OP_1 + 4, OP_1, OP_SUB]);
    }

    #[test]
    fn comparisons_and_booleans() {
        assert_eq!(
            compile_bytes("1 != 2 and not false"),
            vec![OP_1, OP_1 + 1, OP_EQUAL, OP_NOT, OP_0, OP_NOT, OP_BOOLAND]
        );
        assert_eq!(
            compile_bytes("1 < 2 or 3 >= 4"),
            vec![
                OP_1,
                OP_1 + 1,
                OP_LESSTHAN,
                OP_1 + 2,
                OP_1 + 3,
                OP_GREATERTHANOREQUAL,
                OP_BOOLOR
            ]
        );
    }

    #[test]
    fn literals_push_data() {
        assert_eq!(compile_bytes("0xabcd"), vec![0x02, 0xab, 0xcd]);
        assert_eq!(compile_bytes("'hi'"), vec![0x02, b'h', b'i']);
        assert_eq!(compile_bytes("true"), vec![OP_1]);
        assert_eq!(compile_bytes("1000"), vec![0x02, 0xe8, 0x03]);
    }

    #[test]
    fn casts_compile_inner_expression() {
        assert_eq!(compile_bytes("int(0x05)"), vec![0x01, 0x05]);
        assert_eq!(compile_bytes("bytes(7)"), vec![OP_1 + 6]);
    }

    #[test]
    fn builtins() {
        assert_eq!(compile_bytes("size('abc')"), vec![0x03, b'a', b'b', b'c', OP_SIZE, OP_NIP]);
        assert_eq!(
            compile_bytes("within(1, 0, 2)"),
            vec![OP_1, OP_0, OP_1 + 1, OP_WITHIN]
        );
        assert_eq!(compile_bytes("sha256(0x)"), vec![OP_0, OP_SHA256]);
    }

    #[test]
    fn arguments_may_span_lines() {
        assert_eq!(
            compile_bytes("min(1,\n 2)"),
            vec![OP_1, OP_1 + 1, OP_MIN]
        );
    }

    // -- Statements ---------------------------------------------------------

    #[test]
    fn verify_fuses_with_comparison() {
        let mut vars = VariableTable::new();
        vars.define("sig", vec![0x30]);
        vars.define("pk", vec![0x02]);
        let script = compile("verify checkSig($sig, $pk)", &vars).unwrap();
        assert_eq!(script.as_bytes(), &[0x01, 0x30, 0x01, 0x02, OP_CHECKSIGVERIFY]);

        assert_eq!(compile_bytes("verify 1 == 1"), vec![OP_1, OP_1, OP_EQUALVERIFY]);
    }

    #[test]
    fn return_statement() {
        assert_eq!(compile_bytes("return"), vec![OP_RETURN]);
    }

    #[test]
    fn statements_split_on_newlines_and_semicolons() {
        assert_eq!(compile_bytes("1; 2\n3"), vec![OP_1, OP_1 + 1, OP_1 + 2]);
        assert_eq!(compile_bytes("\n\n1\n\n"), vec![OP_1]);
    }

    #[test]
    fn if_else() {
        let source = "if 1 {\n  2\n}\nelse {\n  3\n}";
        assert_eq!(
            compile_bytes(source),
            vec![OP_1, OP_IF, OP_1 + 1, OP_ELSE, OP_1 + 2, OP_ENDIF]
        );
    }

    #[test]
    fn else_if_chain() {
        assert_eq!(
            compile_bytes("if 1 { 2 } else if 3 { 4 }"),
            vec![OP_1, OP_IF, OP_1 + 1, OP_ELSE, OP_1 + 2, OP_IF, OP_1 + 3, OP_ENDIF, OP_ENDIF]
        );
    }

    #[test]
    fn if_without_else_followed_by_statement() {
        assert_eq!(
            compile_bytes("if 1 { 2 }\n3"),
            vec![OP_1, OP_IF, OP_1 + 1, OP_ENDIF, OP_1 + 2]
        );
    }

    #[test]
    fn comments_are_ignored() {
        assert_eq!(compile_bytes("1 # one\n# alone\n2"), vec![OP_1, OP_1 + 1]);
    }

    #[test]
    fn empty_program() {
        assert!(compile_bytes("").is_empty());
    }

    // -- Errors -------------------------------------------------------------

    #[test]
    fn wrong_arity() {
        let err = compile("hash160(1, 2)", &NoVariables).unwrap_err();
        assert_eq!(err.message, "hash160 takes 1 argument(s), got 2");
        assert_eq!((err.line, err.col), (1, 1));
    }

    #[test]
    fn unknown_name() {
        let err = compile("1 + foo", &NoVariables).unwrap_err();
        assert_eq!(err.message, "unknown name 'foo'");
        assert_eq!(err.col, 5);
    }

    #[test]
    fn undefined_variable() {
        let err = compile("verify $x", &NoVariables).unwrap_err();
        assert_eq!(err.message, "undefined variable 'x'");
    }

    #[test]
    fn missing_close_brace() {
        let err = compile("if 1 { 2", &NoVariables).unwrap_err();
        assert!(err.message.starts_with("expected '}'"), "{}", err.message);
    }

    #[test]
    fn trailing_garbage() {
        let err = compile("1 2", &NoVariables).unwrap_err();
        assert!(err.message.starts_with("expected end of statement"));
    }

    #[test]
    fn deep_parentheses_are_rejected() {
        let source = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
        let err = compile(&source, &NoVariables).unwrap_err();
        assert_eq!(err.message, "expression nested too deeply");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn moderate_nesting_compiles() {
        let depth = MAX_NESTING - 2;
        let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(compile_bytes(&source), vec![OP_1]);
    }

    #[test]
    fn deep_prefix_chains_are_rejected() {
        for prefix in ["not ", "- "] {
            let source = format!("{}x", prefix.repeat(10_000));
            let err = compile(&source, &NoVariables).unwrap_err();
            assert_eq!(err.message, "expression nested too deeply", "{prefix}");
        }
    }

    #[test]
    fn deep_blocks_are_rejected() {
        let source = format!("{}1{}", "if 1 { ".repeat(5_000), " }".repeat(5_000));
        let err = compile(&source, &NoVariables).unwrap_err();
        assert_eq!(err.message, "expression nested too deeply");

        let chain = format!("if 0 {{ 1 }}{}", " else if 0 { 1 }".repeat(5_000));
        let err = compile(&chain, &NoVariables).unwrap_err();
        assert_eq!(err.message, "expression nested too deeply");
    }

    #[test]
    fn lexical_error_position() {
        let err = compile("1\n  ~", &NoVariables).unwrap_err();
        assert_eq!((err.line, err.col), (2, 3));
    }
}
