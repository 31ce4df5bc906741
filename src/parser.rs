use std::path::PathBuf;

use crate::error::ShellError;
use crate::redirect::{self, OutputRedirect};

/// One token of an input line. Operators are only recognised when the word
/// was written entirely unquoted, so `'>'` stays a plain argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Word(String),
    /// `<`
    Input,
    /// `>`
    Output,
    /// `>>`
    Append,
    /// `&`
    Background,
}

/// A parsed command line, consumed once by the executor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    /// `None` for a line with no words, which is a no-op.
    pub program: Option<String>,
    /// Full argument vector; `argv[0]` is the program.
    pub argv: Vec<String>,
    pub input: Option<PathBuf>,
    pub output: Option<OutputRedirect>,
    pub background: bool,
}

impl Command {
    /// Arguments after the program name.
    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    /// Display form used for job labels: program plus arguments.
    pub fn label(&self) -> String {
        self.argv.join(" ")
    }
}

/// States for the tokenizer state machine.
enum State {
    /// Between tokens: whitespace is skipped
    Normal,
    /// Building an unquoted word: whitespace ends it
    InWord,
    /// Inside double quotes: whitespace is preserved
    InDoubleQuote,
    /// Inside single quotes: everything is literal
    InSingleQuote,
}

/// Accumulates one word and remembers whether any part of it was quoted.
#[derive(Default)]
struct WordBuf {
    text: String,
    quoted: bool,
    started: bool,
}

impl WordBuf {
    fn push(&mut self, ch: char) {
        self.text.push(ch);
        self.started = true;
    }

    fn push_literal(&mut self, ch: char) {
        self.push(ch);
        self.quoted = true;
    }

    fn open_quote(&mut self) {
        self.quoted = true;
        self.started = true;
    }

    fn finish(&mut self, tokens: &mut Vec<Token>) {
        if !self.started {
            return;
        }
        let word = std::mem::take(self);
        let token = if word.quoted {
            Token::Word(word.text)
        } else {
            match word.text.as_str() {
                "<" => Token::Input,
                ">" => Token::Output,
                ">>" => Token::Append,
                "&" => Token::Background,
                _ => Token::Word(word.text),
            }
        };
        tokens.push(token);
    }
}

/// Split an input line into words and operators.
///
/// Unterminated quotes are tolerated: the partial content becomes a word.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = WordBuf::default();
    let mut state = State::Normal;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match (&state, ch) {
            // ── Between tokens ──
            (State::Normal, ' ' | '\t' | '\n' | '\r') => {}
            (State::Normal | State::InWord, '"') => {
                word.open_quote();
                state = State::InDoubleQuote;
            }
            (State::Normal | State::InWord, '\'') => {
                word.open_quote();
                state = State::InSingleQuote;
            }
            (State::Normal | State::InWord, '\\') => {
                word.push_literal(chars.next().unwrap_or('\\'));
                state = State::InWord;
            }
            (State::Normal, c) => {
                word.push(c);
                state = State::InWord;
            }

            // ── Unquoted word ──
            (State::InWord, ' ' | '\t' | '\n' | '\r') => {
                word.finish(&mut tokens);
                state = State::Normal;
            }
            (State::InWord, c) => word.push(c),

            // ── Inside "..." ──
            (State::InDoubleQuote, '"') => state = State::InWord,
            (State::InDoubleQuote, '\\') => {
                match chars.next_if(|c| matches!(c, '"' | '\\' | '$' | '`')) {
                    Some(escaped) => word.push(escaped),
                    None => word.push('\\'),
                }
            }
            (State::InDoubleQuote, c) => word.push(c),

            // ── Inside '...' ──
            (State::InSingleQuote, '\'') => state = State::InWord,
            (State::InSingleQuote, c) => word.push(c),
        }
    }

    word.finish(&mut tokens);
    tokens
}

/// Parse one input line into a [`Command`].
///
/// A line with no words yields a command without a program. A redirection
/// operator missing its filename is a syntax error.
pub fn parse(input: &str) -> Result<Command, ShellError> {
    let tokens = tokenize(input);
    let (argv, redirections) = redirect::extract_redirections(&tokens)?;

    Ok(Command {
        program: argv.first().cloned(),
        argv,
        input: redirections.input,
        output: redirections.output,
        background: redirections.background,
    })
}
