// this_file: src/state_machine.rs

//! The byte-by-byte DFA over the JSON grammar.
//!
//! This is the ground-truth oracle: every other execution strategy (SPORT,
//! TURBO) must agree with it byte-for-byte. It never builds a parse tree —
//! each accepted byte is either dropped (insignificant whitespace) or
//! handed to an [`Emit`] sink verbatim.

use crate::error::{Error, Result};

/// Where an open container's bytes came from; tracked so the machine
/// knows whether a `}`/`]` closes an object or array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    TopLevel,
    Object,
    Array,
}

/// Maximum context-stack depth for the non-streaming machine (SPORT/TURBO
/// chunk workers). The streaming validator's [`StateMachine::with_capacity`]
/// may use a different bound.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// One of the ~22 positions within a JSON production the machine can be
/// in. `Error` is sticky: once entered, every subsequent byte fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    TopLevel,
    ObjectStart,
    ObjectKey,
    ObjectKeyString,
    ObjectKeyStringEscape,
    ObjectKeyStringEscapeUnicode,
    ObjectColon,
    ObjectValue,
    ObjectComma,
    ArrayStart,
    ArrayValue,
    ArrayComma,
    String,
    StringEscape,
    StringEscapeUnicode,
    Number,
    NumberDecimal,
    NumberExponent,
    NumberExponentSign,
    True,
    False,
    Null,
    Error,
}

/// Which container a completed string closes back into, so the
/// post-string transition can route correctly (object key vs. any
/// value position).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringOrigin {
    ObjectKey,
    Value,
}

/// The literal currently being matched (`true`/`false`/`null`) plus how
/// many of its bytes have been consumed.
#[derive(Debug, Clone, Copy)]
struct LiteralMatch {
    text: &'static [u8],
    matched: usize,
}

/// The byte-level DFA described in the JSON grammar. Drives an [`Emit`]
/// sink with exactly the bytes that belong in minified output.
pub struct StateMachine {
    state: State,
    contexts: Vec<Context>,
    max_depth: usize,
    string_origin: StringOrigin,
    unicode_remaining: u8,
    literal: Option<LiteralMatch>,
    /// Set on entering `NumberExponent`/`NumberExponentSign` and cleared
    /// the moment an exponent digit is consumed; `1e` followed by a
    /// terminator is invalid, so this must be true before the exponent
    /// can be accepted as complete.
    exponent_has_digit: bool,
    position: usize,
    /// When false, string bodies and numbers are not copied to the sink;
    /// used by the validator (C10), which only wants pass/fail.
    emit_output: bool,
}

/// A sink that accepts accepted, minified bytes as the machine runs.
pub trait Emit {
    /// Appends `bytes` to the output.
    fn emit(&mut self, bytes: &[u8]);
}

impl<F: FnMut(&[u8])> Emit for F {
    fn emit(&mut self, bytes: &[u8]) {
        (self)(bytes)
    }
}

impl Emit for Vec<u8> {
    fn emit(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

const TRUE: &[u8] = b"true";
const FALSE: &[u8] = b"false";
const NULL: &[u8] = b"null";

impl StateMachine {
    /// Creates a machine with the default context-stack depth (32) that
    /// emits output.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_DEPTH, true)
    }

    /// Creates a machine with an explicit depth bound and emit behavior.
    pub fn with_capacity(max_depth: usize, emit_output: bool) -> Self {
        let mut contexts = Vec::with_capacity(max_depth.min(64));
        contexts.push(Context::TopLevel);
        StateMachine {
            state: State::TopLevel,
            contexts,
            max_depth,
            string_origin: StringOrigin::Value,
            unicode_remaining: 0,
            literal: None,
            exponent_has_digit: false,
            position: 0,
            emit_output,
        }
    }

    /// Feeds one byte slice through the machine, driving `sink` with
    /// accepted output bytes. Returns the first error encountered, if
    /// any; once an error is returned the machine must not be fed again.
    pub fn feed(&mut self, input: &[u8], sink: &mut impl Emit) -> Result<()> {
        for &b in input {
            self.step(b, sink)?;
            self.position += 1;
        }
        Ok(())
    }

    /// Signals end of input. Succeeds only if the current state is a
    /// valid document terminator.
    pub fn flush(&mut self) -> Result<()> {
        match self.state {
            State::TopLevel
            | State::Number
            | State::NumberDecimal
            | State::NumberExponent
            | State::True
            | State::False
            | State::Null => {
                if self.contexts.len() == 1 {
                    Ok(())
                } else {
                    Err(Error::UnexpectedEndOfInput {
                        position: self.position,
                    })
                }
            }
            _ => Err(Error::UnexpectedEndOfInput {
                position: self.position,
            }),
        }
    }

    fn fail(&mut self) -> Error {
        self.state = State::Error;
        Error::InvalidJson {
            position: self.position,
        }
    }

    fn push_context(&mut self, ctx: Context) -> Result<()> {
        if self.contexts.len() >= self.max_depth {
            self.state = State::Error;
            return Err(Error::NestingTooDeep {
                position: self.position,
            });
        }
        self.contexts.push(ctx);
        Ok(())
    }

    fn pop_context(&mut self) -> Context {
        self.contexts.pop().unwrap_or(Context::TopLevel)
    }

    fn current_context(&self) -> Context {
        *self.contexts.last().unwrap_or(&Context::TopLevel)
    }

    /// Dispatches a single byte. Numbers and literals re-dispatch their
    /// terminating byte into the new state rather than consuming it
    /// twice.
    fn step(&mut self, b: u8, sink: &mut impl Emit) -> Result<()> {
        match self.state {
            State::Error => Err(Error::InvalidJson {
                position: self.position,
            }),

            State::TopLevel => self.step_value_position(b, sink, true),

            State::ObjectStart => {
                if crate::classify::is_whitespace(b) {
                    return Ok(());
                }
                if b == b'}' {
                    self.close_container(sink, b)
                } else if b == b'"' {
                    self.state = State::ObjectKeyString;
                    self.string_origin = StringOrigin::ObjectKey;
                    self.emit(sink, &[b]);
                    Ok(())
                } else {
                    Err(self.fail())
                }
            }

            State::ObjectKey => {
                if crate::classify::is_whitespace(b) {
                    return Ok(());
                }
                if b == b'"' {
                    self.state = State::ObjectKeyString;
                    self.string_origin = StringOrigin::ObjectKey;
                    self.emit(sink, &[b]);
                    Ok(())
                } else {
                    Err(self.fail())
                }
            }

            State::ObjectKeyString => self.step_string_body(b, sink, State::ObjectColon),
            State::ObjectKeyStringEscape => self.step_string_escape(b, sink, State::ObjectKeyString),
            State::ObjectKeyStringEscapeUnicode => {
                self.step_unicode_escape(b, sink, State::ObjectKeyString)
            }

            State::ObjectColon => {
                if crate::classify::is_whitespace(b) {
                    return Ok(());
                }
                if b == b':' {
                    self.state = State::ObjectValue;
                    self.emit(sink, &[b]);
                    Ok(())
                } else {
                    Err(self.fail())
                }
            }

            State::ObjectValue => self.step_value_position(b, sink, false),

            State::ObjectComma => {
                if crate::classify::is_whitespace(b) {
                    return Ok(());
                }
                if b == b',' {
                    self.state = State::ObjectKey;
                    self.emit(sink, &[b]);
                    Ok(())
                } else if b == b'}' {
                    self.close_container(sink, b)
                } else {
                    Err(self.fail())
                }
            }

            State::ArrayStart => {
                if crate::classify::is_whitespace(b) {
                    return Ok(());
                }
                if b == b']' {
                    self.close_container(sink, b)
                } else {
                    self.step_value_position(b, sink, false)
                }
            }

            State::ArrayValue => self.step_value_position(b, sink, false),

            State::ArrayComma => {
                if crate::classify::is_whitespace(b) {
                    return Ok(());
                }
                if b == b',' {
                    self.state = State::ArrayValue;
                    self.emit(sink, &[b]);
                    Ok(())
                } else if b == b']' {
                    self.close_container(sink, b)
                } else {
                    Err(self.fail())
                }
            }

            State::String => self.step_string_body(b, sink, self.post_value_state()),
            State::StringEscape => {
                let resume = self.post_string_value_state();
                self.step_string_escape(b, sink, resume)
            }
            State::StringEscapeUnicode => {
                let resume = self.post_string_value_state();
                self.step_unicode_escape(b, sink, resume)
            }

            State::Number => self.step_number(b, sink),
            State::NumberDecimal => self.step_number(b, sink),
            State::NumberExponent => self.step_number(b, sink),
            State::NumberExponentSign => self.step_number(b, sink),

            State::True => self.step_literal(b, sink),
            State::False => self.step_literal(b, sink),
            State::Null => self.step_literal(b, sink),
        }
    }

    /// True when we're mid-string-body and the next byte belongs to an
    /// object key (routes the post-quote state correctly); used only by
    /// `self.state == State::String`'s post-close dispatch.
    fn post_value_state(&self) -> State {
        match self.current_context() {
            Context::Object => State::ObjectComma,
            Context::Array => State::ArrayComma,
            Context::TopLevel => State::TopLevel,
        }
    }

    fn post_string_value_state(&self) -> State {
        self.post_value_state()
    }

    fn emit(&mut self, sink: &mut impl Emit, bytes: &[u8]) {
        if self.emit_output {
            sink.emit(bytes);
        }
    }

    /// Dispatches a byte that opens a value: `{`, `[`, `"`, a number
    /// start, or a literal's first byte. `at_top` distinguishes the
    /// document's very first value (whitespace before it is skipped
    /// without requiring any prior token) from a nested value position.
    fn step_value_position(&mut self, b: u8, sink: &mut impl Emit, at_top: bool) -> Result<()> {
        if crate::classify::is_whitespace(b) {
            return Ok(());
        }
        match b {
            b'{' => {
                self.push_context(Context::Object)?;
                self.state = State::ObjectStart;
                self.emit(sink, &[b]);
                Ok(())
            }
            b'[' => {
                self.push_context(Context::Array)?;
                self.state = State::ArrayStart;
                self.emit(sink, &[b]);
                Ok(())
            }
            b'"' => {
                self.state = State::String;
                self.string_origin = StringOrigin::Value;
                self.emit(sink, &[b]);
                Ok(())
            }
            b't' => {
                self.state = State::True;
                self.literal = Some(LiteralMatch { text: TRUE, matched: 1 });
                self.emit(sink, &[b]);
                Ok(())
            }
            b'f' => {
                self.state = State::False;
                self.literal = Some(LiteralMatch { text: FALSE, matched: 1 });
                self.emit(sink, &[b]);
                Ok(())
            }
            b'n' => {
                self.state = State::Null;
                self.literal = Some(LiteralMatch { text: NULL, matched: 1 });
                self.emit(sink, &[b]);
                Ok(())
            }
            _ if crate::classify::is_number_start(b) => {
                self.state = State::Number;
                self.emit(sink, &[b]);
                Ok(())
            }
            _ => {
                let _ = at_top;
                Err(self.fail())
            }
        }
    }

    fn close_container(&mut self, sink: &mut impl Emit, close_byte: u8) -> Result<()> {
        let ctx = self.pop_context();
        let expected = match ctx {
            Context::Object => b'}',
            Context::Array => b']',
            Context::TopLevel => {
                return Err(self.fail());
            }
        };
        if close_byte != expected {
            self.contexts.push(ctx);
            return Err(self.fail());
        }
        self.emit(sink, &[close_byte]);
        self.state = match self.current_context() {
            Context::Object => State::ObjectComma,
            Context::Array => State::ArrayComma,
            Context::TopLevel => State::TopLevel,
        };
        Ok(())
    }

    fn step_string_body(&mut self, b: u8, sink: &mut impl Emit, after: State) -> Result<()> {
        if b < 0x20 {
            self.state = State::Error;
            return Err(Error::UnescapedControlCharacter {
                position: self.position,
            });
        }
        match b {
            b'"' => {
                self.emit(sink, &[b]);
                self.state = match self.string_origin {
                    StringOrigin::ObjectKey => after,
                    StringOrigin::Value => after,
                };
                Ok(())
            }
            b'\\' => {
                self.emit(sink, &[b]);
                self.state = match self.string_origin {
                    StringOrigin::ObjectKey => State::ObjectKeyStringEscape,
                    StringOrigin::Value => State::StringEscape,
                };
                Ok(())
            }
            _ => {
                self.emit(sink, &[b]);
                Ok(())
            }
        }
    }

    fn step_string_escape(&mut self, b: u8, sink: &mut impl Emit, resume: State) -> Result<()> {
        if b == b'u' {
            self.emit(sink, &[b]);
            self.unicode_remaining = 4;
            self.state = match self.string_origin {
                StringOrigin::ObjectKey => State::ObjectKeyStringEscapeUnicode,
                StringOrigin::Value => State::StringEscapeUnicode,
            };
            Ok(())
        } else if crate::classify::escape_value(b).is_some() {
            self.emit(sink, &[b]);
            self.state = match self.string_origin {
                StringOrigin::ObjectKey => State::ObjectKeyString,
                StringOrigin::Value => State::String,
            };
            let _ = resume;
            Ok(())
        } else {
            self.state = State::Error;
            Err(Error::InvalidEscapeSequence {
                position: self.position,
            })
        }
    }

    fn step_unicode_escape(&mut self, b: u8, sink: &mut impl Emit, _resume: State) -> Result<()> {
        if !crate::classify::is_hex_digit(b) {
            self.state = State::Error;
            return Err(Error::InvalidUnicodeEscape {
                position: self.position,
            });
        }
        self.emit(sink, &[b]);
        self.unicode_remaining -= 1;
        if self.unicode_remaining == 0 {
            self.state = match self.string_origin {
                StringOrigin::ObjectKey => State::ObjectKeyString,
                StringOrigin::Value => State::String,
            };
        }
        Ok(())
    }

    fn step_number(&mut self, b: u8, sink: &mut impl Emit) -> Result<()> {
        match (self.state, b) {
            (State::Number, b'.') => {
                self.emit(sink, &[b]);
                self.state = State::NumberDecimal;
                Ok(())
            }
            (State::Number, b'e') | (State::Number, b'E') => {
                self.emit(sink, &[b]);
                self.state = State::NumberExponent;
                self.exponent_has_digit = false;
                Ok(())
            }
            (State::Number, _) if crate::classify::is_digit(b) => {
                self.emit(sink, &[b]);
                Ok(())
            }
            (State::NumberDecimal, _) if crate::classify::is_digit(b) => {
                self.emit(sink, &[b]);
                Ok(())
            }
            (State::NumberDecimal, b'e') | (State::NumberDecimal, b'E') => {
                self.emit(sink, &[b]);
                self.state = State::NumberExponent;
                self.exponent_has_digit = false;
                Ok(())
            }
            (State::NumberExponent, b'+') | (State::NumberExponent, b'-')
                if !self.exponent_has_digit =>
            {
                self.emit(sink, &[b]);
                self.state = State::NumberExponentSign;
                Ok(())
            }
            (State::NumberExponent, _) | (State::NumberExponentSign, _)
                if crate::classify::is_digit(b) =>
            {
                self.emit(sink, &[b]);
                self.state = State::NumberExponent;
                self.exponent_has_digit = true;
                Ok(())
            }
            // Terminator: the number is complete, re-dispatch `b` into
            // the position that follows a value at this nesting level.
            _ => {
                if matches!(self.state, State::NumberExponent | State::NumberExponentSign)
                    && !self.exponent_has_digit
                {
                    return Err(Error::InvalidNumber {
                        position: self.position,
                    });
                }
                self.redispatch_after_value(b, sink)
            }
        }
    }

    fn step_literal(&mut self, b: u8, sink: &mut impl Emit) -> Result<()> {
        let lit = self.literal.expect("literal state without active match");
        if lit.matched < lit.text.len() {
            if b == lit.text[lit.matched] {
                self.emit(sink, &[b]);
                self.literal = Some(LiteralMatch {
                    text: lit.text,
                    matched: lit.matched + 1,
                });
                Ok(())
            } else {
                Err(self.fail())
            }
        } else {
            self.redispatch_after_value(b, sink)
        }
    }

    /// A number or literal just completed without consuming `b`; route
    /// `b` as if it arrived at the appropriate post-value state for the
    /// current container.
    fn redispatch_after_value(&mut self, b: u8, sink: &mut impl Emit) -> Result<()> {
        self.state = match self.current_context() {
            Context::Object => State::ObjectComma,
            Context::Array => State::ArrayComma,
            Context::TopLevel => State::TopLevel,
        };
        self.step(b, sink)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minify(input: &[u8]) -> Result<Vec<u8>> {
        let mut machine = StateMachine::new();
        let mut out = Vec::new();
        machine.feed(input, &mut out)?;
        machine.flush()?;
        Ok(out)
    }

    #[test]
    fn minifies_whitespace_between_tokens() {
        let out = minify(br#"{ "name" : "John" , "age" : 30 }"#).unwrap();
        assert_eq!(out, br#"{"name":"John","age":30}"#);
    }

    #[test]
    fn minifies_array_with_literals() {
        let out = minify(br#"[ 1 , 2 , 3 , "hello world" , null , true , false ]"#).unwrap();
        assert_eq!(out, br#"[1,2,3,"hello world",null,true,false]"#);
    }

    #[test]
    fn preserves_escape_sequences_verbatim() {
        let out = minify(br#"{"s":"a\nb","u":"\u00e9"}"#).unwrap();
        assert_eq!(out, br#"{"s":"a\nb","u":"\u00e9"}"#);
    }

    #[test]
    fn preserves_number_lexical_form() {
        assert_eq!(minify(b"1.5e+10").unwrap(), b"1.5e+10");
        assert_eq!(minify(b"-0.25").unwrap(), b"-0.25");
    }

    #[test]
    fn nested_structure_with_arbitrary_whitespace() {
        let out = minify(b"  {  \"nested\" :{ \"deep\":[{\"k\"\n:\"v\"}]  }}\t").unwrap();
        assert_eq!(out, br#"{"nested":{"deep":[{"k":"v"}]}}"#);
    }

    #[test]
    fn rejects_trailing_comma() {
        assert!(minify(br#"{"a":1,}"#).is_err());
    }

    #[test]
    fn rejects_exponent_with_no_digits() {
        assert!(minify(b"[1e]").is_err());
        assert!(minify(b"[1e+]").is_err());
    }

    #[test]
    fn rejects_second_exponent_sign() {
        assert!(minify(b"[1e1+2]").is_err());
    }

    #[test]
    fn rejects_control_byte_in_string() {
        let mut machine = StateMachine::new();
        let mut out = Vec::new();
        let err = machine.feed(b"\"a\x01b\"", &mut out).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnescapedControlCharacter);
    }

    #[test]
    fn rejects_bad_escape() {
        let mut machine = StateMachine::new();
        let mut out = Vec::new();
        let err = machine.feed(br#""\x""#, &mut out).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidEscapeSequence);
    }

    #[test]
    fn rejects_invalid_unicode_escape() {
        let mut machine = StateMachine::new();
        let mut out = Vec::new();
        let err = machine.feed(br#""\u00zz""#, &mut out).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidUnicodeEscape);
    }

    #[test]
    fn rejects_depth_overflow() {
        let mut machine = StateMachine::with_capacity(4, true);
        let mut out = Vec::new();
        let err = machine.feed(b"[[[[[1]]]]]", &mut out).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NestingTooDeep);
    }

    #[test]
    fn flush_rejects_incomplete_document() {
        let mut machine = StateMachine::new();
        let mut out = Vec::new();
        machine.feed(br#"{"a":1"#, &mut out).unwrap();
        assert!(machine.flush().is_err());
    }

    #[test]
    fn error_state_is_sticky() {
        let mut machine = StateMachine::new();
        let mut out = Vec::new();
        assert!(machine.feed(b"}", &mut out).is_err());
        assert!(machine.feed(b"1", &mut out).is_err());
    }

    #[test]
    fn validator_mode_emits_nothing() {
        let mut machine = StateMachine::with_capacity(DEFAULT_MAX_DEPTH, false);
        let mut out = Vec::new();
        machine.feed(br#"{"a": 1 }"#, &mut out).unwrap();
        machine.flush().unwrap();
        assert!(out.is_empty());
    }
}
