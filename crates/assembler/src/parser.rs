//! Parser: assembly tokens → script library.
//!
//! The input is line oriented. `library`, `script`, `property`, `handler`,
//! `local` and `end` are directives; every other line inside a handler is a
//! label definition or one instruction. Jump labels are resolved when the
//! handler's `end` is reached, once instruction widths are known.

use std::collections::HashMap;
use std::sync::Arc;

use lingo_common::{Handler, Instruction, Literal, Opcode, Script, ScriptKind, ScriptLibrary};

use crate::error::AsmError;
use crate::lexer::{tokenize_line, Token};

/// Default library header when the text has no `library` line.
pub const DEFAULT_LIBRARY_NUMBER: i32 = 1;
pub const DEFAULT_LIBRARY_NAME: &str = "Internal";
pub const DEFAULT_DIR_VERSION: u32 = 1200;

#[derive(Debug)]
enum Operand {
    None,
    Value(i32),
    Label(String),
}

#[derive(Debug)]
struct Pending {
    line: usize,
    opcode: Opcode,
    operand: Operand,
}

#[derive(Debug)]
struct HandlerBuilder {
    line: usize,
    name: String,
    name_id: i32,
    args: Vec<String>,
    locals: Vec<String>,
    body: Vec<Pending>,
    /// Label name → index of the instruction it precedes.
    labels: HashMap<String, usize>,
}

#[derive(Debug)]
struct ScriptBuilder {
    line: usize,
    script: Script,
}

/// Line-by-line assembly state.
#[derive(Debug)]
pub(crate) struct Assembler {
    library: ScriptLibrary,
    script: Option<ScriptBuilder>,
    handler: Option<HandlerBuilder>,
    line: usize,
}

impl Assembler {
    pub(crate) fn new() -> Self {
        Self {
            library: ScriptLibrary::new(DEFAULT_LIBRARY_NUMBER, DEFAULT_LIBRARY_NAME, DEFAULT_DIR_VERSION),
            script: None,
            handler: None,
            line: 0,
        }
    }

    /// Consume one source line.
    pub(crate) fn feed(&mut self, text: &str, line: usize) -> Result<(), AsmError> {
        self.line = line;
        let tokens = tokenize_line(text, line)?;
        let Some((first, rest)) = tokens.split_first() else {
            return Ok(());
        };

        if let Token::LabelDef(label) = first {
            self.define_label(label)?;
            return match rest.split_first() {
                Some((next, more)) => self.statement(next, more),
                None => Ok(()),
            };
        }
        self.statement(first, rest)
    }

    /// Close the input and return the library.
    pub(crate) fn finish(self) -> Result<ScriptLibrary, AsmError> {
        if let Some(handler) = &self.handler {
            return Err(AsmError::UnclosedBlock {
                line: handler.line,
                block: format!("handler {}", handler.name),
            });
        }
        if let Some(script) = &self.script {
            return Err(AsmError::UnclosedBlock {
                line: script.line,
                block: format!("script {}", script.script.member),
            });
        }
        Ok(self.library)
    }

    fn statement(&mut self, first: &Token, rest: &[Token]) -> Result<(), AsmError> {
        let Token::Ident(word) = first else {
            return Err(self.unexpected(first));
        };
        match word.to_ascii_lowercase().as_str() {
            "library" => self.library_directive(rest),
            "script" => self.script_directive(rest),
            "property" | "properties" => self.property_directive(rest),
            "handler" => self.handler_directive(rest),
            "local" | "locals" => self.local_directive(rest),
            "end" => self.end_directive(rest),
            _ => self.instruction(word, rest),
        }
    }

    fn unexpected(&self, token: &Token) -> AsmError {
        AsmError::UnexpectedToken {
            line: self.line,
            token: token.text(),
        }
    }

    fn misplaced(&self, token: &str) -> AsmError {
        AsmError::Misplaced {
            line: self.line,
            token: token.to_string(),
        }
    }

    fn missing(&self, opcode: &'static str) -> AsmError {
        AsmError::MissingArgument {
            line: self.line,
            opcode,
        }
    }

    fn int(&self, token: &Token) -> Result<i32, AsmError> {
        match token {
            Token::Int(n) => i32::try_from(*n)
                .or_else(|_| u32::try_from(*n).map(|v| v as i32))
                .map_err(|_| AsmError::InvalidNumber {
                    line: self.line,
                    token: n.to_string(),
                }),
            other => Err(self.unexpected(other)),
        }
    }

    fn names(&self, tokens: &[Token]) -> Result<Vec<String>, AsmError> {
        tokens
            .iter()
            .map(|t| match t {
                Token::Ident(name) => Ok(name.clone()),
                other => Err(self.unexpected(other)),
            })
            .collect()
    }

    // ---- Directives ----

    /// `library <number> ["name"] [version=<n>] [capitalx]`
    fn library_directive(&mut self, args: &[Token]) -> Result<(), AsmError> {
        if self.script.is_some() || !self.library.scripts.is_empty() {
            return Err(self.misplaced("library"));
        }
        let Some((number, rest)) = args.split_first() else {
            return Err(self.missing("library"));
        };
        self.library.number = self.int(number)?;
        for token in rest {
            match token {
                Token::Str(name) => self.library.name = name.clone(),
                Token::Setting(key, value) if key.eq_ignore_ascii_case("version") => {
                    self.library.dir_version = value.parse().map_err(|_| AsmError::InvalidNumber {
                        line: self.line,
                        token: value.clone(),
                    })?;
                }
                Token::Ident(flag) if flag.eq_ignore_ascii_case("capitalx") => {
                    self.library.capital_x = true;
                }
                other => return Err(self.unexpected(other)),
            }
        }
        Ok(())
    }

    /// `script <member> <kind> ["name"]`
    fn script_directive(&mut self, args: &[Token]) -> Result<(), AsmError> {
        if self.script.is_some() {
            return Err(self.misplaced("script"));
        }
        let (Some(member), Some(kind)) = (args.first(), args.get(1)) else {
            return Err(self.missing("script"));
        };
        let member = self.int(member)?;
        let kind = match kind {
            Token::Ident(name) => ScriptKind::from_name(name).ok_or_else(|| AsmError::UnknownScriptKind {
                line: self.line,
                token: name.clone(),
            })?,
            other => return Err(self.unexpected(other)),
        };
        if self.library.script_by_member(member).is_some() {
            return Err(AsmError::DuplicateScript {
                line: self.line,
                member,
            });
        }

        let mut script = Script::new(member, kind);
        match &args[2..] {
            [] => {}
            [Token::Str(name)] => script.name = name.clone(),
            [other, ..] => return Err(self.unexpected(other)),
        }
        self.script = Some(ScriptBuilder {
            line: self.line,
            script,
        });
        Ok(())
    }

    fn property_directive(&mut self, args: &[Token]) -> Result<(), AsmError> {
        if self.handler.is_some() || self.script.is_none() {
            return Err(self.misplaced("property"));
        }
        let names = self.names(args)?;
        let ids: Vec<i32> = names.iter().map(|n| self.library.names.intern(n)).collect();
        if let Some(builder) = self.script.as_mut() {
            builder.script.property_name_ids.extend(ids);
        }
        Ok(())
    }

    /// `handler <name> [arg, ...]`
    fn handler_directive(&mut self, args: &[Token]) -> Result<(), AsmError> {
        if self.handler.is_some() || self.script.is_none() {
            return Err(self.misplaced("handler"));
        }
        let names = self.names(args)?;
        let Some((name, params)) = names.split_first() else {
            return Err(self.missing("handler"));
        };
        let name_id = self.library.names.intern(name);
        for param in params {
            self.library.names.intern(param);
        }
        self.handler = Some(HandlerBuilder {
            line: self.line,
            name: name.clone(),
            name_id,
            args: params.to_vec(),
            locals: Vec::new(),
            body: Vec::new(),
            labels: HashMap::new(),
        });
        Ok(())
    }

    fn local_directive(&mut self, args: &[Token]) -> Result<(), AsmError> {
        if self.handler.is_none() {
            return Err(self.misplaced("local"));
        }
        let names = self.names(args)?;
        for name in &names {
            self.library.names.intern(name);
        }
        if let Some(handler) = self.handler.as_mut() {
            handler.locals.extend(names);
        }
        Ok(())
    }

    fn end_directive(&mut self, args: &[Token]) -> Result<(), AsmError> {
        if let Some(extra) = args.first() {
            return Err(self.unexpected(extra));
        }
        if let Some(handler) = self.handler.take() {
            let mut handler = self.build_handler(handler)?;
            if let Some(builder) = self.script.as_mut() {
                handler.vector_pos = builder.script.handlers.len() as i32;
                builder.script.handlers.push(handler);
            }
            return Ok(());
        }
        match self.script.take() {
            Some(builder) => {
                self.library.scripts.push(Arc::new(builder.script));
                Ok(())
            }
            None => Err(self.misplaced("end")),
        }
    }

    fn define_label(&mut self, label: &str) -> Result<(), AsmError> {
        let line = self.line;
        let Some(handler) = self.handler.as_mut() else {
            return Err(self.misplaced(&format!("@{label}:")));
        };
        let at = handler.body.len();
        if handler.labels.insert(label.to_string(), at).is_some() {
            return Err(AsmError::DuplicateLabel {
                line,
                label: label.to_string(),
            });
        }
        Ok(())
    }

    // ---- Instructions ----

    fn instruction(&mut self, mnemonic: &str, args: &[Token]) -> Result<(), AsmError> {
        if self.handler.is_none() {
            return Err(self.misplaced(mnemonic));
        }
        let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| AsmError::UnknownOpcode {
            line: self.line,
            token: mnemonic.to_string(),
        })?;

        let operand = match (opcode.takes_argument(), args) {
            (false, []) => Operand::None,
            (false, _) => {
                return Err(AsmError::UnexpectedArgument {
                    line: self.line,
                    opcode: opcode.mnemonic(),
                })
            }
            (true, []) => return Err(self.missing(opcode.mnemonic())),
            (true, [arg]) => self.operand(opcode, arg)?,
            (true, [_, extra, ..]) => return Err(self.unexpected(extra)),
        };

        let line = self.line;
        if let Some(handler) = self.handler.as_mut() {
            handler.body.push(Pending { line, opcode, operand });
        }
        Ok(())
    }

    fn operand(&mut self, opcode: Opcode, arg: &Token) -> Result<Operand, AsmError> {
        let value = match (opcode, arg) {
            (_, Token::Label(label)) => return Ok(Operand::Label(label.clone())),
            (_, Token::Symbol(name)) => self.library.names.intern(name),
            (Opcode::PushCons, Token::Str(s)) => self.literal(Literal::Str(s.clone())),
            (Opcode::PushCons, Token::Float(f)) => self.literal(Literal::Float(*f)),
            (Opcode::PushCons, Token::Int(_)) => {
                let n = self.int(arg)?;
                self.literal(Literal::Int(n))
            }
            (Opcode::PushFloat32, Token::Float(f)) => (*f as f32).to_bits() as i32,
            (Opcode::PushFloat32, Token::Int(n)) => (*n as f32).to_bits() as i32,
            (Opcode::GetParam | Opcode::SetParam | Opcode::GetLocal | Opcode::SetLocal, _) => {
                self.variable_slot(opcode, arg)? * self.library.variable_multiplier()
            }
            (_, Token::Int(_)) => self.int(arg)?,
            (_, other) => return Err(self.unexpected(other)),
        };
        Ok(Operand::Value(value))
    }

    /// Slot number of a variable operand, by number or by declared name.
    fn variable_slot(&self, opcode: Opcode, arg: &Token) -> Result<i32, AsmError> {
        let Token::Ident(name) = arg else {
            return self.int(arg);
        };
        let handler = self.handler.as_ref();
        let declared = match opcode {
            Opcode::GetParam | Opcode::SetParam => handler.map(|h| &h.args),
            _ => handler.map(|h| &h.locals),
        };
        declared
            .and_then(|names| names.iter().position(|n| n.eq_ignore_ascii_case(name)))
            .map(|i| i as i32)
            .ok_or_else(|| AsmError::UnknownVariable {
                line: self.line,
                name: name.clone(),
            })
    }

    /// Index of `literal` in the current script's table, appending it when new.
    fn literal(&mut self, literal: Literal) -> i32 {
        let Some(builder) = self.script.as_mut() else {
            return 0;
        };
        let literals = &mut builder.script.literals;
        match literals.iter().position(|l| *l == literal) {
            Some(i) => i as i32,
            None => {
                literals.push(literal);
                (literals.len() - 1) as i32
            }
        }
    }

    fn build_handler(&self, builder: HandlerBuilder) -> Result<Handler, AsmError> {
        let instructions = layout(&builder.body, &builder.labels)?;
        let arg_ids = builder
            .args
            .iter()
            .filter_map(|n| self.library.names.find(n))
            .collect();
        let local_ids = builder
            .locals
            .iter()
            .filter_map(|n| self.library.names.find(n))
            .collect();
        Ok(Handler::new(builder.name_id, arg_ids, local_ids, instructions))
    }
}

/// Assign byte offsets and resolve labels.
///
/// Jump distances depend on the widths of the instructions they span, so
/// widths are grown until they stop changing. Widths never shrink, which
/// bounds the number of rounds.
fn layout(body: &[Pending], labels: &HashMap<String, usize>) -> Result<Vec<Instruction>, AsmError> {
    let mut widths: Vec<usize> = body
        .iter()
        .map(|p| {
            let arg = match p.operand {
                Operand::Value(v) => v,
                _ => 0,
            };
            lingo_common::encode_instruction(p.opcode, arg).len()
        })
        .collect();

    loop {
        let mut offsets = Vec::with_capacity(body.len() + 1);
        let mut at = 0;
        for w in &widths {
            offsets.push(at);
            at += w;
        }
        offsets.push(at);

        let mut arguments = Vec::with_capacity(body.len());
        for (i, pending) in body.iter().enumerate() {
            let argument = match &pending.operand {
                Operand::None => 0,
                Operand::Value(v) => *v,
                Operand::Label(label) => {
                    let target = labels.get(label).ok_or_else(|| AsmError::UndefinedLabel {
                        line: pending.line,
                        label: label.clone(),
                    })?;
                    let (from, to) = (offsets[i] as i64, offsets[*target] as i64);
                    let distance = if pending.opcode == Opcode::EndRepeat {
                        from - to
                    } else {
                        to - from
                    };
                    distance as i32
                }
            };
            arguments.push(argument);
        }

        let grown: Vec<usize> = body
            .iter()
            .zip(&arguments)
            .zip(&widths)
            .map(|((p, arg), w)| lingo_common::encode_instruction(p.opcode, *arg).len().max(*w))
            .collect();

        if grown == widths {
            return Ok(body
                .iter()
                .zip(arguments)
                .enumerate()
                .map(|(i, (p, argument))| Instruction {
                    offset: offsets[i],
                    opcode: p.opcode,
                    raw: raw_byte(p.opcode, widths[i]),
                    argument,
                })
                .collect());
        }
        widths = grown;
    }
}

/// Opcode byte for an instruction encoded in `width` bytes.
fn raw_byte(opcode: Opcode, width: usize) -> u8 {
    let code = opcode as u8;
    if !opcode.takes_argument() {
        return code;
    }
    let base = code - 0x40;
    match width {
        2 => 0x40 + base,
        3 => 0x80 + base,
        _ => 0xC0 + base,
    }
}
