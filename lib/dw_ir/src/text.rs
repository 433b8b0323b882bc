//! Textual format of programs, close to smali but in SSA form.
//!
//! ```text
//! .class public Lcom/example/Main;
//! .super Ljava/lang/Object;
//! .method public static run(Lcom/example/Runnable;)V
//! .block B0
//!     v0[task] = argument
//!     invoke-interface v0 Lcom/example/Runnable;->run()V
//!     return-void
//! .end method
//! .end class
//! ```
//!
//! Blocks are declared with their normal successors (`-> B1 B2`) and their
//! exception handlers (`catch B3`), the first block of a method being its
//! entry. Phi operands are listed in the order the edges to their block are
//! declared. Instructions referenced by an `assume-non-null` are labelled
//! (`i4: invoke-virtual ...`). Everything after a `#` is a comment.

use crate::code::{Code, InstrId, ValueId};
use crate::descriptors::{FieldDescr, MethodDescr};
use crate::errors::{IrError, IrResult};
use crate::flags::{ClassFlags, MethodFlags};
use crate::instrs::{Constant, InstrKind, InvokeKind};
use crate::lattice::TypeElement;
use crate::program::{ClassDef, MethodDef, Program};
use crate::types::Type;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_till, take_till1, take_until, take_while, take_while1};
use nom::character::complete::{char, digit1, one_of, space0, space1};
use nom::combinator::{all_consuming, map, opt, recognize, verify};
use nom::multi::{many0, many1};
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::{Finish, IResult};
use std::collections::{BTreeMap, BTreeSet};
use std::convert::TryFrom;
use std::fmt;

fn syntax<M: fmt::Display>(line: usize, message: M) -> IrError {
    IrError::Syntax {
        line,
        message: message.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Value(String),
    Str(String),
    Word(String),
}

#[derive(Debug)]
struct InstrLine {
    label: Option<String>,
    dest: Option<(String, Option<String>)>,
    opcode: String,
    operands: Vec<Operand>,
}

#[derive(Debug)]
struct BlockLines {
    line: usize,
    name: String,
    successors: Vec<String>,
    catch_handlers: Vec<String>,
    instrs: Vec<(usize, InstrLine)>,
}

fn name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '$' || c == '-')(input)
}

fn block_name(input: &str) -> IResult<&str, &str> {
    verify(name, |s: &str| s != "catch")(input)
}

fn value_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(char('v'), digit1))(input)
}

fn opcode(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_lowercase() || c == '-')(input)
}

fn word(input: &str) -> IResult<&str, &str> {
    take_till1(char::is_whitespace)(input)
}

fn operand(input: &str) -> IResult<&str, Operand> {
    alt((
        map(
            delimited(char('"'), take_till(|c: char| c == '"'), char('"')),
            |s: &str| Operand::Str(s.to_string()),
        ),
        map(word, |w: &str| {
            if all_consuming(value_name)(w).is_ok() {
                Operand::Value(w.to_string())
            } else {
                Operand::Word(w.to_string())
            }
        }),
    ))(input)
}

fn destination(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    map(
        tuple((
            value_name,
            opt(delimited(char('['), take_till1(|c: char| c == ']'), char(']'))),
            space0,
            char('='),
            space0,
        )),
        |(value, local, _, _, _)| (value, local),
    )(input)
}

fn instr_line(input: &str) -> IResult<&str, InstrLine> {
    map(
        tuple((
            opt(terminated(name, pair(char(':'), space1))),
            opt(destination),
            opcode,
            many0(preceded(space1, operand)),
            space0,
        )),
        |(label, dest, opcode, operands, _)| InstrLine {
            label: label.map(str::to_string),
            dest: dest.map(|(value, local)| (value.to_string(), local.map(str::to_string))),
            opcode: opcode.to_string(),
            operands,
        },
    )(input)
}

type BlockHeader<'a> = (&'a str, Vec<&'a str>, Vec<&'a str>);

fn block_header(input: &str) -> IResult<&str, BlockHeader> {
    map(
        tuple((
            preceded(pair(tag(".block"), space1), block_name),
            opt(preceded(
                pair(space1, tag("->")),
                many1(preceded(space1, block_name)),
            )),
            opt(preceded(
                pair(space1, tag("catch")),
                many1(preceded(space1, block_name)),
            )),
            space0,
        )),
        |(block, successors, handlers, _)| {
            (
                block,
                successors.unwrap_or_default(),
                handlers.unwrap_or_default(),
            )
        },
    )(input)
}

fn descriptor(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while(|c: char| c == '['),
        alt((
            recognize(tuple((char('L'), take_until(";"), char(';')))),
            recognize(one_of("ZBSCIJFD")),
        )),
    ))(input)
}

fn descriptors(input: &str) -> IrResult<Vec<Type>> {
    let (_, list) = all_consuming(many0(descriptor))(input)
        .finish()
        .map_err(|e: nom::error::Error<&str>| IrError::Conversion {
            from: format!("&str ({:?})", e.input),
            to: "Vec<Type>".to_string(),
        })?;
    list.into_iter().map(Type::try_from).collect()
}

/// Splits `name(params)ret` into its parts.
fn signature(s: &str) -> IrResult<(&str, Vec<Type>, Type)> {
    let conversion_error = || IrError::Conversion {
        from: format!("&str ({s:?})"),
        to: "method signature".to_string(),
    };
    let open = s.find('(').ok_or_else(conversion_error)?;
    let close = s.find(')').ok_or_else(conversion_error)?;
    if close < open || open == 0 {
        return Err(conversion_error());
    }
    let parameters_types = descriptors(&s[open + 1..close])?;
    let return_type = Type::try_from(&s[close + 1..])?;
    Ok((&s[..open], parameters_types, return_type))
}

fn class_name(descriptor: &str) -> IrResult<String> {
    Type::try_from(descriptor)?
        .as_class_name()
        .map(str::to_string)
}

impl TryFrom<&str> for MethodDescr {
    type Error = IrError;

    fn try_from(s: &str) -> IrResult<Self> {
        let (definer, rest) = s.split_once("->").ok_or_else(|| IrError::Conversion {
            from: format!("&str ({s:?})"),
            to: "MethodDescr".to_string(),
        })?;
        let (name, parameters_types, return_type) = signature(rest)?;
        Ok(Self::new(
            &class_name(definer)?,
            name,
            parameters_types,
            return_type,
        ))
    }
}

impl TryFrom<&str> for FieldDescr {
    type Error = IrError;

    fn try_from(s: &str) -> IrResult<Self> {
        let conversion_error = || IrError::Conversion {
            from: format!("&str ({s:?})"),
            to: "FieldDescr".to_string(),
        };
        let (definer, rest) = s.split_once("->").ok_or_else(conversion_error)?;
        let (name, type_) = rest.split_once(':').ok_or_else(conversion_error)?;
        if name.is_empty() {
            return Err(conversion_error());
        }
        Ok(Self::new(
            &class_name(definer)?,
            name,
            Type::try_from(type_)?,
        ))
    }
}

fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => (),
        }
    }
    line
}

#[derive(Debug, Default)]
struct CodeLines {
    blocks: Vec<BlockLines>,
}

impl CodeLines {
    fn push_line(&mut self, line: usize, text: &str) -> IrResult<()> {
        if text.starts_with(".block") {
            let (_, (name, successors, catch_handlers)) = all_consuming(block_header)(text)
                .finish()
                .map_err(|e| syntax(line, format!("invalid block header near {:?}", e.input)))?;
            self.blocks.push(BlockLines {
                line,
                name: name.to_string(),
                successors: successors.into_iter().map(str::to_string).collect(),
                catch_handlers: catch_handlers.into_iter().map(str::to_string).collect(),
                instrs: Vec::new(),
            });
            return Ok(());
        }
        let block = self
            .blocks
            .last_mut()
            .ok_or_else(|| syntax(line, "instruction outside of any block"))?;
        let (_, instr) = all_consuming(instr_line)(text)
            .finish()
            .map_err(|e| syntax(line, format!("invalid instruction near {:?}", e.input)))?;
        block.instrs.push((line, instr));
        Ok(())
    }

    fn build(self) -> IrResult<Code> {
        let mut code = Code::new();

        let mut block_ids = BTreeMap::new();
        for block in &self.blocks {
            if block_ids
                .insert(block.name.clone(), code.add_block())
                .is_some()
            {
                return Err(syntax(block.line, format!("block {} defined twice", block.name)));
            }
        }
        let lookup_block = |name: &String| {
            block_ids
                .get(name)
                .copied()
                .ok_or_else(|| IrError::UnknownBlock(name.clone()))
        };
        for block in &self.blocks {
            let from = lookup_block(&block.name)?;
            for succ in &block.successors {
                code.add_edge(from, lookup_block(succ)?);
            }
            for handler in &block.catch_handlers {
                code.add_catch_handler(from, lookup_block(handler)?);
            }
        }

        // values are numbered in definition order
        let mut values = BTreeMap::new();
        for block in &self.blocks {
            for (line, instr) in &block.instrs {
                if let Some((name, local)) = &instr.dest {
                    let id = code.create_value(TypeElement::Bottom, local.clone());
                    if values.insert(name.clone(), id).is_some() {
                        return Err(syntax(*line, format!("{name} defined twice")));
                    }
                }
            }
        }

        let mut labels = BTreeMap::new();
        for block in &self.blocks {
            let block_id = lookup_block(&block.name)?;
            for (line, instr) in &block.instrs {
                let line = *line;
                let ins = instr
                    .operands
                    .iter()
                    .filter_map(|operand| match operand {
                        Operand::Value(name) => Some(name),
                        _ => None,
                    })
                    .map(|name| {
                        values
                            .get(name)
                            .copied()
                            .ok_or_else(|| IrError::UnknownValue(name.clone()))
                    })
                    .collect::<IrResult<Vec<ValueId>>>()?;
                let out = instr
                    .dest
                    .as_ref()
                    .and_then(|(name, _)| values.get(name).copied());

                if instr.opcode == "phi" {
                    let out = out.ok_or_else(|| syntax(line, "phi without destination"))?;
                    if ins.is_empty() {
                        return Err(syntax(line, "phi without operands"));
                    }
                    code.add_phi(block_id, out, ins);
                    continue;
                }

                let args: Vec<&Operand> = instr
                    .operands
                    .iter()
                    .filter(|operand| !matches!(operand, Operand::Value(_)))
                    .collect();
                let kind = instr_kind(&instr.opcode, &args, ins.len(), &labels)
                    .map_err(|message| syntax(line, message))?;
                check_destination(&kind, out.is_some()).map_err(|message| syntax(line, message))?;
                let id = code.append_instruction(block_id, kind, ins, out);
                if let Some(label) = &instr.label {
                    if labels.insert(label.clone(), id).is_some() {
                        return Err(syntax(line, format!("label {label} defined twice")));
                    }
                }
            }
        }
        Ok(code)
    }
}

fn check_destination(kind: &InstrKind, has_destination: bool) -> Result<(), String> {
    let required = match kind {
        InstrKind::Invoke { method, .. } => {
            if *method.return_type() == Type::Void && has_destination {
                return Err(format!("{method} returns void"));
            }
            return Ok(());
        }
        InstrKind::If | InstrKind::Goto | InstrKind::Return | InstrKind::Throw => false,
        _ => true,
    };
    match (required, has_destination) {
        (true, false) => Err(format!("{} needs a destination", kind.opcode())),
        (false, true) => Err(format!("{} has no result", kind.opcode())),
        _ => Ok(()),
    }
}

fn instr_kind(
    opcode: &str,
    args: &[&Operand],
    values: usize,
    labels: &BTreeMap<String, InstrId>,
) -> Result<InstrKind, String> {
    let arity = |expected: usize, words: usize| {
        if values != expected {
            Err(format!(
                "{opcode} expects {expected} value operand(s), found {values}"
            ))
        } else if args.len() > words {
            Err(format!("too many operands for {opcode}"))
        } else {
            Ok(())
        }
    };
    let word = |i: usize| match args.get(i) {
        Some(Operand::Word(w)) => Ok(w.as_str()),
        _ => Err(format!("missing operand for {opcode}")),
    };
    let type_at = |i: usize| word(i).and_then(|w| Type::try_from(w).map_err(|e| e.to_string()));
    let number = |i: usize| {
        word(i).and_then(|w| w.parse::<i64>().map_err(|e| format!("{w:?}: {e}")))
    };

    let kind = match opcode {
        "argument" => {
            arity(0, 0)?;
            InstrKind::Argument
        }
        "const" => {
            arity(0, 1)?;
            InstrKind::Const(Constant::Int(number(0)?))
        }
        "const-wide" => {
            arity(0, 1)?;
            InstrKind::Const(Constant::Long(number(0)?))
        }
        "const-float" => {
            arity(0, 1)?;
            let w = word(0)?;
            InstrKind::Const(Constant::Float(
                w.parse().map_err(|e| format!("{w:?}: {e}"))?,
            ))
        }
        "const-double" => {
            arity(0, 1)?;
            let w = word(0)?;
            InstrKind::Const(Constant::Double(
                w.parse().map_err(|e| format!("{w:?}: {e}"))?,
            ))
        }
        "const-string" => {
            arity(0, 1)?;
            match args.first() {
                Some(Operand::Str(s)) => InstrKind::Const(Constant::String(s.clone())),
                _ => return Err("const-string expects a string literal".to_string()),
            }
        }
        "const-null" => {
            arity(0, 0)?;
            InstrKind::Const(Constant::Null)
        }
        "const-class" => {
            arity(0, 1)?;
            InstrKind::Const(Constant::Class(type_at(0)?))
        }
        "new-instance" => {
            arity(0, 1)?;
            let t = type_at(0)?;
            let name = t.as_class_name().map_err(|e| e.to_string())?;
            InstrKind::NewInstance(name.to_string())
        }
        "new-array" => {
            arity(1, 1)?;
            let t = type_at(0)?;
            if !matches!(t, Type::Array(_, _)) {
                return Err(format!("{t} is not an array type"));
            }
            InstrKind::NewArray(t)
        }
        "check-cast" => {
            arity(1, 1)?;
            InstrKind::CheckCast(type_at(0)?)
        }
        "instance-of" => {
            arity(1, 1)?;
            InstrKind::InstanceOf(type_at(0)?)
        }
        "array-length" => {
            arity(1, 0)?;
            InstrKind::ArrayLength
        }
        "aget" => {
            arity(2, 0)?;
            InstrKind::ArrayGet
        }
        "move" => {
            arity(1, 0)?;
            InstrKind::Move
        }
        "assume-non-null" => {
            arity(1, 1)?;
            let origin = match args.first() {
                Some(Operand::Word(label)) => Some(
                    labels
                        .get(label)
                        .copied()
                        .ok_or_else(|| IrError::UnknownLabel(label.clone()).to_string())?,
                ),
                Some(_) => return Err("invalid assumption origin".to_string()),
                None => None,
            };
            InstrKind::AssumeNonNull { origin }
        }
        "iget" => {
            arity(1, 1)?;
            InstrKind::InstanceGet(FieldDescr::try_from(word(0)?).map_err(|e| e.to_string())?)
        }
        "sget" => {
            arity(0, 1)?;
            InstrKind::StaticGet(FieldDescr::try_from(word(0)?).map_err(|e| e.to_string())?)
        }
        "if" => {
            if values == 2 {
                arity(2, 0)?;
            } else {
                arity(1, 0)?;
            }
            InstrKind::If
        }
        "goto" => {
            arity(0, 0)?;
            InstrKind::Goto
        }
        "return-void" => {
            arity(0, 0)?;
            InstrKind::Return
        }
        "return" => {
            arity(1, 0)?;
            InstrKind::Return
        }
        "throw" => {
            arity(1, 0)?;
            InstrKind::Throw
        }
        other => {
            let kind = InvokeKind::from_opcode(other).ok_or_else(|| format!("unknown opcode {other}"))?;
            let method = MethodDescr::try_from(word(0)?).map_err(|e| e.to_string())?;
            let expected = method.parameters_types().len() + usize::from(kind.has_receiver());
            arity(expected, 1)?;
            InstrKind::Invoke { kind, method }
        }
    };
    Ok(kind)
}

#[derive(Debug, Default)]
struct ProgramParser {
    classes: Vec<ClassDef>,
    class: Option<ClassDef>,
    method: Option<(usize, MethodDef, CodeLines)>,
}

impl ProgramParser {
    fn class_mut(&mut self, line: usize) -> IrResult<&mut ClassDef> {
        self.class
            .as_mut()
            .ok_or_else(|| syntax(line, "directive outside of any class"))
    }

    fn push_line(&mut self, line: usize, text: &str) -> IrResult<()> {
        let mut tokens = text.split_whitespace();
        let directive = tokens.next().unwrap_or_default();
        let last = text.split_whitespace().last().unwrap_or_default();

        match directive {
            ".class" => {
                if self.class.is_some() {
                    return Err(syntax(line, "nested class definition"));
                }
                let mut flags = ClassFlags::empty();
                let keywords: Vec<&str> = tokens.collect();
                let (name, keywords) = keywords
                    .split_last()
                    .ok_or_else(|| syntax(line, "missing class name"))?;
                for keyword in keywords {
                    flags |= ClassFlags::from_keyword(keyword)
                        .ok_or_else(|| syntax(line, format!("unknown class flag {keyword}")))?;
                }
                self.class = Some(ClassDef {
                    name: class_name(name).map_err(|e| syntax(line, e))?,
                    flags,
                    superclass: None,
                    interfaces: Vec::new(),
                    methods: Vec::new(),
                });
            }
            ".super" => {
                let name = class_name(last).map_err(|e| syntax(line, e))?;
                self.class_mut(line)?.superclass = Some(name);
            }
            ".implements" => {
                let name = class_name(last).map_err(|e| syntax(line, e))?;
                self.class_mut(line)?.interfaces.push(name);
            }
            ".method" => {
                if self.method.is_some() {
                    return Err(syntax(line, "nested method definition"));
                }
                let definer = self.class_mut(line)?.name.clone();
                let keywords: Vec<&str> = tokens.collect();
                let (sig, keywords) = keywords
                    .split_last()
                    .ok_or_else(|| syntax(line, "missing method signature"))?;
                let mut flags = MethodFlags::empty();
                for keyword in keywords {
                    flags |= MethodFlags::from_keyword(keyword)
                        .ok_or_else(|| syntax(line, format!("unknown method flag {keyword}")))?;
                }
                let (name, parameters_types, return_type) =
                    signature(sig).map_err(|e| syntax(line, e))?;
                let method = MethodDef {
                    descriptor: MethodDescr::new(&definer, name, parameters_types, return_type),
                    flags,
                    code: None,
                };
                self.method = Some((line, method, CodeLines::default()));
            }
            ".end" => match last {
                "method" => {
                    let (_, mut method, lines) = self
                        .method
                        .take()
                        .ok_or_else(|| syntax(line, "no method to end"))?;
                    if !lines.blocks.is_empty() {
                        method.code = Some(lines.build()?);
                    }
                    self.class_mut(line)?.methods.push(method);
                }
                "class" => {
                    if self.method.is_some() {
                        return Err(syntax(line, "unterminated method"));
                    }
                    let class = self
                        .class
                        .take()
                        .ok_or_else(|| syntax(line, "no class to end"))?;
                    self.classes.push(class);
                }
                other => return Err(syntax(line, format!("unexpected .end {other}"))),
            },
            _ => {
                let (_, _, lines) = self
                    .method
                    .as_mut()
                    .ok_or_else(|| syntax(line, "code outside of any method"))?;
                lines.push_line(line, text)?;
            }
        }
        Ok(())
    }

    fn finish(self, last_line: usize) -> IrResult<Program> {
        if let Some((line, method, _)) = self.method {
            return Err(syntax(
                line,
                format!("method {} is not terminated", method.descriptor.name()),
            ));
        }
        if let Some(class) = self.class {
            return Err(syntax(
                last_line,
                format!("class {} is not terminated", class.name),
            ));
        }
        Ok(Program {
            classes: self.classes,
        })
    }
}

/// Parses a whole program.
pub fn parse_program(input: &str) -> IrResult<Program> {
    let mut parser = ProgramParser::default();
    let mut last_line = 0;
    for (index, raw) in input.lines().enumerate() {
        last_line = index + 1;
        let text = strip_comment(raw).trim();
        if !text.is_empty() {
            parser.push_line(last_line, text)?;
        }
    }
    parser.finish(last_line)
}

/// Parses a single method body, made of blocks only.
pub fn parse_code(input: &str) -> IrResult<Code> {
    let mut lines = CodeLines::default();
    for (index, raw) in input.lines().enumerate() {
        let text = strip_comment(raw).trim();
        if !text.is_empty() {
            lines.push_line(index + 1, text)?;
        }
    }
    lines.build()
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, class) in self.classes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{class}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, ".class {}L{};", self.flags, self.name)?;
        if let Some(superclass) = &self.superclass {
            writeln!(f, ".super L{superclass};")?;
        }
        for interface in &self.interfaces {
            writeln!(f, ".implements L{interface};")?;
        }
        for method in &self.methods {
            write!(f, "{method}")?;
        }
        writeln!(f, ".end class")
    }
}

impl fmt::Display for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, ".method {}{}(", self.flags, self.descriptor.name())?;
        for t in self.descriptor.parameters_types() {
            write!(f, "{t}")?;
        }
        writeln!(f, "){}", self.descriptor.return_type())?;
        if let Some(code) = &self.code {
            write!(f, "{code}")?;
        }
        writeln!(f, ".end method")
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let labelled: BTreeSet<InstrId> = self
            .instructions()
            .filter_map(|instr| match instr.kind() {
                InstrKind::AssumeNonNull { origin } => *origin,
                _ => None,
            })
            .collect();

        for block in self.blocks() {
            write!(f, ".block {}", block.id())?;
            if !block.successors().is_empty() {
                write!(f, " ->")?;
                for succ in block.successors() {
                    write!(f, " {succ}")?;
                }
            }
            if block.has_catch_handlers() {
                write!(f, " catch")?;
                for handler in block.catch_handlers() {
                    write!(f, " {handler}")?;
                }
            }
            writeln!(f)?;

            for phi in block.phis() {
                write!(f, "    ")?;
                self.fmt_destination(f, *phi)?;
                write!(f, "phi")?;
                for operand in self.phi_operands(*phi) {
                    write!(f, " {operand}")?;
                }
                writeln!(f)?;
            }
            for id in block.instructions() {
                write!(f, "    ")?;
                if labelled.contains(id) {
                    write!(f, "{id}: ")?;
                }
                self.fmt_instruction(f, *id)?;
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl Code {
    fn fmt_destination(&self, f: &mut fmt::Formatter, value: ValueId) -> fmt::Result {
        write!(f, "{value}")?;
        if let Some(local) = self.value(value).local() {
            write!(f, "[{local}]")?;
        }
        write!(f, " = ")
    }

    fn fmt_instruction(&self, f: &mut fmt::Formatter, id: InstrId) -> fmt::Result {
        let instr = self.instr(id);
        if let Some(out) = instr.out() {
            self.fmt_destination(f, out)?;
        }
        match instr.kind() {
            InstrKind::Const(constant) => return write!(f, "{constant}"),
            InstrKind::Return if instr.ins().is_empty() => return write!(f, "return-void"),
            kind => write!(f, "{}", kind.opcode())?,
        }
        for value in instr.ins() {
            write!(f, " {value}")?;
        }
        match instr.kind() {
            InstrKind::NewInstance(name) => write!(f, " L{name};"),
            InstrKind::NewArray(t) | InstrKind::CheckCast(t) | InstrKind::InstanceOf(t) => {
                write!(f, " {t}")
            }
            InstrKind::AssumeNonNull {
                origin: Some(origin),
            } => write!(f, " {origin}"),
            InstrKind::Invoke { method, .. } => write!(f, " {method}"),
            InstrKind::InstanceGet(field) | InstrKind::StaticGet(field) => write!(f, " {field}"),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = r#"
# a small program
.class public interface abstract Lcom/example/Shape;
.super Ljava/lang/Object;
.method public abstract area()D
.end method
.end class

.class public Lcom/example/Square;
.super Ljava/lang/Object;
.implements Lcom/example/Shape;
.method public area()D
.block B0
    v0[this] = argument
    v1 = const-double 4.0
    return v1
.end method
.end class

.class public Lcom/example/Main;
.super Ljava/lang/Object;
.method public static main([Ljava/lang/String;)V
.block entry -> loop
    v0[args] = argument
    v1 = new-instance Lcom/example/Square;
    invoke-direct v1 Lcom/example/Square;-><init>()V
    v2 = const-string "a # not a comment"
    goto
.block loop -> loop exit catch handler
    v3 = phi v1 v4
    i0: v5 = invoke-interface v3 Lcom/example/Shape;->area()D
    v6 = assume-non-null v3 i0
    v4 = check-cast v6 Lcom/example/Square;
    if v0
.block exit
    return-void
.block handler
    return-void
.end method
.end class
"#;

    #[test]
    fn parse_classes() {
        let program = parse_program(PROGRAM).unwrap();
        assert_eq!(program.classes.len(), 3);

        let shape = program.class("com/example/Shape").unwrap();
        assert!(shape.is_interface());
        assert!(shape.methods[0].code.is_none());

        let square = program.class("com/example/Square").unwrap();
        assert_eq!(square.interfaces, vec!["com/example/Shape".to_string()]);
        assert_eq!(square.superclass.as_deref(), Some("java/lang/Object"));

        let main = program.class("com/example/Main").unwrap().method("main").unwrap();
        assert!(main.is_static());
        let code = main.code.as_ref().unwrap();
        assert_eq!(code.blocks_count(), 4);
        assert_eq!(code.instructions_count(), 11);
        assert_eq!(code.value(ValueId::from_index(0)).local(), Some("args"));
        code.is_consistent_ssa().unwrap();

        let loop_block = code.block(crate::BlockId::from_index(1));
        assert_eq!(loop_block.predecessors().len(), 2);
        assert_eq!(loop_block.phis().len(), 1);
        let assume = code.instr(loop_block.instructions()[1]);
        let invoke = loop_block.instructions()[0];
        assert_eq!(
            assume.kind(),
            &InstrKind::AssumeNonNull {
                origin: Some(invoke)
            }
        );
    }

    #[test]
    fn printing_is_stable() {
        let program = parse_program(PROGRAM).unwrap();
        let printed = program.to_string();
        let reparsed = parse_program(&printed).unwrap();
        assert_eq!(reparsed.to_string(), printed);
        assert!(printed.contains("const-string \"a # not a comment\""));
        assert!(printed.contains(": v4 = invoke-interface v3 Lcom/example/Shape;->area()D"));
    }

    #[test]
    fn syntax_errors_report_lines() {
        let err = parse_code(".block B0\n    v0 = argument\n    v1 = frobnicate v0\n").unwrap_err();
        assert!(matches!(err, IrError::Syntax { line: 3, .. }));

        let err = parse_code(".block B0\n    return v7\n").unwrap_err();
        assert!(matches!(err, IrError::UnknownValue(name) if name == "v7"));

        let err = parse_code(".block B0 -> B9\n    return-void\n").unwrap_err();
        assert!(matches!(err, IrError::UnknownBlock(_)));

        let err = parse_code(".block B0\n    invoke-static v0 La/A;->f()V\n").unwrap_err();
        assert!(matches!(err, IrError::UnknownValue(_)));

        let err = parse_code(".block B0\n    v0 = argument\n    invoke-static v0 La/A;->f()V\n")
            .unwrap_err();
        assert!(matches!(err, IrError::Syntax { line: 3, .. }));

        let err = parse_program(".class La/A;\n.method f()V\n").unwrap_err();
        assert!(matches!(err, IrError::Syntax { line: 2, .. }));
    }

    #[test]
    fn references() {
        let m = MethodDescr::try_from("La/B;->f(I[JLa/C;)La/D;").unwrap();
        assert_eq!(m.definer(), "a/B");
        assert_eq!(m.name(), "f");
        assert_eq!(m.parameters_types().len(), 3);
        assert_eq!(m.to_string(), "La/B;->f(I[JLa/C;)La/D;");
        assert!(MethodDescr::try_from("La/B;->(I)V").is_err());
        assert!(MethodDescr::try_from("a/B->f()V").is_err());

        let field = FieldDescr::try_from("La/B;->next:La/B;").unwrap();
        assert_eq!(field.type_(), &Type::class("a/B"));
    }
}
