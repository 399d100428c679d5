//! Listing printer: script library → annotated assembly text.
//!
//! The output reassembles to an equivalent library. Name operands print as
//! `#name`, literal operands as the literal, variable slots unscaled and jump
//! targets as generated `@L<offset>` labels. Each instruction carries its
//! byte offset and raw encoding in a trailing comment.

use std::collections::BTreeSet;
use std::fmt::Write;

use lingo_common::{Handler, Instruction, Literal, Opcode, Script, ScriptLibrary};

/// Column the offset comment starts at.
const COMMENT_COLUMN: usize = 32;

/// Opcodes whose argument is an index into the library name table.
fn takes_name(opcode: Opcode) -> bool {
    matches!(
        opcode,
        Opcode::PushSymb
            | Opcode::GetGlobal
            | Opcode::GetGlobal2
            | Opcode::SetGlobal
            | Opcode::SetGlobal2
            | Opcode::GetProp
            | Opcode::SetProp
            | Opcode::ExtCall
            | Opcode::ObjCall
            | Opcode::ObjCallV4
            | Opcode::TellCall
            | Opcode::NewObj
            | Opcode::GetMovieProp
            | Opcode::SetMovieProp
            | Opcode::GetObjProp
            | Opcode::SetObjProp
            | Opcode::GetChainedProp
            | Opcode::GetTopLevelProp
            | Opcode::TheBuiltin
    )
}

fn is_variable(opcode: Opcode) -> bool {
    matches!(
        opcode,
        Opcode::GetParam | Opcode::SetParam | Opcode::GetLocal | Opcode::SetLocal
    )
}

/// Absolute jump target of `instr`, for jump opcodes.
fn jump_target(instr: &Instruction) -> Option<i64> {
    let from = instr.offset as i64;
    let distance = i64::from(instr.argument);
    match instr.opcode {
        Opcode::Jmp | Opcode::JmpIfZ => Some(from + distance),
        Opcode::EndRepeat => Some(from - distance),
        _ => None,
    }
}

pub fn listing(library: &ScriptLibrary) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "library {} {:?} version={}",
        library.number, library.name, library.dir_version
    );
    if library.capital_x {
        out.push_str(" capitalx");
    }
    out.push('\n');

    for script in &library.scripts {
        write_script(&mut out, library, script);
    }
    out
}

fn write_script(out: &mut String, library: &ScriptLibrary, script: &Script) {
    let _ = write!(out, "script {} {}", script.member, script.kind.name());
    if !script.name.is_empty() {
        let _ = write!(out, " {:?}", script.name);
    }
    out.push('\n');

    let properties = library.property_names(script);
    if !properties.is_empty() {
        let _ = writeln!(out, "  property {}", properties.join(", "));
    }
    for handler in &script.handlers {
        write_handler(out, library, script, handler);
    }
    out.push_str("end\n");
}

fn names_of(library: &ScriptLibrary, ids: &[i32]) -> Vec<String> {
    ids.iter().map(|id| library.names.name_or_placeholder(*id)).collect()
}

fn write_handler(out: &mut String, library: &ScriptLibrary, script: &Script, handler: &Handler) {
    let _ = write!(out, "  handler {}", library.names.name_or_placeholder(handler.name_id));
    let args = names_of(library, &handler.arg_name_ids);
    if !args.is_empty() {
        let _ = write!(out, " {}", args.join(", "));
    }
    out.push('\n');
    let locals = names_of(library, &handler.local_name_ids);
    if !locals.is_empty() {
        let _ = writeln!(out, "    local {}", locals.join(", "));
    }

    let targets: BTreeSet<i64> = handler.instructions.iter().filter_map(jump_target).collect();
    let multiplier = library.variable_multiplier().max(1);

    for instr in &handler.instructions {
        if targets.contains(&(instr.offset as i64)) {
            let _ = writeln!(out, "    @L{}:", instr.offset);
        }
        let text = instruction_text(library, script, instr, multiplier);
        let bytes: Vec<String> = encoded(instr).iter().map(|b| format!("{b:02x}")).collect();
        let _ = writeln!(
            out,
            "    {text:<width$} ; {:04} [{}]",
            instr.offset,
            bytes.join(" "),
            width = COMMENT_COLUMN - 4
        );
    }
    let end = handler.bytecode_len() as i64;
    if targets.contains(&end) {
        let _ = writeln!(out, "    @L{end}:");
    }
    out.push_str("  end\n");
}

/// The instruction's bytes as stored: raw opcode byte then its argument.
fn encoded(instr: &Instruction) -> Vec<u8> {
    let mut bytes = vec![instr.raw];
    let width = instr.width() - 1;
    let arg = instr.argument.to_be_bytes();
    bytes.extend_from_slice(&arg[4 - width..]);
    bytes
}

fn instruction_text(library: &ScriptLibrary, script: &Script, instr: &Instruction, multiplier: i32) -> String {
    let mnemonic = instr.opcode.mnemonic();
    if !instr.opcode.takes_argument() {
        // Unknown bytes print as a comment so the listing still reassembles.
        if instr.opcode == Opcode::Invalid {
            return format!("; INVALID 0x{:02x}", instr.raw);
        }
        return mnemonic.to_string();
    }
    let operand = if let Some(target) = jump_target(instr) {
        format!("@L{target}")
    } else if takes_name(instr.opcode) {
        format!("#{}", library.names.name_or_placeholder(instr.argument))
    } else if is_variable(instr.opcode) {
        (instr.argument / multiplier).to_string()
    } else if instr.opcode == Opcode::PushCons {
        match usize::try_from(instr.argument).ok().and_then(|i| script.literals.get(i)) {
            Some(Literal::Str(s)) => format!("{s:?}"),
            Some(Literal::Int(n)) => n.to_string(),
            Some(Literal::Float(f)) => format!("{f:?}"),
            None => instr.argument.to_string(),
        }
    } else if instr.opcode == Opcode::PushFloat32 {
        format!("{:?}", f32::from_bits(instr.argument as u32))
    } else {
        instr.argument.to_string()
    };
    format!("{mnemonic} {operand}")
}
