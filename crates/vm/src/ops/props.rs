//! Group: properties.
//!
//! Receiver properties go through the ancestor chain. Object properties
//! depend on the kind of the popped object; cast members and libraries ask
//! the provider. `the` expressions read movie properties, falling back to a
//! small set of constants.

use std::f64::consts::PI;

use lingo_common::{ChunkKind, Datum, Instruction};

use crate::ancestor;
use crate::chunks;
use crate::dispatch::string::count_chunks;
use crate::machine::LingoVM;

/// Movie properties addressed by id in GET/SET with property type 0.
const MOVIE_PROP_IDS: [&str; 12] = [
    "floatPrecision",
    "mouseDownScript",
    "mouseUpScript",
    "keyDownScript",
    "keyUpScript",
    "timeoutScript",
    "short time",
    "abbr time",
    "long time",
    "short date",
    "abbr date",
    "long date",
];

/// Ids above this in GET type 0 select the last chunk of a string.
const LAST_MOVIE_PROP_ID: i32 = 0x0b;

/// Values of `the <name>` that need no movie.
pub fn builtin_constant(name: &str) -> Option<Datum> {
    let value = match name.to_ascii_lowercase().as_str() {
        "pi" => Datum::Float(PI),
        "true" => Datum::Int(1),
        "false" => Datum::Int(0),
        "void" => Datum::Void,
        "empty" | "emptystring" => Datum::string(""),
        "return" => Datum::string("\r"),
        "enter" => Datum::string("\n"),
        "tab" => Datum::string("\t"),
        "quote" => Datum::string("\""),
        "backspace" => Datum::string("\u{8}"),
        "space" => Datum::string(" "),
        _ => return None,
    };
    Some(value)
}

fn point_prop(d: &Datum, name: &str) -> Option<Datum> {
    let Datum::Point(p) = d else { return None };
    let p = *p.borrow();
    match name.to_ascii_lowercase().as_str() {
        "loch" | "x" => Some(Datum::Int(p.x)),
        "locv" | "y" => Some(Datum::Int(p.y)),
        _ => None,
    }
}

fn rect_prop(d: &Datum, name: &str) -> Option<Datum> {
    let Datum::Rect(r) = d else { return None };
    let r = *r.borrow();
    let v = match name.to_ascii_lowercase().as_str() {
        "left" => r.left,
        "top" => r.top,
        "right" => r.right,
        "bottom" => r.bottom,
        "width" => r.width(),
        "height" => r.height(),
        _ => return None,
    };
    Some(Datum::Int(v))
}

impl LingoVM {
    /// `the <name>` as a movie property.
    fn the_movie_prop(&self, name: &str) -> Datum {
        if let Some(value) = builtin_constant(name) {
            return value;
        }
        if name.eq_ignore_ascii_case("itemDelimiter") {
            return Datum::string(self.item_delimiter().to_string());
        }
        self.movie_prop(name)
    }

    fn member_prop(&self, cast_lib: i32, member: i32, name: &str) -> Datum {
        match self.provider() {
            Some(provider) => provider.member_prop(cast_lib, member, name),
            None => match name.to_ascii_lowercase().as_str() {
                "number" => Datum::Int((cast_lib << 16) | (member & 0xFFFF)),
                "membernum" => Datum::Int(member),
                "castlibnum" => Datum::Int(cast_lib),
                "castlib" => Datum::CastLib(cast_lib),
                _ => Datum::Void,
            },
        }
    }

    /// Property `name` of `obj`. The chained form (`obj.prop`) also indexes
    /// lists by number and matches property list keys without case.
    pub(crate) fn object_prop(&self, obj: &Datum, name: &str, chained: bool) -> Datum {
        let lower = name.to_ascii_lowercase();
        match obj {
            Datum::CastLib(n) => self
                .provider()
                .map(|p| p.cast_lib_prop(*n, name))
                .unwrap_or_default(),
            Datum::CastMember { cast_lib, member } => self.member_prop(*cast_lib, *member, name),
            Datum::Instance(id) => ancestor::get_property(self.heap(), *id, name),
            Datum::PropList(entries) => match lower.as_str() {
                "count" | "length" if !chained => Datum::Int(entries.borrow().len() as i32),
                "ilk" if !chained => Datum::symbol("propList"),
                _ => {
                    let entries = entries.borrow();
                    let found = if chained {
                        entries
                            .iter()
                            .find(|(k, _)| k.eq_ignore_ascii_case(name))
                            .map(|(_, v)| v)
                    } else {
                        entries.get(name)
                    };
                    found.cloned().unwrap_or_default()
                }
            },
            Datum::List(items) => match lower.as_str() {
                "count" | "length" => Datum::Int(items.borrow().len() as i32),
                "ilk" => Datum::symbol("list"),
                _ => name
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| items.borrow().get(i).cloned())
                    .unwrap_or_default(),
            },
            Datum::Str(s) => match lower.as_str() {
                "length" => Datum::Int(s.chars().count() as i32),
                "ilk" => Datum::symbol("string"),
                _ => Datum::Void,
            },
            Datum::Movie => self.the_movie_prop(name),
            Datum::Player => builtin_constant(name).unwrap_or_default(),
            Datum::Point(_) => point_prop(obj, name).unwrap_or_default(),
            Datum::Rect(_) => rect_prop(obj, name).unwrap_or_default(),
            Datum::Color(c) => match lower.as_str() {
                "red" => Datum::Int(i32::from(c.r)),
                "green" => Datum::Int(i32::from(c.g)),
                "blue" => Datum::Int(i32::from(c.b)),
                _ => Datum::Void,
            },
            _ => Datum::Void,
        }
    }

    fn set_object_prop(&mut self, obj: &Datum, name: &str, value: Datum) {
        let lower = name.to_ascii_lowercase();
        match obj {
            Datum::CastLib(n) => {
                if let Some(provider) = self.provider_mut() {
                    provider.set_cast_lib_prop(*n, name, value);
                }
            }
            Datum::CastMember { cast_lib, member } => {
                if let Some(provider) = self.provider_mut() {
                    provider.set_member_prop(*cast_lib, *member, name, value);
                }
            }
            Datum::Instance(id) => {
                self.note_variable_set("property", name, &value);
                ancestor::set_property(self.heap_mut(), *id, name, value);
            }
            Datum::PropList(entries) => {
                entries.borrow_mut().insert(name.to_string(), value);
            }
            Datum::Movie => self.set_movie_prop(name, value),
            Datum::Point(p) => {
                let v = value.to_int();
                let mut p = p.borrow_mut();
                match lower.as_str() {
                    "loch" | "x" => p.x = v,
                    "locv" | "y" => p.y = v,
                    _ => {}
                }
            }
            Datum::Rect(r) => {
                let v = value.to_int();
                let mut r = r.borrow_mut();
                match lower.as_str() {
                    "left" => r.left = v,
                    "top" => r.top = v,
                    "right" => r.right = v,
                    "bottom" => r.bottom = v,
                    _ => {}
                }
            }
            other => tracing::debug!(
                target: "lingo::vm",
                "cannot set #{name} on {}",
                other.type_name()
            ),
        }
    }

    pub(crate) fn exec_get_prop(&mut self, instr: &Instruction) {
        let name = self.resolve_name(instr.argument);
        let value = match self.receiver() {
            Datum::Instance(id) => ancestor::get_property(self.heap(), id, &name),
            _ => Datum::Void,
        };
        self.push(value);
    }

    pub(crate) fn exec_set_prop(&mut self, instr: &Instruction) {
        let name = self.resolve_name(instr.argument);
        let value = self.pop();
        if let Datum::Instance(id) = self.receiver() {
            self.note_variable_set("property", &name, &value);
            ancestor::set_property(self.heap_mut(), id, &name, value);
        }
    }

    pub(crate) fn exec_get_movie_prop(&mut self, instr: &Instruction) {
        let name = self.resolve_name(instr.argument);
        let value = self.the_movie_prop(&name);
        self.push(value);
    }

    pub(crate) fn exec_set_movie_prop(&mut self, instr: &Instruction) {
        let name = self.resolve_name(instr.argument);
        let value = self.pop();
        self.set_movie_prop(&name, value);
    }

    pub(crate) fn exec_get_obj_prop(&mut self, instr: &Instruction) {
        let name = self.resolve_name(instr.argument);
        let obj = self.pop();
        let value = self.object_prop(&obj, &name, false);
        self.push(value);
    }

    pub(crate) fn exec_set_obj_prop(&mut self, instr: &Instruction) {
        let name = self.resolve_name(instr.argument);
        let value = self.pop();
        let obj = self.pop();
        self.set_object_prop(&obj, &name, value);
    }

    pub(crate) fn exec_get_chained_prop(&mut self, instr: &Instruction) {
        let name = self.resolve_name(instr.argument);
        let obj = self.pop();
        let value = match &obj {
            Datum::Instance(_) if name.parse::<i32>().is_ok() => Datum::Void,
            _ => self.object_prop(&obj, &name, true),
        };
        self.push(value);
    }

    pub(crate) fn exec_get_top_level_prop(&mut self, instr: &Instruction) {
        let name = self.resolve_name(instr.argument);
        let value = match name.as_str() {
            "_player" => Datum::Player,
            "_movie" => Datum::Movie,
            _ => {
                tracing::warn!(target: "lingo::vm", "unknown top level property {name}");
                Datum::Void
            }
        };
        self.push(value);
    }

    /// `the <name>` forms that take an argument list.
    pub(crate) fn exec_the_builtin(&mut self, instr: &Instruction) {
        self.pop();
        let name = self.resolve_name(instr.argument);
        let value = match name.to_ascii_lowercase().as_str() {
            "paramcount" => self
                .current_scope()
                .map(|s| Datum::Int(s.args().len() as i32))
                .unwrap_or_default(),
            "result" => self
                .current_scope()
                .map(|s| s.return_value().clone())
                .unwrap_or_default(),
            _ => match self.movie_prop(&name) {
                Datum::Void => builtin_constant(&name).unwrap_or_default(),
                value => value,
            },
        };
        self.push(value);
    }

    pub(crate) fn exec_get_field(&mut self) {
        let cast = self.pop();
        let field = self.pop();
        let text = self.field_text(&cast, &field);
        self.push(Datum::string(text));
    }

    /// Property by numeric id. The argument selects the property family.
    pub(crate) fn exec_get(&mut self, instr: &Instruction) {
        let id = self.pop().to_int();
        let delimiter = self.item_delimiter();
        let value = match instr.argument {
            0x00 if id <= LAST_MOVIE_PROP_ID => usize::try_from(id)
                .ok()
                .and_then(|i| MOVIE_PROP_IDS.get(i))
                .map(|name| self.movie_prop(name))
                .unwrap_or_default(),
            0x00 => {
                let s = self.pop().to_lingo_string();
                match ChunkKind::from_code(id - LAST_MOVIE_PROP_ID) {
                    Some(kind) => Datum::string(chunks::last_chunk(&s, kind, delimiter)),
                    None => Datum::Void,
                }
            }
            0x01 => {
                let s = self.pop().to_lingo_string();
                match ChunkKind::from_code(id) {
                    Some(kind) => Datum::Int(count_chunks(&s, kind, delimiter) as i32),
                    None => Datum::Void,
                }
            }
            0x06 | 0x0b => {
                self.pop();
                Datum::Void
            }
            0x08 if id == 0x02 => {
                let cast_lib = self.pop().to_int();
                Datum::Int(self.provider().map_or(0, |p| p.member_count(cast_lib)))
            }
            other => {
                tracing::debug!(target: "lingo::vm", "GET: unsupported property type {other} id {id}");
                Datum::Void
            }
        };
        self.push(value);
    }

    pub(crate) fn exec_set(&mut self, instr: &Instruction) {
        let id = self.pop().to_int();
        let value = self.pop();
        match instr.argument {
            0x00 if id <= LAST_MOVIE_PROP_ID => {
                if let Some(name) = usize::try_from(id).ok().and_then(|i| MOVIE_PROP_IDS.get(i)) {
                    self.set_movie_prop(name, value);
                }
            }
            0x04 | 0x06 => {
                self.pop();
            }
            other => {
                tracing::debug!(target: "lingo::vm", "SET: unsupported property type {other} id {id}");
            }
        }
    }

    /// `sprite a intersects b` and `sprite a within b`. Without a stage
    /// there is nothing to overlap, so the test is always false.
    pub(crate) fn exec_sprite_overlap(&mut self, instr: &Instruction) {
        let second = self.pop();
        let first = self.pop();
        tracing::debug!(
            target: "lingo::vm",
            "{}: no stage, sprites {first} and {second} do not overlap",
            instr.opcode.mnemonic()
        );
        self.push(Datum::Int(0));
    }
}
