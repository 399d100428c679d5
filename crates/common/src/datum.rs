//! Runtime value representation for the Lingo VM.
//!
//! `Datum` is the dynamic "any" of Lingo. Scalars and references are plain
//! values; lists, property lists, points and rects are shared handles, so two
//! holders of the same container observe each other's writes. Script
//! instances live in an [`InstanceHeap`] and are referred to by handle.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::chunk::ChunkKind;
use crate::instance::{InstanceHeap, InstanceId};

/// Reserved property linking a script instance to its ancestor.
pub const PROP_ANCESTOR: &str = "ancestor";

/// Ordered, string-keyed property map.
pub type PropMap = IndexMap<String, Datum>;

/// Shared handle to a list's elements.
pub type ListRef = Rc<RefCell<Vec<Datum>>>;

/// Shared handle to a property list's entries.
pub type PropListRef = Rc<RefCell<PropMap>>;

/// A 2D point. Mutations through one handle are visible to every holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// A rectangle given by its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Build a color from integer channels, clamping each to `0..=255`.
    pub fn clamped(r: i32, g: i32, b: i32) -> Self {
        let c = |v: i32| v.clamp(0, 255) as u8;
        Self {
            r: c(r),
            g: c(g),
            b: c(b),
        }
    }
}

/// A script cast member, addressed by cast library and member number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptRef {
    pub cast_lib: i32,
    pub member: i32,
}

impl ScriptRef {
    pub fn new(cast_lib: i32, member: i32) -> Self {
        Self { cast_lib, member }
    }
}

/// A chunk of a variable's string value, used for in-place chunk mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRef {
    /// Variable kind code (same encoding as the PUT opcode's low nibble).
    pub var_type: i32,
    /// Raw (pre-multiplied) variable index.
    pub index: i32,
    pub kind: ChunkKind,
    pub start: i32,
    pub end: i32,
}

/// Runtime value.
#[derive(Debug, Clone, Default)]
pub enum Datum {
    #[default]
    Void,
    /// Signed 32-bit integer. Arithmetic wraps.
    Int(i32),
    Float(f64),
    Str(Rc<str>),
    Symbol(Rc<str>),

    /// Sprite channel.
    Sprite(i32),
    CastMember {
        cast_lib: i32,
        member: i32,
    },
    CastLib(i32),
    Script(ScriptRef),
    Window(Rc<str>),
    Stage,
    Movie,
    Player,
    Xtra(Rc<str>),
    Timeout(Rc<str>),
    /// A variable slot, pushed by PUSH_VAR_REF.
    VarRef {
        var_type: i32,
        index: i32,
    },
    ChunkRef(ChunkRef),

    Point(Rc<RefCell<Point>>),
    Rect(Rc<RefCell<Rect>>),
    Color(Color),

    List(ListRef),
    PropList(PropListRef),
    /// Call arguments whose result the caller consumes.
    ArgList(ListRef),
    /// Call arguments whose result the caller discards.
    ArgListNoRet(ListRef),

    Instance(InstanceId),
}

impl Datum {
    pub fn string(s: impl Into<Rc<str>>) -> Datum {
        Datum::Str(s.into())
    }

    pub fn symbol(name: impl Into<Rc<str>>) -> Datum {
        Datum::Symbol(name.into())
    }

    /// Lingo booleans are the integers 1 and 0.
    pub fn bool(b: bool) -> Datum {
        Datum::Int(b as i32)
    }

    pub fn list(items: Vec<Datum>) -> Datum {
        Datum::List(Rc::new(RefCell::new(items)))
    }

    pub fn arg_list(items: Vec<Datum>) -> Datum {
        Datum::ArgList(Rc::new(RefCell::new(items)))
    }

    pub fn arg_list_no_ret(items: Vec<Datum>) -> Datum {
        Datum::ArgListNoRet(Rc::new(RefCell::new(items)))
    }

    pub fn prop_list(entries: PropMap) -> Datum {
        Datum::PropList(Rc::new(RefCell::new(entries)))
    }

    /// Build a property list from `(key, value)` pairs, keeping their order.
    pub fn prop_list_from<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Datum)>) -> Datum {
        Datum::prop_list(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn point(x: i32, y: i32) -> Datum {
        Datum::Point(Rc::new(RefCell::new(Point { x, y })))
    }

    pub fn rect(left: i32, top: i32, right: i32, bottom: i32) -> Datum {
        Datum::Rect(Rc::new(RefCell::new(Rect {
            left,
            top,
            right,
            bottom,
        })))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Datum::Void)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Datum::Int(_) | Datum::Float(_))
    }

    /// True for strings and symbols, which compare case-insensitively in EQ.
    pub fn is_textual(&self) -> bool {
        matches!(self, Datum::Str(_) | Datum::Symbol(_))
    }

    /// Elements of an argument list of either flavor.
    pub fn arg_items(&self) -> Option<Vec<Datum>> {
        match self {
            Datum::ArgList(items) | Datum::ArgListNoRet(items) => Some(items.borrow().clone()),
            _ => None,
        }
    }

    /// Lingo truthiness: void and zero are false, strings are true when non-empty,
    /// every other kind is true.
    pub fn truthy(&self) -> bool {
        match self {
            Datum::Void => false,
            Datum::Int(i) => *i != 0,
            Datum::Float(f) => *f != 0.0,
            Datum::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Integer coercion. Floats truncate; strings parse or yield 0.
    pub fn to_int(&self) -> i32 {
        match self {
            Datum::Int(i) => *i,
            Datum::Float(f) => *f as i32,
            Datum::Str(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    /// Float coercion. Strings parse or yield 0.0.
    pub fn to_float(&self) -> f64 {
        match self {
            Datum::Int(i) => *i as f64,
            Datum::Float(f) => *f,
            Datum::Str(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// String coercion as used by `&`, `put` and `string()`: void is empty,
    /// strings and symbols are bare, everything else uses its display form.
    pub fn to_lingo_string(&self) -> String {
        match self {
            Datum::Void => String::new(),
            Datum::Str(s) => s.to_string(),
            Datum::Symbol(s) => s.to_string(),
            other => other.to_string(),
        }
    }

    /// Internal kind name, used in traces and diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Datum::Void => "void",
            Datum::Int(_) => "int",
            Datum::Float(_) => "float",
            Datum::Str(_) => "string",
            Datum::Symbol(_) => "symbol",
            Datum::List(_) => "list",
            Datum::PropList(_) => "propList",
            Datum::Sprite(_) => "sprite",
            Datum::CastMember { .. } => "member",
            Datum::Instance(_) | Datum::Script(_) => "script",
            Datum::Point(_) => "point",
            Datum::Rect(_) => "rect",
            Datum::Color(_) => "color",
            Datum::Xtra(_) => "xtra",
            Datum::CastLib(_) => "castLib",
            Datum::Stage => "stage",
            Datum::Movie => "movie",
            Datum::Player => "player",
            Datum::Window(_) => "window",
            Datum::Timeout(_) => "timeout",
            Datum::VarRef { .. } => "varRef",
            Datum::ChunkRef(_) => "chunkRef",
            Datum::ArgList(_) => "argList",
            Datum::ArgListNoRet(_) => "argListNoRet",
        }
    }

    /// The name `ilk()` reports for this value.
    pub fn ilk(&self) -> &'static str {
        match self {
            Datum::Void => "void",
            Datum::Int(_) => "integer",
            Datum::Float(_) => "float",
            Datum::Str(_) => "string",
            Datum::Symbol(_) => "symbol",
            Datum::List(_) => "list",
            Datum::PropList(_) => "propList",
            Datum::Point(_) => "point",
            Datum::Rect(_) => "rect",
            Datum::Color(_) => "color",
            Datum::Sprite(_) => "sprite",
            Datum::CastMember { .. } => "member",
            Datum::CastLib(_) => "castLib",
            Datum::Instance(_) => "instance",
            Datum::Script(_) => "script",
            Datum::Xtra(_) => "xtra",
            Datum::Stage => "stage",
            Datum::Window(_) => "window",
            _ => "object",
        }
    }

    /// Copy containers structurally.
    ///
    /// Points and rects get fresh cells; lists, property lists and argument
    /// lists are copied element by element. A script instance is copied into a
    /// new heap slot with a shallow clone of its property map, so `ancestor`
    /// targets are shared rather than copied. Every other kind is returned as is.
    pub fn deep_copy(&self, heap: &mut InstanceHeap) -> Datum {
        match self {
            Datum::Point(p) => Datum::Point(Rc::new(RefCell::new(*p.borrow()))),
            Datum::Rect(r) => Datum::Rect(Rc::new(RefCell::new(*r.borrow()))),
            Datum::List(items) => Datum::list(copy_items(items, heap)),
            Datum::ArgList(items) => Datum::arg_list(copy_items(items, heap)),
            Datum::ArgListNoRet(items) => Datum::arg_list_no_ret(copy_items(items, heap)),
            Datum::PropList(entries) => {
                let snapshot: Vec<(String, Datum)> = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                let copied = snapshot
                    .into_iter()
                    .map(|(k, v)| (k, v.deep_copy(heap)))
                    .collect();
                Datum::prop_list(copied)
            }
            Datum::Instance(id) => match heap.shallow_clone(*id) {
                Some(copy) => Datum::Instance(copy),
                None => self.clone(),
            },
            other => other.clone(),
        }
    }
}

fn copy_items(items: &ListRef, heap: &mut InstanceHeap) -> Vec<Datum> {
    let snapshot = items.borrow().clone();
    snapshot.iter().map(|item| item.deep_copy(heap)).collect()
}

// Floats compare by bit pattern so Datum stays usable as a structural key:
// NaN equals itself, +0.0 and -0.0 differ.
impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Datum::Void, Datum::Void) => true,
            (Datum::Int(a), Datum::Int(b)) => a == b,
            (Datum::Float(a), Datum::Float(b)) => a.to_bits() == b.to_bits(),
            (Datum::Str(a), Datum::Str(b)) => a == b,
            (Datum::Symbol(a), Datum::Symbol(b)) => a == b,
            (Datum::Sprite(a), Datum::Sprite(b)) => a == b,
            (
                Datum::CastMember {
                    cast_lib: c1,
                    member: m1,
                },
                Datum::CastMember {
                    cast_lib: c2,
                    member: m2,
                },
            ) => c1 == c2 && m1 == m2,
            (Datum::CastLib(a), Datum::CastLib(b)) => a == b,
            (Datum::Script(a), Datum::Script(b)) => a == b,
            (Datum::Window(a), Datum::Window(b)) => a == b,
            (Datum::Stage, Datum::Stage) => true,
            (Datum::Movie, Datum::Movie) => true,
            (Datum::Player, Datum::Player) => true,
            (Datum::Xtra(a), Datum::Xtra(b)) => a == b,
            (Datum::Timeout(a), Datum::Timeout(b)) => a == b,
            (
                Datum::VarRef {
                    var_type: t1,
                    index: i1,
                },
                Datum::VarRef {
                    var_type: t2,
                    index: i2,
                },
            ) => t1 == t2 && i1 == i2,
            (Datum::ChunkRef(a), Datum::ChunkRef(b)) => a == b,
            (Datum::Point(a), Datum::Point(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Datum::Rect(a), Datum::Rect(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Datum::Color(a), Datum::Color(b)) => a == b,
            (Datum::List(a), Datum::List(b))
            | (Datum::ArgList(a), Datum::ArgList(b))
            | (Datum::ArgListNoRet(a), Datum::ArgListNoRet(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Datum::PropList(a), Datum::PropList(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Datum::Instance(a), Datum::Instance(b)) => a == b,
            _ => false,
        }
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Self {
        Datum::Int(v)
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Datum::Float(v)
    }
}

impl From<bool> for Datum {
    fn from(v: bool) -> Self {
        Datum::bool(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::string(v)
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Datum::string(v)
    }
}

/// Canonical display form (what the message window shows).
impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Void => write!(f, "<Void>"),
            Datum::Int(i) => write!(f, "{i}"),
            Datum::Float(v) => write!(f, "{v:?}"),
            Datum::Str(s) => write!(f, "\"{s}\""),
            Datum::Symbol(s) => write!(f, "#{s}"),
            Datum::Sprite(ch) => write!(f, "sprite({ch})"),
            Datum::CastMember { cast_lib, member } => write!(f, "member({member}, {cast_lib})"),
            Datum::CastLib(n) => write!(f, "castLib({n})"),
            Datum::Script(r) => write!(f, "<script {}, {}>", r.member, r.cast_lib),
            Datum::Window(name) => write!(f, "window(\"{name}\")"),
            Datum::Stage => write!(f, "(the stage)"),
            Datum::Movie => write!(f, "(the movie)"),
            Datum::Player => write!(f, "(the player)"),
            Datum::Xtra(name) => write!(f, "<Xtra \"{name}\">"),
            Datum::Timeout(name) => write!(f, "timeout(\"{name}\")"),
            Datum::VarRef { var_type, index } => write!(f, "<varref:{var_type},{index}>"),
            Datum::ChunkRef(c) => write!(f, "<chunkref:{}[{}..{}]>", c.kind.name(), c.start, c.end),
            Datum::Point(p) => {
                let p = p.borrow();
                write!(f, "point({}, {})", p.x, p.y)
            }
            Datum::Rect(r) => {
                let r = r.borrow();
                write!(f, "rect({}, {}, {}, {})", r.left, r.top, r.right, r.bottom)
            }
            Datum::Color(c) => write!(f, "color({}, {}, {})", c.r, c.g, c.b),
            Datum::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Datum::PropList(entries) => {
                let entries = entries.borrow();
                if entries.is_empty() {
                    return write!(f, "[:]");
                }
                write!(f, "[")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "#{key}: {value}")?;
                }
                write!(f, "]")
            }
            Datum::ArgList(items) => write!(f, "<arglist:{}>", items.borrow().len()),
            Datum::ArgListNoRet(items) => write!(f, "<arglist-noret:{}>", items.borrow().len()),
            Datum::Instance(id) => write!(f, "<script instance {}>", id.index()),
        }
    }
}
