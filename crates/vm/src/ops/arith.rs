//! Group: arithmetic.
//!
//! If either operand is a float the result is a float, otherwise integer
//! arithmetic wraps. Points, rects and lists combine element-wise.

use lingo_common::{Datum, Instruction};

use crate::error::VmError;
use crate::machine::LingoVM;

/// Operators that share the promotion rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
}

impl ArithOp {
    fn ints(self, a: i32, b: i32) -> i32 {
        match self {
            ArithOp::Add => a.wrapping_add(b),
            ArithOp::Sub => a.wrapping_sub(b),
            ArithOp::Mul => a.wrapping_mul(b),
        }
    }

    fn floats(self, a: f64, b: f64) -> f64 {
        match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
        }
    }
}

/// A float, or a string that only parses as one.
fn is_floaty(d: &Datum) -> bool {
    match d {
        Datum::Float(_) => true,
        Datum::Str(s) => {
            let s = s.trim();
            s.parse::<i32>().is_err() && s.parse::<f64>().is_ok()
        }
        _ => false,
    }
}

fn scalar(op: ArithOp, a: &Datum, b: &Datum) -> Datum {
    if is_floaty(a) || is_floaty(b) {
        Datum::Float(op.floats(a.to_float(), b.to_float()))
    } else {
        Datum::Int(op.ints(a.to_int(), b.to_int()))
    }
}

/// Components of a point-like operand: a point, a list of two, or a scalar
/// applied to both axes.
fn point_parts(d: &Datum) -> [i32; 2] {
    match d {
        Datum::Point(p) => {
            let p = *p.borrow();
            [p.x, p.y]
        }
        Datum::List(items) => {
            let items = items.borrow();
            [0, 1].map(|i| items.get(i).map_or(0, Datum::to_int))
        }
        other => [other.to_int(); 2],
    }
}

fn rect_parts(d: &Datum) -> [i32; 4] {
    match d {
        Datum::Rect(r) => {
            let r = *r.borrow();
            [r.left, r.top, r.right, r.bottom]
        }
        Datum::List(items) => {
            let items = items.borrow();
            [0, 1, 2, 3].map(|i| items.get(i).map_or(0, Datum::to_int))
        }
        other => [other.to_int(); 4],
    }
}

/// Apply `op` with Lingo's promotion rules.
pub fn combine(op: ArithOp, a: &Datum, b: &Datum) -> Datum {
    match (a, b) {
        (Datum::Point(_), _) | (Datum::List(_), Datum::Point(_)) => {
            let (pa, pb) = (point_parts(a), point_parts(b));
            Datum::point(op.ints(pa[0], pb[0]), op.ints(pa[1], pb[1]))
        }
        (Datum::Rect(_), _) | (Datum::List(_), Datum::Rect(_)) => {
            let (ra, rb) = (rect_parts(a), rect_parts(b));
            Datum::rect(
                op.ints(ra[0], rb[0]),
                op.ints(ra[1], rb[1]),
                op.ints(ra[2], rb[2]),
                op.ints(ra[3], rb[3]),
            )
        }
        (Datum::List(xs), Datum::List(ys)) => {
            let (xs, ys) = (xs.borrow().clone(), ys.borrow().clone());
            Datum::list(xs.iter().zip(&ys).map(|(x, y)| combine(op, x, y)).collect())
        }
        (Datum::List(xs), _) => {
            let xs = xs.borrow().clone();
            Datum::list(xs.iter().map(|x| combine(op, x, b)).collect())
        }
        (_, Datum::List(ys)) => {
            let ys = ys.borrow().clone();
            Datum::list(ys.iter().map(|y| combine(op, a, y)).collect())
        }
        _ => scalar(op, a, b),
    }
}

pub fn add(a: &Datum, b: &Datum) -> Datum {
    combine(ArithOp::Add, a, b)
}

pub fn sub(a: &Datum, b: &Datum) -> Datum {
    combine(ArithOp::Sub, a, b)
}

pub fn mul(a: &Datum, b: &Datum) -> Datum {
    combine(ArithOp::Mul, a, b)
}

/// Division; `None` when the divisor is zero. Integers divide truncating.
pub fn div(a: &Datum, b: &Datum) -> Option<Datum> {
    if b.to_float() == 0.0 {
        return None;
    }
    Some(if is_floaty(a) || is_floaty(b) {
        Datum::Float(a.to_float() / b.to_float())
    } else {
        Datum::Int(a.to_int().wrapping_div(b.to_int()))
    })
}

/// Remainder; `None` when the divisor is zero.
pub fn modulo(a: &Datum, b: &Datum) -> Option<Datum> {
    if is_floaty(a) || is_floaty(b) {
        let d = b.to_float();
        (d != 0.0).then(|| Datum::Float(a.to_float() % d))
    } else {
        let d = b.to_int();
        (d != 0).then(|| Datum::Int(a.to_int().wrapping_rem(d)))
    }
}

pub fn negate(a: &Datum) -> Datum {
    match a {
        Datum::Point(p) => {
            let p = *p.borrow();
            Datum::point(p.x.wrapping_neg(), p.y.wrapping_neg())
        }
        _ if is_floaty(a) => Datum::Float(-a.to_float()),
        _ => Datum::Int(a.to_int().wrapping_neg()),
    }
}

impl LingoVM {
    pub(crate) fn exec_arith(&mut self, op: ArithOp) {
        let b = self.pop();
        let a = self.pop();
        self.push(combine(op, &a, &b));
    }

    pub(crate) fn exec_div(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let b = self.pop();
        let a = self.pop();
        let result = div(&a, &b).ok_or_else(|| VmError::DivisionByZero {
            handler: self.current_handler_name(),
            at: instr.offset,
        })?;
        self.push(result);
        Ok(())
    }

    pub(crate) fn exec_mod(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let b = self.pop();
        let a = self.pop();
        let result = modulo(&a, &b).ok_or_else(|| VmError::ModuloByZero {
            handler: self.current_handler_name(),
            at: instr.offset,
        })?;
        self.push(result);
        Ok(())
    }

    pub(crate) fn exec_inv(&mut self) {
        let a = self.pop();
        self.push(negate(&a));
    }
}
