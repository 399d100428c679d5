//! Group: comparison and logic.

use std::cmp::Ordering;

use lingo_common::Datum;

use crate::machine::LingoVM;

/// Lingo `=`: void against a number compares as zero, numbers compare by
/// value, strings and symbols ignore case.
pub fn lingo_equals(a: &Datum, b: &Datum) -> bool {
    match (a, b) {
        (Datum::Void, n) | (n, Datum::Void) if n.is_number() => n.to_float() == 0.0,
        (x, y) if x.is_number() && y.is_number() => x.to_float() == y.to_float(),
        (x, y) if x.is_textual() && y.is_textual() => {
            x.to_lingo_string().to_lowercase() == y.to_lingo_string().to_lowercase()
        }
        (Datum::Str(s), n) | (n, Datum::Str(s)) if n.is_number() => {
            s.trim().parse::<f64>().is_ok_and(|v| v == n.to_float())
        }
        _ => a == b,
    }
}

fn is_numeric_text(d: &Datum) -> bool {
    match d {
        Datum::Str(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}

/// Ordering for `<` and friends. Text that is not numeric compares
/// lexically without case; everything else numerically.
pub fn lingo_cmp(a: &Datum, b: &Datum) -> Option<Ordering> {
    let textual = a.is_textual() && b.is_textual();
    if textual && !(is_numeric_text(a) && is_numeric_text(b)) {
        let (x, y) = (a.to_lingo_string().to_lowercase(), b.to_lingo_string().to_lowercase());
        return Some(x.cmp(&y));
    }
    a.to_float().partial_cmp(&b.to_float())
}

impl LingoVM {
    pub(crate) fn exec_compare(&mut self, accept: fn(Ordering) -> bool) {
        let b = self.pop();
        let a = self.pop();
        let result = lingo_cmp(&a, &b).is_some_and(accept);
        self.push(Datum::bool(result));
    }

    pub(crate) fn exec_eq(&mut self, negate: bool) {
        let b = self.pop();
        let a = self.pop();
        self.push(Datum::bool(lingo_equals(&a, &b) != negate));
    }

    pub(crate) fn exec_logic(&mut self, op: fn(bool, bool) -> bool) {
        let b = self.pop();
        let a = self.pop();
        self.push(Datum::bool(op(a.truthy(), b.truthy())));
    }

    pub(crate) fn exec_not(&mut self) {
        let a = self.pop();
        self.push(Datum::bool(!a.truthy()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_rules() {
        assert!(lingo_equals(&Datum::Void, &Datum::Int(0)));
        assert!(!lingo_equals(&Datum::Void, &Datum::Int(1)));
        assert!(lingo_equals(&Datum::Int(2), &Datum::Float(2.0)));
        assert!(lingo_equals(&Datum::string("Hello"), &Datum::string("hELLO")));
        assert!(lingo_equals(&Datum::symbol("walk"), &Datum::string("WALK")));
        assert!(lingo_equals(&Datum::string("3"), &Datum::Int(3)));
        assert!(!lingo_equals(&Datum::string("x"), &Datum::Int(0)));
        assert!(lingo_equals(&Datum::point(1, 2), &Datum::point(1, 2)));
        assert!(!lingo_equals(&Datum::list(vec![]), &Datum::Void));
    }

    #[test]
    fn ordering_rules() {
        assert_eq!(lingo_cmp(&Datum::Int(2), &Datum::Float(2.5)), Some(Ordering::Less));
        assert_eq!(lingo_cmp(&Datum::string("10"), &Datum::string("9")), Some(Ordering::Greater));
        assert_eq!(lingo_cmp(&Datum::string("apple"), &Datum::string("Banana")), Some(Ordering::Less));
        assert_eq!(lingo_cmp(&Datum::Float(f64::NAN), &Datum::Int(1)), None);
    }
}
