//! Comparator capability used by sorting, searching and the ordered map

use super::descriptor::Value;
use super::tag::TypeTag;
use std::cmp::Ordering;

/// Three-way comparison over `T`
///
/// Any `Fn(&T, &T) -> Ordering` closure is a comparator. Comparators over
/// [`Value`] see both tags and are responsible for checking compatibility
/// before interpreting bytes; for incompatible tags they must still return a
/// consistent total order, which is implementation-defined and carries no
/// meaning.
pub trait Comparator<T: ?Sized> {
    /// Compare `left` against `right`
    fn compare(&self, left: &T, right: &T) -> Ordering;
}

impl<T: ?Sized, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, left: &T, right: &T) -> Ordering {
        self(left, right)
    }
}

/// Default comparator: raw bytes, with C-string semantics for text
///
/// - Two `[u8]` blobs compare lexicographically (common prefix, then length).
/// - Two `CharPtr` values compare their bytes up to the first NUL, so a key
///   stored with its terminator matches a probe without one.
/// - Any other pair compares payload bytes lexicographically, then the tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawComparator;

/// Comparator used by value containers when none is supplied
pub type ValueComparator = RawComparator;

impl Comparator<[u8]> for RawComparator {
    #[inline]
    fn compare(&self, left: &[u8], right: &[u8]) -> Ordering {
        left.cmp(right)
    }
}

impl Comparator<Value> for RawComparator {
    fn compare(&self, left: &Value, right: &Value) -> Ordering {
        if left.tag() == TypeTag::CharPtr && right.tag() == TypeTag::CharPtr {
            return left.c_bytes().cmp(right.c_bytes());
        }
        left.data()
            .cmp(right.data())
            .then_with(|| left.tag().cmp(&right.tag()))
    }
}

/// Comparator that reverses another one
#[derive(Debug, Clone, Copy, Default)]
pub struct Reverse<C>(pub C);

impl<T: ?Sized, C: Comparator<T>> Comparator<T> for Reverse<C> {
    #[inline]
    fn compare(&self, left: &T, right: &T) -> Ordering {
        self.0.compare(right, left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_bytes() {
        let cmp = RawComparator;
        assert_eq!(cmp.compare(&b"abc"[..], &b"abd"[..]), Ordering::Less);
        assert_eq!(cmp.compare(&b"ab"[..], &b"abc"[..]), Ordering::Less);
        assert_eq!(cmp.compare(&b""[..], &b""[..]), Ordering::Equal);
    }

    #[test]
    fn test_c_string_semantics() {
        let cmp = RawComparator;
        let stored = Value::from_str("A");
        let probe = Value::new(TypeTag::CharPtr, b"A");
        assert_eq!(cmp.compare(&stored, &probe), Ordering::Equal);
        assert_eq!(
            cmp.compare(&Value::from_str("B"), &Value::from_str("AZ")),
            Ordering::Greater
        );
    }

    #[test]
    fn test_mixed_tags_total_order() {
        let cmp = RawComparator;
        let a = Value::new(TypeTag::Int32, &[1, 0, 0, 0]);
        let b = Value::new(TypeTag::UInt32, &[1, 0, 0, 0]);
        assert_ne!(cmp.compare(&a, &b), Ordering::Equal);
        assert_eq!(cmp.compare(&a, &b), cmp.compare(&b, &a).reverse());
    }

    #[test]
    fn test_closure_and_reverse() {
        let by_len = |l: &Value, r: &Value| l.size().cmp(&r.size());
        let short = Value::from_u8(1);
        let long = Value::from_u64(1);
        assert_eq!(by_len.compare(&short, &long), Ordering::Less);
        assert_eq!(Reverse(by_len).compare(&short, &long), Ordering::Greater);
    }
}
