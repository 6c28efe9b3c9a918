//! Multi-bit arithmetic.
//!
//! Addition and subtraction ripple from the least significant bit (the last
//! index) to the most significant, one full adder or subtractor per column.
//! Carry and borrow out of the top bit are returned but the word itself
//! always wraps modulo `2^N`.

use crate::bits::{Bit, BitWord};

/// Add two words, returning `(result, carry_out)`.
pub fn add<const N: usize>(a: &BitWord<N>, b: &BitWord<N>) -> (BitWord<N>, Bit) {
    let mut result = BitWord::zero();
    let mut carry = Bit::Zero;

    for i in (0..N).rev() {
        let (sum, new_carry) = a.get(i).full_add(b.get(i), carry);
        result.set(i, sum);
        carry = new_carry;
    }

    (result, carry)
}

/// Subtract `b` from `a`, returning `(result, borrow_out)`.
pub fn subtract<const N: usize>(a: &BitWord<N>, b: &BitWord<N>) -> (BitWord<N>, Bit) {
    let mut result = BitWord::zero();
    let mut borrow = Bit::Zero;

    for i in (0..N).rev() {
        let (diff, new_borrow) = a.get(i).full_sub(b.get(i), borrow);
        result.set(i, diff);
        borrow = new_borrow;
    }

    (result, borrow)
}

/// Add one, returning `(result, carry_out)`.
pub fn increment<const N: usize>(a: &BitWord<N>) -> (BitWord<N>, Bit) {
    let mut one = BitWord::zero();
    if N > 0 {
        one.set(N - 1, Bit::One);
    }
    add(a, &one)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::Nibble;

    fn nib(v: u32) -> Nibble {
        Nibble::from_u32(v).unwrap()
    }

    #[test]
    fn test_add_basic() {
        let (result, carry) = add(&nib(5), &nib(3));
        assert_eq!(result.to_u32(), 8);
        assert!(carry.is_zero());
    }

    #[test]
    fn test_add_overflow_wraps() {
        let (result, carry) = add(&nib(9), &nib(8));
        assert_eq!(result.to_u32(), 1);
        assert!(carry.is_one());
    }

    #[test]
    fn test_subtract() {
        let (result, borrow) = subtract(&nib(7), &nib(2));
        assert_eq!(result.to_u32(), 5);
        assert!(borrow.is_zero());
    }

    #[test]
    fn test_subtract_underflow_wraps() {
        let (result, borrow) = subtract(&nib(2), &nib(3));
        assert_eq!(result.to_u32(), 15);
        assert!(borrow.is_one());

        let (result, _) = subtract(&nib(0), &nib(15));
        assert_eq!(result.to_u32(), 1);
    }

    #[test]
    fn test_exhaustive_nibble() {
        for a in 0..16u32 {
            for b in 0..16u32 {
                assert_eq!(add(&nib(a), &nib(b)).0.to_u32(), (a + b) % 16);
                assert_eq!(subtract(&nib(a), &nib(b)).0.to_u32(), (a + 16 - b) % 16);
            }
        }
    }

    #[test]
    fn test_increment_wraps() {
        assert_eq!(increment(&nib(6)).0.to_u32(), 7);
        let (result, carry) = increment(&nib(15));
        assert!(result.is_zero());
        assert!(carry.is_one());
    }
}
