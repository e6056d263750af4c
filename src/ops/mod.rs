//! Primitive binary operators over equal-length `f32` buffers.
//!
//! The live family is `{add, sub, rsub, mul}` with stable indices `0..3`,
//! which is what model files store. Every operator tolerates `dst`
//! aliasing either input.

pub mod simd;

pub use simd::Kernel;

/// One of the four live binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Sub,
    RSub,
    Mul,
}

impl Op {
    /// All operators in index order.
    pub const ALL: [Op; 4] = [Op::Add, Op::Sub, Op::RSub, Op::Mul];
    pub const COUNT: usize = 4;

    /// Stable serialization index.
    pub fn index(self) -> usize {
        match self {
            Op::Add => 0,
            Op::Sub => 1,
            Op::RSub => 2,
            Op::Mul => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Op> {
        Op::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Sub => "sub",
            Op::RSub => "rsub",
            Op::Mul => "mul",
        }
    }

    /// Infix symbol used in debug traces: `(n) = (i) op (j)`.
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::RSub => "r-",
            Op::Mul => "*",
        }
    }

    /// Apply to a single pair of values.
    #[inline(always)]
    pub fn eval(self, a: f32, b: f32) -> f32 {
        match self {
            Op::Add => a + b,
            Op::Sub => a - b,
            Op::RSub => b - a,
            Op::Mul => a * b,
        }
    }

    /// `dst[k] = op(a[k], b[k])` for the common prefix of all three slices.
    pub fn apply(self, kernel: Kernel, dst: &mut [f32], a: &[f32], b: &[f32]) {
        debug_assert_eq!(dst.len(), a.len());
        debug_assert_eq!(dst.len(), b.len());
        let n = dst.len().min(a.len()).min(b.len());
        // SAFETY: all three pointers are valid for `n` elements.
        unsafe { kernel.run(self, dst.as_mut_ptr(), a.as_ptr(), b.as_ptr(), n) }
    }

    /// `a[k] = op(a[k], b[k])`, the result overwriting the left operand.
    pub fn apply_in_left(self, kernel: Kernel, a: &mut [f32], b: &[f32]) {
        debug_assert_eq!(a.len(), b.len());
        let n = a.len().min(b.len());
        let dst = a.as_mut_ptr();
        // SAFETY: dst aliases the left input; kernels read both inputs of
        // lane k before writing lane k.
        unsafe { kernel.run(self, dst, dst, b.as_ptr(), n) }
    }

    /// `b[k] = op(a[k], b[k])`, the result overwriting the right operand.
    pub fn apply_in_right(self, kernel: Kernel, a: &[f32], b: &mut [f32]) {
        debug_assert_eq!(a.len(), b.len());
        let n = a.len().min(b.len());
        let dst = b.as_mut_ptr();
        // SAFETY: see apply_in_left.
        unsafe { kernel.run(self, dst, a.as_ptr(), dst, n) }
    }

    /// Freshly allocated `op(a, b)`.
    pub fn combine(self, kernel: Kernel, a: &[f32], b: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0; a.len().min(b.len())];
        self.apply(kernel, &mut out, a, b);
        out
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_stable() {
        for (i, op) in Op::ALL.iter().enumerate() {
            assert_eq!(op.index(), i);
            assert_eq!(Op::from_index(i), Some(*op));
        }
        assert_eq!(Op::from_index(Op::COUNT), None);
    }

    #[test]
    fn scalar_definitions() {
        assert_eq!(Op::Add.eval(3.0, 2.0), 5.0);
        assert_eq!(Op::Sub.eval(3.0, 2.0), 1.0);
        assert_eq!(Op::RSub.eval(3.0, 2.0), -1.0);
        assert_eq!(Op::Mul.eval(3.0, 2.0), 6.0);
    }

    #[test]
    fn aliasing_left_and_right() {
        let kernel = Kernel::detect();
        let a0: Vec<f32> = (0..19).map(|k| k as f32 * 0.5).collect();
        let b0: Vec<f32> = (0..19).map(|k| 3.0 - k as f32).collect();
        for op in Op::ALL {
            let expected = op.combine(Kernel::Scalar, &a0, &b0);

            let mut a = a0.clone();
            op.apply_in_left(kernel, &mut a, &b0);
            assert_eq!(a, expected, "{op} in left");

            let mut b = b0.clone();
            op.apply_in_right(kernel, &a0, &mut b);
            assert_eq!(b, expected, "{op} in right");
        }
    }

    #[test]
    fn self_combination() {
        let mut v = vec![1.5f32; 11];
        let copy = v.clone();
        Op::Sub.apply_in_left(Kernel::detect(), &mut v, &copy);
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
