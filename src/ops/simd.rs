//! Elementwise kernels: AVX (8 lanes), SSE (4 lanes), NEON (4 lanes), scalar.
//!
//! The vector paths use only IEEE add/sub/mul, so lanes are bitwise equal
//! to the scalar reference. Tails shorter than the lane width go through
//! the scalar loop. Kernels work on raw pointers and load lane `k` of both
//! inputs before storing lane `k`, which makes `dst` aliasing `a` or `b`
//! well defined.

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use super::Op;

/// Selected elementwise implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kernel {
    Scalar,
    Sse,
    Avx,
    Neon,
}

impl Kernel {
    /// Widest kernel the running CPU supports.
    #[cfg(target_arch = "x86_64")]
    pub fn detect() -> Kernel {
        if is_x86_feature_detected!("avx") {
            Kernel::Avx
        } else if is_x86_feature_detected!("sse") {
            Kernel::Sse
        } else {
            Kernel::Scalar
        }
    }

    #[cfg(target_arch = "aarch64")]
    pub fn detect() -> Kernel {
        if std::arch::is_aarch64_feature_detected!("neon") {
            Kernel::Neon
        } else {
            Kernel::Scalar
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    pub fn detect() -> Kernel {
        Kernel::Scalar
    }

    /// `detect()` when SIMD is enabled, scalar otherwise.
    pub fn select(simd: bool) -> Kernel {
        if simd {
            Kernel::detect()
        } else {
            Kernel::Scalar
        }
    }

    /// True when the running CPU can execute this kernel.
    pub fn is_supported(self) -> bool {
        match self {
            Kernel::Scalar => true,
            #[cfg(target_arch = "x86_64")]
            Kernel::Avx => is_x86_feature_detected!("avx"),
            #[cfg(target_arch = "x86_64")]
            Kernel::Sse => is_x86_feature_detected!("sse"),
            #[cfg(target_arch = "aarch64")]
            Kernel::Neon => std::arch::is_aarch64_feature_detected!("neon"),
            _ => false,
        }
    }

    /// `self` if supported here, scalar otherwise.
    pub fn usable(self) -> Kernel {
        if self.is_supported() {
            self
        } else {
            Kernel::Scalar
        }
    }

    pub fn lanes(self) -> usize {
        match self {
            Kernel::Scalar => 1,
            Kernel::Sse | Kernel::Neon => 4,
            Kernel::Avx => 8,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Kernel::Scalar => "scalar",
            Kernel::Sse => "SSE (128-bit, 4 floats per operation)",
            Kernel::Avx => "AVX (256-bit, 8 floats per operation)",
            Kernel::Neon => "NEON (128-bit, 4 floats per operation)",
        }
    }

    /// Run `op` over `n` elements.
    ///
    /// # Safety
    /// `dst`, `a` and `b` must be valid for `n` elements. `dst` may equal
    /// `a` or `b` but must not partially overlap them. A kernel the CPU
    /// lacks runs the scalar loop instead.
    pub(crate) unsafe fn run(self, op: Op, dst: *mut f32, a: *const f32, b: *const f32, n: usize) {
        match self {
            #[cfg(target_arch = "x86_64")]
            Kernel::Avx if is_x86_feature_detected!("avx") => x86::avx(op, dst, a, b, n),
            #[cfg(target_arch = "x86_64")]
            Kernel::Sse if is_x86_feature_detected!("sse") => x86::sse(op, dst, a, b, n),
            #[cfg(target_arch = "aarch64")]
            Kernel::Neon if std::arch::is_aarch64_feature_detected!("neon") => {
                arm::neon(op, dst, a, b, n)
            }
            _ => scalar(op, dst, a, b, n, 0),
        }
    }
}

impl std::fmt::Display for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

#[inline(always)]
unsafe fn scalar(op: Op, dst: *mut f32, a: *const f32, b: *const f32, n: usize, from: usize) {
    for k in from..n {
        let x = *a.add(k);
        let y = *b.add(k);
        *dst.add(k) = op.eval(x, y);
    }
}

#[cfg(target_arch = "x86_64")]
mod x86 {
    use super::*;

    macro_rules! lanes {
        ($name:ident, $feature:literal, $width:expr, $load:ident, $store:ident,
         $add:ident, $sub:ident, $mul:ident) => {
            #[target_feature(enable = $feature)]
            pub(super) unsafe fn $name(op: Op, dst: *mut f32, a: *const f32, b: *const f32, n: usize) {
                let body = n - n % $width;
                let mut k = 0;
                match op {
                    Op::Add => while k < body {
                        $store(dst.add(k), $add($load(a.add(k)), $load(b.add(k))));
                        k += $width;
                    },
                    Op::Sub => while k < body {
                        $store(dst.add(k), $sub($load(a.add(k)), $load(b.add(k))));
                        k += $width;
                    },
                    Op::RSub => while k < body {
                        $store(dst.add(k), $sub($load(b.add(k)), $load(a.add(k))));
                        k += $width;
                    },
                    Op::Mul => while k < body {
                        $store(dst.add(k), $mul($load(a.add(k)), $load(b.add(k))));
                        k += $width;
                    },
                }
                scalar(op, dst, a, b, n, body);
            }
        };
    }

    lanes!(avx, "avx", 8, _mm256_loadu_ps, _mm256_storeu_ps, _mm256_add_ps, _mm256_sub_ps, _mm256_mul_ps);
    lanes!(sse, "sse", 4, _mm_loadu_ps, _mm_storeu_ps, _mm_add_ps, _mm_sub_ps, _mm_mul_ps);
}

#[cfg(target_arch = "aarch64")]
mod arm {
    use super::*;

    #[target_feature(enable = "neon")]
    pub(super) unsafe fn neon(op: Op, dst: *mut f32, a: *const f32, b: *const f32, n: usize) {
        let body = n & !3;
        let mut k = 0;
        while k < body {
            let x = vld1q_f32(a.add(k));
            let y = vld1q_f32(b.add(k));
            let r = match op {
                Op::Add => vaddq_f32(x, y),
                Op::Sub => vsubq_f32(x, y),
                Op::RSub => vsubq_f32(y, x),
                Op::Mul => vmulq_f32(x, y),
            };
            vst1q_f32(dst.add(k), r);
            k += 4;
        }
        scalar(op, dst, a, b, n, body);
    }
}
