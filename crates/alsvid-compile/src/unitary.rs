//! 2×2 unitary matrix utilities for single-qubit synthesis.

use num_complex::Complex64;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

use alsvid_ir::{Op, OpType};

/// Tolerance for floating point comparisons.
pub const EPSILON: f64 = 1e-10;

/// A 2×2 unitary matrix in row-major order.
#[derive(Debug, Clone, Copy)]
pub struct Unitary2x2 {
    /// The matrix elements in row-major order: [[a, b], [c, d]].
    pub data: [Complex64; 4],
}

impl Unitary2x2 {
    /// Create a new 2×2 matrix.
    pub fn new(a: Complex64, b: Complex64, c: Complex64, d: Complex64) -> Self {
        Self { data: [a, b, c, d] }
    }

    /// The identity matrix.
    pub fn identity() -> Self {
        Self::new(
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(1.0, 0.0),
        )
    }

    /// Matrix product `self · other`.
    pub fn matmul(&self, other: &Unitary2x2) -> Unitary2x2 {
        let a = &self.data;
        let b = &other.data;
        Unitary2x2::new(
            a[0] * b[0] + a[1] * b[2],
            a[0] * b[1] + a[1] * b[3],
            a[2] * b[0] + a[3] * b[2],
            a[2] * b[1] + a[3] * b[3],
        )
    }

    /// Conjugate transpose.
    pub fn dagger(&self) -> Unitary2x2 {
        let a = &self.data;
        Unitary2x2::new(a[0].conj(), a[2].conj(), a[1].conj(), a[3].conj())
    }

    /// Equality up to `EPSILON`, exactly (no global phase allowance).
    pub fn approx_eq(&self, other: &Unitary2x2) -> bool {
        self.data
            .iter()
            .zip(&other.data)
            .all(|(a, b)| (a - b).norm() < EPSILON)
    }

    /// The global phase `φ` such that `self ≈ e^{iφ}·other`, if the two
    /// matrices are proportional.
    pub fn phase_relative_to(&self, other: &Unitary2x2) -> Option<f64> {
        let mut phase = None;
        for (a, b) in self.data.iter().zip(&other.data) {
            if b.norm() < EPSILON {
                if a.norm() >= EPSILON {
                    return None;
                }
                continue;
            }
            let ratio = a / b;
            if (ratio.norm() - 1.0).abs() > EPSILON {
                return None;
            }
            match phase {
                None => phase = Some(ratio.arg()),
                Some(p) => {
                    if (ratio - Complex64::from_polar(1.0, p)).norm() > EPSILON {
                        return None;
                    }
                }
            }
        }
        phase
    }

    /// Principal square root of a unitary, via eigendecomposition of the
    /// 2×2 case in closed form.
    pub fn sqrt(&self) -> Unitary2x2 {
        // det and trace give the eigenvalues; for a unitary they lie on
        // the unit circle.
        let a = &self.data;
        let tr = a[0] + a[3];
        let det = a[0] * a[3] - a[1] * a[2];
        let disc = (tr * tr - 4.0 * det).sqrt();
        let l1 = (tr + disc) / 2.0;
        let l2 = (tr - disc) / 2.0;
        let s1 = l1.sqrt();
        let s2 = l2.sqrt();
        if (l1 - l2).norm() < EPSILON {
            // Scalar multiple of the identity (or defective-free equal
            // eigenvalues): sqrt acts entrywise through the eigenvalue.
            return Unitary2x2::new(s1, Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0), s1);
        }
        // sqrt(M) = (M + sqrt(det)·I) / sqrt(tr + 2 sqrt(det)), with the
        // branch fixed to match s1·s2.
        let sd = s1 * s2;
        let denom = (tr + 2.0 * sd).sqrt();
        Unitary2x2::new(
            (a[0] + sd) / denom,
            a[1] / denom,
            a[2] / denom,
            (a[3] + sd) / denom,
        )
    }

    /// Wrap an angle into (−π, π].
    pub fn normalize_angle(angle: f64) -> f64 {
        let mut a = angle % (2.0 * PI);
        if a > PI {
            a -= 2.0 * PI;
        } else if a <= -PI {
            a += 2.0 * PI;
        }
        a
    }

    /// ZYZ decomposition: returns `(α, β, γ, δ)` such that
    /// `self = e^{iα} · Rz(β) · Ry(γ) · Rz(δ)`.
    pub fn zyz_decomposition(&self) -> (f64, f64, f64, f64) {
        let a = &self.data;
        let det = a[0] * a[3] - a[1] * a[2];
        // Remove the determinant to reach SU(2).
        let alpha = det.arg() / 2.0;
        let scale = Complex64::from_polar(1.0, -alpha);
        let m = [a[0] * scale, a[1] * scale, a[2] * scale, a[3] * scale];

        let gamma = 2.0 * m[2].norm().atan2(m[0].norm());
        // arg(m[0]) = −(β+δ)/2, arg(m[2]) = (β−δ)/2
        let (beta, delta) = if m[0].norm() > EPSILON && m[2].norm() > EPSILON {
            let s = -2.0 * m[0].arg();
            let d = 2.0 * m[2].arg();
            ((s + d) / 2.0, (s - d) / 2.0)
        } else if m[0].norm() > EPSILON {
            // γ ≈ 0: only β+δ is determined.
            (-2.0 * m[0].arg(), 0.0)
        } else {
            // γ ≈ π: only β−δ is determined.
            (2.0 * m[2].arg(), 0.0)
        };
        (
            alpha,
            Self::normalize_angle(beta),
            Self::normalize_angle(gamma),
            Self::normalize_angle(delta),
        )
    }

    /// The matrix of a primitive single-qubit gate with numeric
    /// parameters, if it has one.
    pub fn from_gate(op: &Op) -> Option<Unitary2x2> {
        let c = Complex64::new;
        let Op::Gate { gate, params } = op else {
            return None;
        };
        let p = |i: usize| -> Option<f64> { params.get(i).and_then(|e| e.eval()) };
        Some(match gate {
            OpType::X => Unitary2x2::new(c(0.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)),
            OpType::Y => Unitary2x2::new(c(0.0, 0.0), c(0.0, -1.0), c(0.0, 1.0), c(0.0, 0.0)),
            OpType::Z => Unitary2x2::new(c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(-1.0, 0.0)),
            OpType::H => {
                let s = FRAC_1_SQRT_2;
                Unitary2x2::new(c(s, 0.0), c(s, 0.0), c(s, 0.0), c(-s, 0.0))
            }
            OpType::S => Unitary2x2::new(c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.0, 1.0)),
            OpType::Sdg => Unitary2x2::new(c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.0, -1.0)),
            OpType::T => Unitary2x2::new(
                c(1.0, 0.0),
                c(0.0, 0.0),
                c(0.0, 0.0),
                Complex64::from_polar(1.0, PI / 4.0),
            ),
            OpType::Tdg => Unitary2x2::new(
                c(1.0, 0.0),
                c(0.0, 0.0),
                c(0.0, 0.0),
                Complex64::from_polar(1.0, -PI / 4.0),
            ),
            OpType::V => Unitary2x2::new(c(0.5, 0.5), c(0.5, -0.5), c(0.5, -0.5), c(0.5, 0.5)),
            OpType::Vdg => Unitary2x2::new(c(0.5, -0.5), c(0.5, 0.5), c(0.5, 0.5), c(0.5, -0.5)),
            OpType::Rx => {
                let t = p(0)? / 2.0;
                Unitary2x2::new(
                    c(t.cos(), 0.0),
                    c(0.0, -t.sin()),
                    c(0.0, -t.sin()),
                    c(t.cos(), 0.0),
                )
            }
            OpType::Ry => {
                let t = p(0)? / 2.0;
                Unitary2x2::new(
                    c(t.cos(), 0.0),
                    c(-t.sin(), 0.0),
                    c(t.sin(), 0.0),
                    c(t.cos(), 0.0),
                )
            }
            OpType::Rz => {
                let t = p(0)? / 2.0;
                Unitary2x2::new(
                    Complex64::from_polar(1.0, -t),
                    c(0.0, 0.0),
                    c(0.0, 0.0),
                    Complex64::from_polar(1.0, t),
                )
            }
            OpType::U1 => Unitary2x2::new(
                c(1.0, 0.0),
                c(0.0, 0.0),
                c(0.0, 0.0),
                Complex64::from_polar(1.0, p(0)?),
            ),
            OpType::U3 => {
                let (t, phi, lam) = (p(0)?, p(1)?, p(2)?);
                let (ct, st) = ((t / 2.0).cos(), (t / 2.0).sin());
                Unitary2x2::new(
                    c(ct, 0.0),
                    -Complex64::from_polar(st, lam),
                    Complex64::from_polar(st, phi),
                    Complex64::from_polar(ct, phi + lam),
                )
            }
            OpType::Noop => Unitary2x2::identity(),
            _ => return None,
        })
    }
}
