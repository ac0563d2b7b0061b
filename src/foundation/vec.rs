//! Small fixed-size vectors in the spirit of GLSL's `vec2`/`vec3`/`vec4`.
//!
//! Equality between vectors is component-wise through [`ApproxEq`]: floating point components
//! compare with an absolute tolerance (`1e-3` for `f32`, `1e-6` for `f64`), every other element
//! type compares exactly. Mesh squareness checks and blend-factor bookkeeping rely on this.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Absolute tolerance used by `f32` comparisons.
pub const F32_EPSILON: f32 = 1e-3;
/// Absolute tolerance used by `f64` comparisons.
pub const F64_EPSILON: f64 = 1e-6;

/// Element equality used by vector `PartialEq`.
pub trait ApproxEq: Copy {
    /// Return `true` when `self` and `other` are considered equal.
    fn approx_eq(self, other: Self) -> bool;
}

impl ApproxEq for f32 {
    fn approx_eq(self, other: Self) -> bool {
        (self - other).abs() <= F32_EPSILON
    }
}

impl ApproxEq for f64 {
    fn approx_eq(self, other: Self) -> bool {
        (self - other).abs() <= F64_EPSILON
    }
}

macro_rules! exact_eq {
    ($($t:ty),+) => {
        $(impl ApproxEq for $t {
            fn approx_eq(self, other: Self) -> bool {
                self == other
            }
        })+
    };
}

exact_eq!(bool, u8, i32, u32, i64, u64, usize);

/// Numeric element type usable for vector arithmetic.
pub trait Scalar:
    ApproxEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + fmt::Debug
{
    /// Additive identity.
    const ZERO: Self;
    /// Multiplicative identity.
    const ONE: Self;
}

macro_rules! scalar {
    ($($t:ty => $zero:expr, $one:expr);+ $(;)?) => {
        $(impl Scalar for $t {
            const ZERO: Self = $zero;
            const ONE: Self = $one;
        })+
    };
}

scalar!(
    f32 => 0.0, 1.0;
    f64 => 0.0, 1.0;
    u8 => 0, 1;
    i32 => 0, 1;
    u32 => 0, 1;
);

/// Floating point element types (`sqrt` available).
pub trait Float: Scalar + Neg<Output = Self> {
    /// Square root.
    fn sqrt(self) -> Self;
}

impl Float for f32 {
    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }
}

impl Float for f64 {
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }
}

/// Operations shared by [`Vec2`], [`Vec3`] and [`Vec4`] so the free functions below can be
/// written once.
pub trait Vector: Copy + PartialEq + Add<Output = Self> + Sub<Output = Self> {
    /// Element type.
    type Elem: Scalar;

    /// Vector with every component set to `v`.
    fn splat(v: Self::Elem) -> Self;
    /// Multiply every component by `s`.
    fn scale(self, s: Self::Elem) -> Self;
    /// Dot product.
    fn dot(self, other: Self) -> Self::Elem;
    /// Component-wise minimum.
    fn min(self, other: Self) -> Self;
    /// Component-wise maximum.
    fn max(self, other: Self) -> Self;
    /// `true` when every component of `self` is `<=` the matching component of `other`.
    fn all_le(self, other: Self) -> bool;
}

macro_rules! impl_vec {
    ($V:ident, $n:expr, { $($f:ident : $i:expr),+ }) => {
        impl<T> $V<T> {
            /// Build a vector from its components.
            pub const fn new($($f: T),+) -> Self {
                Self { $($f),+ }
            }
        }

        impl<T: Copy> $V<T> {
            /// Number of components.
            pub const SIZE: usize = $n;

            /// Apply `f` to every component.
            pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> $V<U> {
                $V { $($f: f(self.$f)),+ }
            }

            /// Combine two vectors component-wise.
            pub fn zip_map<U: Copy, R>(self, other: $V<U>, mut f: impl FnMut(T, U) -> R) -> $V<R> {
                $V { $($f: f(self.$f, other.$f)),+ }
            }

            /// Components as an array.
            pub fn to_array(self) -> [T; $n] {
                [$(self.$f),+]
            }
        }

        impl<T: Scalar> $V<T> {
            /// Component-wise product.
            pub fn mul_elem(self, other: Self) -> Self {
                self.zip_map(other, |a, b| a * b)
            }

            /// Component-wise `<`.
            pub fn less_than(self, other: Self) -> $V<bool> {
                self.zip_map(other, |a, b| a < b)
            }

            /// Component-wise `<=`, using tolerant equality for the `=` part.
            pub fn less_than_equal(self, other: Self) -> $V<bool> {
                self.zip_map(other, |a, b| a < b || a.approx_eq(b))
            }

            /// Component-wise `>`.
            pub fn greater_than(self, other: Self) -> $V<bool> {
                self.zip_map(other, |a, b| a > b)
            }

            /// Component-wise tolerant equality.
            pub fn equal(self, other: Self) -> $V<bool> {
                self.zip_map(other, |a, b| a.approx_eq(b))
            }

            /// Clamp every component into `[lo, hi]`.
            pub fn clamp_scalar(self, lo: T, hi: T) -> Self {
                clamp(self, Self::splat(lo), Self::splat(hi))
            }
        }

        impl $V<bool> {
            /// `true` when every component is `true`.
            pub fn all(self) -> bool {
                true $(&& self.$f)+
            }

            /// `true` when at least one component is `true`.
            pub fn any(self) -> bool {
                false $(|| self.$f)+
            }
        }

        impl<T: Scalar> Vector for $V<T> {
            type Elem = T;

            fn splat(v: T) -> Self {
                Self { $($f: v),+ }
            }

            fn scale(self, s: T) -> Self {
                self * s
            }

            fn dot(self, other: Self) -> T {
                T::ZERO $(+ self.$f * other.$f)+
            }

            fn min(self, other: Self) -> Self {
                self.zip_map(other, |a, b| if b < a { b } else { a })
            }

            fn max(self, other: Self) -> Self {
                self.zip_map(other, |a, b| if b > a { b } else { a })
            }

            fn all_le(self, other: Self) -> bool {
                self.less_than_equal(other).all()
            }
        }

        impl<T: ApproxEq> PartialEq for $V<T> {
            fn eq(&self, other: &Self) -> bool {
                true $(&& self.$f.approx_eq(other.$f))+
            }
        }

        impl<T: Scalar> Add for $V<T> {
            type Output = Self;
            fn add(self, other: Self) -> Self {
                Self { $($f: self.$f + other.$f),+ }
            }
        }

        impl<T: Scalar> Sub for $V<T> {
            type Output = Self;
            fn sub(self, other: Self) -> Self {
                Self { $($f: self.$f - other.$f),+ }
            }
        }

        impl<T: Scalar> Mul<T> for $V<T> {
            type Output = Self;
            fn mul(self, s: T) -> Self {
                Self { $($f: self.$f * s),+ }
            }
        }

        impl<T: Scalar> Div<T> for $V<T> {
            type Output = Self;
            fn div(self, s: T) -> Self {
                Self { $($f: self.$f / s),+ }
            }
        }

        impl<T: Scalar + Neg<Output = T>> Neg for $V<T> {
            type Output = Self;
            fn neg(self) -> Self {
                Self { $($f: -self.$f),+ }
            }
        }

        impl<T: Scalar> AddAssign for $V<T> {
            fn add_assign(&mut self, other: Self) {
                *self = *self + other;
            }
        }

        impl<T: Scalar> SubAssign for $V<T> {
            fn sub_assign(&mut self, other: Self) {
                *self = *self - other;
            }
        }

        impl<T: Scalar> MulAssign<T> for $V<T> {
            fn mul_assign(&mut self, s: T) {
                *self = *self * s;
            }
        }

        impl<T> Index<usize> for $V<T> {
            type Output = T;
            fn index(&self, i: usize) -> &T {
                match i {
                    $($i => &self.$f,)+
                    _ => panic!("{} index out of range: {i}", stringify!($V)),
                }
            }
        }

        impl<T> IndexMut<usize> for $V<T> {
            fn index_mut(&mut self, i: usize) -> &mut T {
                match i {
                    $($i => &mut self.$f,)+
                    _ => panic!("{} index out of range: {i}", stringify!($V)),
                }
            }
        }

        impl<T: fmt::Display> fmt::Display for $V<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let parts = [$(self.$f.to_string()),+];
                f.write_str(&parts.join(" "))
            }
        }

        impl<T: FromStr> FromStr for $V<T> {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let mut tokens = s.split_whitespace();
                $(
                    let $f = tokens
                        .next()
                        .ok_or_else(|| format!("expected {} components", $n))?
                        .parse::<T>()
                        .map_err(|_| format!("invalid component '{}'", s.trim()))?;
                )+
                if tokens.next().is_some() {
                    return Err(format!("expected {} components", $n));
                }
                Ok(Self { $($f),+ })
            }
        }
    };
}

/// Two-component vector.
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Vec2<T> {
    /// First component.
    pub x: T,
    /// Second component.
    pub y: T,
}

/// Three-component vector.
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Vec3<T> {
    /// First component.
    pub x: T,
    /// Second component.
    pub y: T,
    /// Third component.
    pub z: T,
}

/// Four-component vector.
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Vec4<T> {
    /// First component.
    pub x: T,
    /// Second component.
    pub y: T,
    /// Third component.
    pub z: T,
    /// Fourth component.
    pub w: T,
}

impl_vec!(Vec2, 2, { x: 0, y: 1 });
impl_vec!(Vec3, 3, { x: 0, y: 1, z: 2 });
impl_vec!(Vec4, 4, { x: 0, y: 1, z: 2, w: 3 });

impl<T: Copy> Vec3<T> {
    /// Extend a [`Vec2`] with a third component.
    pub fn from_vec2(v: Vec2<T>, z: T) -> Self {
        Self::new(v.x, v.y, z)
    }

    /// Drop the third component.
    pub fn xy(self) -> Vec2<T> {
        Vec2::new(self.x, self.y)
    }
}

impl<T: Copy> Vec4<T> {
    /// Extend a [`Vec3`] with a fourth component.
    pub fn from_vec3(v: Vec3<T>, w: T) -> Self {
        Self::new(v.x, v.y, v.z, w)
    }

    /// Drop the fourth component.
    pub fn xyz(self) -> Vec3<T> {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// `f32` 2D vector; the mesh point type.
pub type Vec2f = Vec2<f32>;
/// `f32` 3D vector.
pub type Vec3f = Vec3<f32>;
/// `f32` 4D vector.
pub type Vec4f = Vec4<f32>;
/// `f64` 2D vector.
pub type Vec2d = Vec2<f64>;
/// `f64` 3D vector.
pub type Vec3d = Vec3<f64>;
/// `f64` 4D vector.
pub type Vec4d = Vec4<f64>;
/// `i32` 2D vector.
pub type Vec2i = Vec2<i32>;
/// `i32` 3D vector.
pub type Vec3i = Vec3<i32>;
/// `i32` 4D vector.
pub type Vec4i = Vec4<i32>;
/// `u32` 2D vector; pixel dimensions.
pub type Vec2u = Vec2<u32>;
/// `u32` 3D vector.
pub type Vec3u = Vec3<u32>;
/// `u32` 4D vector.
pub type Vec4u = Vec4<u32>;
/// `u8` 4D vector; RGBA8 colors.
pub type Vec4ub = Vec4<u8>;
/// Boolean 2D vector.
pub type Vec2b = Vec2<bool>;
/// Boolean 3D vector.
pub type Vec3b = Vec3<bool>;
/// Boolean 4D vector.
pub type Vec4b = Vec4<bool>;

/// Dot product.
pub fn dot<V: Vector>(a: V, b: V) -> V::Elem {
    a.dot(b)
}

/// Cross product (3D only).
pub fn cross<T: Scalar>(a: Vec3<T>, b: Vec3<T>) -> Vec3<T> {
    Vec3::new(
        a.y * b.z - a.z * b.y,
        a.z * b.x - a.x * b.z,
        a.x * b.y - a.y * b.x,
    )
}

/// Euclidean length, `sqrt(dot(v, v))`.
pub fn length<V: Vector>(v: V) -> V::Elem
where
    V::Elem: Float,
{
    dot(v, v).sqrt()
}

/// Unit vector in the direction of `v`.
///
/// A vector whose squared length is exactly zero is returned unchanged.
pub fn normalize<V: Vector>(v: V) -> V
where
    V::Elem: Float,
{
    let len2 = dot(v, v);
    if len2 == <V::Elem as Scalar>::ZERO {
        return v;
    }
    v.scale(<V::Elem as Scalar>::ONE / len2.sqrt())
}

/// Clamp `v` component-wise into `[lo, hi]`. Requires `lo <= hi` on every axis.
pub fn clamp<V: Vector>(v: V, lo: V, hi: V) -> V {
    debug_assert!(lo.all_le(hi), "clamp bounds out of order");
    v.min(hi).max(lo)
}

/// Product of the components of a 2D extent.
pub fn area<T: Scalar>(v: Vec2<T>) -> T {
    v.x * v.y
}

/// Product of the components of a 3D extent.
pub fn volume<T: Scalar>(v: Vec3<T>) -> T {
    v.x * v.y * v.z
}

/// Outcome of [`intersect`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection<V> {
    /// `true` when the two intervals overlap on every axis.
    pub intersected: bool,
    /// Start of the clipped sub-interval.
    pub begin: V,
    /// End of the clipped sub-interval.
    pub end: V,
}

/// Intersect the axis-aligned intervals `[a0, a1]` and `[b0, b1]`.
///
/// The clipped interval is `[clamp(a0, b0, b1), clamp(a1, b0, b1)]`; it is only meaningful when
/// `intersected` is `true`.
pub fn intersect<V: Vector>(a0: V, a1: V, b0: V, b1: V) -> Intersection<V> {
    debug_assert!(a0.all_le(a1) && b0.all_le(b1));
    Intersection {
        intersected: a0.all_le(b1) && b0.all_le(a1),
        begin: clamp(a0, b0, b1),
        end: clamp(a1, b0, b1),
    }
}

/// Orthogonal projection of `p` onto the line through `a` and `b` (`a != b`).
pub fn project<V: Vector>(p: V, a: V, b: V) -> V
where
    V::Elem: Float,
{
    debug_assert!(a != b, "project requires two distinct line points");
    let ab = normalize(b - a);
    a + ab.scale(dot(ab, p - a))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/vec.rs"]
mod tests;
