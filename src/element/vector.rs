use serde::{Deserialize, Serialize};

use crate::core::Timestamp;
use crate::element::Delta;
use crate::storage::codec;

/// Apply `f` when both operands are present, `None` otherwise.
pub fn map2<A, B, R>(a: Option<A>, b: Option<B>, f: impl FnOnce(A, B) -> R) -> Option<R> {
    a.zip(b).map(|(a, b)| f(a, b))
}

/// Component layout of one concrete vector kind, with the defaults used to
/// fill components missing from elements stored by an older schema.
#[derive(Debug, Clone, Copy)]
pub struct VectorSchema {
    pub doubles: &'static [f64],
    pub ints: &'static [i64],
    pub optional_doubles: &'static [Option<f64>],
    pub optional_ints: &'static [Option<i64>],
}

impl VectorSchema {
    pub const EMPTY: VectorSchema = VectorSchema {
        doubles: &[],
        ints: &[],
        optional_doubles: &[],
        optional_ints: &[],
    };
}

/// A dated record of fixed-arity numeric components plus one categorical tag.
///
/// Two elements combined by [`distance_to`](Self::distance_to) or
/// [`advanced_by`](Self::advanced_by) must share their arities; a mismatch is
/// a broken upstream invariant and panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorElement<C> {
    pub date: Timestamp,
    #[serde(default, with = "codec::reals")]
    pub doubles: Vec<f64>,
    #[serde(default)]
    pub ints: Vec<i64>,
    #[serde(default, with = "codec::optional_reals")]
    pub optional_doubles: Vec<Option<f64>>,
    #[serde(default)]
    pub optional_ints: Vec<Option<i64>>,
    pub categorical: C,
}

/// Component-wise difference of two [`VectorElement`]s.
///
/// Integer components are carried as `f64` so fractional scaling keeps its
/// precision until the delta is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorElementDelta {
    pub duration: f64,
    pub doubles: Vec<f64>,
    pub ints: Vec<f64>,
    pub optional_doubles: Vec<Option<f64>>,
    pub optional_ints: Vec<Option<f64>>,
}

impl Delta for VectorElementDelta {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            duration: self.duration * factor,
            doubles: self.doubles.iter().map(|v| v * factor).collect(),
            ints: self.ints.iter().map(|v| v * factor).collect(),
            optional_doubles: self
                .optional_doubles
                .iter()
                .map(|v| v.map(|v| v * factor))
                .collect(),
            optional_ints: self
                .optional_ints
                .iter()
                .map(|v| v.map(|v| v * factor))
                .collect(),
        }
    }
}

impl<C: Clone> VectorElement<C> {
    /// An element laid out by `schema`, every component at its default.
    pub fn with_schema(date: Timestamp, schema: &VectorSchema, categorical: C) -> Self {
        Self {
            date,
            doubles: schema.doubles.to_vec(),
            ints: schema.ints.to_vec(),
            optional_doubles: schema.optional_doubles.to_vec(),
            optional_ints: schema.optional_ints.to_vec(),
            categorical,
        }
    }

    pub fn extrapolate(&self, at: Timestamp) -> Self {
        Self {
            date: at,
            ..self.clone()
        }
    }

    pub fn distance_to(&self, other: &Self) -> VectorElementDelta {
        self.assert_same_arity(other);
        VectorElementDelta {
            duration: other.date.seconds_since(self.date),
            doubles: pairwise(&self.doubles, &other.doubles, |a, b| b - a),
            ints: pairwise(&self.ints, &other.ints, |a, b| (b - a) as f64),
            optional_doubles: pairwise(&self.optional_doubles, &other.optional_doubles, |a, b| {
                map2(a, b, |a, b| b - a)
            }),
            optional_ints: pairwise(&self.optional_ints, &other.optional_ints, |a, b| {
                map2(a, b, |a, b| (b - a) as f64)
            }),
        }
    }

    pub fn advanced_by(&self, delta: &VectorElementDelta) -> Self {
        assert_arity("doubles", self.doubles.len(), delta.doubles.len());
        assert_arity("ints", self.ints.len(), delta.ints.len());
        assert_arity(
            "optional doubles",
            self.optional_doubles.len(),
            delta.optional_doubles.len(),
        );
        assert_arity(
            "optional ints",
            self.optional_ints.len(),
            delta.optional_ints.len(),
        );
        Self {
            date: self.date.advanced_by_secs(delta.duration),
            doubles: pairwise(&self.doubles, &delta.doubles, |a, d| a + d),
            ints: pairwise(&self.ints, &delta.ints, |a, d| (a as f64 + d).round() as i64),
            optional_doubles: pairwise(&self.optional_doubles, &delta.optional_doubles, |a, d| {
                map2(a, d, |a, d| a + d)
            }),
            optional_ints: pairwise(&self.optional_ints, &delta.optional_ints, |a, d| {
                map2(a, d, |a, d| (a as f64 + d).round() as i64)
            }),
            categorical: self.categorical.clone(),
        }
    }

    /// Pad components missing relative to `schema` with the schema defaults
    /// and drop surplus trailing components.
    ///
    /// Returns `true` when anything changed.
    pub fn migrate(&mut self, schema: &VectorSchema) -> bool {
        let mut changed = conform("doubles", &mut self.doubles, schema.doubles);
        changed |= conform("ints", &mut self.ints, schema.ints);
        changed |= conform(
            "optional doubles",
            &mut self.optional_doubles,
            schema.optional_doubles,
        );
        changed |= conform("optional ints", &mut self.optional_ints, schema.optional_ints);
        changed
    }

    fn assert_same_arity(&self, other: &Self) {
        assert_arity("doubles", self.doubles.len(), other.doubles.len());
        assert_arity("ints", self.ints.len(), other.ints.len());
        assert_arity(
            "optional doubles",
            self.optional_doubles.len(),
            other.optional_doubles.len(),
        );
        assert_arity(
            "optional ints",
            self.optional_ints.len(),
            other.optional_ints.len(),
        );
    }
}

fn assert_arity(component: &str, left: usize, right: usize) {
    assert_eq!(
        left, right,
        "vector element arity mismatch in {component}: {left} vs {right}"
    );
}

fn pairwise<A: Copy, B: Copy, R>(a: &[A], b: &[B], f: impl Fn(A, B) -> R) -> Vec<R> {
    a.iter().zip(b).map(|(a, b)| f(*a, *b)).collect()
}

fn conform<T: Clone>(component: &str, values: &mut Vec<T>, defaults: &[T]) -> bool {
    let (have, want) = (values.len(), defaults.len());
    if have == want {
        return false;
    }
    if have < want {
        values.extend_from_slice(&defaults[have..]);
    } else {
        log::warn!("dropping {} surplus {component} components", have - want);
        values.truncate(want);
    }
    true
}
