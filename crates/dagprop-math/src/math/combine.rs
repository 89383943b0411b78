//! Exact combination of independent success probabilities.
//!
//! The reachability engine combines per-parent and per-diamond contributions
//! with the inclusion-exclusion expansion
//!
//! ```text
//! P(at least one) = sum over non-empty S of (-1)^(|S|+1) * prod_{i in S} x_i
//! ```
//!
//! rather than the noisy-OR complement shortcut, so that callers may feed in
//! contributions that are themselves exact joint probabilities (conditioned
//! diamond results) without re-expressing them as complements. The complement
//! form is available separately for contributions known to be plain
//! independent Bernoulli terms.

/// Widest input for which the subset sum is enumerated term by term.
///
/// Beyond this width the expansion is evaluated through its factored
/// equivalent `1 - prod(1 - x_i)`, which is the same polynomial.
const MAX_ENUMERATED_TERMS: usize = 20;

/// Clamp a probability to the closed unit interval.
///
/// NaN is passed through so that upstream validation failures stay visible.
pub fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        return x;
    }
    x.clamp(0.0, 1.0)
}

/// Probability that at least one of `terms` succeeds, via the explicit
/// inclusion-exclusion subset sum.
///
/// Returns 0.0 for an empty slice. Intermediate values may transiently fall
/// slightly outside `[0, 1]`; callers clamp at method boundaries.
pub fn union_probability(terms: &[f64]) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    if terms.len() == 1 {
        return terms[0];
    }
    if terms.len() > MAX_ENUMERATED_TERMS {
        return complement_product(terms);
    }

    let mut total = 0.0;
    let subsets = 1u64 << terms.len();
    for mask in 1..subsets {
        let mut product = 1.0;
        for (i, x) in terms.iter().enumerate() {
            if mask & (1 << i) != 0 {
                product *= x;
            }
        }
        if mask.count_ones() % 2 == 1 {
            total += product;
        } else {
            total -= product;
        }
    }
    total
}

/// Probability that at least one of `terms` succeeds, via the complement
/// product `1 - prod(1 - x_i)`.
///
/// Valid only when every term is an independent Bernoulli success
/// probability. Conditioned diamond contributions must go through
/// [`union_probability`] instead.
pub fn complement_product(terms: &[f64]) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let mut miss_all = 1.0;
    for x in terms {
        miss_all *= 1.0 - x;
    }
    1.0 - miss_all
}
