//! Leaf [`FieldFunction`] implementations.
//!
//! These are the numerically trivial building blocks schema authors wire
//! into the field graph (`synfield-fields`): addition, multiplication,
//! division, exponential, summation, and a couple of standard activation
//! functions. None of them know anything about activations, synapses, or
//! binding signals: they only see an argument-value cache and a raw
//! incoming delta.

use synfield_fields::FieldFunction;

/// Sums all of its arguments; `transmit` passes deltas straight through.
#[derive(Debug, Default)]
pub struct Addition;

impl FieldFunction for Addition {
    fn transmit(&self, _args: &[f64], _arg_index: usize, delta: f64) -> f64 {
        delta
    }

    fn initialize(&self, args: &[f64]) -> f64 {
        args.iter().sum()
    }
}

/// Sums an arbitrary (non-fixed-arity) set of weighted contributions.
/// Functionally identical to [`Addition`] at the field-definition level;
/// kept distinct because schema authors use it for net-input
/// accumulation specifically (see `synfield-net`'s neuron wiring).
#[derive(Debug, Default)]
pub struct Summation;

impl FieldFunction for Summation {
    fn transmit(&self, _args: &[f64], _arg_index: usize, delta: f64) -> f64 {
        delta
    }

    fn initialize(&self, args: &[f64]) -> f64 {
        args.iter().sum()
    }
}

/// Two-argument product. `transmit` multiplies the incoming delta by the
/// *other* argument's current cached value, which is why the cache is
/// threaded through `FieldFunction::transmit` rather than computed fresh.
#[derive(Debug, Default)]
pub struct Multiplication;

impl FieldFunction for Multiplication {
    fn transmit(&self, args: &[f64], arg_index: usize, delta: f64) -> f64 {
        let other = if arg_index == 0 {
            args.get(1).copied().unwrap_or(0.0)
        } else {
            args.first().copied().unwrap_or(0.0)
        };
        delta * other
    }

    fn initialize(&self, args: &[f64]) -> f64 {
        args.iter().copied().product()
    }
}

/// Two-argument quotient: `args[0] / args[1]`.
#[derive(Debug, Default)]
pub struct Division;

impl FieldFunction for Division {
    fn transmit(&self, args: &[f64], arg_index: usize, delta: f64) -> f64 {
        let denom = args.get(1).copied().unwrap_or(1.0);
        if denom == 0.0 {
            return 0.0;
        }
        if arg_index == 0 {
            delta / denom
        } else {
            let numer = args.first().copied().unwrap_or(0.0);
            -numer * delta / (denom * denom)
        }
    }

    fn initialize(&self, args: &[f64]) -> f64 {
        let numer = args.first().copied().unwrap_or(0.0);
        let denom = args.get(1).copied().unwrap_or(1.0);
        if denom == 0.0 {
            0.0
        } else {
            numer / denom
        }
    }
}

/// `e^x` of its single argument.
#[derive(Debug, Default)]
pub struct Exponential;

impl FieldFunction for Exponential {
    fn transmit(&self, args: &[f64], _arg_index: usize, _delta: f64) -> f64 {
        // The exponential's derivative is itself; recompute from the
        // updated argument cache rather than trying to linearize the delta.
        libm::exp(args.first().copied().unwrap_or(0.0))
    }

    fn initialize(&self, args: &[f64]) -> f64 {
        libm::exp(args.first().copied().unwrap_or(0.0))
    }
}

/// A configurable squashing function applied to a single argument (net
/// input), used as the last field in a neuron's activation-value chain.
#[derive(Debug, Clone, Copy)]
pub enum ActivationKind {
    Logistic,
    Relu,
    Tanh,
    Identity,
}

#[derive(Debug)]
pub struct ActivationFunction {
    pub kind: ActivationKind,
}

impl ActivationFunction {
    pub fn new(kind: ActivationKind) -> Self {
        Self { kind }
    }

    fn apply(&self, x: f64) -> f64 {
        match self.kind {
            ActivationKind::Logistic => 1.0 / (1.0 + libm::exp(-x)),
            ActivationKind::Relu => x.max(0.0),
            ActivationKind::Tanh => libm::tanh(x),
            ActivationKind::Identity => x,
        }
    }
}

impl FieldFunction for ActivationFunction {
    fn transmit(&self, args: &[f64], _arg_index: usize, _delta: f64) -> f64 {
        self.apply(args.first().copied().unwrap_or(0.0))
    }

    fn initialize(&self, args: &[f64]) -> f64 {
        self.apply(args.first().copied().unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn addition_sums_args() {
        assert_eq!(Addition.initialize(&[1.0, 2.0, 3.0]), 6.0);
    }

    #[test]
    fn multiplication_transmits_scaled_delta() {
        let m = Multiplication;
        // args already include this delta per graph::deliver's accumulation.
        assert_eq!(m.transmit(&[2.0, 5.0], 0, 1.0), 5.0);
        assert_eq!(m.transmit(&[2.0, 5.0], 1, 1.0), 2.0);
    }

    #[test]
    fn division_by_zero_short_circuits() {
        let d = Division;
        assert_eq!(d.initialize(&[1.0, 0.0]), 0.0);
    }

    #[test]
    fn logistic_saturates() {
        let f = ActivationFunction::new(ActivationKind::Logistic);
        assert!(f.apply(10.0) > 0.99);
        assert!(f.apply(-10.0) < 0.01);
    }

    proptest! {
        /// `Division::initialize` undoes `Multiplication::initialize` for any
        /// non-zero divisor: `(a * b) / b == a`, mirroring the round-trip
        /// laws the rest of the workspace holds `transition_forward`/
        /// `transition_backward` to.
        #[test]
        fn division_undoes_multiplication(a in -1.0e6f64..1.0e6, b in prop_oneof![-1.0e6f64..-1.0e-3, 1.0e-3..1.0e6]) {
            let product = Multiplication.initialize(&[a, b]);
            let recovered = Division.initialize(&[product, b]);
            prop_assert!((recovered - a).abs() < 1.0e-6 * a.abs().max(1.0));
        }

        /// `Addition::transmit` ignores its argument cache and forwards the
        /// delta unchanged, so summing two deltas through two calls equals
        /// one call with the combined delta - the linearity a pure
        /// passthrough field must have for the interceptor's coalescing to
        /// be sound.
        #[test]
        fn addition_transmit_is_linear(d1 in -1.0e6f64..1.0e6, d2 in -1.0e6f64..1.0e6) {
            let separate = Addition.transmit(&[], 0, d1) + Addition.transmit(&[], 0, d2);
            let combined = Addition.transmit(&[], 0, d1 + d2);
            prop_assert_eq!(separate, combined);
        }
    }
}
