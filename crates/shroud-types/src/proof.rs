//! Zero-knowledge proof oracle interface.
//!
//! The protocol never constructs proofs; it only asks a [`ProofVerifier`]
//! whether a proof holds for a given vector of public inputs. Verifiers
//! must be pure and deterministic.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A Groth16-style proof triple. Encoding is verifier-defined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proof {
    pub a: Vec<u8>,
    pub b: Vec<u8>,
    pub c: Vec<u8>,
}

impl Proof {
    #[must_use]
    pub fn new(a: Vec<u8>, b: Vec<u8>, c: Vec<u8>) -> Self {
        Self { a, b, c }
    }
}

/// One public input: a 32-byte field element.
pub type FieldElement = [u8; 32];

/// Public inputs a proof is checked against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicInputs(pub Vec<FieldElement>);

impl PublicInputs {
    /// Single-element input vector, the shape every protocol check uses.
    #[must_use]
    pub fn single(element: FieldElement) -> Self {
        Self(vec![element])
    }

    #[must_use]
    pub fn as_slice(&self) -> &[FieldElement] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Stateless proof verification capability.
pub trait ProofVerifier {
    /// `true` iff `proof` is valid for `inputs`. No side effects.
    fn verify(&self, proof: &Proof, inputs: &PublicInputs) -> bool;
}

impl<V: ProofVerifier + ?Sized> ProofVerifier for &V {
    fn verify(&self, proof: &Proof, inputs: &PublicInputs) -> bool {
        (**self).verify(proof, inputs)
    }
}

impl<V: ProofVerifier + ?Sized> ProofVerifier for Box<V> {
    fn verify(&self, proof: &Proof, inputs: &PublicInputs) -> bool {
        (**self).verify(proof, inputs)
    }
}

impl<V: ProofVerifier + ?Sized> ProofVerifier for Arc<V> {
    fn verify(&self, proof: &Proof, inputs: &PublicInputs) -> bool {
        (**self).verify(proof, inputs)
    }
}

// ---------------------------------------------------------------------------
// Test doubles. **Never use in production.**
// ---------------------------------------------------------------------------

/// Verifier that returns a fixed answer.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticVerifier {
    pub accept: bool,
}

#[cfg(any(test, feature = "test-helpers"))]
impl StaticVerifier {
    #[must_use]
    pub fn accept_all() -> Self {
        Self { accept: true }
    }

    #[must_use]
    pub fn reject_all() -> Self {
        Self { accept: false }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl ProofVerifier for StaticVerifier {
    fn verify(&self, _proof: &Proof, _inputs: &PublicInputs) -> bool {
        self.accept
    }
}

/// Verifier that accepts a proof only if its `c` component is the hash of
/// the public inputs. Lets tests check that a proof is bound to the right
/// inputs without a real proving system.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingVerifier;

#[cfg(any(test, feature = "test-helpers"))]
impl BindingVerifier {
    fn binding_digest(inputs: &PublicInputs) -> [u8; 32] {
        let parts: Vec<&[u8]> = inputs.0.iter().map(<[u8; 32]>::as_slice).collect();
        crate::domain_hash(b"shroud:binding-proof:v1:", &parts)
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl ProofVerifier for BindingVerifier {
    fn verify(&self, proof: &Proof, inputs: &PublicInputs) -> bool {
        proof.c.as_slice() == Self::binding_digest(inputs).as_slice()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Proof {
    /// A proof accepted by [`BindingVerifier`] for exactly `inputs`.
    #[must_use]
    pub fn binding(inputs: &PublicInputs) -> Self {
        Self {
            a: vec![1; 64],
            b: vec![2; 128],
            c: BindingVerifier::binding_digest(inputs).to_vec(),
        }
    }

    /// A proof accepted by [`BindingVerifier`] for the single input `element`.
    #[must_use]
    pub fn binding_single(element: FieldElement) -> Self {
        Self::binding(&PublicInputs::single(element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_verifier_answers() {
        let proof = Proof::default();
        let inputs = PublicInputs::single([0; 32]);
        assert!(StaticVerifier::accept_all().verify(&proof, &inputs));
        assert!(!StaticVerifier::reject_all().verify(&proof, &inputs));
    }

    #[test]
    fn binding_verifier_binds_inputs() {
        let v = BindingVerifier;
        let proof = Proof::binding_single([1; 32]);
        assert!(v.verify(&proof, &PublicInputs::single([1; 32])));
        assert!(!v.verify(&proof, &PublicInputs::single([2; 32])));
        assert!(!v.verify(&Proof::default(), &PublicInputs::single([1; 32])));
    }

    #[test]
    fn blanket_impls_delegate() {
        let inputs = PublicInputs::single([3; 32]);
        let proof = Proof::binding(&inputs);
        let boxed: Box<dyn ProofVerifier> = Box::new(BindingVerifier);
        let shared = Arc::new(BindingVerifier);
        assert!(boxed.verify(&proof, &inputs));
        assert!(shared.verify(&proof, &inputs));
        assert!((&BindingVerifier).verify(&proof, &inputs));
    }

    #[test]
    fn public_inputs_accessors() {
        let inputs = PublicInputs::single([9; 32]);
        assert_eq!(inputs.len(), 1);
        assert!(!inputs.is_empty());
        assert_eq!(inputs.as_slice()[0], [9; 32]);
        assert!(PublicInputs::default().is_empty());
    }
}
