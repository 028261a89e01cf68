//! Knot span lookup, Cox-de Boor basis evaluation and tensor-product helpers.

pub mod knot;
pub mod tensor;

pub use knot::{basis_functions, basis_functions_derivs, find_span};
