//! Outcome passing between the leaf chain and wrapper implementations.
//!
//! Executing the leaf implementations of a hook produces an [`Outcome`]:
//! either the aggregated result value or the failure that aborted the
//! chain. Wrappers receive the outcome from the chain they bracket and may
//! inspect it or replace the result wholesale via
//! [`force_result`](Outcome::force_result).

use serde_json::Value;

use crate::decl::BoxError;

/// Result-or-failure of executing a hook's inner chain.
#[derive(Debug)]
pub struct Outcome {
    result: Result<Value, BoxError>,
}

impl Outcome {
    /// Successful outcome carrying the aggregated result.
    pub fn ok(value: Value) -> Self {
        Self { result: Ok(value) }
    }

    /// Failed outcome carrying the propagating error.
    pub fn err(error: BoxError) -> Self {
        Self { result: Err(error) }
    }

    /// Borrows the result, or the error that is propagating.
    pub fn get_result(&self) -> Result<&Value, &BoxError> {
        self.result.as_ref()
    }

    /// Replaces the outcome with a forced result, suppressing any error.
    pub fn force_result(&mut self, value: Value) {
        self.result = Ok(value);
    }

    /// `true` when an error is propagating.
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }

    /// Unwraps into the underlying result.
    pub fn into_result(self) -> Result<Value, BoxError> {
        self.result
    }
}

/// Continuation handed to a wrapper implementation.
///
/// Calling it executes everything inside the wrapper — the inner wrappers
/// and the leaf chain — and returns their [`Outcome`]. The wrapper yields
/// control exactly once: `call` consumes the continuation, so a second
/// invocation is rejected at compile time.
pub struct Next<'a> {
    run: &'a mut dyn FnMut() -> Outcome,
}

impl<'a> Next<'a> {
    /// Wraps the inner chain of a dispatch.
    pub fn new(run: &'a mut dyn FnMut() -> Outcome) -> Self {
        Self { run }
    }

    /// Runs the inner chain to completion.
    pub fn call(self) -> Outcome {
        (self.run)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_force_result_suppresses_error() {
        let mut outcome = Outcome::err("boom".into());
        assert!(outcome.is_failure());
        outcome.force_result(json!([1]));
        assert_eq!(outcome.into_result().unwrap(), json!([1]));
    }

    #[test]
    fn test_next_runs_chain() {
        let mut ran = false;
        let mut run = || {
            ran = true;
            Outcome::ok(Value::Null)
        };
        let outcome = Next::new(&mut run).call();
        assert!(ran);
        assert!(!outcome.is_failure());
    }
}
