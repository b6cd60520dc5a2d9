//! Scripted conduit for host tests.
//!
//! Each expected call is an exact register file paired with the result to
//! return. Calls are consumed in order; an unexpected or mismatching call panics.

use alloc::collections::VecDeque;

use super::{Conduit, Error, FunctionId, Registers};

#[derive(Debug)]
struct Expectation {
    args: Registers,
    result: Registers,
}

#[derive(Debug, Default)]
pub struct MockConduit {
    expectations: VecDeque<Expectation>,
    calls: usize,
}

impl MockConduit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_call(&mut self, args: Registers, result: Registers) -> &mut Self {
        self.expectations.push_back(Expectation { args, result });
        self
    }

    /// All scripted calls have been consumed.
    pub fn is_done(&self) -> bool {
        self.expectations.is_empty()
    }

    /// Number of calls performed so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Conduit for MockConduit {
    fn call(&mut self, args: Registers) -> Registers {
        self.calls += 1;

        let expectation = self
            .expectations
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected FF-A call {args:#x?}"));

        assert_eq!(
            expectation.args, args,
            "FF-A call #{} arguments mismatch",
            self.calls
        );

        expectation.result
    }
}

/// FFA_SUCCESS_32 result with the given payload in w2 and w3.
pub fn success(a2: u64, a3: u64) -> Registers {
    [u64::from(FunctionId::Success32), 0, a2, a3, 0, 0, 0, 0]
}

/// FFA_ERROR result carrying `error`.
pub fn error(error: Error) -> Registers {
    [
        u64::from(FunctionId::Error),
        0,
        error.code() as u32 as u64,
        0,
        0,
        0,
        0,
        0,
    ]
}

/// FFA_INTERRUPT result carrying `interrupt_id`.
pub fn interrupt(interrupt_id: u32) -> Registers {
    [
        u64::from(FunctionId::Interrupt),
        0,
        interrupt_id as u64,
        0,
        0,
        0,
        0,
        0,
    ]
}
