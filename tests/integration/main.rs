//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one subsystem through
//! the public API, with mock adapters standing in for the network client
//! and the host's hat scheduler.

mod codegen_tests;
mod mock_session;
mod runtime_tests;
mod session_tests;
