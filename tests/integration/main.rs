//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the pipeline against
//! mock adapters on a virtual clock.  All tests run on the host (x86_64)
//! with no real hardware required.

mod fault_tests;
mod mock_hw;
mod pipeline_tests;
