//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one slice of the
//! orchestrator against scripted adapters.  No network or real timer is
//! involved.

mod mock_gateway;
mod orchestrator_tests;
