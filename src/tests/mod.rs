mod proptest_tests;
mod scenario_integration_tests;
pub mod test_helpers;
