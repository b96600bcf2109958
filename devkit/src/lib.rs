/*!
# Clusterwatch DevKit - mocks and utilities for development

Library for developing and testing clusterwatch without a cluster:
- Scripted kubectl/ssh runner with delays and concurrency tracking
- Fixtures producing inventory, probe, deployment and pod output
- Recording screen and harness for refresh/command loop scenarios
*/

pub mod fixtures;
pub mod mock_runner;
pub mod test_utils;

pub use mock_runner::{MockReply, MockRunner, RecordedCall};
pub use test_utils::{assert_sorted_unique, RecordingScreen, TestHarness};
