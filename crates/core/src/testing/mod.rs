//! Testing utilities and mock implementations.
//!
//! Mock providers for both external actions, so the full pipeline can be
//! exercised without a telephony service or a portal. Outcomes are
//! configurable per call and every interaction is recorded.

mod mock_entry;
mod mock_voice;

pub use mock_entry::MockEntryProvider;
pub use mock_voice::MockVoiceProvider;
