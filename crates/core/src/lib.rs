pub mod agents;
pub mod config;
pub mod csv_import;
pub mod lead;
pub mod scheduler;
pub mod testing;
pub mod workflow;

pub use agents::{
    ActionOutcome, ActionResult, ActivitySnapshot, ActivityTracker, AgentRunner, Coordinator,
    EntryProvider, OutreachCoordinator, PhoneApiVoiceProvider, PortalEntryProvider,
    SubmissionCoordinator, VoiceProvider,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    EntryProviderConfig, ImportConfig, SanitizedConfig, VoiceProviderConfig, WorkflowConfig,
};
pub use csv_import::{CsvImporter, FileReport, ImportError, ImportReport};
pub use lead::{
    AgentRole, BatchInsertReport, Claim, Lead, LeadError, LeadFilter, LeadPatch, LeadStatus,
    LeadStore, NewLead, ResetSummary, SqliteLeadStore, StatusCount,
};
pub use scheduler::WorkScheduler;
pub use workflow::{transitions, RetryDecision, RetryPolicy};
