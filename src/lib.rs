pub mod attachment; // Prescription compression
pub mod catalog; // Test catalog search index
pub mod config;
pub mod messages;
pub mod models;
pub mod submission; // Booking POST + envelope adapter
pub mod validation; // Step gates
pub mod wizard; // Booking wizard controller

pub use attachment::{AttachmentCompressor, AttachmentError, CompressionResult, SelectedFile};
pub use catalog::{CategoryFilter, TestCatalogIndex};
pub use config::Settings;
pub use submission::{BookingSubmitter, SubmissionOutcome};
pub use validation::Step;
pub use wizard::{WizardController, WizardError};

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise the build-profile default applies.
/// Safe to call more than once: later calls are no-ops.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}

/// Build a wizard for a new booking session from settings and catalog data.
///
/// `deep_link` pre-selects a test by id or code.
pub fn start_session(
    settings: &Settings,
    catalog: TestCatalogIndex,
    deep_link: Option<&str>,
) -> Result<WizardController, submission::SubmissionError> {
    let submitter = BookingSubmitter::http(&settings.booking)?;
    Ok(WizardController::new(catalog, submitter, settings).with_deep_link(deep_link))
}
