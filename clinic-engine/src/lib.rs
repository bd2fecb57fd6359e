//! Process bootstrap for the clinic application
//!
//! Builds one [`Store`] from configuration and hands it to every service, so
//! all services share the same backend and the same per-collection writer
//! locks.
//!
//! ```rust,no_run
//! # async fn run() -> anyhow::Result<()> {
//! use clinic_engine::ClinicEngine;
//! use std::path::Path;
//!
//! let engine = ClinicEngine::bootstrap(Some(Path::new("clinic.yaml"))).await?;
//! let outstanding = engine.ledger().get_outstanding().await?;
//! println!("{} charges outstanding", outstanding.len());
//! # Ok(())
//! # }
//! ```

pub mod records;

pub use records::{DoctorNote, Event, Memo, Patient, PatientRecord};

use alerts_service::AlertService;
use anyhow::Context;
use billing_service::{ChargeLedger, PaymentMethodRegistry};
use config_engine::ClinicConfig;
use document_store::{open_store, Collection, Store};
use error_common::Result;
use logger_redacted::RedactedLogger;
use std::path::Path;
use tracing::info;

/// Every clinic service, wired to one shared store
#[derive(Clone)]
pub struct ClinicEngine {
    store: Store,
    ledger: ChargeLedger,
    payment_methods: PaymentMethodRegistry,
    alerts: AlertService,
}

impl ClinicEngine {
    /// Load configuration, install logging and open the store
    ///
    /// # Errors
    ///
    /// Fails if the configuration cannot be loaded, a logger is already
    /// installed, or the store backend cannot be opened.
    pub async fn bootstrap(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = ClinicConfig::load(config_path).context("Failed to load clinic configuration")?;
        RedactedLogger::init(&config.logging).context("Failed to initialize logging")?;
        Self::from_config(&config).await
    }

    /// Open the configured store without touching the global logger
    ///
    /// # Errors
    ///
    /// Fails if the store backend cannot be opened.
    pub async fn from_config(config: &ClinicConfig) -> anyhow::Result<Self> {
        let store = open_store(&config.store)
            .await
            .with_context(|| format!("Failed to open {:?} document store", config.store.backend))?;

        info!(
            version = env!("CARGO_PKG_VERSION"),
            backend = store.backend_name(),
            "Clinic engine ready"
        );
        Ok(Self::with_store(store))
    }

    /// Wire the services to an existing store, e.g. an in-memory test double
    pub fn with_store(store: Store) -> Self {
        Self {
            ledger: ChargeLedger::new(&store),
            payment_methods: PaymentMethodRegistry::new(&store),
            alerts: AlertService::new(&store),
            store,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn ledger(&self) -> &ChargeLedger {
        &self.ledger
    }

    pub fn payment_methods(&self) -> &PaymentMethodRegistry {
        &self.payment_methods
    }

    pub fn alerts(&self) -> &AlertService {
        &self.alerts
    }

    pub fn patients(&self) -> Collection<Patient> {
        self.store.collection()
    }

    pub fn events(&self) -> Collection<Event> {
        self.store.collection()
    }

    pub fn memos(&self) -> Collection<Memo> {
        self.store.collection()
    }

    pub fn doctor_notes(&self) -> Collection<DoctorNote> {
        self.store.collection()
    }

    /// Records of one kind belonging to `patient_id`
    ///
    /// # Errors
    ///
    /// `Validation` if `patient_id` is empty, or the store's read error.
    pub async fn records_for_patient<T: PatientRecord>(&self, patient_id: &str) -> Result<Vec<T>> {
        if patient_id.trim().is_empty() {
            return Err(error_common::ClinicError::validation("Patient ID is required"));
        }
        self.store
            .collection::<T>()
            .filter(|record| record.patient_id() == Some(patient_id))
            .await
    }
}
