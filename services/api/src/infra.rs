use metrics_exporter_prometheus::PrometheusHandle;
use shelter_intake::auth::{AuthError, AuthService, Role, TokenAuthService};
use shelter_intake::config::{AppConfig, BootstrapConfig};
use shelter_intake::intake::{InMemoryIntakeRepository, TracingNotifier};
use shelter_intake::shelters::{
    DirectoryError, InMemoryShelterDirectory, NewShelter, Shelter, ShelterDirectory,
};
use shelter_intake::{AppError, IntakeApi, ServiceError};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ServiceApi = IntakeApi<InMemoryIntakeRepository, TracingNotifier>;

/// In-memory wiring shared by `serve` and `demo`.
pub(crate) struct Services {
    pub(crate) api: ServiceApi,
    pub(crate) auth: Arc<TokenAuthService>,
    pub(crate) shelters: Vec<Shelter>,
}

pub(crate) fn build_services(config: &AppConfig) -> Result<Services, AppError> {
    let directory = Arc::new(InMemoryShelterDirectory::default());
    let shelters = seed_shelters(&directory).map_err(ServiceError::from)?;

    let auth = Arc::new(TokenAuthService::new(&config.auth));
    bootstrap_accounts(&auth, &config.bootstrap)?;

    let api = IntakeApi::new(
        Arc::new(InMemoryIntakeRepository::default()),
        directory as Arc<dyn ShelterDirectory>,
        Arc::new(TracingNotifier),
        auth.clone() as Arc<dyn AuthService>,
        config.paging,
    );

    Ok(Services {
        api,
        auth,
        shelters,
    })
}

pub(crate) fn bootstrap_accounts(
    auth: &TokenAuthService,
    bootstrap: &BootstrapConfig,
) -> Result<(), AuthError> {
    let accounts = [
        (bootstrap.admin.as_ref(), Role::Admin),
        (bootstrap.staff.as_ref(), Role::Staff),
    ];
    for (credentials, role) in accounts {
        if let Some(credentials) = credentials {
            auth.add_account(&credentials.email, &credentials.password, role)?;
            tracing::info!(email = %credentials.email, role = role.label(), "bootstrap account ready");
        }
    }
    Ok(())
}

/// Nashville shelters loaded into every fresh directory.
pub(crate) fn seed_shelters(
    directory: &InMemoryShelterDirectory,
) -> Result<Vec<Shelter>, DirectoryError> {
    let seeds = [
        (
            "Downtown Family Shelter",
            "200 Church St, Nashville, TN",
            36.1655,
            -86.7822,
            "615-555-1001",
            "Walk-ins allowed; families prioritized.",
            "Open 24/7",
        ),
        (
            "East Nashville Community Housing",
            "900 Woodland St, Nashville, TN",
            36.1742,
            -86.7489,
            "615-555-1002",
            "Check-in 5-9pm; ID preferred but not required.",
            "5pm-9am daily",
        ),
        (
            "Northside Emergency Shelter",
            "1500 10th St N, Nashville, TN",
            36.1901,
            -86.7923,
            "615-555-1003",
            "Single adults; no pets.",
            "Open 24/7",
        ),
        (
            "Southside Outreach Center",
            "500 Nolensville Pike, Nashville, TN",
            36.1408,
            -86.7584,
            "615-555-1004",
            "Families and seniors; intake interview required.",
            "9am-10pm",
        ),
        (
            "West End Support Shelter",
            "2500 West End Ave, Nashville, TN",
            36.1517,
            -86.8031,
            "615-555-1005",
            "First-come, first-served. Sobriety required.",
            "6pm-8am",
        ),
    ];

    seeds
        .into_iter()
        .map(|(name, address, geo_lat, geo_lng, phone, policies, hours)| {
            directory.insert(NewShelter {
                name: name.to_string(),
                address: address.to_string(),
                geo_lat,
                geo_lng,
                beds_total: 0,
                beds_available: 0,
                phone: Some(phone.to_string()),
                hours: Some(hours.to_string()),
                policies: Some(policies.to_string()),
            })
        })
        .collect()
}
