use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::auth::{AuthService, Role, TokenAuthService, UserIdentity};
use crate::config::{AuthConfig, PagingConfig};
use crate::http::{api_router, IntakeApi};
use crate::intake::domain::{
    IntakeDraft, IntakeId, IntakeRequest, IntakeStatus, NewIntake, StatusChange, StatusTransition,
};
use crate::intake::memory::InMemoryIntakeRepository;
use crate::intake::notify::{IntakeNotice, IntakeNotifier, NotifyError};
use crate::intake::query::IntakeFilter;
use crate::intake::repository::{IntakeRepository, RepositoryError};
use crate::shelters::{InMemoryShelterDirectory, NewShelter, ShelterDirectory, ShelterId};

pub(super) const ADMIN_EMAIL: &str = "admin@shelters.example.org";
pub(super) const STAFF_EMAIL: &str = "outreach@shelters.example.org";
pub(super) const PASSWORD: &str = "correct horse battery";

pub(super) fn utc(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

pub(super) fn shelter(name: &str, address: &str) -> NewShelter {
    NewShelter {
        name: name.to_string(),
        address: address.to_string(),
        geo_lat: 36.16,
        geo_lng: -86.78,
        beds_total: 40,
        beds_available: 12,
        phone: Some("615-555-1000".to_string()),
        hours: Some("Open 24/7".to_string()),
        policies: None,
    }
}

pub(super) fn admin() -> UserIdentity {
    UserIdentity {
        email: ADMIN_EMAIL.to_string(),
        role: Role::Admin,
    }
}

pub(super) fn staff() -> UserIdentity {
    UserIdentity {
        email: STAFF_EMAIL.to_string(),
        role: Role::Staff,
    }
}

pub(super) fn intake_for(shelter_id: ShelterId, name: &str) -> NewIntake {
    NewIntake {
        shelter_id,
        name: Some(name.to_string()),
        reason: Some("Needs a bed tonight".to_string()),
        eta: None,
    }
}

pub(super) fn auth_service() -> Arc<TokenAuthService> {
    let auth = TokenAuthService::new(&AuthConfig {
        jwt_secret: "intake-test-secret".to_string(),
        token_ttl_minutes: 60,
    });
    auth.add_account(ADMIN_EMAIL, PASSWORD, Role::Admin)
        .expect("admin account");
    auth.add_account(STAFF_EMAIL, PASSWORD, Role::Staff)
        .expect("staff account");
    Arc::new(auth)
}

/// Two shelters, an empty repository, a recording notifier, and two accounts.
pub(super) struct Fixture {
    pub(super) api: IntakeApi<InMemoryIntakeRepository, RecordingNotifier>,
    pub(super) repository: Arc<InMemoryIntakeRepository>,
    pub(super) notifier: Arc<RecordingNotifier>,
    pub(super) directory: Arc<InMemoryShelterDirectory>,
    pub(super) auth: Arc<TokenAuthService>,
    pub(super) downtown: ShelterId,
    pub(super) east: ShelterId,
}

impl Fixture {
    pub(super) fn new() -> Self {
        let directory = Arc::new(InMemoryShelterDirectory::default());
        let downtown = directory
            .insert(shelter("Downtown Family Shelter", "200 Church St, Nashville, TN"))
            .expect("shelter")
            .id;
        let east = directory
            .insert(shelter(
                "East Nashville Community Housing",
                "900 Woodland St, Nashville, TN",
            ))
            .expect("shelter")
            .id;

        let repository = Arc::new(InMemoryIntakeRepository::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let auth = auth_service();
        let api = IntakeApi::new(
            repository.clone(),
            directory.clone() as Arc<dyn ShelterDirectory>,
            notifier.clone(),
            auth.clone() as Arc<dyn AuthService>,
            PagingConfig::default(),
        );

        Self {
            api,
            repository,
            notifier,
            directory,
            auth,
            downtown,
            east,
        }
    }

    /// Insert a request with a fixed creation time and, optionally, a non-pending status.
    pub(super) fn seed(
        &self,
        shelter_id: ShelterId,
        created_at: &str,
        status: IntakeStatus,
    ) -> IntakeId {
        let created = self
            .api
            .store
            .create_at(intake_for(shelter_id, "Seeded"), utc(created_at))
            .expect("seeded intake");
        if status != IntakeStatus::Pending {
            self.api
                .store
                .set_status(created.id, status, &admin())
                .expect("seeded status");
        }
        created.id
    }

    pub(super) fn router(&self) -> axum::Router {
        api_router(self.api.clone())
    }

    pub(super) fn token(&self, email: &str) -> String {
        self.auth
            .login(email, PASSWORD)
            .expect("login succeeds")
            .access_token
    }
}

pub(super) fn get_with_token(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

pub(super) fn json_request(method: &str, uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("request")
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = read_body(response).await;
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    notices: Mutex<Vec<IntakeNotice>>,
}

impl RecordingNotifier {
    pub(super) fn notices(&self) -> Vec<IntakeNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

impl IntakeNotifier for RecordingNotifier {
    fn notify(&self, notice: IntakeNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl IntakeNotifier for FailingNotifier {
    fn notify(&self, _notice: IntakeNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl IntakeRepository for UnavailableRepository {
    fn insert(&self, _draft: IntakeDraft) -> Result<IntakeRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: IntakeId) -> Result<Option<IntakeRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn apply_status(
        &self,
        _id: IntakeId,
        _status: IntakeStatus,
        _changed_by: &str,
        _at: DateTime<Utc>,
    ) -> Result<StatusChange, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn matching(&self, _filter: &IntakeFilter) -> Result<Vec<IntakeRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn transitions(&self, _id: IntakeId) -> Result<Vec<StatusTransition>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn unavailable_api(
    directory: Arc<InMemoryShelterDirectory>,
) -> IntakeApi<UnavailableRepository, RecordingNotifier> {
    IntakeApi::new(
        Arc::new(UnavailableRepository),
        directory as Arc<dyn ShelterDirectory>,
        Arc::new(RecordingNotifier::default()),
        auth_service() as Arc<dyn AuthService>,
        PagingConfig::default(),
    )
}
