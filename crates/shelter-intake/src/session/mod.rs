//! Administrator session: holds the signed-in identity and the current query, and
//! keeps the displayed page consistent with the latest query and status changes.

mod transitions;

pub use transitions::{apply_filter_change, replace_by_id, Change, FilterPatch};

use crate::auth::{authorize, AuthService, Role, UserIdentity};
use crate::error::{ErrorKind, ServiceError};
use crate::http::IntakeApi;
use crate::intake::{
    CsvExport, IntakeFilter, IntakeId, IntakeNotifier, IntakePage, IntakeRepository,
    IntakeStatus, IntakeView, QuerySpec,
};

/// Operations an admin session issues against the intake service.
pub trait IntakeBackend {
    fn search(&self, spec: &QuerySpec) -> Result<IntakePage, ServiceError>;
    fn export_csv(&self, filter: &IntakeFilter) -> Result<CsvExport, ServiceError>;
    fn set_status(
        &self,
        id: IntakeId,
        status: IntakeStatus,
        actor: &UserIdentity,
    ) -> Result<IntakeView, ServiceError>;
}

impl<R, N> IntakeBackend for IntakeApi<R, N>
where
    R: IntakeRepository + 'static,
    N: IntakeNotifier + 'static,
{
    fn search(&self, spec: &QuerySpec) -> Result<IntakePage, ServiceError> {
        self.queries.search(spec)
    }

    fn export_csv(&self, filter: &IntakeFilter) -> Result<CsvExport, ServiceError> {
        self.queries.export_csv(filter)
    }

    fn set_status(
        &self,
        id: IntakeId,
        status: IntakeStatus,
        actor: &UserIdentity,
    ) -> Result<IntakeView, ServiceError> {
        self.store.set_status(id, status, actor)
    }
}

/// A query that has been issued but whose result has not been applied yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    generation: u64,
    pub spec: QuerySpec,
}

pub struct AdminSession<B> {
    backend: B,
    identity: Option<UserIdentity>,
    spec: QuerySpec,
    page: IntakePage,
    generation: u64,
}

impl<B: IntakeBackend> AdminSession<B> {
    pub fn new(backend: B, page_size: u32) -> Self {
        Self {
            backend,
            identity: None,
            spec: QuerySpec::first_page(IntakeFilter::default(), page_size),
            page: IntakePage::default(),
            generation: 0,
        }
    }

    pub fn sign_in(
        &mut self,
        auth: &dyn AuthService,
        email: &str,
        password: &str,
    ) -> Result<&UserIdentity, ServiceError> {
        let token = auth.login(email, password)?;
        let identity = auth.resolve(&token.access_token)?;
        tracing::info!(email = %identity.email, role = identity.role.label(), "session signed in");
        Ok(&*self.identity.insert(identity))
    }

    /// Drops the identity and everything fetched under it. In-flight queries become stale.
    pub fn sign_out(&mut self) {
        self.identity = None;
        self.page = IntakePage::default();
        self.generation += 1;
    }

    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// The page from the latest successful query.
    pub fn page(&self) -> &IntakePage {
        &self.page
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn update_filters(&mut self, patch: FilterPatch) -> Result<&IntakePage, ServiceError> {
        let next = apply_filter_change(&self.spec, patch);
        self.run(next)
    }

    pub fn go_to_page(&mut self, page: u32) -> Result<&IntakePage, ServiceError> {
        let next = QuerySpec {
            page,
            ..self.spec.clone()
        };
        self.run(next)
    }

    pub fn set_page_size(&mut self, page_size: u32) -> Result<&IntakePage, ServiceError> {
        let next = QuerySpec {
            page_size,
            ..self.spec.clone()
        };
        self.run(next)
    }

    pub fn refresh(&mut self) -> Result<&IntakePage, ServiceError> {
        let current = self.spec.clone();
        self.run(current)
    }

    /// Stamp a query with a fresh generation. Any query begun earlier becomes stale.
    pub fn begin_query(&mut self, spec: QuerySpec) -> Result<PendingQuery, ServiceError> {
        authorize(self.identity.as_ref(), Role::Admin)?;
        self.generation += 1;
        Ok(PendingQuery {
            generation: self.generation,
            spec,
        })
    }

    /// Apply a query result. Returns `Ok(false)` when the query was superseded, in which
    /// case the result (success or failure) is dropped. Session state only moves forward
    /// on success.
    pub fn complete_query(
        &mut self,
        pending: PendingQuery,
        result: Result<IntakePage, ServiceError>,
    ) -> Result<bool, ServiceError> {
        if pending.generation != self.generation {
            tracing::debug!(
                generation = pending.generation,
                latest = self.generation,
                "stale query result discarded"
            );
            return Ok(false);
        }
        self.page = result?;
        self.spec = pending.spec;
        Ok(true)
    }

    /// Set one request's status and patch it into the displayed page. On failure the
    /// page is left exactly as it was.
    pub fn change_status(
        &mut self,
        id: IntakeId,
        status: IntakeStatus,
    ) -> Result<IntakeView, ServiceError> {
        let actor = authorize(self.identity.as_ref(), Role::Admin)?;
        let updated = self.backend.set_status(id, status, actor)?;
        self.page = replace_by_id(&self.page, &updated);
        Ok(updated)
    }

    /// Export every request matching the current filters.
    pub fn export_csv(&self) -> Result<CsvExport, ServiceError> {
        authorize(self.identity.as_ref(), Role::Admin)?;
        self.backend.export_csv(&self.spec.filter)
    }

    fn run(&mut self, spec: QuerySpec) -> Result<&IntakePage, ServiceError> {
        let pending = self.begin_query(spec)?;
        let result = self.backend.search(&pending.spec);
        self.complete_query(pending, result)?;
        Ok(&self.page)
    }
}

/// Text shown to an administrator for a failed operation.
pub fn user_message(error: &ServiceError) -> String {
    match error.kind() {
        ErrorKind::ValidationError => format!("Please check your input: {error}"),
        ErrorKind::NotFoundError => "That intake request no longer exists.".to_string(),
        ErrorKind::AuthorizationError => {
            "You are not authorized to do that. Sign in as an administrator.".to_string()
        }
        ErrorKind::ExportError => "The export failed. No file was produced.".to_string(),
        ErrorKind::UnavailableError => {
            "The service is temporarily unavailable. Try again shortly.".to_string()
        }
    }
}

