use crate::infra::{deserialize_date, deserialize_optional_date, AppState, LedgerServices};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use chrono::{NaiveDate, Utc};
use rent_ledger::error::AppError;
use rent_ledger::leasing::accounting::PortfolioRefresh;
use rent_ledger::leasing::domain::{
    ComplexId, Document, DocumentId, Lease, LeaseId, Message, PaymentStatus, PriceStatus, Problem,
    ProblemId, Property, PropertyComplex, PropertyId, RentalUnitRef, Unit, UserId,
};
use rent_ledger::leasing::notify::EmailGateway;
use rent_ledger::leasing::repository::StoreError;
use rent_ledger::leasing::tenancy::{NewProperty, NewUnit, TenantRemoval};
use rent_ledger::leasing::{months_due, remaining_months, LedgerStore};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct NewComplexRequest {
    pub(crate) address: String,
    pub(crate) owner: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewLeaseRequest {
    pub(crate) unit: RentalUnitRef,
    #[serde(default)]
    pub(crate) tenants: Vec<UserId>,
    #[serde(deserialize_with = "deserialize_date")]
    pub(crate) start_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_date")]
    pub(crate) end_date: NaiveDate,
    pub(crate) monthly_amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddTenantRequest {
    pub(crate) tenant: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaymentRequest {
    pub(crate) months: u32,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RefreshRequest {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewProblemRequest {
    pub(crate) tenant: UserId,
    pub(crate) unit: RentalUnitRef,
    pub(crate) description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewDocumentRequest {
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) lease: Option<LeaseId>,
    pub(crate) storage_key: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AsOfQuery {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

/// A lease joined with its derived accounting figures as of one date.
#[derive(Debug, Serialize)]
pub(crate) struct LeaseView {
    #[serde(flatten)]
    pub(crate) lease: Lease,
    pub(crate) months_due: u32,
    pub(crate) remaining_months: u32,
    pub(crate) as_of: NaiveDate,
}

fn lease_view(lease: Lease, today: NaiveDate) -> LeaseView {
    let due = months_due(&lease, today);
    let remaining = remaining_months(&lease, today);
    LeaseView {
        lease,
        months_due: due,
        remaining_months: remaining,
        as_of: today,
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PaymentOutcome {
    pub(crate) accepted: bool,
    pub(crate) lease: LeaseView,
}

pub(crate) fn with_ledger_routes<S, E>(services: Arc<LedgerServices<S, E>>) -> Router
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/properties", post(register_property_endpoint::<S, E>))
        .route(
            "/api/v1/properties/:property_id/rent-status",
            post(toggle_rent_status_endpoint::<S, E>),
        )
        .route("/api/v1/complexes", post(register_complex_endpoint::<S, E>))
        .route(
            "/api/v1/complexes/:complex_id/units",
            post(register_unit_endpoint::<S, E>),
        )
        .route("/api/v1/leases", post(create_lease_endpoint::<S, E>))
        .route(
            "/api/v1/leases/:lease_id",
            get(lease_endpoint::<S, E>).delete(terminate_lease_endpoint::<S, E>),
        )
        .route(
            "/api/v1/leases/:lease_id/tenants",
            post(add_tenant_endpoint::<S, E>),
        )
        .route(
            "/api/v1/leases/:lease_id/tenants/:tenant_id",
            delete(remove_tenant_endpoint::<S, E>),
        )
        .route(
            "/api/v1/leases/:lease_id/payments",
            post(payment_endpoint::<S, E>),
        )
        .route(
            "/api/v1/leases/:lease_id/refresh",
            post(refresh_lease_endpoint::<S, E>),
        )
        .route(
            "/api/v1/leases/:lease_id/documents",
            get(lease_documents_endpoint::<S, E>),
        )
        .route(
            "/api/v1/landlords/:owner_id/refresh",
            post(refresh_portfolio_endpoint::<S, E>),
        )
        .route(
            "/api/v1/landlords/:owner_id/problems",
            get(landlord_problems_endpoint::<S, E>),
        )
        .route("/api/v1/problems", post(report_problem_endpoint::<S, E>))
        .route(
            "/api/v1/problems/:problem_id/resolve",
            post(resolve_problem_endpoint::<S, E>),
        )
        .route("/api/v1/documents", post(attach_document_endpoint::<S, E>))
        .route(
            "/api/v1/documents/:document_id/verify",
            post(verify_document_endpoint::<S, E>),
        )
        .route(
            "/api/v1/users/:user_id/messages",
            get(user_messages_endpoint::<S, E>),
        )
        .with_state(services)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn register_property_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Json(intake): Json<NewProperty>,
) -> Result<(StatusCode, Json<Property>), AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    let property = services.tenancy.register_property(intake)?;
    Ok((StatusCode::CREATED, Json(property)))
}

pub(crate) async fn toggle_rent_status_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Path(property_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    let status: PriceStatus = services
        .tenancy
        .toggle_rent_status(&PropertyId(property_id))?;
    Ok(Json(json!({ "rent_status": status })))
}

pub(crate) async fn register_complex_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Json(payload): Json<NewComplexRequest>,
) -> Result<(StatusCode, Json<PropertyComplex>), AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    let complex = services
        .tenancy
        .register_complex(payload.address, payload.owner)?;
    Ok((StatusCode::CREATED, Json(complex)))
}

pub(crate) async fn register_unit_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Path(complex_id): Path<String>,
    Json(intake): Json<NewUnit>,
) -> Result<(StatusCode, Json<Unit>), AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    let unit = services
        .tenancy
        .register_unit(&ComplexId(complex_id), intake)?;
    Ok((StatusCode::CREATED, Json(unit)))
}

pub(crate) async fn create_lease_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Json(payload): Json<NewLeaseRequest>,
) -> Result<(StatusCode, Json<LeaseView>), AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    let lease = services.tenancy.create_lease(
        payload.unit,
        payload.tenants,
        payload.start_date,
        payload.end_date,
        payload.monthly_amount,
    )?;
    let today = services.today();
    Ok((StatusCode::CREATED, Json(lease_view(lease, today))))
}

pub(crate) async fn lease_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Path(lease_id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> Result<Json<LeaseView>, AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    let lease = services
        .store
        .lease(&LeaseId(lease_id))?
        .ok_or(StoreError::NotFound)?;
    let today = query.today.unwrap_or_else(|| services.today());
    Ok(Json(lease_view(lease, today)))
}

pub(crate) async fn terminate_lease_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Path(lease_id): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    services.tenancy.terminate_lease(&LeaseId(lease_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn add_tenant_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Path(lease_id): Path<String>,
    Json(payload): Json<AddTenantRequest>,
) -> Result<StatusCode, AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    services
        .tenancy
        .add_tenant(&LeaseId(lease_id), payload.tenant)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn remove_tenant_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Path((lease_id, tenant_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    let outcome = services
        .tenancy
        .remove_tenant(&LeaseId(lease_id), &UserId(tenant_id))?;
    Ok(Json(json!({
        "lease_closed": outcome == TenantRemoval::LeaseClosed
    })))
}

pub(crate) async fn payment_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Path(lease_id): Path<String>,
    Json(payload): Json<PaymentRequest>,
) -> Result<Json<PaymentOutcome>, AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    let lease_id = LeaseId(lease_id);
    let today = payload.today.unwrap_or_else(|| services.today());
    let accepted = services.accounting.pay(&lease_id, payload.months, today)?;
    let lease = services
        .store
        .lease(&lease_id)?
        .ok_or(StoreError::NotFound)?;
    Ok(Json(PaymentOutcome {
        accepted,
        lease: lease_view(lease, today),
    }))
}

pub(crate) async fn refresh_lease_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Path(lease_id): Path<String>,
    payload: Option<Json<RefreshRequest>>,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    let today = payload
        .and_then(|Json(request)| request.today)
        .unwrap_or_else(|| services.today());
    let status: PaymentStatus = services
        .accounting
        .update_payment_status(&LeaseId(lease_id), today)?;
    Ok(Json(json!({ "payment_status": status, "as_of": today })))
}

pub(crate) async fn refresh_portfolio_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Path(owner_id): Path<String>,
    payload: Option<Json<RefreshRequest>>,
) -> Result<Json<PortfolioRefresh>, AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    let today = payload
        .and_then(|Json(request)| request.today)
        .unwrap_or_else(|| services.today());
    let outcome = services
        .accounting
        .refresh_portfolio(&UserId(owner_id), today)?;
    Ok(Json(outcome))
}

pub(crate) async fn report_problem_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Json(payload): Json<NewProblemRequest>,
) -> Result<(StatusCode, Json<Problem>), AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    let problem = services.problems.report(
        payload.tenant,
        payload.unit,
        payload.description,
        Utc::now(),
    )?;
    Ok((StatusCode::CREATED, Json(problem)))
}

pub(crate) async fn landlord_problems_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Path(owner_id): Path<String>,
) -> Result<Json<Vec<Problem>>, AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    let problems = services.store.problems_by_owner(&UserId(owner_id))?;
    Ok(Json(problems))
}

pub(crate) async fn resolve_problem_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Path(problem_id): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    services
        .problems
        .resolve(&ProblemId(problem_id), Utc::now())?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn attach_document_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Json(payload): Json<NewDocumentRequest>,
) -> Result<(StatusCode, Json<Document>), AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    let document = services.documents.attach(
        payload.title,
        payload.lease,
        payload.storage_key,
        Utc::now(),
    )?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub(crate) async fn verify_document_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Path(document_id): Path<String>,
) -> Result<Json<Document>, AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    let document = services.documents.verify(&DocumentId(document_id))?;
    Ok(Json(document))
}

pub(crate) async fn lease_documents_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Path(lease_id): Path<String>,
) -> Result<Json<Vec<Document>>, AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    let documents = services.documents.for_lease(&LeaseId(lease_id))?;
    Ok(Json(documents))
}

pub(crate) async fn user_messages_endpoint<S, E>(
    State(services): State<Arc<LedgerServices<S, E>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Message>>, AppError>
where
    S: LedgerStore + 'static,
    E: EmailGateway + 'static,
{
    let messages = services.store.messages_for(&UserId(user_id))?;
    Ok(Json(messages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::LoggingMailer;
    use rent_ledger::leasing::domain::{PaymentStatus, PropertyKind};
    use rent_ledger::leasing::MemoryLedger;
    use rust_decimal_macros::dec;

    fn test_services() -> Arc<LedgerServices<MemoryLedger, LoggingMailer>> {
        Arc::new(LedgerServices::new(
            Arc::new(MemoryLedger::new()),
            Arc::new(LoggingMailer::new("ledger@test.local".to_string())),
        ))
    }

    fn house_intake() -> NewProperty {
        NewProperty {
            owner: UserId("landlord-1".to_string()),
            address: "12 Cherry Lane".to_string(),
            kind: PropertyKind::House,
            size: "1400 sqft".to_string(),
            bedrooms: 3,
            bathrooms: 2,
            parking_spaces: 1,
            amenities: String::new(),
            description: String::new(),
            monthly_rent: dec!(1000),
            rent_status: PriceStatus::Fixed,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    async fn seeded_lease(
        services: &Arc<LedgerServices<MemoryLedger, LoggingMailer>>,
    ) -> LeaseId {
        let (_, Json(property)) =
            register_property_endpoint(State(services.clone()), Json(house_intake()))
                .await
                .expect("property registered");

        let request = NewLeaseRequest {
            unit: RentalUnitRef::Property(property.id),
            tenants: vec![UserId("tenant-1".to_string())],
            start_date: date(2024, 1, 15),
            end_date: date(2025, 1, 15),
            monthly_amount: dec!(1000),
        };
        let (status, Json(view)) = create_lease_endpoint(State(services.clone()), Json(request))
            .await
            .expect("lease created");
        assert_eq!(status, StatusCode::CREATED);
        view.lease.id
    }

    #[tokio::test]
    async fn lease_endpoint_reports_due_and_remaining_as_of_a_date() {
        let services = test_services();
        let lease_id = seeded_lease(&services).await;

        let Json(view) = lease_endpoint(
            State(services.clone()),
            Path(lease_id.0.clone()),
            Query(AsOfQuery {
                today: Some(date(2024, 4, 20)),
            }),
        )
        .await
        .expect("lease found");

        assert_eq!(view.months_due, 3);
        assert_eq!(view.remaining_months, 8);
        assert_eq!(view.as_of, date(2024, 4, 20));
    }

    #[tokio::test]
    async fn payment_endpoint_credits_and_reports_the_outcome() {
        let services = test_services();
        let lease_id = seeded_lease(&services).await;

        let Json(outcome) = payment_endpoint(
            State(services.clone()),
            Path(lease_id.0.clone()),
            Json(PaymentRequest {
                months: 2,
                today: Some(date(2024, 4, 20)),
            }),
        )
        .await
        .expect("payment processed");

        assert!(outcome.accepted);
        assert_eq!(outcome.lease.months_due, 1);
        assert_eq!(outcome.lease.lease.amount_paid, dec!(2000));
        assert_eq!(outcome.lease.lease.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn payment_endpoint_refuses_when_nothing_is_due() {
        let services = test_services();
        let lease_id = seeded_lease(&services).await;

        let Json(outcome) = payment_endpoint(
            State(services.clone()),
            Path(lease_id.0.clone()),
            Json(PaymentRequest {
                months: 1,
                today: Some(date(2024, 1, 20)),
            }),
        )
        .await
        .expect("payment handled");

        assert!(!outcome.accepted);
        assert_eq!(outcome.lease.lease.amount_paid, Decimal::ZERO);
    }

    #[tokio::test]
    async fn removing_the_last_tenant_reports_the_closed_lease() {
        let services = test_services();
        let lease_id = seeded_lease(&services).await;

        let Json(body) = remove_tenant_endpoint(
            State(services.clone()),
            Path((lease_id.0.clone(), "tenant-1".to_string())),
        )
        .await
        .expect("tenant removed");

        assert_eq!(body["lease_closed"], serde_json::Value::Bool(true));
        let missing = lease_endpoint(
            State(services.clone()),
            Path(lease_id.0.clone()),
            Query(AsOfQuery::default()),
        )
        .await;
        assert!(missing.is_err());
    }
}
