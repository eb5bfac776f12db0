use actix_web::{HttpResponse, ResponseError, web};
use derive_more::{Display, Error};

use crate::hub::{HubClient, HubError};

#[derive(Debug, Error, Display)]
enum AdminApiError {
    #[display("Hub {slug} not found")]
    HubNotFound { slug: String },

    #[display("Hub unavailable: {cause}")]
    Unavailable { cause: HubError },
}

impl ResponseError for AdminApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        tracing::warn!("AdminApiError: {:?}", self);

        match self {
            AdminApiError::HubNotFound { .. } => StatusCode::NOT_FOUND,
            AdminApiError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

struct HubClients(Vec<HubClient>);

pub fn routes(clients: Vec<HubClient>) -> actix_web::Scope {
    web::scope("/api/hubs")
        .route("", web::get().to(get_hubs))
        .route("/{slug}", web::get().to(get_hub))
        .app_data(web::Data::new(HubClients(clients)))
}

async fn get_hubs(clients: web::Data<HubClients>) -> Result<HttpResponse, AdminApiError> {
    let mut snapshots = vec![];

    for client in clients.0.iter() {
        snapshots.push(client.snapshot().await.map_err(|cause| AdminApiError::Unavailable { cause })?);
    }

    Ok(HttpResponse::Ok().json(snapshots))
}

async fn get_hub(clients: web::Data<HubClients>, path: web::Path<String>) -> Result<HttpResponse, AdminApiError> {
    let slug = path.into_inner();

    let client = clients
        .0
        .iter()
        .find(|c| c.hub().slug == slug)
        .ok_or(AdminApiError::HubNotFound { slug })?;

    let snapshot = client.snapshot().await.map_err(|cause| AdminApiError::Unavailable { cause })?;
    Ok(HttpResponse::Ok().json(snapshot))
}
