use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::public::home,
        api::public::list_books,
        // Add other endpoints here as we document them
    ),
    tags(
        (name = "maktaba", description = "Maktaba publishing API")
    )
)]
pub struct ApiDoc;
