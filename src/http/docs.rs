//! OpenAPI document served behind the Swagger UI

use utoipa::OpenApi;

use super::handlers;
use crate::error::ErrorDetail;
use crate::tools::EncodingType;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ATRAC API",
        description = "Encode, transcode and decode ATRAC3 (LP2/LP4) audio"
    ),
    paths(handlers::encode, handlers::transcode, handlers::decode),
    components(schemas(ErrorDetail, EncodingType, handlers::UploadForm)),
    tags((name = "atrac", description = "Audio conversion"))
)]
pub struct ApiDoc;
