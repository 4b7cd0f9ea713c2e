use crate::compare::CompareError;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use std::collections::HashMap;

mod protocol;
pub mod routes;

/// Boundary error for the HTTP layer. Decode failures are the client's
/// fault (400); everything else is internal (500). The body is always
/// `{"error": "<message>"}` -- no stack traces leak to the client.
#[derive(Debug)]
pub struct WebError {
    err: anyhow::Error,
    status: StatusCode,
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.err)
    }
}

impl actix_web::error::ResponseError for WebError {
    fn error_response(&self) -> HttpResponse {
        let body = HashMap::from([("error", self.to_string())]);

        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.status
    }
}

impl From<CompareError> for WebError {
    fn from(err: CompareError) -> WebError {
        let status = match err {
            CompareError::Base64(_) | CompareError::Image(_) => StatusCode::BAD_REQUEST,
            CompareError::Shape(_) | CompareError::PoolClosed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        WebError {
            err: err.into(),
            status,
        }
    }
}
