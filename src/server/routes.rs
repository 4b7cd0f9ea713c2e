//! The user-facing JSON web server that listens for comparison requests.
//! This is the "front end": it parses the request, hands the comparison to
//! the worker pool, and serializes the score.

use super::protocol;
use super::WebError;
use crate::compare::Method;
use crate::pool::{CompareJob, WorkerPool};
use actix_web::{get, post, web, HttpRequest, Responder};
use tracing::{error, info};

type Result<T> = std::result::Result<T, WebError>;

/// Handle an HTTP request to compare two images
#[post("/compare")]
pub async fn compare(
    req: web::Json<protocol::CompareRequest>,
    state: web::Data<WorkerPool>,
) -> Result<impl Responder> {
    let req = req.into_inner();
    let method = req
        .method
        .as_deref()
        .map(Method::from)
        .unwrap_or_default();

    let similarity = state
        .submit(CompareJob {
            image1: req.image1,
            image2: req.image2,
            method,
        })
        .await
        .map_err(|e| {
            error!("error in /compare route: {e}");
            WebError::from(e)
        })?;

    info!("finished serving comparison request ({method:?})");

    Ok(web::Json(protocol::CompareResponse { similarity }))
}

/// HTTP request to get pool statistics
#[get("/status")]
pub async fn status(_req: HttpRequest, state: web::Data<WorkerPool>) -> impl Responder {
    web::Json(protocol::StatusResponse {
        workers: state.workers(),
    })
}
