use actix_web::{middleware, web, App, HttpServer};
use imgsim::config;
use imgsim::pool::WorkerPool;
use imgsim::server::routes;
use imgsim::util;
use std::{env, io};

use tracing::info;

#[actix_web::main]
async fn main() -> io::Result<()> {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", config::RUST_LOG);
    }
    tracing_subscriber::fmt::init();

    let port = util::find_free_port(config::START_PORT)
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrInUse, "no free port found"))?;

    let pool = web::Data::new(WorkerPool::new(config::POOL_WORKERS));

    info!("listening on 0.0.0.0:{port}");

    // Start the HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .wrap(middleware::Logger::default())
            .service(routes::compare)
            .service(routes::status)
    })
    .bind(format!("0.0.0.0:{port}"))?
    .run()
    .await
}
