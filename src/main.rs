mod config;
mod database;
mod error;
mod films;
mod friends;
mod model;
mod ratings;
mod routes;
mod users;
mod validation;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::{Config, DEFAULT_LOG_FILTER};
use films::FilmService;
use log::info;
use users::UserService;

fn startup_error(err: error::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    env_logger::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER)).init();

    let config = Config::from_env();
    match &config.db_path {
        Some(path) => info!("Opening database at {}", path.display()),
        None => info!("Opening temporary database"),
    }
    let db = database::open(config.db_path.as_deref()).map_err(startup_error)?;

    let films = web::Data::new(FilmService::new(db.clone()).map_err(startup_error)?);
    let users = web::Data::new(UserService::new(db).map_err(startup_error)?);

    info!("Listening on {}", config.bind);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(films.clone())
            .app_data(users.clone())
            .configure(routes::configure)
    })
    .bind(&config.bind)?
    .run()
    .await
}
