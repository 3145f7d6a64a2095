use crate::error::Result;
use crate::films::FilmService;
use crate::friends::FriendshipState;
use crate::model::*;
use crate::users::UserService;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

pub type Films = web::Data<FilmService<sled::Db>>;
pub type Users = web::Data<UserService<sled::Db>>;

const DEFAULT_POPULAR_COUNT: usize = 10;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/films")
            .route(web::get().to(find_films))
            .route(web::post().to(create_film))
            .route(web::put().to(update_film)),
    )
    .service(web::resource("/films/popular").route(web::get().to(popular_films)))
    .service(web::resource("/films/{id}").route(web::get().to(find_film)))
    .service(
        web::resource("/films/{id}/like/{user_id}")
            .route(web::put().to(add_like))
            .route(web::delete().to(remove_like)),
    )
    .service(
        web::resource("/users")
            .route(web::get().to(find_users))
            .route(web::post().to(create_user))
            .route(web::put().to(update_user)),
    )
    .service(web::resource("/users/{id}").route(web::get().to(find_user)))
    .service(web::resource("/users/{id}/friends").route(web::get().to(find_friends)))
    .service(
        web::resource("/users/{id}/friends/common/{other_id}")
            .route(web::get().to(find_common_friends)),
    )
    .service(
        web::resource("/users/{id}/friends/{friend_id}")
            .route(web::put().to(add_friend))
            .route(web::delete().to(remove_friendship)),
    )
    .service(
        web::resource("/users/{id}/friends/{friend_id}/confirm")
            .route(web::put().to(create_friendship)),
    )
    .service(
        web::resource("/users/{id}/friends/{friend_id}/state")
            .route(web::get().to(friendship_state)),
    )
    .service(web::resource("/genres").route(web::get().to(find_genres)))
    .service(web::resource("/genres/{id}").route(web::get().to(find_genre)))
    .service(web::resource("/mpa").route(web::get().to(find_mpas)))
    .service(web::resource("/mpa/{id}").route(web::get().to(find_mpa)));
}

async fn find_films(films: Films) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(films.find_all()?))
}

async fn create_film(films: Films, film: web::Json<Film>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(films.create(film.into_inner())?))
}

async fn update_film(films: Films, film: web::Json<Film>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(films.update(film.into_inner())?))
}

async fn find_film(films: Films, id: web::Path<Id>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(films.find_by_id(id.into_inner())?))
}

#[derive(Deserialize)]
struct PopularParams {
    count: Option<usize>,
}

async fn popular_films(films: Films, params: web::Query<PopularParams>) -> Result<HttpResponse> {
    let count = params.count.unwrap_or(DEFAULT_POPULAR_COUNT);
    Ok(HttpResponse::Ok().json(films.find_popular(count)?))
}

async fn add_like(films: Films, path: web::Path<(Id, Id)>) -> Result<HttpResponse> {
    let (film_id, user_id) = path.into_inner();
    films.add_like(film_id, user_id)?;
    Ok(HttpResponse::Ok().finish())
}

async fn remove_like(films: Films, path: web::Path<(Id, Id)>) -> Result<HttpResponse> {
    let (film_id, user_id) = path.into_inner();
    films.remove_like(film_id, user_id)?;
    Ok(HttpResponse::Ok().finish())
}

async fn find_users(users: Users) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(users.find_all()?))
}

async fn create_user(users: Users, user: web::Json<User>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(users.create(user.into_inner())?))
}

async fn update_user(users: Users, user: web::Json<User>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(users.update(user.into_inner())?))
}

async fn find_user(users: Users, id: web::Path<Id>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(users.find_by_id(id.into_inner())?))
}

async fn find_friends(users: Users, id: web::Path<Id>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(users.find_friends(id.into_inner())?))
}

async fn find_common_friends(users: Users, path: web::Path<(Id, Id)>) -> Result<HttpResponse> {
    let (user_id, other_id) = path.into_inner();
    Ok(HttpResponse::Ok().json(users.find_common_friends(user_id, other_id)?))
}

async fn add_friend(users: Users, path: web::Path<(Id, Id)>) -> Result<HttpResponse> {
    let (user_id, friend_id) = path.into_inner();
    users.add_friend(user_id, friend_id)?;
    Ok(HttpResponse::Ok().finish())
}

async fn create_friendship(users: Users, path: web::Path<(Id, Id)>) -> Result<HttpResponse> {
    let (user_id, friend_id) = path.into_inner();
    users.create_friendship(user_id, friend_id)?;
    Ok(HttpResponse::Ok().finish())
}

async fn remove_friendship(users: Users, path: web::Path<(Id, Id)>) -> Result<HttpResponse> {
    let (user_id, friend_id) = path.into_inner();
    users.remove_friendship(user_id, friend_id)?;
    Ok(HttpResponse::Ok().finish())
}

#[derive(Serialize)]
struct FriendshipStateBody {
    state: Option<FriendshipState>,
}

async fn friendship_state(users: Users, path: web::Path<(Id, Id)>) -> HttpResponse {
    let (user_id, friend_id) = path.into_inner();
    HttpResponse::Ok().json(FriendshipStateBody {
        state: users.friendship_state(user_id, friend_id),
    })
}

async fn find_genres(films: Films) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(films.find_genres()?))
}

async fn find_genre(films: Films, id: web::Path<Id>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(films.find_genre(id.into_inner())?))
}

async fn find_mpas(films: Films) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(films.find_mpas()?))
}

async fn find_mpa(films: Films, id: web::Path<Id>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(films.find_mpa(id.into_inner())?))
}
