use crate::database::EntityStore;
use crate::error::{Error, Result};
use crate::model::*;
use crate::ratings::RatingStore;
use crate::validation::validate_film;
use log::debug;

pub struct FilmService<S> {
    store: S,
    ratings: RatingStore,
}

impl<S: EntityStore> FilmService<S> {
    pub fn new(store: S) -> Result<Self> {
        let ratings = RatingStore::load(&store)?;
        Ok(FilmService { store, ratings })
    }

    pub fn find_all(&self) -> Result<Vec<Film>> {
        self.store.films()
    }

    pub fn find_by_id(&self, id: Id) -> Result<Film> {
        self.store
            .get_film(id)?
            .ok_or_else(|| Error::not_found(format!("Film with id: {} not found!", id)))
    }

    pub fn create(&self, film: Film) -> Result<Film> {
        validate_film(&film)?;
        let film = self.store.add_film(film)?;
        self.ratings.create_rating_container(film.id);
        debug!("Film created: {:?}", film);
        Ok(film)
    }

    pub fn update(&self, film: Film) -> Result<Film> {
        validate_film(&film)?;
        let id = film.id;
        let film = self
            .store
            .update_film(film)?
            .ok_or_else(|| Error::not_found(format!("Film with id: {} not found!", id)))?;
        debug!("Film updated: {:?}", film);
        Ok(film)
    }

    pub fn add_like(&self, film_id: Id, user_id: Id) -> Result<()> {
        self.ensure_user_exists(user_id)?;
        self.ratings.add_like(&self.store, film_id, user_id)?;
        debug!("Film with id:{} was liked by user with id:{}", film_id, user_id);
        Ok(())
    }

    pub fn remove_like(&self, film_id: Id, user_id: Id) -> Result<()> {
        self.ensure_user_exists(user_id)?;
        self.ratings.remove_like(&self.store, film_id, user_id)?;
        debug!("Film with id:{} was unliked by user with id:{}", film_id, user_id);
        Ok(())
    }

    // ids that no longer resolve are skipped
    pub fn find_popular(&self, count: usize) -> Result<Vec<Film>> {
        let mut films = Vec::new();
        for id in self.ratings.find_popular(count) {
            if let Some(film) = self.store.get_film(id)? {
                films.push(film);
            }
        }
        Ok(films)
    }

    pub fn find_genres(&self) -> Result<Vec<Genre>> {
        self.store.genres()
    }

    pub fn find_genre(&self, id: Id) -> Result<Genre> {
        self.store
            .get_genre(id)?
            .ok_or_else(|| Error::not_found(format!("Genre with id: {} not found!", id)))
    }

    pub fn find_mpas(&self) -> Result<Vec<Mpa>> {
        self.store.mpas()
    }

    pub fn find_mpa(&self, id: Id) -> Result<Mpa> {
        self.store
            .get_mpa(id)?
            .ok_or_else(|| Error::not_found(format!("Mpa with id: {} not found!", id)))
    }

    fn ensure_user_exists(&self, id: Id) -> Result<()> {
        if self.store.user_exists(id)? {
            Ok(())
        } else {
            Err(Error::not_found(format!("User with id: {} not found!", id)))
        }
    }

    #[cfg(test)]
    fn like_count(&self, film_id: Id) -> Result<usize> {
        self.ratings.like_count(film_id)
    }
}
