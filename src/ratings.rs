use crate::database::EntityStore;
use crate::error::{Error, Result};
use crate::model::Id;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Likes per film, mirrored into the store's `likes` tree. A film has to be
/// registered before it can be liked.
#[derive(Debug, Default)]
pub struct RatingStore {
    likes: Mutex<HashMap<Id, HashSet<Id>>>,
}

impl RatingStore {
    pub fn load<S: EntityStore + ?Sized>(store: &S) -> Result<Self> {
        let mut likes: HashMap<Id, HashSet<Id>> = HashMap::new();
        for film in store.films()? {
            likes.entry(film.id).or_default();
        }
        for (film_id, user_id) in store.likes()? {
            if let Some(film_likes) = likes.get_mut(&film_id) {
                film_likes.insert(user_id);
            }
        }
        Ok(RatingStore {
            likes: Mutex::new(likes),
        })
    }

    // an already registered film keeps its likes
    pub fn create_rating_container(&self, film_id: Id) {
        self.likes.lock().entry(film_id).or_default();
    }

    pub fn add_like<S>(&self, store: &S, film_id: Id, user_id: Id) -> Result<()>
    where
        S: EntityStore + ?Sized,
    {
        let mut likes = self.likes.lock();
        let film_likes = likes
            .get_mut(&film_id)
            .ok_or_else(|| film_not_found(film_id))?;
        if !film_likes.contains(&user_id) {
            store.insert_like(film_id, user_id)?;
            film_likes.insert(user_id);
        }
        Ok(())
    }

    pub fn remove_like<S>(&self, store: &S, film_id: Id, user_id: Id) -> Result<()>
    where
        S: EntityStore + ?Sized,
    {
        let mut likes = self.likes.lock();
        let film_likes = likes
            .get_mut(&film_id)
            .ok_or_else(|| film_not_found(film_id))?;
        if !film_likes.contains(&user_id) {
            return Err(Error::not_found(format!(
                "Like of user with id: {} not found!",
                user_id
            )));
        }
        store.delete_like(film_id, user_id)?;
        film_likes.remove(&user_id);
        Ok(())
    }

    #[cfg(test)]
    pub fn like_count(&self, film_id: Id) -> Result<usize> {
        self.likes
            .lock()
            .get(&film_id)
            .map(HashSet::len)
            .ok_or_else(|| film_not_found(film_id))
    }

    /// Most liked first, ties by ascending film id.
    pub fn find_popular(&self, count: usize) -> Vec<Id> {
        let mut ranked: Vec<(Id, usize)> = self
            .likes
            .lock()
            .iter()
            .map(|(&film_id, users)| (film_id, users.len()))
            .collect();
        ranked.sort_unstable_by(|(id1, likes1), (id2, likes2)| {
            likes2.cmp(likes1).then(id1.cmp(id2))
        });
        ranked
            .into_iter()
            .take(count)
            .map(|(film_id, _)| film_id)
            .collect()
    }
}

fn film_not_found(film_id: Id) -> Error {
    Error::not_found(format!("Film with id: {} not found!", film_id))
}
