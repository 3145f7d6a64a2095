use crate::error::Result;
use crate::model::*;
use log::info;
use serde::{de::DeserializeOwned, Serialize};
use sled::transaction::TransactionError;
use std::collections::BTreeMap;
use std::path::Path;

// big-endian so tree iteration yields ascending ids
fn serialize_id(id: Id) -> [u8; 8] {
    id.to_be_bytes()
}

fn serialize_pair(first: Id, second: Id) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&first.to_be_bytes());
    key[8..].copy_from_slice(&second.to_be_bytes());
    key
}

fn deserialize_pair<V: AsRef<[u8]>>(key: V) -> Result<(Id, Id)> {
    use std::convert::TryInto;
    let key = key.as_ref();
    let pair: Option<([u8; 8], [u8; 8])> = match (key.get(..8), key.get(8..)) {
        (Some(first), Some(second)) => first.try_into().ok().zip(second.try_into().ok()),
        _ => None,
    };
    let (first, second) = pair
        .ok_or_else(|| sled::Error::Unsupported("malformed relation key".to_owned()))?;
    Ok((Id::from_be_bytes(first), Id::from_be_bytes(second)))
}

/// Updates of an unknown id return `Ok(None)` and leave the store untouched.
pub trait EntityStore {
    fn add_film(&self, film: Film) -> Result<Film>;
    fn update_film(&self, film: Film) -> Result<Option<Film>>;
    fn get_film(&self, id: Id) -> Result<Option<Film>>;
    fn films(&self) -> Result<Vec<Film>>;

    fn add_user(&self, user: User) -> Result<User>;
    fn update_user(&self, user: User) -> Result<Option<User>>;
    fn get_user(&self, id: Id) -> Result<Option<User>>;
    fn user_exists(&self, id: Id) -> Result<bool>;
    fn users(&self) -> Result<Vec<User>>;

    fn genres(&self) -> Result<Vec<Genre>>;
    fn get_genre(&self, id: Id) -> Result<Option<Genre>>;
    fn mpas(&self) -> Result<Vec<Mpa>>;
    fn get_mpa(&self, id: Id) -> Result<Option<Mpa>>;

    fn likes(&self) -> Result<Vec<(Id, Id)>>;
    fn insert_like(&self, film_id: Id, user_id: Id) -> Result<()>;
    fn delete_like(&self, film_id: Id, user_id: Id) -> Result<()>;

    fn friend_edges(&self) -> Result<Vec<(Id, Id)>>;
    fn insert_friend_edge(&self, user_id: Id, friend_id: Id) -> Result<()>;
    fn delete_friend_edge(&self, user_id: Id, friend_id: Id) -> Result<()>;
}

const FILMS: &'static [u8] = b"films";
const USERS: &'static [u8] = b"users";
const GENRES: &'static [u8] = b"genres";
const MPA: &'static [u8] = b"mpa";
const LIKES: &'static [u8] = b"likes";
const FRIENDS: &'static [u8] = b"friends";

const DEFAULT_GENRES: &[(Id, &str)] = &[
    (1, "Comedy"),
    (2, "Drama"),
    (3, "Animation"),
    (4, "Thriller"),
    (5, "Documentary"),
    (6, "Action"),
];

const DEFAULT_MPA: &[(Id, &str, &str)] = &[
    (1, "G", "General audiences, all ages admitted"),
    (2, "PG", "Parental guidance suggested"),
    (3, "PG-13", "Parents strongly cautioned, under 13 with guardian"),
    (4, "R", "Restricted, under 17 requires accompanying adult"),
    (5, "NC-17", "No one 17 and under admitted"),
];

/// A temporary database is opened when no path is given.
pub fn open(path: Option<&Path>) -> Result<sled::Db> {
    let config = match path {
        Some(path) => sled::Config::new().path(path),
        None => sled::Config::new().temporary(true),
    };
    let db = config.open()?;
    seed_reference_data(&db)?;
    Ok(db)
}

fn seed_reference_data(db: &sled::Db) -> Result<()> {
    let genres = db.open_tree(GENRES)?;
    if genres.is_empty() {
        for &(id, name) in DEFAULT_GENRES {
            genres.insert(serialize_id(id), bincode::serialize(&Genre::new(id, name))?)?;
        }
        info!("Seeded {} genres", DEFAULT_GENRES.len());
    }
    let mpa = db.open_tree(MPA)?;
    if mpa.is_empty() {
        for &(id, name, description) in DEFAULT_MPA {
            mpa.insert(
                serialize_id(id),
                bincode::serialize(&Mpa::new(id, name, description))?,
            )?;
        }
        info!("Seeded {} MPA ratings", DEFAULT_MPA.len());
    }
    Ok(())
}

fn get_record<T: DeserializeOwned>(tree: &sled::Tree, id: Id) -> Result<Option<T>> {
    match tree.get(serialize_id(id))? {
        Some(data) => Ok(Some(bincode::deserialize(&data)?)),
        None => Ok(None),
    }
}

fn all_records<T: DeserializeOwned>(tree: &sled::Tree) -> Result<Vec<T>> {
    tree.iter()
        .values()
        .map(|data| Ok(bincode::deserialize(&data?)?))
        .collect()
}

fn insert_record<T: Serialize>(tree: &sled::Tree, id: Id, record: &T) -> Result<()> {
    tree.insert(serialize_id(id), bincode::serialize(record)?)?;
    Ok(())
}

fn replace_record<T: Serialize>(tree: &sled::Tree, id: Id, record: &T) -> Result<bool> {
    let key = serialize_id(id);
    let data = bincode::serialize(record)?;
    let replaced = tree
        .transaction(|tree| {
            if tree.get(&key[..])?.is_none() {
                return Ok(false);
            }
            tree.insert(&key[..], data.as_slice())?;
            Ok(true)
        })
        .map_err(|err: TransactionError<()>| match err {
            TransactionError::Storage(e) => e,
            TransactionError::Abort(()) => {
                sled::Error::Unsupported("record update aborted".to_owned())
            }
        })?;
    Ok(replaced)
}

// unknown references are dropped, genres collapse to one entry per id
fn resolve_references(db: &sled::Db, film: &mut Film) -> Result<()> {
    film.mpa = match film.mpa.take() {
        Some(mpa) => db.get_mpa(mpa.id)?,
        None => None,
    };
    let mut genres = BTreeMap::new();
    for genre in &film.genres {
        if let Some(stored) = db.get_genre(genre.id)? {
            genres.insert(stored.id, stored);
        }
    }
    film.genres = genres.into_iter().map(|(_, genre)| genre).collect();
    Ok(())
}

fn all_pairs(tree: &sled::Tree) -> Result<Vec<(Id, Id)>> {
    tree.iter().keys().map(|key| deserialize_pair(key?)).collect()
}

fn generate_id(db: &sled::Db) -> Result<Id> {
    Ok(db.generate_id()? + 1)
}

impl EntityStore for sled::Db {
    fn add_film(&self, mut film: Film) -> Result<Film> {
        let films = self.open_tree(FILMS)?;
        resolve_references(self, &mut film)?;
        film.id = generate_id(self)?;
        insert_record(&films, film.id, &film)?;
        Ok(film)
    }

    fn update_film(&self, mut film: Film) -> Result<Option<Film>> {
        let films = self.open_tree(FILMS)?;
        resolve_references(self, &mut film)?;
        if replace_record(&films, film.id, &film)? {
            Ok(Some(film))
        } else {
            Ok(None)
        }
    }

    fn get_film(&self, id: Id) -> Result<Option<Film>> {
        get_record(&self.open_tree(FILMS)?, id)
    }

    fn films(&self) -> Result<Vec<Film>> {
        all_records(&self.open_tree(FILMS)?)
    }

    fn add_user(&self, mut user: User) -> Result<User> {
        let users = self.open_tree(USERS)?;
        user.id = generate_id(self)?;
        insert_record(&users, user.id, &user)?;
        Ok(user)
    }

    fn update_user(&self, user: User) -> Result<Option<User>> {
        let users = self.open_tree(USERS)?;
        if replace_record(&users, user.id, &user)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    fn get_user(&self, id: Id) -> Result<Option<User>> {
        get_record(&self.open_tree(USERS)?, id)
    }

    fn user_exists(&self, id: Id) -> Result<bool> {
        Ok(self.open_tree(USERS)?.contains_key(serialize_id(id))?)
    }

    fn users(&self) -> Result<Vec<User>> {
        all_records(&self.open_tree(USERS)?)
    }

    fn genres(&self) -> Result<Vec<Genre>> {
        all_records(&self.open_tree(GENRES)?)
    }

    fn get_genre(&self, id: Id) -> Result<Option<Genre>> {
        get_record(&self.open_tree(GENRES)?, id)
    }

    fn mpas(&self) -> Result<Vec<Mpa>> {
        all_records(&self.open_tree(MPA)?)
    }

    fn get_mpa(&self, id: Id) -> Result<Option<Mpa>> {
        get_record(&self.open_tree(MPA)?, id)
    }

    fn likes(&self) -> Result<Vec<(Id, Id)>> {
        all_pairs(&self.open_tree(LIKES)?)
    }

    fn insert_like(&self, film_id: Id, user_id: Id) -> Result<()> {
        self.open_tree(LIKES)?
            .insert(serialize_pair(film_id, user_id), &b""[..])?;
        Ok(())
    }

    fn delete_like(&self, film_id: Id, user_id: Id) -> Result<()> {
        self.open_tree(LIKES)?
            .remove(serialize_pair(film_id, user_id))?;
        Ok(())
    }

    fn friend_edges(&self) -> Result<Vec<(Id, Id)>> {
        all_pairs(&self.open_tree(FRIENDS)?)
    }

    fn insert_friend_edge(&self, user_id: Id, friend_id: Id) -> Result<()> {
        self.open_tree(FRIENDS)?
            .insert(serialize_pair(user_id, friend_id), &b""[..])?;
        Ok(())
    }

    fn delete_friend_edge(&self, user_id: Id, friend_id: Id) -> Result<()> {
        self.open_tree(FRIENDS)?
            .remove(serialize_pair(user_id, friend_id))?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    pub fn film(name: &str) -> Film {
        Film {
            id: 0,
            name: name.to_owned(),
            description: "A film".to_owned(),
            release_date: NaiveDate::from_ymd_opt(1994, 10, 14).unwrap(),
            duration: 154,
            mpa: None,
            genres: BTreeSet::new(),
        }
    }

    pub fn user(login: &str) -> User {
        User {
            id: 0,
            email: format!("{}@example.com", login),
            login: login.to_owned(),
            name: None,
            birthday: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        }
    }

    #[test]
    fn ids_are_positive_and_increasing() {
        let db = open(None).unwrap();
        let first = db.add_user(user("first")).unwrap();
        let second = db.add_user(user("second")).unwrap();
        assert!(first.id > 0);
        assert!(second.id > first.id);
        let ids: Vec<Id> = db.users().unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn reference_data_is_seeded() {
        let db = open(None).unwrap();
        let names: Vec<String> = db.mpas().unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["G", "PG", "PG-13", "R", "NC-17"]);
        assert_eq!(db.genres().unwrap().len(), 6);
        assert_eq!(db.get_genre(1).unwrap(), Some(Genre::new(1, "Comedy")));
        assert_eq!(db.get_mpa(9999).unwrap(), None);
    }

    #[test]
    fn references_are_resolved() {
        let db = open(None).unwrap();
        let mut film = film("Pulp Fiction");
        film.mpa = Some(Mpa::new(4, "", ""));
        film.genres = vec![
            Genre::new(2, ""),
            Genre::new(1, ""),
            Genre::new(2, "bogus"),
            Genre::new(42, ""),
        ]
        .into_iter()
        .collect();
        let stored = db.add_film(film).unwrap();
        assert_eq!(stored.mpa.as_ref().map(|m| m.name.as_str()), Some("R"));
        let genres: Vec<Genre> = stored.genres.iter().cloned().collect();
        assert_eq!(genres, vec![Genre::new(1, "Comedy"), Genre::new(2, "Drama")]);
        assert_eq!(db.get_film(stored.id).unwrap(), Some(stored));
    }

    #[test]
    fn update_of_unknown_record_is_absent() {
        let db = open(None).unwrap();
        let mut ghost = user("ghost");
        ghost.id = 77;
        assert_eq!(db.update_user(ghost).unwrap(), None);
        assert!(!db.user_exists(77).unwrap());

        let mut stored = db.add_film(film("Heat")).unwrap();
        stored.duration = 170;
        assert_eq!(db.update_film(stored.clone()).unwrap(), Some(stored.clone()));
        assert_eq!(db.get_film(stored.id).unwrap().unwrap().duration, 170);
    }

    #[test]
    fn relation_pairs_round_trip_in_key_order() {
        let db = open(None).unwrap();
        db.insert_like(2, 300).unwrap();
        db.insert_like(1, 7).unwrap();
        db.insert_like(1, 7).unwrap();
        assert_eq!(db.likes().unwrap(), vec![(1, 7), (2, 300)]);
        db.delete_like(1, 7).unwrap();
        db.delete_like(1, 8).unwrap();
        assert_eq!(db.likes().unwrap(), vec![(2, 300)]);

        db.insert_friend_edge(5, 6).unwrap();
        assert_eq!(db.friend_edges().unwrap(), vec![(5, 6)]);
        db.delete_friend_edge(5, 6).unwrap();
        assert!(db.friend_edges().unwrap().is_empty());
    }

    #[test]
    fn malformed_relation_key_is_an_error() {
        assert!(deserialize_pair(&[1u8, 2, 3][..]).is_err());
        assert_eq!(deserialize_pair(serialize_pair(3, 4)).unwrap(), (3, 4));
    }
}
