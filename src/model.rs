use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifiers are assigned by the store and are always positive; `0` marks a
/// record that has not been stored yet.
pub type Id = u64;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    #[serde(default)]
    pub id: Id,
    pub email: String,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    pub birthday: NaiveDate,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    #[serde(default)]
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: i64,
    #[serde(default)]
    pub mpa: Option<Mpa>,
    #[serde(default)]
    pub genres: BTreeSet<Genre>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Genre {
    pub id: Id,
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Mpa {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Genre {
    pub fn new(id: Id, name: &str) -> Self {
        Genre {
            id,
            name: name.to_owned(),
        }
    }
}

impl Mpa {
    pub fn new(id: Id, name: &str, description: &str) -> Self {
        Mpa {
            id,
            name: name.to_owned(),
            description: description.to_owned(),
        }
    }
}
