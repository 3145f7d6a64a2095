use crate::database::EntityStore;
use crate::error::{Error, Result};
use crate::model::Id;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipState {
    Pending,
    Confirmed,
}

/// Directed friend edges, mirrored into the store's `friends` tree. An edge
/// `user -> friend` is visible in `user`'s friend list as soon as it is added;
/// `friend` sees `user` only after adding the reciprocal edge.
#[derive(Debug, Default)]
pub struct FriendGraph {
    friends: Mutex<HashMap<Id, BTreeSet<Id>>>,
}

impl FriendGraph {
    pub fn load<S: EntityStore + ?Sized>(store: &S) -> Result<Self> {
        let mut friends: HashMap<Id, BTreeSet<Id>> = HashMap::new();
        for (user_id, friend_id) in store.friend_edges()? {
            friends.entry(user_id).or_default().insert(friend_id);
        }
        Ok(FriendGraph {
            friends: Mutex::new(friends),
        })
    }

    /// Only `friend_id` has to exist. `user_id` is taken as given and may equal
    /// `friend_id`, in which case the single edge reads as confirmed.
    pub fn add_friend<S>(&self, store: &S, user_id: Id, friend_id: Id) -> Result<()>
    where
        S: EntityStore + ?Sized,
    {
        ensure_user_exists(store, friend_id)?;
        let mut friends = self.friends.lock();
        let user_friends = friends.entry(user_id).or_default();
        if !user_friends.contains(&friend_id) {
            store.insert_friend_edge(user_id, friend_id)?;
            user_friends.insert(friend_id);
        }
        Ok(())
    }

    /// Removing an edge that was never added is not an error.
    pub fn remove_friend<S>(&self, store: &S, user_id: Id, friend_id: Id) -> Result<()>
    where
        S: EntityStore + ?Sized,
    {
        ensure_user_exists(store, friend_id)?;
        if let Some(user_friends) = self.friends.lock().get_mut(&user_id) {
            if user_friends.contains(&friend_id) {
                store.delete_friend_edge(user_id, friend_id)?;
                user_friends.remove(&friend_id);
            }
        }
        Ok(())
    }

    // ascending ids, empty for users without edges
    pub fn find_friends(&self, user_id: Id) -> Vec<Id> {
        self.friends
            .lock()
            .get(&user_id)
            .map(|friends| friends.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn find_common_friends(&self, user_id: Id, other_id: Id) -> Vec<Id> {
        let friends = self.friends.lock();
        match (friends.get(&user_id), friends.get(&other_id)) {
            (Some(first), Some(second)) => first.intersection(second).copied().collect(),
            _ => Vec::new(),
        }
    }

    pub fn state(&self, user_id: Id, other_id: Id) -> Option<FriendshipState> {
        let friends = self.friends.lock();
        let has_edge = |from: Id, to: Id| friends.get(&from).map_or(false, |f| f.contains(&to));
        match (has_edge(user_id, other_id), has_edge(other_id, user_id)) {
            (true, true) => Some(FriendshipState::Confirmed),
            (true, false) | (false, true) => Some(FriendshipState::Pending),
            (false, false) => None,
        }
    }
}

fn ensure_user_exists<S: EntityStore + ?Sized>(store: &S, id: Id) -> Result<()> {
    if store.user_exists(id)? {
        Ok(())
    } else {
        Err(Error::not_found(format!("User with id: {} not found!", id)))
    }
}
