use crate::database::EntityStore;
use crate::error::{Error, Result};
use crate::friends::{FriendGraph, FriendshipState};
use crate::model::*;
use crate::validation::validate_user;
use log::debug;

pub struct UserService<S> {
    store: S,
    friends: FriendGraph,
}

impl<S: EntityStore> UserService<S> {
    pub fn new(store: S) -> Result<Self> {
        let friends = FriendGraph::load(&store)?;
        Ok(UserService { store, friends })
    }

    pub fn find_all(&self) -> Result<Vec<User>> {
        self.store.users()
    }

    pub fn find_by_id(&self, id: Id) -> Result<User> {
        self.store
            .get_user(id)?
            .ok_or_else(|| Error::not_found(format!("User with id: {} not found!", id)))
    }

    pub fn create(&self, mut user: User) -> Result<User> {
        validate_user(&mut user)?;
        let user = self.store.add_user(user)?;
        debug!("User created: {:?}", user);
        Ok(user)
    }

    pub fn update(&self, mut user: User) -> Result<User> {
        validate_user(&mut user)?;
        let id = user.id;
        let user = self
            .store
            .update_user(user)?
            .ok_or_else(|| Error::not_found(format!("User with id: {} not found!", id)))?;
        debug!("User updated: {:?}", user);
        Ok(user)
    }

    pub fn add_friend(&self, user_id: Id, friend_id: Id) -> Result<()> {
        self.friends.add_friend(&self.store, user_id, friend_id)?;
        debug!("User with id:{} got a friend with id:{}", user_id, friend_id);
        Ok(())
    }

    pub fn remove_friend(&self, user_id: Id, friend_id: Id) -> Result<()> {
        self.friends.remove_friend(&self.store, user_id, friend_id)?;
        debug!("User with id:{} lost a friend with id:{}", user_id, friend_id);
        Ok(())
    }

    /// Adds both directions. A failure in the second direction leaves the
    /// first one in place.
    pub fn create_friendship(&self, user_id1: Id, user_id2: Id) -> Result<()> {
        self.add_friend(user_id1, user_id2)?;
        self.add_friend(user_id2, user_id1)
    }

    pub fn remove_friendship(&self, user_id1: Id, user_id2: Id) -> Result<()> {
        self.remove_friend(user_id1, user_id2)?;
        self.remove_friend(user_id2, user_id1)
    }

    pub fn find_friends(&self, user_id: Id) -> Result<Vec<User>> {
        self.materialize(self.friends.find_friends(user_id))
    }

    pub fn find_common_friends(&self, user_id1: Id, user_id2: Id) -> Result<Vec<User>> {
        self.materialize(self.friends.find_common_friends(user_id1, user_id2))
    }

    pub fn friendship_state(&self, user_id1: Id, user_id2: Id) -> Option<FriendshipState> {
        self.friends.state(user_id1, user_id2)
    }

    fn materialize(&self, ids: Vec<Id>) -> Result<Vec<User>> {
        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(user) = self.store.get_user(id)? {
                users.push(user);
            }
        }
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{self, tests::user};

    fn service() -> UserService<sled::Db> {
        UserService::new(database::open(None).unwrap()).unwrap()
    }

    fn ids(users: Vec<User>) -> Vec<Id> {
        users.into_iter().map(|u| u.id).collect()
    }

    #[test]
    fn create_fills_name_and_assigns_id() {
        let users = service();
        let created = users.create(user("morpheus")).unwrap();
        assert!(created.id > 0);
        assert_eq!(created.name.as_deref(), Some("morpheus"));
        assert_eq!(users.find_by_id(created.id).unwrap(), created);
    }

    #[test]
    fn update_unknown_user() {
        let users = service();
        let mut ghost = user("ghost");
        ghost.id = 5;
        assert!(matches!(users.update(ghost), Err(Error::NotFound(_))));
    }

    #[test]
    fn update_blank_name_defaults_to_login() {
        let users = service();
        let mut created = users.create(user("smith")).unwrap();
        created.name = Some(String::new());
        created.login = "agent_smith".to_owned();
        let updated = users.update(created).unwrap();
        assert_eq!(updated.name.as_deref(), Some("agent_smith"));
    }

    #[test]
    fn friendship_lifecycle() {
        let users = service();
        let a = users.create(user("a")).unwrap().id;
        let b = users.create(user("b")).unwrap().id;

        users.add_friend(a, b).unwrap();
        assert_eq!(ids(users.find_friends(a).unwrap()), vec![b]);
        assert!(users.find_friends(b).unwrap().is_empty());
        assert_eq!(users.friendship_state(a, b), Some(FriendshipState::Pending));

        users.add_friend(b, a).unwrap();
        assert_eq!(ids(users.find_friends(b).unwrap()), vec![a]);
        assert_eq!(users.friendship_state(a, b), Some(FriendshipState::Confirmed));

        users.remove_friendship(a, b).unwrap();
        assert!(users.find_friends(a).unwrap().is_empty());
        assert!(users.find_friends(b).unwrap().is_empty());
        assert_eq!(users.friendship_state(a, b), None);
    }

    #[test]
    fn create_friendship_is_symmetric() {
        let users = service();
        let a = users.create(user("a")).unwrap().id;
        let b = users.create(user("b")).unwrap().id;
        users.create_friendship(a, b).unwrap();
        assert_eq!(ids(users.find_friends(a).unwrap()), vec![b]);
        assert_eq!(ids(users.find_friends(b).unwrap()), vec![a]);
    }

    #[test]
    fn create_friendship_is_not_rolled_back() {
        let users = service();
        let a = users.create(user("a")).unwrap().id;
        let b = users.create(user("b")).unwrap().id;
        users.create_friendship(a, 999).unwrap_err();
        assert!(users.find_friends(a).unwrap().is_empty());

        // the first direction only needs `b` to exist, the second needs `999`
        assert!(matches!(
            users.create_friendship(999, b),
            Err(Error::NotFound(_))
        ));
        assert_eq!(ids(users.find_friends(999).unwrap()), vec![b]);
    }

    #[test]
    fn friendships_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b, c) = {
            let users = UserService::new(database::open(Some(dir.path())).unwrap()).unwrap();
            let a = users.create(user("a")).unwrap().id;
            let b = users.create(user("b")).unwrap().id;
            let c = users.create(user("c")).unwrap().id;
            users.create_friendship(a, b).unwrap();
            users.add_friend(a, c).unwrap();
            users.store.flush().unwrap();
            (a, b, c)
        };

        let users = UserService::new(database::open(Some(dir.path())).unwrap()).unwrap();
        assert_eq!(ids(users.find_friends(a).unwrap()), vec![b, c]);
        assert_eq!(ids(users.find_friends(b).unwrap()), vec![a]);
        assert!(users.find_friends(c).unwrap().is_empty());
        assert_eq!(users.friendship_state(a, b), Some(FriendshipState::Confirmed));
        assert_eq!(users.friendship_state(a, c), Some(FriendshipState::Pending));

        users.remove_friendship(a, b).unwrap();
        assert_eq!(ids(users.find_friends(a).unwrap()), vec![c]);
    }

    #[test]
    fn common_friends_are_materialized() {
        let users = service();
        let all: Vec<Id> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|login| users.create(user(login)).unwrap().id)
            .collect();
        let (a, b, c, d, e) = (all[0], all[1], all[2], all[3], all[4]);
        users.add_friend(a, c).unwrap();
        users.add_friend(a, d).unwrap();
        users.add_friend(b, d).unwrap();
        users.add_friend(b, e).unwrap();
        let common = users.find_common_friends(a, b).unwrap();
        assert_eq!(common.len(), 1);
        assert_eq!(common[0].login, "d");
    }
}
