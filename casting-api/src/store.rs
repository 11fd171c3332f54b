//! In-memory storage for actors and movies
//!
//! Records live in id-ordered maps behind a single lock. The store
//! starts seeded with one record of each kind so a fresh deployment
//! has something to list.

use std::collections::BTreeMap;
use std::sync::RwLock;

use time::OffsetDateTime;

use crate::models::{Actor, ActorPatch, Movie, MoviePatch};

#[derive(Debug, Default)]
struct Inner {
    actors: BTreeMap<i64, Actor>,
    movies: BTreeMap<i64, Movie>,
    next_actor_id: i64,
    next_movie_id: i64,
}

/// The agency's record store
#[derive(Debug)]
pub struct Store {
    inner: RwLock<Inner>,
}

impl Store {
    /// An empty store
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                actors: BTreeMap::new(),
                movies: BTreeMap::new(),
                next_actor_id: 1,
                next_movie_id: 1,
            }),
        }
    }

    /// A store holding the initial demonstration records
    pub fn seeded() -> Self {
        let store = Self::new();
        store.insert_actor(String::from("Actor1"), 25, String::from("Female"));
        store.insert_movie(
            String::from("Movie1"),
            OffsetDateTime::now_utc().date(),
        );
        store
    }

    /// All actors, ordered by id
    pub fn list_actors(&self) -> Vec<Actor> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.actors.values().cloned().collect()
    }

    /// Adds an actor, assigning the next id
    pub fn insert_actor(&self, name: String, age: i64, gender: String) -> Actor {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let id = inner.next_actor_id;
        inner.next_actor_id += 1;

        let actor = Actor {
            id,
            name,
            gender,
            age,
        };
        inner.actors.insert(id, actor.clone());
        actor
    }

    /// Applies `patch` to the actor with `id`, returning the updated
    /// record, or `None` if no such actor exists
    pub fn update_actor(&self, id: i64, patch: ActorPatch) -> Option<Actor> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let actor = inner.actors.get_mut(&id)?;

        if let Some(name) = patch.name {
            actor.name = name;
        }
        if let Some(age) = patch.age {
            actor.age = age;
        }
        if let Some(gender) = patch.gender {
            actor.gender = gender;
        }

        Some(actor.clone())
    }

    /// Removes the actor with `id`, reporting whether it existed
    pub fn delete_actor(&self, id: i64) -> bool {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.actors.remove(&id).is_some()
    }

    /// All movies, ordered by id
    pub fn list_movies(&self) -> Vec<Movie> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.movies.values().cloned().collect()
    }

    /// Adds a movie, assigning the next id
    pub fn insert_movie(&self, title: String, release_date: time::Date) -> Movie {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let id = inner.next_movie_id;
        inner.next_movie_id += 1;

        let movie = Movie {
            id,
            title,
            release_date,
        };
        inner.movies.insert(id, movie.clone());
        movie
    }

    /// Applies `patch` to the movie with `id`, returning the updated
    /// record, or `None` if no such movie exists
    pub fn update_movie(&self, id: i64, patch: MoviePatch) -> Option<Movie> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let movie = inner.movies.get_mut(&id)?;

        if let Some(title) = patch.title {
            movie.title = title;
        }
        if let Some(release_date) = patch.release_date {
            movie.release_date = release_date;
        }

        Some(movie.clone())
    }

    /// Removes the movie with `id`, reporting whether it existed
    pub fn delete_movie(&self, id: i64) -> bool {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.movies.remove(&id).is_some()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the page of `items` selected by `page`, counting from 1
pub fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> Vec<T> {
    let page = page.max(1);
    let start = (page - 1).saturating_mul(limit);

    items.into_iter().skip(start).take(limit).collect()
}
