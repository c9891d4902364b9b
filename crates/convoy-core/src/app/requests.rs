//! Requests - NetworkClient を束縛した Task の生成
//!
//! The client is injected once here; every builder returns a fresh [`Task`]
//! with its own cancellation token.
//!
//! ```ignore
//! let requests = Requests::new(Arc::new(client), ClientDefaults::default());
//! let mut task = requests.get_one();
//! let envelope = task.run(2).await;
//! ```

use std::sync::Arc;

use super::task::Task;
use crate::config::ClientDefaults;
use crate::ports::{ListQuery, NetworkClient};

pub struct Requests<C: NetworkClient> {
    client: Arc<C>,
    defaults: ClientDefaults,
}

impl<C: NetworkClient> Clone for Requests<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            defaults: self.defaults.clone(),
        }
    }
}

impl<C: NetworkClient> Requests<C> {
    pub fn new(client: Arc<C>, defaults: ClientDefaults) -> Self {
        Self { client, defaults }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Paged list. Unset page / per_page fall back to [`ClientDefaults`].
    pub fn list(&self) -> Task<ListQuery, Vec<C::Item>> {
        let client = Arc::clone(&self.client);
        let defaults = self.defaults.clone();
        Task::new(move |query: ListQuery| {
            let client = Arc::clone(&client);
            let query = ListQuery {
                page: query.page.or(Some(defaults.page)),
                per_page: query.per_page.or(Some(defaults.per_page)),
            };
            async move { client.get_list(query).await }
        })
    }

    pub fn get_one(&self) -> Task<u64, C::Item> {
        let client = Arc::clone(&self.client);
        Task::new(move |id: u64| {
            let client = Arc::clone(&client);
            async move { client.get_one(id).await }
        })
    }

    pub fn create(&self) -> Task<C::Draft, C::Item> {
        let client = Arc::clone(&self.client);
        Task::new(move |draft: C::Draft| {
            let client = Arc::clone(&client);
            async move { client.create(draft).await }
        })
    }

    pub fn update(&self) -> Task<(u64, C::Draft), C::Item> {
        let client = Arc::clone(&self.client);
        Task::new(move |(id, draft): (u64, C::Draft)| {
            let client = Arc::clone(&client);
            async move { client.update(id, draft).await }
        })
    }
}
