//! Map-reduce primitives for the Foodshare market cluster.
//!
//! Workers run a [`Mapper`] over the stores they own and ship the resulting
//! [`Pair`]s to the reduce server, which folds every worker's output with a
//! [`Reducer`]. The same pieces run in-process through [`MapReduceJob`].
//!
//! ```
//! use foodshare_mapreduce::{merge_partials, JoinReducer, Pair};
//!
//! let merged = merge_partials(
//!     vec![vec![Pair::new("PizzaWorld", "2")], vec![Pair::new("PizzaWorld", "1")]],
//!     &JoinReducer::default(),
//! );
//! assert_eq!(merged["PizzaWorld"], "2, 1");
//! ```

mod error;
mod job;
pub mod mappers;
mod pair;
mod partition;
mod reducers;

pub use error::{MapReduceError, Result};
pub use job::{group, merge_partials, MapReduceJob, Mapper, Reducer};
pub use mappers::{
    deleted_product_pairs, ListStoresMapper, SalesMapper, SearchFilter, SearchMapper,
    DELETED_PRODUCTS_KEY, LIST_STORES_KEY,
};
pub use pair::Pair;
pub use partition::{partition, replica, stable_hash};
pub use reducers::{JoinReducer, UniqueReducer};
