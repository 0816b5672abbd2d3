//! Live updates for the transaction list.
//!
//! Changes to the transaction data are announced on an in-process
//! [ChangeFeed]. Browsers hear about them over server-sent events and refetch
//! the list fragment, while [LiveTransactionList] offers the same
//! mount/refetch/unmount lifecycle for non-web consumers.

mod controller;
mod feed;
mod sse;

pub use controller::{
    FetchError, ListState, LiveTransactionList, SqliteTransactionReader, TransactionReader,
};
pub use feed::{ChangeEvent, ChangeFeed};
pub use sse::get_change_events;
