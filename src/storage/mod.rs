//! Collaborators the hub talks to
//!
//! `local` persists small per-user values, `remote` reads the store of record,
//! `realtime` delivers change notifications and `functions` invokes hosted
//! functions.

pub mod functions;
pub mod local;
pub mod realtime;
pub mod remote;

pub use functions::FunctionsClient;
pub use local::{FileStore, KeyValueStore, MemoryStore};
pub use realtime::{ChangeFeed, MemoryChangeFeed, OfflineFeed, RealtimeClient};
pub use remote::{DataStore, MemoryDataStore, RestDataStore};
