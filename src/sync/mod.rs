// sync module: the replication loop between the host bridge and the replica

mod interface;
mod replicator;

pub use interface::{Notice, Request, ResyncReply, RunnerMessage, SyncHandle, SyncPolicy};
pub use replicator::Replicator;
