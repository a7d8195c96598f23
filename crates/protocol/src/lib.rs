//! Replication for strider players.
//!
//! Servers mark what changed each tick in a [`DirtyMask`] and send a
//! compact [`UpdatePacket`] to every client. The controlling client also
//! receives a full [`PacketData`] snapshot it can rewind to before replaying
//! its unacknowledged commands. Everything goes over the wire through the
//! bincode [`codec`].

pub mod codec;
pub mod mask;
pub mod snapshot;
pub mod update;

pub use codec::*;
pub use mask::DirtyMask;
pub use snapshot::*;
pub use update::*;
