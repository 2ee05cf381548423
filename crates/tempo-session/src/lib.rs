//! Session registry for Tempo.
//!
//! The registry is the relay's only cross-request shared resource: it maps
//! room ids to running room actors, tracks which participant sits in which
//! room, and owns every allocation and teardown path:
//!
//! 1. **Allocation** — race-free get-or-create and idempotent delete
//! 2. **Routing** — joins, moves, and rematch events find their room here
//! 3. **Teardown** — disconnects and explicit close-room requests
//!
//! # Concurrency note
//!
//! `SessionRegistry` is NOT thread-safe by itself — it uses plain
//! `HashMap`s, not concurrent ones. This is intentional: the registry is
//! owned by the server and accessed through a single `Mutex` at that
//! level, which is exactly what makes `get_or_create` atomic with respect
//! to concurrent joins for the same id.

mod error;
mod registry;

pub use error::SessionError;
pub use registry::SessionRegistry;
