//! Read-only SQLite handle over an extracted collection.
//!
//! SQLite needs a path, so the collection bytes are written into a private
//! temporary directory. SQLite may add `-wal`/`-shm` files next to the
//! database (WAL-mode collections do this even on a read-only open), so the
//! directory, not the file, is the unit of cleanup. [`CollectionStore`] owns
//! the connection and the directory: dropping it closes the connection first
//! and then removes the directory with everything in it, on every exit path.

use rusqlite::{Connection, OpenFlags};
use tempfile::TempDir;

use crate::error::Result;

const DATABASE_NAME: &str = "collection.db";

pub(crate) struct CollectionStore {
    // Field order matters: the connection must drop before the directory.
    conn: Connection,
    dir: TempDir,
}

impl CollectionStore {
    pub(crate) fn open(bytes: &[u8]) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("apkg-collection-")
            .tempdir()?;
        let path = dir.path().join(DATABASE_NAME);
        std::fs::write(&path, bytes)?;

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "opened collection");
        Ok(Self { conn, dir })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    #[cfg(test)]
    pub(crate) fn dir(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Close the connection and remove the temporary directory, reporting
    /// errors that a plain drop would swallow.
    pub(crate) fn close(self) -> Result<()> {
        let Self { conn, dir } = self;
        let path = dir.path().to_path_buf();
        let closed = conn.close().map_err(|(_, e)| e);
        dir.close()?;
        closed?;
        tracing::debug!(path = %path.display(), "closed collection");
        Ok(())
    }
}
