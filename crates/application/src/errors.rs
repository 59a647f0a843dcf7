use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl PoolError {
    pub(crate) fn thread_spawn(name: impl Into<String>, source: io::Error) -> Self {
        PoolError::ThreadSpawn {
            name: name.into(),
            source,
        }
    }
}
