use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("storage configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Heap(#[from] skyline_heap::Error),
}
