//! Movie identifier assignment.
//!
//! Movies are not stored; the node only derives a stable identifier that
//! clients can put in checkout payloads. Not part of the chain's trust model.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex length of a movie id (16 bytes).
pub const MOVIE_ID_HEX_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub director: String,
    /// Year of release.
    pub yor: String,
}

/// Identifier over director and year of release, length-prefixed.
pub fn movie_id(director: &str, yor: &str) -> String {
    let mut h = Sha256::new();
    for field in [director, yor] {
        h.update((field.len() as u64).to_be_bytes());
        h.update(field.as_bytes());
    }
    hex::encode(&h.finalize()[..MOVIE_ID_HEX_LEN / 2])
}

impl Movie {
    /// Return the movie with its derived id, ignoring any id the client sent.
    pub fn registered(mut self) -> Self {
        self.id = movie_id(&self.director, &self.yor);
        self
    }
}
