use serde::{Deserialize, Serialize};

use crate::normalize::generate_slug;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenreRef {
    pub id: String,
    pub name: String,
    pub slug: String,
}
impl GenreRef {
    /// Builds a genre whose identifier is its slug, as derived from the name.
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let slug = generate_slug(&name);
        Self { id: slug.clone(), name, slug }
    }

    /// Builds a genre from a source identifier, which doubles as the slug when
    /// present.
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        let name = name.into();
        let slug = if id.is_empty() { generate_slug(&name) } else { id.clone() };
        Self { id: slug.clone(), name, slug }
    }
}
