use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArticleError {
    #[error("Error listing articles directory '{path}'")]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error reading article source '{path}'")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Frontmatter opened with '{0}' but never closed")]
    UnterminatedFrontmatter(&'static str),

    #[error("Error decoding YAML frontmatter")]
    YamlFrontmatter(#[from] serde_yaml::Error),

    #[error("Error decoding TOML frontmatter")]
    TomlFrontmatter(#[from] toml::de::Error),
}
