//! Recipe types - the key that selects a translator
//!
//! `recipe.type` in a raw document is a free-form string. It is lifted
//! into [`RecipeType`] at the boundary so that selection is a `match`
//! rather than a string comparison scattered through callers.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

/// Known recipe formats of a workspace environment.
///
/// `Other(String)` keeps unrecognised types intact so that a document
/// can still be decoded and passed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecipeType {
    /// A single pre-built image reference, e.g. `codenvy/ubuntu_jdk8`
    DockerImage,
    /// Dockerfile content or a link to it
    Dockerfile,
    /// A multi-service compose file
    Compose,
    Other(String),
}

impl RecipeType {
    /// The string used in `recipe.type`
    pub fn as_str(&self) -> &str {
        match self {
            RecipeType::DockerImage => "dockerimage",
            RecipeType::Dockerfile => "dockerfile",
            RecipeType::Compose => "compose",
            RecipeType::Other(s) => s,
        }
    }
}

impl std::fmt::Display for RecipeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecipeType {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "dockerimage" => RecipeType::DockerImage,
            "dockerfile" => RecipeType::Dockerfile,
            "compose" => RecipeType::Compose,
            other => RecipeType::Other(other.to_string()),
        })
    }
}

impl From<String> for RecipeType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl From<RecipeType> for String {
    fn from(t: RecipeType) -> Self {
        t.as_str().to_string()
    }
}
