use std::path::Path;

use anyhow::{bail, Context, Error};
use tracing::{info, Level};

pub const RECIPE_EXTENSION: &str = "txt";

/// The names of the recipe files in `recipes_dir`, sorted.
#[tracing::instrument(level = Level::DEBUG)]
pub fn list_recipes(recipes_dir: &Path) -> Result<Vec<String>, Error> {
    let entries = std::fs::read_dir(recipes_dir)
        .with_context(|| format!("Error reading recipes. directory: {}", recipes_dir.display()))?;

    let mut names = vec![];
    for entry in entries {
        let path = entry?.path();
        let is_recipe = path.is_file()
            && path
                .extension()
                .is_some_and(|extension| extension.eq(RECIPE_EXTENSION));
        if !is_recipe {
            continue;
        }
        if let Some(name) = path.file_name() {
            names.push(name.to_string_lossy().to_string());
        }
    }
    names.sort();

    info!("Found recipes. directory: {:?}, count: {}", recipes_dir, names.len());

    Ok(names)
}

/// The text of a recipe, recipes are not interpreted.
pub fn read_recipe(recipes_dir: &Path, name: &str) -> Result<String, Error> {
    let file_name = Path::new(name);
    if file_name.components().count() != 1 {
        bail!("Invalid recipe name. name: '{}'", name);
    }

    let path = recipes_dir.join(file_name);
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("Error reading recipe. file: {}", path.display()))?;

    Ok(content)
}
