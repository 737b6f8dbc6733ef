use anyhow::Result;
use crate::context::Context;

/// Exécute une recherche; sans prédicat, tous les items sont renvoyés
pub fn execute(context: &Context, access_point: &str, predicate: Option<&str>) -> Result<()> {
    let items = context.site().search(access_point, predicate)?;

    println!("{}", context.formatter().format_rows(&items)?);

    Ok(())
}
