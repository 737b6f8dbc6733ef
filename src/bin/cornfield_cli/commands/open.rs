use anyhow::Result;
use crate::context::Context;

/// Ouvre l'item identifié par `repr` (valeurs d'identité séparées par '/')
pub fn execute(context: &Context, access_point: &str, repr: &str) -> Result<()> {
    let item = context.site().from_repr(access_point, repr, None)?;

    println!("{}", context.formatter().format_item(&item)?);

    Ok(())
}
