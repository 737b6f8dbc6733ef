use anyhow::Result;
use crate::context::Context;

/// Affiche les propriétés déclarées d'un access point
pub fn execute(context: &Context, access_point: &str) -> Result<()> {
    let schema = context.site().access_point(access_point)?.properties();

    println!("{}", context.formatter().format_schema(schema)?);

    Ok(())
}
