use anyhow::Result;
use crate::commands::view::ViewArgs;
use crate::context::Context;

/// Construit et valide la chaîne de requête sans l'exécuter
pub fn execute(context: &Context, access_point: &str, args: &ViewArgs) -> Result<()> {
    let chain = context.site().explain(access_point, args.to_request()?)?;

    println!("{}", context.formatter().format_chain(&chain)?);

    Ok(())
}
