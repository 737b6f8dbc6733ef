use anyhow::Result;
use crate::context::Context;

/// Liste les access points enregistrés
pub fn execute(context: &Context) -> Result<()> {
    let names = context.site().access_point_names();

    if names.is_empty() {
        println!("{}", context.formatter().format_info("Aucun access point (utilisez --config)"));
    } else {
        println!("{}", context.formatter().format_names(&names)?);
    }

    Ok(())
}
