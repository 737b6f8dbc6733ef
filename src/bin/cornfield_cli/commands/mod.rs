pub mod view;
pub mod search;
pub mod open;
pub mod explain;
pub mod schema;
pub mod list;

use anyhow::Result;
use crate::app::Commands;
use crate::context::Context;

/// Exécute une commande sur le site du contexte
pub fn execute(context: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::View { access_point, args } => view::execute(context, &access_point, &args),
        Commands::Search { access_point, predicate } => {
            search::execute(context, &access_point, predicate.as_deref())
        }
        Commands::Open { access_point, repr } => open::execute(context, &access_point, &repr),
        Commands::Explain { access_point, args } => explain::execute(context, &access_point, &args),
        Commands::Schema { access_point } => schema::execute(context, &access_point),
        Commands::List => list::execute(context),
    }
}
