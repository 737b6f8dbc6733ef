use anyhow::{anyhow, Result};
use clap::Args;
use cornfield::{Aliases, Item, OrderKey, SelectRange, ViewRequest};
use crate::context::Context;

/// Paramètres communs à `view` et `explain`
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Prédicat de filtrage, ex. "address.city = 'London'"
    #[arg(short, long = "where")]
    pub predicate: Option<String>,

    /// Clé de tri, "-born" pour un tri décroissant (répétable)
    #[arg(short, long, allow_hyphen_values = true)]
    pub order: Vec<String>,

    /// Intervalle de lignes: "10", "5:10" ou "5:"
    #[arg(short, long)]
    pub range: Option<String>,

    /// Supprimer les lignes en double
    #[arg(short, long)]
    pub distinct: bool,

    /// Colonne sélectionnée, "alias=chemin" (répétable)
    #[arg(short, long)]
    pub alias: Vec<String>,
}

impl ViewArgs {
    /// Construit la requête de vue correspondante
    pub fn to_request(&self) -> Result<ViewRequest> {
        let mut request = ViewRequest::new().request(self.predicate.clone());

        if !self.alias.is_empty() {
            let mut aliases = Aliases::new();
            for spec in &self.alias {
                let (alias, path) = spec
                    .split_once('=')
                    .ok_or_else(|| anyhow!("Alias invalide {:?}, attendu alias=chemin", spec))?;
                aliases.insert(alias.trim(), path.trim());
            }
            request = request.aliases(aliases);
        }
        if !self.order.is_empty() {
            let keys = self
                .order
                .iter()
                .map(|key| key.parse::<OrderKey>())
                .collect::<cornfield::Result<Vec<_>>>()?;
            request = request.order_by(keys);
        }
        if let Some(range) = &self.range {
            request = request.range(range.parse::<SelectRange>()?);
        }
        if self.distinct {
            request = request.distinct();
        }
        Ok(request)
    }
}

/// Exécute une vue et affiche les lignes
pub fn execute(context: &Context, access_point: &str, args: &ViewArgs) -> Result<()> {
    let rows = context
        .site()
        .view(access_point, args.to_request()?)?
        .collect::<cornfield::Result<Vec<Item>>>()?;

    println!("{}", context.formatter().format_rows(&rows)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cornfield::QueryOp;

    #[test]
    fn test_args_to_request() {
        let args = ViewArgs {
            predicate: Some("born > 1900".to_string()),
            order: vec!["-born".to_string()],
            range: Some("2:4".to_string()),
            distinct: true,
            alias: vec!["who=name".to_string(), "=address.*".to_string()],
        };
        let chain = args.to_request().unwrap().into_chain().unwrap();
        assert_eq!(chain.describe(), "select > filter > distinct > order > range");
        let select = chain.select().unwrap();
        assert_eq!(select.get("who"), Some("name"));
        assert_eq!(select.get(""), Some("address.*"));
        assert_eq!(chain.ops().last(), Some(&QueryOp::Range(SelectRange::new(2, Some(4)))));
    }

    #[test]
    fn test_bad_alias() {
        let args = ViewArgs {
            alias: vec!["who".to_string()],
            ..ViewArgs::default()
        };
        assert!(args.to_request().is_err());
    }
}
