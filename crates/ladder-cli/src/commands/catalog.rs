use clap::Args;
use serde_json::Value;

use ladder_core::catalog::{self, Catalog, CatalogFilter};

use crate::input;

/// Brokerage exports to build the catalog from
#[derive(Args, Debug, Clone)]
pub struct CatalogSource {
    /// Fixed-income search export (CSV); repeat or list several to concatenate
    #[arg(long = "catalog", num_args = 1..)]
    pub catalog: Vec<String>,

    /// Keep securities without the call-protected (CP) attribute
    #[arg(long)]
    pub all_attributes: bool,
}

impl CatalogSource {
    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn filter(&self) -> CatalogFilter {
        if self.all_attributes {
            CatalogFilter::all()
        } else {
            CatalogFilter::default()
        }
    }

    pub fn load(&self) -> Result<Catalog, Box<dyn std::error::Error>> {
        let paths = input::file::resolve_paths(&self.catalog)?;
        Ok(catalog::load_exports(&paths, &self.filter())?)
    }
}

/// Arguments for catalog inspection
#[derive(Args)]
pub struct CatalogArgs {
    #[command(flatten)]
    pub source: CatalogSource,
}

pub fn run_catalog(args: CatalogArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.source.is_empty() {
        return Err("--catalog <export.csv> is required".into());
    }
    let catalog = args.source.load()?;
    Ok(serde_json::to_value(catalog)?)
}
