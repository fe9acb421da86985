use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use metaterm::config::{ColorChoice, OutputFormat, RunConfig};
use metaterm::migration::{LineWriter, MigrationRequest, migrate, migrate_with};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;

pub const EXAMPLES: &str = "\
Examples:
  mtt migrate meta_key taxonomy_slug
  mtt migrate meta_key taxonomy_slug --posts_per_page=200 --paged=2";

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Report what would be migrated without changing the store
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Meta key to convert
    pub meta_key: String,

    /// Taxonomy to move values into
    pub taxonomy: String,

    /// One or more args to pass to the record query
    #[arg(
        value_name = "--<FIELD>=<VALUE>",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub query: Vec<String>,
}

pub fn run(store_path: &Path, args: MigrateArgs) -> Result<()> {
    let config = RunConfig::new(store_path)
        .format(args.format)
        .color(args.color)
        .dry_run(args.dry_run);
    config.validate()?;

    let filters = parse_query_flags(&args.query)?;
    let request = MigrationRequest::new(args.meta_key, args.taxonomy)
        .filters(filters)
        .dry_run(config.dry_run);

    let mut store = config
        .open_store()
        .with_context(|| format!("Failed to open store '{}'", config.store_path.display()))?;
    let original = store.clone();

    let color = config.use_color();
    let outcome = match config.format {
        OutputFormat::Text => {
            let mut writer = LineWriter::new(io::stdout().lock(), color);
            migrate_with(&mut store, &request, &mut writer)
        }
        OutputFormat::Json => migrate(&mut store, &request),
    };

    // Each record is consistent on its own, so progress made before a fatal
    // error is kept.
    if !config.dry_run && store != original {
        config
            .snapshot_manager()
            .save_store(&store)
            .with_context(|| format!("Failed to save store '{}'", config.store_path.display()))?;
    }

    let report = outcome?;
    if config.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

/// Turn trailing `--<field>=<value>` arguments into query filters.
pub fn parse_query_flags(raw: &[String]) -> Result<BTreeMap<String, String>> {
    let mut filters = BTreeMap::new();

    for item in raw {
        let Some(flag) = item.strip_prefix("--") else {
            bail!(
                "Unexpected argument '{}'. Query args take the form --<field>=<value>",
                item
            );
        };
        let (field, value) = flag.split_once('=').ok_or_else(|| {
            anyhow!(
                "Query arg '{}' needs a value (--{}=<value>); options like --dry-run go before <META_KEY>",
                item,
                flag
            )
        })?;
        if field.is_empty() {
            bail!("Query arg '{}' has an empty field name", item);
        }
        filters.insert(field.to_string(), value.to_string());
    }

    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_query_flags() {
        let filters =
            parse_query_flags(&strings(&["--posts_per_page=200", "--paged=2", "--s=a=b"])).unwrap();
        assert_eq!(filters.get("posts_per_page").map(String::as_str), Some("200"));
        assert_eq!(filters.get("paged").map(String::as_str), Some("2"));
        assert_eq!(filters.get("s").map(String::as_str), Some("a=b"));
    }

    #[test]
    fn test_parse_query_flags_later_wins() {
        let filters = parse_query_flags(&strings(&["--paged=2", "--paged=3"])).unwrap();
        assert_eq!(filters.get("paged").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_parse_query_flags_rejects_malformed() {
        assert!(parse_query_flags(&strings(&["paged=2"])).is_err());
        assert!(parse_query_flags(&strings(&["--dry-run"])).is_err());
        assert!(parse_query_flags(&strings(&["--=2"])).is_err());
    }
}
