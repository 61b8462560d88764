use anyhow::{bail, Context};
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_success, print_json, read_json_list};
use crate::cli::OutputFormat;
use crate::config;
use crate::filter::{
    check_limits, describe_filters, filters_to_sql_where, sort_by_order, validate_filters, FilterFieldInfo,
    FilterGroup,
};

#[derive(Subcommand)]
pub enum FilterCommands {
    #[command(about = "Check filter groups against the available fields")]
    Validate {
        #[arg(help = "JSON file with filter groups (- for stdin)")]
        file: String,
        #[arg(long, help = "JSON file with filterable field definitions")]
        fields: Option<String>,
    },

    #[command(about = "Print the parameterised SQL WHERE clause")]
    Sql {
        #[arg(help = "JSON file with filter groups (- for stdin)")]
        file: String,
        #[arg(long, default_value = "", help = "Table alias prefixed to columns")]
        alias: String,
    },

    #[command(about = "Print a human-readable description")]
    Describe {
        #[arg(help = "JSON file with filter groups (- for stdin)")]
        file: String,
        #[arg(long, help = "JSON file with field display names")]
        fields: Option<String>,
    },
}

fn load_groups(path: &str) -> anyhow::Result<Vec<FilterGroup>> {
    let groups: Vec<FilterGroup> = serde_json::from_value(read_json_list(path, "filters")?)
        .with_context(|| format!("invalid filter groups in {}", path))?;
    check_limits(&groups, &config::config().filter)?;
    Ok(sort_by_order(groups))
}

fn load_fields(path: Option<&str>) -> anyhow::Result<Vec<FilterFieldInfo>> {
    match path {
        Some(path) => serde_json::from_value(read_json_list(path, "fields")?)
            .with_context(|| format!("invalid field definitions in {}", path)),
        None => Ok(vec![]),
    }
}

pub async fn handle(cmd: FilterCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        FilterCommands::Validate { file, fields } => {
            let groups = load_groups(&file)?;
            let fields = load_fields(fields.as_deref())?;
            let result = validate_filters(&groups, &fields);

            if result.is_valid {
                return output_success(&output_format, "Filters are valid", Some(json!({ "errors": [] })));
            }
            match output_format {
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Text => {
                    for error in &result.errors {
                        eprintln!("  - {}", error);
                    }
                }
            }
            bail!("{} filter validation error(s)", result.errors.len())
        }
        FilterCommands::Sql { file, alias } => {
            let groups = load_groups(&file)?;
            let result = filters_to_sql_where(&groups, &alias)?;
            match output_format {
                OutputFormat::Json => print_json(&result),
                OutputFormat::Text => {
                    println!("{}", if result.query.is_empty() { "(no conditions)" } else { result.query.as_str() });
                    for (i, param) in result.params.iter().enumerate() {
                        println!("  ${} = {}", i + 1, param);
                    }
                    Ok(())
                }
            }
        }
        FilterCommands::Describe { file, fields } => {
            let groups = load_groups(&file)?;
            let fields = load_fields(fields.as_deref())?;
            let description = describe_filters(&groups, &fields);
            match output_format {
                OutputFormat::Json => print_json(&json!({ "description": description })),
                OutputFormat::Text => {
                    println!("{}", description);
                    Ok(())
                }
            }
        }
    }
}
