use anyhow::{bail, Context};
use clap::Args;
use serde_json::Value;

use crate::api::table::TableRequest;
use crate::cli::utils::{print_json, read_json, read_json_list};
use crate::cli::OutputFormat;
use crate::config;
use crate::filter::FilterGroup;
use crate::record::Record;
use crate::table::text::format_view;
use crate::table::{SearchBox, Selection, TableView};

#[derive(Args, Debug)]
pub struct ViewArgs {
    #[arg(help = "JSON file with a record or an array of records (- for stdin)")]
    pub file: String,

    #[arg(long, value_delimiter = ',', help = "Keys searched by --query")]
    pub search_keys: Vec<String>,

    #[arg(long, short, help = "Search query")]
    pub query: Option<String>,

    #[arg(long, value_delimiter = ',', help = "Columns to show (inferred when omitted)")]
    pub columns: Vec<String>,

    #[arg(long, value_delimiter = ',', help = "Selected record ids")]
    pub select: Vec<String>,

    #[arg(long, help = "Identity field; enables selection checkboxes")]
    pub id_field: Option<String>,

    #[arg(long, help = "JSON file with filter groups")]
    pub filters: Option<String>,

    #[arg(long, help = "Table title")]
    pub title: Option<String>,

    #[arg(long, help = "Render on a running server, e.g. http://localhost:3000")]
    pub remote: Option<String>,
}

impl ViewArgs {
    fn to_request(&self) -> anyhow::Result<TableRequest> {
        let data = Record::from_json_flexible(read_json(&self.file)?)?;
        let filters: Vec<FilterGroup> = match &self.filters {
            Some(path) => serde_json::from_value(read_json_list(path, "filters")?)
                .with_context(|| format!("invalid filter groups in {}", path))?,
            None => vec![],
        };

        Ok(TableRequest {
            data,
            search_keys: self.search_keys.clone(),
            query: self.query.clone().unwrap_or_default(),
            show_search: true,
            enable_selection: self.id_field.is_some(),
            selected: self.select.iter().cloned().collect::<Selection>(),
            id_field: self.id_field.clone(),
            columns: (!self.columns.is_empty()).then(|| self.columns.clone()),
            title: self.title.clone(),
            filters,
            ..TableRequest::default()
        })
    }
}

pub async fn handle(args: ViewArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let request = args.to_request()?;

    if let Some(remote) = &args.remote {
        let data = view_remote(remote, &request).await?;
        return match output_format {
            OutputFormat::Json => print_json(&data),
            OutputFormat::Text => {
                println!("{}", format_remote(&data));
                Ok(())
            }
        };
    }

    let id_field = request.id_field.clone();
    let prepared = request.prepare(config::config()).await?;
    match output_format {
        OutputFormat::Json => print_json(&prepared.view(id_field)),
        OutputFormat::Text => {
            println!("{}", prepared.text());
            Ok(())
        }
    }
}

async fn view_remote(remote: &str, request: &TableRequest) -> anyhow::Result<Value> {
    let url = format!("{}/api/table/view", remote.trim_end_matches('/'));
    tracing::debug!("POST {}", url);

    let response = reqwest::Client::new()
        .post(&url)
        .json(request)
        .timeout(std::time::Duration::from_secs(30))
        .send()
        .await
        .with_context(|| format!("failed to reach {}", url))?;

    let status = response.status();
    let body: Value = response.json().await.context("server returned invalid JSON")?;
    if !status.is_success() {
        let message = body.get("message").and_then(Value::as_str).unwrap_or("request failed");
        bail!("{} ({})", message, status);
    }
    Ok(body.get("data").cloned().unwrap_or(Value::Null))
}

/// Text layout for a view rendered by the server
fn format_remote(data: &Value) -> String {
    let str_of = |v: &Value| v.as_str().map(str::to_string);
    let view = match data["state"].as_str() {
        Some("loading") => TableView::Loading,
        Some("table") => {
            let with_selection = data["selection"]["enabled"].as_bool().unwrap_or(false);
            let columns: Vec<String> = data["header"]["columns"]
                .as_array()
                .map(|cols| cols.iter().filter_map(str_of).collect())
                .unwrap_or_default();

            let header_lead = with_selection.then(|| {
                let cell = &data["header"]["select_all"];
                if cell["checked"].as_bool() == Some(true) {
                    "[x]"
                } else if cell["indeterminate"].as_bool() == Some(true) {
                    "[-]"
                } else {
                    "[ ]"
                }
            });
            let header = line(header_lead, columns.clone());

            let rows = data["rows"]
                .as_array()
                .map(|rows| {
                    rows.iter()
                        .map(|row| {
                            let lead = with_selection
                                .then(|| if row["selected"].as_bool() == Some(true) { "[x]" } else { "[ ]" });
                            let cells = columns
                                .iter()
                                .map(|c| str_of(&row["cells"][c]).unwrap_or_default())
                                .collect();
                            line(lead, cells)
                        })
                        .collect()
                })
                .unwrap_or_default();
            TableView::Table { header: Some(header), rows }
        }
        _ => TableView::Empty {
            message: str_of(&data["message"]).unwrap_or_default(),
        },
    };

    let placeholder = data["search"]["placeholder"].as_str();
    let search = placeholder.map(|placeholder| SearchBox {
        placeholder,
        query: data["search"]["query"].as_str().unwrap_or_default(),
    });
    format_view(data["title"].as_str(), search.as_ref(), &view)
}

fn line(lead: Option<&str>, cells: Vec<String>) -> String {
    lead.map(str::to_string).into_iter().chain(cells).collect::<Vec<_>>().join(" | ")
}
