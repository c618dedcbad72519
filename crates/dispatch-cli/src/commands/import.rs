use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::cli::ImportArgs;
use crate::importer::{ImportConfig, Importer, DEFAULT_CONNECT_TIMEOUT};
use crate::output::OutputWriter;
use crate::progress::{create_spinner, finish_error, finish_success};

pub async fn execute(args: ImportArgs, output: &OutputWriter) -> Result<()> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;

    let importer = Importer::new(ImportConfig {
        base_url: args.service.url.clone(),
        api_key: args.service.api_key.clone(),
        batch_size: args.batch_size as usize,
        workers: args.workers as usize,
        request_timeout: Duration::from_secs(args.timeout),
        connect_timeout: DEFAULT_CONNECT_TIMEOUT,
    })?;

    output.info(format!(
        "Importing {} into {} ({} workers, batches of {})",
        args.file.display(),
        args.service.url,
        args.workers,
        args.batch_size
    ));

    let spinner = (!output.is_json()).then(|| create_spinner("Importing drivers"));
    let summary = match importer.run(reader, spinner.clone()).await {
        Ok(summary) => summary,
        Err(e) => {
            if let Some(pb) = &spinner {
                finish_error(pb, "Import failed");
            }
            return Err(e).context("import failed");
        }
    };
    if let Some(pb) = &spinner {
        finish_success(pb, "Import finished");
    }

    output.result(&summary)?;
    output.section("Import Summary");
    output.kv("Rows read", summary.rows);
    output.kv("Requested", summary.requested);
    output.kv("Created", summary.created);
    output.kv("Errors", summary.errors);
    output.kv("Skipped", summary.skipped);

    if summary.skipped > 0 {
        output.warning(format!(
            "{} rows could not be parsed (run with RUST_LOG=warn for details)",
            summary.skipped
        ));
    }

    if summary.requested > 0 && summary.created == 0 {
        bail!("no drivers were created; check the URL and API key");
    }
    output.success(format!("Imported {} drivers", summary.created));
    Ok(())
}
