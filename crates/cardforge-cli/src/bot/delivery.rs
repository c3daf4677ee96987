use std::fs::create_dir_all;

use cardforge_core::{BatchOutcome, Delivery, write_artifact};

use super::{BotResult, Reply};
use crate::workspace::{ArtifactSettings, WorkspacePaths, new_artifact_id};

/// Turn a generated batch into outgoing replies, writing the attachment file if needed.
pub fn deliver(
    paths: &WorkspacePaths,
    settings: &ArtifactSettings,
    outcome: BatchOutcome,
) -> BotResult<Vec<Reply>> {
    let BatchOutcome {
        bin,
        delivery,
        elapsed,
        ..
    } = outcome;

    match delivery {
        Delivery::Inline(records) => Ok(records
            .iter()
            .map(|record| Reply::text(record.to_string()))
            .collect()),
        Delivery::Attachment { records, metadata } => {
            create_dir_all(&paths.out_dir)?;
            let path = paths
                .out_dir
                .join(format!("{}.txt", new_artifact_id("gen")));
            let footer = settings.duration_footer.then_some(elapsed);
            let bytes = write_artifact(&path, &records, footer)?;
            tracing::info!(
                event = "artifact_written",
                path = %path.display(),
                bin = %bin,
                count = records.len(),
                bytes = bytes
            );

            let info = match metadata {
                Some(record) => format!("BIN Information:\n{}", record.describe()),
                None => format!("No information found for BIN {bin}; metadata is unavailable."),
            };
            Ok(vec![
                Reply::Document {
                    path,
                    caption: format!("{} cards for BIN {bin}", records.len()),
                },
                Reply::text(info),
            ])
        }
    }
}
