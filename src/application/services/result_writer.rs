use serde::Serialize;
use serde_json::{Map, Value};

use crate::application::ports::{FileStorage, FileStorageError};
use crate::domain::StoragePath;

pub const RESULT_TEXT_KEY: &str = "result_text";
pub const CONTENT_HASH_KEY: &str = "whisper_hash";
pub const EXECUTION_METADATA_FILE: &str = "METADATA.json";

/// Write extracted text to `output` and the rest of `payload` to the
/// `metadata/<stem>.json` sidecar. Only the text write can fail the call;
/// sidecar problems are logged.
pub async fn write_extraction_output(
    storage: &dyn FileStorage,
    output: &StoragePath,
    payload: &Map<String, Value>,
) -> Result<(), FileStorageError> {
    let text = payload
        .get(RESULT_TEXT_KEY)
        .and_then(Value::as_str)
        .unwrap_or_default();

    tracing::info!(path = %output, "Writing extracted text");
    storage.write_text(output, text).await?;

    let sidecar = output.metadata_sidecar();
    if let Err(e) = write_sidecar(storage, &sidecar, payload).await {
        tracing::warn!(path = %sidecar, error = %e, "Failed to write extraction metadata");
    }

    Ok(())
}

async fn write_sidecar(
    storage: &dyn FileStorage,
    sidecar: &StoragePath,
    payload: &Map<String, Value>,
) -> Result<(), FileStorageError> {
    if let Some(dir) = sidecar.parent() {
        storage.mkdir(&dir, true).await?;
    }

    let metadata: Map<String, Value> = payload
        .iter()
        .filter(|(key, _)| key.as_str() != RESULT_TEXT_KEY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let json = to_pretty_json(&metadata)
        .map_err(|e| FileStorageError::WriteFailed(format!("serialize metadata: {e}")))?;

    tracing::info!(path = %sidecar, "Writing extraction metadata");
    storage.write_text(sidecar, &json).await
}

/// Record the content hash in the run's execution-metadata file so later
/// stages can reuse the extraction. Existing keys are preserved.
pub async fn write_execution_metadata(
    storage: &dyn FileStorage,
    run_data_dir: &StoragePath,
    content_hash: &str,
) -> Result<StoragePath, FileStorageError> {
    let path = run_data_dir.join(EXECUTION_METADATA_FILE);

    let mut metadata = if storage.exists(&path).await? {
        let raw = storage.read(&path).await?;
        match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            _ => {
                tracing::warn!(path = %path, "Execution metadata is not a JSON object, replacing");
                Map::new()
            }
        }
    } else {
        Map::new()
    };

    metadata.insert(
        CONTENT_HASH_KEY.to_string(),
        Value::String(content_hash.to_string()),
    );

    storage.mkdir(run_data_dir, true).await?;
    let json = to_pretty_json(&metadata)
        .map_err(|e| FileStorageError::WriteFailed(format!("serialize metadata: {e}")))?;
    storage.write_text(&path, &json).await?;

    Ok(path)
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
