//! Snapshot file format: a pretty-printed JSON array of order records,
//! written and read wholesale.

use std::path::Path;

use fashiondesk_core::domain::order::OrderRecord;

use crate::store::StoreError;

pub fn encode(records: &[OrderRecord]) -> Result<Vec<u8>, StoreError> {
    let mut bytes = serde_json::to_vec_pretty(records).map_err(StoreError::Encode)?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn decode(path: &Path, bytes: &[u8]) -> Result<Vec<OrderRecord>, StoreError> {
    serde_json::from_slice(bytes)
        .map_err(|source| StoreError::Decode { path: path.to_path_buf(), source })
}

pub async fn read(path: &Path) -> Result<Vec<OrderRecord>, StoreError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| StoreError::Read { path: path.to_path_buf(), source })?;
    decode(path, &bytes)
}

pub async fn write(path: &Path, records: &[OrderRecord]) -> Result<(), StoreError> {
    let bytes = encode(records)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| StoreError::Write { path: path.to_path_buf(), source })?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| StoreError::Write { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{decode, encode};
    use crate::fixtures::seed_orders;
    use crate::store::StoreError;

    #[test]
    fn encoded_snapshot_is_an_indented_json_array() {
        let bytes = encode(&seed_orders()).expect("encode");
        let text = String::from_utf8(bytes).expect("utf8");

        assert!(text.starts_with("[\n  {\n    \"order_id\": \"123\""));
        assert!(text.contains("\"total_amount\": \"299.00\""));
        assert!(text.ends_with("]\n"));
    }

    #[test]
    fn decode_reports_path_on_malformed_input() {
        let result = decode(Path::new("orders.json"), b"{\"order_id\": 1}");

        match result {
            Err(StoreError::Decode { path, .. }) => assert_eq!(path, Path::new("orders.json")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
