use anyhow::Context;
use picker_core::PickerError;
use std::fs;
use std::path::Path;

pub fn read_dataset(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("read dataset {}", path.display()))
}

pub fn read_upload(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    String::from_utf8(bytes).with_context(|| format!("decode {} as utf-8", path.display()))
}

/// Dataset reader in the shape [`picker_core::Picker::bootstrap`] expects.
pub fn fetch_dataset(path: &Path) -> Result<String, PickerError> {
    read_dataset(path).map_err(|err| PickerError::ResourceLoadFailure(format!("{err:#}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn upload_rejects_invalid_utf8() {
        let file = unique_temp_file();
        std::fs::write(&file, [0x41, 0xff, 0xfe, 0x0a]).expect("write");
        let err = read_upload(&file).expect_err("invalid");
        assert!(format!("{err:#}").contains("utf-8"));
        let _ = std::fs::remove_file(file);
    }

    #[test]
    fn missing_dataset_maps_to_resource_failure() {
        let err = fetch_dataset(&unique_temp_file()).expect_err("missing");
        assert!(matches!(err, PickerError::ResourceLoadFailure(_)));
    }

    fn unique_temp_file() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "picker_data_load_test_{}_{}.csv",
            std::process::id(),
            nanos
        ))
    }
}
