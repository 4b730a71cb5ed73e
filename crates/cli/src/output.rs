//! Writing conversion results to disk.

use std::path::{Path, PathBuf};

use rasterbridge_core::ConversionOutput;

/// Writes a document or its pages into `dir`, returning the written paths
/// in page order.
pub async fn write_output(dir: &Path, output: &ConversionOutput) -> std::io::Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir).await?;

    let files: Vec<(&str, &[u8])> = match output {
        ConversionOutput::Document(doc) => vec![(doc.file_name.as_str(), doc.bytes.as_slice())],
        ConversionOutput::Pages(pages) => pages
            .iter()
            .map(|p| (p.file_name.as_str(), p.bytes.as_slice()))
            .collect(),
    };

    let mut written = Vec::with_capacity(files.len());
    for (name, bytes) in files {
        let path = dir.join(name);
        tokio::fs::write(&path, bytes).await?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasterbridge_core::pipeline::{OutputDocument, OutputPage};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_document() {
        let dir = TempDir::new().unwrap();
        let output = ConversionOutput::Document(OutputDocument {
            file_name: "scan.tiff".to_string(),
            mime_type: "image/tiff",
            bytes: b"II*\0".to_vec(),
        });

        let written = write_output(dir.path(), &output).await.unwrap();
        assert_eq!(written, vec![dir.path().join("scan.tiff")]);
        assert_eq!(std::fs::read(&written[0]).unwrap(), b"II*\0");
    }

    #[tokio::test]
    async fn test_write_pages_in_order() {
        let dir = TempDir::new().unwrap();
        let out_dir = dir.path().join("pages");
        let output = ConversionOutput::Pages(
            (0..3)
                .map(|i| OutputPage {
                    index: i,
                    file_name: format!("fax{}.jpg", i),
                    bytes: vec![i as u8],
                })
                .collect(),
        );

        let written = write_output(&out_dir, &output).await.unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(written[2], out_dir.join("fax2.jpg"));
        assert_eq!(std::fs::read(&written[1]).unwrap(), vec![1]);
    }
}
