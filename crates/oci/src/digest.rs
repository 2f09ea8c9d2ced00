//! Blob digest computation and verification.

use std::path::Path;

use sha2::{Digest, Sha256, Sha512};
use tokio::io::AsyncReadExt;

use crate::{Error, Result};

const BUFFER_SIZE: usize = 8192;

/// Compute the digest of a file using the algorithm named by `expected`.
///
/// Returns the digest in OCI format (`sha256:<hex>` or `sha512:<hex>`).
/// Unknown algorithms are reported as an integrity failure since the
/// content cannot be verified.
pub async fn compute_file_digest(path: &Path, expected: &str) -> Result<String> {
    let algorithm = expected.split_once(':').map_or("sha256", |(algo, _)| algo);
    match algorithm {
        "sha256" => hash_file::<Sha256>(path, algorithm).await,
        "sha512" => hash_file::<Sha512>(path, algorithm).await,
        other => Err(Error::integrity(
            expected,
            format!("unsupported digest algorithm '{other}'"),
        )),
    }
}

/// Verify that a file hashes to `expected`.
pub async fn verify_file_digest(path: &Path, expected: &str) -> Result<()> {
    let actual = compute_file_digest(path, expected).await?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(Error::integrity(expected, actual))
    }
}

async fn hash_file<D: Digest>(path: &Path, algorithm: &str) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = D::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{algorithm}:{}", hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EMPTY_SHA256: &str =
        "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const HELLO_SHA256: &str =
        "sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[tokio::test]
    async fn test_compute_file_digest() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("blob");

        std::fs::write(&file_path, b"").unwrap();
        assert_eq!(
            compute_file_digest(&file_path, EMPTY_SHA256).await.unwrap(),
            EMPTY_SHA256
        );

        std::fs::write(&file_path, b"hello").unwrap();
        assert_eq!(
            compute_file_digest(&file_path, HELLO_SHA256).await.unwrap(),
            HELLO_SHA256
        );
    }

    #[tokio::test]
    async fn test_sha512_digest() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("blob");
        std::fs::write(&file_path, b"hello").unwrap();

        let digest = compute_file_digest(&file_path, "sha512:00").await.unwrap();
        assert!(digest.starts_with("sha512:9b71d224bd62f378"));
        assert_eq!(digest.len(), "sha512:".len() + 128);
    }

    #[tokio::test]
    async fn test_larger_than_buffer() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("large.bin");
        let content: Vec<u8> = (0..20000).map(|i| (i % 256) as u8).collect();
        std::fs::write(&file_path, &content).unwrap();

        let digest = compute_file_digest(&file_path, "sha256:").await.unwrap();
        assert_eq!(digest.len(), "sha256:".len() + 64);
    }

    #[tokio::test]
    async fn test_verify_mismatch() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("blob");
        std::fs::write(&file_path, b"tampered").unwrap();

        let err = verify_file_digest(&file_path, HELLO_SHA256).await.unwrap_err();
        assert!(matches!(err, Error::Integrity { .. }));
    }

    #[tokio::test]
    async fn test_verify_match() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("blob");
        std::fs::write(&file_path, b"hello").unwrap();

        verify_file_digest(&file_path, HELLO_SHA256).await.unwrap();
    }

    #[tokio::test]
    async fn test_unsupported_algorithm() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("blob");
        std::fs::write(&file_path, b"hello").unwrap();

        let err = compute_file_digest(&file_path, "md5:abc").await.unwrap_err();
        assert!(matches!(err, Error::Integrity { .. }));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = compute_file_digest(Path::new("/nonexistent/blob"), EMPTY_SHA256).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
