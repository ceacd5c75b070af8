use anyhow::{anyhow, Result};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const POST_IMAGE_DIR: &str = "posts";
const MAX_NAME_ATTEMPTS: usize = 16;

/// Filesystem storage rooted at `MEDIA_ROOT`.
#[derive(Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join(POST_IMAGE_DIR)).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores an uploaded post image and returns its path relative to the
    /// media root, e.g. `posts/small.gif`.
    pub async fn save_post_image(&self, filename: &str, data: &[u8]) -> Result<String> {
        let (stem, ext) = split_filename(filename);

        let mut candidate = join_name(&stem, ext.as_deref());
        for _ in 0..MAX_NAME_ATTEMPTS {
            let relative = format!("{}/{}", POST_IMAGE_DIR, candidate);
            let path = self.root.join(&relative);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(data).await?;
                    file.flush().await?;
                    tracing::debug!(path = %relative, bytes = data.len(), "stored post image");
                    return Ok(relative);
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                    candidate = join_name(&format!("{}_{}", stem, random_suffix()), ext.as_deref());
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(anyhow!("could not find a free name for {}", filename))
    }

    pub async fn delete(&self, relative: &str) -> Result<()> {
        match tokio::fs::remove_file(self.root.join(relative)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn split_filename(filename: &str) -> (String, Option<String>) {
    // browsers may send a full client-side path
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let sanitized: String = base
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_start_matches('.');

    let (stem, ext) = match sanitized.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            (stem.to_string(), Some(ext.to_ascii_lowercase()))
        }
        _ => (sanitized.to_string(), None),
    };

    let stem = if stem.is_empty() { "image".to_string() } else { stem };
    (stem, ext)
}

fn join_name(stem: &str, ext: Option<&str>) -> String {
    match ext {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem.to_string(),
    }
}

fn random_suffix() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect()
}
