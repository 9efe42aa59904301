use std::io;
use std::path::Path;

use chrono::Duration;
use uuid::Uuid;

/// Write `bytes` to `path` via a uniquely named temp file in the same
/// directory, then rename over the destination.
///
/// Readers never observe a partial document; concurrent writers race on the
/// rename and the last one wins whole. Parent directories are created on
/// demand. The temp file is removed if the rename fails.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    tokio::fs::create_dir_all(parent).await?;

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("data");
    let tmp = parent.join(format!(".{name}.{}.tmp", Uuid::new_v4()));

    tokio::fs::write(&tmp, bytes).await?;
    match tokio::fs::rename(&tmp, path).await {
        Ok(()) => Ok(()),
        Err(err) => {
            let _ = tokio::fs::remove_file(&tmp).await;
            Err(err)
        }
    }
}

/// Format an elapsed duration as a short age (e.g. `"8s"`, `"3m"`, `"2h"`).
pub fn format_age(age: Duration) -> String {
    let secs = age.num_seconds();
    if secs < 1 {
        return "now".to_owned();
    }
    if secs < 60 {
        return format!("{secs}s");
    }

    let minutes = age.num_minutes();
    if minutes < 60 {
        return format!("{minutes}m");
    }

    let hours = age.num_hours();
    if hours < 24 {
        return format!("{hours}h");
    }

    format!("{}d", age.num_days())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_atomic_creates_parents_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ns/themeData.json");

        write_atomic(&path, b"{\"v\":1}").await.unwrap();
        write_atomic(&path, b"{\"v\":2}").await.unwrap();

        let data = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(data, "{\"v\":2}");

        // No temp files left behind.
        let mut entries = tokio::fs::read_dir(path.parent().unwrap()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name());
        }
        assert_eq!(names, vec![std::ffi::OsString::from("themeData.json")]);
    }

    #[test]
    fn ages_format_in_the_largest_whole_unit() {
        assert_eq!(format_age(Duration::milliseconds(300)), "now");
        assert_eq!(format_age(Duration::seconds(8)), "8s");
        assert_eq!(format_age(Duration::seconds(185)), "3m");
        assert_eq!(format_age(Duration::hours(26)), "1d");
    }
}
