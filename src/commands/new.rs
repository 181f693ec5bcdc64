//! Scaffold a new post

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::Site;

/// Create `<posts_dir>/<slugified title>/index.md` as an unpublished draft
pub fn create_post(site: &Site, title: &str) -> Result<PathBuf> {
    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Title {:?} does not produce a usable slug", title);
    }

    let index_file = site
        .config
        .index_files
        .first()
        .map(String::as_str)
        .unwrap_or("index.md");
    let target_dir = site.posts_dir.join(&slug);
    let file_path = target_dir.join(index_file);

    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    fs::create_dir_all(&target_dir)?;
    fs::write(&file_path, scaffold(title))?;

    tracing::info!("Created: {:?}", file_path);
    Ok(file_path)
}

fn scaffold(title: &str) -> String {
    let now = chrono::Local::now();
    // A JSON string is a valid YAML scalar, so titles with colons or quotes survive
    let quoted = serde_json::Value::String(title.to_string()).to_string();
    format!(
        "---\ntitle: {}\ndescription: \"\"\ndate: {}\npublished: false\n---\n\n",
        quoted,
        now.format("%Y-%m-%dT%H:%M:%S%:z")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FrontMatter;
    use tempfile::TempDir;

    #[test]
    fn test_create_post_is_a_parseable_draft() {
        let tmp = TempDir::new().unwrap();
        let site = Site::new(tmp.path()).unwrap();

        let path = create_post(&site, "Hello: \"World\"").unwrap();
        assert_eq!(path, site.posts_dir.join("hello-world").join("index.md"));

        let content = fs::read_to_string(&path).unwrap();
        let (front_matter, body) = FrontMatter::parse(&content, None).unwrap();
        assert_eq!(front_matter.title, "Hello: \"World\"");
        assert_eq!(front_matter.description, None);
        assert!(!front_matter.published);
        assert!(body.is_empty());
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let site = Site::new(tmp.path()).unwrap();
        create_post(&site, "Twice").unwrap();
        assert!(create_post(&site, "Twice").is_err());
    }
}
