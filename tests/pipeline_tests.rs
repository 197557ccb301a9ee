//! End-to-end runs of the optimization pipeline against an in-memory FTP
//! tree and a scripted transform service.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::sync::Mutex;

use ftp_image_optimizer::core::{AppConfig, Dimensions, NullSink, RunOptions};
use ftp_image_optimizer::processing::{ImageSource, SourceHandle, TransformService};
use ftp_image_optimizer::remote::RemoteStore;
use ftp_image_optimizer::utils::{RemoteError, ServiceError};
use ftp_image_optimizer::{optimize_with, upload_with};

const CONFIG: &str = r#"
host: ftp.example.com
username: shop
password: secret
base_url: https://shop.example.com
directories:
  - /images/
  - images/products
image_settings:
  product:   { width: 600,  height: 600 }
  related:   { width: 200,  height: 200 }
  thumbnail: { width: 100,  height: 100 }
  popup:     { width: 1200, height: 1200 }
transform:
  api_key: test-key
"#;

/// Flat map of remote paths to contents that answers `LIST` in the
/// Windows/IIS format.
#[derive(Default)]
struct FakeFtp {
    files: BTreeMap<String, Vec<u8>>,
    listed: Vec<String>,
    closed: bool,
}

impl FakeFtp {
    fn with(paths: &[&str]) -> Self {
        let files = paths
            .iter()
            .map(|path| (path.to_string(), format!("source of {path}").into_bytes()))
            .collect();
        Self {
            files,
            ..Self::default()
        }
    }

    fn content(&self, path: &str) -> Option<String> {
        self.files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

impl RemoteStore for FakeFtp {
    fn list(&mut self, directory: &str) -> Result<Vec<String>, RemoteError> {
        self.listed.push(directory.to_string());
        let prefix = format!("{directory}/");

        let mut subdirectories = BTreeSet::new();
        let mut lines = Vec::new();
        for (path, bytes) in &self.files {
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((subdirectory, _)) => {
                    subdirectories.insert(subdirectory.to_string());
                }
                None => lines.push(format!("11-30-22  10:15AM {:>20} {}", bytes.len(), rest)),
            }
        }

        if lines.is_empty() && subdirectories.is_empty() {
            return Err(RemoteError::Rejected(format!("550 {directory}: not found")));
        }
        lines.extend(
            subdirectories
                .into_iter()
                .map(|name| format!("11-30-22  10:15AM       <DIR>          {name}")),
        );
        Ok(lines)
    }

    fn get(&mut self, path: &str) -> Result<Vec<u8>, RemoteError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| RemoteError::Rejected(format!("550 {path}")))
    }

    fn put(&mut self, path: &str, source: &mut dyn Read) -> Result<(), RemoteError> {
        let mut bytes = Vec::new();
        source
            .read_to_end(&mut bytes)
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        self.files.insert(path.to_string(), bytes);
        Ok(())
    }

    fn delete(&mut self, path: &str) -> Result<(), RemoteError> {
        self.files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| RemoteError::Rejected(format!("550 {path}")))
    }

    fn reconnect(&mut self) -> Result<(), RemoteError> {
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Answers every fit with the requested size as text, so uploads can be
/// checked by content.
#[derive(Default)]
struct ScriptedTransform {
    /// Sources whose url contains this marker are refused
    refuse: Option<&'static str>,
    submitted: Mutex<Vec<ImageSource>>,
}

impl ScriptedTransform {
    fn refusing(marker: &'static str) -> Self {
        Self {
            refuse: Some(marker),
            ..Self::default()
        }
    }

    fn submitted_urls(&self) -> Vec<String> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .filter_map(|source| match source {
                ImageSource::Url(url) => Some(url.clone()),
                ImageSource::Bytes(_) => None,
            })
            .collect()
    }
}

impl TransformService for ScriptedTransform {
    fn submit(&self, source: ImageSource) -> Result<SourceHandle, ServiceError> {
        if let (Some(marker), ImageSource::Url(url)) = (self.refuse, &source) {
            if url.contains(marker) {
                return Err(ServiceError::Rejected {
                    status: 400,
                    message: "Input file is not a valid image".into(),
                });
            }
        }
        self.submitted.lock().unwrap().push(source);
        Ok(SourceHandle {
            location: "https://api.tinify.com/output/abc".into(),
        })
    }

    fn fit(&self, _source: &SourceHandle, dimensions: Dimensions) -> Result<Vec<u8>, ServiceError> {
        Ok(dimensions.to_string().into_bytes())
    }
}

fn config() -> AppConfig {
    AppConfig::from_yaml(CONFIG).unwrap()
}

#[test]
fn scan_optimizes_new_images_and_skips_backed_up_ones() {
    let mut ftp = FakeFtp::with(&[
        "images/shoe-p.jpg",
        "images/hat-p.jpg",
        "images/hat-o.jpg",
        "images/notes.txt",
        "images/products/bag-p.png",
    ]);
    let transform = ScriptedTransform::default();

    let summary = optimize_with(
        &mut ftp,
        &transform,
        &config(),
        &RunOptions::default(),
        Box::new(NullSink),
    )
    .unwrap();

    assert_eq!(summary.queued, 2);
    assert_eq!(summary.optimized, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(ftp.listed, vec!["images", "images/products"]);
    assert_eq!(
        transform.submitted_urls(),
        vec![
            "https://shop.example.com/images/shoe-p.jpg",
            "https://shop.example.com/images/products/bag-p.png",
        ]
    );

    assert_eq!(ftp.content("images/shoe-o.jpg").as_deref(), Some("source of images/shoe-p.jpg"));
    assert_eq!(ftp.content("images/shoe-p.jpg").as_deref(), Some("1200x1200"));
    assert_eq!(ftp.content("images/shoe-t.jpg").as_deref(), Some("100x100"));
    assert_eq!(ftp.content("images/shoe-r.jpg").as_deref(), Some("200x200"));
    assert_eq!(ftp.content("images/shoe.jpg").as_deref(), Some("600x600"));
    assert_eq!(ftp.content("images/products/bag.png").as_deref(), Some("600x600"));

    // already backed up, left alone
    assert_eq!(ftp.content("images/hat-p.jpg").as_deref(), Some("source of images/hat-p.jpg"));
    assert!(ftp.content("images/hat.jpg").is_none());
    assert!(ftp.closed);
}

#[test]
fn force_reoptimizes_from_the_backup() {
    let mut ftp = FakeFtp::with(&["images/hat-p.jpg", "images/hat-o.jpg"]);
    let transform = ScriptedTransform::default();
    let options = RunOptions {
        force: true,
        ..RunOptions::default()
    };

    let summary = optimize_with(&mut ftp, &transform, &config(), &options, Box::new(NullSink)).unwrap();

    assert_eq!(summary.optimized, 1);
    assert_eq!(
        transform.submitted_urls(),
        vec!["https://shop.example.com/images/hat-o.jpg"]
    );
    assert_eq!(ftp.content("images/hat-o.jpg").as_deref(), Some("source of images/hat-o.jpg"));
    assert_eq!(ftp.content("images/hat-p.jpg").as_deref(), Some("1200x1200"));
}

#[test]
fn limit_caps_the_queue_across_directories() {
    let mut ftp = FakeFtp::with(&[
        "images/a-p.jpg",
        "images/b-p.jpg",
        "images/products/c-p.jpg",
    ]);
    let transform = ScriptedTransform::default();
    let options = RunOptions {
        limit: Some(2),
        ..RunOptions::default()
    };

    let summary = optimize_with(&mut ftp, &transform, &config(), &options, Box::new(NullSink)).unwrap();

    assert_eq!(summary.queued, 2);
    assert_eq!(summary.optimized, 2);
    assert_eq!(ftp.listed, vec!["images"]);
    assert!(ftp.content("images/products/c-o.jpg").is_none());
}

#[test]
fn explicit_image_skips_the_scan() {
    let mut ftp = FakeFtp::with(&["images/products/bag-p.png", "images/shoe-p.jpg"]);
    let transform = ScriptedTransform::default();
    let options = RunOptions {
        explicit_image: Some("/images/products/bag-p.png".into()),
        ..RunOptions::default()
    };

    let summary = optimize_with(&mut ftp, &transform, &config(), &options, Box::new(NullSink)).unwrap();

    assert_eq!(summary.optimized, 1);
    assert!(ftp.listed.is_empty());
    assert!(ftp.content("images/products/bag-o.png").is_some());
    assert!(ftp.content("images/shoe-o.jpg").is_none());
}

#[test]
fn refused_image_is_rolled_back_and_the_run_continues() {
    let mut ftp = FakeFtp::with(&["images/broken-p.jpg", "images/good-p.jpg"]);
    let transform = ScriptedTransform::refusing("broken");

    let summary = optimize_with(
        &mut ftp,
        &transform,
        &config(),
        &RunOptions::default(),
        Box::new(NullSink),
    )
    .unwrap();

    assert_eq!(summary.queued, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.optimized, 1);
    assert_eq!(summary.rollback_failed, 0);

    // no backup left behind, so the next run picks it up again
    assert!(ftp.content("images/broken-o.jpg").is_none());
    assert_eq!(ftp.content("images/broken-p.jpg").as_deref(), Some("source of images/broken-p.jpg"));
    assert!(ftp.content("images/good-o.jpg").is_some());
}

#[test]
fn unreadable_directory_is_skipped() {
    let mut ftp = FakeFtp::with(&["images/products/bag-p.png"]);
    let transform = ScriptedTransform::default();
    let mut config = config();
    config.directories = vec!["missing".into(), "images/products".into()];

    let summary = optimize_with(
        &mut ftp,
        &transform,
        &config,
        &RunOptions::default(),
        Box::new(NullSink),
    )
    .unwrap();

    assert_eq!(ftp.listed, vec!["missing", "images/products"]);
    assert_eq!(summary.optimized, 1);
}

#[test]
fn dry_run_changes_nothing() {
    let mut ftp = FakeFtp::with(&["images/shoe-p.jpg", "images/products/bag-p.png"]);
    let before = ftp.files.clone();
    let transform = ScriptedTransform::default();
    let options = RunOptions {
        dry_run: true,
        ..RunOptions::default()
    };

    let summary = optimize_with(&mut ftp, &transform, &config(), &options, Box::new(NullSink)).unwrap();

    assert_eq!(summary.queued, 2);
    assert_eq!(summary.skipped, 2);
    assert_eq!(ftp.files, before);
    assert!(transform.submitted.lock().unwrap().is_empty());
}

#[test]
fn direct_upload_creates_every_variant() {
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("chair.jpg");
    std::fs::write(&local, b"local chair").unwrap();

    let mut ftp = FakeFtp::default();
    let transform = ScriptedTransform::default();

    let variants = upload_with(&mut ftp, &transform, &config(), &local, "images/new").unwrap();

    assert_eq!(variants.product, "chair.jpg");
    assert_eq!(ftp.content("images/new/chair-o.jpg").as_deref(), Some("local chair"));
    assert_eq!(ftp.content("images/new/chair-p.jpg").as_deref(), Some("1200x1200"));
    assert_eq!(ftp.content("images/new/chair.jpg").as_deref(), Some("600x600"));
    assert_eq!(ftp.files.len(), 5);
    assert!(matches!(
        transform.submitted.lock().unwrap().as_slice(),
        [ImageSource::Bytes(bytes)] if bytes == b"local chair"
    ));
}

#[test]
fn direct_upload_of_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut ftp = FakeFtp::default();

    let result = upload_with(
        &mut ftp,
        &ScriptedTransform::default(),
        &config(),
        &dir.path().join("absent.jpg"),
        "images",
    );

    assert!(result.is_err());
    assert!(ftp.files.is_empty());
}
