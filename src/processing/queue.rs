// src/processing/queue.rs

//! Decides which remote images still need optimization.
//!
//! An image counts as optimized once its `-o` backup exists next to its
//! popup. The scan walks the configured directories in order and queues
//! every popup without a backup, or every popup at all when forced.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::core::{
    ListingDialect,
    QueueItem,
    RunOptions,
    VariantSet,
    is_original,
    is_popup,
};
use crate::remote::{RemoteEntry, RemoteStore, parse_listing};
use crate::utils::OptimizerResult;

/// Builds the ordered work queue for a run.
pub struct QueueBuilder<'a> {
    directories: &'a [String],
    dialect: ListingDialect,
    options: &'a RunOptions,
}

impl<'a> QueueBuilder<'a> {
    pub fn new(directories: &'a [String], dialect: ListingDialect, options: &'a RunOptions) -> Self {
        Self {
            directories,
            dialect,
            options,
        }
    }

    pub fn build(&self, store: &mut dyn RemoteStore) -> Vec<QueueItem> {
        if let Some(image) = &self.options.explicit_image {
            let item = QueueItem::from_remote_path(image);
            debug!("Queueing explicit image {}", item);
            return vec![item];
        }

        let limit = self.options.effective_limit();
        let mut queue = Vec::new();

        for directory in self.directories {
            if limit.is_some_and(|limit| queue.len() >= limit) {
                info!("Limit of {} images reached", queue.len());
                break;
            }

            let directory = directory.trim_matches('/');
            let entries = match self.scan(store, directory) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Skipping directory '{}': {}", directory, e);
                    continue;
                }
            };

            let limit_reached = self.queue_directory(directory, &entries, limit, &mut queue);
            if limit_reached {
                info!("Limit of {} images reached", queue.len());
                break;
            }
        }

        queue
    }

    fn scan(&self, store: &mut dyn RemoteStore, directory: &str) -> OptimizerResult<Vec<RemoteEntry>> {
        let lines = store.list(directory)?;
        let entries = parse_listing(&lines, self.dialect)?;
        debug!("Listed {} entries in '{}'", entries.len(), directory);
        Ok(entries)
    }

    /// Appends the directory's candidates to `queue`.
    ///
    /// Returns true once the limit stops the scan.
    fn queue_directory(
        &self,
        directory: &str,
        entries: &[RemoteEntry],
        limit: Option<usize>,
        queue: &mut Vec<QueueItem>,
    ) -> bool {
        let files = entries.iter().filter(|entry| !entry.is_directory);
        let (popups, originals): (Vec<&RemoteEntry>, Vec<&RemoteEntry>) = files
            .filter(|entry| is_popup(&entry.name) || is_original(&entry.name))
            .partition(|entry| is_popup(&entry.name));

        // popup name -> original name of images that already have a backup
        let optimized: HashMap<String, String> = originals
            .iter()
            .map(|entry| {
                let variants = VariantSet::from_filename(&entry.name);
                (variants.popup, variants.original)
            })
            .collect();

        for popup in popups {
            if limit.is_some_and(|limit| queue.len() >= limit) {
                return true;
            }

            let candidate = match optimized.get(&popup.name) {
                Some(_) if !self.options.force => continue,
                Some(original) => original.clone(),
                None => popup.name.clone(),
            };

            queue.push(QueueItem::new(directory, candidate));
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use crate::utils::RemoteError;

    /// Serves canned listings and records which directories were listed.
    #[derive(Default)]
    struct ListingOnly {
        listings: HashMap<String, Vec<String>>,
        listed: Vec<String>,
    }

    impl ListingOnly {
        fn with(mut self, directory: &str, names: &[&str]) -> Self {
            let lines = names
                .iter()
                .map(|name| format!("11-30-22  10:15AM                1024 {name}"))
                .collect();
            self.listings.insert(directory.to_string(), lines);
            self
        }
    }

    impl RemoteStore for ListingOnly {
        fn list(&mut self, directory: &str) -> Result<Vec<String>, RemoteError> {
            self.listed.push(directory.to_string());
            self.listings
                .get(directory)
                .cloned()
                .ok_or_else(|| RemoteError::Rejected(format!("550 {directory}: not found")))
        }

        fn get(&mut self, _path: &str) -> Result<Vec<u8>, RemoteError> {
            unreachable!("queue building never downloads")
        }

        fn put(&mut self, _path: &str, _source: &mut dyn Read) -> Result<(), RemoteError> {
            unreachable!("queue building never uploads")
        }

        fn delete(&mut self, _path: &str) -> Result<(), RemoteError> {
            unreachable!("queue building never deletes")
        }

        fn reconnect(&mut self) -> Result<(), RemoteError> {
            Ok(())
        }
    }

    fn build(store: &mut ListingOnly, directories: &[&str], options: RunOptions) -> Vec<QueueItem> {
        let directories: Vec<String> = directories.iter().map(|d| d.to_string()).collect();
        QueueBuilder::new(&directories, ListingDialect::Windows, &options).build(store)
    }

    #[test]
    fn optimized_popups_are_skipped_without_force() {
        let mut store = ListingOnly::default().with(
            "images",
            &["x-p.jpg", "x-o.jpg", "x.jpg", "y-p.jpg", "y-t.jpg"],
        );
        let queue = build(&mut store, &["/images/"], RunOptions::default());
        assert_eq!(queue, vec![QueueItem::new("images", "y-p.jpg")]);
    }

    #[test]
    fn force_requeues_optimized_images_from_their_original() {
        let mut store = ListingOnly::default().with("images", &["x-p.jpg", "x-o.jpg", "y-p.jpg"]);
        let options = RunOptions {
            force: true,
            ..RunOptions::default()
        };
        let queue = build(&mut store, &["images"], options);
        assert_eq!(
            queue,
            vec![
                QueueItem::new("images", "x-o.jpg"),
                QueueItem::new("images", "y-p.jpg"),
            ]
        );
        assert_eq!(VariantSet::from_filename(&queue[0].filename).product, "x.jpg");
    }

    #[test]
    fn limit_stops_the_whole_scan() {
        let names = ["a-p.jpg", "b-p.jpg", "c-p.jpg", "d-p.jpg", "e-p.jpg"];
        let mut store = ListingOnly::default()
            .with("first", &names)
            .with("second", &names);
        let options = RunOptions {
            limit: Some(3),
            ..RunOptions::default()
        };
        let queue = build(&mut store, &["first", "second"], options);

        let names: Vec<&str> = queue.iter().map(|item| item.filename.as_str()).collect();
        assert_eq!(names, vec!["a-p.jpg", "b-p.jpg", "c-p.jpg"]);
        assert!(queue.iter().all(|item| item.directory == "first"));
        assert_eq!(store.listed, vec!["first"]);
    }

    #[test]
    fn skipped_popups_do_not_count_toward_limit() {
        let mut store = ListingOnly::default()
            .with("first", &["a-p.jpg", "a-o.jpg", "b-p.jpg"])
            .with("second", &["c-p.jpg", "d-p.jpg"]);
        let options = RunOptions {
            limit: Some(2),
            ..RunOptions::default()
        };
        let queue = build(&mut store, &["first", "second"], options);
        assert_eq!(
            queue,
            vec![
                QueueItem::new("first", "b-p.jpg"),
                QueueItem::new("second", "c-p.jpg"),
            ]
        );
    }

    #[test]
    fn zero_limit_is_unlimited() {
        let mut store = ListingOnly::default().with("images", &["a-p.jpg", "b-p.png", "c-p.gif"]);
        let options = RunOptions {
            limit: Some(0),
            ..RunOptions::default()
        };
        assert_eq!(build(&mut store, &["images"], options).len(), 3);
    }

    #[test]
    fn unreadable_directories_are_skipped() {
        let mut store = ListingOnly::default()
            .with("empty", &[])
            .with("images", &["a-p.jpg"]);
        let queue = build(&mut store, &["missing", "empty", "images"], RunOptions::default());
        assert_eq!(queue, vec![QueueItem::new("images", "a-p.jpg")]);
        assert_eq!(store.listed, vec!["missing", "empty", "images"]);
    }

    #[test]
    fn explicit_image_bypasses_listing() {
        let mut store = ListingOnly::default().with("images", &["a-p.jpg"]);
        let options = RunOptions {
            explicit_image: Some("/dir/foo-p.jpg".into()),
            limit: Some(1),
            ..RunOptions::default()
        };
        let queue = build(&mut store, &["images"], options);
        assert_eq!(queue, vec![QueueItem::new("dir", "foo-p.jpg")]);
        assert!(store.listed.is_empty());
    }

    #[test]
    fn directories_and_other_files_never_qualify() {
        let lines = vec![
            "01-02-23  03:04PM       <DIR>          old-p.jpg".to_string(),
            "11-30-22  10:15AM                1024 notes-p.txt".to_string(),
            "11-30-22  10:15AM                1024 real-p.JPG".to_string(),
        ];
        let mut store = ListingOnly::default();
        store.listings.insert("images".into(), lines);
        let queue = build(&mut store, &["images"], RunOptions::default());
        assert_eq!(queue, vec![QueueItem::new("images", "real-p.JPG")]);
    }
}
