/// Test utilities for repository-backed tests
///
/// `TestStorage` gives each test a fresh DuckDB file in a temp directory that
/// is removed on drop. `ScriptedRepository` is an in-memory repository whose
/// next failures can be scripted, for exercising the retry and error paths.
#[cfg(test)]
pub mod test_harness {
    use crate::domain::{
        AvailabilityBlock, AvailabilitySnapshot, BlockId, BookedRange, DateRange, NewBlock,
    };
    use crate::infrastructure::{AvailabilityRepository, DuckDbStorage};
    use anyhow::{Result, bail};
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    pub struct TestStorage {
        pub storage: DuckDbStorage,
        _temp_dir: TempDir, // Keep temp dir alive
    }

    impl TestStorage {
        pub fn new() -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp directory");
            let db_path = temp_dir.path().join("test.db");

            let storage =
                DuckDbStorage::new(&db_path).expect("Failed to initialize test DuckDB storage");

            Self {
                storage,
                _temp_dir: temp_dir,
            }
        }

        pub fn storage(&self) -> &DuckDbStorage {
            &self.storage
        }

        pub fn db_path(&self) -> PathBuf {
            self._temp_dir.path().join("test.db")
        }

        pub fn dir(&self) -> PathBuf {
            self._temp_dir.path().to_path_buf()
        }
    }

    #[derive(Default)]
    struct Scripted {
        blocked: Vec<AvailabilityBlock>,
        booked: Vec<BookedRange>,
        next_id: i64,
        failures_left: usize,
        fetches: usize,
    }

    #[derive(Default)]
    pub struct ScriptedRepository {
        inner: Mutex<Scripted>,
    }

    impl ScriptedRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_booking(self, range: DateRange) -> Self {
            self.inner.lock().unwrap().booked.push(BookedRange::new(range));
            self
        }

        pub fn with_block(self, range: DateRange) -> Self {
            {
                let mut inner = self.inner.lock().unwrap();
                inner.next_id += 1;
                let id = BlockId(inner.next_id);
                inner.blocked.push(AvailabilityBlock::new(id, range, None));
            }
            self
        }

        /// The next `count` calls of any kind fail.
        pub fn fail_next(&self, count: usize) {
            self.inner.lock().unwrap().failures_left = count;
        }

        pub fn fetches(&self) -> usize {
            self.inner.lock().unwrap().fetches
        }

        pub fn blocks(&self) -> Vec<AvailabilityBlock> {
            self.inner.lock().unwrap().blocked.clone()
        }

        fn check_failure(inner: &mut Scripted) -> Result<()> {
            if inner.failures_left > 0 {
                inner.failures_left -= 1;
                bail!("scripted repository failure");
            }
            Ok(())
        }
    }

    impl AvailabilityRepository for ScriptedRepository {
        fn availability(
            &self,
            _property_id: &str,
            window: DateRange,
        ) -> Result<AvailabilitySnapshot> {
            let mut inner = self.inner.lock().unwrap();
            inner.fetches += 1;
            Self::check_failure(&mut inner)?;
            Ok(AvailabilitySnapshot::new(
                inner
                    .blocked
                    .iter()
                    .filter(|b| b.range.overlaps(&window))
                    .cloned()
                    .collect(),
                inner
                    .booked
                    .iter()
                    .filter(|b| b.range.overlaps(&window))
                    .copied()
                    .collect(),
            ))
        }

        fn block_dates(&self, _property_id: &str, block: NewBlock) -> Result<AvailabilityBlock> {
            let mut inner = self.inner.lock().unwrap();
            Self::check_failure(&mut inner)?;
            inner.next_id += 1;
            let created = AvailabilityBlock::new(BlockId(inner.next_id), block.range, block.reason);
            inner.blocked.push(created.clone());
            Ok(created)
        }

        fn unblock_dates(&self, _property_id: &str, block_id: BlockId) -> Result<()> {
            let mut inner = self.inner.lock().unwrap();
            Self::check_failure(&mut inner)?;
            let before = inner.blocked.len();
            inner.blocked.retain(|b| b.id != block_id);
            if inner.blocked.len() == before {
                bail!("Block {} not found", block_id);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_harness::*;
    use crate::domain::DateRange;
    use crate::infrastructure::AvailabilityRepository;
    use chrono::NaiveDate;

    #[test]
    fn test_scripted_repository_filters_by_window() {
        let march = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let repo = ScriptedRepository::new().with_booking(DateRange::day(march));

        let hit = repo
            .availability("villa-1", DateRange::month(2025, 3).unwrap())
            .unwrap();
        let miss = repo
            .availability("villa-1", DateRange::month(2025, 4).unwrap())
            .unwrap();

        assert_eq!(hit.booked.len(), 1);
        assert!(miss.booked.is_empty());
        assert_eq!(repo.fetches(), 2);
    }

    #[test]
    fn test_scripted_failures_run_out() {
        let repo = ScriptedRepository::new();
        repo.fail_next(1);
        let window = DateRange::month(2025, 3).unwrap();

        assert!(repo.availability("villa-1", window).is_err());
        assert!(repo.availability("villa-1", window).is_ok());
    }

    #[test]
    fn test_harness_isolation() {
        let first = TestStorage::new();
        let second = TestStorage::new();
        assert_ne!(first.db_path(), second.db_path());
        assert!(first.db_path().exists());
    }
}
