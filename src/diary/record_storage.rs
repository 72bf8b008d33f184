use std::{
    cell::RefCell,
    future::Future,
    io::{ErrorKind, SeekFrom},
    ops::Deref,
    path::{Path, PathBuf},
};

use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, instrument, warn};

use super::{
    entities::{ActivityRecord, HEADER},
    error::{DiaryError, DiaryResult},
};

/// Interface for abstracting storage of activity records. Storage is append-only: records can be
/// added and read back in bulk, never changed.
pub trait RecordStorage {
    /// Makes sure the storage exists and carries the header. Calling it on an initialized storage
    /// does nothing.
    fn ensure_initialized(&self) -> impl Future<Output = DiaryResult<()>>;

    /// Adds a single record, initializing the storage first if needed.
    fn append(&self, record: &ActivityRecord) -> impl Future<Output = DiaryResult<()>>;

    /// Reads back every stored record in insertion order. Fails with [DiaryError::NotFound] if
    /// nothing was ever stored.
    fn load_all(&self) -> impl Future<Output = DiaryResult<Vec<ActivityRecord>>>;
}

impl<T: Deref> RecordStorage for T
where
    T::Target: RecordStorage,
{
    fn ensure_initialized(&self) -> impl Future<Output = DiaryResult<()>> {
        self.deref().ensure_initialized()
    }

    fn append(&self, record: &ActivityRecord) -> impl Future<Output = DiaryResult<()>> {
        self.deref().append(record)
    }

    fn load_all(&self) -> impl Future<Output = DiaryResult<Vec<ActivityRecord>>> {
        self.deref().load_all()
    }
}

/// The main realization of [RecordStorage]. Keeps the diary in a single csv file.
pub struct CsvRecordStorage {
    path: PathBuf,
}

impl CsvRecordStorage {
    pub fn new(path: PathBuf) -> Result<Self, std::io::Error> {
        if let Some(parent) = path.parent().filter(|v| !v.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open_for_append(&self) -> DiaryResult<File> {
        let file = File::options()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .await?;
        Ok(file)
    }

    /// Writes the header (for a new file) and the record while holding an exclusive lock on the
    /// diary file. The lock is released even if writing fails.
    async fn write_locked(&self, record: Option<&ActivityRecord>) -> DiaryResult<()> {
        let mut file = self.open_for_append().await?;
        file.lock_exclusive()?;
        let result = Self::write_with_file(&mut file, record).await;
        file.unlock_async().await?;
        result
    }

    async fn write_with_file(file: &mut File, record: Option<&ActivityRecord>) -> DiaryResult<()> {
        let mut buffer = Vec::<u8>::new();

        // Header presence is decided under the lock, so two writers can't both add it.
        let len = file.metadata().await?.len();
        if len == 0 {
            debug!("Writing header into an empty diary");
            buffer.extend(header_row()?);
        } else if !ends_with_newline(file).await? {
            // Last row of a hand-edited file may lack its terminator.
            debug!("Terminating last line of the diary");
            buffer.push(b'\n');
        }

        if let Some(record) = record {
            buffer.extend(record_row(record)?);
        }

        if !buffer.is_empty() {
            file.write_all(&buffer).await?;
            file.flush().await?;
        }
        Ok(())
    }
}

/// Expects a non-empty file. Writes in append mode ignore the cursor, so seeking here is safe.
async fn ends_with_newline(file: &mut File) -> DiaryResult<bool> {
    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] == b'\n')
}

fn header_row() -> DiaryResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(HEADER)?;
    writer.into_inner().map_err(|e| DiaryError::Io(e.into_error()))
}

fn record_row(record: &ActivityRecord) -> DiaryResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    writer.serialize(record)?;
    writer.into_inner().map_err(|e| DiaryError::Io(e.into_error()))
}

/// Parses diary contents. Illegal rows are skipped, a hand-edited file shouldn't make the whole
/// history unreadable.
fn parse_records(path: &Path, content: &str) -> Vec<ActivityRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut records = vec![];
    for row in reader.deserialize::<ActivityRecord>() {
        match row {
            Ok(v) => records.push(v),
            Err(e) => {
                warn!("During parsing in path {:?} found illegal row: {e}", path)
            }
        }
    }
    records
}

impl RecordStorage for CsvRecordStorage {
    #[instrument(skip(self), fields(path = ?self.path))]
    async fn ensure_initialized(&self) -> DiaryResult<()> {
        self.write_locked(None).await
    }

    #[instrument(skip_all, fields(path = ?self.path, activity = %record.activity))]
    async fn append(&self, record: &ActivityRecord) -> DiaryResult<()> {
        self.write_locked(Some(record)).await?;
        debug!("Appended record");
        Ok(())
    }

    #[instrument(skip(self), fields(path = ?self.path))]
    async fn load_all(&self) -> DiaryResult<Vec<ActivityRecord>> {
        let mut file = match File::open(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DiaryError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        file.lock_shared()?;
        let mut content = String::new();
        let read = file.read_to_string(&mut content).await;
        file.unlock_async().await?;
        read?;

        let records = parse_records(&self.path, &content);
        debug!("Loaded {} records", records.len());
        Ok(records)
    }
}

/// Keeps records in memory. `None` stands for storage that was never initialized, which lets it
/// mirror [CsvRecordStorage] reporting [DiaryError::NotFound].
#[derive(Debug, Default)]
pub struct MemoryRecordStorage {
    records: RefCell<Option<Vec<ActivityRecord>>>,
}

impl MemoryRecordStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ActivityRecord>) -> Self {
        Self {
            records: RefCell::new(Some(records)),
        }
    }

    /// Snapshot of stored records, `None` if storage wasn't initialized.
    pub fn records(&self) -> Option<Vec<ActivityRecord>> {
        self.records.borrow().clone()
    }
}

impl RecordStorage for MemoryRecordStorage {
    async fn ensure_initialized(&self) -> DiaryResult<()> {
        self.records.borrow_mut().get_or_insert_with(Vec::new);
        Ok(())
    }

    async fn append(&self, record: &ActivityRecord) -> DiaryResult<()> {
        self.records
            .borrow_mut()
            .get_or_insert_with(Vec::new)
            .push(record.clone());
        Ok(())
    }

    async fn load_all(&self) -> DiaryResult<Vec<ActivityRecord>> {
        self.records()
            .ok_or_else(|| DiaryError::NotFound(PathBuf::from("memory")))
    }
}
