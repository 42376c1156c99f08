//! Course catalog rows: CSV decoding, validation and labeled rendering.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use courseclaw_core::error::{CourseClawError, Result};

pub const COL_SUBJECT: &str = "SUBJ";
pub const COL_NUMBER: &str = "CRSE NUM";
pub const COL_SECTION: &str = "SEC";
pub const COL_TITLE: &str = "Title Short Desc";
pub const COL_FIRST_NAME: &str = "Primary Instructor First Name";
pub const COL_LAST_NAME: &str = "Primary Instructor Last Name";
pub const COL_EMAIL: &str = "Primary Instructor Email";
pub const COL_DAYS: &str = "Meet Days";
pub const COL_BEGIN: &str = "Begin Time";
pub const COL_END: &str = "End Time";
pub const COL_BUILDING: &str = "BLDG";
pub const COL_ROOM: &str = "RM";

/// Columns every row must provide, in rendering order.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    COL_SUBJECT,
    COL_NUMBER,
    COL_SECTION,
    COL_TITLE,
    COL_FIRST_NAME,
    COL_LAST_NAME,
    COL_EMAIL,
    COL_DAYS,
    COL_BEGIN,
    COL_END,
    COL_BUILDING,
    COL_ROOM,
];

/// One course section from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRecord {
    pub subject: String,
    pub number: String,
    pub section: String,
    pub title: String,
    /// Trimmed "first last".
    pub instructor: String,
    pub email: String,
    pub days: String,
    pub start_time: String,
    pub end_time: String,
    pub building: String,
    pub room: String,
}

impl CourseRecord {
    /// Labeled `Field:value` line used both for embedding and as the
    /// retrieval result, so hits are readable without a join.
    pub fn render(&self) -> String {
        format!(
            "SUBJ:{} Number:{} Section:{} Title:{} Instructor:{} Email:{} Days:{} Time:{}-{} Building:{} Room:{}",
            self.subject,
            self.number,
            self.section,
            self.title,
            self.instructor,
            self.email,
            self.days,
            self.start_time,
            self.end_time,
            self.building,
            self.room,
        )
    }
}

/// Join first and last name, trimming each part and the result.
pub fn instructor_name(first: &str, last: &str) -> String {
    format!("{} {}", first.trim(), last.trim()).trim().to_string()
}

/// Result of reading a catalog: valid records plus the number of rows dropped.
#[derive(Debug, Default)]
pub struct CatalogRows {
    pub records: Vec<CourseRecord>,
    pub skipped: usize,
}

/// Reads a header-bearing CSV export of the course catalog.
pub struct CatalogReader;

impl CatalogReader {
    /// Read a catalog file. A missing file or header is an `Ingestion` error.
    pub fn read_path(path: &Path) -> Result<CatalogRows> {
        let file = std::fs::File::open(path).map_err(|e| {
            CourseClawError::Ingestion(format!("Failed to open {}: {e}", path.display()))
        })?;
        Self::read(file)
    }

    /// Read catalog rows from any byte source.
    ///
    /// Rows that fail CSV decoding, or that are too short to reach a
    /// required column, are skipped. If the header lacks a required column
    /// every row is skipped.
    pub fn read<R: Read>(source: R) -> Result<CatalogRows> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(source);

        let header = reader
            .headers()
            .map_err(|e| CourseClawError::Ingestion(format!("Failed to read header: {e}")))?
            .clone();
        if header.is_empty() {
            return Err(CourseClawError::Ingestion("Catalog has no header row".into()));
        }

        // Later duplicates win, matching a plain name → index map.
        let idx: HashMap<&str, usize> = header.iter().enumerate().map(|(i, h)| (h, i)).collect();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !idx.contains_key(c))
            .collect();
        if !missing.is_empty() {
            tracing::warn!(
                "⚠️ Catalog header is missing column(s) {:?}; rows cannot be indexed",
                missing
            );
        }

        let mut rows = CatalogRows::default();
        for (line, result) in reader.records().enumerate() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Skipping unreadable catalog row {}: {e}", line + 2);
                    rows.skipped += 1;
                    continue;
                }
            };

            match parse_row(&record, &idx) {
                Some(course) => rows.records.push(course),
                None => {
                    tracing::debug!("Skipping incomplete catalog row {}", line + 2);
                    rows.skipped += 1;
                }
            }
        }

        tracing::info!(
            "📚 Read {} course(s) from catalog ({} skipped)",
            rows.records.len(),
            rows.skipped
        );
        Ok(rows)
    }
}

fn parse_row(record: &csv::StringRecord, idx: &HashMap<&str, usize>) -> Option<CourseRecord> {
    let field = |name: &str| idx.get(name).and_then(|&i| record.get(i));
    let text = |name: &str| field(name).map(str::to_string);
    Some(CourseRecord {
        subject: text(COL_SUBJECT)?,
        number: text(COL_NUMBER)?,
        section: text(COL_SECTION)?,
        title: text(COL_TITLE)?,
        instructor: instructor_name(field(COL_FIRST_NAME)?, field(COL_LAST_NAME)?),
        email: text(COL_EMAIL)?,
        days: text(COL_DAYS)?,
        start_time: text(COL_BEGIN)?,
        end_time: text(COL_END)?,
        building: text(COL_BUILDING)?,
        room: text(COL_ROOM)?,
    })
}

/// Structured lookups by instructor and by subject.
///
/// Derived from the same rows as the semantic index; retrieval and dialogue
/// never consult it.
#[derive(Debug, Default)]
pub struct CourseCatalog {
    by_instructor: BTreeMap<String, Vec<CourseRecord>>,
    by_subject: BTreeMap<String, Vec<CourseRecord>>,
}

impl CourseCatalog {
    pub fn from_records(records: &[CourseRecord]) -> Self {
        let mut catalog = Self::default();
        for course in records {
            catalog
                .by_instructor
                .entry(course.instructor.clone())
                .or_default()
                .push(course.clone());
            catalog
                .by_subject
                .entry(course.subject.clone())
                .or_default()
                .push(course.clone());
        }
        catalog
    }

    pub fn courses_by_instructor(&self, instructor: &str) -> &[CourseRecord] {
        self.by_instructor
            .get(instructor)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn courses_by_subject(&self, subject: &str) -> &[CourseRecord] {
        self.by_subject.get(subject).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn instructors(&self) -> impl Iterator<Item = &str> {
        self.by_instructor.keys().map(String::as_str)
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.by_subject.keys().map(String::as_str)
    }
}
