//! File-backed source adapters
//!
//! Reads snapshot and change-log dumps exported from a replica's backing
//! store, one TSV line per row:
//!
//! - entry snapshot: `dn <TAB> dn_trunc <TAB> modify_timestamp`, ordered by
//!   `dn_trunc`; the timestamp column may be empty and uses UTC
//!   `YYYY-MM-DD HH:MM:SS[.ffffff]`.
//! - change-log dump directory: `contexts.tsv` holding `eid <TAB> dn`, plus
//!   one `replchg<eid>.tsv` per context whose first data line is
//!   `maxid <TAB> <n>` followed by
//!   `offset <TAB> lastchangeid <TAB> subject_dn <TAB> control_text` rows.
//!
//! Blank lines and lines starting with `#` are skipped. A missing
//! per-context file surfaces as `TableMissing`, an unopenable snapshot as
//! `Connection`, an unreadable or unparseable row as `Query`/`Malformed`.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};

use super::{
    ChangeLogRow, ChangeLogSource, ChangeOffset, EntryRecord, EntryStream, ReplicationContext,
    SourceError, SourceResult,
};

const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// `EntryStream` over an exported entry snapshot file.
#[derive(Debug)]
pub struct FileEntryStream {
    reader: BufReader<File>,
    path: PathBuf,
    line_no: usize,
}

impl FileEntryStream {
    /// Open a snapshot file; `side` names the replica for diagnostics.
    pub fn open(path: &Path, side: &str) -> SourceResult<Self> {
        let file = File::open(path).map_err(|e| SourceError::Connection {
            side: side.to_string(),
            detail: format!("cannot open snapshot {}: {}", path.display(), e),
        })?;
        Ok(Self {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
            line_no: 0,
        })
    }

    fn parse_line(&self, line: &str) -> SourceResult<EntryRecord> {
        let mut fields = line.split('\t');
        let dn = fields.next().unwrap_or("");
        let truncation_key = fields.next().ok_or_else(|| self.malformed("missing dn_trunc"))?;
        let raw_timestamp = fields.next().unwrap_or("");
        let modify_timestamp = if raw_timestamp.is_empty() {
            None
        } else {
            Some(parse_snapshot_timestamp(raw_timestamp).ok_or_else(|| {
                self.malformed(&format!("bad timestamp '{}'", raw_timestamp))
            })?)
        };
        Ok(EntryRecord {
            // Snapshots may carry trailing padding on the dn column.
            dn: dn.trim_end().to_string(),
            truncation_key: truncation_key.to_string(),
            modify_timestamp,
        })
    }

    fn malformed(&self, detail: &str) -> SourceError {
        SourceError::Malformed {
            detail: format!("{}:{}: {}", self.path.display(), self.line_no, detail),
        }
    }
}

impl EntryStream for FileEntryStream {
    fn next_entry(&mut self) -> SourceResult<Option<EntryRecord>> {
        loop {
            let mut line = String::new();
            let read = self.reader.read_line(&mut line).map_err(|e| SourceError::Query {
                detail: format!("read from {} failed: {}", self.path.display(), e),
            })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return self.parse_line(line).map(Some);
        }
    }
}

fn parse_snapshot_timestamp(text: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, SNAPSHOT_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// `ChangeLogSource` over an exported change-log dump directory.
pub struct FileChangeLogSource {
    dir: PathBuf,
}

impl FileChangeLogSource {
    /// Open a dump directory; `side` names the replica for diagnostics.
    pub fn open(dir: &Path, side: &str) -> SourceResult<Self> {
        if !dir.is_dir() {
            return Err(SourceError::Connection {
                side: side.to_string(),
                detail: format!("dump directory {} not found", dir.display()),
            });
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn context_path(&self, context: &ReplicationContext) -> PathBuf {
        self.dir.join(format!("replchg{}.tsv", context.eid))
    }

    fn open_table(&self, context: &ReplicationContext) -> SourceResult<BufReader<File>> {
        let path = self.context_path(context);
        match File::open(&path) {
            Ok(file) => Ok(BufReader::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(SourceError::TableMissing {
                table: context.table_name(),
            }),
            Err(e) => Err(SourceError::Query {
                detail: format!("cannot open {}: {}", path.display(), e),
            }),
        }
    }

    fn read_table(
        &self,
        context: &ReplicationContext,
    ) -> SourceResult<(i64, Vec<(ChangeOffset, ChangeLogRow)>)> {
        let reader = self.open_table(context)?;
        let path = self.context_path(context);
        let mut max_id: Option<i64> = None;
        let mut rows = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| SourceError::Query {
                detail: format!("read from {} failed: {}", path.display(), e),
            })?;
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let malformed = |detail: String| SourceError::Malformed {
                detail: format!("{}:{}: {}", path.display(), idx + 1, detail),
            };
            let fields: Vec<&str> = line.split('\t').collect();
            if max_id.is_none() {
                if fields.len() != 2 || fields[0] != "maxid" {
                    return Err(malformed("expected 'maxid' header line".to_string()));
                }
                max_id = Some(
                    fields[1]
                        .parse::<i64>()
                        .map_err(|_| malformed(format!("bad maxid '{}'", fields[1])))?,
                );
                continue;
            }
            if fields.len() != 4 {
                return Err(malformed(format!("expected 4 columns, got {}", fields.len())));
            }
            let offset = match fields[0] {
                "0" => ChangeOffset::LastSuccessful,
                "1" => ChangeOffset::OldestPending,
                other => return Err(malformed(format!("bad offset '{}'", other))),
            };
            let last_change_id = fields[1]
                .parse::<i64>()
                .map_err(|_| malformed(format!("bad lastchangeid '{}'", fields[1])))?;
            rows.push((
                offset,
                ChangeLogRow {
                    subject_dn: fields[2].to_string(),
                    control_text: fields[3].to_string(),
                    last_change_id,
                },
            ));
        }
        match max_id {
            Some(max_id) => Ok((max_id, rows)),
            None => Err(SourceError::Malformed {
                detail: format!("{}: missing 'maxid' header line", path.display()),
            }),
        }
    }
}

impl ChangeLogSource for FileChangeLogSource {
    fn contexts(&mut self) -> SourceResult<Vec<ReplicationContext>> {
        let path = self.dir.join("contexts.tsv");
        let file = File::open(&path).map_err(|e| SourceError::Query {
            detail: format!("cannot open {}: {}", path.display(), e),
        })?;
        let mut contexts = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| SourceError::Query {
                detail: format!("read from {} failed: {}", path.display(), e),
            })?;
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (eid, dn) = line.split_once('\t').ok_or_else(|| SourceError::Malformed {
                detail: format!("{}:{}: expected 'eid<TAB>dn'", path.display(), idx + 1),
            })?;
            let eid = eid.parse::<i64>().map_err(|_| SourceError::Malformed {
                detail: format!("{}:{}: bad eid '{}'", path.display(), idx + 1, eid),
            })?;
            contexts.push(ReplicationContext {
                eid,
                dn: dn.to_string(),
            });
        }
        Ok(contexts)
    }

    fn changes(
        &mut self,
        context: &ReplicationContext,
        offset: ChangeOffset,
    ) -> SourceResult<Vec<ChangeLogRow>> {
        let (_, rows) = self.read_table(context)?;
        Ok(rows
            .into_iter()
            .filter(|(row_offset, _)| *row_offset == offset)
            .map(|(_, row)| row)
            .collect())
    }

    fn max_change_id(&mut self, context: &ReplicationContext) -> SourceResult<i64> {
        let (max_id, _) = self.read_table(context)?;
        Ok(max_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_snapshot_rows_parse_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "snap.tsv",
            "# exported snapshot\n\
             cn=a,o=example\tcn=a,o=example\t2023-04-01 10:00:00.000000\n\
             cn=b,o=example\tcn=b,o=example\t\n",
        );
        let mut stream = FileEntryStream::open(&path, "ldap1").unwrap();
        let first = stream.next_entry().unwrap().unwrap();
        assert_eq!(first.dn, "cn=a,o=example");
        assert!(first.modify_timestamp.is_some());
        let second = stream.next_entry().unwrap().unwrap();
        assert_eq!(second.dn, "cn=b,o=example");
        assert!(second.modify_timestamp.is_none());
        assert!(stream.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_missing_snapshot_is_connection_class() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileEntryStream::open(&dir.path().join("nope.tsv"), "ldap1").unwrap_err();
        assert!(err.is_connection());
    }

    #[test]
    fn test_bad_timestamp_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "snap.tsv", "cn=a\tcn=a\tnot-a-timestamp\n");
        let mut stream = FileEntryStream::open(&path, "ldap1").unwrap();
        let err = stream.next_entry().unwrap_err();
        assert!(matches!(err, SourceError::Malformed { .. }));
    }

    #[test]
    fn test_missing_table_file_is_structural() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "contexts.tsv", "42\to=example\n");
        let mut source = FileChangeLogSource::open(dir.path(), "ldap1").unwrap();
        let contexts = source.contexts().unwrap();
        assert_eq!(contexts.len(), 1);
        let err = source
            .changes(&contexts[0], ChangeOffset::LastSuccessful)
            .unwrap_err();
        assert_eq!(
            err,
            SourceError::TableMissing {
                table: "REPLCHG42".to_string()
            }
        );
    }

    #[test]
    fn test_change_table_splits_offsets() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "contexts.tsv", "7\to=example\n");
        write_file(
            dir.path(),
            "replchg7.tsv",
            "maxid\t100\n\
             0\t95\tcn=replica1,o=example\tno control here\n\
             1\t97\tcn=replica1,o=example\tno control here\n",
        );
        let mut source = FileChangeLogSource::open(dir.path(), "ldap1").unwrap();
        let contexts = source.contexts().unwrap();
        assert_eq!(source.max_change_id(&contexts[0]).unwrap(), 100);
        let successful = source
            .changes(&contexts[0], ChangeOffset::LastSuccessful)
            .unwrap();
        assert_eq!(successful.len(), 1);
        assert_eq!(successful[0].last_change_id, 95);
        let pending = source
            .changes(&contexts[0], ChangeOffset::OldestPending)
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].last_change_id, 97);
    }
}
