// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read back hit files.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use log::debug;
use thiserror::Error;

use crate::hit::{
    codec::{read_record, HitCodecError},
    HitRecord,
};

#[derive(Error, Debug)]
pub enum HitFileReadError {
    #[error("Couldn't open hit file '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Hit file '{}' has a bad record (number {record}): {source}", path.display())]
    BadRecord {
        path: PathBuf,
        record: usize,
        source: HitCodecError,
    },
}

/// Reads the records of a hit file in the order they were written.
pub struct HitFileReader {
    path: PathBuf,
    reader: BufReader<File>,
    num_read: usize,

    /// Set after the end of the file or an error; nothing more is yielded.
    done: bool,
}

impl HitFileReader {
    pub fn new(path: &Path) -> Result<HitFileReader, HitFileReadError> {
        let file = File::open(path).map_err(|source| HitFileReadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(HitFileReader {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            num_read: 0,
            done: false,
        })
    }
}

impl Iterator for HitFileReader {
    type Item = Result<HitRecord, HitFileReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match read_record(&mut self.reader) {
            Ok(Some(record)) => {
                self.num_read += 1;
                Some(Ok(record))
            }
            Ok(None) => {
                debug!("Read {} hits from {}", self.num_read, self.path.display());
                self.done = true;
                None
            }
            Err(source) => {
                self.done = true;
                Some(Err(HitFileReadError::BadRecord {
                    path: self.path.clone(),
                    record: self.num_read,
                    source,
                }))
            }
        }
    }
}

/// Read all of the records in a hit file.
pub fn read_hit_file(path: &Path) -> Result<Vec<HitRecord>, HitFileReadError> {
    HitFileReader::new(path)?.collect()
}
