// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to handle reading from sigproc filterbank (.fil) files.
//!
//! A sigproc file is a keyword header between "HEADER_START" and
//! "HEADER_END", followed by the samples. Strings (including keywords) are
//! prefixed by their length as an i32. Samples are written one timestep at a
//! time, with all of the channels of a timestep together.

mod error;

pub use error::SigprocReadError;

use std::{
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, trace};
use ndarray::prelude::*;

use super::{coarse_channel_range, FilterbankInputType, FilterbankRead, FilterbankReadError};
use crate::metadata::{BeamInfo, FilterbankMetadata, Telescope};

/// The longest keyword or string value we're willing to believe.
const MAX_STRING_LEN: i32 = 4096;

/// The values that can follow a sigproc keyword.
#[derive(Debug, Clone, PartialEq)]
enum Value {
    Int(i32),
    Double(f64),
    Str(String),
    Byte(u8),
    Flag,
}

/// The parts of a sigproc header that we use.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SigprocHeader {
    pub(crate) telescope_id: Option<i32>,
    pub(crate) source_name: Option<String>,
    pub(crate) src_raj: Option<f64>,
    pub(crate) src_dej: Option<f64>,
    pub(crate) tstart: Option<f64>,
    pub(crate) tsamp: Option<f64>,
    pub(crate) fch1: Option<f64>,
    pub(crate) foff: Option<f64>,
    pub(crate) nchans: Option<i32>,
    pub(crate) nifs: Option<i32>,
    pub(crate) nbits: Option<i32>,

    /// The number of bytes taken by the header, i.e. where the samples start.
    pub(crate) len: u64,
}

fn read_string<R: Read>(reader: &mut R) -> Result<String, SigprocReadError> {
    let len = reader.read_i32::<LittleEndian>()?;
    if !(0..=MAX_STRING_LEN).contains(&len) {
        return Err(SigprocReadError::BadStringLength(len));
    }
    let mut buf = vec![0; len as usize];
    reader.read_exact(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn read_value<R: Read>(reader: &mut R, keyword: &str) -> Result<Value, SigprocReadError> {
    let value = match keyword {
        "FREQUENCY_START" | "FREQUENCY_END" => Value::Flag,

        "rawdatafile" | "source_name" => Value::Str(read_string(reader)?),

        "telescope_id" | "machine_id" | "data_type" | "barycentric" | "pulsarcentric"
        | "nbits" | "nsamples" | "nchans" | "nifs" | "nbeams" | "ibeam" => {
            Value::Int(reader.read_i32::<LittleEndian>()?)
        }

        "az_start" | "za_start" | "src_raj" | "src_dej" | "tstart" | "tsamp" | "fch1"
        | "foff" | "fchannel" | "refdm" | "period" => {
            Value::Double(reader.read_f64::<LittleEndian>()?)
        }

        "signed" => Value::Byte(reader.read_u8()?),

        _ => return Err(SigprocReadError::UnknownKeyword(keyword.to_string())),
    };
    Ok(value)
}

/// Read a sigproc header from the start of `reader`.
pub(crate) fn read_header<R: Read>(reader: &mut R) -> Result<SigprocHeader, SigprocReadError> {
    // Count what we've consumed so we know where the samples start.
    let mut counter = CountingReader {
        inner: reader,
        count: 0,
    };

    let start = read_string(&mut counter)?;
    if start != "HEADER_START" {
        return Err(SigprocReadError::NoHeaderStart(start));
    }

    let mut header = SigprocHeader::default();
    loop {
        let keyword = read_string(&mut counter)?;
        if keyword == "HEADER_END" {
            break;
        }
        let value = read_value(&mut counter, &keyword)?;
        trace!("sigproc header: {keyword} = {value:?}");
        match (keyword.as_str(), value) {
            ("telescope_id", Value::Int(v)) => header.telescope_id = Some(v),
            ("source_name", Value::Str(v)) => header.source_name = Some(v),
            ("src_raj", Value::Double(v)) => header.src_raj = Some(v),
            ("src_dej", Value::Double(v)) => header.src_dej = Some(v),
            ("tstart", Value::Double(v)) => header.tstart = Some(v),
            ("tsamp", Value::Double(v)) => header.tsamp = Some(v),
            ("fch1", Value::Double(v)) => header.fch1 = Some(v),
            ("foff", Value::Double(v)) => header.foff = Some(v),
            ("nchans", Value::Int(v)) => header.nchans = Some(v),
            ("nifs", Value::Int(v)) => header.nifs = Some(v),
            ("nbits", Value::Int(v)) => header.nbits = Some(v),
            _ => (),
        }
    }

    header.len = counter.count;
    Ok(header)
}

/// Convert a sigproc "sexagesimal" value (e.g. hhmmss.s or ddmmss.s) into a
/// decimal number of hours or degrees.
pub(crate) fn sexagesimal_to_decimal(value: f64) -> f64 {
    let sign = if value < 0.0 { -1.0 } else { 1.0 };
    let value = value.abs();
    let units = (value / 10000.0).floor();
    let minutes = ((value - units * 10000.0) / 100.0).floor();
    let seconds = value - units * 10000.0 - minutes * 100.0;
    sign * (units + minutes / 60.0 + seconds / 3600.0)
}

struct CountingReader<'a, R: Read> {
    inner: &'a mut R,
    count: u64,
}

impl<R: Read> Read for CountingReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

pub struct SigprocReader {
    /// The path to the file on disk.
    path: PathBuf,

    file: File,

    metadata: FilterbankMetadata,

    /// Where the samples start in the file.
    data_offset: u64,
}

impl SigprocReader {
    pub fn new(path: &Path) -> Result<SigprocReader, SigprocReadError> {
        debug!("Reading sigproc header from {}", path.display());
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let header = read_header(&mut BufReader::new(&file))?;

        let nbits = header.nbits.ok_or(SigprocReadError::MissingKey("nbits"))?;
        if nbits != 32 {
            return Err(SigprocReadError::UnsupportedNbits(nbits));
        }
        let nifs = header.nifs.unwrap_or(1);
        if nifs != 1 {
            return Err(SigprocReadError::UnsupportedNifs(nifs));
        }
        let nchans = match header.nchans.ok_or(SigprocReadError::MissingKey("nchans"))? {
            n @ 1.. => n as usize,
            n => return Err(SigprocReadError::BadNchans(n)),
        };
        let fch1 = header.fch1.ok_or(SigprocReadError::MissingKey("fch1"))?;
        let foff = header.foff.ok_or(SigprocReadError::MissingKey("foff"))?;
        let tsamp = header.tsamp.ok_or(SigprocReadError::MissingKey("tsamp"))?;

        let data_len = file_len - header.len;
        let timestep_len = nchans as u64 * 4;
        if data_len % timestep_len != 0 {
            return Err(SigprocReadError::PartialTimestep {
                data_len,
                timestep_len,
            });
        }
        let num_timesteps = (data_len / timestep_len) as usize;

        let metadata = FilterbankMetadata {
            telescope: header.telescope_id.and_then(Telescope::from_sigproc_id),
            num_timesteps,
            num_freqs: nchans,
            fch1,
            foff,
            tstart: header.tstart.unwrap_or_default(),
            tsamp,
            beams: vec![BeamInfo {
                source_name: header.source_name.unwrap_or_default(),
                ra: header.src_raj.map(sexagesimal_to_decimal).unwrap_or_default(),
                dec: header.src_dej.map(sexagesimal_to_decimal).unwrap_or_default(),
            }],
            ..Default::default()
        };
        debug!(
            "{}: {} timesteps x {} fine channels",
            path.display(),
            num_timesteps,
            nchans
        );

        Ok(SigprocReader {
            path: path.to_path_buf(),
            file,
            metadata,
            data_offset: header.len,
        })
    }
}

impl FilterbankRead for SigprocReader {
    fn get_metadata(&self) -> &FilterbankMetadata {
        &self.metadata
    }

    fn get_input_data_type(&self) -> FilterbankInputType {
        FilterbankInputType::Sigproc
    }

    fn read_coarse_channel(
        &self,
        mut data_tf: ArrayViewMut2<f32>,
        beam: usize,
        coarse_channel: usize,
    ) -> Result<(), FilterbankReadError> {
        let channels = coarse_channel_range(&self.metadata, &data_tf, beam, coarse_channel)?;
        trace!(
            "Reading fine channels {:?} from {}",
            channels,
            self.path.display()
        );

        let mut reader = BufReader::new(&self.file);
        let mut row = vec![0.0; channels.len()];
        for (i_timestep, mut data_f) in data_tf.outer_iter_mut().enumerate() {
            let offset = (i_timestep * self.metadata.num_freqs + channels.start) * 4;
            reader.seek(SeekFrom::Start(self.data_offset + offset as u64))?;
            reader.read_f32_into::<LittleEndian>(&mut row)?;
            data_f.assign(&ArrayView1::from(&row));
        }
        Ok(())
    }
}
