// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The binary layout of a hit record.
//!
//! A hit file is a sequence of records with no header, index or footer. Each
//! record is:
//!
//! * the ASCII bytes "HITR";
//! * the length of the payload in bytes (u32);
//! * the payload.
//!
//! The payload is the signal:
//!
//! | field            | type |
//! |------------------|------|
//! | frequency        | f64  |
//! | index            | i32  |
//! | drift_steps      | i32  |
//! | drift_rate       | f64  |
//! | snr              | f32  |
//! | coarse_channel   | i32  |
//! | beam             | i32  |
//! | num_timesteps    | i32  |
//! | power            | f32  |
//! | incoherent_power | f32  |
//!
//! followed by the filterbank window:
//!
//! | field          | type                                    |
//! |----------------|-----------------------------------------|
//! | source_name    | u32 length, then that many UTF-8 bytes  |
//! | fch1           | f64                                     |
//! | foff           | f64                                     |
//! | tstart         | f64                                     |
//! | tsamp          | f64                                     |
//! | ra             | f64                                     |
//! | dec            | f64                                     |
//! | telescope_id   | i32                                     |
//! | num_timesteps  | i32                                     |
//! | num_channels   | i32                                     |
//! | data           | u32 length, then that many f32s         |
//! | coarse_channel | i32                                     |
//! | start_channel  | i32                                     |
//! | beam           | i32                                     |
//!
//! Everything is little endian. `data` is timestep-major.

use std::io::{Cursor, ErrorKind, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::prelude::*;
use thiserror::Error;

use super::{DedopplerHit, FilterbankWindow, HitRecord};

pub(crate) const RECORD_MAGIC: &[u8; 4] = b"HITR";

#[derive(Error, Debug)]
pub enum HitCodecError {
    #[error("Expected a hit record to start with \"HITR\", but got {got:?}")]
    BadMagic { got: [u8; 4] },

    #[error("The hit record was cut short")]
    Truncated,

    #[error("The value of '{field}' ({value}) doesn't fit in a hit record")]
    OutOfRange { field: &'static str, value: i128 },

    #[error("A hit record has a negative '{field}' ({value})")]
    Negative { field: &'static str, value: i32 },

    #[error("A hit record says it has {num_timesteps} x {num_channels} samples, but it has {len}")]
    DataShape {
        num_timesteps: usize,
        num_channels: usize,
        len: usize,
    },

    #[error("A hit record's source name isn't valid UTF-8")]
    SourceName(#[from] std::string::FromUtf8Error),

    #[error("A hit record has {0} unexpected bytes at its end")]
    TrailingBytes(usize),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

fn to_i32<T: TryInto<i32> + Copy + Into<i128>>(
    field: &'static str,
    value: T,
) -> Result<i32, HitCodecError> {
    TryInto::<i32>::try_into(value).map_err(|_| HitCodecError::OutOfRange {
        field,
        value: value.into(),
    })
}

fn to_u32(field: &'static str, value: usize) -> Result<u32, HitCodecError> {
    u32::try_from(value).map_err(|_| HitCodecError::OutOfRange {
        field,
        value: value as i128,
    })
}

/// Serialise a record to `writer`. Nothing is written if the record can't be
/// represented.
pub(crate) fn write_record<W: Write>(
    record: &HitRecord,
    writer: &mut W,
) -> Result<(), HitCodecError> {
    let payload = encode_payload(record)?;
    writer.write_all(RECORD_MAGIC)?;
    writer.write_u32::<LittleEndian>(to_u32("record length", payload.len())?)?;
    writer.write_all(&payload)?;
    Ok(())
}

fn encode_payload(record: &HitRecord) -> Result<Vec<u8>, HitCodecError> {
    let HitRecord { signal, filterbank } = record;
    let mut buf = Vec::with_capacity(160 + 4 * filterbank.data.len());

    buf.write_f64::<LittleEndian>(signal.frequency)?;
    buf.write_i32::<LittleEndian>(to_i32("index", signal.index as u64)?)?;
    buf.write_i32::<LittleEndian>(to_i32("drift_steps", signal.drift_steps)?)?;
    buf.write_f64::<LittleEndian>(signal.drift_rate)?;
    buf.write_f32::<LittleEndian>(signal.snr)?;
    buf.write_i32::<LittleEndian>(to_i32("coarse_channel", signal.coarse_channel as u64)?)?;
    buf.write_i32::<LittleEndian>(to_i32("beam", signal.beam as u64)?)?;
    buf.write_i32::<LittleEndian>(to_i32("num_timesteps", signal.num_timesteps as u64)?)?;
    buf.write_f32::<LittleEndian>(signal.power)?;
    buf.write_f32::<LittleEndian>(signal.incoherent_power)?;

    let name = filterbank.source_name.as_bytes();
    buf.write_u32::<LittleEndian>(to_u32("source_name", name.len())?)?;
    buf.write_all(name)?;
    for v in [
        filterbank.fch1,
        filterbank.foff,
        filterbank.tstart,
        filterbank.tsamp,
        filterbank.ra,
        filterbank.dec,
    ] {
        buf.write_f64::<LittleEndian>(v)?;
    }
    buf.write_i32::<LittleEndian>(filterbank.telescope_id)?;
    buf.write_i32::<LittleEndian>(to_i32(
        "num_timesteps",
        filterbank.num_timesteps as u64,
    )?)?;
    buf.write_i32::<LittleEndian>(to_i32("num_channels", filterbank.num_channels as u64)?)?;
    if filterbank.data.dim() != (filterbank.num_timesteps, filterbank.num_channels) {
        return Err(HitCodecError::DataShape {
            num_timesteps: filterbank.num_timesteps,
            num_channels: filterbank.num_channels,
            len: filterbank.data.len(),
        });
    }
    buf.write_u32::<LittleEndian>(to_u32("data", filterbank.data.len())?)?;
    // Logical iteration order is timestep-major regardless of memory layout.
    for &v in filterbank.data.iter() {
        buf.write_f32::<LittleEndian>(v)?;
    }
    buf.write_i32::<LittleEndian>(to_i32(
        "coarse_channel",
        filterbank.coarse_channel as u64,
    )?)?;
    buf.write_i32::<LittleEndian>(to_i32("start_channel", filterbank.start_channel as u64)?)?;
    buf.write_i32::<LittleEndian>(to_i32("beam", filterbank.beam as u64)?)?;

    Ok(buf)
}

/// Deserialise the next record from `reader`. `Ok(None)` means the reader was
/// already at the end of its stream.
pub(crate) fn read_record<R: Read>(reader: &mut R) -> Result<Option<HitRecord>, HitCodecError> {
    let mut magic = [0; 4];
    let mut num_read = 0;
    while num_read < magic.len() {
        match reader.read(&mut magic[num_read..]) {
            Ok(0) if num_read == 0 => return Ok(None),
            Ok(0) => return Err(HitCodecError::Truncated),
            Ok(n) => num_read += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => (),
            Err(e) => return Err(e.into()),
        }
    }
    if &magic != RECORD_MAGIC {
        return Err(HitCodecError::BadMagic { got: magic });
    }

    let len = reader.read_u32::<LittleEndian>().map_err(truncated)?;
    let mut payload = vec![0; len as usize];
    reader.read_exact(&mut payload).map_err(truncated)?;
    decode_payload(&payload).map(Some)
}

fn truncated(e: std::io::Error) -> HitCodecError {
    if e.kind() == ErrorKind::UnexpectedEof {
        HitCodecError::Truncated
    } else {
        HitCodecError::IO(e)
    }
}

fn read_usize(cursor: &mut Cursor<&[u8]>, field: &'static str) -> Result<usize, HitCodecError> {
    match cursor.read_i32::<LittleEndian>().map_err(truncated)? {
        value @ i32::MIN..=-1 => Err(HitCodecError::Negative { field, value }),
        value => Ok(value as usize),
    }
}

fn decode_payload(payload: &[u8]) -> Result<HitRecord, HitCodecError> {
    let mut c = Cursor::new(payload);

    let signal = DedopplerHit {
        frequency: c.read_f64::<LittleEndian>().map_err(truncated)?,
        index: read_usize(&mut c, "index")?,
        drift_steps: c.read_i32::<LittleEndian>().map_err(truncated)?.into(),
        drift_rate: c.read_f64::<LittleEndian>().map_err(truncated)?,
        snr: c.read_f32::<LittleEndian>().map_err(truncated)?,
        coarse_channel: read_usize(&mut c, "coarse_channel")?,
        beam: read_usize(&mut c, "beam")?,
        num_timesteps: read_usize(&mut c, "num_timesteps")?,
        power: c.read_f32::<LittleEndian>().map_err(truncated)?,
        incoherent_power: c.read_f32::<LittleEndian>().map_err(truncated)?,
    };

    let name_len = c.read_u32::<LittleEndian>().map_err(truncated)? as usize;
    let remaining = payload.len() - c.position() as usize;
    if name_len > remaining {
        return Err(HitCodecError::Truncated);
    }
    let mut name = vec![0; name_len];
    c.read_exact(&mut name).map_err(truncated)?;
    let source_name = String::from_utf8(name)?;

    let mut doubles = [0.0; 6];
    c.read_f64_into::<LittleEndian>(&mut doubles)
        .map_err(truncated)?;
    let [fch1, foff, tstart, tsamp, ra, dec] = doubles;
    let telescope_id = c.read_i32::<LittleEndian>().map_err(truncated)?;
    let num_timesteps = read_usize(&mut c, "num_timesteps")?;
    let num_channels = read_usize(&mut c, "num_channels")?;

    let len = c.read_u32::<LittleEndian>().map_err(truncated)? as usize;
    if num_timesteps.checked_mul(num_channels) != Some(len) {
        return Err(HitCodecError::DataShape {
            num_timesteps,
            num_channels,
            len,
        });
    }
    let remaining = payload.len() - c.position() as usize;
    if len.saturating_mul(4) > remaining {
        return Err(HitCodecError::Truncated);
    }
    let mut samples = vec![0.0; len];
    c.read_f32_into::<LittleEndian>(&mut samples)
        .map_err(truncated)?;
    let data = Array2::from_shape_vec((num_timesteps, num_channels), samples).map_err(|_| {
        HitCodecError::DataShape {
            num_timesteps,
            num_channels,
            len,
        }
    })?;

    let filterbank = FilterbankWindow {
        source_name,
        fch1,
        foff,
        tstart,
        tsamp,
        ra,
        dec,
        telescope_id,
        num_timesteps,
        num_channels,
        data,
        coarse_channel: read_usize(&mut c, "coarse_channel")?,
        start_channel: read_usize(&mut c, "start_channel")?,
        beam: read_usize(&mut c, "beam")?,
    };

    let trailing = payload.len() - c.position() as usize;
    if trailing > 0 {
        return Err(HitCodecError::TrailingBytes(trailing));
    }

    Ok(HitRecord { signal, filterbank })
}
