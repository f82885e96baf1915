// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to handle reading from HDF5 filterbank (.h5) files.
//!
//! The samples live in a dataset called "data" with dimensions
//! `[time][feed][frequency]`; the header values are attributes of that
//! dataset.


use std::path::{Path, PathBuf};

use hdf5::{
    types::{FloatSize, TypeDescriptor, VarLenAscii, VarLenUnicode},
    Attribute, Dataset,
};
use log::{debug, trace, warn};
use ndarray::prelude::*;
use thiserror::Error;

use super::{coarse_channel_range, FilterbankInputType, FilterbankRead, FilterbankReadError};
use crate::metadata::{BeamInfo, FilterbankMetadata, Telescope};

const DATASET_NAME: &str = "data";

#[derive(Error, Debug)]
pub enum H5ReadError {
    #[error("Expected '{file}' to have a 3-dimensional \"data\" dataset, but it has {num_dims} dimensions")]
    BadDims { file: String, num_dims: usize },

    #[error("Expected the '{attr}' attribute to be a 64-bit float, but it is {got}")]
    AttrNotFloat64 { attr: &'static str, got: String },

    #[error("Expected the \"data\" dataset to contain 32-bit floats, but it contains {0}")]
    DataNotFloat32(String),

    #[error("The '{attr}' attribute has an invalid value: {value}")]
    BadAttr { attr: &'static str, value: i64 },

    #[error(transparent)]
    Hdf5(#[from] hdf5::Error),
}

pub struct H5Reader {
    /// The path to the file on disk. The file is reopened for every read so
    /// that no HDF5 handles outlive a read.
    path: PathBuf,

    metadata: FilterbankMetadata,
}

fn describe(desc: &TypeDescriptor) -> String {
    format!("{desc:?}")
}

fn read_f64_attr(dataset: &Dataset, attr: &'static str) -> Result<f64, H5ReadError> {
    let a = dataset.attr(attr)?;
    let desc = a.dtype()?.to_descriptor()?;
    if !matches!(desc, TypeDescriptor::Float(FloatSize::U8)) {
        return Err(H5ReadError::AttrNotFloat64 {
            attr,
            got: describe(&desc),
        });
    }
    Ok(a.read_scalar::<f64>()?)
}

fn optional_attr(dataset: &Dataset, attr: &str) -> Result<Option<Attribute>, H5ReadError> {
    if dataset.attr_names()?.iter().any(|n| n == attr) {
        Ok(Some(dataset.attr(attr)?))
    } else {
        trace!("No '{attr}' attribute");
        Ok(None)
    }
}

fn read_string(a: &Attribute) -> Result<String, H5ReadError> {
    match a.read_scalar::<VarLenUnicode>() {
        Ok(s) => Ok(s.as_str().to_string()),
        Err(_) => Ok(a.read_scalar::<VarLenAscii>()?.as_str().to_string()),
    }
}

impl H5Reader {
    pub fn new(path: &Path) -> Result<H5Reader, H5ReadError> {
        debug!("Reading HDF5 attributes from {}", path.display());
        let file = hdf5::File::open(path)?;
        let dataset = file.dataset(DATASET_NAME)?;

        let shape = dataset.shape();
        if shape.len() != 3 {
            return Err(H5ReadError::BadDims {
                file: path.display().to_string(),
                num_dims: shape.len(),
            });
        }
        if shape[1] != 1 {
            warn!(
                "Expected the middle dimension of '{}' to be 1, but it is {}; only the first feed is used",
                path.display(),
                shape[1]
            );
        }

        let foff = read_f64_attr(&dataset, "foff")?;
        let tsamp = read_f64_attr(&dataset, "tsamp")?;

        let desc = dataset.dtype()?.to_descriptor()?;
        if !matches!(desc, TypeDescriptor::Float(FloatSize::U4)) {
            return Err(H5ReadError::DataNotFloat32(describe(&desc)));
        }

        let mut metadata = FilterbankMetadata {
            num_timesteps: shape[0],
            num_freqs: shape[2],
            foff,
            tsamp,
            ..Default::default()
        };
        if optional_attr(&dataset, "fch1")?.is_some() {
            metadata.fch1 = read_f64_attr(&dataset, "fch1")?;
        }
        if optional_attr(&dataset, "tstart")?.is_some() {
            metadata.tstart = read_f64_attr(&dataset, "tstart")?;
        }
        if let Some(a) = optional_attr(&dataset, "telescope_id")? {
            let id = a.read_scalar::<i64>()?;
            let id = i32::try_from(id).map_err(|_| H5ReadError::BadAttr {
                attr: "telescope_id",
                value: id,
            })?;
            metadata.telescope = Telescope::from_sigproc_id(id);
        }
        if let Some(a) = optional_attr(&dataset, "nfpc")? {
            let nfpc = a.read_scalar::<i64>()?;
            metadata.coarse_channel_size = match usize::try_from(nfpc) {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(H5ReadError::BadAttr {
                        attr: "nfpc",
                        value: nfpc,
                    })
                }
            };
        }

        let mut beam = BeamInfo::default();
        if let Some(a) = optional_attr(&dataset, "source_name")? {
            beam.source_name = read_string(&a)?;
        }
        if optional_attr(&dataset, "src_raj")?.is_some() {
            beam.ra = read_f64_attr(&dataset, "src_raj")?;
        }
        if optional_attr(&dataset, "src_dej")?.is_some() {
            beam.dec = read_f64_attr(&dataset, "src_dej")?;
        }
        metadata.beams.push(beam);

        debug!(
            "{}: {} timesteps x {} fine channels",
            path.display(),
            metadata.num_timesteps,
            metadata.num_freqs
        );

        Ok(H5Reader {
            path: path.to_path_buf(),
            metadata,
        })
    }

    fn read_channels(
        &self,
        channels: std::ops::Range<usize>,
    ) -> Result<Array2<f32>, H5ReadError> {
        let file = hdf5::File::open(&self.path)?;
        let dataset = file.dataset(DATASET_NAME)?;
        Ok(dataset.read_slice_2d::<f32, _>(s![.., 0, channels])?)
    }
}

impl FilterbankRead for H5Reader {
    fn get_metadata(&self) -> &FilterbankMetadata {
        &self.metadata
    }

    fn get_input_data_type(&self) -> FilterbankInputType {
        FilterbankInputType::H5
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
        let data = self.read_channels(channels)?;
        data_tf.assign(&data);
        Ok(())
    }
}
