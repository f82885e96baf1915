// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from writing hit files.

use std::path::PathBuf;

use thiserror::Error;

use crate::hit::{HitCodecError, WindowError};

#[derive(Error, Debug)]
pub enum HitFileWriteError {
    #[error(
        "Couldn't open '{}' for writing (OS error code {}): {source}. Do you have write permissions set?",
        path.display(),
        errno.map_or_else(|| "unknown".to_string(), |e| e.to_string())
    )]
    Open {
        path: PathBuf,
        errno: Option<i32>,
        source: std::io::Error,
    },

    #[error("Couldn't rename '{}' to '{}': {source}", tmp_path.display(), path.display())]
    Rename {
        tmp_path: PathBuf,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("The hit file '{}' has already been finalised", .0.display())]
    Finalised(PathBuf),

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error(transparent)]
    Encode(#[from] HitCodecError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
