// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

Channel counts are in units of fine channels.
 */

/// The number of extra fine channels stored on each side of a hit's drift
/// track when it is written out.
pub const EXTRA_COLUMNS: usize = 40;

/// The smallest coarse channel that can hold a padded hit window.
pub const MIN_COARSE_CHANNEL_SIZE: usize = 2 * EXTRA_COLUMNS + 1;

/// Green Bank's standard recording mode has this many timesteps...
pub const GREEN_BANK_NUM_TIMESTEPS: usize = 16;

/// ... and this many fine channels per coarse channel.
pub const GREEN_BANK_COARSE_CHANNEL_SIZE: usize = 1_048_576;

/// The total number of fine channels in the ATA's standard recording mode.
pub const ATA_NUM_FREQS: usize = 50_331_648;

/// The number of fine channels per coarse channel in the ATA's standard
/// recording mode.
pub const ATA_COARSE_CHANNEL_SIZE: usize = 262_144;

/// sigproc telescope IDs.
pub const PARKES_TELESCOPE_ID: i32 = 4;
pub const GREEN_BANK_TELESCOPE_ID: i32 = 6;
pub const ATA_TELESCOPE_ID: i32 = 9;
pub const MEERKAT_TELESCOPE_ID: i32 = 64;

/// Written out in place of a telescope ID when none is known.
pub const NO_TELESCOPE_ID: i32 = -1;

/// The default maximum drift rate to search [Hz/s].
pub const DEFAULT_MAX_DRIFT: f64 = 10.0;

/// The default SNR that a drift track must reach to be reported as a hit.
pub const DEFAULT_MIN_SNR: f32 = 25.0;

/// The extension given to hit files when the user doesn't name one.
pub const DEFAULT_HIT_FILE_EXTENSION: &str = "hits";
