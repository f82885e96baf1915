// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};
use byteorder::{LittleEndian, WriteBytesExt};
use tempfile::TempDir;

use seticore::read_hit_file;

const NUM_TIMESTEPS: usize = 8;
const NUM_FREQS: usize = 256;

fn seticore() -> Command {
    Command::cargo_bin("seticore").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// Write a Green Bank sigproc file with `NUM_TIMESTEPS` x `NUM_FREQS` of noise
/// and a drifting signal starting at fine channel 188.
fn write_fil(path: &Path) {
    fn write_str<W: Write>(w: &mut W, s: &str) {
        w.write_i32::<LittleEndian>(s.len() as i32).unwrap();
        w.write_all(s.as_bytes()).unwrap();
    }
    fn write_int<W: Write>(w: &mut W, key: &str, v: i32) {
        write_str(w, key);
        w.write_i32::<LittleEndian>(v).unwrap();
    }
    fn write_double<W: Write>(w: &mut W, key: &str, v: f64) {
        write_str(w, key);
        w.write_f64::<LittleEndian>(v).unwrap();
    }

    let mut w = BufWriter::new(File::create(path).unwrap());
    write_str(&mut w, "HEADER_START");
    write_int(&mut w, "telescope_id", 6);
    write_str(&mut w, "source_name");
    write_str(&mut w, "Voyager1");
    write_double(&mut w, "src_raj", 171012.0375);
    write_double(&mut w, "src_dej", 122440.0);
    write_double(&mut w, "tstart", 57650.78209490741);
    write_double(&mut w, "tsamp", 18.253611008);
    write_double(&mut w, "fch1", 8421.38671875);
    write_double(&mut w, "foff", -2.7939677238464355e-06);
    write_int(&mut w, "nchans", NUM_FREQS as i32);
    write_int(&mut w, "nifs", 1);
    write_int(&mut w, "nbits", 32);
    write_str(&mut w, "HEADER_END");

    let mut state: u32 = 12345;
    for t in 0..NUM_TIMESTEPS {
        let signal_col = 188 + 3 * t / (NUM_TIMESTEPS - 1);
        for c in 0..NUM_FREQS {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let mut v = ((state >> 8) & 0xffff) as f32 / 65536.0;
            if c == signal_col {
                v += 50.0;
            }
            w.write_f32::<LittleEndian>(v).unwrap();
        }
    }
    w.flush().unwrap();
}

#[test]
fn test_search_writes_hits() {
    let tmp_dir = TempDir::new().unwrap();
    let input = tmp_dir.path().join("obs.fil");
    let output = tmp_dir.path().join("out.hits");
    write_fil(&input);

    let cmd = seticore()
        .args([
            input.display().to_string().as_str(),
            "-o",
            output.display().to_string().as_str(),
            "--coarse-channel-size",
            "128",
            "--max-drift",
            "0.1",
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_ok(), "seticore failed on simple test data: {:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Wrote"), "{stdout}");

    assert!(output.exists());
    assert!(!tmp_dir.path().join("out.hits.tmp").exists());
    let records = read_hit_file(&output).unwrap();
    assert!(!records.is_empty());
    let best = records
        .iter()
        .max_by(|a, b| a.signal.snr.total_cmp(&b.signal.snr))
        .unwrap();
    assert_eq!(best.signal.coarse_channel, 1);
    assert_eq!(best.signal.index, 60);
    assert_eq!(best.signal.drift_steps, 3);
    assert_eq!(best.filterbank.source_name, "Voyager1");
    assert_eq!(best.filterbank.num_timesteps, NUM_TIMESTEPS);
}

#[test]
fn test_dry_run_writes_nothing() {
    let tmp_dir = TempDir::new().unwrap();
    let input = tmp_dir.path().join("obs.fil");
    write_fil(&input);

    let cmd = seticore()
        .args([
            input.display().to_string().as_str(),
            "--coarse-channel-size",
            "128",
            "--dry-run",
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    assert!(!tmp_dir.path().join("obs.hits").exists());
}

#[test]
fn test_uninferrable_channelisation_fails() {
    let tmp_dir = TempDir::new().unwrap();
    let input = tmp_dir.path().join("obs.fil");
    write_fil(&input);

    let cmd = seticore()
        .args([input.display().to_string().as_str(), "--no-progress-bars"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("--coarse-channel-size"), "{stderr}");
    assert!(!tmp_dir.path().join("obs.hits").exists());
}

#[test]
fn test_unsupported_extension_fails() {
    let tmp_dir = TempDir::new().unwrap();
    let input = tmp_dir.path().join("obs.txt");
    std::fs::write(&input, "not a filterbank").unwrap();

    let output = seticore()
        .args([input.display().to_string().as_str(), "--no-progress-bars"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("unsupported extension"), "{stderr}");
}
