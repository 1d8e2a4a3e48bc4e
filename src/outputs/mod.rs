//! Output generation for the published data directory.
//!
//! # Submodules
//!
//! - [`json`]: writes one `DailyDigest` file per day
//! - [`indexes`]: keeps `index.json` consistent with the digest files
//!
//! # Output Structure
//!
//! ```text
//! data_output_dir/
//! ├── index.json        # DigestIndex: available dates + latest
//! ├── 2026-01-02.json   # DailyDigest
//! └── 2026-01-01.json
//! ```
//!
//! Files are written via a temp file and rename so a crashed run never
//! leaves a half-written document for readers.

pub mod indexes;
pub mod json;
