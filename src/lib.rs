//! # PosterFlow
//!
//! A workflow tool for producing print-ready poster art: brainstorm prompt
//! ideas with a hosted text model, generate source images, render them into
//! fixed print layouts, and upload the results to a Google Drive folder.
//!
//! # Architecture: Four-Stage Workflow
//!
//! ```text
//! 1. Brainstorm   concept        →  prompt candidates   (hosted text model)
//! 2. Generate     prompt         →  source rasters      (hosted image model)
//! 3. Export       rasters        →  print JPEGs         (fit + letterbox, local)
//! 4. Upload       print JPEGs    →  Drive folder        (OAuth + multipart)
//! ```
//!
//! The stages are independent commands, not a fused pipeline: each one reads
//! plain files and writes plain files, so any stage can be re-run, skipped,
//! or fed images that came from somewhere else entirely.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Fit, letterbox, and encode rasters into fixed print canvases |
//! | [`export`] | Batch-render print variants for files and directories |
//! | [`store`] | SQLite credential store — token pairs keyed by identity |
//! | [`auth`] | Token lifecycle: remote staleness probe, refresh, persist |
//! | [`upload`] | Sequential Drive uploads with an outcome-not-exception contract |
//! | [`prompts`] | Brainstorm instruction building and candidate extraction |
//! | [`genai`] | Hosted text/image generation clients |
//! | [`helper`] | Loopback web app for the OAuth authorization-code flow |
//! | [`config`] | Sparse `posterflow.toml` loading and validation |
//! | [`output`] | CLI output formatting — information-first display of results |
//!
//! # Design Decisions
//!
//! ## Fixed Canvases, White Letterbox
//!
//! Print targets are exact pixel canvases at 300 DPI (A3/A4/A5 portrait by
//! default). Sources are scaled uniformly to fit and composed centered on an
//! opaque white background — never cropped, never stretched. A print shop
//! gets a file that is exactly the paper size; the white bands are the
//! margin.
//!
//! ## JPEG at Quality 95, No Chroma Subsampling
//!
//! Print output is JPEG quality 95 with 4:4:4 sampling. Subsampled chroma is
//! invisible on screens but visibly softens hard edges at 300 DPI, so the
//! encoder keeps full color resolution.
//!
//! ## Uploads Return Outcomes, Not Errors
//!
//! A batch upload is a walk over independent items: one rejected file must
//! not abort the rest. [`upload::DriveUploader::upload`] therefore always
//! returns an [`upload::UploadOutcome`] — configuration gaps, credential
//! failures, and transport errors all collapse into `Failed` outcomes that
//! the batch report prints per item.
//!
//! ## Single-Slot Identity
//!
//! "Who is logged in" is a SQLite query — the most recently authorized
//! identity wins. There is no session layer and no ambient global; see
//! [`store`] for the model and its documented limits (plaintext tokens,
//! no cross-process write coordination).
//!
//! ## Blocking Core, Async Rim
//!
//! All credential and upload work is blocking `reqwest` — the workflow is
//! sequential by design and a sync core keeps it trivially testable. The
//! only async surface is the [`helper`] web server, which hops to
//! `spawn_blocking` at its edge.

pub mod auth;
pub mod config;
pub mod export;
pub mod genai;
pub mod helper;
pub mod imaging;
pub mod output;
pub mod prompts;
pub mod store;
pub mod upload;
